//! Yahoo Finance provider against a mocked API

use backon::ExponentialBuilder;
use serde_json::{json, Value};
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use stockwatch::error::DataError;
use stockwatch::services::market_data::{MarketDataProvider, SERIES_RANGE};
use stockwatch::services::yahoo::YahooMarketDataProvider;

// 2024-01-03 03:45 UTC, 09:15 IST
const FIRST_TS: i64 = 1_704_253_500;
const IST_OFFSET: i64 = 19_800;

fn provider(server: &MockServer) -> YahooMarketDataProvider {
    YahooMarketDataProvider::with_client(server.uri(), reqwest::Client::new()).with_backoff(
        ExponentialBuilder::default()
            .with_min_delay(Duration::from_millis(1))
            .with_max_times(2),
    )
}

fn chart_body(closes: Value) -> Value {
    let count = closes.as_array().map(|c| c.len()).unwrap_or(0) as i64;
    let timestamps: Vec<i64> = (0..count).map(|i| FIRST_TS + i * 3600).collect();
    json!({
        "chart": {
            "result": [{
                "meta": {
                    "regularMarketPrice": 101.0,
                    "regularMarketDayHigh": 103.0,
                    "regularMarketDayLow": 99.0,
                    "regularMarketVolume": 250000,
                    "fiftyTwoWeekHigh": 140.0,
                    "fiftyTwoWeekLow": 90.0,
                    "gmtoffset": IST_OFFSET
                },
                "timestamp": timestamps,
                "indicators": { "quote": [{ "close": closes }] }
            }],
            "error": null
        }
    })
}

async fn mount_chart(server: &MockServer, symbol: &str, range: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path(format!("/v8/finance/chart/{}", symbol)))
        .and(query_param("range", range))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn series_drops_missing_closes() {
    let server = MockServer::start().await;
    mount_chart(
        &server,
        "TCS.NS",
        SERIES_RANGE,
        chart_body(json!([100.0, null, 102.5, 101.0])),
    )
    .await;

    let series = provider(&server).fetch_series("TCS.NS", SERIES_RANGE).await.unwrap();

    assert_eq!(series.symbol, "TCS.NS");
    assert_eq!(series.closes(), vec![100.0, 102.5, 101.0]);
    assert!(series.points.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
}

#[tokio::test]
async fn series_requests_daily_interval() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v8/finance/chart/INFY.NS"))
        .and(query_param("range", "2y"))
        .and(query_param("interval", "1d"))
        .and(query_param("includePrePost", "false"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chart_body(json!([1500.0]))))
        .expect(1)
        .mount(&server)
        .await;

    let series = provider(&server).fetch_series("INFY.NS", "2y").await.unwrap();
    assert_eq!(series.len(), 1);
}

#[tokio::test]
async fn all_missing_closes_is_empty_series() {
    let server = MockServer::start().await;
    mount_chart(&server, "GAP.NS", SERIES_RANGE, chart_body(json!([null, null]))).await;

    let err = provider(&server).fetch_series("GAP.NS", SERIES_RANGE).await.unwrap_err();
    assert!(matches!(err, DataError::EmptySeries { .. }));
}

#[tokio::test]
async fn http_not_found_is_symbol_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v8/finance/chart/NOPE.NS"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "chart": {
                "result": null,
                "error": { "code": "Not Found", "description": "No data found, symbol may be delisted" }
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = provider(&server).fetch_series("NOPE.NS", SERIES_RANGE).await.unwrap_err();
    assert!(matches!(err, DataError::SymbolNotFound { symbol } if symbol == "NOPE.NS"));
}

#[tokio::test]
async fn error_payload_is_symbol_not_found() {
    let server = MockServer::start().await;
    mount_chart(
        &server,
        "NOPE.NS",
        SERIES_RANGE,
        json!({
            "chart": {
                "result": null,
                "error": { "code": "Not Found", "description": "No data found" }
            }
        }),
    )
    .await;

    let err = provider(&server).fetch_series("NOPE.NS", SERIES_RANGE).await.unwrap_err();
    assert!(matches!(err, DataError::SymbolNotFound { .. }));
}

#[tokio::test]
async fn transient_failure_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v8/finance/chart/TCS.NS"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v8/finance/chart/TCS.NS"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chart_body(json!([100.0, 101.0]))))
        .with_priority(2)
        .mount(&server)
        .await;

    let series = provider(&server).fetch_series("TCS.NS", SERIES_RANGE).await.unwrap();
    assert_eq!(series.closes(), vec![100.0, 101.0]);
}

#[tokio::test]
async fn rate_limit_gives_up_after_retries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v8/finance/chart/TCS.NS"))
        .respond_with(ResponseTemplate::new(429))
        .expect(3)
        .mount(&server)
        .await;

    let err = provider(&server).fetch_series("TCS.NS", SERIES_RANGE).await.unwrap_err();
    assert!(matches!(err, DataError::RateLimited));
}

#[tokio::test]
async fn malformed_body_is_format_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v8/finance/chart/TCS.NS"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>consent</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let err = provider(&server).fetch_series("TCS.NS", SERIES_RANGE).await.unwrap_err();
    assert!(matches!(err, DataError::ResponseFormat(_)));
}

#[tokio::test]
async fn metadata_comes_from_quote_api() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v7/finance/quote"))
        .and(query_param("symbols", "TCS.NS"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "quoteResponse": {
                "result": [{
                    "symbol": "TCS.NS",
                    "marketCap": 1.2e13,
                    "regularMarketVolume": 1500000,
                    "regularMarketOpen": 3500.0,
                    "regularMarketDayHigh": 3550.0,
                    "regularMarketDayLow": 3480.5,
                    "fiftyTwoWeekHigh": 4000.0,
                    "fiftyTwoWeekLow": 3000.0,
                    "trailingPE": 29.5
                }],
                "error": null
            }
        })))
        .mount(&server)
        .await;

    let metadata = provider(&server).fetch_metadata("TCS.NS").await.unwrap();

    assert_eq!(metadata.market_cap, Some(1.2e13));
    assert_eq!(metadata.volume, Some(1_500_000));
    assert_eq!(metadata.open_price, Some(3500.0));
    assert_eq!(metadata.day_low, Some(3480.5));
    assert_eq!(metadata.pe_ratio, Some(29.5));
}

#[tokio::test]
async fn metadata_falls_back_to_chart_meta() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v7/finance/quote"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "finance": { "result": null, "error": { "code": "Unauthorized" } }
        })))
        .mount(&server)
        .await;
    mount_chart(&server, "TCS.NS", "1d", chart_body(json!([101.0]))).await;

    let metadata = provider(&server).fetch_metadata("TCS.NS").await.unwrap();

    assert_eq!(metadata.market_cap, None);
    assert_eq!(metadata.pe_ratio, None);
    assert_eq!(metadata.day_high, Some(103.0));
    assert_eq!(metadata.volume, Some(250_000));
    assert_eq!(metadata.fifty_two_week_low, Some(90.0));
}

#[tokio::test]
async fn chart_dates_are_exchange_local() {
    let server = MockServer::start().await;
    mount_chart(&server, "TCS.NS", "5d", chart_body(json!([100.0, 101.5]))).await;

    let points = provider(&server).fetch_chart("TCS.NS", "5d", "60m").await.unwrap();

    assert_eq!(points.len(), 2);
    assert_eq!(points[0].date, "2024-01-03 09:15");
    assert_eq!(points[1].date, "2024-01-03 10:15");
    assert_eq!(points[1].close, 101.5);
}
