use chrono::{DateTime, NaiveTime, TimeZone, Utc};
use stockwatch::core::market_hours::{is_market_open, MarketHours};

fn utc(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
}

// 2024-01-03 is a Wednesday; IST is UTC+05:30

#[test]
fn open_at_session_start() {
    assert!(is_market_open(utc(2024, 1, 3, 3, 30, 0)));
}

#[test]
fn open_at_session_close_inclusive() {
    assert!(is_market_open(utc(2024, 1, 3, 10, 0, 0)));
}

#[test]
fn closed_one_second_after_close() {
    assert!(!is_market_open(utc(2024, 1, 3, 10, 0, 1)));
}

#[test]
fn closed_at_1531() {
    assert!(!is_market_open(utc(2024, 1, 3, 10, 1, 0)));
}

#[test]
fn closed_at_0859() {
    assert!(!is_market_open(utc(2024, 1, 3, 3, 29, 0)));
}

#[test]
fn closed_on_weekends() {
    // Saturday 11:30 IST
    assert!(!is_market_open(utc(2024, 1, 6, 6, 0, 0)));
    // Sunday 11:30 IST
    assert!(!is_market_open(utc(2024, 1, 7, 6, 0, 0)));
}

#[test]
fn weekday_is_taken_in_exchange_time() {
    // Friday 20:00 UTC is already Saturday in India
    assert!(!is_market_open(utc(2024, 1, 5, 20, 0, 0)));
    // Monday 10:00 IST, while UTC is still early Monday
    assert!(is_market_open(utc(2024, 1, 8, 4, 30, 0)));
}

#[test]
fn custom_session_is_respected() {
    let hours = MarketHours {
        utc_offset_seconds: 0,
        open: NaiveTime::from_hms_opt(14, 30, 0).unwrap(),
        close: NaiveTime::from_hms_opt(21, 0, 0).unwrap(),
    };
    assert!(hours.is_open_at(utc(2024, 1, 3, 15, 0, 0)));
    assert!(!hours.is_open_at(utc(2024, 1, 3, 10, 0, 0)));
}
