//! Postgres-backed stock registry and snapshot history

use chrono::{DateTime, Utc};
use tokio_postgres::error::SqlState;
use tokio_postgres::{Client, NoTls, Row};
use tracing::{error, info};

use super::StockStore;
use crate::error::StoreError;
use crate::models::snapshot::{Snapshot, Status};
use crate::models::stock::StockEntry;

/// Versioned schema. Append new entries; never edit applied ones.
pub const MIGRATIONS: &[(i32, &str, &str)] = &[
    (
        1,
        "create stocks",
        "CREATE TABLE IF NOT EXISTS stocks (
            symbol TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )",
    ),
    (
        2,
        "create stock_snapshots",
        "CREATE TABLE IF NOT EXISTS stock_snapshots (
            id BIGSERIAL PRIMARY KEY,
            symbol TEXT NOT NULL REFERENCES stocks(symbol),
            price DOUBLE PRECISION NOT NULL,
            change_percent DOUBLE PRECISION NOT NULL,
            status TEXT NOT NULL,
            is_low BOOLEAN NOT NULL DEFAULT FALSE,
            details TEXT NOT NULL,
            timestamp TIMESTAMPTZ NOT NULL,
            market_cap DOUBLE PRECISION,
            volume BIGINT,
            open_price DOUBLE PRECISION,
            day_high DOUBLE PRECISION,
            day_low DOUBLE PRECISION,
            fifty_two_week_high DOUBLE PRECISION,
            fifty_two_week_low DOUBLE PRECISION,
            pe_ratio DOUBLE PRECISION,
            seven_day_avg DOUBLE PRECISION,
            seven_day_low DOUBLE PRECISION,
            two_fifty_day_low DOUBLE PRECISION,
            two_fifty_day_avg DOUBLE PRECISION
        );
        CREATE INDEX IF NOT EXISTS stock_snapshots_symbol_timestamp
            ON stock_snapshots (symbol, timestamp DESC)",
    ),
];

const SNAPSHOT_COLUMNS: &str = "symbol, price, change_percent, status, is_low, details, timestamp, \
     market_cap, volume, open_price, day_high, day_low, fifty_two_week_high, fifty_two_week_low, \
     pe_ratio, seven_day_avg, seven_day_low, two_fifty_day_low, two_fifty_day_avg";

pub struct PostgresStore {
    client: Client,
}

impl PostgresStore {
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let (mut client, connection) = tokio_postgres::connect(database_url, NoTls)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        // Spawn connection task
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!(error = %e, "Postgres connection error");
            }
        });

        run_migrations(&mut client).await?;

        Ok(Self { client })
    }
}

/// Apply every migration newer than the recorded schema version
pub async fn run_migrations(client: &mut Client) -> Result<(), StoreError> {
    client
        .batch_execute(
            "CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                description TEXT NOT NULL,
                applied_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )",
        )
        .await?;

    let applied: Vec<i32> = client
        .query("SELECT version FROM schema_migrations", &[])
        .await?
        .iter()
        .map(|row| row.get(0))
        .collect();

    for (version, description, sql) in MIGRATIONS {
        if applied.contains(version) {
            continue;
        }

        let migration_error = |e: tokio_postgres::Error| StoreError::Migration {
            version: *version,
            message: e.to_string(),
        };

        let tx = client.transaction().await.map_err(migration_error)?;
        tx.batch_execute(sql).await.map_err(migration_error)?;
        tx.execute(
            "INSERT INTO schema_migrations (version, description) VALUES ($1, $2)",
            &[version, description],
        )
        .await
        .map_err(migration_error)?;
        tx.commit().await.map_err(migration_error)?;

        info!(version = version, "Applied migration {}: {}", version, description);
    }

    Ok(())
}

fn snapshot_from_row(row: &Row) -> Result<Snapshot, StoreError> {
    let status: String = row.get("status");
    let status: Status = status.parse().map_err(StoreError::Query)?;
    let timestamp: DateTime<Utc> = row.get("timestamp");

    Ok(Snapshot {
        symbol: row.get("symbol"),
        price: row.get("price"),
        change_percent: row.get("change_percent"),
        status,
        is_low: row.get("is_low"),
        details: row.get("details"),
        timestamp,
        market_cap: row.get("market_cap"),
        volume: row.get("volume"),
        open_price: row.get("open_price"),
        day_high: row.get("day_high"),
        day_low: row.get("day_low"),
        fifty_two_week_high: row.get("fifty_two_week_high"),
        fifty_two_week_low: row.get("fifty_two_week_low"),
        pe_ratio: row.get("pe_ratio"),
        seven_day_avg: row.get("seven_day_avg"),
        seven_day_low: row.get("seven_day_low"),
        two_fifty_day_low: row.get("two_fifty_day_low"),
        two_fifty_day_avg: row.get("two_fifty_day_avg"),
    })
}

#[async_trait::async_trait]
impl StockStore for PostgresStore {
    async fn upsert_stock_entry(&self, entry: &StockEntry) -> Result<bool, StoreError> {
        let inserted = self
            .client
            .execute(
                "INSERT INTO stocks (symbol, name) VALUES ($1, $2)
                 ON CONFLICT (symbol) DO NOTHING",
                &[&entry.symbol, &entry.name],
            )
            .await?;
        Ok(inserted > 0)
    }

    async fn list_stock_entries(&self) -> Result<Vec<StockEntry>, StoreError> {
        let rows = self
            .client
            .query(
                "SELECT symbol, name FROM stocks ORDER BY created_at, symbol",
                &[],
            )
            .await?;
        Ok(rows
            .iter()
            .map(|row| StockEntry::new(row.get::<_, String>(0), row.get::<_, String>(1)))
            .collect())
    }

    async fn get_stock_entry(&self, symbol: &str) -> Result<Option<StockEntry>, StoreError> {
        let row = self
            .client
            .query_opt("SELECT symbol, name FROM stocks WHERE symbol = $1", &[&symbol])
            .await?;
        Ok(row.map(|row| StockEntry::new(row.get::<_, String>(0), row.get::<_, String>(1))))
    }

    async fn append_snapshot(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        let status = snapshot.status.as_str();
        let result = self
            .client
            .execute(
                &format!(
                    "INSERT INTO stock_snapshots ({})
                     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)",
                    SNAPSHOT_COLUMNS
                ),
                &[
                    &snapshot.symbol,
                    &snapshot.price,
                    &snapshot.change_percent,
                    &status,
                    &snapshot.is_low,
                    &snapshot.details,
                    &snapshot.timestamp,
                    &snapshot.market_cap,
                    &snapshot.volume,
                    &snapshot.open_price,
                    &snapshot.day_high,
                    &snapshot.day_low,
                    &snapshot.fifty_two_week_high,
                    &snapshot.fifty_two_week_low,
                    &snapshot.pe_ratio,
                    &snapshot.seven_day_avg,
                    &snapshot.seven_day_low,
                    &snapshot.two_fifty_day_low,
                    &snapshot.two_fifty_day_avg,
                ],
            )
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) if e.code() == Some(&SqlState::FOREIGN_KEY_VIOLATION) => {
                Err(StoreError::UnknownSymbol {
                    symbol: snapshot.symbol.clone(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn latest_snapshot(&self, symbol: &str) -> Result<Option<Snapshot>, StoreError> {
        let row = self
            .client
            .query_opt(
                &format!(
                    "SELECT {} FROM stock_snapshots
                     WHERE symbol = $1
                     ORDER BY timestamp DESC, id DESC
                     LIMIT 1",
                    SNAPSHOT_COLUMNS
                ),
                &[&symbol],
            )
            .await?;
        row.as_ref().map(snapshot_from_row).transpose()
    }

    async fn list_snapshots(
        &self,
        symbol: &str,
        limit: Option<usize>,
    ) -> Result<Vec<Snapshot>, StoreError> {
        let query = format!(
            "SELECT {} FROM stock_snapshots
             WHERE symbol = $1
             ORDER BY timestamp DESC, id DESC",
            SNAPSHOT_COLUMNS
        );
        let rows = match limit {
            Some(limit) => {
                let limit = limit as i64;
                self.client
                    .query(&format!("{} LIMIT $2", query), &[&symbol, &limit])
                    .await?
            }
            None => self.client.query(&query, &[&symbol]).await?,
        };
        rows.iter().map(snapshot_from_row).collect()
    }
}
