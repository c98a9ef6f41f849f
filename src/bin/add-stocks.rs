//! Registers the extended large-cap watchlist, skipping symbols already tracked.

use dotenvy::dotenv;
use stockwatch::config::AppConfig;
use stockwatch::db::{self, EXTENDED_WATCHLIST};
use stockwatch::logging;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    let config = AppConfig::from_env();
    logging::init_logging(&config);

    if config.database_url.is_none() {
        return Err("DATABASE_URL is required to register stocks".into());
    }

    let store = db::connect(config.database_url.as_deref()).await?;
    let added = db::register_all(store.as_ref(), EXTENDED_WATCHLIST).await?;

    info!(
        added = added,
        skipped = EXTENDED_WATCHLIST.len() - added,
        "Successfully added {} new stocks",
        added
    );
    Ok(())
}
