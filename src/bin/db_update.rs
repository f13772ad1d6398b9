//! Fetch missing daily closes and upsert them into the price store

use mstr_btc_db::commands::update::update_prices;
use mstr_btc_db::config::AppConfig;
use mstr_btc_db::state::AppState;
use std::process::exit;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    mstr_btc_db::init_tracing();

    let state = match AppState::new(AppConfig::default()) {
        Ok(state) => state,
        Err(e) => {
            eprintln!("error[{}]: {}", e.code(), e);
            exit(1);
        }
    };

    match update_prices(&state).await {
        Ok(outcome) => println!("{}", outcome.status_line()),
        Err(e) => {
            eprintln!("error[{}]: {}", e.code(), e);
            exit(1);
        }
    }
}
