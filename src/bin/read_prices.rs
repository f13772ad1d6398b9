//! Print a summary of the stored price history

use mstr_btc_db::commands::prices::show_prices;
use mstr_btc_db::config::AppConfig;
use std::process::exit;

fn main() {
    mstr_btc_db::init_tracing();

    match show_prices(&AppConfig::default()) {
        Ok(summary) => println!("{}", summary),
        Err(e) => {
            eprintln!("error[{}]: {}", e.code(), e);
            exit(1);
        }
    }
}
