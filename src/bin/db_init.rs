//! Create the price store schema

use mstr_btc_db::commands::init::init_db;
use mstr_btc_db::config::AppConfig;
use std::process::exit;

fn main() {
    mstr_btc_db::init_tracing();

    match init_db(&AppConfig::default()) {
        Ok(status) => println!("{}", status),
        Err(e) => {
            eprintln!("error[{}]: {}", e.code(), e);
            exit(1);
        }
    }
}
