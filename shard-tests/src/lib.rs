mod duplicates;
mod select;
mod transaction;
mod users;

use duplicates::duplicates;
use log::LevelFilter;
use select::{select, select_one};
use shard::{Connection, Shard};
use std::env;
#[cfg(not(feature = "disable-transactions"))]
use transaction::transaction;
use users::users;

pub fn init_logs() {
    let mut logger = env_logger::builder();
    logger
        .is_test(true)
        .format_file(true)
        .format_line_number(true);
    if env::var("RUST_LOG").is_err() {
        logger.filter_level(LevelFilter::Warn);
    }
    let _ = logger.try_init();
}

/// Runs the whole suite against a freshly opened connection.
pub async fn execute_tests<C: Connection>(connection: C) {
    let mut shard = Shard::new("tests", connection)
        .await
        .expect("The connection did not answer the ping");
    users(&mut shard).await;
    select(&mut shard).await;
    select_one(&mut shard).await;
    duplicates(&mut shard).await;
    #[cfg(not(feature = "disable-transactions"))]
    transaction(&mut shard).await;
}

#[macro_export]
macro_rules! silent_logs {
    ($($code:tt)+) => {{
        let level = log::max_level();
        log::set_max_level(log::LevelFilter::Off);
        $($code)+
        log::set_max_level(level);
    }};
}
