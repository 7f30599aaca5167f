mod args;
mod as_value;
mod column;
mod connection;
mod decode;
mod duplicate;
mod entity;
mod executor;
mod info;
mod row;
mod shard;
mod transaction;
mod util;
mod value;

pub use ::anyhow::Context;
pub use args::*;
pub use as_value::*;
pub use column::*;
pub use connection::*;
pub use decode::*;
pub use duplicate::*;
pub use entity::*;
pub use executor::*;
pub use info::*;
pub use row::*;
pub use shard::*;
pub use transaction::*;
pub use util::*;
pub use value::*;
pub mod stream {
    pub use ::futures::stream::*;
}
pub use ::futures::future;

pub type Result<T> = anyhow::Result<T>;
pub type Error = anyhow::Error;
