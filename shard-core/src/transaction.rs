use crate::{Executor, Result};
use std::future::Future;

/// An open transaction.
///
/// Dropping it without calling `commit` or `rollback` must roll it back.
pub trait Transaction<'c>: Executor {
    fn commit(self) -> impl Future<Output = Result<()>> + Send;
    fn rollback(self) -> impl Future<Output = Result<()>> + Send;
}
