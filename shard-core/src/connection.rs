use crate::{Executor, Result, Transaction};
use std::future::Future;

pub trait Connection: Executor + Sized {
    type Transaction<'c>: Transaction<'c>
    where
        Self: 'c;

    /// Open a connection to the given driver prefixed URL.
    fn connect(url: &str) -> impl Future<Output = Result<Self>>;

    /// Liveness check.
    fn ping(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Begin a transaction that borrows this connection until it is resolved.
    fn begin(&mut self) -> impl Future<Output = Result<Self::Transaction<'_>>> + Send;
}
