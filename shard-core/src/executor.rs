use crate::{Result, Rows, RowsAffected, Value};
use std::future::Future;

/// The capability set a [`Shard`](crate::Shard) needs from the database.
///
/// Implemented both by a direct connection and by an open transaction, so code
/// written against an `Executor` cannot tell which one backs it. Arguments reach
/// this layer already normalized.
pub trait Executor: Send {
    /// Run a statement that modifies data, returning the rows affected and the
    /// last inserted identifier when the backend reports one.
    fn execute(
        &mut self,
        sql: &str,
        args: &[Value],
    ) -> impl Future<Output = Result<RowsAffected>> + Send;

    /// Run a statement returning rows. The column labels are available before
    /// the first row is read.
    fn query<'s>(
        &'s mut self,
        sql: &str,
        args: &[Value],
    ) -> impl Future<Output = Result<Rows<'s>>> + Send;
}
