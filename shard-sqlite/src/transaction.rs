use crate::{SqliteConnection, error_message_from_ptr};
use libsqlite3_sys::{SQLITE_OK, sqlite3_errmsg, sqlite3_exec, sqlite3_get_autocommit};
use shard_core::{Executor, Result, Rows, RowsAffected, Transaction, Value};
use std::{future::Future, ptr};

/// A transaction borrowing its connection until it is resolved.
///
/// Dropped without `commit` or `rollback`, it rolls back.
pub struct SqliteTransaction<'c> {
    connection: &'c mut SqliteConnection,
    resolved: bool,
}

impl<'c> SqliteTransaction<'c> {
    pub async fn new(connection: &'c mut SqliteConnection) -> Result<Self> {
        connection.execute("BEGIN", &[]).await?;
        Ok(Self {
            connection,
            resolved: false,
        })
    }
}

impl<'c> Executor for SqliteTransaction<'c> {
    fn execute(
        &mut self,
        sql: &str,
        args: &[Value],
    ) -> impl Future<Output = Result<RowsAffected>> + Send {
        self.connection.execute(sql, args)
    }

    fn query<'s>(
        &'s mut self,
        sql: &str,
        args: &[Value],
    ) -> impl Future<Output = Result<Rows<'s>>> + Send {
        self.connection.query(sql, args)
    }
}

impl<'c> SqliteTransaction<'c> {
    /// Runs the closing statement. A failed `COMMIT` stays unresolved so that
    /// dropping the transaction rolls it back.
    async fn resolve(mut self, sql: &str, always: bool) -> Result<()> {
        let result = self.connection.execute(sql, &[]).await;
        self.resolved = always || result.is_ok();
        drop(self);
        result.map(|_| ())
    }
}

impl<'c> Transaction<'c> for SqliteTransaction<'c> {
    fn commit(self) -> impl Future<Output = Result<()>> + Send {
        self.resolve("COMMIT", false)
    }

    fn rollback(self) -> impl Future<Output = Result<()>> + Send {
        self.resolve("ROLLBACK", true)
    }
}

impl Drop for SqliteTransaction<'_> {
    fn drop(&mut self) {
        if self.resolved {
            return;
        }
        unsafe {
            let connection = *self.connection.connection;
            if sqlite3_get_autocommit(connection) != 0 {
                return;
            }
            let rc = sqlite3_exec(
                connection,
                c"ROLLBACK".as_ptr(),
                None,
                ptr::null_mut(),
                ptr::null_mut(),
            );
            if rc != SQLITE_OK {
                log::error!(
                    "Could not roll back a dropped transaction: {}",
                    error_message_from_ptr(&sqlite3_errmsg(connection))
                );
            } else {
                log::warn!("Transaction dropped without commit or rollback, rolled back");
            }
        }
    }
}
