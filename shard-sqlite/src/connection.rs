use crate::{
    CBox, SqliteTransaction, URL_PREFIX,
    bind::bind_values,
    error_message_from_ptr,
    extract::{extract_cell, extract_name},
};
use async_stream::stream;
use libsqlite3_sys::{
    SQLITE_DONE, SQLITE_OK, SQLITE_OPEN_CREATE, SQLITE_OPEN_FULLMUTEX,
    SQLITE_OPEN_READWRITE, SQLITE_OPEN_URI, SQLITE_ROW, sqlite3, sqlite3_busy_timeout, sqlite3_changes64,
    sqlite3_close, sqlite3_column_count, sqlite3_db_handle, sqlite3_errmsg, sqlite3_finalize,
    sqlite3_last_insert_rowid, sqlite3_open_v2, sqlite3_prepare_v2, sqlite3_step, sqlite3_stmt,
    sqlite3_total_changes64,
};
use shard_core::{
    Connection, Context, Error, Executor, Result, Row, RowNames, Rows, RowsAffected, Value,
    stream::{Stream, StreamExt},
    truncate_long,
};
use std::{
    ffi::{CStr, CString, c_int},
    future::Future,
    ptr,
    sync::atomic::{AtomicPtr, Ordering},
    time::Duration,
};
use tokio::task::spawn_blocking;

/// How long a statement waits for a lock held by another connection.
pub const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// A SQLite database handle, opened in serialized threading mode.
pub struct SqliteConnection {
    pub(crate) connection: CBox<*mut sqlite3>,
}

fn step_error(statement: *mut sqlite3_stmt) -> Error {
    let error = unsafe {
        Error::msg(
            error_message_from_ptr(&sqlite3_errmsg(sqlite3_db_handle(statement))).to_string(),
        )
    };
    log::error!("{:#}", error);
    error
}

impl SqliteConnection {
    /// Sets how long a locked database is retried before the statement fails
    /// with `database is locked`.
    pub fn set_busy_timeout(&mut self, timeout: Duration) -> Result<()> {
        let millis = c_int::try_from(timeout.as_millis()).unwrap_or(c_int::MAX);
        let rc = unsafe { sqlite3_busy_timeout(*self.connection, millis) };
        if rc != SQLITE_OK {
            let error = Error::msg(
                error_message_from_ptr(&unsafe { sqlite3_errmsg(*self.connection) }).to_string(),
            )
            .context("Could not set the busy timeout");
            log::error!("{:#}", error);
            return Err(error);
        }
        Ok(())
    }

    /// Compiles `sql` on a blocking thread and binds `args` to it.
    pub(crate) async fn prepare(
        &mut self,
        sql: &str,
        args: &[Value],
    ) -> Result<CBox<*mut sqlite3_stmt>> {
        let connection = AtomicPtr::new(*self.connection);
        let query = sql.to_owned();
        let args = args.to_vec();
        spawn_blocking(move || unsafe {
            let connection = connection.load(Ordering::Relaxed);
            let context = || format!("While preparing the query:\n{}", truncate_long!(query));
            let sql = match CString::new(query.as_bytes()) {
                Ok(sql) => sql,
                Err(e) => {
                    let error =
                        Error::new(e).context("Could not create a CString from the query String");
                    log::error!("{:#}", error);
                    return Err(error);
                }
            };
            let mut statement = CBox::new(ptr::null_mut(), |p| {
                sqlite3_finalize(p);
            });
            let mut tail = ptr::null();
            let rc = sqlite3_prepare_v2(
                connection,
                sql.as_ptr(),
                query.len() as c_int,
                &mut *statement,
                &mut tail,
            );
            if rc != SQLITE_OK {
                let error =
                    Error::msg(error_message_from_ptr(&sqlite3_errmsg(connection)).to_string())
                        .context(context());
                log::error!("{:#}", error);
                return Err(error);
            }
            if statement.is_null() {
                let error = Error::msg("The query does not contain any statement")
                    .context(context());
                log::error!("{:#}", error);
                return Err(error);
            }
            if !tail.is_null()
                && !CStr::from_ptr(tail)
                    .to_bytes()
                    .iter()
                    .all(u8::is_ascii_whitespace)
            {
                let error = Error::msg("Cannot prepare more than one statement at a time")
                    .context(context());
                log::error!("{:#}", error);
                return Err(error);
            }
            bind_values(*statement, &args)?;
            Ok(statement)
        })
        .await?
    }

    /// Steps `statement` yielding one row each time SQLite produces one.
    ///
    /// The statement is finalized when the stream is dropped.
    pub(crate) fn run_prepared(
        statement: CBox<*mut sqlite3_stmt>,
        labels: RowNames,
    ) -> impl Stream<Item = Result<Row>> + Send {
        unsafe {
            stream! {
                let count = labels.len() as c_int;
                loop {
                    match sqlite3_step(*statement) {
                        SQLITE_DONE => {
                            break;
                        }
                        SQLITE_ROW => {
                            yield Ok(Row::new(
                                labels.clone(),
                                (0..count).map(|i| extract_cell(*statement, i)).collect(),
                            ));
                        }
                        _ => {
                            yield Err(step_error(*statement));
                            break;
                        }
                    }
                }
            }
        }
    }
}

impl Executor for SqliteConnection {
    fn execute(
        &mut self,
        sql: &str,
        args: &[Value],
    ) -> impl Future<Output = Result<RowsAffected>> + Send {
        async move {
            let statement = self.prepare(sql, args).await?;
            unsafe {
                let connection = *self.connection;
                let before = sqlite3_total_changes64(connection);
                loop {
                    match sqlite3_step(*statement) {
                        SQLITE_ROW => continue,
                        SQLITE_DONE => break,
                        _ => return Err(step_error(*statement)),
                    }
                }
                let changed = sqlite3_total_changes64(connection) != before;
                Ok(RowsAffected {
                    rows_affected: if changed {
                        sqlite3_changes64(connection) as u64
                    } else {
                        0
                    },
                    last_affected_id: Some(sqlite3_last_insert_rowid(connection)),
                })
            }
        }
    }

    fn query<'s>(
        &'s mut self,
        sql: &str,
        args: &[Value],
    ) -> impl Future<Output = Result<Rows<'s>>> + Send {
        async move {
            let statement = self.prepare(sql, args).await?;
            let labels = unsafe {
                let count = sqlite3_column_count(*statement);
                (0..count)
                    .map(|i| extract_name(*statement, i))
                    .collect::<Result<RowNames>>()?
            };
            Ok(Rows::new(
                labels.clone(),
                Self::run_prepared(statement, labels).boxed(),
            ))
        }
    }
}

impl Connection for SqliteConnection {
    type Transaction<'c> = SqliteTransaction<'c>;

    /// Opens `sqlite://<path>?<parameters>`, where the remainder after the scheme
    /// is a SQLite URI filename (`sqlite://:memory:`, `sqlite://data.db?mode=ro`).
    async fn connect(url: &str) -> Result<SqliteConnection> {
        let Some(path) = url.strip_prefix(URL_PREFIX) else {
            let error = Error::msg(format!(
                "Expected sqlite connection url to start with `{}`",
                URL_PREFIX
            ));
            log::error!("{:#}", error);
            return Err(error);
        };
        let context = || format!("Error while decoding connection URL: `{}`", url);
        let path = CString::new(format!("file:{}", path)).with_context(context)?;
        let mut connection = CBox::new(ptr::null_mut(), |p| unsafe {
            sqlite3_close(p);
        });
        let rc = unsafe {
            sqlite3_open_v2(
                path.as_ptr(),
                &mut *connection,
                SQLITE_OPEN_URI | SQLITE_OPEN_READWRITE | SQLITE_OPEN_CREATE | SQLITE_OPEN_FULLMUTEX,
                ptr::null(),
            )
        };
        if rc != SQLITE_OK {
            let message = if connection.is_null() {
                "Could not allocate the connection".to_string()
            } else {
                error_message_from_ptr(&unsafe { sqlite3_errmsg(*connection) }).to_string()
            };
            let error = Error::msg(message).context(format!("Could not open `{}`", url));
            log::error!("{:#}", error);
            return Err(error);
        }
        let mut connection = Self { connection };
        connection.set_busy_timeout(BUSY_TIMEOUT)?;
        Ok(connection)
    }

    fn ping(&mut self) -> impl Future<Output = Result<()>> + Send {
        async move { self.execute("SELECT 1", &[]).await.map(|_| ()) }
    }

    fn begin(&mut self) -> impl Future<Output = Result<SqliteTransaction<'_>>> + Send {
        SqliteTransaction::new(self)
    }
}
