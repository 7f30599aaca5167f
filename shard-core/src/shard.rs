use crate::{
    Connection, DuplicatePatterns, Entity, Executor, FromRow, Info, Result, Rows, RowsAffected,
    Transaction, Value, fix_args, with_info,
};
use futures::{FutureExt, TryStreamExt};
use std::{any::Any, panic::AssertUnwindSafe, sync::Arc};

/// A named database handle mapping rows onto caller types.
///
/// `E` is either a direct [`Connection`] or the [`Transaction`] handed to the
/// body of [`Shard::transact`]: every method except `transact` behaves the same
/// on both. All arguments are normalized with [`fix_args`] and every failure
/// carries an [`Info`] with the statement and its arguments.
///
/// ```rust,ignore
/// let mut shard = Shard::<SqliteConnection>::connect("main", "sqlite://:memory:").await?;
/// shard.execute("CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT)", args![]).await?;
/// let id = shard.insert("INSERT INTO users (name) VALUES (?)", args!["alice"]).await?;
/// let name = shard.select_string("SELECT name FROM users WHERE id = ?", args![id]).await?;
/// assert_eq!(name.as_deref(), Some("alice"));
/// ```
#[derive(Debug)]
pub struct Shard<E: Executor> {
    name: Arc<str>,
    patterns: Arc<DuplicatePatterns>,
    executor: E,
}

fn fixed(mut args: Vec<Value>) -> Vec<Value> {
    fix_args(&mut args);
    args
}

impl<C: Connection> Shard<C> {
    /// Wraps a live connection, failing when it does not answer a ping.
    pub async fn new(name: impl Into<Arc<str>>, mut connection: C) -> Result<Self> {
        let name = name.into();
        connection.ping().await.map_err(|e| {
            let e = with_info(e, Info::new().with("DBName", &name));
            log::error!("{:#}", e);
            e
        })?;
        log::debug!("Shard `{}` is connected", name);
        Ok(Self {
            name,
            patterns: Default::default(),
            executor: connection,
        })
    }

    /// Opens a connection from a driver prefixed URL and wraps it.
    pub async fn connect(name: impl Into<Arc<str>>, url: &str) -> Result<Self> {
        let connection = C::connect(url).await?;
        Self::new(name, connection).await
    }

    /// Runs `body` inside a transaction.
    ///
    /// The transaction is committed when `body` succeeds and rolled back when it
    /// fails. A rollback that fails as well produces an error carrying both
    /// failures. When `body` panics the transaction is rolled back, a failed
    /// rollback is logged, then the panic resumes.
    ///
    /// The handle given to `body` is bound to the transaction and does not offer
    /// `transact` itself, so transactions cannot be nested.
    pub async fn transact<'c, T, F>(&'c mut self, body: F) -> Result<T>
    where
        F: AsyncFnOnce(&mut Shard<C::Transaction<'c>>) -> Result<T>,
    {
        let name = self.name.clone();
        let patterns = self.patterns.clone();
        let transaction = self.executor.begin().await.map_err(|e| {
            with_info(
                e,
                Info::new()
                    .with("DBName", &name)
                    .with("Description", "Could not begin transaction"),
            )
        })?;
        log::debug!("Begin transaction on `{}`", name);
        let mut shard = Shard {
            name,
            patterns,
            executor: transaction,
        };
        let outcome = AssertUnwindSafe(body(&mut shard)).catch_unwind().await;
        let Shard {
            name,
            executor: transaction,
            ..
        } = shard;
        match outcome {
            Ok(Ok(value)) => {
                transaction.commit().await.map_err(|e| {
                    with_info(
                        e,
                        Info::new().with("Description", "Could not commit transaction"),
                    )
                })?;
                log::debug!("Commit transaction on `{}`", name);
                Ok(value)
            }
            Ok(Err(error)) => {
                log::debug!("Rollback transaction on `{}`", name);
                match transaction.rollback().await {
                    Ok(()) => Err(error),
                    Err(rollback) => Err(Info::new()
                        .with("TxFuncError", format!("{:#}", error))
                        .with("TxRollbackError", format!("{:#}", rollback))
                        .error("txFunc has error")),
                }
            }
            Err(panic) => {
                if let Err(e) = transaction.rollback().await {
                    let e = with_info(
                        e,
                        Info::new()
                            .with("Description", "Panic during sql transaction")
                            .with("PanicErr", panic_message(panic.as_ref())),
                    );
                    log::error!("{:#}", e);
                }
                std::panic::resume_unwind(panic)
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(v) = payload.downcast_ref::<&'static str>() {
        v
    } else if let Some(v) = payload.downcast_ref::<String>() {
        v
    } else {
        "Box<dyn Any>"
    }
}

impl<E: Executor> Shard<E> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn patterns(&self) -> &DuplicatePatterns {
        &self.patterns
    }

    /// Replaces the table used by the `*_ignore_duplicate*` methods.
    pub fn with_patterns(mut self, patterns: DuplicatePatterns) -> Self {
        self.patterns = patterns.into();
        self
    }

    pub fn executor(&mut self) -> &mut E {
        &mut self.executor
    }

    pub fn into_inner(self) -> E {
        self.executor
    }

    async fn rows<'s>(&'s mut self, sql: &str, args: &[Value]) -> Result<Rows<'s>> {
        self.executor
            .query(sql, args)
            .await
            .map_err(|e| with_info(e, Info::query(sql, args)))
    }

    async fn exec(&mut self, sql: &str, args: &[Value]) -> Result<RowsAffected> {
        self.executor
            .execute(sql, args)
            .await
            .map_err(|e| with_info(e, Info::query(sql, args)))
    }

    /// Runs a statement returning rows, with normalized arguments.
    pub async fn query(&mut self, sql: &str, args: Vec<Value>) -> Result<Rows<'_>> {
        let args = fixed(args);
        self.rows(sql, &args).await
    }

    /// Runs a statement modifying data, with normalized arguments.
    pub async fn execute(&mut self, sql: &str, args: Vec<Value>) -> Result<RowsAffected> {
        let args = fixed(args);
        self.exec(sql, &args).await
    }

    /// Fetches at most one row of a single column.
    ///
    /// `None` when there is no row, whatever the columns. An error when there is
    /// more than one row, or when the value is NULL and `T` is not an `Option`.
    pub async fn select_value<T: FromRow>(
        &mut self,
        sql: &str,
        args: Vec<Value>,
    ) -> Result<Option<T>> {
        let args = fixed(args);
        let info = || Info::query(sql, &args);
        let mut rows = self.rows(sql, &args).await?;
        let Some(row) = rows
            .stream
            .try_next()
            .await
            .map_err(|e| with_info(e, info()))?
        else {
            return Ok(None);
        };
        T::check_columns(rows.columns()).map_err(|e| with_info(e, info()))?;
        let value = T::from_row_not_null(&row).map_err(|e| with_info(e, info()))?;
        if rows
            .stream
            .try_next()
            .await
            .map_err(|e| with_info(e, info()))?
            .is_some()
        {
            return Err(info().error("queryOne query returned too many rows"));
        }
        Ok(Some(value))
    }

    pub async fn select_int(&mut self, sql: &str, args: Vec<Value>) -> Result<Option<i64>> {
        self.select_value(sql, args).await
    }

    pub async fn select_string(&mut self, sql: &str, args: Vec<Value>) -> Result<Option<String>> {
        self.select_value(sql, args).await
    }

    pub async fn select_uint(&mut self, sql: &str, args: Vec<Value>) -> Result<Option<u64>> {
        self.select_value(sql, args).await
    }

    /// Appends one item per row to `items`, in row order.
    ///
    /// `items` must be empty. `T` is either an [`Entity`], filled by column name,
    /// or a scalar [`Column`](crate::Column) type, which requires exactly one
    /// column. When an error occurs while reading the rows, the items appended so
    /// far are left in `items`.
    pub async fn select<T: FromRow>(
        &mut self,
        items: &mut Vec<T>,
        sql: &str,
        args: Vec<Value>,
    ) -> Result<()> {
        let args = fixed(args);
        let info = || Info::query(sql, &args);
        if !items.is_empty() {
            return Err(info().error("Select expects items to be empty"));
        }
        let mut rows = self.rows(sql, &args).await?;
        T::check_columns(rows.columns()).map_err(|e| with_info(e, info()))?;
        while let Some(row) = rows
            .stream
            .try_next()
            .await
            .map_err(|e| with_info(e, info()))?
        {
            items.push(T::from_row(&row).map_err(|e| with_info(e, info()))?);
        }
        Ok(())
    }

    /// Fills `item` from the only row of the result.
    ///
    /// Returns `false` and leaves `item` untouched when there is no row. A `None`
    /// item receives a default instance, an existing one is reused, so columns
    /// that are NULL keep their previous value. More than one row is an error.
    pub async fn select_one<T: Entity>(
        &mut self,
        item: &mut Option<T>,
        sql: &str,
        args: Vec<Value>,
    ) -> Result<bool> {
        let args = fixed(args);
        let info = || Info::query(sql, &args);
        let mut rows = self.rows(sql, &args).await?;
        let Some(row) = rows
            .stream
            .try_next()
            .await
            .map_err(|e| with_info(e, info()))?
        else {
            return Ok(false);
        };
        item.get_or_insert_with(T::default)
            .fill(&row)
            .map_err(|e| with_info(e, info()))?;
        if rows
            .stream
            .try_next()
            .await
            .map_err(|e| with_info(e, info()))?
            .is_some()
        {
            return Err(info().error("scanOne got multiple rows"));
        }
        Ok(true)
    }

    /// Runs an insert, returning the identifier of the inserted row.
    pub async fn insert(&mut self, sql: &str, args: Vec<Value>) -> Result<i64> {
        let args = fixed(args);
        let result = self.exec(sql, &args).await?;
        result.last_affected_id.ok_or_else(|| {
            Info::query(sql, &args).error("The driver did not report the last insert id")
        })
    }

    pub async fn insert_ignore_id(&mut self, sql: &str, args: Vec<Value>) -> Result<()> {
        self.insert(sql, args).await.map(|_| ())
    }

    /// Runs an insert, treating a duplicate entry as success.
    pub async fn insert_ignore_duplicates(&mut self, sql: &str, args: Vec<Value>) -> Result<()> {
        match self.insert(sql, args).await {
            Err(e) if self.patterns.is_duplicate_entry_error(&e) => {
                log::debug!("Ignored duplicate entry: {:#}", e);
                Ok(())
            }
            result => result.map(|_| ()),
        }
    }

    /// Runs a statement, treating a duplicate schema object or entry as success.
    ///
    /// `None` when the error was ignored.
    pub async fn exec_ignore_duplicate_error(
        &mut self,
        sql: &str,
        args: Vec<Value>,
    ) -> Result<Option<RowsAffected>> {
        match self.execute(sql, args).await {
            Ok(v) => Ok(Some(v)),
            Err(e) if self.patterns.is_duplicate_exec_error(&e) => {
                log::debug!("Ignored duplicate: {:#}", e);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Runs a statement, returning the number of rows affected.
    pub async fn update(&mut self, sql: &str, args: Vec<Value>) -> Result<u64> {
        self.execute(sql, args).await.map(|v| v.rows_affected)
    }

    pub async fn update_one(&mut self, sql: &str, args: Vec<Value>) -> Result<()> {
        self.update_num(1, sql, args).await
    }

    /// Runs a statement that must affect exactly `expected` rows.
    pub async fn update_num(&mut self, expected: u64, sql: &str, args: Vec<Value>) -> Result<()> {
        let args = fixed(args);
        let affected = self.exec(sql, &args).await?.rows_affected;
        if affected != expected {
            return Err(Info::query(sql, &args)
                .with("ExpectedRows", expected)
                .with("AffectedRows", affected)
                .error("UpdateNum affected unexpected number of rows"));
        }
        Ok(())
    }
}
