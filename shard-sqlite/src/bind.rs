use crate::error_message_from_ptr;
use libsqlite3_sys::*;
use shard_core::{Error, Result, Value, truncate_long};
use std::{
    ffi::{CStr, c_int},
    os::raw::{c_char, c_void},
};

/// Binds `args` to the positional parameters of `statement`.
pub(crate) unsafe fn bind_values(statement: *mut sqlite3_stmt, args: &[Value]) -> Result<()> {
    unsafe {
        let expected = sqlite3_bind_parameter_count(statement) as usize;
        if expected != args.len() {
            let error = Error::msg(format!(
                "The query expects {} parameters but {} were provided",
                expected,
                args.len()
            ));
            log::error!("{:#}", error);
            return Err(error);
        }
        for (i, value) in args.iter().enumerate() {
            bind_index(statement, value, i as c_int + 1)?;
        }
        Ok(())
    }
}

unsafe fn bind_index(statement: *mut sqlite3_stmt, value: &Value, index: c_int) -> Result<()> {
    unsafe {
        let rc = match value {
            Value::Null
            | Value::Boolean(None)
            | Value::Int8(None)
            | Value::Int16(None)
            | Value::Int32(None)
            | Value::Int64(None)
            | Value::UInt8(None)
            | Value::UInt16(None)
            | Value::UInt32(None)
            | Value::UInt64(None)
            | Value::Float32(None)
            | Value::Float64(None)
            | Value::Varchar(None)
            | Value::Blob(None) => sqlite3_bind_null(statement, index),
            Value::Boolean(Some(v)) => sqlite3_bind_int(statement, index, *v as c_int),
            Value::Int8(Some(v)) => sqlite3_bind_int(statement, index, *v as c_int),
            Value::Int16(Some(v)) => sqlite3_bind_int(statement, index, *v as c_int),
            Value::Int32(Some(v)) => sqlite3_bind_int(statement, index, *v as c_int),
            Value::Int64(Some(v)) => sqlite3_bind_int64(statement, index, *v),
            Value::UInt8(Some(v)) => sqlite3_bind_int(statement, index, *v as c_int),
            Value::UInt16(Some(v)) => sqlite3_bind_int(statement, index, *v as c_int),
            Value::UInt32(Some(v)) => sqlite3_bind_int64(statement, index, *v as sqlite3_int64),
            Value::UInt64(Some(v)) => {
                let Ok(v) = sqlite3_int64::try_from(*v) else {
                    let error = Error::msg(format!(
                        "Cannot bind u64 value `{}` into sqlite integer because it's out of bounds",
                        v
                    ));
                    log::error!("{:#}", error);
                    return Err(error);
                };
                sqlite3_bind_int64(statement, index, v)
            }
            Value::Float32(Some(v)) => sqlite3_bind_double(statement, index, *v as f64),
            Value::Float64(Some(v)) => sqlite3_bind_double(statement, index, *v),
            Value::Varchar(Some(v)) => sqlite3_bind_text(
                statement,
                index,
                v.as_ptr() as *const c_char,
                v.len() as c_int,
                SQLITE_TRANSIENT(),
            ),
            Value::Blob(Some(v)) => sqlite3_bind_blob(
                statement,
                index,
                v.as_ptr() as *const c_void,
                v.len() as c_int,
                SQLITE_TRANSIENT(),
            ),
        };
        if rc != SQLITE_OK {
            let db = sqlite3_db_handle(statement);
            let query = sqlite3_sql(statement);
            let error = Error::msg(error_message_from_ptr(&sqlite3_errmsg(db)).to_string())
                .context(format!(
                    "Cannot bind parameter {} to query:\n{}",
                    index,
                    truncate_long!(CStr::from_ptr(query).to_string_lossy())
                ));
            log::error!("{:#}", error);
            return Err(error);
        }
        Ok(())
    }
}
