use libsqlite3_sys::*;
use shard_core::{Cell, Result};
use std::{
    ffi::{CStr, c_int},
    slice,
};

/// Raw bytes of a column: blobs verbatim, everything else in its text form.
pub(crate) fn extract_cell(statement: *mut sqlite3_stmt, index: c_int) -> Cell {
    unsafe {
        let ptr = match sqlite3_column_type(statement, index) {
            SQLITE_NULL => return Cell::NULL,
            SQLITE_BLOB => sqlite3_column_blob(statement, index) as *const u8,
            _ => sqlite3_column_text(statement, index),
        };
        let len = sqlite3_column_bytes(statement, index) as usize;
        if ptr.is_null() || len == 0 {
            return Cell::new(Vec::<u8>::new());
        }
        Cell::new(slice::from_raw_parts(ptr, len))
    }
}

pub(crate) fn extract_name(statement: *mut sqlite3_stmt, index: c_int) -> Result<String> {
    unsafe {
        Ok(CStr::from_ptr(sqlite3_column_name(statement, index))
            .to_str()?
            .into())
    }
}
