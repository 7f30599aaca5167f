use crate::{Error, Value, separated_by, truncate_long};
use std::{
    borrow::Cow,
    fmt::{self, Display, Write},
};
use time::OffsetDateTime;

/// Context metadata attached to every error returned by this crate.
///
/// An `Info` is added to the error chain through [`anyhow::Context`], so the
/// original driver error stays the root cause while the statement, its arguments
/// and any operation specific detail travel with it. Retrieve it with
/// `error.downcast_ref::<Info>()`.
#[derive(Debug, Clone)]
pub struct Info {
    entries: Vec<(Cow<'static, str>, String)>,
    time: OffsetDateTime,
}

impl Info {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            time: OffsetDateTime::now_utc(),
        }
    }

    /// Metadata for a failure tied to a specific statement.
    pub fn query(sql: &str, args: &[Value]) -> Self {
        let mut rendered = String::with_capacity(2 + args.len() * 8);
        rendered.push('[');
        separated_by(
            &mut rendered,
            args,
            |out, v| {
                let _ = write!(out, "{v}");
            },
            ", ",
        );
        rendered.push(']');
        Self::new()
            .with("Query", truncate_long!(sql).to_string().trim_end())
            .with("Args", rendered)
    }

    pub fn with(mut self, key: impl Into<Cow<'static, str>>, value: impl Display) -> Self {
        self.entries.push((key.into(), value.to_string()));
        self
    }

    /// Merges the entries of `other`, later keys replace earlier ones.
    pub fn extend(mut self, other: Info) -> Self {
        for (key, value) in other.entries {
            match self.entries.iter_mut().find(|(k, _)| *k == key) {
                Some(entry) => entry.1 = value,
                None => self.entries.push((key, value)),
            }
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_ref(), v.as_str()))
    }

    /// When the failure was recorded.
    pub fn time(&self) -> OffsetDateTime {
        self.time
    }

    /// Wraps a fixed message with this metadata.
    pub fn error(self, message: impl Display + fmt::Debug + Send + Sync + 'static) -> Error {
        Error::msg(message).context(self)
    }
}

impl Default for Info {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for Info {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        separated_by(
            &mut out,
            &self.entries,
            |out, (k, v)| {
                let _ = write!(out, "{k}: {v}");
            },
            ", ",
        );
        f.write_str(&out)
    }
}

/// Attaches `info` to `error`.
///
/// When the chain already carries an `Info` (for example the column and bytes of
/// a decoding failure) the entries are merged into a single `Info` with the
/// existing keys taking precedence, otherwise `info` is added as context.
pub fn with_info(mut error: Error, info: Info) -> Error {
    if let Some(existing) = error.downcast_mut::<Info>() {
        let time = existing.time;
        *existing = Info { time, ..info.extend(existing.clone()) };
        return error;
    }
    error.context(info)
}

/// Renders raw column bytes for error metadata.
pub(crate) fn printable_bytes(bytes: &[u8]) -> String {
    format!("{:?}", String::from_utf8_lossy(bytes))
}

#[cfg(test)]
mod tests {
    use super::{Info, with_info};
    use crate::{Value, args};

    #[test]
    fn query_info() {
        let info = Info::query("SELECT * FROM users WHERE name = ?", &args!["alice", 3]);
        assert_eq!(info.get("Query"), Some("SELECT * FROM users WHERE name = ?"));
        assert_eq!(info.get("Args"), Some(r#"["alice", 3]"#));
        assert_eq!(info.get("Missing"), None);
        let info = Info::query("DELETE FROM users", &[Value::Null]);
        assert_eq!(info.get("Args"), Some("[NULL]"));
    }

    #[test]
    fn extend_replaces_keys() {
        let info = Info::new()
            .with("A", 1)
            .with("B", 2)
            .extend(Info::new().with("B", 3).with("C", 4));
        assert_eq!(
            info.entries().collect::<Vec<_>>(),
            [("A", "1"), ("B", "3"), ("C", "4")]
        );
        assert_eq!(info.to_string(), "A: 1, B: 3, C: 4");
    }

    #[test]
    fn with_info_merges() {
        let error = Info::new().with("Column", "age").error("Bad");
        let error = with_info(error, Info::query("SELECT age", &[]));
        let info = error.downcast_ref::<Info>().unwrap();
        assert_eq!(info.get("Query"), Some("SELECT age"));
        assert_eq!(info.get("Column"), Some("age"));
        assert_eq!(error.chain().count(), 2);

        let error = with_info(anyhow::Error::msg("driver"), Info::query("SELECT 1", &[]));
        assert_eq!(error.root_cause().to_string(), "driver");
        assert_eq!(error.to_string(), "Query: SELECT 1, Args: []");
    }

    #[test]
    fn error_keeps_message_as_root() {
        let error = Info::new().with("ExpectedRows", 1).error("Unexpected");
        assert_eq!(error.root_cause().to_string(), "Unexpected");
        let info = error.downcast_ref::<Info>().expect("Info is in the chain");
        assert_eq!(info.get("ExpectedRows"), Some("1"));
    }
}
