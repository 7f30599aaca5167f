use crate::Error;

/// What a duplicate error is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateKind {
    /// A schema object that already exists: column, key, index or table.
    Schema,
    /// A row violating a unique key.
    Entry,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Matcher {
    Prefix(&'static str),
    Contains(&'static str),
}

impl Matcher {
    pub fn matches(&self, message: &str) -> bool {
        match self {
            Matcher::Prefix(v) => message.starts_with(v),
            Matcher::Contains(v) => message.contains(v),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DuplicatePattern {
    pub kind: DuplicateKind,
    pub matcher: Matcher,
}

impl DuplicatePattern {
    pub const fn schema(matcher: Matcher) -> Self {
        Self {
            kind: DuplicateKind::Schema,
            matcher,
        }
    }
    pub const fn entry(matcher: Matcher) -> Self {
        Self {
            kind: DuplicateKind::Entry,
            matcher,
        }
    }
}

/// Ordered table of driver messages recognized as benign duplicates.
///
/// Matching is done against the root cause of an error, which is the message
/// reported by the driver. The default table covers MySQL, SQLite and
/// PostgreSQL, more patterns can be appended with [`DuplicatePatterns::push`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicatePatterns {
    patterns: Vec<DuplicatePattern>,
}

const DEFAULT_PATTERNS: &[DuplicatePattern] = &[
    // MySQL
    DuplicatePattern::schema(Matcher::Prefix("Error 1060: Duplicate column name")),
    DuplicatePattern::schema(Matcher::Prefix("Error 1061: Duplicate key name")),
    DuplicatePattern::schema(Matcher::Prefix("Error 1050: Table")),
    DuplicatePattern::schema(Matcher::Prefix("Error 1022: Can't write; duplicate key in table")),
    DuplicatePattern::entry(Matcher::Prefix("Error 1062: Duplicate entry")),
    DuplicatePattern::entry(Matcher::Contains("Duplicate entry")),
    // SQLite
    DuplicatePattern::schema(Matcher::Prefix("duplicate column name")),
    DuplicatePattern::schema(Matcher::Contains("already exists")),
    DuplicatePattern::entry(Matcher::Prefix("UNIQUE constraint failed")),
    // PostgreSQL
    DuplicatePattern::entry(Matcher::Prefix("duplicate key value violates unique constraint")),
];

impl DuplicatePatterns {
    /// A table without any pattern: nothing is classified as duplicate.
    pub fn empty() -> Self {
        Self {
            patterns: Vec::new(),
        }
    }

    pub fn push(&mut self, pattern: DuplicatePattern) -> &mut Self {
        self.patterns.push(pattern);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = &DuplicatePattern> {
        self.patterns.iter()
    }

    /// The kind of the first pattern matching `message`.
    pub fn classify(&self, message: &str) -> Option<DuplicateKind> {
        self.patterns
            .iter()
            .find(|v| v.matcher.matches(message))
            .map(|v| v.kind)
    }

    /// Duplicate schema object or duplicate entry, the errors idempotent DDL ignores.
    pub fn is_duplicate_exec_error(&self, error: &Error) -> bool {
        self.classify(&error.root_cause().to_string()).is_some()
    }

    /// Duplicate entry only.
    pub fn is_duplicate_entry_error(&self, error: &Error) -> bool {
        let message = error.root_cause().to_string();
        self.patterns
            .iter()
            .filter(|v| v.kind == DuplicateKind::Entry)
            .any(|v| v.matcher.matches(&message))
    }
}

impl Default for DuplicatePatterns {
    fn default() -> Self {
        Self {
            patterns: DEFAULT_PATTERNS.to_vec(),
        }
    }
}

impl Extend<DuplicatePattern> for DuplicatePatterns {
    fn extend<T: IntoIterator<Item = DuplicatePattern>>(&mut self, iter: T) {
        self.patterns.extend(iter);
    }
}

#[cfg(test)]
mod tests {
    use super::{DuplicateKind, DuplicatePattern, DuplicatePatterns, Matcher};
    use crate::{Info, with_info};
    use anyhow::Error;

    fn wrapped(message: &'static str) -> Error {
        with_info(Error::msg(message), Info::query("INSERT INTO t VALUES (?)", &[]))
    }

    #[test]
    fn mysql_messages() {
        let patterns = DuplicatePatterns::default();
        for message in [
            "Error 1060: Duplicate column name 'email'",
            "Error 1061: Duplicate key name 'idx_email'",
            "Error 1050: Table 'users' already exists",
            "Error 1022: Can't write; duplicate key in table 'users'",
        ] {
            assert!(patterns.is_duplicate_exec_error(&wrapped(message)), "{message}");
            assert!(!patterns.is_duplicate_entry_error(&wrapped(message)), "{message}");
        }
        let entry = wrapped("Error 1062: Duplicate entry 'alice' for key 'name'");
        assert!(patterns.is_duplicate_exec_error(&entry));
        assert!(patterns.is_duplicate_entry_error(&entry));
        assert!(!patterns.is_duplicate_exec_error(&wrapped("Error 1064: You have an error")));
    }

    #[test]
    fn sqlite_and_postgres_messages() {
        let patterns = DuplicatePatterns::default();
        assert_eq!(
            patterns.classify("UNIQUE constraint failed: users.name"),
            Some(DuplicateKind::Entry)
        );
        assert_eq!(
            patterns.classify("table users already exists"),
            Some(DuplicateKind::Schema)
        );
        assert_eq!(
            patterns.classify("duplicate column name: email"),
            Some(DuplicateKind::Schema)
        );
        assert_eq!(
            patterns.classify(r#"duplicate key value violates unique constraint "users_pkey""#),
            Some(DuplicateKind::Entry)
        );
        assert_eq!(patterns.classify("no such table: users"), None);
    }

    #[test]
    fn only_root_cause_is_inspected() {
        let patterns = DuplicatePatterns::default();
        let error = Error::msg("syntax error").context("Duplicate entry");
        assert!(!patterns.is_duplicate_exec_error(&error));
    }

    #[test]
    fn extensible() {
        let mut patterns = DuplicatePatterns::empty();
        assert!(!patterns.is_duplicate_exec_error(&wrapped("Error 1062: Duplicate entry")));
        patterns.push(DuplicatePattern::entry(Matcher::Contains("ORA-00001")));
        let error = wrapped("ORA-00001: unique constraint violated");
        assert!(patterns.is_duplicate_entry_error(&error));
        assert_eq!(patterns.iter().count(), 1);
    }
}
