//! Read-only guard for outgoing SQL.
//!
//! Every statement is classified before a connection is opened. The police
//! log is only ever read, so anything that would write or change schema is
//! refused here instead of reaching the store. Text the parser cannot read
//! is only let through when it opens with a reading keyword.

mod parser;

pub use parser::{classify_sql, SqlClassifier};

use crate::error::{Result, SecureCheckError};
use std::fmt;
use tracing::debug;

/// Safety level classification for SQL statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SafetyLevel {
    /// Statements that only read (SELECT, EXPLAIN, SHOW).
    ReadOnly,
    /// Data modification (INSERT, UPDATE, REPLACE).
    Mutating,
    /// Data loss or schema changes (DELETE, DROP, TRUNCATE, ALTER, CREATE).
    Destructive,
    /// The parser could not make sense of the text.
    Unknown,
}

impl SafetyLevel {
    /// Returns true if a statement at this level may be sent to the store as is.
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::ReadOnly)
    }
}

/// Leading keywords of statements that only read.
const READING_KEYWORDS: &[&str] = &["SELECT", "WITH", "EXPLAIN", "SHOW", "DESCRIBE", "DESC"];

/// The first keyword of `sql`, upper-cased. Leading parentheses are skipped.
fn leading_keyword(sql: &str) -> String {
    sql.trim_start()
        .trim_start_matches(|c: char| c == '(' || c.is_whitespace())
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect::<String>()
        .to_ascii_uppercase()
}

impl fmt::Display for SafetyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadOnly => write!(f, "Read-only"),
            Self::Mutating => write!(f, "Mutating"),
            Self::Destructive => write!(f, "Destructive"),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}

/// The type of SQL statement detected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatementType {
    Select,
    Insert,
    Update,
    Delete,
    Drop,
    Truncate,
    Alter,
    Create,
    Grant,
    Revoke,
    Explain,
    Show,
    /// More than one statement in a single string.
    Multiple(Box<StatementType>),
    /// Nothing but whitespace or comments.
    Empty,
    /// Statement type could not be determined.
    Unknown,
}

impl fmt::Display for StatementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Select => write!(f, "SELECT"),
            Self::Insert => write!(f, "INSERT"),
            Self::Update => write!(f, "UPDATE"),
            Self::Delete => write!(f, "DELETE"),
            Self::Drop => write!(f, "DROP"),
            Self::Truncate => write!(f, "TRUNCATE"),
            Self::Alter => write!(f, "ALTER"),
            Self::Create => write!(f, "CREATE"),
            Self::Grant => write!(f, "GRANT"),
            Self::Revoke => write!(f, "REVOKE"),
            Self::Explain => write!(f, "EXPLAIN"),
            Self::Show => write!(f, "SHOW"),
            Self::Multiple(inner) => write!(f, "Multiple ({})", inner),
            Self::Empty => write!(f, "Empty"),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Result of classifying a SQL statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationResult {
    /// The determined safety level.
    pub level: SafetyLevel,
    /// The type of statement(s) detected.
    pub statement_type: StatementType,
}

impl ClassificationResult {
    /// Creates a new classification result.
    pub fn new(level: SafetyLevel, statement_type: StatementType) -> Self {
        Self {
            level,
            statement_type,
        }
    }
}

/// Fails with a query error unless `sql` is a single read-only statement.
///
/// Text the parser cannot handle is let through, so that the store reports
/// its own syntax error, only if it starts with a reading keyword such as
/// `SELECT`. Anything else it cannot classify is refused.
pub fn ensure_read_only(sql: &str) -> Result<()> {
    let classification = classify_sql(sql);

    match (&classification.level, &classification.statement_type) {
        (_, StatementType::Empty) => Err(SecureCheckError::query("Empty SQL statement")),
        (_, StatementType::Multiple(_)) => Err(SecureCheckError::query(
            "Only a single statement can be run at a time",
        )),
        (SafetyLevel::Unknown, _) => {
            let keyword = leading_keyword(sql);
            // Without a parse there is no telling where a second statement starts
            if sql.trim().trim_end_matches(';').contains(';') {
                Err(SecureCheckError::query(
                    "Only a single statement can be run at a time",
                ))
            } else if READING_KEYWORDS.contains(&keyword.as_str()) {
                debug!("Unparsed {} statement, passing to the store", keyword);
                Ok(())
            } else {
                Err(SecureCheckError::query(format!(
                    "Refusing to run statement starting with '{keyword}': the police log is read-only"
                )))
            }
        }
        (level, _) if level.is_allowed() => Ok(()),
        (level, stmt_type) => Err(SecureCheckError::query(format!(
            "Refusing to run {stmt_type} statement ({level}): the police log is read-only"
        ))),
    }
}
