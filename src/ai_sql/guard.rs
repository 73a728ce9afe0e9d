//! Optional check on generated SQL before it reaches the database
//!
//! The default mode lets every statement through unchanged, which keeps the
//! service's original behaviour: whatever the model writes is executed,
//! including DDL, DML and several statements at once. `ReadOnly` is opt-in
//! (`ai_sql.read_only = true`) and only accepts a single read statement.
//! This is a keyword check, not a parser; a read-only database account is
//! still the real boundary. A `WITH` statement is refused when any word of it
//! is a data-modifying keyword, since MySQL 8 allows `WITH ... UPDATE` and
//! `WITH ... DELETE`. That also refuses reads that merely mention such a word,
//! for example inside a string literal.

/// How generated statements are screened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GuardMode {
    #[default]
    Permissive,
    ReadOnly,
}

const READ_KEYWORDS: &[&str] = &["SELECT", "SHOW", "DESCRIBE", "DESC", "EXPLAIN", "WITH"];

const WRITE_KEYWORDS: &[&str] = &["INSERT", "UPDATE", "DELETE", "REPLACE"];

#[derive(Debug, Clone, Copy, Default)]
pub struct StatementGuard {
    mode: GuardMode,
}

impl StatementGuard {
    pub fn new(mode: GuardMode) -> Self {
        Self { mode }
    }

    pub fn from_read_only(read_only: bool) -> Self {
        Self::new(if read_only {
            GuardMode::ReadOnly
        } else {
            GuardMode::Permissive
        })
    }

    pub fn mode(&self) -> GuardMode {
        self.mode
    }

    /// Check `sql`; the error names why it was refused
    pub fn check(&self, sql: &str) -> Result<(), String> {
        if self.mode == GuardMode::Permissive {
            return Ok(());
        }

        let statement = sql.trim();
        if statement.is_empty() {
            return Err("Empty SQL query".to_string());
        }

        let body = statement.strip_suffix(';').unwrap_or(statement);
        if body.contains(';') {
            return Err("Multiple statements are not allowed in read-only mode".to_string());
        }

        let keyword = body
            .split(|c: char| c.is_whitespace() || c == '(')
            .find(|word| !word.is_empty())
            .unwrap_or_default()
            .to_ascii_uppercase();

        if !READ_KEYWORDS.contains(&keyword.as_str()) {
            return Err(format!(
                "{keyword} statements are not allowed in read-only mode"
            ));
        }

        if keyword == "WITH" {
            if let Some(write) = body
                .split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                .map(str::to_ascii_uppercase)
                .find(|word| WRITE_KEYWORDS.contains(&word.as_str()))
            {
                return Err(format!(
                    "WITH ... {write} statements are not allowed in read-only mode"
                ));
            }
        }

        Ok(())
    }
}
