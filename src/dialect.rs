use crate::error::{Error, Result};

/// Placeholder style of the target database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
    /// `$1, $2, ...`
    #[default]
    Postgres,
    /// `:1, :2, ...`
    Oracle,
}

impl Dialect {
    /// Detect the dialect from a connection URL.
    ///
    /// SQLite URLs map to [`Dialect::Postgres`]: SQLx's SQLite driver binds
    /// `$N` parameters by number.
    pub fn from_url(url: &str) -> Result<Self> {
        if url.starts_with("postgres://") || url.starts_with("postgresql://") {
            Ok(Self::Postgres)
        } else if url.starts_with("oracle://") {
            Ok(Self::Oracle)
        } else if url.starts_with("sqlite:") {
            Ok(Self::Postgres)
        } else {
            Err(Error::Config(format!(
                "cannot pick a placeholder dialect for '{url}'. Expected postgres://, oracle:// or sqlite:"
            )))
        }
    }

    /// Prefix placed before argument numbers.
    pub fn arg_prefix(&self) -> &'static str {
        match self {
            Dialect::Postgres => "$",
            Dialect::Oracle => ":",
        }
    }

    /// The `n`-th (1-based) positional placeholder.
    pub fn placeholder(&self, n: usize) -> String {
        format!("{}{}", self.arg_prefix(), n)
    }

    /// Query returning the next value of `sequence` as a single integer.
    ///
    /// For PostgreSQL the name is a string literal, so embedded `'` are
    /// doubled. Oracle takes it as an identifier and it must be one.
    pub fn next_sequence_value(&self, sequence: &str) -> String {
        match self {
            Dialect::Postgres => format!("SELECT nextval('{}')", sequence.replace('\'', "''")),
            Dialect::Oracle => format!("SELECT {sequence}.nextval FROM dual"),
        }
    }
}
