/// Error types for sqlx-dbutils
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Placeholder rewriting pattern failed to compile
    #[error("Failed to compile placeholder pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// Error from SQLx database operations
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Update or delete on a record without a primary key value
    #[error("{operation} failed: no primary key value on {record}")]
    MissingPrimaryKey {
        operation: &'static str,
        record: &'static str,
    },

    /// More than one field of a record was declared as the primary key
    #[error("{record} declares more than one primary key ({first}, {second})")]
    AmbiguousPrimaryKey {
        record: &'static str,
        first: String,
        second: String,
    },

    /// String-mediated conversion failed to parse
    #[error("converting {source_type} ({text:?}) to {target}: {reason}")]
    Parse {
        source_type: &'static str,
        text: String,
        target: &'static str,
        reason: String,
    },

    /// No conversion exists between the two types
    #[error("unsupported conversion, storing {source_type} into {target}")]
    UnsupportedConversion {
        source_type: &'static str,
        target: &'static str,
    },

    /// A result column decoded as none of the supported value kinds
    #[error("column '{0}' has a type that cannot be read into a value")]
    UnsupportedColumn(String),

    /// Conversion error while assigning a scanned column to a record field
    #[error("column '{column}' of {record}: {source}")]
    Column {
        column: String,
        record: &'static str,
        source: Box<Error>,
    },

    /// The next value of a primary key sequence could not be fetched
    #[error("failed to fetch the next value of sequence {sequence}: {source}")]
    Sequence { sequence: String, source: Box<Error> },

    /// Insert or update with nothing to write
    #[error("no columns to write into {0}")]
    NoColumns(String),

    /// Invalid connection configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for sqlx-dbutils operations
pub type Result<T> = std::result::Result<T, Error>;
