//! Error types for pgjoin

use thiserror::Error;

/// Result type alias for statement construction and rendering.
pub type BuildResult<T> = Result<T, BuildError>;

/// Result type alias for pgjoin operations that may touch the database.
pub type JoinResult<T> = Result<T, JoinError>;

/// Errors raised while composing or rendering a join query.
///
/// These are caller programming errors (a field of an entity that was never
/// joined, a missing on-clause, nothing selected). They are never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    /// No table has been registered on the query.
    #[error("no tables registered on the query")]
    EmptyRegistry,

    /// The field's entity has not been joined into the query.
    #[error("entity `{entity}` is not registered on the query; join it before referencing its fields")]
    UnregisteredEntity { entity: &'static str },

    /// The entity descriptor has no such field.
    #[error("entity `{entity}` has no field `{field}`")]
    UnknownField { entity: String, field: String },

    /// An output alias was selected twice.
    #[error("output alias `{0}` is already selected")]
    DuplicateOutputAlias(String),

    /// An on-clause was requested before any table was added to FROM.
    #[error("FROM clause is empty; join a table before adding an ON clause")]
    EmptyFrom,

    /// A join keyword that the builder does not know.
    #[error("unsupported join kind `{0}`")]
    UnsupportedJoinKind(String),

    /// Select clause would be empty.
    #[error("no columns selected")]
    NoColumnsSelected,

    /// No descriptor is registered for the entity type.
    #[error("no entity descriptor available for `{0}`")]
    MetadataUnavailable(&'static str),

    /// The same entity type was joined twice while re-joins are rejected.
    #[error("entity `{0}` is already joined on this query")]
    DuplicateEntityJoin(String),

    /// Only one side of an ON clause was given.
    #[error("ON clause needs both a left and a right field")]
    IncompleteOnClause,

    /// The `last` fragment already limits rows, so paging or a one-row
    /// limit cannot be added.
    #[error("`last` fragment `{0}` already limits rows")]
    ConflictingLimit(String),

    /// Neither side of an ON clause belongs to the entity just joined.
    #[error("ON clause does not reference the joined entity `{entity}`")]
    DetachedOnClause { entity: &'static str },

    /// An alias or identifier that is not safe to splice into SQL.
    #[error("invalid SQL identifier `{ident}`: {reason}")]
    InvalidIdent { ident: String, reason: &'static str },
}

/// Error types for executing join queries.
#[derive(Debug, Error)]
pub enum JoinError {
    /// The statement could not be built.
    #[error(transparent)]
    Build(#[from] BuildError),

    /// An execution-style call was made without an executor in the config.
    #[error("no join executor configured")]
    ExecutorNotConfigured,

    /// Query execution error
    #[error("Query error: {0}")]
    Query(#[from] tokio_postgres::Error),

    /// Row not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// A single-row call got more than one row.
    #[error("expected at most one row, got {0}")]
    TooManyRows(usize),

    /// Row decode/mapping error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Row map could not be converted into the requested type.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Pool error
    #[cfg(feature = "pool")]
    #[error("Pool error: {0}")]
    Pool(String),
}

impl JoinError {
    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// The build error behind this error, if any.
    pub fn as_build(&self) -> Option<&BuildError> {
        match self {
            Self::Build(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for JoinError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(feature = "pool")]
impl From<deadpool_postgres::PoolError> for JoinError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        Self::Pool(err.to_string())
    }
}
