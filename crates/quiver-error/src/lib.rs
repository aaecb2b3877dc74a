use thiserror::Error;

/// Primary error type for Quiver operations.
///
/// Structured variants for the conditions the execution layer can hit while
/// reducing a group; messages name the failing function so they can be
/// surfaced verbatim to the query client.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QuiverError {
    /// A non-null upstream value could not be coerced to the numeric type an
    /// aggregation requires.
    #[error("{function}: could not convert upstream {type_name} value to a number")]
    Coercion {
        function: String,
        type_name: &'static str,
    },

    /// A fixed auxiliary argument to an aggregation (e.g. a percentile
    /// fraction) is missing, non-numeric, or out of its valid range.
    #[error("{function}: {detail}")]
    InvalidArgument { function: String, detail: String },

    /// No aggregation function is registered under this name.
    #[error("no such aggregation function: {name}")]
    UnknownFunction { name: String },

    /// Internal logic error (should never happen).
    #[error("internal error: {0}")]
    Internal(String),
}

impl QuiverError {
    /// Create a coercion-failure error for the named aggregation.
    pub fn coercion(function: impl Into<String>, type_name: &'static str) -> Self {
        Self::Coercion {
            function: function.into(),
            type_name,
        }
    }

    /// Create an argument-validation error for the named aggregation.
    pub fn invalid_argument(function: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::InvalidArgument {
            function: function.into(),
            detail: detail.into(),
        }
    }

    /// Create an unknown-function error.
    pub fn unknown_function(name: impl Into<String>) -> Self {
        Self::UnknownFunction { name: name.into() }
    }

    /// Create an internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether this error aborts the enclosing group's aggregation.
    ///
    /// Coercion and argument-validation failures poison the handle that
    /// raised them; registry misses and internal errors are reported before
    /// any accumulation starts.
    pub const fn aborts_group(&self) -> bool {
        matches!(self, Self::Coercion { .. } | Self::InvalidArgument { .. })
    }
}

/// Result type alias using `QuiverError`.
pub type Result<T> = std::result::Result<T, QuiverError>;
