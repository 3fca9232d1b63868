use thiserror::Error;

/// Errors reported by the graph and matching APIs.
///
/// All variants describe input-shape problems detected before (or, for
/// [`GraphError::NoPerfectMatching`], immediately after) the main computation
/// runs; none of them is transient or retryable.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// The input violates a structural precondition of the algorithm.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A vertex identifier is not present in the graph.
    #[error("vertex not found")]
    VertexNotFound,

    /// The weight function produced a NaN or infinite value.
    #[error("edge weight is not finite")]
    NonFiniteWeight,

    /// A perfect matching was requested but the graph has none.
    #[error("graph admits no perfect matching")]
    NoPerfectMatching,
}

impl GraphError {
    /// Convenience constructor for [`GraphError::InvalidInput`].
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        GraphError::InvalidInput(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, GraphError>;
