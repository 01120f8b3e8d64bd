//! Definition of errors.

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    /// A model was queried before training completed.
    #[error("untrained model")]
    Untrained,

    #[error("malformed training example #{index}: {tokens} tokens but {tags} tags")]
    MalformedExample {
        index: usize,
        tokens: usize,
        tags: usize,
    },

    #[error("empty training set")]
    EmptyTrainingSet,

    #[error("unknown feature: {0}")]
    UnknownFeature(String),

    #[error("unknown label: {0}")]
    UnknownLabel(String),

    /// A stored model whose tables and weights disagree.
    #[error("invalid model: {0}")]
    InvalidModel(String),

    #[error("invalid parameter {name}={value}")]
    InvalidParameter { name: String, value: String },

    /// A decoder produced a tag sequence whose length differs from the input.
    #[error("decoded {actual} tags for {expected} tokens")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("lbfgs error: {0}")]
    Lbfgs(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn invalid_parameter<N, V>(name: N, value: V) -> Self
    where
        N: Into<String>,
        V: Into<String>,
    {
        Self::InvalidParameter {
            name: name.into(),
            value: value.into(),
        }
    }
}
