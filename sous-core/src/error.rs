use thiserror::Error;

use crate::llm::LlmError;
use crate::response::ResponseError;

/// Why a single item could not be transformed.
#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("completion service: {0}")]
    Service(#[from] LlmError),

    #[error("malformed {kind} response: {source}")]
    MalformedResponse {
        kind: &'static str,
        #[source]
        source: ResponseError,
    },
}

impl ProcessError {
    pub fn malformed(kind: &'static str) -> impl FnOnce(ResponseError) -> Self {
        move |source| ProcessError::MalformedResponse { kind, source }
    }
}
