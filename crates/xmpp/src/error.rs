use thiserror::Error;

/// Local failures raised while building or submitting a stanza.
///
/// These never involve the network; the caller can fix the input and retry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("stanza has no id to correlate with")]
    MissingCorrelationId,

    #[error("invalid JID: {0:?}")]
    InvalidJid(String),

    #[error("invalid {field}: {reason}")]
    InvalidArgument { field: &'static str, reason: String },

    #[error("invalid value {value:?} for {field}")]
    InvalidEnumValue { field: &'static str, value: String },

    #[error("id {0:?} is already in use by an outstanding request")]
    DuplicateId(String),
}

impl BuildError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            field,
            reason: reason.into(),
        }
    }

    pub(crate) fn empty(field: &'static str) -> Self {
        Self::invalid(field, "must not be empty")
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("stanza parse failed: {0}")]
    ParseFailed(String),

    #[error("processor failed: {0}")]
    ProcessorFailed(String),
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("transport channel closed")]
    WireSendFailed,
}

impl From<DispatchError> for tern_core::TernError {
    fn from(error: DispatchError) -> Self {
        tern_core::TernError::Xmpp(error.to_string())
    }
}
