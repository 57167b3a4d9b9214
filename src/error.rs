use thiserror::Error;

/// Errors produced by the policy core.
///
/// `Denied` is the routine outcome for an actor without rights. The other
/// variants mean the caller handed over records it should never have built.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PolicyError {
    #[error("access denied")]
    Denied,
    #[error("invalid {kind} resource: missing {missing}")]
    InvalidResource {
        kind: &'static str,
        missing: &'static str,
    },
    #[error("unknown role: {0}")]
    UnknownRole(String),
    #[error("invalid user record: {0}")]
    InvalidUser(String),
}

impl PolicyError {
    /// Stable code used in sidecar error responses.
    pub fn code(&self) -> &'static str {
        match self {
            PolicyError::Denied => "denied",
            PolicyError::InvalidResource { .. } => "invalid_resource",
            PolicyError::UnknownRole(_) => "unknown_role",
            PolicyError::InvalidUser(_) => "invalid_user",
        }
    }

    /// Whether this error points at a bug in the caller rather than a refusal.
    pub fn is_caller_bug(&self) -> bool {
        !matches!(self, PolicyError::Denied)
    }
}
