use std::fmt;

/// Failure talking to the remote API.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    /// The request never produced a usable response (network, timeout,
    /// unreadable body).
    #[error("request failed: {0}")]
    FetchFailed(String),

    /// The API answered with a non-2xx status code.
    #[error("request rejected ({status}): {body}")]
    RequestRejected { status: u16, body: String },
}

impl GatewayError {
    pub fn fetch(err: impl fmt::Display) -> Self {
        Self::FetchFailed(err.to_string())
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        Self::fetch(err)
    }
}

/// A single inline form error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Local form validation failed; nothing was sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, thiserror::Error)]
#[error("validation failed on {} field(s)", .errors.len())]
pub struct ValidationFailed {
    pub errors: Vec<FieldError>,
}

impl ValidationFailed {
    pub fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// First message recorded for `field`.
    pub fn message_for(&self, field: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    /// Drop the errors of a field once the user edits it.
    pub fn clear_field(&mut self, field: &str) {
        self.errors.retain(|e| e.field != field);
    }

    /// `Ok(())` when no error was recorded.
    pub fn into_result(self) -> Result<(), ValidationFailed> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

/// What the user was trying to do when a remote call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Load,
    Search,
    UpdateStatus,
    Create,
    Update,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self {
            Operation::Load => "load",
            Operation::Search => "search",
            Operation::UpdateStatus => "status update",
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
        };
        f.write_str(verb)
    }
}

/// Single failure outcome for any remote-backed operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{operation} of '{entity}' failed: {source}")]
pub struct MutationFailed {
    pub operation: Operation,
    pub entity: String,
    pub source: GatewayError,
}
