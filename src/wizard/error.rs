use super::screen::{Action, Screen};

/// Errors surfaced to the wizard's user.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WizardError {
    /// The form is incomplete; nothing was sent.
    #[error("{0}")]
    Validation(String),

    /// No usable token, or the server refused it.
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// The request never completed.
    #[error("Network error: {0}")]
    Network(String),

    /// Background work was requested outside an async runtime.
    #[error("No async runtime available: {0}")]
    Runtime(String),

    #[error("Cannot {action} from the {from} screen")]
    InvalidTransition { from: Screen, action: Action },

    #[error("A query is already being generated")]
    GenerationInFlight,

    /// The response belongs to a session the user has since left.
    #[error("Discarded a response from an abandoned session")]
    StaleResponse,
}

pub type WizardResult<T> = Result<T, WizardError>;
