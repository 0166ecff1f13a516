//! Error types shared by every command.
//!
//! Failures are classified by [`MagiErrorKind`]. Kinds that describe a problem
//! with the user's input are answered in the channel; everything else is logged
//! and answered with a generic message.

use std::panic::Location;

use serenity::http::HttpError;

use crate::tokenizer::TokenizeError;

/// Discord's JSON error code for "Unknown User".
pub const UNKNOWN_USER: isize = 10013;
/// Discord's JSON error code for "Invalid Form Body".
pub const INVALID_FORM_BODY: isize = 50035;

/// What went wrong.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum MagiErrorKind {
    /// The invocation was rejected. The message is shown to the user as-is.
    #[display("{_0}")]
    Usage(String),

    /// The argument string could not be tokenized.
    #[display("{_0}")]
    Tokenize(TokenizeError),

    /// Another archive run holds the channel's working directory.
    #[display("Please wait for the current archive process to finish.")]
    ArchiveInProgress,

    /// Serenity API error, with Discord's JSON error code when there is one.
    #[display("Discord API error: {message}")]
    Discord { code: Option<isize>, message: String },

    /// Filesystem operation on the staging directory failed.
    #[display("I/O error: {_0}")]
    Io(String),

    /// Serializing an archive document failed.
    #[display("JSON error: {_0}")]
    Json(String),

    /// Missing or invalid environment configuration.
    #[display("Configuration error: {_0}")]
    Configuration(String),
}

/// Error with source location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("{kind} at line {line} in {file}")]
pub struct MagiError {
    kind: MagiErrorKind,
    line: u32,
    file: &'static str,
}

impl MagiError {
    #[track_caller]
    pub fn new(kind: MagiErrorKind) -> Self {
        let location = Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    #[track_caller]
    pub fn usage(message: impl Into<String>) -> Self {
        Self::new(MagiErrorKind::Usage(message.into()))
    }

    pub fn kind(&self) -> &MagiErrorKind {
        &self.kind
    }

    /// Discord's JSON error code, if this came from an unsuccessful API request.
    pub fn discord_code(&self) -> Option<isize> {
        match &self.kind {
            MagiErrorKind::Discord { code, .. } => *code,
            _ => None,
        }
    }

    /// The text to post back to the channel, if this error is meant for the user.
    pub fn user_message(&self) -> Option<String> {
        match &self.kind {
            MagiErrorKind::Usage(_)
            | MagiErrorKind::Tokenize(_)
            | MagiErrorKind::ArchiveInProgress => Some(format!(">>> {}", self.kind)),
            _ => None,
        }
    }
}

pub type MagiResult<T> = Result<T, MagiError>;

impl From<serenity::Error> for MagiError {
    #[track_caller]
    fn from(err: serenity::Error) -> Self {
        let code = match &err {
            serenity::Error::Http(HttpError::UnsuccessfulRequest(response)) => {
                Some(response.error.code)
            }
            _ => None,
        };
        MagiError::new(MagiErrorKind::Discord {
            code,
            message: err.to_string(),
        })
    }
}

impl From<std::io::Error> for MagiError {
    #[track_caller]
    fn from(err: std::io::Error) -> Self {
        MagiError::new(MagiErrorKind::Io(err.to_string()))
    }
}

impl From<serde_json::Error> for MagiError {
    #[track_caller]
    fn from(err: serde_json::Error) -> Self {
        MagiError::new(MagiErrorKind::Json(err.to_string()))
    }
}

impl From<TokenizeError> for MagiError {
    #[track_caller]
    fn from(err: TokenizeError) -> Self {
        MagiError::new(MagiErrorKind::Tokenize(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_errors_are_block_quoted() {
        let err = MagiError::usage("No user specified.");
        assert_eq!(err.user_message().as_deref(), Some(">>> No user specified."));
    }

    #[test]
    fn internal_errors_stay_private() {
        let err = MagiError::new(MagiErrorKind::Io("disk full".into()));
        assert_eq!(err.user_message(), None);
        assert!(err.to_string().starts_with("I/O error: disk full at line"));
    }

    #[test]
    fn location_points_at_the_caller() {
        let err = MagiError::usage("x");
        assert!(err.file.ends_with("error.rs"));
    }
}
