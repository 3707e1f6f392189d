// SPDX-License-Identifier: MIT OR Apache-2.0
// SPDX-FileCopyrightText: 2025-2026 Marquee Contributors

//! Closed error taxonomy for everything an actor can report.

use std::fmt;

use thiserror::Error;

/// The error an actor hands back to its machine. Exactly one kind at a time.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// A response did not match the expected schema.
    #[error("{message}")]
    Decode { message: String, diagnostic: String },

    /// Non-2xx response or transport failure.
    #[error("{message}")]
    Fetch { message: String, status: Option<u16> },

    /// Identity provider failure, already translated into a user-facing message.
    #[error("{message}")]
    Auth { message: String, code: Option<String> },

    /// Anything else.
    #[error("{message}")]
    Unknown {
        message: String,
        cause: Option<String>,
    },
}

/// Tag of an [`ApiError`], displayed the way the presentation layer keys on it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Decode,
    Fetch,
    Auth,
    Unknown,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ErrorKind::Decode => "DECODE_ERROR",
            ErrorKind::Fetch => "FETCH_ERROR",
            ErrorKind::Auth => "AUTH_ERROR",
            ErrorKind::Unknown => "UNKNOWN_ERROR",
        })
    }
}

impl ApiError {
    pub fn decode(message: impl Into<String>, diagnostic: impl Into<String>) -> Self {
        ApiError::Decode {
            message: message.into(),
            diagnostic: diagnostic.into(),
        }
    }

    pub fn fetch(message: impl Into<String>, status: Option<u16>) -> Self {
        ApiError::Fetch {
            message: message.into(),
            status,
        }
    }

    pub fn auth(message: impl Into<String>, code: Option<String>) -> Self {
        ApiError::Auth {
            message: message.into(),
            code,
        }
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        ApiError::Unknown {
            message: message.into(),
            cause: None,
        }
    }

    pub fn unknown_with_cause(message: impl Into<String>, cause: impl fmt::Display) -> Self {
        ApiError::Unknown {
            message: message.into(),
            cause: Some(cause.to_string()),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Decode { .. } => ErrorKind::Decode,
            ApiError::Fetch { .. } => ErrorKind::Fetch,
            ApiError::Auth { .. } => ErrorKind::Auth,
            ApiError::Unknown { .. } => ErrorKind::Unknown,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ApiError::Decode { message, .. }
            | ApiError::Fetch { message, .. }
            | ApiError::Auth { message, .. }
            | ApiError::Unknown { message, .. } => message,
        }
    }

    /// HTTP status, for fetch errors that got a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Fetch { status, .. } => *status,
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::decode("response body could not be decoded", err.to_string())
        } else {
            ApiError::fetch(err.to_string(), err.status().map(|s| s.as_u16()))
        }
    }
}
