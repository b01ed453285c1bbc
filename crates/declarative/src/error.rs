//! Error types for reconciliation.
//!
//! Errors are categorized so the caller can tell an absent remote resource
//! (recoverable by a create, or already satisfied for a delete) apart from
//! every other client failure. Nothing here retries: errors are surfaced to
//! the scheduler, which decides when to run the next pass.

use std::fmt;
use thiserror::Error;

/// Status codes a remote client may attach to a failure.
///
/// The names follow the gRPC canonical codes, since that is what project
/// services report in their error text (`rpc error: code = NotFound desc = ...`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Code {
    NotFound,
    AlreadyExists,
    InvalidArgument,
    PermissionDenied,
    Unauthenticated,
    Unavailable,
    DeadlineExceeded,
    Canceled,
    Internal,
    Unknown,
}

impl Code {
    /// Canonical name of the code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Code::NotFound => "NotFound",
            Code::AlreadyExists => "AlreadyExists",
            Code::InvalidArgument => "InvalidArgument",
            Code::PermissionDenied => "PermissionDenied",
            Code::Unauthenticated => "Unauthenticated",
            Code::Unavailable => "Unavailable",
            Code::DeadlineExceeded => "DeadlineExceeded",
            Code::Canceled => "Canceled",
            Code::Internal => "Internal",
            Code::Unknown => "Unknown",
        }
    }

    /// Parse a canonical code name.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "NotFound" => Some(Code::NotFound),
            "AlreadyExists" => Some(Code::AlreadyExists),
            "InvalidArgument" => Some(Code::InvalidArgument),
            "PermissionDenied" => Some(Code::PermissionDenied),
            "Unauthenticated" => Some(Code::Unauthenticated),
            "Unavailable" => Some(Code::Unavailable),
            "DeadlineExceeded" => Some(Code::DeadlineExceeded),
            "Canceled" => Some(Code::Canceled),
            "Internal" => Some(Code::Internal),
            "Unknown" => Some(Code::Unknown),
            _ => None,
        }
    }

    /// Extract a code from status text such as
    /// `rpc error: code = NotFound desc = project "team-a" not found`.
    pub fn from_status_text(text: &str) -> Option<Self> {
        let rest = text.split("code = ").nth(1)?;
        let token = rest.split_whitespace().next()?;
        Self::parse(token)
    }

    /// Category a failure with this code falls into.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Code::NotFound => ErrorCategory::NotFound,
            Code::InvalidArgument | Code::AlreadyExists => ErrorCategory::InvalidArgument,
            _ => ErrorCategory::Transient,
        }
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Categories of reconciliation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The remote resource does not exist
    NotFound,
    /// Any other client failure (network, auth, server-side validation)
    Transient,
    /// The request or the record is malformed
    InvalidArgument,
    /// The record handed to the controller is of another kind
    TypeMismatch,
}

impl ErrorCategory {
    /// Whether the scheduler should try the pass again later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient)
    }
}

/// Remote operation a wrapped error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Get,
    Create,
    Update,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self {
            Operation::Get => "get",
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
        };
        f.write_str(verb)
    }
}

/// Errors that can occur while reconciling a record.
#[derive(Debug, Error)]
pub enum Error {
    /// A remote client call failed
    #[error("{}", rpc_text(.code, .message))]
    Rpc {
        /// Status code, when the client provides one
        code: Option<Code>,
        /// Error description from the client
        message: String,
    },

    /// The record is not of the kind the controller manages
    #[error("record is a {found}, not a {expected}")]
    TypeMismatch {
        /// Kind the controller manages
        expected: &'static str,
        /// Kind the record declares
        found: String,
    },

    /// Update or delete was requested for a record with no external name
    #[error("{kind} {name} is not bound to a remote resource")]
    NotBound {
        /// Kind of the record
        kind: &'static str,
        /// Record name
        name: String,
    },

    /// A create or update would give a bound record a different identity
    #[error("external name is immutable: bound to {current}, refusing {requested}")]
    ImmutableExternalName {
        /// Identity the record is bound to
        current: String,
        /// Identity the spec declares
        requested: String,
    },

    /// No client could be connected for the record
    #[error("cannot connect: {message}")]
    Connect {
        /// Why the connection failed
        message: String,
    },

    /// A client error tagged with the operation that produced it
    #[error("cannot {op} {kind}: {source}")]
    Operation {
        /// Failed operation
        op: Operation,
        /// Kind of the record
        kind: &'static str,
        /// Client error
        source: Box<Error>,
    },
}

fn rpc_text(code: &Option<Code>, message: &str) -> String {
    match code {
        Some(code) => format!("rpc error: code = {code} desc = {message}"),
        None => message.to_string(),
    }
}

impl Error {
    /// A client failure with a status code.
    pub fn rpc(code: Code, message: impl Into<String>) -> Self {
        Error::Rpc {
            code: Some(code),
            message: message.into(),
        }
    }

    /// A client failure carrying only its text.
    ///
    /// Codeless failures are classified as transient.
    pub fn from_message(message: impl Into<String>) -> Self {
        Error::Rpc {
            code: None,
            message: message.into(),
        }
    }

    /// A client failure parsed from status text such as
    /// `rpc error: code = NotFound desc = project "a" not found`.
    ///
    /// Text without a recognised code stays codeless. Meant for the adapter of
    /// a client that only reports text, which knows which messages to trust.
    pub fn from_status(text: &str) -> Self {
        match Code::from_status_text(text) {
            Some(code) => {
                let desc = text.split_once("desc = ").map_or(text, |(_, d)| d);
                Self::rpc(code, desc.trim())
            }
            None => Self::from_message(text),
        }
    }

    /// A `NotFound` client failure.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::rpc(Code::NotFound, message)
    }

    /// Tag a client error with the operation it came from.
    pub fn wrap(op: Operation, kind: &'static str, source: Error) -> Self {
        Error::Operation {
            op,
            kind,
            source: Box::new(source),
        }
    }

    /// Status code of the underlying client failure, if any.
    pub fn code(&self) -> Option<Code> {
        match self {
            Error::Rpc { code, .. } => *code,
            Error::Operation { source, .. } => source.code(),
            _ => None,
        }
    }

    /// Get the error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Rpc { .. } => self
                .code()
                .map_or(ErrorCategory::Transient, |code| code.category()),
            Error::TypeMismatch { .. } => ErrorCategory::TypeMismatch,
            Error::NotBound { .. } | Error::ImmutableExternalName { .. } => {
                ErrorCategory::InvalidArgument
            }
            Error::Connect { .. } => ErrorCategory::Transient,
            Error::Operation { source, .. } => source.category(),
        }
    }

    /// Whether the remote resource is absent.
    pub fn is_not_found(&self) -> bool {
        self.category() == ErrorCategory::NotFound
    }

    /// Whether the scheduler should try again later.
    pub fn is_retryable(&self) -> bool {
        self.category().is_retryable()
    }
}

/// Result type for reconciliation operations.
pub type Result<T> = std::result::Result<T, Error>;
