//! Error types
//!
//! [`RequestError`] is data: it is stored on the request state and shown to
//! the applicant. [`SessionError`] is returned by session operations that
//! were refused.

use crate::state::{NrState, WizardStep};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of an error shown to the applicant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Search,
    Analysis,
    AddressLookup,
    Reservation,
    AmalgamateNow,
    ContinuationIn,
    IncorporateNow,
    Affiliation,
    Payment,
    Unexpected,
}

impl ErrorKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Search => "search",
            Self::Analysis => "analysis",
            Self::AddressLookup => "address lookup",
            Self::Reservation => "reservation",
            Self::AmalgamateNow => "amalgamation",
            Self::ContinuationIn => "continuation in",
            Self::IncorporateNow => "incorporation",
            Self::Affiliation => "affiliation",
            Self::Payment => "payment",
            Self::Unexpected => "unexpected",
        }
    }
}

/// Error recorded on the request state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestError {
    pub kind: ErrorKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl RequestError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            context: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.context {
            Some(context) => write!(f, "{} error: {} ({context})", self.kind.label(), self.message),
            None => write!(f, "{} error: {}", self.kind.label(), self.message),
        }
    }
}

/// Lifecycle phase of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Active,
    Submitted,
    Cancelled,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => f.write_str("active"),
            Self::Submitted => f.write_str("submitted"),
            Self::Cancelled => f.write_str("cancelled"),
        }
    }
}

/// Refused session operation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("session is {0} and can no longer be changed")]
    Closed(SessionPhase),

    #[error("cannot move from {from:?} to {to:?}")]
    InvalidTransition { from: WizardStep, to: WizardStep },

    #[error("search tabs can only be changed on the search step (currently {0:?})")]
    NotOnSearch(WizardStep),

    #[error("submission tabs can only be changed on the submission step (currently {0:?})")]
    NotInSubmission(WizardStep),

    #[error("requests in state {0} can no longer be edited")]
    NotEditable(NrState),

    #[error("at least one name choice is required")]
    NoNameChoices,

    #[error("invalid name request number: {0}")]
    InvalidNrNumber(String),
}

pub type SessionResult<T> = Result<T, SessionError>;
