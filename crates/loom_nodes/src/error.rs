// SPDX-License-Identifier: MIT OR Apache-2.0
//! Error types and the host error channel.

use crate::id::ItemId;
use crate::item::{ItemKind, KindList};
use parking_lot::Mutex;
use std::sync::mpsc::{self, Receiver, Sender};
use thiserror::Error;

/// Error code reported to the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Identifier does not resolve to a live item
    ItemNotFound,
    /// Item exists but has the wrong kind
    IncompatibleType,
    /// Child kind not accepted by the parent
    IncompatibleChild,
}

/// Errors raised at the item API boundary
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ItemError {
    /// Identifier does not resolve to a live item
    #[error("{command}: Item not found: {id}")]
    ItemNotFound {
        /// Entry point that failed
        command: &'static str,
        /// Missing identifier
        id: ItemId,
    },

    /// Item exists but has the wrong kind
    #[error("{command}: Incompatible type {found} ({id}). Expected types include: {expected}")]
    IncompatibleType {
        /// Entry point that failed
        command: &'static str,
        /// Offending item
        id: ItemId,
        /// Kind found
        found: ItemKind,
        /// Kinds accepted
        expected: KindList,
    },

    /// Child kind not accepted by the parent
    #[error("{command}: Incompatible child {child} for {parent_kind} ({parent}). Acceptable children include: {accepted}")]
    IncompatibleChild {
        /// Entry point that failed
        command: &'static str,
        /// Parent item
        parent: ItemId,
        /// Parent kind
        parent_kind: ItemKind,
        /// Rejected child kind
        child: ItemKind,
        /// Kinds the parent accepts
        accepted: KindList,
    },

    /// Parent already holds its single allowed child of this kind
    #[error("{command}: {parent} already has a {child}")]
    DuplicateChild {
        /// Entry point that failed
        command: &'static str,
        /// Parent item
        parent: ItemId,
        /// Rejected child kind
        child: ItemKind,
    },

    /// A link endpoint is not an attribute of the target editor
    #[error("{command}: Link endpoint {endpoint} is not an attribute of editor {editor}")]
    UnresolvedEndpoint {
        /// Entry point that failed
        command: &'static str,
        /// Target editor
        editor: ItemId,
        /// Unresolved attribute
        endpoint: ItemId,
    },
}

impl ItemError {
    /// Host error code
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::ItemNotFound { .. } | Self::UnresolvedEndpoint { .. } => ErrorCode::ItemNotFound,
            Self::IncompatibleType { .. } => ErrorCode::IncompatibleType,
            Self::IncompatibleChild { .. } | Self::DuplicateChild { .. } => ErrorCode::IncompatibleChild,
        }
    }
}

/// Errors while saving or loading configuration and editor state
#[derive(Debug, Error)]
pub enum StateError {
    /// Serialization failed
    #[error("Serialization error: {0}")]
    Serialize(#[from] ron::Error),

    /// Parsing failed
    #[error("Parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),
}

/// An error delivered to the host
#[derive(Debug, Clone, PartialEq)]
pub struct ReportedError {
    /// Error code
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
}

/// Channel through which API errors reach the host
pub struct ErrorReporter {
    sender: Sender<ReportedError>,
    receiver: Mutex<Receiver<ReportedError>>,
}

impl ErrorReporter {
    /// Create a reporter with an empty channel
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            sender,
            receiver: Mutex::new(receiver),
        }
    }

    /// Log and forward an error
    pub fn report(&self, error: &ItemError) {
        tracing::error!("{error}");
        let _ = self.sender.send(ReportedError {
            code: error.code(),
            message: error.to_string(),
        });
    }

    /// Forward the error of `result`, if any, and return the value
    pub fn check<T>(&self, result: Result<T, ItemError>) -> Option<T> {
        result.map_err(|e| self.report(&e)).ok()
    }

    /// Take every error reported so far
    pub fn drain(&self) -> Vec<ReportedError> {
        self.receiver.lock().try_iter().collect()
    }
}

impl Default for ErrorReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ErrorReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorReporter").finish_non_exhaustive()
    }
}
