// SPDX-License-Identifier: MIT OR Apache-2.0
//! Identifiers used by the retained item tree and the node graph backend.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicI32, Ordering};
use uuid::Uuid;

/// Externally-visible identifier of a retained item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemId(pub Uuid);

impl ItemId {
    /// Create a new random item ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Small integer id understood by the node graph backend.
///
/// Nodes, attributes and links all draw from one process-wide counter, so an
/// id is never handed out twice and stays unique for the lifetime of any
/// editor context that sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BackendId(pub i32);

static NEXT_BACKEND_ID: AtomicI32 = AtomicI32::new(1);

impl BackendId {
    /// Allocate the next unused backend id
    pub fn next() -> Self {
        Self(NEXT_BACKEND_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw value
    pub fn value(self) -> i32 {
        self.0
    }
}

impl fmt::Display for BackendId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_ids_are_unique() {
        let a = BackendId::next();
        let b = BackendId::next();
        assert_ne!(a, b);
        assert!(b.value() > a.value());
    }

    #[test]
    fn test_item_ids_are_random() {
        assert_ne!(ItemId::new(), ItemId::new());
    }
}
