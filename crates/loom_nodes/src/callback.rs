// SPDX-License-Identifier: MIT OR Apache-2.0
//! Callback handles and the submission queue.
//!
//! Nothing invokes host callbacks while a frame is being drawn. The draw pass
//! only submits jobs; a separate pass drains the queue with
//! [`CallbackRegistry::run_callbacks`]. Submitted jobs cannot be revoked.

use crate::id::ItemId;
use parking_lot::Mutex;
use serde_json::Value;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

/// Payload delivered to a callback
#[derive(Debug, Clone, PartialEq)]
pub enum AppData {
    /// No payload
    None,
    /// A link was created between two attributes (source, destination)
    Link(ItemId, ItemId),
    /// A link was detached
    Delink(ItemId),
    /// An item related to the event (handlers report the item they watch)
    Item(ItemId),
    /// A menu entry was clicked
    Menu(String),
}

/// Arguments passed to a callback
#[derive(Debug, Clone)]
pub struct CallbackArgs {
    /// Item that raised the callback
    pub sender: ItemId,
    /// Event specific payload
    pub app_data: AppData,
    /// User data configured on the sender
    pub user_data: Option<Value>,
}

/// Owned handle to a host callback
#[derive(Clone)]
pub struct CallbackHandle(Arc<dyn Fn(&CallbackArgs) + Send + Sync>);

impl CallbackHandle {
    /// Wrap a closure
    pub fn new(f: impl Fn(&CallbackArgs) + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    /// Invoke the callback
    pub fn invoke(&self, args: &CallbackArgs) {
        (self.0)(args);
    }

    /// Whether both handles refer to the same callback
    pub fn ptr_eq(&self, other: &CallbackHandle) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for CallbackHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CallbackHandle")
            .field(&Arc::as_ptr(&self.0).cast::<()>())
            .finish()
    }
}

/// Replace a stored callback, releasing the previous one only after the new
/// one is in place.
pub fn replace_callback(slot: &mut Option<CallbackHandle>, new: Option<CallbackHandle>) {
    let old = std::mem::replace(slot, new);
    drop(old);
}

type Job = Box<dyn FnOnce() + Send>;

/// Queue of callback invocations waiting to run
pub struct CallbackRegistry {
    sender: Sender<Job>,
    receiver: Mutex<Receiver<Job>>,
}

impl CallbackRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            sender,
            receiver: Mutex::new(receiver),
        }
    }

    /// Submit an arbitrary job
    pub fn submit(&self, job: impl FnOnce() + Send + 'static) {
        if self.sender.send(Box::new(job)).is_err() {
            tracing::warn!("Callback queue closed, dropping job");
        }
    }

    /// Submit an invocation of `callback`
    pub fn add_callback(
        &self,
        callback: &CallbackHandle,
        sender: ItemId,
        app_data: AppData,
        user_data: Option<Value>,
    ) {
        let callback = callback.clone();
        let args = CallbackArgs {
            sender,
            app_data,
            user_data,
        };
        self.submit(move || callback.invoke(&args));
    }

    /// Run the jobs queued so far. Returns the number of jobs executed.
    ///
    /// The queue is drained before any job runs, so a callback may submit
    /// more work or call this again; jobs it submits run in that nested call
    /// or the next one. A panicking callback is logged and does not stop the
    /// remaining jobs.
    pub fn run_callbacks(&self) -> usize {
        let jobs: Vec<Job> = self.receiver.lock().try_iter().collect();
        let count = jobs.len();
        for job in jobs {
            if panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
                tracing::error!("Callback panicked");
            }
        }
        count
    }
}

impl Default for CallbackRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CallbackRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackRegistry").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_callbacks_run_later() {
        let registry = CallbackRegistry::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let callback = CallbackHandle::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        registry.add_callback(&callback, ItemId::new(), AppData::None, None);
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        assert_eq!(registry.run_callbacks(), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(registry.run_callbacks(), 0);
    }

    #[test]
    fn test_panicking_callback_does_not_block_queue() {
        let registry = CallbackRegistry::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();

        registry.submit(|| panic!("boom"));
        registry.submit(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(registry.run_callbacks(), 2);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_callback_may_run_queue_again() {
        let registry = Arc::new(CallbackRegistry::new());
        let hits = Arc::new(AtomicUsize::new(0));
        let (weak, counter) = (Arc::downgrade(&registry), hits.clone());

        registry.submit(move || {
            let Some(registry) = weak.upgrade() else {
                return;
            };
            let counter = counter.clone();
            registry.submit(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
            assert_eq!(registry.run_callbacks(), 1);
        });

        assert_eq!(registry.run_callbacks(), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(registry.run_callbacks(), 0);
    }

    #[test]
    fn test_replace_callback() {
        let first = CallbackHandle::new(|_| {});
        let second = CallbackHandle::new(|_| {});
        let mut slot = Some(first.clone());

        replace_callback(&mut slot, Some(second.clone()));
        assert!(slot.as_ref().is_some_and(|cb| cb.ptr_eq(&second)));

        replace_callback(&mut slot, None);
        assert!(slot.is_none());
    }
}
