//! User-facing notifications.
//!
//! Stores report failures here instead of returning them to the UI loop;
//! the UI drains the queue and shows each toast once.

use serde::Serialize;
use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, PoisonError},
};

/// Severity of a toast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastKind {
    Success,
    Error,
    Info,
}

/// A message waiting to be shown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Toast {
    pub kind: ToastKind,
    pub message: String,
}

/// Shared FIFO of pending toasts. Clones share the queue.
#[derive(Debug, Clone, Default)]
pub struct Toasts {
    queue: Arc<Mutex<VecDeque<Toast>>>,
}

impl Toasts {
    /// Empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a message.
    pub fn push(&self, kind: ToastKind, message: impl Into<String>) {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(Toast {
                kind,
                message: message.into(),
            });
    }

    /// Queues a success message.
    pub fn success(&self, message: impl Into<String>) {
        self.push(ToastKind::Success, message);
    }

    /// Queues an error message.
    pub fn error(&self, message: impl Into<String>) {
        self.push(ToastKind::Error, message);
    }

    /// Removes and returns everything queued so far.
    #[must_use]
    pub fn drain(&self) -> Vec<Toast> {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect()
    }
}
