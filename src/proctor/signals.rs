use crate::types::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

/// Client-side lockdown controls. Losses of focus or lockdown are reported
/// back through `ProctorHandle::signal`.
pub trait ProctorSignals: Send + Sync {
    /// Fails with `ErrorType::Environment` when the client cannot lock down.
    fn request_lockdown(&self) -> Result<()>;
    fn release_lockdown(&self);
    fn block_clipboard(&self) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Directive {
    RequestLockdown,
    ReleaseLockdown,
    BlockClipboard,
}

/// Queues directives for a browser client to apply on its next poll.
#[derive(Debug)]
pub struct DirectiveSignals {
    lockdown_supported: bool,
    queue: Mutex<VecDeque<Directive>>,
}

impl DirectiveSignals {
    pub fn new(lockdown_supported: bool) -> Self {
        Self {
            lockdown_supported,
            queue: Mutex::new(VecDeque::new()),
        }
    }

    fn push(&self, d: Directive) {
        let mut q = self.queue.lock().unwrap_or_else(PoisonError::into_inner);
        // consecutive duplicates collapse
        if q.back() != Some(&d) {
            q.push_back(d);
        }
    }

    pub fn drain(&self) -> Vec<Directive> {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect()
    }
}

impl ProctorSignals for DirectiveSignals {
    fn request_lockdown(&self) -> Result<()> {
        if !self.lockdown_supported {
            return Err(Error::environment("lockdown is not supported by this client"));
        }
        self.push(Directive::RequestLockdown);
        Ok(())
    }

    fn release_lockdown(&self) {
        if self.lockdown_supported {
            self.push(Directive::ReleaseLockdown);
        }
    }

    fn block_clipboard(&self) -> Result<()> {
        self.push(Directive::BlockClipboard);
        Ok(())
    }
}
