//! Deferred script execution
//!
//! Scripts discovered while loading resources or patching the DOM are not
//! run in place. They are queued and run on the next tick, once the change
//! that introduced them is visible.

use std::collections::VecDeque;
use url::Url;

/// A script waiting for the next tick
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptTask {
    /// Source text run as-is
    Inline { source: String },
    /// Script fetched from `url`, then run
    External { url: Url },
}

/// FIFO of scripts scheduled for the next tick
#[derive(Debug, Default)]
pub struct ScriptQueue {
    pending: VecDeque<ScriptTask>,
    scheduled: usize,
}

impl ScriptQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule inline source
    pub fn push_inline(&mut self, source: impl Into<String>) {
        self.push(ScriptTask::Inline {
            source: source.into(),
        });
    }

    /// Schedule an external script
    pub fn push_external(&mut self, url: Url) {
        self.push(ScriptTask::External { url });
    }

    fn push(&mut self, task: ScriptTask) {
        log::trace!("scheduling {:?}", task);
        self.scheduled += 1;
        self.pending.push_back(task);
    }

    /// Take every pending task, oldest first
    pub fn drain(&mut self) -> Vec<ScriptTask> {
        self.pending.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Number of tasks ever scheduled
    pub fn scheduled_total(&self) -> usize {
        self.scheduled
    }
}
