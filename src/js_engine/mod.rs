//! JavaScript engine integration
//!
//! Server replies are JavaScript. They run inside a capability-scoped
//! executor that exposes only the `nagare` collaborator object and a
//! `console`; there is no DOM, window, fetch or timer in scope. Every call
//! the script makes on `nagare` is recorded as an [`ApiCall`] and applied by
//! the runtime after the script has finished.

mod calls;
mod queue;
mod runtime;

pub use calls::{parse_calls, ApiCall};
pub use queue::{ScriptQueue, ScriptTask};
pub use runtime::BoaExecutor;

use crate::utils::Result;
use serde_json::Value;

/// Result of a remote call as handed back to executed code: the decoded
/// JSON reply or the failure message
pub type CallOutcome = std::result::Result<Value, String>;

/// Executes scripts and reports the collaborator calls they made
pub trait ScriptExecutor {
    /// Execute `source`, appending the recorded calls to `calls`.
    ///
    /// Calls recorded before an exception are still appended; the exception
    /// is then reported as the error.
    fn execute(&mut self, source: &str, calls: &mut Vec<ApiCall>) -> Result<()>;

    /// Resolve or reject the promise `promise` returned by `callRemote` or
    /// `delay`, then run the reactions it triggers.
    ///
    /// Executors without promises ignore the outcome.
    fn settle(&mut self, _promise: u64, _outcome: &CallOutcome, _calls: &mut Vec<ApiCall>) -> Result<()> {
        Ok(())
    }

    /// Hand one `repeat` tick to the continuations of `handle`. A failed
    /// tick is the last one the handle sees.
    fn tick(&mut self, _handle: u64, _outcome: &CallOutcome, _calls: &mut Vec<ApiCall>) -> Result<()> {
        Ok(())
    }
}
