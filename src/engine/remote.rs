//! Programmatic remote calls
//!
//! `remote_call(url).call(params)` issues a background GET and parses the
//! JSON reply. `delay` does the same after a pause, `repeat` keeps doing it
//! on an interval until cancelled or until the first failure.

use crate::network::{RequestOptions, Transport};
use crate::utils::{NagareError, Result};
use serde_json::Value;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Shortest interval a periodic call may use
pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// A callable remote endpoint
#[derive(Clone)]
pub struct RemoteCall {
    transport: Transport,
    url: String,
}

impl RemoteCall {
    pub fn new(transport: Transport, url: impl Into<String>) -> Self {
        Self {
            transport,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// GET the endpoint with `params` and decode the JSON reply
    pub async fn call(&self, params: &[Value]) -> Result<Value> {
        let response = self
            .transport
            .send(Some(&self.url), RequestOptions::get(), params)
            .await?;
        response.json()
    }
}

/// A remote call made after a pause
#[derive(Clone)]
pub struct Delay {
    remote: RemoteCall,
}

impl Delay {
    pub fn new(remote: RemoteCall) -> Self {
        Self { remote }
    }

    /// Wait `delay`, then call
    pub async fn call(&self, delay: Duration, params: &[Value]) -> Result<Value> {
        tokio::time::sleep(delay).await;
        self.remote.call(params).await
    }
}

/// A remote call made on an interval
#[derive(Clone)]
pub struct Repeat {
    remote: RemoteCall,
}

impl Repeat {
    pub fn new(remote: RemoteCall) -> Self {
        Self { remote }
    }

    /// Start calling every `interval`, the first call one interval from now.
    ///
    /// Must be called from within a `LocalSet`.
    pub fn start(self, interval: Duration, params: Vec<Value>) -> PeriodicCall {
        PeriodicCall::spawn(self.remote, interval.max(MIN_INTERVAL), params)
    }
}

/// Lifecycle of a [`PeriodicCall`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodicState {
    Active,
    Cancelled,
}

type SuccessFn = Box<dyn FnMut(&Value)>;
type FailureFn = Box<dyn FnMut(&NagareError)>;

struct Shared {
    state: Cell<PeriodicState>,
    calls: Cell<usize>,
    on_success: RefCell<Option<SuccessFn>>,
    on_failure: RefCell<Option<FailureFn>>,
    cancel_tx: mpsc::UnboundedSender<()>,
}

impl Shared {
    fn cancel(&self) {
        if self.state.replace(PeriodicState::Cancelled) == PeriodicState::Active {
            let _ = self.cancel_tx.send(());
        }
    }
}

/// Handle to a running `repeat`
#[derive(Clone)]
pub struct PeriodicCall {
    shared: Rc<Shared>,
    task: Rc<JoinHandle<()>>,
}

impl PeriodicCall {
    fn spawn(remote: RemoteCall, interval: Duration, params: Vec<Value>) -> Self {
        let (cancel_tx, mut cancel_rx) = mpsc::unbounded_channel();
        let shared = Rc::new(Shared {
            state: Cell::new(PeriodicState::Active),
            calls: Cell::new(0),
            on_success: RefCell::new(None),
            on_failure: RefCell::new(None),
            cancel_tx,
        });

        let task = {
            let shared = Rc::clone(&shared);
            tokio::task::spawn_local(async move {
                let mut ticker = tokio::time::interval(interval);
                ticker.tick().await; // First tick happens immediately, skip it
                loop {
                    tokio::select! {
                        _ = ticker.tick() => {}
                        _ = cancel_rx.recv() => break,
                    }
                    if shared.state.get() == PeriodicState::Cancelled {
                        break;
                    }
                    if remote.transport.document().borrow().pending_navigation().is_some() {
                        log::debug!("repeat({}): document navigated away", remote.url());
                        shared.cancel();
                        break;
                    }

                    shared.calls.set(shared.calls.get() + 1);
                    let outcome = remote.call(&params).await;
                    if shared.state.get() == PeriodicState::Cancelled {
                        break;
                    }

                    match outcome {
                        Ok(value) => run_callback(&shared.on_success, |f| f(&value)),
                        Err(e) => {
                            log::debug!("repeat({}) stopped: {}", remote.url(), e);
                            run_callback(&shared.on_failure, |f| f(&e));
                            shared.cancel();
                            break;
                        }
                    }
                }
            })
        };

        Self {
            shared,
            task: Rc::new(task),
        }
    }

    /// Replace the success continuation
    pub fn on_success<F>(&self, f: F) -> &Self
    where
        F: FnMut(&Value) + 'static,
    {
        *self.shared.on_success.borrow_mut() = Some(Box::new(f));
        self
    }

    /// Replace the failure continuation
    pub fn on_failure<F>(&self, f: F) -> &Self
    where
        F: FnMut(&NagareError) + 'static,
    {
        *self.shared.on_failure.borrow_mut() = Some(Box::new(f));
        self
    }

    /// Stop the loop; no further call is started
    pub fn cancel(&self) {
        self.shared.cancel();
    }

    pub fn state(&self) -> PeriodicState {
        self.shared.state.get()
    }

    pub fn is_active(&self) -> bool {
        self.state() == PeriodicState::Active
    }

    /// Number of calls started so far
    pub fn call_count(&self) -> usize {
        self.shared.calls.get()
    }

    /// Whether the background task has exited
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Run a continuation without holding its slot borrowed, so it may replace
/// itself
fn run_callback<T: ?Sized>(slot: &RefCell<Option<Box<T>>>, call: impl FnOnce(&mut Box<T>)) {
    let taken = slot.borrow_mut().take();
    if let Some(mut f) = taken {
        call(&mut f);
        let mut slot = slot.borrow_mut();
        if slot.is_none() {
            *slot = Some(f);
        }
    }
}
