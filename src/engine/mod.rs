//! Core runtime orchestrating all components
//!
//! A [`Runtime`] is attached to one document and owns everything with
//! per-page lifetime: the loaded-resource registry, the deferred script
//! queue, the script executor and the periodic calls. It coordinates the
//! dispatch-and-patch cycle:
//! 1. Classify a click and build its request
//! 2. Send it through the `Transport`
//! 3. Execute the reply and apply the collaborator calls it made
//! 4. Run scripts introduced by the reply on the next tick
//!
//! The runtime is single-threaded (`!Send`). Everything it spawns uses
//! `tokio::task::spawn_local`, so it must be driven from a `LocalSet`.

mod dispatcher;
mod evaluator;
mod remote;

pub use remote::{Delay, PeriodicCall, PeriodicState, RemoteCall, Repeat, MIN_INTERVAL};

use crate::dom::{Document, SharedDocument};
use crate::js_engine::{BoaExecutor, ScriptExecutor, ScriptQueue};
use crate::network::{HttpClient, Request, Transport};
use crate::patcher::DomPatcher;
use crate::resources::{ResourceKind, ResourceLoader, ResourceRegistry};
use crate::utils::{Result, RuntimeConfig};
use std::cell::RefCell;
use std::future::Future;
use std::rc::Rc;
use tokio::task::JoinHandle;
use url::Url;

/// Client runtime for one page
#[derive(Clone)]
pub struct Runtime {
    inner: Rc<Inner>,
}

struct Inner {
    config: Rc<RuntimeConfig>,
    document: SharedDocument,
    client: Rc<dyn HttpClient>,
    transport: Transport,
    executor: RefCell<Box<dyn ScriptExecutor>>,
    registry: RefCell<ResourceRegistry>,
    scripts: RefCell<ScriptQueue>,
    loader: ResourceLoader,
    patcher: DomPatcher,
    /// Periodic calls with the script handle they report to, if any
    periodic: RefCell<Vec<(Option<u64>, PeriodicCall)>>,
    in_flight: RefCell<Vec<JoinHandle<()>>>,
}

impl Runtime {
    /// Attach a runtime with a Boa executor to `document`
    pub fn new(document: Document, client: Rc<dyn HttpClient>, config: RuntimeConfig) -> Result<Self> {
        let executor = BoaExecutor::new()?;
        Ok(Self::with_executor(document, client, Box::new(executor), config))
    }

    /// Attach a runtime using `executor` for server replies
    pub fn with_executor(
        document: Document,
        client: Rc<dyn HttpClient>,
        executor: Box<dyn ScriptExecutor>,
        config: RuntimeConfig,
    ) -> Self {
        let config = Rc::new(config);
        let document: SharedDocument = Rc::new(RefCell::new(document));
        let transport = Transport::new(client.clone(), document.clone(), config.clone());

        Self {
            inner: Rc::new(Inner {
                loader: ResourceLoader::new(&config),
                patcher: DomPatcher::new(),
                config,
                document,
                client,
                transport,
                executor: RefCell::new(executor),
                registry: RefCell::new(ResourceRegistry::new()),
                scripts: RefCell::new(ScriptQueue::new()),
                periodic: RefCell::new(Vec::new()),
                in_flight: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Load the page at `url` and attach a runtime to it
    pub async fn open(url: &str, client: Rc<dyn HttpClient>, config: RuntimeConfig) -> Result<Self> {
        let request = Request::get(url)?.with_credentials(true);
        let page_url = request.url().clone();
        let response = client.execute(request).await?;
        if !response.is_success() {
            log::warn!("{} answered HTTP {}", page_url, response.status());
        }

        let document = Document::parse(page_url, response.text())?;
        Self::new(document, client, config)
    }

    /// The document this runtime acts on
    pub fn document(&self) -> &SharedDocument {
        &self.inner.document
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.inner.config
    }

    pub fn transport(&self) -> &Transport {
        &self.inner.transport
    }

    /// Whether a named resource has been loaded by this runtime
    pub fn is_loaded(&self, kind: ResourceKind, name: &str) -> bool {
        self.inner.registry.borrow().contains(kind, name)
    }

    /// Take the navigation requested by a redirect, cancelling every
    /// periodic call of this page
    pub fn take_navigation(&self) -> Option<Url> {
        let target = self.inner.document.borrow_mut().take_navigation()?;
        self.cancel_periodic_calls();
        Some(target)
    }

    /// `remote_call(url)`
    pub fn remote_call(&self, url: impl Into<String>) -> RemoteCall {
        RemoteCall::new(self.inner.transport.clone(), url)
    }

    /// `delay(url)`
    pub fn delay(&self, url: impl Into<String>) -> Delay {
        Delay::new(self.remote_call(url))
    }

    /// `repeat(url)`
    pub fn repeat(&self, url: impl Into<String>) -> Repeat {
        Repeat::new(self.remote_call(url))
    }

    /// Periodic calls started by executed code that are still active
    pub fn periodic_calls(&self) -> Vec<PeriodicCall> {
        let mut periodic = self.inner.periodic.borrow_mut();
        periodic.retain(|(_, call)| call.is_active());
        periodic.iter().map(|(_, call)| call.clone()).collect()
    }

    pub fn cancel_periodic_calls(&self) {
        for (_, call) in self.inner.periodic.borrow_mut().drain(..) {
            call.cancel();
        }
    }

    /// Wait for every dispatched request, remote call and queued
    /// script to complete. Periodic calls are not waited for.
    pub async fn settle(&self) {
        loop {
            let pending: Vec<JoinHandle<()>> = self.inner.in_flight.borrow_mut().drain(..).collect();
            if pending.is_empty() {
                if self.inner.scripts.borrow().is_empty() {
                    break;
                }
                self.flush_scripts().await;
                continue;
            }
            for handle in pending {
                if let Err(e) = handle.await {
                    log::debug!("background task failed: {}", e);
                }
            }
        }
    }

    /// Run a background task owned by this runtime
    fn spawn<F>(&self, future: F)
    where
        F: Future<Output = ()> + 'static,
    {
        let handle = tokio::task::spawn_local(future);
        let mut in_flight = self.inner.in_flight.borrow_mut();
        in_flight.retain(|h| !h.is_finished());
        in_flight.push(handle);
    }
}
