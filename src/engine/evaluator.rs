//! Response evaluation
//!
//! A successful reply body is executed in the scoped executor and the
//! collaborator calls it recorded are applied to the document. Failures of
//! any kind end here: they are logged and discarded.

use super::Runtime;
use crate::dom::{FormData, NodeId};
use crate::js_engine::{ApiCall, CallOutcome, ScriptTask};
use crate::network::{Method, Request, RequestOptions};
use crate::patcher::is_executable_script;
use crate::security;
use crate::utils::{NagareError, Result};
use serde_json::Value;
use std::rc::Rc;
use std::time::Duration;
use url::Url;

/// Where a remote call outcome is delivered in executed code
#[derive(Debug, Clone, Copy)]
enum Continuation {
    /// Promise returned by `callRemote` / `delay`
    Promise(u64),
    /// Continuations of a `repeat` handle
    Tick(u64),
}

impl Runtime {
    /// Send a request and execute its reply
    pub async fn send_and_evaluate(&self, url: Option<&str>, options: RequestOptions, params: &[Value]) {
        match self.inner.transport.send(url, options, params).await {
            Ok(response) => self.evaluate(response.text()).await,
            Err(e) if e.is_handled_by_transport() => log::debug!("reply not evaluated: {}", e),
            Err(e) => log::warn!("request failed: {}", e),
        }
    }

    /// GET `url` and execute the reply
    pub async fn get_and_evaluate(&self, url: &str) {
        self.send_and_evaluate(Some(url), RequestOptions::get(), &[]).await
    }

    /// POST `form` plus `extra` fields to the current page and execute the
    /// reply
    pub async fn post_and_evaluate(&self, form: Option<NodeId>, extra: &[(String, String)]) {
        let data = self.form_payload(form, extra);
        self.send_and_evaluate(Some("?"), RequestOptions::post(data), &[])
            .await
    }

    /// Execute `source` now, then run the scripts it scheduled on the next
    /// tick
    pub async fn evaluate(&self, source: &str) {
        self.execute_script(source);
        tokio::task::yield_now().await;
        self.flush_scripts().await;
    }

    /// Run queued scripts, oldest first, until the queue stays empty
    pub async fn flush_scripts(&self) {
        loop {
            let tasks = self.inner.scripts.borrow_mut().drain();
            if tasks.is_empty() {
                break;
            }
            for task in tasks {
                match task {
                    ScriptTask::Inline { source } => self.execute_script(&source),
                    ScriptTask::External { url } => match self.fetch_script(&url).await {
                        Ok(source) => self.execute_script(&source),
                        Err(e) => log::debug!("script {} not run: {}", url, e),
                    },
                }
            }
        }
    }

    /// Schedule every executable script of the current document and run
    /// them, as a browser does on page load
    pub async fn run_page_scripts(&self) {
        {
            let document = self.inner.document.borrow();
            let mut scripts = self.inner.scripts.borrow_mut();
            for id in document.find_all(document.root(), is_executable_script) {
                let Some(element) = document.element(id) else {
                    continue;
                };
                match element.get_attribute("src") {
                    Some(src) => match document.resolve(src) {
                        Ok(url) => scripts.push_external(url),
                        Err(e) => log::debug!("page script skipped: {}", e),
                    },
                    None => scripts.push_inline(document.text_content(id)),
                }
            }
        }
        self.flush_scripts().await;
    }

    pub(super) fn form_payload(&self, form: Option<NodeId>, extra: &[(String, String)]) -> FormData {
        let mut data = match form {
            Some(form) => FormData::from_form(&self.inner.document.borrow(), form),
            None => FormData::new(),
        };
        for (name, value) in extra {
            data.append(name.as_str(), value.as_str());
        }
        data
    }

    /// Hand a remote call outcome back to the script that asked for it and
    /// apply what its continuations do. Scripts they schedule run on the
    /// next tick.
    fn continue_script<E>(&self, continuation: Continuation, outcome: std::result::Result<Value, E>)
    where
        E: std::fmt::Display,
    {
        let outcome: CallOutcome = outcome.map_err(|e| e.to_string());
        let mut calls = Vec::new();
        let delivered = {
            let mut executor = self.inner.executor.borrow_mut();
            match continuation {
                Continuation::Promise(id) => executor.settle(id, &outcome, &mut calls),
                Continuation::Tick(id) => executor.tick(id, &outcome, &mut calls),
            }
        };
        if let Err(e) = delivered {
            log::debug!("continuation failed: {}", e);
        }
        for call in calls {
            self.apply(call);
        }

        if !self.inner.scripts.borrow().is_empty() {
            let runtime = self.clone();
            self.spawn(async move {
                tokio::task::yield_now().await;
                runtime.flush_scripts().await;
            });
        }
    }

    fn execute_script(&self, source: &str) {
        let mut calls = Vec::new();
        let outcome = self.inner.executor.borrow_mut().execute(source, &mut calls);
        if let Err(e) = outcome {
            log::debug!("evaluation failed: {}", e);
        }
        for call in calls {
            self.apply(call);
        }
    }

    fn apply(&self, call: ApiCall) {
        match call {
            ApiCall::LoadAll(manifest) => {
                let mut document = self.inner.document.borrow_mut();
                self.inner.loader.load_all(
                    &mut document,
                    &mut self.inner.registry.borrow_mut(),
                    &mut self.inner.scripts.borrow_mut(),
                    &manifest,
                );
            }
            ApiCall::ReplaceNode { id, html } => {
                let patched = self.inner.patcher.replace_node(
                    &mut self.inner.document.borrow_mut(),
                    &mut self.inner.scripts.borrow_mut(),
                    &id,
                    &html,
                );
                if let Err(e) = patched {
                    log::debug!("replaceNode({}) failed: {}", id, e);
                }
            }
            ApiCall::RemoteCall { url, params, promise } => {
                let remote = self.remote_call(url);
                let runtime = self.clone();
                self.spawn(async move {
                    let outcome = remote.call(&params).await;
                    if let Err(e) = &outcome {
                        log::debug!("remote call {} failed: {}", remote.url(), e);
                    }
                    if let Some(promise) = promise {
                        runtime.continue_script(Continuation::Promise(promise), outcome);
                    }
                });
            }
            ApiCall::Delay {
                url,
                delay_ms,
                params,
                promise,
            } => {
                let delay = self.delay(url.clone());
                let runtime = self.clone();
                self.spawn(async move {
                    let outcome = delay.call(Duration::from_millis(delay_ms), &params).await;
                    if let Err(e) = &outcome {
                        log::debug!("delayed call {} failed: {}", url, e);
                    }
                    if let Some(promise) = promise {
                        runtime.continue_script(Continuation::Promise(promise), outcome);
                    }
                });
            }
            ApiCall::Repeat {
                url,
                interval_ms,
                params,
                handle,
            } => {
                let periodic = self
                    .repeat(url)
                    .start(Duration::from_millis(interval_ms), params);
                if let Some(handle) = handle {
                    let success = Rc::downgrade(&self.inner);
                    let failure = Rc::downgrade(&self.inner);
                    periodic
                        .on_success(move |value| {
                            if let Some(inner) = success.upgrade() {
                                let outcome: Result<Value> = Ok(value.clone());
                                Runtime { inner }.continue_script(Continuation::Tick(handle), outcome);
                            }
                        })
                        .on_failure(move |e| {
                            if let Some(inner) = failure.upgrade() {
                                let outcome: CallOutcome = Err(e.to_string());
                                Runtime { inner }.continue_script(Continuation::Tick(handle), outcome);
                            }
                        });
                }
                let mut running = self.inner.periodic.borrow_mut();
                running.retain(|(_, call)| call.is_active());
                running.push((handle, periodic));
            }
            ApiCall::CancelRepeat { handle } => {
                let mut running = self.inner.periodic.borrow_mut();
                for (_, call) in running.iter().filter(|(h, _)| *h == Some(handle)) {
                    call.cancel();
                }
                running.retain(|(_, call)| call.is_active());
            }
            ApiCall::GetAndEval { url } => {
                let runtime = self.clone();
                self.spawn(async move { runtime.get_and_evaluate(&url).await });
            }
            ApiCall::Console { level, message } => {
                log::log!(target: "nagare::console", level, "{}", message);
            }
        }
    }

    /// Fetch an external script the way the page would: a plain GET with
    /// cookies only for the page's own origin
    async fn fetch_script(&self, url: &Url) -> Result<String> {
        let credentials = security::credentials_allowed(self.inner.document.borrow().url(), url);
        let request = Request::new(Method::Get, url.clone()).with_credentials(credentials);
        let response = self.inner.client.execute(request).await?;
        if !response.is_success() {
            return Err(NagareError::Server {
                status: response.status(),
            });
        }
        Ok(response.into_text())
    }
}
