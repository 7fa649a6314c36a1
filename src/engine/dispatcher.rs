//! Click dispatch
//!
//! The browser-facing half of the runtime. A click is classified
//! synchronously, its payload captured while the form still holds the
//! values the user saw, and the request is sent in the background. The
//! default action is prevented only for clicks the runtime handles.

use super::Runtime;
use crate::dispatch::{describe, ActionDescriptor, ActionKind, ClickEvent, EventDisposition};
use crate::network::RequestOptions;

impl Runtime {
    /// Handle a click that reached the document.
    ///
    /// Returns [`EventDisposition::Prevented`] when the click was turned into
    /// a background request; the reply is evaluated once it arrives. Replies
    /// are not ordered: when two clicks race, whichever reply resolves last
    /// leaves its patch in place.
    pub fn process_click(&self, event: ClickEvent) -> EventDisposition {
        let descriptor = {
            let document = self.inner.document.borrow();
            describe(&document, &event, &self.inner.config.action_attribute)
        };
        let Some(descriptor) = descriptor else {
            return EventDisposition::Default;
        };

        let (url, options) = self.request_for(&descriptor);
        log::debug!("dispatching {:?} to {:?}", descriptor.kind, url);

        let runtime = self.clone();
        self.spawn(async move {
            runtime
                .send_and_evaluate(url.as_deref(), options, &[])
                .await
        });
        EventDisposition::Prevented
    }

    /// Send the request described by `descriptor` and evaluate its reply
    pub async fn dispatch(&self, descriptor: &ActionDescriptor) {
        let (url, options) = self.request_for(descriptor);
        self.send_and_evaluate(url.as_deref(), options, &[]).await
    }

    fn request_for(&self, descriptor: &ActionDescriptor) -> (Option<String>, RequestOptions) {
        match descriptor.kind {
            ActionKind::Link => (descriptor.action.clone(), RequestOptions::get()),
            ActionKind::ButtonSubmit | ActionKind::CoordinateSubmit => {
                let data = self.form_payload(descriptor.form, &descriptor.extra);
                (Some("?".to_string()), RequestOptions::post(data))
            }
            ActionKind::None => (None, RequestOptions::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{Document, Rect};
    use crate::network::{Body, HttpClient, Method, Request, Response};
    use crate::utils::{Result, RuntimeConfig};
    use futures::future::LocalBoxFuture;
    use futures::FutureExt;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::rc::Rc;
    use tokio::task::LocalSet;
    use url::Url;

    /// Answers every request with the same body
    struct Echo {
        body: String,
        seen: RefCell<Vec<Request>>,
    }

    impl HttpClient for Echo {
        fn execute(&self, request: Request) -> LocalBoxFuture<'_, Result<Response>> {
            self.seen.borrow_mut().push(request);
            let response = Response::new(200, self.body.clone());
            async move { Ok(response) }.boxed_local()
        }
    }

    fn runtime(html: &str, reply: &str) -> (Runtime, Rc<Echo>) {
        let client = Rc::new(Echo {
            body: reply.to_string(),
            seen: RefCell::new(Vec::new()),
        });
        let document = Document::parse(Url::parse("http://app.local/app/page").unwrap(), html).unwrap();
        let runtime = Runtime::new(document, client.clone(), RuntimeConfig::default()).unwrap();
        (runtime, client)
    }

    fn click(rt: &Runtime, id: &str) -> EventDisposition {
        let target = rt.document().borrow().get_element_by_id(id).unwrap();
        rt.process_click(ClickEvent::new(target))
    }

    #[tokio::test]
    async fn test_link_click_is_prevented_and_patched() {
        LocalSet::new()
            .run_until(async {
                let (rt, client) = runtime(
                    r#"<a id="go" href="next?x=1" data-nagare="15">go</a><p id="out">-</p>"#,
                    "nagare.replaceNode('out', '<p id=\"out\">done</p>')",
                );
                assert!(click(&rt, "go").is_prevented());
                rt.settle().await;

                let seen = client.seen.borrow();
                assert_eq!(seen.len(), 1);
                assert_eq!(seen[0].method(), Method::Get);
                assert_eq!(seen[0].url().as_str(), "http://app.local/app/next?x=1");
                assert_eq!(seen[0].header_value("X-Requested-With"), Some("XMLHttpRequest"));

                let document = rt.document().borrow();
                let out = document.get_element_by_id("out").unwrap();
                assert_eq!(document.text_content(out), "done");
            })
            .await;
    }

    #[tokio::test]
    async fn test_untagged_click_keeps_default() {
        LocalSet::new()
            .run_until(async {
                let (rt, client) = runtime(r#"<a id="plain" href="/x">x</a><a id="odd" data-nagare="2">y</a>"#, "");
                assert_eq!(click(&rt, "plain"), EventDisposition::Default);
                assert_eq!(click(&rt, "odd"), EventDisposition::Default);
                rt.settle().await;
                assert!(client.seen.borrow().is_empty());
            })
            .await;
    }

    #[tokio::test]
    async fn test_submit_captures_form_at_click_time() {
        LocalSet::new()
            .run_until(async {
                let (rt, client) = runtime(
                    r#"<form id="f"><input id="q" name="q" value="before"><button id="b" name="save" data-nagare="6">Save</button></form>"#,
                    "",
                );
                assert!(click(&rt, "b").is_prevented());
                {
                    let mut document = rt.document().borrow_mut();
                    let q = document.get_element_by_id("q").unwrap();
                    document.element_mut(q).unwrap().set_attribute("value", "after");
                }
                rt.settle().await;

                let seen = client.seen.borrow();
                assert_eq!(seen[0].method(), Method::Post);
                assert_eq!(seen[0].url().as_str(), "http://app.local/app/page?");
                let Body::Multipart(data) = seen[0].body() else {
                    panic!("expected a multipart body");
                };
                assert_eq!(data.get("q"), Some("before"));
                assert_eq!(data.get("save"), Some(""));
            })
            .await;
    }

    #[tokio::test]
    async fn test_coordinate_submit_posts_offsets() {
        LocalSet::new()
            .run_until(async {
                let (rt, client) = runtime(
                    r#"<form><input type="image" id="m" name="map" data-nagare="7"></form>"#,
                    "",
                );
                let map = {
                    let mut document = rt.document().borrow_mut();
                    let map = document.get_element_by_id("m").unwrap();
                    document.set_bounding_rect(map, Rect::new(100.0, 50.0, 40.0, 40.0));
                    map
                };
                assert!(rt.process_click(ClickEvent::new(map).at(150.0, 80.0)).is_prevented());
                rt.settle().await;

                let seen = client.seen.borrow();
                let Body::Multipart(data) = seen[0].body() else {
                    panic!("expected a multipart body");
                };
                assert_eq!(data.get("map.x"), Some("50"));
                assert_eq!(data.get("map.y"), Some("30"));
            })
            .await;
    }

    #[tokio::test]
    async fn test_dispatch_descriptor_directly() {
        LocalSet::new()
            .run_until(async {
                let (rt, client) = runtime(r#"<a id="go" href="/direct" data-nagare="5">go</a>"#, "");
                let descriptor = {
                    let document = rt.document().borrow();
                    let go = document.get_element_by_id("go").unwrap();
                    describe(&document, &ClickEvent::new(go), "data-nagare").unwrap()
                };
                rt.dispatch(&descriptor).await;
                assert_eq!(client.seen.borrow()[0].url().path(), "/direct");
            })
            .await;
    }
}
