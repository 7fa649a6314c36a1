//! Resource loading
//!
//! Injects what a manifest asks for and nothing that is already present,
//! either in the registry or as a marker/element in the document.

use super::manifest::{Attributes, ExternalResource, NamedResource, ResourceManifest};
use super::registry::{ResourceKind, ResourceRegistry};
use crate::dom::{Document, NodeId};
use crate::js_engine::ScriptQueue;
use crate::security;
use crate::utils::RuntimeConfig;
use url::Url;

/// What a [`ResourceLoader::load_all`] pass did
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoadReport {
    /// Elements appended to `<head>`
    pub injected: usize,
    /// Scripts queued for the next tick
    pub scheduled: usize,
}

/// Applies resource manifests to a document
#[derive(Debug, Clone)]
pub struct ResourceLoader {
    css_marker: String,
    js_marker: String,
}

impl ResourceLoader {
    pub fn new(config: &RuntimeConfig) -> Self {
        Self {
            css_marker: config.css_marker_attribute.clone(),
            js_marker: config.js_marker_attribute.clone(),
        }
    }

    /// Load every missing resource of `manifest`.
    ///
    /// Named resources go first, CSS before JS in each group, entries in
    /// manifest order.
    pub fn load_all(
        &self,
        document: &mut Document,
        registry: &mut ResourceRegistry,
        scripts: &mut ScriptQueue,
        manifest: &ResourceManifest,
    ) -> LoadReport {
        let mut report = LoadReport::default();

        for css in &manifest.named_css {
            self.load_named_css(document, registry, css, &mut report);
        }
        for js in &manifest.named_js {
            self.load_named_js(document, registry, scripts, js, &mut report);
        }
        for css in &manifest.external_css {
            self.load_external_css(document, css, &mut report);
        }
        for js in &manifest.external_js {
            self.load_external_js(document, scripts, js, &mut report);
        }

        log::debug!(
            "loadAll: {} element(s) injected, {} script(s) scheduled",
            report.injected,
            report.scheduled
        );
        report
    }

    fn has_marker(&self, document: &Document, marker: &str, name: &str) -> bool {
        document
            .find_first(document.root(), |e| e.get_attribute(marker) == Some(name))
            .is_some()
    }

    fn load_named_css(
        &self,
        document: &mut Document,
        registry: &mut ResourceRegistry,
        css: &NamedResource,
        report: &mut LoadReport,
    ) {
        if registry.contains(ResourceKind::Css, &css.name)
            || self.has_marker(document, &self.css_marker, &css.name)
        {
            return;
        }

        if !css.source.is_empty() {
            let style = document.create_element("style");
            set_attributes(
                document,
                style,
                &[
                    ("type", "text/css"),
                    (self.css_marker.as_str(), css.name.as_str()),
                ],
                &css.attributes,
            );
            document.set_text_content(style, &css.source);
            append_to_head(document, style);
            report.injected += 1;
        }
        registry.insert(ResourceKind::Css, css.name.clone());
    }

    fn load_named_js(
        &self,
        document: &Document,
        registry: &mut ResourceRegistry,
        scripts: &mut ScriptQueue,
        js: &NamedResource,
        report: &mut LoadReport,
    ) {
        if registry.contains(ResourceKind::Js, &js.name)
            || self.has_marker(document, &self.js_marker, &js.name)
        {
            return;
        }

        scripts.push_inline(js.source.clone());
        registry.insert(ResourceKind::Js, js.name.clone());
        report.scheduled += 1;
    }

    fn load_external_css(
        &self,
        document: &mut Document,
        css: &ExternalResource,
        report: &mut LoadReport,
    ) {
        let Some(url) = resolve(document, &css.url) else {
            return;
        };
        let present = existing_urls(document, "href", |e| {
            e.is("link")
                && e.get_attribute("rel")
                    .is_some_and(|rel| rel.split_whitespace().any(|r| r.eq_ignore_ascii_case("stylesheet")))
        });
        if present.iter().any(|u| security::same_resource(u, &url)) {
            return;
        }

        let link = document.create_element("link");
        set_attributes(
            document,
            link,
            &[("rel", "stylesheet"), ("type", "text/css"), ("href", css.url.as_str())],
            &css.attributes,
        );
        append_to_head(document, link);
        report.injected += 1;
    }

    fn load_external_js(
        &self,
        document: &mut Document,
        scripts: &mut ScriptQueue,
        js: &ExternalResource,
        report: &mut LoadReport,
    ) {
        let Some(url) = resolve(document, &js.url) else {
            return;
        };
        let present = existing_urls(document, "src", |e| e.is("script"));
        if present.iter().any(|u| security::same_resource(u, &url)) {
            return;
        }

        let script = document.create_element("script");
        set_attributes(
            document,
            script,
            &[("type", "text/javascript"), ("src", js.url.as_str())],
            &js.attributes,
        );
        append_to_head(document, script);
        scripts.push_external(url);
        report.injected += 1;
        report.scheduled += 1;
    }
}

fn resolve(document: &Document, reference: &str) -> Option<Url> {
    match document.resolve(reference) {
        Ok(url) => Some(url),
        Err(e) => {
            log::debug!("skipping resource: {}", e);
            None
        }
    }
}

/// Resolved values of `attribute` on connected elements matching `predicate`
fn existing_urls<F>(document: &Document, attribute: &str, predicate: F) -> Vec<Url>
where
    F: Fn(&crate::dom::ElementData) -> bool,
{
    document
        .find_all(document.root(), |e| predicate(e) && e.has_attribute(attribute))
        .into_iter()
        .filter_map(|id| document.element(id)?.get_attribute(attribute).map(str::to_string))
        .filter_map(|reference| document.resolve(&reference).ok())
        .collect()
}

fn set_attributes(
    document: &mut Document,
    element: NodeId,
    fixed: &[(&str, &str)],
    extra: &Attributes,
) {
    if let Some(data) = document.element_mut(element) {
        for (name, value) in fixed {
            data.set_attribute(*name, *value);
        }
        for (name, value) in extra {
            data.set_attribute(name.as_str(), value.as_str());
        }
    }
}

fn append_to_head(document: &mut Document, element: NodeId) {
    let head = document.ensure_head();
    document.append_child(head, element);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::js_engine::ScriptTask;
    use pretty_assertions::assert_eq;

    struct Fixture {
        document: Document,
        registry: ResourceRegistry,
        scripts: ScriptQueue,
        loader: ResourceLoader,
    }

    impl Fixture {
        fn new(html: &str) -> Self {
            Self {
                document: Document::parse(Url::parse("http://app.local/app/").unwrap(), html)
                    .unwrap(),
                registry: ResourceRegistry::new(),
                scripts: ScriptQueue::new(),
                loader: ResourceLoader::new(&RuntimeConfig::default()),
            }
        }

        fn load(&mut self, manifest: &ResourceManifest) -> LoadReport {
            self.loader.load_all(
                &mut self.document,
                &mut self.registry,
                &mut self.scripts,
                manifest,
            )
        }

        fn count(&self, tag: &str) -> usize {
            self.document
                .find_all(self.document.root(), |e| e.is(tag))
                .len()
        }
    }

    #[test]
    fn test_named_css_injected_once() {
        let mut fx = Fixture::new("<html><head></head><body></body></html>");
        let manifest = ResourceManifest {
            named_css: vec![NamedResource::new("base", "p { color: red }").with_attribute("media", "screen")],
            ..Default::default()
        };
        assert_eq!(fx.load(&manifest).injected, 1);
        assert_eq!(fx.load(&manifest).injected, 0);
        assert_eq!(fx.count("style"), 1);

        let style = fx.document.find_first(fx.document.root(), |e| e.is("style")).unwrap();
        assert_eq!(
            fx.document.outer_html(style),
            r#"<style type="text/css" data-nagare-css="base" media="screen">p { color: red }</style>"#
        );
    }

    #[test]
    fn test_empty_named_css_is_recorded_not_injected() {
        let mut fx = Fixture::new("<html><head></head><body></body></html>");
        let manifest = ResourceManifest {
            named_css: vec![NamedResource::new("empty", "")],
            ..Default::default()
        };
        assert_eq!(fx.load(&manifest), LoadReport::default());
        assert_eq!(fx.count("style"), 0);
        assert!(fx.registry.contains(ResourceKind::Css, "empty"));
    }

    #[test]
    fn test_server_rendered_markers_are_respected() {
        let mut fx = Fixture::new(
            r#"<html><head><style data-nagare-css="base">p{}</style><script data-nagare-js="init">go()</script></head></html>"#,
        );
        let manifest = ResourceManifest {
            named_css: vec![NamedResource::new("base", "p {}")],
            named_js: vec![NamedResource::new("init", "go()")],
            ..Default::default()
        };
        assert_eq!(fx.load(&manifest), LoadReport::default());
        assert!(fx.scripts.is_empty());
    }

    #[test]
    fn test_named_js_scheduled_once() {
        let mut fx = Fixture::new("<html><head></head></html>");
        let manifest = ResourceManifest {
            named_js: vec![NamedResource::new("init", "start()")],
            ..Default::default()
        };
        fx.load(&manifest);
        fx.load(&manifest);
        assert_eq!(
            fx.scripts.drain(),
            vec![ScriptTask::Inline { source: "start()".to_string() }]
        );
    }

    #[test]
    fn test_external_css_matched_by_resolved_path() {
        let mut fx = Fixture::new(
            r#"<html><head><link rel="stylesheet" href="/static/app.css?v=2"></head></html>"#,
        );
        let manifest = ResourceManifest {
            external_css: vec![
                ExternalResource::new("http://app.local/static/app.css"),
                ExternalResource::new("../static/app.css"),
                ExternalResource::new("/static/print.css"),
            ],
            ..Default::default()
        };
        assert_eq!(fx.load(&manifest).injected, 1);
        assert_eq!(fx.count("link"), 2);
    }

    #[test]
    fn test_external_css_on_other_host_is_distinct() {
        let mut fx = Fixture::new(
            r#"<html><head><link rel="stylesheet" href="/static/app.css"></head></html>"#,
        );
        let manifest = ResourceManifest {
            external_css: vec![ExternalResource::new("http://cdn.local/static/app.css")],
            ..Default::default()
        };
        assert_eq!(fx.load(&manifest).injected, 1);
    }

    #[test]
    fn test_external_js_appended_and_scheduled_once() {
        let mut fx = Fixture::new("<html><head></head></html>");
        let manifest = ResourceManifest {
            external_js: vec![ExternalResource::new("/static/app.js").with_attribute("defer", "")],
            ..Default::default()
        };
        assert_eq!(fx.load(&manifest), LoadReport { injected: 1, scheduled: 1 });
        assert_eq!(fx.load(&manifest), LoadReport::default());

        let script = fx.document.find_first(fx.document.root(), |e| e.is("script")).unwrap();
        assert_eq!(
            fx.document.outer_html(script),
            r#"<script type="text/javascript" src="/static/app.js" defer=""></script>"#
        );
        assert_eq!(
            fx.scripts.drain(),
            vec![ScriptTask::External {
                url: Url::parse("http://app.local/static/app.js").unwrap()
            }]
        );
    }

    #[test]
    fn test_order_named_before_external_css_before_js() {
        let mut fx = Fixture::new("<html><head></head></html>");
        let manifest = ResourceManifest {
            named_css: vec![NamedResource::new("a", "a{}")],
            external_css: vec![ExternalResource::new("/b.css")],
            named_js: vec![NamedResource::new("c", "c()")],
            external_js: vec![ExternalResource::new("/d.js")],
        };
        fx.load(&manifest);

        let head = fx.document.head().unwrap();
        let tags: Vec<String> = fx
            .document
            .children(head)
            .iter()
            .map(|id| fx.document.element(*id).unwrap().tag_name.clone())
            .collect();
        assert_eq!(tags, vec!["style", "link", "script"]);

        let tasks = fx.scripts.drain();
        assert_eq!(tasks[0], ScriptTask::Inline { source: "c()".to_string() });
        assert!(matches!(tasks[1], ScriptTask::External { .. }));
    }

    #[test]
    fn test_head_created_when_missing() {
        let mut fx = Fixture::new("");
        let manifest = ResourceManifest {
            external_css: vec![ExternalResource::new("/x.css")],
            ..Default::default()
        };
        fx.load(&manifest);
        assert!(fx.document.head().is_some());
        assert_eq!(fx.count("link"), 1);
    }
}
