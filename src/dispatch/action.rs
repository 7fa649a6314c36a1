//! Action tags and click classification

use super::ClickEvent;
use crate::dom::{form_owner, Document, NodeId};

/// Flag set by the server renderer when the callback carries a continuation
pub const WITH_CONTINUATION: u8 = 0x10;

const LINK: u8 = 5;
const SUBMIT: u8 = 6;
const IMAGE_SUBMIT: u8 = 7;

/// What a click on a tagged element does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    /// Not ours: the browser's default handling applies
    None,
    /// GET the element's `href`
    Link,
    /// POST the owning form plus `{name: ""}`
    ButtonSubmit,
    /// POST the owning form plus the click coordinates
    CoordinateSubmit,
}

/// Decoded `data-nagare` value
///
/// The server prints callback codes as two hex digits (`"15"` is a link
/// with continuation); bare digits (`"5"`) are accepted as well.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionTag(u8);

impl ActionTag {
    /// Parse an attribute value
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.is_empty() || value.len() > 2 {
            return None;
        }
        u8::from_str_radix(value, 16).ok().map(Self)
    }

    /// Raw callback code
    pub fn code(&self) -> u8 {
        self.0
    }

    pub fn with_continuation(&self) -> bool {
        self.0 & WITH_CONTINUATION != 0
    }

    pub fn kind(&self) -> ActionKind {
        match self.0 & 0x0f {
            LINK => ActionKind::Link,
            SUBMIT => ActionKind::ButtonSubmit,
            IMAGE_SUBMIT => ActionKind::CoordinateSubmit,
            _ => ActionKind::None,
        }
    }
}

/// Classify an attribute value; absent or unrecognized values are `None`
pub fn classify(value: Option<&str>) -> ActionKind {
    value
        .and_then(ActionTag::parse)
        .map_or(ActionKind::None, |tag| tag.kind())
}

/// Everything needed to issue the request for one click
#[derive(Debug, Clone, PartialEq)]
pub struct ActionDescriptor {
    pub kind: ActionKind,
    /// Element carrying the action tag
    pub target: NodeId,
    /// Form whose fields are posted
    pub form: Option<NodeId>,
    /// `href` for links, `name` for submits
    pub action: Option<String>,
    /// Synthetic fields appended to the form data
    pub extra: Vec<(String, String)>,
}

/// Find the element carrying the action tag for `event`: the target itself,
/// else its nearest `<a>`/`<button>` ancestor carrying one
pub fn resolve_target(document: &Document, event: &ClickEvent, attribute: &str) -> Option<NodeId> {
    let target = document.element(event.target)?;
    if target.has_attribute(attribute) {
        return Some(event.target);
    }
    document.closest(event.target, |e| {
        (e.is("a") || e.is("button")) && e.has_attribute(attribute)
    })
}

/// Build the action for `event`, or `None` when the click is not ours
pub fn describe(document: &Document, event: &ClickEvent, attribute: &str) -> Option<ActionDescriptor> {
    let target = resolve_target(document, event, attribute)?;
    let element = document.element(target)?;
    let kind = classify(element.get_attribute(attribute));

    let descriptor = match kind {
        ActionKind::None => return None,
        ActionKind::Link => ActionDescriptor {
            kind,
            target,
            form: None,
            action: element.get_attribute("href").map(str::to_string),
            extra: Vec::new(),
        },
        ActionKind::ButtonSubmit => {
            let name = element.get_attribute("name").map(str::to_string);
            ActionDescriptor {
                kind,
                target,
                form: form_owner(document, event.target),
                extra: vec![(name.clone().unwrap_or_default(), String::new())],
                action: name,
            }
        }
        ActionKind::CoordinateSubmit => {
            let name = element.get_attribute("name").map(str::to_string);
            let (x, y) = click_offset(document, target, event);
            let prefix = name.clone().unwrap_or_default();
            ActionDescriptor {
                kind,
                target,
                form: form_owner(document, event.target),
                extra: vec![
                    (format!("{}.x", prefix), x.to_string()),
                    (format!("{}.y", prefix), y.to_string()),
                ],
                action: name,
            }
        }
    };
    Some(descriptor)
}

/// Click position relative to the element's box, rounded half up
pub fn click_offset(document: &Document, element: NodeId, event: &ClickEvent) -> (i64, i64) {
    let rect = document.bounding_client_rect(element);
    (
        round_half_up(event.client_x - rect.left()),
        round_half_up(event.client_y - rect.top()),
    )
}

fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Rect;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use url::Url;

    const ATTR: &str = "data-nagare";

    fn parse(html: &str) -> Document {
        Document::parse(Url::parse("http://app.local/").unwrap(), html).unwrap()
    }

    #[test]
    fn test_tag_decoding() {
        assert_eq!(classify(Some("5")), ActionKind::Link);
        assert_eq!(classify(Some("15")), ActionKind::Link);
        assert_eq!(classify(Some("6")), ActionKind::ButtonSubmit);
        assert_eq!(classify(Some("16")), ActionKind::ButtonSubmit);
        assert_eq!(classify(Some("7")), ActionKind::CoordinateSubmit);
        assert_eq!(classify(Some(" 17 ")), ActionKind::CoordinateSubmit);
        assert_eq!(classify(Some("3")), ActionKind::None);
        assert_eq!(classify(Some("")), ActionKind::None);
        assert_eq!(classify(Some("link")), ActionKind::None);
        assert_eq!(classify(Some("115")), ActionKind::None);
        assert_eq!(classify(None), ActionKind::None);

        assert!(ActionTag::parse("15").unwrap().with_continuation());
        assert!(!ActionTag::parse("5").unwrap().with_continuation());
    }

    #[test]
    fn test_link_on_target() {
        let doc = parse(r#"<a id="l" href="/next" data-nagare="15">go</a>"#);
        let link = doc.get_element_by_id("l").unwrap();
        let action = describe(&doc, &ClickEvent::new(link), ATTR).unwrap();
        assert_eq!(action.kind, ActionKind::Link);
        assert_eq!(action.action.as_deref(), Some("/next"));
        assert!(action.extra.is_empty());
    }

    #[test]
    fn test_click_inside_link_climbs_to_anchor() {
        let doc = parse(r#"<a id="l" href="/next" data-nagare="5"><img id="i"></a>"#);
        let img = doc.get_element_by_id("i").unwrap();
        let link = doc.get_element_by_id("l").unwrap();
        assert_eq!(resolve_target(&doc, &ClickEvent::new(img), ATTR), Some(link));
    }

    #[test]
    fn test_untagged_ancestors_are_ignored() {
        let doc = parse(r#"<div data-nagare="5"><a href="/x"><span id="s">x</span></a></div>"#);
        let span = doc.get_element_by_id("s").unwrap();
        assert_eq!(describe(&doc, &ClickEvent::new(span), ATTR), None);
    }

    #[test]
    fn test_unknown_kind_is_not_handled() {
        let doc = parse(r#"<a id="l" href="/x" data-nagare="9">x</a>"#);
        let link = doc.get_element_by_id("l").unwrap();
        assert_eq!(describe(&doc, &ClickEvent::new(link), ATTR), None);
    }

    #[test]
    fn test_button_submit_uses_form_owner() {
        let doc = parse(
            r#"<form id="f"><input name="q" value="x"><button id="b" name="save" data-nagare="16">Save</button></form>"#,
        );
        let button = doc.get_element_by_id("b").unwrap();
        let form = doc.get_element_by_id("f").unwrap();
        let action = describe(&doc, &ClickEvent::new(button), ATTR).unwrap();
        assert_eq!(action.kind, ActionKind::ButtonSubmit);
        assert_eq!(action.form, Some(form));
        assert_eq!(action.extra, vec![("save".to_string(), String::new())]);
    }

    #[test]
    fn test_coordinate_submit_offsets() {
        let mut doc = parse(r#"<form><input type="image" id="m" name="map" data-nagare="17"></form>"#);
        let map = doc.get_element_by_id("m").unwrap();
        doc.set_bounding_rect(map, Rect::new(100.0, 50.0, 300.0, 200.0));

        let action = describe(&doc, &ClickEvent::new(map).at(150.0, 80.0), ATTR).unwrap();
        assert_eq!(
            action.extra,
            vec![
                ("map.x".to_string(), "50".to_string()),
                ("map.y".to_string(), "30".to_string()),
            ]
        );
    }

    #[test]
    fn test_submit_without_form() {
        let doc = parse(r#"<button id="b" name="go" data-nagare="6">go</button>"#);
        let button = doc.get_element_by_id("b").unwrap();
        let action = describe(&doc, &ClickEvent::new(button), ATTR).unwrap();
        assert_eq!(action.form, None);
    }

    #[test]
    fn test_rounding_matches_browsers() {
        assert_eq!(round_half_up(2.5), 3);
        assert_eq!(round_half_up(-2.5), -2);
        assert_eq!(round_half_up(0.49), 0);
    }

    proptest! {
        #[test]
        fn prop_low_nibble_selects_kind(high in 0u8..16, low in 0u8..16) {
            let code = (high << 4) | low;
            let expected = match low {
                5 => ActionKind::Link,
                6 => ActionKind::ButtonSubmit,
                7 => ActionKind::CoordinateSubmit,
                _ => ActionKind::None,
            };
            prop_assert_eq!(classify(Some(format!("{:02X}", code).as_str())), expected);
            prop_assert_eq!(classify(Some(format!("{:02x}", code).as_str())), expected);
        }

        #[test]
        fn prop_integer_offsets_are_exact(
            left in -1000i32..1000, top in -1000i32..1000,
            dx in 0i32..500, dy in 0i32..500,
        ) {
            let mut doc = parse(r#"<input id="m" name="m" data-nagare="7">"#);
            let m = doc.get_element_by_id("m").unwrap();
            doc.set_bounding_rect(m, Rect::new(left as f64, top as f64, 500.0, 500.0));
            let event = ClickEvent::new(m).at((left + dx) as f64, (top + dy) as f64);
            prop_assert_eq!(click_offset(&doc, m, &event), (dx as i64, dy as i64));
        }
    }
}
