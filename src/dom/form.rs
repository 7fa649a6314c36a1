//! Form data collection
//!
//! Builds the successful-control list of a form the way a browser's
//! `FormData(form)` does, for the multipart body of a submit action.

use super::node::{Document, ElementData, NodeId};

/// Ordered list of form fields
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormData {
    entries: Vec<(String, String)>,
}

impl FormData {
    /// Create an empty form data set
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect the successful controls owned by `form`
    pub fn from_form(document: &Document, form: NodeId) -> Self {
        let mut data = Self::new();
        let controls = document.find_all(document.root(), |e| {
            e.is("input") || e.is("select") || e.is("textarea")
        });

        for control in controls {
            if form_owner(document, control) != Some(form) {
                continue;
            }
            let Some(element) = document.element(control) else {
                continue;
            };
            let Some(name) = element.get_attribute("name").filter(|n| !n.is_empty()) else {
                continue;
            };
            if element.has_attribute("disabled") {
                continue;
            }

            if element.is("textarea") {
                data.append(name, document.text_content(control));
            } else if element.is("select") {
                for value in selected_values(document, control, element) {
                    data.append(name, value);
                }
            } else if let Some(value) = input_value(element) {
                data.append(name, value);
            }
        }
        data
    }

    /// Append a field
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    /// First value of a field
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// All fields in order
    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no fields
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The form a control belongs to: the form named by its `form` attribute,
/// else its nearest `<form>` ancestor
pub fn form_owner(document: &Document, control: NodeId) -> Option<NodeId> {
    if let Some(form_id) = document.element(control).and_then(|e| e.get_attribute("form")) {
        return document
            .get_element_by_id(form_id)
            .filter(|f| document.element(*f).is_some_and(|e| e.is("form")));
    }
    document.closest(control, |e| e.is("form"))
}

fn input_value(element: &ElementData) -> Option<String> {
    let kind = element
        .get_attribute("type")
        .unwrap_or("text")
        .to_ascii_lowercase();

    match kind.as_str() {
        // Submitters only contribute through the synthetic action fields
        "submit" | "image" | "button" | "reset" | "file" => None,
        "checkbox" | "radio" => element
            .has_attribute("checked")
            .then(|| element.get_attribute("value").unwrap_or("on").to_string()),
        _ => Some(element.get_attribute("value").unwrap_or("").to_string()),
    }
}

fn selected_values(document: &Document, select: NodeId, element: &ElementData) -> Vec<String> {
    let options = document.find_all(select, |e| e.is("option"));
    let mut selected: Vec<NodeId> = options
        .iter()
        .copied()
        .filter(|o| document.element(*o).is_some_and(|e| e.has_attribute("selected")))
        .collect();

    if !element.has_attribute("multiple") {
        selected.truncate(1);
        if selected.is_empty() {
            selected.extend(options.first().copied());
        }
    }

    selected
        .into_iter()
        .filter_map(|o| {
            let option = document.element(o)?;
            Some(match option.get_attribute("value") {
                Some(value) => value.to_string(),
                None => document.text_content(o).trim().to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use url::Url;

    fn parse(html: &str) -> Document {
        Document::parse(Url::parse("http://localhost/").unwrap(), html).unwrap()
    }

    fn pairs(data: &FormData) -> Vec<(&str, &str)> {
        data.entries()
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect()
    }

    #[test]
    fn test_collects_successful_controls() {
        let doc = parse(
            r#"<form id="f">
                <input name="login" value="bob">
                <input name="pwd" type="password" value="secret">
                <input name="remember" type="checkbox" checked>
                <input name="news" type="checkbox" value="yes">
                <input name="color" type="radio" value="red">
                <input name="color" type="radio" value="blue" checked>
                <input name="off" value="x" disabled>
                <input value="anonymous">
                <textarea name="bio">hello</textarea>
                <select name="lang"><option value="fr">French</option><option selected>English</option></select>
                <input type="submit" name="go" value="Go">
            </form>"#,
        );
        let form = doc.get_element_by_id("f").unwrap();
        let data = FormData::from_form(&doc, form);

        assert_eq!(
            pairs(&data),
            vec![
                ("login", "bob"),
                ("pwd", "secret"),
                ("remember", "on"),
                ("color", "blue"),
                ("bio", "hello"),
                ("lang", "English"),
            ]
        );
    }

    #[test]
    fn test_single_select_defaults_to_first_option() {
        let doc = parse(
            r#"<form id="f"><select name="s"><option value="1">one</option><option value="2">two</option></select></form>"#,
        );
        let form = doc.get_element_by_id("f").unwrap();
        assert_eq!(FormData::from_form(&doc, form).get("s"), Some("1"));
    }

    #[test]
    fn test_form_attribute_associates_outside_control() {
        let doc = parse(
            r#"<form id="f"></form><input id="outside" name="q" value="rust" form="f">"#,
        );
        let form = doc.get_element_by_id("f").unwrap();
        let outside = doc.get_element_by_id("outside").unwrap();
        assert_eq!(form_owner(&doc, outside), Some(form));
        assert_eq!(FormData::from_form(&doc, form).get("q"), Some("rust"));
    }

    #[test]
    fn test_no_owner_outside_forms() {
        let doc = parse(r#"<div><input id="i" name="q"></div>"#);
        let input = doc.get_element_by_id("i").unwrap();
        assert_eq!(form_owner(&doc, input), None);
    }
}
