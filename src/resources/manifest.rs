//! Resource manifests
//!
//! The server describes the resources a reply needs as four positional
//! arrays, e.g. `[["name", "css text", {"media": "print"}]]` for named CSS
//! and `[["/static/app.css", {}]]` for external CSS. Entries are decoded
//! leniently: missing attribute maps are empty and non-string attribute
//! values are stringified.

use serde::Deserialize;
use serde_json::Value;

/// Extra attributes copied onto an injected element
pub type Attributes = Vec<(String, String)>;

/// Inline resource identified by name
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "Vec<Value>")]
pub struct NamedResource {
    pub name: String,
    pub source: String,
    pub attributes: Attributes,
}

/// Resource referenced by URL
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "Vec<Value>")]
pub struct ExternalResource {
    pub url: String,
    pub attributes: Attributes,
}

/// Everything one `loadAll` call asks for
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "(Vec<NamedResource>, Vec<ExternalResource>, Vec<NamedResource>, Vec<ExternalResource>)")]
pub struct ResourceManifest {
    pub named_css: Vec<NamedResource>,
    pub external_css: Vec<ExternalResource>,
    pub named_js: Vec<NamedResource>,
    pub external_js: Vec<ExternalResource>,
}

impl NamedResource {
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            attributes: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }
}

impl ExternalResource {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            attributes: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }
}

impl ResourceManifest {
    /// Decode the four `loadAll` arguments
    pub fn from_values(
        named_css: Value,
        external_css: Value,
        named_js: Value,
        external_js: Value,
    ) -> serde_json::Result<Self> {
        Ok(Self {
            named_css: collection(named_css)?,
            external_css: collection(external_css)?,
            named_js: collection(named_js)?,
            external_js: collection(external_js)?,
        })
    }

    /// Whether the manifest asks for nothing
    pub fn is_empty(&self) -> bool {
        self.named_css.is_empty()
            && self.external_css.is_empty()
            && self.named_js.is_empty()
            && self.external_js.is_empty()
    }
}

impl
    From<(
        Vec<NamedResource>,
        Vec<ExternalResource>,
        Vec<NamedResource>,
        Vec<ExternalResource>,
    )> for ResourceManifest
{
    fn from(
        (named_css, external_css, named_js, external_js): (
            Vec<NamedResource>,
            Vec<ExternalResource>,
            Vec<NamedResource>,
            Vec<ExternalResource>,
        ),
    ) -> Self {
        Self {
            named_css,
            external_css,
            named_js,
            external_js,
        }
    }
}

impl TryFrom<Vec<Value>> for NamedResource {
    type Error = String;

    fn try_from(entry: Vec<Value>) -> Result<Self, Self::Error> {
        let mut fields = entry.into_iter();
        let name = fields
            .next()
            .and_then(scalar)
            .ok_or_else(|| "named resource without a name".to_string())?;
        let source = fields.next().and_then(scalar).unwrap_or_default();
        let attributes = fields.next().map(attributes).unwrap_or_default();
        Ok(Self {
            name,
            source,
            attributes,
        })
    }
}

impl TryFrom<Vec<Value>> for ExternalResource {
    type Error = String;

    fn try_from(entry: Vec<Value>) -> Result<Self, Self::Error> {
        let mut fields = entry.into_iter();
        let url = fields
            .next()
            .and_then(scalar)
            .ok_or_else(|| "external resource without a URL".to_string())?;
        let attributes = fields.next().map(attributes).unwrap_or_default();
        Ok(Self { url, attributes })
    }
}

/// `null`/`undefined` collections are empty
fn collection<T: serde::de::DeserializeOwned>(value: Value) -> serde_json::Result<Vec<T>> {
    match value {
        Value::Null => Ok(Vec::new()),
        value => serde_json::from_value(value),
    }
}

fn scalar(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

fn attributes(value: Value) -> Attributes {
    match value {
        Value::Object(map) => map
            .into_iter()
            .filter_map(|(name, value)| scalar(value).map(|v| (name, v)))
            .collect(),
        _ => Vec::new(),
    }
}
