//! Collaborator API call records
//!
//! The executor's prelude serializes each call as `{"api": name, "args": [...]}`.

use crate::resources::ResourceManifest;
use crate::utils::{error::JsError, Result};
use serde::Deserialize;
use serde_json::Value;

/// A call made by executed code on the `nagare` object or `console`
#[derive(Debug, Clone, PartialEq)]
pub enum ApiCall {
    /// `loadAll(namedCss, css, namedJs, js)`
    LoadAll(ResourceManifest),
    /// `replaceNode(id, html)`
    ReplaceNode { id: String, html: String },
    /// `callRemote(url)(...params)`; `promise` identifies the promise
    /// handed back to the script
    RemoteCall {
        url: String,
        params: Vec<Value>,
        promise: Option<u64>,
    },
    /// `delay(url)(t, ...params)`
    Delay {
        url: String,
        delay_ms: u64,
        params: Vec<Value>,
        promise: Option<u64>,
    },
    /// `repeat(url)(t, ...params)`; `handle` identifies the script-side
    /// handle holding the continuations
    Repeat {
        url: String,
        interval_ms: u64,
        params: Vec<Value>,
        handle: Option<u64>,
    },
    /// `cancel()` on a repeat handle
    CancelRepeat { handle: u64 },
    /// `getAndEval(url)`
    GetAndEval { url: String },
    /// `console.*(...)`
    Console { level: log::Level, message: String },
}

#[derive(Debug, Deserialize)]
struct RawCall {
    api: String,
    #[serde(default)]
    args: Vec<Value>,
}

impl TryFrom<RawCall> for ApiCall {
    type Error = JsError;

    fn try_from(raw: RawCall) -> std::result::Result<Self, Self::Error> {
        let mut args = raw.args.into_iter();
        let mut next = || args.next().unwrap_or(Value::Null);

        let call = match raw.api.as_str() {
            "loadAll" => {
                let manifest = ResourceManifest::from_values(next(), next(), next(), next())
                    .map_err(|e| JsError::MalformedCall(format!("loadAll: {}", e)))?;
                ApiCall::LoadAll(manifest)
            }
            "replaceNode" => ApiCall::ReplaceNode {
                id: text(next()),
                html: text(next()),
            },
            "callRemote" => ApiCall::RemoteCall {
                url: text(next()),
                params: list(next()),
                promise: next().as_u64(),
            },
            "delay" => ApiCall::Delay {
                url: text(next()),
                delay_ms: millis(next()),
                params: list(next()),
                promise: next().as_u64(),
            },
            "repeat" => ApiCall::Repeat {
                url: text(next()),
                interval_ms: millis(next()),
                params: list(next()),
                handle: next().as_u64(),
            },
            "cancelRepeat" => ApiCall::CancelRepeat {
                handle: next()
                    .as_u64()
                    .ok_or_else(|| JsError::MalformedCall("cancelRepeat without handle".to_string()))?,
            },
            "getAndEval" => ApiCall::GetAndEval { url: text(next()) },
            "console" => ApiCall::Console {
                level: level(&text(next())),
                message: text(next()),
            },
            other => return Err(JsError::MalformedCall(format!("unknown API {}", other))),
        };
        Ok(call)
    }
}

/// Decode the JSON array drained from the executor.
///
/// Malformed individual records are logged and skipped.
pub fn parse_calls(json: &str) -> Result<Vec<ApiCall>> {
    let raw: Vec<RawCall> = serde_json::from_str(json)?;
    Ok(raw
        .into_iter()
        .filter_map(|call| match ApiCall::try_from(call) {
            Ok(call) => Some(call),
            Err(e) => {
                log::debug!("ignoring API call: {}", e);
                None
            }
        })
        .collect())
}

fn text(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    }
}

fn list(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        other => vec![other],
    }
}

/// Negative and non-numeric delays count as zero
fn millis(value: Value) -> u64 {
    value
        .as_f64()
        .filter(|ms| ms.is_finite() && *ms > 0.0)
        .map(|ms| ms.round() as u64)
        .unwrap_or(0)
}

fn level(name: &str) -> log::Level {
    match name {
        "error" => log::Level::Error,
        "warn" => log::Level::Warn,
        "debug" => log::Level::Debug,
        _ => log::Level::Info,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_replace_and_remote() {
        let calls = parse_calls(
            r#"[{"api":"replaceNode","args":["box","<p>hi</p>"]},
                {"api":"callRemote","args":["/cb",[1,"a"],4]}]"#,
        )
        .unwrap();
        assert_eq!(
            calls,
            vec![
                ApiCall::ReplaceNode {
                    id: "box".to_string(),
                    html: "<p>hi</p>".to_string()
                },
                ApiCall::RemoteCall {
                    url: "/cb".to_string(),
                    params: vec![Value::from(1), Value::from("a")],
                    promise: Some(4),
                },
            ]
        );
    }

    #[test]
    fn test_repeat_handles() {
        let calls = parse_calls(
            r#"[{"api":"repeat","args":["/r",50,[],2]},
                {"api":"cancelRepeat","args":[2]},
                {"api":"cancelRepeat","args":[]}]"#,
        )
        .unwrap();
        assert_eq!(calls.len(), 2);
        assert!(matches!(calls[0], ApiCall::Repeat { handle: Some(2), .. }));
        assert_eq!(calls[1], ApiCall::CancelRepeat { handle: 2 });
    }

    #[test]
    fn test_timer_arguments_are_clamped() {
        let calls = parse_calls(
            r#"[{"api":"delay","args":["/d",-5,[]]},
                {"api":"repeat","args":["/r",null,[]]},
                {"api":"repeat","args":["/r",1000.4,[true]]}]"#,
        )
        .unwrap();
        assert!(matches!(calls[0], ApiCall::Delay { delay_ms: 0, .. }));
        assert!(matches!(calls[1], ApiCall::Repeat { interval_ms: 0, .. }));
        assert!(matches!(calls[2], ApiCall::Repeat { interval_ms: 1000, .. }));
    }

    #[test]
    fn test_unknown_calls_are_skipped() {
        let calls = parse_calls(
            r#"[{"api":"alert","args":[]},{"api":"getAndEval","args":["/x"]}]"#,
        )
        .unwrap();
        assert_eq!(calls, vec![ApiCall::GetAndEval { url: "/x".to_string() }]);
    }

    #[test]
    fn test_console_levels() {
        let calls = parse_calls(r#"[{"api":"console","args":["warn","careful"]}]"#).unwrap();
        assert_eq!(
            calls,
            vec![ApiCall::Console {
                level: log::Level::Warn,
                message: "careful".to_string()
            }]
        );
    }
}
