//! JavaScript runtime implementation using Boa engine

use super::{parse_calls, ApiCall, CallOutcome, ScriptExecutor};
use crate::utils::{error::JsError, Result};
use boa_engine::{Context, Source};

/// Installs the `nagare` collaborator object and `console`.
///
/// Calls are serialized into a closure-private buffer and handed out by the
/// non-writable `__nagareDrain` global. Remote calls return promises and
/// `repeat` returns a handle; both are keyed by id and settled from the
/// host through `__nagareSettle` / `__nagareTick`.
const PRELUDE: &str = r#"
(function (global) {
  var calls = [];

  function record(api, args) {
    try {
      calls.push(JSON.stringify({ api: api, args: args }));
    } catch (e) {
      calls.push(JSON.stringify({ api: 'console', args: ['error', api + ': ' + e] }));
    }
  }

  function text(value) {
    return value === undefined || value === null ? '' : String(value);
  }

  function rest(args, from) {
    return Array.prototype.slice.call(args, from);
  }

  var nextId = 1;
  var promises = {};
  var handles = {};

  function pending(api, args) {
    var id = nextId++;
    return new Promise(function (resolve, reject) {
      promises[id] = { resolve: resolve, reject: reject };
      record(api, args.concat([id]));
    });
  }

  var nagare = {
    loadAll: function (namedCss, css, namedJs, js) {
      record('loadAll', [namedCss || [], css || [], namedJs || [], js || []]);
    },
    replaceNode: function (id, html) {
      record('replaceNode', [text(id), text(html)]);
    },
    callRemote: function (url) {
      return function () {
        return pending('callRemote', [text(url), rest(arguments, 0)]);
      };
    },
    delay: function (url) {
      return function (t) {
        return pending('delay', [text(url), Number(t), rest(arguments, 1)]);
      };
    },
    repeat: function (url) {
      return function (t) {
        var id = nextId++;
        var entry = { success: null, failure: null };
        var handle = {
          onSuccess: function (f) { entry.success = f; return handle; },
          onFailure: function (f) { entry.failure = f; return handle; },
          cancel: function () {
            delete handles[id];
            record('cancelRepeat', [id]);
          }
        };
        handles[id] = entry;
        record('repeat', [text(url), Number(t), rest(arguments, 1), id]);
        return Object.freeze(handle);
      };
    },
    getAndEval: function (url) {
      record('getAndEval', [text(url)]);
    }
  };
  nagare.remoteCall = nagare.callRemote;

  function logger(level) {
    return function () {
      record('console', [level, rest(arguments, 0).map(text).join(' ')]);
    };
  }

  var console = {
    log: logger('info'),
    info: logger('info'),
    debug: logger('debug'),
    warn: logger('warn'),
    error: logger('error')
  };

  Object.defineProperty(global, 'nagare', { value: Object.freeze(nagare), enumerable: true });
  Object.defineProperty(global, 'console', { value: Object.freeze(console), enumerable: true });
  Object.defineProperty(global, '__nagareDrain', {
    value: function () {
      var out = '[' + calls.join(',') + ']';
      calls = [];
      return out;
    }
  });
  Object.defineProperty(global, '__nagareSettle', {
    value: function (id, ok, payload) {
      var entry = promises[id];
      if (!entry) return;
      delete promises[id];
      if (ok) entry.resolve(JSON.parse(payload));
      else entry.reject(new Error(payload));
    }
  });
  Object.defineProperty(global, '__nagareTick', {
    value: function (id, ok, payload) {
      var entry = handles[id];
      if (!entry) return;
      if (ok) {
        if (entry.success) entry.success(JSON.parse(payload));
      } else {
        delete handles[id];
        if (entry.failure) entry.failure(new Error(payload));
      }
    }
  });
})(globalThis);
"#;

/// Script executor backed by a persistent Boa context.
///
/// Globals defined by one script stay visible to the next, as they would on
/// a page.
pub struct BoaExecutor {
    context: Context,
}

impl BoaExecutor {
    /// Create a new executor with the collaborator API installed
    pub fn new() -> Result<Self> {
        let mut context = Context::default();
        context
            .eval(Source::from_bytes(PRELUDE))
            .map_err(|e| JsError::Setup(e.to_string()))?;
        Ok(Self { context })
    }

    /// Evaluate an expression and return its string value, if it has one
    pub fn eval_to_string(&mut self, expression: &str) -> Result<Option<String>> {
        let value = self
            .context
            .eval(Source::from_bytes(expression))
            .map_err(|e| JsError::Execution(e.to_string()))?;
        Ok(value.as_string().map(|s| s.to_std_string_escaped()))
    }

    /// Call a settle hook of the prelude and run the promise jobs it queues
    fn deliver(&mut self, hook: &str, id: u64, outcome: &CallOutcome, calls: &mut Vec<ApiCall>) -> Result<()> {
        let (ok, payload) = match outcome {
            Ok(value) => (true, value.to_string()),
            Err(message) => (false, message.clone()),
        };
        let source = format!("{}({}, {}, {})", hook, id, ok, serde_json::to_string(&payload)?);
        let outcome = self.run_script(&source);
        calls.extend(self.drain()?);
        outcome
    }

    /// Evaluate `source`, then run every promise job it queued
    fn run_script(&mut self, source: &str) -> Result<()> {
        let evaluated = self
            .context
            .eval(Source::from_bytes(source))
            .map(|_| ())
            .map_err(|e| JsError::Execution(e.to_string()));
        let jobs = self
            .context
            .run_jobs()
            .map_err(|e| JsError::Execution(e.to_string()));
        evaluated?;
        jobs?;
        Ok(())
    }

    fn drain(&mut self) -> Result<Vec<ApiCall>> {
        let json = self
            .eval_to_string("__nagareDrain()")?
            .ok_or_else(|| JsError::Setup("call buffer is not a string".to_string()))?;
        parse_calls(&json)
    }
}

impl ScriptExecutor for BoaExecutor {
    fn execute(&mut self, source: &str, calls: &mut Vec<ApiCall>) -> Result<()> {
        let outcome = if source.trim().is_empty() {
            Ok(())
        } else {
            self.run_script(source)
        };

        calls.extend(self.drain()?);
        outcome
    }

    fn settle(&mut self, promise: u64, outcome: &CallOutcome, calls: &mut Vec<ApiCall>) -> Result<()> {
        self.deliver("__nagareSettle", promise, outcome, calls)
    }

    fn tick(&mut self, handle: u64, outcome: &CallOutcome, calls: &mut Vec<ApiCall>) -> Result<()> {
        self.deliver("__nagareTick", handle, outcome, calls)
    }
}
