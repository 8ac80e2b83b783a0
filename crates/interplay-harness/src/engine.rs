//! Isolated evaluation on an embedded QuickJS runtime.
//!
//! Every call gets a fresh runtime and context with its own memory limit and
//! wall-clock deadline; both are dropped when the call returns, whatever the
//! outcome.

use crate::error::{HarnessError, Result};
use interplay_artifact::{Document, ScriptUnit};
use interplay_core::config::HarnessConfig;
use regex::Regex;
use rquickjs::{qjs, Context, Ctx, Function, Object, Runtime, Value};
use serde::{Deserialize, Serialize};
use std::ffi::{CStr, CString};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

const DOM_STUB_JS: &str = include_str!("dom_stub.js");

/// Timers scheduled within this many virtual ms of load are run.
const SETTLE_HORIZON_MS: u32 = 5_000;
const MAX_TIMER_CALLBACKS: usize = 64;

/// File name compile errors are reported against.
const BEHAVIOR_FILE: &CStr = c"behavior.js";

/// A behavior fragment the engine could not compile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptError {
    pub name: String,
    pub message: String,
    /// 1-based line in the behavior fragment, when recoverable
    pub line: Option<usize>,
    /// Surrounding source lines, error line marked with `>`
    pub excerpt: Option<String>,
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.message)?;
        if let Some(line) = self.line {
            write!(f, " (line {})", line)?;
        }
        Ok(())
    }
}

/// What the render attempt executes: body markup for the stub document and
/// the document's scripts in order.
#[derive(Debug, Clone)]
pub struct RenderRequest {
    pub markup: String,
    pub scripts: Vec<ScriptUnit>,
}

impl RenderRequest {
    pub fn from_document(document: &Document) -> Self {
        Self {
            markup: document.body_markup(),
            scripts: document.scripts(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ScriptFailure {
    pub label: String,
    pub name: String,
    pub message: String,
}

/// Error captured by the in-document diagnostic panel.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DiagnosticInfo {
    pub name: String,
    pub message: String,
    #[serde(default)]
    pub stack: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RenderReport {
    #[serde(default)]
    pub errors: Vec<ScriptFailure>,
    pub diagnostic: Option<DiagnosticInfo>,
    /// Element ids present in the stub document after settling
    #[serde(default)]
    pub ids: Vec<String>,
    #[serde(default)]
    pub console: Vec<String>,
    /// Message types posted to the parent frame
    #[serde(default)]
    pub posted: Vec<String>,
}

impl RenderReport {
    pub fn has_element(&self, id: &str) -> bool {
        self.ids.iter().any(|i| i == id)
    }

    /// First failure, diagnostic panel first.
    pub fn failure(&self) -> Option<String> {
        if let Some(d) = &self.diagnostic {
            return Some(format!("{}: {}", d.name, d.message));
        }
        self.errors
            .first()
            .map(|e| format!("{}: {} [{}]", e.name, e.message, e.label))
    }

    fn ran_out_of_memory(&self) -> bool {
        self.diagnostic
            .iter()
            .map(|d| d.message.as_str())
            .chain(self.errors.iter().map(|e| e.message.as_str()))
            .any(is_oom_message)
    }
}

/// Executes untrusted script in isolation.
pub trait IsolatedEvaluator: Send + Sync {
    /// Compile `source` as a unit without running it. `Ok(None)` means it
    /// compiled.
    fn check_syntax(&self, source: &str) -> Result<Option<ScriptError>>;

    fn render(&self, request: &RenderRequest) -> Result<RenderReport>;
}

#[derive(Debug, Clone)]
pub struct QuickJsEvaluator {
    memory_limit: usize,
    timeout: Duration,
}

impl QuickJsEvaluator {
    pub fn new(memory_limit: usize, timeout: Duration) -> Self {
        Self {
            memory_limit,
            timeout,
        }
    }

    pub fn from_config(config: &HarnessConfig) -> Self {
        Self::new(config.render_memory_bytes(), config.render_timeout)
    }

    fn sandbox(&self) -> Result<Sandbox> {
        let runtime = Runtime::new().map_err(|e| HarnessError::Engine(e.to_string()))?;
        runtime.set_memory_limit(self.memory_limit);
        let timed_out = Arc::new(AtomicBool::new(false));
        let flag = timed_out.clone();
        let deadline = Instant::now() + self.timeout;
        runtime.set_interrupt_handler(Some(Box::new(move || {
            if Instant::now() >= deadline {
                flag.store(true, Ordering::SeqCst);
                true
            } else {
                false
            }
        })));
        let context = Context::full(&runtime).map_err(|e| self.classify(None, e, &timed_out))?;
        Ok(Sandbox {
            context,
            runtime,
            timed_out,
        })
    }

    fn classify(&self, ctx: Option<&Ctx<'_>>, err: rquickjs::Error, timed_out: &AtomicBool) -> HarnessError {
        if timed_out.load(Ordering::SeqCst) {
            return HarnessError::Timeout(self.timeout.as_millis() as u64);
        }
        let message = match (&err, ctx) {
            (rquickjs::Error::Exception, Some(ctx)) => exception_message(ctx),
            _ => err.to_string(),
        };
        if matches!(err, rquickjs::Error::Allocation) || is_oom_message(&message) {
            return HarnessError::OutOfMemory(self.memory_limit / (1024 * 1024));
        }
        HarnessError::Engine(message)
    }

    fn step<T>(
        &self,
        sandbox: &Sandbox,
        f: impl for<'js> FnOnce(&Ctx<'js>) -> rquickjs::Result<T>,
    ) -> Result<T> {
        sandbox
            .context
            .with(|ctx| f(&ctx).map_err(|e| self.classify(Some(&ctx), e, &sandbox.timed_out)))
    }

    /// Run queued promise jobs until the queue is empty.
    fn drain_jobs(&self, sandbox: &Sandbox) -> Result<()> {
        loop {
            match sandbox.runtime.execute_pending_job() {
                Ok(true) => continue,
                Ok(false) => return Ok(()),
                Err(_) => {
                    if sandbox.timed_out.load(Ordering::SeqCst) {
                        return Err(HarnessError::Timeout(self.timeout.as_millis() as u64));
                    }
                    tracing::debug!("pending job raised an uncatchable exception");
                }
            }
        }
    }
}

impl Default for QuickJsEvaluator {
    fn default() -> Self {
        Self::from_config(&HarnessConfig::default())
    }
}

impl IsolatedEvaluator for QuickJsEvaluator {
    fn check_syntax(&self, source: &str) -> Result<Option<ScriptError>> {
        let Ok(code) = CString::new(source) else {
            return Ok(Some(ScriptError {
                name: "SyntaxError".to_string(),
                message: "source contains a NUL byte".to_string(),
                line: None,
                excerpt: None,
            }));
        };
        let sandbox = self.sandbox()?;
        let Some(failure) = self.step(&sandbox, |ctx| compile_script(ctx, &code))? else {
            return Ok(None);
        };
        if is_oom_message(&failure.message) {
            return Err(HarnessError::OutOfMemory(self.memory_limit / (1024 * 1024)));
        }
        let line = failure
            .line_number
            .or_else(|| line_from_stack(&failure.stack))
            .filter(|l| *l >= 1 && *l <= source.lines().count().max(1));
        Ok(Some(ScriptError {
            name: failure.name,
            message: failure.message,
            line,
            excerpt: line.map(|l| excerpt(source, l, 2)),
        }))
    }

    fn render(&self, request: &RenderRequest) -> Result<RenderReport> {
        let sandbox = self.sandbox()?;
        self.step(&sandbox, |ctx| {
            ctx.globals().set("__interplay_markup", request.markup.clone())?;
            ctx.eval::<(), _>(DOM_STUB_JS)
        })?;

        for unit in &request.scripts {
            self.step(&sandbox, |ctx| {
                let exec: Function = ctx.globals().get("__interplay_exec")?;
                exec.call::<_, ()>((unit.label.clone(), unit.source.clone()))
            })?;
            self.drain_jobs(&sandbox)?;
        }

        self.step(&sandbox, |ctx| ctx.eval::<(), _>("__interplay_lifecycle()"))?;
        self.drain_jobs(&sandbox)?;

        for _ in 0..MAX_TIMER_CALLBACKS {
            let ran = self.step(&sandbox, |ctx| {
                let tick: Function = ctx.globals().get("__interplay_tick")?;
                tick.call::<_, bool>((SETTLE_HORIZON_MS,))
            })?;
            self.drain_jobs(&sandbox)?;
            if !ran {
                break;
            }
        }

        let raw = self.step(&sandbox, |ctx| ctx.eval::<String, _>("__interplay_report()"))?;
        let report: RenderReport = serde_json::from_str(&raw)?;
        if report.ran_out_of_memory() {
            return Err(HarnessError::OutOfMemory(self.memory_limit / (1024 * 1024)));
        }
        tracing::debug!(
            scripts = request.scripts.len(),
            errors = report.errors.len(),
            ids = report.ids.len(),
            "render attempt finished"
        );
        Ok(report)
    }
}

/// Runtime plus context for one evaluation. Field order drops the context
/// before its runtime.
struct Sandbox {
    context: Context,
    runtime: Runtime,
    timed_out: Arc<AtomicBool>,
}

struct CompileFailure {
    name: String,
    message: String,
    stack: String,
    line_number: Option<usize>,
}

/// Parse `code` as a classic global script without evaluating it.
fn compile_script(ctx: &Ctx<'_>, code: &CStr) -> rquickjs::Result<Option<CompileFailure>> {
    let flags = (qjs::JS_EVAL_TYPE_GLOBAL | qjs::JS_EVAL_FLAG_COMPILE_ONLY) as i32;
    // SAFETY: `ctx` is locked for the duration of `Context::with`, both strings
    // are NUL-terminated, and the returned value is owned by `compiled`.
    let compiled = unsafe {
        let raw = qjs::JS_Eval(
            ctx.as_raw().as_ptr(),
            code.as_ptr(),
            code.to_bytes().len() as _,
            BEHAVIOR_FILE.as_ptr(),
            flags,
        );
        Value::from_raw(ctx.clone(), raw)
    };
    if !compiled.is_exception() {
        return Ok(None);
    }
    let caught = ctx.catch();
    let Some(error) = caught.as_object() else {
        let message = caught
            .as_string()
            .and_then(|s| s.to_string().ok())
            .unwrap_or_else(|| "compile failed".to_string());
        return Ok(Some(CompileFailure {
            name: "Error".to_string(),
            message,
            stack: String::new(),
            line_number: None,
        }));
    };
    let line_number: Value = error.get("lineNumber")?;
    Ok(Some(CompileFailure {
        name: text_property(error, "name")?.unwrap_or_else(|| "Error".to_string()),
        message: text_property(error, "message")?.unwrap_or_default(),
        stack: text_property(error, "stack")?.unwrap_or_default(),
        line_number: line_number
            .as_number()
            .filter(|n| *n >= 1.0)
            .map(|n| n as usize),
    }))
}

fn text_property(object: &Object<'_>, key: &str) -> rquickjs::Result<Option<String>> {
    let value: Value = object.get(key)?;
    Ok(value.as_string().and_then(|s| s.to_string().ok()))
}

fn exception_message(ctx: &Ctx<'_>) -> String {
    let value = ctx.catch();
    if let Some(exception) = value.as_exception() {
        return exception
            .message()
            .unwrap_or_else(|| "uncaught exception".to_string());
    }
    value
        .as_string()
        .and_then(|s| s.to_string().ok())
        .unwrap_or_else(|| "uncaught exception".to_string())
}

fn is_oom_message(message: &str) -> bool {
    message.to_ascii_lowercase().contains("out of memory")
}

fn line_from_stack(stack: &str) -> Option<usize> {
    static BEHAVIOR: OnceLock<Option<Regex>> = OnceLock::new();
    static ANY: OnceLock<Option<Regex>> = OnceLock::new();
    let behavior = BEHAVIOR
        .get_or_init(|| Regex::new(r"behavior\.js:(\d+)").ok())
        .as_ref();
    let any = ANY.get_or_init(|| Regex::new(r":(\d+)(?::\d+)?").ok()).as_ref();
    [behavior, any]
        .into_iter()
        .flatten()
        .find_map(|re| re.captures(stack))
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Lines `line - context ..= line + context`, numbered, error line marked.
pub fn excerpt(source: &str, line: usize, context: usize) -> String {
    let lines: Vec<&str> = source.lines().collect();
    let first = line.saturating_sub(context).max(1);
    let last = (line + context).min(lines.len());
    let width = last.to_string().len();
    (first..=last)
        .map(|n| {
            let marker = if n == line { '>' } else { ' ' };
            format!(
                "{} {:>width$} | {}",
                marker,
                n,
                lines.get(n - 1).copied().unwrap_or(""),
                width = width
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evaluator() -> QuickJsEvaluator {
        QuickJsEvaluator::new(32 * 1024 * 1024, Duration::from_secs(2))
    }

    fn unit(label: &str, source: &str) -> ScriptUnit {
        ScriptUnit {
            label: label.to_string(),
            source: source.to_string(),
        }
    }

    #[test]
    fn test_valid_source_compiles() {
        let ev = evaluator();
        assert_eq!(ev.check_syntax("var a = 1;\nfunction f() { return a; }").unwrap(), None);
        assert_eq!(ev.check_syntax("").unwrap(), None);
    }

    #[test]
    fn test_unbalanced_braces_rejected_without_running() {
        let ev = evaluator();
        let err = ev
            .check_syntax("globalThis.ran = true;\nfunction f() {\n  if (x) {\n    go();\n}\n")
            .unwrap()
            .unwrap();
        assert_eq!(err.name, "SyntaxError");
        assert!(!err.message.is_empty());
    }

    #[test]
    fn test_wrapper_breakout_is_rejected_without_running() {
        let ev = evaluator();
        let err = ev
            .check_syntax("}); throw new Error('ran during compile'); (function () {")
            .unwrap()
            .unwrap();
        assert_eq!(err.name, "SyntaxError");
        assert!(!err.message.contains("ran during compile"), "{}", err.message);

        let err = ev.check_syntax("}); (function () {").unwrap().unwrap();
        assert_eq!(err.name, "SyntaxError");
    }

    #[test]
    fn test_compile_never_runs_statements() {
        let ev = evaluator();
        assert_eq!(ev.check_syntax("throw new Error('boom');").unwrap(), None);
        assert_eq!(ev.check_syntax("while (true) {}").unwrap(), None);
    }

    #[test]
    fn test_top_level_return_rejected() {
        let ev = evaluator();
        let err = ev.check_syntax("if (done) {\n  return;\n}").unwrap().unwrap();
        assert_eq!(err.name, "SyntaxError");
    }

    #[test]
    fn test_syntax_error_line_and_excerpt() {
        let ev = evaluator();
        let src = "var a = 1;\nvar b = 2;\nvar c = ;\nvar d = 4;";
        let err = ev.check_syntax(src).unwrap().unwrap();
        if let Some(line) = err.line {
            assert_eq!(line, 3);
            let excerpt = err.excerpt.unwrap();
            assert!(excerpt.contains("> 3 | var c = ;"), "{}", excerpt);
        }
    }

    #[test]
    fn test_excerpt_bounds() {
        let text = excerpt("a\nb\nc", 1, 2);
        assert_eq!(text, "> 1 | a\n  2 | b\n  3 | c");
    }

    #[test]
    fn test_render_sees_markup_ids_and_dom_edits() {
        let ev = evaluator();
        let request = RenderRequest {
            markup: "<div id=\"app\"><ul id=\"statement-list\"></ul></div>".to_string(),
            scripts: vec![unit(
                "behavior",
                "var list = document.getElementById('statement-list');\n\
                 var li = document.createElement('li');\n\
                 li.id = 'row-1';\n\
                 list.appendChild(li);\n\
                 document.querySelector('#app').insertAdjacentHTML('beforeend', '<button id=\"submit-button\">Go</button>');",
            )],
        };
        let report = ev.render(&request).unwrap();
        assert!(report.errors.is_empty(), "{:?}", report.errors);
        for id in ["app", "statement-list", "row-1", "submit-button"] {
            assert!(report.has_element(id), "missing {}", id);
        }
    }

    #[test]
    fn test_render_records_script_errors() {
        let ev = evaluator();
        let request = RenderRequest {
            markup: String::new(),
            scripts: vec![
                unit("bootstrap:x", "window.ok = 1;"),
                unit("behavior", "document.getElementById('nope').textContent = 'x';"),
            ],
        };
        let report = ev.render(&request).unwrap();
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].label, "behavior");
        assert_eq!(report.errors[0].name, "TypeError");
        assert!(report.failure().unwrap().contains("TypeError"));
    }

    #[test]
    fn test_timers_and_load_handlers_run() {
        let ev = evaluator();
        let request = RenderRequest {
            markup: "<p id=\"out\"></p>".to_string(),
            scripts: vec![unit(
                "behavior",
                "document.addEventListener('DOMContentLoaded', function () {\n\
                   setTimeout(function () {\n\
                     Promise.resolve().then(function () { throw new RangeError('late'); }).catch(function (e) {\n\
                       document.getElementById('out').id = 'done';\n\
                     });\n\
                   }, 100);\n\
                 });",
            )],
        };
        let report = ev.render(&request).unwrap();
        assert!(report.has_element("done"));
        assert!(!report.has_element("out"));
    }

    #[test]
    fn test_infinite_loop_times_out() {
        let ev = QuickJsEvaluator::new(32 * 1024 * 1024, Duration::from_millis(200));
        let request = RenderRequest {
            markup: String::new(),
            scripts: vec![unit("behavior", "try { while (true) {} } catch (e) {}")],
        };
        assert!(matches!(ev.render(&request), Err(HarnessError::Timeout(200))));
    }

    #[test]
    fn test_memory_budget_enforced() {
        let ev = QuickJsEvaluator::new(8 * 1024 * 1024, Duration::from_secs(5));
        let request = RenderRequest {
            markup: String::new(),
            scripts: vec![unit(
                "behavior",
                "var hoard = [];\nwhile (true) { hoard.push(new Array(100000).fill(hoard.length)); }",
            )],
        };
        assert!(matches!(ev.render(&request), Err(HarnessError::OutOfMemory(8))));
    }
}
