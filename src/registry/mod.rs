//! Static registry mapping module actions to download extraction rules.
//!
//! The registry is a finite table keyed by exact action name. Each handler
//! pulls the source descriptor out of the task's module arguments and writes
//! exactly one download record; `command` instead routes its raw arguments to
//! the shared command catalogue.

use serde_json::{Map, Value};
use std::fmt;
use std::fs;

use crate::error::CallbackError;
use crate::events::Host;
use crate::sink::LogSink;

/// Protocol label prefixed to each download record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Proto {
    /// Fetched over HTTP(S) (`get_url`, `fetch`).
    Http,
    /// Installed from a Python package index (`pip`).
    Pip,
    /// Installed from a package repository (`yum`, `package`).
    Yum,
    /// Cloned from a git remote (`git`).
    Git,
}

impl fmt::Display for Proto {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Proto::Http => "http",
            Proto::Pip => "pip",
            Proto::Yum => "yum",
            Proto::Git => "git",
        };
        write!(f, "{}", label)
    }
}

/// Extraction rule invoked for a recognized action.
pub type ActionHandler = fn(&LogSink, &Host, &Map<String, Value>) -> Result<(), CallbackError>;

/// Look up the handler for an action by exact name.
///
/// Returns `None` for actions the plugin does not recognize; the caller is
/// expected to record those in the unhandled catalogue instead.
pub fn handler_for(action: &str) -> Option<ActionHandler> {
    match action {
        "get_url" => Some(get_url),
        "fetch" => Some(fetch),
        "pip" => Some(pip),
        "yum" => Some(yum),
        "package" => Some(package),
        "git" => Some(git),
        "command" => Some(command),
        _ => None,
    }
}

fn get_url(sink: &LogSink, host: &Host, args: &Map<String, Value>) -> Result<(), CallbackError> {
    sink.record_download(host, Proto::Http, &source(args, "get_url", "url")?)
}

fn fetch(sink: &LogSink, host: &Host, args: &Map<String, Value>) -> Result<(), CallbackError> {
    sink.record_download(host, Proto::Http, &source(args, "fetch", "src")?)
}

fn pip(sink: &LogSink, host: &Host, args: &Map<String, Value>) -> Result<(), CallbackError> {
    let requirements = required(args, "pip", "requirements")?;
    if is_truthy(requirements) {
        let path = requirements
            .as_str()
            .ok_or_else(|| CallbackError::unexpected_type("pip", "requirements"))?;
        sink.record_download(host, Proto::Pip, &read_lines_joined(path)?)
    } else {
        sink.record_download(host, Proto::Pip, &source(args, "pip", "name")?)
    }
}

fn yum(sink: &LogSink, host: &Host, args: &Map<String, Value>) -> Result<(), CallbackError> {
    sink.record_download(host, Proto::Yum, &source(args, "yum", "name")?)
}

fn package(sink: &LogSink, host: &Host, args: &Map<String, Value>) -> Result<(), CallbackError> {
    // Keyed on presence of `dest`, not truthiness, unlike pip's
    // requirements check.
    match args.get("dest") {
        Some(dest) => {
            let path = dest
                .as_str()
                .ok_or_else(|| CallbackError::unexpected_type("package", "dest"))?;
            sink.record_download(host, Proto::Yum, &read_lines_joined(path)?)
        }
        None => sink.record_download(host, Proto::Yum, &source(args, "package", "name")?),
    }
}

fn git(sink: &LogSink, host: &Host, args: &Map<String, Value>) -> Result<(), CallbackError> {
    sink.record_download(host, Proto::Git, &source(args, "git", "repo")?)
}

fn command(sink: &LogSink, _host: &Host, args: &Map<String, Value>) -> Result<(), CallbackError> {
    sink.record_unhandled_command(args)
}

/// Get a required argument value.
fn required<'a>(
    args: &'a Map<String, Value>,
    action: &str,
    key: &str,
) -> Result<&'a Value, CallbackError> {
    args.get(key)
        .ok_or_else(|| CallbackError::missing_arg(action, key))
}

/// Render an argument value as a source descriptor.
///
/// Scalar strings pass through; lists of strings are joined with single
/// spaces (e.g. a multi-package `name`).
fn render_source(value: &Value, action: &str, key: &str) -> Result<String, CallbackError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| CallbackError::unexpected_type(action, key))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(|parts| parts.join(" ")),
        _ => Err(CallbackError::unexpected_type(action, key)),
    }
}

fn source(args: &Map<String, Value>, action: &str, key: &str) -> Result<String, CallbackError> {
    render_source(required(args, action, key)?, action, key)
}

/// Read a file as a source descriptor: every line keeps its trailing newline
/// and the lines are joined with single spaces.
fn read_lines_joined(path: &str) -> Result<String, CallbackError> {
    let text = fs::read_to_string(path)?;
    Ok(text.split_inclusive('\n').collect::<Vec<_>>().join(" "))
}

/// Truthiness of a payload value: null, false, zero, and empty
/// strings/lists/mappings are falsy.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}
