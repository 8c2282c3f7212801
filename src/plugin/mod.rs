//! The download-logging callback plugin.
//!
//! [`CallbackPlugin`] is the seam between this crate and the automation
//! runtime: the runtime invokes its lifecycle notifications as a playbook
//! executes. [`DownloadLog`] implements the trait and does all the work in
//! the two success notifications; everything else is an extension point.

use serde_json::Value;

use crate::error::CallbackError;
use crate::events::{Host, TaskRef, TaskResult};
use crate::registry::handler_for;
use crate::sink::LogSink;

/// Lifecycle notifications emitted by the automation runtime.
///
/// All methods default to no-ops; implementations override the notifications
/// they care about. The runtime invokes these sequentially as it executes
/// tasks.
pub trait CallbackPlugin {
    /// A task is about to start.
    fn on_task_start(&self, _task: &TaskRef, _is_conditional: bool) {}

    /// A play has started.
    fn on_play_start(&self, _name: &str) {}

    /// A task completed successfully on a host.
    fn on_runner_ok(&self, _result: &TaskResult) -> Result<(), CallbackError> {
        Ok(())
    }

    /// A single loop iteration completed successfully on a host.
    fn on_runner_item_ok(&self, _result: &TaskResult) -> Result<(), CallbackError> {
        Ok(())
    }

    /// A task failed on a host.
    fn on_runner_failed(&self, _result: &TaskResult, _ignore_errors: bool) {}

    /// A task was skipped on a host.
    fn on_runner_skipped(&self, _host: &Host) {}

    /// A host became unreachable.
    fn on_runner_unreachable(&self, _result: &TaskResult) {}

    /// An asynchronously-run task failed on a host.
    fn on_runner_async_failed(&self, _result: &TaskResult) {}

    /// A file was imported for a host.
    fn on_import_for_host(&self, _host: &Host, _imported_file: &str) {}

    /// A file failed to import for a host.
    fn on_not_import_for_host(&self, _host: &Host, _missing_file: &str) {}

    /// End-of-run statistics are available.
    fn on_stats(&self) {}
}

/// Notification plugin that records downloaded sources per host.
///
/// Each completed task is classified by its action name: recognized download
/// actions append a `"<proto>: <src>"` line to the host's `dl` file,
/// unrecognized actions carrying an `invocation` land in the shared
/// `not_handled` catalogue, and results without an `invocation` are ignored.
pub struct DownloadLog {
    sink: LogSink,
}

impl DownloadLog {
    /// Create the plugin at the fixed production log root, creating the base
    /// directory if absent.
    pub fn new() -> Result<Self, CallbackError> {
        Ok(Self {
            sink: LogSink::open()?,
        })
    }

    /// Create a plugin writing beneath an explicit root.
    pub fn with_root(root: impl Into<std::path::PathBuf>) -> Result<Self, CallbackError> {
        Ok(Self {
            sink: LogSink::at(root)?,
        })
    }

    /// The sink this plugin writes through.
    pub fn sink(&self) -> &LogSink {
        &self.sink
    }

    /// Route one result payload to its action handler.
    ///
    /// Results without an `invocation` carry no recorded arguments (e.g. the
    /// aggregate wrapper of a looped task) and produce nothing.
    fn dispatch(&self, host: &Host, action: &str, result: &Value) -> Result<(), CallbackError> {
        let invocation = match result.get("invocation") {
            Some(invocation) => invocation,
            None => return Ok(()),
        };
        let args = invocation
            .get("module_args")
            .and_then(Value::as_object)
            .ok_or_else(|| CallbackError::MalformedInvocation(action.to_string()))?;

        match handler_for(action) {
            Some(handler) => handler(&self.sink, host, args),
            None => self.sink.record_unhandled(action),
        }
    }

    /// Serialize and append one timestamped record to the host's legacy flat
    /// log.
    ///
    /// Mappings flagged with the verbose-override marker are redacted to
    /// `"omitted"`. Otherwise the `invocation` entry is split off, the
    /// remainder is JSON-serialized, and a present invocation is prepended as
    /// `"<invocation> => <rest> "`. No lifecycle notification currently
    /// invokes this; it is kept available for the no-op extension points.
    pub fn log(&self, host: &Host, category: &str, data: &Value) -> Result<(), CallbackError> {
        let text = match data {
            Value::Object(map) => {
                if map.contains_key("_ansible_verbose_override") {
                    "omitted".to_string()
                } else {
                    let mut map = map.clone();
                    let invocation = map.remove("invocation");
                    let body = serde_json::to_string(&map)?;
                    match invocation {
                        Some(invocation) => {
                            format!("{} => {} ", serde_json::to_string(&invocation)?, body)
                        }
                        None => body,
                    }
                }
            }
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        self.sink.record_timestamped(host, category, &text)
    }
}

impl CallbackPlugin for DownloadLog {
    fn on_task_start(&self, task: &TaskRef, _is_conditional: bool) {
        // Nothing to record until a result arrives.
        tracing::trace!(task = task.name(), action = task.action(), "task starting");
    }

    fn on_runner_ok(&self, result: &TaskResult) -> Result<(), CallbackError> {
        let task = &result.task;
        let host = &result.host;
        let action = task.action();

        // Header precedes the download record, but only for actions the
        // registry knows about.
        if handler_for(action).is_some() {
            self.sink
                .record_line(host, &format!("# task: {}", task.name()))?;
        }

        if task.is_looped() {
            if let Some(items) = result.result.get("results").and_then(Value::as_array) {
                for item in items {
                    self.dispatch(host, action, item)?;
                }
                return Ok(());
            }
        }
        self.dispatch(host, action, &result.result)
    }

    fn on_runner_item_ok(&self, result: &TaskResult) -> Result<(), CallbackError> {
        if result.task.is_include() {
            tracing::debug!(task = result.task.name(), "skipping include task");
            return Ok(());
        }
        self.dispatch(&result.host, result.task.action(), &result.result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn plugin() -> (TempDir, DownloadLog) {
        let dir = TempDir::new().unwrap();
        let plugin = DownloadLog::with_root(dir.path()).unwrap();
        (dir, plugin)
    }

    fn ok_result(task: TaskRef, host: &str, payload: Value) -> TaskResult {
        TaskResult::new(task, Host::new(host), payload)
    }

    #[test]
    fn test_no_invocation_writes_nothing() {
        let (dir, plugin) = plugin();
        let result = ok_result(
            TaskRef::new("noop", "get_url"),
            "web01",
            json!({"changed": false}),
        );
        plugin.on_runner_ok(&result).unwrap();

        // Header is still written since get_url is registered, but no
        // download record follows.
        let content = std::fs::read_to_string(dir.path().join("web01/dl")).unwrap();
        assert_eq!(content, "# task: noop\n");
        assert!(!dir.path().join("not_handled").exists());
    }

    #[test]
    fn test_unregistered_action_skips_header_and_host_dir() {
        let (dir, plugin) = plugin();
        let result = ok_result(
            TaskRef::new("mystery", "frobnicate"),
            "web01",
            json!({"invocation": {"module_args": {"x": 1}}}),
        );
        plugin.on_runner_ok(&result).unwrap();

        assert!(!dir.path().join("web01").exists());
        let content = std::fs::read_to_string(dir.path().join("not_handled")).unwrap();
        assert_eq!(content, "frobnicate\n");
    }

    #[test]
    fn test_malformed_invocation_is_an_error() {
        let (_dir, plugin) = plugin();
        let result = ok_result(
            TaskRef::new("broken", "get_url"),
            "web01",
            json!({"invocation": {"no_module_args": true}}),
        );
        let err = plugin.on_runner_ok(&result).unwrap_err();
        assert!(matches!(err, CallbackError::MalformedInvocation(_)));
    }

    #[test]
    fn test_item_ok_skips_include_tasks() {
        let (dir, plugin) = plugin();
        let result = ok_result(
            TaskRef::new("pull in tasks", "include_tasks"),
            "web01",
            json!({"invocation": {"module_args": {"file": "sub.yml"}}}),
        );
        plugin.on_runner_item_ok(&result).unwrap();

        assert!(!dir.path().join("web01").exists());
        assert!(!dir.path().join("not_handled").exists());
    }

    #[test]
    fn test_item_ok_dispatches_without_header() {
        let (dir, plugin) = plugin();
        let result = ok_result(
            TaskRef::looped("fetch each", "get_url"),
            "web01",
            json!({"invocation": {"module_args": {"url": "http://x/a"}}}),
        );
        plugin.on_runner_item_ok(&result).unwrap();

        let content = std::fs::read_to_string(dir.path().join("web01/dl")).unwrap();
        assert_eq!(content, "http: http://x/a\n");
    }

    #[test]
    fn test_legacy_log_redacts_verbose_override() {
        let (dir, plugin) = plugin();
        let host = Host::new("web01");
        plugin
            .log(&host, "OK", &json!({"_ansible_verbose_override": true, "secret": "x"}))
            .unwrap();

        let content = std::fs::read_to_string(dir.path().join("web01")).unwrap();
        assert!(content.contains(" - OK - omitted\n\n"));
        assert!(!content.contains("secret"));
    }

    #[test]
    fn test_legacy_log_prepends_invocation() {
        let (dir, plugin) = plugin();
        let host = Host::new("web01");
        plugin
            .log(
                &host,
                "OK",
                &json!({"changed": true, "invocation": {"module_args": {"url": "http://x"}}}),
            )
            .unwrap();

        let content = std::fs::read_to_string(dir.path().join("web01")).unwrap();
        let data = content.split(" - ").nth(2).unwrap();
        assert!(data.starts_with("{\"module_args\":{\"url\":\"http://x\"}} => "));
        assert!(data.contains("{\"changed\":true}"));
        assert!(content.ends_with("\n\n"));
    }

    #[test]
    fn test_legacy_log_passes_strings_through() {
        let (dir, plugin) = plugin();
        let host = Host::new("web01");
        plugin.log(&host, "SKIPPED", &json!("...")).unwrap();

        let content = std::fs::read_to_string(dir.path().join("web01")).unwrap();
        assert!(content.contains(" - SKIPPED - ...\n\n"));
    }
}
