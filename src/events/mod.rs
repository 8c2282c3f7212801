//! The event object model consumed from the automation runtime.
//!
//! The runtime reports each completed task as a (task, host, result payload)
//! triple. Payloads are arbitrary JSON-shaped mappings; the only structure
//! this crate relies on is the optional `invocation.module_args` sub-mapping
//! and, for looped tasks, the `results` sequence.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Actions that include a sub-playbook rather than run a module.
const INCLUDE_ACTIONS: &[&str] = &[
    "include",
    "include_tasks",
    "include_role",
    "import_tasks",
    "import_role",
];

/// A managed host the runtime executes tasks against.
///
/// The host name doubles as its per-host storage key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Host(String);

impl Host {
    /// Create a new Host from its name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get the host name.
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Host {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Host {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The task a result belongs to, as reported by the runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRef {
    name: String,
    action: String,
    looped: bool,
}

impl TaskRef {
    /// Create a reference to a plain (non-looped) task.
    pub fn new(name: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            action: action.into(),
            looped: false,
        }
    }

    /// Create a reference to a looped task (one execution per list item).
    pub fn looped(name: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            looped: true,
            ..Self::new(name, action)
        }
    }

    /// The declared task name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The module action the task invokes.
    pub fn action(&self) -> &str {
        &self.action
    }

    /// Whether the task was declared with a loop construct.
    pub fn is_looped(&self) -> bool {
        self.looped
    }

    /// Whether this task includes a sub-playbook instead of running a module.
    pub fn is_include(&self) -> bool {
        INCLUDE_ACTIONS.contains(&self.action.as_str())
    }
}

/// A completed-task notification: which task ran, on which host, with what
/// result payload.
///
/// Consumed immediately on arrival; never retained by the plugin.
#[derive(Debug, Clone)]
pub struct TaskResult {
    /// The task that produced this result.
    pub task: TaskRef,
    /// The host the task ran against.
    pub host: Host,
    /// The raw result payload reported by the module.
    pub result: Value,
}

impl TaskResult {
    /// Create a new task result.
    pub fn new(task: TaskRef, host: Host, result: Value) -> Self {
        Self { task, host, result }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_host_name() {
        let host = Host::new("web01");
        assert_eq!(host.name(), "web01");
        assert_eq!(format!("{}", host), "web01");
    }

    #[test]
    fn test_host_from_str() {
        let host: Host = "db01".into();
        assert_eq!(host, Host::new("db01"));
    }

    #[test]
    fn test_task_ref_accessors() {
        let task = TaskRef::new("fetch tarball", "get_url");
        assert_eq!(task.name(), "fetch tarball");
        assert_eq!(task.action(), "get_url");
        assert!(!task.is_looped());
    }

    #[test]
    fn test_looped_task_ref() {
        let task = TaskRef::looped("install packages", "yum");
        assert!(task.is_looped());
        assert_eq!(task.action(), "yum");
    }

    #[test]
    fn test_include_detection() {
        assert!(TaskRef::new("pull in tasks", "include_tasks").is_include());
        assert!(TaskRef::new("old style", "include").is_include());
        assert!(!TaskRef::new("fetch", "get_url").is_include());
    }

    #[test]
    fn test_task_result_holds_payload() {
        let result = TaskResult::new(
            TaskRef::new("clone repo", "git"),
            Host::new("web01"),
            json!({"changed": true}),
        );
        assert_eq!(result.result["changed"], json!(true));
    }
}
