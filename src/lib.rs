//! fetchlog - a notification plugin that records downloaded sources per host.
//!
//! The plugin observes task results emitted by an automation runtime during a
//! playbook run and appends one line per recognized download (URLs fetched,
//! packages installed, repositories cloned) to a per-host log file under
//! `/tmp/log/ansible/hosts/<host>/dl`. Actions it does not recognize are
//! collected in a shared catalogue so they can be triaged later.
//!
//! The crate is a thin event-handler shim: it owns no scheduler, no protocol,
//! and no persistent state of its own. The embedding runtime invokes the
//! [`CallbackPlugin`] lifecycle notifications as tasks complete, and
//! [`DownloadLog`] classifies each result and appends records.

pub mod error;
pub mod events;
pub mod plugin;
pub mod registry;
pub mod sink;

pub use error::CallbackError;
pub use events::{Host, TaskRef, TaskResult};
pub use plugin::{CallbackPlugin, DownloadLog};
pub use registry::{handler_for, Proto};
pub use sink::{LogSink, DEFAULT_LOG_ROOT};
