//! Append-only log files under the plugin's log root.
//!
//! Layout (relative to the root, `/tmp/log/ansible/hosts` in production):
//!
//! - `{host}/dl` — per-host download records, one per line, created lazily.
//! - `not_handled` — shared catalogue of unrecognized action names.
//! - `cmd_not_handled` — shared catalogue of raw command arguments.
//! - `{host}` — legacy flat per-host log of timestamped records.
//!
//! Every write is a separate open-append-close with no locking. Interleaving
//! safety for the shared catalogues relies on OS append-mode semantics.

use chrono::Local;
use serde_json::{Map, Value};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::CallbackError;
use crate::events::Host;
use crate::registry::Proto;

/// Fixed log root used in production.
pub const DEFAULT_LOG_ROOT: &str = "/tmp/log/ansible/hosts";

/// Timestamp format of the legacy flat log.
const TIME_FORMAT: &str = "%b %d %Y %H:%M:%S";

/// Writes append-only records beneath a log root directory.
pub struct LogSink {
    root: PathBuf,
}

impl LogSink {
    /// Open the sink at the fixed production root, creating it if absent.
    pub fn open() -> Result<Self, CallbackError> {
        Self::at(DEFAULT_LOG_ROOT)
    }

    /// Open a sink rooted at an arbitrary directory, creating it if absent.
    pub fn at(root: impl Into<PathBuf>) -> Result<Self, CallbackError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// The root directory all records are written beneath.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the host's directory if absent. Idempotent.
    fn ensure_host_dir(&self, host: &Host) -> Result<PathBuf, CallbackError> {
        let dir = self.root.join(host.name());
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    fn append_line(path: &Path, line: &str) -> Result<(), CallbackError> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{}", line)?;
        Ok(())
    }

    /// Append a download record `<proto>: <src>` to the host's `dl` file.
    pub fn record_download(
        &self,
        host: &Host,
        proto: Proto,
        src: &str,
    ) -> Result<(), CallbackError> {
        let dir = self.ensure_host_dir(host)?;
        Self::append_line(&dir.join("dl"), &format!("{}: {}", proto, src))
    }

    /// Append a raw line (e.g. a task header) to the host's `dl` file.
    pub fn record_line(&self, host: &Host, line: &str) -> Result<(), CallbackError> {
        let dir = self.ensure_host_dir(host)?;
        Self::append_line(&dir.join("dl"), line)
    }

    /// Append an action name to the shared unhandled-action catalogue.
    pub fn record_unhandled(&self, action: &str) -> Result<(), CallbackError> {
        Self::append_line(&self.root.join("not_handled"), action)
    }

    /// Append raw command arguments to the shared command catalogue.
    pub fn record_unhandled_command(
        &self,
        args: &Map<String, Value>,
    ) -> Result<(), CallbackError> {
        let text = serde_json::to_string(args)?;
        Self::append_line(&self.root.join("cmd_not_handled"), &text)
    }

    /// Append one timestamped block to the legacy flat per-host log.
    ///
    /// Block format: `"<now> - <category> - <data>\n\n"`, local time.
    pub fn record_timestamped(
        &self,
        host: &Host,
        category: &str,
        data: &str,
    ) -> Result<(), CallbackError> {
        let now = Local::now().format(TIME_FORMAT);
        let path = self.root.join(host.name());
        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        write!(file, "{} - {} - {}\n\n", now, category, data)?;
        Ok(())
    }
}
