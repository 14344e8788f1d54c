//! Logging utilities and bounded log history
//!
//! All engine code logs through the `log` facade. [`init`] installs a plain
//! `env_logger`; [`init_with_history`] additionally keeps the most recent
//! messages in memory so an application can dump them to a file on exit.

pub use log::{debug, error, info, trace, warn};

use chrono::{DateTime, Local, TimeZone};
use std::collections::VecDeque;
use std::fmt;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

/// Default number of messages kept by [`LogHistory`]
pub const DEFAULT_HISTORY_CAPACITY: usize = 2000;

/// Initialize the logging system
pub fn init() {
    env_logger::init();
}

/// Initialize logging and keep a bounded copy of every emitted message.
///
/// Returns the shared history so the caller can dump it later. If a logger
/// was already installed the history is still returned but stays empty.
pub fn init_with_history(capacity: usize) -> Arc<Mutex<LogHistory>> {
    let inner = env_logger::Builder::from_default_env().build();
    let max_level = inner.filter();
    let history = Arc::new(Mutex::new(LogHistory::new(capacity)));

    let logger = HistoryLogger {
        inner,
        history: Arc::clone(&history),
    };

    if log::set_boxed_logger(Box::new(logger)).is_ok() {
        log::set_max_level(max_level);
        info!(target: "world_engine::foundation::logging", "Logging system started");
    }

    history
}

/// Subsystem a log message belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogOwner {
    /// The logging system itself
    Logging,
    /// Instance, device, surface and window bootstrap
    Backend,
    /// Swap chain, render pass, pipeline and frame loop
    Renderer,
    /// Scene graph and asset loading
    Graph,
    /// Overlay recording
    Ui,
    /// Anything outside the engine
    User,
}

impl LogOwner {
    /// Classify a `log` record target (normally a module path)
    pub fn from_target(target: &str) -> Self {
        if !target.starts_with("world_engine") {
            return Self::User;
        }
        if target.contains("::foundation::logging") {
            Self::Logging
        } else if target.contains("::overlay") {
            Self::Ui
        } else if target.contains("::scene") || target.contains("::assets") {
            Self::Graph
        } else if target.contains("::initialization") || target.contains("::window") {
            Self::Backend
        } else if target.contains("::render") {
            Self::Renderer
        } else {
            Self::User
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Logging => "logger",
            Self::Backend => "backend",
            Self::Renderer => "renderer",
            Self::Graph => "graph",
            Self::Ui => "ui",
            Self::User => "user",
        }
    }
}

impl fmt::Display for LogOwner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single recorded message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogMessage {
    /// Subsystem that produced the message
    pub owner: LogOwner,
    /// Message text
    pub text: String,
    /// Local time of day, `HH:MM:SS`
    pub time: String,
}

impl fmt::Display for LogMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Log Message ({})[{}]: {}", self.time, self.owner, self.text)
    }
}

/// Ring buffer of the most recent log messages
#[derive(Debug)]
pub struct LogHistory {
    capacity: usize,
    messages: VecDeque<LogMessage>,
}

impl LogHistory {
    /// Create an empty history holding at most `capacity` messages
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            messages: VecDeque::with_capacity(capacity.min(DEFAULT_HISTORY_CAPACITY)),
        }
    }

    /// Append a message, evicting the oldest ones once full
    pub fn add_message(&mut self, owner: LogOwner, text: impl Into<String>) {
        while self.messages.len() >= self.capacity {
            self.messages.pop_front();
        }
        self.messages.push_back(LogMessage {
            owner,
            text: text.into(),
            time: time_of_day(&Local::now()),
        });
    }

    /// Number of stored messages
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether no message is stored
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Maximum number of stored messages
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Iterate over stored messages, oldest first
    pub fn messages(&self) -> impl Iterator<Item = &LogMessage> {
        self.messages.iter()
    }

    /// Messages produced by one subsystem, oldest first
    pub fn messages_by_owner(&self, owner: LogOwner) -> impl Iterator<Item = &LogMessage> {
        self.messages.iter().filter(move |m| m.owner == owner)
    }

    /// Drop every stored message
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Write all messages to `path`, one per line
    pub fn dump_to_file(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let mut contents = String::new();
        for message in &self.messages {
            contents.push_str(&message.to_string());
            contents.push('\n');
        }
        std::fs::write(path, contents)
    }
}

impl Default for LogHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

/// `log` backend that forwards to `env_logger` and records into a history
struct HistoryLogger {
    inner: env_logger::Logger,
    history: Arc<Mutex<LogHistory>>,
}

impl log::Log for HistoryLogger {
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        self.inner.enabled(metadata)
    }

    fn log(&self, record: &log::Record<'_>) {
        if !self.inner.matches(record) {
            return;
        }
        self.inner.log(record);

        let owner = LogOwner::from_target(record.target());
        let mut history = self.history.lock().unwrap_or_else(PoisonError::into_inner);
        history.add_message(owner, record.args().to_string());
    }

    fn flush(&self) {
        self.inner.flush();
    }
}

fn time_of_day<Tz>(time: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    time.format("%H:%M:%S").to_string()
}
