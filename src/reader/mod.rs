//! # Log Reader
//!
//! Pull-based retrieval of timestamped messages from a dataflash log.
//!
//! This module handles:
//! - Choosing the binary or text decoder for a file
//! - Timestamp reconstruction from GPS fixes
//! - Session state (latest messages, parameters, flight mode)
//! - Filtered retrieval by type and condition

pub mod queue;
pub mod state;

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use clap::ValueEnum;
use serde::Deserialize;
use tracing::{debug, info};

use crate::condition::{AcceptAll, ConditionEvaluator};
use crate::dataflash::binary::BinaryLog;
use crate::dataflash::message::Message;
use crate::dataflash::text::{is_text_log, TextLog};
use crate::dataflash::LogSource;
use crate::error::Result;
use crate::modes::{ArduModeNames, ModeNames};
use queue::TimestampQueue;
use state::SessionState;

/// Physical encoding of a log file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Detect from file content
    #[default]
    Auto,
    Binary,
    Text,
}

/// Dataflash log reader
pub struct DfReader {
    source: Box<dyn LogSource>,
    queue: TimestampQueue,
    state: SessionState,
    evaluator: Box<dyn ConditionEvaluator>,
    modes: Box<dyn ModeNames>,
}

impl fmt::Debug for DfReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DfReader")
            .field("percent", &self.state.percent())
            .field("flightmode", &self.state.flightmode())
            .field("pending", &self.queue.len())
            .finish_non_exhaustive()
    }
}

impl DfReader {
    /// Create a reader over an already opened decoder
    pub fn new<S: LogSource + 'static>(source: S) -> Self {
        Self {
            source: Box::new(source),
            queue: TimestampQueue::new(),
            state: SessionState::new(),
            evaluator: Box::new(AcceptAll),
            modes: Box::new(ArduModeNames),
        }
    }

    /// Open a log file
    ///
    /// # Arguments
    ///
    /// * `path` - Log file path
    /// * `format` - Physical format, or `Auto` to detect
    /// * `probe_bytes` - Bytes inspected by text-log detection
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use dflog::reader::{DfReader, LogFormat};
    ///
    /// let mut reader = DfReader::open("flight.bin", LogFormat::Auto, 8000)?;
    /// while let Some(msg) = reader.recv_msg()? {
    ///     println!("{}", msg);
    /// }
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn open<P: AsRef<Path>>(path: P, format: LogFormat, probe_bytes: usize) -> Result<Self> {
        let path = path.as_ref();
        let format = match format {
            LogFormat::Auto if is_text_log(path, probe_bytes)? => LogFormat::Text,
            LogFormat::Auto => LogFormat::Binary,
            other => other,
        };
        info!("Opening {} as {:?} log", path.display(), format);

        Ok(match format {
            LogFormat::Text => Self::new(TextLog::open(path)?),
            _ => Self::new(BinaryLog::open(path)?),
        })
    }

    /// Use `evaluator` for condition checks
    pub fn with_evaluator(mut self, evaluator: Box<dyn ConditionEvaluator>) -> Self {
        self.evaluator = evaluator;
        self
    }

    /// Use `modes` to name numeric flight modes
    pub fn with_mode_names(mut self, modes: Box<dyn ModeNames>) -> Self {
        self.modes = modes;
        self
    }

    /// Next message in time order
    ///
    /// # Returns
    ///
    /// * `Ok(None)` - End of log
    ///
    /// # Errors
    ///
    /// Returns error if the log is structurally unreadable
    pub fn recv_msg(&mut self) -> Result<Option<Message>> {
        if self.queue.is_empty() {
            self.queue.fill(&mut self.source)?;
        }

        let Some(msg) = self.queue.pop() else {
            return Ok(None);
        };
        self.state.update(&msg, self.source.percent(), self.modes.as_ref());
        Ok(Some(msg))
    }

    /// Next message matching a type filter and a condition
    ///
    /// # Arguments
    ///
    /// * `types` - Acceptable type names, or `None` for any
    /// * `condition` - Condition checked against session state, or `None`
    /// * `blocking` - Accepted for compatibility; the log is in memory, so
    ///   this never waits
    pub fn recv_match(&mut self, types: Option<&[&str]>, condition: Option<&str>, blocking: bool) -> Result<Option<Message>> {
        if blocking {
            debug!("Blocking read requested; serving from memory");
        }

        while let Some(msg) = self.recv_msg()? {
            if let Some(types) = types {
                if !types.contains(&msg.get_type()) {
                    continue;
                }
            }
            if let Some(condition) = condition {
                if !self.check_condition(condition) {
                    continue;
                }
            }
            return Ok(Some(msg));
        }

        Ok(None)
    }

    /// Evaluate `condition` against the current session state
    pub fn check_condition(&self, condition: &str) -> bool {
        self.evaluator.evaluate(condition, self.state.messages())
    }

    /// Current value of a parameter
    pub fn param(&self, name: &str) -> Option<f64> {
        self.state.param(name)
    }

    /// Current value of a parameter, or `default` if it was never set
    pub fn param_or(&self, name: &str, default: f64) -> f64 {
        self.param(name).unwrap_or(default)
    }

    /// Restart from the beginning of the log
    ///
    /// Cursor, schema, timestamp history and session state reset together.
    pub fn rewind(&mut self) {
        self.source.rewind();
        self.queue.reset();
        self.state = SessionState::new();
    }

    pub fn params(&self) -> &HashMap<String, f64> {
        self.state.params()
    }

    /// Latest message per type name
    pub fn messages(&self) -> &HashMap<String, Message> {
        self.state.messages()
    }

    pub fn flightmode(&self) -> &str {
        self.state.flightmode()
    }

    /// Read progress, 0 to 100
    pub fn percent(&self) -> f64 {
        self.state.percent()
    }

    /// Average period of a message type learned from GPS intervals
    pub fn message_period(&self, msg_type: &str) -> Option<f64> {
        self.queue.period(msg_type)
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }
}

impl Iterator for DfReader {
    type Item = Result<Message>;

    fn next(&mut self) -> Option<Self::Item> {
        self.recv_msg().transpose()
    }
}
