//! # Session State
//!
//! What the reader knows after delivering each message: latest message per
//! type, parameters, flight mode and progress.

use std::collections::HashMap;

use crate::dataflash::message::{Message, Value};
use crate::dataflash::protocol::{MODE_MESSAGE, PARM_MESSAGE};
use crate::modes::ModeNames;

/// Key of the synthetic entry describing the reader itself
pub const READER_STATE_KEY: &str = "MAV";

/// Flight mode before any mode record is seen
pub const UNKNOWN_FLIGHTMODE: &str = "UNKNOWN";

/// State accumulated from delivered messages
#[derive(Debug, Clone)]
pub struct SessionState {
    /// Latest message per type, plus the `MAV` entry
    messages: HashMap<String, Message>,
    params: HashMap<String, f64>,
    flightmode: String,
    /// Read progress, 0 to 100
    percent: f64,
    /// Timestamp of the latest delivered message
    timestamp: f64,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionState {
    pub fn new() -> Self {
        let mut state = Self {
            messages: HashMap::new(),
            params: HashMap::new(),
            flightmode: UNKNOWN_FLIGHTMODE.to_string(),
            percent: 0.0,
            timestamp: 0.0,
        };
        state.refresh_reader_entry();
        state
    }

    /// Record a message delivered to the consumer
    ///
    /// # Arguments
    ///
    /// * `msg` - Delivered message
    /// * `percent` - Read progress of the underlying decoder
    /// * `modes` - Mode-name lookup for numeric mode records
    pub fn update(&mut self, msg: &Message, percent: f64, modes: &dyn ModeNames) {
        let msg_type = msg.get_type();

        match msg_type {
            PARM_MESSAGE => {
                if let (Some(name), Some(value)) = (msg.get_str("Name"), msg.get_f64("Value")) {
                    self.params.insert(name.to_string(), value);
                }
            }
            MODE_MESSAGE => {
                if let Some(mode) = flightmode_of(msg, modes) {
                    self.flightmode = mode;
                }
            }
            _ => {}
        }

        self.percent = percent;
        if let Some(t) = msg.timestamp() {
            self.timestamp = t;
        }

        self.messages.insert(msg_type.to_string(), msg.clone());
        self.refresh_reader_entry();
    }

    fn refresh_reader_entry(&mut self) {
        let mut mav = Message::synthetic(READER_STATE_KEY);
        mav.append_field("flightmode", Value::Text(self.flightmode.clone()));
        mav.append_field("percent", Value::Float(self.percent));
        mav.append_field("timestamp", Value::Float(self.timestamp));
        mav.set_timestamp(self.timestamp);
        self.messages.insert(READER_STATE_KEY.to_string(), mav);
    }

    /// Latest message per type name
    pub fn messages(&self) -> &HashMap<String, Message> {
        &self.messages
    }

    pub fn latest(&self, msg_type: &str) -> Option<&Message> {
        self.messages.get(msg_type)
    }

    pub fn params(&self) -> &HashMap<String, f64> {
        &self.params
    }

    pub fn param(&self, name: &str) -> Option<f64> {
        self.params.get(name).copied()
    }

    pub fn flightmode(&self) -> &str {
        &self.flightmode
    }

    pub fn percent(&self) -> f64 {
        self.percent
    }

    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }
}

/// Flight-mode name carried by a mode record
fn flightmode_of(msg: &Message, modes: &dyn ModeNames) -> Option<String> {
    match msg.get("Mode")? {
        Value::Text(name) => Some(name.to_uppercase()),
        mode => match msg.get_i64("ModeNum") {
            Some(num) => Some(modes.plane_mode_name(num)),
            None => Some(modes.copter_mode_name(mode.as_i64()?)),
        },
    }
}
