//! # Timestamp Reconstruction
//!
//! Most dataflash records carry no absolute time. Records are buffered into
//! a batch until a GPS fix with a derivable time closes it; every record in
//! the batch is then timestamped by spreading each type evenly, centered in
//! its slot, backward from that fix over the interval since the previous
//! fix. The very first fix after a rewind only seeds the interval.

use std::collections::{HashMap, VecDeque};

use tracing::debug;

use crate::dataflash::message::Message;
use crate::dataflash::protocol::*;
use crate::dataflash::LogSource;
use crate::error::Result;

/// Field holding a record's own time
pub const TIME_FIELD: &str = "T";

/// Absolute time of a GPS record in seconds
///
/// Priority: `T` (milliseconds); else `Time` or `TimeMS` (milliseconds),
/// converted from GPS week time to Unix time when `Week` is present.
pub fn gps_time(msg: &Message) -> Option<f64> {
    if let Some(t) = msg.get_f64(TIME_FIELD) {
        return Some(t * 0.001);
    }

    let mut time = msg.get_f64("Time").map(|t| t * 0.001);
    if let Some(t) = msg.get_f64("TimeMS") {
        time = Some(t * 0.001);
    }

    match msg.get_f64("Week") {
        Some(week) => time.map(|t| GPS_EPOCH_UNIX_SECS + GPS_WEEK_SECS * week + t - GPS_LEAP_SECONDS),
        None => time,
    }
}

/// Time of `msg` if it is a GPS record usable as an anchor
///
/// A zero time is a receiver without a fix and never anchors.
pub fn anchor_time(msg: &Message) -> Option<f64> {
    if !GPS_MESSAGE_TYPES.contains(&msg.get_type()) {
        return None;
    }
    gps_time(msg).filter(|t| *t != 0.0)
}

fn count_types(batch: &[Message]) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for msg in batch {
        *counts.entry(msg.get_type().to_string()).or_insert(0) += 1;
    }
    counts
}

/// Batches decoded messages and releases them timestamped, in time order
#[derive(Debug, Default)]
pub struct TimestampQueue {
    /// Timestamped messages waiting for delivery
    ready: VecDeque<Message>,
    /// Time of the most recent anchor
    last_gps_time: Option<f64>,
    /// Average period per message type, from the latest batch containing it
    periods: HashMap<String, f64>,
}

impl TimestampQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next timestamped message
    pub fn pop(&mut self) -> Option<Message> {
        self.ready.pop_front()
    }

    pub fn len(&self) -> usize {
        self.ready.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ready.is_empty()
    }

    pub fn last_gps_time(&self) -> Option<f64> {
        self.last_gps_time
    }

    /// Learned period of a message type, in seconds
    pub fn period(&self, msg_type: &str) -> Option<f64> {
        self.periods.get(msg_type).copied()
    }

    /// Forget all buffered messages and anchor history
    pub fn reset(&mut self) {
        self.ready.clear();
        self.last_gps_time = None;
        self.periods.clear();
    }

    /// Pull messages from `source` until a batch can be released
    ///
    /// Does nothing while released messages are still waiting.
    ///
    /// # Returns
    ///
    /// * `Result<usize>` - Number of messages ready; 0 at end of stream
    ///
    /// # Errors
    ///
    /// Propagates fatal decode errors from `source`
    pub fn fill<S: LogSource + ?Sized>(&mut self, source: &mut S) -> Result<usize> {
        if !self.ready.is_empty() {
            return Ok(self.ready.len());
        }

        let mut batch: Vec<Message> = Vec::new();
        let mut counts: HashMap<String, usize> = HashMap::new();

        loop {
            let Some(msg) = source.parse_next()? else {
                self.close_at_end(&mut batch);
                break;
            };

            let msg_type = msg.get_type().to_string();
            let anchor = anchor_time(&msg);
            batch.push(msg);

            if let Some(time) = anchor {
                if self.last_gps_time.is_none() {
                    // need a second fix to get an interval; the seed opens it
                    // and is not weighted into the batch
                    self.last_gps_time = Some(time);
                    continue;
                }
                *counts.entry(msg_type.clone()).or_insert(0) += 1;
                self.assign(&mut batch, &counts, &msg_type, time);
                break;
            }
            *counts.entry(msg_type).or_insert(0) += 1;
        }

        self.release(batch);
        Ok(self.ready.len())
    }

    /// End of stream: keep records up to the last anchor and timestamp them
    fn close_at_end(&mut self, batch: &mut Vec<Message>) {
        let last_anchor = batch
            .iter()
            .enumerate()
            .rev()
            .find_map(|(i, m)| anchor_time(m).map(|t| (i, t, m.get_type().to_string())));

        let Some((idx, time, anchor_type)) = last_anchor else {
            if !batch.is_empty() {
                debug!("Discarding {} messages with no GPS time at end of log", batch.len());
            }
            batch.clear();
            return;
        };

        let dropped = batch.len() - idx - 1;
        if dropped > 0 {
            debug!("Discarding {} messages after the last GPS time", dropped);
        }
        batch.truncate(idx + 1);

        if self.last_gps_time.is_none() {
            self.last_gps_time = Some(time);
        }
        let counts = count_types(batch.as_slice());
        self.assign(batch, &counts, &anchor_type, time);
    }

    /// Timestamp every message of a batch closed by an anchor at `time`
    fn assign(&mut self, batch: &mut [Message], counts: &HashMap<String, usize>, anchor_type: &str, time: f64) {
        let last = self.last_gps_time.unwrap_or(time);
        let anchor_count = counts.get(anchor_type).copied().unwrap_or(1);
        let interval = (time - last) * anchor_count as f64;
        let mut countdown = counts.clone();

        for msg in batch.iter_mut() {
            if let Some(t) = anchor_time(msg) {
                msg.set_timestamp(t);
                continue;
            }

            if let Some(t) = msg.get_f64(TIME_FIELD) {
                msg.set_timestamp(t);
                continue;
            }

            let msg_type = msg.get_type().to_string();
            let count = counts.get(&msg_type).copied().unwrap_or(1);
            let period = interval / count as f64;
            let remaining = countdown.get(&msg_type).copied().unwrap_or(1);

            msg.set_timestamp(time - period * remaining as f64 + period * 0.5);

            if let Some(c) = countdown.get_mut(&msg_type) {
                *c = c.saturating_sub(1);
            }
            self.periods.insert(msg_type, period);
        }

        self.last_gps_time = Some(time);
    }

    fn release(&mut self, mut batch: Vec<Message>) {
        if batch.is_empty() {
            return;
        }

        batch.sort_by(|a, b| {
            let ta = a.timestamp().unwrap_or(f64::NEG_INFINITY);
            let tb = b.timestamp().unwrap_or(f64::NEG_INFINITY);
            ta.total_cmp(&tb)
        });
        debug!("Released batch of {} messages", batch.len());
        self.ready.extend(batch);
    }
}
