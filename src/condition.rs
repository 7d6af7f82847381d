//! # Condition Evaluation
//!
//! Seam for filtering retrieved messages with a boolean expression over the
//! latest message of each type.

use std::collections::HashMap;

use crate::dataflash::message::Message;

/// Evaluates a condition expression against session state
#[cfg_attr(test, mockall::automock)]
pub trait ConditionEvaluator {
    /// # Arguments
    ///
    /// * `condition` - Expression, e.g. `GPS.Status >= 3`
    /// * `messages` - Latest message per type name, `MAV` included
    fn evaluate(&self, condition: &str, messages: &HashMap<String, Message>) -> bool;
}

/// Evaluator that accepts every condition
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl ConditionEvaluator for AcceptAll {
    fn evaluate(&self, _condition: &str, _messages: &HashMap<String, Message>) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accept_all() {
        assert!(AcceptAll.evaluate("GPS.Status >= 3", &HashMap::new()));
    }
}
