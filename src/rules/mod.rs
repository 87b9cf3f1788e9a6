//! Pure game arithmetic. Nothing in here touches the database; procedures
//! load rows, ask these functions what should happen, then write the result.

pub mod crafting;
pub mod diplomacy;
pub mod intelligence;
pub mod mission;
pub mod security;
pub mod upgrade;

use thiserror::Error;

/// A business precondition that the request does not meet.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct RuleViolation(pub String);

impl RuleViolation {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}
