//! Bridge-level error taxonomy
//!
//! Every failure is converted to return-value signaling at the session
//! surface; these variants exist so the conversion point formats one
//! message and the rest of the pipeline uses ordinary `Result` discipline.

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum BridgeError {
    /// Input text failed to parse as a term, before any goal ran.
    Parse(String),
    /// The engine raised or failed in a way that carries a message.
    Engine(String),
    /// Operation invoked with no initialized engine.
    NotInitialized,
    /// Empty or blank input where a goal, fact or name was required.
    EmptyInput(&'static str),
    /// A bootstrap clause failed to load; fatal to initialization.
    Bootstrap(String),
}

impl fmt::Display for BridgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BridgeError::Parse(message) => write!(f, "{}", message),
            BridgeError::Engine(message) => write!(f, "{}", message),
            BridgeError::NotInitialized => write!(f, "Prolog engine is not initialized"),
            BridgeError::EmptyInput(what) => write!(f, "empty {}", what),
            BridgeError::Bootstrap(message) => {
                write!(f, "bootstrap clauses failed to load: {}", message)
            }
        }
    }
}

impl std::error::Error for BridgeError {}
