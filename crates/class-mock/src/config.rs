//! Interceptor configuration.

use serde::{Deserialize, Serialize};

/// Which namespace `mock` targets when a name exists in both
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MemberPrecedence {
    /// Prefer the type-level member
    #[default]
    StaticFirst,
    /// Prefer the instance-level member
    InstanceFirst,
}

/// Configuration for an [`Interceptor`](crate::Interceptor)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MockConfig {
    /// Namespace resolution for ambiguous names
    pub precedence: MemberPrecedence,
    /// Record the arguments of every verified call
    pub record_calls: bool,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            precedence: MemberPrecedence::StaticFirst,
            record_calls: true,
        }
    }
}

impl MockConfig {
    /// Create a new config
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set namespace precedence
    #[must_use]
    pub const fn with_precedence(mut self, precedence: MemberPrecedence) -> Self {
        self.precedence = precedence;
        self
    }

    /// Stop recording call arguments
    #[must_use]
    pub const fn without_call_recording(mut self) -> Self {
        self.record_calls = false;
        self
    }
}
