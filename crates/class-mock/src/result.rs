//! Result and error types for class-mock.

use crate::value::{ArgKind, Value};
use thiserror::Error;

/// Result type for class-mock operations
pub type MockResult<T> = Result<T, MockError>;

/// Errors that can occur while mocking or calling through a mocked class
#[derive(Debug, Error)]
pub enum MockError {
    /// The interceptor subject is not an un-instantiated class
    #[error("class-mock can only be used by un-instantiated classes (got {found})")]
    NotAClass {
        /// Description of what was supplied instead
        found: String,
    },

    /// Call to a member that is not in the live table
    #[error("{class} has no method `{name}`")]
    NoSuchMethod {
        /// Class name
        class: String,
        /// Member name
        name: String,
    },

    /// Argument descriptor rejected at configuration time
    #[error("Invalid argument descriptor: {message}")]
    InvalidDescriptor {
        /// Error message
        message: String,
    },

    /// Fewer arguments than the descriptor requires
    #[error("Expected {expected} arguments but received {actual}")]
    TooFewArguments {
        /// Required argument count
        expected: usize,
        /// Received argument count
        actual: usize,
    },

    /// More arguments than the descriptor declares
    #[error("too many arguments: expected at most {max} arguments but received {actual}")]
    TooManyArguments {
        /// Declared argument count
        max: usize,
        /// Received argument count
        actual: usize,
    },

    /// Argument has the wrong runtime kind
    #[error("Argument {index}: expected {expected} got {actual}")]
    TypeMismatch {
        /// Argument position
        index: usize,
        /// Expected kind
        expected: ArgKind,
        /// Actual kind
        actual: ArgKind,
    },

    /// Argument is not deeply equal to the expected value
    #[error("Argument {index}: {expected} deepEqual {actual}")]
    ValueMismatch {
        /// Argument position
        index: usize,
        /// Expected value
        expected: Value,
        /// Actual value
        actual: Value,
    },

    /// Text argument does not match the expected pattern
    #[error("Argument {index}: expected value like /{pattern}/ got {actual}")]
    PatternMismatch {
        /// Argument position
        index: usize,
        /// Pattern source
        pattern: String,
        /// Actual value
        actual: Value,
    },

    /// Call through a mock whose bound context no longer exists
    #[error("`{method}` was mocked with a bound context that has been dropped")]
    ContextDropped {
        /// Mocked member name
        method: String,
    },

    /// Failure raised by a method body or a configured `throws` outcome
    #[error("{}", .0.as_message())]
    Thrown(Value),

    /// Call-recording assertion failed
    #[error("Assertion failed: {message}")]
    AssertionFailed {
        /// Error message
        message: String,
    },
}

impl MockError {
    /// Raise an arbitrary value as a failure
    pub fn thrown(value: impl Into<Value>) -> Self {
        Self::Thrown(value.into())
    }

    /// Whether this failure came from an `expect_arguments` rule
    #[must_use]
    pub const fn is_verification_failure(&self) -> bool {
        matches!(
            self,
            Self::TooFewArguments { .. }
                | Self::TooManyArguments { .. }
                | Self::TypeMismatch { .. }
                | Self::ValueMismatch { .. }
                | Self::PatternMismatch { .. }
        )
    }

    /// The thrown value, if this is a thrown failure
    #[must_use]
    pub const fn thrown_value(&self) -> Option<&Value> {
        match self {
            Self::Thrown(value) => Some(value),
            _ => None,
        }
    }
}
