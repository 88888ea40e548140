//! Argument Descriptors
//!
//! Declarative per-position constraints checked against every call a mock
//! receives. A descriptor is validated once, when it is attached to a
//! behavior, and compiled into an [`ArgumentRule`].
//!
//! ## Checking order
//!
//! 1. Argument count: fewer than the required positions, or more than the
//!    declared positions, fails before any position is looked at.
//! 2. Every overlapping position is checked, constraint by constraint. All
//!    positions are evaluated; the first failure is the one reported.

use crate::result::{MockError, MockResult};
use crate::value::{ArgKind, Value};
use regex::Regex;

/// Constraint for one argument position
#[derive(Debug, Clone, Default)]
pub struct ArgSpec {
    optional: bool,
    kind: Option<ArgKind>,
    value: Option<Value>,
    pattern: Option<Regex>,
}

impl ArgSpec {
    /// Required position with no constraints
    #[must_use]
    pub fn any() -> Self {
        Self::default()
    }

    /// Required position of the given kind
    #[must_use]
    pub fn of(kind: ArgKind) -> Self {
        Self::any().kind(kind)
    }

    /// Required text position matching a pattern
    pub fn pattern(source: &str) -> MockResult<Self> {
        let regex = Regex::new(source).map_err(|e| MockError::InvalidDescriptor {
            message: format!("pattern /{source}/ does not compile: {e}"),
        })?;
        Ok(Self::any().like(regex))
    }

    /// Expect a runtime kind
    #[must_use]
    pub fn kind(mut self, kind: ArgKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Expect a deeply equal value
    #[must_use]
    pub fn value(mut self, value: impl Into<Value>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Expect text matching a compiled pattern
    #[must_use]
    pub fn like(mut self, pattern: Regex) -> Self {
        self.pattern = Some(pattern);
        self
    }

    /// Mark the position optional
    #[must_use]
    pub const fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Whether a call must supply this position
    #[must_use]
    pub const fn is_required(&self) -> bool {
        !self.optional
    }

    fn validate(&self, index: usize) -> MockResult<()> {
        let invalid = |message: String| -> MockResult<()> {
            Err(MockError::InvalidDescriptor {
                message: format!("position {index}: {message}"),
            })
        };

        if let (Some(pattern), Some(kind)) = (&self.pattern, self.kind) {
            if kind != ArgKind::Text {
                return invalid(format!(
                    "pattern /{}/ only applies to string arguments, but type is {kind}",
                    pattern.as_str()
                ));
            }
        }
        if let (Some(value), Some(kind)) = (&self.value, self.kind) {
            if value.kind() != kind {
                return invalid(format!(
                    "value {value} is {} but type is {kind}",
                    value.kind()
                ));
            }
        }
        if let (Some(value), Some(pattern)) = (&self.value, &self.pattern) {
            match value.as_str() {
                Some(text) if pattern.is_match(text) => {}
                _ => {
                    return invalid(format!(
                        "value {value} can never match pattern /{}/",
                        pattern.as_str()
                    ))
                }
            }
        }
        Ok(())
    }

    fn check(&self, index: usize, arg: &Value, failures: &mut Vec<MockError>) {
        if let Some(kind) = self.kind {
            if arg.kind() != kind {
                failures.push(MockError::TypeMismatch {
                    index,
                    expected: kind,
                    actual: arg.kind(),
                });
            }
        }
        if let Some(expected) = &self.value {
            if !expected.deep_eq(arg) {
                failures.push(MockError::ValueMismatch {
                    index,
                    expected: expected.clone(),
                    actual: arg.clone(),
                });
            }
        }
        if let Some(pattern) = &self.pattern {
            match arg.as_str() {
                None => failures.push(MockError::TypeMismatch {
                    index,
                    expected: ArgKind::Text,
                    actual: arg.kind(),
                }),
                Some(text) if !pattern.is_match(text) => {
                    failures.push(MockError::PatternMismatch {
                        index,
                        pattern: pattern.as_str().to_string(),
                        actual: arg.clone(),
                    });
                }
                Some(_) => {}
            }
        }
    }
}

/// A validated argument descriptor
#[derive(Debug, Clone)]
pub struct ArgumentRule {
    specs: Vec<ArgSpec>,
    required: usize,
}

impl ArgumentRule {
    /// Validate a descriptor.
    ///
    /// Rejects a pattern on a non-string position, a value whose kind
    /// contradicts the declared type, a value the pattern can never accept,
    /// and a required position following an optional one.
    pub fn new(specs: Vec<ArgSpec>) -> MockResult<Self> {
        let mut seen_optional = false;
        for (index, spec) in specs.iter().enumerate() {
            spec.validate(index)?;
            if spec.is_required() && seen_optional {
                return Err(MockError::InvalidDescriptor {
                    message: format!("position {index}: required argument after optional one"),
                });
            }
            seen_optional |= !spec.is_required();
        }
        let required = specs.iter().filter(|s| s.is_required()).count();
        Ok(Self { specs, required })
    }

    /// Number of positions a call must supply
    #[must_use]
    pub const fn required_count(&self) -> usize {
        self.required
    }

    /// Number of declared positions
    #[must_use]
    pub fn max_count(&self) -> usize {
        self.specs.len()
    }

    /// Every failure for a call, in position order
    #[must_use]
    pub fn failures(&self, args: &[Value]) -> Vec<MockError> {
        if args.len() < self.required {
            return vec![MockError::TooFewArguments {
                expected: self.required,
                actual: args.len(),
            }];
        }
        if args.len() > self.specs.len() {
            return vec![MockError::TooManyArguments {
                max: self.specs.len(),
                actual: args.len(),
            }];
        }

        let mut failures = Vec::new();
        for (index, (spec, arg)) in self.specs.iter().zip(args).enumerate() {
            spec.check(index, arg, &mut failures);
        }
        failures
    }

    /// Check a call, reporting the first failure
    pub fn check(&self, args: &[Value]) -> MockResult<()> {
        let mut failures = self.failures(args).into_iter();
        match failures.next() {
            None => Ok(()),
            Some(first) => {
                tracing::debug!(
                    %first,
                    suppressed = failures.len(),
                    "argument verification failed"
                );
                Err(first)
            }
        }
    }
}
