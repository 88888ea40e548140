//! Dynamic values passed through mocked members.
//!
//! Arguments and results are carried as [`Value`], a closed set of runtime
//! kinds. Every value reports exactly one [`ArgKind`] tag, which is what
//! argument descriptors are checked against.

use crate::result::MockResult;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

/// Runtime kind tag of a [`Value`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArgKind {
    /// Text
    Text,
    /// Number
    Number,
    /// Boolean
    Boolean,
    /// Structured data (arrays, maps) and deferred values
    Object,
    /// Function value
    Callable,
    /// Absent value
    None,
}

impl ArgKind {
    /// Tag name used in verification messages
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Text => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Object => "object",
            Self::Callable => "function",
            Self::None => "undefined",
        }
    }

    /// All kinds
    #[must_use]
    pub fn all() -> Vec<Self> {
        vec![
            Self::Text,
            Self::Number,
            Self::Boolean,
            Self::Object,
            Self::Callable,
            Self::None,
        ]
    }
}

impl fmt::Display for ArgKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A function value that can be passed as an argument
#[derive(Clone)]
pub struct Callable(Rc<dyn Fn(&[Value]) -> MockResult<Value>>);

impl Callable {
    /// Wrap a closure
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&[Value]) -> MockResult<Value> + 'static,
    {
        Self(Rc::new(f))
    }

    /// Call the function
    pub fn call(&self, args: &[Value]) -> MockResult<Value> {
        (self.0)(args)
    }

    /// Identity comparison
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[Function]")
    }
}

/// An already-settled deferred computation.
///
/// Produced by the `resolves` and `rejects` outcomes. Awaiting it completes
/// on the first poll.
#[derive(Debug, Clone)]
pub struct Deferred {
    outcome: Rc<Result<Value, Value>>,
}

impl Deferred {
    /// Deferred value that settles successfully
    #[must_use]
    pub fn resolved(value: impl Into<Value>) -> Self {
        Self {
            outcome: Rc::new(Ok(value.into())),
        }
    }

    /// Deferred value that settles as failed
    #[must_use]
    pub fn rejected(value: impl Into<Value>) -> Self {
        Self {
            outcome: Rc::new(Err(value.into())),
        }
    }

    /// Whether it settled successfully
    #[must_use]
    pub fn is_fulfilled(&self) -> bool {
        self.outcome.is_ok()
    }

    /// Whether it settled as failed
    #[must_use]
    pub fn is_rejected(&self) -> bool {
        self.outcome.is_err()
    }

    /// Borrow the settled outcome
    pub fn settled(&self) -> Result<&Value, &Value> {
        (*self.outcome).as_ref()
    }

    fn deep_eq(&self, other: &Self) -> bool {
        match (&*self.outcome, &*other.outcome) {
            (Ok(a), Ok(b)) | (Err(a), Err(b)) => a.deep_eq(b),
            _ => false,
        }
    }
}

impl Future for Deferred {
    type Output = Result<Value, Value>;

    fn poll(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Self::Output> {
        Poll::Ready((*self.outcome).clone())
    }
}

/// Dynamic value used for call arguments and results
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// Absent value
    #[default]
    None,
    /// Boolean
    Boolean(bool),
    /// Number
    Number(f64),
    /// Text
    Text(String),
    /// Arrays and maps
    Structured(serde_json::Value),
    /// Function value
    Callable(Callable),
    /// Settled deferred computation
    Deferred(Deferred),
}

impl Value {
    /// Text value
    #[must_use]
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    /// Value from JSON data; scalars map to their scalar variants
    #[must_use]
    pub fn json(data: serde_json::Value) -> Self {
        Self::from(data)
    }

    /// Function value
    pub fn callable<F>(f: F) -> Self
    where
        F: Fn(&[Value]) -> MockResult<Value> + 'static,
    {
        Self::Callable(Callable::new(f))
    }

    /// Runtime kind tag
    #[must_use]
    pub fn kind(&self) -> ArgKind {
        match self {
            Self::None => ArgKind::None,
            Self::Boolean(_) => ArgKind::Boolean,
            Self::Number(_) => ArgKind::Number,
            Self::Text(_) => ArgKind::Text,
            Self::Structured(data) => match data {
                serde_json::Value::Null => ArgKind::None,
                serde_json::Value::Bool(_) => ArgKind::Boolean,
                serde_json::Value::Number(_) => ArgKind::Number,
                serde_json::Value::String(_) => ArgKind::Text,
                serde_json::Value::Array(_) | serde_json::Value::Object(_) => ArgKind::Object,
            },
            Self::Callable(_) => ArgKind::Callable,
            Self::Deferred(_) => ArgKind::Object,
        }
    }

    /// Structural equality
    #[must_use]
    pub fn deep_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::None, Self::None) => true,
            (Self::Boolean(a), Self::Boolean(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => same_number(*a, *b),
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Structured(a), Self::Structured(b)) => json_eq(a, b),
            (Self::Structured(data), scalar) | (scalar, Self::Structured(data)) => scalar
                .to_json()
                .is_some_and(|converted| json_eq(data, &converted)),
            (Self::Callable(a), Self::Callable(b)) => a.ptr_eq(b),
            (Self::Deferred(a), Self::Deferred(b)) => a.deep_eq(b),
            _ => false,
        }
    }

    /// JSON form, if the value has one
    #[must_use]
    pub fn to_json(&self) -> Option<serde_json::Value> {
        match self {
            Self::None => Some(serde_json::Value::Null),
            Self::Boolean(b) => Some(serde_json::Value::Bool(*b)),
            Self::Number(n) => serde_json::Number::from_f64(*n).map(serde_json::Value::Number),
            Self::Text(s) => Some(serde_json::Value::String(s.clone())),
            Self::Structured(data) => Some(data.clone()),
            Self::Callable(_) | Self::Deferred(_) => None,
        }
    }

    /// Borrow as text
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Structured(serde_json::Value::String(s)) => Some(s),
            _ => None,
        }
    }

    /// Read as a number
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Structured(serde_json::Value::Number(n)) => n.as_f64(),
            _ => None,
        }
    }

    /// Read as a boolean
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) | Self::Structured(serde_json::Value::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    /// Borrow structured data
    #[must_use]
    pub const fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Structured(data) => Some(data),
            _ => None,
        }
    }

    /// Borrow as a function value
    #[must_use]
    pub const fn as_callable(&self) -> Option<&Callable> {
        match self {
            Self::Callable(f) => Some(f),
            _ => None,
        }
    }

    /// Take the deferred computation out of this value
    #[must_use]
    pub fn into_deferred(self) -> Option<Deferred> {
        match self {
            Self::Deferred(d) => Some(d),
            _ => None,
        }
    }

    /// Whether this is the absent value
    #[must_use]
    pub const fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Message form: text unquoted, everything else as displayed
    #[must_use]
    pub fn as_message(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// Number equality where NaN matches NaN
fn same_number(a: f64, b: f64) -> bool {
    a == b || (a.is_nan() && b.is_nan())
}

fn json_eq(a: &serde_json::Value, b: &serde_json::Value) -> bool {
    use serde_json::Value as J;
    match (a, b) {
        (J::Number(x), J::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => same_number(x, y),
            (x, y) => x == y,
        },
        (J::Array(xs), J::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| json_eq(x, y))
        }
        (J::Object(xs), J::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(k, x)| ys.get(k).is_some_and(|y| json_eq(x, y)))
        }
        _ => a == b,
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.deep_eq(other)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("undefined"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "'{s}'"),
            Self::Structured(data) => write!(f, "{data}"),
            Self::Callable(_) => f.write_str("[Function]"),
            Self::Deferred(d) => match d.settled() {
                Ok(v) => write!(f, "Deferred(fulfilled: {v})"),
                Err(v) => write!(f, "Deferred(rejected: {v})"),
            },
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Number(n as f64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<Callable> for Value {
    fn from(f: Callable) -> Self {
        Self::Callable(f)
    }
}

impl From<Deferred> for Value {
    fn from(d: Deferred) -> Self {
        Self::Deferred(d)
    }
}

impl From<serde_json::Value> for Value {
    fn from(data: serde_json::Value) -> Self {
        match data {
            serde_json::Value::Null => Self::None,
            serde_json::Value::Bool(b) => Self::Boolean(b),
            serde_json::Value::Number(n) => Self::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Self::Text(s),
            structured => Self::Structured(structured),
        }
    }
}
