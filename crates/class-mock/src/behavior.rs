//! Mock Behaviors
//!
//! A [`Behavior`] is the handle for one active interception: the ordered
//! argument checks every call must pass, the outcome a verified call
//! produces, and a record of the calls it accepted.
//!
//! Checks always run to completion before the outcome is produced. A failing
//! check is returned to the caller of the mocked member and the outcome is
//! never reached.

use crate::args::{ArgSpec, ArgumentRule};
use crate::class::{Method, Receiver};
use crate::result::{MockError, MockResult};
use crate::value::{Deferred, Value};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

type Check = Rc<dyn Fn(&[Value]) -> MockResult<()>>;

struct BehaviorInner {
    method: String,
    checks: RefCell<Vec<Check>>,
    outcome: RefCell<Method>,
    calls: RefCell<Vec<Vec<Value>>>,
    record_calls: bool,
    release: Box<dyn Fn()>,
}

/// Handle to one active mock.
///
/// Cloning the handle shares the same checks, outcome and call record.
/// Configuration methods consume and return the handle so they chain:
///
/// ```rust,ignore
/// let greet = interceptor
///     .mock("greet")
///     .expect_arguments(vec![ArgSpec::of(ArgKind::Text)])?
///     .resolves("Welcome John Smith");
/// ```
#[derive(Clone)]
pub struct Behavior {
    inner: Rc<BehaviorInner>,
}

impl fmt::Debug for Behavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Behavior")
            .field("method", &self.inner.method)
            .field("checks", &self.inner.checks.borrow().len())
            .field("calls", &self.inner.calls.borrow().len())
            .field("record_calls", &self.inner.record_calls)
            .finish()
    }
}

impl Behavior {
    pub(crate) fn new<F>(method: &str, substitute: Method, record_calls: bool, release: F) -> Self
    where
        F: Fn() + 'static,
    {
        Self {
            inner: Rc::new(BehaviorInner {
                method: method.to_string(),
                checks: RefCell::new(Vec::new()),
                outcome: RefCell::new(substitute),
                calls: RefCell::new(Vec::new()),
                record_calls,
                release: Box::new(release),
            }),
        }
    }

    /// Name of the mocked member
    #[must_use]
    pub fn method_name(&self) -> &str {
        &self.inner.method
    }

    /// Add an argument rule. Every rule added must pass on each call.
    ///
    /// The descriptor is validated here; contradictory positions are a
    /// configuration error rather than a call-time failure.
    pub fn expect_arguments(self, descriptor: Vec<ArgSpec>) -> MockResult<Self> {
        let rule = ArgumentRule::new(descriptor)?;
        Ok(self.check_with(move |args| rule.check(args)))
    }

    /// Add an arbitrary check run against the full argument list
    #[must_use]
    pub fn check_with<F>(self, check: F) -> Self
    where
        F: Fn(&[Value]) -> MockResult<()> + 'static,
    {
        self.inner.checks.borrow_mut().push(Rc::new(check));
        self
    }

    /// Produce `value` on every verified call
    #[must_use]
    pub fn returns(self, value: impl Into<Value>) -> Self {
        let value = value.into();
        self.set_outcome(move |_, _| Ok(value.clone()))
    }

    /// Fail every verified call with `value`
    #[must_use]
    pub fn throws(self, value: impl Into<Value>) -> Self {
        let value = value.into();
        self.set_outcome(move |_, _| Err(MockError::Thrown(value.clone())))
    }

    /// Produce an already-fulfilled deferred value
    #[must_use]
    pub fn resolves(self, value: impl Into<Value>) -> Self {
        let value = value.into();
        self.set_outcome(move |_, _| Ok(Value::Deferred(Deferred::resolved(value.clone()))))
    }

    /// Produce an already-rejected deferred value
    #[must_use]
    pub fn rejects(self, value: impl Into<Value>) -> Self {
        let value = value.into();
        self.set_outcome(move |_, _| Ok(Value::Deferred(Deferred::rejected(value.clone()))))
    }

    /// Run every check against `args` in registration order.
    ///
    /// `Ok(())` means all passed; otherwise the first failure is returned.
    pub fn invoke(&self, args: &[Value]) -> MockResult<()> {
        let checks: Vec<Check> = self.inner.checks.borrow().clone();
        for check in &checks {
            check(args)?;
        }
        Ok(())
    }

    /// Remove this mock from its interceptor, restoring the saved original
    pub fn release(&self) {
        (self.inner.release)();
    }

    /// Arguments of every verified call, oldest first
    #[must_use]
    pub fn calls(&self) -> Vec<Vec<Value>> {
        self.inner.calls.borrow().clone()
    }

    /// Number of verified calls
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.inner.calls.borrow().len()
    }

    /// Assert the mock was called at least once
    pub fn assert_called(&self) -> MockResult<()> {
        if self.call_count() > 0 {
            Ok(())
        } else {
            Err(MockError::AssertionFailed {
                message: format!("expected `{}` to be called", self.inner.method),
            })
        }
    }

    /// Assert the mock was called exactly `times` times
    pub fn assert_called_times(&self, times: usize) -> MockResult<()> {
        let actual = self.call_count();
        if actual == times {
            Ok(())
        } else {
            Err(MockError::AssertionFailed {
                message: format!(
                    "expected `{}` to be called {times} times, was called {actual} times",
                    self.inner.method
                ),
            })
        }
    }

    /// Assert the mock was never called
    pub fn assert_not_called(&self) -> MockResult<()> {
        let actual = self.call_count();
        if actual == 0 {
            Ok(())
        } else {
            Err(MockError::AssertionFailed {
                message: format!(
                    "expected `{}` not to be called, was called {actual} times",
                    self.inner.method
                ),
            })
        }
    }

    /// Verify, record, then produce the outcome with `receiver` as self
    pub(crate) fn dispatch(&self, receiver: &Receiver, args: &[Value]) -> MockResult<Value> {
        tracing::trace!(method = %self.inner.method, args = args.len(), "intercepted call");
        self.invoke(args)?;
        if self.inner.record_calls {
            self.inner.calls.borrow_mut().push(args.to_vec());
        }
        let outcome = Rc::clone(&self.inner.outcome.borrow());
        outcome(receiver, args)
    }

    fn set_outcome<F>(self, outcome: F) -> Self
    where
        F: Fn(&Receiver, &[Value]) -> MockResult<Value> + 'static,
    {
        *self.inner.outcome.borrow_mut() = Rc::new(outcome);
        self
    }
}
