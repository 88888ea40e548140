//! Method Interception
//!
//! An [`Interceptor`] owns the relationship between one [`Class`] and its
//! currently mocked members. It saves the live implementation the first
//! time a name is mocked, installs a wrapper that routes calls through a
//! [`Behavior`], and puts the saved implementation back on unmock.
//!
//! ## Lifecycle of a name
//!
//! ```text
//! Unmocked ──mock──► Mocked ──mock──► Mocked ──unmock / release / unmock_all──► Unmocked
//! ```
//!
//! Re-mocking replaces the active behavior but keeps the implementation
//! saved by the first mock, so a single unmock always returns to the
//! pre-mock state.

use crate::behavior::Behavior;
use crate::class::{Class, Instance, MemberKind, Method, Receiver};
use crate::config::{MemberPrecedence, MockConfig};
use crate::result::{MockError, MockResult};
use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

/// What an interceptor may be constructed over
#[derive(Debug, Clone)]
pub enum MockTarget {
    /// An un-instantiated class
    Class(Class),
    /// An instance, rejected
    Instance(Instance),
    /// A plain value, rejected
    Value(Value),
}

impl From<Class> for MockTarget {
    fn from(class: Class) -> Self {
        Self::Class(class)
    }
}

impl From<&Class> for MockTarget {
    fn from(class: &Class) -> Self {
        Self::Class(class.clone())
    }
}

impl From<Instance> for MockTarget {
    fn from(instance: Instance) -> Self {
        Self::Instance(instance)
    }
}

impl From<&Instance> for MockTarget {
    fn from(instance: &Instance) -> Self {
        Self::Instance(instance.clone())
    }
}

impl From<Value> for MockTarget {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

/// Implementation saved on first mock
struct SavedMethod {
    kind: MemberKind,
    // None when the member did not exist
    implementation: Option<Method>,
}

struct InterceptorInner {
    target: Class,
    config: MockConfig,
    originals: RefCell<HashMap<String, SavedMethod>>,
}

/// Per-class registry of active mocks and saved originals.
///
/// # Example
///
/// ```rust,ignore
/// let interceptor = Interceptor::new(&user_class)?;
/// let lookup = interceptor
///     .mock("lookup")
///     .expect_arguments(vec![ArgSpec::of(ArgKind::Text).value("John")])?
///     .returns("Welcome John");
///
/// assert_eq!(user.call("lookup", &["John".into()])?, "Welcome John".into());
/// interceptor.unmock_all();
/// ```
#[derive(Clone)]
pub struct Interceptor {
    inner: Rc<InterceptorInner>,
}

impl fmt::Debug for Interceptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interceptor")
            .field("target", &self.inner.target.name())
            .field("config", &self.inner.config)
            .field("mocked", &self.mocked_methods())
            .finish()
    }
}

impl Interceptor {
    /// Create an interceptor with the default configuration.
    ///
    /// Fails with [`MockError::NotAClass`] unless `target` is a class.
    pub fn new(target: impl Into<MockTarget>) -> MockResult<Self> {
        Self::with_config(target, MockConfig::default())
    }

    /// Create an interceptor with an explicit configuration
    pub fn with_config(target: impl Into<MockTarget>, config: MockConfig) -> MockResult<Self> {
        let target = match target.into() {
            MockTarget::Class(class) => class,
            MockTarget::Instance(instance) => {
                return Err(MockError::NotAClass {
                    found: format!("an instance of {}", instance.class().name()),
                })
            }
            MockTarget::Value(value) => {
                return Err(MockError::NotAClass {
                    found: format!("a {} value", value.kind()),
                })
            }
        };
        Ok(Self {
            inner: Rc::new(InterceptorInner {
                target,
                config,
                originals: RefCell::new(HashMap::new()),
            }),
        })
    }

    /// The class being mocked
    #[must_use]
    pub fn target(&self) -> &Class {
        &self.inner.target
    }

    /// Active configuration
    #[must_use]
    pub fn config(&self) -> &MockConfig {
        &self.inner.config
    }

    /// Mock `name` with the default substitute, which returns `true`
    pub fn mock(&self, name: &str) -> Behavior {
        self.install(
            name,
            Rc::new(|_: &Receiver, _: &[Value]| -> MockResult<Value> {
                Ok(Value::Boolean(true))
            }),
            None,
        )
    }

    /// Mock `name` with a substitute whose self-reference is the behavior
    pub fn mock_with<F>(&self, name: &str, substitute: F) -> Behavior
    where
        F: Fn(&Receiver, &[Value]) -> MockResult<Value> + 'static,
    {
        self.install(name, Rc::new(substitute), None)
    }

    /// Mock `name` with a substitute whose self-reference is `context`.
    ///
    /// The mock holds instance and class contexts weakly. Calls made after
    /// the context is dropped fail with [`MockError::ContextDropped`].
    pub fn mock_with_context<F>(
        &self,
        name: &str,
        substitute: F,
        context: impl Into<Receiver>,
    ) -> Behavior
    where
        F: Fn(&Receiver, &[Value]) -> MockResult<Value> + 'static,
    {
        self.install(name, Rc::new(substitute), Some(context.into()))
    }

    /// Restore the saved original of `name`. Unknown names are ignored.
    pub fn unmock(&self, name: &str) {
        let saved = self.inner.originals.borrow_mut().remove(name);
        match saved {
            Some(saved) => {
                tracing::debug!(
                    class = self.inner.target.name(),
                    method = name,
                    kind = saved.kind.name(),
                    existed = saved.implementation.is_some(),
                    "restoring original"
                );
                self.inner
                    .target
                    .restore(saved.kind, name, saved.implementation);
            }
            None => {
                tracing::trace!(
                    class = self.inner.target.name(),
                    method = name,
                    "unmock of a name with no active mock"
                );
            }
        }
    }

    /// Restore every mocked name
    pub fn unmock_all(&self) {
        let names: Vec<String> = self.inner.originals.borrow().keys().cloned().collect();
        for name in names {
            self.unmock(&name);
        }
    }

    /// Whether `name` has an active mock
    #[must_use]
    pub fn is_mocked(&self, name: &str) -> bool {
        self.inner.originals.borrow().contains_key(name)
    }

    /// Sorted names with an active mock
    #[must_use]
    pub fn mocked_methods(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.originals.borrow().keys().cloned().collect();
        names.sort();
        names
    }

    /// Namespace `mock` would target for `name`.
    ///
    /// A name present in only one namespace resolves there. A name present in
    /// both follows [`MockConfig::precedence`]. A name present in neither
    /// resolves to the instance namespace.
    #[must_use]
    pub fn resolve_kind(&self, name: &str) -> MemberKind {
        let target = &self.inner.target;
        let has_static = target.has_member(MemberKind::Static, name);
        let has_instance = target.has_member(MemberKind::Instance, name);
        match (self.inner.config.precedence, has_static, has_instance) {
            (MemberPrecedence::StaticFirst, true, _)
            | (MemberPrecedence::InstanceFirst, true, false) => MemberKind::Static,
            _ => MemberKind::Instance,
        }
    }

    /// Guard that unmocks everything when dropped
    pub fn guard(&self) -> MockGuard {
        MockGuard {
            interceptor: self.clone(),
        }
    }

    fn install(&self, name: &str, substitute: Method, context: Option<Receiver>) -> Behavior {
        let target = &self.inner.target;
        let kind = {
            let mut originals = self.inner.originals.borrow_mut();
            match originals.get(name) {
                Some(saved) => {
                    tracing::debug!(
                        class = target.name(),
                        method = name,
                        "replacing active mock"
                    );
                    saved.kind
                }
                None => {
                    let kind = self.resolve_kind(name);
                    tracing::debug!(
                        class = target.name(),
                        method = name,
                        kind = kind.name(),
                        "installing mock"
                    );
                    let _ = originals.insert(
                        name.to_string(),
                        SavedMethod {
                            kind,
                            implementation: target.member(kind, name),
                        },
                    );
                    kind
                }
            }
        };

        let owner: Weak<InterceptorInner> = Rc::downgrade(&self.inner);
        let released = name.to_string();
        let behavior = Behavior::new(
            name,
            substitute,
            self.inner.config.record_calls,
            move || match owner.upgrade() {
                Some(inner) => Interceptor { inner }.unmock(&released),
                None => tracing::warn!(
                    method = %released,
                    "release after the interceptor was dropped"
                ),
            },
        );

        let active = behavior.clone();
        let context = context.as_ref().map(Receiver::downgrade);
        let wrapper: Method = Rc::new(move |_: &Receiver, args: &[Value]| -> MockResult<Value> {
            let receiver = match &context {
                Some(bound) => bound.upgrade().ok_or_else(|| MockError::ContextDropped {
                    method: active.method_name().to_string(),
                })?,
                None => Receiver::Behavior(active.clone()),
            };
            active.dispatch(&receiver, args)
        });
        let _ = target.install(kind, name, wrapper);
        behavior
    }
}

/// Unmocks every name of its interceptor when dropped
#[derive(Debug)]
#[must_use = "the mocks are removed as soon as the guard is dropped"]
pub struct MockGuard {
    interceptor: Interceptor,
}

impl MockGuard {
    /// The guarded interceptor
    pub fn interceptor(&self) -> &Interceptor {
        &self.interceptor
    }
}

impl Drop for MockGuard {
    fn drop(&mut self) {
        self.interceptor.unmock_all();
    }
}
