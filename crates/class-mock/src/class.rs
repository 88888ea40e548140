//! Class Dispatch Tables
//!
//! A [`Class`] is an explicit member table with two namespaces: instance-level
//! methods and type-level (static) methods. Production code calls through the
//! table at call time, so whatever implementation is installed when the call
//! happens is the one that runs. That is the seam the interceptor swaps
//! implementations in and out of.
//!
//! ## Example
//!
//! ```rust,ignore
//! let greeter = Class::builder("Greeter")
//!     .method("greet", |_this, args| Ok(Value::text(format!("hi {}", args[0]))))
//!     .static_method("create", |_class, _args| Ok(Value::None))
//!     .build();
//!
//! let instance = greeter.instantiate();
//! instance.call("greet", &[Value::from("bob")])?;
//! ```

use crate::behavior::Behavior;
use crate::result::{MockError, MockResult};
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

/// Implementation stored in a member table
pub type Method = Rc<dyn Fn(&Receiver, &[Value]) -> MockResult<Value>>;

/// Namespace a member lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MemberKind {
    /// Instance-level method, called on an [`Instance`]
    Instance,
    /// Type-level method, called on the [`Class`] itself
    Static,
}

impl MemberKind {
    /// Display name
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Instance => "instance",
            Self::Static => "static",
        }
    }
}

struct ClassInner {
    name: String,
    instance_methods: RefCell<HashMap<String, Method>>,
    static_methods: RefCell<HashMap<String, Method>>,
}

/// Shared handle to a class member table
#[derive(Clone)]
pub struct Class {
    inner: Rc<ClassInner>,
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Class")
            .field("name", &self.inner.name)
            .field("instance_methods", &self.member_names(MemberKind::Instance))
            .field("static_methods", &self.member_names(MemberKind::Static))
            .finish()
    }
}

impl Class {
    /// Start building a class
    #[must_use]
    pub fn builder(name: &str) -> ClassBuilder {
        ClassBuilder::new(name)
    }

    /// Class name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Create an instance that dispatches through this class's table
    #[must_use]
    pub fn instantiate(&self) -> Instance {
        Instance {
            inner: Rc::new(InstanceInner {
                class: self.clone(),
                fields: RefCell::new(HashMap::new()),
            }),
        }
    }

    /// Call a static method
    pub fn call_static(&self, name: &str, args: &[Value]) -> MockResult<Value> {
        let method = self.lookup(MemberKind::Static, name)?;
        method(&Receiver::Class(self.clone()), args)
    }

    /// Whether a member exists in the given namespace
    #[must_use]
    pub fn has_member(&self, kind: MemberKind, name: &str) -> bool {
        self.table(kind).borrow().contains_key(name)
    }

    /// Sorted member names of a namespace
    #[must_use]
    pub fn member_names(&self, kind: MemberKind) -> Vec<String> {
        let mut names: Vec<String> = self.table(kind).borrow().keys().cloned().collect();
        names.sort();
        names
    }

    /// Whether two handles point at the same class
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Current implementation of a member
    #[must_use]
    pub fn member(&self, kind: MemberKind, name: &str) -> Option<Method> {
        self.table(kind).borrow().get(name).cloned()
    }

    /// Replace a member, returning the previous implementation
    pub(crate) fn install(&self, kind: MemberKind, name: &str, method: Method) -> Option<Method> {
        self.table(kind)
            .borrow_mut()
            .insert(name.to_string(), method)
    }

    /// Put back a saved implementation; `None` removes the member
    pub(crate) fn restore(&self, kind: MemberKind, name: &str, original: Option<Method>) {
        let mut table = self.table(kind).borrow_mut();
        match original {
            Some(method) => {
                let _ = table.insert(name.to_string(), method);
            }
            None => {
                let _ = table.remove(name);
            }
        }
    }

    // The borrow is released before the method runs so bodies may re-enter the table.
    fn lookup(&self, kind: MemberKind, name: &str) -> MockResult<Method> {
        self.member(kind, name)
            .ok_or_else(|| MockError::NoSuchMethod {
                class: self.inner.name.clone(),
                name: name.to_string(),
            })
    }

    fn table(&self, kind: MemberKind) -> &RefCell<HashMap<String, Method>> {
        match kind {
            MemberKind::Instance => &self.inner.instance_methods,
            MemberKind::Static => &self.inner.static_methods,
        }
    }
}

/// Builder for [`Class`]
pub struct ClassBuilder {
    name: String,
    instance_methods: HashMap<String, Method>,
    static_methods: HashMap<String, Method>,
}

impl fmt::Debug for ClassBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassBuilder")
            .field("name", &self.name)
            .field("instance_count", &self.instance_methods.len())
            .field("static_count", &self.static_methods.len())
            .finish()
    }
}

impl ClassBuilder {
    /// Create a builder for a named class
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            instance_methods: HashMap::new(),
            static_methods: HashMap::new(),
        }
    }

    /// Add an instance-level method
    #[must_use]
    pub fn method<F>(mut self, name: &str, f: F) -> Self
    where
        F: Fn(&Receiver, &[Value]) -> MockResult<Value> + 'static,
    {
        let _ = self.instance_methods.insert(name.to_string(), Rc::new(f));
        self
    }

    /// Add a type-level method
    #[must_use]
    pub fn static_method<F>(mut self, name: &str, f: F) -> Self
    where
        F: Fn(&Receiver, &[Value]) -> MockResult<Value> + 'static,
    {
        let _ = self.static_methods.insert(name.to_string(), Rc::new(f));
        self
    }

    /// Build the class
    #[must_use]
    pub fn build(self) -> Class {
        Class {
            inner: Rc::new(ClassInner {
                name: self.name,
                instance_methods: RefCell::new(self.instance_methods),
                static_methods: RefCell::new(self.static_methods),
            }),
        }
    }
}

struct InstanceInner {
    class: Class,
    fields: RefCell<HashMap<String, Value>>,
}

/// Shared handle to an instance of a [`Class`]
#[derive(Clone)]
pub struct Instance {
    inner: Rc<InstanceInner>,
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("class", &self.inner.class.name())
            .field("field_count", &self.inner.fields.borrow().len())
            .finish()
    }
}

impl Instance {
    /// The class this instance dispatches through
    #[must_use]
    pub fn class(&self) -> &Class {
        &self.inner.class
    }

    /// Call an instance method
    pub fn call(&self, name: &str, args: &[Value]) -> MockResult<Value> {
        let method = self.inner.class.lookup(MemberKind::Instance, name)?;
        method(&Receiver::Instance(self.clone()), args)
    }

    /// Read a field; missing fields read as [`Value::None`]
    #[must_use]
    pub fn get(&self, field: &str) -> Value {
        self.inner
            .fields
            .borrow()
            .get(field)
            .cloned()
            .unwrap_or_default()
    }

    /// Write a field
    pub fn set(&self, field: &str, value: impl Into<Value>) {
        let _ = self
            .inner
            .fields
            .borrow_mut()
            .insert(field.to_string(), value.into());
    }

    /// Whether two handles point at the same instance
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

/// Self-reference passed to a method body
#[derive(Debug, Clone)]
pub enum Receiver {
    /// Instance the method was called on, or a bound context
    Instance(Instance),
    /// Class a static method was called on
    Class(Class),
    /// The mock's own behavior, the default self-reference of a substitute
    Behavior(Behavior),
}

impl Receiver {
    /// Call a member through the receiver's live table
    pub fn call(&self, name: &str, args: &[Value]) -> MockResult<Value> {
        match self {
            Self::Instance(instance) => instance.call(name, args),
            Self::Class(class) => class.call_static(name, args),
            Self::Behavior(_) => Err(MockError::NoSuchMethod {
                class: "Behavior".to_string(),
                name: name.to_string(),
            }),
        }
    }

    /// Borrow as an instance
    #[must_use]
    pub const fn as_instance(&self) -> Option<&Instance> {
        match self {
            Self::Instance(instance) => Some(instance),
            _ => None,
        }
    }

    /// Borrow as a class
    #[must_use]
    pub const fn as_class(&self) -> Option<&Class> {
        match self {
            Self::Class(class) => Some(class),
            _ => None,
        }
    }

    /// Borrow as a behavior
    #[must_use]
    pub const fn as_behavior(&self) -> Option<&Behavior> {
        match self {
            Self::Behavior(behavior) => Some(behavior),
            _ => None,
        }
    }

    /// Non-owning form, so a bound mock does not keep its context alive
    pub(crate) fn downgrade(&self) -> WeakReceiver {
        WeakReceiver(match self {
            Self::Instance(instance) => WeakTarget::Instance(Rc::downgrade(&instance.inner)),
            Self::Class(class) => WeakTarget::Class(Rc::downgrade(&class.inner)),
            Self::Behavior(behavior) => WeakTarget::Behavior(behavior.clone()),
        })
    }
}

enum WeakTarget {
    Instance(Weak<InstanceInner>),
    Class(Weak<ClassInner>),
    Behavior(Behavior),
}

/// Receiver held without ownership of instances and classes
pub(crate) struct WeakReceiver(WeakTarget);

impl WeakReceiver {
    /// The receiver, if it is still alive
    pub(crate) fn upgrade(&self) -> Option<Receiver> {
        match &self.0 {
            WeakTarget::Instance(inner) => inner
                .upgrade()
                .map(|inner| Receiver::Instance(Instance { inner })),
            WeakTarget::Class(inner) => inner
                .upgrade()
                .map(|inner| Receiver::Class(Class { inner })),
            WeakTarget::Behavior(behavior) => Some(Receiver::Behavior(behavior.clone())),
        }
    }
}

impl From<Instance> for Receiver {
    fn from(instance: Instance) -> Self {
        Self::Instance(instance)
    }
}

impl From<&Instance> for Receiver {
    fn from(instance: &Instance) -> Self {
        Self::Instance(instance.clone())
    }
}

impl From<Class> for Receiver {
    fn from(class: Class) -> Self {
        Self::Class(class)
    }
}

impl From<&Class> for Receiver {
    fn from(class: &Class) -> Self {
        Self::Class(class.clone())
    }
}
