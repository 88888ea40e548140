//! class-mock: Method Interception for Tests
//!
//! Replace members of a class for the duration of a test, verify the
//! arguments they are called with, choose what they produce, and put the
//! originals back afterwards.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐  mock(name)   ┌──────────────┐  install   ┌──────────────┐
//! │  Test code   │──────────────►│ Interceptor  │───────────►│ Class table  │
//! │              │◄──────────────│ (originals)  │◄───────────│ (instance +  │
//! └──────────────┘   Behavior    └──────────────┘  restore   │  static)     │
//!        │                                                   └──────┬───────┘
//!        │ expect_arguments / returns / throws /                    │ call
//!        │ resolves / rejects                                       ▼
//!        │                       ┌──────────────┐  verify    ┌──────────────┐
//!        └──────────────────────►│   Behavior   │◄───────────│   Wrapper    │
//!                                │ checks+outcome│──outcome──►│              │
//!                                └──────────────┘            └──────────────┘
//! ```
//!
//! Production code calls through [`Class`] and [`Instance`] handles, so a
//! member swapped in by an [`Interceptor`] is observed by every holder of the
//! class immediately.
//!
//! # Example
//!
//! ```
//! use class_mock::{ArgKind, ArgSpec, Class, Interceptor, Value};
//!
//! let greeter = Class::builder("Greeter")
//!     .method("greet", |_this, _args| Ok(Value::from("hello")))
//!     .build();
//! let instance = greeter.instantiate();
//!
//! let interceptor = Interceptor::new(&greeter)?;
//! let greet = interceptor
//!     .mock("greet")
//!     .expect_arguments(vec![ArgSpec::of(ArgKind::Text).value("John")])?
//!     .returns("Welcome John");
//!
//! assert_eq!(instance.call("greet", &["John".into()])?, Value::from("Welcome John"));
//! assert!(instance.call("greet", &[]).is_err());
//! greet.assert_called_times(1)?;
//!
//! interceptor.unmock_all();
//! assert_eq!(instance.call("greet", &[])?, Value::from("hello"));
//! # Ok::<(), class_mock::MockError>(())
//! ```

#![warn(missing_docs)]

pub mod args;
pub mod behavior;
pub mod class;
pub mod config;
pub mod interceptor;
mod result;
pub mod value;

pub use args::{ArgSpec, ArgumentRule};
pub use behavior::Behavior;
pub use class::{Class, ClassBuilder, Instance, MemberKind, Method, Receiver};
pub use config::{MemberPrecedence, MockConfig};
pub use interceptor::{Interceptor, MockGuard, MockTarget};
pub use result::{MockError, MockResult};
pub use value::{ArgKind, Callable, Deferred, Value};
