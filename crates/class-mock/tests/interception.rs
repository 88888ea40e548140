//! End-to-end interception tests
//!
//! Drive a class through the public API the way a test suite would: mock,
//! call through production-style code, verify, restore.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use class_mock::{ArgKind, ArgSpec, Class, Interceptor, MockError, Value};
use serde_json::json;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::TRACE)
        .try_init();
}

fn test_class() -> Class {
    Class::builder("TestClass")
        .method("myMethod", |_, _| Err(MockError::thrown("I should be overriden")))
        .method("myOtherMethod", |_, _| {
            Err(MockError::thrown("I totally should be called"))
        })
        .method("proxyMethod", |this, _| {
            let instance = this.as_instance().expect("called on an instance");
            instance.set("meow", 5);
            instance.call("myMethod", &[])
        })
        .build()
}

fn assert_original(instance: &class_mock::Instance) {
    let err = instance.call("myMethod", &[]).unwrap_err();
    assert!(err.to_string().contains("I should be overriden"));
}

// ============================================================================
// Construction
// ============================================================================

#[test]
fn test_rejects_instantiated_class() {
    let class = test_class();
    let err = Interceptor::new(class.instantiate()).unwrap_err();
    assert!(err.to_string().contains("un-instantiated classes"));
}

// ============================================================================
// Mock / unmock lifecycle
// ============================================================================

#[test]
fn test_mock_and_unmock_cycle() {
    init_tracing();
    let class = test_class();
    let instance = class.instantiate();
    let interceptor = Interceptor::new(&class).unwrap();

    assert_original(&instance);

    let _ = interceptor.mock_with("myMethod", |_, _| Ok(Value::None));
    assert!(instance.call("myMethod", &[]).is_ok());

    interceptor.unmock("myMethod");
    assert_original(&instance);

    let method_mock = interceptor.mock_with("myMethod", |_, _| Ok(Value::None));
    assert!(instance.call("myMethod", &[]).is_ok());

    method_mock.release();
    assert_original(&instance);

    let _ = interceptor.mock_with("myMethod", |_, _| Ok(Value::None));
    assert!(instance.call("myMethod", &[]).is_ok());

    interceptor.unmock_all();
    assert_original(&instance);
}

#[test]
fn test_layered_mocks_restore_true_original() {
    let class = test_class();
    let instance = class.instantiate();
    let interceptor = Interceptor::new(&class).unwrap();

    let first = interceptor.mock("myMethod").returns("first");
    let _second = interceptor.mock("myMethod").returns("second");
    assert_eq!(
        instance.call("myMethod", &[]).unwrap(),
        Value::from("second"),
    );

    // Any release drops the whole name, not just the newer layer.
    first.release();
    assert_original(&instance);
    assert!(!interceptor.is_mocked("myMethod"));
}

// ============================================================================
// Argument verification
// ============================================================================

#[test]
fn test_argument_rules() {
    init_tracing();
    let class = test_class();
    let instance = class.instantiate();
    let interceptor = Interceptor::new(&class).unwrap();

    let _ = interceptor
        .mock_with("myMethod", |_, _| Ok(Value::from("I ran fine")))
        .expect_arguments(vec![
            ArgSpec::of(ArgKind::Text).value("Hello, World!"),
            ArgSpec::any().value(1),
            ArgSpec::of(ArgKind::Text).value("Sausages").optional(),
        ])
        .unwrap();

    let err = instance.call("myMethod", &[]).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("Expected 2 arguments but received 0"));

    let err = instance
        .call("myMethod", &[Value::from("Hello, World!")])
        .unwrap_err();
    let message = err.to_string();
    assert!(message.contains("Expected 2 arguments but received 1"));

    let err = instance
        .call("myMethod", &[Value::json(json!({})), Value::from("e")])
        .unwrap_err();
    assert!(err.to_string().contains("expected string got object"));

    let err = instance
        .call("myMethod", &[Value::from("Hello, John!"), Value::from(1)])
        .unwrap_err();
    assert!(err
        .to_string()
        .contains("'Hello, World!' deepEqual 'Hello, John!'"));

    let err = instance
        .call(
            "myMethod",
            &[Value::from("Hello, World!"), Value::from(1), Value::from("Bacon")],
        )
        .unwrap_err();
    assert!(err.to_string().contains("'Sausages' deepEqual 'Bacon'"));

    assert_eq!(
        instance
            .call("myMethod", &[Value::from("Hello, World!"), Value::from(1)])
            .unwrap(),
        Value::from("I ran fine")
    );
    interceptor.unmock_all();
}

#[test]
fn test_deep_object_comparison() {
    let class = test_class();
    let instance = class.instantiate();
    let interceptor = Interceptor::new(&class).unwrap();

    let _ = interceptor
        .mock_with("myMethod", |_, _| Ok(Value::from("I ran fine")))
        .expect_arguments(vec![
            ArgSpec::of(ArgKind::Object).value(json!({"num": 1, "arr": [1, 2, 3]})),
            ArgSpec::of(ArgKind::Object).value(json!(["a", "b", "c"])),
        ])
        .unwrap();

    let err = instance
        .call(
            "myMethod",
            &[
                Value::json(json!({"num": 1, "arr": [1, 2, 3]})),
                Value::json(json!(["a", "b"])),
            ],
        )
        .unwrap_err();
    assert!(matches!(err, MockError::ValueMismatch { index: 1, .. }));
    assert!(err.to_string().contains("deepEqual"));

    assert!(instance
        .call(
            "myMethod",
            &[
                Value::json(json!({"arr": [1, 2, 3], "num": 1})),
                Value::json(json!(["a", "b", "c"])),
            ],
        )
        .is_ok());
}

#[test]
fn test_unexpected_arguments_rejected() {
    let class = test_class();
    let instance = class.instantiate();
    let interceptor = Interceptor::new(&class).unwrap();

    let _ = interceptor
        .mock_with("myMethod", |_, _| Ok(Value::from("I ran fine")))
        .expect_arguments(vec![ArgSpec::any(), ArgSpec::any().optional()])
        .unwrap();

    let one = Value::from(1);
    let two = Value::from(2);
    let three = Value::from(3);
    assert!(instance.call("myMethod", &[]).is_err());
    assert!(instance.call("myMethod", &[one.clone()]).is_ok());
    let pair = [one.clone(), two.clone()];
    assert!(instance.call("myMethod", &pair).is_ok());
    let err = instance.call("myMethod", &[one, two, three]).unwrap_err();
    assert!(err.to_string().contains("too many arguments"));
}

#[test]
fn test_pattern_rule() {
    let class = test_class();
    let instance = class.instantiate();
    let interceptor = Interceptor::new(&class).unwrap();

    let _ = interceptor
        .mock("myMethod")
        .expect_arguments(vec![ArgSpec::pattern("(?i)smith").unwrap()])
        .unwrap()
        .returns("Welcome John Smith");

    assert_eq!(
        instance.call("myMethod", &[Value::from("john smith")]).unwrap(),
        Value::from("Welcome John Smith")
    );
    let err = instance
        .call("myMethod", &[Value::from("john doe")])
        .unwrap_err();
    assert!(err.to_string().contains("/(?i)smith/"));
    assert!(err.to_string().contains("john doe"));
}

// ============================================================================
// Outcomes
// ============================================================================

#[tokio::test]
async fn test_resolved_deferred() {
    let class = test_class();
    let instance = class.instantiate();
    let interceptor = Interceptor::new(&class).unwrap();

    let _ = interceptor
        .mock("myMethod")
        .resolves("Such Promise!")
        .expect_arguments(vec![ArgSpec::of(ArgKind::Text)])
        .unwrap();

    let deferred = instance
        .call("myMethod", &[Value::from("whatever")])
        .unwrap()
        .into_deferred()
        .expect("deferred outcome");
    assert_eq!(deferred.await.unwrap(), Value::from("Such Promise!"));
}

#[tokio::test]
async fn test_rejected_deferred() {
    let class = test_class();
    let instance = class.instantiate();
    let interceptor = Interceptor::new(&class).unwrap();

    let _ = interceptor
        .mock("myMethod")
        .rejects("Such Promise!")
        .expect_arguments(vec![ArgSpec::of(ArgKind::Number)])
        .unwrap();

    let deferred = instance
        .call("myMethod", &[Value::from(5)])
        .unwrap()
        .into_deferred()
        .expect("deferred outcome");
    assert_eq!(deferred.await.unwrap_err(), Value::from("Such Promise!"));
}

#[test]
fn test_deferred_not_produced_when_verification_fails() {
    let class = test_class();
    let instance = class.instantiate();
    let interceptor = Interceptor::new(&class).unwrap();

    let _ = interceptor
        .mock("myMethod")
        .resolves("never")
        .expect_arguments(vec![ArgSpec::of(ArgKind::Number)])
        .unwrap();

    let err = instance.call("myMethod", &[Value::from("5")]).unwrap_err();
    assert!(err.is_verification_failure());
}

#[test]
fn test_throws() {
    let class = test_class();
    let instance = class.instantiate();
    let interceptor = Interceptor::new(&class).unwrap();

    let _ = interceptor
        .mock("myMethod")
        .throws("Such Error!")
        .expect_arguments(vec![ArgSpec::of(ArgKind::Object)])
        .unwrap();

    let err = instance
        .call("myMethod", &[Value::json(json!({}))])
        .unwrap_err();
    assert_eq!(err.thrown_value(), Some(&Value::from("Such Error!")));
}

#[test]
fn test_returns_anything() {
    let class = test_class();
    let instance = class.instantiate();
    let interceptor = Interceptor::new(&class).unwrap();

    let _ = interceptor.mock("myMethod").returns(json!([1, 2, 3]));
    assert_eq!(
        instance.call("myMethod", &[]).unwrap(),
        Value::json(json!([1, 2, 3]))
    );
}

// ============================================================================
// Multiple methods and bound contexts
// ============================================================================

#[test]
fn test_two_mocked_methods_through_context() {
    let class = test_class();
    let instance = class.instantiate();
    let interceptor = Interceptor::new(&class).unwrap();

    let _ = interceptor.mock_with_context(
        "myMethod",
        |this, _| this.call("myOtherMethod", &[]),
        &instance,
    );
    let _ = interceptor.mock("myOtherMethod").returns("Multiple methods!");

    assert_eq!(
        instance.call("myMethod", &[]).unwrap(),
        Value::from("Multiple methods!")
    );
}

#[test]
fn test_mocked_method_called_from_unmocked_method() {
    let class = test_class();
    let instance = class.instantiate();
    let interceptor = Interceptor::new(&class).unwrap();

    let _ = interceptor.mock_with_context(
        "myMethod",
        |this, _| Ok(this.as_instance().expect("bound to instance").get("meow")),
        &instance,
    );
    assert_eq!(instance.call("proxyMethod", &[]).unwrap(), Value::from(5));
}

#[test]
fn test_context_wins_over_calling_instance() {
    let class = test_class();
    let caller = class.instantiate();
    let bound = class.instantiate();
    let interceptor = Interceptor::new(&class).unwrap();

    let expected = bound.clone();
    let _ = interceptor.mock_with_context(
        "myMethod",
        move |this, _| {
            Ok(Value::from(
                this.as_instance().is_some_and(|i| i.ptr_eq(&expected)),
            ))
        },
        &bound,
    );
    assert_eq!(caller.call("myMethod", &[]).unwrap(), Value::from(true));
    interceptor.unmock_all();
}

#[test]
fn test_call_recording() {
    let class = test_class();
    let instance = class.instantiate();
    let interceptor = Interceptor::new(&class).unwrap();

    let other = interceptor.mock("myOtherMethod").returns(0);
    other.assert_not_called().unwrap();

    let _ = instance.call("myOtherMethod", &[Value::from("a")]);
    let _ = instance.call("myOtherMethod", &[Value::from("b")]);
    other.assert_called_times(2).unwrap();
    assert_eq!(other.calls()[1], vec![Value::from("b")]);
}

#[test]
fn test_guard_cleans_up_after_panic() {
    let class = test_class();
    let interceptor = Interceptor::new(&class).unwrap();

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        let _guard = interceptor.guard();
        let _ = interceptor.mock("myMethod").returns("mocked");
        panic!("assertion inside the test body");
    }));
    assert!(result.is_err());
    assert!(interceptor.mocked_methods().is_empty());
    assert_original(&class.instantiate());
}
