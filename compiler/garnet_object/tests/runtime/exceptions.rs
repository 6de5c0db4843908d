use crate::common::{call, class_value, def, fcall, local, names, runtime, Scripted};
use garnet_object::{ClassLike, EvalResult, ExceptionKind, Runtime, Value};
use pretty_assertions::assert_eq;

fn exception_class(rt: &Runtime, kind: ExceptionKind) -> Value {
    class_value(rt.core().exception(kind))
}

/// `begin ... rescue klass => e ... end`: the rescued value, or the error
/// when the clause does not match.
fn rescue(rt: &Runtime, result: EvalResult, klass: &Value) -> EvalResult {
    let err = match result {
        Ok(value) => return Ok(value),
        Err(err) => err,
    };
    let target = klass.as_class_like().cloned().unwrap();
    if rt.is_a(&err.exception_value(), &target) {
        Ok(err.exception_value())
    } else {
        Err(err)
    }
}

#[test]
fn lattice_is_visible_to_guest_code() {
    let scripted = Scripted::new();
    let rt = runtime(&scripted);
    let ctx = rt.top_context();
    let ancestors = call(
        &ctx,
        &exception_class(&rt, ExceptionKind::NoMethodError),
        "ancestors",
        &[],
    )
    .unwrap();
    assert_eq!(
        names(&ancestors),
        vec![
            "NoMethodError",
            "NameError",
            "StandardError",
            "Exception",
            "Object",
            "Kernel",
            "BasicObject"
        ]
    );
    let parent = call(
        &ctx,
        &exception_class(&rt, ExceptionKind::SystemStackError),
        "superclass",
        &[],
    )
    .unwrap();
    assert_eq!(parent.inspect(), "Exception");
}

#[test]
fn exception_new_defaults_message_to_class_name() {
    let scripted = Scripted::new();
    let rt = runtime(&scripted);
    let ctx = rt.top_context();
    let argument_error = exception_class(&rt, ExceptionKind::ArgumentError);

    let plain = call(&ctx, &argument_error, "new", &[]).unwrap();
    assert_eq!(call(&ctx, &plain, "message", &[]).unwrap().as_str(), Some("ArgumentError"));
    let custom = call(&ctx, &argument_error, "new", &[Value::string("bad")]).unwrap();
    assert_eq!(call(&ctx, &custom, "to_s", &[]).unwrap().as_str(), Some("bad"));
    assert_eq!(
        call(&ctx, &custom, "inspect", &[]).unwrap().as_str(),
        Some("ArgumentError: bad")
    );
    let symbolic = call(&ctx, &argument_error, "new", &[Value::Integer(4)]).unwrap();
    assert_eq!(call(&ctx, &symbolic, "message", &[]).unwrap().as_str(), Some("4"));

    let via_exception = call(&ctx, &argument_error, "exception", &[Value::string("x")]).unwrap();
    assert_eq!(via_exception.inspect(), "ArgumentError: x");
}

#[test]
fn exception_method_copies_only_with_a_message() {
    let scripted = Scripted::new();
    let rt = runtime(&scripted);
    let ctx = rt.top_context();
    let original = call(
        &ctx,
        &exception_class(&rt, ExceptionKind::RuntimeError),
        "new",
        &[Value::string("first")],
    )
    .unwrap();

    let same = call(&ctx, &original, "exception", &[]).unwrap();
    assert!(same.is_identical(&original));
    let copy = call(&ctx, &original, "exception", &[Value::string("second")]).unwrap();
    assert!(!copy.is_identical(&original));
    assert_eq!(copy.inspect(), "RuntimeError: second");
    assert_eq!(original.inspect(), "RuntimeError: first");
    let equal = call(&ctx, &original, "==", &[copy]).unwrap();
    assert!(!equal.is_truthy());
}

#[test]
fn guest_subclasses_raise_and_rescue() {
    let scripted = Scripted::new();
    let failing = scripted.node(|ctx| {
        let klass = ctx
            .runtime()
            .constant("ValidationError")
            .map(|c| c.to_value())
            .unwrap_or_default();
        ctx.call_function(ctx.intern("raise"), &[klass, Value::string("too short")], None)
    });
    let rt = runtime(&scripted);
    let ctx = rt.top_context();
    let standard = rt.core().exception(ExceptionKind::StandardError).clone();
    let validation = rt.define_class("ValidationError", Some(&standard)).unwrap();
    let form = rt.define_class("Form", None).unwrap();
    def(&ctx, &ClassLike::Class(form.clone()), "validate", &[], failing);
    let f = call(&ctx, &class_value(&form), "new", &[]).unwrap();

    let err = call(&ctx, &f, "validate", &[]).unwrap_err();
    assert_eq!(err.exception().inspect(), "ValidationError: too short");
    assert!(err.is_a(ExceptionKind::StandardError));

    let rescued = rescue(&rt, call(&ctx, &f, "validate", &[]), &class_value(&validation)).unwrap();
    assert_eq!(call(&ctx, &rescued, "message", &[]).unwrap().as_str(), Some("too short"));
    let rescued = rescue(
        &rt,
        call(&ctx, &f, "validate", &[]),
        &exception_class(&rt, ExceptionKind::StandardError),
    );
    assert!(rescued.is_ok());
    let unmatched = rescue(
        &rt,
        call(&ctx, &f, "validate", &[]),
        &exception_class(&rt, ExceptionKind::TypeError),
    );
    assert!(unmatched.is_err());
}

#[test]
fn builtin_errors_are_rescued_by_their_classes() {
    let scripted = Scripted::new();
    let rt = runtime(&scripted);
    let ctx = rt.top_context();
    let missing = call(&ctx, &Value::Nil, "upcase", &[]);
    let rescued = rescue(
        &rt,
        missing,
        &exception_class(&rt, ExceptionKind::NameError),
    )
    .unwrap();
    assert_eq!(
        call(&ctx, &rescued, "class", &[]).unwrap().inspect(),
        "NoMethodError"
    );

    let divided = call(&ctx, &Value::Integer(1), "/", &[Value::Integer(0)]);
    let rescued = rescue(
        &rt,
        divided,
        &exception_class(&rt, ExceptionKind::StandardError),
    )
    .unwrap();
    assert_eq!(rescued.inspect(), "ZeroDivisionError: divided by 0");
}

#[test]
fn raise_reraises_a_rescued_exception() {
    let scripted = Scripted::new();
    let reraise = scripted.node(|ctx| {
        let caught = local(ctx, "caught");
        ctx.call_function(ctx.intern("raise"), &[caught], None)
    });
    let rt = runtime(&scripted);
    let ctx = rt.top_context();
    let first = fcall(&ctx, "raise", &[Value::string("once")]).unwrap_err();
    ctx.env().set(ctx.intern("caught"), first.exception_value());

    let again = ctx.eval(reraise).unwrap_err();
    assert!(again.exception_value().is_identical(&first.exception_value()));
}

#[test]
fn raise_with_a_class_that_is_not_an_exception() {
    let scripted = Scripted::new();
    let rt = runtime(&scripted);
    let ctx = rt.top_context();
    let plain = class_value(&rt.define_class("Plain", None).unwrap());
    let err = fcall(&ctx, "raise", &[plain, Value::string("no")]).unwrap_err();
    assert_eq!(
        err.exception().inspect(),
        "TypeError: exception class/object expected"
    );
}
