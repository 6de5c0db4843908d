use crate::common::{
    block, call, call_with_block, class_value, def, def_with, fcall, local, runtime, sym, Scripted,
};
use garnet_object::{ClassLike, ExceptionKind, Value, Visibility};
use pretty_assertions::assert_eq;

#[test]
fn send_reaches_private_methods_but_public_send_does_not() {
    let scripted = Scripted::new();
    let secret = scripted.node(|_| Ok(Value::string("secret")));
    let rt = runtime(&scripted);
    let ctx = rt.top_context();
    let class = rt.define_class("Safe", None).unwrap();
    def_with(&ctx, &ClassLike::Class(class.clone()), "code", secret, Visibility::Private);
    let safe = call(&ctx, &class_value(&class), "new", &[]).unwrap();

    let via_send = call(&ctx, &safe, "send", &[sym(&ctx, "code")]).unwrap();
    assert_eq!(via_send.as_str(), Some("secret"));
    let via_dunder = call(&ctx, &safe, "__send__", &[Value::string("code")]).unwrap();
    assert_eq!(via_dunder.as_str(), Some("secret"));

    let err = call(&ctx, &safe, "public_send", &[sym(&ctx, "code")]).unwrap_err();
    assert_eq!(
        err.exception().inspect(),
        "NoMethodError: private method 'code' called for #<Safe>:Safe"
    );
    let err = call(&ctx, &safe, "code", &[]).unwrap_err();
    assert_eq!(err.kind(), ExceptionKind::NoMethodError);
}

#[test]
fn send_forwards_arguments_and_checks_arity() {
    let scripted = Scripted::new();
    let add = scripted.node(|ctx| {
        let a = local(ctx, "a").as_integer().unwrap_or_default();
        let b = local(ctx, "b").as_integer().unwrap_or_default();
        Ok(Value::Integer(a + b))
    });
    let rt = runtime(&scripted);
    let ctx = rt.top_context();
    let class = rt.define_class("Adder", None).unwrap();
    def(&ctx, &ClassLike::Class(class.clone()), "add", &["a", "b"], add);
    let adder = call(&ctx, &class_value(&class), "new", &[]).unwrap();

    let sum = call(
        &ctx,
        &adder,
        "send",
        &[sym(&ctx, "add"), Value::Integer(2), Value::Integer(3)],
    )
    .unwrap();
    assert_eq!(sum.as_integer(), Some(5));

    let err = call(&ctx, &adder, "send", &[sym(&ctx, "add"), Value::Integer(2)]).unwrap_err();
    assert_eq!(
        err.exception().inspect(),
        "ArgumentError: wrong number of arguments (given 1, expected 2)"
    );
    let err = call(&ctx, &adder, "send", &[]).unwrap_err();
    assert_eq!(err.kind(), ExceptionKind::ArgumentError);
    let err = call(&ctx, &adder, "send", &[Value::Integer(1)]).unwrap_err();
    assert_eq!(err.exception().inspect(), "TypeError: 1 is not a symbol nor a string");
}

#[test]
fn protected_methods_are_reachable_from_kindred_objects() {
    let scripted = Scripted::new();
    let balance = scripted.node(|_| Ok(Value::Integer(100)));
    let compare = scripted.node(|ctx| {
        let other = local(ctx, "other");
        let theirs = ctx.send(&other, ctx.intern("balance"), &[], None)?;
        Ok(Value::Bool(theirs.as_integer() == Some(100)))
    });
    let rt = runtime(&scripted);
    let ctx = rt.top_context();
    let account = rt.define_class("Account", None).unwrap();
    let target = ClassLike::Class(account.clone());
    def_with(&ctx, &target, "balance", balance, Visibility::Protected);
    def(&ctx, &target, "same_as?", &["other"], compare);

    let a = call(&ctx, &class_value(&account), "new", &[]).unwrap();
    let b = call(&ctx, &class_value(&account), "new", &[]).unwrap();
    let same = call(&ctx, &a, "same_as?", std::slice::from_ref(&b)).unwrap();
    assert!(same.is_truthy());

    let err = call(&ctx, &b, "balance", &[]).unwrap_err();
    assert_eq!(
        err.message(),
        "protected method 'balance' called for #<Account>:Account"
    );
}

#[test]
fn private_methods_are_callable_without_receiver() {
    let scripted = Scripted::new();
    let helper = scripted.node(|_| Ok(Value::Integer(9)));
    let public_face = scripted.node(|ctx| ctx.call_function(ctx.intern("helper"), &[], None));
    let explicit_self = scripted.node(|ctx| {
        let this = ctx.receiver();
        ctx.send(&this, ctx.intern("helper"), &[], None)
    });
    let rt = runtime(&scripted);
    let ctx = rt.top_context();
    let class = rt.define_class("Widget", None).unwrap();
    let target = ClassLike::Class(class.clone());
    def_with(&ctx, &target, "helper", helper, Visibility::Private);
    def(&ctx, &target, "run", &[], public_face);
    def(&ctx, &target, "run_explicitly", &[], explicit_self);

    let widget = call(&ctx, &class_value(&class), "new", &[]).unwrap();
    assert_eq!(call(&ctx, &widget, "run", &[]).unwrap().as_integer(), Some(9));
    let err = call(&ctx, &widget, "run_explicitly", &[]).unwrap_err();
    assert!(err.message().starts_with("private method 'helper'"));
}

#[test]
fn respond_to_honours_visibility_and_respond_to_missing() {
    let scripted = Scripted::new();
    let body = scripted.node(|_| Ok(Value::Nil));
    let dynamic = scripted.node(|ctx| {
        let name = local(ctx, "name");
        Ok(Value::Bool(
            name.as_symbol().is_some_and(|s| s.as_str().starts_with("find_by_")),
        ))
    });
    let rt = runtime(&scripted);
    let ctx = rt.top_context();
    let class = rt.define_class("Finder", None).unwrap();
    let target = ClassLike::Class(class.clone());
    def(&ctx, &target, "visible", &[], body);
    def_with(&ctx, &target, "hidden", body, Visibility::Private);
    target.define_method(
        ctx.intern("respond_to_missing?"),
        garnet_object::Method::guest(
            vec![ctx.intern("name"), ctx.intern("include_all")],
            dynamic,
            target.env(),
            Visibility::Private,
        ),
    );
    let finder = call(&ctx, &class_value(&class), "new", &[]).unwrap();

    let responds = |args: &[Value]| {
        call(&ctx, &finder, "respond_to?", args)
            .unwrap()
            .is_truthy()
    };
    assert!(responds(&[sym(&ctx, "visible")]));
    assert!(responds(&[Value::string("visible")]));
    assert!(!responds(&[sym(&ctx, "hidden")]));
    assert!(responds(&[sym(&ctx, "hidden"), Value::Bool(true)]));
    assert!(responds(&[sym(&ctx, "find_by_name")]));
    assert!(!responds(&[sym(&ctx, "missing")]));

    let err = call(
        &ctx,
        &finder,
        "respond_to?",
        &[sym(&ctx, "visible"), Value::Integer(1)],
    )
    .unwrap_err();
    assert_eq!(err.kind(), ExceptionKind::ArgumentError);
}

#[test]
fn guest_method_missing_receives_name_then_arguments() {
    let scripted = Scripted::new();
    let ghost = scripted.node(|ctx| {
        let name = local(ctx, "name");
        let arg = local(ctx, "arg");
        Ok(Value::string(format!("{}({})", name.inspect(), arg.inspect())))
    });
    let rt = runtime(&scripted);
    let ctx = rt.top_context();
    let class = rt.define_class("Ghost", None).unwrap();
    def(
        &ctx,
        &ClassLike::Class(class.clone()),
        "method_missing",
        &["name", "arg"],
        ghost,
    );
    let g = call(&ctx, &class_value(&class), "new", &[]).unwrap();

    let result = call(&ctx, &g, "anything", &[Value::Integer(4)]).unwrap();
    assert_eq!(result.as_str(), Some(":anything(4)"));
    let result = call(&ctx, &g, "bare", &[]).unwrap();
    assert_eq!(result.as_str(), Some(":bare(nil)"));
}

#[test]
fn default_method_missing_names_the_receiver() {
    let scripted = Scripted::new();
    let rt = runtime(&scripted);
    let ctx = rt.top_context();

    let err = call(&ctx, &Value::Integer(3), "frobnicate", &[]).unwrap_err();
    assert_eq!(
        err.exception().inspect(),
        "NoMethodError: undefined method 'frobnicate' for 3:Integer"
    );
    let err = call(&ctx, &Value::Nil, "length", &[]).unwrap_err();
    assert_eq!(err.message(), "undefined method 'length' for nil:NilClass");
    let err = fcall(&ctx, "method_missing", &[Value::Integer(1)]).unwrap_err();
    assert_eq!(err.kind(), ExceptionKind::TypeError);
}

#[test]
fn tap_yields_receiver_and_returns_it() {
    let scripted = Scripted::new();
    let record = scripted.node(|ctx| {
        let seen = local(ctx, "x");
        ctx.env().set_global(ctx.intern("$tapped"), seen);
        Ok(Value::string("ignored"))
    });
    let rt = runtime(&scripted);
    let ctx = rt.top_context();

    let result = call_with_block(&ctx, &Value::Integer(8), "tap", &[], &["x"], record).unwrap();
    assert_eq!(result.as_integer(), Some(8));
    assert_eq!(
        rt.main_env()
            .get(rt.intern("$tapped"))
            .and_then(|v| v.as_integer()),
        Some(8)
    );

    let err = call(&ctx, &Value::Integer(8), "tap", &[]).unwrap_err();
    assert_eq!(
        err.exception().inspect(),
        "LocalJumpError: no block given (yield)"
    );
}

#[test]
fn block_given_answers_for_the_enclosing_method() {
    let scripted = Scripted::new();
    let asks = scripted.node(|ctx| ctx.call_function(ctx.intern("block_given?"), &[], None));
    let noop = scripted.node(|_| Ok(Value::Nil));
    let rt = runtime(&scripted);
    let ctx = rt.top_context();
    let class = rt.define_class("Asker", None).unwrap();
    def(&ctx, &ClassLike::Class(class.clone()), "ask", &[], asks);
    let asker = call(&ctx, &class_value(&class), "new", &[]).unwrap();

    let with_block = call_with_block(&ctx, &asker, "ask", &[], &[], noop).unwrap();
    assert!(matches!(with_block, Value::Bool(true)));
    let without = call(&ctx, &asker, "ask", &[]).unwrap();
    assert!(matches!(without, Value::Bool(false)));
}

#[test]
fn blocks_close_over_their_scope_and_self() {
    let scripted = Scripted::new();
    let body = scripted.node(|ctx| {
        ctx.env().set(ctx.intern("inner"), Value::Integer(0));
        Ok(Value::array(vec![
            local(ctx, "captured"),
            local(ctx, "a"),
            local(ctx, "b"),
            ctx.receiver(),
        ]))
    });
    let rt = runtime(&scripted);
    let ctx = rt.top_context();
    ctx.env().set(ctx.intern("captured"), Value::Integer(1));

    let blk = block(&ctx, &["a", "b"], body);
    let proc_value = blk.as_proc().unwrap();
    let returned = ctx.call_block(proc_value, &[Value::Integer(10)]).unwrap();
    assert_eq!(returned.inspect(), "[1, 10, nil, #<Object>]");
    assert!(ctx.env().get(ctx.intern("inner")).is_none());

    let arity = call(&ctx, &blk, "arity", &[]).unwrap();
    assert_eq!(arity.as_integer(), Some(2));
    let returned = call(
        &ctx,
        &blk,
        "call",
        &[Value::Integer(1), Value::Integer(2), Value::Integer(3)],
    )
    .unwrap();
    assert_eq!(returned.inspect(), "[1, 1, 2, #<Object>]");
}

#[test]
fn guest_recursion_overflows_into_system_stack_error() {
    let scripted = Scripted::new();
    let forever = scripted.node(|ctx| {
        let this = ctx.receiver();
        ctx.send(&this, ctx.intern("again"), &[], None)
    });
    let rt = garnet_object::Runtime::builder()
        .evaluator(std::rc::Rc::clone(&scripted))
        .max_call_depth(200)
        .build();
    let ctx = rt.top_context();
    let class = rt.define_class("Loop", None).unwrap();
    def(&ctx, &ClassLike::Class(class.clone()), "again", &[], forever);
    let looping = call(&ctx, &class_value(&class), "new", &[]).unwrap();

    let err = call(&ctx, &looping, "again", &[]).unwrap_err();
    assert_eq!(
        err.exception().inspect(),
        "SystemStackError: stack level too deep"
    );
    assert!(!err.is_a(ExceptionKind::StandardError));
    assert_eq!(rt.call_depth(), 0);
    assert!(call(&ctx, &looping, "class", &[]).is_ok());
}
