use crate::common::{
    block, call, call_with_block, class_value, def, def_with, fcall, local, module_value, names,
    runtime, sym, Scripted,
};
use garnet_object::{ClassLike, ExceptionKind, Value, Visibility};
use pretty_assertions::assert_eq;

#[test]
fn methods_lists_each_name_once() {
    let scripted = Scripted::new();
    let body = scripted.node(|_| Ok(Value::string("custom")));
    let rt = runtime(&scripted);
    let ctx = rt.top_context();
    let class = rt.define_class("Shape", None).unwrap();
    let target = ClassLike::Class(class.clone());
    def(&ctx, &target, "to_s", &[], body);
    def(&ctx, &target, "area", &[], body);
    def_with(&ctx, &target, "secret", body, Visibility::Private);
    let shape = call(&ctx, &class_value(&class), "new", &[]).unwrap();

    let all = names(&call(&ctx, &shape, "methods", &[]).unwrap());
    assert_eq!(all.iter().filter(|n| *n == "to_s").count(), 1);
    assert!(all.contains(&"area".to_owned()));
    assert!(all.contains(&"respond_to?".to_owned()));
    assert!(!all.contains(&"secret".to_owned()));
    assert!(!all.contains(&"raise".to_owned()));

    let private = names(&call(&ctx, &shape, "private_methods", &[]).unwrap());
    assert!(private.contains(&"secret".to_owned()));
    assert!(private.contains(&"raise".to_owned()));
    let public = names(&call(&ctx, &shape, "public_methods", &[]).unwrap());
    assert!(public.contains(&"area".to_owned()));
    assert!(names(&call(&ctx, &shape, "methods", &[Value::Bool(false)]).unwrap()).is_empty());
}

#[test]
fn private_override_hides_public_ancestor_method() {
    let scripted = Scripted::new();
    let body = scripted.node(|_| Ok(Value::Nil));
    let rt = runtime(&scripted);
    let ctx = rt.top_context();
    let class = rt.define_class("Quiet", None).unwrap();
    def_with(&ctx, &ClassLike::Class(class.clone()), "inspect", body, Visibility::Private);
    let quiet = call(&ctx, &class_value(&class), "new", &[]).unwrap();

    let public = names(&call(&ctx, &quiet, "methods", &[]).unwrap());
    assert!(!public.contains(&"inspect".to_owned()));
    let private = names(&call(&ctx, &quiet, "private_methods", &[]).unwrap());
    assert!(private.contains(&"inspect".to_owned()));
}

#[test]
fn define_singleton_method_rebinds_the_local() {
    let scripted = Scripted::new();
    let shout = scripted.node(|_| Ok(Value::string("HEY")));
    let rt = runtime(&scripted);
    let ctx = rt.top_context();
    let class = rt.define_class("Person", None).unwrap();
    let original = call(&ctx, &class_value(&class), "new", &[]).unwrap();
    let other = call(&ctx, &class_value(&class), "new", &[]).unwrap();
    ctx.env().set(ctx.intern("bob"), original.clone());

    let name = call_with_block(
        &ctx,
        &original,
        "define_singleton_method",
        &[sym(&ctx, "shout")],
        &[],
        shout,
    )
    .unwrap();
    assert_eq!(name.inspect(), ":shout");

    let bob = local(&ctx, "bob");
    assert_eq!(call(&ctx, &bob, "shout", &[]).unwrap().as_str(), Some("HEY"));
    assert!(bob.is_identical(&original));
    assert_eq!(call(&ctx, &bob, "class", &[]).unwrap().inspect(), "Person");
    assert_eq!(names(&call(&ctx, &bob, "singleton_methods", &[]).unwrap()), vec!["shout"]);
    assert_eq!(names(&call(&ctx, &bob, "methods", &[Value::Bool(false)]).unwrap()), vec!["shout"]);

    assert!(call(&ctx, &other, "shout", &[]).is_err());
    assert!(names(&call(&ctx, &other, "singleton_methods", &[]).unwrap()).is_empty());
}

#[test]
fn define_singleton_method_accepts_a_proc() {
    let scripted = Scripted::new();
    let body = scripted.node(|ctx| Ok(local(ctx, "n")));
    let rt = runtime(&scripted);
    let ctx = rt.top_context();
    let class = rt.define_class("Echo", None).unwrap();
    let echo = call(&ctx, &class_value(&class), "new", &[]).unwrap();
    ctx.env().set(ctx.intern("echo"), echo.clone());

    let proc_value = block(&ctx, &["n"], body);
    call(
        &ctx,
        &echo,
        "define_singleton_method",
        &[sym(&ctx, "back"), proc_value],
    )
    .unwrap();
    let echo = local(&ctx, "echo");
    assert_eq!(
        call(&ctx, &echo, "back", &[Value::Integer(6)]).unwrap().as_integer(),
        Some(6)
    );

    let err = call(&ctx, &echo, "define_singleton_method", &[sym(&ctx, "nothing")]).unwrap_err();
    assert_eq!(err.kind(), ExceptionKind::LocalJumpError);
}

#[test]
fn extend_adds_module_methods_to_one_object() {
    let scripted = Scripted::new();
    let greet = scripted.node(|_| Ok(Value::string("hello")));
    let rt = runtime(&scripted);
    let ctx = rt.top_context();
    let greeter = rt.define_module("Greeter").unwrap();
    def(&ctx, &ClassLike::Module(greeter.clone()), "greet", &[], greet);
    let class = rt.define_class("Visitor", None).unwrap();
    let visitor = call(&ctx, &class_value(&class), "new", &[]).unwrap();
    let other = call(&ctx, &class_value(&class), "new", &[]).unwrap();
    ctx.env().set(ctx.intern("visitor"), visitor.clone());

    let extended = call(&ctx, &visitor, "extend", &[module_value(&greeter)]).unwrap();
    assert!(extended.is_identical(&visitor));
    assert_eq!(call(&ctx, &extended, "greet", &[]).unwrap().as_str(), Some("hello"));
    let rebound = local(&ctx, "visitor");
    assert_eq!(call(&ctx, &rebound, "greet", &[]).unwrap().as_str(), Some("hello"));
    assert!(call(&ctx, &rebound, "is_a?", &[module_value(&greeter)])
        .unwrap()
        .is_truthy());
    assert!(call(&ctx, &other, "greet", &[]).is_err());
    assert!(!call(&ctx, &other, "is_a?", &[module_value(&greeter)])
        .unwrap()
        .is_truthy());

    let err = call(&ctx, &Value::Integer(1), "extend", &[module_value(&greeter)]).unwrap_err();
    assert_eq!(err.exception().inspect(), "TypeError: can't extend Integer");
    let err = call(&ctx, &visitor, "extend", &[class_value(&class)]).unwrap_err();
    assert_eq!(
        err.exception().inspect(),
        "TypeError: wrong argument type Class (expected Module)"
    );
}

#[test]
fn extending_self_inside_a_method_reaches_later_implicit_calls() {
    let scripted = Scripted::new();
    let greet = scripted.node(|_| Ok(Value::string("hello")));
    let setup = scripted.node(|ctx| {
        let greeter = ctx
            .runtime()
            .constant("Greeter")
            .map(|c| c.to_value())
            .unwrap_or_default();
        ctx.call_function(ctx.intern("extend"), &[greeter], None)?;
        ctx.call_function(ctx.intern("greet"), &[], None)
    });
    let rt = runtime(&scripted);
    let ctx = rt.top_context();
    let greeter = rt.define_module("Greeter").unwrap();
    def(&ctx, &ClassLike::Module(greeter.clone()), "greet", &[], greet);
    let class = rt.define_class("Widget", None).unwrap();
    def(&ctx, &ClassLike::Class(class.clone()), "setup", &[], setup);
    let widget = call(&ctx, &class_value(&class), "new", &[]).unwrap();
    ctx.env().set(ctx.intern("widget"), widget.clone());

    assert_eq!(call(&ctx, &widget, "setup", &[]).unwrap().as_str(), Some("hello"));
    let rebound = local(&ctx, "widget");
    assert!(rebound.is_identical(&widget));
    assert_eq!(call(&ctx, &rebound, "greet", &[]).unwrap().as_str(), Some("hello"));
    assert!(call(&ctx, &rebound, "is_a?", &[module_value(&greeter)])
        .unwrap()
        .is_truthy());
}

#[test]
fn extending_main_reaches_later_top_level_calls() {
    let scripted = Scripted::new();
    let greet = scripted.node(|_| Ok(Value::string("hello")));
    let ping = scripted.node(|_| Ok(Value::string("pong")));
    let rt = runtime(&scripted);
    let ctx = rt.top_context();
    let greeter = rt.define_module("Greeter").unwrap();
    def(&ctx, &ClassLike::Module(greeter.clone()), "greet", &[], greet);
    let before = rt.main_object();

    let extended = fcall(&ctx, "extend", &[module_value(&greeter)]).unwrap();
    assert!(extended.is_identical(&before));
    assert!(extended.is_identical(&rt.main_object()));
    assert_eq!(fcall(&ctx, "greet", &[]).unwrap().as_str(), Some("hello"));
    assert_eq!(fcall(&rt.top_context(), "greet", &[]).unwrap().as_str(), Some("hello"));
    assert!(call(&ctx, &rt.main_object(), "is_a?", &[module_value(&greeter)])
        .unwrap()
        .is_truthy());
    assert_eq!(rt.main_object().inspect(), "#<Object>");

    let proc_value = block(&ctx, &[], ping);
    fcall(&ctx, "define_singleton_method", &[sym(&ctx, "ping"), proc_value]).unwrap();
    assert_eq!(fcall(&rt.top_context(), "ping", &[]).unwrap().as_str(), Some("pong"));
    assert_eq!(fcall(&ctx, "greet", &[]).unwrap().as_str(), Some("hello"));
    assert!(call(&ctx, &rt.main_object(), "respond_to?", &[sym(&ctx, "ping")])
        .unwrap()
        .is_truthy());
}

#[test]
fn singleton_class_of_objects_and_immediates() {
    let scripted = Scripted::new();
    let rt = runtime(&scripted);
    let ctx = rt.top_context();
    let class = rt.define_class("Thing", None).unwrap();
    let thing = call(&ctx, &class_value(&class), "new", &[]).unwrap();
    ctx.env().set(ctx.intern("thing"), thing.clone());

    let singleton = call(&ctx, &thing, "singleton_class", &[]).unwrap();
    assert_eq!(singleton.inspect(), "#<Class:#<Thing>>");
    let again = call(&ctx, &local(&ctx, "thing"), "singleton_class", &[]).unwrap();
    assert!(again.is_identical(&singleton));

    let err = call(&ctx, &Value::Integer(1), "singleton_class", &[]).unwrap_err();
    assert_eq!(err.exception().inspect(), "TypeError: can't define singleton");
}

#[test]
fn instance_variable_access() {
    let scripted = Scripted::new();
    let rt = runtime(&scripted);
    let ctx = rt.top_context();
    let class = rt.define_class("Point", None).unwrap();
    let point = call(&ctx, &class_value(&class), "new", &[]).unwrap();

    let x = sym(&ctx, "@x");
    assert!(call(&ctx, &point, "instance_variable_get", std::slice::from_ref(&x))
        .unwrap()
        .is_nil());
    let set = call(
        &ctx,
        &point,
        "instance_variable_set",
        &[x.clone(), Value::Integer(1)],
    )
    .unwrap();
    assert_eq!(set.as_integer(), Some(1));
    call(
        &ctx,
        &point,
        "instance_variable_set",
        &[Value::string("@y"), Value::Integer(2)],
    )
    .unwrap();
    assert_eq!(
        call(&ctx, &point, "instance_variable_get", &[x]).unwrap().as_integer(),
        Some(1)
    );
    assert_eq!(
        names(&call(&ctx, &point, "instance_variables", &[]).unwrap()),
        vec!["@x", "@y"]
    );

    let err = call(&ctx, &point, "instance_variable_get", &[sym(&ctx, "x")]).unwrap_err();
    assert_eq!(
        err.exception().inspect(),
        "NameError: 'x' is not allowed as an instance variable name"
    );
    let err = call(
        &ctx,
        &Value::Integer(5),
        "instance_variable_set",
        &[sym(&ctx, "@x"), Value::Nil],
    )
    .unwrap_err();
    assert_eq!(
        err.exception().inspect(),
        "TypeError: can't modify instance variables of 5"
    );
}

#[test]
fn to_s_and_inspect_for_plain_objects() {
    let scripted = Scripted::new();
    let rt = runtime(&scripted);
    let ctx = rt.top_context();
    let class = rt.define_class("Point", None).unwrap();
    let point = call(&ctx, &class_value(&class), "new", &[]).unwrap();

    let to_s = call(&ctx, &point, "to_s", &[]).unwrap();
    let to_s = to_s.as_str().unwrap();
    assert!(to_s.starts_with("#<Point:0x") && to_s.ends_with('>'));
    let bare = call(&ctx, &point, "inspect", &[]).unwrap();
    assert_eq!(bare.as_str(), Some(to_s));

    point.ivar_set(ctx.intern("@x"), Value::Integer(1));
    point.ivar_set(ctx.intern("@label"), Value::string("p"));
    let inspected = call(&ctx, &point, "inspect", &[]).unwrap();
    let inspected = inspected.as_str().unwrap();
    assert!(inspected.starts_with("#<Point:0x"));
    assert!(inspected.ends_with(" @label=\"p\", @x=1>"));

    let class_name = call(&ctx, &class_value(&class), "to_s", &[]).unwrap();
    assert_eq!(class_name.as_str(), Some("Point"));
}

#[test]
fn predicates_and_identity() {
    let scripted = Scripted::new();
    let rt = runtime(&scripted);
    let ctx = rt.top_context();
    let class = rt.define_class("Item", None).unwrap();
    let a = call(&ctx, &class_value(&class), "new", &[]).unwrap();
    let b = call(&ctx, &class_value(&class), "new", &[]).unwrap();

    assert!(call(&ctx, &Value::Nil, "nil?", &[]).unwrap().is_truthy());
    assert!(!call(&ctx, &a, "nil?", &[]).unwrap().is_truthy());

    let id = |v: &Value| call(&ctx, v, "object_id", &[]).unwrap().as_integer();
    assert_eq!(id(&a), id(&a));
    assert_ne!(id(&a), id(&b));
    assert_eq!(id(&a), call(&ctx, &a, "__id__", &[]).unwrap().as_integer());

    assert!(call(&ctx, &a, "==", std::slice::from_ref(&a)).unwrap().is_truthy());
    assert!(!call(&ctx, &a, "==", std::slice::from_ref(&b)).unwrap().is_truthy());
    assert!(call(&ctx, &a, "!=", std::slice::from_ref(&b)).unwrap().is_truthy());
    assert!(call(&ctx, &Value::string("x"), "==", &[Value::string("x")])
        .unwrap()
        .is_truthy());
    assert!(!call(&ctx, &Value::string("x"), "equal?", &[Value::string("x")])
        .unwrap()
        .is_truthy());
    assert!(call(&ctx, &Value::Nil, "!", &[]).unwrap().is_truthy());
}

#[test]
fn class_reports_nominal_class_of_every_value() {
    let scripted = Scripted::new();
    let rt = runtime(&scripted);
    let ctx = rt.top_context();
    let class_name = |v: &Value| call(&ctx, v, "class", &[]).unwrap().inspect();
    assert_eq!(class_name(&Value::Nil), "NilClass");
    assert_eq!(class_name(&Value::Bool(true)), "TrueClass");
    assert_eq!(class_name(&Value::Integer(1)), "Integer");
    assert_eq!(class_name(&Value::string("s")), "String");
    assert_eq!(class_name(&sym(&ctx, "s")), "Symbol");
    assert_eq!(class_name(&Value::array(Vec::new())), "Array");
    assert_eq!(class_name(&class_value(&rt.core().object)), "Class");
    assert_eq!(class_name(&module_value(&rt.core().kernel)), "Module");
}
