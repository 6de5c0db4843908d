//! `Kernel`: introspection, singleton behavior, blocks, `require` and `raise`.

use super::{check_args, class_like_arg, flag_arg, module_arg, string_arg, symbol_arg};
use crate::class::ancestry::Reach;
use crate::class::ClassLike;
use crate::dispatch::CallContext;
use crate::errors::{
    argument_error, no_block_given, type_error, wrong_number_of_arguments, EvalError, EvalResult,
    ExceptionKind,
};
use crate::introspect::{method_names, singleton_method_names, Listing};
use crate::load;
use crate::method::{Method, MethodSet, Visibility};
use crate::raise::raise;
use crate::symbol::{Symbol, SymbolTable};
use crate::value::Value;

pub(crate) fn instance_methods(symbols: &SymbolTable) -> MethodSet {
    MethodSet::from_entries(
        symbols,
        [
            ("class", Method::public(class).with_arity(0)),
            ("singleton_class", Method::public(singleton_class).with_arity(0)),
            ("methods", Method::public(methods)),
            ("public_methods", Method::public(public_methods)),
            ("private_methods", Method::public(private_methods)),
            ("protected_methods", Method::public(protected_methods)),
            ("singleton_methods", Method::public(singleton_methods)),
            ("define_singleton_method", Method::public(define_singleton_method)),
            ("extend", Method::public(extend)),
            ("tap", Method::public(tap)),
            ("block_given?", Method::private(block_given).with_arity(0)),
            ("require", Method::private(require_feature).with_arity(1)),
            ("load", Method::private(load_file)),
            ("raise", Method::private(raise)),
            ("nil?", Method::public(is_nil).with_arity(0)),
            ("to_s", Method::public(to_s).with_arity(0)),
            ("inspect", Method::public(inspect).with_arity(0)),
            ("is_a?", Method::public(is_a).with_arity(1)),
            ("kind_of?", Method::public(is_a).with_arity(1)),
            ("instance_of?", Method::public(instance_of).with_arity(1)),
            ("object_id", Method::public(super::basic_object::object_id).with_arity(0)),
            ("instance_variable_get", Method::public(instance_variable_get).with_arity(1)),
            ("instance_variable_set", Method::public(instance_variable_set).with_arity(2)),
            ("instance_variables", Method::public(instance_variables).with_arity(0)),
        ],
    )
}

/// The nominal class. Singleton classes and extensions are invisible here.
fn class(ctx: &CallContext<'_>, _args: &[Value]) -> EvalResult {
    let class = ctx.runtime().class_of(&ctx.receiver());
    Ok(Value::Class(ClassLike::Class(class)))
}

fn singleton_class(ctx: &CallContext<'_>, _args: &[Value]) -> EvalResult {
    let (_, eigen) = ctx.singleton_class(&ctx.receiver())?;
    Ok(Value::Class(ClassLike::Eigenclass(eigen)))
}

fn listing(ctx: &CallContext<'_>, all: bool, listing: Listing) -> Value {
    let start = ctx.runtime().dispatch_class(&ctx.receiver());
    let reach = if all { Reach::All } else { Reach::ThroughClass };
    Value::symbols(method_names(&start, reach, listing))
}

/// `methods(regular = true)`. With `false`, only singleton methods.
fn methods(ctx: &CallContext<'_>, args: &[Value]) -> EvalResult {
    check_args(args, 0, Some(1))?;
    if flag_arg(args, 0, true) {
        Ok(listing(ctx, true, Listing::Callable))
    } else {
        Ok(Value::symbols(singleton_method_names(
            &ctx.receiver(),
            Listing::Callable,
        )))
    }
}

fn public_methods(ctx: &CallContext<'_>, args: &[Value]) -> EvalResult {
    check_args(args, 0, Some(1))?;
    Ok(listing(ctx, flag_arg(args, 0, true), Listing::Only(Visibility::Public)))
}

fn private_methods(ctx: &CallContext<'_>, args: &[Value]) -> EvalResult {
    check_args(args, 0, Some(1))?;
    Ok(listing(ctx, flag_arg(args, 0, true), Listing::Only(Visibility::Private)))
}

fn protected_methods(ctx: &CallContext<'_>, args: &[Value]) -> EvalResult {
    check_args(args, 0, Some(1))?;
    Ok(listing(ctx, flag_arg(args, 0, true), Listing::Only(Visibility::Protected)))
}

fn singleton_methods(ctx: &CallContext<'_>, args: &[Value]) -> EvalResult {
    check_args(args, 0, Some(1))?;
    Ok(Value::symbols(singleton_method_names(
        &ctx.receiver(),
        Listing::Callable,
    )))
}

/// `define_singleton_method(name, &block)` or `(name, proc)`.
fn define_singleton_method(ctx: &CallContext<'_>, args: &[Value]) -> EvalResult {
    check_args(args, 1, Some(2))?;
    let name = symbol_arg(ctx, &args[0])?;
    let body = match args.get(1) {
        Some(value) => value
            .as_proc()
            .cloned()
            .ok_or_else(|| argument_error("wrong argument type (expected Proc)"))?,
        None => ctx.block().cloned().ok_or_else(no_block_given)?,
    };
    let method = Method::guest(
        body.params().to_vec(),
        body.body(),
        body.env().clone(),
        Visibility::Public,
    );
    ctx.define_singleton_method(&ctx.receiver(), name, method)?;
    Ok(Value::Symbol(name))
}

/// `extend(module, ...)`: returns the receiver as it now exists, carrying
/// its singleton class.
fn extend(ctx: &CallContext<'_>, args: &[Value]) -> EvalResult {
    check_args(args, 1, None)?;
    let modules = args
        .iter()
        .map(|arg| module_arg(ctx, arg))
        .collect::<EvalResult<Vec<_>>>()?;
    let extended = ctx.extend(&ctx.receiver(), &modules)?;
    tracing::debug!(receiver = %extended.inspect(), modules = modules.len(), "extend");
    Ok(extended)
}

/// Yield the receiver to the block and return the receiver.
fn tap(ctx: &CallContext<'_>, args: &[Value]) -> EvalResult {
    if !args.is_empty() {
        return Err(wrong_number_of_arguments(args.len(), 0));
    }
    let block = ctx.block().ok_or_else(no_block_given)?;
    ctx.call_block(block, std::slice::from_ref(&ctx.receiver()))?;
    Ok(ctx.receiver())
}

fn block_given(ctx: &CallContext<'_>, _args: &[Value]) -> EvalResult {
    Ok(Value::Bool(ctx.caller_block().is_some()))
}

fn require_feature(ctx: &CallContext<'_>, args: &[Value]) -> EvalResult {
    let feature = string_arg(ctx, &args[0])?;
    Ok(Value::Bool(load::require(ctx, feature)?))
}

fn load_file(ctx: &CallContext<'_>, args: &[Value]) -> EvalResult {
    check_args(args, 1, Some(2))?;
    let path = string_arg(ctx, &args[0])?;
    load::load(ctx, path)?;
    Ok(Value::Bool(true))
}

fn is_nil(_ctx: &CallContext<'_>, _args: &[Value]) -> EvalResult {
    Ok(Value::Bool(false))
}

/// `#<ClassName:0x...>`, or the name for classes and modules.
fn to_s(ctx: &CallContext<'_>, _args: &[Value]) -> EvalResult {
    let this = ctx.receiver();
    let receiver = this.unwrap_extended();
    if let Some(class_like) = receiver.as_class_like() {
        return Ok(Value::string(class_like.name()));
    }
    let class = ctx.runtime().class_of(receiver);
    Ok(Value::string(format!(
        "#<{}:0x{:016x}>",
        class.name(),
        receiver.object_id()
    )))
}

fn inspect(ctx: &CallContext<'_>, _args: &[Value]) -> EvalResult {
    let receiver = ctx.receiver();
    let ivars = receiver.ivar_names();
    if ivars.is_empty() {
        return to_s(ctx, &[]);
    }
    let class = ctx.runtime().class_of(&receiver);
    let fields: Vec<String> = ivars
        .into_iter()
        .map(|name| {
            let value = receiver.ivar_get(name).unwrap_or_default();
            format!("{name}={}", value.inspect())
        })
        .collect();
    Ok(Value::string(format!(
        "#<{}:0x{:016x} {}>",
        class.name(),
        receiver.object_id(),
        fields.join(", ")
    )))
}

fn is_a(ctx: &CallContext<'_>, args: &[Value]) -> EvalResult {
    let target = class_like_arg(&args[0])?;
    Ok(Value::Bool(ctx.runtime().is_a(&ctx.receiver(), &target)))
}

fn instance_of(ctx: &CallContext<'_>, args: &[Value]) -> EvalResult {
    let target = class_like_arg(&args[0])?;
    let class = ClassLike::Class(ctx.runtime().class_of(&ctx.receiver()));
    Ok(Value::Bool(class.is_same(&target)))
}

fn ivar_name(ctx: &CallContext<'_>, value: &Value) -> EvalResult<Symbol> {
    let name = symbol_arg(ctx, value)?;
    if name.is_instance_variable() {
        Ok(name)
    } else {
        Err(EvalError::new(
            ExceptionKind::NameError,
            format!("'{name}' is not allowed as an instance variable name"),
        ))
    }
}

fn instance_variable_get(ctx: &CallContext<'_>, args: &[Value]) -> EvalResult {
    let name = ivar_name(ctx, &args[0])?;
    Ok(ctx.receiver().ivar_get(name).unwrap_or_default())
}

fn instance_variable_set(ctx: &CallContext<'_>, args: &[Value]) -> EvalResult {
    let name = ivar_name(ctx, &args[0])?;
    let value = args[1].clone();
    if ctx.receiver().ivar_set(name, value.clone()) {
        Ok(value)
    } else {
        Err(type_error(format!(
            "can't modify instance variables of {}",
            ctx.receiver().inspect()
        )))
    }
}

fn instance_variables(ctx: &CallContext<'_>, _args: &[Value]) -> EvalResult {
    Ok(Value::symbols(ctx.receiver().ivar_names()))
}
