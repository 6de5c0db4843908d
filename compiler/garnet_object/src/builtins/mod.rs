//! Built-in method tables for the core classes.
//!
//! Each submodule exposes functions returning the `MethodSet`s installed
//! during bootstrap. Shared argument helpers and the allocators live here.

pub(crate) mod basic_object;
pub(crate) mod boolean;
pub(crate) mod class;
pub(crate) mod exception;
pub(crate) mod kernel;
pub(crate) mod module;
pub(crate) mod nil;
pub(crate) mod object;
pub(crate) mod primitives;
pub(crate) mod symbol;

use crate::class::{ClassLike, ClassRef, ModuleRef};
use crate::dispatch::CallContext;
use crate::errors::{
    allocator_undefined, no_implicit_conversion, not_a_class_or_module, not_symbol_nor_string, wrong_argument_type,
    wrong_number_of_arguments_range, EvalResult, ExceptionKind, ExceptionObject,
};
use crate::runtime::Runtime;
use crate::symbol::Symbol;
use crate::value::Value;

/// Allocator for plain objects.
pub(crate) fn allocate_instance(_runtime: &Runtime, class: &ClassRef) -> EvalResult {
    Ok(Value::instance(class.clone()))
}

/// Allocator for `Exception` and its subclasses. The message defaults to
/// the class name.
pub(crate) fn allocate_exception(runtime: &Runtime, class: &ClassRef) -> EvalResult {
    let kind = runtime
        .core()
        .exception_kind_of(class)
        .unwrap_or(ExceptionKind::Exception);
    Ok(Value::Exception(ExceptionObject::with_class(
        kind,
        class.clone(),
        class.name(),
    )))
}

/// Allocator for classes whose instances only come from literals.
pub(crate) fn no_allocator(_runtime: &Runtime, class: &ClassRef) -> EvalResult {
    Err(allocator_undefined(&class.name()))
}

/// Fail unless `min <= args.len() <= max`.
pub(crate) fn check_args(args: &[Value], min: usize, max: Option<usize>) -> EvalResult<()> {
    let given = args.len();
    if given < min || max.is_some_and(|max| given > max) {
        return Err(wrong_number_of_arguments_range(given, min, max));
    }
    Ok(())
}

/// Name of the value's class, for error messages.
pub(crate) fn class_name(ctx: &CallContext<'_>, value: &Value) -> String {
    ctx.runtime().class_of(value).name()
}

/// A method or variable name given as a symbol or a string.
pub(crate) fn symbol_arg(ctx: &CallContext<'_>, value: &Value) -> EvalResult<Symbol> {
    if let Some(symbol) = value.as_symbol() {
        return Ok(symbol);
    }
    match value.as_str() {
        Some(text) => Ok(ctx.intern(text)),
        None => Err(not_symbol_nor_string(&value.inspect())),
    }
}

pub(crate) fn string_arg<'v>(ctx: &CallContext<'_>, value: &'v Value) -> EvalResult<&'v str> {
    value
        .as_str()
        .ok_or_else(|| no_implicit_conversion(&class_name(ctx, value), "String"))
}

pub(crate) fn module_arg(ctx: &CallContext<'_>, value: &Value) -> EvalResult<ModuleRef> {
    match value.as_class_like() {
        Some(ClassLike::Module(module)) => Ok(module.clone()),
        _ => Err(wrong_argument_type(&class_name(ctx, value), "Module")),
    }
}

pub(crate) fn class_like_arg(value: &Value) -> EvalResult<ClassLike> {
    value
        .as_class_like()
        .cloned()
        .ok_or_else(|| not_a_class_or_module(&value.inspect()))
}

/// Optional flag argument at `index`, read by truthiness.
pub(crate) fn flag_arg(args: &[Value], index: usize, default: bool) -> bool {
    args.get(index).map_or(default, Value::is_truthy)
}

/// Shared no-op used for hook methods.
pub(crate) fn noop(_ctx: &CallContext<'_>, _args: &[Value]) -> EvalResult {
    Ok(Value::Nil)
}

/// Returns the receiver unchanged.
pub(crate) fn identity(ctx: &CallContext<'_>, _args: &[Value]) -> EvalResult {
    Ok(ctx.receiver())
}

/// Content equality for the value types that have it; identity otherwise.
pub(crate) fn value_equal(ctx: &CallContext<'_>, args: &[Value]) -> EvalResult {
    Ok(Value::Bool(
        args.first().is_some_and(|other| ctx.receiver().value_eq(other)),
    ))
}

/// `inspect` for values whose host rendering is their guest rendering.
pub(crate) fn host_inspect(ctx: &CallContext<'_>, _args: &[Value]) -> EvalResult {
    Ok(Value::string(ctx.receiver().inspect()))
}
