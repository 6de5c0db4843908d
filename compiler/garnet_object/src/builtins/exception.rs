//! `Exception` and, through inheritance, every exception class.

use super::check_args;
use crate::dispatch::CallContext;
use crate::errors::{type_error, EvalResult, ExceptionObject};
use crate::heap::Heap;
use crate::method::{Method, MethodSet};
use crate::symbol::SymbolTable;
use crate::value::Value;

pub(crate) fn instance_methods(symbols: &SymbolTable) -> MethodSet {
    MethodSet::from_entries(
        symbols,
        [
            ("initialize", Method::private(initialize)),
            ("message", Method::public(message).with_arity(0)),
            ("to_s", Method::public(message).with_arity(0)),
            ("inspect", Method::public(inspect).with_arity(0)),
            ("exception", Method::public(exception)),
            ("==", Method::public(equal).with_arity(1)),
        ],
    )
}

/// Class methods of `Exception`, inherited by every exception class.
pub(crate) fn singleton_methods(symbols: &SymbolTable) -> MethodSet {
    MethodSet::from_entries(symbols, [("exception", Method::public(class_exception))])
}

fn this(ctx: &CallContext<'_>) -> EvalResult<Heap<ExceptionObject>> {
    ctx.receiver()
        .as_exception()
        .cloned()
        .ok_or_else(|| type_error(format!("{} is not an exception", ctx.receiver().inspect())))
}

/// Text used as a message: strings as-is, anything else inspected.
fn message_text(value: &Value) -> String {
    match value.as_str() {
        Some(text) => text.to_string(),
        None => value.inspect(),
    }
}

/// `initialize(message = nil)`. Without a message the class name set by
/// the allocator stays.
fn initialize(ctx: &CallContext<'_>, args: &[Value]) -> EvalResult {
    check_args(args, 0, Some(1))?;
    let exception = this(ctx)?;
    if let Some(message) = args.first().filter(|m| !m.is_nil()) {
        exception.set_message(message_text(message));
    }
    Ok(Value::Nil)
}

fn message(ctx: &CallContext<'_>, _args: &[Value]) -> EvalResult {
    Ok(Value::string(this(ctx)?.message()))
}

fn inspect(ctx: &CallContext<'_>, _args: &[Value]) -> EvalResult {
    Ok(Value::string(this(ctx)?.inspect()))
}

/// `exception` returns the receiver; `exception(message)` a copy carrying
/// the new message.
fn exception(ctx: &CallContext<'_>, args: &[Value]) -> EvalResult {
    check_args(args, 0, Some(1))?;
    match args.first() {
        None => Ok(ctx.receiver()),
        Some(message) => {
            let original = this(ctx)?;
            Ok(Value::Exception(original.with_message(message_text(message))))
        }
    }
}

fn equal(ctx: &CallContext<'_>, args: &[Value]) -> EvalResult {
    let receiver = ctx.receiver();
    if receiver.is_identical(&args[0]) {
        return Ok(Value::Bool(true));
    }
    let (Some(a), Some(b)) = (receiver.as_exception(), args[0].as_exception()) else {
        return Ok(Value::Bool(false));
    };
    let runtime = ctx.runtime();
    let same_class = Heap::ptr_eq(
        &runtime.class_of(&receiver),
        &runtime.class_of(&args[0]),
    );
    Ok(Value::Bool(same_class && a.message() == b.message()))
}

/// `SomeError.exception(...)` is `SomeError.new(...)`.
fn class_exception(ctx: &CallContext<'_>, args: &[Value]) -> EvalResult {
    let new = ctx.runtime().names().new;
    ctx.send(&ctx.receiver(), new, args, ctx.block().cloned())
}
