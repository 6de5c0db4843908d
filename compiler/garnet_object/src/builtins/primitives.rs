//! `String`, `Integer`, `Array` and `Proc`: the handful of methods the
//! object model itself relies on.

use super::{host_inspect, identity, value_equal};
use crate::class::ClassRef;
use crate::dispatch::CallContext;
use crate::errors::{no_implicit_conversion, type_error, zero_division, EvalResult};
use crate::method::{Method, MethodSet};
use crate::runtime::Runtime;
use crate::symbol::SymbolTable;
use crate::value::Value;

pub(crate) fn allocate_string(_runtime: &Runtime, _class: &ClassRef) -> EvalResult {
    Ok(Value::string(""))
}

pub(crate) fn allocate_array(_runtime: &Runtime, _class: &ClassRef) -> EvalResult {
    Ok(Value::array(Vec::new()))
}

pub(crate) fn string_methods(symbols: &SymbolTable) -> MethodSet {
    MethodSet::from_entries(
        symbols,
        [
            ("to_s", Method::public(identity).with_arity(0)),
            ("to_sym", Method::public(string_to_sym).with_arity(0)),
            ("inspect", Method::public(host_inspect).with_arity(0)),
            ("==", Method::public(value_equal).with_arity(1)),
            ("length", Method::public(string_length).with_arity(0)),
            ("+", Method::public(string_concat).with_arity(1)),
        ],
    )
}

pub(crate) fn integer_methods(symbols: &SymbolTable) -> MethodSet {
    MethodSet::from_entries(
        symbols,
        [
            ("to_s", Method::public(integer_to_s).with_arity(0)),
            ("inspect", Method::public(host_inspect).with_arity(0)),
            ("==", Method::public(value_equal).with_arity(1)),
            ("+", Method::public(add).with_arity(1)),
            ("-", Method::public(sub).with_arity(1)),
            ("*", Method::public(mul).with_arity(1)),
            ("/", Method::public(div).with_arity(1)),
        ],
    )
}

pub(crate) fn array_methods(symbols: &SymbolTable) -> MethodSet {
    MethodSet::from_entries(
        symbols,
        [
            ("length", Method::public(array_length).with_arity(0)),
            ("size", Method::public(array_length).with_arity(0)),
            ("include?", Method::public(array_include).with_arity(1)),
            ("to_a", Method::public(identity).with_arity(0)),
            ("inspect", Method::public(host_inspect).with_arity(0)),
            ("==", Method::public(value_equal).with_arity(1)),
            ("push", Method::public(array_push)),
            ("<<", Method::public(array_push).with_arity(1)),
        ],
    )
}

pub(crate) fn proc_methods(symbols: &SymbolTable) -> MethodSet {
    MethodSet::from_entries(
        symbols,
        [
            ("call", Method::public(proc_call)),
            ("arity", Method::public(proc_arity).with_arity(0)),
        ],
    )
}

fn string_to_sym(ctx: &CallContext<'_>, _args: &[Value]) -> EvalResult {
    let receiver = ctx.receiver();
    let text = receiver.as_str().unwrap_or_default();
    Ok(Value::Symbol(ctx.intern(text)))
}

fn string_length(ctx: &CallContext<'_>, _args: &[Value]) -> EvalResult {
    let count = ctx.receiver().as_str().map_or(0, |s| s.chars().count());
    Ok(Value::Integer(i64::try_from(count).unwrap_or(i64::MAX)))
}

fn string_concat(ctx: &CallContext<'_>, args: &[Value]) -> EvalResult {
    let receiver = ctx.receiver();
    let left = receiver.as_str().unwrap_or_default();
    let Some(right) = args[0].as_str() else {
        let class = ctx.runtime().class_of(&args[0]).name();
        return Err(no_implicit_conversion(&class, "String"));
    };
    Ok(Value::string(format!("{left}{right}")))
}

fn integer_to_s(ctx: &CallContext<'_>, _args: &[Value]) -> EvalResult {
    Ok(Value::string(ctx.receiver().inspect()))
}

fn operands(ctx: &CallContext<'_>, args: &[Value]) -> EvalResult<(i64, i64)> {
    let left = ctx.receiver().as_integer().unwrap_or_default();
    match args[0].as_integer() {
        Some(right) => Ok((left, right)),
        None => {
            let class = ctx.runtime().class_of(&args[0]).name();
            Err(type_error(format!("{class} can't be coerced into Integer")))
        }
    }
}

fn add(ctx: &CallContext<'_>, args: &[Value]) -> EvalResult {
    let (a, b) = operands(ctx, args)?;
    Ok(Value::Integer(a.wrapping_add(b)))
}

fn sub(ctx: &CallContext<'_>, args: &[Value]) -> EvalResult {
    let (a, b) = operands(ctx, args)?;
    Ok(Value::Integer(a.wrapping_sub(b)))
}

fn mul(ctx: &CallContext<'_>, args: &[Value]) -> EvalResult {
    let (a, b) = operands(ctx, args)?;
    Ok(Value::Integer(a.wrapping_mul(b)))
}

/// Floor division, as the guest language defines it.
fn div(ctx: &CallContext<'_>, args: &[Value]) -> EvalResult {
    let (a, b) = operands(ctx, args)?;
    if b == 0 {
        return Err(zero_division());
    }
    let quotient = a.wrapping_div(b);
    let rounds_toward_zero = a.wrapping_rem(b) != 0 && ((a < 0) != (b < 0));
    Ok(Value::Integer(if rounds_toward_zero {
        quotient - 1
    } else {
        quotient
    }))
}

fn array_length(ctx: &CallContext<'_>, _args: &[Value]) -> EvalResult {
    let len = ctx.receiver().as_array().map_or(0, |a| a.borrow().len());
    Ok(Value::Integer(i64::try_from(len).unwrap_or(i64::MAX)))
}

fn array_include(ctx: &CallContext<'_>, args: &[Value]) -> EvalResult {
    let found = ctx
        .receiver()
        .as_array()
        .is_some_and(|a| a.borrow().iter().any(|item| item.value_eq(&args[0])));
    Ok(Value::Bool(found))
}

fn array_push(ctx: &CallContext<'_>, args: &[Value]) -> EvalResult {
    let receiver = ctx.receiver();
    let Some(array) = receiver.as_array() else {
        return Err(type_error("receiver is not an Array"));
    };
    array.borrow_mut().extend_from_slice(args);
    Ok(receiver)
}

fn proc_call(ctx: &CallContext<'_>, args: &[Value]) -> EvalResult {
    let receiver = ctx.receiver();
    let Some(block) = receiver.as_proc() else {
        return Err(type_error("receiver is not a Proc"));
    };
    ctx.call_block(block, args)
}

fn proc_arity(ctx: &CallContext<'_>, _args: &[Value]) -> EvalResult {
    let arity = ctx.receiver().as_proc().map_or(0, |p| p.params().len());
    Ok(Value::Integer(i64::try_from(arity).unwrap_or(i64::MAX)))
}
