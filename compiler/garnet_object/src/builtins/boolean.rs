//! `TrueClass` and `FalseClass`.

use crate::dispatch::CallContext;
use crate::errors::EvalResult;
use crate::method::{Method, MethodSet};
use crate::symbol::SymbolTable;
use crate::value::Value;

pub(crate) fn true_methods(symbols: &SymbolTable) -> MethodSet {
    MethodSet::from_entries(
        symbols,
        [
            ("to_s", Method::public(to_s).with_arity(0)),
            ("inspect", Method::public(to_s).with_arity(0)),
            ("&", Method::public(truthiness).with_arity(1)),
            ("|", Method::public(always_true).with_arity(1)),
            ("^", Method::public(falsiness).with_arity(1)),
        ],
    )
}

pub(crate) fn false_methods(symbols: &SymbolTable) -> MethodSet {
    MethodSet::from_entries(
        symbols,
        [
            ("to_s", Method::public(to_s).with_arity(0)),
            ("inspect", Method::public(to_s).with_arity(0)),
            ("&", Method::public(always_false).with_arity(1)),
            ("|", Method::public(truthiness).with_arity(1)),
            ("^", Method::public(truthiness).with_arity(1)),
        ],
    )
}

fn to_s(ctx: &CallContext<'_>, _args: &[Value]) -> EvalResult {
    Ok(Value::string(ctx.receiver().inspect()))
}

fn truthiness(_ctx: &CallContext<'_>, args: &[Value]) -> EvalResult {
    Ok(Value::Bool(args[0].is_truthy()))
}

fn falsiness(_ctx: &CallContext<'_>, args: &[Value]) -> EvalResult {
    Ok(Value::Bool(!args[0].is_truthy()))
}

fn always_true(_ctx: &CallContext<'_>, _args: &[Value]) -> EvalResult {
    Ok(Value::Bool(true))
}

fn always_false(_ctx: &CallContext<'_>, _args: &[Value]) -> EvalResult {
    Ok(Value::Bool(false))
}
