//! `NilClass`.

use crate::dispatch::CallContext;
use crate::errors::EvalResult;
use crate::method::{Method, MethodSet};
use crate::symbol::SymbolTable;
use crate::value::Value;

pub(crate) fn instance_methods(symbols: &SymbolTable) -> MethodSet {
    MethodSet::from_entries(
        symbols,
        [
            ("nil?", Method::public(yes).with_arity(0)),
            ("to_s", Method::public(to_s).with_arity(0)),
            ("to_a", Method::public(to_a).with_arity(0)),
            ("to_i", Method::public(to_i).with_arity(0)),
            ("inspect", Method::public(super::host_inspect).with_arity(0)),
            ("&", Method::public(and).with_arity(1)),
            ("|", Method::public(or).with_arity(1)),
            ("^", Method::public(or).with_arity(1)),
        ],
    )
}

fn yes(_ctx: &CallContext<'_>, _args: &[Value]) -> EvalResult {
    Ok(Value::Bool(true))
}

fn to_s(_ctx: &CallContext<'_>, _args: &[Value]) -> EvalResult {
    Ok(Value::string(""))
}

fn to_a(_ctx: &CallContext<'_>, _args: &[Value]) -> EvalResult {
    Ok(Value::array(Vec::new()))
}

fn to_i(_ctx: &CallContext<'_>, _args: &[Value]) -> EvalResult {
    Ok(Value::Integer(0))
}

fn and(_ctx: &CallContext<'_>, _args: &[Value]) -> EvalResult {
    Ok(Value::Bool(false))
}

/// `nil | x` and `nil ^ x` are both the truthiness of `x`.
fn or(_ctx: &CallContext<'_>, args: &[Value]) -> EvalResult {
    Ok(Value::Bool(args[0].is_truthy()))
}
