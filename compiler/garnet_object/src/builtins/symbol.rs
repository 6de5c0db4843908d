//! `Symbol`.

use super::{host_inspect, identity, value_equal};
use crate::dispatch::CallContext;
use crate::errors::EvalResult;
use crate::method::{Method, MethodSet};
use crate::symbol::SymbolTable;
use crate::value::Value;

pub(crate) fn instance_methods(symbols: &SymbolTable) -> MethodSet {
    MethodSet::from_entries(
        symbols,
        [
            ("to_s", Method::public(to_s).with_arity(0)),
            ("to_sym", Method::public(identity).with_arity(0)),
            ("inspect", Method::public(host_inspect).with_arity(0)),
            ("==", Method::public(value_equal).with_arity(1)),
        ],
    )
}

pub(crate) fn singleton_methods(symbols: &SymbolTable) -> MethodSet {
    MethodSet::from_entries(
        symbols,
        [("all_symbols", Method::public(all_symbols).with_arity(0))],
    )
}

fn to_s(ctx: &CallContext<'_>, _args: &[Value]) -> EvalResult {
    Ok(ctx
        .receiver()
        .as_symbol()
        .map_or(Value::Nil, |s| Value::string(s.as_str())))
}

/// Every symbol of this runtime's table.
fn all_symbols(ctx: &CallContext<'_>, _args: &[Value]) -> EvalResult {
    Ok(Value::symbols(ctx.runtime().symbols().all()))
}
