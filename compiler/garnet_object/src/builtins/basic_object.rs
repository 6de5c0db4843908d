//! `BasicObject`: the methods every object answers to.

use super::{check_args, identity, noop, symbol_arg};
use crate::dispatch::CallContext;
use crate::errors::{no_implicit_conversion, no_method_error, EvalResult};
use crate::method::{Method, MethodSet};
use crate::symbol::SymbolTable;
use crate::value::Value;

pub(crate) fn instance_methods(symbols: &SymbolTable) -> MethodSet {
    MethodSet::from_entries(
        symbols,
        [
            ("initialize", Method::private(identity)),
            ("method_missing", Method::private(method_missing)),
            ("==", Method::public(equal).with_arity(1)),
            ("equal?", Method::public(equal).with_arity(1)),
            ("!", Method::public(not).with_arity(0)),
            ("!=", Method::public(not_equal).with_arity(1)),
            ("__send__", Method::public(send)),
            ("__id__", Method::public(object_id).with_arity(0)),
            ("singleton_method_added", Method::private(noop).with_arity(1)),
            ("singleton_method_removed", Method::private(noop).with_arity(1)),
            ("singleton_method_undefined", Method::private(noop).with_arity(1)),
        ],
    )
}

fn method_missing(ctx: &CallContext<'_>, args: &[Value]) -> EvalResult {
    check_args(args, 1, None)?;
    let Some(method) = args[0].as_symbol() else {
        let class = ctx.runtime().class_of(&args[0]).name();
        return Err(no_implicit_conversion(&class, "Symbol"));
    };
    let (inspect, class) = ctx.runtime().describe(&ctx.receiver());
    Err(no_method_error(method.as_str(), &inspect, &class))
}

fn equal(ctx: &CallContext<'_>, args: &[Value]) -> EvalResult {
    Ok(Value::Bool(ctx.receiver().is_identical(&args[0])))
}

fn not(ctx: &CallContext<'_>, _args: &[Value]) -> EvalResult {
    Ok(Value::Bool(!ctx.receiver().is_truthy()))
}

/// `a != b` is `!(a == b)` through dispatch, so overriding `==` is enough.
fn not_equal(ctx: &CallContext<'_>, args: &[Value]) -> EvalResult {
    let eq = ctx.intern("==");
    let result = ctx.send(&ctx.receiver(), eq, args, None)?;
    Ok(Value::Bool(!result.is_truthy()))
}

/// `send` / `__send__`: call any method, ignoring visibility.
pub(crate) fn send(ctx: &CallContext<'_>, args: &[Value]) -> EvalResult {
    check_args(args, 1, None)?;
    let method = symbol_arg(ctx, &args[0])?;
    ctx.send_privileged(&ctx.receiver(), method, &args[1..], ctx.block().cloned())
}

pub(crate) fn object_id(ctx: &CallContext<'_>, _args: &[Value]) -> EvalResult {
    let id = i64::try_from(ctx.receiver().object_id()).unwrap_or(i64::MAX);
    Ok(Value::Integer(id))
}
