//! `Object`: message sending and `respond_to?`.

use super::basic_object::send;
use super::{check_args, symbol_arg};
use crate::dispatch::CallContext;
use crate::errors::{argument_error, EvalResult};
use crate::method::{Method, MethodSet};
use crate::symbol::SymbolTable;
use crate::value::Value;

pub(crate) fn instance_methods(symbols: &SymbolTable) -> MethodSet {
    MethodSet::from_entries(
        symbols,
        [
            ("send", Method::public(send)),
            ("public_send", Method::public(public_send)),
            ("respond_to?", Method::public(respond_to)),
            ("respond_to_missing?", Method::private(respond_to_missing).with_arity(2)),
        ],
    )
}

fn public_send(ctx: &CallContext<'_>, args: &[Value]) -> EvalResult {
    check_args(args, 1, None)?;
    let method = symbol_arg(ctx, &args[0])?;
    ctx.public_send(&ctx.receiver(), method, &args[1..], ctx.block().cloned())
}

fn respond_to(ctx: &CallContext<'_>, args: &[Value]) -> EvalResult {
    check_args(args, 1, Some(2))?;
    let method = symbol_arg(ctx, &args[0])?;
    let include_all = match args.get(1) {
        None => false,
        Some(Value::Bool(flag)) => *flag,
        Some(_) => {
            return Err(argument_error(
                "include_all: wrong argument type (expected Boolean)",
            ))
        }
    };
    if ctx.responds_to(&ctx.receiver(), method, include_all) {
        return Ok(Value::Bool(true));
    }
    let hook = ctx.runtime().names().respond_to_missing;
    let answer = ctx.send_privileged(
        &ctx.receiver(),
        hook,
        &[Value::Symbol(method), Value::Bool(include_all)],
        None,
    )?;
    Ok(Value::Bool(answer.is_truthy()))
}

fn respond_to_missing(_ctx: &CallContext<'_>, _args: &[Value]) -> EvalResult {
    Ok(Value::Bool(false))
}
