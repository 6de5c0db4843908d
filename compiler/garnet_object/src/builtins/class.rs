//! `Class`: instantiation and the superclass link.

use super::module::receiver;
use crate::class::{Class, ClassLike, ClassRef};
use crate::dispatch::CallContext;
use crate::errors::{allocator_undefined, type_error, EvalResult};
use crate::method::{Method, MethodSet};
use crate::symbol::SymbolTable;
use crate::value::Value;

pub(crate) fn instance_methods(symbols: &SymbolTable) -> MethodSet {
    MethodSet::from_entries(
        symbols,
        [
            ("new", Method::public(new)),
            ("allocate", Method::public(allocate).with_arity(0)),
            ("superclass", Method::public(superclass).with_arity(0)),
        ],
    )
}

/// Class methods of `Class` itself.
pub(crate) fn singleton_methods(symbols: &SymbolTable) -> MethodSet {
    MethodSet::from_entries(symbols, [("new", Method::public(new_class))])
}

fn receiver_class(ctx: &CallContext<'_>) -> EvalResult<ClassRef> {
    match receiver(ctx)? {
        ClassLike::Class(class) => Ok(class),
        other => Err(type_error(format!("{} is not a class", other.inspect()))),
    }
}

fn allocate_for(ctx: &CallContext<'_>, class: &ClassRef) -> EvalResult {
    let allocator = class
        .allocator()
        .ok_or_else(|| allocator_undefined(&class.name()))?;
    allocator(ctx.runtime(), class)
}

/// Allocate, then run the private `initialize` with the arguments and block.
fn new(ctx: &CallContext<'_>, args: &[Value]) -> EvalResult {
    let class = receiver_class(ctx)?;
    let instance = allocate_for(ctx, &class)?;
    let initialize = ctx.runtime().names().initialize;
    ctx.send_privileged(&instance, initialize, args, ctx.block().cloned())?;
    Ok(instance)
}

fn allocate(ctx: &CallContext<'_>, _args: &[Value]) -> EvalResult {
    let class = receiver_class(ctx)?;
    allocate_for(ctx, &class)
}

fn superclass(ctx: &CallContext<'_>, _args: &[Value]) -> EvalResult {
    let class = receiver_class(ctx)?;
    Ok(class
        .superclass()
        .map_or(Value::Nil, |s| Value::Class(ClassLike::Class(s.clone()))))
}

/// `Class.new(superclass = Object)`: an anonymous class.
fn new_class(ctx: &CallContext<'_>, args: &[Value]) -> EvalResult {
    super::check_args(args, 0, Some(1))?;
    let superclass = match args.first() {
        None => ctx.runtime().core().object.clone(),
        Some(value) => match value.as_class_like() {
            Some(ClassLike::Class(class)) => class.clone(),
            _ => return Err(type_error("superclass must be a Class")),
        },
    };
    let class = Class::new(
        None,
        Some(superclass),
        MethodSet::new(),
        MethodSet::new(),
        None,
        ctx.env().child(),
    );
    Ok(Value::Class(ClassLike::Class(class)))
}
