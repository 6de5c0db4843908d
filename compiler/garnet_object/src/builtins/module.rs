//! `Module`: inclusion, ancestry, method tables and visibility.

use super::{check_args, flag_arg, module_arg, string_arg, symbol_arg};
use crate::class::ancestry::{self, Reach};
use crate::class::{ClassLike, Module};
use crate::dispatch::CallContext;
use crate::errors::{
    no_block_given, type_error, uninitialized_constant, EvalError, EvalResult, ExceptionKind,
};
use crate::introspect::{method_names, Listing};
use crate::method::{Method, MethodSet, Visibility};
use crate::symbol::{Symbol, SymbolTable};
use crate::value::Value;

pub(crate) fn instance_methods(symbols: &SymbolTable) -> MethodSet {
    MethodSet::from_entries(
        symbols,
        [
            ("name", Method::public(name).with_arity(0)),
            ("to_s", Method::public(to_s).with_arity(0)),
            ("inspect", Method::public(to_s).with_arity(0)),
            ("ancestors", Method::public(ancestors).with_arity(0)),
            ("include", Method::public(include)),
            ("include?", Method::public(includes).with_arity(1)),
            ("instance_methods", Method::public(instance_methods_list)),
            ("public_instance_methods", Method::public(public_instance_methods)),
            ("private_instance_methods", Method::public(private_instance_methods)),
            ("protected_instance_methods", Method::public(protected_instance_methods)),
            ("method_defined?", Method::public(method_defined).with_arity(1)),
            ("public_method_defined?", Method::public(public_method_defined).with_arity(1)),
            ("private_method_defined?", Method::public(private_method_defined).with_arity(1)),
            ("protected_method_defined?", Method::public(protected_method_defined).with_arity(1)),
            ("public", Method::private(public)),
            ("private", Method::private(private)),
            ("protected", Method::private(protected)),
            ("define_method", Method::private(define_method)),
            ("attr_reader", Method::private(attr_reader)),
            ("attr_writer", Method::private(attr_writer)),
            ("attr_accessor", Method::private(attr_accessor)),
            ("const_get", Method::public(const_get).with_arity(1)),
        ],
    )
}

/// Class methods of `Module` itself.
pub(crate) fn singleton_methods(symbols: &SymbolTable) -> MethodSet {
    MethodSet::from_entries(symbols, [("new", Method::public(new_module).with_arity(0))])
}

/// The receiver as a class-like node.
pub(crate) fn receiver(ctx: &CallContext<'_>) -> EvalResult<ClassLike> {
    ctx.receiver()
        .as_class_like()
        .cloned()
        .ok_or_else(|| type_error(format!("{} is not a class/module", ctx.receiver().inspect())))
}

fn new_module(ctx: &CallContext<'_>, _args: &[Value]) -> EvalResult {
    let module = Module::new(
        None,
        MethodSet::new(),
        &ctx.runtime().core().module,
        ctx.env().child(),
    );
    Ok(Value::Class(ClassLike::Module(module)))
}

fn name(ctx: &CallContext<'_>, _args: &[Value]) -> EvalResult {
    Ok(receiver(ctx)?
        .symbol()
        .map_or(Value::Nil, |name| Value::string(name.as_str())))
}

fn to_s(ctx: &CallContext<'_>, _args: &[Value]) -> EvalResult {
    Ok(Value::string(receiver(ctx)?.name()))
}

fn ancestors(ctx: &CallContext<'_>, _args: &[Value]) -> EvalResult {
    let nodes = ancestry::ancestors(&receiver(ctx)?);
    Ok(Value::array(nodes.into_iter().map(Value::Class).collect()))
}

/// `include(A, B)` leaves `A` nearest the receiver.
fn include(ctx: &CallContext<'_>, args: &[Value]) -> EvalResult {
    check_args(args, 1, None)?;
    let target = receiver(ctx)?;
    let modules = args
        .iter()
        .map(|arg| module_arg(ctx, arg))
        .collect::<EvalResult<Vec<_>>>()?;
    for module in modules.iter().rev() {
        target.include_module(module)?;
    }
    Ok(ctx.receiver())
}

fn includes(ctx: &CallContext<'_>, args: &[Value]) -> EvalResult {
    let target = receiver(ctx)?;
    let module = ClassLike::Module(module_arg(ctx, &args[0])?);
    Ok(Value::Bool(
        !target.is_same(&module) && ancestry::includes_ancestor(&target, &module),
    ))
}

fn list(ctx: &CallContext<'_>, args: &[Value], listing: Listing) -> EvalResult {
    check_args(args, 0, Some(1))?;
    let reach = if flag_arg(args, 0, true) {
        Reach::All
    } else {
        Reach::Own
    };
    Ok(Value::symbols(method_names(&receiver(ctx)?, reach, listing)))
}

fn instance_methods_list(ctx: &CallContext<'_>, args: &[Value]) -> EvalResult {
    list(ctx, args, Listing::Callable)
}

fn public_instance_methods(ctx: &CallContext<'_>, args: &[Value]) -> EvalResult {
    list(ctx, args, Listing::Only(Visibility::Public))
}

fn private_instance_methods(ctx: &CallContext<'_>, args: &[Value]) -> EvalResult {
    list(ctx, args, Listing::Only(Visibility::Private))
}

fn protected_instance_methods(ctx: &CallContext<'_>, args: &[Value]) -> EvalResult {
    list(ctx, args, Listing::Only(Visibility::Protected))
}

fn defined(ctx: &CallContext<'_>, args: &[Value], listing: Listing) -> EvalResult {
    let target = receiver(ctx)?;
    let name = symbol_arg(ctx, &args[0])?;
    let found = ancestry::find_method(&target, name);
    Ok(Value::Bool(found.is_some_and(|f| match listing {
        Listing::Callable => f.method.visibility() != Visibility::Private,
        Listing::Only(wanted) => f.method.visibility() == wanted,
    })))
}

fn method_defined(ctx: &CallContext<'_>, args: &[Value]) -> EvalResult {
    defined(ctx, args, Listing::Callable)
}

fn public_method_defined(ctx: &CallContext<'_>, args: &[Value]) -> EvalResult {
    defined(ctx, args, Listing::Only(Visibility::Public))
}

fn private_method_defined(ctx: &CallContext<'_>, args: &[Value]) -> EvalResult {
    defined(ctx, args, Listing::Only(Visibility::Private))
}

fn protected_method_defined(ctx: &CallContext<'_>, args: &[Value]) -> EvalResult {
    defined(ctx, args, Listing::Only(Visibility::Protected))
}

/// Without names: set the default for later definitions. With names:
/// install copies of those methods in the receiver with the new visibility.
fn set_visibility(ctx: &CallContext<'_>, args: &[Value], visibility: Visibility) -> EvalResult {
    let target = receiver(ctx)?;
    if args.is_empty() {
        target.set_default_visibility(visibility);
        return Ok(Value::Nil);
    }
    for arg in args {
        let name = symbol_arg(ctx, arg)?;
        if target.set_method_visibility(name, visibility) {
            continue;
        }
        match ancestry::find_method(&target, name) {
            Some(found) => target.define_method(name, found.method.with_visibility(visibility)),
            None => {
                return Err(EvalError::new(
                    ExceptionKind::NameError,
                    format!("undefined method '{name}' for class '{}'", target.name()),
                ))
            }
        }
    }
    Ok(match args {
        [single] => single.clone(),
        _ => Value::array(args.to_vec()),
    })
}

fn public(ctx: &CallContext<'_>, args: &[Value]) -> EvalResult {
    set_visibility(ctx, args, Visibility::Public)
}

fn private(ctx: &CallContext<'_>, args: &[Value]) -> EvalResult {
    set_visibility(ctx, args, Visibility::Private)
}

fn protected(ctx: &CallContext<'_>, args: &[Value]) -> EvalResult {
    set_visibility(ctx, args, Visibility::Protected)
}

/// `define_method(name, &block)` or `define_method(name, proc)`.
fn define_method(ctx: &CallContext<'_>, args: &[Value]) -> EvalResult {
    check_args(args, 1, Some(2))?;
    let target = receiver(ctx)?;
    let name = symbol_arg(ctx, &args[0])?;
    let body = match args.get(1) {
        Some(value) => value
            .as_proc()
            .cloned()
            .ok_or_else(|| type_error("wrong argument type (expected Proc)"))?,
        None => ctx.block().cloned().ok_or_else(no_block_given)?,
    };
    let method = Method::guest(
        body.params().to_vec(),
        body.body(),
        body.env().clone(),
        target.default_visibility(),
    );
    target.define_method(name, method);
    Ok(Value::Symbol(name))
}

fn define_attrs(
    ctx: &CallContext<'_>,
    args: &[Value],
    reader: bool,
    writer: bool,
) -> EvalResult {
    check_args(args, 1, None)?;
    let target = receiver(ctx)?;
    let visibility = target.default_visibility();
    let mut defined: Vec<Symbol> = Vec::new();
    for arg in args {
        let attr = symbol_arg(ctx, arg)?;
        let ivar = ctx.intern(&format!("@{attr}"));
        if reader {
            target.define_method(attr, Method::attr_reader(ivar, visibility));
            defined.push(attr);
        }
        if writer {
            let setter = ctx.intern(&format!("{attr}="));
            target.define_method(setter, Method::attr_writer(ivar, visibility));
            defined.push(setter);
        }
    }
    Ok(Value::symbols(defined))
}

fn attr_reader(ctx: &CallContext<'_>, args: &[Value]) -> EvalResult {
    define_attrs(ctx, args, true, false)
}

fn attr_writer(ctx: &CallContext<'_>, args: &[Value]) -> EvalResult {
    define_attrs(ctx, args, false, true)
}

fn attr_accessor(ctx: &CallContext<'_>, args: &[Value]) -> EvalResult {
    define_attrs(ctx, args, true, true)
}

/// Look in the receiver's scope, then the top-level constants.
fn const_get(ctx: &CallContext<'_>, args: &[Value]) -> EvalResult {
    let target = receiver(ctx)?;
    let name = match args[0].as_symbol() {
        Some(symbol) => symbol,
        None => ctx.intern(string_arg(ctx, &args[0])?),
    };
    if !name.is_constant() {
        return Err(EvalError::new(
            ExceptionKind::NameError,
            format!("wrong constant name {name}"),
        ));
    }
    target
        .env()
        .get(name)
        .or_else(|| ctx.runtime().main_env().get(name))
        .ok_or_else(|| uninitialized_constant(name.as_str()))
}
