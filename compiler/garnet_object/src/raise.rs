//! `Kernel#raise`: turn its arguments into an exception and fail with it.

use crate::class::ClassLike;
use crate::dispatch::CallContext;
use crate::errors::{
    exception_class_expected, runtime_error, wrong_number_of_arguments_range, EvalError,
    EvalResult, ExceptionObject,
};
use crate::heap::Heap;
use crate::value::Value;

/// Accepted forms:
///
/// - `raise` raises a `RuntimeError` with an empty message
/// - `raise "boom"` raises a `RuntimeError` with that message
/// - `raise Klass` / `raise Klass, "msg"` raises `Klass.new` / `Klass.new("msg")`
/// - `raise obj` / `raise obj, "msg"` raises whatever `obj.exception` returns
///
/// Never returns `Ok`.
pub(crate) fn raise(ctx: &CallContext<'_>, args: &[Value]) -> EvalResult {
    let exception = match args {
        [] => return Err(runtime_error("")),
        [Value::Str(message)] => return Err(runtime_error(message.as_str())),
        [Value::Str(_), _] => return Err(exception_class_expected()),
        [subject] => make_exception(ctx, subject, None)?,
        [subject, message] => make_exception(ctx, subject, Some(message))?,
        _ => return Err(wrong_number_of_arguments_range(args.len(), 0, Some(2))),
    };
    tracing::debug!(exception = %exception.inspect(), "raise");
    Err(EvalError::from_exception(exception))
}

fn make_exception(
    ctx: &CallContext<'_>,
    subject: &Value,
    message: Option<&Value>,
) -> EvalResult<Heap<ExceptionObject>> {
    let names = ctx.runtime().names();
    let args: &[Value] = message.map_or(&[], std::slice::from_ref);
    let produced = match subject.unwrap_extended() {
        Value::Class(ClassLike::Class(class)) => {
            if !ctx.runtime().core().is_exception_class(class) {
                return Err(exception_class_expected());
            }
            ctx.send(subject, names.new, args, None)?
        }
        Value::Exception(exception) if message.is_none() => {
            return Ok(exception.clone());
        }
        _ => {
            if !ctx.responds_to(subject, names.exception, false) {
                return Err(exception_class_expected());
            }
            ctx.send(subject, names.exception, args, None)?
        }
    };
    produced
        .as_exception()
        .cloned()
        .ok_or_else(exception_class_expected)
}
