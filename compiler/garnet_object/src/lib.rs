//! Garnet Object - object model and method dispatch for the Garnet interpreter.
//!
//! This crate owns everything between "the evaluator wants to call a method"
//! and "a method body runs":
//!
//! - `Value`: guest values, including classes and singleton-extended objects
//! - `ClassLike`: classes, modules, mixin nodes and eigenclasses
//! - `CallContext`: the dispatch engine (`send`, visibility, `method_missing`)
//! - `ExceptionKind` / `EvalError`: the exception lattice and raised errors
//! - `Runtime`: core classes, the main environment, `require` bookkeeping
//!
//! Parsing and evaluating syntax trees is left to an external [`Evaluator`].
//! The runtime calls back into it for method bodies, blocks and required
//! files.

pub(crate) mod builtins;
pub mod class;
pub mod dispatch;
pub mod environment;
pub mod errors;
pub mod evaluator;
pub mod heap;
pub mod introspect;
mod load;
pub mod method;
mod raise;
pub mod runtime;
pub mod symbol;
pub mod value;

use std::sync::Once;

pub use class::{ClassLike, ClassRef, EigenclassRef, MixinRef, ModuleRef};
pub use dispatch::{CallContext, SelfBinding};
pub use environment::Environment;
pub use errors::{EvalError, EvalNote, EvalResult, ExceptionKind, ExceptionObject};
pub use evaluator::{Evaluator, NoEvaluator, ParseError};
pub use heap::Heap;
pub use method::{BuiltinFn, Method, MethodBody, MethodSet, Visibility};
pub use runtime::{CoreClasses, Runtime, RuntimeBuilder, RuntimeConfig};
pub use symbol::{Symbol, SymbolTable};
pub use value::{Value, ValueKind};

pub use garnet_ir::{ExprId, Name, SharedInterner};

static TRACING_INIT: Once = Once::new();

/// Install a `tracing` subscriber filtered by `RUST_LOG`.
///
/// Does nothing when `RUST_LOG` is unset. Safe to call more than once; an
/// already-installed global subscriber is left alone.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            let _ = tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .try_init();
        }
    });
}
