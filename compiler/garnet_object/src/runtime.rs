//! The runtime: core classes, main environment, and dispatch entry points.

mod builder;
mod config;
mod bootstrap;
mod names;

pub use builder::RuntimeBuilder;
pub use config::{RuntimeConfig, DEFAULT_MAX_CALL_DEPTH};
pub use bootstrap::CoreClasses;
pub(crate) use names::WellKnownNames;

use std::cell::{Cell, RefCell};
use std::path::{Path, PathBuf};

use rustc_hash::FxHashSet;

use crate::class::ancestry;
use crate::class::{ClassLike, ClassRef, Module, ModuleRef};
use crate::dispatch::{CallContext, SelfBinding};
use crate::environment::Environment;
use crate::errors::{stack_level_too_deep, superclass_mismatch, type_error, EvalResult};
use crate::evaluator::Evaluator;
use crate::method::MethodSet;
use crate::symbol::{Symbol, SymbolTable};
use crate::value::Value;

/// One guest world: classes, globals, and the evaluator that runs guest code.
///
/// Single-threaded: values are `Rc`-based and the runtime is not `Sync`.
pub struct Runtime {
    config: RuntimeConfig,
    symbols: SymbolTable,
    names: WellKnownNames,
    core: CoreClasses,
    main_env: Environment,
    main_self: SelfBinding,
    evaluator: Box<dyn Evaluator>,
    loading: RefCell<FxHashSet<PathBuf>>,
    depth: Cell<usize>,
}

impl Runtime {
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// A runtime with default configuration running guest code through
    /// `evaluator`.
    pub fn new(evaluator: impl Evaluator + 'static) -> Self {
        Self::builder().evaluator(evaluator).build()
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    #[inline]
    pub fn intern(&self, text: &str) -> Symbol {
        self.symbols.intern(text)
    }

    pub(crate) fn names(&self) -> &WellKnownNames {
        &self.names
    }

    pub fn core(&self) -> &CoreClasses {
        &self.core
    }

    pub fn evaluator(&self) -> &dyn Evaluator {
        self.evaluator.as_ref()
    }

    /// The top-level scope. Holds constants and globals.
    pub fn main_env(&self) -> &Environment {
        &self.main_env
    }

    /// `self` at the top level.
    ///
    /// Starts as a plain `Object`; becomes its singleton-extended handle
    /// once top-level code calls `extend` or defines a singleton method.
    pub fn main_object(&self) -> Value {
        self.main_self.receiver()
    }

    /// The top-level self slot, shared by every top-level frame.
    pub(crate) fn main_binding(&self) -> SelfBinding {
        self.main_self.same_self()
    }

    pub(crate) fn rebind_main(&self, old: &Value, new: &Value) -> bool {
        self.main_self.rebind(old, new)
    }

    /// Context for running top-level code.
    pub fn top_context(&self) -> CallContext<'_> {
        CallContext::new(self, self.main_env.clone(), self.main_binding())
    }

    /// The nominal class of a value. Singleton wrappers are transparent.
    pub fn class_of(&self, value: &Value) -> ClassRef {
        let core = &self.core;
        match value {
            Value::Nil => core.nil.clone(),
            Value::Bool(true) => core.true_class.clone(),
            Value::Bool(false) => core.false_class.clone(),
            Value::Integer(_) => core.integer.clone(),
            Value::Str(_) => core.string.clone(),
            Value::Symbol(_) => core.symbol.clone(),
            Value::Array(_) => core.array.clone(),
            Value::Object(o) => o.class().clone(),
            Value::Class(ClassLike::Module(_)) => core.module.clone(),
            Value::Class(_) => core.class.clone(),
            Value::Exception(e) => e
                .class()
                .cloned()
                .unwrap_or_else(|| core.exception(e.kind()).clone()),
            Value::Proc(_) => core.proc_class.clone(),
            Value::Extended(e) => self.class_of(e.backing()),
        }
    }

    /// Where method lookup for `value` starts.
    pub fn dispatch_class(&self, value: &Value) -> ClassLike {
        match value {
            Value::Extended(e) => ClassLike::Eigenclass(e.eigenclass().clone()),
            Value::Class(class_like) => match class_like.metaclass() {
                Some(meta) => ClassLike::Eigenclass(meta),
                None => ClassLike::Class(self.core.class.clone()),
            },
            other => ClassLike::Class(self.class_of(other)),
        }
    }

    /// `value.is_a?(target)`.
    pub fn is_a(&self, value: &Value, target: &ClassLike) -> bool {
        ancestry::includes_ancestor(&self.dispatch_class(value), target)
    }

    /// Receiver and class name as they appear in error messages.
    pub(crate) fn describe(&self, value: &Value) -> (String, String) {
        (value.inspect(), self.class_of(value).name())
    }

    /// A class or module registered as a top-level constant.
    pub fn constant(&self, name: &str) -> Option<ClassLike> {
        self.main_env
            .get(self.intern(name))
            .and_then(|value| value.as_class_like().cloned())
    }

    /// Define (or reopen) a top-level class. `superclass` defaults to
    /// `Object`.
    pub fn define_class(&self, name: &str, superclass: Option<&ClassRef>) -> EvalResult<ClassRef> {
        let symbol = self.intern(name);
        if let Some(existing) = self.main_env.get(symbol) {
            return match existing.as_class_like() {
                Some(ClassLike::Class(class)) => {
                    let mismatched = superclass.is_some_and(|wanted| {
                        !class
                            .superclass()
                            .is_some_and(|actual| crate::heap::Heap::ptr_eq(actual, wanted))
                    });
                    if mismatched {
                        Err(superclass_mismatch(name))
                    } else {
                        Ok(class.clone())
                    }
                }
                _ => Err(type_error(format!("{name} is not a class"))),
            };
        }
        let superclass = superclass.unwrap_or(&self.core.object).clone();
        let class = crate::class::Class::new(
            Some(symbol),
            Some(superclass),
            MethodSet::new(),
            MethodSet::new(),
            None,
            self.main_env.child(),
        );
        self.main_env
            .set(symbol, Value::Class(ClassLike::Class(class.clone())));
        tracing::debug!(class = name, "class defined");
        Ok(class)
    }

    /// Define (or reopen) a top-level module.
    pub fn define_module(&self, name: &str) -> EvalResult<ModuleRef> {
        let symbol = self.intern(name);
        if let Some(existing) = self.main_env.get(symbol) {
            return match existing.as_class_like() {
                Some(ClassLike::Module(module)) => Ok(module.clone()),
                _ => Err(type_error(format!("{name} is not a module"))),
            };
        }
        let module = Module::new(
            Some(symbol),
            MethodSet::new(),
            &self.core.module,
            self.main_env.child(),
        );
        self.main_env
            .set(symbol, Value::Class(ClassLike::Module(module.clone())));
        tracing::debug!(module = name, "module defined");
        Ok(module)
    }

    /// Count one more nested call, failing once the configured depth is
    /// exceeded.
    pub(crate) fn enter_call(&self) -> EvalResult<CallDepthGuard<'_>> {
        let depth = self.depth.get();
        if depth >= self.config.max_call_depth {
            tracing::debug!(depth, "call depth limit reached");
            return Err(stack_level_too_deep());
        }
        self.depth.set(depth + 1);
        Ok(CallDepthGuard { depth: &self.depth })
    }

    /// Current number of nested calls.
    pub fn call_depth(&self) -> usize {
        self.depth.get()
    }

    /// Mark `path` as being loaded. `None` if it already is.
    pub(crate) fn begin_loading(&self, path: &Path) -> Option<LoadingGuard<'_>> {
        if self.loading.borrow_mut().insert(path.to_path_buf()) {
            Some(LoadingGuard {
                loading: &self.loading,
                path: path.to_path_buf(),
            })
        } else {
            None
        }
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Decrements the call depth when a call returns, including by `?`.
pub(crate) struct CallDepthGuard<'rt> {
    depth: &'rt Cell<usize>,
}

impl Drop for CallDepthGuard<'_> {
    fn drop(&mut self) {
        self.depth.set(self.depth.get().saturating_sub(1));
    }
}

/// Clears a path's in-progress mark when its load finishes.
pub(crate) struct LoadingGuard<'rt> {
    loading: &'rt RefCell<FxHashSet<PathBuf>>,
    path: PathBuf,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.loading.borrow_mut().remove(&self.path);
    }
}
