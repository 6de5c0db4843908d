//! Method dispatch.
//!
//! Every call goes through a [`CallContext`]: the runtime, the current
//! scope, and the self binding (receiver, method name and block) of the
//! frame doing the calling. Three entry points differ only in which
//! visibilities they admit:
//!
//! - [`CallContext::send`]: explicit receiver. Public methods, plus
//!   protected ones when the caller's self is a kind of the method's owner.
//! - [`CallContext::call_function`]: implicit self. Any visibility.
//! - [`CallContext::send_privileged`]: internal calls (`send`,
//!   `initialize`, `method_missing`). Any visibility.
//!
//! When lookup fails, `method_missing` is dispatched with the method's
//! symbol prepended to the arguments. The default implementation raises
//! `NoMethodError`.

use garnet_ir::ExprId;
use garnet_stack::ensure_sufficient_stack;

use crate::class::ancestry::{self, Found};
use crate::class::{ClassLike, EigenclassRef, ModuleRef};
use crate::environment::{Environment, LocalScope};
use crate::errors::{
    cannot_define_singleton, no_method_error, private_method_called, protected_method_called,
    type_error, EvalResult,
};
use crate::heap::Heap;
use crate::method::{Method, MethodBody, Visibility};
use crate::runtime::Runtime;
use crate::symbol::Symbol;
use crate::value::{ProcValue, Value};

/// The self of a running frame.
///
/// The receiver sits in a shared slot. Frames running on the same object
/// share one slot, so when that object is promoted to a singleton-extended
/// handle every such frame sees the new handle.
#[derive(Clone, Debug)]
pub struct SelfBinding {
    receiver: LocalScope<Value>,
    name: Option<Symbol>,
    block: Option<Heap<ProcValue>>,
}

impl SelfBinding {
    pub fn new(receiver: Value) -> Self {
        SelfBinding {
            receiver: LocalScope::new(receiver),
            name: None,
            block: None,
        }
    }

    /// A new frame on the same self slot, without name or block.
    #[must_use]
    pub fn same_self(&self) -> Self {
        SelfBinding {
            receiver: self.receiver.clone(),
            name: None,
            block: None,
        }
    }

    /// Name of the method this frame is running.
    #[must_use]
    pub fn with_name(mut self, name: Symbol) -> Self {
        self.name = Some(name);
        self
    }

    #[must_use]
    pub fn with_block(mut self, block: Option<Heap<ProcValue>>) -> Self {
        self.block = block;
        self
    }

    pub fn receiver(&self) -> Value {
        self.receiver.borrow().clone()
    }

    /// Replace the receiver with `new` if it is currently `old`.
    pub(crate) fn rebind(&self, old: &Value, new: &Value) -> bool {
        let mut slot = self.receiver.borrow_mut();
        if slot.is_identical(old) {
            *slot = new.clone();
            true
        } else {
            false
        }
    }

    pub fn name(&self) -> Option<Symbol> {
        self.name
    }

    pub fn block(&self) -> Option<&Heap<ProcValue>> {
        self.block.as_ref()
    }
}

/// Which visibilities a call site admits.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Access {
    /// Explicit receiver: public, or protected from a kindred caller.
    Receiver,
    /// `public_send`: public only.
    PublicOnly,
    /// Implicit self.
    Function,
    Privileged,
}

/// Everything a running frame needs to call further methods.
pub struct CallContext<'rt> {
    runtime: &'rt Runtime,
    env: Environment,
    this: SelfBinding,
    caller_block: Option<Heap<ProcValue>>,
}

impl<'rt> CallContext<'rt> {
    pub fn new(runtime: &'rt Runtime, env: Environment, this: SelfBinding) -> Self {
        CallContext {
            runtime,
            env,
            this,
            caller_block: None,
        }
    }

    pub fn runtime(&self) -> &'rt Runtime {
        self.runtime
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    pub fn self_binding(&self) -> &SelfBinding {
        &self.this
    }

    pub fn receiver(&self) -> Value {
        self.this.receiver()
    }

    pub fn block(&self) -> Option<&Heap<ProcValue>> {
        self.this.block.as_ref()
    }

    /// The block of the frame that called the running built-in.
    ///
    /// `block_given?` is itself a method call, so it answers for its caller.
    pub fn caller_block(&self) -> Option<&Heap<ProcValue>> {
        self.caller_block.as_ref()
    }

    pub fn intern(&self, text: &str) -> Symbol {
        self.runtime.intern(text)
    }

    /// Same self, different scope.
    pub fn with_env(&self, env: Environment) -> CallContext<'rt> {
        CallContext {
            runtime: self.runtime,
            env,
            this: self.this.clone(),
            caller_block: self.caller_block.clone(),
        }
    }

    /// Same scope, different self.
    pub fn with_self(&self, this: SelfBinding) -> CallContext<'rt> {
        CallContext {
            runtime: self.runtime,
            env: self.env.clone(),
            this,
            caller_block: self.this.block.clone(),
        }
    }

    /// Evaluate a syntax node in this context.
    pub fn eval(&self, node: ExprId) -> EvalResult {
        self.runtime.evaluator().eval(self, node)
    }

    /// Call `method` on an explicit receiver.
    pub fn send(
        &self,
        receiver: &Value,
        method: Symbol,
        args: &[Value],
        block: Option<Heap<ProcValue>>,
    ) -> EvalResult {
        self.dispatch(receiver, method, args, block, Access::Receiver)
    }

    /// Call `method` only if it is public, whoever the caller is.
    pub fn public_send(
        &self,
        receiver: &Value,
        method: Symbol,
        args: &[Value],
        block: Option<Heap<ProcValue>>,
    ) -> EvalResult {
        self.dispatch(receiver, method, args, block, Access::PublicOnly)
    }

    /// Call `method` on the current self, as in `foo(1)` with no receiver.
    pub fn call_function(
        &self,
        method: Symbol,
        args: &[Value],
        block: Option<Heap<ProcValue>>,
    ) -> EvalResult {
        let receiver = self.this.receiver();
        self.dispatch(&receiver, method, args, block, Access::Function)
    }

    /// Call `method` ignoring visibility.
    pub fn send_privileged(
        &self,
        receiver: &Value,
        method: Symbol,
        args: &[Value],
        block: Option<Heap<ProcValue>>,
    ) -> EvalResult {
        self.dispatch(receiver, method, args, block, Access::Privileged)
    }

    /// Run a block with `args` bound to its parameters.
    ///
    /// Missing arguments bind to `nil`; extra ones are dropped.
    pub fn call_block(&self, block: &Heap<ProcValue>, args: &[Value]) -> EvalResult {
        let _frame = self.runtime.enter_call()?;
        ensure_sufficient_stack(|| {
            let env = block.env().child();
            bind_params(&env, block.params(), args);
            let callee = CallContext::new(self.runtime, env, self.binding_for(block.receiver()));
            callee.eval(block.body())
        })
    }

    /// Whether `receiver` has a method that an explicit call could reach.
    pub fn responds_to(&self, receiver: &Value, method: Symbol, include_all: bool) -> bool {
        let start = self.runtime.dispatch_class(receiver);
        ancestry::find_method(&start, method).is_some_and(|found| {
            include_all || found.method.visibility() == Visibility::Public
        })
    }

    /// The singleton class of `receiver`, creating it if needed.
    ///
    /// Returns the (possibly new) receiver handle alongside the eigenclass.
    /// When a plain object is promoted to an extended one, the self slots
    /// of this frame and of the top level, and bindings in the current scope
    /// chain that held the old handle, are rebound.
    pub fn singleton_class(&self, receiver: &Value) -> EvalResult<(Value, EigenclassRef)> {
        match receiver {
            Value::Extended(e) => Ok((receiver.clone(), e.eigenclass().clone())),
            Value::Class(class_like) => match class_like.metaclass() {
                Some(meta) => Ok((receiver.clone(), meta)),
                None => Err(cannot_define_singleton()),
            },
            Value::Nil | Value::Bool(_) | Value::Integer(_) | Value::Symbol(_) => {
                Err(cannot_define_singleton())
            }
            _ => {
                if let Some(existing) = self.promoted(receiver) {
                    return Ok(existing);
                }
                let class = ClassLike::Class(self.runtime.class_of(receiver));
                let eigen = crate::class::Eigenclass::new(
                    crate::method::MethodSet::new(),
                    Some(class),
                    self.env.clone(),
                    format!("#<Class:{}>", receiver.inspect()),
                );
                let extended = Value::extended(receiver.clone(), eigen.clone());
                let mut rebound = self.env.rebind_identical(receiver, &extended);
                rebound += usize::from(self.this.rebind(receiver, &extended));
                rebound += usize::from(self.runtime.rebind_main(receiver, &extended));
                tracing::trace!(receiver = %receiver.inspect(), rebound, "singleton class created");
                Ok((extended, eigen))
            }
        }
    }

    /// The extended handle of a plain `receiver` already promoted through
    /// this frame's self or the top-level self.
    fn promoted(&self, receiver: &Value) -> Option<(Value, EigenclassRef)> {
        [self.receiver(), self.runtime.main_object()]
            .into_iter()
            .find_map(|current| match &current {
                Value::Extended(e) if current.is_identical(receiver) => {
                    Some((current.clone(), e.eigenclass().clone()))
                }
                _ => None,
            })
    }

    /// Define a method on `receiver`'s singleton class. Returns the receiver
    /// handle that carries the method.
    pub fn define_singleton_method(
        &self,
        receiver: &Value,
        name: Symbol,
        method: Method,
    ) -> EvalResult {
        let (receiver, eigen) = self.singleton_class(receiver)?;
        eigen.define_method(name, method);
        let hook = self.runtime.names().singleton_method_added;
        self.send_privileged(&receiver, hook, &[Value::Symbol(name)], None)?;
        Ok(receiver)
    }

    /// Mix `modules` into `receiver`'s singleton class.
    ///
    /// Modules are applied in reverse so the first argument ends up nearest
    /// the receiver.
    pub fn extend(&self, receiver: &Value, modules: &[ModuleRef]) -> EvalResult {
        if matches!(
            receiver,
            Value::Nil | Value::Bool(_) | Value::Integer(_) | Value::Symbol(_)
        ) {
            return Err(type_error(format!(
                "can't extend {}",
                self.runtime.class_of(receiver).name()
            )));
        }
        let (receiver, eigen) = self.singleton_class(receiver)?;
        let target = ClassLike::Eigenclass(eigen);
        for module in modules.iter().rev() {
            target.include_module(module)?;
        }
        Ok(receiver)
    }

    #[tracing::instrument(level = "trace", skip(self, receiver, method, args, block), fields(method = %method))]
    fn dispatch(
        &self,
        receiver: &Value,
        method: Symbol,
        args: &[Value],
        block: Option<Heap<ProcValue>>,
        access: Access,
    ) -> EvalResult {
        let _frame = self.runtime.enter_call()?;
        ensure_sufficient_stack(|| {
            let start = self.runtime.dispatch_class(receiver);
            match ancestry::find_method(&start, method) {
                Some(found) => {
                    self.check_visibility(receiver, method, &found, access)?;
                    found.method.check_arity(args.len())?;
                    self.invoke(receiver, method, &found.method, args, block)
                }
                None => self.method_missing(&start, receiver, method, args, block),
            }
        })
    }

    fn check_visibility(
        &self,
        receiver: &Value,
        method: Symbol,
        found: &Found,
        access: Access,
    ) -> EvalResult<()> {
        if matches!(access, Access::Function | Access::Privileged) {
            return Ok(());
        }
        match found.method.visibility() {
            Visibility::Public => Ok(()),
            Visibility::Private => {
                let (inspect, class) = self.runtime.describe(receiver);
                Err(private_method_called(method.as_str(), &inspect, &class))
            }
            Visibility::Protected => {
                if access == Access::Receiver && self.runtime.is_a(&self.receiver(), &found.owner) {
                    Ok(())
                } else {
                    let (inspect, class) = self.runtime.describe(receiver);
                    Err(protected_method_called(method.as_str(), &inspect, &class))
                }
            }
        }
    }

    fn invoke(
        &self,
        receiver: &Value,
        name: Symbol,
        method: &Method,
        args: &[Value],
        block: Option<Heap<ProcValue>>,
    ) -> EvalResult {
        let this = self.binding_for(receiver).with_name(name).with_block(block);
        match method.body() {
            MethodBody::Builtin(f) => f(&self.with_self(this), args),
            MethodBody::Guest(body) => {
                let env = body.env.child();
                bind_params(&env, &body.params, args);
                CallContext::new(self.runtime, env, this).eval(body.body)
            }
            MethodBody::AttrReader(ivar) => Ok(receiver.ivar_get(*ivar).unwrap_or_default()),
            MethodBody::AttrWriter(ivar) => {
                let value = args.first().cloned().unwrap_or_default();
                if receiver.ivar_set(*ivar, value.clone()) {
                    Ok(value)
                } else {
                    Err(type_error(format!(
                        "can't modify instance variables of {}",
                        receiver.inspect()
                    )))
                }
            }
        }
    }

    /// A self binding for a callee running on `receiver`, sharing this
    /// frame's slot when the callee runs on the same object.
    fn binding_for(&self, receiver: &Value) -> SelfBinding {
        if receiver.is_identical(&self.receiver()) {
            self.this.same_self()
        } else {
            SelfBinding::new(receiver.clone())
        }
    }

    fn method_missing(
        &self,
        start: &ClassLike,
        receiver: &Value,
        method: Symbol,
        args: &[Value],
        block: Option<Heap<ProcValue>>,
    ) -> EvalResult {
        tracing::debug!(method = %method, receiver = %receiver.inspect(), "method_missing");
        let hook = self.runtime.names().method_missing;
        match ancestry::find_method(start, hook) {
            Some(found) => {
                let mut forwarded = Vec::with_capacity(args.len() + 1);
                forwarded.push(Value::Symbol(method));
                forwarded.extend_from_slice(args);
                self.invoke(receiver, hook, &found.method, &forwarded, block)
            }
            None => {
                let (inspect, class) = self.runtime.describe(receiver);
                Err(no_method_error(method.as_str(), &inspect, &class))
            }
        }
    }
}

fn bind_params(env: &Environment, params: &[Symbol], args: &[Value]) {
    for (index, param) in params.iter().enumerate() {
        env.set(*param, args.get(index).cloned().unwrap_or_default());
    }
}
