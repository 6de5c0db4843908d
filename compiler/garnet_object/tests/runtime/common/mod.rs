//! Shared helpers: a scripted evaluator and shortcuts for calling into the
//! runtime the way evaluated guest code would.

use std::cell::{Cell, RefCell};
use std::path::Path;
use std::rc::Rc;

use garnet_object::{
    CallContext, ClassLike, EvalResult, Evaluator, ExprId, Method, ParseError, Runtime,
    SelfBinding, Value, Visibility,
};
use rustc_hash::FxHashMap;

type Node = Rc<dyn Fn(&CallContext<'_>) -> EvalResult>;

/// Evaluator whose syntax nodes are Rust closures.
///
/// Source files are matched by their trimmed text against registered
/// programs; anything else fails to parse.
#[derive(Default)]
pub struct Scripted {
    nodes: RefCell<Vec<Node>>,
    programs: RefCell<FxHashMap<String, ExprId>>,
    evals: Cell<usize>,
}

impl Scripted {
    pub fn new() -> Rc<Self> {
        Rc::new(Scripted::default())
    }

    /// Register a node.
    pub fn node(&self, body: impl Fn(&CallContext<'_>) -> EvalResult + 'static) -> ExprId {
        let mut nodes = self.nodes.borrow_mut();
        nodes.push(Rc::new(body));
        ExprId::new(u32::try_from(nodes.len() - 1).unwrap())
    }

    /// Register a node that a file containing exactly `source` parses to.
    pub fn program(
        &self,
        source: &str,
        body: impl Fn(&CallContext<'_>) -> EvalResult + 'static,
    ) -> ExprId {
        let id = self.node(body);
        self.programs.borrow_mut().insert(source.trim().to_owned(), id);
        id
    }

    /// How many nodes have been evaluated so far.
    pub fn evals(&self) -> usize {
        self.evals.get()
    }
}

impl Evaluator for Scripted {
    fn eval(&self, ctx: &CallContext<'_>, node: ExprId) -> EvalResult {
        self.evals.set(self.evals.get() + 1);
        let body = Rc::clone(&self.nodes.borrow()[node.index()]);
        body(ctx)
    }

    fn parse(&self, _path: &Path, source: &str) -> Result<ExprId, ParseError> {
        self.programs
            .borrow()
            .get(source.trim())
            .copied()
            .ok_or_else(|| ParseError::new(format!("unexpected token in {source:?}")).at_line(1))
    }
}

/// A runtime driven by `evaluator`. Set `RUST_LOG` to see dispatch traces.
pub fn runtime(evaluator: &Rc<Scripted>) -> Runtime {
    garnet_object::init_tracing();
    Runtime::new(Rc::clone(evaluator))
}

/// Same, resolving `require` against `dir`.
pub fn runtime_in(evaluator: &Rc<Scripted>, dir: &Path) -> Runtime {
    garnet_object::init_tracing();
    Runtime::builder()
        .evaluator(Rc::clone(evaluator))
        .working_dir(dir)
        .build()
}

pub fn sym(ctx: &CallContext<'_>, name: &str) -> Value {
    Value::Symbol(ctx.intern(name))
}

/// `receiver.method(*args)` with an explicit receiver.
pub fn call(ctx: &CallContext<'_>, receiver: &Value, method: &str, args: &[Value]) -> EvalResult {
    ctx.send(receiver, ctx.intern(method), args, None)
}

/// `receiver.method(*args) { |params| body }`.
pub fn call_with_block(
    ctx: &CallContext<'_>,
    receiver: &Value,
    method: &str,
    args: &[Value],
    params: &[&str],
    body: ExprId,
) -> EvalResult {
    let block = block(ctx, params, body);
    ctx.send(receiver, ctx.intern(method), args, block.as_proc().cloned())
}

/// A block closing over the current scope and self.
pub fn block(ctx: &CallContext<'_>, params: &[&str], body: ExprId) -> Value {
    Value::block(
        params.iter().map(|p| ctx.intern(p)).collect(),
        body,
        ctx.env().clone(),
        ctx.receiver(),
    )
}

/// `def name(params) ... end` inside `target`, honouring its current
/// default visibility.
pub fn def(ctx: &CallContext<'_>, target: &ClassLike, name: &str, params: &[&str], body: ExprId) {
    target.define_method(
        ctx.intern(name),
        Method::guest(
            params.iter().map(|p| ctx.intern(p)).collect(),
            body,
            target.env(),
            target.default_visibility(),
        ),
    );
}

/// `def name ... end` with an explicit visibility.
pub fn def_with(
    ctx: &CallContext<'_>,
    target: &ClassLike,
    name: &str,
    body: ExprId,
    visibility: Visibility,
) {
    target.define_method(
        ctx.intern(name),
        Method::guest(Vec::new(), body, target.env(), visibility),
    );
}

/// A local variable or parameter in the current scope.
pub fn local(ctx: &CallContext<'_>, name: &str) -> Value {
    ctx.env().get(ctx.intern(name)).unwrap_or_default()
}

/// Symbol array contents as plain strings.
pub fn names(value: &Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .borrow()
                .iter()
                .map(|item| match item.as_symbol() {
                    Some(symbol) => symbol.as_str().to_owned(),
                    None => item.inspect(),
                })
                .collect()
        })
        .unwrap_or_default()
}

pub fn class_value(class: &garnet_object::ClassRef) -> Value {
    ClassLike::Class(class.clone()).to_value()
}

pub fn module_value(module: &garnet_object::ModuleRef) -> Value {
    ClassLike::Module(module.clone()).to_value()
}

/// A context whose self is `receiver`, as inside a `class` body or method.
pub fn within<'rt>(ctx: &CallContext<'rt>, receiver: &Value) -> CallContext<'rt> {
    ctx.with_self(SelfBinding::new(receiver.clone()))
}

/// `method(*args)` with the implicit receiver.
pub fn fcall(ctx: &CallContext<'_>, method: &str, args: &[Value]) -> EvalResult {
    ctx.call_function(ctx.intern(method), args, None)
}
