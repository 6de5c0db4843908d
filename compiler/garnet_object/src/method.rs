//! Methods and method tables.

use std::fmt;

use garnet_ir::ExprId;
use rustc_hash::FxHashMap;

use crate::dispatch::CallContext;
use crate::environment::Environment;
use crate::errors::{wrong_number_of_arguments, EvalResult};
use crate::heap::Heap;
use crate::symbol::{Symbol, SymbolTable};
use crate::value::Value;

/// Who may call a method.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Visibility {
    #[default]
    Public,
    Protected,
    Private,
}

impl Visibility {
    pub fn name(self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Protected => "protected",
            Visibility::Private => "private",
        }
    }
}

/// Host implementation of a built-in method.
pub type BuiltinFn = fn(&CallContext<'_>, &[Value]) -> EvalResult;

/// A method body defined in guest code.
pub struct GuestBody {
    pub(crate) params: Vec<Symbol>,
    pub(crate) body: ExprId,
    pub(crate) env: Environment,
}

/// What runs when a method is invoked.
#[derive(Clone)]
pub enum MethodBody {
    Builtin(BuiltinFn),
    Guest(Heap<GuestBody>),
    /// Generated by `attr_reader`: returns the named instance variable.
    AttrReader(Symbol),
    /// Generated by `attr_writer`: assigns the named instance variable.
    AttrWriter(Symbol),
}

/// A method entry: body, visibility and optional fixed arity.
#[derive(Clone)]
pub struct Method {
    body: MethodBody,
    visibility: Visibility,
    arity: Option<usize>,
}

impl Method {
    fn builtin(f: BuiltinFn, visibility: Visibility) -> Self {
        Method {
            body: MethodBody::Builtin(f),
            visibility,
            arity: None,
        }
    }

    pub fn public(f: BuiltinFn) -> Self {
        Self::builtin(f, Visibility::Public)
    }

    pub fn protected(f: BuiltinFn) -> Self {
        Self::builtin(f, Visibility::Protected)
    }

    pub fn private(f: BuiltinFn) -> Self {
        Self::builtin(f, Visibility::Private)
    }

    /// A guest-defined method. Its arity is the parameter count.
    pub fn guest(
        params: Vec<Symbol>,
        body: ExprId,
        env: Environment,
        visibility: Visibility,
    ) -> Self {
        let arity = params.len();
        Method {
            body: MethodBody::Guest(Heap::new(GuestBody { params, body, env })),
            visibility,
            arity: Some(arity),
        }
    }

    pub fn attr_reader(ivar: Symbol, visibility: Visibility) -> Self {
        Method {
            body: MethodBody::AttrReader(ivar),
            visibility,
            arity: Some(0),
        }
    }

    pub fn attr_writer(ivar: Symbol, visibility: Visibility) -> Self {
        Method {
            body: MethodBody::AttrWriter(ivar),
            visibility,
            arity: Some(1),
        }
    }

    /// Require exactly `arity` arguments at every call.
    #[must_use]
    pub fn with_arity(mut self, arity: usize) -> Self {
        self.arity = Some(arity);
        self
    }

    #[must_use]
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn body(&self) -> &MethodBody {
        &self.body
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn arity(&self) -> Option<usize> {
        self.arity
    }

    /// Fail with `ArgumentError` when a fixed arity is not met.
    pub fn check_arity(&self, given: usize) -> EvalResult<()> {
        match self.arity {
            Some(expected) if expected != given => Err(wrong_number_of_arguments(given, expected)),
            _ => Ok(()),
        }
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let body = match self.body {
            MethodBody::Builtin(_) => "builtin",
            MethodBody::Guest(_) => "guest",
            MethodBody::AttrReader(_) => "attr_reader",
            MethodBody::AttrWriter(_) => "attr_writer",
        };
        f.debug_struct("Method")
            .field("body", &body)
            .field("visibility", &self.visibility)
            .field("arity", &self.arity)
            .finish()
    }
}

/// Methods keyed by name.
#[derive(Clone, Debug, Default)]
pub struct MethodSet {
    methods: FxHashMap<Symbol, Method>,
}

impl MethodSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from `(name, method)` pairs, interning the names.
    pub fn from_entries<'a>(
        symbols: &SymbolTable,
        entries: impl IntoIterator<Item = (&'a str, Method)>,
    ) -> Self {
        MethodSet {
            methods: entries
                .into_iter()
                .map(|(name, method)| (symbols.intern(name), method))
                .collect(),
        }
    }

    #[inline]
    pub fn get(&self, name: Symbol) -> Option<&Method> {
        self.methods.get(&name)
    }

    pub fn contains(&self, name: Symbol) -> bool {
        self.methods.contains_key(&name)
    }

    /// Add or replace a method. Returns the previous entry.
    pub fn insert(&mut self, name: Symbol, method: Method) -> Option<Method> {
        self.methods.insert(name, method)
    }

    pub fn remove(&mut self, name: Symbol) -> Option<Method> {
        self.methods.remove(&name)
    }

    /// Change the visibility of an existing entry. Returns `false` if absent.
    pub fn set_visibility(&mut self, name: Symbol, visibility: Visibility) -> bool {
        match self.methods.get_mut(&name) {
            Some(method) => {
                method.visibility = visibility;
                true
            }
            None => false,
        }
    }

    /// Copy every entry of `other` into `self`, replacing on conflict.
    pub fn merge(&mut self, other: &MethodSet) {
        for (name, method) in &other.methods {
            self.methods.insert(*name, method.clone());
        }
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Symbol, &Method)> {
        self.methods.iter().map(|(name, method)| (*name, method))
    }

    /// Names whose visibility passes `filter`, sorted.
    pub fn names_where(&self, filter: impl Fn(Visibility) -> bool) -> Vec<Symbol> {
        let mut names: Vec<Symbol> = self
            .methods
            .iter()
            .filter(|(_, m)| filter(m.visibility))
            .map(|(name, _)| *name)
            .collect();
        names.sort();
        names
    }
}
