//! Lexical environments.
//!
//! An [`Environment`] is a handle on a chain of scopes. Handles are cheap to
//! clone and share their scope, so a method body, the block it captured and
//! the class body that defined it can all see the same bindings.
//!
//! Three kinds of scope exist:
//! - the root scope, which holds constants, globals and top-level locals;
//! - ordinary child scopes, created for method and block bodies;
//! - isolated child scopes, created for required files. Locals assigned in
//!   an isolated scope stay there, but constants write through to the parent
//!   so a required file's `class Foo` is visible to its requirer.
//!
//! Globals (`$name`) always live in the root scope regardless of where they
//! are assigned.

use std::cell::RefCell;
use std::fmt;
use std::ops::Deref;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::symbol::Symbol;
use crate::value::Value;

/// A single-threaded, shared, mutable scope.
///
/// Wraps `Rc<RefCell<T>>` so every scope allocation goes through
/// [`LocalScope::new`].
#[repr(transparent)]
pub struct LocalScope<T>(Rc<RefCell<T>>);

impl<T> LocalScope<T> {
    #[inline]
    pub fn new(value: T) -> Self {
        LocalScope(Rc::new(RefCell::new(value)))
    }

    #[inline]
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Rc::ptr_eq(&a.0, &b.0)
    }
}

impl<T> Clone for LocalScope<T> {
    #[inline]
    fn clone(&self) -> Self {
        LocalScope(Rc::clone(&self.0))
    }
}

impl<T: fmt::Debug> fmt::Debug for LocalScope<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_borrow() {
            Ok(value) => fmt::Debug::fmt(&*value, f),
            Err(_) => f.write_str("<borrowed>"),
        }
    }
}

impl<T> Deref for LocalScope<T> {
    type Target = RefCell<T>;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum ScopeKind {
    Root,
    Local,
    Isolated,
}

/// One level of bindings.
pub struct Scope {
    bindings: FxHashMap<Symbol, Value>,
    parent: Option<LocalScope<Scope>>,
    kind: ScopeKind,
}

impl Scope {
    fn root() -> Self {
        Scope {
            bindings: FxHashMap::default(),
            parent: None,
            kind: ScopeKind::Root,
        }
    }

    fn with_parent(parent: LocalScope<Scope>, kind: ScopeKind) -> Self {
        Scope {
            bindings: FxHashMap::default(),
            parent: Some(parent),
            kind,
        }
    }

    #[inline]
    fn lookup(&self, name: Symbol) -> Option<Value> {
        if let Some(value) = self.bindings.get(&name) {
            return Some(value.clone());
        }
        if let Some(parent) = &self.parent {
            return parent.borrow().lookup(name);
        }
        None
    }
}

/// Handle on a scope chain.
#[derive(Clone)]
pub struct Environment {
    scope: LocalScope<Scope>,
}

impl Environment {
    /// A new root environment.
    pub fn new() -> Self {
        Environment {
            scope: LocalScope::new(Scope::root()),
        }
    }

    /// A child scope for a method or block body.
    #[must_use]
    pub fn child(&self) -> Self {
        Environment {
            scope: LocalScope::new(Scope::with_parent(self.scope.clone(), ScopeKind::Local)),
        }
    }

    /// A child scope whose locals do not leak into `self`.
    ///
    /// Constants assigned in the child are written to `self` instead.
    #[must_use]
    pub fn isolated_child(&self) -> Self {
        Environment {
            scope: LocalScope::new(Scope::with_parent(
                self.scope.clone(),
                ScopeKind::Isolated,
            )),
        }
    }

    /// The outermost scope of this chain.
    #[must_use]
    pub fn root(&self) -> Self {
        let mut current = self.scope.clone();
        loop {
            let parent = current.borrow().parent.clone();
            match parent {
                Some(parent) => current = parent,
                None => return Environment { scope: current },
            }
        }
    }

    pub fn is_root(&self) -> bool {
        self.scope.borrow().kind == ScopeKind::Root
    }

    /// Look a name up through the chain.
    #[inline]
    pub fn get(&self, name: Symbol) -> Option<Value> {
        self.scope.borrow().lookup(name)
    }

    /// Whether the name is bound in this scope, ignoring parents.
    pub fn has_local(&self, name: Symbol) -> bool {
        self.scope.borrow().bindings.contains_key(&name)
    }

    /// Bind a name.
    ///
    /// Globals go to the root scope. Constants assigned inside an isolated
    /// scope go to its parent. Everything else is bound in this scope.
    pub fn set(&self, name: Symbol, value: Value) {
        if name.is_global() {
            self.set_global(name, value);
            return;
        }
        let write_through = {
            let scope = self.scope.borrow();
            match (&scope.parent, scope.kind) {
                (Some(parent), ScopeKind::Isolated) if name.is_constant() => Some(parent.clone()),
                _ => None,
            }
        };
        match write_through {
            Some(parent) => Environment { scope: parent }.set(name, value),
            None => {
                self.scope.borrow_mut().bindings.insert(name, value);
            }
        }
    }

    /// Bind a name in the root scope.
    pub fn set_global(&self, name: Symbol, value: Value) {
        self.root().scope.borrow_mut().bindings.insert(name, value);
    }

    /// Replace every binding identical to `old` with `new`, in this scope
    /// and all of its parents. Returns how many bindings changed.
    ///
    /// Used when an object is promoted to a singleton-bearing wrapper so that
    /// variables holding the old handle observe the new one.
    pub fn rebind_identical(&self, old: &Value, new: &Value) -> usize {
        let mut replaced = 0;
        let mut current = Some(self.scope.clone());
        while let Some(scope) = current {
            let mut guard = scope.borrow_mut();
            for value in guard.bindings.values_mut() {
                if value.is_identical(old) {
                    *value = new.clone();
                    replaced += 1;
                }
            }
            current = guard.parent.clone();
        }
        replaced
    }

    /// Names bound directly in this scope, sorted.
    pub fn local_names(&self) -> Vec<Symbol> {
        let mut names: Vec<Symbol> = self.scope.borrow().bindings.keys().copied().collect();
        names.sort();
        names
    }

    /// Whether both handles denote the same scope.
    pub fn ptr_eq(&self, other: &Environment) -> bool {
        LocalScope::ptr_eq(&self.scope, &other.scope)
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scope = self.scope.borrow();
        f.debug_struct("Environment")
            .field("kind", &scope.kind)
            .field("bindings", &scope.bindings.len())
            .finish_non_exhaustive()
    }
}
