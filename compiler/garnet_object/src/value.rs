//! Guest values.
//!
//! Immediates (`nil`, booleans, integers, symbols) are stored inline and
//! compare by value. Everything else lives behind a [`Heap`] handle and
//! compares by allocation identity.

use std::cell::RefCell;
use std::fmt;

use garnet_ir::ExprId;
use rustc_hash::FxHashMap;

use crate::class::{ClassLike, ClassRef, EigenclassRef};
use crate::environment::Environment;
use crate::errors::ExceptionObject;
use crate::heap::Heap;
use crate::symbol::Symbol;

/// Shared, mutable guest array.
pub type ArrayRef = Heap<RefCell<Vec<Value>>>;

/// Coarse type tag of a value.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Nil,
    Boolean,
    Integer,
    String,
    Symbol,
    Array,
    Object,
    Class,
    Module,
    Exception,
    Proc,
}

/// A guest value.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Nil,
    Bool(bool),
    Integer(i64),
    Str(Heap<String>),
    Symbol(Symbol),
    Array(ArrayRef),
    /// Instance of a user-defined (or plain `Object`) class.
    Object(Heap<Instance>),
    /// A class, module, or one of their internal views.
    Class(ClassLike),
    Exception(Heap<ExceptionObject>),
    Proc(Heap<ProcValue>),
    /// An object that has acquired a singleton class.
    Extended(Heap<ExtendedObject>),
}

/// Plain guest object.
pub struct Instance {
    class: ClassRef,
    ivars: RefCell<FxHashMap<Symbol, Value>>,
}

impl Instance {
    pub fn class(&self) -> &ClassRef {
        &self.class
    }
}

/// A block or proc: parameters, body and the scope it closes over.
pub struct ProcValue {
    params: Vec<Symbol>,
    body: ExprId,
    env: Environment,
    receiver: Value,
}

impl ProcValue {
    pub fn params(&self) -> &[Symbol] {
        &self.params
    }

    pub fn body(&self) -> ExprId {
        self.body
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    /// `self` at the point the block was created.
    pub fn receiver(&self) -> &Value {
        &self.receiver
    }
}

/// An object paired with its singleton class.
///
/// The backing object keeps its identity for `==`, `class` and instance
/// variables, while dispatch starts at `eigen`.
pub struct ExtendedObject {
    backing: Value,
    eigen: EigenclassRef,
}

impl ExtendedObject {
    pub fn backing(&self) -> &Value {
        &self.backing
    }

    pub fn eigenclass(&self) -> &EigenclassRef {
        &self.eigen
    }
}

impl Value {
    pub fn string(text: impl Into<String>) -> Value {
        Value::Str(Heap::new(text.into()))
    }

    pub fn array(items: Vec<Value>) -> Value {
        Value::Array(Heap::new(RefCell::new(items)))
    }

    pub fn symbols(symbols: impl IntoIterator<Item = Symbol>) -> Value {
        Value::array(symbols.into_iter().map(Value::Symbol).collect())
    }

    pub fn block(params: Vec<Symbol>, body: ExprId, env: Environment, receiver: Value) -> Value {
        Value::Proc(Heap::new(ProcValue {
            params,
            body,
            env,
            receiver,
        }))
    }

    pub(crate) fn instance(class: ClassRef) -> Value {
        Value::Object(Heap::new(Instance {
            class,
            ivars: RefCell::new(FxHashMap::default()),
        }))
    }

    pub(crate) fn extended(backing: Value, eigen: EigenclassRef) -> Value {
        Value::Extended(Heap::new(ExtendedObject { backing, eigen }))
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Nil => ValueKind::Nil,
            Value::Bool(_) => ValueKind::Boolean,
            Value::Integer(_) => ValueKind::Integer,
            Value::Str(_) => ValueKind::String,
            Value::Symbol(_) => ValueKind::Symbol,
            Value::Array(_) => ValueKind::Array,
            Value::Object(_) => ValueKind::Object,
            Value::Class(ClassLike::Module(_)) => ValueKind::Module,
            Value::Class(_) => ValueKind::Class,
            Value::Exception(_) => ValueKind::Exception,
            Value::Proc(_) => ValueKind::Proc,
            Value::Extended(e) => e.backing.kind(),
        }
    }

    /// Everything except `nil` and `false` is truthy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Bool(false))
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// The object beneath any singleton wrapper.
    pub fn unwrap_extended(&self) -> &Value {
        match self {
            Value::Extended(e) => e.backing.unwrap_extended(),
            other => other,
        }
    }

    /// Object identity (`equal?`). Wrappers are transparent.
    pub fn is_identical(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Extended(a), Value::Extended(b)) => Heap::ptr_eq(a, b),
            (Value::Extended(_), _) | (_, Value::Extended(_)) => {
                self.unwrap_extended().is_identical(other.unwrap_extended())
            }
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => Heap::ptr_eq(a, b),
            (Value::Array(a), Value::Array(b)) => Heap::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => Heap::ptr_eq(a, b),
            (Value::Class(a), Value::Class(b)) => a.is_same(b),
            (Value::Exception(a), Value::Exception(b)) => Heap::ptr_eq(a, b),
            (Value::Proc(a), Value::Proc(b)) => Heap::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Built-in value equality (`==` for core types).
    ///
    /// Strings and arrays compare by content. Every other value compares by
    /// identity.
    pub fn value_eq(&self, other: &Value) -> bool {
        match (self.unwrap_extended(), other.unwrap_extended()) {
            (Value::Str(a), Value::Str(b)) => **a == **b,
            (Value::Array(a), Value::Array(b)) => {
                if Heap::ptr_eq(a, b) {
                    return true;
                }
                let a = a.borrow();
                let b = b.borrow();
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.value_eq(y))
            }
            (a, b) => a.is_identical(b),
        }
    }

    /// A stable identity number.
    pub fn object_id(&self) -> usize {
        match self.unwrap_extended() {
            Value::Nil => 8,
            Value::Bool(true) => 20,
            Value::Bool(false) => 0,
            #[allow(
                clippy::cast_sign_loss,
                clippy::cast_possible_truncation,
                reason = "object ids only need to be distinct, not numeric"
            )]
            Value::Integer(n) => (n.wrapping_mul(2).wrapping_add(1)) as usize,
            Value::Symbol(s) => (s.name().raw() as usize) * 8 + 12,
            Value::Str(h) => h.addr(),
            Value::Array(h) => h.addr(),
            Value::Object(h) => h.addr(),
            Value::Class(c) => c.addr(),
            Value::Exception(h) => h.addr(),
            Value::Proc(h) => h.addr(),
            Value::Extended(h) => h.addr(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self.unwrap_extended() {
            Value::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_symbol(&self) -> Option<Symbol> {
        match self.unwrap_extended() {
            Value::Symbol(s) => Some(*s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self.unwrap_extended() {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&ArrayRef> {
        match self.unwrap_extended() {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_class_like(&self) -> Option<&ClassLike> {
        match self.unwrap_extended() {
            Value::Class(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_exception(&self) -> Option<&Heap<ExceptionObject>> {
        match self.unwrap_extended() {
            Value::Exception(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_proc(&self) -> Option<&Heap<ProcValue>> {
        match self.unwrap_extended() {
            Value::Proc(p) => Some(p),
            _ => None,
        }
    }

    /// Read an instance variable. `None` when unset or the value cannot
    /// carry instance variables.
    pub fn ivar_get(&self, name: Symbol) -> Option<Value> {
        match self.unwrap_extended() {
            Value::Object(o) => o.ivars.borrow().get(&name).cloned(),
            _ => None,
        }
    }

    /// Write an instance variable. Returns `false` when the value cannot
    /// carry instance variables.
    pub fn ivar_set(&self, name: Symbol, value: Value) -> bool {
        match self.unwrap_extended() {
            Value::Object(o) => {
                o.ivars.borrow_mut().insert(name, value);
                true
            }
            _ => false,
        }
    }

    /// Instance variable names in definition-independent (sorted) order.
    pub fn ivar_names(&self) -> Vec<Symbol> {
        match self.unwrap_extended() {
            Value::Object(o) => {
                let mut names: Vec<Symbol> = o.ivars.borrow().keys().copied().collect();
                names.sort();
                names
            }
            _ => Vec::new(),
        }
    }

    /// Debug-style rendering used in error messages and `inspect`.
    pub fn inspect(&self) -> String {
        let mut out = String::new();
        self.write_inspect(&mut out, &mut Vec::new());
        out
    }

    fn write_inspect(&self, out: &mut String, open_arrays: &mut Vec<usize>) {
        use std::fmt::Write;
        match self {
            Value::Nil => out.push_str("nil"),
            Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
            Value::Integer(n) => {
                let _ = write!(out, "{n}");
            }
            Value::Str(s) => {
                let _ = write!(out, "{:?}", s.as_str());
            }
            Value::Symbol(s) => {
                let _ = write!(out, ":{s}");
            }
            Value::Array(items) => {
                if open_arrays.contains(&items.addr()) {
                    out.push_str("[...]");
                    return;
                }
                open_arrays.push(items.addr());
                out.push('[');
                for (i, item) in items.borrow().iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    item.write_inspect(out, open_arrays);
                }
                out.push(']');
                open_arrays.pop();
            }
            Value::Object(o) => {
                let _ = write!(out, "#<{}>", o.class.name());
            }
            Value::Class(c) => out.push_str(&c.inspect()),
            Value::Exception(e) => out.push_str(&e.inspect()),
            Value::Proc(p) => {
                let _ = write!(out, "#<Proc:0x{:016x}>", p.addr());
            }
            Value::Extended(e) => e.backing.write_inspect(out, open_arrays),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<Symbol> for Value {
    fn from(s: Symbol) -> Self {
        Value::Symbol(s)
    }
}

impl From<ClassLike> for Value {
    fn from(c: ClassLike) -> Self {
        Value::Class(c)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inspect())
    }
}

impl fmt::Debug for ProcValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcValue")
            .field("params", &self.params)
            .field("body", &self.body)
            .field("receiver", &self.receiver)
            .finish_non_exhaustive()
    }
}
