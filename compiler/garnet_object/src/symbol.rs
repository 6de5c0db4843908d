//! Guest symbols and the symbol table.
//!
//! A `Symbol` is an interned handle: for a given text there is exactly one
//! symbol per table, so equality is handle equality. The table is a narrow
//! capability over [`SharedInterner`]: runtimes built independently get
//! independent tables, and runtimes that should share symbols are built
//! from the same interner.

use std::fmt;
use std::hash::{Hash, Hasher};

use garnet_ir::{Name, SharedInterner};

/// Interned guest symbol.
#[derive(Copy, Clone)]
pub struct Symbol {
    name: Name,
    text: &'static str,
}

impl Symbol {
    /// The interned handle.
    #[inline]
    pub fn name(self) -> Name {
        self.name
    }

    /// The symbol's text.
    #[inline]
    pub fn as_str(self) -> &'static str {
        self.text
    }

    /// `Foo`, `BasicObject`: names that denote constants.
    pub fn is_constant(self) -> bool {
        self.text.chars().next().is_some_and(char::is_uppercase)
    }

    /// `$LOADED_FEATURES`, `$:`: names that always live in the global scope.
    pub fn is_global(self) -> bool {
        self.text.starts_with('$')
    }

    /// `@name`: instance variable names.
    pub fn is_instance_variable(self) -> bool {
        self.text.starts_with('@') && !self.text.starts_with("@@")
    }
}

impl PartialEq for Symbol {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Symbol {}

impl Hash for Symbol {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl PartialOrd for Symbol {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Orders by text. Symbols from unrelated tables can share a text; the
/// interned handle breaks that tie so `Ord` agrees with `Eq`.
impl Ord for Symbol {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.text
            .cmp(other.text)
            .then_with(|| self.name.cmp(&other.name))
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ":{}", self.text)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text)
    }
}

/// The guest symbol table.
#[derive(Clone, Default)]
pub struct SymbolTable {
    interner: SharedInterner,
}

impl SymbolTable {
    /// A fresh table, private to whoever holds it.
    pub fn new() -> Self {
        Self::default()
    }

    /// A table backed by an existing interner.
    pub fn with_interner(interner: SharedInterner) -> Self {
        SymbolTable { interner }
    }

    /// Intern `text`, returning the unique symbol for it.
    #[inline]
    pub fn intern(&self, text: &str) -> Symbol {
        let name = self.interner.intern(text);
        Symbol {
            name,
            text: self.interner.lookup(name),
        }
    }

    /// Rebuild the symbol for a handle produced by this table.
    pub fn from_name(&self, name: Name) -> Symbol {
        Symbol {
            name,
            text: self.interner.lookup(name),
        }
    }

    /// Every symbol created so far, sorted by text.
    pub fn all(&self) -> Vec<Symbol> {
        let mut symbols: Vec<Symbol> = self
            .interner
            .entries()
            .into_iter()
            .map(|(name, text)| Symbol { name, text })
            .collect();
        symbols.sort();
        symbols
    }

    /// The underlying interner, for sharing with another runtime.
    pub fn interner(&self) -> &SharedInterner {
        &self.interner
    }
}

impl fmt::Debug for SymbolTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SymbolTable({} symbols)", self.interner.len())
    }
}
