//! Pre-interned names used on hot or internal paths.
//!
//! Interned once when a runtime is built so dispatch compares symbols
//! instead of hashing strings.

use crate::symbol::{Symbol, SymbolTable};

#[derive(Clone, Copy, Debug)]
pub(crate) struct WellKnownNames {
    pub(crate) initialize: Symbol,
    pub(crate) method_missing: Symbol,
    pub(crate) respond_to_missing: Symbol,
    pub(crate) singleton_method_added: Symbol,
    pub(crate) exception: Symbol,
    pub(crate) new: Symbol,
    pub(crate) loaded_features: Symbol,
    pub(crate) loaded_features_alias: Symbol,
    pub(crate) load_path: Symbol,
    pub(crate) load_path_alias: Symbol,
}

impl WellKnownNames {
    pub(crate) fn new(symbols: &SymbolTable) -> Self {
        WellKnownNames {
            initialize: symbols.intern("initialize"),
            method_missing: symbols.intern("method_missing"),
            respond_to_missing: symbols.intern("respond_to_missing?"),
            singleton_method_added: symbols.intern("singleton_method_added"),
            exception: symbols.intern("exception"),
            new: symbols.intern("new"),
            loaded_features: symbols.intern("$LOADED_FEATURES"),
            loaded_features_alias: symbols.intern("$\""),
            load_path: symbols.intern("$LOAD_PATH"),
            load_path_alias: symbols.intern("$:"),
        }
    }
}
