//! `RuntimeBuilder` for creating runtimes with various configurations.

use std::cell::{Cell, RefCell};
use std::path::PathBuf;

use garnet_ir::SharedInterner;
use rustc_hash::FxHashSet;

use super::bootstrap::CoreClasses;
use super::names::WellKnownNames;
use super::{Runtime, RuntimeConfig};
use crate::dispatch::SelfBinding;
use crate::environment::Environment;
use crate::evaluator::{Evaluator, NoEvaluator};
use crate::symbol::SymbolTable;
use crate::value::Value;

/// Builder for [`Runtime`].
///
/// Every runtime gets its own symbol table unless [`RuntimeBuilder::symbols`]
/// hands it an interner shared with another runtime.
#[derive(Default)]
pub struct RuntimeBuilder {
    config: RuntimeConfig,
    evaluator: Option<Box<dyn Evaluator>>,
    interner: Option<SharedInterner>,
}

impl RuntimeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the front end that parses files and runs guest code.
    #[must_use]
    pub fn evaluator(mut self, evaluator: impl Evaluator + 'static) -> Self {
        self.evaluator = Some(Box::new(evaluator));
        self
    }

    /// Share symbols with every other runtime built from `interner`.
    #[must_use]
    pub fn symbols(mut self, interner: SharedInterner) -> Self {
        self.interner = Some(interner);
        self
    }

    #[must_use]
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn source_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.config.source_suffix = suffix.into();
        self
    }

    #[must_use]
    pub fn load_path(mut self, paths: impl IntoIterator<Item = PathBuf>) -> Self {
        self.config.load_path = paths.into_iter().collect();
        self
    }

    #[must_use]
    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.working_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn max_call_depth(mut self, depth: usize) -> Self {
        self.config.max_call_depth = depth;
        self
    }

    /// Bootstrap the core classes and the main environment.
    pub fn build(self) -> Runtime {
        let symbols = SymbolTable::with_interner(self.interner.unwrap_or_default());
        let names = WellKnownNames::new(&symbols);
        let main_env = Environment::new();
        let core = CoreClasses::bootstrap(&symbols, &main_env);

        for constant in core.constants() {
            if let Some(name) = constant.symbol() {
                main_env.set(name, constant.to_value());
            }
        }

        let loaded_features = Value::array(Vec::new());
        main_env.set_global(names.loaded_features, loaded_features.clone());
        main_env.set_global(names.loaded_features_alias, loaded_features);

        let load_path = Value::array(
            self.config
                .load_path
                .iter()
                .map(|p| Value::string(p.to_string_lossy()))
                .collect(),
        );
        main_env.set_global(names.load_path, load_path.clone());
        main_env.set_global(names.load_path_alias, load_path);

        let main_self = SelfBinding::new(Value::instance(core.object.clone()));

        tracing::debug!(
            max_call_depth = self.config.max_call_depth,
            load_path = self.config.load_path.len(),
            "runtime bootstrapped"
        );

        Runtime {
            config: self.config,
            symbols,
            names,
            core,
            main_env,
            main_self,
            evaluator: self.evaluator.unwrap_or_else(|| Box::new(NoEvaluator)),
            loading: RefCell::new(FxHashSet::default()),
            depth: Cell::new(0),
        }
    }
}
