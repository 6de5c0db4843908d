//! `require` and `load`: finding guest source files and evaluating them.
//!
//! A feature moves through *not loaded* → *loading* → *loaded*. Only a
//! successful evaluation records it in `$LOADED_FEATURES`; every failure
//! leaves the ledger untouched so a later `require` tries again.
//!
//! Resolution:
//! - the configured suffix (`.rb` by default) is appended unless present
//! - absolute features, and ones starting with `./` or `../`, resolve
//!   against the working directory only
//! - bare features are searched in each `$LOAD_PATH` entry, then in the
//!   working directory
//!
//! Paths are made absolute and normalised lexically. Symlinks are not
//! resolved, so two spellings of one file through a link load twice.

use std::cell::RefCell;
use std::path::{Component, Path, PathBuf};

use crate::dispatch::CallContext;
use crate::errors::{load_failed, no_such_file, syntax_error, type_error, EvalResult};
use crate::heap::Heap;
use crate::runtime::Runtime;
use crate::value::{ArrayRef, Value};

/// The `$LOADED_FEATURES` array reachable from an environment.
///
/// The array belongs to the environment, not to the runtime: guest code may
/// read it, replace it or append to it like any other global.
pub(crate) struct LoadedFeatures {
    list: ArrayRef,
}

impl LoadedFeatures {
    /// Find the ledger, creating an empty one as a global if the
    /// environment has none.
    pub(crate) fn from_context(ctx: &CallContext<'_>) -> EvalResult<Self> {
        let name = ctx.runtime().names().loaded_features;
        match ctx.env().get(name) {
            Some(Value::Array(list)) => Ok(LoadedFeatures { list }),
            Some(other) => Err(type_error(format!(
                "$LOADED_FEATURES must be an Array, not {}",
                ctx.runtime().class_of(&other).name()
            ))),
            None => {
                let list: ArrayRef = Heap::new(RefCell::new(Vec::new()));
                ctx.env().set_global(name, Value::Array(list.clone()));
                Ok(LoadedFeatures { list })
            }
        }
    }

    pub(crate) fn is_loaded(&self, path: &str) -> bool {
        self.list
            .borrow()
            .iter()
            .any(|entry| entry.as_str() == Some(path))
    }

    pub(crate) fn register(&self, path: &str) {
        if !self.is_loaded(path) {
            self.list.borrow_mut().push(Value::string(path));
        }
    }
}

/// `Kernel#require`. `Ok(true)` when the file was evaluated now, `Ok(false)`
/// when it was already loaded or is being loaded further up the stack.
pub(crate) fn require(ctx: &CallContext<'_>, feature: &str) -> EvalResult<bool> {
    let runtime = ctx.runtime();
    let features = LoadedFeatures::from_context(ctx)?;
    let path = locate(ctx, feature, &runtime.config().source_suffix)?;
    let key = path.to_string_lossy().into_owned();

    if features.is_loaded(&key) {
        tracing::debug!(path = %key, "require: already loaded");
        return Ok(false);
    }
    let Some(_loading) = runtime.begin_loading(&path) else {
        tracing::debug!(path = %key, "require: already loading");
        return Ok(false);
    };

    tracing::debug!(path = %key, "require: loading");
    match evaluate_file(runtime, &path, &format!("from require '{feature}'")) {
        Ok(()) => {
            features.register(&key);
            tracing::debug!(path = %key, "require: loaded");
            Ok(true)
        }
        Err(error) => {
            tracing::debug!(path = %key, error = %error.exception().inspect(), "require: failed");
            Err(error)
        }
    }
}

/// `Kernel#load`: evaluate `file` every time, without touching
/// `$LOADED_FEATURES`. No suffix is appended.
pub(crate) fn load(ctx: &CallContext<'_>, file: &str) -> EvalResult<()> {
    let runtime = ctx.runtime();
    let path = locate(ctx, file, "")?;
    tracing::debug!(path = %path.display(), "load");
    evaluate_file(runtime, &path, &format!("from load '{file}'"))
}

fn locate(ctx: &CallContext<'_>, feature: &str, suffix: &str) -> EvalResult<PathBuf> {
    let runtime = ctx.runtime();
    let working_dir = match &runtime.config().working_dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().map_err(|e| load_failed(feature, &e))?,
    };
    let search = load_path(ctx, runtime);
    resolve_feature(feature, &search, &working_dir, suffix).ok_or_else(|| {
        tracing::debug!(feature, "require: not found");
        no_such_file(feature)
    })
}

/// The directories in `$LOAD_PATH`, or the configured ones when the global
/// is missing. Non-string entries are skipped.
fn load_path(ctx: &CallContext<'_>, runtime: &Runtime) -> Vec<PathBuf> {
    match ctx.env().get(runtime.names().load_path) {
        Some(Value::Array(entries)) => entries
            .borrow()
            .iter()
            .filter_map(|entry| entry.as_str().map(PathBuf::from))
            .collect(),
        _ => runtime.config().load_path.clone(),
    }
}

/// Turn a feature name into the absolute path of an existing file.
pub(crate) fn resolve_feature(
    feature: &str,
    load_path: &[PathBuf],
    working_dir: &Path,
    suffix: &str,
) -> Option<PathBuf> {
    if feature.is_empty() {
        return None;
    }
    let file = if suffix.is_empty() || feature.ends_with(suffix) {
        feature.to_owned()
    } else {
        format!("{feature}{suffix}")
    };
    let file = Path::new(&file);

    let explicit = file.is_absolute()
        || matches!(
            file.components().next(),
            Some(Component::CurDir | Component::ParentDir)
        );
    let candidates: Vec<PathBuf> = if explicit {
        vec![working_dir.join(file)]
    } else {
        load_path
            .iter()
            .map(|dir| working_dir.join(dir).join(file))
            .chain(std::iter::once(working_dir.join(file)))
            .collect()
    };

    candidates
        .into_iter()
        .map(|candidate| normalize_path(&candidate))
        .find(|candidate| candidate.is_file())
}

/// Drop `.` components and fold `..` into the preceding one.
pub(crate) fn normalize_path(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();
    for component in path.components() {
        match component {
            Component::ParentDir => {
                result.pop();
            }
            Component::CurDir => {}
            _ => result.push(component),
        }
    }
    result
}

/// Read, parse and run one file at the top level.
///
/// Locals the file defines live in a scope of their own. Globals and
/// constants reach the main environment.
fn evaluate_file(runtime: &Runtime, path: &Path, note: &str) -> EvalResult<()> {
    let source = std::fs::read_to_string(path)
        .map_err(|e| load_failed(&path.to_string_lossy(), &e))?;
    let program = runtime
        .evaluator()
        .parse(path, &source)
        .map_err(syntax_error)?;

    let env = runtime.main_env().isolated_child();
    let ctx = CallContext::new(runtime, env, runtime.main_binding());
    ctx.eval(program)
        .map_err(|error| error.with_note(note))?;
    Ok(())
}
