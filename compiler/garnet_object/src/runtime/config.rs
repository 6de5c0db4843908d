//! Runtime configuration.

use std::path::PathBuf;

/// Default limit on nested guest calls before `SystemStackError`.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 10_000;

/// Knobs a host sets when building a [`Runtime`](super::Runtime).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Appended to `require` names that lack it.
    pub source_suffix: String,
    /// Initial contents of `$LOAD_PATH`.
    pub load_path: Vec<PathBuf>,
    /// Base for relative `require` paths. Defaults to the process's
    /// current directory at load time.
    pub working_dir: Option<PathBuf>,
    pub max_call_depth: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        RuntimeConfig {
            source_suffix: ".rb".to_string(),
            load_path: Vec::new(),
            working_dir: None,
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }
}
