//! The seam between the object model and the language front end.
//!
//! The runtime never parses or walks syntax itself. Guest method bodies,
//! blocks and required files are opaque [`ExprId`]s that the host's
//! [`Evaluator`] turns back into behavior.

use std::fmt;
use std::path::Path;
use std::rc::Rc;

use garnet_ir::ExprId;

use crate::dispatch::CallContext;
use crate::errors::{runtime_error, EvalResult};

/// A front-end parse failure, wrapped by `SyntaxError`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseError {
    message: String,
    line: Option<u32>,
    eof: bool,
}

impl ParseError {
    pub fn new(message: impl Into<String>) -> Self {
        ParseError {
            message: message.into(),
            line: None,
            eof: false,
        }
    }

    /// Input ended in the middle of a construct.
    pub fn unexpected_eof() -> Self {
        ParseError {
            message: "unexpected end of input".to_string(),
            line: None,
            eof: true,
        }
    }

    #[must_use]
    pub fn at_line(mut self, line: u32) -> Self {
        self.line = Some(line);
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn line(&self) -> Option<u32> {
        self.line
    }

    pub fn is_eof(&self) -> bool {
        self.eof
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "line {line}: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for ParseError {}

/// Parses source files and evaluates syntax nodes on behalf of the runtime.
pub trait Evaluator {
    /// Evaluate `node` with `ctx` supplying self, the block and the scope.
    fn eval(&self, ctx: &CallContext<'_>, node: ExprId) -> EvalResult;

    /// Parse a whole source file, returning its root node.
    fn parse(&self, path: &Path, source: &str) -> Result<ExprId, ParseError>;
}

impl<E: Evaluator + ?Sized> Evaluator for Rc<E> {
    fn eval(&self, ctx: &CallContext<'_>, node: ExprId) -> EvalResult {
        (**self).eval(ctx, node)
    }

    fn parse(&self, path: &Path, source: &str) -> Result<ExprId, ParseError> {
        (**self).parse(path, source)
    }
}

impl<E: Evaluator + ?Sized> Evaluator for Box<E> {
    fn eval(&self, ctx: &CallContext<'_>, node: ExprId) -> EvalResult {
        (**self).eval(ctx, node)
    }

    fn parse(&self, path: &Path, source: &str) -> Result<ExprId, ParseError> {
        (**self).parse(path, source)
    }
}

/// Evaluator used when the host did not install one.
///
/// Built-in methods work without it; anything that needs guest code
/// (guest methods, blocks, `require`) fails with a `RuntimeError`.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoEvaluator;

impl Evaluator for NoEvaluator {
    fn eval(&self, _ctx: &CallContext<'_>, node: ExprId) -> EvalResult {
        Err(runtime_error(format!(
            "no evaluator installed to run {node:?}"
        )))
    }

    fn parse(&self, path: &Path, _source: &str) -> Result<ExprId, ParseError> {
        Err(ParseError::new(format!(
            "no parser installed for {}",
            path.display()
        )))
    }
}
