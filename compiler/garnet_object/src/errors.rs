//! Guest exceptions and the host-side error type that carries them.
//!
//! Every failure the runtime reports is an [`EvalError`] wrapping a guest
//! exception object, so host code and guest `rescue` see the same thing.
//! Factory functions are `#[cold]` to keep the happy path of dispatch
//! compact.

use std::cell::RefCell;
use std::fmt;

use crate::class::ClassRef;
use crate::evaluator::ParseError;
use crate::heap::Heap;
use crate::value::Value;

/// Result of evaluating or dispatching.
pub type EvalResult<T = Value> = Result<T, EvalError>;

/// The built-in exception classes and their single-inheritance lattice.
///
/// ```text
/// Exception
/// ├── StandardError
/// │   ├── ZeroDivisionError
/// │   ├── ArgumentError
/// │   ├── NameError
/// │   │   └── NoMethodError
/// │   ├── TypeError
/// │   ├── RuntimeError
/// │   ├── LoadError
/// │   ├── SyntaxError
/// │   └── LocalJumpError
/// └── SystemStackError
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ExceptionKind {
    Exception,
    StandardError,
    SystemStackError,
    ZeroDivisionError,
    ArgumentError,
    NameError,
    NoMethodError,
    TypeError,
    RuntimeError,
    LoadError,
    SyntaxError,
    LocalJumpError,
}

impl ExceptionKind {
    /// Every kind, parents before children.
    pub const ALL: [ExceptionKind; 12] = [
        ExceptionKind::Exception,
        ExceptionKind::StandardError,
        ExceptionKind::SystemStackError,
        ExceptionKind::ZeroDivisionError,
        ExceptionKind::ArgumentError,
        ExceptionKind::NameError,
        ExceptionKind::NoMethodError,
        ExceptionKind::TypeError,
        ExceptionKind::RuntimeError,
        ExceptionKind::LoadError,
        ExceptionKind::SyntaxError,
        ExceptionKind::LocalJumpError,
    ];

    /// The guest-visible class name.
    pub fn name(self) -> &'static str {
        match self {
            ExceptionKind::Exception => "Exception",
            ExceptionKind::StandardError => "StandardError",
            ExceptionKind::SystemStackError => "SystemStackError",
            ExceptionKind::ZeroDivisionError => "ZeroDivisionError",
            ExceptionKind::ArgumentError => "ArgumentError",
            ExceptionKind::NameError => "NameError",
            ExceptionKind::NoMethodError => "NoMethodError",
            ExceptionKind::TypeError => "TypeError",
            ExceptionKind::RuntimeError => "RuntimeError",
            ExceptionKind::LoadError => "LoadError",
            ExceptionKind::SyntaxError => "SyntaxError",
            ExceptionKind::LocalJumpError => "LocalJumpError",
        }
    }

    /// The direct superclass within the lattice. `None` only for `Exception`.
    pub fn parent(self) -> Option<ExceptionKind> {
        match self {
            ExceptionKind::Exception => None,
            ExceptionKind::StandardError | ExceptionKind::SystemStackError => {
                Some(ExceptionKind::Exception)
            }
            ExceptionKind::NoMethodError => Some(ExceptionKind::NameError),
            ExceptionKind::ZeroDivisionError
            | ExceptionKind::ArgumentError
            | ExceptionKind::NameError
            | ExceptionKind::TypeError
            | ExceptionKind::RuntimeError
            | ExceptionKind::LoadError
            | ExceptionKind::SyntaxError
            | ExceptionKind::LocalJumpError => Some(ExceptionKind::StandardError),
        }
    }

    /// Whether `self` is `ancestor` or descends from it.
    pub fn is_a(self, ancestor: ExceptionKind) -> bool {
        let mut current = Some(self);
        while let Some(kind) = current {
            if kind == ancestor {
                return true;
            }
            current = kind.parent();
        }
        false
    }

    /// Look a kind up by its class name.
    pub fn from_name(name: &str) -> Option<ExceptionKind> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

impl fmt::Display for ExceptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A guest exception instance.
///
/// `class` is the guest class the exception was instantiated from. It is
/// `None` for exceptions created before a runtime exists (or by host code
/// that only cares about the kind), in which case the kind's built-in class
/// stands in.
pub struct ExceptionObject {
    kind: ExceptionKind,
    class: Option<ClassRef>,
    message: RefCell<String>,
    underlying: Option<ParseError>,
}

impl ExceptionObject {
    pub fn new(kind: ExceptionKind, message: impl Into<String>) -> Heap<Self> {
        Heap::new(ExceptionObject {
            kind,
            class: None,
            message: RefCell::new(message.into()),
            underlying: None,
        })
    }

    pub(crate) fn with_class(
        kind: ExceptionKind,
        class: ClassRef,
        message: impl Into<String>,
    ) -> Heap<Self> {
        Heap::new(ExceptionObject {
            kind,
            class: Some(class),
            message: RefCell::new(message.into()),
            underlying: None,
        })
    }

    fn with_underlying(error: ParseError) -> Heap<Self> {
        Heap::new(ExceptionObject {
            kind: ExceptionKind::SyntaxError,
            class: None,
            message: RefCell::new(error.to_string()),
            underlying: Some(error),
        })
    }

    /// Copy of this exception carrying a different message.
    pub(crate) fn with_message(&self, message: impl Into<String>) -> Heap<Self> {
        Heap::new(ExceptionObject {
            kind: self.kind,
            class: self.class.clone(),
            message: RefCell::new(message.into()),
            underlying: self.underlying.clone(),
        })
    }

    pub fn kind(&self) -> ExceptionKind {
        self.kind
    }

    pub fn class(&self) -> Option<&ClassRef> {
        self.class.as_ref()
    }

    pub fn message(&self) -> String {
        self.message.borrow().clone()
    }

    pub(crate) fn set_message(&self, message: impl Into<String>) {
        *self.message.borrow_mut() = message.into();
    }

    /// The parse failure behind a `SyntaxError`, if any.
    pub fn underlying(&self) -> Option<&ParseError> {
        self.underlying.as_ref()
    }

    /// Name of the guest class.
    pub fn class_name(&self) -> String {
        match &self.class {
            Some(class) => class.name().to_string(),
            None => self.kind.name().to_string(),
        }
    }

    /// `ClassName: message`.
    pub fn inspect(&self) -> String {
        format!("{}: {}", self.class_name(), self.message.borrow())
    }
}

impl fmt::Debug for ExceptionObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inspect())
    }
}

/// Extra context attached to an error as it propagates.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EvalNote {
    pub message: String,
}

impl EvalNote {
    pub fn new(message: impl Into<String>) -> Self {
        EvalNote {
            message: message.into(),
        }
    }
}

/// A raised guest exception on its way up the host stack.
#[derive(Clone, Debug)]
pub struct EvalError {
    exception: Heap<ExceptionObject>,
    notes: Vec<EvalNote>,
}

impl EvalError {
    pub fn new(kind: ExceptionKind, message: impl Into<String>) -> Self {
        Self::from_exception(ExceptionObject::new(kind, message))
    }

    pub fn from_exception(exception: Heap<ExceptionObject>) -> Self {
        EvalError {
            exception,
            notes: Vec::new(),
        }
    }

    pub fn kind(&self) -> ExceptionKind {
        self.exception.kind()
    }

    pub fn message(&self) -> String {
        self.exception.message()
    }

    /// Whether the carried exception is an instance of `kind`.
    pub fn is_a(&self, kind: ExceptionKind) -> bool {
        self.kind().is_a(kind)
    }

    pub fn exception(&self) -> &Heap<ExceptionObject> {
        &self.exception
    }

    /// The exception as a guest value, for `rescue => e`.
    pub fn exception_value(&self) -> Value {
        Value::Exception(self.exception.clone())
    }

    pub fn underlying(&self) -> Option<&ParseError> {
        self.exception.underlying()
    }

    pub fn notes(&self) -> &[EvalNote] {
        &self.notes
    }

    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(EvalNote::new(note));
        self
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.exception.inspect())?;
        for note in &self.notes {
            write!(f, "\n  note: {}", note.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for EvalError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.exception
            .underlying()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

// Factories

#[cold]
pub fn runtime_error(message: impl Into<String>) -> EvalError {
    EvalError::new(ExceptionKind::RuntimeError, message)
}

#[cold]
pub fn argument_error(message: impl Into<String>) -> EvalError {
    EvalError::new(ExceptionKind::ArgumentError, message)
}

#[cold]
pub fn type_error(message: impl Into<String>) -> EvalError {
    EvalError::new(ExceptionKind::TypeError, message)
}

#[cold]
pub fn wrong_number_of_arguments(given: usize, expected: usize) -> EvalError {
    argument_error(format!(
        "wrong number of arguments (given {given}, expected {expected})"
    ))
}

/// Arity failure for methods with optional parameters. `max == None` means
/// the method takes any number of trailing arguments.
#[cold]
pub fn wrong_number_of_arguments_range(
    given: usize,
    min: usize,
    max: Option<usize>,
) -> EvalError {
    let expected = match max {
        Some(max) if max == min => min.to_string(),
        Some(max) => format!("{min}..{max}"),
        None => format!("{min}+"),
    };
    argument_error(format!(
        "wrong number of arguments (given {given}, expected {expected})"
    ))
}

#[cold]
pub fn no_implicit_conversion(from: &str, into: &str) -> EvalError {
    type_error(format!("no implicit conversion of {from} into {into}"))
}

#[cold]
pub fn wrong_argument_type(actual: &str, expected: &str) -> EvalError {
    type_error(format!("wrong argument type {actual} (expected {expected})"))
}

#[cold]
pub fn not_symbol_nor_string(inspect: &str) -> EvalError {
    type_error(format!("{inspect} is not a symbol nor a string"))
}

#[cold]
pub fn exception_class_expected() -> EvalError {
    type_error("exception class/object expected")
}

#[cold]
pub fn no_method_error(method: &str, receiver: &str, class: &str) -> EvalError {
    EvalError::new(
        ExceptionKind::NoMethodError,
        format!("undefined method '{method}' for {receiver}:{class}"),
    )
}

#[cold]
pub fn private_method_called(method: &str, receiver: &str, class: &str) -> EvalError {
    EvalError::new(
        ExceptionKind::NoMethodError,
        format!("private method '{method}' called for {receiver}:{class}"),
    )
}

#[cold]
pub fn protected_method_called(method: &str, receiver: &str, class: &str) -> EvalError {
    EvalError::new(
        ExceptionKind::NoMethodError,
        format!("protected method '{method}' called for {receiver}:{class}"),
    )
}

#[cold]
pub fn uninitialized_constant(name: &str) -> EvalError {
    EvalError::new(
        ExceptionKind::NameError,
        format!("uninitialized constant {name}"),
    )
}

#[cold]
pub fn no_block_given() -> EvalError {
    EvalError::new(ExceptionKind::LocalJumpError, "no block given (yield)")
}

#[cold]
pub fn no_such_file(feature: &str) -> EvalError {
    EvalError::new(
        ExceptionKind::LoadError,
        format!("cannot load such file -- {feature}"),
    )
}

#[cold]
pub fn load_failed(path: &str, reason: &std::io::Error) -> EvalError {
    EvalError::new(
        ExceptionKind::LoadError,
        format!("cannot load such file -- {path} ({reason})"),
    )
}

#[cold]
pub fn syntax_error(error: ParseError) -> EvalError {
    EvalError::from_exception(ExceptionObject::with_underlying(error))
}

#[cold]
pub fn zero_division() -> EvalError {
    EvalError::new(ExceptionKind::ZeroDivisionError, "divided by 0")
}

#[cold]
pub fn stack_level_too_deep() -> EvalError {
    EvalError::new(ExceptionKind::SystemStackError, "stack level too deep")
}

#[cold]
pub fn cyclic_include() -> EvalError {
    argument_error("cyclic include detected")
}

#[cold]
pub fn allocator_undefined(class: &str) -> EvalError {
    type_error(format!("allocator undefined for {class}"))
}

#[cold]
pub fn cannot_define_singleton() -> EvalError {
    type_error("can't define singleton")
}

#[cold]
pub fn superclass_mismatch(class: &str) -> EvalError {
    type_error(format!("superclass mismatch for class {class}"))
}

#[cold]
pub fn not_a_class_or_module(inspect: &str) -> EvalError {
    type_error(format!("{inspect} is not a class/module"))
}
