//! The core class hierarchy.
//!
//! ```text
//! BasicObject
//! └── Object (includes Kernel)
//!     ├── Module
//!     │   └── Class
//!     ├── NilClass, TrueClass, FalseClass
//!     ├── Symbol, String, Integer, Array, Proc
//!     └── Exception
//!         └── ... (see ExceptionKind)
//! ```
//!
//! `BasicObject`'s metaclass wraps `Class`, which closes the loop: every
//! class's metaclass chain ends in `Class`, so class values answer to
//! `Class`, `Module`, `Object` and `Kernel` methods.

use crate::builtins::{
    allocate_exception, allocate_instance, basic_object, boolean, class, exception, kernel,
    module, nil, no_allocator, object, primitives, symbol,
};
use crate::class::{Allocator, Class, ClassLike, ClassRef, Module, ModuleRef};
use crate::environment::Environment;
use crate::errors::ExceptionKind;
use crate::method::MethodSet;
use crate::symbol::SymbolTable;

/// Handles on the built-in classes.
pub struct CoreClasses {
    pub basic_object: ClassRef,
    pub object: ClassRef,
    pub module: ClassRef,
    pub class: ClassRef,
    pub kernel: ModuleRef,
    pub nil: ClassRef,
    pub true_class: ClassRef,
    pub false_class: ClassRef,
    pub symbol: ClassRef,
    pub string: ClassRef,
    pub integer: ClassRef,
    pub array: ClassRef,
    pub proc_class: ClassRef,
    /// Indexed by `ExceptionKind` discriminant, in `ExceptionKind::ALL` order.
    exceptions: Vec<ClassRef>,
}

impl CoreClasses {
    pub(crate) fn bootstrap(symbols: &SymbolTable, env: &Environment) -> Self {
        let named = |name: &str,
                     superclass: &ClassRef,
                     methods: MethodSet,
                     class_methods: MethodSet,
                     allocator: Option<Allocator>| {
            Class::new(
                Some(symbols.intern(name)),
                Some(superclass.clone()),
                methods,
                class_methods,
                allocator,
                env.clone(),
            )
        };

        let basic_object = Class::new(
            Some(symbols.intern("BasicObject")),
            None,
            basic_object::instance_methods(symbols),
            MethodSet::new(),
            Some(allocate_instance),
            env.clone(),
        );
        let object = named(
            "Object",
            &basic_object,
            object::instance_methods(symbols),
            MethodSet::new(),
            None,
        );
        let module = named(
            "Module",
            &object,
            module::instance_methods(symbols),
            module::singleton_methods(symbols),
            Some(no_allocator),
        );
        let class = named(
            "Class",
            &module,
            class::instance_methods(symbols),
            class::singleton_methods(symbols),
            Some(no_allocator),
        );
        basic_object
            .metaclass()
            .set_wrapped(ClassLike::Class(class.clone()));

        let kernel = Module::new(
            Some(symbols.intern("Kernel")),
            kernel::instance_methods(symbols),
            &module,
            env.clone(),
        );
        object.include_unchecked(kernel.clone());

        let value_class = |name: &str, methods: MethodSet, class_methods: MethodSet| {
            named(name, &object, methods, class_methods, Some(no_allocator))
        };
        let nil = value_class("NilClass", nil::instance_methods(symbols), MethodSet::new());
        let true_class = value_class(
            "TrueClass",
            boolean::true_methods(symbols),
            MethodSet::new(),
        );
        let false_class = value_class(
            "FalseClass",
            boolean::false_methods(symbols),
            MethodSet::new(),
        );
        let symbol = value_class(
            "Symbol",
            symbol::instance_methods(symbols),
            symbol::singleton_methods(symbols),
        );
        let string = named(
            "String",
            &object,
            primitives::string_methods(symbols),
            MethodSet::new(),
            Some(primitives::allocate_string),
        );
        let integer = value_class(
            "Integer",
            primitives::integer_methods(symbols),
            MethodSet::new(),
        );
        let array = named(
            "Array",
            &object,
            primitives::array_methods(symbols),
            MethodSet::new(),
            Some(primitives::allocate_array),
        );
        let proc_class = value_class("Proc", primitives::proc_methods(symbols), MethodSet::new());

        let mut exceptions: Vec<ClassRef> = Vec::with_capacity(ExceptionKind::ALL.len());
        for kind in ExceptionKind::ALL {
            let class = match kind.parent() {
                None => named(
                    kind.name(),
                    &object,
                    exception::instance_methods(symbols),
                    exception::singleton_methods(symbols),
                    Some(allocate_exception),
                ),
                Some(parent) => named(
                    kind.name(),
                    &exceptions[parent as usize],
                    MethodSet::new(),
                    MethodSet::new(),
                    None,
                ),
            };
            exceptions.push(class);
        }

        CoreClasses {
            basic_object,
            object,
            module,
            class,
            kernel,
            nil,
            true_class,
            false_class,
            symbol,
            string,
            integer,
            array,
            proc_class,
            exceptions,
        }
    }

    /// The built-in class for an exception kind.
    pub fn exception(&self, kind: ExceptionKind) -> &ClassRef {
        &self.exceptions[kind as usize]
    }

    /// The nearest built-in exception kind `class` descends from.
    pub fn exception_kind_of(&self, class: &ClassRef) -> Option<ExceptionKind> {
        let mut current = Some(class);
        while let Some(candidate) = current {
            if let Some(kind) = ExceptionKind::ALL
                .into_iter()
                .find(|kind| crate::heap::Heap::ptr_eq(self.exception(*kind), candidate))
            {
                return Some(kind);
            }
            current = candidate.superclass();
        }
        None
    }

    pub fn is_exception_class(&self, class: &ClassRef) -> bool {
        class.descends_from(self.exception(ExceptionKind::Exception))
    }

    /// Every core class and module, for registration as constants.
    pub(crate) fn constants(&self) -> Vec<ClassLike> {
        let mut all: Vec<ClassLike> = [
            &self.basic_object,
            &self.object,
            &self.module,
            &self.class,
            &self.nil,
            &self.true_class,
            &self.false_class,
            &self.symbol,
            &self.string,
            &self.integer,
            &self.array,
            &self.proc_class,
        ]
        .into_iter()
        .map(|c| ClassLike::Class(c.clone()))
        .collect();
        all.push(ClassLike::Module(self.kernel.clone()));
        all.extend(self.exceptions.iter().map(|c| ClassLike::Class(c.clone())));
        all
    }
}
