//! Classes, modules, mixins and eigenclasses.
//!
//! All four participate in method lookup through [`ClassLike`], which
//! exposes the three things the lookup walk needs from a node: its own
//! methods, the modules mixed into it, and the node to continue with.
//!
//! | node        | own methods       | mixed-in modules                | continue with      |
//! |-------------|-------------------|---------------------------------|--------------------|
//! | `Class`     | its table         | `include`d modules, newest first | superclass         |
//! | `Module`    | its table         | `include`d modules, newest first | none               |
//! | `Mixin`     | the base's        | its modules, then the base's     | base's superclass  |
//! | `Eigenclass`| singleton methods | none                             | the wrapped class  |

pub mod ancestry;

use std::cell::{Cell, Ref, RefCell};
use std::fmt;

use smallvec::SmallVec;

use crate::environment::Environment;
use crate::errors::{cyclic_include, EvalResult};
use crate::heap::Heap;
use crate::method::{Method, MethodSet, Visibility};
use crate::runtime::Runtime;
use crate::symbol::Symbol;
use crate::value::Value;

pub type ClassRef = Heap<Class>;
pub type ModuleRef = Heap<Module>;
pub type MixinRef = Heap<Mixin>;
pub type EigenclassRef = Heap<Eigenclass>;

/// Creates the raw instance behind `Class#new` / `Class#allocate`.
pub type Allocator = fn(&Runtime, &ClassRef) -> EvalResult;

/// A guest class.
pub struct Class {
    name: Option<Symbol>,
    superclass: Option<ClassRef>,
    methods: RefCell<MethodSet>,
    includes: RefCell<Vec<ModuleRef>>,
    meta: EigenclassRef,
    allocator: Option<Allocator>,
    env: Environment,
    default_visibility: Cell<Visibility>,
}

impl Class {
    /// Create a class. Its metaclass wraps the superclass's metaclass so
    /// class methods are inherited. A root class's metaclass starts
    /// unwrapped and is attached to `Class` during bootstrap.
    pub(crate) fn new(
        name: Option<Symbol>,
        superclass: Option<ClassRef>,
        methods: MethodSet,
        class_methods: MethodSet,
        allocator: Option<Allocator>,
        env: Environment,
    ) -> ClassRef {
        let meta = Eigenclass::new(
            class_methods,
            superclass
                .as_ref()
                .map(|s| ClassLike::Eigenclass(s.meta.clone())),
            env.clone(),
            String::new(),
        );
        let class = Heap::new(Class {
            name,
            superclass,
            methods: RefCell::new(methods),
            includes: RefCell::new(Vec::new()),
            meta,
            allocator,
            env,
            default_visibility: Cell::new(Visibility::Public),
        });
        class.meta.set_label(format!("#<Class:{}>", class.name()));
        class
    }

    /// The constant name, or `#<Class:0x...>` when anonymous.
    pub fn name(&self) -> String {
        match self.name {
            Some(name) => name.as_str().to_string(),
            None => format!("#<Class:0x{:016x}>", std::ptr::from_ref(self) as usize),
        }
    }

    pub fn symbol(&self) -> Option<Symbol> {
        self.name
    }

    pub fn superclass(&self) -> Option<&ClassRef> {
        self.superclass.as_ref()
    }

    pub fn methods(&self) -> Ref<'_, MethodSet> {
        self.methods.borrow()
    }

    pub fn define_method(&self, name: Symbol, method: Method) {
        self.methods.borrow_mut().insert(name, method);
    }

    /// Singleton class holding the class methods.
    pub fn metaclass(&self) -> &EigenclassRef {
        &self.meta
    }

    /// Directly included modules in inclusion order.
    pub fn includes(&self) -> Vec<ModuleRef> {
        self.includes.borrow().clone()
    }

    /// Include during bootstrap, where the graph is known to be acyclic.
    pub(crate) fn include_unchecked(&self, module: ModuleRef) {
        self.includes.borrow_mut().push(module);
    }

    /// The nearest allocator on the superclass chain.
    pub fn allocator(&self) -> Option<Allocator> {
        match self.allocator {
            Some(allocator) => Some(allocator),
            None => self.superclass.as_ref().and_then(|s| s.allocator()),
        }
    }

    /// Whether `self` is `other` or one of its subclasses.
    pub fn descends_from(&self, other: &ClassRef) -> bool {
        if std::ptr::eq(self, &**other) {
            return true;
        }
        self.superclass
            .as_ref()
            .is_some_and(|s| s.descends_from(other))
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Class({})", self.name())
    }
}

/// A guest module.
pub struct Module {
    name: Option<Symbol>,
    methods: RefCell<MethodSet>,
    includes: RefCell<Vec<ModuleRef>>,
    meta: EigenclassRef,
    env: Environment,
    default_visibility: Cell<Visibility>,
}

impl Module {
    /// Create a module whose metaclass wraps `module_class` (the `Module`
    /// class), so `Module`'s instance methods apply to it.
    pub(crate) fn new(
        name: Option<Symbol>,
        methods: MethodSet,
        module_class: &ClassRef,
        env: Environment,
    ) -> ModuleRef {
        let meta = Eigenclass::new(
            MethodSet::new(),
            Some(ClassLike::Class(module_class.clone())),
            env.clone(),
            String::new(),
        );
        let module = Heap::new(Module {
            name,
            methods: RefCell::new(methods),
            includes: RefCell::new(Vec::new()),
            meta,
            env,
            default_visibility: Cell::new(Visibility::Public),
        });
        module.meta.set_label(format!("#<Class:{}>", module.name()));
        module
    }

    /// The constant name, or `#<Module:0x...>` when anonymous.
    pub fn name(&self) -> String {
        match self.name {
            Some(name) => name.as_str().to_string(),
            None => format!("#<Module:0x{:016x}>", std::ptr::from_ref(self) as usize),
        }
    }

    pub fn symbol(&self) -> Option<Symbol> {
        self.name
    }

    pub fn methods(&self) -> Ref<'_, MethodSet> {
        self.methods.borrow()
    }

    pub fn define_method(&self, name: Symbol, method: Method) {
        self.methods.borrow_mut().insert(name, method);
    }

    pub fn metaclass(&self) -> &EigenclassRef {
        &self.meta
    }

    pub fn includes(&self) -> Vec<ModuleRef> {
        self.includes.borrow().clone()
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }
}

impl fmt::Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Module({})", self.name())
    }
}

/// A class-like node extended with extra modules.
///
/// Immutable once built: extending again wraps the mixin in another one.
pub struct Mixin {
    base: ClassLike,
    modules: Vec<ModuleRef>,
}

impl Mixin {
    pub(crate) fn new(base: ClassLike, modules: Vec<ModuleRef>) -> MixinRef {
        Heap::new(Mixin { base, modules })
    }

    pub fn base(&self) -> &ClassLike {
        &self.base
    }

    pub fn modules(&self) -> &[ModuleRef] {
        &self.modules
    }
}

impl fmt::Debug for Mixin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mixin")
            .field("base", &self.base)
            .field("modules", &self.modules)
            .finish()
    }
}

/// A singleton class: per-object methods in front of the object's class.
pub struct Eigenclass {
    methods: RefCell<MethodSet>,
    wrapped: RefCell<Option<ClassLike>>,
    env: Environment,
    label: RefCell<String>,
    default_visibility: Cell<Visibility>,
}

impl Eigenclass {
    pub(crate) fn new(
        methods: MethodSet,
        wrapped: Option<ClassLike>,
        env: Environment,
        label: String,
    ) -> EigenclassRef {
        Heap::new(Eigenclass {
            methods: RefCell::new(methods),
            wrapped: RefCell::new(wrapped),
            env,
            label: RefCell::new(label),
            default_visibility: Cell::new(Visibility::Public),
        })
    }

    pub fn methods(&self) -> Ref<'_, MethodSet> {
        self.methods.borrow()
    }

    pub fn define_method(&self, name: Symbol, method: Method) {
        self.methods.borrow_mut().insert(name, method);
    }

    /// The class-like node lookup continues with.
    pub fn wrapped(&self) -> Option<ClassLike> {
        self.wrapped.borrow().clone()
    }

    pub(crate) fn set_wrapped(&self, wrapped: ClassLike) {
        *self.wrapped.borrow_mut() = Some(wrapped);
    }

    /// Put `modules` between this eigenclass and what it wraps.
    pub(crate) fn extend_with(&self, modules: Vec<ModuleRef>) {
        let mut wrapped = self.wrapped.borrow_mut();
        *wrapped = match wrapped.take() {
            Some(base) => Some(ClassLike::Mixin(Mixin::new(base, modules))),
            None => modules
                .first()
                .cloned()
                .map(|first| {
                    let rest = modules[1..].to_vec();
                    let base = ClassLike::Module(first);
                    if rest.is_empty() {
                        base
                    } else {
                        ClassLike::Mixin(Mixin::new(base, rest))
                    }
                }),
        };
    }

    pub fn label(&self) -> String {
        self.label.borrow().clone()
    }

    pub(crate) fn set_label(&self, label: String) {
        *self.label.borrow_mut() = label;
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }
}

impl fmt::Debug for Eigenclass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Eigenclass({})", self.label.borrow())
    }
}

/// Any node of the lookup graph.
#[derive(Clone)]
pub enum ClassLike {
    Class(ClassRef),
    Module(ModuleRef),
    Mixin(MixinRef),
    Eigenclass(EigenclassRef),
}

impl ClassLike {
    /// Methods defined directly on this node.
    pub fn own_methods(&self) -> Ref<'_, MethodSet> {
        match self {
            ClassLike::Class(c) => c.methods.borrow(),
            ClassLike::Module(m) => m.methods.borrow(),
            ClassLike::Mixin(m) => m.base.own_methods(),
            ClassLike::Eigenclass(e) => e.methods.borrow(),
        }
    }

    /// Modules consulted after this node's own methods, nearest first.
    pub fn mixed_in_modules(&self) -> SmallVec<[ModuleRef; 4]> {
        match self {
            ClassLike::Class(c) => c.includes.borrow().iter().rev().cloned().collect(),
            ClassLike::Module(m) => m.includes.borrow().iter().rev().cloned().collect(),
            ClassLike::Mixin(m) => {
                let mut modules: SmallVec<[ModuleRef; 4]> =
                    m.modules.iter().rev().cloned().collect();
                modules.extend(m.base.mixed_in_modules());
                modules
            }
            ClassLike::Eigenclass(_) => SmallVec::new(),
        }
    }

    /// The node lookup continues with after this one and its modules.
    pub fn superclass(&self) -> Option<ClassLike> {
        match self {
            ClassLike::Class(c) => c.superclass.clone().map(ClassLike::Class),
            ClassLike::Module(_) => None,
            ClassLike::Mixin(m) => m.base.superclass(),
            ClassLike::Eigenclass(e) => e.wrapped(),
        }
    }

    /// The node that owns this node's methods: mixins resolve to their
    /// innermost base.
    pub fn nominal(&self) -> ClassLike {
        match self {
            ClassLike::Mixin(m) => m.base.nominal(),
            other => other.clone(),
        }
    }

    pub fn define_method(&self, name: Symbol, method: Method) {
        match self {
            ClassLike::Class(c) => c.define_method(name, method),
            ClassLike::Module(m) => m.define_method(name, method),
            ClassLike::Mixin(m) => m.base.define_method(name, method),
            ClassLike::Eigenclass(e) => e.define_method(name, method),
        }
    }

    /// Change the visibility of a method defined on this node.
    pub(crate) fn set_method_visibility(&self, name: Symbol, visibility: Visibility) -> bool {
        match self {
            ClassLike::Class(c) => c.methods.borrow_mut().set_visibility(name, visibility),
            ClassLike::Module(m) => m.methods.borrow_mut().set_visibility(name, visibility),
            ClassLike::Mixin(m) => m.base.set_method_visibility(name, visibility),
            ClassLike::Eigenclass(e) => e.methods.borrow_mut().set_visibility(name, visibility),
        }
    }

    /// Mix `module` into this node.
    ///
    /// Including a module twice is a no-op. Including a module that already
    /// includes this node fails with `ArgumentError`.
    pub fn include_module(&self, module: &ModuleRef) -> EvalResult<()> {
        let target = self.nominal();
        let candidate = ClassLike::Module(module.clone());
        if candidate.is_same(&target) || ancestry::includes_ancestor(&candidate, &target) {
            return Err(cyclic_include());
        }
        if ancestry::includes_ancestor(self, &candidate) {
            return Ok(());
        }
        match self {
            ClassLike::Class(c) => c.includes.borrow_mut().push(module.clone()),
            ClassLike::Module(m) => m.includes.borrow_mut().push(module.clone()),
            ClassLike::Mixin(m) => return m.base.include_module(module),
            ClassLike::Eigenclass(e) => e.extend_with(vec![module.clone()]),
        }
        tracing::trace!(target = %self.inspect(), module = %module.name(), "include");
        Ok(())
    }

    /// Visibility given to methods defined next in this node's body.
    pub fn default_visibility(&self) -> Visibility {
        match self {
            ClassLike::Class(c) => c.default_visibility.get(),
            ClassLike::Module(m) => m.default_visibility.get(),
            ClassLike::Mixin(m) => m.base.default_visibility(),
            ClassLike::Eigenclass(e) => e.default_visibility.get(),
        }
    }

    pub fn set_default_visibility(&self, visibility: Visibility) {
        match self {
            ClassLike::Class(c) => c.default_visibility.set(visibility),
            ClassLike::Module(m) => m.default_visibility.set(visibility),
            ClassLike::Mixin(m) => m.base.set_default_visibility(visibility),
            ClassLike::Eigenclass(e) => e.default_visibility.set(visibility),
        }
    }

    /// Scope that guest code defined inside this node closes over.
    pub fn env(&self) -> Environment {
        match self {
            ClassLike::Class(c) => c.env.clone(),
            ClassLike::Module(m) => m.env.clone(),
            ClassLike::Mixin(m) => m.base.env(),
            ClassLike::Eigenclass(e) => e.env.clone(),
        }
    }

    /// The singleton class of a class or module value.
    pub fn metaclass(&self) -> Option<EigenclassRef> {
        match self {
            ClassLike::Class(c) => Some(c.meta.clone()),
            ClassLike::Module(m) => Some(m.meta.clone()),
            ClassLike::Mixin(m) => m.base.metaclass(),
            ClassLike::Eigenclass(_) => None,
        }
    }

    pub fn name(&self) -> String {
        match self {
            ClassLike::Class(c) => c.name(),
            ClassLike::Module(m) => m.name(),
            ClassLike::Mixin(m) => m.base.name(),
            ClassLike::Eigenclass(e) => e.label(),
        }
    }

    pub fn inspect(&self) -> String {
        self.name()
    }

    /// The constant name of a named class or module.
    pub fn symbol(&self) -> Option<Symbol> {
        match self {
            ClassLike::Class(c) => c.name,
            ClassLike::Module(m) => m.name,
            ClassLike::Mixin(m) => m.base.symbol(),
            ClassLike::Eigenclass(_) => None,
        }
    }

    pub fn is_module(&self) -> bool {
        matches!(self.nominal(), ClassLike::Module(_))
    }

    pub fn as_class(&self) -> Option<&ClassRef> {
        match self {
            ClassLike::Class(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_module(&self) -> Option<&ModuleRef> {
        match self {
            ClassLike::Module(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_eigenclass(&self) -> Option<&EigenclassRef> {
        match self {
            ClassLike::Eigenclass(e) => Some(e),
            _ => None,
        }
    }

    /// Identity of the underlying node.
    pub fn is_same(&self, other: &ClassLike) -> bool {
        match (self, other) {
            (ClassLike::Class(a), ClassLike::Class(b)) => Heap::ptr_eq(a, b),
            (ClassLike::Module(a), ClassLike::Module(b)) => Heap::ptr_eq(a, b),
            (ClassLike::Mixin(a), ClassLike::Mixin(b)) => Heap::ptr_eq(a, b),
            (ClassLike::Eigenclass(a), ClassLike::Eigenclass(b)) => Heap::ptr_eq(a, b),
            _ => false,
        }
    }

    pub fn addr(&self) -> usize {
        match self {
            ClassLike::Class(c) => c.addr(),
            ClassLike::Module(m) => m.addr(),
            ClassLike::Mixin(m) => m.addr(),
            ClassLike::Eigenclass(e) => e.addr(),
        }
    }

    pub fn to_value(&self) -> Value {
        Value::Class(self.clone())
    }
}

impl fmt::Debug for ClassLike {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inspect())
    }
}
