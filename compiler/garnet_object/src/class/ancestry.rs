//! Walking the lookup graph.
//!
//! Each node is visited as: its own methods, then every module mixed into
//! it (recursively, each module followed by the modules it includes), then
//! the node it continues with. Mixins are never reported to the visitor;
//! they resolve to their base node so a method's owner is always a class,
//! module or eigenclass.

use std::ops::ControlFlow;

use super::{ClassLike, ModuleRef};
use crate::method::Method;
use crate::symbol::Symbol;

/// How far a walk goes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Reach {
    /// Every ancestor.
    All,
    /// Stop after the first class node and its modules.
    ThroughClass,
    /// The start node's own methods only.
    Own,
}

/// Visit nodes in lookup order until `visit` breaks.
pub fn walk<B>(
    start: &ClassLike,
    reach: Reach,
    visit: &mut impl FnMut(&ClassLike) -> ControlFlow<B>,
) -> ControlFlow<B> {
    let mut node = Some(start.clone());
    while let Some(current) = node {
        let owner = current.nominal();
        visit(&owner)?;
        if reach == Reach::Own {
            break;
        }
        for module in current.mixed_in_modules() {
            visit_module(&module, visit)?;
        }
        if reach == Reach::ThroughClass && matches!(owner, ClassLike::Class(_)) {
            break;
        }
        node = current.superclass();
    }
    ControlFlow::Continue(())
}

fn visit_module<B>(
    module: &ModuleRef,
    visit: &mut impl FnMut(&ClassLike) -> ControlFlow<B>,
) -> ControlFlow<B> {
    visit(&ClassLike::Module(module.clone()))?;
    for included in module.includes().iter().rev() {
        visit_module(included, visit)?;
    }
    ControlFlow::Continue(())
}

/// A successful method lookup.
#[derive(Clone, Debug)]
pub struct Found {
    pub method: Method,
    /// The node whose table holds the method.
    pub owner: ClassLike,
}

/// The first definition of `name` in lookup order.
pub fn find_method(start: &ClassLike, name: Symbol) -> Option<Found> {
    let result = walk(start, Reach::All, &mut |node| {
        match node.own_methods().get(name) {
            Some(method) => ControlFlow::Break(Found {
                method: method.clone(),
                owner: node.clone(),
            }),
            None => ControlFlow::Continue(()),
        }
    });
    match result {
        ControlFlow::Break(found) => Some(found),
        ControlFlow::Continue(()) => None,
    }
}

/// Nodes in lookup order with repeats removed.
pub fn ancestors(start: &ClassLike) -> Vec<ClassLike> {
    let mut seen: Vec<ClassLike> = Vec::new();
    let _ = walk(start, Reach::All, &mut |node| {
        if !seen.iter().any(|s| s.is_same(node)) {
            seen.push(node.clone());
        }
        ControlFlow::<()>::Continue(())
    });
    seen
}

/// Whether `target` appears anywhere in the lookup order of `start`.
pub fn includes_ancestor(start: &ClassLike, target: &ClassLike) -> bool {
    let target = target.nominal();
    walk(start, Reach::All, &mut |node| {
        if node.is_same(&target) {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    })
    .is_break()
}
