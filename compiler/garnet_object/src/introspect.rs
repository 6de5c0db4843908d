//! Method-name listings for `methods`, `instance_methods` and friends.

use std::ops::ControlFlow;

use rustc_hash::FxHashSet;

use crate::class::ancestry::{walk, Reach};
use crate::class::ClassLike;
use crate::method::Visibility;
use crate::symbol::Symbol;
use crate::value::Value;

/// Which visibilities a listing reports.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Listing {
    /// Public and protected: what `methods` reports.
    Callable,
    Only(Visibility),
}

impl Listing {
    fn admits(self, visibility: Visibility) -> bool {
        match self {
            Listing::Callable => visibility != Visibility::Private,
            Listing::Only(wanted) => visibility == wanted,
        }
    }
}

/// Names reachable from `start`, nearest definition first.
///
/// A name is reported at most once. The nearest definition decides: a
/// private override hides a public ancestor method from public listings.
pub fn method_names(start: &ClassLike, reach: Reach, listing: Listing) -> Vec<Symbol> {
    let mut seen: FxHashSet<Symbol> = FxHashSet::default();
    let mut names = Vec::new();
    let _ = walk(start, reach, &mut |node| {
        let methods = node.own_methods();
        let mut entries: Vec<(Symbol, Visibility)> = methods
            .iter()
            .map(|(name, method)| (name, method.visibility()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        for (name, visibility) in entries {
            if seen.insert(name) && listing.admits(visibility) {
                names.push(name);
            }
        }
        ControlFlow::<()>::Continue(())
    });
    names
}

/// Methods defined on `value`'s singleton class, if it has one.
///
/// Objects that never acquired a singleton class report nothing. Class and
/// module values report their class methods.
pub fn singleton_method_names(value: &Value, listing: Listing) -> Vec<Symbol> {
    let eigen = match value {
        Value::Extended(e) => ClassLike::Eigenclass(e.eigenclass().clone()),
        Value::Class(class_like) => match class_like.metaclass() {
            Some(meta) => ClassLike::Eigenclass(meta),
            None => return Vec::new(),
        },
        _ => return Vec::new(),
    };
    method_names(&eigen, Reach::Own, listing)
}
