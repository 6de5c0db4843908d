//! Garnet IR - identifiers and node handles shared across the runtime.
//!
//! The object runtime never parses guest source. It only needs:
//! - `Name`: a compact handle to an interned string
//! - `StringInterner` / `SharedInterner`: the process-wide intern table
//! - `ExprId`: an opaque handle to a node owned by the external parser

mod expr_id;
mod interner;
mod name;

pub use expr_id::ExprId;
pub use interner::{InternError, SharedInterner, StringInterner, StringLookup};
pub use name::Name;
