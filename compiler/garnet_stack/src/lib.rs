//! Stack safety for re-entrant dispatch.
//!
//! Every guest method call may call back into the evaluator, which may call
//! back into dispatch (blocks, `require`, `tap`, `method_missing`). The host
//! stack therefore grows with guest recursion depth. Dispatch wraps each hop
//! in [`ensure_sufficient_stack`] so the configured guest depth limit is
//! reached before the host stack runs out.
//!
//! - **Native targets**: uses `stacker` to grow the stack on demand.
//! - **WASM targets**: no-op passthrough.

/// Minimum stack space to keep available (100KB red zone).
#[cfg(not(target_arch = "wasm32"))]
const RED_ZONE: usize = 100 * 1024;

/// Stack space to allocate when growing (1MB).
#[cfg(not(target_arch = "wasm32"))]
const STACK_PER_RECURSION: usize = 1024 * 1024;

/// Ensure sufficient stack space is available before executing `f`.
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}

/// WASM version - call directly.
#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}
