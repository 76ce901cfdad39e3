//! Stack growth for deep type graphs.

/// Grow the stack when less than this remains.
const RED_ZONE: usize = 100 * 1024;

/// Size of each new stack segment.
const STACK_PER_RECURSION: usize = 1024 * 1024;

/// Run `f`, growing the stack first if it is nearly exhausted.
///
/// Wraps the recursive steps of conversion and expansion, whose depth
/// follows the nesting of user types.
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}

#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn depth(n: usize) -> usize {
        ensure_sufficient_stack(|| if n == 0 { 0 } else { 1 + depth(n - 1) })
    }

    #[test]
    fn deep_recursion_completes() {
        assert_eq!(depth(100_000), 100_000);
    }
}
