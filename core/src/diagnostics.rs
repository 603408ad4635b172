//! Cold-path diagnostics dump: cheap process-global counters, read only
//! when asked, with no tracing/logging overhead on the fast path.

use crate::{memory, symbol};

/// Write a one-line snapshot of pool depth, live heap object count, and
/// namespace count to stderr. Intended for a host's SIGQUIT handler or
/// equivalent, not for routine logging.
pub fn dump_diagnostics() {
    let live = memory::hooks::allocs().saturating_sub(memory::hooks::frees());
    eprintln!(
        "tiny-clj diagnostics: pool_depth={} live_heap_objects={} namespaces={} handler_depth={}",
        memory::pool_depth(),
        live,
        symbol::namespace_count(),
        crate::exception::handler_depth(),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dump_diagnostics_does_not_panic() {
        dump_diagnostics();
    }
}
