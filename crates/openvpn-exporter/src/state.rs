//! Shared application state and the global allocator.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use openvpn_exporter_core::collector::Collector;
use openvpn_exporter_core::ratelimit::RateLimiter;

/// Everything the handlers share, passed around as `Arc<AppState>`.
///
/// The collector's metric registry and the rate limiter's window map handle
/// their own synchronization, so no outer lock is needed here.
pub(crate) struct AppState {
    pub(crate) collector: Collector,
    pub(crate) limiter: RateLimiter,
}
