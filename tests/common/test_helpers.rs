//! Shared setup for unit tests

use brewdeck::cache::DiskCache;
use brewdeck::config::CacheConfig;
use brewdeck::provider::{DataProvider, SourceUrls};
use std::sync::{Arc, Once};
use tempfile::TempDir;

use super::MockTransport;

static TRACING: Once = Once::new();

/// Create an isolated test environment with logging initialized once.
pub fn setup_test_env() -> TempDir {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("brewdeck=debug")
            .with_test_writer()
            .try_init();
    });
    TempDir::new().expect("failed to create temp dir")
}

/// Endpoint set pointing at addresses only the mock transport answers.
pub fn test_urls() -> SourceUrls {
    SourceUrls {
        formula: "https://registry.test/formula.json".to_string(),
        cask: "https://registry.test/cask.json".to_string(),
        formula_analytics: "https://registry.test/analytics/formula.json".to_string(),
        cask_analytics: "https://registry.test/analytics/cask.json".to_string(),
    }
}

/// A provider over a mock transport and a cache rooted in `dir`.
pub fn test_provider(transport: Arc<MockTransport>, dir: &TempDir) -> DataProvider {
    let mut ttl = CacheConfig::default();
    ttl.dir = dir.path().join("cache");
    DataProvider::new(
        transport,
        DiskCache::new(ttl.dir.clone()),
        ttl,
        test_urls(),
    )
}
