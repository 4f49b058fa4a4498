// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Tracing subscriber for test binaries.

use std::sync::Once;
use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// Installs a global fmt subscriber that writes through the test harness.
///
/// Filtering follows `RUST_LOG` and defaults to `graft_core=debug`. Safe to
/// call from every test; only the first call installs anything.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("graft_core=debug"));
        let installed = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
        if installed.is_err() {
            tracing::debug!("global subscriber already installed");
        }
    });
}
