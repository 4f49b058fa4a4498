// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared test doubles and fixtures for graft crates.
//!
//! # Modules
//!
//! - [`config`] - In-memory config store fake for testing without filesystem
//! - [`layout`] - Recording layout-animation companion
//! - [`props`] - Props and delta construction from JSON literals
//! - [`trace`] - Test-writer tracing subscriber
//! - [`tree`] - Node and snapshot builders plus tree walkers
#![forbid(unsafe_code)]

pub mod config;
pub mod layout;
pub mod props;
pub mod trace;
pub mod tree;

// Re-export commonly used items at crate root for convenience
pub use config::InMemoryConfigStore;
pub use layout::{LayoutEvent, RecordingLayoutAnimations};
pub use props::{delta, props};
pub use trace::init_tracing;
pub use tree::{collect_nodes, leaf, node, node_on, snapshot};
