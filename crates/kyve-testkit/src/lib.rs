//! KYVE Stakers Testing Infrastructure
//!
//! Fakes of the bank, pool registry and validator set, a block-driven
//! [`TestChain`] harness, deterministic fixtures and proptest strategies.
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! kyve-testkit = { path = "../kyve-testkit" }
//! ```
//!
//! ```rust,no_run
//! use kyve_testkit::*;
//!
//! let mut chain = TestChain::new();
//! let alice = chain.create_member(0, 1_000, 0);
//! chain.deliver_ok(leave_pool(0, 0));
//! chain.commit_after_seconds(5 * 24 * 60 * 60);
//! ```

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

pub mod chain;
pub mod fixtures;
pub mod logging;
pub mod mocks;
pub mod strategies;

pub use chain::{TestChain, GENESIS_TIME};
pub use fixtures::*;
pub use logging::init_test_tracing;
pub use mocks::{MockBank, MockPoolRegistry, MockValidatorSet, RewardRecord, SlashRecord};
pub use strategies::*;
