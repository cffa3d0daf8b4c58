//! mirror-util - Leaf utilities shared by the mirror crates.
//!
//! Provides the identity allocators that stamp every mirrored item and a
//! seeded fuzzer for randomized edit scripts.

pub mod fuzzer;
pub mod identity;

pub use fuzzer::Fuzzer;
pub use identity::{Identity, IdentityAllocator, RandomIds, SequentialIds};
