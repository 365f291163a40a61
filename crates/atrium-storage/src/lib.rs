//! Storage abstraction for atrium.
//!
//! Backend crates (e.g., atrium-store-memory) implement the
//! [`CollaborationStore`] trait so `atrium-core` doesn't depend on any
//! specific database engine or schema details.

mod store;
mod types;

pub use store::*;
pub use types::*;
