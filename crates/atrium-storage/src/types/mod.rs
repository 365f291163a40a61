//! Type definitions for atrium storage.

mod collaborations;
mod ids;
mod members;
mod requests;

// Re-export all types from submodules
pub use collaborations::*;
pub use ids::*;
pub use members::*;
pub use requests::*;
