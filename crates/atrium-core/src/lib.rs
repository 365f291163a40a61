//! Core logic for atrium collaborations.
//!
//! This crate is framework-agnostic: the membership workflow, the
//! permission engine and the member directory are plain operations over the
//! [`atrium_storage::CollaborationStore`] and [`atrium_events::EventBus`]
//! contracts, callable from any transport (HTTP, gRPC, CLI).

pub mod config;
pub mod directory;
pub mod error;
pub mod permission;
pub mod workflow;

pub use config::DirectoryLimits;
pub use directory::{MemberDirectory, MemberPage, MemberQuery, PageQuery};
pub use error::WorkflowError;
pub use permission::ActorRole;
pub use workflow::{JoinOptions, MembershipWorkflow, RequestRole, Transition};
