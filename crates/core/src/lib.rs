//! TeamJoin core library.
//!
//! This crate joins three otherwise-disconnected site collections — the team
//! directory, the project roster, and activity snippets — into a single
//! consistent dataset, resolving loosely-specified member references (name
//! key, email, hosting username, deprecated alias) to canonical identifiers
//! and enforcing a two-mode visibility policy along the way.
//!
//! The core is pure: no I/O, no persistence, single-threaded transformations
//! over in-memory collections. Hosts load the collections, call
//! [`joiner::join_site`], and render the mutated result.

pub mod errors;
pub mod identity;
pub mod joiner;
pub mod models;
pub mod roster;

// Re-exports for convenience.
pub use errors::{IndexError, JoinError};
pub use identity::IdentityIndex;
pub use joiner::{join_site, ErrorReport, Joiner};
pub use models::{JoinMode, MemberRef, Project, SiteData, Snippet, TeamMember};
pub use roster::TeamRoster;
