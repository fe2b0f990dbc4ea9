//! Identity resolution engine for translating loose team member references
//! into canonical keys.
//!
//! The resolution hierarchy is:
//! 1. Email index
//! 2. Hosting-platform (GitHub) username index
//! 3. Deprecated-alias index
//! 4. Fallback: the lower-cased raw identifier itself, as a direct-key
//!    candidate against the team directory

pub mod index;

pub use index::IdentityIndex;
