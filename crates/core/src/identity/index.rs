//! Case-insensitive lookup indices over the team directory.
//!
//! [`IdentityIndex`] is built once per join pass and then frozen: it clones
//! the roster at construction time, so resolution and privacy checks keep
//! answering against the original two-tier layout even after the live roster
//! has been promoted or stripped by the visibility gate.

use std::collections::HashMap;

use tracing::debug;

use crate::errors::IndexError;
use crate::models::{IndexedField, MemberRef, TeamMember};
use crate::roster::TeamRoster;

/// Read-only resolution indices over a frozen team directory snapshot.
///
/// Three mappings, each `lower(field value) -> lower(canonical name)`, built
/// over the union of public and private members. When two members share a
/// field value, the later one encountered wins.
pub struct IdentityIndex {
    /// Pre-promotion snapshot of the team directory.
    roster: TeamRoster,
    by_email: HashMap<String, String>,
    by_github: HashMap<String, String>,
    by_deprecated_name: HashMap<String, String>,
}

impl IdentityIndex {
    /// Build the indices from the team directory as loaded, before the
    /// visibility gate runs.
    pub fn build(roster: &TeamRoster) -> Self {
        let roster = roster.clone();
        let by_email = index_by_field(&roster, IndexedField::Email);
        let by_github = index_by_field(&roster, IndexedField::Github);
        let by_deprecated_name = index_by_field(&roster, IndexedField::DeprecatedName);

        debug!(
            emails = by_email.len(),
            usernames = by_github.len(),
            aliases = by_deprecated_name.len(),
            "identity index built"
        );

        Self {
            roster,
            by_email,
            by_github,
            by_deprecated_name,
        }
    }

    /// Resolve a reference to a canonical key.
    ///
    /// The raw identifier is lower-cased, then probed against the email,
    /// hosting-username, and deprecated-alias indices in that order; the
    /// first hit wins. With no hit the lower-cased identifier itself is
    /// returned, letting callers still attempt a direct match against the
    /// team directory before concluding failure.
    pub fn resolve(&self, reference: &MemberRef) -> Result<String, IndexError> {
        let raw = reference.raw_key()?.to_lowercase();
        let key = self
            .by_email
            .get(&raw)
            .or_else(|| self.by_github.get(&raw))
            .or_else(|| self.by_deprecated_name.get(&raw))
            .cloned()
            .unwrap_or(raw);
        Ok(key)
    }

    /// Look up a member by canonical key against the frozen snapshot:
    /// public tier first, then private. Absent is `None`, not an error.
    pub fn lookup(&self, key: &str) -> Option<&TeamMember> {
        self.roster.get(key)
    }

    /// Resolve a reference and look the result up in one step.
    pub fn member_for(&self, reference: &MemberRef) -> Result<Option<&TeamMember>, IndexError> {
        Ok(self.lookup(&self.resolve(reference)?))
    }

    /// Whether the reference resolves to a private-tier member.
    ///
    /// A reference to a nonexistent member is not private, it is absent;
    /// presence must be checked separately via [`lookup`](Self::lookup).
    pub fn is_private(&self, reference: &MemberRef) -> Result<bool, IndexError> {
        Ok(self.roster.has_private_key(&self.resolve(reference)?))
    }
}

/// Index one identifier field over every member, public tier then private,
/// with the member's own `private` override block as field fallback.
fn index_by_field(roster: &TeamRoster, field: IndexedField) -> HashMap<String, String> {
    roster
        .members()
        .filter_map(|member| {
            member
                .indexed_field(field)
                .map(|value| (value.to_lowercase(), member.canonical_key()))
        })
        .collect()
}
