//! The two-tier team directory.
//!
//! A [`TeamRoster`] is the team collection as the host supplies it: a mapping
//! from canonical key to member record, with one reserved key (`private`)
//! holding a nested mapping of the same shape. The reserved key is split out
//! at deserialize time so the rest of the crate works with explicit tiers
//! instead of structural mapping surgery.

use indexmap::IndexMap;
use serde::de::Error as DeError;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use tracing::debug;

use crate::models::{JoinMode, TeamMember};

/// Reserved key holding the private tier inside a team collection.
pub const PRIVATE_KEY: &str = "private";

/// The team directory, split into its public and private tiers.
///
/// Keys are assumed canonical (the host normalizes any mangled keys before
/// the core sees the collection). Insertion order is preserved in both tiers
/// so index construction sees members in document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TeamRoster {
    /// Top-level (public-tier) members.
    pub public: IndexMap<String, TeamMember>,
    /// Members nested under the reserved `private` key, if any.
    pub private: Option<IndexMap<String, TeamMember>>,
}

impl TeamRoster {
    /// All members: public tier in order, then the private tier.
    ///
    /// This ordering drives last-write-wins in index construction.
    pub fn members(&self) -> impl Iterator<Item = &TeamMember> {
        self.public
            .values()
            .chain(self.private.iter().flat_map(|tier| tier.values()))
    }

    /// Look up a member by resolved key: public tier first, then private.
    ///
    /// Returns `None` (not an error) when nothing matches; callers
    /// distinguish "absent" from "present but private" separately.
    pub fn get(&self, key: &str) -> Option<&TeamMember> {
        self.public
            .get(key)
            .or_else(|| self.private.as_ref().and_then(|tier| tier.get(key)))
    }

    /// Whether `key` names an entry in the private tier.
    pub fn has_private_key(&self, key: &str) -> bool {
        self.private
            .as_ref()
            .map_or(false, |tier| tier.contains_key(key))
    }

    /// Apply the visibility gate, exactly once per join pass.
    ///
    /// Public mode deletes the private tier outright, making its members
    /// unreachable for the remainder of the pass; internal mode promotes
    /// every private entry to the top level, merging member-wise into any
    /// coexisting public stub. Member-level `private` override blocks get
    /// the same treatment. The identity index must be built *before* this
    /// runs: it snapshots the pre-promotion layout.
    pub fn promote_or_remove(&mut self, mode: JoinMode) {
        match mode {
            JoinMode::Public => {
                let removed = self.private.take().map_or(0, |tier| tier.len());
                for member in self.public.values_mut() {
                    member.private = None;
                }
                debug!(removed, "removed private team data");
            }
            JoinMode::Internal => {
                let mut promoted = 0usize;
                if let Some(tier) = self.private.take() {
                    promoted = tier.len();
                    for (key, member) in tier {
                        match self.public.get_mut(&key) {
                            Some(stub) => stub.merge_from(member),
                            None => {
                                self.public.insert(key, member);
                            }
                        }
                    }
                }
                for member in self.public.values_mut() {
                    member.promote_overrides();
                }
                debug!(promoted, "promoted private team data");
            }
        }
    }
}

impl<'de> Deserialize<'de> for TeamRoster {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = IndexMap::<String, Value>::deserialize(deserializer)?;
        let mut roster = TeamRoster::default();
        for (key, value) in raw {
            if key == PRIVATE_KEY {
                let tier: IndexMap<String, TeamMember> =
                    serde_json::from_value(value).map_err(D::Error::custom)?;
                roster.private = Some(tier);
            } else {
                let member: TeamMember =
                    serde_json::from_value(value).map_err(D::Error::custom)?;
                roster.public.insert(key, member);
            }
        }
        Ok(roster)
    }
}

impl Serialize for TeamRoster {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let len = self.public.len() + usize::from(self.private.is_some());
        let mut map = serializer.serialize_map(Some(len))?;
        for (key, member) in &self.public {
            map.serialize_entry(key, member)?;
        }
        if let Some(tier) = &self.private {
            map.serialize_entry(PRIVATE_KEY, tier)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MemberOverrides;

    fn sample_roster() -> TeamRoster {
        serde_json::from_value(serde_json::json!({
            "mbland": { "name": "mbland" },
            "alison": { "name": "alison", "email": "alison@18f.gov" },
            "private": {
                "mrsecret": { "name": "mrsecret", "github": "secret" },
            },
        }))
        .unwrap()
    }

    #[test]
    fn test_deserialize_splits_private_tier() {
        let roster = sample_roster();
        assert_eq!(roster.public.len(), 2);
        assert!(roster.public.contains_key("mbland"));
        assert!(!roster.public.contains_key("private"));

        let tier = roster.private.as_ref().unwrap();
        assert_eq!(tier.len(), 1);
        assert_eq!(tier["mrsecret"].github.as_deref(), Some("secret"));
    }

    #[test]
    fn test_serialize_merges_private_tier_back() {
        let value = serde_json::to_value(sample_roster()).unwrap();
        assert!(value.get("mbland").is_some());
        assert_eq!(
            value["private"]["mrsecret"]["github"],
            serde_json::json!("secret")
        );
    }

    #[test]
    fn test_get_checks_public_tier_then_private() {
        let roster = sample_roster();
        assert_eq!(roster.get("alison").unwrap().name, "alison");
        assert_eq!(roster.get("mrsecret").unwrap().name, "mrsecret");
        assert!(roster.get("nobody").is_none());
    }

    #[test]
    fn test_has_private_key() {
        let roster = sample_roster();
        assert!(roster.has_private_key("mrsecret"));
        assert!(!roster.has_private_key("mbland"));
        assert!(!roster.has_private_key("nobody"));
    }

    #[test]
    fn test_remove_in_public_mode() {
        let mut roster = sample_roster();
        roster.promote_or_remove(JoinMode::Public);
        assert!(roster.private.is_none());
        assert!(roster.get("mrsecret").is_none());
        assert_eq!(roster.public.len(), 2);
    }

    #[test]
    fn test_promote_in_internal_mode() {
        let mut roster = sample_roster();
        roster.promote_or_remove(JoinMode::Internal);
        assert!(roster.private.is_none());
        assert_eq!(roster.public.len(), 3);
        assert_eq!(roster.public["mrsecret"].github.as_deref(), Some("secret"));
    }

    #[test]
    fn test_promote_merges_public_stub() {
        let mut roster: TeamRoster = serde_json::from_value(serde_json::json!({
            "stub": { "name": "stub" },
            "private": {
                "stub": { "name": "stub", "email": "stub@18f.gov" },
            },
        }))
        .unwrap();

        roster.promote_or_remove(JoinMode::Internal);
        assert_eq!(roster.public.len(), 1);
        assert_eq!(roster.public["stub"].email.as_deref(), Some("stub@18f.gov"));
    }

    #[test]
    fn test_member_override_blocks_follow_the_mode() {
        let mut internal = TeamRoster::default();
        let mut member = TeamMember::named("carlo");
        member.private = Some(MemberOverrides {
            email: Some("carlo@gsa.gov".into()),
            ..Default::default()
        });
        internal.public.insert("carlo".into(), member.clone());

        let mut public = internal.clone();

        internal.promote_or_remove(JoinMode::Internal);
        assert_eq!(
            internal.public["carlo"].email.as_deref(),
            Some("carlo@gsa.gov")
        );
        assert!(internal.public["carlo"].private.is_none());

        public.promote_or_remove(JoinMode::Public);
        assert!(public.public["carlo"].email.is_none());
        assert!(public.public["carlo"].private.is_none());
    }
}
