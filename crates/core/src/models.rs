//! Domain model types used throughout TeamJoin.
//!
//! These types describe the three site collections (team, projects,
//! snippets) at the host boundary. Records carry their well-known fields as
//! typed members and keep everything else in a flattened extras map, so the
//! joiner can rewrite what it understands without disturbing what it does
//! not.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::IndexError;
use crate::roster::TeamRoster;

// ---------------------------------------------------------------------------
// Join mode
// ---------------------------------------------------------------------------

/// Visibility policy for a join pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinMode {
    /// Public site build: the private tier is stripped, private members and
    /// on-hold projects are excluded from joined output.
    Public,
    /// Internal build: private records are promoted to first-class
    /// visibility and broken snippet attribution is fatal.
    Internal,
}

impl JoinMode {
    /// Translate the host's `public` flag into a mode.
    pub fn from_public_flag(public: bool) -> Self {
        if public {
            Self::Public
        } else {
            Self::Internal
        }
    }

    pub fn is_public(self) -> bool {
        matches!(self, Self::Public)
    }
}

impl std::fmt::Display for JoinMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Public => write!(f, "public"),
            Self::Internal => write!(f, "internal"),
        }
    }
}

// ---------------------------------------------------------------------------
// Team member
// ---------------------------------------------------------------------------

/// A team directory entry.
///
/// The canonical key for all joining is the lower-cased `name`; the original
/// casing is preserved for display. A member may carry its own nested
/// `private` override block, supporting the layout where a public stub
/// coexists with a richer private record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamMember {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Hosting-platform username.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github: Option<String>,

    /// Historical alias kept for old references.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecated_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,

    /// Cross-reference link to the member's own API entry.
    #[serde(rename = "self", default, skip_serializing_if = "Option::is_none")]
    pub self_link: Option<String>,

    /// Private override block: fields visible only in internal mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private: Option<MemberOverrides>,

    /// All other fields, preserved verbatim.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl TeamMember {
    /// Minimal member with only a name, used pervasively in tests.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: None,
            github: None,
            deprecated_name: None,
            full_name: None,
            first_name: None,
            last_name: None,
            self_link: None,
            private: None,
            extra: serde_json::Map::new(),
        }
    }

    /// The stable join target for this member.
    pub fn canonical_key(&self) -> String {
        self.name.to_lowercase()
    }

    /// Value of an indexed identifier field, falling back into the member's
    /// own `private` override block when the top-level field is absent.
    pub fn indexed_field(&self, field: IndexedField) -> Option<&str> {
        let direct = match field {
            IndexedField::Email => self.email.as_deref(),
            IndexedField::Github => self.github.as_deref(),
            IndexedField::DeprecatedName => self.deprecated_name.as_deref(),
        };
        direct.or_else(|| {
            self.private.as_ref().and_then(|overrides| match field {
                IndexedField::Email => overrides.email.as_deref(),
                IndexedField::Github => overrides.github.as_deref(),
                IndexedField::DeprecatedName => overrides.deprecated_name.as_deref(),
            })
        })
    }

    /// Overlay another record onto this one. Present fields on `other` win;
    /// extras are merged key-wise with `other` winning.
    pub fn merge_from(&mut self, other: TeamMember) {
        self.name = other.name;
        merge_option(&mut self.email, other.email);
        merge_option(&mut self.github, other.github);
        merge_option(&mut self.deprecated_name, other.deprecated_name);
        merge_option(&mut self.full_name, other.full_name);
        merge_option(&mut self.first_name, other.first_name);
        merge_option(&mut self.last_name, other.last_name);
        merge_option(&mut self.self_link, other.self_link);
        merge_option(&mut self.private, other.private);
        self.extra.extend(other.extra);
    }

    /// Merge the member's own `private` override block into the member and
    /// clear it (internal-mode promotion at the record level).
    pub fn promote_overrides(&mut self) {
        if let Some(overrides) = self.private.take() {
            merge_option(&mut self.email, overrides.email);
            merge_option(&mut self.github, overrides.github);
            merge_option(&mut self.deprecated_name, overrides.deprecated_name);
            merge_option(&mut self.full_name, overrides.full_name);
            merge_option(&mut self.first_name, overrides.first_name);
            merge_option(&mut self.last_name, overrides.last_name);
            merge_option(&mut self.self_link, overrides.self_link);
            self.extra.extend(overrides.extra);
        }
    }
}

fn merge_option<T>(target: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *target = value;
    }
}

/// Partial member record nested under a member's own `private` key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemberOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecated_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,

    #[serde(rename = "self", default, skip_serializing_if = "Option::is_none")]
    pub self_link: Option<String>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// The identifier fields indexed by the identity index, besides the
/// canonical name key itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexedField {
    Email,
    Github,
    DeprecatedName,
}

// ---------------------------------------------------------------------------
// Member references
// ---------------------------------------------------------------------------

/// A loosely-specified reference to a team member.
///
/// Two shapes appear in site data: a plain string (matched case-insensitively
/// against canonical key, email, hosting username, and deprecated alias) and
/// a structured object carrying one of the identifying fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MemberRef {
    Name(String),
    Fields(RefFields),
}

/// The structured reference shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RefFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecated_name: Option<String>,
}

impl MemberRef {
    /// Reduce the reference to its raw identifier string.
    ///
    /// Structured references are read in precedence order: `id`, `email`,
    /// `github`, `deprecated_name`; the first present field wins. A
    /// structured reference with no identifying field at all is a
    /// [`IndexError::MalformedReference`].
    pub fn raw_key(&self) -> Result<&str, IndexError> {
        match self {
            Self::Name(name) => Ok(name),
            Self::Fields(fields) => fields
                .id
                .as_deref()
                .or(fields.email.as_deref())
                .or(fields.github.as_deref())
                .or(fields.deprecated_name.as_deref())
                .ok_or_else(|| IndexError::MalformedReference(format!("{fields:?}"))),
        }
    }
}

impl From<&str> for MemberRef {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for MemberRef {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

// ---------------------------------------------------------------------------
// Projects
// ---------------------------------------------------------------------------

/// A project roster entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Project {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    /// Hosting repository name(s); the first entry keys the error report.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github: Option<RepoField>,

    /// Team references, rewritten to canonical keys by the join.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<Vec<MemberRef>>,

    /// Join errors attached to this project (only when non-empty).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl Project {
    /// On-hold projects are excluded from public-mode output.
    pub fn on_hold(&self) -> bool {
        self.status.as_deref() == Some("Hold")
    }
}

/// A field that may hold one repository name or a list of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RepoField {
    One(String),
    Many(Vec<String>),
}

impl RepoField {
    pub fn first(&self) -> Option<&str> {
        match self {
            Self::One(name) => Some(name),
            Self::Many(names) => names.first().map(String::as_str),
        }
    }
}

// ---------------------------------------------------------------------------
// Snippets
// ---------------------------------------------------------------------------

/// A single activity snippet entry.
///
/// The `username` reference is consumed by the join: attribution fields from
/// the resolved member replace it in the flattened field map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snippet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<MemberRef>,

    #[serde(flatten)]
    pub fields: serde_json::Map<String, Value>,
}

// ---------------------------------------------------------------------------
// Site data
// ---------------------------------------------------------------------------

/// The three collections the host hands to a join pass.
///
/// All collections are optional in input data; absent ones join to empty
/// output. Snippet groups are keyed by timestamp and keep their original
/// ordering.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SiteData {
    #[serde(default)]
    pub team: TeamRoster,

    #[serde(default)]
    pub projects: IndexMap<String, Project>,

    #[serde(default)]
    pub snippets: IndexMap<String, Vec<Snippet>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_ref_string_shape() {
        let reference: MemberRef = serde_json::from_str("\"mbland\"").unwrap();
        assert_eq!(reference, MemberRef::Name("mbland".into()));
        assert_eq!(reference.raw_key().unwrap(), "mbland");
    }

    #[test]
    fn test_member_ref_structured_precedence() {
        let reference: MemberRef = serde_json::from_value(serde_json::json!({
            "email": "alison@18f.gov",
            "github": "ignored",
        }))
        .unwrap();
        assert_eq!(reference.raw_key().unwrap(), "alison@18f.gov");

        let reference: MemberRef = serde_json::from_value(serde_json::json!({
            "id": "boone",
            "email": "ignored@18f.gov",
        }))
        .unwrap();
        assert_eq!(reference.raw_key().unwrap(), "boone");

        let reference: MemberRef =
            serde_json::from_value(serde_json::json!({ "github": "jmcarp" })).unwrap();
        assert_eq!(reference.raw_key().unwrap(), "jmcarp");
    }

    #[test]
    fn test_member_ref_malformed() {
        let reference: MemberRef = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(matches!(
            reference.raw_key(),
            Err(IndexError::MalformedReference(_))
        ));
    }

    #[test]
    fn test_indexed_field_private_fallback() {
        let mut member = TeamMember::named("mrsecret");
        assert_eq!(member.indexed_field(IndexedField::Github), None);

        member.private = Some(MemberOverrides {
            github: Some("secret".into()),
            ..Default::default()
        });
        assert_eq!(member.indexed_field(IndexedField::Github), Some("secret"));

        // Top-level value still wins over the override block.
        member.github = Some("public-handle".into());
        assert_eq!(
            member.indexed_field(IndexedField::Github),
            Some("public-handle")
        );
    }

    #[test]
    fn test_member_promote_overrides() {
        let mut member = TeamMember::named("stub");
        member.email = Some("stub@example.gov".into());
        member.private = Some(MemberOverrides {
            email: Some("real@example.gov".into()),
            full_name: Some("Real Name".into()),
            ..Default::default()
        });

        member.promote_overrides();
        assert_eq!(member.email.as_deref(), Some("real@example.gov"));
        assert_eq!(member.full_name.as_deref(), Some("Real Name"));
        assert!(member.private.is_none());
    }

    #[test]
    fn test_repo_field_first() {
        let one = RepoField::One("team-api".into());
        assert_eq!(one.first(), Some("team-api"));

        let many = RepoField::Many(vec!["primary".into(), "mirror".into()]);
        assert_eq!(many.first(), Some("primary"));

        let empty = RepoField::Many(Vec::new());
        assert_eq!(empty.first(), None);
    }

    #[test]
    fn test_project_hold_status() {
        let mut project = Project::default();
        assert!(!project.on_hold());
        project.status = Some("Hold".into());
        assert!(project.on_hold());
        project.status = Some("hold".into());
        assert!(!project.on_hold());
    }

    #[test]
    fn test_snippet_preserves_free_form_fields() {
        let snippet: Snippet = serde_json::from_value(serde_json::json!({
            "username": "mbland",
            "last_week": "Shipped the joiner",
            "this_week": "Docs",
        }))
        .unwrap();
        assert_eq!(snippet.username, Some(MemberRef::Name("mbland".into())));
        assert_eq!(
            snippet.fields.get("last_week").and_then(Value::as_str),
            Some("Shipped the joiner")
        );
    }

    #[test]
    fn test_member_serde_self_rename() {
        let member: TeamMember = serde_json::from_value(serde_json::json!({
            "name": "mbland",
            "self": "https://team.example.gov/api/mbland.json",
        }))
        .unwrap();
        assert_eq!(
            member.self_link.as_deref(),
            Some("https://team.example.gov/api/mbland.json")
        );

        let value = serde_json::to_value(&member).unwrap();
        assert!(value.get("self").is_some());
        assert!(value.get("self_link").is_none());
    }
}
