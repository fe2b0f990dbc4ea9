//! Joins the three site collections into one consistent dataset.
//!
//! The [`Joiner`] drives a single pass:
//!
//! 1. Build the [`IdentityIndex`] over the pre-promotion team directory.
//! 2. Run the visibility gate (promote or remove the private tier).
//! 3. Rewrite project team lists to canonical keys, collecting per-project
//!    errors into the global report.
//! 4. Join snippet entries to member attribution fields.
//!
//! Each join step is independent given the index; no step feeds data back
//! into it. Per-project resolution failures are recovered locally so one bad
//! reference never blocks the rest of the site's data; only snippet-author
//! failures in internal mode are fatal.

use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::errors::JoinError;
use crate::identity::IdentityIndex;
use crate::models::{JoinMode, MemberRef, Project, SiteData, Snippet, TeamMember};
use crate::roster::TeamRoster;

/// Global error report: project identifier -> error strings, populated only
/// for projects whose join produced at least one error.
pub type ErrorReport = IndexMap<String, Vec<String>>;

// ---------------------------------------------------------------------------
// Joiner
// ---------------------------------------------------------------------------

/// Applies the visibility policy and joins projects and snippets against the
/// identity index.
pub struct Joiner {
    mode: JoinMode,
    index: IdentityIndex,
    report: ErrorReport,
}

impl Joiner {
    /// Create a joiner for one pass, snapshotting the team directory as it
    /// is right now. Call this *before* the visibility gate mutates the
    /// roster.
    pub fn new(roster: &TeamRoster, mode: JoinMode) -> Self {
        info!(%mode, "initializing joiner");
        Self {
            mode,
            index: IdentityIndex::build(roster),
            report: ErrorReport::new(),
        }
    }

    pub fn mode(&self) -> JoinMode {
        self.mode
    }

    pub fn index(&self) -> &IdentityIndex {
        &self.index
    }

    /// Errors accumulated by project joins so far.
    pub fn report(&self) -> &ErrorReport {
        &self.report
    }

    /// Consume the joiner, yielding the global error report.
    pub fn into_report(self) -> ErrorReport {
        self.report
    }

    // -----------------------------------------------------------------------
    // Team lists
    // -----------------------------------------------------------------------

    /// Rewrite a list of references into canonical keys.
    ///
    /// Per reference:
    /// - no member matches: `"Unknown Team Member: <key>"` is appended to
    ///   `errors` and the reference is dropped;
    /// - member is private and the pass is public: dropped silently;
    /// - otherwise the member's lower-cased canonical name is emitted.
    ///
    /// Output order matches input order, omitting dropped entries. A `None`
    /// or empty input yields an empty list and leaves `errors` untouched.
    pub fn join_team_list(
        &self,
        references: Option<&[MemberRef]>,
        errors: &mut Vec<String>,
    ) -> Result<Vec<String>, JoinError> {
        let references = references.unwrap_or(&[]);
        let mut joined = Vec::with_capacity(references.len());
        for reference in references {
            if let Some(key) = self.canonical_reference(reference, errors)? {
                joined.push(key);
            }
        }
        Ok(joined)
    }

    /// Resolve one reference to its canonical key, or record why it was
    /// dropped. `Ok(None)` means "dropped"; malformed references abort.
    fn canonical_reference(
        &self,
        reference: &MemberRef,
        errors: &mut Vec<String>,
    ) -> Result<Option<String>, JoinError> {
        let key = self.index.resolve(reference)?;
        match self.index.lookup(&key) {
            None => {
                errors.push(format!("Unknown Team Member: {key}"));
                Ok(None)
            }
            Some(_) if self.mode.is_public() && self.index.is_private(reference)? => Ok(None),
            Some(member) => Ok(Some(member.canonical_key())),
        }
    }

    // -----------------------------------------------------------------------
    // Projects
    // -----------------------------------------------------------------------

    /// Join every project's team list, excluding on-hold projects in public
    /// mode. Errors (including pre-existing ones on the project) are
    /// attached to the project and recorded in the global report.
    pub fn join_projects(
        &mut self,
        projects: &mut IndexMap<String, Project>,
    ) -> Result<(), JoinError> {
        if self.mode.is_public() {
            let before = projects.len();
            projects.retain(|_, project| !project.on_hold());
            let excluded = before - projects.len();
            if excluded > 0 {
                debug!(excluded, "excluded on-hold projects from public output");
            }
        }

        for (key, project) in projects.iter_mut() {
            let mut errors = std::mem::take(&mut project.errors);
            let joined = self.join_team_list(project.team.as_deref(), &mut errors)?;
            if project.team.is_some() {
                project.team = Some(joined.into_iter().map(MemberRef::Name).collect());
            }
            if !errors.is_empty() {
                let report_key = report_key(key, project);
                warn!(
                    project = %report_key,
                    count = errors.len(),
                    "project team join produced errors"
                );
                project.errors = errors.clone();
                self.report.insert(report_key, errors);
            }
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Snippets
    // -----------------------------------------------------------------------

    /// Join snippet entries to member attribution, dropping entries from
    /// unknown authors in public mode and failing on them otherwise. Groups
    /// left with zero entries are removed; surviving groups keep their
    /// original timestamp ordering.
    ///
    /// Resolution and existence answer against the frozen pre-gate
    /// snapshot, but attribution fields are copied from `roster` — the live,
    /// post-gate team directory — so internal-mode output carries the same
    /// promoted private fields the roster itself shows. Authors no longer
    /// present in `roster` (private members surviving a public pass) fall
    /// back to their snapshot record.
    pub fn join_snippets(
        &self,
        snippets: &mut IndexMap<String, Vec<Snippet>>,
        roster: &TeamRoster,
    ) -> Result<(), JoinError> {
        let groups = std::mem::take(snippets);
        for (timestamp, entries) in groups {
            let mut joined = Vec::with_capacity(entries.len());
            for mut snippet in entries {
                if self.join_snippet(&mut snippet, roster)? {
                    joined.push(snippet);
                }
            }
            if !joined.is_empty() {
                snippets.insert(timestamp, joined);
            }
        }
        Ok(())
    }

    /// Join one snippet entry in place. Returns whether it survives.
    fn join_snippet(&self, snippet: &mut Snippet, roster: &TeamRoster) -> Result<bool, JoinError> {
        let reference = match snippet.username.take() {
            Some(reference) => reference,
            None => {
                return Err(crate::errors::IndexError::MalformedReference(
                    "snippet entry without a username".into(),
                )
                .into())
            }
        };

        let key = self.index.resolve(&reference)?;
        match self.index.lookup(&key) {
            Some(snapshot) => {
                let member = roster.get(&key).unwrap_or(snapshot);
                copy_attribution(snippet, member);
                Ok(true)
            }
            None if self.mode.is_public() => {
                debug!(username = %key, "dropped snippet from unknown author");
                Ok(false)
            }
            None => Err(JoinError::UnknownSnippetUsername(key)),
        }
    }
}

/// Copy the designated attribution fields that exist on the member into the
/// snippet entry, overwriting any same-named fields.
fn copy_attribution(snippet: &mut Snippet, member: &TeamMember) {
    snippet
        .fields
        .insert("name".into(), Value::String(member.name.clone()));
    let optional = [
        ("full_name", &member.full_name),
        ("first_name", &member.first_name),
        ("last_name", &member.last_name),
        ("self", &member.self_link),
    ];
    for (field, value) in optional {
        if let Some(value) = value {
            snippet
                .fields
                .insert(field.into(), Value::String(value.clone()));
        }
    }
}

/// Report key for a project: first hosting repo if present, else the
/// project's name, else its collection key.
fn report_key(collection_key: &str, project: &Project) -> String {
    project
        .github
        .as_ref()
        .and_then(|repos| repos.first())
        .or(project.name.as_deref())
        .unwrap_or(collection_key)
        .to_string()
}

// ---------------------------------------------------------------------------
// Pass orchestration
// ---------------------------------------------------------------------------

/// Run a full join pass over the site's collections, in place.
///
/// Builds the identity index from the pre-promotion team directory, runs the
/// visibility gate, then the project and snippet joins. Returns the global
/// error report.
pub fn join_site(site: &mut SiteData, mode: JoinMode) -> Result<ErrorReport, JoinError> {
    let mut joiner = Joiner::new(&site.team, mode);
    site.team.promote_or_remove(mode);
    joiner.join_projects(&mut site.projects)?;
    joiner.join_snippets(&mut site.snippets, &site.team)?;
    info!(
        projects = site.projects.len(),
        snippet_groups = site.snippets.len(),
        errors = joiner.report().len(),
        "join pass complete"
    );
    Ok(joiner.into_report())
}
