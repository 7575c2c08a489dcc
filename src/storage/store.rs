//! In-memory indexed issue store: the authoritative collection of live
//! issues within a process, backed by an ordered `Vec<Issue>` plus an
//! `id -> index` map.
//!
//! The store has no knowledge of the WAL or the snapshot file; the
//! workspace manager composes this with those components, logging each
//! successful mutation. This keeps the store trivially testable and
//! matches the corpus convention of recomputing reverse lookups (here,
//! dependents) on demand rather than maintaining them incrementally.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::{BeadsError, Result};
use crate::model::{Comment, Dependency, DependencyType, Issue, IssueType, Priority, Status};

/// A partial update to an issue. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct IssuePatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub design: Option<Option<String>>,
    pub acceptance_criteria: Option<Option<String>>,
    pub notes: Option<Option<String>>,
    pub status: Option<Status>,
    pub priority: Option<Priority>,
    pub issue_type: Option<IssueType>,
    pub assignee: Option<Option<String>>,
    pub owner: Option<Option<String>>,
    pub estimated_minutes: Option<Option<i32>>,
    pub due_at: Option<Option<DateTime<Utc>>>,
    pub defer_until: Option<Option<DateTime<Utc>>>,
    pub close_reason: Option<Option<String>>,
    pub external_ref: Option<Option<String>>,
    pub source_system: Option<Option<String>>,
    pub pinned: Option<bool>,
    pub is_template: Option<bool>,
}

impl IssuePatch {
    fn apply(&self, issue: &mut Issue, now: DateTime<Utc>) {
        if let Some(v) = self.title.clone() {
            issue.title = v;
        }
        if let Some(v) = self.description.clone() {
            issue.description = v;
        }
        if let Some(v) = self.design.clone() {
            issue.design = v;
        }
        if let Some(v) = self.acceptance_criteria.clone() {
            issue.acceptance_criteria = v;
        }
        if let Some(v) = self.notes.clone() {
            issue.notes = v;
        }
        if let Some(v) = self.status.clone() {
            let becomes_terminal = v.is_terminal();
            issue.status = v;
            issue.closed_at = if becomes_terminal { Some(now) } else { None };
        }
        if let Some(v) = self.priority {
            issue.priority = v;
        }
        if let Some(v) = self.issue_type.clone() {
            issue.issue_type = v;
        }
        if let Some(v) = self.assignee.clone() {
            issue.assignee = v;
        }
        if let Some(v) = self.owner.clone() {
            issue.owner = v;
        }
        if let Some(v) = self.estimated_minutes {
            issue.estimated_minutes = v;
        }
        if let Some(v) = self.due_at {
            issue.due_at = v;
        }
        if let Some(v) = self.defer_until {
            issue.defer_until = v;
        }
        if let Some(v) = self.close_reason.clone() {
            issue.close_reason = v;
        }
        if let Some(v) = self.external_ref.clone() {
            issue.external_ref = v;
        }
        if let Some(v) = self.source_system.clone() {
            issue.source_system = v;
        }
        if let Some(v) = self.pinned {
            issue.pinned = v;
        }
        if let Some(v) = self.is_template {
            issue.is_template = v;
        }
        issue.updated_at = now;
        issue.refresh_content_hash();
    }
}

/// Sort field for `list`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    CreatedAt,
    UpdatedAt,
    Priority,
}

/// Filter predicate for `list`, a conjunction of optional clauses.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    pub status: Option<Status>,
    pub priority_min: Option<Priority>,
    pub priority_max: Option<Priority>,
    pub issue_type: Option<IssueType>,
    pub assignee: Option<String>,
    pub label: Option<String>,
    pub labels_any: Vec<String>,
    pub title_contains: Option<String>,
    pub description_contains: Option<String>,
    pub notes_contains: Option<String>,
    pub parent: Option<String>,
    pub overdue: bool,
    pub include_deferred: bool,
    pub include_tombstones: bool,
    pub limit: Option<usize>,
    pub sort: Option<(SortField, bool)>, // (field, ascending)
}

impl Filter {
    fn matches(&self, issue: &Issue, now: DateTime<Utc>) -> bool {
        if !self.include_tombstones && issue.status == Status::Tombstone {
            return false;
        }
        if let Some(status) = &self.status {
            if &issue.status != status {
                return false;
            }
        }
        if let Some(min) = self.priority_min {
            if issue.priority < min {
                return false;
            }
        }
        if let Some(max) = self.priority_max {
            if issue.priority > max {
                return false;
            }
        }
        if let Some(t) = &self.issue_type {
            if &issue.issue_type != t {
                return false;
            }
        }
        if let Some(assignee) = &self.assignee {
            if issue.assignee.as_deref() != Some(assignee.as_str()) {
                return false;
            }
        }
        if let Some(label) = &self.label {
            if !issue.labels.iter().any(|l| l == label) {
                return false;
            }
        }
        if !self.labels_any.is_empty()
            && !issue.labels.iter().any(|l| self.labels_any.contains(l))
        {
            return false;
        }
        if let Some(needle) = &self.title_contains {
            if !contains_ci(&issue.title, needle) {
                return false;
            }
        }
        if let Some(needle) = &self.description_contains {
            if !issue
                .description
                .as_deref()
                .is_some_and(|d| contains_ci(d, needle))
            {
                return false;
            }
        }
        if let Some(needle) = &self.notes_contains {
            if !issue.notes.as_deref().is_some_and(|n| contains_ci(n, needle)) {
                return false;
            }
        }
        if let Some(parent) = &self.parent {
            let is_child = issue.dependencies.iter().any(|d| {
                d.dep_type == DependencyType::ParentChild && &d.depends_on_id == parent
            });
            if !is_child {
                return false;
            }
        }
        if self.overdue && !issue.due_at.is_some_and(|d| d < now) {
            return false;
        }
        if !self.include_deferred && issue.defer_until.is_some_and(|d| d > now) {
            return false;
        }
        true
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// The in-memory issue store.
#[derive(Debug, Default)]
pub struct IssueStore {
    issues: Vec<Issue>,
    index: HashMap<String, usize>,
}

impl IssueStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the store from a flat list of issues (used by workspace load).
    #[must_use]
    pub fn from_issues(issues: Vec<Issue>) -> Self {
        let mut store = Self::new();
        for issue in issues {
            store.index.insert(issue.id.clone(), store.issues.len());
            store.issues.push(issue);
        }
        store
    }

    pub fn insert(&mut self, mut issue: Issue) -> Result<u64> {
        if self.index.contains_key(&issue.id) {
            return Err(BeadsError::IdCollision { id: issue.id });
        }
        issue.version = 1;
        issue.dirty = true;
        issue.refresh_content_hash();
        let version = issue.version;
        debug!(id = %issue.id, version, "issue inserted");
        self.index.insert(issue.id.clone(), self.issues.len());
        self.issues.push(issue);
        Ok(version)
    }

    pub fn update(
        &mut self,
        id: &str,
        patch: &IssuePatch,
        expected_version: Option<u64>,
        now: DateTime<Utc>,
    ) -> Result<u64> {
        let idx = self.index_of(id)?;
        let issue = &mut self.issues[idx];

        if let Some(expected) = expected_version {
            if issue.version != expected {
                return Err(BeadsError::VersionConflict {
                    id: id.to_string(),
                    expected,
                    actual: issue.version,
                });
            }
        }

        patch.apply(issue, now);
        issue.version += 1;
        issue.dirty = true;
        let version = issue.version;
        debug!(id, version, "issue updated");
        Ok(version)
    }

    pub fn delete(&mut self, id: &str, cascade: bool, hard: bool, now: DateTime<Utc>) -> Result<()> {
        self.index_of(id)?;

        if cascade {
            let dependents: Vec<String> = self
                .issues
                .iter()
                .filter(|i| {
                    i.dependencies.iter().any(|d| {
                        d.depends_on_id == id
                            && (d.dep_type == DependencyType::ParentChild
                                || d.dep_type == DependencyType::Blocks)
                    })
                })
                .map(|i| i.id.clone())
                .collect();
            for dep_id in dependents {
                if dep_id != id {
                    self.delete(&dep_id, true, hard, now)?;
                }
            }
        }

        if hard {
            let idx = self.index_of(id)?;
            self.issues.remove(idx);
            self.index.remove(id);
            for (other_id, other_idx) in self.index.iter_mut() {
                if *other_idx > idx {
                    *other_idx -= 1;
                }
                let _ = other_id;
            }
        } else {
            let idx = self.index_of(id)?;
            let issue = &mut self.issues[idx];
            issue.status = Status::Tombstone;
            issue.closed_at = Some(now);
            issue.updated_at = now;
            issue.version += 1;
            issue.dirty = true;
        }

        debug!(id, hard, cascade, "issue deleted");
        Ok(())
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Issue> {
        self.index.get(id).map(|&idx| &self.issues[idx])
    }

    #[must_use]
    pub fn get_mut(&mut self, id: &str) -> Option<&mut Issue> {
        if let Some(&idx) = self.index.get(id) {
            Some(&mut self.issues[idx])
        } else {
            None
        }
    }

    #[must_use]
    pub fn exists(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Insert or overwrite an issue verbatim, preserving its `version` and
    /// `dirty` flag as given. Used by the sync engine to adopt a record
    /// coming from the snapshot file, where the version already reflects
    /// what is durable on disk and is not a fresh local mutation.
    pub fn replace_issue(&mut self, issue: Issue) {
        if let Some(&idx) = self.index.get(&issue.id) {
            self.issues[idx] = issue;
        } else {
            self.index.insert(issue.id.clone(), self.issues.len());
            self.issues.push(issue);
        }
    }

    #[must_use]
    pub fn list(&self, filter: &Filter, now: DateTime<Utc>) -> Vec<&Issue> {
        let mut matched: Vec<&Issue> = self
            .issues
            .iter()
            .filter(|issue| filter.matches(issue, now))
            .collect();

        if let Some((field, ascending)) = filter.sort {
            matched.sort_by(|a, b| {
                let primary = match field {
                    SortField::CreatedAt => a.created_at.cmp(&b.created_at),
                    SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
                    SortField::Priority => a.priority.cmp(&b.priority),
                };
                let primary = if ascending { primary } else { primary.reverse() };
                primary.then_with(|| a.id.cmp(&b.id))
            });
        } else {
            matched.sort_by(|a, b| a.id.cmp(&b.id));
        }

        if let Some(limit) = filter.limit {
            matched.truncate(limit);
        }

        matched
    }

    #[must_use]
    pub fn count(&self, group_by: Option<&str>) -> HashMap<String, usize> {
        let mut counts = HashMap::new();
        for issue in &self.issues {
            if issue.status == Status::Tombstone {
                continue;
            }
            let key = match group_by {
                Some("status") => issue.status.as_str().to_string(),
                Some("priority") => issue.priority.to_string(),
                Some("issue_type") => issue.issue_type.as_str().to_string(),
                _ => "total".to_string(),
            };
            *counts.entry(key).or_insert(0) += 1;
        }
        counts
    }

    pub fn claim(
        &mut self,
        id: &str,
        actor: &str,
        expected_version: Option<u64>,
        now: DateTime<Utc>,
    ) -> Result<u64> {
        let idx = self.index_of(id)?;
        let issue = &mut self.issues[idx];

        if let Some(expected) = expected_version {
            if issue.version != expected {
                return Err(BeadsError::VersionConflict {
                    id: id.to_string(),
                    expected,
                    actual: issue.version,
                });
            }
        }

        if issue.status == Status::Open {
            issue.status = Status::InProgress;
        }
        issue.assignee = Some(actor.to_string());
        issue.updated_at = now;
        issue.version += 1;
        issue.dirty = true;
        Ok(issue.version)
    }

    pub fn add_dependency(&mut self, from: &str, dep: Dependency, now: DateTime<Utc>) -> Result<()> {
        let idx = self.index_of(from)?;
        let issue = &mut self.issues[idx];
        if issue
            .dependencies
            .iter()
            .any(|d| d.depends_on_id == dep.depends_on_id && d.dep_type == dep.dep_type)
        {
            return Err(BeadsError::DuplicateDependency {
                from: from.to_string(),
                to: dep.depends_on_id,
            });
        }
        issue.dependencies.push(dep);
        issue.updated_at = now;
        issue.version += 1;
        issue.dirty = true;
        Ok(())
    }

    pub fn remove_dependency(&mut self, from: &str, to: &str, now: DateTime<Utc>) -> Result<()> {
        let idx = self.index_of(from)?;
        let issue = &mut self.issues[idx];
        let before = issue.dependencies.len();
        issue.dependencies.retain(|d| d.depends_on_id != to);
        if issue.dependencies.len() != before {
            issue.updated_at = now;
            issue.version += 1;
            issue.dirty = true;
        }
        Ok(())
    }

    pub fn add_label(&mut self, id: &str, label: &str, now: DateTime<Utc>) -> Result<()> {
        let idx = self.index_of(id)?;
        let issue = &mut self.issues[idx];
        if !issue.labels.iter().any(|l| l == label) {
            issue.labels.push(label.to_string());
            issue.updated_at = now;
            issue.version += 1;
            issue.dirty = true;
        }
        Ok(())
    }

    pub fn remove_label(&mut self, id: &str, label: &str, now: DateTime<Utc>) -> Result<()> {
        let idx = self.index_of(id)?;
        let issue = &mut self.issues[idx];
        let before = issue.labels.len();
        issue.labels.retain(|l| l != label);
        if issue.labels.len() != before {
            issue.updated_at = now;
            issue.version += 1;
            issue.dirty = true;
        }
        Ok(())
    }

    pub fn add_comment(&mut self, id: &str, comment: Comment) -> Result<()> {
        let idx = self.index_of(id)?;
        let issue = &mut self.issues[idx];
        issue.comments.push(comment);
        issue.version += 1;
        issue.dirty = true;
        Ok(())
    }

    #[must_use]
    pub fn get_dirty_ids(&self) -> Vec<String> {
        self.issues
            .iter()
            .filter(|i| i.dirty)
            .map(|i| i.id.clone())
            .collect()
    }

    pub fn clear_dirty(&mut self, id: &str) {
        if let Some(issue) = self.get_mut(id) {
            issue.dirty = false;
        }
    }

    pub fn clear_all_dirty(&mut self) {
        for issue in &mut self.issues {
            issue.dirty = false;
        }
    }

    #[must_use]
    pub fn all(&self) -> &[Issue] {
        &self.issues
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.issues.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    #[must_use]
    pub fn known_ids(&self) -> Vec<String> {
        self.index.keys().cloned().collect()
    }

    fn index_of(&self, id: &str) -> Result<usize> {
        self.index.get(id).copied().ok_or_else(|| BeadsError::IssueNotFound {
            id: id.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::IssueType;

    fn make_issue(id: &str, now: DateTime<Utc>) -> Issue {
        Issue::new(
            id.to_string(),
            format!("Title {id}"),
            IssueType::Task,
            Priority::MEDIUM,
            Some("tester".to_string()),
            now,
        )
    }

    #[test]
    fn insert_then_get() {
        let now = Utc::now();
        let mut store = IssueStore::new();
        store.insert(make_issue("bd-a", now)).unwrap();
        assert!(store.exists("bd-a"));
        assert_eq!(store.get("bd-a").unwrap().version, 1);
    }

    #[test]
    fn insert_duplicate_id_fails() {
        let now = Utc::now();
        let mut store = IssueStore::new();
        store.insert(make_issue("bd-a", now)).unwrap();
        let err = store.insert(make_issue("bd-a", now)).unwrap_err();
        assert!(matches!(err, BeadsError::IdCollision { .. }));
    }

    #[test]
    fn update_bumps_version_and_dirty() {
        let now = Utc::now();
        let mut store = IssueStore::new();
        store.insert(make_issue("bd-a", now)).unwrap();
        store.clear_dirty("bd-a");

        let mut patch = IssuePatch::default();
        patch.title = Some("New title".to_string());
        let version = store.update("bd-a", &patch, None, now).unwrap();

        assert_eq!(version, 2);
        assert!(store.get("bd-a").unwrap().dirty);
        assert_eq!(store.get("bd-a").unwrap().title, "New title");
    }

    #[test]
    fn optimistic_concurrency_rejects_stale_version() {
        let now = Utc::now();
        let mut store = IssueStore::new();
        store.insert(make_issue("bd-a", now)).unwrap();

        let patch = IssuePatch {
            title: Some("v2".to_string()),
            ..Default::default()
        };
        store.update("bd-a", &patch, Some(1), now).unwrap();
        assert_eq!(store.get("bd-a").unwrap().title, "v2");

        let patch2 = IssuePatch {
            title: Some("v3".to_string()),
            ..Default::default()
        };
        let err = store.update("bd-a", &patch2, Some(1), now).unwrap_err();
        assert!(matches!(err, BeadsError::VersionConflict { .. }));
        assert_eq!(store.get("bd-a").unwrap().title, "v2");
    }

    #[test]
    fn soft_delete_tombstones_and_hides_from_default_list() {
        let now = Utc::now();
        let mut store = IssueStore::new();
        store.insert(make_issue("bd-a", now)).unwrap();
        store.delete("bd-a", false, false, now).unwrap();

        assert_eq!(store.get("bd-a").unwrap().status, Status::Tombstone);

        let filter = Filter::default();
        assert!(store.list(&filter, now).is_empty());
    }

    #[test]
    fn hard_delete_removes_entirely() {
        let now = Utc::now();
        let mut store = IssueStore::new();
        store.insert(make_issue("bd-a", now)).unwrap();
        store.insert(make_issue("bd-b", now)).unwrap();
        store.delete("bd-a", false, true, now).unwrap();

        assert!(!store.exists("bd-a"));
        assert!(store.exists("bd-b"));
    }

    #[test]
    fn claim_sets_assignee_and_status() {
        let now = Utc::now();
        let mut store = IssueStore::new();
        store.insert(make_issue("bd-a", now)).unwrap();
        store.claim("bd-a", "alice", None, now).unwrap();

        let issue = store.get("bd-a").unwrap();
        assert_eq!(issue.assignee.as_deref(), Some("alice"));
        assert_eq!(issue.status, Status::InProgress);
    }

    #[test]
    fn filter_by_priority_range_inclusive() {
        let now = Utc::now();
        let mut store = IssueStore::new();
        let mut low = make_issue("bd-a", now);
        low.priority = Priority::LOW;
        let mut high = make_issue("bd-b", now);
        high.priority = Priority::HIGH;
        store.insert(low).unwrap();
        store.insert(high).unwrap();

        let filter = Filter {
            priority_min: Some(Priority::MEDIUM),
            priority_max: Some(Priority::LOW),
            ..Default::default()
        };
        let results = store.list(&filter, now);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "bd-a");
    }

    #[test]
    fn sort_ties_break_on_id_ascending() {
        let now = Utc::now();
        let mut store = IssueStore::new();
        store.insert(make_issue("bd-z", now)).unwrap();
        store.insert(make_issue("bd-a", now)).unwrap();

        let filter = Filter {
            sort: Some((SortField::Priority, true)),
            ..Default::default()
        };
        let results = store.list(&filter, now);
        assert_eq!(results[0].id, "bd-a");
        assert_eq!(results[1].id, "bd-z");
    }

    #[test]
    fn get_dirty_ids_and_clear() {
        let now = Utc::now();
        let mut store = IssueStore::new();
        store.insert(make_issue("bd-a", now)).unwrap();
        assert_eq!(store.get_dirty_ids(), vec!["bd-a".to_string()]);
        store.clear_dirty("bd-a");
        assert!(store.get_dirty_ids().is_empty());
    }
}
