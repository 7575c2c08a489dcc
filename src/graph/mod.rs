//! Dependency graph operations over the issue store.
//!
//! Edges live on the owning ("from") issue for locality; this module
//! provides reverse-edge lookup and the global queries (cycles, ready,
//! blocked, orphans) by scanning the forward edges on demand. No reverse
//! index is maintained — acceptable at the expected corpus sizes, and a
//! straightforward place to add one later if profiling ever demands it.

use std::collections::{HashMap, HashSet};

use chrono::Utc;

use crate::error::{BeadsError, Result};
use crate::model::{Dependency, DependencyType, Status};
use crate::storage::store::IssueStore;

/// A node in a `tree()` result.
#[derive(Debug, Clone)]
pub struct TreeNode {
    pub id: String,
    pub dep_type: Option<DependencyType>,
    pub children: Vec<TreeNode>,
    /// `true` if this id was already seen higher up the current path
    /// (traversal stopped here instead of recursing again).
    pub back_reference: bool,
}

/// Add a dependency edge `from -> to` of the given type.
///
/// Validates endpoints exist (unless `allow_orphans`), rejects
/// self-dependencies, and speculatively inserts then reverts the edge if
/// it would introduce a cycle in the `{blocks, parent_child}` subgraph.
pub fn add(
    store: &mut IssueStore,
    from: &str,
    to: &str,
    dep_type: DependencyType,
    created_by: Option<String>,
    metadata: Option<String>,
    allow_orphans: bool,
) -> Result<()> {
    if from == to {
        return Err(BeadsError::SelfDependency { id: from.to_string() });
    }
    if !store.exists(from) {
        return Err(BeadsError::IssueNotFound { id: from.to_string() });
    }
    if !allow_orphans && !store.exists(to) {
        return Err(BeadsError::DependencyNotFound { id: to.to_string() });
    }

    let now = Utc::now();
    let dep = Dependency {
        issue_id: from.to_string(),
        depends_on_id: to.to_string(),
        dep_type: dep_type.clone(),
        created_at: now,
        created_by,
        metadata,
        thread_id: None,
    };

    store.add_dependency(from, dep, now)?;

    if dep_type.affects_ready_work() {
        if let Some(cycle) = find_cycle_through(store, from) {
            store.remove_dependency(from, to, now)?;
            return Err(BeadsError::CycleDetected {
                path: cycle.join(" -> "),
            });
        }
    }

    Ok(())
}

/// Remove the first matching edge; a no-op if absent.
pub fn remove(store: &mut IssueStore, from: &str, to: &str) -> Result<()> {
    store.remove_dependency(from, to, Utc::now())
}

#[must_use]
pub fn get_dependencies<'a>(store: &'a IssueStore, id: &str) -> Vec<&'a Dependency> {
    store
        .get(id)
        .map(|issue| issue.dependencies.iter().collect())
        .unwrap_or_default()
}

#[must_use]
pub fn get_dependents<'a>(store: &'a IssueStore, id: &str) -> Vec<(&'a str, &'a Dependency)> {
    store
        .all()
        .iter()
        .flat_map(|issue| {
            issue
                .dependencies
                .iter()
                .filter(|d| d.depends_on_id == id)
                .map(move |d| (issue.id.as_str(), d))
        })
        .collect()
}

/// Depth-limited DFS tree rooted at `id`. A node already present on the
/// current path is recorded once more with `back_reference = true`
/// rather than recursed into again, guaranteeing termination on cycles.
#[must_use]
pub fn tree(store: &IssueStore, id: &str, max_depth: usize) -> TreeNode {
    fn build(
        store: &IssueStore,
        id: &str,
        dep_type: Option<DependencyType>,
        depth: usize,
        max_depth: usize,
        path: &mut Vec<String>,
    ) -> TreeNode {
        if path.contains(&id.to_string()) {
            return TreeNode {
                id: id.to_string(),
                dep_type,
                children: Vec::new(),
                back_reference: true,
            };
        }

        let mut node = TreeNode {
            id: id.to_string(),
            dep_type,
            children: Vec::new(),
            back_reference: false,
        };

        if depth >= max_depth {
            return node;
        }

        path.push(id.to_string());
        if let Some(issue) = store.get(id) {
            for dep in &issue.dependencies {
                node.children.push(build(
                    store,
                    &dep.depends_on_id,
                    Some(dep.dep_type.clone()),
                    depth + 1,
                    max_depth,
                    path,
                ));
            }
        }
        path.pop();

        node
    }

    let mut path = Vec::new();
    build(store, id, None, 0, max_depth, &mut path)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

/// All simple cycles in the `{blocks, parent_child}` subgraph, each as an
/// ordered list of ids closing back on the first. Iterative DFS with
/// three-color marking; a gray-revisit walks the current stack to
/// reconstruct the cycle.
#[must_use]
pub fn detect_cycles(store: &IssueStore) -> Vec<Vec<String>> {
    let mut colors: HashMap<String, Color> = HashMap::new();
    let mut cycles = Vec::new();

    for issue in store.all() {
        colors.entry(issue.id.clone()).or_insert(Color::White);
    }

    let ids: Vec<String> = store.all().iter().map(|i| i.id.clone()).collect();
    for start in ids {
        if colors.get(&start) == Some(&Color::White) {
            let mut stack = Vec::new();
            visit(store, &start, &mut colors, &mut stack, &mut cycles);
        }
    }

    cycles
}

fn visit(
    store: &IssueStore,
    id: &str,
    colors: &mut HashMap<String, Color>,
    stack: &mut Vec<String>,
    cycles: &mut Vec<Vec<String>>,
) {
    colors.insert(id.to_string(), Color::Gray);
    stack.push(id.to_string());

    if let Some(issue) = store.get(id) {
        for dep in issue.dependencies.iter().filter(|d| d.dep_type.affects_ready_work()) {
            let next = &dep.depends_on_id;
            match colors.get(next.as_str()).copied().unwrap_or(Color::White) {
                Color::White => visit(store, next, colors, stack, cycles),
                Color::Gray => {
                    let start_idx = stack.iter().position(|n| n == next).unwrap_or(0);
                    let mut cycle: Vec<String> = stack[start_idx..].to_vec();
                    cycle.push(next.clone());
                    cycles.push(cycle);
                }
                Color::Black => {}
            }
        }
    }

    stack.pop();
    colors.insert(id.to_string(), Color::Black);
}

/// Find a single cycle that passes through `start`, if one exists in the
/// `{blocks, parent_child}` subgraph. Used by `add` to check a
/// speculative edge before committing to it.
fn find_cycle_through(store: &IssueStore, start: &str) -> Option<Vec<String>> {
    let mut visited = HashSet::new();
    let mut stack = Vec::new();
    find_path_back_to(store, start, start, &mut visited, &mut stack)
}

fn find_path_back_to(
    store: &IssueStore,
    target: &str,
    current: &str,
    visited: &mut HashSet<String>,
    stack: &mut Vec<String>,
) -> Option<Vec<String>> {
    stack.push(current.to_string());
    if !visited.insert(current.to_string()) {
        stack.pop();
        return None;
    }

    if let Some(issue) = store.get(current) {
        for dep in issue.dependencies.iter().filter(|d| d.dep_type.affects_ready_work()) {
            if dep.depends_on_id == target {
                let mut cycle = stack.clone();
                cycle.push(target.to_string());
                return Some(cycle);
            }
            if let Some(cycle) =
                find_path_back_to(store, target, &dep.depends_on_id, visited, stack)
            {
                return Some(cycle);
            }
        }
    }

    stack.pop();
    None
}

/// Open or in-progress, non-deferred issues with no outgoing `blocks` or
/// `parent_child` edge to a non-closed issue.
#[must_use]
pub fn ready(store: &IssueStore) -> Vec<&crate::model::Issue> {
    let now = Utc::now();
    store
        .all()
        .iter()
        .filter(|issue| {
            matches!(issue.status, Status::Open | Status::InProgress)
                && !issue.defer_until.is_some_and(|d| d > now)
                && !has_unsatisfied_blocking_edge(store, issue)
        })
        .collect()
}

/// Open issues with at least one unsatisfied `blocks`/`parent_child` edge.
#[must_use]
pub fn blocked(store: &IssueStore) -> Vec<&crate::model::Issue> {
    store
        .all()
        .iter()
        .filter(|issue| issue.status == Status::Open && has_unsatisfied_blocking_edge(store, issue))
        .collect()
}

fn has_unsatisfied_blocking_edge(store: &IssueStore, issue: &crate::model::Issue) -> bool {
    issue.dependencies.iter().any(|dep| {
        if !dep.dep_type.is_blocking() {
            return false;
        }
        match store.get(&dep.depends_on_id) {
            Some(target) => !target.status.is_terminal(),
            None => false,
        }
    })
}

/// Issues whose outgoing edges reference unknown ids.
#[must_use]
pub fn orphans<'a>(store: &'a IssueStore, hierarchy_only: bool, deps_only: bool) -> Vec<&'a crate::model::Issue> {
    store
        .all()
        .iter()
        .filter(|issue| {
            issue.dependencies.iter().any(|dep| {
                if hierarchy_only && dep.dep_type != DependencyType::ParentChild {
                    return false;
                }
                if deps_only && dep.dep_type == DependencyType::ParentChild {
                    return false;
                }
                !store.exists(&dep.depends_on_id)
            })
        })
        .collect()
}
