//! Club selection within the current league/season scope
//!
//! The selection is always a subset of the ids in scope. When a scope change
//! empties a selection that was not empty, the change is treated as an
//! artifact of narrowing the scope and everything in scope is selected again.
//! An explicit clear stays cleared.

use std::collections::BTreeSet;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClubSelection {
    selected: BTreeSet<String>,
    initialized: bool,
}

impl ClubSelection {
    /// Empty selection waiting for its first scope
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from ids chosen elsewhere; the first scope change reconciles them
    pub fn with_selected<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            selected: ids.into_iter().map(Into::into).collect(),
            initialized: true,
        }
    }

    /// Apply a new scope.
    ///
    /// The first call selects everything in scope. `force_all` does the same on
    /// later calls (explicit "all"). Otherwise the selection is intersected with
    /// the scope, and reset to the whole scope only if that intersection
    /// emptied a non-empty selection.
    pub fn reconcile<I, S>(&mut self, scope_ids: I, force_all: bool)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let scope: BTreeSet<String> = scope_ids
            .into_iter()
            .map(|id| id.as_ref().to_string())
            .collect();

        if !self.initialized || force_all {
            self.selected = scope;
            self.initialized = true;
            return;
        }

        let had_selection = !self.selected.is_empty();
        self.selected.retain(|id| scope.contains(id));

        if self.selected.is_empty() && had_selection && !scope.is_empty() {
            log::debug!(
                "Scope change emptied the selection, selecting all {} clubs in scope",
                scope.len()
            );
            self.selected = scope;
        }
    }

    /// Select every id in scope
    pub fn select_all<I, S>(&mut self, scope_ids: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.reconcile(scope_ids, true);
    }

    /// Deselect everything; later scope changes keep it empty
    pub fn clear(&mut self) {
        self.selected.clear();
        self.initialized = true;
    }

    /// Flip one id. Ids outside the scope cannot be added.
    pub fn toggle<I, S>(&mut self, id: &str, scope_ids: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if self.selected.remove(id) {
            return;
        }
        if scope_ids.into_iter().any(|s| s.as_ref() == id) {
            self.selected.insert(id.to_string());
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.selected.contains(id)
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Whether every id in scope is selected
    pub fn is_all_selected<I, S>(&self, scope_ids: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        scope_ids
            .into_iter()
            .all(|id| self.selected.contains(id.as_ref()))
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.selected.iter().map(String::as_str)
    }
}
