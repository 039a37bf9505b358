//! In-memory submission list and its pure-value mutation operations.

use shared::domain::{GradingReport, SaveStatus, Submission, SubmissionId};

/// How a [`SubmissionList::add`] call resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Appended,
    Replaced,
    KeptExisting,
}

/// Ordered submissions plus the currently selected index.
///
/// Insertion order is meaningful: the index doubles as the selection
/// identity for the view layer. Every operation returns a fresh list so
/// callers can diff old against new; the invariant is that `selected` is
/// either `None` or in bounds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubmissionList {
    entries: Vec<Submission>,
    selected: Option<usize>,
}

impl SubmissionList {
    /// Rebuilds a list from persisted parts, discarding a selection that no
    /// longer points inside the list.
    pub fn from_parts(entries: Vec<Submission>, selected: Option<usize>) -> Self {
        let selected = selected.filter(|&index| index < entries.len());
        Self { entries, selected }
    }

    pub fn entries(&self) -> &[Submission] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected(&self) -> Option<&Submission> {
        self.entries.get(self.selected?)
    }

    pub fn position_of(&self, id: SubmissionId) -> Option<usize> {
        self.entries.iter().position(|entry| entry.id == id)
    }

    /// Replaces the selected submission's content and marks it saved.
    /// Returns `None` when nothing is selected; editing without a selection
    /// is a caller precondition violation.
    pub fn edit(&self, content: impl Into<String>) -> Option<Self> {
        let index = self.selected?;
        let mut next = self.clone();
        let entry = &mut next.entries[index];
        entry.content = content.into();
        entry.save_status = SaveStatus::Saved;
        Some(next)
    }

    /// Moves the selection. No bounds check: the view layer owns the menu
    /// indices and is trusted to pass a valid one or `None`.
    pub fn select(&self, index: Option<usize>) -> Self {
        let mut next = self.clone();
        next.selected = index;
        next
    }

    /// Removes the entry at `index` and re-normalizes the selection. A
    /// deleted selection falls back to the first remaining entry and a
    /// selection past the hole shifts down by one; an emptied list clears
    /// the selection entirely (that check runs last and wins).
    pub fn remove(&self, index: usize) -> Self {
        let mut next = self.clone();
        next.entries.remove(index);
        if let Some(selected) = next.selected {
            if selected == index {
                next.selected = Some(0);
            } else if selected > index {
                next.selected = Some(selected - 1);
            }
        }
        if next.entries.is_empty() {
            next.selected = None;
        }
        next
    }

    /// Adds a submission, guarding same-name overwrites behind the
    /// caller-supplied decision. A declined overwrite leaves the list
    /// untouched; a confirmed one replaces in place without moving the
    /// selection; a fresh name is appended and selected.
    pub fn add<F>(&self, incoming: Submission, decide: F) -> (Self, AddOutcome)
    where
        F: FnOnce(&Submission, &Submission) -> bool,
    {
        match self.entries.iter().position(|s| s.name == incoming.name) {
            Some(index) => {
                if decide(&self.entries[index], &incoming) {
                    let mut next = self.clone();
                    next.entries[index] = incoming;
                    (next, AddOutcome::Replaced)
                } else {
                    (self.clone(), AddOutcome::KeptExisting)
                }
            }
            None => {
                let mut next = self.clone();
                next.entries.push(incoming);
                next.selected = Some(next.entries.len() - 1);
                (next, AddOutcome::Appended)
            }
        }
    }

    /// Overwrites the grading report at `index`. Save status is untouched;
    /// the index is trusted the same way `select` is.
    pub fn record_result(&self, index: usize, report: GradingReport) -> Self {
        let mut next = self.clone();
        next.entries[index].result = Some(report);
        next
    }

    /// Transition applied when the judge accepts a submission: status moves
    /// to submitted and the report resets to pending.
    pub fn mark_submitted(&self, index: usize) -> Self {
        let mut next = self.clone();
        let entry = &mut next.entries[index];
        entry.save_status = SaveStatus::Submitted;
        entry.result = Some(GradingReport::pending());
        next
    }
}

#[cfg(test)]
#[path = "tests/submissions_tests.rs"]
mod tests;
