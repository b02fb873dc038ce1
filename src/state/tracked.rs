//! Baseline plus working copy of an editable record

use serde::{Deserialize, Serialize};

/// A value loaded from the registry together with the copy being edited.
///
/// The original is only replaced by [`Tracked::rebase`]; [`Tracked::reset`]
/// restores the working copy from it and never touches it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tracked<T> {
    original: T,
    working: T,
}

impl<T: Clone + PartialEq> Tracked<T> {
    pub fn new(value: T) -> Self {
        Self {
            original: value.clone(),
            working: value,
        }
    }

    /// Baseline captured at load time
    pub fn original(&self) -> &T {
        &self.original
    }

    /// Copy being edited
    pub fn working(&self) -> &T {
        &self.working
    }

    pub fn working_mut(&mut self) -> &mut T {
        &mut self.working
    }

    /// Whether the working copy differs from the baseline
    pub fn is_dirty(&self) -> bool {
        self.original != self.working
    }

    /// Discard edits
    pub fn reset(&mut self) {
        self.working = self.original.clone();
    }

    /// Replace both copies with a freshly loaded value
    pub fn rebase(&mut self, value: T) {
        self.original = value.clone();
        self.working = value;
    }

    /// Accept the working copy as the new baseline
    pub fn commit(&mut self) {
        self.original = self.working.clone();
    }
}
