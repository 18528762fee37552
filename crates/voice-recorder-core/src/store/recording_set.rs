/// Ordered view of persisted recordings, oldest first.
///
/// Identifiers are unique. The set is rebuilt from the store's directory
/// listing whenever an on-disk change might not have taken effect.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordingSet {
    ids: Vec<String>,
}

impl RecordingSet {
    /// Build from identifiers already sorted oldest first. Later duplicates are dropped.
    pub fn from_sorted(ids: impl IntoIterator<Item = String>) -> Self {
        let mut set = Self::default();
        for id in ids {
            set.push(id);
        }
        set
    }

    /// Identifiers, oldest first.
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    /// Identifiers in display order, newest first.
    pub fn newest_first(&self) -> Vec<String> {
        self.ids.iter().rev().cloned().collect()
    }

    /// Whether `id` is present.
    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|existing| existing == id)
    }

    /// Number of recordings.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// True when there are no recordings.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Append as newest. Returns `false` if already present.
    pub fn push(&mut self, id: String) -> bool {
        if self.contains(&id) {
            return false;
        }
        self.ids.push(id);
        true
    }

    /// Replace `old` with `new` keeping its position.
    pub fn rename(&mut self, old: &str, new: &str) -> bool {
        if self.contains(new) {
            return false;
        }
        match self.ids.iter_mut().find(|id| *id == old) {
            Some(slot) => {
                *slot = new.to_string();
                true
            }
            None => false,
        }
    }

    /// Remove `id`. Returns `false` if it was not present.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.ids.len();
        self.ids.retain(|existing| existing != id);
        self.ids.len() != before
    }

    /// Drop every identifier.
    pub fn clear(&mut self) {
        self.ids.clear();
    }
}
