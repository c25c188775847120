//! Per-point and per-cell attribute sets.
//!
//! An [`AttributeSet`] is an ordered collection of uniquely named arrays
//! scoped to one element kind. It designates an active scalar array, carries
//! the ghost mask used by range queries, and resolves the reserved ghost
//! array lazily: the resolved handle is reused until the set's structural
//! clock advances.

use crate::clock::{CacheStamp, ModificationClock};
use crate::data::array::{ArrayHandle, DataArray, ScalarType};
use crate::data::ghost::{CellGhost, GHOST_ARRAY_NAME, PointGhost};
use crate::debug_invariants::{DebugInvariants, InvariantViolation};
use hashbrown::HashMap;
use parking_lot::Mutex;

/// Which elements an attribute set is attached to.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, serde::Serialize, serde::Deserialize)]
pub enum AttributeKind {
    /// One tuple per point.
    Point,
    /// One tuple per cell.
    Cell,
    /// Dataset-level arrays with no element association.
    Field,
}

impl AttributeKind {
    /// Lowercase label used in diagnostics.
    pub fn as_str(self) -> &'static str {
        match self {
            AttributeKind::Point => "point",
            AttributeKind::Cell => "cell",
            AttributeKind::Field => "field",
        }
    }
}

#[derive(Debug, Default)]
struct GhostLookup {
    stamp: CacheStamp,
    handle: Option<ArrayHandle>,
}

/// Named arrays attached to one element kind.
#[derive(Debug)]
pub struct AttributeSet {
    kind: AttributeKind,
    arrays: Vec<ArrayHandle>,
    index: HashMap<String, usize>,
    active_scalars: Option<String>,
    ghosts_to_skip: u8,
    clock: ModificationClock,
    ghost: Mutex<GhostLookup>,
}

impl AttributeSet {
    /// Create an empty set for `kind` with that kind's default ghost mask.
    pub fn new(kind: AttributeKind) -> Self {
        let ghosts_to_skip = match kind {
            AttributeKind::Point => PointGhost::DEFAULT_SKIP.bits(),
            AttributeKind::Cell => CellGhost::DEFAULT_SKIP.bits(),
            AttributeKind::Field => 0,
        };
        Self {
            kind,
            arrays: Vec::new(),
            index: HashMap::new(),
            active_scalars: None,
            ghosts_to_skip,
            clock: ModificationClock::new(),
            ghost: Mutex::new(GhostLookup::default()),
        }
    }

    /// Element kind of this set.
    pub fn kind(&self) -> AttributeKind {
        self.kind
    }

    /// Number of arrays.
    pub fn len(&self) -> usize {
        self.arrays.len()
    }

    /// Return true if no arrays are attached.
    pub fn is_empty(&self) -> bool {
        self.arrays.is_empty()
    }

    /// Modification time: the newest of the set's own clock and every array's.
    pub fn mtime(&self) -> u64 {
        self.arrays
            .iter()
            .map(ArrayHandle::mtime)
            .fold(self.clock.get(), u64::max)
    }

    /// Mark the set modified.
    pub fn modified(&self) {
        self.clock.modified();
    }

    /// Attach an array, replacing any array with the same name.
    ///
    /// Returns the shared handle now stored in the set.
    pub fn add_array(&mut self, array: impl Into<ArrayHandle>) -> ArrayHandle {
        let handle = array.into();
        let name = handle.name();
        self.clock.modified();
        match self.index.get(&name) {
            Some(&i) => self.arrays[i] = handle.clone(),
            None => {
                self.index.insert(name, self.arrays.len());
                self.arrays.push(handle.clone());
            }
        }
        self.debug_assert_invariants();
        handle
    }

    /// Detach the array called `name`, returning it if present.
    pub fn remove_array(&mut self, name: &str) -> Option<ArrayHandle> {
        let i = self.index.remove(name)?;
        self.clock.modified();
        let removed = self.arrays.remove(i);
        for slot in self.index.values_mut() {
            if *slot > i {
                *slot -= 1;
            }
        }
        if self.active_scalars.as_deref() == Some(name) {
            self.active_scalars = None;
        }
        self.debug_assert_invariants();
        Some(removed)
    }

    /// Array by name.
    pub fn array(&self, name: &str) -> Option<ArrayHandle> {
        self.index.get(name).map(|&i| self.arrays[i].clone())
    }

    /// Array by insertion position.
    pub fn array_at(&self, i: usize) -> Option<ArrayHandle> {
        self.arrays.get(i).cloned()
    }

    /// Iterate arrays in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &ArrayHandle> {
        self.arrays.iter()
    }

    /// Designate the active scalar array. `None` clears the designation.
    pub fn set_active_scalars(&mut self, name: Option<&str>) {
        self.active_scalars = name.map(str::to_owned);
        self.clock.modified();
    }

    /// Attach `array` and make it the active scalars.
    pub fn set_scalars(&mut self, array: impl Into<ArrayHandle>) -> ArrayHandle {
        let handle = self.add_array(array);
        let name = handle.name();
        self.set_active_scalars(Some(&name));
        handle
    }

    /// The active scalar array, if designated and present.
    pub fn scalars(&self) -> Option<ArrayHandle> {
        self.active_scalars.as_deref().and_then(|n| self.array(n))
    }

    /// Ghost bits excluded from range queries over this set.
    pub fn ghosts_to_skip(&self) -> u8 {
        self.ghosts_to_skip
    }

    /// Override the ghost bits excluded from range queries.
    pub fn set_ghosts_to_skip(&mut self, mask: u8) {
        if self.ghosts_to_skip != mask {
            self.ghosts_to_skip = mask;
            self.clock.modified();
        }
    }

    /// The reserved ghost status array, if present and well formed.
    ///
    /// The lookup is cached and re-resolved only after the set's structural
    /// clock advances.
    pub fn ghost_array(&self) -> Option<ArrayHandle> {
        let mut lookup = self.ghost.lock();
        let current = self.clock.get();
        if !lookup.stamp.is_fresh(current) {
            lookup.handle = self.array(GHOST_ARRAY_NAME).filter(|h| {
                let a = h.read();
                a.scalar_type() == ScalarType::U8 && a.components() == 1
            });
            lookup.stamp = CacheStamp::at(current);
        }
        lookup.handle.clone()
    }

    /// Drop every array and the active-scalars designation.
    pub fn initialize(&mut self) {
        self.arrays.clear();
        self.index.clear();
        self.active_scalars = None;
        self.clock.modified();
    }

    /// Replace this set's arrays with shared handles to `other`'s arrays.
    pub fn pass_data(&mut self, other: &AttributeSet) {
        self.shallow_copy(other);
    }

    /// Share `other`'s arrays by reference.
    pub fn shallow_copy(&mut self, other: &AttributeSet) {
        self.arrays = other.arrays.clone();
        self.copy_layout(other);
        self.debug_assert_invariants();
    }

    /// Duplicate `other`'s arrays into independent storage.
    pub fn deep_copy(&mut self, other: &AttributeSet) {
        self.arrays = other.arrays.iter().map(ArrayHandle::deep_copy).collect();
        self.copy_layout(other);
        self.debug_assert_invariants();
    }

    fn copy_layout(&mut self, other: &AttributeSet) {
        self.index = other.index.clone();
        self.active_scalars = other.active_scalars.clone();
        self.ghosts_to_skip = other.ghosts_to_skip;
        self.clock.modified();
    }

    /// Bytes held by all arrays.
    pub fn actual_memory_size(&self) -> usize {
        self.arrays.iter().map(|h| h.read().actual_memory_size()).sum()
    }

    /// Release spare capacity in every array.
    pub fn squeeze(&mut self) {
        for h in &self.arrays {
            h.write().squeeze();
        }
    }

    /// Names and shapes of all arrays, in insertion order.
    pub fn describe(&self) -> Vec<(String, usize, usize)> {
        self.arrays
            .iter()
            .map(|h| {
                let a = h.read();
                (a.name().to_owned(), a.components(), a.tuples())
            })
            .collect()
    }
}

impl Default for AttributeSet {
    fn default() -> Self {
        Self::new(AttributeKind::Field)
    }
}

impl DebugInvariants for AttributeSet {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "AttributeSet");
    }

    fn validate_invariants(&self) -> Result<(), InvariantViolation> {
        if self.index.len() != self.arrays.len() {
            return Err(InvariantViolation::StaleIndex(self.kind.as_str().to_owned()));
        }
        for (name, &i) in &self.index {
            if self.arrays.get(i).map(|h| h.name()).as_deref() != Some(name.as_str()) {
                return Err(InvariantViolation::StaleIndex(name.clone()));
            }
        }
        // a malformed array under the reserved name is legal input; the
        // resolved ghost handle never is
        let resolved = self.ghost.lock().handle.clone();
        if let Some(h) = resolved {
            let a = h.read();
            if a.scalar_type() != ScalarType::U8 || a.components() != 1 {
                return Err(InvariantViolation::MalformedGhostArray(self.kind.as_str()));
            }
        }
        Ok(())
    }
}

/// Build a zero-filled ghost status array with one tuple per element.
pub(crate) fn new_ghost_array(tuples: usize) -> DataArray {
    DataArray::single_component(GHOST_ARRAY_NAME, vec![0u8; tuples])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scalars(name: &str, values: Vec<f64>) -> DataArray {
        DataArray::from_values(name, 1, values).unwrap()
    }

    #[test]
    fn add_replaces_same_name_and_keeps_order() {
        let mut set = AttributeSet::new(AttributeKind::Point);
        set.add_array(scalars("a", vec![1.0]));
        set.add_array(scalars("b", vec![2.0]));
        set.add_array(scalars("a", vec![3.0]));
        assert_eq!(set.len(), 2);
        assert_eq!(set.array_at(0).unwrap().read().component(0, 0).unwrap(), 3.0);
        set.validate_invariants().unwrap();
    }

    #[test]
    fn remove_reindexes_and_clears_active() {
        let mut set = AttributeSet::new(AttributeKind::Cell);
        set.add_array(scalars("a", vec![1.0]));
        set.set_scalars(scalars("b", vec![2.0]));
        set.add_array(scalars("c", vec![3.0]));
        assert!(set.scalars().is_some());
        assert!(set.remove_array("b").is_some());
        assert!(set.scalars().is_none());
        assert_eq!(set.array("c").unwrap().name(), "c");
        set.validate_invariants().unwrap();
    }

    #[test]
    fn mtime_tracks_array_writes() {
        let mut set = AttributeSet::new(AttributeKind::Point);
        let h = set.add_array(scalars("a", vec![1.0, 2.0]));
        let t0 = set.mtime();
        h.write().set_tuple(0, &[5.0]).unwrap();
        assert!(set.mtime() > t0);
    }

    #[test]
    fn ghost_lookup_follows_structure() {
        let mut set = AttributeSet::new(AttributeKind::Point);
        assert!(set.ghost_array().is_none());
        let added = set.add_array(new_ghost_array(3));
        assert!(set.ghost_array().unwrap().ptr_eq(&added));
        set.remove_array(GHOST_ARRAY_NAME);
        assert!(set.ghost_array().is_none());
        // wrong scalar type under the reserved name is ignored
        set.add_array(DataArray::from_values(GHOST_ARRAY_NAME, 1, vec![0.0f64; 3]).unwrap());
        assert!(set.ghost_array().is_none());
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "[invariants] AttributeSet")]
    fn mutations_check_invariants() {
        let mut set = AttributeSet::new(AttributeKind::Point);
        set.index.insert("stale".to_owned(), 7);
        set.add_array(scalars("a", vec![1.0]));
    }

    #[test]
    fn malformed_reserved_array_is_accepted() {
        let mut set = AttributeSet::new(AttributeKind::Cell);
        set.add_array(DataArray::from_values(GHOST_ARRAY_NAME, 2, vec![0u8; 4]).unwrap());
        assert!(set.ghost_array().is_none());
        set.validate_invariants().unwrap();
    }

    #[test]
    fn default_skip_masks() {
        assert_eq!(AttributeSet::new(AttributeKind::Point).ghosts_to_skip(), 2);
        assert_eq!(AttributeSet::new(AttributeKind::Cell).ghosts_to_skip(), 40);
    }

    #[test]
    fn shallow_shares_deep_duplicates() {
        let mut src = AttributeSet::new(AttributeKind::Point);
        let h = src.set_scalars(scalars("s", vec![1.0, 2.0]));
        let mut shallow = AttributeSet::new(AttributeKind::Point);
        shallow.shallow_copy(&src);
        let mut deep = AttributeSet::new(AttributeKind::Point);
        deep.deep_copy(&src);
        assert!(shallow.scalars().unwrap().ptr_eq(&h));
        assert!(!deep.scalars().unwrap().ptr_eq(&h));
        h.write().set_tuple(0, &[9.0]).unwrap();
        assert_eq!(shallow.scalars().unwrap().read().component(0, 0).unwrap(), 9.0);
        assert_eq!(deep.scalars().unwrap().read().component(0, 0).unwrap(), 1.0);
    }
}
