use std::collections::BTreeSet;

use crate::store::{PacketStore, RecordRef};

/// User-marked records, by sequence number
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkSet {
    marked: BTreeSet<u64>,
}

impl MarkSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip the mark on `sequence_number`; returns whether it is now marked
    pub fn toggle(&mut self, sequence_number: u64) -> bool {
        if self.marked.remove(&sequence_number) {
            false
        } else {
            self.marked.insert(sequence_number);
            true
        }
    }

    pub fn is_marked(&self, sequence_number: u64) -> bool {
        self.marked.contains(&sequence_number)
    }

    pub fn len(&self) -> usize {
        self.marked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.marked.is_empty()
    }

    /// Marked sequence numbers, ascending
    pub fn iter(&self) -> impl Iterator<Item = u64> + '_ {
        self.marked.iter().copied()
    }

    pub fn clear(&mut self) {
        self.marked.clear();
    }

    /// Positions within `view` of records that are marked
    pub fn positions_in(&self, store: &PacketStore, view: &[RecordRef]) -> Vec<usize> {
        if self.marked.is_empty() {
            return Vec::new();
        }
        view.iter()
            .enumerate()
            .filter(|(_, &index)| {
                store
                    .record_at(index)
                    .is_some_and(|loaded| self.is_marked(loaded.sequence_number))
            })
            .map(|(position, _)| position)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::packet::fixtures::{page, tcp};

    #[test]
    fn test_toggle_twice_unmarks() {
        let mut marks = MarkSet::new();
        assert!(marks.toggle(42));
        assert!(marks.is_marked(42));
        assert!(!marks.toggle(42));
        assert!(marks.is_empty());
    }

    #[test]
    fn test_iter_is_ascending() {
        let mut marks = MarkSet::new();
        for seq in [9, 2, 7] {
            marks.toggle(seq);
        }
        assert_eq!(marks.iter().collect::<Vec<_>>(), vec![2, 7, 9]);
        assert_eq!(marks.len(), 3);
        marks.clear();
        assert!(marks.is_empty());
    }

    #[test]
    fn test_positions_in_view() {
        let records = (1..=5).map(|n| tcp(n, "a", 1, "b", 2)).collect();
        let mut store = PacketStore::new("cap", 10);
        store.reset(page(records, 5));

        let mut marks = MarkSet::new();
        marks.toggle(2);
        marks.toggle(5);
        // Marks on records outside the view are simply absent
        marks.toggle(99);

        assert_eq!(marks.positions_in(&store, &[4, 3, 1]), vec![0, 2]);
    }
}
