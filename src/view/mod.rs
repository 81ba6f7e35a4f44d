//! Derived views over a [`PacketStore`]: filter, sort, search, streams and marks.
//!
//! Every function here is pure over the store. [`PacketView`] keeps the
//! derived state together and rebuilds it when the store changes.

pub mod marks;
pub mod search;
pub mod sort;
pub mod stream;

use log::debug;

use crate::filter::{self, FilterExpression};
use crate::store::{PacketStore, RecordRef};
use crate::utils::error::FilterError;

pub use marks::MarkSet;
pub use search::SearchIndex;
pub use sort::{Direction, SortKey};
pub use stream::{Conversation, StreamKey};

/// Filter, sort, search and marks applied to one store
#[derive(Debug, Clone)]
pub struct PacketView {
    filter_text: String,
    filter: FilterExpression,

    /// Matching records in store order
    filtered: Vec<RecordRef>,

    sort: Option<(SortKey, Direction)>,

    /// `filtered`, reordered by the active sort
    display: Vec<RecordRef>,

    search_term: String,
    search: SearchIndex,

    marks: MarkSet,

    /// Store generation and loaded count the views were built from
    synced: Option<(u64, usize)>,
}

impl Default for PacketView {
    fn default() -> Self {
        Self::new()
    }
}

impl PacketView {
    pub fn new() -> Self {
        Self {
            filter_text: String::new(),
            filter: FilterExpression::MatchAll,
            filtered: Vec::new(),
            sort: None,
            display: Vec::new(),
            search_term: String::new(),
            search: SearchIndex::default(),
            marks: MarkSet::new(),
            synced: None,
        }
    }

    /// Compile and apply a new filter; on error the previous filter stays active
    pub fn set_filter(&mut self, store: &PacketStore, text: &str) -> Result<(), FilterError> {
        let expr = filter::compile(text)?;
        self.filter_text = text.to_string();
        self.filter = expr;
        self.recompute(store);
        Ok(())
    }

    pub fn set_search(&mut self, store: &PacketStore, term: &str) {
        self.search_term = term.to_string();
        self.search = search::search(store, &self.display, term);
    }

    pub fn set_sort(&mut self, store: &PacketStore, key: SortKey, direction: Direction) {
        self.sort = Some((key, direction));
        self.recompute(store);
    }

    /// Sort by `key`, flipping the direction when it is already the sort key
    pub fn toggle_sort(&mut self, store: &PacketStore, key: SortKey) {
        let direction = match self.sort {
            Some((current, direction)) if current == key => direction.toggled(),
            _ => Direction::Ascending,
        };
        self.set_sort(store, key, direction);
    }

    pub fn clear_sort(&mut self, store: &PacketStore) {
        self.sort = None;
        self.recompute(store);
    }

    /// Rebuild the views if the store has changed since the last rebuild
    pub fn sync(&mut self, store: &PacketStore) -> bool {
        let state = (store.generation(), store.loaded_count());
        if self.synced == Some(state) {
            return false;
        }
        self.recompute(store);
        true
    }

    fn recompute(&mut self, store: &PacketStore) {
        self.filtered = filter::apply(&self.filter, store);
        self.display = match self.sort {
            Some((key, direction)) => sort::sort(store, &self.filtered, key, direction),
            None => self.filtered.clone(),
        };

        let focused = self
            .search
            .current()
            .and_then(|position| self.display_record(store, position));
        self.search = search::search(store, &self.display, &self.search_term);
        if let Some(sequence_number) = focused {
            if let Some(position) = self.position_of(store, sequence_number) {
                self.search.focus(position);
            }
        }

        self.synced = Some((store.generation(), store.loaded_count()));
        debug!(
            "View rebuilt: {} of {} records shown, {} search matches",
            self.display.len(),
            store.loaded_count(),
            self.search.len()
        );
    }

    fn display_record(&self, store: &PacketStore, position: usize) -> Option<u64> {
        self.display
            .get(position)
            .and_then(|&index| store.record_at(index))
            .map(|loaded| loaded.sequence_number)
    }

    fn position_of(&self, store: &PacketStore, sequence_number: u64) -> Option<usize> {
        self.display.iter().position(|&index| {
            store
                .record_at(index)
                .is_some_and(|loaded| loaded.sequence_number == sequence_number)
        })
    }

    /// Records to show, in display order
    pub fn display(&self) -> &[RecordRef] {
        &self.display
    }

    pub fn filtered_len(&self) -> usize {
        self.filtered.len()
    }

    pub fn filter_text(&self) -> &str {
        &self.filter_text
    }

    pub fn filter(&self) -> &FilterExpression {
        &self.filter
    }

    pub fn sort(&self) -> Option<(SortKey, Direction)> {
        self.sort
    }

    pub fn search(&self) -> &SearchIndex {
        &self.search
    }

    /// Records matching the search term, in display order
    pub fn search_matches(&self) -> Vec<RecordRef> {
        self.search
            .positions()
            .iter()
            .filter_map(|&position| self.display.get(position).copied())
            .collect()
    }

    /// Record under the search cursor
    pub fn current_match(&self) -> Option<RecordRef> {
        self.search
            .current()
            .and_then(|position| self.display.get(position).copied())
    }

    /// Move to the next search match; returns its record
    pub fn search_next(&mut self) -> Option<RecordRef> {
        let position = self.search.next_match()?;
        self.display.get(position).copied()
    }

    pub fn search_previous(&mut self) -> Option<RecordRef> {
        let position = self.search.previous_match()?;
        self.display.get(position).copied()
    }

    pub fn marks(&self) -> &MarkSet {
        &self.marks
    }

    pub fn marks_mut(&mut self) -> &mut MarkSet {
        &mut self.marks
    }

    /// Conversation of the record at `index`, ignoring the active filter
    pub fn follow(&self, store: &PacketStore, index: RecordRef) -> Vec<RecordRef> {
        match store.record_at(index) {
            Some(anchor) => stream::follow(store, anchor),
            None => Vec::new(),
        }
    }
}
