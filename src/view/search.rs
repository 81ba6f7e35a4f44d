use crate::models::packet::PacketRecord;
use crate::store::{PacketStore, RecordRef};

/// Positions in a view whose records match a search term, with a cursor
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchIndex {
    /// Lowercased term the index was built for
    term: String,

    /// Matching positions into the view, ascending
    positions: Vec<usize>,

    /// Index into `positions`
    cursor: usize,
}

/// Build the index for `term` over `view`; a blank term matches nothing
pub fn search(store: &PacketStore, view: &[RecordRef], term: &str) -> SearchIndex {
    if term.trim().is_empty() {
        return SearchIndex::default();
    }
    let term = term.to_lowercase();

    let positions = view
        .iter()
        .enumerate()
        .filter(|(_, &index)| {
            store
                .record_at(index)
                .is_some_and(|loaded| haystack(loaded).contains(&term))
        })
        .map(|(position, _)| position)
        .collect();

    SearchIndex {
        term,
        positions,
        cursor: 0,
    }
}

/// Lowercased text searched for a record; absent fields contribute nothing
pub fn haystack(record: &PacketRecord) -> String {
    let fields = [
        Some(record.sequence_number.to_string()),
        record.source_address.clone(),
        record.destination_address.clone(),
        Some(record.protocol_tag.clone()),
        Some(record.summary_info.clone()),
        record.source_port.map(|p| p.to_string()),
        record.destination_port.map(|p| p.to_string()),
    ];

    fields
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

impl SearchIndex {
    pub fn term(&self) -> &str {
        &self.term
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn positions(&self) -> &[usize] {
        &self.positions
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// View position the cursor is on
    pub fn current(&self) -> Option<usize> {
        self.positions.get(self.cursor).copied()
    }

    /// Advance to the next match, wrapping to the first
    pub fn next_match(&mut self) -> Option<usize> {
        if self.positions.is_empty() {
            return None;
        }
        self.cursor = (self.cursor + 1) % self.positions.len();
        self.current()
    }

    /// Step back to the previous match, wrapping to the last
    pub fn previous_match(&mut self) -> Option<usize> {
        if self.positions.is_empty() {
            return None;
        }
        self.cursor = if self.cursor == 0 {
            self.positions.len() - 1
        } else {
            self.cursor - 1
        };
        self.current()
    }

    pub fn is_match(&self, position: usize) -> bool {
        self.positions.binary_search(&position).is_ok()
    }

    /// Put the cursor on the match at `position`; false when it is not a match
    pub fn focus(&mut self, position: usize) -> bool {
        match self.positions.binary_search(&position) {
            Ok(cursor) => {
                self.cursor = cursor;
                true
            }
            Err(_) => false,
        }
    }
}
