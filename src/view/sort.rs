use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::models::packet::PacketRecord;
use crate::store::{PacketStore, RecordRef};

/// Column a view can be ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    SequenceNumber,
    Time,
    SourceEndpoint,
    DestinationEndpoint,
    Protocol,
    Length,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    Ascending,
    Descending,
}

impl Direction {
    pub fn toggled(self) -> Self {
        match self {
            Direction::Ascending => Direction::Descending,
            Direction::Descending => Direction::Ascending,
        }
    }
}

impl std::str::FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "no" | "number" | "seq" | "sequence" => Ok(SortKey::SequenceNumber),
            "time" => Ok(SortKey::Time),
            "source" | "src" => Ok(SortKey::SourceEndpoint),
            "destination" | "dst" => Ok(SortKey::DestinationEndpoint),
            "protocol" | "proto" => Ok(SortKey::Protocol),
            "length" | "len" => Ok(SortKey::Length),
            other => Err(format!("unknown sort key '{}'", other)),
        }
    }
}

/// Order `view` by `key`; ties keep store order in either direction
pub fn sort(
    store: &PacketStore,
    view: &[RecordRef],
    key: SortKey,
    direction: Direction,
) -> Vec<RecordRef> {
    let mut sorted: Vec<RecordRef> = view
        .iter()
        .copied()
        .filter(|&index| store.record_at(index).is_some())
        .collect();

    sorted.sort_by(|&a, &b| {
        let ordering = match (store.record_at(a), store.record_at(b)) {
            (Some(left), Some(right)) => compare(left, right, key),
            _ => Ordering::Equal,
        };
        let ordering = match direction {
            Direction::Ascending => ordering,
            Direction::Descending => ordering.reverse(),
        };
        ordering.then(a.cmp(&b))
    });

    sorted
}

/// Compare two records on one key, ascending
pub fn compare(left: &PacketRecord, right: &PacketRecord, key: SortKey) -> Ordering {
    match key {
        SortKey::SequenceNumber => left.sequence_number.cmp(&right.sequence_number),
        SortKey::Time => left.capture_time.cmp(&right.capture_time),
        SortKey::SourceEndpoint => source_endpoint(left).cmp(&source_endpoint(right)),
        SortKey::DestinationEndpoint => {
            destination_endpoint(left).cmp(&destination_endpoint(right))
        }
        SortKey::Protocol => left.protocol_tag.cmp(&right.protocol_tag),
        SortKey::Length => left.byte_length.cmp(&right.byte_length),
    }
}

// `None` orders before `Some`, so missing addresses and ports sort first
fn source_endpoint(record: &PacketRecord) -> (Option<&str>, Option<u16>) {
    (record.source_address.as_deref(), record.source_port)
}

fn destination_endpoint(record: &PacketRecord) -> (Option<&str>, Option<u16>) {
    (record.destination_address.as_deref(), record.destination_port)
}
