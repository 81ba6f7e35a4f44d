use serde::Serialize;
use std::collections::HashMap;

use crate::models::packet::PacketRecord;
use crate::store::{PacketStore, RecordRef};

/// One side of a conversation
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Endpoint {
    pub address: Option<String>,
    pub port: Option<u16>,
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let address = self.address.as_deref().unwrap_or("*");
        match self.port {
            Some(port) => write!(f, "{}:{}", address, port),
            None => write!(f, "{}", address),
        }
    }
}

/// Direction-independent identity of a conversation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct StreamKey {
    lower: Endpoint,
    upper: Endpoint,
}

impl StreamKey {
    pub fn canonicalize(
        address_a: Option<&str>,
        port_a: Option<u16>,
        address_b: Option<&str>,
        port_b: Option<u16>,
    ) -> Self {
        let a = Endpoint {
            address: address_a.map(str::to_string),
            port: port_a,
        };
        let b = Endpoint {
            address: address_b.map(str::to_string),
            port: port_b,
        };
        if a <= b {
            Self { lower: a, upper: b }
        } else {
            Self { lower: b, upper: a }
        }
    }

    pub fn of(record: &PacketRecord) -> Self {
        Self::canonicalize(
            record.source_address.as_deref(),
            record.source_port,
            record.destination_address.as_deref(),
            record.destination_port,
        )
    }

    pub fn endpoints(&self) -> (&Endpoint, &Endpoint) {
        (&self.lower, &self.upper)
    }
}

impl std::fmt::Display for StreamKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} <-> {}", self.lower, self.upper)
    }
}

/// Every loaded record in the anchor's conversation, in store order
pub fn follow(store: &PacketStore, anchor: &PacketRecord) -> Vec<RecordRef> {
    let key = StreamKey::of(anchor);
    store
        .records()
        .iter()
        .enumerate()
        .filter(|(_, loaded)| StreamKey::of(loaded) == key)
        .map(|(index, _)| index)
        .collect()
}

/// Aggregate of one stream across the loaded records
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Conversation {
    pub key: StreamKey,
    pub packets: usize,
    pub bytes: u64,
    pub first: RecordRef,
    pub last: RecordRef,
}

/// Summarize every stream of the loaded records, ordered by first appearance
pub fn conversations(store: &PacketStore) -> Vec<Conversation> {
    conversations_of(store.records().iter().map(|loaded| &loaded.record))
}

/// Summarize the streams of `records`; `first`/`last` index into the sequence
pub fn conversations_of<'a, I>(records: I) -> Vec<Conversation>
where
    I: IntoIterator<Item = &'a PacketRecord>,
{
    let mut ordered: Vec<Conversation> = Vec::new();
    let mut by_key: HashMap<StreamKey, usize> = HashMap::new();

    for (index, record) in records.into_iter().enumerate() {
        let key = StreamKey::of(record);
        match by_key.get(&key) {
            Some(&slot) => {
                let conversation = &mut ordered[slot];
                conversation.packets += 1;
                conversation.bytes += record.byte_length;
                conversation.last = index;
            }
            None => {
                by_key.insert(key.clone(), ordered.len());
                ordered.push(Conversation {
                    key,
                    packets: 1,
                    bytes: record.byte_length,
                    first: index,
                    last: index,
                });
            }
        }
    }

    ordered
}
