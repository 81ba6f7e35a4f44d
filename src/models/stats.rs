use chrono::{DateTime, DurationRound, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use super::packet::PacketRecord;

/// Totals for one capture file
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct CaptureSummary {
    /// Total number of packets in the capture
    pub total_packets: usize,

    /// Total bytes captured
    pub total_bytes: u64,

    /// Packets per protocol
    pub protocols: HashMap<String, usize>,

    /// Time of the first packet
    pub start_time: Option<DateTime<Utc>>,

    /// Time of the last packet
    pub end_time: Option<DateTime<Utc>>,

    /// Seconds between first and last packet
    pub duration_secs: f64,
}

impl CaptureSummary {
    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a PacketRecord>,
    {
        let mut summary = Self::default();

        for record in records {
            summary.total_packets += 1;
            summary.total_bytes += record.byte_length;
            *summary
                .protocols
                .entry(record.protocol_tag.clone())
                .or_insert(0) += 1;

            let time = record.capture_time;
            summary.start_time = Some(summary.start_time.map_or(time, |t| t.min(time)));
            summary.end_time = Some(summary.end_time.map_or(time, |t| t.max(time)));
        }

        if let (Some(start), Some(end)) = (summary.start_time, summary.end_time) {
            summary.duration_secs = (end - start).num_milliseconds() as f64 / 1_000.0;
        }

        summary
    }
}

/// Addresses ranked in a `CaptureAnalysis`
pub const TOP_TALKERS: usize = 10;

/// Traffic attributed to one address
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TopTalker {
    pub address: String,
    pub packets: usize,
    pub bytes: u64,

    /// Share of the capture's bytes, in percent
    pub percentage: f64,
}

/// Packets captured within one second
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrafficBucket {
    pub time: DateTime<Utc>,
    pub packets: usize,
}

/// Summary plus the per-address and per-second breakdowns of a capture
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct CaptureAnalysis {
    #[serde(flatten)]
    pub summary: CaptureSummary,

    /// Busiest source addresses, by packet count
    pub top_sources: Vec<TopTalker>,

    /// Busiest destination addresses, by packet count
    pub top_destinations: Vec<TopTalker>,

    /// Packets per second, ascending by time
    pub traffic_over_time: Vec<TrafficBucket>,
}

impl CaptureAnalysis {
    pub fn from_records(records: &[PacketRecord]) -> Self {
        let summary = CaptureSummary::from_records(records);
        let top_sources = top_talkers(records, summary.total_bytes, |r| r.source_address.as_deref());
        let top_destinations =
            top_talkers(records, summary.total_bytes, |r| r.destination_address.as_deref());

        let mut per_second: BTreeMap<DateTime<Utc>, usize> = BTreeMap::new();
        for record in records {
            let second = record
                .capture_time
                .duration_trunc(chrono::Duration::seconds(1))
                .unwrap_or(record.capture_time);
            *per_second.entry(second).or_insert(0) += 1;
        }
        let traffic_over_time = per_second
            .into_iter()
            .map(|(time, packets)| TrafficBucket { time, packets })
            .collect();

        Self {
            summary,
            top_sources,
            top_destinations,
            traffic_over_time,
        }
    }
}

// Records without an address are not attributed to anyone
fn top_talkers<F>(records: &[PacketRecord], total_bytes: u64, address: F) -> Vec<TopTalker>
where
    F: Fn(&PacketRecord) -> Option<&str>,
{
    let mut by_address: HashMap<&str, (usize, u64)> = HashMap::new();
    for record in records {
        if let Some(address) = address(record) {
            let entry = by_address.entry(address).or_insert((0, 0));
            entry.0 += 1;
            entry.1 += record.byte_length;
        }
    }

    let mut talkers: Vec<TopTalker> = by_address
        .into_iter()
        .map(|(address, (packets, bytes))| TopTalker {
            address: address.to_string(),
            packets,
            bytes,
            percentage: if total_bytes > 0 {
                bytes as f64 * 100.0 / total_bytes as f64
            } else {
                0.0
            },
        })
        .collect();

    talkers.sort_by(|a, b| {
        b.packets
            .cmp(&a.packets)
            .then(b.bytes.cmp(&a.bytes))
            .then(a.address.cmp(&b.address))
    });
    talkers.truncate(TOP_TALKERS);
    talkers
}
