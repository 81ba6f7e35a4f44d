use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// One decoded packet summary as delivered by the listing endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PacketRecord {
    /// The capture's own packet number
    #[serde(alias = "number")]
    pub sequence_number: u64,

    /// Timestamp when the packet was captured
    #[serde(alias = "time", deserialize_with = "deserialize_capture_time")]
    pub capture_time: DateTime<Utc>,

    /// Source address (absent for link-layer-only records)
    #[serde(default, alias = "src_ip", deserialize_with = "deserialize_address")]
    pub source_address: Option<String>,

    /// Destination address (absent for link-layer-only records)
    #[serde(default, alias = "dst_ip", deserialize_with = "deserialize_address")]
    pub destination_address: Option<String>,

    /// Source port (for protocols with ports)
    #[serde(default, alias = "src_port", deserialize_with = "deserialize_port")]
    pub source_port: Option<u16>,

    /// Destination port (for protocols with ports)
    #[serde(default, alias = "dst_port", deserialize_with = "deserialize_port")]
    pub destination_port: Option<u16>,

    /// Protocol label (e.g., TCP, DNS)
    #[serde(alias = "protocol")]
    pub protocol_tag: String,

    /// Length of the packet in bytes
    #[serde(alias = "length")]
    pub byte_length: u64,

    /// Brief description of the packet
    #[serde(default, alias = "info")]
    pub summary_info: String,
}

/// A record held by the store, with the times derived at append
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedRecord {
    pub record: PacketRecord,

    /// Seconds since the first record in the buffer
    pub relative_time: f64,

    /// Seconds since the previous record in buffer order
    pub delta_time: f64,
}

impl LoadedRecord {
    /// Derive the relative and delta times against the buffer's first and previous records
    pub fn derive(
        record: PacketRecord,
        first: Option<&PacketRecord>,
        previous: Option<&PacketRecord>,
    ) -> Self {
        let relative_time = first
            .map(|f| seconds_between(&f.capture_time, &record.capture_time))
            .unwrap_or(0.0);
        let delta_time = previous
            .map(|p| seconds_between(&p.capture_time, &record.capture_time))
            .unwrap_or(0.0);

        Self {
            record,
            relative_time,
            delta_time,
        }
    }
}

impl std::ops::Deref for LoadedRecord {
    type Target = PacketRecord;

    fn deref(&self) -> &PacketRecord {
        &self.record
    }
}

/// One page of the paginated listing endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Page {
    #[serde(alias = "packets")]
    pub records: Vec<PacketRecord>,

    /// Authoritative record count of the capture
    #[serde(alias = "total_returned")]
    pub total_count: usize,

    #[serde(default)]
    pub has_more: bool,
}

impl Page {
    /// Build the page for `offset` out of an ordered record slice
    pub fn slice(all: &[PacketRecord], offset: usize, limit: usize) -> Self {
        let start = offset.min(all.len());
        let end = start.saturating_add(limit).min(all.len());
        let records = all[start..end].to_vec();
        let has_more = start + records.len() < all.len();

        Self {
            records,
            total_count: all.len(),
            has_more,
        }
    }
}

/// Full detail of one record: the summary plus opaque protocol layers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PacketRecordDetail {
    #[serde(flatten)]
    pub record: PacketRecord,

    /// Layered protocol fields as produced by the decoding backend
    #[serde(default)]
    pub layers: serde_json::Value,
}

fn seconds_between(from: &DateTime<Utc>, to: &DateTime<Utc>) -> f64 {
    let elapsed = *to - *from;
    match elapsed.num_microseconds() {
        Some(micros) => micros as f64 / 1_000_000.0,
        None => elapsed.num_milliseconds() as f64 / 1_000.0,
    }
}

/// Accepts RFC 3339 timestamps as well as naive ISO-8601 ones (taken as UTC)
fn deserialize_capture_time<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_capture_time(&raw).map_err(serde::de::Error::custom)
}

pub fn parse_capture_time(raw: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(time) = DateTime::parse_from_rfc3339(raw) {
        return Ok(time.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .map(|naive| Utc.from_utc_datetime(&naive))
        .map_err(|e| format!("invalid capture time '{}': {}", raw, e))
}

/// Non-IP records come over the wire with an unspecified or empty address
fn deserialize_address<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let address = Option::<String>::deserialize(deserializer)?;
    Ok(address.filter(|a| !a.is_empty() && a != "0.0.0.0"))
}

/// Port 0 is how portless records come over the wire
fn deserialize_port<'de, D>(deserializer: D) -> Result<Option<u16>, D::Error>
where
    D: Deserializer<'de>,
{
    let port = Option::<u16>::deserialize(deserializer)?;
    Ok(port.filter(|p| *p != 0))
}
