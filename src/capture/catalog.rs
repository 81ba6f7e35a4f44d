use log::{debug, info};
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;
use uuid::Uuid;

use crate::models::config::ServerConfig;
use crate::models::packet::{Page, PacketRecord, PacketRecordDetail};
use crate::models::stats::{CaptureAnalysis, CaptureSummary};
use crate::utils::error::AppResult;
use crate::view::stream::{self, Conversation};

/// One loaded capture file
#[derive(Debug, Clone)]
pub struct Capture {
    pub id: Uuid,

    /// Display name, usually the file name
    pub name: String,

    /// Records ordered by capture time, then sequence number
    records: Vec<PacketRecord>,

    /// Layered detail, parallel to `records`
    layers: Vec<serde_json::Value>,
}

impl Capture {
    fn new(name: String, mut details: Vec<PacketRecordDetail>) -> Self {
        details.sort_by(|a, b| {
            a.record
                .capture_time
                .cmp(&b.record.capture_time)
                .then(a.record.sequence_number.cmp(&b.record.sequence_number))
        });

        let (records, layers) = details.into_iter().map(|d| (d.record, d.layers)).unzip();

        Self {
            id: Uuid::new_v4(),
            name,
            records,
            layers,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[PacketRecord] {
        &self.records
    }

    pub fn summary(&self) -> CaptureSummary {
        CaptureSummary::from_records(&self.records)
    }
}

/// Listing entry for one capture
#[derive(Debug, Clone, Serialize)]
pub struct CaptureInfo {
    pub id: Uuid,
    pub name: String,
    pub summary: CaptureSummary,
}

/// In-memory set of captures served by the listing API
#[derive(Debug)]
pub struct CaptureCatalog {
    config: ServerConfig,
    captures: HashMap<Uuid, Capture>,
}

impl CaptureCatalog {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            captures: HashMap::new(),
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Load a JSON capture file (an array of packet records with layers)
    pub fn load_file(&mut self, path: &Path) -> AppResult<Uuid> {
        let raw = std::fs::read_to_string(path)?;
        let details: Vec<PacketRecordDetail> = serde_json::from_str(&raw)?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Ok(self.insert(name, details))
    }

    /// Add a capture under a fresh id
    pub fn insert(&mut self, name: impl Into<String>, details: Vec<PacketRecordDetail>) -> Uuid {
        let capture = Capture::new(name.into(), details);
        let id = capture.id;
        info!(
            "Loaded capture '{}' as {} ({} packets)",
            capture.name,
            id,
            capture.len()
        );
        self.captures.insert(id, capture);
        id
    }

    pub fn get(&self, id: &Uuid) -> Option<&Capture> {
        self.captures.get(id)
    }

    /// One page of a capture; `None` for an unknown capture
    pub fn page(&self, id: &Uuid, offset: usize, limit: usize) -> Option<Page> {
        let capture = self.captures.get(id)?;
        let page = Page::slice(&capture.records, offset, limit);
        debug!(
            "Page of capture {} (offset: {}, limit: {}): {} records",
            id,
            offset,
            limit,
            page.records.len()
        );
        Some(page)
    }

    /// Detail of the record with `sequence_number`
    pub fn detail(&self, id: &Uuid, sequence_number: u64) -> Option<PacketRecordDetail> {
        let capture = self.captures.get(id)?;
        let index = capture
            .records
            .iter()
            .position(|r| r.sequence_number == sequence_number)?;

        Some(PacketRecordDetail {
            record: capture.records[index].clone(),
            layers: capture.layers[index].clone(),
        })
    }

    /// Protocol, talker and traffic breakdown of a capture
    pub fn analyze(&self, id: &Uuid) -> Option<CaptureAnalysis> {
        let capture = self.captures.get(id)?;
        Some(CaptureAnalysis::from_records(&capture.records))
    }

    /// Conversations of a capture in order of first appearance
    pub fn conversations(&self, id: &Uuid) -> Option<Vec<Conversation>> {
        let capture = self.captures.get(id)?;
        Some(stream::conversations_of(&capture.records))
    }

    /// All captures, ordered by name
    pub fn list(&self) -> Vec<CaptureInfo> {
        let mut captures: Vec<CaptureInfo> = self
            .captures
            .values()
            .map(|c| CaptureInfo {
                id: c.id,
                name: c.name.clone(),
                summary: c.summary(),
            })
            .collect();
        captures.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        captures
    }

    pub fn remove(&mut self, id: &Uuid) -> Option<Capture> {
        let removed = self.captures.remove(id);
        if let Some(capture) = &removed {
            info!("Removed capture '{}' ({})", capture.name, id);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.captures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.captures.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::packet::fixtures::{tcp, udp};
    use crate::utils::error::AppError;
    use std::io::Write;

    fn detail(record: PacketRecord) -> PacketRecordDetail {
        let layers = serde_json::json!({ "frame": { "number": record.sequence_number } });
        PacketRecordDetail { record, layers }
    }

    #[test]
    fn test_insert_orders_by_time_then_number() {
        let mut catalog = CaptureCatalog::new(ServerConfig::default());
        let mut late = tcp(1, "10.0.0.1", 1000, "10.0.0.2", 80);
        late.capture_time = tcp(9, "a", 1, "b", 2).capture_time;
        let id = catalog.insert(
            "mixed",
            vec![
                detail(late),
                detail(udp(3, "10.0.0.1", 53, "10.0.0.3", 53)),
                detail(tcp(2, "10.0.0.1", 1000, "10.0.0.2", 80)),
            ],
        );

        let page = catalog.page(&id, 0, 10).unwrap();
        let order: Vec<u64> = page.records.iter().map(|r| r.sequence_number).collect();
        assert_eq!(order, vec![2, 3, 1]);
        assert_eq!(page.total_count, 3);
        assert!(!page.has_more);
    }

    #[test]
    fn test_detail_and_remove() {
        let mut catalog = CaptureCatalog::new(ServerConfig::default());
        let id = catalog.insert("one", vec![detail(tcp(7, "10.0.0.1", 1, "10.0.0.2", 2))]);

        let found = catalog.detail(&id, 7).unwrap();
        assert_eq!(found.layers["frame"]["number"], 7);
        assert!(catalog.detail(&id, 8).is_none());

        assert!(catalog.remove(&id).is_some());
        assert!(catalog.page(&id, 0, 10).is_none());
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_load_file_accepts_backend_names() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"number": 1, "time": "2024-05-01T12:00:00", "src_ip": "10.0.0.5",
                 "dst_ip": "8.8.8.8", "src_port": 53001, "dst_port": 53,
                 "protocol": "DNS", "length": 74, "info": "Standard query",
                 "layers": {{"dns": {{"qry_name": "example.com"}}}}}}]"#
        )
        .unwrap();

        let mut catalog = CaptureCatalog::new(ServerConfig::default());
        let id = catalog.load_file(file.path()).unwrap();

        let listing = catalog.list();
        assert_eq!(listing.len(), 1);
        assert_eq!(listing[0].id, id);
        assert_eq!(listing[0].summary.total_packets, 1);
        assert_eq!(
            catalog.detail(&id, 1).unwrap().layers["dns"]["qry_name"],
            "example.com"
        );
    }

    #[test]
    fn test_load_file_reports_bad_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let mut catalog = CaptureCatalog::new(ServerConfig::default());
        let err = catalog.load_file(file.path()).unwrap_err();
        assert!(matches!(err, AppError::JsonError(_)));
    }

    #[test]
    fn test_load_file_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut catalog = CaptureCatalog::new(ServerConfig::default());
        let err = catalog.load_file(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, AppError::IoError(_)));
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_conversations_and_analysis() {
        let mut catalog = CaptureCatalog::new(ServerConfig::default());
        let id = catalog.insert(
            "flows",
            vec![
                detail(tcp(1, "10.0.0.1", 1000, "10.0.0.2", 80)),
                detail(tcp(2, "10.0.0.2", 80, "10.0.0.1", 1000)),
                detail(udp(3, "10.0.0.1", 53, "10.0.0.3", 53)),
            ],
        );

        let conversations = catalog.conversations(&id).unwrap();
        assert_eq!(conversations.len(), 2);
        assert_eq!(conversations[0].packets, 2);
        assert_eq!(conversations[1].first, 2);

        let analysis = catalog.analyze(&id).unwrap();
        assert_eq!(analysis.top_sources[0].address, "10.0.0.1");
        assert!(catalog.analyze(&Uuid::new_v4()).is_none());
    }
}
