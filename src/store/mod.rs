//! Incremental, append-only packet store fed by a paginated source.
//!
//! The store is the single writer of loaded records. A page fetch is split
//! into [`PacketStore::begin_fetch`] and [`PacketStore::complete_fetch`] so
//! that at most one request is ever outstanding and a response that arrives
//! after a [`PacketStore::reset`] is recognised by its generation and dropped.

pub mod source;

use log::{debug, info, trace, warn};

use crate::models::packet::{LoadedRecord, Page, PacketRecord};
use crate::utils::error::FetchError;

pub use source::{HttpPageSource, PageSource};

/// Index of a record in the store's buffer
pub type RecordRef = usize;

pub const DEFAULT_PAGE_SIZE: usize = 100;

/// An outstanding page request; completing it consumes it
#[derive(Debug, PartialEq, Eq)]
pub struct PageRequest {
    pub capture_id: String,
    pub offset: usize,
    pub limit: usize,
    generation: u64,
}

impl PageRequest {
    /// Store generation the request was issued under
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Records loaded so far for one capture
#[derive(Debug)]
pub struct PacketStore {
    /// Capture the pages are requested for
    capture_id: String,

    /// Records requested per page
    page_size: usize,

    /// Append-only buffer in capture order
    records: Vec<LoadedRecord>,

    /// Authoritative count reported by the source
    total_count: usize,

    /// Set while the single permitted page request is outstanding
    fetch_in_flight: bool,

    /// Bumped by every reset; stamps page requests
    generation: u64,
}

impl PacketStore {
    /// Create an empty store
    pub fn new(capture_id: impl Into<String>, page_size: usize) -> Self {
        Self {
            capture_id: capture_id.into(),
            page_size: page_size.max(1),
            records: Vec::new(),
            total_count: 0,
            fetch_in_flight: false,
            generation: 0,
        }
    }

    /// Create a store holding the first page of `capture_id`
    pub async fn open(
        source: &dyn PageSource,
        capture_id: impl Into<String>,
        page_size: usize,
    ) -> Result<Self, FetchError> {
        let mut store = Self::new(capture_id, page_size);
        let first = source
            .fetch_page(&store.capture_id, store.page_size, 0)
            .await?;
        store.reset(first);
        Ok(store)
    }

    /// Replace the buffer wholesale; any outstanding request becomes stale
    pub fn reset(&mut self, page: Page) {
        self.generation += 1;
        self.fetch_in_flight = false;
        self.records.clear();
        self.append(page.records);
        self.total_count = page.total_count.max(self.records.len());

        info!(
            "Store reset for capture {}: {} of {} records loaded (generation {})",
            self.capture_id,
            self.records.len(),
            self.total_count,
            self.generation
        );
    }

    /// Point the store at another capture and reset it with that capture's first page
    pub fn switch_capture(&mut self, capture_id: impl Into<String>, page: Page) {
        self.capture_id = capture_id.into();
        self.reset(page);
    }

    /// Start fetching the next page, unless one is in flight or everything is loaded
    pub fn begin_fetch(&mut self) -> Option<PageRequest> {
        if self.fetch_in_flight {
            trace!("Fetch already in flight for capture {}", self.capture_id);
            return None;
        }
        if !self.has_more() {
            trace!("All {} records of capture {} loaded", self.total_count, self.capture_id);
            return None;
        }

        self.fetch_in_flight = true;
        let request = PageRequest {
            capture_id: self.capture_id.clone(),
            offset: self.records.len(),
            limit: self.page_size,
            generation: self.generation,
        };
        debug!(
            "Requesting page for capture {} (offset: {}, limit: {})",
            request.capture_id, request.offset, request.limit
        );
        Some(request)
    }

    /// Apply the outcome of `request`; returns the number of appended records
    pub fn complete_fetch(
        &mut self,
        request: PageRequest,
        result: Result<Page, FetchError>,
    ) -> Result<usize, FetchError> {
        if request.generation != self.generation {
            debug!(
                "Discarding page at offset {} for capture {}: generation {} superseded by {}",
                request.offset, request.capture_id, request.generation, self.generation
            );
            return Err(FetchError::Stale);
        }

        self.fetch_in_flight = false;

        let page = match result {
            Ok(page) => page,
            Err(e) => {
                warn!(
                    "Fetching page at offset {} for capture {} failed: {}",
                    request.offset, request.capture_id, e
                );
                return Err(e);
            }
        };

        let received = page.records.len();
        self.append(page.records);

        if received == 0 && self.records.len() < page.total_count {
            warn!(
                "Empty page at offset {} while {} records were reported; treating capture {} as exhausted",
                request.offset, page.total_count, self.capture_id
            );
            self.total_count = self.records.len();
        } else {
            self.total_count = page.total_count.max(self.records.len());
        }

        debug!(
            "Appended {} records to capture {} ({} of {} loaded)",
            received,
            self.capture_id,
            self.records.len(),
            self.total_count
        );
        Ok(received)
    }

    /// Fetch and append the next page; a no-op while a fetch is in flight or when complete
    pub async fn load_more(&mut self, source: &dyn PageSource) -> Result<(), FetchError> {
        let Some(request) = self.begin_fetch() else {
            return Ok(());
        };

        let result = source
            .fetch_page(&request.capture_id, request.limit, request.offset)
            .await;

        match self.complete_fetch(request, result) {
            Ok(_) | Err(FetchError::Stale) => Ok(()),
            Err(e) => Err(e),
        }
    }

    fn append(&mut self, records: Vec<PacketRecord>) {
        self.records.reserve(records.len());
        for record in records {
            let loaded = LoadedRecord::derive(
                record,
                self.records.first().map(|r| &r.record),
                self.records.last().map(|r| &r.record),
            );
            self.records.push(loaded);
        }
    }

    pub fn loaded_count(&self) -> usize {
        self.records.len()
    }

    pub fn total_count(&self) -> usize {
        self.total_count
    }

    pub fn has_more(&self) -> bool {
        self.records.len() < self.total_count
    }

    pub fn record_at(&self, index: RecordRef) -> Option<&LoadedRecord> {
        self.records.get(index)
    }

    pub fn records(&self) -> &[LoadedRecord] {
        &self.records
    }

    /// Position of the record with this sequence number
    pub fn find(&self, sequence_number: u64) -> Option<RecordRef> {
        self.records
            .iter()
            .position(|r| r.sequence_number == sequence_number)
    }

    pub fn fetch_in_flight(&self) -> bool {
        self.fetch_in_flight
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn capture_id(&self) -> &str {
        &self.capture_id
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::packet::{fixtures, PacketRecordDetail};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// In-memory listing endpoint that counts requests
    struct VecSource {
        records: Vec<PacketRecord>,
        requests: AtomicUsize,
        fail_next: AtomicBool,
    }

    impl VecSource {
        fn with_records(count: u64) -> Self {
            Self {
                records: (1..=count)
                    .map(|n| fixtures::tcp(n, "10.0.0.1", 40000, "10.0.0.2", 443))
                    .collect(),
                requests: AtomicUsize::new(0),
                fail_next: AtomicBool::new(false),
            }
        }

        fn requests(&self) -> usize {
            self.requests.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PageSource for VecSource {
        async fn fetch_page(
            &self,
            _capture_id: &str,
            limit: usize,
            offset: usize,
        ) -> Result<Page, FetchError> {
            self.requests.fetch_add(1, Ordering::SeqCst);
            if self.fail_next.swap(false, Ordering::SeqCst) {
                return Err(FetchError::Network("connection reset".to_string()));
            }
            Ok(Page::slice(&self.records, offset, limit))
        }

        async fn fetch_detail(
            &self,
            _capture_id: &str,
            sequence_number: u64,
        ) -> Result<PacketRecordDetail, FetchError> {
            Err(FetchError::ServerError {
                status: 404,
                message: format!("Packet {} not found", sequence_number),
            })
        }
    }

    #[tokio::test]
    async fn test_pagination_is_monotonic_and_append_only() {
        let source = VecSource::with_records(250);
        let mut store = PacketStore::open(&source, "cap", 100).await.unwrap();
        let initial: Vec<_> = store.records().to_vec();
        assert_eq!(store.loaded_count(), 100);
        assert_eq!(store.total_count(), 250);

        for n in 1..=3 {
            store.load_more(&source).await.unwrap();
            assert_eq!(store.loaded_count(), 250.min(100 + n * 100));
            assert!(store.loaded_count() <= store.total_count());
        }

        assert_eq!(&store.records()[..100], &initial[..]);
        assert_eq!(store.records()[249].sequence_number, 250);
        // open + two real pages; the third load_more found nothing left
        assert_eq!(source.requests(), 3);
        assert!(!store.has_more());
    }

    #[tokio::test]
    async fn test_fetch_guard_allows_one_request() {
        let source = VecSource::with_records(30);
        let mut store = PacketStore::open(&source, "cap", 10).await.unwrap();

        let first = store.begin_fetch().expect("first fetch starts");
        assert!(store.begin_fetch().is_none());
        store.load_more(&source).await.unwrap();
        assert_eq!(source.requests(), 1);
        assert_eq!(store.loaded_count(), 10);

        let page = source
            .fetch_page(&first.capture_id, first.limit, first.offset)
            .await;
        assert_eq!(store.complete_fetch(first, page), Ok(10));
        assert_eq!(store.loaded_count(), 20);
        assert!(!store.fetch_in_flight());
    }

    #[tokio::test]
    async fn test_stale_completion_after_reset_is_dropped() {
        let source = VecSource::with_records(30);
        let mut store = PacketStore::open(&source, "cap-a", 10).await.unwrap();

        let slow = store.begin_fetch().unwrap();
        let replacement = fixtures::page(
            vec![fixtures::udp(500, "10.0.0.9", 53, "10.0.0.1", 40000)],
            1,
        );
        store.switch_capture("cap-b", replacement);
        assert!(!store.fetch_in_flight());

        let late_page = Page::slice(&source.records, slow.offset, slow.limit);
        assert_eq!(
            store.complete_fetch(slow, Ok(late_page)),
            Err(FetchError::Stale)
        );
        assert_eq!(store.loaded_count(), 1);
        assert_eq!(store.records()[0].sequence_number, 500);
        assert_eq!(store.capture_id(), "cap-b");
    }

    #[tokio::test]
    async fn test_stale_completion_does_not_release_newer_fetch() {
        let source = VecSource::with_records(30);
        let mut store = PacketStore::open(&source, "cap", 10).await.unwrap();

        let old = store.begin_fetch().unwrap();
        store.reset(Page::slice(&source.records, 0, 5));
        let current = store.begin_fetch().unwrap();
        assert_eq!(current.offset, 5);

        assert_eq!(store.complete_fetch(old, Ok(Page::default())), Err(FetchError::Stale));
        assert!(store.fetch_in_flight());

        let page = Page::slice(&source.records, current.offset, current.limit);
        assert_eq!(store.complete_fetch(current, Ok(page)), Ok(10));
        assert_eq!(store.loaded_count(), 15);
    }

    #[tokio::test]
    async fn test_failed_fetch_leaves_store_retryable() {
        let source = VecSource::with_records(25);
        let mut store = PacketStore::open(&source, "cap", 10).await.unwrap();

        source.fail_next.store(true, Ordering::SeqCst);
        let err = store.load_more(&source).await.unwrap_err();
        assert!(matches!(err, FetchError::Network(_)));
        assert_eq!(store.loaded_count(), 10);
        assert!(!store.fetch_in_flight());

        store.load_more(&source).await.unwrap();
        assert_eq!(store.loaded_count(), 20);
    }

    #[test]
    fn test_times_derive_across_pages() {
        let records: Vec<_> = (1..=4)
            .map(|n| fixtures::tcp(n, "10.0.0.1", 1, "10.0.0.2", 2))
            .collect();
        let mut store = PacketStore::new("cap", 2);
        store.reset(Page::slice(&records, 0, 2));

        let request = store.begin_fetch().unwrap();
        let page = Page::slice(&records, request.offset, request.limit);
        store.complete_fetch(request, Ok(page)).unwrap();

        let third = store.record_at(2).unwrap();
        assert!((third.relative_time - 0.5).abs() < 1e-9);
        assert!((third.delta_time - 0.25).abs() < 1e-9);
        assert_eq!(store.record_at(0).unwrap().relative_time, 0.0);
    }

    #[test]
    fn test_empty_page_marks_capture_exhausted() {
        let mut store = PacketStore::new("cap", 10);
        store.reset(fixtures::page(
            vec![fixtures::tcp(1, "a", 1, "b", 2)],
            5,
        ));

        let request = store.begin_fetch().unwrap();
        let empty = Page {
            records: Vec::new(),
            total_count: 5,
            has_more: true,
        };
        assert_eq!(store.complete_fetch(request, Ok(empty)), Ok(0));
        assert_eq!(store.total_count(), 1);
        assert!(store.begin_fetch().is_none());
    }

    #[test]
    fn test_find_by_sequence_number() {
        let mut store = PacketStore::new("cap", 10);
        store.reset(fixtures::page(
            vec![
                fixtures::tcp(4, "a", 1, "b", 2),
                fixtures::tcp(9, "a", 1, "b", 2),
            ],
            2,
        ));
        assert_eq!(store.find(9), Some(1));
        assert_eq!(store.find(5), None);
    }
}
