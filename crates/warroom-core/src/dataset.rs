//! Trip dataset loading and caching
//!
//! Parses the Fetii spreadsheet export (CSV) into typed trip records and
//! caches loaded datasets in memory for the life of the process. Rows that
//! fail validation are skipped and counted, not retained; the load only
//! fails when no valid row survives.

use std::collections::HashMap;
use std::io::Read;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::NaiveDateTime;
use csv::{ReaderBuilder, StringRecord};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::models::{Location, TripDataset, TripRecord};

/// Source identity for the embedded sample dataset
pub const SAMPLE_SOURCE: &str = "sample";

/// Timeout for the remote dataset fetch
const FETCH_TIMEOUT: Duration = Duration::from_secs(15);

/// Embedded Austin sample dataset (compiled into the binary)
const SAMPLE_CSV: &str = include_str!("../data/sample_trips.csv");

/// Required columns of the trip export, resolved by header name
const COL_TRIP_ID: &str = "Trip ID";
const COL_BOOKING_USER_ID: &str = "Booking User ID";
const COL_PICKUP_LAT: &str = "Pick Up Latitude";
const COL_PICKUP_LNG: &str = "Pick Up Longitude";
const COL_DROPOFF_LAT: &str = "Drop Off Latitude";
const COL_DROPOFF_LNG: &str = "Drop Off Longitude";
const COL_PICKUP_ADDRESS: &str = "Pick Up Address";
const COL_DROPOFF_ADDRESS: &str = "Drop Off Address";
const COL_TIMESTAMP: &str = "Trip Date and Time";
const COL_PASSENGERS: &str = "Total Passengers";

/// Column positions resolved from the header row
struct ColumnMap {
    trip_id: usize,
    booking_user_id: Option<usize>,
    pickup_lat: usize,
    pickup_lng: usize,
    dropoff_lat: usize,
    dropoff_lng: usize,
    pickup_address: usize,
    dropoff_address: usize,
    timestamp: usize,
    passengers: usize,
}

impl ColumnMap {
    fn from_headers(headers: &StringRecord) -> Result<Self> {
        let find = |name: &str| -> Result<usize> {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| Error::DataFormat(format!("Missing column: {}", name)))
        };

        Ok(Self {
            trip_id: find(COL_TRIP_ID)?,
            // Booking user id is informational and absent from some exports
            booking_user_id: headers.iter().position(|h| h.trim() == COL_BOOKING_USER_ID),
            pickup_lat: find(COL_PICKUP_LAT)?,
            pickup_lng: find(COL_PICKUP_LNG)?,
            dropoff_lat: find(COL_DROPOFF_LAT)?,
            dropoff_lng: find(COL_DROPOFF_LNG)?,
            pickup_address: find(COL_PICKUP_ADDRESS)?,
            dropoff_address: find(COL_DROPOFF_ADDRESS)?,
            timestamp: find(COL_TIMESTAMP)?,
            passengers: find(COL_PASSENGERS)?,
        })
    }
}

/// Parse trip CSV data into a dataset
///
/// Rows missing required fields, with unparseable timestamps, or with a
/// passenger count below 1 are skipped and counted. Fails with
/// [`Error::DataFormat`] only when zero valid rows remain.
pub fn parse_trips<R: Read>(reader: R, source: &str) -> Result<TripDataset> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let columns = ColumnMap::from_headers(&headers)?;

    let mut records = Vec::new();
    let mut skipped = 0usize;

    for result in rdr.records() {
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "Skipping unreadable row");
                skipped += 1;
                continue;
            }
        };

        match parse_row(&record, &columns) {
            Ok(trip) => records.push(trip),
            Err(e) => {
                warn!(error = %e, "Skipping invalid row");
                skipped += 1;
            }
        }
    }

    if records.is_empty() {
        return Err(Error::DataFormat(format!(
            "No valid trip rows in {} ({} skipped)",
            source, skipped
        )));
    }

    debug!(
        valid = records.len(),
        skipped,
        source,
        "Parsed trip dataset"
    );

    Ok(TripDataset {
        source: source.to_string(),
        records,
        skipped,
    })
}

fn parse_row(record: &StringRecord, columns: &ColumnMap) -> Result<TripRecord> {
    let field = |idx: usize, name: &str| -> Result<&str> {
        record
            .get(idx)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| Error::InvalidData(format!("Missing {}", name)))
    };

    let trip_id = field(columns.trip_id, "trip id")?
        .parse::<i64>()
        .map_err(|_| Error::InvalidData("Unparseable trip id".into()))?;

    let booking_user_id = columns
        .booking_user_id
        .and_then(|idx| record.get(idx))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse::<i64>().ok());

    let timestamp = parse_timestamp(field(columns.timestamp, "timestamp")?)?;

    let passengers = field(columns.passengers, "passenger count")?
        .parse::<i64>()
        .map_err(|_| Error::InvalidData("Unparseable passenger count".into()))?;
    if passengers < 1 {
        return Err(Error::InvalidData(format!(
            "Passenger count must be positive, got {}",
            passengers
        )));
    }

    let pickup = Location {
        address: field(columns.pickup_address, "pickup address")?.to_string(),
        lat: parse_coord(field(columns.pickup_lat, "pickup latitude")?)?,
        lng: parse_coord(field(columns.pickup_lng, "pickup longitude")?)?,
    };
    let dropoff = Location {
        address: field(columns.dropoff_address, "dropoff address")?.to_string(),
        lat: parse_coord(field(columns.dropoff_lat, "dropoff latitude")?)?,
        lng: parse_coord(field(columns.dropoff_lng, "dropoff longitude")?)?,
    };

    let pickup_zone = zone_for_address(&pickup.address).to_string();
    let dropoff_zone = zone_for_address(&dropoff.address).to_string();

    Ok(TripRecord {
        trip_id,
        booking_user_id,
        timestamp,
        pickup,
        dropoff,
        pickup_zone,
        dropoff_zone,
        passengers: passengers as u32,
    })
}

fn parse_coord(s: &str) -> Result<f64> {
    s.parse::<f64>()
        .map_err(|_| Error::InvalidData(format!("Unparseable coordinate: {}", s)))
}

/// Parse a trip timestamp in the formats seen in the spreadsheet export
fn parse_timestamp(s: &str) -> Result<NaiveDateTime> {
    let s = s.trim();

    let formats = [
        "%m/%d/%y %H:%M",    // 9/8/25 11:47
        "%m/%d/%Y %H:%M",    // 9/8/2025 11:47
        "%Y-%m-%d %H:%M:%S", // 2025-09-08 11:47:00
        "%Y-%m-%dT%H:%M:%S", // 2025-09-08T11:47:00
    ];

    for fmt in formats {
        if let Ok(ts) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(ts);
        }
    }

    Err(Error::InvalidData(format!("Unable to parse timestamp: {}", s)))
}

/// Map a raw address to one of the Austin zones used in the reports
///
/// Keyword heuristics over the address text. Order matters: the more
/// specific patterns are checked first.
pub fn zone_for_address(address: &str) -> &'static str {
    let addr = address.to_lowercase();

    if addr.contains("west campus") || addr.contains("w 23rd") {
        "West Campus"
    } else if addr.contains("university") || addr.contains("campus") || addr.contains("23rd") {
        "University District"
    } else if addr.contains("downtown") || addr.contains("6th") || addr.contains("market") {
        "Downtown Austin"
    } else if addr.contains("east") || addr.contains("e 6th") {
        "East Austin"
    } else if addr.contains("south") || addr.contains("s congress") {
        "South Austin"
    } else if addr.contains("north") || addr.contains("n university") {
        "North Austin"
    } else {
        "Other Austin"
    }
}

/// Fetch CSV text from a remote dataset endpoint
///
/// The fetch carries a timeout so a slow source never hangs startup.
pub async fn fetch_csv(url: &str) -> Result<String> {
    let client = reqwest::Client::builder()
        .timeout(FETCH_TIMEOUT)
        .build()?;

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| Error::DataUnavailable(format!("{}: {}", url, e)))?;

    if !response.status().is_success() {
        return Err(Error::DataUnavailable(format!(
            "{} returned HTTP {}",
            url,
            response.status()
        )));
    }

    response
        .text()
        .await
        .map_err(|e| Error::DataUnavailable(format!("{}: {}", url, e)))
}

/// The embedded 15-trip Austin sample
pub fn sample_dataset() -> TripDataset {
    // The embedded CSV is known-good, so the parse cannot fail
    parse_trips(SAMPLE_CSV.as_bytes(), SAMPLE_SOURCE)
        .unwrap_or_else(|_| TripDataset {
            source: SAMPLE_SOURCE.to_string(),
            records: Vec::new(),
            skipped: 0,
        })
}

/// Process-wide dataset cache keyed by source identity
///
/// Constructed once at startup and threaded through calls explicitly so
/// tests can substitute a fixed dataset without touching global state.
/// Entries have no expiry; re-fetching only happens on [`invalidate`].
///
/// [`invalidate`]: DatasetCache::invalidate
#[derive(Default)]
pub struct DatasetCache {
    datasets: RwLock<HashMap<String, Arc<TripDataset>>>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a dataset, returning the cached copy when present
    ///
    /// Sources starting with `http://`/`https://` are fetched remotely;
    /// [`SAMPLE_SOURCE`] resolves to the embedded sample; anything else is
    /// read as a local file path.
    pub async fn load(&self, source: &str) -> Result<Arc<TripDataset>> {
        if let Some(dataset) = self.get(source) {
            return Ok(dataset);
        }

        let dataset = Arc::new(load_source(source).await?);
        info!(
            source,
            trips = dataset.len(),
            skipped = dataset.skipped,
            "Loaded trip dataset"
        );

        let mut datasets = self
            .datasets
            .write()
            .map_err(|_| Error::InvalidData("Dataset cache lock poisoned".into()))?;
        datasets.insert(source.to_string(), dataset.clone());
        Ok(dataset)
    }

    /// Get a cached dataset without loading
    pub fn get(&self, source: &str) -> Option<Arc<TripDataset>> {
        self.datasets.read().ok()?.get(source).cloned()
    }

    /// Fetch a fresh copy, replacing the cached one only on success
    ///
    /// A failed refetch leaves the previous dataset in place, so the
    /// war room keeps serving the last good data.
    pub async fn refresh(&self, source: &str) -> Result<Arc<TripDataset>> {
        let dataset = Arc::new(load_source(source).await?);
        info!(
            source,
            trips = dataset.len(),
            skipped = dataset.skipped,
            "Refreshed trip dataset"
        );

        let mut datasets = self
            .datasets
            .write()
            .map_err(|_| Error::InvalidData("Dataset cache lock poisoned".into()))?;
        datasets.insert(source.to_string(), dataset.clone());
        Ok(dataset)
    }

    /// Drop the cached copy so the next load re-fetches
    pub fn invalidate(&self, source: &str) {
        if let Ok(mut datasets) = self.datasets.write() {
            datasets.remove(source);
        }
    }

    /// Substitute a fixed dataset (used by tests and the sample fallback)
    pub fn insert(&self, dataset: TripDataset) -> Arc<TripDataset> {
        let dataset = Arc::new(dataset);
        if let Ok(mut datasets) = self.datasets.write() {
            datasets.insert(dataset.source.clone(), dataset.clone());
        }
        dataset
    }
}

async fn load_source(source: &str) -> Result<TripDataset> {
    if source == SAMPLE_SOURCE {
        return Ok(sample_dataset());
    }

    if source.starts_with("http://") || source.starts_with("https://") {
        let body = fetch_csv(source).await?;
        return parse_trips(body.as_bytes(), source);
    }

    let file = std::fs::File::open(source)
        .map_err(|e| Error::DataUnavailable(format!("{}: {}", source, e)))?;
    parse_trips(file, source)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "Trip ID,Booking User ID,Pick Up Latitude,Pick Up Longitude,Drop Off Latitude,Drop Off Longitude,Pick Up Address,Drop Off Address,Trip Date and Time,Total Passengers";

    fn csv_with_rows(rows: &[&str]) -> String {
        let mut out = String::from(HEADER);
        for row in rows {
            out.push('\n');
            out.push_str(row);
        }
        out
    }

    #[test]
    fn test_parse_sample() {
        let dataset = sample_dataset();
        assert_eq!(dataset.len(), 15);
        assert_eq!(dataset.skipped, 0);
        assert_eq!(dataset.records[0].trip_id, 734889);
        assert_eq!(dataset.records[0].passengers, 9);
        assert_eq!(dataset.records[0].pickup_hour(), 11);
    }

    #[test]
    fn test_parse_timestamp_formats() {
        assert!(parse_timestamp("9/8/25 11:47").is_ok());
        assert!(parse_timestamp("9/8/2025 11:47").is_ok());
        assert!(parse_timestamp("2025-09-08 11:47:00").is_ok());
        assert!(parse_timestamp("not a time").is_err());
    }

    #[test]
    fn test_skips_negative_passenger_count() {
        let csv = csv_with_rows(&[
            r#"1,10,30.28,-97.74,30.26,-97.73,"West Campus, Austin","6th St, Austin",9/7/25 21:00,4"#,
            r#"2,11,30.28,-97.74,30.26,-97.73,"West Campus, Austin","6th St, Austin",9/7/25 22:00,-3"#,
        ]);

        let dataset = parse_trips(csv.as_bytes(), "test").unwrap();
        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.skipped, 1);
    }

    #[test]
    fn test_skips_bad_timestamp() {
        let csv = csv_with_rows(&[
            r#"1,10,30.28,-97.74,30.26,-97.73,"West Campus, Austin","6th St, Austin",whenever,4"#,
            r#"2,11,30.28,-97.74,30.26,-97.73,"West Campus, Austin","6th St, Austin",9/7/25 22:00,3"#,
        ]);

        let dataset = parse_trips(csv.as_bytes(), "test").unwrap();
        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.skipped, 1);
    }

    #[test]
    fn test_zero_valid_rows_is_format_error() {
        let csv = csv_with_rows(&[
            r#"1,10,30.28,-97.74,30.26,-97.73,"West Campus, Austin","6th St, Austin",whenever,4"#,
        ]);

        let err = parse_trips(csv.as_bytes(), "test").unwrap_err();
        assert!(matches!(err, Error::DataFormat(_)));
    }

    #[test]
    fn test_missing_column_is_format_error() {
        let csv = "Trip ID,Total Passengers\n1,4";
        let err = parse_trips(csv.as_bytes(), "test").unwrap_err();
        assert!(matches!(err, Error::DataFormat(_)));
    }

    #[test]
    fn test_zone_extraction() {
        assert_eq!(
            zone_for_address("West Campus, W 23rd St, Austin"),
            "West Campus"
        );
        assert_eq!(
            zone_for_address("University Campus, E 23rd St, Austin"),
            "University District"
        );
        assert_eq!(
            zone_for_address("Market District, W 6th St, Austin"),
            "Downtown Austin"
        );
        assert_eq!(
            zone_for_address("S IH-35 Service Rd, South Austin"),
            "South Austin"
        );
        assert_eq!(zone_for_address("Somewhere Else, TX"), "Other Austin");
    }

    #[tokio::test]
    async fn test_cache_hit_returns_same_dataset() {
        let cache = DatasetCache::new();
        let first = cache.load(SAMPLE_SOURCE).await.unwrap();
        let second = cache.load(SAMPLE_SOURCE).await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn test_cache_invalidate_forces_reload() {
        let cache = DatasetCache::new();
        let first = cache.load(SAMPLE_SOURCE).await.unwrap();
        cache.invalidate(SAMPLE_SOURCE);
        let second = cache.load(SAMPLE_SOURCE).await.unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(*first, *second);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_cached_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trips.csv");
        std::fs::write(&path, SAMPLE_CSV).unwrap();

        let source = path.to_string_lossy().to_string();
        let cache = DatasetCache::new();
        let first = cache.load(&source).await.unwrap();

        std::fs::remove_file(&path).unwrap();
        assert!(cache.refresh(&source).await.is_err());

        let still_cached = cache.get(&source).unwrap();
        assert!(Arc::ptr_eq(&first, &still_cached));
    }

    #[tokio::test]
    async fn test_refresh_replaces_cached_dataset() {
        let cache = DatasetCache::new();
        let first = cache.load(SAMPLE_SOURCE).await.unwrap();
        let second = cache.refresh(SAMPLE_SOURCE).await.unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(*first, *second);
    }

    #[tokio::test]
    async fn test_unreachable_source_is_unavailable() {
        let cache = DatasetCache::new();
        let err = cache.load("/no/such/file.csv").await.unwrap_err();
        assert!(matches!(err, Error::DataUnavailable(_)));
    }

    #[tokio::test]
    async fn test_insert_substitutes_fixed_dataset() {
        let cache = DatasetCache::new();
        let mut dataset = sample_dataset();
        dataset.source = "fixture".to_string();
        dataset.records.truncate(3);
        cache.insert(dataset);

        let loaded = cache.load("fixture").await.unwrap();
        assert_eq!(loaded.len(), 3);
    }
}
