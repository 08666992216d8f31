//! Trip aggregation
//!
//! Pure functions over a [`TripDataset`]. Output is deterministic for a
//! given dataset: counts live in fixed arrays or `BTreeMap`s and every
//! ranking has a defined tie-break.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::{GroupSizeBucket, TripDataset};

/// Descriptive aggregates derived from a trip dataset
///
/// An empty dataset produces all-zero aggregates, never an error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TripAggregates {
    pub total_trips: u64,
    pub total_passengers: u64,
    /// Mean passengers per trip, 0.0 for an empty dataset
    pub avg_group_size: f64,
    /// Trip count per hour of day (index 0-23)
    pub hourly: [u64; 24],
    /// Hour with the most trips; ties resolve to the lowest hour.
    /// `None` for an empty dataset.
    pub peak_hour: Option<u8>,
    /// Trip count per fixed group-size bucket (1, 2-4, 5-8, 9+)
    pub group_sizes: [u64; 4],
    /// Modal raw passenger count; ties resolve to the smallest count
    pub most_common_group_size: Option<u32>,
    /// Trip count per distinct pickup address
    pub pickup_counts: BTreeMap<String, u64>,
    /// Trip count per distinct dropoff address
    pub dropoff_counts: BTreeMap<String, u64>,
    /// Trip count per pickup zone
    pub zone_counts: BTreeMap<String, u64>,
    /// Trip count per dropoff zone
    pub dropoff_zone_counts: BTreeMap<String, u64>,
}

impl TripAggregates {
    fn empty() -> Self {
        Self {
            total_trips: 0,
            total_passengers: 0,
            avg_group_size: 0.0,
            hourly: [0; 24],
            peak_hour: None,
            group_sizes: [0; 4],
            most_common_group_size: None,
            pickup_counts: BTreeMap::new(),
            dropoff_counts: BTreeMap::new(),
            zone_counts: BTreeMap::new(),
            dropoff_zone_counts: BTreeMap::new(),
        }
    }

    /// Trip count at the peak hour, 0 for an empty dataset
    pub fn peak_hour_count(&self) -> u64 {
        self.peak_hour
            .map(|h| self.hourly[h as usize])
            .unwrap_or(0)
    }

    /// Bucket with the most trips; ties resolve to the smaller bucket
    pub fn dominant_bucket(&self) -> Option<GroupSizeBucket> {
        if self.total_trips == 0 {
            return None;
        }
        GroupSizeBucket::all()
            .iter()
            .copied()
            .max_by_key(|b| (self.group_sizes[b.index()], std::cmp::Reverse(b.index())))
    }

    /// Top-N pickup addresses by count descending, lexicographic tie-break
    pub fn top_pickups(&self, n: usize) -> Vec<(String, u64)> {
        top_n(&self.pickup_counts, n)
    }

    /// Top-N dropoff addresses by count descending, lexicographic tie-break
    pub fn top_dropoffs(&self, n: usize) -> Vec<(String, u64)> {
        top_n(&self.dropoff_counts, n)
    }

    /// Top-N pickup zones by count descending, lexicographic tie-break
    pub fn top_zones(&self, n: usize) -> Vec<(String, u64)> {
        top_n(&self.zone_counts, n)
    }

    /// Top-N dropoff zones by count descending, lexicographic tie-break
    pub fn top_dropoff_zones(&self, n: usize) -> Vec<(String, u64)> {
        top_n(&self.dropoff_zone_counts, n)
    }
}

/// Compute all aggregates for a dataset
pub fn aggregate(dataset: &TripDataset) -> TripAggregates {
    if dataset.is_empty() {
        return TripAggregates::empty();
    }

    let mut agg = TripAggregates::empty();
    let mut size_counts: BTreeMap<u32, u64> = BTreeMap::new();

    for trip in &dataset.records {
        agg.total_trips += 1;
        agg.total_passengers += u64::from(trip.passengers);
        agg.hourly[trip.pickup_hour() as usize] += 1;
        agg.group_sizes[GroupSizeBucket::for_passengers(trip.passengers).index()] += 1;
        *size_counts.entry(trip.passengers).or_default() += 1;
        *agg.pickup_counts
            .entry(trip.pickup.address.clone())
            .or_default() += 1;
        *agg.dropoff_counts
            .entry(trip.dropoff.address.clone())
            .or_default() += 1;
        *agg.zone_counts.entry(trip.pickup_zone.clone()).or_default() += 1;
        *agg.dropoff_zone_counts
            .entry(trip.dropoff_zone.clone())
            .or_default() += 1;
    }

    agg.avg_group_size = agg.total_passengers as f64 / agg.total_trips as f64;

    // Lowest hour wins ties because the scan runs 0..24 and only a
    // strictly greater count replaces the current peak
    let mut peak = 0usize;
    for hour in 1..24 {
        if agg.hourly[hour] > agg.hourly[peak] {
            peak = hour;
        }
    }
    agg.peak_hour = Some(peak as u8);

    // BTreeMap iterates smallest size first, so ties keep the smaller size
    agg.most_common_group_size = size_counts
        .iter()
        .max_by_key(|(size, count)| (**count, std::cmp::Reverse(**size)))
        .map(|(size, _)| *size);

    agg
}

/// Rank a count map: count descending, then name ascending, length <= n
fn top_n(counts: &BTreeMap<String, u64>, n: usize) -> Vec<(String, u64)> {
    let mut ranked: Vec<(String, u64)> = counts
        .iter()
        .map(|(name, count)| (name.clone(), *count))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(n);
    ranked
}

/// A ranked location entry for API responses
#[derive(Debug, Clone, Serialize)]
pub struct RankedLocation {
    pub name: String,
    pub count: u64,
}

impl From<(String, u64)> for RankedLocation {
    fn from((name, count): (String, u64)) -> Self {
        Self { name, count }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::sample_dataset;
    use crate::models::{Location, TripDataset, TripRecord};
    use chrono::NaiveDate;

    fn trip(id: i64, hour: u32, passengers: u32, pickup: &str, dropoff: &str) -> TripRecord {
        let timestamp = NaiveDate::from_ymd_opt(2025, 9, 7)
            .unwrap()
            .and_hms_opt(hour, 30, 0)
            .unwrap();
        TripRecord {
            trip_id: id,
            booking_user_id: None,
            timestamp,
            pickup: Location {
                address: pickup.to_string(),
                lat: 30.28,
                lng: -97.74,
            },
            dropoff: Location {
                address: dropoff.to_string(),
                lat: 30.26,
                lng: -97.73,
            },
            pickup_zone: crate::dataset::zone_for_address(pickup).to_string(),
            dropoff_zone: crate::dataset::zone_for_address(dropoff).to_string(),
            passengers,
        }
    }

    fn dataset(records: Vec<TripRecord>) -> TripDataset {
        TripDataset {
            source: "test".to_string(),
            records,
            skipped: 0,
        }
    }

    #[test]
    fn test_empty_dataset_all_zero() {
        let agg = aggregate(&dataset(vec![]));
        assert_eq!(agg.total_trips, 0);
        assert_eq!(agg.hourly, [0; 24]);
        assert_eq!(agg.group_sizes, [0; 4]);
        assert_eq!(agg.peak_hour, None);
        assert_eq!(agg.most_common_group_size, None);
        assert!(agg.top_pickups(5).is_empty());
    }

    #[test]
    fn test_reference_scenario() {
        // 3 trips at hours {10, 10, 23} with group sizes {2, 6, 9}
        let agg = aggregate(&dataset(vec![
            trip(1, 10, 2, "A St", "B St"),
            trip(2, 10, 6, "A St", "C St"),
            trip(3, 23, 9, "D St", "B St"),
        ]));

        assert_eq!(agg.hourly[10], 2);
        assert_eq!(agg.hourly[23], 1);
        assert_eq!(agg.peak_hour, Some(10));
        assert_eq!(agg.group_sizes, [0, 1, 1, 1]);
        assert_eq!(agg.total_trips, 3);
        assert_eq!(agg.total_passengers, 17);
    }

    #[test]
    fn test_hourly_sums_to_row_count() {
        let dataset = sample_dataset();
        let agg = aggregate(&dataset);
        let hourly_sum: u64 = agg.hourly.iter().sum();
        assert_eq!(hourly_sum, dataset.len() as u64);
        assert_eq!(agg.total_trips, dataset.len() as u64);
    }

    #[test]
    fn test_peak_hour_tie_breaks_low() {
        let agg = aggregate(&dataset(vec![
            trip(1, 9, 2, "A St", "B St"),
            trip(2, 21, 2, "A St", "B St"),
        ]));
        assert_eq!(agg.peak_hour, Some(9));
    }

    #[test]
    fn test_top_n_sorted_with_lexicographic_ties() {
        let agg = aggregate(&dataset(vec![
            trip(1, 10, 2, "Charlie St", "X"),
            trip(2, 11, 2, "Charlie St", "X"),
            trip(3, 12, 2, "Bravo St", "X"),
            trip(4, 13, 2, "Alpha St", "X"),
        ]));

        let top = agg.top_pickups(3);
        assert_eq!(top.len(), 3);
        assert_eq!(top[0], ("Charlie St".to_string(), 2));
        // Bravo and Alpha tie at 1: lexicographic order
        assert_eq!(top[1], ("Alpha St".to_string(), 1));
        assert_eq!(top[2], ("Bravo St".to_string(), 1));

        // Length caps at n
        assert_eq!(agg.top_pickups(2).len(), 2);
    }

    #[test]
    fn test_dropoff_zones_counted_separately_from_pickups() {
        let agg = aggregate(&dataset(vec![
            trip(1, 10, 2, "W 23rd St", "E 6th St Downtown"),
            trip(2, 11, 3, "W 23rd St", "E 6th St Downtown"),
            trip(3, 12, 4, "South Congress Ave", "W 23rd St"),
        ]));

        assert_eq!(agg.zone_counts.get("West Campus"), Some(&2));
        assert_eq!(agg.dropoff_zone_counts.get("Downtown Austin"), Some(&2));
        assert_eq!(agg.dropoff_zone_counts.get("West Campus"), Some(&1));

        let top = agg.top_dropoff_zones(1);
        assert_eq!(top[0], ("Downtown Austin".to_string(), 2));

        let dropoff_sum: u64 = agg.dropoff_zone_counts.values().sum();
        assert_eq!(dropoff_sum, agg.total_trips);
    }

    #[test]
    fn test_most_common_group_size_tie_breaks_small() {
        let agg = aggregate(&dataset(vec![
            trip(1, 10, 8, "A", "B"),
            trip(2, 11, 8, "A", "B"),
            trip(3, 12, 3, "A", "B"),
            trip(4, 13, 3, "A", "B"),
        ]));
        assert_eq!(agg.most_common_group_size, Some(3));
    }

    #[test]
    fn test_deterministic_for_fixed_dataset() {
        let dataset = sample_dataset();
        let first = aggregate(&dataset);
        let second = aggregate(&dataset);
        assert_eq!(first, second);

        // And byte-identical once serialized
        let a = serde_json::to_vec(&first).unwrap();
        let b = serde_json::to_vec(&second).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_sample_aggregates() {
        let agg = aggregate(&sample_dataset());
        assert_eq!(agg.total_trips, 15);
        // Sample peaks at 21:00 with eight trips
        assert_eq!(agg.peak_hour, Some(21));
        assert_eq!(agg.peak_hour_count(), 8);
        // All sample groups have 5+ passengers
        assert_eq!(agg.group_sizes[0], 0);
        assert_eq!(agg.group_sizes[1], 0);
        // West Campus repeats four times in the pickups
        let top = agg.top_pickups(1);
        assert_eq!(top[0].1, 4);
    }
}
