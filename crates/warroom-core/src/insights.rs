//! Insight formatting
//!
//! Turns [`TripAggregates`] into short human-readable findings for the
//! dashboard and CLI. Formatting only; all numbers come from the
//! aggregates unchanged.

use crate::models::GroupSizeBucket;
use crate::stats::TripAggregates;

/// Insight shown when the dataset produced no usable rows
pub const NO_DATA_INSIGHT: &str = "No trip data available yet. Connect a data source to see live insights.";

fn format_hour(hour: u8) -> String {
    match hour {
        0 => "12AM".to_string(),
        1..=11 => format!("{}AM", hour),
        12 => "12PM".to_string(),
        _ => format!("{}PM", hour - 12),
    }
}

fn percent(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 * 100.0 / whole as f64
    }
}

/// Build the headline insight list for a set of aggregates
///
/// Always returns at least one entry; an empty dataset yields the
/// no-data insight alone.
pub fn summarize(agg: &TripAggregates) -> Vec<String> {
    if agg.total_trips == 0 {
        return vec![NO_DATA_INSIGHT.to_string()];
    }

    let mut insights = Vec::new();

    insights.push(format!(
        "{} trips moved {} riders at an average group size of {:.1}.",
        agg.total_trips, agg.total_passengers, agg.avg_group_size
    ));

    if let Some(peak) = agg.peak_hour {
        insights.push(format!(
            "{} is the peak hour with {} trips ({:.0}% of all rides).",
            format_hour(peak),
            agg.peak_hour_count(),
            percent(agg.peak_hour_count(), agg.total_trips)
        ));
    }

    // Evening window the fleet cares about most
    let evening: u64 = agg.hourly[20..24].iter().sum();
    if evening > 0 {
        insights.push(format!(
            "The 8PM-midnight window generates {:.0}% of trips.",
            percent(evening, agg.total_trips)
        ));
    }

    if let Some(bucket) = agg.dominant_bucket() {
        let count = agg.group_sizes[bucket.index()];
        insights.push(format!(
            "Groups of {} riders dominate with {:.0}% of bookings.",
            bucket.label(),
            percent(count, agg.total_trips)
        ));
    }

    if let Some((address, count)) = agg.top_pickups(1).into_iter().next() {
        insights.push(format!(
            "Busiest pickup: {} with {} trips.",
            address, count
        ));
    }

    if let Some((address, count)) = agg.top_dropoffs(1).into_iter().next() {
        insights.push(format!(
            "Busiest dropoff: {} with {} trips.",
            address, count
        ));
    }

    if let Some((zone, count)) = agg.top_zones(1).into_iter().next() {
        insights.push(format!(
            "{} leads demand by zone with {} pickups ({:.0}%).",
            zone,
            count,
            percent(count, agg.total_trips)
        ));
    }

    insights
}

/// Multi-line operator briefing combining the insight list
pub fn briefing(agg: &TripAggregates) -> String {
    let mut out = String::from("AUSTIN MOBILITY BRIEFING\n");
    for insight in summarize(agg) {
        out.push_str("  - ");
        out.push_str(&insight);
        out.push('\n');
    }
    if agg.total_trips > 0 {
        let large = agg.group_sizes[GroupSizeBucket::Large.index()]
            + agg.group_sizes[GroupSizeBucket::ExtraLarge.index()];
        let share = percent(large, agg.total_trips);
        if share >= 50.0 {
            out.push_str(&format!(
                "  - {:.0}% of trips carry 5+ riders. Keep high-capacity vehicles staged.\n",
                share
            ));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::sample_dataset;
    use crate::stats::aggregate;

    #[test]
    fn test_empty_aggregates_yield_no_data_insight() {
        let agg = aggregate(&crate::models::TripDataset {
            source: "test".to_string(),
            records: vec![],
            skipped: 0,
        });
        let insights = summarize(&agg);
        assert_eq!(insights, vec![NO_DATA_INSIGHT.to_string()]);
    }

    #[test]
    fn test_sample_insights_mention_peak_hour() {
        let agg = aggregate(&sample_dataset());
        let insights = summarize(&agg);
        assert!(insights.len() >= 4);
        assert!(insights.iter().any(|i| i.contains("9PM")));
    }

    #[test]
    fn test_insights_are_deterministic() {
        let agg = aggregate(&sample_dataset());
        assert_eq!(summarize(&agg), summarize(&agg));
    }

    #[test]
    fn test_briefing_contains_all_insights() {
        let agg = aggregate(&sample_dataset());
        let brief = briefing(&agg);
        for insight in summarize(&agg) {
            assert!(brief.contains(&insight));
        }
    }

    #[test]
    fn test_format_hour() {
        assert_eq!(format_hour(0), "12AM");
        assert_eq!(format_hour(9), "9AM");
        assert_eq!(format_hour(12), "12PM");
        assert_eq!(format_hour(21), "9PM");
    }
}
