// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Conversion of provider payloads and search logs into our own records.

use crate::models::{Coords, SearchRecord, SearchResultCandidate};
use serde::Deserialize;
use serde_json::Value;

/// The provider returned something other than the documented shape.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MalformedPayload {
    #[error("payload has no `results` list")]
    MissingResults,

    #[error("result {index} has no `{field}`")]
    MissingField { index: usize, field: &'static str },
}

/// Convert a places-nearby payload into search result candidates.
///
/// One candidate per entry of `results`, in input order. `name`, `vicinity`
/// and `place_id` are required non-empty strings; the trail head location is
/// optional and dropped if it does not hold valid coordinates.
pub fn to_search_results(raw: &Value) -> Result<Vec<SearchResultCandidate>, MalformedPayload> {
    let results = raw
        .get("results")
        .and_then(Value::as_array)
        .ok_or(MalformedPayload::MissingResults)?;

    results
        .iter()
        .enumerate()
        .map(|(index, record)| {
            let field = |field: &'static str| {
                record
                    .get(field)
                    .and_then(Value::as_str)
                    .filter(|value| !value.is_empty())
                    .map(str::to_string)
                    .ok_or(MalformedPayload::MissingField { index, field })
            };

            Ok(SearchResultCandidate {
                name: field("name")?,
                address: field("vicinity")?,
                place_id: field("place_id")?,
                location: record
                    .pointer("/geometry/location")
                    .and_then(|location| Coords::deserialize(location).ok()),
            })
        })
        .collect()
}

/// Collapse consecutive repeats of the same search.
///
/// Record `i` is kept when it is the first record or when its
/// `(address, radius)` differs from record `i - 1` of the input. Repeats that
/// are separated by a different search are all kept.
pub fn dedupe_chronological(records: &[SearchRecord]) -> Vec<SearchRecord> {
    let mut kept = Vec::with_capacity(records.len());
    let mut previous: Option<&SearchRecord> = None;

    for record in records {
        if previous.map_or(true, |prev| !same_search(prev, record)) {
            kept.push(record.clone());
        }
        previous = Some(record);
    }

    kept
}

fn same_search(a: &SearchRecord, b: &SearchRecord) -> bool {
    a.address == b.address && a.radius == b.radius
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use proptest::prelude::*;
    use serde_json::json;

    fn record(id: i64, address: &str, radius: u32) -> SearchRecord {
        SearchRecord {
            id,
            user_id: 1,
            name: format!("Trail {}", id),
            address: address.to_string(),
            radius,
            place_id: format!("place_{}", id),
            timestamp: Utc::now(),
        }
    }

    fn pairs(records: &[SearchRecord]) -> Vec<(&str, u32)> {
        records
            .iter()
            .map(|r| (r.address.as_str(), r.radius))
            .collect()
    }

    #[test]
    fn test_to_search_results_preserves_order() {
        let payload = json!({
            "results": [
                {"name": "Loop Trail", "vicinity": "1 Park Rd", "place_id": "abc",
                 "geometry": {"location": {"lat": 42.1, "lng": -71.2}}},
                {"name": "Ridge Trail", "vicinity": "2 Hill St", "place_id": "def"}
            ],
            "status": "OK"
        });

        let results = to_search_results(&payload).unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].name, "Loop Trail");
        assert_eq!(results[0].address, "1 Park Rd");
        assert_eq!(results[0].place_id, "abc");
        assert_eq!(results[0].location, Some(Coords { lat: 42.1, lng: -71.2 }));
        assert_eq!(results[1].name, "Ridge Trail");
        assert_eq!(results[1].location, None);
    }

    #[test]
    fn test_to_search_results_empty() {
        let results = to_search_results(&json!({"results": [], "status": "ZERO_RESULTS"})).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_to_search_results_missing_results() {
        assert_eq!(
            to_search_results(&json!({"status": "OK"})).unwrap_err(),
            MalformedPayload::MissingResults
        );
        assert_eq!(
            to_search_results(&json!({"results": "nope"})).unwrap_err(),
            MalformedPayload::MissingResults
        );
    }

    #[test]
    fn test_to_search_results_missing_field() {
        let payload = json!({
            "results": [
                {"name": "Loop Trail", "vicinity": "1 Park Rd", "place_id": "abc"},
                {"name": "Ridge Trail", "place_id": "def"}
            ]
        });

        assert_eq!(
            to_search_results(&payload).unwrap_err(),
            MalformedPayload::MissingField {
                index: 1,
                field: "vicinity"
            }
        );
    }

    #[test]
    fn test_to_search_results_rejects_empty_and_non_string_fields() {
        let empty_name = json!({"results": [{"name": "", "vicinity": "x", "place_id": "p"}]});
        assert_eq!(
            to_search_results(&empty_name).unwrap_err(),
            MalformedPayload::MissingField { index: 0, field: "name" }
        );

        let numeric_place = json!({"results": [{"name": "n", "vicinity": "x", "place_id": 7}]});
        assert_eq!(
            to_search_results(&numeric_place).unwrap_err(),
            MalformedPayload::MissingField { index: 0, field: "place_id" }
        );
    }

    #[test]
    fn test_invalid_location_is_dropped() {
        let payload = json!({"results": [{
            "name": "n", "vicinity": "x", "place_id": "p",
            "geometry": {"location": {"lat": 123.0, "lng": 0.0}}
        }]});
        assert_eq!(to_search_results(&payload).unwrap()[0].location, None);
    }

    #[test]
    fn test_dedupe_collapses_adjacent_repeat() {
        let records = vec![record(1, "X", 5), record(2, "X", 5)];
        let kept = dedupe_chronological(&records);
        assert_eq!(pairs(&kept), vec![("X", 5)]);
        assert_eq!(kept[0].id, 1);
    }

    #[test]
    fn test_dedupe_keeps_non_adjacent_repeat() {
        let records = vec![record(1, "X", 5), record(2, "Y", 5), record(3, "X", 5)];
        let kept = dedupe_chronological(&records);
        assert_eq!(pairs(&kept), vec![("X", 5), ("Y", 5), ("X", 5)]);
    }

    #[test]
    fn test_dedupe_radius_distinguishes_searches() {
        let records = vec![record(1, "X", 5000), record(2, "X", 8000), record(3, "X", 8000)];
        let kept = dedupe_chronological(&records);
        assert_eq!(pairs(&kept), vec![("X", 5000), ("X", 8000)]);
    }

    #[test]
    fn test_dedupe_empty() {
        assert!(dedupe_chronological(&[]).is_empty());
    }

    fn arb_records() -> impl Strategy<Value = Vec<SearchRecord>> {
        // Few distinct values so that adjacent repeats are common.
        prop::collection::vec((0..3usize, 0..2usize), 0..40).prop_map(|choices| {
            choices
                .into_iter()
                .enumerate()
                .map(|(i, (a, r))| record(i as i64, ["A", "B", "C"][a], [5000, 8000][r]))
                .collect()
        })
    }

    proptest! {
        #[test]
        fn prop_dedupe_invariants(records in arb_records()) {
            let kept = dedupe_chronological(&records);

            prop_assert!(kept.len() <= records.len());
            if let Some(first) = records.first() {
                prop_assert_eq!(&kept[0], first);
            }
            for window in kept.windows(2) {
                prop_assert!(!same_search(&window[0], &window[1]));
            }
        }

        #[test]
        fn prop_dedupe_is_idempotent(records in arb_records()) {
            let once = dedupe_chronological(&records);
            let twice = dedupe_chronological(&once);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn prop_to_search_results_counts(n in 0..20usize) {
            let results: Vec<Value> = (0..n)
                .map(|i| json!({
                    "name": format!("Trail {}", i),
                    "vicinity": format!("{} Main St", i),
                    "place_id": format!("place_{}", i),
                }))
                .collect();

            let candidates = to_search_results(&json!({ "results": results })).unwrap();

            prop_assert_eq!(candidates.len(), n);
            for (i, candidate) in candidates.iter().enumerate() {
                prop_assert_eq!(&candidate.name, &format!("Trail {}", i));
                prop_assert!(!candidate.address.is_empty());
                prop_assert!(!candidate.place_id.is_empty());
            }
        }
    }
}
