use std::io::{self, Write};

use crate::{
    FacilityRow, LookupCache, PassReason, RunSummary, SiteLookup, decide_passthrough,
    match_controls, merge_attributes,
};

#[derive(Debug, Default, Clone)]
pub(crate) struct RunStats {
    pub(crate) rows_in: usize,
    pub(crate) rows_out: usize,
    pub(crate) institutional_rows: usize,
    pub(crate) engineering_rows: usize,
    pub(crate) passthrough_rows: usize,
    pub(crate) unenriched_rows: usize,
    pub(crate) failed_keys: usize,
}

/// The sequential enrichment pass: resolve each row's remote record, merge
/// attributes, expand control event matches, and log every row's fate.
/// Every input row contributes at least one output row; a failed or missing
/// key sends the row through untouched.
pub(crate) fn enrich_rows<W: Write>(
    mut rows: Vec<FacilityRow>,
    lookup: &dyn SiteLookup,
    summary: &mut RunSummary<W>,
) -> io::Result<(Vec<FacilityRow>, Vec<String>, RunStats)> {
    // Same ordering the source cursor uses. The sort is stable, so rows
    // sharing a key keep their relative order and share one fetch.
    rows.sort_by(|a, b| a.handler_id.cmp(&b.handler_id));

    let mut cache = LookupCache::new();
    let mut out: Vec<FacilityRow> = Vec::with_capacity(rows.len());
    let mut stats = RunStats {
        rows_in: rows.len(),
        ..RunStats::default()
    };

    eprintln!("Populating records with data from the web service...");
    for mut row in rows {
        let Some(record) = cache.resolve(row.key(), lookup) else {
            // nothing retrieved; the record still goes to the output untouched
            summary.lookup_failed(row.key_for_log())?;
            stats.unenriched_rows += 1;
            out.push(row);
            continue;
        };

        merge_attributes(&mut row, record);

        let outcome = match_controls(&mut row, record);
        for _ in 0..outcome.institutional_matches {
            summary.institutional_control(row.key_for_log())?;
        }
        for _ in 0..outcome.engineering_matches {
            summary.engineering_control(row.key_for_log())?;
        }
        stats.institutional_rows += outcome.institutional_matches;
        stats.engineering_rows += outcome.engineering_matches;

        let reason = decide_passthrough(&row, record, &outcome);
        out.extend(outcome.rows);
        if let Some(reason) = reason {
            match reason {
                PassReason::NoControls => summary.no_controls(row.key_for_log())?,
                PassReason::NoAreaName => summary.no_area_name(row.key_for_log())?,
                PassReason::UnmatchedArea => summary.unmatched_area(row.key_for_log())?,
            }
            stats.passthrough_rows += 1;
            out.push(row);
        }
    }

    stats.rows_out = out.len();
    let bad_sites = cache.bad_sites().to_vec();
    stats.failed_keys = bad_sites.len();
    Ok((out, bad_sites, stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LookupError, RemoteRecord};
    use serde_json::{Value, json};
    use std::cell::Cell;
    use std::collections::HashMap;

    struct MapLookup {
        records: HashMap<String, Value>,
        calls: Cell<usize>,
    }

    impl MapLookup {
        fn new(entries: Vec<(&str, Value)>) -> Self {
            MapLookup {
                records: entries
                    .into_iter()
                    .map(|(k, v)| (k.to_string(), v))
                    .collect(),
                calls: Cell::new(0),
            }
        }
    }

    impl SiteLookup for MapLookup {
        fn fetch(&self, key: &str) -> Result<RemoteRecord, LookupError> {
            self.calls.set(self.calls.get() + 1);
            self.records
                .get(key)
                .cloned()
                .map(RemoteRecord::from_json)
                .ok_or_else(|| LookupError::Http(404, "no data".to_string()))
        }
    }

    fn row(key: Option<&str>, area: Option<&str>) -> FacilityRow {
        FacilityRow {
            handler_id: key.map(str::to_string),
            area_name: area.map(str::to_string),
            ..FacilityRow::default()
        }
    }

    fn run(
        rows: Vec<FacilityRow>,
        lookup: &MapLookup,
    ) -> (Vec<FacilityRow>, Vec<String>, RunStats, String) {
        let mut buf = Vec::new();
        let mut summary = RunSummary::new(&mut buf).unwrap();
        let (out, bad, stats) = enrich_rows(rows, lookup, &mut summary).unwrap();
        summary.finish(&bad).unwrap();
        (out, bad, stats, String::from_utf8(buf).unwrap())
    }

    #[test]
    fn test_four_site_scenario() {
        let lookup = MapLookup::new(vec![
            // A: two institutional events, but the row has no sub-area
            (
                "A",
                json!({
                    "IC_EP": [{"EventArea": "X", "EventCode": "DEED"}],
                    "IC_PR": [{"EventArea": "Y", "EventCode": "PERMIT"}]
                }),
            ),
            // B: institutional event for the row's sub-area, engineering
            // event for a different one
            (
                "B",
                json!({
                    "HANDLER_NAME": "Bravo Works",
                    "IC_EP": [{"EventArea": "X", "EventSequence": 1, "EventCode": "DEED", "EventDate": "01/02/2015", "FacilityWideIndicator": "N"}],
                    "EC_NG": [{"EventArea": "Y", "EventSequence": 2, "EventCode": "CAP"}]
                }),
            ),
            // C: record exists but carries no events at all
            ("C", json!({"HANDLER_NAME": "Charlie Yard"})),
            // D: absent from the service entirely
        ]);

        let rows = vec![
            row(Some("A"), None),
            row(Some("B"), Some("X")),
            row(Some("C"), Some("whatever")),
            row(Some("D"), Some("Z")),
        ];
        let (out, bad, stats, log) = run(rows, &lookup);

        assert_eq!(out.len(), 4);
        assert_eq!(stats.rows_in, 4);
        assert_eq!(stats.rows_out, 4);

        // A: sub-area-null passthrough, untouched by any overlay
        assert_eq!(out[0].handler_id.as_deref(), Some("A"));
        assert_eq!(out[0].event_code, None);
        // B: exactly the institutional overlay, no passthrough copy
        assert_eq!(out[1].handler_id.as_deref(), Some("B"));
        assert_eq!(out[1].event_code.as_deref(), Some("DEED"));
        assert_eq!(out[1].event_seq, Some(1));
        assert_eq!(out[1].handler_name.as_deref(), Some("Bravo Works"));
        // C: merged but otherwise unchanged
        assert_eq!(out[2].handler_id.as_deref(), Some("C"));
        assert_eq!(out[2].handler_name.as_deref(), Some("Charlie Yard"));
        assert_eq!(out[2].event_code, None);
        // D: passed through unenriched
        assert_eq!(out[3].handler_id.as_deref(), Some("D"));
        assert_eq!(out[3].handler_name, None);

        assert_eq!(bad, ["D"]);
        assert_eq!(stats.institutional_rows, 1);
        assert_eq!(stats.engineering_rows, 0);
        assert_eq!(stats.passthrough_rows, 2);
        assert_eq!(stats.unenriched_rows, 1);

        assert!(log.contains("Site A has no AREA NAME value."));
        assert!(log.contains("Site B is an institutional control."));
        assert!(log.contains("Site C has no controls."));
        assert!(log.contains("Site D not found in the RCRAInfo web service."));
        assert!(log.contains("There were 1 EPA IDs that were not successful:\nD\n"));
    }

    #[test]
    fn test_matched_rows_expand_without_passthrough() {
        let lookup = MapLookup::new(vec![(
            "E",
            json!({
                "IC_EP": [
                    {"EventArea": "U", "EventSequence": 1, "EventCode": "A1"},
                    {"EventArea": "U", "EventSequence": 2, "EventCode": "A2"}
                ],
                "EC_GW": [{"EventArea": "U", "EventSequence": 3, "EventCode": "B1"}]
            }),
        )]);
        let (out, bad, stats, log) = run(vec![row(Some("E"), Some("U"))], &lookup);

        // M + N matches produce exactly M + N rows
        assert_eq!(out.len(), 3);
        let codes: Vec<_> = out.iter().map(|r| r.event_code.as_deref().unwrap()).collect();
        assert_eq!(codes, ["A1", "A2", "B1"]);
        assert!(bad.is_empty());
        assert_eq!(stats.passthrough_rows, 0);
        assert_eq!(
            log.matches("Site E is an institutional control.").count(),
            2
        );
        assert_eq!(log.matches("Site E is an engineering control.").count(), 1);
        assert!(!log.contains("does not match controls"));
    }

    #[test]
    fn test_unmatched_area_passes_through_merged_row() {
        let lookup = MapLookup::new(vec![(
            "F",
            json!({
                "HANDLER_NAME": "Foxtrot",
                "IC_GC": [{"EventArea": "Other Unit", "EventCode": "DEED"}]
            }),
        )]);
        let (out, _, stats, log) = run(vec![row(Some("F"), Some("Unit 1"))], &lookup);

        assert_eq!(out.len(), 1);
        let mut expected = row(Some("F"), Some("Unit 1"));
        expected.handler_name = Some("Foxtrot".to_string());
        assert_eq!(out[0], expected);
        assert_eq!(stats.passthrough_rows, 1);
        assert!(log.contains(
            "Site F has an AREA NAME value but it does not match controls in the service."
        ));
    }

    #[test]
    fn test_consecutive_rows_share_fetch_and_expand_independently() {
        let lookup = MapLookup::new(vec![(
            "G",
            json!({
                "IC_EP": [{"EventArea": "U1", "EventCode": "DEED"}]
            }),
        )]);
        let rows = vec![
            row(Some("G"), Some("U1")),
            row(Some("G"), Some("U2")),
            row(Some("G"), Some("U1")),
        ];
        let (out, _, _, log) = run(rows, &lookup);

        assert_eq!(lookup.calls.get(), 1);
        // two matching rows overlay, the U2 row passes through
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].event_code.as_deref(), Some("DEED"));
        assert_eq!(out[1].event_code, None);
        assert_eq!(out[2].event_code.as_deref(), Some("DEED"));
        assert_eq!(log.matches("Site G is an institutional control.").count(), 2);
    }

    #[test]
    fn test_rows_are_processed_in_key_order() {
        let lookup = MapLookup::new(vec![
            ("H1", json!({})),
            ("H2", json!({})),
        ]);
        let rows = vec![
            row(Some("H2"), None),
            row(Some("H1"), None),
            row(None, None),
        ];
        let (out, bad, _, _) = run(rows, &lookup);

        // null keys sort first, then ascending key order
        assert_eq!(out[0].handler_id, None);
        assert_eq!(out[1].handler_id.as_deref(), Some("H1"));
        assert_eq!(out[2].handler_id.as_deref(), Some("H2"));
        // the null-key row passes through without joining the failure list
        assert_eq!(out.len(), 3);
        assert!(bad.is_empty());
    }

    #[test]
    fn test_every_failed_row_gets_a_log_line_but_one_listing() {
        let lookup = MapLookup::new(vec![]);
        let rows = vec![row(Some("J"), None), row(Some("J"), Some("U"))];
        let (out, bad, stats, log) = run(rows, &lookup);

        assert_eq!(out.len(), 2);
        assert_eq!(lookup.calls.get(), 1);
        assert_eq!(bad, ["J"]);
        assert_eq!(stats.unenriched_rows, 2);
        // one line per row, one listing entry per key
        assert_eq!(
            log.matches("Site J not found in the RCRAInfo web service.").count(),
            1 + 1
        );
        assert!(log.contains("There were 1 EPA IDs that were not successful:\nJ\n"));
    }
}
