use crate::{ControlEvent, FacilityRow, RemoteRecord};

/// Result of running one row against a record's control event lists.
/// `rows` holds one overlay copy per matching event, institutional matches
/// first, in list order.
#[derive(Debug, Default)]
pub(crate) struct MatchOutcome {
    pub(crate) rows: Vec<FacilityRow>,
    pub(crate) matched_institutional: bool,
    pub(crate) matched_engineering: bool,
    pub(crate) institutional_matches: usize,
    pub(crate) engineering_matches: usize,
}

/// Evaluate the row's sub-area against both combined event lists. Every
/// matching event yields its own output copy; there is no best-match
/// selection and no dedup between the institutional and engineering sides.
pub(crate) fn match_controls(row: &mut FacilityRow, record: &RemoteRecord) -> MatchOutcome {
    let mut outcome = MatchOutcome::default();
    for event in record.institutional() {
        if area_matches(row, event) {
            outcome.matched_institutional = true;
            outcome.institutional_matches += 1;
            overlay_event(row, event);
            outcome.rows.push(row.clone());
        }
    }
    for event in record.engineering() {
        if area_matches(row, event) {
            outcome.matched_engineering = true;
            outcome.engineering_matches += 1;
            overlay_event(row, event);
            outcome.rows.push(row.clone());
        }
    }
    outcome
}

/// Exact string match. A missing area on either side never matches.
fn area_matches(row: &FacilityRow, event: &ControlEvent) -> bool {
    match (&row.area_name, &event.event_area) {
        (Some(area), Some(event_area)) => area == event_area,
        _ => false,
    }
}

/// Superimpose one event's fields onto the row. A field the event does not
/// carry keeps its current value.
fn overlay_event(row: &mut FacilityRow, event: &ControlEvent) {
    if let Some(seq) = event.event_sequence {
        row.event_seq = Some(seq);
    }
    if let Some(code) = &event.event_code {
        row.event_code = Some(code.clone());
    }
    if let Some(date) = &event.event_date {
        row.actual_date = Some(date.clone());
    }
    if let Some(flag) = &event.facility_wide {
        row.entire_facility_ind = Some(flag.clone());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PassReason {
    /// The service has no events at all for this key.
    NoControls,
    /// The row carries no sub-area name, so area-scoped events cannot apply.
    NoAreaName,
    /// A sub-area is present but no event references it. Usually an extra
    /// geometry the regions digitized that the service does not track.
    UnmatchedArea,
}

/// Decide whether the row still needs an unchanged passthrough copy after
/// matching. First applicable rule wins; a row with at least one match gets
/// nothing beyond its overlay copies.
pub(crate) fn decide_passthrough(
    row: &FacilityRow,
    record: &RemoteRecord,
    outcome: &MatchOutcome,
) -> Option<PassReason> {
    if record.has_no_events() {
        return Some(PassReason::NoControls);
    }
    if row.area_name.is_none() {
        return Some(PassReason::NoAreaName);
    }
    if !outcome.matched_institutional && !outcome.matched_engineering {
        return Some(PassReason::UnmatchedArea);
    }
    None
}
