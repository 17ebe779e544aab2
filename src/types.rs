use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{value_i64, value_string};

/// One facility record from the source dataset. Field names follow the
/// published CIMC schema, so serialized records keep the upstream spelling.
/// The geometry is carried opaquely under `SHAPE`; this crate never
/// interprets it beyond reading the GeoJSON `type` tag.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "SCREAMING_SNAKE_CASE")]
pub(crate) struct FacilityRow {
    pub(crate) epa_program: Option<String>,
    pub(crate) region: Option<String>,
    pub(crate) handler_id: Option<String>,
    pub(crate) handler_name: Option<String>,
    pub(crate) fed_waste_generator: Option<String>,
    pub(crate) facility_info_url: Option<String>,
    pub(crate) regional_profile_url: Option<String>,
    pub(crate) location_street_no: Option<String>,
    pub(crate) location_street1: Option<String>,
    pub(crate) location_city: Option<String>,
    pub(crate) location_county: Option<String>,
    pub(crate) location_state: Option<String>,
    pub(crate) location_zip: Option<String>,
    pub(crate) facility_contact_name: Option<String>,
    pub(crate) facility_contact_tel: Option<String>,
    pub(crate) contact_email_address: Option<String>,
    pub(crate) contact_phone_and_ext: Option<String>,
    pub(crate) entire_facility_ind: Option<String>,
    pub(crate) area_name: Option<String>,
    pub(crate) area_name_description: Option<String>,
    pub(crate) cleared_public_release: Option<String>,
    pub(crate) gis_feature_last_change_date: Option<String>,
    pub(crate) data_collection_date: Option<String>,
    pub(crate) areaname_info_url_desc: Option<String>,
    pub(crate) tier_accuracy_code: Option<String>,
    pub(crate) event_seq: Option<i64>,
    pub(crate) event_code: Option<String>,
    pub(crate) actual_date: Option<String>,
    pub(crate) regional_supp_control_id: Option<String>,
    pub(crate) horizontal_acc_measure: Option<f64>,
    pub(crate) horizontal_coll_desc: Option<String>,
    pub(crate) tier_accuracy_desc: Option<String>,
    pub(crate) federal_facility: Option<String>,
    pub(crate) control_url: Option<String>,
    pub(crate) control_desc: Option<String>,
    pub(crate) horizontal_coll_code: Option<String>,
    pub(crate) site_area_acreage: Option<f64>,
    pub(crate) shape: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum GeometryKind {
    Point,
    Polygon,
    Other,
}

impl FacilityRow {
    /// Facility key used for lookups. Whitespace-only ids count as missing.
    pub(crate) fn key(&self) -> Option<&str> {
        self.handler_id
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }

    pub(crate) fn key_for_log(&self) -> &str {
        self.handler_id.as_deref().unwrap_or("(null)")
    }

    pub(crate) fn geometry_kind(&self) -> GeometryKind {
        match self
            .shape
            .as_ref()
            .and_then(|shape| shape.get("type"))
            .and_then(Value::as_str)
        {
            Some("Point") | Some("MultiPoint") => GeometryKind::Point,
            Some("Polygon") | Some("MultiPolygon") => GeometryKind::Polygon,
            _ => GeometryKind::Other,
        }
    }
}

/// One entry in a remote record's control event lists.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct ControlEvent {
    pub(crate) event_area: Option<String>,
    pub(crate) event_sequence: Option<i64>,
    pub(crate) event_code: Option<String>,
    pub(crate) event_date: Option<String>,
    pub(crate) facility_wide: Option<String>,
}

impl ControlEvent {
    /// Each field is read independently; a missing or oddly-typed field
    /// leaves that field unset without rejecting the event.
    pub(crate) fn from_value(value: &Value) -> Self {
        ControlEvent {
            event_area: value_string(value.get("EventArea")),
            event_sequence: value_i64(value.get("EventSequence")),
            event_code: value_string(value.get("EventCode")),
            event_date: value_string(value.get("EventDate")),
            facility_wide: value_string(value.get("FacilityWideIndicator")),
        }
    }
}

/// Parsed web service response for one facility key. Scalar attributes stay
/// as raw JSON and are read tolerantly at merge time; the six control event
/// lists are materialized up front in their service order.
#[derive(Debug, Clone, Default)]
pub(crate) struct RemoteRecord {
    pub(crate) attrs: Value,
    pub(crate) ic_ep: Vec<ControlEvent>,
    pub(crate) ic_pr: Vec<ControlEvent>,
    pub(crate) ic_gc: Vec<ControlEvent>,
    pub(crate) ic_id: Vec<ControlEvent>,
    pub(crate) ec_ng: Vec<ControlEvent>,
    pub(crate) ec_gw: Vec<ControlEvent>,
}

fn event_list(value: &Value, key: &str) -> Vec<ControlEvent> {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(|events| events.iter().map(ControlEvent::from_value).collect())
        .unwrap_or_default()
}

impl RemoteRecord {
    pub(crate) fn from_json(value: Value) -> Self {
        RemoteRecord {
            ic_ep: event_list(&value, "IC_EP"),
            ic_pr: event_list(&value, "IC_PR"),
            ic_gc: event_list(&value, "IC_GC"),
            ic_id: event_list(&value, "IC_ID"),
            ec_ng: event_list(&value, "EC_NG"),
            ec_gw: event_list(&value, "EC_GW"),
            attrs: value,
        }
    }

    /// All institutional controls as one list. Concatenation order is fixed
    /// (EP, PR, GC, ID) so output row order is deterministic.
    pub(crate) fn institutional(&self) -> Vec<&ControlEvent> {
        self.ic_ep
            .iter()
            .chain(&self.ic_pr)
            .chain(&self.ic_gc)
            .chain(&self.ic_id)
            .collect()
    }

    /// All engineering controls as one list, NG then GW.
    pub(crate) fn engineering(&self) -> Vec<&ControlEvent> {
        self.ec_ng.iter().chain(&self.ec_gw).collect()
    }

    pub(crate) fn has_no_events(&self) -> bool {
        self.ic_ep.is_empty()
            && self.ic_pr.is_empty()
            && self.ic_gc.is_empty()
            && self.ic_id.is_empty()
            && self.ec_ng.is_empty()
            && self.ec_gw.is_empty()
    }
}
