use serde_json::Value;

use crate::{FacilityRow, GeometryKind, RemoteRecord, value_f64, value_string};

/// Copy service attributes onto a row. Each copy stands alone: a missing or
/// oddly-typed source field leaves the destination at its prior value and
/// the rest of the table still applies.
///
/// `SITE_AREA_ACREAGE` is only populated for point geometries; polygon
/// acreage is computed downstream from the geometry itself.
pub(crate) fn merge_attributes(row: &mut FacilityRow, record: &RemoteRecord) {
    let attrs = &record.attrs;
    copy_string(&mut row.region, attrs, "REGION");
    copy_string(&mut row.handler_name, attrs, "HANDLER_NAME");
    copy_string(&mut row.location_street1, attrs, "LOCATION_STREET");
    copy_string(&mut row.location_city, attrs, "LOCATION_CITY");
    copy_string(&mut row.location_county, attrs, "LOCATION_COUNTY_NAME");
    copy_string(&mut row.location_state, attrs, "LOCATION_STATE");
    copy_string(&mut row.location_zip, attrs, "LOCATION_ZIP");
    copy_string(&mut row.facility_contact_name, attrs, "CONTACT_NAME");
    copy_string(&mut row.facility_contact_tel, attrs, "CONTACT_PHONE");
    copy_string(&mut row.contact_email_address, attrs, "CONTACT_EMAIL_ADDRESS");
    copy_string(&mut row.contact_phone_and_ext, attrs, "CONTACT_PHONE");
    if row.geometry_kind() == GeometryKind::Point {
        if let Some(acres) = value_f64(attrs.get("AREA_ACREAGE")) {
            row.site_area_acreage = Some(acres);
        }
    }
    copy_string(&mut row.fed_waste_generator, attrs, "FED_WASTE_GENERATOR_CODE");
}

fn copy_string(dst: &mut Option<String>, attrs: &Value, key: &str) {
    if let Some(value) = value_string(attrs.get(key)) {
        *dst = Some(value);
    }
}
