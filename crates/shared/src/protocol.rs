use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::AccountId;

pub const DEFAULT_RADIUS_MILES: f64 = 50.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub account_id: AccountId,
    pub radius_miles: f64,
}

/// One row of a proximity search. The backend omits null fields, so every
/// field tolerates being missing or `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacilityResult {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub city: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub state: String,
    #[serde(default)]
    pub distance_miles: Option<f64>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractHoursRequest {
    pub account_id: AccountId,
}

/// One quarter of contract staffing hours. Any hour field may be missing or
/// `null` on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuarterlyStaffingRecord {
    pub quarter: String,
    #[serde(default)]
    pub cna_hours: Option<f64>,
    #[serde(default)]
    pub lpn_hours: Option<f64>,
    #[serde(default)]
    pub rn_hours: Option<f64>,
}

/// Backend list responses may be an array, an empty array, or `null`.
pub type FacilityResponse = Option<Vec<FacilityResult>>;
pub type StaffingResponse = Option<Vec<QuarterlyStaffingRecord>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_request_uses_camel_case_wire_names() {
        let req = SearchRequest {
            account_id: AccountId::new("001xx"),
            radius_miles: 25.0,
        };
        let json = serde_json::to_value(&req).expect("serialize");
        assert_eq!(json["accountId"], "001xx");
        assert_eq!(json["radiusMiles"], 25.0);
    }

    #[test]
    fn staffing_record_defaults_missing_and_null_hours() {
        let record: QuarterlyStaffingRecord =
            serde_json::from_str(r#"{"quarter":"2024Q1","cnaHours":12.5,"rnHours":null}"#)
                .expect("deserialize");
        assert_eq!(record.cna_hours, Some(12.5));
        assert_eq!(record.lpn_hours, None);
        assert_eq!(record.rn_hours, None);
    }

    #[test]
    fn facility_rows_tolerate_missing_and_null_fields() {
        let rows: Vec<FacilityResult> = serde_json::from_str(
            r#"[
                {"name":"A","state":"ST","distanceMiles":3.14},
                {"name":"B","city":null,"state":"ST"},
                {"name":"C","city":"Y","state":"ST","distanceMiles":1.0}
            ]"#,
        )
        .expect("deserialize");

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].city, "");
        assert_eq!(rows[0].distance_miles, Some(3.14));
        assert_eq!(rows[1].city, "");
        assert_eq!(rows[1].distance_miles, None);
        assert_eq!(rows[2].city, "Y");
    }
}
