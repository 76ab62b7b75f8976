/*
This crate is part of the riparian lakes analysis toolset.
License: MIT
*/

//! Field names and constants shared across the pipeline stages. These
//! follow the provincial VRI/FWA/BEC schema conventions.

pub const LAKE_CATEGORY_FIELD: &str = "BCLCS_LEVEL_5";
pub const LAKE_CATEGORY_VALUES: [&str; 2] = ["LA", "RE"];

pub const POLY_ID: &str = "WATERBODY_POLY_ID";
pub const WATERSHED_50K: &str = "WATERSHED_CODE_50K";
pub const GNIS_NAME: &str = "GNIS_NAME_1";
pub const LAKE_AREA: &str = "Lakes_Area_Ha";
pub const LAKE_PERIMETER: &str = "Lakes_Prmtr";
pub const INSIDE_X: &str = "INSIDE_X";
pub const INSIDE_Y: &str = "INSIDE_Y";
pub const BEC_LABEL: &str = "MAP_LABEL";
pub const BEC_ZONE_CODE: &str = "BEC_ZONE_CODE";
pub const AGE_CLASS: &str = "Age_Class";
pub const PROJ_AGE_CLASS: &str = "PROJ_AGE_CLASS_CD_1";

/// Synthetic identifiers for lakes missing a WATERBODY_POLY_ID start here.
pub const NULL_ID_REPLACE: i64 = 999_900_000;

/// Width, in map units, of the road corridor buffered around intersected
/// road segments when computing corridor area.
pub const ROAD_CORRIDOR_WIDTH: f64 = 3.0;

/// Fields retained on the lake collection after VRI extraction.
pub const EXTRACT_KEEP: [&str; 7] = [
    "FEATURE_ID",
    "INTERPRETATION_DATE",
    "PROJECT",
    "BEC_ZONE_CODE",
    "BEC_SUBZONE",
    "BEC_VARIANT",
    BEC_LABEL,
];

/// Allow-list applied to every join in the administrative attribute chain.
pub const JOIN_KEEP: [&str; 10] = [
    "FEATURE_ID",
    "INTERPRETATION_DATE",
    "PROJECT",
    "BEC_ZONE_CODE",
    "BEC_SUBZONE",
    "BEC_VARIANT",
    "TSA_NUMBER",
    "FOR_FL_ID",
    "OWNER_TYPE",
    BEC_LABEL,
];

/// PROJ_AGE_CLASS_CD_1 codes mapped to readable age categories.
pub fn age_class(code: &str) -> &'static str {
    match code {
        "1" => "1-20",
        "2" => "21-40",
        "3" => "41-60",
        "4" => "61-80",
        "5" => "81-100",
        "6" => "101-120",
        "7" => "121-140",
        "8" => "141-250",
        _ => "251+",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_age_class_table() {
        assert_eq!(age_class("1"), "1-20");
        assert_eq!(age_class("8"), "141-250");
        assert_eq!(age_class("9"), "251+");
        assert_eq!(age_class(""), "251+");
    }
}
