/*
This crate is part of the riparian lakes analysis toolset.
License: MIT
*/

//! End-to-end pipeline run over a small synthetic landscape: a 100 m x
//! 100 m study area on a 10 m grid, two lakes sitting in two valleys that
//! drain south, and three BEC zones. The western watershed straddles two
//! zones, the eastern one sits in a single zone.

use std::fs;
use std::path::Path;

use riparian_analysis::args::RunParameters;
use riparian_analysis::pipeline;
use riparian_raster::{Raster, RasterConfigs};
use riparian_vector::geojson_io::{read_feature_collection, write_feature_collection};
use riparian_vector::{
    AttributeField, FeatureCollection, FieldData, FieldDataType, Geometry, Point2D, Polygon,
    Polyline,
};

fn text(value: &str) -> FieldData {
    FieldData::Text(value.to_string())
}

fn write_layer(dir: &Path, name: &str, fc: &FeatureCollection) -> String {
    let path = dir.join(name);
    write_feature_collection(&path, fc).unwrap();
    path.to_string_lossy().to_string()
}

fn aoi_layer() -> FeatureCollection {
    let mut fc = FeatureCollection::new(vec![AttributeField::new(
        "REGION_NAME",
        FieldDataType::Text,
    )]);
    fc.push(
        Geometry::Polygon(Polygon::rectangle(0.0, 0.0, 100.0, 100.0)),
        vec![text("Omineca")],
    );
    fc.push(
        Geometry::Polygon(Polygon::rectangle(200.0, 200.0, 300.0, 300.0)),
        vec![text("Skeena")],
    );
    fc
}

fn vri_layer() -> FeatureCollection {
    let fields = vec![
        AttributeField::new("FEATURE_ID", FieldDataType::Int),
        AttributeField::new("INTERPRETATION_DATE", FieldDataType::Text),
        AttributeField::new("PROJECT", FieldDataType::Text),
        AttributeField::new("BCLCS_LEVEL_2", FieldDataType::Text),
        AttributeField::new("BCLCS_LEVEL_4", FieldDataType::Text),
        AttributeField::new("BCLCS_LEVEL_5", FieldDataType::Text),
        AttributeField::new("PROJ_AGE_CLASS_CD_1", FieldDataType::Text),
        AttributeField::new("HARVEST_DATE", FieldDataType::Text),
        AttributeField::new("PROJ_AGE_1", FieldDataType::Int),
    ];
    let mut fc = FeatureCollection::new(fields);
    // Western lake.
    fc.push(
        Geometry::Polygon(Polygon::rectangle(20.0, 20.0, 30.0, 30.0)),
        vec![
            FieldData::Int(101),
            text("2021-03-01"),
            text("VRI2021"),
            text("W"),
            text("SI"),
            text("LA"),
            text("3"),
            FieldData::Null,
            FieldData::Null,
        ],
    );
    // Eastern reservoir.
    fc.push(
        Geometry::Polygon(Polygon::rectangle(70.0, 20.0, 80.0, 30.0)),
        vec![
            FieldData::Int(102),
            text("2021-03-01"),
            text("VRI2021"),
            text("W"),
            text("SI"),
            text("RE"),
            text("3"),
            FieldData::Null,
            FieldData::Null,
        ],
    );
    // A shrub patch, the dominant non-forest cover of the western shed.
    fc.push(
        Geometry::Polygon(Polygon::rectangle(0.0, 50.0, 40.0, 100.0)),
        vec![
            FieldData::Int(103),
            text("2021-03-01"),
            text("VRI2021"),
            text("N"),
            text("ST"),
            text("SL"),
            text("1"),
            FieldData::Null,
            FieldData::Null,
        ],
    );
    // Harvested forest along the south edge, under the buffer rings.
    fc.push(
        Geometry::Polygon(Polygon::rectangle(0.0, 0.0, 100.0, 20.0)),
        vec![
            FieldData::Int(104),
            text("2021-03-01"),
            text("VRI2021"),
            text("T"),
            text("TC"),
            text("TC"),
            text("2"),
            text("2015-06-01"),
            FieldData::Int(35),
        ],
    );
    fc
}

fn single_polygon_layer(field: &str, value: FieldData) -> FeatureCollection {
    let mut fc = FeatureCollection::new(vec![AttributeField::new(field, FieldDataType::Text)]);
    fc.push(
        Geometry::Polygon(Polygon::rectangle(0.0, 0.0, 100.0, 100.0)),
        vec![value],
    );
    fc
}

fn bec_layer() -> FeatureCollection {
    let mut fc = FeatureCollection::new(vec![
        AttributeField::new("MAP_LABEL", FieldDataType::Text),
        AttributeField::new("BEC_ZONE_CODE", FieldDataType::Text),
    ]);
    fc.push(
        Geometry::Polygon(Polygon::rectangle(1.0, 51.0, 49.0, 99.0)),
        vec![text("ESSFmc"), text("ESSF")],
    );
    fc.push(
        Geometry::Polygon(Polygon::rectangle(1.0, 1.0, 49.0, 49.0)),
        vec![text("SBSdk"), text("SBS")],
    );
    fc.push(
        Geometry::Polygon(Polygon::rectangle(51.0, 1.0, 99.0, 99.0)),
        vec![text("ICHmc"), text("ICH")],
    );
    fc
}

/// Both FWA records carry a null waterbody identifier, exercising the
/// synthetic backfill.
fn fwa_layer() -> FeatureCollection {
    let mut fc = FeatureCollection::new(vec![
        AttributeField::new("WATERBODY_POLY_ID", FieldDataType::Int),
        AttributeField::new("WATERSHED_CODE_50K", FieldDataType::Text),
        AttributeField::new("GNIS_NAME_1", FieldDataType::Text),
    ]);
    fc.push(
        Geometry::Polygon(Polygon::rectangle(20.0, 20.0, 30.0, 30.0)),
        vec![FieldData::Null, text("930-123"), text("Alpha Lake")],
    );
    fc.push(
        Geometry::Polygon(Polygon::rectangle(70.0, 20.0, 80.0, 30.0)),
        vec![FieldData::Null, text("930-456"), text("Beta Lake")],
    );
    fc
}

fn roads_layer() -> FeatureCollection {
    let mut fc = FeatureCollection::new(vec![AttributeField::new(
        "ROAD_NAME",
        FieldDataType::Text,
    )]);
    fc.push(
        Geometry::Polyline(Polyline::new(vec![vec![
            Point2D::new(-5.0, 45.0),
            Point2D::new(105.0, 45.0),
        ]])),
        vec![text("FSR 100")],
    );
    fc
}

fn streams_layer() -> FeatureCollection {
    let mut fc = FeatureCollection::new(vec![AttributeField::new(
        "STREAM_ORDER",
        FieldDataType::Int,
    )]);
    fc.push(
        Geometry::Polyline(Polyline::new(vec![vec![
            Point2D::new(25.0, 100.0),
            Point2D::new(25.0, 0.0),
        ]])),
        vec![FieldData::Int(2)],
    );
    fc.push(
        Geometry::Polyline(Polyline::new(vec![vec![
            Point2D::new(75.0, 100.0),
            Point2D::new(75.0, 0.0),
        ]])),
        vec![FieldData::Int(3)],
    );
    fc
}

fn fish_layer() -> FeatureCollection {
    let mut fc = FeatureCollection::new(vec![AttributeField::new(
        "POINT_TYPE_CODE",
        FieldDataType::Text,
    )]);
    fc.push(Geometry::Point(Point2D::new(5.0, 95.0)), vec![text("Summary")]);
    fc.push(
        Geometry::Point(Point2D::new(35.0, 45.0)),
        vec![text("Observation")],
    );
    fc.push(
        Geometry::Point(Point2D::new(75.0, 95.0)),
        vec![text("Observation")],
    );
    fc
}

/// Two valleys draining south, one through each lake cell. The cross-valley
/// gradient dominates the downslope gradient, so every cell first reaches
/// its valley axis and then follows it south through the lake.
fn write_dem(dir: &Path) -> String {
    let configs = RasterConfigs {
        rows: 10,
        columns: 10,
        north: 100.0,
        south: 0.0,
        east: 100.0,
        west: 0.0,
        resolution_x: 10.0,
        resolution_y: 10.0,
        nodata: -9999.0,
    };
    let path = dir.join("dem.flt").to_string_lossy().to_string();
    let mut dem = Raster::initialize_using_config(&path, &configs);
    for row in 0..10isize {
        for col in 0..10isize {
            let axis = if col <= 4 { 2 } else { 7 };
            let z = 0.1 * (9 - row) as f64 + (col - axis).abs() as f64;
            dem.set_value(row, col, z);
        }
    }
    dem.write().unwrap();
    path
}

fn field_f64(fc: &FeatureCollection, record: usize, name: &str) -> f64 {
    let idx = fc.field_index(name).unwrap();
    fc.value(record, idx).as_f64().unwrap()
}

fn field_text(fc: &FeatureCollection, record: usize, name: &str) -> String {
    let idx = fc.field_index(name).unwrap();
    fc.value(record, idx).to_string()
}

#[test]
fn test_full_pipeline_on_synthetic_landscape() {
    let dir = tempfile::tempdir().unwrap();
    let inputs = dir.path();
    let work = inputs.join("work");

    let args: Vec<String> = vec![
        write_layer(inputs, "aoi.geojson", &aoi_layer()),
        "REGION_NAME".to_string(),
        "Omineca".to_string(),
        write_layer(inputs, "vri.geojson", &vri_layer()),
        write_layer(
            inputs,
            "tsa.geojson",
            &single_polygon_layer("TSA_NUMBER", text("16")),
        ),
        write_layer(
            inputs,
            "tfl.geojson",
            &single_polygon_layer("FOR_FL_ID", text("TFL55")),
        ),
        write_layer(
            inputs,
            "private.geojson",
            &single_polygon_layer("OWNER_TYPE", text("Crown")),
        ),
        write_layer(inputs, "bec.geojson", &bec_layer()),
        write_layer(inputs, "fwa.geojson", &fwa_layer()),
        "#".to_string(),
        "NONE".to_string(),
        "10, 30".to_string(),
        write_dem(inputs),
        write_layer(inputs, "roads.geojson", &roads_layer()),
        write_layer(inputs, "streams.geojson", &streams_layer()),
        "#".to_string(),
        write_layer(inputs, "fish.geojson", &fish_layer()),
        work.to_string_lossy().to_string(),
    ];
    let params = RunParameters::parse(&args).unwrap();
    pipeline::validate_inputs(&params).unwrap();
    pipeline::run(&params).unwrap();

    // The consolidated lake set: two lakes, both identifiers backfilled.
    let lakes = read_feature_collection(work.join("Lakes_Final.geojson")).unwrap();
    assert_eq!(lakes.len(), 2);
    let mut ids: Vec<i64> = (0..2)
        .map(|i| field_f64(&lakes, i, "WATERBODY_POLY_ID") as i64)
        .collect();
    ids.sort();
    assert_eq!(ids, vec![999_900_000, 999_900_001]);
    assert!((field_f64(&lakes, 0, "Lakes_Area_Ha") - 0.01).abs() < 1e-9);
    assert_eq!(field_text(&lakes, 0, "GNIS_NAME_1"), "Alpha Lake");

    // One watershed per lake, ordered by label.
    let sheds = read_feature_collection(work.join("Watersheds.geojson")).unwrap();
    assert_eq!(sheds.len(), 2);

    let stats = read_feature_collection(work.join("Watershed_Statistics.geojson")).unwrap();
    assert_eq!(stats.len(), 2);
    assert_eq!(field_f64(&stats, 0, "WATERBODY_POLY_ID") as i64, 999_900_000);

    for record in 0..2 {
        assert_eq!(field_f64(&stats, record, "Lake_Count") as i64, 1);
        assert_eq!(field_f64(&stats, record, "Stream_Count") as i64, 1);
        assert!((field_f64(&stats, record, "Lake_Area_Total_Ha") - 0.01).abs() < 1e-9);
    }
    assert_eq!(field_text(&stats, 0, "GNIS_NAME_1"), "Alpha Lake");
    assert_eq!(field_text(&stats, 1, "GNIS_NAME_1"), "Beta Lake");
    assert_eq!(field_text(&stats, 0, "TSA_NUMBER"), "16");

    // The western watershed straddles two BEC zones, in ascending label
    // order; the eastern one sits in a single zone.
    assert_eq!(field_text(&stats, 0, "BEC_Label_1"), "ESSFmc");
    assert_eq!(field_text(&stats, 0, "BEC_Label_2"), "SBSdk");
    assert_eq!(field_text(&stats, 1, "BEC_Label_1"), "ICHmc");
    let label2 = stats.field_index("BEC_Label_2").unwrap();
    assert!(stats.value(1, label2).is_null());

    assert_eq!(field_text(&stats, 0, "BEC_Zone_Code_1"), "ESSF");
    assert!((field_f64(&stats, 0, "BEC_Zone_Area_Ha_1") - 0.25).abs() < 1e-9);
    assert_eq!(field_text(&stats, 0, "BEC_Zone_Code_2"), "SBS");
    assert!((field_f64(&stats, 0, "BEC_Zone_Area_Ha_2") - 0.15).abs() < 1e-9);

    // Dominant non-forest cover of the western shed is the shrub patch.
    assert_eq!(field_text(&stats, 0, "NonForest_Type"), "ST");
    assert!((field_f64(&stats, 0, "NonForest_Area_Ha") - 0.2).abs() < 1e-9);

    assert_eq!(field_f64(&stats, 0, "Fish_Summary_Count") as i64, 1);
    assert_eq!(field_f64(&stats, 0, "Fish_Obs_Count") as i64, 1);
    assert_eq!(field_f64(&stats, 1, "Fish_Summary_Count") as i64, 0);
    assert_eq!(field_f64(&stats, 1, "Fish_Obs_Count") as i64, 1);

    // The east-west road crosses 50 m of each watershed; its corridor
    // covers one full row of five cells per shed.
    assert!((field_f64(&stats, 0, "Road_Length") - 50.0).abs() < 1e-6);
    assert!((field_f64(&stats, 0, "Road_Corridor_Area_Ha") - 0.05).abs() < 1e-9);
    assert!(field_f64(&stats, 0, "Slope_Mean") > 0.0);

    // No criteria selection was requested, so only the lake table and the
    // statistics table are exported.
    let names: Vec<String> = fs::read_dir(&work)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    assert!(names.iter().any(|n| n.starts_with("Lakes_Final_") && n.ends_with(".csv")));
    assert!(names
        .iter()
        .any(|n| n.starts_with("Watershed_Statistics_") && n.ends_with(".csv")));
    assert!(!names.iter().any(|n| n.starts_with("Lakes_Criteria_")));

    // Intermediate artifacts were retired, final artifacts kept.
    for retired in [
        "VRI_Lakes.geojson",
        "BEC_Lakes.geojson",
        "VRI_Lakes_FWA.geojson",
        "VRI_Lakes_Dissolve.geojson",
        "DEM_Fill.flt",
        "D8_Pointer.flt",
        "Lakes_Pour.flt",
        "Slope.flt",
    ] {
        assert!(!names.iter().any(|n| n == retired), "{} not retired", retired);
    }
    for kept in [
        "Study_Area.geojson",
        "VRI_Study_Area.geojson",
        "Lakes_Final.geojson",
        "Watersheds.geojson",
        "Watershed_Rings.geojson",
        "Watershed_Statistics.geojson",
        "Watersheds_Raster.flt",
        "DEM_Study_Area.flt",
    ] {
        assert!(names.iter().any(|n| n == kept), "{} missing", kept);
    }
}
