/*
This crate is part of the riparian lakes analysis toolset.
License: MIT
*/

//! Stage 7: the watershed statistics table. Lake and stream summaries,
//! administrative attributes, the two-pass dynamic categorical expansion
//! for BEC labels and zone code/area pairs, dominant non-forest
//! composition, fish observation counts, road length and corridor area,
//! and slope zonal statistics, finished by an explicit rename pass.

use std::collections::{BTreeMap, HashMap};

use riparian_raster::surface::{slope_percent_rise, zonal_statistics};
use riparian_raster::{Raster, RasterConfigs};
use riparian_vector::algorithms::clip_polyline_to_polygon;
use riparian_vector::dissolve::{dissolve, StatType};
use riparian_vector::join::{spatial_join, JoinPredicate, JOIN_COUNT};
use riparian_vector::predicate::{select, Predicate};
use riparian_vector::{
    AttributeField, FeatureCollection, FieldData, FieldDataType, Geometry, Point2D,
};
use tracing::info;

use crate::args::RunParameters;
use crate::errors::AnalysisError;
use crate::fields;
use crate::overlay;
use crate::stages::delineate::DelineateOutput;
use crate::stages::read_source;
use crate::store::{StageScratch, WorkingStore};

const WATERSHED_KEY: &str = "Watershed_ID";

pub struct AggregateOutput {
    pub table: FeatureCollection,
    pub scratch: StageScratch,
}

pub fn run(
    params: &RunParameters,
    store: &WorkingStore,
    delineated: &DelineateOutput,
    lakes_final: &FeatureCollection,
    vri: &FeatureCollection,
) -> Result<AggregateOutput, AnalysisError> {
    let mut scratch = StageScratch::new();
    let watersheds = &delineated.watersheds;
    let mut table = watersheds.clone();

    info!("Computing lake statistics per watershed...");
    let lake_stats = lake_statistics(watersheds, lakes_final)?;
    attach_by_id(
        &mut table,
        &lake_stats,
        WATERSHED_KEY,
        &[
            "COUNT_Lakes_Area_Ha",
            "MIN_Lakes_Area_Ha",
            "MAX_Lakes_Area_Ha",
            "SUM_Lakes_Area_Ha",
            "SUM_Lakes_Prmtr",
        ],
    )?;

    info!("Counting streams per watershed...");
    let streams = read_source(&params.streams)?;
    let stream_stats = stream_statistics(watersheds, &streams)?;
    attach_by_id(&mut table, &stream_stats, WATERSHED_KEY, &["COUNT_Watershed_ID"])?;

    info!("Attaching administrative attributes to watersheds...");
    table = add_attributes(
        &table,
        lakes_final,
        &[fields::WATERSHED_50K, fields::GNIS_NAME, "TSA_NUMBER", "OWNER_TYPE"],
    )?;

    info!("Expanding BEC categorical attributes...");
    let bec = read_source(&params.bec)?;
    bec_label_pivot(&mut table, &bec)?;
    bec_zone_pivot(&mut table, &bec, &delineated.dem_clip.configs)?;

    info!("Computing dominant non-forest composition...");
    non_forest_composition(&mut table, vri, &delineated.dem_clip.configs)?;

    info!("Counting fish observations per watershed...");
    let fish = read_source(&params.fish)?;
    fish_counts(&mut table, &fish)?;

    info!("Computing road length and corridor area per watershed...");
    let roads = read_source(&params.roads)?;
    road_statistics(&mut table, &roads, &delineated.watershed_raster)?;

    info!("Computing slope statistics per watershed...");
    let slope = slope_percent_rise(&delineated.dem_clip);
    store.save_raster("Slope", &slope)?;
    scratch.add("Slope");
    slope_statistics(&mut table, &slope, &delineated.watershed_raster)?;

    info!("Applying final field names...");
    table.rename_fields(&[
        ("COUNT_Lakes_Area_Ha", "Lake_Count"),
        ("MIN_Lakes_Area_Ha", "Lake_Area_Min_Ha"),
        ("MAX_Lakes_Area_Ha", "Lake_Area_Max_Ha"),
        ("SUM_Lakes_Area_Ha", "Lake_Area_Total_Ha"),
        ("SUM_Lakes_Prmtr", "Lake_Prmtr_Total"),
        ("COUNT_Watershed_ID", "Stream_Count"),
    ])?;

    store.save_vector("Watershed_Statistics", &table)?;
    Ok(AggregateOutput { table, scratch })
}

/// Lakes intersecting each watershed, dissolved on the watershed key with
/// count/min/max/total area and total perimeter statistics.
fn lake_statistics(
    watersheds: &FeatureCollection,
    lakes: &FeatureCollection,
) -> Result<FeatureCollection, AnalysisError> {
    let shed_id = watersheds.require_field(fields::POLY_ID)?;
    let area_idx = lakes.require_field(fields::LAKE_AREA)?;
    let prmtr_idx = lakes.require_field(fields::LAKE_PERIMETER)?;

    let mut tagged = FeatureCollection::new(vec![
        AttributeField::new(WATERSHED_KEY, FieldDataType::Int),
        AttributeField::new(fields::LAKE_AREA, FieldDataType::Real),
        AttributeField::new(fields::LAKE_PERIMETER, FieldDataType::Real),
    ]);
    for shed in &watersheds.features {
        let shed_poly = match &shed.geometry {
            Geometry::Polygon(p) => p,
            _ => continue,
        };
        for lake in &lakes.features {
            if lake.geometry.intersects_polygon(shed_poly) {
                tagged.push(
                    lake.geometry.clone(),
                    vec![
                        shed.values[shed_id].clone(),
                        lake.values[area_idx].clone(),
                        lake.values[prmtr_idx].clone(),
                    ],
                );
            }
        }
    }
    Ok(dissolve(
        &tagged,
        &[WATERSHED_KEY],
        &[
            (fields::LAKE_AREA, StatType::Count),
            (fields::LAKE_AREA, StatType::Min),
            (fields::LAKE_AREA, StatType::Max),
            (fields::LAKE_AREA, StatType::Sum),
            (fields::LAKE_PERIMETER, StatType::Sum),
        ],
    )?)
}

fn stream_statistics(
    watersheds: &FeatureCollection,
    streams: &FeatureCollection,
) -> Result<FeatureCollection, AnalysisError> {
    let shed_id = watersheds.require_field(fields::POLY_ID)?;
    let mut tagged = FeatureCollection::new(vec![AttributeField::new(
        WATERSHED_KEY,
        FieldDataType::Int,
    )]);
    for shed in &watersheds.features {
        let shed_poly = match &shed.geometry {
            Geometry::Polygon(p) => p,
            _ => continue,
        };
        for stream in &streams.features {
            if stream.geometry.intersects_polygon(shed_poly) {
                tagged.push(stream.geometry.clone(), vec![shed.values[shed_id].clone()]);
            }
        }
    }
    Ok(dissolve(
        &tagged,
        &[WATERSHED_KEY],
        &[(WATERSHED_KEY, StatType::Count)],
    )?)
}

/// Copies the listed fields from `source` onto matching table rows, keyed
/// by watershed identifier. Rows without a source record stay null.
fn attach_by_id(
    table: &mut FeatureCollection,
    source: &FeatureCollection,
    source_key: &str,
    copy: &[&str],
) -> Result<(), AnalysisError> {
    let table_id = table.require_field(fields::POLY_ID)?;
    let src_key = source.require_field(source_key)?;
    let mut by_id: HashMap<i64, usize> = HashMap::new();
    for (i, f) in source.features.iter().enumerate() {
        if let Some(id) = f.values[src_key].as_f64() {
            by_id.insert(id as i64, i);
        }
    }

    for name in copy {
        let src_idx = source.require_field(name)?;
        table.add_field(source.fields[src_idx].clone());
        let out_idx = table.fields.len() - 1;
        for i in 0..table.len() {
            let id = match table.value(i, table_id).as_f64() {
                Some(v) => v as i64,
                None => continue,
            };
            if let Some(&rec) = by_id.get(&id) {
                let value = source.value(rec, src_idx).clone();
                table.set_value(i, out_idx, value);
            }
        }
    }
    Ok(())
}

/// Generic add-attributes: spatial-join a bounded field list from `source`
/// onto the table, preserving every existing table field and dropping the
/// join bookkeeping fields.
fn add_attributes(
    table: &FeatureCollection,
    source: &FeatureCollection,
    keep_from_source: &[&str],
) -> Result<FeatureCollection, AnalysisError> {
    let mut full_keep: Vec<String> = table.fields.iter().map(|f| f.name.clone()).collect();
    full_keep.extend(keep_from_source.iter().map(|s| s.to_string()));
    let keep_refs: Vec<&str> = full_keep.iter().map(String::as_str).collect();

    let mut joined = spatial_join(table, source, JoinPredicate::Intersects, Some(&keep_refs))?;
    joined.drop_fields(&[JOIN_COUNT, "WATERBODY_POLY_ID_1"]);
    Ok(joined)
}

fn distinct_sorted(mut values: Vec<String>) -> Vec<String> {
    values.sort();
    values.dedup();
    values
}

/// Two-pass categorical expansion for the BEC label: pass 1 measures the
/// distinct labels per watershed and the global maximum K, pass 2
/// allocates BEC_Label_1..K and fills them in ascending label order.
fn bec_label_pivot(
    table: &mut FeatureCollection,
    bec: &FeatureCollection,
) -> Result<(), AnalysisError> {
    let label_idx = bec.require_field(fields::BEC_LABEL)?;

    let mut per_row: Vec<Vec<String>> = Vec::with_capacity(table.len());
    for f in &table.features {
        let shed_poly = match &f.geometry {
            Geometry::Polygon(p) => p,
            _ => {
                per_row.push(Vec::new());
                continue;
            }
        };
        let mut labels = Vec::new();
        for b in &bec.features {
            if b.geometry.intersects_polygon(shed_poly) {
                if let Some(text) = b.values[label_idx].as_text() {
                    if !text.is_empty() {
                        labels.push(text.to_string());
                    }
                }
            }
        }
        per_row.push(distinct_sorted(labels));
    }

    let k = per_row.iter().map(Vec::len).max().unwrap_or(0);
    for slot in 1..=k {
        table.add_field(AttributeField::new(
            &format!("BEC_Label_{}", slot),
            FieldDataType::Text,
        ));
    }
    let base = table.fields.len() - k;
    for (i, labels) in per_row.iter().enumerate() {
        for (j, label) in labels.iter().enumerate() {
            table.set_value(i, base + j, FieldData::Text(label.clone()));
        }
    }
    Ok(())
}

/// Zone code/area pairs, expanded the same two-pass way. Intersection
/// areas are measured on the analysis grid and reported in hectares.
fn bec_zone_pivot(
    table: &mut FeatureCollection,
    bec: &FeatureCollection,
    base: &RasterConfigs,
) -> Result<(), AnalysisError> {
    let code_idx = bec.require_field(fields::BEC_ZONE_CODE)?;

    let mut per_row: Vec<Vec<(String, f64)>> = Vec::with_capacity(table.len());
    for f in &table.features {
        let shed_poly = match &f.geometry {
            Geometry::Polygon(p) => p,
            _ => {
                per_row.push(Vec::new());
                continue;
            }
        };
        let mut areas: BTreeMap<String, f64> = BTreeMap::new();
        for b in &bec.features {
            let bec_poly = match &b.geometry {
                Geometry::Polygon(p) => p,
                _ => continue,
            };
            let code = match b.values[code_idx].as_text() {
                Some(t) if !t.is_empty() => t.to_string(),
                _ => continue,
            };
            let area = overlay::intersection_area(shed_poly, bec_poly, base);
            if area > 0.0 {
                *areas.entry(code).or_insert(0.0) += area;
            }
        }
        per_row.push(areas.into_iter().map(|(c, a)| (c, a / 10_000.0)).collect());
    }

    let k = per_row.iter().map(Vec::len).max().unwrap_or(0);
    let first = table.fields.len();
    for slot in 1..=k {
        table.add_field(AttributeField::new(
            &format!("BEC_Zone_Code_{}", slot),
            FieldDataType::Text,
        ));
        table.add_field(AttributeField::new(
            &format!("BEC_Zone_Area_Ha_{}", slot),
            FieldDataType::Real,
        ));
    }
    for (i, pairs) in per_row.iter().enumerate() {
        for (j, (code, area)) in pairs.iter().enumerate() {
            table.set_value(i, first + 2 * j, FieldData::Text(code.clone()));
            table.set_value(i, first + 2 * j + 1, FieldData::Real(*area));
        }
    }
    Ok(())
}

/// Dominant non-forest classification per watershed: the (type, subtype)
/// pair with the largest total intersection area, ties resolved in
/// ascending pair order.
fn non_forest_composition(
    table: &mut FeatureCollection,
    vri: &FeatureCollection,
    base: &RasterConfigs,
) -> Result<(), AnalysisError> {
    let predicate = Predicate::parse("BCLCS_LEVEL_2 <> 'T'")?;
    let non_forest = select(vri, &predicate)?;
    let type_idx = non_forest.require_field("BCLCS_LEVEL_4")?;
    let sub_idx = non_forest.require_field("BCLCS_LEVEL_5")?;

    table.add_field(AttributeField::new("NonForest_Type", FieldDataType::Text));
    table.add_field(AttributeField::new(
        "NonForest_Subtype",
        FieldDataType::Text,
    ));
    table.add_field(AttributeField::new(
        "NonForest_Area_Ha",
        FieldDataType::Real,
    ));
    let n = table.fields.len();

    for i in 0..table.len() {
        let shed_poly = match &table.features[i].geometry {
            Geometry::Polygon(p) => p.clone(),
            _ => continue,
        };
        let mut areas: BTreeMap<(String, String), f64> = BTreeMap::new();
        for f in &non_forest.features {
            let poly = match &f.geometry {
                Geometry::Polygon(p) => p,
                _ => continue,
            };
            let area = overlay::intersection_area(&shed_poly, poly, base);
            if area > 0.0 {
                let key = (
                    f.values[type_idx].to_string(),
                    f.values[sub_idx].to_string(),
                );
                *areas.entry(key).or_insert(0.0) += area;
            }
        }
        let mut dominant: Option<((String, String), f64)> = None;
        for (key, area) in areas {
            let better = match &dominant {
                Some((_, best)) => area > *best,
                None => true,
            };
            if better {
                dominant = Some((key, area));
            }
        }
        if let Some(((type_code, sub_code), area)) = dominant {
            table.set_value(i, n - 3, FieldData::Text(type_code));
            table.set_value(i, n - 2, FieldData::Text(sub_code));
            table.set_value(i, n - 1, FieldData::Real(area / 10_000.0));
        }
    }
    Ok(())
}

/// Counts of fish observation points per watershed, split by the summary
/// and individual observation categories.
fn fish_counts(
    table: &mut FeatureCollection,
    fish: &FeatureCollection,
) -> Result<(), AnalysisError> {
    let cat_idx = fish.require_field("POINT_TYPE_CODE")?;
    table.add_field(AttributeField::new(
        "Fish_Summary_Count",
        FieldDataType::Int,
    ));
    table.add_field(AttributeField::new("Fish_Obs_Count", FieldDataType::Int));
    let n = table.fields.len();

    for i in 0..table.len() {
        let shed_poly = match &table.features[i].geometry {
            Geometry::Polygon(p) => p.clone(),
            _ => continue,
        };
        let mut summary = 0i64;
        let mut observation = 0i64;
        for f in &fish.features {
            if let Geometry::Point(p) = &f.geometry {
                if shed_poly.contains_point(p) {
                    match f.values[cat_idx].as_text() {
                        Some("Summary") => summary += 1,
                        Some("Observation") => observation += 1,
                        _ => {}
                    }
                }
            }
        }
        table.set_value(i, n - 2, FieldData::Int(summary));
        table.set_value(i, n - 1, FieldData::Int(observation));
    }
    Ok(())
}

/// Total intersecting road length, and the corridor area covered by grid
/// cells within the fixed corridor width of a clipped road segment.
fn road_statistics(
    table: &mut FeatureCollection,
    roads: &FeatureCollection,
    shed_raster: &Raster,
) -> Result<(), AnalysisError> {
    let table_id = table.require_field(fields::POLY_ID)?;
    table.add_field(AttributeField::new("Road_Length", FieldDataType::Real));
    table.add_field(AttributeField::new(
        "Road_Corridor_Area_Ha",
        FieldDataType::Real,
    ));
    let n = table.fields.len();

    let mut segments: HashMap<i64, Vec<(Point2D, Point2D)>> = HashMap::new();
    let mut row_by_id: HashMap<i64, usize> = HashMap::new();
    for i in 0..table.len() {
        let id = match table.value(i, table_id).as_f64() {
            Some(v) => v as i64,
            None => continue,
        };
        row_by_id.insert(id, i);
        let shed_poly = match &table.features[i].geometry {
            Geometry::Polygon(p) => p.clone(),
            _ => continue,
        };
        let mut total = 0.0;
        let mut segs: Vec<(Point2D, Point2D)> = Vec::new();
        for road in &roads.features {
            if let Geometry::Polyline(line) = &road.geometry {
                if let Some(piece) = clip_polyline_to_polygon(line, &shed_poly) {
                    total += piece.length();
                    for part in &piece.parts {
                        for w in part.windows(2) {
                            segs.push((w[0], w[1]));
                        }
                    }
                }
            }
        }
        table.set_value(i, n - 2, FieldData::Real(total));
        segments.insert(id, segs);
    }

    // One grid pass: a cell belongs to the corridor of its watershed when
    // its center is within the corridor width of any clipped segment.
    let mut corridor_cells: HashMap<i64, usize> = HashMap::new();
    let rows = shed_raster.configs.rows as isize;
    let columns = shed_raster.configs.columns as isize;
    for row in 0..rows {
        let y = shed_raster.get_y_from_row(row);
        for col in 0..columns {
            let label = shed_raster.get_value(row, col);
            if label == shed_raster.configs.nodata {
                continue;
            }
            let id = label as i64;
            let segs = match segments.get(&id) {
                Some(s) if !s.is_empty() => s,
                _ => continue,
            };
            let center = Point2D::new(shed_raster.get_x_from_column(col), y);
            let near = segs.iter().any(|(a, b)| {
                riparian_vector::algorithms::point_segment_distance(&center, a, b)
                    <= fields::ROAD_CORRIDOR_WIDTH
            });
            if near {
                *corridor_cells.entry(id).or_insert(0) += 1;
            }
        }
    }
    let cell_area = shed_raster.configs.resolution_x * shed_raster.configs.resolution_y;
    for (id, cells) in corridor_cells {
        if let Some(&row) = row_by_id.get(&id) {
            table.set_value(
                row,
                n - 1,
                FieldData::Real(cells as f64 * cell_area / 10_000.0),
            );
        }
    }
    Ok(())
}

fn slope_statistics(
    table: &mut FeatureCollection,
    slope: &Raster,
    shed_raster: &Raster,
) -> Result<(), AnalysisError> {
    let table_id = table.require_field(fields::POLY_ID)?;
    table.add_field(AttributeField::new("Slope_Min", FieldDataType::Real));
    table.add_field(AttributeField::new("Slope_Max", FieldDataType::Real));
    table.add_field(AttributeField::new("Slope_Mean", FieldDataType::Real));
    let n = table.fields.len();

    let stats = zonal_statistics(slope, shed_raster)?;
    let by_zone: HashMap<i64, usize> = stats
        .iter()
        .enumerate()
        .map(|(i, s)| (s.zone_id, i))
        .collect();
    for i in 0..table.len() {
        let id = match table.value(i, table_id).as_f64() {
            Some(v) => v as i64,
            None => continue,
        };
        if let Some(&slot) = by_zone.get(&id) {
            let s = &stats[slot];
            table.set_value(i, n - 3, FieldData::Real(s.min));
            table.set_value(i, n - 2, FieldData::Real(s.max));
            table.set_value(i, n - 1, FieldData::Real(s.mean));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use riparian_vector::Polygon;

    fn watershed_table() -> FeatureCollection {
        let mut fc = FeatureCollection::new(vec![AttributeField::new(
            fields::POLY_ID,
            FieldDataType::Int,
        )]);
        fc.push(
            Geometry::Polygon(Polygon::rectangle(0.0, 0.0, 50.0, 100.0)),
            vec![FieldData::Int(1)],
        );
        fc.push(
            Geometry::Polygon(Polygon::rectangle(50.0, 0.0, 100.0, 100.0)),
            vec![FieldData::Int(2)],
        );
        fc
    }

    fn grid() -> RasterConfigs {
        RasterConfigs {
            rows: 10,
            columns: 10,
            north: 100.0,
            south: 0.0,
            east: 100.0,
            west: 0.0,
            resolution_x: 10.0,
            resolution_y: 10.0,
            nodata: -9999.0,
        }
    }

    fn bec_layer() -> FeatureCollection {
        let mut fc = FeatureCollection::new(vec![
            AttributeField::new(fields::BEC_LABEL, FieldDataType::Text),
            AttributeField::new(fields::BEC_ZONE_CODE, FieldDataType::Text),
        ]);
        // Two zones over watershed 1, one over watershed 2.
        fc.push(
            Geometry::Polygon(Polygon::rectangle(0.0, 50.0, 50.0, 100.0)),
            vec![
                FieldData::Text("ESSFmc".to_string()),
                FieldData::Text("ESSF".to_string()),
            ],
        );
        fc.push(
            Geometry::Polygon(Polygon::rectangle(0.0, 0.0, 50.0, 50.0)),
            vec![
                FieldData::Text("SBSdk".to_string()),
                FieldData::Text("SBS".to_string()),
            ],
        );
        fc.push(
            Geometry::Polygon(Polygon::rectangle(50.0, 0.0, 100.0, 100.0)),
            vec![
                FieldData::Text("ICHmc".to_string()),
                FieldData::Text("ICH".to_string()),
            ],
        );
        fc
    }

    #[test]
    fn test_bec_label_pivot_two_pass() {
        let mut table = watershed_table();
        bec_label_pivot(&mut table, &bec_layer()).unwrap();
        let l1 = table.field_index("BEC_Label_1").unwrap();
        let l2 = table.field_index("BEC_Label_2").unwrap();
        assert!(table.field_index("BEC_Label_3").is_none());
        // Watershed 1 has both labels in ascending order.
        assert_eq!(*table.value(0, l1), FieldData::Text("ESSFmc".to_string()));
        assert_eq!(*table.value(0, l2), FieldData::Text("SBSdk".to_string()));
        // Watershed 2 has one label and an empty second slot.
        assert_eq!(*table.value(1, l1), FieldData::Text("ICHmc".to_string()));
        assert!(table.value(1, l2).is_null());
    }

    #[test]
    fn test_bec_zone_pivot_areas() {
        let mut table = watershed_table();
        bec_zone_pivot(&mut table, &bec_layer(), &grid()).unwrap();
        let c1 = table.field_index("BEC_Zone_Code_1").unwrap();
        let a1 = table.field_index("BEC_Zone_Area_Ha_1").unwrap();
        let c2 = table.field_index("BEC_Zone_Code_2").unwrap();
        assert_eq!(*table.value(0, c1), FieldData::Text("ESSF".to_string()));
        // Half of a 50 m x 100 m watershed: 2500 m2 cells, 0.25 ha total.
        assert_eq!(*table.value(0, a1), FieldData::Real(0.25));
        assert_eq!(*table.value(0, c2), FieldData::Text("SBS".to_string()));
        assert_eq!(*table.value(1, c1), FieldData::Text("ICH".to_string()));
        assert!(table.value(1, c2).is_null());
    }

    #[test]
    fn test_fish_counts_by_category() {
        let mut table = watershed_table();
        let mut fish = FeatureCollection::new(vec![AttributeField::new(
            "POINT_TYPE_CODE",
            FieldDataType::Text,
        )]);
        fish.push(
            Geometry::Point(Point2D::new(10.0, 10.0)),
            vec![FieldData::Text("Summary".to_string())],
        );
        fish.push(
            Geometry::Point(Point2D::new(20.0, 20.0)),
            vec![FieldData::Text("Observation".to_string())],
        );
        fish.push(
            Geometry::Point(Point2D::new(60.0, 20.0)),
            vec![FieldData::Text("Observation".to_string())],
        );
        fish_counts(&mut table, &fish).unwrap();
        let s = table.field_index("Fish_Summary_Count").unwrap();
        let o = table.field_index("Fish_Obs_Count").unwrap();
        assert_eq!(*table.value(0, s), FieldData::Int(1));
        assert_eq!(*table.value(0, o), FieldData::Int(1));
        assert_eq!(*table.value(1, s), FieldData::Int(0));
        assert_eq!(*table.value(1, o), FieldData::Int(1));
    }

    #[test]
    fn test_dominant_non_forest_is_largest_area() {
        let mut table = watershed_table();
        let mut vri = FeatureCollection::new(vec![
            AttributeField::new("BCLCS_LEVEL_2", FieldDataType::Text),
            AttributeField::new("BCLCS_LEVEL_4", FieldDataType::Text),
            AttributeField::new("BCLCS_LEVEL_5", FieldDataType::Text),
        ]);
        // Small shrub patch, larger herb patch, both in watershed 1.
        vri.push(
            Geometry::Polygon(Polygon::rectangle(0.0, 0.0, 10.0, 10.0)),
            vec![
                FieldData::Text("N".to_string()),
                FieldData::Text("ST".to_string()),
                FieldData::Text("SL".to_string()),
            ],
        );
        vri.push(
            Geometry::Polygon(Polygon::rectangle(0.0, 50.0, 40.0, 100.0)),
            vec![
                FieldData::Text("N".to_string()),
                FieldData::Text("HE".to_string()),
                FieldData::Text("HF".to_string()),
            ],
        );
        // Treed polygon is excluded by the classification rule.
        vri.push(
            Geometry::Polygon(Polygon::rectangle(0.0, 0.0, 50.0, 100.0)),
            vec![
                FieldData::Text("T".to_string()),
                FieldData::Text("TC".to_string()),
                FieldData::Text("TC".to_string()),
            ],
        );
        non_forest_composition(&mut table, &vri, &grid()).unwrap();
        let t = table.field_index("NonForest_Type").unwrap();
        let a = table.field_index("NonForest_Area_Ha").unwrap();
        assert_eq!(*table.value(0, t), FieldData::Text("HE".to_string()));
        assert_eq!(*table.value(0, a), FieldData::Real(0.2));
        assert!(table.value(1, t).is_null());
    }

    #[test]
    fn test_lake_statistics_dissolve() {
        let table = watershed_table();
        let mut lakes = FeatureCollection::new(vec![
            AttributeField::new(fields::LAKE_AREA, FieldDataType::Real),
            AttributeField::new(fields::LAKE_PERIMETER, FieldDataType::Real),
        ]);
        lakes.push(
            Geometry::Polygon(Polygon::rectangle(10.0, 10.0, 20.0, 20.0)),
            vec![FieldData::Real(0.01), FieldData::Real(40.0)],
        );
        lakes.push(
            Geometry::Polygon(Polygon::rectangle(30.0, 30.0, 45.0, 40.0)),
            vec![FieldData::Real(0.015), FieldData::Real(50.0)],
        );
        lakes.push(
            Geometry::Polygon(Polygon::rectangle(60.0, 10.0, 70.0, 20.0)),
            vec![FieldData::Real(0.01), FieldData::Real(40.0)],
        );
        let stats = lake_statistics(&table, &lakes).unwrap();
        assert_eq!(stats.len(), 2);
        let count = stats.field_index("COUNT_Lakes_Area_Ha").unwrap();
        let sum = stats.field_index("SUM_Lakes_Area_Ha").unwrap();
        assert_eq!(*stats.value(0, count), FieldData::Int(2));
        assert_eq!(*stats.value(0, sum), FieldData::Real(0.025));
        assert_eq!(*stats.value(1, count), FieldData::Int(1));
    }
}
