/*
This crate is part of the riparian lakes analysis toolset.
License: MIT
*/

//! Stage 6: watershed delineation. The elevation surface is clipped to the
//! study area, filled, and resolved to D8 flow directions; the lakes are
//! burned in as pour points and each cell is labeled with the waterbody it
//! drains to. Vectorized catchments are spatially filtered back to a 1:1
//! correspondence with their lakes, the buffer rings are clipped to them,
//! and the rings pick up VRI harvesting attributes plus road, stream, and
//! bridge intersections.

use std::collections::HashMap;

use riparian_raster::conversion::{rasterize_polygons, vectorize_regions};
use riparian_raster::hydrology::{d8_pointer, fill_depressions, watershed};
use riparian_raster::Raster;
use riparian_vector::algorithms::clip_polyline_to_polygon;
use riparian_vector::buffer::{BUFFER_DISTANCE, RING_AREA, RING_PERIMETER};
use riparian_vector::join::{spatial_join, JoinPredicate, JOIN_COUNT};
use riparian_vector::{
    AttributeField, FeatureCollection, FieldData, FieldDataType, Geometry, Point2D, Polygon,
};
use tracing::{info, warn};

use crate::args::RunParameters;
use crate::errors::AnalysisError;
use crate::fields;
use crate::overlay;
use crate::stages::read_source;
use crate::store::{StageScratch, WorkingStore};

pub struct DelineateOutput {
    pub watersheds: FeatureCollection,
    pub watershed_raster: Raster,
    pub dem_clip: Raster,
    pub rings: FeatureCollection,
    pub scratch: StageScratch,
}

pub fn run(
    params: &RunParameters,
    store: &WorkingStore,
    study_area: &FeatureCollection,
    vri: &FeatureCollection,
    lakes: &FeatureCollection,
    rings: &FeatureCollection,
) -> Result<DelineateOutput, AnalysisError> {
    let mut scratch = StageScratch::new();

    let dem = Raster::new(&params.dem, "r").map_err(|e| {
        AnalysisError::Input(format!(
            "cannot read elevation surface '{}': {}",
            params.dem, e
        ))
    })?;

    info!("Clipping elevation surface to the study area...");
    let dem_clip = overlay::clip_raster_to_collection(&dem, study_area);
    store.save_raster("DEM_Study_Area", &dem_clip)?;

    info!("Filling depressions...");
    let filled = fill_depressions(&dem_clip);
    store.save_raster("DEM_Fill", &filled)?;
    scratch.add("DEM_Fill");

    info!("Computing D8 flow directions...");
    let pntr = d8_pointer(&filled);
    store.save_raster("D8_Pointer", &pntr)?;
    scratch.add("D8_Pointer");

    info!("Rasterizing lakes as pour points...");
    let pour = rasterize_polygons(lakes, fields::POLY_ID, &dem_clip.configs)?;
    store.save_raster("Lakes_Pour", &pour)?;
    scratch.add("Lakes_Pour");

    info!("Labeling watershed cells...");
    let watershed_raster = watershed(&pntr, &pour)?;

    info!("Vectorizing watersheds...");
    let regions = vectorize_regions(&watershed_raster);
    let watersheds = spatial_filter(regions, lakes)?;
    info!("{} watershed(s) delineated", watersheds.len());
    store.save_vector("Watersheds", &watersheds)?;

    // Fragments dropped by the spatial filter still carry their label in
    // the traced grid; clear those cells so the raster agrees with the
    // filtered polygons before any grid statistics run against it.
    let watershed_raster = mask_to_watersheds(&watershed_raster, &watersheds)?;
    store.save_raster("Watersheds_Raster", &watershed_raster)?;

    info!("Clipping buffer rings to watershed boundaries...");
    let clipped = clip_rings_to_watersheds(rings, &watersheds, &dem_clip)?;

    info!("Attributing buffer rings with VRI harvesting information...");
    let keep: Vec<&str> = vec![
        fields::POLY_ID,
        BUFFER_DISTANCE,
        RING_AREA,
        RING_PERIMETER,
        "HARVEST_DATE",
        "PROJ_AGE_1",
        fields::AGE_CLASS,
    ];
    let mut attributed = spatial_join(&clipped, vri, JoinPredicate::Intersects, Some(&keep))?;
    attributed.drop_fields(&[JOIN_COUNT]);
    attributed.rename_fields(&[
        ("HARVEST_DATE", "Harvest_Date"),
        ("PROJ_AGE_1", "Proj_Age"),
    ])?;
    store.save_vector("Watershed_Rings", &attributed)?;

    info!("Intersecting road features with the buffer rings...");
    let roads = read_source(&params.roads)?;
    let rings_roads = clip_lines_to_rings(&attributed, &roads)?;
    store.save_vector("Rings_Roads", &rings_roads)?;
    log_per_distance_counts("road", &rings_roads)?;

    info!("Intersecting stream features with the buffer rings...");
    let streams = read_source(&params.streams)?;
    let rings_streams = clip_lines_to_rings(&attributed, &streams)?;
    store.save_vector("Rings_Streams", &rings_streams)?;

    if let Some(path) = &params.bridges {
        info!("Intersecting bridge features with the buffer rings...");
        let bridges = read_source(path)?;
        let rings_bridges = points_in_rings(&attributed, &bridges)?;
        store.save_vector("Rings_Bridges", &rings_bridges)?;
        log_per_distance_counts("bridge", &rings_bridges)?;
    }

    Ok(DelineateOutput {
        watersheds,
        watershed_raster,
        dem_clip,
        rings: attributed,
        scratch,
    })
}

/// Restores the 1:1 watershed/lake correspondence: of each label's
/// catchment fragments, only those intersecting a lake with the same
/// identifier survive. A label with no corresponding lake at all is a
/// data integrity failure.
fn spatial_filter(
    regions: Vec<(i64, Polygon)>,
    lakes: &FeatureCollection,
) -> Result<FeatureCollection, AnalysisError> {
    let id_idx = lakes.require_field(fields::POLY_ID)?;
    let mut lake_polys: HashMap<i64, Vec<&Polygon>> = HashMap::new();
    for f in &lakes.features {
        if let (Some(id), Geometry::Polygon(p)) = (f.values[id_idx].as_f64(), &f.geometry) {
            lake_polys.entry(id as i64).or_default().push(p);
        }
    }

    let mut watersheds = FeatureCollection::new(vec![AttributeField::new(
        fields::POLY_ID,
        FieldDataType::Int,
    )]);
    for (id, region) in regions {
        let for_id = lake_polys.get(&id).ok_or_else(|| {
            AnalysisError::DataIntegrity(format!(
                "watershed label {} has no lake with a matching {}",
                id,
                fields::POLY_ID
            ))
        })?;
        let kept: Vec<Polygon> = overlay::polygon_components(&region)
            .into_iter()
            .filter(|c| for_id.iter().any(|lake| c.intersects(lake)))
            .collect();
        if kept.is_empty() {
            warn!(
                "no catchment fragment for watershed label {} touches its lake; dropped",
                id
            );
            continue;
        }
        let parts: Vec<Vec<Point2D>> = kept.into_iter().flat_map(|c| c.parts).collect();
        watersheds.push(Geometry::Polygon(Polygon::new(parts)), vec![FieldData::Int(id)]);
    }
    Ok(watersheds)
}

/// Keeps a labeled cell only when its center lies inside the filtered
/// watershed polygon carrying the same identifier; every other labeled
/// cell becomes nodata.
fn mask_to_watersheds(
    raster: &Raster,
    watersheds: &FeatureCollection,
) -> Result<Raster, AnalysisError> {
    let id_idx = watersheds.require_field(fields::POLY_ID)?;
    let mut shed_by_id: HashMap<i64, &Polygon> = HashMap::new();
    for f in &watersheds.features {
        if let (Some(id), Geometry::Polygon(p)) = (f.values[id_idx].as_f64(), &f.geometry) {
            shed_by_id.insert(id as i64, p);
        }
    }
    let mut output = raster.clone();
    let rows = raster.configs.rows as isize;
    let columns = raster.configs.columns as isize;
    let nodata = raster.configs.nodata;
    for row in 0..rows {
        let y = raster.get_y_from_row(row);
        for col in 0..columns {
            let v = raster.get_value(row, col);
            if v == nodata {
                continue;
            }
            let keep = shed_by_id
                .get(&(v as i64))
                .map(|p| p.contains_point(&Point2D::new(raster.get_x_from_column(col), y)))
                .unwrap_or(false);
            if !keep {
                output.set_value(row, col, nodata);
            }
        }
    }
    Ok(output)
}

fn clip_rings_to_watersheds(
    rings: &FeatureCollection,
    watersheds: &FeatureCollection,
    grid: &Raster,
) -> Result<FeatureCollection, AnalysisError> {
    let ring_id = rings.require_field(fields::POLY_ID)?;
    let area_idx = rings.require_field(RING_AREA)?;
    let prmtr_idx = rings.require_field(RING_PERIMETER)?;
    let shed_id = watersheds.require_field(fields::POLY_ID)?;

    let mut shed_by_id: HashMap<i64, &Polygon> = HashMap::new();
    for f in &watersheds.features {
        if let (Some(id), Geometry::Polygon(p)) = (f.values[shed_id].as_f64(), &f.geometry) {
            shed_by_id.insert(id as i64, p);
        }
    }

    let mut clipped = FeatureCollection::new(rings.fields.clone());
    for f in &rings.features {
        let id = match f.values[ring_id].as_f64() {
            Some(v) => v as i64,
            None => continue,
        };
        let shed = match shed_by_id.get(&id) {
            Some(p) => *p,
            None => continue,
        };
        let ring_poly = match &f.geometry {
            Geometry::Polygon(p) => p,
            _ => continue,
        };
        if let Some(piece) = overlay::intersect_polygons(ring_poly, shed, &grid.configs) {
            let mut values = f.values.clone();
            values[area_idx] = FieldData::Real(piece.area() / 10_000.0);
            values[prmtr_idx] = FieldData::Real(piece.perimeter());
            clipped.push(Geometry::Polygon(piece), values);
        }
    }
    Ok(clipped)
}

fn ring_tag_fields() -> Vec<AttributeField> {
    vec![
        AttributeField::new(fields::POLY_ID, FieldDataType::Int),
        AttributeField::new(BUFFER_DISTANCE, FieldDataType::Real),
    ]
}

/// Clips every polyline feature against every ring, tagging the pieces
/// with the ring's waterbody id and generating distance.
fn clip_lines_to_rings(
    rings: &FeatureCollection,
    lines: &FeatureCollection,
) -> Result<FeatureCollection, AnalysisError> {
    let id_idx = rings.require_field(fields::POLY_ID)?;
    let dist_idx = rings.require_field(BUFFER_DISTANCE)?;
    let mut out = FeatureCollection::new(ring_tag_fields());
    for ring in &rings.features {
        let ring_poly = match &ring.geometry {
            Geometry::Polygon(p) => p,
            _ => continue,
        };
        for line in &lines.features {
            if let Geometry::Polyline(pl) = &line.geometry {
                if let Some(piece) = clip_polyline_to_polygon(pl, ring_poly) {
                    out.push(
                        Geometry::Polyline(piece),
                        vec![ring.values[id_idx].clone(), ring.values[dist_idx].clone()],
                    );
                }
            }
        }
    }
    Ok(out)
}

fn points_in_rings(
    rings: &FeatureCollection,
    points: &FeatureCollection,
) -> Result<FeatureCollection, AnalysisError> {
    let id_idx = rings.require_field(fields::POLY_ID)?;
    let dist_idx = rings.require_field(BUFFER_DISTANCE)?;
    let mut out = FeatureCollection::new(ring_tag_fields());
    for ring in &rings.features {
        let ring_poly = match &ring.geometry {
            Geometry::Polygon(p) => p,
            _ => continue,
        };
        for point in &points.features {
            if let Geometry::Point(p) = &point.geometry {
                if ring_poly.contains_point(p) {
                    out.push(
                        Geometry::Point(*p),
                        vec![ring.values[id_idx].clone(), ring.values[dist_idx].clone()],
                    );
                }
            }
        }
    }
    Ok(out)
}

fn per_distance_counts(tagged: &FeatureCollection) -> Result<Vec<(f64, usize)>, AnalysisError> {
    let dist_idx = tagged.require_field(BUFFER_DISTANCE)?;
    let mut counts: Vec<(f64, usize)> = Vec::new();
    for f in &tagged.features {
        let d = f.values[dist_idx].as_f64().unwrap_or(0.0);
        match counts.iter_mut().find(|(x, _)| (*x - d).abs() < 1e-9) {
            Some(slot) => slot.1 += 1,
            None => counts.push((d, 1)),
        }
    }
    counts.sort_by(|a, b| a.0.total_cmp(&b.0));
    Ok(counts)
}

fn log_per_distance_counts(label: &str, tagged: &FeatureCollection) -> Result<(), AnalysisError> {
    for (distance, count) in per_distance_counts(tagged)? {
        info!(
            "{} {} feature(s) intersect the {} m buffer ring",
            count, label, distance
        );
    }
    Ok(())
}
