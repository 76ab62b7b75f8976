/*
This crate is part of the riparian lakes analysis toolset.
License: MIT
*/

//! Stage 1: derive the study area, clip the VRI to it, pull out the lake
//! polygons, and trim their schema to the retained field list.

use riparian_raster::{Raster, RasterConfigs};
use riparian_vector::algorithms::{clip_polygon_convex, is_convex_ring};
use riparian_vector::predicate::{select, Predicate};
use riparian_vector::{FeatureCollection, FieldData, Geometry, Polygon};
use riparian_vector::{AttributeField, FieldDataType};
use tracing::info;

use crate::args::RunParameters;
use crate::errors::AnalysisError;
use crate::fields;
use crate::overlay;
use crate::stages::read_source;
use crate::store::{StageScratch, WorkingStore};

pub struct ExtractOutput {
    pub study_area: FeatureCollection,
    pub vri_study_area: FeatureCollection,
    pub lakes: FeatureCollection,
    pub scratch: StageScratch,
}

/// Builds `field IN ('a', 'b')` from a semicolon-separated value list.
/// Pre-quoted values are accepted.
fn in_list_predicate(field: &str, values: &[&str]) -> String {
    let quoted: Vec<String> = values
        .iter()
        .map(|v| format!("'{}'", v.trim_matches('\'')))
        .collect();
    format!("{} IN ({})", field, quoted.join(", "))
}

/// Sutherland-Hodgman only holds for a single convex clip ring.
fn exact_clip_ok(boundary: &Polygon) -> bool {
    boundary.parts.len() == 1 && is_convex_ring(&boundary.parts[0])
}

/// Clips a land-cover polygon to one study-area boundary. Convex boundaries
/// take the exact vector path; concave or multi-ring boundaries fall back to
/// the raster-assisted overlay on the analysis grid.
fn clip_to_boundary(
    poly: &Polygon,
    boundary: &Polygon,
    grid: Option<&RasterConfigs>,
) -> Option<Polygon> {
    match grid {
        Some(configs) if !exact_clip_ok(boundary) => {
            overlay::intersect_polygons(poly, boundary, configs)
        }
        _ => clip_polygon_convex(poly, boundary),
    }
}

pub fn run(
    params: &RunParameters,
    store: &WorkingStore,
) -> Result<ExtractOutput, AnalysisError> {
    let mut scratch = StageScratch::new();

    info!("Extracting AOI...");
    let aoi = read_source(&params.aoi_file)?;
    let study_area = match (&params.aoi_field, &params.aoi_name) {
        (Some(field), Some(name)) => {
            let names: Vec<&str> = name.split(';').collect();
            let predicate = Predicate::parse(&in_list_predicate(field, &names))?;
            select(&aoi, &predicate)?
        }
        _ => aoi,
    };
    if study_area.is_empty() {
        return Err(AnalysisError::Input(format!(
            "no study-area records matched '{}'",
            params.aoi_name.as_deref().unwrap_or("")
        )));
    }
    store.save_vector("Study_Area", &study_area)?;

    info!("Clipping VRI to AOI...");
    let vri = read_source(&params.vri)?;
    // The analysis grid is only needed when a study-area boundary is
    // concave; the common rectangular AOI never touches the DEM here.
    let needs_grid = study_area.features.iter().any(|f| match &f.geometry {
        Geometry::Polygon(p) => !exact_clip_ok(p),
        _ => false,
    });
    let grid = if needs_grid {
        let dem = Raster::new(&params.dem, "r").map_err(|e| {
            AnalysisError::Input(format!(
                "cannot read elevation surface '{}': {}",
                params.dem, e
            ))
        })?;
        Some(dem.configs)
    } else {
        None
    };
    let mut vri_study_area = FeatureCollection::new(vri.fields.clone());
    for feature in &vri.features {
        let poly = match &feature.geometry {
            Geometry::Polygon(p) => p,
            _ => continue,
        };
        for clip_feature in &study_area.features {
            if let Geometry::Polygon(boundary) = &clip_feature.geometry {
                if let Some(piece) = clip_to_boundary(poly, boundary, grid.as_ref()) {
                    vri_study_area.push(Geometry::Polygon(piece), feature.values.clone());
                }
            }
        }
    }

    // Categorize projected age codes into readable classes; the attributed
    // buffer rings pick this field up later.
    let proj_age = vri_study_area.require_field(fields::PROJ_AGE_CLASS)?;
    vri_study_area.add_field(AttributeField::new(fields::AGE_CLASS, FieldDataType::Text));
    let age_idx = vri_study_area.fields.len() - 1;
    for i in 0..vri_study_area.len() {
        let code = vri_study_area.value(i, proj_age).to_string();
        let class = fields::age_class(&code);
        vri_study_area.set_value(i, age_idx, FieldData::Text(class.to_string()));
    }
    store.save_vector("VRI_Study_Area", &vri_study_area)?;

    info!("Extracting Lakes from the VRI...");
    let lake_filter = Predicate::parse(&in_list_predicate(
        fields::LAKE_CATEGORY_FIELD,
        &fields::LAKE_CATEGORY_VALUES,
    ))?;
    let mut lakes = select(&vri_study_area, &lake_filter)?;
    lakes.retain_fields(&fields::EXTRACT_KEEP);
    store.save_vector("VRI_Lakes", &lakes)?;
    scratch.add("VRI_Lakes");

    Ok(ExtractOutput {
        study_area,
        vri_study_area,
        lakes,
        scratch,
    })
}
