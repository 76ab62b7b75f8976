/*
This crate is part of the riparian lakes analysis toolset.
License: MIT
*/

//! Stage 3: dissolve lake fragments on the composite key, re-attach the
//! administrative attributes the dissolve discards, and recompute the
//! geometry fields on the merged records.

use riparian_vector::dissolve::dissolve;
use riparian_vector::join::{spatial_join, JoinPredicate, JOIN_COUNT};
use riparian_vector::{AttributeField, FeatureCollection, FieldData, FieldDataType, Geometry};
use tracing::info;

use crate::errors::AnalysisError;
use crate::fields;
use crate::store::{StageScratch, WorkingStore};

pub struct ConsolidateOutput {
    pub lakes_final: FeatureCollection,
    pub scratch: StageScratch,
}

pub fn run(
    store: &WorkingStore,
    attributed: &FeatureCollection,
) -> Result<ConsolidateOutput, AnalysisError> {
    let mut scratch = StageScratch::new();

    info!("Dissolving Lakes based on {}...", fields::POLY_ID);
    let dissolved = dissolve(
        attributed,
        &[fields::POLY_ID, fields::WATERSHED_50K, fields::GNIS_NAME],
        &[],
    )?;
    store.save_vector("VRI_Lakes_Dissolve", &dissolved)?;
    scratch.add("VRI_Lakes_Dissolve");

    info!("Applying Attributes...");
    let mut lakes_final = spatial_join(&dissolved, attributed, JoinPredicate::Intersects, None)?;
    lakes_final.drop_fields(&[
        JOIN_COUNT,
        "WATERBODY_POLY_ID_1",
        "WATERSHED_CODE_50K_1",
        "GNIS_NAME_1_1",
    ]);

    info!("Adding Geometry Information...");
    add_geometry_fields(&mut lakes_final);
    store.save_vector("Lakes_Final", &lakes_final)?;

    Ok(ConsolidateOutput {
        lakes_final,
        scratch,
    })
}

/// Area in hectares, perimeter in meters, and the inside-centroid
/// coordinates, recomputed from the merged geometry.
pub fn add_geometry_fields(fc: &mut FeatureCollection) {
    fc.add_field(AttributeField::new(fields::LAKE_AREA, FieldDataType::Real));
    fc.add_field(AttributeField::new(
        fields::LAKE_PERIMETER,
        FieldDataType::Real,
    ));
    fc.add_field(AttributeField::new(fields::INSIDE_X, FieldDataType::Real));
    fc.add_field(AttributeField::new(fields::INSIDE_Y, FieldDataType::Real));
    let n = fc.fields.len();
    for i in 0..fc.len() {
        if let Geometry::Polygon(poly) = fc.features[i].geometry.clone() {
            let inside = poly.interior_point();
            fc.set_value(i, n - 4, FieldData::Real(poly.area() / 10_000.0));
            fc.set_value(i, n - 3, FieldData::Real(poly.perimeter()));
            fc.set_value(i, n - 2, FieldData::Real(inside.x));
            fc.set_value(i, n - 1, FieldData::Real(inside.y));
        }
    }
}
