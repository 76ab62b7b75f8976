/*
This crate is part of the riparian lakes analysis toolset.
License: MIT
*/

//! Stage 2: the chained administrative joins (BEC label, TSA, TFL, private
//! land, FWA lakes) followed by the waterbody identifier backfill. A fresh
//! field projection from one allow-list is computed for every join in the
//! chain.

use std::collections::HashSet;

use riparian_vector::join::{spatial_join, JoinPredicate, JOIN_COUNT};
use riparian_vector::{FeatureCollection, FieldData};
use tracing::info;

use crate::args::RunParameters;
use crate::errors::AnalysisError;
use crate::fields;
use crate::stages::read_source;
use crate::store::{StageScratch, WorkingStore};

pub struct AttachOutput {
    pub lakes: FeatureCollection,
    pub scratch: StageScratch,
}

pub fn run(
    params: &RunParameters,
    store: &WorkingStore,
    lakes: &FeatureCollection,
) -> Result<AttachOutput, AnalysisError> {
    let mut scratch = StageScratch::new();
    let keep: &[&str] = &fields::JOIN_KEEP;

    info!("Joining BEC Label to VRI Lakes...");
    let bec = read_source(&params.bec)?;
    let bec_lakes = spatial_join(lakes, &bec, JoinPredicate::Within, Some(keep))?;
    store.save_vector("BEC_Lakes", &bec_lakes)?;
    scratch.add("BEC_Lakes");

    info!("Joining TSA Information to VRI Lakes...");
    let tsa = read_source(&params.tsa)?;
    let tsa_lakes = spatial_join(&bec_lakes, &tsa, JoinPredicate::Within, Some(keep))?;
    store.save_vector("VRI_Lakes_TSA", &tsa_lakes)?;
    scratch.add("VRI_Lakes_TSA");

    info!("Joining TFL Information to VRI Lakes...");
    let tfl = read_source(&params.tfl)?;
    let tfl_lakes = spatial_join(&tsa_lakes, &tfl, JoinPredicate::Within, Some(keep))?;
    store.save_vector("VRI_Lakes_TFL", &tfl_lakes)?;
    scratch.add("VRI_Lakes_TFL");

    info!("Joining Private Land Information to VRI Lakes...");
    let private = read_source(&params.private_land)?;
    let mut private_lakes = spatial_join(&tfl_lakes, &private, JoinPredicate::Within, Some(keep))?;
    private_lakes.drop_fields(&[JOIN_COUNT]);
    store.save_vector("VRI_Lakes_Private", &private_lakes)?;
    scratch.add("VRI_Lakes_Private");

    info!("Joining FWA Lake Information to VRI Lakes...");
    let fwa = read_source(&params.fwa)?;
    let mut fwa_lakes = spatial_join(&private_lakes, &fwa, JoinPredicate::Intersects, None)?;
    fwa_lakes.drop_fields(&[JOIN_COUNT]);

    info!("Filling NULL Values in {}...", fields::POLY_ID);
    backfill_identifiers(&mut fwa_lakes)?;
    store.save_vector("VRI_Lakes_FWA", &fwa_lakes)?;
    scratch.add("VRI_Lakes_FWA");

    Ok(AttachOutput {
        lakes: fwa_lakes,
        scratch,
    })
}

/// Assigns synthetic identifiers to records with a null waterbody id, in
/// record order starting from the fixed base. A synthetic id colliding with
/// a pre-existing real id is a data integrity failure.
pub fn backfill_identifiers(fc: &mut FeatureCollection) -> Result<(), AnalysisError> {
    let id_idx = fc.require_field(fields::POLY_ID)?;
    let existing: HashSet<i64> = fc
        .features
        .iter()
        .filter_map(|f| f.values[id_idx].as_f64())
        .map(|v| v as i64)
        .collect();

    let mut next = fields::NULL_ID_REPLACE;
    for i in 0..fc.len() {
        if fc.value(i, id_idx).is_null() {
            if existing.contains(&next) {
                return Err(AnalysisError::DataIntegrity(format!(
                    "synthetic identifier {} collides with an existing {}",
                    next,
                    fields::POLY_ID
                )));
            }
            fc.set_value(i, id_idx, FieldData::Int(next));
            next += 1;
        }
    }
    Ok(())
}
