/*
This crate is part of the riparian lakes analysis toolset.
License: MIT
*/

//! The end-to-end analysis pipeline. Stages run in a fixed order, each
//! consuming the previous stage's in-memory outputs; a stage's scratch
//! artifacts are retired only after the following stage has succeeded, so
//! a failed run leaves everything on disk for inspection.

use std::path::Path;

use tracing::{debug, info};

use crate::args::RunParameters;
use crate::errors::AnalysisError;
use crate::stages;
use crate::store::WorkingStore;

fn banner(message: &str) {
    info!("*************************************");
    info!("{}", message);
    info!("*************************************");
}

/// Checks every required source path before any work starts. A missing
/// input fails the run up front rather than mid-pipeline.
pub fn validate_inputs(params: &RunParameters) -> Result<(), AnalysisError> {
    let mut required: Vec<(&str, &str)> = vec![
        ("area of interest", &params.aoi_file),
        ("VRI", &params.vri),
        ("TSA", &params.tsa),
        ("TFL", &params.tfl),
        ("private land", &params.private_land),
        ("BEC", &params.bec),
        ("FWA", &params.fwa),
        ("elevation surface", &params.dem),
        ("roads", &params.roads),
        ("streams", &params.streams),
        ("fish observations", &params.fish),
    ];
    if let Some(bridges) = &params.bridges {
        required.push(("bridges", bridges));
    }
    for (label, path) in required {
        if !Path::new(path).is_file() {
            return Err(AnalysisError::Input(format!(
                "{} source '{}' does not exist",
                label, path
            )));
        }
    }
    Ok(())
}

pub fn run(params: &RunParameters) -> Result<(), AnalysisError> {
    let store = WorkingStore::open(&params.gdb)?;
    if let Ok(text) = serde_json::to_string(params) {
        debug!("run parameters: {}", text);
    }

    banner("Initiating Extract Lakes Process");
    let extracted = stages::extract_lakes::run(params, &store)?;
    let attributed = stages::attach_attributes::run(params, &store, &extracted.lakes)?;
    extracted.scratch.retire(&store);

    let consolidated = stages::consolidate::run(&store, &attributed.lakes)?;
    attributed.scratch.retire(&store);

    let selected = stages::criteria::run(params, &store, &consolidated.lakes_final)?;
    consolidated.scratch.retire(&store);
    banner("Completed Extract Lakes Process");

    let rings = stages::buffer_rings::run(params, &store, &selected.effective)?;
    selected.scratch.retire(&store);

    banner("Initiating Watershed Delineation Process");
    let delineated = stages::delineate::run(
        params,
        &store,
        &extracted.study_area,
        &extracted.vri_study_area,
        &selected.effective,
        &rings.rings,
    )?;
    rings.scratch.retire(&store);

    banner("Initiating Watershed Statistics Process");
    let aggregated = stages::aggregate::run(
        params,
        &store,
        &delineated,
        &consolidated.lakes_final,
        &extracted.vri_study_area,
    )?;
    delineated.scratch.retire(&store);

    stages::export::run(
        &store,
        &consolidated.lakes_final,
        selected.criteria.as_ref(),
        &aggregated.table,
    )?;
    aggregated.scratch.retire(&store);

    banner("Analysis Complete");
    Ok(())
}
