/*
This crate is part of the riparian lakes analysis toolset.
License: MIT
*/

//! Stage 5: concentric outside-only buffer rings around each lake at the
//! caller-specified distances.

use riparian_vector::buffer::{multi_ring_buffer, parse_distances};
use riparian_vector::FeatureCollection;
use tracing::info;

use crate::args::RunParameters;
use crate::errors::AnalysisError;
use crate::store::{StageScratch, WorkingStore};

pub struct BufferOutput {
    pub rings: FeatureCollection,
    pub distances: Vec<f64>,
    pub scratch: StageScratch,
}

pub fn run(
    params: &RunParameters,
    store: &WorkingStore,
    lakes: &FeatureCollection,
) -> Result<BufferOutput, AnalysisError> {
    let scratch = StageScratch::new();
    let distances = parse_distances(&params.buffers)?;
    info!(
        "Generating {} buffer ring(s) per lake at distances {:?}...",
        distances.len(),
        distances
    );
    let rings = multi_ring_buffer(lakes, &distances)?;
    info!(
        "{} ring(s) generated for {} lake(s)",
        rings.len(),
        lakes.len()
    );
    store.save_vector("Lakes_Buffers", &rings)?;

    Ok(BufferOutput {
        rings,
        distances,
        scratch,
    })
}
