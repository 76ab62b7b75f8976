/*
This crate is part of the riparian lakes analysis toolset.
License: MIT
*/

//! The pipeline stages, in execution order. Each stage returns its named
//! outputs plus the scratch artifacts it created; the pipeline retires a
//! stage's scratch once the following stage has consumed its outputs.

pub mod aggregate;
pub mod attach_attributes;
pub mod buffer_rings;
pub mod consolidate;
pub mod criteria;
pub mod delineate;
pub mod export;
pub mod extract_lakes;

use riparian_vector::geojson_io::read_feature_collection;
use riparian_vector::FeatureCollection;

use crate::errors::AnalysisError;

/// Reads an input vector layer; any failure is an input error.
pub(crate) fn read_source(path: &str) -> Result<FeatureCollection, AnalysisError> {
    read_feature_collection(path)
        .map_err(|e| AnalysisError::Input(format!("cannot read source '{}': {}", path, e)))
}
