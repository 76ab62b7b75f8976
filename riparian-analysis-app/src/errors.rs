/*
This crate is part of the riparian lakes analysis toolset.
License: MIT
*/

use riparian_raster::RasterError;
use riparian_vector::VectorError;
use thiserror::Error;

/// Run-level error taxonomy. Every stage failure maps into one of these;
/// no stage recovers from a predecessor's failure.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("input error: {0}")]
    Input(String),

    #[error("geometry operation failed: {0}")]
    GeometryOperation(String),

    #[error("schema error: {0}")]
    Schema(String),

    #[error("data integrity violation: {0}")]
    DataIntegrity(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<VectorError> for AnalysisError {
    fn from(e: VectorError) -> AnalysisError {
        match e {
            VectorError::MissingField(name) => {
                AnalysisError::Schema(format!("attribute field '{}' not found", name))
            }
            VectorError::Predicate(msg) => {
                AnalysisError::Input(format!("invalid predicate: {}", msg))
            }
            VectorError::Geometry(msg) => AnalysisError::GeometryOperation(msg),
            VectorError::GeoJson(msg) => AnalysisError::Input(format!("GeoJSON error: {}", msg)),
            VectorError::Io(e) => AnalysisError::Io(e),
        }
    }
}

impl From<RasterError> for AnalysisError {
    fn from(e: RasterError) -> AnalysisError {
        match e {
            RasterError::Format(msg) => {
                AnalysisError::Input(format!("unsupported raster format '{}'", msg))
            }
            RasterError::Header(msg) => {
                AnalysisError::Input(format!("invalid raster header: {}", msg))
            }
            RasterError::GeometryMismatch => {
                AnalysisError::GeometryOperation("raster grids do not share geometry".to_string())
            }
            RasterError::Rasterize(msg) => {
                AnalysisError::GeometryOperation(format!("cannot rasterize: {}", msg))
            }
            RasterError::Io(e) => AnalysisError::Io(e),
        }
    }
}
