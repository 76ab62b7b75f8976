/*
This crate is part of the riparian lakes analysis toolset.
License: MIT
*/

//! Vector side of the geoprocessing engine: the feature/attribute data
//! model and the operations the analysis pipeline orchestrates, namely
//! attribute-predicate select, clip, spatial join with configurable field
//! projection, dissolve with aggregate statistics, and multi-ring
//! buffering. All operations are deterministic given identical inputs.

pub mod algorithms;
pub mod attributes;
pub mod buffer;
pub mod collection;
pub mod dissolve;
pub mod geojson_io;
pub mod geometry;
pub mod join;
pub mod predicate;

pub use attributes::{AttributeField, FieldData, FieldDataType};
pub use collection::{Feature, FeatureCollection};
pub use geometry::{BoundingBox, Geometry, Point2D, Polygon, Polyline};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum VectorError {
    #[error("attribute field '{0}' not found")]
    MissingField(String),

    #[error("invalid predicate: {0}")]
    Predicate(String),

    #[error("geometry operation failed: {0}")]
    Geometry(String),

    #[error("GeoJSON error: {0}")]
    GeoJson(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
