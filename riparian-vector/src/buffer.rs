//! Multi-ring buffering with the "outside only, non-overlapping" ring
//! policy: each ring covers the band between the previous and current
//! distance and never the feature interior.

use crate::algorithms::offset_ring;
use crate::attributes::{AttributeField, FieldData, FieldDataType};
use crate::collection::{Feature, FeatureCollection};
use crate::geometry::{is_hole, Geometry, Polygon};
use crate::VectorError;

pub const BUFFER_DISTANCE: &str = "BUFF_DIST";
pub const RING_AREA: &str = "Ring_Area_Ha";
pub const RING_PERIMETER: &str = "Ring_Prmtr";

/// Normalizes a free-text distance list: comma-split, whitespace-stripped,
/// sorted ascending.
pub fn parse_distances(text: &str) -> Result<Vec<f64>, VectorError> {
    let mut distances = Vec::new();
    for token in text.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            continue;
        }
        let value: f64 = trimmed.parse().map_err(|_| {
            VectorError::Geometry(format!("invalid buffer distance '{}'", trimmed))
        })?;
        if value <= 0.0 {
            return Err(VectorError::Geometry(format!(
                "buffer distance must be positive, got {}",
                value
            )));
        }
        distances.push(value);
    }
    if distances.is_empty() {
        return Err(VectorError::Geometry(
            "no buffer distances supplied".to_string(),
        ));
    }
    distances.sort_by(|a, b| a.total_cmp(b));
    distances.dedup();
    Ok(distances)
}

/// Generates `distances.len()` concentric rings per input polygon feature.
/// Ring i spans the band between distance i-1 (or the feature boundary) and
/// distance i; the inner boundary is carried as a hole so the bands never
/// overlap. Rings for a feature are emitted in ascending distance order and
/// carry the generating distance, band area (hectares) and band perimeter.
pub fn multi_ring_buffer(
    fc: &FeatureCollection,
    distances: &[f64],
) -> Result<FeatureCollection, VectorError> {
    if distances.is_empty() {
        return Err(VectorError::Geometry(
            "no buffer distances supplied".to_string(),
        ));
    }
    let mut fields = fc.fields.clone();
    fields.push(AttributeField::new(BUFFER_DISTANCE, FieldDataType::Real));
    fields.push(AttributeField::new(RING_AREA, FieldDataType::Real));
    fields.push(AttributeField::new(RING_PERIMETER, FieldDataType::Real));

    let mut out = FeatureCollection::new(fields);
    for feature in &fc.features {
        let poly = match &feature.geometry {
            Geometry::Polygon(p) => p,
            _ => {
                return Err(VectorError::Geometry(
                    "multi-ring buffer requires polygon features".to_string(),
                ))
            }
        };
        let outer_rings: Vec<&Vec<crate::geometry::Point2D>> =
            poly.parts.iter().filter(|r| !is_hole(r)).collect();

        let mut previous: Vec<Vec<crate::geometry::Point2D>> =
            outer_rings.iter().map(|r| (*r).clone()).collect();
        for &dist in distances {
            let mut parts = Vec::new();
            for ring in &outer_rings {
                parts.push(offset_ring(ring, dist));
            }
            // The previous boundary becomes the hole bounding the band.
            for inner in &previous {
                let mut hole = inner.clone();
                hole.reverse();
                parts.push(hole);
            }
            let band = Polygon::new(parts);
            let area_ha = band.area() / 10_000.0;
            let perimeter = band.perimeter();

            let mut values = feature.values.clone();
            values.push(FieldData::Real(dist));
            values.push(FieldData::Real(area_ha));
            values.push(FieldData::Real(perimeter));
            previous = band
                .parts
                .iter()
                .filter(|r| !is_hole(r))
                .cloned()
                .collect();
            out.features.push(Feature {
                geometry: Geometry::Polygon(band),
                values,
            });
        }
    }
    Ok(out)
}
