//! GeoJSON persistence for feature collections. On read, polygon rings are
//! normalized to the internal shapefile convention (outer clockwise, holes
//! counter-clockwise) and closing vertices are dropped; the write path
//! restores RFC 7946 orientation and closure.

use std::fs;
use std::path::Path;

use geojson::{Feature as GjFeature, FeatureCollection as GjFeatureCollection, GeoJson, Geometry as GjGeometry, Value};
use serde_json::{Map as JsonMap, Number, Value as JsonValue};

use crate::attributes::{AttributeField, FieldData, FieldDataType};
use crate::collection::{Feature, FeatureCollection};
use crate::geometry::{ring_area_signed, Geometry, Point2D, Polygon, Polyline};
use crate::VectorError;

fn positions_to_ring(positions: &[Vec<f64>], force_hole: bool) -> Vec<Point2D> {
    let mut ring: Vec<Point2D> = positions
        .iter()
        .filter(|p| p.len() >= 2)
        .map(|p| Point2D::new(p[0], p[1]))
        .collect();
    if ring.len() > 1 && ring[0].distance(ring.last().unwrap()) < 1e-12 {
        ring.pop();
    }
    let signed = ring_area_signed(&ring);
    let is_ccw = signed > 0.0;
    // Internal convention: outer clockwise (negative), holes counter-clockwise.
    if (force_hole && !is_ccw) || (!force_hole && is_ccw) {
        ring.reverse();
    }
    ring
}

fn polygon_from_rings(rings: &[Vec<Vec<f64>>]) -> Vec<Vec<Point2D>> {
    let mut parts = Vec::new();
    for (i, ring) in rings.iter().enumerate() {
        let converted = positions_to_ring(ring, i > 0);
        if converted.len() >= 3 {
            parts.push(converted);
        }
    }
    parts
}

fn line_from_positions(positions: &[Vec<f64>]) -> Vec<Point2D> {
    positions
        .iter()
        .filter(|p| p.len() >= 2)
        .map(|p| Point2D::new(p[0], p[1]))
        .collect()
}

fn convert_geometry(geometry: &GjGeometry) -> Option<Geometry> {
    match &geometry.value {
        Value::Point(p) => {
            if p.len() >= 2 {
                Some(Geometry::Point(Point2D::new(p[0], p[1])))
            } else {
                None
            }
        }
        Value::LineString(ls) => Some(Geometry::Polyline(Polyline::new(vec![
            line_from_positions(ls),
        ]))),
        Value::MultiLineString(mls) => Some(Geometry::Polyline(Polyline::new(
            mls.iter().map(|ls| line_from_positions(ls)).collect(),
        ))),
        Value::Polygon(rings) => Some(Geometry::Polygon(Polygon::new(polygon_from_rings(rings)))),
        Value::MultiPolygon(polys) => {
            let mut parts = Vec::new();
            for rings in polys {
                parts.extend(polygon_from_rings(rings));
            }
            Some(Geometry::Polygon(Polygon::new(parts)))
        }
        _ => None,
    }
}

fn convert_property(value: &JsonValue) -> FieldData {
    match value {
        JsonValue::Null => FieldData::Null,
        JsonValue::Bool(b) => FieldData::Int(*b as i64),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                FieldData::Int(i)
            } else {
                FieldData::Real(n.as_f64().unwrap_or(0.0))
            }
        }
        JsonValue::String(s) => FieldData::Text(s.clone()),
        _ => FieldData::Null,
    }
}

fn field_type_of(value: &FieldData) -> FieldDataType {
    match value {
        FieldData::Int(_) => FieldDataType::Int,
        FieldData::Real(_) => FieldDataType::Real,
        _ => FieldDataType::Text,
    }
}

/// Reads a GeoJSON feature collection. The schema is the union of property
/// names in first-seen order; a field's type is taken from its first
/// non-null occurrence.
pub fn read_feature_collection<P: AsRef<Path>>(path: P) -> Result<FeatureCollection, VectorError> {
    let text = fs::read_to_string(&path)?;
    let geojson: GeoJson = text
        .parse()
        .map_err(|e| VectorError::GeoJson(format!("{}: {}", path.as_ref().display(), e)))?;
    let gj_fc = match geojson {
        GeoJson::FeatureCollection(fc) => fc,
        _ => {
            return Err(VectorError::GeoJson(format!(
                "{}: expected a FeatureCollection",
                path.as_ref().display()
            )))
        }
    };

    let mut fields: Vec<AttributeField> = Vec::new();
    let mut features: Vec<(Option<Geometry>, JsonMap<String, JsonValue>)> = Vec::new();
    for gj_feature in &gj_fc.features {
        let geometry = gj_feature.geometry.as_ref().and_then(convert_geometry);
        let props = gj_feature.properties.clone().unwrap_or_default();
        for (name, value) in &props {
            if !fields.iter().any(|f| &f.name == name) {
                let converted = convert_property(value);
                let field_type = if converted.is_null() {
                    FieldDataType::Text
                } else {
                    field_type_of(&converted)
                };
                fields.push(AttributeField::new(name, field_type));
            }
        }
        features.push((geometry, props));
    }

    let mut fc = FeatureCollection::new(fields);
    for (geometry, props) in features {
        let geometry = match geometry {
            Some(g) => g,
            None => continue,
        };
        let values: Vec<FieldData> = fc
            .fields
            .iter()
            .map(|f| props.get(&f.name).map(convert_property).unwrap_or(FieldData::Null))
            .collect();
        fc.features.push(Feature { geometry, values });
    }
    Ok(fc)
}

fn ring_to_positions(ring: &[Point2D], as_hole: bool) -> Vec<Vec<f64>> {
    let mut pts: Vec<Point2D> = ring.to_vec();
    let is_ccw = ring_area_signed(&pts) > 0.0;
    // RFC 7946: exterior counter-clockwise, holes clockwise.
    if (as_hole && is_ccw) || (!as_hole && !is_ccw) {
        pts.reverse();
    }
    let mut positions: Vec<Vec<f64>> = pts.iter().map(|p| vec![p.x, p.y]).collect();
    if let Some(first) = positions.first().cloned() {
        positions.push(first);
    }
    positions
}

fn geometry_to_value(geometry: &Geometry) -> Value {
    match geometry {
        Geometry::Point(p) => Value::Point(vec![p.x, p.y]),
        Geometry::Polyline(line) => {
            let parts: Vec<Vec<Vec<f64>>> = line
                .parts
                .iter()
                .map(|part| part.iter().map(|p| vec![p.x, p.y]).collect())
                .collect();
            if parts.len() == 1 {
                Value::LineString(parts.into_iter().next().unwrap())
            } else {
                Value::MultiLineString(parts)
            }
        }
        Geometry::Polygon(poly) => {
            // Group each outer ring with the holes that follow it.
            let mut groups: Vec<Vec<Vec<Vec<f64>>>> = Vec::new();
            for ring in &poly.parts {
                let hole = crate::geometry::is_hole(ring);
                if hole && !groups.is_empty() {
                    let last = groups.len() - 1;
                    groups[last].push(ring_to_positions(ring, true));
                } else {
                    groups.push(vec![ring_to_positions(ring, false)]);
                }
            }
            if groups.len() == 1 {
                Value::Polygon(groups.into_iter().next().unwrap())
            } else {
                Value::MultiPolygon(groups)
            }
        }
    }
}

fn value_to_json(value: &FieldData) -> JsonValue {
    match value {
        FieldData::Null => JsonValue::Null,
        FieldData::Int(i) => JsonValue::Number(Number::from(*i)),
        FieldData::Real(r) => Number::from_f64(*r)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null),
        FieldData::Text(s) => JsonValue::String(s.clone()),
    }
}

pub fn write_feature_collection<P: AsRef<Path>>(
    path: P,
    fc: &FeatureCollection,
) -> Result<(), VectorError> {
    let mut gj_features = Vec::with_capacity(fc.len());
    for feature in &fc.features {
        let mut properties = JsonMap::new();
        for (field, value) in fc.fields.iter().zip(&feature.values) {
            properties.insert(field.name.clone(), value_to_json(value));
        }
        gj_features.push(GjFeature {
            bbox: None,
            geometry: Some(GjGeometry::new(geometry_to_value(&feature.geometry))),
            id: None,
            properties: Some(properties),
            foreign_members: None,
        });
    }
    let gj_fc = GjFeatureCollection {
        bbox: None,
        features: gj_features,
        foreign_members: None,
    };
    fs::write(path, GeoJson::FeatureCollection(gj_fc).to_string())?;
    Ok(())
}
