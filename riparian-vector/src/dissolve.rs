//! Dissolve: merge records sharing common key values into single multi-part
//! records, optionally computing aggregate statistics over the merged
//! records. Output groups appear in first-seen input order; merged geometry
//! is the multi-part union of the inputs sharing the key.

use std::collections::HashMap;

use crate::attributes::{compare_values, AttributeField, FieldData, FieldDataType};
use crate::collection::{Feature, FeatureCollection};
use crate::geometry::{Geometry, Polygon, Polyline};
use crate::VectorError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatType {
    Count,
    Min,
    Max,
    Sum,
}

impl StatType {
    fn prefix(&self) -> &'static str {
        match self {
            StatType::Count => "COUNT",
            StatType::Min => "MIN",
            StatType::Max => "MAX",
            StatType::Sum => "SUM",
        }
    }
}

struct Group {
    key_values: Vec<FieldData>,
    members: Vec<usize>,
}

/// Renders a grouping key. Null and empty text collapse to the same key,
/// matching the dissolve behavior on backfilled collections.
fn render_key(values: &[FieldData]) -> String {
    let mut key = String::new();
    for v in values {
        key.push_str(&v.to_string());
        key.push('\u{1f}');
    }
    key
}

fn merge_geometries(features: &[&Feature]) -> Result<Geometry, VectorError> {
    let first = &features[0].geometry;
    match first {
        Geometry::Polygon(_) => {
            let mut parts = Vec::new();
            for f in features {
                match &f.geometry {
                    Geometry::Polygon(p) => parts.extend(p.parts.iter().cloned()),
                    _ => {
                        return Err(VectorError::Geometry(
                            "cannot dissolve mixed geometry types".to_string(),
                        ))
                    }
                }
            }
            Ok(Geometry::Polygon(Polygon::new(parts)))
        }
        Geometry::Polyline(_) => {
            let mut parts = Vec::new();
            for f in features {
                match &f.geometry {
                    Geometry::Polyline(l) => parts.extend(l.parts.iter().cloned()),
                    _ => {
                        return Err(VectorError::Geometry(
                            "cannot dissolve mixed geometry types".to_string(),
                        ))
                    }
                }
            }
            Ok(Geometry::Polyline(Polyline::new(parts)))
        }
        // Point groups keep their first member's location; the aggregate
        // statistics carry the information that matters for them.
        Geometry::Point(p) => Ok(Geometry::Point(*p)),
    }
}

/// Dissolves `fc` on `key_fields`, computing the requested `(field, stat)`
/// aggregates. Statistic output fields are named `<STAT>_<field>`.
pub fn dissolve(
    fc: &FeatureCollection,
    key_fields: &[&str],
    statistics: &[(&str, StatType)],
) -> Result<FeatureCollection, VectorError> {
    let key_indices: Vec<usize> = key_fields
        .iter()
        .map(|name| fc.require_field(name))
        .collect::<Result<Vec<usize>, VectorError>>()?;
    let stat_indices: Vec<usize> = statistics
        .iter()
        .map(|(name, _)| fc.require_field(name))
        .collect::<Result<Vec<usize>, VectorError>>()?;

    let mut fields: Vec<AttributeField> = key_indices
        .iter()
        .map(|i| fc.fields[*i].clone())
        .collect();
    for (name, stat) in statistics {
        let field_type = match stat {
            StatType::Count => FieldDataType::Int,
            _ => FieldDataType::Real,
        };
        fields.push(AttributeField::new(
            &format!("{}_{}", stat.prefix(), name),
            field_type,
        ));
    }

    let mut groups: Vec<Group> = Vec::new();
    let mut lookup: HashMap<String, usize> = HashMap::new();
    for (i, feature) in fc.features.iter().enumerate() {
        let key_values: Vec<FieldData> = key_indices
            .iter()
            .map(|ki| feature.values[*ki].clone())
            .collect();
        let key = render_key(&key_values);
        let gi = *lookup.entry(key).or_insert_with(|| {
            groups.push(Group {
                key_values,
                members: Vec::new(),
            });
            groups.len() - 1
        });
        groups[gi].members.push(i);
    }

    let mut out = FeatureCollection::new(fields);
    for group in &groups {
        let members: Vec<&Feature> = group.members.iter().map(|i| &fc.features[*i]).collect();
        let geometry = merge_geometries(&members)?;
        let mut values = group.key_values.clone();
        for ((_, stat), si) in statistics.iter().zip(&stat_indices) {
            let value = match stat {
                StatType::Count => FieldData::Int(
                    members
                        .iter()
                        .filter(|m| !m.values[*si].is_null())
                        .count() as i64,
                ),
                StatType::Sum => {
                    let sum: f64 = members.iter().filter_map(|m| m.values[*si].as_f64()).sum();
                    FieldData::Real(sum)
                }
                StatType::Min | StatType::Max => {
                    let mut best: Option<&FieldData> = None;
                    for m in &members {
                        let v = &m.values[*si];
                        if v.is_null() {
                            continue;
                        }
                        best = Some(match best {
                            None => v,
                            Some(b) => {
                                let ord = compare_values(v, b);
                                let take = if *stat == StatType::Min {
                                    ord == std::cmp::Ordering::Less
                                } else {
                                    ord == std::cmp::Ordering::Greater
                                };
                                if take {
                                    v
                                } else {
                                    b
                                }
                            }
                        });
                    }
                    best.cloned().unwrap_or(FieldData::Null)
                }
            };
            values.push(value);
        }
        out.features.push(Feature { geometry, values });
    }
    Ok(out)
}
