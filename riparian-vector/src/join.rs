//! One-to-one, keep-all spatial join. Every target record appears exactly
//! once in the output; unmatched source attributes stay null. When several
//! source candidates satisfy the predicate, the candidate with the lowest
//! source record index wins. A `Join_Count` field records the number of
//! candidates that matched.

use rstar::{RTree, RTreeObject, AABB};

use crate::attributes::{project, AttributeField, FieldData, FieldDataType};
use crate::collection::FeatureCollection;
use crate::geometry::Geometry;
use crate::VectorError;

pub const JOIN_COUNT: &str = "Join_Count";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinPredicate {
    Within,
    Intersects,
}

struct IndexedRecord {
    envelope: AABB<[f64; 2]>,
    index: usize,
}

impl RTreeObject for IndexedRecord {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

fn matches(target: &Geometry, source: &Geometry, predicate: JoinPredicate) -> bool {
    let poly = match source {
        Geometry::Polygon(p) => p,
        _ => return false,
    };
    match predicate {
        JoinPredicate::Within => target.within_polygon(poly),
        JoinPredicate::Intersects => target.intersects_polygon(poly),
    }
}

/// Joins `source` attributes onto `target`. `keep` is the field allow-list
/// applied to both sides through a fresh projection; `None` keeps every
/// field.
pub fn spatial_join(
    target: &FeatureCollection,
    source: &FeatureCollection,
    predicate: JoinPredicate,
    keep: Option<&[&str]>,
) -> Result<FeatureCollection, VectorError> {
    let projected = project(&target.fields, &source.fields, keep);
    let mut fields = vec![AttributeField::new(JOIN_COUNT, FieldDataType::Int)];
    fields.extend(projected);

    // Which output slot each retained target/source field feeds. Slot 0 is
    // Join_Count.
    let mut target_slots: Vec<(usize, usize)> = Vec::new(); // (target idx, out idx)
    let mut source_slots: Vec<(usize, usize)> = Vec::new();
    let mut out_idx = 1;
    for (ti, f) in target.fields.iter().enumerate() {
        if keep.map_or(true, |list| list.iter().any(|k| *k == f.name)) {
            target_slots.push((ti, out_idx));
            out_idx += 1;
        }
    }
    for (si, f) in source.fields.iter().enumerate() {
        if keep.map_or(true, |list| list.iter().any(|k| *k == f.name)) {
            source_slots.push((si, out_idx));
            out_idx += 1;
        }
    }

    let tree = RTree::bulk_load(
        source
            .features
            .iter()
            .enumerate()
            .map(|(i, f)| {
                let bb = f.geometry.get_bounding_box();
                IndexedRecord {
                    envelope: AABB::from_corners([bb.min_x, bb.min_y], [bb.max_x, bb.max_y]),
                    index: i,
                }
            })
            .collect(),
    );

    let mut out = FeatureCollection::new(fields);
    for feature in &target.features {
        let bb = feature.geometry.get_bounding_box();
        let query = AABB::from_corners([bb.min_x, bb.min_y], [bb.max_x, bb.max_y]);
        let mut candidates: Vec<usize> = tree
            .locate_in_envelope_intersecting(&query)
            .map(|r| r.index)
            .collect();
        candidates.sort_unstable();

        let mut join_count = 0i64;
        let mut winner: Option<usize> = None;
        for ci in candidates {
            if matches(&feature.geometry, &source.features[ci].geometry, predicate) {
                join_count += 1;
                if winner.is_none() {
                    winner = Some(ci);
                }
            }
        }

        let mut values = vec![FieldData::Null; out.fields.len()];
        values[0] = FieldData::Int(join_count);
        for (ti, oi) in &target_slots {
            values[*oi] = feature.values[*ti].clone();
        }
        if let Some(w) = winner {
            for (si, oi) in &source_slots {
                values[*oi] = source.features[w].values[*si].clone();
            }
        }
        out.features.push(crate::collection::Feature {
            geometry: feature.geometry.clone(),
            values,
        });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::{AttributeField, FieldDataType};
    use crate::geometry::{Geometry, Polygon};

    fn zones() -> FeatureCollection {
        let mut fc = FeatureCollection::new(vec![AttributeField::new(
            "MAP_LABEL",
            FieldDataType::Text,
        )]);
        fc.push(
            Geometry::Polygon(Polygon::rectangle(0.0, 0.0, 50.0, 100.0)),
            vec![FieldData::Text("SBSdk".into())],
        );
        fc.push(
            Geometry::Polygon(Polygon::rectangle(50.0, 0.0, 100.0, 100.0)),
            vec![FieldData::Text("ESSFmc".into())],
        );
        fc
    }

    fn lakes() -> FeatureCollection {
        let mut fc = FeatureCollection::new(vec![AttributeField::new(
            "FEATURE_ID",
            FieldDataType::Int,
        )]);
        fc.push(
            Geometry::Polygon(Polygon::rectangle(10.0, 10.0, 20.0, 20.0)),
            vec![FieldData::Int(1)],
        );
        fc.push(
            Geometry::Polygon(Polygon::rectangle(60.0, 60.0, 70.0, 70.0)),
            vec![FieldData::Int(2)],
        );
        fc.push(
            Geometry::Polygon(Polygon::rectangle(200.0, 200.0, 210.0, 210.0)),
            vec![FieldData::Int(3)],
        );
        fc
    }

    #[test]
    fn test_within_join_keeps_all_targets() {
        let joined = spatial_join(
            &lakes(),
            &zones(),
            JoinPredicate::Within,
            Some(&["FEATURE_ID", "MAP_LABEL"]),
        )
        .unwrap();
        assert_eq!(joined.len(), 3);
        let label = joined.field_index("MAP_LABEL").unwrap();
        assert_eq!(*joined.value(0, label), FieldData::Text("SBSdk".into()));
        assert_eq!(*joined.value(1, label), FieldData::Text("ESSFmc".into()));
        // The unmatched lake is retained with a null label.
        assert_eq!(*joined.value(2, label), FieldData::Null);
        let jc = joined.field_index(JOIN_COUNT).unwrap();
        assert_eq!(*joined.value(2, jc), FieldData::Int(0));
    }

    #[test]
    fn test_tie_break_lowest_source_index() {
        let mut overlapping = zones();
        // A second polygon covering the first lake entirely; record index 2.
        overlapping.push(
            Geometry::Polygon(Polygon::rectangle(0.0, 0.0, 100.0, 100.0)),
            vec![FieldData::Text("ZZZ".into())],
        );
        let joined = spatial_join(
            &lakes(),
            &overlapping,
            JoinPredicate::Within,
            Some(&["FEATURE_ID", "MAP_LABEL"]),
        )
        .unwrap();
        let label = joined.field_index("MAP_LABEL").unwrap();
        let jc = joined.field_index(JOIN_COUNT).unwrap();
        assert_eq!(*joined.value(0, label), FieldData::Text("SBSdk".into()));
        assert_eq!(*joined.value(0, jc), FieldData::Int(2));
    }

    #[test]
    fn test_intersects_join() {
        let mut straddling = FeatureCollection::new(vec![AttributeField::new(
            "FEATURE_ID",
            FieldDataType::Int,
        )]);
        straddling.push(
            Geometry::Polygon(Polygon::rectangle(40.0, 40.0, 60.0, 60.0)),
            vec![FieldData::Int(9)],
        );
        let within = spatial_join(&straddling, &zones(), JoinPredicate::Within, None).unwrap();
        let intersect =
            spatial_join(&straddling, &zones(), JoinPredicate::Intersects, None).unwrap();
        let jc_w = within.field_index(JOIN_COUNT).unwrap();
        let jc_i = intersect.field_index(JOIN_COUNT).unwrap();
        assert_eq!(*within.value(0, jc_w), FieldData::Int(0));
        assert_eq!(*intersect.value(0, jc_i), FieldData::Int(2));
    }
}
