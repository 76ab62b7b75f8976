//! Vector/raster conversion. Polygons are burned in by cell-center
//! containment; regions are traced back out along cell boundaries, so a
//! rasterize/vectorize round trip of grid-aligned polygons is exact.

use std::collections::{BTreeMap, HashMap};

use riparian_vector::geometry::{point_in_ring, ring_area_signed};
use riparian_vector::{FeatureCollection, Geometry, Point2D, Polygon};

use crate::{Raster, RasterConfigs, RasterError};

/// Burns polygon features into a new grid on `base`, writing each feature's
/// `key_field` value into the cells whose centers it contains. Later records
/// overwrite earlier ones where polygons overlap. Non-polygon features are
/// skipped; a null or non-numeric key is an error.
pub fn rasterize_polygons(
    fc: &FeatureCollection,
    key_field: &str,
    base: &RasterConfigs,
) -> Result<Raster, RasterError> {
    let field = fc
        .field_index(key_field)
        .ok_or_else(|| RasterError::Rasterize(format!("missing key field '{}'", key_field)))?;
    let mut output = Raster::initialize_using_config("rasterized.flt", base);
    let rows = base.rows as isize;
    let columns = base.columns as isize;

    for (record, feature) in fc.features.iter().enumerate() {
        let poly = match &feature.geometry {
            Geometry::Polygon(p) => p,
            _ => continue,
        };
        let key = feature.values[field].as_f64().ok_or_else(|| {
            RasterError::Rasterize(format!(
                "record {} has no numeric value in '{}'",
                record, key_field
            ))
        })?;
        let bb = poly.get_bounding_box();
        let first_row = output.get_row_from_y(bb.max_y).max(0);
        let last_row = output.get_row_from_y(bb.min_y).min(rows - 1);
        let first_col = output.get_column_from_x(bb.min_x).max(0);
        let last_col = output.get_column_from_x(bb.max_x).min(columns - 1);
        for row in first_row..=last_row {
            let y = output.get_y_from_row(row);
            for col in first_col..=last_col {
                let center = Point2D::new(output.get_x_from_column(col), y);
                if poly.contains_point(&center) {
                    output.set_value(row, col, key);
                }
            }
        }
    }
    Ok(output)
}

/// Sets cells whose centers fall outside `boundary` to nodata. The grid
/// extent is unchanged.
pub fn clip_to_polygon(raster: &Raster, boundary: &Polygon) -> Raster {
    let mut output = raster.clone();
    let rows = raster.configs.rows as isize;
    let columns = raster.configs.columns as isize;
    for row in 0..rows {
        let y = raster.get_y_from_row(row);
        for col in 0..columns {
            let center = Point2D::new(raster.get_x_from_column(col), y);
            if !boundary.contains_point(&center) {
                output.set_value(row, col, raster.configs.nodata);
            }
        }
    }
    output
}

type Corner = (isize, isize);

/// Traces each distinct cell value back into a polygon along cell
/// boundaries. Returns one multi-ring polygon per value, ordered by
/// ascending value; disconnected cells with the same value become
/// additional outer rings of the same polygon.
pub fn vectorize_regions(raster: &Raster) -> Vec<(i64, Polygon)> {
    let rows = raster.configs.rows as isize;
    let columns = raster.configs.columns as isize;
    let nodata = raster.configs.nodata;

    // Directed boundary edges in corner coordinates (column, row), emitted
    // so each region's cells are traversed clockwise in grid space.
    let mut edges_by_value: BTreeMap<i64, Vec<(Corner, Corner)>> = BTreeMap::new();
    for row in 0..rows {
        for col in 0..columns {
            let v = raster.get_value(row, col);
            if v == nodata {
                continue;
            }
            let id = v as i64;
            let outside = |r: isize, c: isize| -> bool {
                let z = raster.get_value(r, c);
                z == nodata || z as i64 != id
            };
            let edges = edges_by_value.entry(id).or_default();
            if outside(row - 1, col) {
                edges.push(((col, row), (col + 1, row)));
            }
            if outside(row, col + 1) {
                edges.push(((col + 1, row), (col + 1, row + 1)));
            }
            if outside(row + 1, col) {
                edges.push(((col + 1, row + 1), (col, row + 1)));
            }
            if outside(row, col - 1) {
                edges.push(((col, row + 1), (col, row)));
            }
        }
    }

    let mut regions = Vec::with_capacity(edges_by_value.len());
    for (id, edges) in edges_by_value {
        let rings = stitch_rings(&edges);
        let world: Vec<Vec<Point2D>> = rings
            .iter()
            .map(|ring| {
                simplify_collinear(ring)
                    .iter()
                    .map(|(c, r)| {
                        Point2D::new(
                            raster.configs.west + *c as f64 * raster.configs.resolution_x,
                            raster.configs.north - *r as f64 * raster.configs.resolution_y,
                        )
                    })
                    .collect()
            })
            .collect();
        regions.push((id, assemble_polygon(world)));
    }
    regions
}

/// Joins directed edges into closed rings. At corners where a region
/// touches itself diagonally two continuations exist; the sharpest
/// clockwise turn is taken so every ring stays simple.
fn stitch_rings(edges: &[(Corner, Corner)]) -> Vec<Vec<Corner>> {
    let mut sorted = edges.to_vec();
    sorted.sort();
    let mut outgoing: HashMap<Corner, Vec<usize>> = HashMap::new();
    for (i, (start, _)) in sorted.iter().enumerate() {
        outgoing.entry(*start).or_default().push(i);
    }
    let mut used = vec![false; sorted.len()];
    let mut rings = Vec::new();

    for first in 0..sorted.len() {
        if used[first] {
            continue;
        }
        let mut ring = Vec::new();
        let mut edge = first;
        loop {
            used[edge] = true;
            let (start, end) = sorted[edge];
            ring.push(start);
            if end == sorted[first].0 {
                break;
            }
            let dir = (end.0 - start.0, end.1 - start.1);
            // Turn preference: right, straight, left, back.
            let preference = [
                (-dir.1, dir.0),
                dir,
                (dir.1, -dir.0),
                (-dir.0, -dir.1),
            ];
            let candidates = &outgoing[&end];
            let mut next = None;
            'turn: for want in preference {
                for &c in candidates {
                    if used[c] {
                        continue;
                    }
                    let (s, e) = sorted[c];
                    if (e.0 - s.0, e.1 - s.1) == want {
                        next = Some(c);
                        break 'turn;
                    }
                }
            }
            match next {
                Some(c) => edge = c,
                // Boundary edge sets always close; bail rather than loop.
                None => break,
            }
        }
        rings.push(ring);
    }
    rings
}

fn simplify_collinear(ring: &[Corner]) -> Vec<Corner> {
    let n = ring.len();
    if n < 3 {
        return ring.to_vec();
    }
    let mut out = Vec::new();
    for i in 0..n {
        let prev = ring[(i + n - 1) % n];
        let here = ring[i];
        let next = ring[(i + 1) % n];
        let d1 = (here.0 - prev.0, here.1 - prev.1);
        let d2 = (next.0 - here.0, next.1 - here.1);
        if d1 != d2 {
            out.push(here);
        }
    }
    out
}

/// Orders rings so each hole follows the outer ring that contains it.
fn assemble_polygon(rings: Vec<Vec<Point2D>>) -> Polygon {
    let mut outers = Vec::new();
    let mut holes = Vec::new();
    for ring in rings {
        if ring_area_signed(&ring) > 0.0 {
            holes.push(Some(ring));
        } else {
            outers.push(ring);
        }
    }
    let mut parts = Vec::new();
    for outer in outers {
        let assigned: Vec<Vec<Point2D>> = holes
            .iter_mut()
            .filter_map(|slot| {
                let belongs = slot
                    .as_ref()
                    .map(|h| point_in_ring(&h[0], &outer))
                    .unwrap_or(false);
                if belongs {
                    slot.take()
                } else {
                    None
                }
            })
            .collect();
        parts.push(outer);
        parts.extend(assigned);
    }
    // Orphan holes should not occur; keep them rather than drop geometry.
    parts.extend(holes.into_iter().flatten());
    Polygon::new(parts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use riparian_vector::{AttributeField, FieldData, FieldDataType};

    fn configs(rows: usize, columns: usize) -> RasterConfigs {
        RasterConfigs {
            rows,
            columns,
            north: rows as f64 * 10.0,
            south: 0.0,
            east: columns as f64 * 10.0,
            west: 0.0,
            resolution_x: 10.0,
            resolution_y: 10.0,
            nodata: -9999.0,
        }
    }

    fn lake_collection(id: i64, min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> FeatureCollection {
        let mut fc = FeatureCollection::new(vec![AttributeField::new(
            "WATERBODY_POLY_ID",
            FieldDataType::Int,
        )]);
        fc.push(
            Geometry::Polygon(Polygon::rectangle(min_x, min_y, max_x, max_y)),
            vec![FieldData::Int(id)],
        );
        fc
    }

    #[test]
    fn test_rasterize_marks_contained_centers() {
        let fc = lake_collection(7, 10.0, 10.0, 30.0, 30.0);
        let grid = rasterize_polygons(&fc, "WATERBODY_POLY_ID", &configs(4, 4)).unwrap();
        // Cell centers at 15 and 25 fall inside; 5 and 35 do not.
        assert_eq!(grid.get_value(1, 1), 7.0);
        assert_eq!(grid.get_value(2, 2), 7.0);
        assert_eq!(grid.get_value(0, 0), -9999.0);
        assert_eq!(grid.get_value(3, 3), -9999.0);
    }

    #[test]
    fn test_rasterize_missing_key_errors() {
        let fc = lake_collection(7, 0.0, 0.0, 10.0, 10.0);
        assert!(rasterize_polygons(&fc, "NOT_A_FIELD", &configs(2, 2)).is_err());
    }

    #[test]
    fn test_vectorize_single_block() {
        let mut grid = Raster::initialize_using_config("r.flt", &configs(4, 4));
        for row in 1..=2 {
            for col in 1..=2 {
                grid.set_value(row, col, 5.0);
            }
        }
        let regions = vectorize_regions(&grid);
        assert_eq!(regions.len(), 1);
        let (id, poly) = &regions[0];
        assert_eq!(*id, 5);
        assert_eq!(poly.parts.len(), 1);
        assert!((poly.area() - 400.0).abs() < 1e-9);
        let bb = poly.get_bounding_box();
        assert_eq!((bb.min_x, bb.min_y, bb.max_x, bb.max_y), (10.0, 10.0, 30.0, 30.0));
    }

    #[test]
    fn test_vectorize_donut_region() {
        // 3x3 ring of value 1 with a different-valued center.
        let mut grid = Raster::initialize_using_config("r.flt", &configs(5, 5));
        for row in 1..=3 {
            for col in 1..=3 {
                grid.set_value(row, col, 1.0);
            }
        }
        grid.set_value(2, 2, 2.0);
        let regions = vectorize_regions(&grid);
        assert_eq!(regions.len(), 2);
        let (_, ring) = &regions[0];
        assert_eq!(ring.parts.len(), 2); // outer plus hole
        assert!((ring.area() - 800.0).abs() < 1e-9);
        let (_, center) = &regions[1];
        assert!((center.area() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_rasterize_vectorize_round_trip() {
        let fc = lake_collection(42, 20.0, 20.0, 50.0, 40.0);
        let grid = rasterize_polygons(&fc, "WATERBODY_POLY_ID", &configs(6, 6)).unwrap();
        let regions = vectorize_regions(&grid);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].0, 42);
        assert!((regions[0].1.area() - 600.0).abs() < 1e-9);
    }

    #[test]
    fn test_clip_to_polygon_masks_outside() {
        let mut grid = Raster::initialize_using_config("r.flt", &configs(4, 4));
        for row in 0..4 {
            for col in 0..4 {
                grid.set_value(row, col, 1.0);
            }
        }
        let clipped = clip_to_polygon(&grid, &Polygon::rectangle(0.0, 0.0, 20.0, 20.0));
        assert_eq!(clipped.get_value(3, 0), 1.0);
        assert_eq!(clipped.get_value(2, 1), 1.0);
        assert_eq!(clipped.get_value(0, 0), -9999.0);
        assert_eq!(clipped.get_value(3, 3), -9999.0);
    }
}
