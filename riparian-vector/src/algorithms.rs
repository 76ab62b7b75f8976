//! Clipping and offset routines. The convex clip path covers the cases the
//! pipeline needs pure vector answers for (convex study-area boundaries,
//! grid cells); everything else goes through the raster-assisted overlay.

use crate::geometry::{ring_area_signed, Point2D, Polygon, Polyline};

/// True when the ring (implicitly closed) turns in a single direction, so
/// it bounds a convex region. Collinear runs are tolerated; degenerate
/// rings with no turn at all are not convex.
pub fn is_convex_ring(ring: &[Point2D]) -> bool {
    let n = ring.len();
    if n < 3 {
        return false;
    }
    let mut turn = 0.0f64;
    for i in 0..n {
        let a = ring[i];
        let b = ring[(i + 1) % n];
        let c = ring[(i + 2) % n];
        let cross = (b.x - a.x) * (c.y - b.y) - (b.y - a.y) * (c.x - b.x);
        if cross == 0.0 {
            continue;
        }
        if turn == 0.0 {
            turn = cross.signum();
        } else if cross.signum() != turn {
            return false;
        }
    }
    turn != 0.0
}

/// Half-plane test helper: returns > 0 when `p` is on the interior side of
/// the directed clip edge a->b for a clockwise clip ring.
fn inside_edge(p: &Point2D, a: &Point2D, b: &Point2D, sign: f64) -> bool {
    sign * ((b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)) <= 0.0
}

fn edge_intersection(p1: &Point2D, p2: &Point2D, a: &Point2D, b: &Point2D) -> Point2D {
    let a1 = p2.y - p1.y;
    let b1 = p1.x - p2.x;
    let c1 = a1 * p1.x + b1 * p1.y;
    let a2 = b.y - a.y;
    let b2 = a.x - b.x;
    let c2 = a2 * a.x + b2 * a.y;
    let det = a1 * b2 - a2 * b1;
    if det == 0.0 {
        // Parallel; degenerate input. Return the segment end.
        return *p2;
    }
    Point2D::new((b2 * c1 - b1 * c2) / det, (a1 * c2 - a2 * c1) / det)
}

/// Sutherland-Hodgman clip of one ring against a convex clip ring. The clip
/// ring may be stored in either orientation. Returns an empty vec when the
/// subject falls entirely outside.
pub fn clip_ring_convex(subject: &[Point2D], clip: &[Point2D]) -> Vec<Point2D> {
    if subject.is_empty() || clip.len() < 3 {
        return vec![];
    }
    // Clockwise clip rings have negative signed area; flip the half-plane
    // test for counter-clockwise input.
    let sign = if ring_area_signed(clip) < 0.0 { 1.0 } else { -1.0 };
    let mut output: Vec<Point2D> = subject.to_vec();
    let n = clip.len();
    for i in 0..n {
        if output.is_empty() {
            break;
        }
        let a = clip[i];
        let b = clip[(i + 1) % n];
        let input = output;
        output = Vec::with_capacity(input.len() + 4);
        let m = input.len();
        for j in 0..m {
            let current = input[j];
            let previous = input[(j + m - 1) % m];
            let current_in = inside_edge(&current, &a, &b, sign);
            let previous_in = inside_edge(&previous, &a, &b, sign);
            if current_in {
                if !previous_in {
                    output.push(edge_intersection(&previous, &current, &a, &b));
                }
                output.push(current);
            } else if previous_in {
                output.push(edge_intersection(&previous, &current, &a, &b));
            }
        }
    }
    // Drop duplicate consecutive vertices introduced by edge contact.
    let mut cleaned: Vec<Point2D> = Vec::with_capacity(output.len());
    for p in output {
        if cleaned
            .last()
            .map_or(true, |q: &Point2D| q.distance(&p) > 1e-9)
        {
            cleaned.push(p);
        }
    }
    if cleaned.len() > 1 && cleaned[0].distance(cleaned.last().unwrap()) <= 1e-9 {
        cleaned.pop();
    }
    if cleaned.len() < 3 {
        return vec![];
    }
    cleaned
}

/// Clips each ring of `poly` against the first (outer) ring of a convex
/// clip polygon. Returns None when nothing survives.
pub fn clip_polygon_convex(poly: &Polygon, clip: &Polygon) -> Option<Polygon> {
    let clip_ring = clip.parts.first()?;
    let mut parts = Vec::new();
    for ring in &poly.parts {
        let clipped = clip_ring_convex(ring, clip_ring);
        if !clipped.is_empty() {
            parts.push(clipped);
        }
    }
    if parts.is_empty() {
        None
    } else {
        Some(Polygon::new(parts))
    }
}

/// Clips a polyline to an arbitrary simple polygon. Each segment is split at
/// every boundary crossing and sub-segments are kept when their midpoint is
/// inside the polygon.
pub fn clip_polyline_to_polygon(line: &Polyline, poly: &Polygon) -> Option<Polyline> {
    let mut out_parts: Vec<Vec<Point2D>> = Vec::new();
    let mut current: Vec<Point2D> = Vec::new();
    for part in &line.parts {
        for w in part.windows(2) {
            let (p1, p2) = (w[0], w[1]);
            let mut ts = vec![0.0f64, 1.0];
            for ring in &poly.parts {
                let n = ring.len();
                for i in 0..n {
                    let a = ring[i];
                    let b = ring[(i + 1) % n];
                    if let Some(t) = segment_crossing_parameter(&p1, &p2, &a, &b) {
                        ts.push(t);
                    }
                }
            }
            ts.sort_by(|x, y| x.partial_cmp(y).unwrap());
            ts.dedup_by(|x, y| (*x - *y).abs() < 1e-12);
            for pair in ts.windows(2) {
                let (t0, t1) = (pair[0], pair[1]);
                if t1 - t0 < 1e-12 {
                    continue;
                }
                let tm = (t0 + t1) / 2.0;
                let mid = Point2D::new(p1.x + (p2.x - p1.x) * tm, p1.y + (p2.y - p1.y) * tm);
                let q0 = Point2D::new(p1.x + (p2.x - p1.x) * t0, p1.y + (p2.y - p1.y) * t0);
                let q1 = Point2D::new(p1.x + (p2.x - p1.x) * t1, p1.y + (p2.y - p1.y) * t1);
                if poly.contains_point(&mid) {
                    if let Some(last) = current.last() {
                        if last.distance(&q0) > 1e-9 {
                            out_parts.push(std::mem::take(&mut current));
                            current.push(q0);
                        }
                    } else {
                        current.push(q0);
                    }
                    current.push(q1);
                } else if !current.is_empty() {
                    out_parts.push(std::mem::take(&mut current));
                }
            }
        }
        if !current.is_empty() {
            out_parts.push(std::mem::take(&mut current));
        }
    }
    if out_parts.is_empty() {
        None
    } else {
        Some(Polyline::new(out_parts))
    }
}

/// Parameter along p1->p2 where it crosses segment a-b, if it does.
fn segment_crossing_parameter(
    p1: &Point2D,
    p2: &Point2D,
    a: &Point2D,
    b: &Point2D,
) -> Option<f64> {
    let r = (p2.x - p1.x, p2.y - p1.y);
    let s = (b.x - a.x, b.y - a.y);
    let denom = r.0 * s.1 - r.1 * s.0;
    if denom == 0.0 {
        return None;
    }
    let qp = (a.x - p1.x, a.y - p1.y);
    let t = (qp.0 * s.1 - qp.1 * s.0) / denom;
    let u = (qp.0 * r.1 - qp.1 * r.0) / denom;
    if t >= 0.0 && t <= 1.0 && u >= 0.0 && u <= 1.0 {
        Some(t)
    } else {
        None
    }
}

/// Offsets a ring outward by `dist` using miter joins. The returned ring
/// keeps the input orientation. Intended for the generally compact, convex
/// outlines of lake polygons; a reflex vertex produces a local miter spike
/// rather than an arc.
pub fn offset_ring(ring: &[Point2D], dist: f64) -> Vec<Point2D> {
    let n = ring.len();
    if n < 3 || dist == 0.0 {
        return ring.to_vec();
    }
    // For clockwise rings the outward normal of edge (a->b) is the left
    // normal; for counter-clockwise rings it is the right normal.
    let outward = if ring_area_signed(ring) < 0.0 {
        1.0
    } else {
        -1.0
    };
    let mut offset_edges: Vec<(Point2D, Point2D)> = Vec::with_capacity(n);
    for i in 0..n {
        let a = ring[i];
        let b = ring[(i + 1) % n];
        let len = a.distance(&b);
        if len == 0.0 {
            continue;
        }
        let nx = outward * -(b.y - a.y) / len;
        let ny = outward * (b.x - a.x) / len;
        offset_edges.push((
            Point2D::new(a.x + nx * dist, a.y + ny * dist),
            Point2D::new(b.x + nx * dist, b.y + ny * dist),
        ));
    }
    let m = offset_edges.len();
    let mut out = Vec::with_capacity(m);
    for i in 0..m {
        let prev = offset_edges[(i + m - 1) % m];
        let cur = offset_edges[i];
        out.push(edge_intersection(&prev.0, &prev.1, &cur.0, &cur.1));
    }
    out
}

/// Shortest distance from a point to a segment.
pub fn point_segment_distance(p: &Point2D, a: &Point2D, b: &Point2D) -> f64 {
    let abx = b.x - a.x;
    let aby = b.y - a.y;
    let len2 = abx * abx + aby * aby;
    if len2 == 0.0 {
        return p.distance(a);
    }
    let t = (((p.x - a.x) * abx + (p.y - a.y) * aby) / len2).clamp(0.0, 1.0);
    p.distance(&Point2D::new(a.x + t * abx, a.y + t * aby))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convex_ring_detection() {
        let square = Polygon::rectangle(0.0, 0.0, 10.0, 10.0).parts.remove(0);
        assert!(is_convex_ring(&square));
        // Collinear midpoints do not break convexity.
        let with_midpoint = vec![
            Point2D::new(0.0, 10.0),
            Point2D::new(5.0, 10.0),
            Point2D::new(10.0, 10.0),
            Point2D::new(10.0, 0.0),
            Point2D::new(0.0, 0.0),
        ];
        assert!(is_convex_ring(&with_midpoint));
        // A notch introduces a reflex vertex.
        let notched = vec![
            Point2D::new(0.0, 0.0),
            Point2D::new(10.0, 0.0),
            Point2D::new(10.0, 10.0),
            Point2D::new(5.0, 5.0),
            Point2D::new(0.0, 10.0),
        ];
        assert!(!is_convex_ring(&notched));
        assert!(!is_convex_ring(&[Point2D::new(0.0, 0.0), Point2D::new(1.0, 1.0)]));
    }

    #[test]
    fn test_clip_fully_inside() {
        let subject = Polygon::rectangle(2.0, 2.0, 4.0, 4.0);
        let clip = Polygon::rectangle(0.0, 0.0, 10.0, 10.0);
        let result = clip_polygon_convex(&subject, &clip).unwrap();
        assert!((result.area() - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_clip_partial_overlap() {
        let subject = Polygon::rectangle(5.0, 5.0, 15.0, 15.0);
        let clip = Polygon::rectangle(0.0, 0.0, 10.0, 10.0);
        let result = clip_polygon_convex(&subject, &clip).unwrap();
        assert!((result.area() - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_clip_disjoint_yields_none() {
        let subject = Polygon::rectangle(20.0, 20.0, 30.0, 30.0);
        let clip = Polygon::rectangle(0.0, 0.0, 10.0, 10.0);
        assert!(clip_polygon_convex(&subject, &clip).is_none());
    }

    #[test]
    fn test_offset_rectangle_grows_by_distance() {
        let ring = Polygon::rectangle(0.0, 0.0, 10.0, 10.0).parts.remove(0);
        let grown = offset_ring(&ring, 5.0);
        let poly = Polygon::new(vec![grown]);
        // 20 x 20 square with miter corners
        assert!((poly.area() - 400.0).abs() < 1e-6);
    }

    #[test]
    fn test_clip_polyline_crossing() {
        let poly = Polygon::rectangle(0.0, 0.0, 10.0, 10.0);
        let line = Polyline::new(vec![vec![
            Point2D::new(-5.0, 5.0),
            Point2D::new(15.0, 5.0),
        ]]);
        let clipped = clip_polyline_to_polygon(&line, &poly).unwrap();
        assert!((clipped.length() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_clip_polyline_outside() {
        let poly = Polygon::rectangle(0.0, 0.0, 10.0, 10.0);
        let line = Polyline::new(vec![vec![
            Point2D::new(-5.0, 50.0),
            Point2D::new(15.0, 50.0),
        ]]);
        assert!(clip_polyline_to_polygon(&line, &poly).is_none());
    }

    #[test]
    fn test_point_segment_distance() {
        let a = Point2D::new(0.0, 0.0);
        let b = Point2D::new(10.0, 0.0);
        assert!((point_segment_distance(&Point2D::new(5.0, 3.0), &a, &b) - 3.0).abs() < 1e-9);
        assert!((point_segment_distance(&Point2D::new(-4.0, 3.0), &a, &b) - 5.0).abs() < 1e-9);
    }
}
