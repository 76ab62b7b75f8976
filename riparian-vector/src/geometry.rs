/*
This module is part of the riparian lakes analysis toolset.
License: MIT
*/

//! Planar geometry primitives used by the vector engine. Polygons follow the
//! shapefile ring convention: outer rings are stored clockwise (negative
//! signed area) and holes counter-clockwise. Rings are implicitly closed;
//! the first vertex is not repeated.

use std::f64;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Point2D {
        Point2D { x, y }
    }

    pub fn distance(&self, other: &Point2D) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    pub fn new_empty() -> BoundingBox {
        BoundingBox {
            min_x: f64::INFINITY,
            min_y: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            max_y: f64::NEG_INFINITY,
        }
    }

    pub fn from_points(points: &[Point2D]) -> BoundingBox {
        let mut bb = BoundingBox::new_empty();
        for p in points {
            bb.expand_to(p);
        }
        bb
    }

    pub fn expand_to(&mut self, p: &Point2D) {
        if p.x < self.min_x {
            self.min_x = p.x;
        }
        if p.y < self.min_y {
            self.min_y = p.y;
        }
        if p.x > self.max_x {
            self.max_x = p.x;
        }
        if p.y > self.max_y {
            self.max_y = p.y;
        }
    }

    pub fn expand(&mut self, other: &BoundingBox) {
        if other.min_x < self.min_x {
            self.min_x = other.min_x;
        }
        if other.min_y < self.min_y {
            self.min_y = other.min_y;
        }
        if other.max_x > self.max_x {
            self.max_x = other.max_x;
        }
        if other.max_y > self.max_y {
            self.max_y = other.max_y;
        }
    }

    pub fn overlaps(&self, other: &BoundingBox) -> bool {
        self.min_x <= other.max_x
            && self.max_x >= other.min_x
            && self.min_y <= other.max_y
            && self.max_y >= other.min_y
    }

    pub fn contains_point(&self, p: &Point2D) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.y >= self.min_y && p.y <= self.max_y
    }
}

/// Signed shoelace area of a ring. Negative for clockwise (outer) rings,
/// positive for counter-clockwise (hole) rings.
pub fn ring_area_signed(ring: &[Point2D]) -> f64 {
    if ring.len() < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    let n = ring.len();
    for i in 0..n {
        let p1 = ring[i];
        let p2 = ring[(i + 1) % n];
        sum += p1.x * p2.y - p2.x * p1.y;
    }
    sum / 2.0
}

pub fn ring_perimeter(ring: &[Point2D]) -> f64 {
    let n = ring.len();
    if n < 2 {
        return 0.0;
    }
    let mut length = 0.0;
    for i in 0..n {
        length += ring[i].distance(&ring[(i + 1) % n]);
    }
    length
}

pub fn is_hole(ring: &[Point2D]) -> bool {
    ring_area_signed(ring) > 0.0
}

/// Even-odd ray cast against a single ring. Points exactly on an edge are
/// not guaranteed a particular result.
pub fn point_in_ring(p: &Point2D, ring: &[Point2D]) -> bool {
    let n = ring.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let pi = ring[i];
        let pj = ring[j];
        if (pi.y > p.y) != (pj.y > p.y) {
            let x_cross = (pj.x - pi.x) * (p.y - pi.y) / (pj.y - pi.y) + pi.x;
            if p.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

fn orientation(a: &Point2D, b: &Point2D, c: &Point2D) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

/// True if segment a1-a2 intersects segment b1-b2, including endpoint and
/// collinear-overlap contact.
pub fn segments_intersect(a1: &Point2D, a2: &Point2D, b1: &Point2D, b2: &Point2D) -> bool {
    let d1 = orientation(b1, b2, a1);
    let d2 = orientation(b1, b2, a2);
    let d3 = orientation(a1, a2, b1);
    let d4 = orientation(a1, a2, b2);

    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }

    let on_segment = |p: &Point2D, q: &Point2D, r: &Point2D| -> bool {
        r.x >= p.x.min(q.x) && r.x <= p.x.max(q.x) && r.y >= p.y.min(q.y) && r.y <= p.y.max(q.y)
    };

    (d1 == 0.0 && on_segment(b1, b2, a1))
        || (d2 == 0.0 && on_segment(b1, b2, a2))
        || (d3 == 0.0 && on_segment(a1, a2, b1))
        || (d4 == 0.0 && on_segment(a1, a2, b2))
}

/// A multi-part polygon. Each part is a ring; outer rings clockwise, holes
/// counter-clockwise. A hole belongs to the most recent outer ring that
/// precedes it in `parts`.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    pub parts: Vec<Vec<Point2D>>,
}

impl Polygon {
    pub fn new(parts: Vec<Vec<Point2D>>) -> Polygon {
        Polygon { parts }
    }

    /// Builds a single clockwise rectangle ring.
    pub fn rectangle(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Polygon {
        Polygon {
            parts: vec![vec![
                Point2D::new(min_x, max_y),
                Point2D::new(max_x, max_y),
                Point2D::new(max_x, min_y),
                Point2D::new(min_x, min_y),
            ]],
        }
    }

    pub fn area(&self) -> f64 {
        self.parts.iter().map(|r| -ring_area_signed(r)).sum()
    }

    pub fn perimeter(&self) -> f64 {
        self.parts.iter().map(|r| ring_perimeter(r)).sum()
    }

    pub fn get_bounding_box(&self) -> BoundingBox {
        let mut bb = BoundingBox::new_empty();
        for part in &self.parts {
            for p in part {
                bb.expand_to(p);
            }
        }
        bb
    }

    /// Area-weighted centroid over all rings; holes subtract through the
    /// sign of their shoelace terms.
    pub fn centroid(&self) -> Point2D {
        let mut cx = 0.0;
        let mut cy = 0.0;
        let mut total = 0.0;
        for ring in &self.parts {
            let n = ring.len();
            if n < 3 {
                continue;
            }
            for i in 0..n {
                let p1 = ring[i];
                let p2 = ring[(i + 1) % n];
                let cross = p1.x * p2.y - p2.x * p1.y;
                cx += (p1.x + p2.x) * cross;
                cy += (p1.y + p2.y) * cross;
                total += cross;
            }
        }
        if total == 0.0 {
            // Degenerate; fall back to the vertex mean.
            let mut sx = 0.0;
            let mut sy = 0.0;
            let mut count = 0usize;
            for ring in &self.parts {
                for p in ring {
                    sx += p.x;
                    sy += p.y;
                    count += 1;
                }
            }
            if count == 0 {
                return Point2D::new(0.0, 0.0);
            }
            return Point2D::new(sx / count as f64, sy / count as f64);
        }
        Point2D::new(cx / (3.0 * total), cy / (3.0 * total))
    }

    /// A point guaranteed to fall inside the polygon: the centroid when it
    /// lands inside, otherwise the midpoint of the widest interior span of
    /// the horizontal scanline through the centroid.
    pub fn interior_point(&self) -> Point2D {
        let c = self.centroid();
        if self.contains_point(&c) {
            return c;
        }
        let mut xs: Vec<f64> = Vec::new();
        for ring in &self.parts {
            let n = ring.len();
            for i in 0..n {
                let p1 = ring[i];
                let p2 = ring[(i + 1) % n];
                if (p1.y > c.y) != (p2.y > c.y) {
                    xs.push((p2.x - p1.x) * (c.y - p1.y) / (p2.y - p1.y) + p1.x);
                }
            }
        }
        xs.sort_by(|a, b| a.total_cmp(b));
        let mut best = c;
        let mut best_span = -1.0;
        for pair in xs.chunks(2) {
            if pair.len() == 2 {
                let span = pair[1] - pair[0];
                if span > best_span {
                    best_span = span;
                    best = Point2D::new((pair[0] + pair[1]) / 2.0, c.y);
                }
            }
        }
        best
    }

    /// Even-odd containment across every ring, so holes exclude correctly.
    pub fn contains_point(&self, p: &Point2D) -> bool {
        let mut crossings = 0;
        for ring in &self.parts {
            if point_in_ring(p, ring) {
                crossings += 1;
            }
        }
        crossings % 2 == 1
    }

    fn any_edge_intersects(&self, other: &Polygon) -> bool {
        for ring_a in &self.parts {
            let na = ring_a.len();
            for i in 0..na {
                let a1 = &ring_a[i];
                let a2 = &ring_a[(i + 1) % na];
                for ring_b in &other.parts {
                    let nb = ring_b.len();
                    for j in 0..nb {
                        let b1 = &ring_b[j];
                        let b2 = &ring_b[(j + 1) % nb];
                        if segments_intersect(a1, a2, b1, b2) {
                            return true;
                        }
                    }
                }
            }
        }
        false
    }

    pub fn intersects(&self, other: &Polygon) -> bool {
        if !self.get_bounding_box().overlaps(&other.get_bounding_box()) {
            return false;
        }
        for ring in &self.parts {
            for p in ring {
                if other.contains_point(p) {
                    return true;
                }
            }
        }
        for ring in &other.parts {
            for p in ring {
                if self.contains_point(p) {
                    return true;
                }
            }
        }
        self.any_edge_intersects(other)
    }

    /// True if every vertex of self lies inside `other` and no boundaries
    /// cross. Vertices on the boundary of `other` are treated as outside.
    /// The edge check matters for concave containers: every vertex can sit
    /// inside while an edge passes through a notch.
    pub fn within(&self, other: &Polygon) -> bool {
        for ring in &self.parts {
            for p in ring {
                if !other.contains_point(p) {
                    return false;
                }
            }
        }
        !self.any_edge_intersects(other)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Polyline {
    pub parts: Vec<Vec<Point2D>>,
}

impl Polyline {
    pub fn new(parts: Vec<Vec<Point2D>>) -> Polyline {
        Polyline { parts }
    }

    pub fn length(&self) -> f64 {
        let mut total = 0.0;
        for part in &self.parts {
            for w in part.windows(2) {
                total += w[0].distance(&w[1]);
            }
        }
        total
    }

    pub fn get_bounding_box(&self) -> BoundingBox {
        let mut bb = BoundingBox::new_empty();
        for part in &self.parts {
            for p in part {
                bb.expand_to(p);
            }
        }
        bb
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point(Point2D),
    Polyline(Polyline),
    Polygon(Polygon),
}

impl Geometry {
    pub fn get_bounding_box(&self) -> BoundingBox {
        match self {
            Geometry::Point(p) => BoundingBox {
                min_x: p.x,
                min_y: p.y,
                max_x: p.x,
                max_y: p.y,
            },
            Geometry::Polyline(l) => l.get_bounding_box(),
            Geometry::Polygon(p) => p.get_bounding_box(),
        }
    }

    pub fn intersects_polygon(&self, poly: &Polygon) -> bool {
        match self {
            Geometry::Point(p) => poly.contains_point(p),
            Geometry::Polyline(line) => {
                for part in &line.parts {
                    for p in part {
                        if poly.contains_point(p) {
                            return true;
                        }
                    }
                    for w in part.windows(2) {
                        for ring in &poly.parts {
                            let n = ring.len();
                            for j in 0..n {
                                if segments_intersect(&w[0], &w[1], &ring[j], &ring[(j + 1) % n]) {
                                    return true;
                                }
                            }
                        }
                    }
                }
                false
            }
            Geometry::Polygon(p) => p.intersects(poly),
        }
    }

    pub fn within_polygon(&self, poly: &Polygon) -> bool {
        match self {
            Geometry::Point(p) => poly.contains_point(p),
            Geometry::Polyline(line) => line
                .parts
                .iter()
                .all(|part| part.iter().all(|p| poly.contains_point(p))),
            Geometry::Polygon(p) => p.within(poly),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rectangle_area_and_perimeter() {
        let rect = Polygon::rectangle(0.0, 0.0, 10.0, 5.0);
        assert!((rect.area() - 50.0).abs() < 1e-9);
        assert!((rect.perimeter() - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_hole_subtracts_area() {
        let mut poly = Polygon::rectangle(0.0, 0.0, 10.0, 10.0);
        let mut hole = Polygon::rectangle(2.0, 2.0, 4.0, 4.0).parts.remove(0);
        hole.reverse(); // counter-clockwise hole
        poly.parts.push(hole);
        assert!((poly.area() - 96.0).abs() < 1e-9);
    }

    #[test]
    fn test_centroid_of_rectangle() {
        let rect = Polygon::rectangle(0.0, 0.0, 4.0, 2.0);
        let c = rect.centroid();
        assert!((c.x - 2.0).abs() < 1e-9);
        assert!((c.y - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_point_containment_with_hole() {
        let mut poly = Polygon::rectangle(0.0, 0.0, 10.0, 10.0);
        let mut hole = Polygon::rectangle(4.0, 4.0, 6.0, 6.0).parts.remove(0);
        hole.reverse();
        poly.parts.push(hole);
        assert!(poly.contains_point(&Point2D::new(1.0, 1.0)));
        assert!(!poly.contains_point(&Point2D::new(5.0, 5.0)));
        assert!(!poly.contains_point(&Point2D::new(11.0, 5.0)));
    }

    #[test]
    fn test_interior_point_of_c_shape() {
        // A C-shaped polygon whose centroid falls in the concavity.
        let poly = Polygon::new(vec![vec![
            Point2D::new(0.0, 10.0),
            Point2D::new(10.0, 10.0),
            Point2D::new(10.0, 8.0),
            Point2D::new(2.0, 8.0),
            Point2D::new(2.0, 2.0),
            Point2D::new(10.0, 2.0),
            Point2D::new(10.0, 0.0),
            Point2D::new(0.0, 0.0),
        ]]);
        let p = poly.interior_point();
        assert!(poly.contains_point(&p));
    }

    #[test]
    fn test_within_and_intersects() {
        let outer = Polygon::rectangle(0.0, 0.0, 100.0, 100.0);
        let inner = Polygon::rectangle(10.0, 10.0, 20.0, 20.0);
        let crossing = Polygon::rectangle(90.0, 90.0, 110.0, 110.0);
        let disjoint = Polygon::rectangle(200.0, 200.0, 210.0, 210.0);
        assert!(inner.within(&outer));
        assert!(inner.intersects(&outer));
        assert!(!crossing.within(&outer));
        assert!(crossing.intersects(&outer));
        assert!(!disjoint.intersects(&outer));
    }

    #[test]
    fn test_within_concave_container_checks_edges() {
        // U shape: arms at x [0,3] and [7,10], notch open above y = 3.
        let u_shape = Polygon::new(vec![vec![
            Point2D::new(0.0, 0.0),
            Point2D::new(10.0, 0.0),
            Point2D::new(10.0, 10.0),
            Point2D::new(7.0, 10.0),
            Point2D::new(7.0, 3.0),
            Point2D::new(3.0, 3.0),
            Point2D::new(3.0, 10.0),
            Point2D::new(0.0, 10.0),
        ]]);
        // Every vertex of the bar sits inside an arm, but the bar spans the
        // notch.
        let bar = Polygon::rectangle(1.0, 8.0, 9.0, 9.0);
        assert!(u_shape.contains_point(&Point2D::new(1.0, 8.5)));
        assert!(u_shape.contains_point(&Point2D::new(9.0, 8.5)));
        assert!(!u_shape.contains_point(&Point2D::new(5.0, 8.5)));
        assert!(!bar.within(&u_shape));
        assert!(bar.intersects(&u_shape));
        // A rectangle confined to one arm is still within.
        let in_arm = Polygon::rectangle(0.5, 4.0, 2.5, 9.0);
        assert!(in_arm.within(&u_shape));
    }

    #[test]
    fn test_polyline_length() {
        let line = Polyline::new(vec![vec![
            Point2D::new(0.0, 0.0),
            Point2D::new(3.0, 4.0),
            Point2D::new(3.0, 10.0),
        ]]);
        assert!((line.length() - 11.0).abs() < 1e-9);
    }

    #[test]
    fn test_line_polygon_intersection() {
        let poly = Polygon::rectangle(0.0, 0.0, 10.0, 10.0);
        let through = Geometry::Polyline(Polyline::new(vec![vec![
            Point2D::new(-5.0, 5.0),
            Point2D::new(15.0, 5.0),
        ]]));
        let outside = Geometry::Polyline(Polyline::new(vec![vec![
            Point2D::new(-5.0, 20.0),
            Point2D::new(15.0, 20.0),
        ]]));
        assert!(through.intersects_polygon(&poly));
        assert!(!outside.intersects_polygon(&poly));
    }
}
