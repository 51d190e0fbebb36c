//! Screen-space polygon utilities.
//!
//! County outlines are concave, so filled shapes go through ear-clipping
//! triangulation before they reach the painter. Hover hit testing uses an
//! even-odd ray cast.

pub type Point = [f32; 2];

/// Signed ring area, positive for counter-clockwise winding.
pub fn signed_area(ring: &[Point]) -> f32 {
    let n = ring.len();
    let mut sum = 0.0;
    for i in 0..n {
        let a = ring[i];
        let b = ring[(i + 1) % n];
        sum += a[0] * b[1] - b[0] * a[1];
    }
    sum * 0.5
}

/// Even-odd ray cast point-in-polygon test.
pub fn point_in_ring(point: Point, ring: &[Point]) -> bool {
    let n = ring.len();
    if n < 3 {
        return false;
    }
    let [px, py] = point;
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let [xi, yi] = ring[i];
        let [xj, yj] = ring[j];
        if (yi > py) != (yj > py) && px < (xj - xi) * (py - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

fn cross(o: Point, a: Point, b: Point) -> f32 {
    (a[0] - o[0]) * (b[1] - o[1]) - (a[1] - o[1]) * (b[0] - o[0])
}

fn point_in_triangle(p: Point, a: Point, b: Point, c: Point) -> bool {
    let d1 = cross(p, a, b);
    let d2 = cross(p, b, c);
    let d3 = cross(p, c, a);
    let has_neg = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
    let has_pos = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;
    !(has_neg && has_pos)
}

/// Ear-clipping triangulation of a simple polygon (no holes). Returns
/// index triples into `ring`; a ring of n vertices yields n - 2 triangles.
/// Falls back to a fan when no ear can be found, so self-intersecting
/// input still produces something drawable instead of looping forever.
pub fn triangulate(ring: &[Point]) -> Vec<[usize; 3]> {
    let n = ring.len();
    if n < 3 {
        return Vec::new();
    }

    let mut indices: Vec<usize> = (0..n).collect();
    if signed_area(ring) < 0.0 {
        indices.reverse();
    }

    let mut triangles = Vec::with_capacity(n - 2);
    while indices.len() > 3 {
        let m = indices.len();
        let mut clipped = false;
        for i in 0..m {
            let prev = indices[(i + m - 1) % m];
            let cur = indices[i];
            let next = indices[(i + 1) % m];
            // Reflex vertices cannot be ears.
            if cross(ring[prev], ring[cur], ring[next]) <= 0.0 {
                continue;
            }
            let blocked = indices.iter().any(|&other| {
                other != prev
                    && other != cur
                    && other != next
                    && point_in_triangle(ring[other], ring[prev], ring[cur], ring[next])
            });
            if blocked {
                continue;
            }
            triangles.push([prev, cur, next]);
            indices.remove(i);
            clipped = true;
            break;
        }
        if !clipped {
            // Degenerate remainder: fan it out.
            for w in 1..indices.len() - 1 {
                triangles.push([indices[0], indices[w], indices[w + 1]]);
            }
            return triangles;
        }
    }
    triangles.push([indices[0], indices[1], indices[2]]);
    triangles
}

#[cfg(test)]
mod tests {
    use super::*;

    const SQUARE: [Point; 4] = [[0.0, 0.0], [2.0, 0.0], [2.0, 2.0], [0.0, 2.0]];

    // An L shape: concave at [1, 1].
    const ELL: [Point; 6] = [
        [0.0, 0.0],
        [2.0, 0.0],
        [2.0, 1.0],
        [1.0, 1.0],
        [1.0, 2.0],
        [0.0, 2.0],
    ];

    #[test]
    fn area_of_square() {
        assert_eq!(signed_area(&SQUARE), 4.0);
        let mut reversed = SQUARE;
        reversed.reverse();
        assert_eq!(signed_area(&reversed), -4.0);
    }

    #[test]
    fn point_in_ring_hits_and_misses() {
        assert!(point_in_ring([1.0, 1.0], &SQUARE));
        assert!(!point_in_ring([3.0, 1.0], &SQUARE));
        assert!(point_in_ring([0.5, 1.5], &ELL));
        // Inside the bounding box but in the concave notch.
        assert!(!point_in_ring([1.5, 1.5], &ELL));
    }

    #[test]
    fn triangulation_yields_n_minus_two_triangles() {
        assert_eq!(triangulate(&SQUARE).len(), 2);
        assert_eq!(triangulate(&ELL).len(), 4);
    }

    #[test]
    fn triangulation_covers_the_polygon_area() {
        let triangles = triangulate(&ELL);
        let total: f32 = triangles
            .iter()
            .map(|t| signed_area(&[ELL[t[0]], ELL[t[1]], ELL[t[2]]]).abs())
            .sum();
        assert!((total - 3.0).abs() < 1e-4);
    }

    #[test]
    fn degenerate_rings_are_harmless() {
        assert!(triangulate(&[[0.0, 0.0], [1.0, 1.0]]).is_empty());
        assert!(triangulate(&[]).is_empty());
    }
}
