//! Retained render model.
//!
//! The coordinator rebuilds a Scene whenever the active attribute or the
//! map panel changes: projected region shapes, boundary outlines, and the
//! bar list sorted by the active attribute, all colored from one shared
//! color scale so map and chart can never disagree. Every element carries
//! an explicit stroke that hover highlighting saves and restores.

use geo::MultiPolygon;

use crate::classify::ColorScale;
use crate::config::{ProjectionConfig, Rgb};
use crate::geometry::{self, Point};
use crate::load::{Record, Region};
use crate::projection::{ConicEqualArea, ScreenRect};

/// Outline style of a scene element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub width: f32,
    pub color: Rgb,
}

pub const REGION_STROKE: Stroke = Stroke {
    width: 0.75,
    color: Rgb(0xF2, 0xF2, 0xF2),
};

pub const BOUNDARY_STROKE: Stroke = Stroke {
    width: 1.25,
    color: Rgb(0x6E, 0x6E, 0x6E),
};

pub const BAR_STROKE: Stroke = Stroke {
    width: 0.0,
    color: Rgb(0x00, 0x00, 0x00),
};

pub const HIGHLIGHT_STROKE: Stroke = Stroke {
    width: 2.5,
    color: Rgb(0xFF, 0xD7, 0x00),
};

/// One projected polygon: screen-space ring plus its triangulation.
#[derive(Debug, Clone)]
pub struct Poly {
    pub ring: Vec<Point>,
    pub triangles: Vec<[usize; 3]>,
}

#[derive(Debug, Clone)]
pub struct RegionShape {
    pub key: String,
    pub polys: Vec<Poly>,
    pub value: f64,
    pub fill: Rgb,
    pub stroke: Stroke,
}

#[derive(Debug, Clone)]
pub struct BarShape {
    pub key: String,
    pub value: f64,
    pub fill: Rgb,
    pub stroke: Stroke,
}

#[derive(Debug, Clone)]
pub struct Scene {
    pub rect: ScreenRect,
    pub regions: Vec<RegionShape>,
    /// Background outline rings, drawn beneath the regions.
    pub boundary: Vec<Vec<Point>>,
    /// Sorted descending by the active attribute; no-data bars last.
    pub bars: Vec<BarShape>,
    /// Upper bound of the chart's value axis.
    pub axis_max: f64,
}

impl Scene {
    pub fn build(
        regions: &[Region],
        boundary: &[MultiPolygon<f64>],
        records: &[Record],
        active: &str,
        scale: &ColorScale,
        projection: &ProjectionConfig,
        rect: ScreenRect,
    ) -> Scene {
        // Fit the projection to the choropleth layer; the boundary layer is
        // background and may extend past the panel.
        let fit_source: Vec<(f64, f64)> = if regions.is_empty() {
            boundary.iter().flat_map(ring_coords).collect()
        } else {
            regions.iter().flat_map(|r| ring_coords(&r.geometry)).collect()
        };
        let fitted = ConicEqualArea::new(projection).fit(fit_source.into_iter(), rect, 8.0);

        let region_shapes = regions
            .iter()
            .map(|region| {
                let value = region.value(active);
                let polys = region
                    .geometry
                    .0
                    .iter()
                    .map(|poly| {
                        let ring = project_ring(&fitted, poly.exterior().0.iter());
                        let triangles = geometry::triangulate(&ring);
                        Poly { ring, triangles }
                    })
                    .collect();
                RegionShape {
                    key: region.label.clone(),
                    polys,
                    value,
                    fill: scale.color(value),
                    stroke: REGION_STROKE,
                }
            })
            .collect();

        let boundary_rings = boundary
            .iter()
            .flat_map(|multi| multi.0.iter())
            .map(|poly| project_ring(&fitted, poly.exterior().0.iter()))
            .collect();

        let mut bars: Vec<BarShape> = records
            .iter()
            .map(|record| {
                let value = record.value(active);
                BarShape {
                    key: record.label.clone(),
                    value,
                    fill: scale.color(value),
                    stroke: BAR_STROKE,
                }
            })
            .collect();
        bars.sort_by(|a, b| match (a.value.is_nan(), b.value.is_nan()) {
            (true, true) => std::cmp::Ordering::Equal,
            (true, false) => std::cmp::Ordering::Greater,
            (false, true) => std::cmp::Ordering::Less,
            (false, false) => b
                .value
                .partial_cmp(&a.value)
                .unwrap_or(std::cmp::Ordering::Equal),
        });

        let axis_max = bars
            .iter()
            .map(|b| b.value)
            .filter(|v| v.is_finite())
            .fold(0.0_f64, f64::max)
            .max(1.0);

        Scene {
            rect,
            regions: region_shapes,
            boundary: boundary_rings,
            bars,
            axis_max,
        }
    }

    /// Which region, if any, covers a screen point.
    pub fn hit_region(&self, point: Point) -> Option<&str> {
        self.regions.iter().find_map(|region| {
            region
                .polys
                .iter()
                .any(|poly| geometry::point_in_ring(point, &poly.ring))
                .then_some(region.key.as_str())
        })
    }
}

fn ring_coords(multi: &MultiPolygon<f64>) -> Vec<(f64, f64)> {
    multi
        .0
        .iter()
        .flat_map(|poly| poly.exterior().0.iter().map(|c| (c.x, c.y)))
        .collect()
}

fn project_ring<'a>(
    fitted: &crate::projection::FittedProjection,
    coords: impl Iterator<Item = &'a geo::Coord<f64>>,
) -> Vec<Point> {
    let mut ring: Vec<Point> = coords.map(|c| fitted.to_screen(c.x, c.y)).collect();
    // GeoJSON rings repeat the first coordinate; drop the closure.
    if ring.len() > 1 && ring.first() == ring.last() {
        ring.pop();
    }
    ring
}

/// Anchor for the floating hover label: to the right of and above the
/// pointer, flipping left near the right edge and below near the top edge
/// so the label stays inside the viewport.
pub fn label_anchor(pointer: Point, label_size: Point, bounds: ScreenRect) -> Point {
    let mut x = pointer[0] + 10.0;
    let mut y = pointer[1] - label_size[1] - 10.0;
    if x + label_size[0] > bounds.x + bounds.width - 10.0 {
        x = pointer[0] - label_size[0] - 10.0;
    }
    if y < bounds.y + 5.0 {
        y = pointer[1] + 15.0;
    }
    [x, y]
}
