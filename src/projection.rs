//! Albers conic equal-area projection with fit-to-rect scaling.
//!
//! The projection itself is the standard conic equal-area from the config's
//! center and standard parallels; absolute scale is irrelevant because the
//! fitted transform rescales the projected bounds into the map panel.

use crate::config::ProjectionConfig;

#[derive(Debug, Clone, Copy)]
pub struct ConicEqualArea {
    n: f64,
    c: f64,
    rho0: f64,
    lambda0: f64,
}

impl ConicEqualArea {
    pub fn new(config: &ProjectionConfig) -> Self {
        let lambda0 = config.center[0].to_radians();
        let phi0 = config.center[1].to_radians();
        let p1 = config.parallels[0].to_radians();
        let p2 = config.parallels[1].to_radians();

        let mut n = (p1.sin() + p2.sin()) / 2.0;
        if n.abs() < 1e-9 {
            // Degenerate parallels, nudge away from the cylindrical limit.
            n = 1e-9;
        }
        let c = p1.cos().powi(2) + 2.0 * n * p1.sin();
        let rho0 = (c - 2.0 * n * phi0.sin()).max(0.0).sqrt() / n;

        Self { n, c, rho0, lambda0 }
    }

    /// Project degrees lon/lat into projection-plane coordinates,
    /// y increasing northward.
    pub fn project(&self, lon: f64, lat: f64) -> [f64; 2] {
        let lambda = lon.to_radians();
        let phi = lat.to_radians();
        let theta = self.n * (lambda - self.lambda0);
        let rho = (self.c - 2.0 * self.n * phi.sin()).max(0.0).sqrt() / self.n;
        [rho * theta.sin(), self.rho0 - rho * theta.cos()]
    }

    /// Fit the projection to a screen rectangle so the given lon/lat
    /// points fill it, preserving aspect ratio. Screen y grows downward.
    pub fn fit(
        self,
        points: impl Iterator<Item = (f64, f64)>,
        rect: ScreenRect,
        margin: f64,
    ) -> FittedProjection {
        let mut min = [f64::INFINITY, f64::INFINITY];
        let mut max = [f64::NEG_INFINITY, f64::NEG_INFINITY];
        for (lon, lat) in points {
            let [x, y] = self.project(lon, lat);
            min[0] = min[0].min(x);
            min[1] = min[1].min(y);
            max[0] = max[0].max(x);
            max[1] = max[1].max(y);
        }

        let span_x = (max[0] - min[0]).max(1e-12);
        let span_y = (max[1] - min[1]).max(1e-12);
        let (scale, offset) = if min[0].is_finite() {
            let inner_w = (rect.width as f64 - 2.0 * margin).max(1.0);
            let inner_h = (rect.height as f64 - 2.0 * margin).max(1.0);
            let scale = (inner_w / span_x).min(inner_h / span_y);
            // Center the fitted extent inside the rect.
            let offset = [
                rect.x as f64 + (rect.width as f64 - span_x * scale) / 2.0,
                rect.y as f64 + (rect.height as f64 - span_y * scale) / 2.0,
            ];
            (scale, offset)
        } else {
            (1.0, [rect.x as f64, rect.y as f64])
        };

        FittedProjection {
            projection: self,
            scale,
            min_x: min[0],
            max_y: max[1],
            offset,
        }
    }
}

/// A screen rectangle in absolute coordinates, y down.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, Copy)]
pub struct FittedProjection {
    projection: ConicEqualArea,
    scale: f64,
    min_x: f64,
    max_y: f64,
    offset: [f64; 2],
}

impl FittedProjection {
    pub fn to_screen(&self, lon: f64, lat: f64) -> [f32; 2] {
        let [x, y] = self.projection.project(lon, lat);
        [
            (self.offset[0] + (x - self.min_x) * self.scale) as f32,
            (self.offset[1] + (self.max_y - y) * self.scale) as f32,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn colorado() -> ProjectionConfig {
        ProjectionConfig {
            center: [-105.6, 38.8],
            parallels: [-34.0, 35.0],
        }
    }

    #[test]
    fn center_projects_to_origin_x() {
        let proj = ConicEqualArea::new(&colorado());
        let [x, _] = proj.project(-105.6, 38.8);
        assert!(x.abs() < 1e-9);
    }

    #[test]
    fn north_is_up_after_fitting() {
        let rect = ScreenRect {
            x: 0.0,
            y: 0.0,
            width: 100.0,
            height: 100.0,
        };
        let corners = [
            (-109.0, 37.0),
            (-102.0, 37.0),
            (-102.0, 41.0),
            (-109.0, 41.0),
        ];
        let fitted = ConicEqualArea::new(&colorado()).fit(corners.iter().copied(), rect, 0.0);
        let south = fitted.to_screen(-105.5, 37.5);
        let north = fitted.to_screen(-105.5, 40.5);
        assert!(north[1] < south[1]);
        let west = fitted.to_screen(-108.0, 39.0);
        let east = fitted.to_screen(-103.0, 39.0);
        assert!(west[0] < east[0]);
    }

    #[test]
    fn fitted_points_stay_inside_the_rect() {
        let rect = ScreenRect {
            x: 50.0,
            y: 20.0,
            width: 300.0,
            height: 200.0,
        };
        let corners = [
            (-109.0, 37.0),
            (-102.0, 37.0),
            (-102.0, 41.0),
            (-109.0, 41.0),
        ];
        let fitted = ConicEqualArea::new(&colorado()).fit(corners.iter().copied(), rect, 8.0);
        for (lon, lat) in corners {
            let [x, y] = fitted.to_screen(lon, lat);
            assert!(x >= rect.x && x <= rect.x + rect.width);
            assert!(y >= rect.y && y <= rect.y + rect.height);
        }
    }
}
