//! Attribute-driven view coordinator.
//!
//! Owns the joined data, the view state, and the current color scale, and
//! keeps the two rendered views consistent: an attribute change rebuilds
//! one fresh scale and one fresh scene that both views draw from, and a
//! hovered key highlights every element sharing it, restoring each
//! element's captured stroke on leave.

use geo::MultiPolygon;
use tracing::{debug, warn};

use crate::classify::ColorScale;
use crate::config::{Config, ProjectionConfig, Rgb};
use crate::join::join_records;
use crate::load::{LoadedData, Record, Region};
use crate::projection::ScreenRect;
use crate::scene::{Scene, Stroke, HIGHLIGHT_STROKE};
use crate::state::ViewState;

enum ElementRef {
    Region(usize),
    Bar(usize),
}

struct Highlight {
    key: String,
    saved: Vec<(ElementRef, Stroke)>,
}

pub struct Coordinator {
    records: Vec<Record>,
    regions: Vec<Region>,
    boundary: Vec<MultiPolygon<f64>>,
    view: ViewState,
    palette: Vec<Rgb>,
    no_data: Rgb,
    classes: usize,
    projection: ProjectionConfig,
    scale: ColorScale,
    scene: Option<Scene>,
    highlight: Option<Highlight>,
}

impl Coordinator {
    pub fn new(data: LoadedData, config: &Config) -> Self {
        let LoadedData {
            records,
            mut regions,
            boundary,
        } = data;

        join_records(&mut regions, &records, &config.attributes);

        let view = ViewState::new(config.attributes.clone());
        let scale = ColorScale::build(
            &records,
            view.active(),
            &config.palette,
            config.no_data,
            config.classes,
        );

        Self {
            records,
            regions,
            boundary,
            view,
            palette: config.palette.clone(),
            no_data: config.no_data,
            classes: config.classes,
            projection: config.projection.clone(),
            scale,
            scene: None,
            highlight: None,
        }
    }

    pub fn attributes(&self) -> &[String] {
        self.view.attributes()
    }

    pub fn active(&self) -> &str {
        self.view.active()
    }

    pub fn scale(&self) -> &ColorScale {
        &self.scale
    }

    pub fn palette(&self) -> &[Rgb] {
        &self.palette
    }

    pub fn title(&self) -> String {
        format!("{} by county", self.view.active())
    }

    /// Switch the displayed attribute. Unknown names are rejected with no
    /// re-render; valid ones rebuild the color scale and invalidate the
    /// scene so both views pick up the new classification together.
    pub fn change_attribute(&mut self, name: &str) -> bool {
        if !self.view.change(name) {
            warn!("Ignoring unknown attribute '{}'", name);
            return false;
        }
        self.scale = ColorScale::build(
            &self.records,
            self.view.active(),
            &self.palette,
            self.no_data,
            self.classes,
        );
        self.scene = None;
        self.highlight = None;
        debug!(
            attribute = name,
            breaks = ?self.scale.breaks(),
            "Active attribute changed"
        );
        true
    }

    /// The scene for the given map rect, rebuilt when the attribute
    /// changed or the panel was resized.
    pub fn scene(&mut self, rect: ScreenRect) -> &Scene {
        let stale = !matches!(&self.scene, Some(scene) if scene.rect == rect);
        if stale {
            self.highlight = None;
            self.scene = Some(Scene::build(
                &self.regions,
                &self.boundary,
                &self.records,
                self.view.active(),
                &self.scale,
                &self.projection,
                rect,
            ));
        }
        self.scene.as_ref().expect("scene rebuilt above")
    }

    /// Set or clear the hovered key. Every element sharing the key gets
    /// highlight emphasis; previous strokes are restored exactly on leave.
    /// Returns true when the highlight changed.
    pub fn hover(&mut self, key: Option<&str>) -> bool {
        if self.highlight.as_ref().map(|h| h.key.as_str()) == key {
            return false;
        }
        self.clear_hover();
        let (Some(key), Some(scene)) = (key, self.scene.as_mut()) else {
            return true;
        };

        let mut saved = Vec::new();
        for (i, region) in scene.regions.iter_mut().enumerate() {
            if region.key == key {
                saved.push((ElementRef::Region(i), region.stroke));
                region.stroke = HIGHLIGHT_STROKE;
            }
        }
        for (i, bar) in scene.bars.iter_mut().enumerate() {
            if bar.key == key {
                saved.push((ElementRef::Bar(i), bar.stroke));
                bar.stroke = HIGHLIGHT_STROKE;
            }
        }
        self.highlight = Some(Highlight {
            key: key.to_string(),
            saved,
        });
        true
    }

    fn clear_hover(&mut self) {
        let Some(highlight) = self.highlight.take() else {
            return;
        };
        let Some(scene) = self.scene.as_mut() else {
            return;
        };
        for (element, stroke) in highlight.saved {
            match element {
                ElementRef::Region(i) => scene.regions[i].stroke = stroke,
                ElementRef::Bar(i) => scene.bars[i].stroke = stroke,
            }
        }
    }

    /// Text of the floating label for the hovered key, if any.
    pub fn hover_label(&self) -> Option<String> {
        let key = self.highlight.as_ref().map(|h| h.key.as_str())?;
        let active = self.view.active();
        let value = self
            .records
            .iter()
            .rfind(|r| r.label == key)
            .map(|r| r.value(active))
            .unwrap_or(f64::NAN);
        Some(format!("{}\n{}: {}", key, active, format_value(value)))
    }
}

fn format_value(value: f64) -> String {
    if !value.is_finite() {
        "no data".to_string()
    } else if value.fract() == 0.0 || value.abs() >= 1000.0 {
        format!("{:.0}", value)
    } else {
        format!("{:.1}", value)
    }
}
