//! Native GUI viewer using egui
//!
//! Choropleth map and coordinated bar chart with a shared hover highlight
//! and an attribute dropdown.

use eframe::egui;
use tracing::info;

use crate::config::Rgb;
use crate::coordinator::Coordinator;
use crate::projection::ScreenRect;
use crate::scene;

/// Run the native GUI viewer
pub fn run_viewer(coordinator: Coordinator) -> anyhow::Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_title("County Atlas"),
        ..Default::default()
    };

    eframe::run_native(
        "County Atlas",
        options,
        Box::new(|cc| Ok(Box::new(AtlasApp::new(cc, coordinator)))),
    )
    .map_err(|e| anyhow::anyhow!("GUI error: {}", e))
}

struct AtlasApp {
    coordinator: Coordinator,
    /// Hover detected while rendering, applied at the top of the next
    /// frame so both views see one consistent highlight.
    pending_hover: Option<String>,
}

impl AtlasApp {
    fn new(cc: &eframe::CreationContext<'_>, coordinator: Coordinator) -> Self {
        cc.egui_ctx.set_visuals(egui::Visuals::dark());
        info!(
            attributes = coordinator.attributes().len(),
            "Viewer started on attribute '{}'",
            coordinator.active()
        );
        Self {
            coordinator,
            pending_hover: None,
        }
    }

    fn attribute_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::left("attribute_panel")
            .min_width(230.0)
            .show(ctx, |ui| {
                ui.heading("Attribute");
                ui.separator();

                let mut selected: Option<String> = None;
                egui::ComboBox::from_id_salt("attribute")
                    .selected_text(self.coordinator.active().to_string())
                    .width(200.0)
                    .show_ui(ui, |ui| {
                        let active = self.coordinator.active().to_string();
                        for name in self.coordinator.attributes().to_vec() {
                            if ui.selectable_label(name == active, &name).clicked() {
                                selected = Some(name);
                            }
                        }
                    });
                if let Some(name) = selected {
                    self.coordinator.change_attribute(&name);
                }

                ui.separator();
                ui.label("Classes");
                let scale = self.coordinator.scale();
                let breaks = scale.breaks().to_vec();
                let no_data = scale.no_data();
                let palette: Vec<Rgb> = self.coordinator.palette().to_vec();
                for (i, &color) in palette.iter().take(breaks.len() + 1).enumerate() {
                    let range = if breaks.is_empty() {
                        "all values".to_string()
                    } else if i == 0 {
                        format!("< {}", breaks[0])
                    } else if i == breaks.len() {
                        format!(">= {}", breaks[i - 1])
                    } else {
                        format!("{} .. {}", breaks[i - 1], breaks[i])
                    };
                    legend_row(ui, color, &range);
                }
                legend_row(ui, no_data, "no data");
            });
    }

    fn central_panel(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let full = ui.available_rect_before_wrap();
            let map_rect = egui::Rect::from_min_size(
                full.min,
                egui::vec2(full.width() * 0.55, full.height()),
            );
            let chart_rect = egui::Rect::from_min_max(
                egui::pos2(map_rect.right() + 6.0, full.top()),
                full.max,
            );

            let response = ui.allocate_rect(map_rect, egui::Sense::hover());
            let screen = ScreenRect {
                x: map_rect.left(),
                y: map_rect.top(),
                width: map_rect.width(),
                height: map_rect.height(),
            };

            let mut hovered: Option<String> = None;
            {
                let scene = self.coordinator.scene(screen);
                paint_map(ui.painter_at(map_rect), map_rect, scene);
                if let Some(pos) = response.hover_pos() {
                    hovered = scene.hit_region([pos.x, pos.y]).map(str::to_string);
                }
            }

            let mut chart_ui =
                ui.new_child(egui::UiBuilder::new().max_rect(chart_rect));
            let mut chart_hover: Option<String> = None;
            {
                let scene = self.coordinator.scene(screen);
                let bar_count = scene.bars.len();
                let chart_bars: Vec<egui_plot::Bar> = scene
                    .bars
                    .iter()
                    .enumerate()
                    .map(|(i, bar)| {
                        let height = if bar.value.is_finite() { bar.value } else { 0.0 };
                        let mut plotted = egui_plot::Bar::new(i as f64, height)
                            .width(0.85)
                            .name(&bar.key)
                            .fill(color32(bar.fill));
                        if bar.stroke.width > 0.0 {
                            plotted = plotted.stroke(egui::Stroke::new(
                                bar.stroke.width,
                                color32(bar.stroke.color),
                            ));
                        }
                        plotted
                    })
                    .collect();

                egui_plot::Plot::new("attribute_chart")
                    .show_axes([false, true])
                    .show_grid(false)
                    .allow_drag(false)
                    .allow_zoom(false)
                    .allow_scroll(false)
                    .allow_boxed_zoom(false)
                    .include_y(0.0)
                    .include_y(scene.axis_max * 1.05)
                    .include_x(-0.5)
                    .include_x(bar_count as f64 - 0.5)
                    .show(&mut chart_ui, |plot_ui| {
                        plot_ui.bar_chart(egui_plot::BarChart::new(chart_bars));
                        if let Some(coord) = plot_ui.pointer_coordinate() {
                            let index = coord.x.round();
                            let in_column = index >= 0.0
                                && (index as usize) < bar_count
                                && (coord.x - index).abs() <= 0.425;
                            if in_column {
                                let bar = &scene.bars[index as usize];
                                let height =
                                    if bar.value.is_finite() { bar.value } else { 0.0 };
                                if coord.y >= 0.0 && coord.y <= height {
                                    chart_hover = Some(bar.key.clone());
                                }
                            }
                        }
                    });
            }
            if chart_hover.is_some() {
                hovered = chart_hover;
            }
            self.pending_hover = hovered;
        });
    }

    fn hover_label(&self, ctx: &egui::Context) {
        let (Some(text), Some(pos)) = (self.coordinator.hover_label(), ctx.pointer_latest_pos())
        else {
            return;
        };

        let painter = ctx.layer_painter(egui::LayerId::new(
            egui::Order::Foreground,
            egui::Id::new("hover_label"),
        ));
        let galley = painter.layout(
            text,
            egui::FontId::proportional(13.0),
            egui::Color32::WHITE,
            f32::INFINITY,
        );
        let padding = egui::vec2(8.0, 6.0);
        let size = galley.size() + 2.0 * padding;
        let bounds = ctx.screen_rect();
        let anchor = scene::label_anchor(
            [pos.x, pos.y],
            [size.x, size.y],
            ScreenRect {
                x: bounds.left(),
                y: bounds.top(),
                width: bounds.width(),
                height: bounds.height(),
            },
        );
        let rect = egui::Rect::from_min_size(egui::pos2(anchor[0], anchor[1]), size);
        painter.rect_filled(rect, 4.0, egui::Color32::from_black_alpha(210));
        painter.rect_stroke(
            rect,
            4.0,
            egui::Stroke::new(1.0, egui::Color32::from_gray(120)),
        );
        painter.galley(rect.min + padding, galley, egui::Color32::WHITE);
    }
}

impl eframe::App for AtlasApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Apply the hover detected during the previous frame before either
        // view paints, so map and chart highlight in the same frame.
        let hover = self.pending_hover.take();
        if self.coordinator.hover(hover.as_deref()) {
            ctx.request_repaint();
        }

        egui::TopBottomPanel::top("title_panel").show(ctx, |ui| {
            ui.heading(self.coordinator.title());
        });

        self.attribute_panel(ctx);
        self.central_panel(ctx);
        self.hover_label(ctx);
    }
}

fn legend_row(ui: &mut egui::Ui, color: Rgb, text: &str) {
    ui.horizontal(|ui| {
        let (rect, _) =
            ui.allocate_exact_size(egui::vec2(14.0, 14.0), egui::Sense::hover());
        ui.painter().rect_filled(rect, 2.0, color32(color));
        ui.label(text);
    });
}

fn paint_map(painter: egui::Painter, rect: egui::Rect, scene: &scene::Scene) {
    painter.rect_filled(rect, 0.0, egui::Color32::from_rgb(24, 26, 30));

    for ring in &scene.boundary {
        painter.add(egui::Shape::closed_line(
            ring.iter().map(|p| egui::pos2(p[0], p[1])).collect(),
            stroke32(scene::BOUNDARY_STROKE),
        ));
    }

    for region in &scene.regions {
        let fill = color32(region.fill);
        for poly in &region.polys {
            let mut mesh = egui::Mesh::default();
            for p in &poly.ring {
                mesh.colored_vertex(egui::pos2(p[0], p[1]), fill);
            }
            for t in &poly.triangles {
                mesh.add_triangle(t[0] as u32, t[1] as u32, t[2] as u32);
            }
            painter.add(egui::Shape::mesh(mesh));
        }
    }

    // Strokes go on top of every fill so a highlighted outline is never
    // hidden by a neighboring region.
    for region in &scene.regions {
        for poly in &region.polys {
            painter.add(egui::Shape::closed_line(
                poly.ring.iter().map(|p| egui::pos2(p[0], p[1])).collect(),
                stroke32(region.stroke),
            ));
        }
    }
}

fn color32(c: Rgb) -> egui::Color32 {
    egui::Color32::from_rgb(c.0, c.1, c.2)
}

fn stroke32(s: scene::Stroke) -> egui::Stroke {
    egui::Stroke::new(s.width, color32(s.color))
}
