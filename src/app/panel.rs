//! Control panel for `TextApp`.
//!
//! The five display controls, plus colours, opacity and a status block.

use eframe::egui;

use sdf_text::render::mesh::DisplayParameters;

use super::{SceneState, TextApp};

impl TextApp {
    /// Render the side panel.
    pub fn draw_panel(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        ui.add_space(6.0);
        ui.heading("SDF text");
        ui.separator();

        ui.checkbox(&mut self.params.draw_uv, "Show UV");
        ui.checkbox(&mut self.params.draw_distance, "Show distance field");

        ui.add(
            egui::Slider::new(&mut self.params.scale, DisplayParameters::SCALE_RANGE)
                .logarithmic(true)
                .text("Text scale"),
        );
        ui.add(
            egui::Slider::new(&mut self.params.buffer, DisplayParameters::BUFFER_RANGE)
                .text("SDF buffer"),
        );
        ui.add(
            egui::Slider::new(&mut self.params.outline_size, DisplayParameters::OUTLINE_RANGE)
                .text("Outline width"),
        );

        ui.separator();

        ui.horizontal(|ui| {
            ui.color_edit_button_rgb(&mut self.text_color);
            ui.label("Text colour");
        });
        ui.horizontal(|ui| {
            ui.color_edit_button_rgb(&mut self.outline_color);
            ui.label("Outline colour");
        });
        ui.add(egui::Slider::new(&mut self.opacity, 0.0..=1.0).text("Opacity"));

        ui.add_space(4.0);
        ui.horizontal(|ui| {
            if ui.button("Reset").clicked() {
                self.reset_parameters();
            }
            if ui
                .add_enabled(!self.is_loading(), egui::Button::new("Reload font"))
                .clicked()
            {
                self.start_loading(ctx);
            }
        });

        ui.separator();
        self.draw_status(ui);
    }

    fn draw_status(&self, ui: &mut egui::Ui) {
        let dim = egui::Color32::GRAY;
        ui.colored_label(dim, format!("Font: {}", self.config.font_path.display()));
        match &self.scene {
            SceneState::Loading(_) => {
                ui.colored_label(dim, "Loading…");
            }
            SceneState::Failed(_) => {
                ui.colored_label(egui::Color32::from_rgb(200, 60, 60), "Load failed");
            }
            SceneState::Ready(mesh) => {
                ui.colored_label(dim, format!("Glyphs: {}", mesh.geometry.glyph_count()));
                ui.colored_label(dim, format!("Atlas: {}", mesh.atlas().size()));
                ui.colored_label(
                    dim,
                    format!(
                        "Renderer: {} ({:.1} ms)",
                        self.backend.label(),
                        self.last_render_ms
                    ),
                );
            }
        }
    }
}
