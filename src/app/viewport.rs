//! Main viewport for `TextApp`.
//!
//! Pushes the panel values into the mesh, re-renders when anything that
//! affects the frame changed, and paints the frame as a texture.

use eframe::egui;

use sdf_text::render::sdf_renderer::render_mesh_cpu;
use sdf_text::render::RenderBackend;

use super::{SceneState, TextApp};

impl TextApp {
    pub fn draw_viewport(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        let (rect, _response) = ui.allocate_exact_size(ui.available_size(), egui::Sense::hover());

        match &self.scene {
            SceneState::Loading(_) => {
                ui.put(rect, egui::Spinner::new().size(32.0));
                return;
            }
            SceneState::Failed(message) => {
                let message = message.clone();
                ui.put(
                    rect,
                    egui::Label::new(
                        egui::RichText::new(format!("Failed to load scene:\n{message}"))
                            .color(egui::Color32::from_rgb(140, 20, 20))
                            .size(16.0),
                    ),
                );
                return;
            }
            SceneState::Ready(_) => {}
        }

        let ppp = ctx.pixels_per_point();
        let w = (rect.width() * ppp).round() as usize;
        let h = (rect.height() * ppp).round() as usize;
        if w == 0 || h == 0 {
            return;
        }

        let key = self.frame_key([w, h]);
        if self.rendered != Some(key) || self.texture.is_none() {
            self.render_frame(ctx, [rect.width(), rect.height()], ppp, w, h);
            self.rendered = Some(key);
        }

        if let Some(ref tex) = self.texture {
            ui.painter().image(
                tex.id(),
                rect,
                egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                egui::Color32::WHITE,
            );
        }
    }

    /// Update the mesh for this frame and render it to `self.texture`.
    fn render_frame(&mut self, ctx: &egui::Context, viewport: [f32; 2], ppp: f32, w: usize, h: usize) {
        let SceneState::Ready(mesh) = &mut self.scene else {
            return;
        };
        let u = &mut mesh.material.uniforms;
        u.text_color = self.text_color;
        u.outline_color = self.outline_color;
        u.opacity = self.opacity;
        mesh.apply_parameters(&self.params, viewport);
        mesh.transform = mesh.transform.scaled(ppp);

        let start = std::time::Instant::now();
        let background = self.config.background;

        #[cfg(feature = "sdf-render")]
        let gpu_pixels = self
            .gpu_renderer
            .as_mut()
            .and_then(|gpu| gpu.render(mesh, w, h, background));
        #[cfg(not(feature = "sdf-render"))]
        let gpu_pixels: Option<Vec<u8>> = None;

        let (pixels, backend) = match gpu_pixels {
            Some(pixels) => (pixels, RenderBackend::Gpu),
            None => (render_mesh_cpu(mesh, w, h, background), RenderBackend::Cpu),
        };

        self.last_render_ms = start.elapsed().as_secs_f64() * 1000.0;
        self.backend = backend;
        log::debug!(
            "rendered {}x{} frame on {} in {:.2} ms",
            w,
            h,
            backend.label(),
            self.last_render_ms
        );

        let image = egui::ColorImage::from_rgba_unmultiplied([w, h], &pixels);
        self.texture = Some(ctx.load_texture("sdf_text", image, egui::TextureOptions::LINEAR));
    }
}
