//! Font loading for `TextApp`.
//!
//! The font description and atlas are read on a background thread
//! (`start_loading`); `check_loading` polls the result every frame and
//! assembles the text mesh once it arrives.

use eframe::egui;

use sdf_text::engine::pipeline::{build_text_mesh, MeshOptions};
use sdf_text::font::loader::{load_font_assets, AssetRequest};

use super::{SceneState, TextApp};

impl TextApp {
    /// Start an async font + atlas load.
    pub fn start_loading(&mut self, ctx: &egui::Context) {
        let font_path = self.config.font_path.clone();
        let atlas_path = self.config.atlas_path.clone();
        let ctx = ctx.clone();

        log::info!("loading font {}", font_path.display());

        let request = AssetRequest::spawn(
            move || load_font_assets(&font_path, atlas_path.as_deref()),
            move || ctx.request_repaint(),
        );
        self.scene = SceneState::Loading(request);
        self.texture = None;
        self.rendered = None;
    }

    /// Poll the load and build the mesh when the font arrives.
    pub fn check_loading(&mut self) {
        let SceneState::Loading(request) = &self.scene else {
            return;
        };
        let Some(result) = request.poll() else {
            return;
        };

        let built = result
            .map_err(|e| e.to_string())
            .and_then(|font| {
                build_text_mesh(&font, &self.config.text, &MeshOptions::from_config(&self.config))
                    .map_err(|e| e.to_string())
            });

        self.scene = match built {
            Ok(mesh) => SceneState::Ready(mesh),
            Err(message) => {
                log::error!("failed to load scene: {}", message);
                SceneState::Failed(message)
            }
        };
        self.rendered = None;
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.scene, SceneState::Loading(_))
    }
}
