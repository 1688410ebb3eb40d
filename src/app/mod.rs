//! `TextApp`: the top-level egui application state.
//!
//! This module declares the `TextApp` struct and its constructor.
//! All methods are split across the sibling sub-modules:
//!
//! - `loading` : background font/atlas load and mesh assembly
//! - `panel`   : the control panel
//! - `viewport`: per-frame parameter push, rendering and display

pub mod loading;
pub mod panel;
pub mod viewport;

use eframe::egui;

use sdf_text::config::SceneConfig;
use sdf_text::font::loader::{AssetRequest, LoadedFont};
use sdf_text::render::mesh::{DisplayParameters, TextMesh};
use sdf_text::render::RenderBackend;

// ─── Application state ───────────────────────────────────────────────────────

pub enum SceneState {
    Loading(AssetRequest<LoadedFont>),
    Ready(TextMesh),
    Failed(String),
}

/// Everything that affects the rendered frame. A new frame is rendered only
/// when this changes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameKey {
    pub params: DisplayParameters,
    pub text_color: [f32; 3],
    pub outline_color: [f32; 3],
    pub opacity: f32,
    pub size: [usize; 2],
}

pub struct TextApp {
    pub config: SceneConfig,
    pub params: DisplayParameters,
    pub text_color: [f32; 3],
    pub outline_color: [f32; 3],
    pub opacity: f32,
    pub scene: SceneState,
    pub texture: Option<egui::TextureHandle>,
    pub rendered: Option<FrameKey>,
    pub backend: RenderBackend,
    pub last_render_ms: f64,
    #[cfg(feature = "sdf-render")]
    pub gpu_renderer: Option<sdf_text::render::gpu_renderer::GpuTextRenderer>,
}

impl TextApp {
    /// Start loading the configured font. `startup_error` puts the window
    /// straight into the failure state (e.g. an unreadable config file).
    pub fn new(ctx: &egui::Context, config: SceneConfig, startup_error: Option<String>) -> Self {
        #[cfg(feature = "sdf-render")]
        let gpu_renderer = {
            let gpu = sdf_text::render::gpu_renderer::GpuTextRenderer::new();
            if gpu.is_none() {
                log::warn!("no GPU adapter available, using the CPU renderer");
            }
            gpu
        };

        let mut app = Self {
            params: config.parameters.clamped(),
            text_color: config.text_color,
            outline_color: config.outline_color,
            opacity: config.opacity,
            scene: SceneState::Failed(String::new()),
            texture: None,
            rendered: None,
            backend: RenderBackend::default(),
            last_render_ms: 0.0,
            #[cfg(feature = "sdf-render")]
            gpu_renderer,
            config,
        };

        match startup_error {
            Some(message) => app.scene = SceneState::Failed(message),
            None => app.start_loading(ctx),
        }
        app
    }

    /// Restore the panel to the configured starting values.
    pub fn reset_parameters(&mut self) {
        self.params = self.config.parameters.clamped();
        self.text_color = self.config.text_color;
        self.outline_color = self.config.outline_color;
        self.opacity = self.config.opacity;
    }

    pub fn frame_key(&self, size: [usize; 2]) -> FrameKey {
        FrameKey {
            params: self.params,
            text_color: self.text_color,
            outline_color: self.outline_color,
            opacity: self.opacity,
            size,
        }
    }
}

impl eframe::App for TextApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.check_loading();

        egui::SidePanel::left("controls")
            .default_width(240.0)
            .resizable(false)
            .show(ctx, |ui| {
                self.draw_panel(ui, ctx);
            });

        let bg = self.config.background;
        let fill = egui::Color32::from_rgb(
            (bg[0] * 255.0).round() as u8,
            (bg[1] * 255.0).round() as u8,
            (bg[2] * 255.0).round() as u8,
        );
        let ctx_clone = ctx.clone();
        egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(fill))
            .show(ctx, |ui| {
                self.draw_viewport(ui, &ctx_clone);
            });
    }
}
