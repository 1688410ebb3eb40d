use std::path::PathBuf;

use eframe::egui;

use sdf_text::config::SceneConfig;

mod app;

use app::TextApp;

fn main() {
    env_logger::init();

    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let (config, startup_error) = match SceneConfig::resolve(config_path.as_deref()) {
        Ok(config) => (config, None),
        Err(e) => {
            log::error!("failed to load config: {}", e);
            (SceneConfig::default(), Some(format!("config error: {e}")))
        }
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([config.window.width, config.window.height])
            .with_title(config.window.title.clone()),
        ..Default::default()
    };

    let title = config.window.title.clone();
    eframe::run_native(
        &title,
        options,
        Box::new(move |cc| Ok(Box::new(TextApp::new(&cc.egui_ctx, config, startup_error)))),
    )
    .expect("Failed to start SDF text viewer");
}
