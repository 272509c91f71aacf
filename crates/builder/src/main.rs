mod app;
mod ui;
mod viewport;

// Re-export library modules so `crate::state` etc. resolve to the lib crate
// everywhere in the binary.
pub use scene_builder_lib::export;
pub use scene_builder_lib::render;
pub use scene_builder_lib::state;
pub use scene_builder_lib::texture;

use app::BuilderApp;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "scene_builder=info,scene_builder_lib=info".into()),
        )
        .init();

    let initial_scene = parse_scene_arg();

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Scene Builder")
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([720.0, 480.0]),
        ..Default::default()
    };

    if let Err(e) = eframe::run_native(
        "scene-builder",
        native_options,
        Box::new(move |cc| Ok(Box::new(BuilderApp::new(cc, initial_scene)))),
    ) {
        tracing::error!("Failed to start application: {e}");
    }
}

/// `--scene <path>`: an exported HTML document to open on startup.
fn parse_scene_arg() -> Option<std::path::PathBuf> {
    let args: Vec<String> = std::env::args().collect();
    args.iter()
        .position(|a| a == "--scene")
        .and_then(|i| args.get(i + 1))
        .map(std::path::PathBuf::from)
}
