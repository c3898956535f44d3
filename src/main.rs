#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use eframe::egui;

fn main() -> eframe::Result<()> {
    if let Err(e) = homedash::logging::init_tracing() {
        eprintln!("logging disabled: {e}");
    }

    let viewport = egui::ViewportBuilder::default()
        .with_inner_size([1200.0, 900.0])
        .with_min_inner_size([900.0, 700.0])
        .with_title("HomeDash");

    let options = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting HomeDash");

    eframe::run_native(
        "HomeDash",
        options,
        Box::new(|cc| Ok(Box::new(homedash::ui::HomeDashApp::new(cc)?))),
    )
}
