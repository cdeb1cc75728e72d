mod core;
mod gui;
mod veo;
mod video;

use eframe::egui;
use gui::ConverterApp;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    // The service credential must be available before any conversion can
    // run, so a missing key aborts startup rather than a conversion.
    let credentials = crate::core::Credentials::from_env()?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([960.0, 760.0])
            .with_title("VR180 Immersive Converter"),
        ..Default::default()
    };

    eframe::run_native(
        "VR180 Converter",
        options,
        Box::new(move |cc| {
            match ConverterApp::new(cc, credentials) {
                Ok(app) => Ok(Box::new(app)),
                Err(e) => {
                    eprintln!("Failed to initialize app: {}", e);
                    std::process::exit(1);
                }
            }
        }),
    ).map_err(|e| anyhow::anyhow!("Failed to run app: {}", e))?;

    Ok(())
}
