use crate::gui::preview::poster_texture;
use crate::video::StoredVideo;
use eframe::egui;
use std::path::{Path, PathBuf};

/// What the user did on the result screen this frame.
#[derive(Debug)]
pub enum ResultAction {
    None,
    StartOver,
    Saved(PathBuf),
}

/// Final screen: preview of the generated video plus save controls.
pub struct ResultView {
    poster: Option<egui::TextureHandle>,
    poster_for: Option<PathBuf>,
    save_feedback: Option<String>,
}

impl ResultView {
    pub fn new() -> Self {
        Self {
            poster: None,
            poster_for: None,
            save_feedback: None,
        }
    }

    pub fn reset(&mut self) {
        self.poster = None;
        self.poster_for = None;
        self.save_feedback = None;
    }

    fn ensure_poster(&mut self, ctx: &egui::Context, video: &StoredVideo) {
        if self.poster_for.as_deref() == Some(video.path()) {
            return;
        }
        self.poster_for = Some(video.path().to_path_buf());
        self.poster = match poster_texture(ctx, video.path(), 0.0) {
            Ok(texture) => Some(texture),
            Err(e) => {
                log::warn!("Failed to load result preview: {}", e);
                None
            }
        };
    }

    pub fn show(
        &mut self,
        ui: &mut egui::Ui,
        video: &StoredVideo,
        default_directory: Option<&Path>,
    ) -> ResultAction {
        self.ensure_poster(ui.ctx(), video);
        let mut action = ResultAction::None;

        ui.vertical_centered(|ui| {
            egui::Frame::none()
                .fill(egui::Color32::from_gray(30))
                .stroke(egui::Stroke::new(1.0, egui::Color32::from_gray(70)))
                .rounding(12.0)
                .inner_margin(24.0)
                .show(ui, |ui| {
                    ui.set_width(640.0);
                    ui.heading("Your Immersive VR180 Video is Ready!");
                    ui.add_space(6.0);
                    ui.label("Save the video below and play it on your VR headset.");
                    ui.add_space(12.0);

                    if let Some(texture) = &self.poster {
                        ui.add(egui::Image::new(texture).max_height(320.0).rounding(8.0));
                    } else {
                        ui.monospace(video.path().display().to_string());
                    }
                    ui.add_space(14.0);

                    ui.horizontal(|ui| {
                        ui.add_space(170.0);
                        if ui.button("⬇ Download Video").clicked() {
                            let mut dialog = rfd::FileDialog::new().set_file_name("vr180_video.mp4");
                            if let Some(dir) = default_directory {
                                dialog = dialog.set_directory(dir);
                            }
                            if let Some(destination) = dialog.save_file() {
                                match video.save_copy_to(&destination) {
                                    Ok(()) => {
                                        log::info!("Saved result video to {}", destination.display());
                                        self.save_feedback =
                                            Some(format!("Saved to {}", destination.display()));
                                        action = ResultAction::Saved(destination);
                                    }
                                    Err(e) => {
                                        log::error!("Failed to save result video: {}", e);
                                        self.save_feedback = Some(e.to_string());
                                    }
                                }
                            }
                        }
                        if ui.button("Convert Another Video").clicked() {
                            action = ResultAction::StartOver;
                        }
                    });

                    if let Some(feedback) = &self.save_feedback {
                        ui.add_space(8.0);
                        ui.small(feedback);
                    }
                });
        });

        action
    }
}

impl Default for ResultView {
    fn default() -> Self {
        Self::new()
    }
}
