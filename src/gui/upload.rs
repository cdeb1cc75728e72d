use crate::core::VideoSource;
use crate::gui::preview::poster_texture;
use crate::video::{VideoProcessor, DEFAULT_SEEK_FRACTION};
use eframe::egui;
use std::path::{Path, PathBuf};

const VIDEO_EXTENSIONS: &[&str] = &["mp4", "webm", "mov", "mkv", "avi", "ogg", "m4v"];

pub fn is_video_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_lowercase();
            VIDEO_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// State for the upload screen: the picked file, its probed metadata and
/// its poster frame.
pub struct UploadView {
    selected: Option<VideoSource>,
    preview: Option<egui::TextureHandle>,
    reject_message: Option<String>,
}

impl UploadView {
    pub fn new() -> Self {
        Self {
            selected: None,
            preview: None,
            reject_message: None,
        }
    }

    pub fn clear(&mut self) {
        self.selected = None;
        self.preview = None;
        self.reject_message = None;
    }

    pub fn selected(&self) -> Option<&VideoSource> {
        self.selected.as_ref()
    }

    /// Validate a candidate file and make it the current selection.
    /// Probing doubles as the validity check: anything ffprobe rejects is
    /// turned away with the same message as a wrong file type.
    pub fn select_file(&mut self, ctx: &egui::Context, path: PathBuf) {
        if !is_video_file(&path) {
            log::warn!("Rejected non-video file: {}", path.display());
            self.reject_message = Some("Please select a valid video file.".to_string());
            return;
        }

        let info = match VideoProcessor::probe(&path) {
            Ok(info) => info,
            Err(e) => {
                log::warn!("Failed to probe {}: {}", path.display(), e);
                self.reject_message = Some("Please select a valid video file.".to_string());
                return;
            }
        };

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| "video".to_string());
        let size_bytes = std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);

        self.preview = match poster_texture(ctx, &path, DEFAULT_SEEK_FRACTION) {
            Ok(texture) => Some(texture),
            Err(e) => {
                log::warn!("Failed to load preview frame for {}: {}", path.display(), e);
                None
            }
        };

        log::info!("Selected {} ({:.1}s)", path.display(), info.duration);
        self.reject_message = None;
        self.selected = Some(VideoSource {
            path,
            file_name,
            size_bytes,
            duration_seconds: info.duration,
        });
    }

    /// Render the upload screen. Returns the selected source once the
    /// user confirms the conversion.
    pub fn show(
        &mut self,
        ui: &mut egui::Ui,
        error_banner: Option<&str>,
        drag_active: bool,
    ) -> Option<VideoSource> {
        let mut submitted = None;

        ui.vertical_centered(|ui| {
            if let Some(message) = error_banner {
                egui::Frame::none()
                    .fill(egui::Color32::from_rgb(70, 20, 20))
                    .stroke(egui::Stroke::new(1.0, egui::Color32::from_rgb(160, 60, 60)))
                    .rounding(6.0)
                    .inner_margin(10.0)
                    .show(ui, |ui| {
                        ui.colored_label(
                            egui::Color32::from_rgb(255, 180, 180),
                            format!("Error: {}", message),
                        );
                    });
                ui.add_space(12.0);
            }

            if let Some(message) = &self.reject_message {
                ui.colored_label(egui::Color32::from_rgb(255, 200, 120), message);
                ui.add_space(8.0);
            }

            let border = if drag_active {
                egui::Color32::from_rgb(110, 110, 230)
            } else {
                egui::Color32::from_gray(90)
            };

            egui::Frame::none()
                .fill(egui::Color32::from_gray(30))
                .stroke(egui::Stroke::new(2.0, border))
                .rounding(12.0)
                .inner_margin(24.0)
                .show(ui, |ui| {
                    ui.set_width(560.0);

                    match &self.selected {
                        None => {
                            ui.label(egui::RichText::new("🎬").size(48.0));
                            ui.add_space(8.0);
                            ui.label("Drag & drop your video file here or");
                            ui.add_space(8.0);
                            if ui.button("Browse Files").clicked() {
                                if let Some(path) = rfd::FileDialog::new()
                                    .add_filter("Video files", VIDEO_EXTENSIONS)
                                    .pick_file()
                                {
                                    let ctx = ui.ctx().clone();
                                    self.select_file(&ctx, path);
                                }
                            }
                            ui.add_space(8.0);
                            ui.small("Common formats like MP4, WebM and MKV work best. The file is probed with ffprobe before conversion.");
                        }
                        Some(source) => {
                            if let Some(texture) = &self.preview {
                                ui.add(egui::Image::new(texture).max_height(260.0).rounding(8.0));
                                ui.add_space(8.0);
                            }
                            ui.monospace(&source.file_name);
                            ui.small(format!(
                                "{:.1} s · {:.1} MB",
                                source.duration_seconds,
                                source.size_bytes as f64 / 1_000_000.0
                            ));
                            ui.add_space(6.0);
                            ui.small("A representative frame will be extracted to inspire the AI in generating a new immersive video.");
                            ui.add_space(10.0);

                            ui.horizontal(|ui| {
                                // Keep the button pair roughly centered in the frame.
                                ui.add_space(150.0);
                                if ui.button("Change Video").clicked() {
                                    if let Some(path) = rfd::FileDialog::new()
                                        .add_filter("Video files", VIDEO_EXTENSIONS)
                                        .pick_file()
                                    {
                                        let ctx = ui.ctx().clone();
                                        self.select_file(&ctx, path);
                                    }
                                }
                                if ui.button("✨ Convert to VR180").clicked() {
                                    submitted = self.selected.clone();
                                }
                            });
                        }
                    }
                });
        });

        submitted
    }
}

impl Default for UploadView {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_extension_detection() {
        assert!(is_video_file(Path::new("clip.mp4")));
        assert!(is_video_file(Path::new("CLIP.MKV")));
        assert!(is_video_file(Path::new("/videos/holiday.webm")));

        assert!(!is_video_file(Path::new("notes.txt")));
        assert!(!is_video_file(Path::new("picture.jpg")));
        assert!(!is_video_file(Path::new("no_extension")));
    }

    #[test]
    fn test_clear_resets_selection() {
        let mut view = UploadView::new();
        view.reject_message = Some("Please select a valid video file.".to_string());

        view.clear();

        assert!(view.selected().is_none());
        assert!(view.reject_message.is_none());
    }
}
