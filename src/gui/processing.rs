use crate::core::VideoSource;
use eframe::egui;
use std::time::{Duration, Instant};

/// Rotating status lines shown while a job is in flight. Purely
/// cosmetic: the real job state only changes when the worker reports.
pub const PROCESSING_MESSAGES: &[&str] = &[
    "Analyzing source video frames...",
    "Extracting cinematic style cues...",
    "Generating 3D depth map...",
    "Building immersive VR environment...",
    "Rendering left and right eye perspectives...",
    "Stitching stereoscopic video stream...",
    "Encoding for VR headset playback...",
    "This can take a few minutes, hang tight!",
    "Finalizing high-fidelity VR180 output...",
    "Almost there, preparing your immersive experience...",
];

const MESSAGE_ROTATION_INTERVAL: Duration = Duration::from_secs(3);

pub struct ProcessingView {
    message_index: usize,
    last_rotation: Instant,
}

impl ProcessingView {
    pub fn new() -> Self {
        Self {
            message_index: 0,
            last_rotation: Instant::now(),
        }
    }

    pub fn reset(&mut self) {
        self.message_index = 0;
        self.last_rotation = Instant::now();
    }

    pub fn current_message(&self) -> &'static str {
        PROCESSING_MESSAGES[self.message_index]
    }

    fn advance(&mut self) {
        self.message_index = (self.message_index + 1) % PROCESSING_MESSAGES.len();
    }

    fn tick(&mut self) {
        if self.last_rotation.elapsed() >= MESSAGE_ROTATION_INTERVAL {
            self.advance();
            self.last_rotation = Instant::now();
        }
    }

    pub fn show(&mut self, ui: &mut egui::Ui, source: &VideoSource) {
        self.tick();

        ui.vertical_centered(|ui| {
            egui::Frame::none()
                .fill(egui::Color32::from_gray(30))
                .stroke(egui::Stroke::new(1.0, egui::Color32::from_gray(70)))
                .rounding(12.0)
                .inner_margin(32.0)
                .show(ui, |ui| {
                    ui.set_width(560.0);
                    ui.add(egui::Spinner::new().size(56.0));
                    ui.add_space(16.0);
                    ui.heading("Processing Your Video...");
                    ui.add_space(8.0);
                    ui.label(self.current_message());
                    ui.add_space(12.0);
                    ui.small(egui::RichText::new(&source.file_name).monospace());
                });
        });
    }
}

impl Default for ProcessingView {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_on_first_message() {
        let view = ProcessingView::new();
        assert_eq!(view.current_message(), PROCESSING_MESSAGES[0]);
    }

    #[test]
    fn test_advance_wraps_around() {
        let mut view = ProcessingView::new();
        for _ in 0..PROCESSING_MESSAGES.len() {
            view.advance();
        }
        assert_eq!(view.current_message(), PROCESSING_MESSAGES[0]);

        view.advance();
        assert_eq!(view.current_message(), PROCESSING_MESSAGES[1]);
    }

    #[test]
    fn test_reset_returns_to_first_message() {
        let mut view = ProcessingView::new();
        view.advance();
        view.advance();

        view.reset();
        assert_eq!(view.current_message(), PROCESSING_MESSAGES[0]);
    }
}
