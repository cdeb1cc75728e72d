use crate::core::{AppConfig, Credentials, VideoSource, Workflow, WorkflowState};
use crate::gui::processing::ProcessingView;
use crate::gui::result::{ResultAction, ResultView};
use crate::gui::upload::UploadView;
use crate::veo::{ConversionWorker, VeoApi};
use crate::video::ResultStore;
use eframe::egui;
use std::time::Duration;

pub struct ConverterApp {
    pub config: AppConfig,
    pub workflow: Workflow,
    pub worker: ConversionWorker,
    pub upload_view: UploadView,
    pub processing_view: ProcessingView,
    pub result_view: ResultView,
    pub status_message: String,
}

impl ConverterApp {
    pub fn new(cc: &eframe::CreationContext<'_>, credentials: Credentials) -> anyhow::Result<Self> {
        // Set global text color to white
        let mut visuals = egui::Visuals::dark();
        visuals.override_text_color = Some(egui::Color32::WHITE);
        cc.egui_ctx.set_visuals(visuals);

        let config = AppConfig::load()?;

        let api = VeoApi::new(config.api_base_url.clone(), config.model.clone(), credentials);
        let store = ResultStore::new()?;
        let worker = ConversionWorker::new(api, store, Duration::from_secs(config.poll_interval_secs));

        Ok(Self {
            config,
            workflow: Workflow::new(),
            worker,
            upload_view: UploadView::new(),
            processing_view: ProcessingView::new(),
            result_view: ResultView::new(),
            status_message: String::new(),
        })
    }

    /// Hand the chosen file to the state machine and the worker.
    pub fn begin_conversion(&mut self, source: VideoSource) {
        if !self.workflow.submit(source.clone()) {
            return;
        }

        self.worker.start(source.path.clone());
        self.upload_view.clear();
        self.processing_view.reset();
        self.status_message = format!("Converting {}", source.file_name);
    }

    fn process_conversion_outcomes(&mut self) {
        for outcome in self.worker.poll_outcomes() {
            match outcome.result {
                Ok(video) => {
                    log::info!("Conversion of {} succeeded", outcome.source.display());
                    self.status_message = "Conversion complete".to_string();
                    self.result_view.reset();
                    self.workflow.finish(Ok(video));
                }
                Err(message) => {
                    self.status_message = "Conversion failed".to_string();
                    self.workflow.finish(Err(message));
                }
            }
        }
    }

    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        // Dropping a file only means something on the upload screen.
        if !matches!(self.workflow.state(), WorkflowState::Upload { .. }) {
            return;
        }

        let dropped: Vec<_> = ctx.input(|i| {
            i.raw
                .dropped_files
                .iter()
                .filter_map(|file| file.path.clone())
                .collect()
        });

        if let Some(path) = dropped.into_iter().next() {
            self.upload_view.select_file(ctx, path);
        }
    }

    pub fn apply_result_action(&mut self, action: ResultAction) {
        match action {
            ResultAction::None => {}
            ResultAction::StartOver => {
                self.workflow.start_over();
                self.upload_view.clear();
                self.result_view.reset();
                self.status_message.clear();
            }
            ResultAction::Saved(destination) => {
                self.status_message = format!("Saved to {}", destination.display());
                self.config.last_download_directory = destination.parent().map(|p| p.to_path_buf());
                if let Err(e) = self.config.save() {
                    log::error!("Failed to save config: {}", e);
                }
            }
        }
    }
}

impl eframe::App for ConverterApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Pick up finished conversions before rendering anything.
        self.process_conversion_outcomes();
        self.workflow.validate();
        self.handle_dropped_files(ctx);

        let drag_active = ctx.input(|i| !i.raw.hovered_files.is_empty());

        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            ui.add_space(10.0);
            ui.vertical_centered(|ui| {
                ui.heading(
                    egui::RichText::new("VR180 Immersive Converter")
                        .size(28.0)
                        .color(egui::Color32::from_rgb(170, 150, 255)),
                );
                ui.label(
                    egui::RichText::new("Transform 2D clips into breathtaking VR180 experiences with AI.")
                        .color(egui::Color32::from_gray(170)),
                );
            });
            ui.add_space(10.0);
        });

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(&self.status_message);
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let state_label = match self.workflow.state() {
                        WorkflowState::Upload { .. } => "Ready",
                        WorkflowState::Processing { .. } => "Converting...",
                        WorkflowState::Result { .. } => "Done",
                    };
                    ui.label(state_label);
                });
            });
        });

        let mut submitted: Option<VideoSource> = None;
        let mut result_action = ResultAction::None;

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.add_space(24.0);
            match self.workflow.state() {
                WorkflowState::Upload { error } => {
                    submitted = self.upload_view.show(ui, error.as_deref(), drag_active);
                }
                WorkflowState::Processing { source } => {
                    self.processing_view.show(ui, source);
                }
                WorkflowState::Result { video } => {
                    result_action = self.result_view.show(
                        ui,
                        video,
                        self.config.last_download_directory.as_deref(),
                    );
                }
            }
        });

        if let Some(source) = submitted {
            self.begin_conversion(source);
        }
        self.apply_result_action(result_action);

        // Keep the spinner and status messages moving while the worker
        // has a job in flight.
        if self.workflow.is_processing() {
            ctx.request_repaint_after(Duration::from_millis(200));
        }
    }
}
