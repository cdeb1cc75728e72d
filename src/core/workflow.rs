use crate::video::StoredVideo;
use std::path::PathBuf;

/// Shown whenever the workflow lands in a state it cannot render.
pub const GENERATION_FAILED_MESSAGE: &str = "Video generation failed. Please try again.";

/// A video file chosen by the user, waiting to be converted.
#[derive(Debug, Clone)]
pub struct VideoSource {
    pub path: PathBuf,
    pub file_name: String,
    pub size_bytes: u64,
    pub duration_seconds: f64,
}

/// The three phases of the conversion workflow. Each variant carries only
/// the data that is valid for that phase, so a "Processing without a
/// source" or "Result without a video" cannot be constructed.
#[derive(Debug)]
pub enum WorkflowState {
    Upload { error: Option<String> },
    Processing { source: VideoSource },
    Result { video: StoredVideo },
}

/// Drives the Upload -> Processing -> Result cycle and owns the single
/// live result handle. Releasing the previous handle always happens
/// before (or at) the moment a replacement exists.
pub struct Workflow {
    state: WorkflowState,
}

impl Workflow {
    pub fn new() -> Self {
        Self {
            state: WorkflowState::Upload { error: None },
        }
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    pub fn is_processing(&self) -> bool {
        matches!(self.state, WorkflowState::Processing { .. })
    }

    /// Start a conversion for `source`. Clears any previous error and
    /// releases a previous result video. Returns false if a conversion
    /// is already running.
    pub fn submit(&mut self, source: VideoSource) -> bool {
        match &mut self.state {
            WorkflowState::Processing { .. } => {
                log::warn!("Ignoring submit while a conversion is already running");
                false
            }
            WorkflowState::Result { video } => {
                video.release();
                self.state = WorkflowState::Processing { source };
                true
            }
            WorkflowState::Upload { .. } => {
                self.state = WorkflowState::Processing { source };
                true
            }
        }
    }

    /// Apply the outcome of the running conversion. A success moves to
    /// Result; a failure returns to Upload carrying the message. An
    /// outcome that arrives while no conversion is running is an
    /// inconsistency: its payload is released and the workflow falls back
    /// to Upload with a generic message.
    pub fn finish(&mut self, outcome: Result<StoredVideo, String>) {
        if !self.is_processing() {
            log::error!("Conversion outcome arrived outside of a running conversion");
            if let Ok(mut video) = outcome {
                video.release();
            }
            self.state = WorkflowState::Upload {
                error: Some(GENERATION_FAILED_MESSAGE.to_string()),
            };
            return;
        }

        self.state = match outcome {
            Ok(video) => WorkflowState::Result { video },
            Err(message) => {
                log::error!("Conversion failed: {}", message);
                WorkflowState::Upload { error: Some(message) }
            }
        };
    }

    /// Return to the upload screen, releasing the result video.
    pub fn start_over(&mut self) {
        if let WorkflowState::Result { video } = &mut self.state {
            video.release();
        }
        self.state = WorkflowState::Upload { error: None };
    }

    /// Redirect a Result whose backing file has gone missing back to
    /// Upload instead of rendering a dead handle.
    pub fn validate(&mut self) {
        let broken = matches!(&self.state, WorkflowState::Result { video } if !video.is_available());
        if broken {
            log::error!("Result video is no longer available, returning to upload");
            self.state = WorkflowState::Upload {
                error: Some(GENERATION_FAILED_MESSAGE.to_string()),
            };
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.state {
            WorkflowState::Upload { error } => error.as_deref(),
            _ => None,
        }
    }
}

impl Default for Workflow {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::video::ResultStore;
    use std::path::Path;

    fn test_source(name: &str) -> VideoSource {
        VideoSource {
            path: PathBuf::from(name),
            file_name: name.to_string(),
            size_bytes: 1024,
            duration_seconds: 12.0,
        }
    }

    fn test_store() -> ResultStore {
        let dir = std::env::temp_dir()
            .join("vr180-converter-tests")
            .join(uuid::Uuid::new_v4().to_string());
        ResultStore::in_dir(dir).expect("Failed to create test store")
    }

    fn stored_video(store: &ResultStore) -> StoredVideo {
        store.store(b"fake video bytes").expect("Failed to store test video")
    }

    #[test]
    fn test_initial_state_is_upload_without_error() {
        let workflow = Workflow::new();
        match workflow.state() {
            WorkflowState::Upload { error } => assert!(error.is_none()),
            other => panic!("Unexpected initial state: {:?}", other),
        }
    }

    #[test]
    fn test_submit_carries_source_and_clears_error() {
        let mut workflow = Workflow::new();
        workflow.finish(Err("earlier failure".to_string()));
        assert_eq!(workflow.error_message(), Some(GENERATION_FAILED_MESSAGE));

        assert!(workflow.submit(test_source("clip.mp4")));
        match workflow.state() {
            WorkflowState::Processing { source } => {
                assert_eq!(source.path, Path::new("clip.mp4"));
                assert_eq!(source.duration_seconds, 12.0);
            }
            other => panic!("Expected processing state, got {:?}", other),
        }
        assert!(workflow.error_message().is_none());
    }

    #[test]
    fn test_failure_returns_to_upload_with_message() {
        let mut workflow = Workflow::new();
        workflow.submit(test_source("clip.mp4"));
        workflow.finish(Err("the service returned no video".to_string()));

        match workflow.state() {
            WorkflowState::Upload { error } => {
                assert_eq!(error.as_deref(), Some("the service returned no video"));
            }
            other => panic!("Expected upload state, got {:?}", other),
        }
    }

    #[test]
    fn test_success_reaches_result_with_live_handle() {
        let store = test_store();
        let mut workflow = Workflow::new();
        workflow.submit(test_source("clip.mp4"));
        workflow.finish(Ok(stored_video(&store)));

        match workflow.state() {
            WorkflowState::Result { video } => assert!(video.is_available()),
            other => panic!("Expected result state, got {:?}", other),
        }
    }

    #[test]
    fn test_start_over_releases_result_video() {
        let store = test_store();
        let mut workflow = Workflow::new();
        workflow.submit(test_source("clip.mp4"));
        workflow.finish(Ok(stored_video(&store)));

        let result_path = match workflow.state() {
            WorkflowState::Result { video } => video.path().to_path_buf(),
            other => panic!("Expected result state, got {:?}", other),
        };
        assert!(result_path.exists());

        workflow.start_over();
        assert!(!result_path.exists());
        match workflow.state() {
            WorkflowState::Upload { error } => assert!(error.is_none()),
            other => panic!("Expected upload state, got {:?}", other),
        }
    }

    #[test]
    fn test_new_conversion_releases_previous_handle() {
        let store = test_store();
        let mut workflow = Workflow::new();
        workflow.submit(test_source("first.mp4"));
        workflow.finish(Ok(stored_video(&store)));

        let first_path = match workflow.state() {
            WorkflowState::Result { video } => video.path().to_path_buf(),
            other => panic!("Expected result state, got {:?}", other),
        };

        // Submitting straight from the result screen must not leave two
        // live handles behind.
        assert!(workflow.submit(test_source("second.mp4")));
        assert!(!first_path.exists());
        assert!(workflow.is_processing());
    }

    #[test]
    fn test_stale_outcome_is_released_and_redirected() {
        let store = test_store();
        let mut workflow = Workflow::new();

        let video = stored_video(&store);
        let stale_path = video.path().to_path_buf();
        workflow.finish(Ok(video));

        assert!(!stale_path.exists());
        assert_eq!(workflow.error_message(), Some(GENERATION_FAILED_MESSAGE));
    }

    #[test]
    fn test_validate_redirects_missing_result_file() {
        let store = test_store();
        let mut workflow = Workflow::new();
        workflow.submit(test_source("clip.mp4"));
        workflow.finish(Ok(stored_video(&store)));

        // Simulate the backing file vanishing out from under the handle.
        if let WorkflowState::Result { video } = workflow.state() {
            std::fs::remove_file(video.path()).expect("Failed to remove result file");
        }

        workflow.validate();
        assert_eq!(workflow.error_message(), Some(GENERATION_FAILED_MESSAGE));
    }

    #[test]
    fn test_submit_is_ignored_while_processing() {
        let mut workflow = Workflow::new();
        assert!(workflow.submit(test_source("first.mp4")));
        assert!(!workflow.submit(test_source("second.mp4")));

        match workflow.state() {
            WorkflowState::Processing { source } => {
                assert_eq!(source.file_name, "first.mp4");
            }
            other => panic!("Expected processing state, got {:?}", other),
        }
    }
}
