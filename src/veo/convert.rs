//! Orchestration of a single conversion: frame extraction, job
//! submission, polling and download of the generated video.

use crate::veo::api::{VeoApi, VeoApiError};
use crate::veo::messages::Operation;
use crate::video::{extract_frame, ExtractedFrame, FrameError, ResultStore, StoredVideo, DEFAULT_SEEK_FRACTION};
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;

/// The fixed instruction sent with every extracted frame.
pub const CONVERSION_PROMPT: &str = "Generate an immersive, ultra-wide, stereoscopic VR180 cinematic video inspired by this image. The video should have a sense of depth and peripheral detail suitable for a VR headset experience. Make it feel like you are there.";

/// How long to wait between job status checks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// The remote calls a conversion makes, behind a seam so tests can run
/// the orchestration without a network.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    async fn submit(&self, frame: &ExtractedFrame, prompt: &str) -> Result<Operation, VeoApiError>;
    async fn poll(&self, operation_name: &str) -> Result<Operation, VeoApiError>;
    async fn download(&self, uri: &str) -> Result<Vec<u8>, VeoApiError>;
}

#[async_trait]
impl GenerationBackend for VeoApi {
    async fn submit(&self, frame: &ExtractedFrame, prompt: &str) -> Result<Operation, VeoApiError> {
        self.generate_videos(frame, prompt).await
    }

    async fn poll(&self, operation_name: &str) -> Result<Operation, VeoApiError> {
        self.get_operation(operation_name).await
    }

    async fn download(&self, uri: &str) -> Result<Vec<u8>, VeoApiError> {
        VeoApi::download(self, uri).await
    }
}

/// Pacing of the poll loop, injectable so tests run without real delays.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Everything that can abort a conversion. Every step is fatal: there is
/// no partial success and no step-level retry.
#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    #[error("Frame extraction failed: {0}")]
    FrameExtraction(#[from] FrameError),

    #[error("Failed to submit the generation request: {0}")]
    Submission(VeoApiError),

    #[error("Failed while checking video generation status: {0}")]
    Polling(VeoApiError),

    #[error("The service did not return a video link.")]
    MissingResult,

    #[error("Failed to download the generated video: {0}")]
    Download(VeoApiError),

    #[error("Failed to store the downloaded video: {0}")]
    Store(String),
}

/// Runs one conversion at a time against a generation backend and parks
/// the downloaded result in a [`ResultStore`].
pub struct ConversionClient<B> {
    backend: B,
    store: ResultStore,
    poll_interval: Duration,
}

impl<B: GenerationBackend> ConversionClient<B> {
    pub fn new(backend: B, store: ResultStore) -> Self {
        Self {
            backend,
            store,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Convert the video at `source` and return a handle to the result.
    ///
    /// The handle stays valid for playback and saving until the caller
    /// releases it.
    pub async fn convert(&self, source: PathBuf, prompt: &str) -> Result<StoredVideo, ConversionError> {
        // Extraction shells out to ffmpeg, so it runs on a blocking task.
        let frame = tokio::task::spawn_blocking(move || extract_frame(&source, DEFAULT_SEEK_FRACTION))
            .await
            .expect("Frame extraction task panicked")?;

        self.generate(frame, prompt, &TokioSleeper).await
    }

    async fn generate(
        &self,
        frame: ExtractedFrame,
        prompt: &str,
        sleeper: &dyn Sleeper,
    ) -> Result<StoredVideo, ConversionError> {
        log::info!("Submitting generation request ({} byte frame)", frame.bytes.len());
        let mut operation = self
            .backend
            .submit(&frame, prompt)
            .await
            .map_err(ConversionError::Submission)?;
        log::info!("Generation job {} queued", operation.name);

        // One failed status check aborts the whole conversion; the job is
        // never re-queried after an error.
        while !operation.done {
            sleeper.sleep(self.poll_interval).await;
            operation = self
                .backend
                .poll(&operation.name)
                .await
                .map_err(ConversionError::Polling)?;
        }

        let uri = operation.first_video_uri().ok_or(ConversionError::MissingResult)?;
        log::info!("Generation job {} complete, downloading result", operation.name);

        let bytes = self
            .backend
            .download(uri)
            .await
            .map_err(ConversionError::Download)?;
        log::info!("Downloaded {} bytes of generated video", bytes.len());

        self.store
            .store(&bytes)
            .map_err(|e| ConversionError::Store(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::veo::messages::{GenerateVideosResponse, GeneratedVideo, VideoReference};
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn pending(name: &str) -> Operation {
        Operation {
            name: name.to_string(),
            done: false,
            response: None,
        }
    }

    fn complete_with(name: &str, uri: &str) -> Operation {
        Operation {
            name: name.to_string(),
            done: true,
            response: Some(GenerateVideosResponse {
                generated_videos: vec![GeneratedVideo {
                    video: Some(VideoReference {
                        uri: Some(uri.to_string()),
                    }),
                }],
            }),
        }
    }

    fn complete_empty(name: &str) -> Operation {
        Operation {
            name: name.to_string(),
            done: true,
            response: Some(GenerateVideosResponse::default()),
        }
    }

    #[derive(Default)]
    struct MockBackend {
        submit_result: Mutex<Option<Result<Operation, VeoApiError>>>,
        poll_results: Mutex<VecDeque<Result<Operation, VeoApiError>>>,
        download_result: Mutex<Option<Result<Vec<u8>, VeoApiError>>>,
        poll_count: AtomicUsize,
        download_count: AtomicUsize,
    }

    #[async_trait]
    impl GenerationBackend for MockBackend {
        async fn submit(&self, _frame: &ExtractedFrame, _prompt: &str) -> Result<Operation, VeoApiError> {
            self.submit_result
                .lock()
                .unwrap()
                .take()
                .expect("Unexpected submit call")
        }

        async fn poll(&self, _operation_name: &str) -> Result<Operation, VeoApiError> {
            self.poll_count.fetch_add(1, Ordering::SeqCst);
            self.poll_results
                .lock()
                .unwrap()
                .pop_front()
                .expect("Unexpected poll call")
        }

        async fn download(&self, _uri: &str) -> Result<Vec<u8>, VeoApiError> {
            self.download_count.fetch_add(1, Ordering::SeqCst);
            self.download_result
                .lock()
                .unwrap()
                .take()
                .expect("Unexpected download call")
        }
    }

    #[derive(Default)]
    struct CountingSleeper {
        count: AtomicUsize,
    }

    #[async_trait]
    impl Sleeper for CountingSleeper {
        async fn sleep(&self, _duration: Duration) {
            self.count.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn test_frame() -> ExtractedFrame {
        ExtractedFrame {
            bytes: vec![1, 2, 3],
            mime_type: "image/jpeg".to_string(),
        }
    }

    fn test_client(backend: MockBackend) -> ConversionClient<MockBackend> {
        let dir = std::env::temp_dir()
            .join("vr180-converter-tests")
            .join(uuid::Uuid::new_v4().to_string());
        let store = ResultStore::in_dir(dir).expect("Failed to create test store");
        ConversionClient::new(backend, store)
    }

    fn api_error(status: u16) -> VeoApiError {
        VeoApiError::Api {
            status,
            body: "boom".to_string(),
        }
    }

    #[tokio::test]
    async fn test_two_incomplete_polls_mean_two_waits() {
        let backend = MockBackend::default();
        *backend.submit_result.lock().unwrap() = Some(Ok(pending("operations/job1")));
        backend.poll_results.lock().unwrap().extend([
            Ok(pending("operations/job1")),
            Ok(complete_with("operations/job1", "https://example.com/files/v1?alt=media")),
        ]);
        *backend.download_result.lock().unwrap() = Some(Ok(b"video bytes".to_vec()));

        let client = test_client(backend);
        let sleeper = CountingSleeper::default();
        let video = client
            .generate(test_frame(), CONVERSION_PROMPT, &sleeper)
            .await
            .expect("Conversion should succeed");

        assert_eq!(sleeper.count.load(Ordering::SeqCst), 2);
        assert_eq!(client.backend.poll_count.load(Ordering::SeqCst), 2);
        assert_eq!(client.backend.download_count.load(Ordering::SeqCst), 1);
        assert!(video.is_available());
        let bytes = std::fs::read(video.path()).expect("Failed to read stored result");
        assert_eq!(bytes, b"video bytes");
    }

    #[tokio::test]
    async fn test_terminal_response_without_uri_skips_download() {
        let backend = MockBackend::default();
        *backend.submit_result.lock().unwrap() = Some(Ok(complete_empty("operations/job1")));

        let client = test_client(backend);
        let sleeper = CountingSleeper::default();
        let result = client.generate(test_frame(), CONVERSION_PROMPT, &sleeper).await;

        assert!(matches!(result, Err(ConversionError::MissingResult)));
        assert_eq!(client.backend.download_count.load(Ordering::SeqCst), 0);
        assert_eq!(sleeper.count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_first_poll_failure_is_fatal() {
        let backend = MockBackend::default();
        *backend.submit_result.lock().unwrap() = Some(Ok(pending("operations/job1")));
        backend
            .poll_results
            .lock()
            .unwrap()
            .push_back(Err(api_error(503)));

        let client = test_client(backend);
        let sleeper = CountingSleeper::default();
        let result = client.generate(test_frame(), CONVERSION_PROMPT, &sleeper).await;

        // The mock would panic on a second poll, so reaching here with a
        // count of one shows there was no retry.
        assert!(matches!(result, Err(ConversionError::Polling(_))));
        assert_eq!(client.backend.poll_count.load(Ordering::SeqCst), 1);
        assert_eq!(client.backend.download_count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_submission_failure_surfaces_as_submission_error() {
        let backend = MockBackend::default();
        *backend.submit_result.lock().unwrap() = Some(Err(api_error(401)));

        let client = test_client(backend);
        let sleeper = CountingSleeper::default();
        let result = client.generate(test_frame(), CONVERSION_PROMPT, &sleeper).await;

        assert!(matches!(result, Err(ConversionError::Submission(_))));
        assert_eq!(client.backend.poll_count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_download_failure_carries_transport_status() {
        let backend = MockBackend::default();
        *backend.submit_result.lock().unwrap() = Some(Ok(complete_with(
            "operations/job1",
            "https://example.com/files/v1",
        )));
        *backend.download_result.lock().unwrap() = Some(Err(api_error(404)));

        let client = test_client(backend);
        let sleeper = CountingSleeper::default();
        let result = client.generate(test_frame(), CONVERSION_PROMPT, &sleeper).await;

        match result {
            Err(ConversionError::Download(e)) => {
                assert_eq!(e.status(), Some(404));
                assert!(e.to_string().contains("404"));
            }
            other => panic!("Expected download error, got {:?}", other.map(|v| v.path().to_path_buf())),
        }
    }
}
