use crate::veo::api::VeoApi;
use crate::veo::convert::{ConversionClient, CONVERSION_PROMPT};
use crate::video::{ResultStore, StoredVideo};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use tokio::sync::mpsc;

/// Request to convert one video file.
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    pub source: PathBuf,
}

/// Outcome of a conversion, delivered back to the GUI thread.
#[derive(Debug)]
pub struct ConversionOutcome {
    pub source: PathBuf,
    pub result: Result<StoredVideo, String>,
}

/// Runs conversions on a background thread so the UI stays responsive.
///
/// Requests are processed strictly one at a time; the state machine only
/// permits starting a conversion from the upload screen, so the queue
/// never holds more than one entry in practice.
pub struct ConversionWorker {
    request_sender: mpsc::UnboundedSender<ConversionRequest>,
    result_receiver: Arc<Mutex<mpsc::UnboundedReceiver<ConversionOutcome>>>,
}

impl ConversionWorker {
    pub fn new(api: VeoApi, store: ResultStore, poll_interval: Duration) -> Self {
        let (request_tx, mut request_rx) = mpsc::unbounded_channel::<ConversionRequest>();
        let (result_tx, result_rx) = mpsc::unbounded_channel::<ConversionOutcome>();

        thread::spawn(move || {
            let rt = tokio::runtime::Runtime::new().expect("Failed to create async runtime");

            rt.block_on(async move {
                let client = ConversionClient::new(api, store).with_poll_interval(poll_interval);

                while let Some(request) = request_rx.recv().await {
                    log::info!("Starting conversion for {}", request.source.display());

                    let result = client
                        .convert(request.source.clone(), CONVERSION_PROMPT)
                        .await
                        .map_err(|e| e.to_string());

                    match &result {
                        Ok(video) => log::info!("Conversion finished: {}", video.path().display()),
                        Err(message) => log::error!("Conversion failed: {}", message),
                    }

                    let outcome = ConversionOutcome {
                        source: request.source,
                        result,
                    };
                    if result_tx.send(outcome).is_err() {
                        // The GUI side is gone, nothing left to do.
                        break;
                    }
                }
            });
        });

        Self {
            request_sender: request_tx,
            result_receiver: Arc::new(Mutex::new(result_rx)),
        }
    }

    /// Queue a conversion (non-blocking).
    pub fn start(&self, source: PathBuf) {
        let request = ConversionRequest { source };
        if let Err(e) = self.request_sender.send(request) {
            log::error!("Failed to queue conversion request: {}", e);
        }
    }

    /// Drain finished conversions (non-blocking).
    pub fn poll_outcomes(&self) -> Vec<ConversionOutcome> {
        let mut outcomes = Vec::new();

        if let Ok(mut receiver) = self.result_receiver.lock() {
            while let Ok(outcome) = receiver.try_recv() {
                outcomes.push(outcome);
            }
        }

        outcomes
    }
}
