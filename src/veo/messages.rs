//! Request and response types for the generation service's REST API.
//!
//! Generation is a long-running operation: a submission returns an
//! [`Operation`] handle that is re-fetched by name until `done` is set,
//! at which point the response lists the generated videos.

use serde::{Deserialize, Serialize};

/// Body of a `:predictLongRunning` submission.
#[derive(Debug, Serialize)]
pub struct GenerateVideosRequest {
    pub instances: Vec<GenerationInstance>,
    pub parameters: GenerationParameters,
}

/// One generation task: the prompt plus its conditioning image.
#[derive(Debug, Serialize)]
pub struct GenerationInstance {
    pub prompt: String,
    pub image: ImagePayload,
}

/// Still frame sent along with the prompt.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImagePayload {
    pub bytes_base64_encoded: String,
    pub mime_type: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationParameters {
    /// How many output videos to request. Always 1 here.
    pub number_of_videos: u32,
}

/// A long-running generation job as reported by the service.
#[derive(Debug, Clone, Deserialize)]
pub struct Operation {
    /// Server-assigned name, used to poll the job.
    pub name: String,
    /// Set once the job has reached a terminal state.
    #[serde(default)]
    pub done: bool,
    /// Present only on terminal operations that produced output.
    #[serde(default)]
    pub response: Option<GenerateVideosResponse>,
}

/// Terminal payload of a completed operation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateVideosResponse {
    #[serde(default)]
    pub generated_videos: Vec<GeneratedVideo>,
}

/// One generated output.
#[derive(Debug, Clone, Deserialize)]
pub struct GeneratedVideo {
    #[serde(default)]
    pub video: Option<VideoReference>,
}

/// Locator for the generated bytes.
#[derive(Debug, Clone, Deserialize)]
pub struct VideoReference {
    #[serde(default)]
    pub uri: Option<String>,
}

impl Operation {
    /// Download URI of the first generated video, if the job produced one.
    pub fn first_video_uri(&self) -> Option<&str> {
        self.response
            .as_ref()?
            .generated_videos
            .first()?
            .video
            .as_ref()?
            .uri
            .as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pending_operation() {
        let json = r#"{"name": "operations/abc123"}"#;
        let operation: Operation = serde_json::from_str(json).expect("Failed to parse operation");

        assert_eq!(operation.name, "operations/abc123");
        assert!(!operation.done);
        assert!(operation.first_video_uri().is_none());
    }

    #[test]
    fn test_parse_terminal_operation_with_video() {
        let json = r#"{
            "name": "operations/abc123",
            "done": true,
            "response": {
                "generatedVideos": [
                    {"video": {"uri": "https://example.com/files/video1"}}
                ]
            }
        }"#;
        let operation: Operation = serde_json::from_str(json).expect("Failed to parse operation");

        assert!(operation.done);
        assert_eq!(operation.first_video_uri(), Some("https://example.com/files/video1"));
    }

    #[test]
    fn test_terminal_operation_without_video_has_no_uri() {
        let json = r#"{"name": "operations/abc123", "done": true, "response": {"generatedVideos": []}}"#;
        let operation: Operation = serde_json::from_str(json).expect("Failed to parse operation");

        assert!(operation.done);
        assert!(operation.first_video_uri().is_none());
    }

    #[test]
    fn test_request_serializes_camel_case() {
        let request = GenerateVideosRequest {
            instances: vec![GenerationInstance {
                prompt: "a prompt".to_string(),
                image: ImagePayload {
                    bytes_base64_encoded: "QUJD".to_string(),
                    mime_type: "image/jpeg".to_string(),
                },
            }],
            parameters: GenerationParameters { number_of_videos: 1 },
        };

        let json = serde_json::to_value(&request).expect("Failed to serialize request");
        assert_eq!(json["instances"][0]["image"]["bytesBase64Encoded"], "QUJD");
        assert_eq!(json["instances"][0]["image"]["mimeType"], "image/jpeg");
        assert_eq!(json["parameters"]["numberOfVideos"], 1);
    }
}
