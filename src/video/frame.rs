use crate::video::VideoProcessor;
use std::path::{Path, PathBuf};

/// Frames are sampled from the middle of the clip by default.
pub const DEFAULT_SEEK_FRACTION: f64 = 0.5;

const JPEG_QUALITY: u8 = 90;

/// A single still frame taken from a video, ready for submission.
#[derive(Debug, Clone)]
pub struct ExtractedFrame {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

/// Why the decoder rejected a video, in terms a user can act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeReason {
    Aborted,
    Network,
    Corrupt,
    Unsupported,
    Unknown,
}

impl DecodeReason {
    /// Map the decoder's stderr output onto a reportable reason.
    pub fn classify(stderr: &str) -> Self {
        let lower = stderr.to_lowercase();
        if lower.contains("exiting normally, received signal") || lower.contains("immediate exit requested") {
            DecodeReason::Aborted
        } else if lower.contains("connection") || lower.contains("network") || lower.contains("input/output error") {
            DecodeReason::Network
        } else if lower.contains("invalid data found") || lower.contains("moov atom not found") || lower.contains("corrupt") {
            DecodeReason::Corrupt
        } else if lower.contains("decoder not found")
            || lower.contains("unknown format")
            || lower.contains("codec not currently supported")
        {
            DecodeReason::Unsupported
        } else {
            DecodeReason::Unknown
        }
    }
}

impl std::fmt::Display for DecodeReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let message = match self {
            DecodeReason::Aborted => "Video decoding was aborted.",
            DecodeReason::Network => "A read error interrupted the video decode.",
            DecodeReason::Corrupt => {
                "The video could not be decoded, possibly due to corruption or an unsupported format."
            }
            DecodeReason::Unsupported => "The video format is not supported.",
            DecodeReason::Unknown => "An unknown error occurred while processing the video.",
        };
        write!(f, "{}", message)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("Video has no duration. It may be corrupt or an unsupported format.")]
    InvalidMedia,

    #[error("{0}")]
    Decode(DecodeReason),

    #[error("Failed to encode the extracted frame: {0}")]
    Encode(#[from] image::ImageError),

    #[error("Failed to read the extracted frame: {0}")]
    Io(#[from] std::io::Error),
}

/// Temporary file backing one frame grab. The file is deleted exactly
/// once, either through `release` or when the guard is dropped.
pub struct ScratchFrame {
    path: PathBuf,
    released: bool,
}

impl ScratchFrame {
    pub fn create() -> std::io::Result<Self> {
        let dir = std::env::temp_dir().join("vr180-converter").join("frames");
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            path: dir.join(format!("{}.png", uuid::Uuid::new_v4())),
            released: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the backing file. Returns whether this call actually
    /// performed the release; further calls are no-ops.
    pub fn release(&mut self) -> bool {
        if self.released {
            return false;
        }
        self.released = true;
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                log::warn!("Failed to remove scratch frame {}: {}", self.path.display(), e);
            }
        }
        true
    }
}

impl Drop for ScratchFrame {
    fn drop(&mut self) {
        self.release();
    }
}

/// The seek-and-rasterize step, separated out so the extraction flow can
/// be exercised without spawning ffmpeg.
pub trait FrameGrabber {
    /// Grab the frame at `timestamp` and return it as encoded JPEG bytes.
    fn grab(&mut self, path: &Path, timestamp: f64) -> Result<Vec<u8>, FrameError>;
}

/// Production grabber: ffmpeg writes the frame to a scratch PNG, which is
/// then re-encoded as JPEG at the configured quality.
pub struct FfmpegGrabber;

impl FrameGrabber for FfmpegGrabber {
    fn grab(&mut self, path: &Path, timestamp: f64) -> Result<Vec<u8>, FrameError> {
        let mut scratch = ScratchFrame::create()?;

        // The guard cleans the scratch file up on every exit path below.
        VideoProcessor::grab_frame(path, timestamp, scratch.path())
            .map_err(|e| FrameError::Decode(DecodeReason::classify(&e.to_string())))?;

        let frame = image::open(scratch.path())?.to_rgb8();

        let mut jpeg = Vec::new();
        let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut jpeg, JPEG_QUALITY);
        encoder.encode_image(&frame)?;

        scratch.release();
        Ok(jpeg)
    }
}

/// Where in the clip to sample, clamped to the clip's duration.
pub fn seek_target(duration: f64, seek_fraction: f64) -> f64 {
    (duration * seek_fraction).clamp(0.0, duration)
}

/// Extract a still frame from `path` at the given fraction of its
/// duration. Each call probes the file and creates fresh scratch state.
pub fn extract_frame(path: &Path, seek_fraction: f64) -> Result<ExtractedFrame, FrameError> {
    let info = VideoProcessor::probe(path)
        .map_err(|e| FrameError::Decode(DecodeReason::classify(&e.to_string())))?;

    extract_with(path, info.duration, seek_fraction, &mut FfmpegGrabber)
}

fn extract_with(
    path: &Path,
    duration: f64,
    seek_fraction: f64,
    grabber: &mut dyn FrameGrabber,
) -> Result<ExtractedFrame, FrameError> {
    // Zero or unknown duration means there is nothing to seek into.
    if !(duration > 0.0) {
        return Err(FrameError::InvalidMedia);
    }

    let timestamp = seek_target(duration, seek_fraction);
    log::debug!("Extracting frame from {} at {:.3}s", path.display(), timestamp);

    let bytes = grabber.grab(path, timestamp)?;
    Ok(ExtractedFrame {
        bytes,
        mime_type: "image/jpeg".to_string(),
    })
}
