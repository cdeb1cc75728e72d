use std::path::Path;
use std::process::Command;

pub struct VideoProcessor;

#[derive(Debug, Clone)]
pub struct VideoInfo {
    pub duration: f64,
    pub width: u32,
    pub height: u32,
}

impl VideoProcessor {
    /// Probe a video file with ffprobe. Returns its duration and the
    /// dimensions of the first video stream. The error message carries
    /// ffprobe's stderr so callers can classify the failure.
    pub fn probe(file_path: &Path) -> anyhow::Result<VideoInfo> {
        let output = Command::new("ffprobe")
            .arg("-v").arg("error")
            .arg("-print_format").arg("json")
            .arg("-show_format")
            .arg("-show_streams")
            .arg(file_path)
            .output()?;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow::anyhow!("{}", error.trim()));
        }

        let json_str = String::from_utf8(output.stdout)?;
        let info: serde_json::Value = serde_json::from_str(&json_str)?;

        let duration = info["format"]["duration"]
            .as_str()
            .and_then(|s| s.parse::<f64>().ok())
            .unwrap_or(0.0);

        let empty_vec = vec![];
        let streams = info["streams"].as_array().unwrap_or(&empty_vec);
        let mut width = 0;
        let mut height = 0;

        for stream in streams.iter() {
            if stream["codec_type"].as_str() == Some("video") {
                width = stream["width"].as_u64().unwrap_or(0) as u32;
                height = stream["height"].as_u64().unwrap_or(0) as u32;
                break;
            }
        }

        Ok(VideoInfo {
            duration,
            width,
            height,
        })
    }

    /// Rasterize the frame at `timestamp` into `output_path` at the
    /// video's native dimensions. The error message carries ffmpeg's
    /// stderr so callers can classify the failure.
    pub fn grab_frame(file_path: &Path, timestamp: f64, output_path: &Path) -> anyhow::Result<()> {
        let output = Command::new("ffmpeg")
            .arg("-i").arg(file_path)
            .arg("-ss").arg(format!("{:.3}", timestamp))
            .arg("-vframes").arg("1")
            .arg("-f").arg("image2")
            .arg("-y")
            .arg(output_path)
            .output()?;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow::anyhow!("{}", error.trim()));
        }

        Ok(())
    }
}
