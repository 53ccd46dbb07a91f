//! Pragmatic frame capture via external capture tools:
//! - libcamera-jpeg: `libcamera-still -n -t 1 --width ... --height ... -o -`
//!   returns a JPEG frame on stdout (simple, robust on Pi)
//! - v4l2-mjpeg: one MJPEG frame grabbed through `ffmpeg` (keeps Rust
//!   dependencies small)

use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

use crate::Frame;

#[derive(Debug, Clone, serde::Deserialize)]
pub struct CameraConfig {
    pub mode: String,   // "libcamera-jpeg" | "v4l2-mjpeg"
    pub device: String, // /dev/video0 (v4l2)
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

/// Capture device failures are fatal to a streaming run; the subprocess
/// model means there is nothing to release on the way out.
#[derive(Debug, Error)]
pub enum CameraError {
    #[error("unknown camera.mode: {0}")]
    UnknownMode(String),
    #[error("failed to run capture tool: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("capture tool exited with failure: {0}")]
    CaptureFailed(String),
    #[error("could not decode captured frame: {0}")]
    Decode(#[from] image::ImageError),
}

pub async fn capture_frame(cfg: &CameraConfig) -> Result<Frame, CameraError> {
    let jpeg = match cfg.mode.as_str() {
        "libcamera-jpeg" => capture_libcamera(cfg).await?,
        "v4l2-mjpeg" => capture_v4l2_ffmpeg(cfg).await?,
        other => return Err(CameraError::UnknownMode(other.to_string())),
    };
    let frame = image::load_from_memory(&jpeg)?.to_rgb8();
    Ok(frame)
}

async fn capture_libcamera(cfg: &CameraConfig) -> Result<Vec<u8>, CameraError> {
    let mut cmd = Command::new("libcamera-still");
    cmd.args([
        "-n",                 // no preview
        "-t", "1",            // 1ms
        "--width", &cfg.width.to_string(),
        "--height", &cfg.height.to_string(),
        "-o", "-",            // stdout
    ]);

    debug!("capture: libcamera-still");
    let out = cmd.output().await?;
    if !out.status.success() {
        return Err(CameraError::CaptureFailed("libcamera-still".into()));
    }
    Ok(out.stdout)
}

async fn capture_v4l2_ffmpeg(cfg: &CameraConfig) -> Result<Vec<u8>, CameraError> {
    let mut cmd = Command::new("ffmpeg");
    cmd.args([
        "-hide_banner", "-loglevel", "error",
        "-f", "video4linux2",
        "-input_format", "mjpeg",
        "-video_size", &format!("{}x{}", cfg.width, cfg.height),
        "-framerate", &cfg.fps.to_string(),
        "-i", &cfg.device,
        "-vframes", "1",
        "-f", "image2pipe",
        "-vcodec", "mjpeg",
        "-",
    ]);

    debug!("capture: ffmpeg v4l2");
    let out = cmd.output().await?;
    if !out.status.success() {
        return Err(CameraError::CaptureFailed("ffmpeg".into()));
    }
    Ok(out.stdout)
}
