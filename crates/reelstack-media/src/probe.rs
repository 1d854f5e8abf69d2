//! Media file probing to get metadata without a full decode.
//!
//! Runs `ffprobe` with JSON output and lifts the pieces the composition
//! pipeline needs: duration, stream presence, and the video stream's
//! natural size.

use reelstack_core::{Dimensions, FrameRate, MediaTime, ReelError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// Locate the ffmpeg binary (bundled by ffmpeg-sidecar or on PATH).
pub(crate) fn ffmpeg_binary() -> PathBuf {
    ffmpeg_sidecar::paths::ffmpeg_path()
}

/// ffprobe ships next to ffmpeg.
pub(crate) fn ffprobe_binary() -> PathBuf {
    let name = if cfg!(windows) { "ffprobe.exe" } else { "ffprobe" };
    ffmpeg_binary().with_file_name(name)
}

/// Information about a media file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaProbe {
    /// File path
    pub path: PathBuf,
    /// Container duration
    pub duration: MediaTime,
    /// Video streams
    pub video_streams: Vec<VideoStreamInfo>,
    /// Audio streams
    pub audio_streams: Vec<AudioStreamInfo>,
    /// Container format
    pub format: String,
}

/// Information about a video stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoStreamInfo {
    pub index: usize,
    pub codec: String,
    pub width: u32,
    pub height: u32,
    pub frame_rate: Option<FrameRate>,
}

/// Information about an audio stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioStreamInfo {
    pub index: usize,
    pub codec: String,
    pub sample_rate: Option<u32>,
    pub channels: Option<u16>,
}

impl MediaProbe {
    /// Check if the file has video.
    pub fn has_video(&self) -> bool {
        !self.video_streams.is_empty()
    }

    /// Check if the file has audio.
    pub fn has_audio(&self) -> bool {
        !self.audio_streams.is_empty()
    }

    /// Get the primary video stream info.
    pub fn primary_video(&self) -> Option<&VideoStreamInfo> {
        self.video_streams.first()
    }

    /// Natural size of the primary video stream.
    pub fn natural_size(&self) -> Option<Dimensions> {
        self.primary_video()
            .map(|v| Dimensions::new(v.width, v.height))
    }
}

/// Loads per-clip metadata.
///
/// The session fans probes out concurrently; implementations must be safe
/// to call from blocking worker threads.
pub trait ClipProber: Send + Sync {
    fn probe(&self, path: &Path) -> Result<MediaProbe>;
}

/// Production prober backed by ffprobe.
#[derive(Debug, Default, Clone, Copy)]
pub struct FfprobeProber;

impl ClipProber for FfprobeProber {
    fn probe(&self, path: &Path) -> Result<MediaProbe> {
        if !path.exists() {
            return Err(ReelError::MetadataLoadFailed {
                clip: path.to_path_buf(),
                reason: "file not found".into(),
            });
        }

        debug!(path = %path.display(), "probing media file");

        let output = Command::new(ffprobe_binary())
            .args([
                "-v",
                "error",
                "-print_format",
                "json",
                "-show_streams",
                "-show_format",
            ])
            .arg(path)
            .output()
            .map_err(|e| ReelError::MetadataLoadFailed {
                clip: path.to_path_buf(),
                reason: format!("failed to run ffprobe: {e}"),
            })?;

        if !output.status.success() {
            return Err(ReelError::MetadataLoadFailed {
                clip: path.to_path_buf(),
                reason: format!(
                    "ffprobe failed: {}",
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }

        parse_ffprobe_output(path, &String::from_utf8_lossy(&output.stdout))
    }
}

// ── ffprobe JSON response ───────────────────────────────────────

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    streams: Option<Vec<FfprobeStream>>,
    format: Option<FfprobeFormat>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    index: usize,
    codec_type: String,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    sample_rate: Option<String>,
    channels: Option<u16>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
    format_name: Option<String>,
}

fn parse_ffprobe_output(path: &Path, json: &str) -> Result<MediaProbe> {
    let parsed: FfprobeOutput =
        serde_json::from_str(json).map_err(|e| ReelError::MetadataLoadFailed {
            clip: path.to_path_buf(),
            reason: format!("unparseable ffprobe output: {e}"),
        })?;

    let format = parsed.format.ok_or_else(|| ReelError::MetadataLoadFailed {
        clip: path.to_path_buf(),
        reason: "ffprobe output has no format section".into(),
    })?;

    let duration_secs = format
        .duration
        .as_deref()
        .and_then(|s| s.parse::<f64>().ok())
        .ok_or_else(|| ReelError::MetadataLoadFailed {
            clip: path.to_path_buf(),
            reason: "container reports no duration".into(),
        })?;

    let mut video_streams = Vec::new();
    let mut audio_streams = Vec::new();
    for stream in parsed.streams.unwrap_or_default() {
        match stream.codec_type.as_str() {
            "video" => {
                let (width, height) = match (stream.width, stream.height) {
                    (Some(w), Some(h)) => (w, h),
                    _ => {
                        return Err(ReelError::MetadataLoadFailed {
                            clip: path.to_path_buf(),
                            reason: format!("video stream {} has no dimensions", stream.index),
                        })
                    }
                };
                video_streams.push(VideoStreamInfo {
                    index: stream.index,
                    codec: stream.codec_name.unwrap_or_default(),
                    width,
                    height,
                    frame_rate: stream.r_frame_rate.as_deref().and_then(parse_frame_rate),
                });
            }
            "audio" => {
                audio_streams.push(AudioStreamInfo {
                    index: stream.index,
                    codec: stream.codec_name.unwrap_or_default(),
                    sample_rate: stream.sample_rate.as_deref().and_then(|s| s.parse().ok()),
                    channels: stream.channels,
                });
            }
            _ => {}
        }
    }

    Ok(MediaProbe {
        path: path.to_path_buf(),
        duration: MediaTime::from_seconds_f64(duration_secs),
        video_streams,
        audio_streams,
        format: format.format_name.unwrap_or_default(),
    })
}

/// Parse an ffprobe rate like `"30000/1001"` or `"30"`.
fn parse_frame_rate(s: &str) -> Option<FrameRate> {
    match s.split_once('/') {
        Some((num, den)) => {
            let num: u32 = num.parse().ok()?;
            let den: u32 = den.parse().ok()?;
            if den == 0 {
                return None;
            }
            Some(FrameRate::new(num, den))
        }
        None => Some(FrameRate::new(s.parse().ok()?, 1)),
    }
}
