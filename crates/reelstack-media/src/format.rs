//! Output format configuration for exports.

use serde::{Deserialize, Serialize};

/// Video codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VideoCodec {
    H264,
    H265,
}

impl VideoCodec {
    /// FFmpeg encoder name.
    pub fn ffmpeg_encoder(self) -> &'static str {
        match self {
            Self::H264 => "libx264",
            Self::H265 => "libx265",
        }
    }
}

/// Audio codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AudioCodec {
    Aac,
}

impl AudioCodec {
    /// FFmpeg encoder name.
    pub fn ffmpeg_encoder(self) -> &'static str {
        match self {
            Self::Aac => "aac",
        }
    }
}

/// Export format configuration. The container is always MP4.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportFormat {
    pub video_codec: VideoCodec,
    pub audio_codec: AudioCodec,
    /// CRF value (0-51, lower = better).
    pub crf: u32,
    /// x264/x265 speed preset.
    pub speed_preset: String,
    /// Audio bitrate in kbps.
    pub audio_bitrate: u32,
    /// Audio sample rate.
    pub audio_sample_rate: u32,
    /// Relocate the moov atom for network playback.
    pub faststart: bool,
}

impl ExportFormat {
    /// Default reel output: H.264 + AAC, tuned for network playback.
    pub fn reel_mp4() -> Self {
        Self {
            video_codec: VideoCodec::H264,
            audio_codec: AudioCodec::Aac,
            crf: 18,
            speed_preset: "medium".into(),
            audio_bitrate: 192,
            audio_sample_rate: 48000,
            faststart: true,
        }
    }

    /// Fast low-quality encode for previews.
    pub fn draft_mp4() -> Self {
        Self {
            crf: 30,
            speed_preset: "ultrafast".into(),
            ..Self::reel_mp4()
        }
    }

    /// File extension for the container.
    pub fn extension(&self) -> &'static str {
        "mp4"
    }
}

impl Default for ExportFormat {
    fn default() -> Self {
        Self::reel_mp4()
    }
}
