//! Integration tests for the composition session.
//!
//! Uses a hermetic prober so the full session flow (register, probe
//! fan-out, merge, undo-last) runs without ffmpeg installed.

use reelstack_core::{MediaTime, ReelError, Result};
use reelstack_media::{
    AudioStreamInfo, ClipProber, ExportState, MediaProbe, VideoStreamInfo,
};
use reelstack_session::{CompositionSession, SessionConfig};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Serves fixed metadata: every known clip is 1920x1080 with audio.
struct FixtureProber {
    durations: Vec<(PathBuf, f64)>,
}

impl FixtureProber {
    fn new(durations: &[(&str, f64)]) -> Self {
        Self {
            durations: durations
                .iter()
                .map(|(p, d)| (PathBuf::from(p), *d))
                .collect(),
        }
    }
}

impl ClipProber for FixtureProber {
    fn probe(&self, path: &Path) -> Result<MediaProbe> {
        let (_, secs) = self
            .durations
            .iter()
            .find(|(p, _)| p == path)
            .ok_or_else(|| ReelError::MetadataLoadFailed {
                clip: path.to_path_buf(),
                reason: "unknown fixture".into(),
            })?;
        Ok(MediaProbe {
            path: path.to_path_buf(),
            duration: MediaTime::from_seconds_f64(*secs),
            video_streams: vec![VideoStreamInfo {
                index: 0,
                codec: "h264".into(),
                width: 1920,
                height: 1080,
                frame_rate: None,
            }],
            audio_streams: vec![AudioStreamInfo {
                index: 1,
                codec: "aac".into(),
                sample_rate: Some(48000),
                channels: Some(2),
            }],
            format: "mov".into(),
        })
    }
}

fn fixture_session(durations: &[(&str, f64)]) -> CompositionSession {
    let mut session = CompositionSession::with_prober(
        SessionConfig::default(),
        Arc::new(FixtureProber::new(durations)),
    );
    for (path, _) in durations {
        session.add_clip(*path).unwrap();
    }
    session
}

#[tokio::test]
async fn session_builds_a_playable_handle() {
    let mut session = fixture_session(&[("/rec/a.mov", 3.0), ("/rec/b.mov", 5.0)]);

    let built = session.build().await.unwrap();
    assert_eq!(built.duration(), MediaTime::from_seconds(8));
    assert_eq!(built.composition.clip_count(), 2);
    assert_eq!(built.instructions.len(), 2);
}

#[tokio::test]
async fn undo_last_then_rebuild_shrinks_by_that_clip() {
    let mut session = fixture_session(&[
        ("/rec/a.mov", 3.0),
        ("/rec/b.mov", 5.0),
        ("/rec/c.mov", 2.0),
    ]);
    session.build().await.unwrap();

    session.delete_last_clip().unwrap();
    let built = session.build().await.unwrap();

    assert_eq!(built.duration(), MediaTime::from_seconds(8));
    let mut cursor = MediaTime::ZERO;
    for instruction in &built.instructions {
        assert_eq!(instruction.range.start, cursor);
        cursor = instruction.range.end();
    }
    assert_eq!(cursor, MediaTime::from_seconds(8));
}

#[tokio::test]
async fn fresh_session_is_idle_with_zero_progress() {
    let session = fixture_session(&[]);
    assert_eq!(session.export_state(), ExportState::Idle);
    assert_eq!(*session.progress().borrow(), 0.0);
}

#[tokio::test]
async fn export_of_empty_session_fails_cleanly() {
    let mut session = fixture_session(&[]);
    let err = session.export().await.unwrap_err();
    assert!(matches!(err, ReelError::NoInput));
    assert_eq!(session.export_state(), ExportState::Idle);
}
