//! End-to-end export tests against a real ffmpeg binary.
//!
//! Inputs are generated with ffmpeg's lavfi sources. Ignored by default;
//! run with `cargo test -- --ignored` on a machine with ffmpeg and ffprobe
//! on PATH.

use reelstack_core::ReelError;
use reelstack_media::{ClipProber, ExportFormat, ExportState, FfprobeProber};
use reelstack_session::{CompositionSession, SessionConfig};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("reelstack=debug")
        .try_init();
}

/// Render a test clip: color bars plus a sine tone.
fn generate_clip(dir: &Path, name: &str, secs: f64) -> PathBuf {
    let path = dir.join(name);
    let status = Command::new("ffmpeg")
        .args([
            "-y",
            "-f",
            "lavfi",
            "-i",
            &format!("testsrc=duration={secs}:size=1920x1080:rate=30"),
            "-f",
            "lavfi",
            "-i",
            &format!("sine=frequency=440:duration={secs}"),
            "-c:v",
            "libx264",
            "-preset",
            "ultrafast",
            "-pix_fmt",
            "yuv420p",
            "-c:a",
            "aac",
            "-shortest",
        ])
        .arg(&path)
        .status()
        .expect("ffmpeg must be runnable for e2e tests");
    assert!(status.success(), "clip generation failed for {name}");
    path
}

#[tokio::test]
#[ignore = "requires ffmpeg and ffprobe on PATH"]
async fn completed_export_has_expected_duration() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let a = generate_clip(dir.path(), "a.mov", 3.0);
    let b = generate_clip(dir.path(), "b.mov", 5.0);

    let mut session = CompositionSession::new(SessionConfig {
        scratch_dir: dir.path().join("out"),
        format: ExportFormat::draft_mp4(),
        ..Default::default()
    });
    session.add_clip(&a).unwrap();
    session.add_clip(&b).unwrap();

    let progress = session.progress();
    let output = session.merge_and_export().await.unwrap();

    assert!(output.exists());
    assert!(matches!(
        session.export_state(),
        ExportState::Completed { .. }
    ));
    assert_eq!(*progress.borrow(), 1.0);

    // 3s + 5s of input, with encoder rounding tolerance.
    let probe = FfprobeProber.probe(&output).unwrap();
    let secs = probe.duration.as_seconds_f64();
    assert!((secs - 8.0).abs() < 0.5, "output duration was {secs}");
    assert!(probe.has_video() && probe.has_audio());
    assert_eq!(
        probe.natural_size(),
        Some(reelstack_core::Dimensions::new(1080, 1920))
    );
}

#[tokio::test]
#[ignore = "requires ffmpeg on PATH"]
async fn cancelled_export_leaves_no_file() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let a = generate_clip(dir.path(), "long-a.mov", 10.0);
    let b = generate_clip(dir.path(), "long-b.mov", 10.0);
    let scratch = dir.path().join("out");

    // Default (non-draft) format keeps the encoder busy long enough to
    // observe the cancellation.
    let mut session = CompositionSession::new(SessionConfig {
        scratch_dir: scratch.clone(),
        ..Default::default()
    });
    session.add_clip(&a).unwrap();
    session.add_clip(&b).unwrap();
    session.build().await.unwrap();

    let cancel = session.cancel_handle();
    let task = tokio::spawn(async move {
        let result = session.export().await;
        (result, session)
    });

    tokio::time::sleep(Duration::from_millis(700)).await;
    cancel.cancel();
    let (result, session) = task.await.unwrap();

    assert!(matches!(result, Err(ReelError::Cancelled)));
    assert_eq!(session.export_state(), ExportState::Cancelled);

    let leftovers: Vec<PathBuf> = std::fs::read_dir(&scratch)
        .map(|rd| rd.filter_map(|e| e.ok()).map(|e| e.path()).collect())
        .unwrap_or_default();
    assert!(leftovers.is_empty(), "partial output left: {leftovers:?}");
}
