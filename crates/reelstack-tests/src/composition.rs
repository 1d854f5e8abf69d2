//! Integration tests for the composition pipeline.
//!
//! Exercises cross-crate interactions between reelstack-core,
//! reelstack-timeline, and reelstack-media.

use reelstack_core::{Dimensions, MediaTime, ReelError, Vec2};
use reelstack_media::{EncodeJob, ExportFormat};
use reelstack_timeline::{
    assemble_instructions, verify_tiling, Clip, Composition, RenderSettings, ResolvedClip,
    TrackBuilder,
};
use std::path::Path;

// ── Helpers ────────────────────────────────────────────────────

fn clip(name: &str, secs: i64, size: Dimensions) -> ResolvedClip {
    ResolvedClip::new(
        &Clip::new(format!("/media/{name}")),
        MediaTime::from_seconds(secs),
        size,
        true,
        true,
    )
}

fn build(clips: &[ResolvedClip]) -> Composition {
    TrackBuilder::default().build(clips).unwrap()
}

// ── Offset law across the stack ────────────────────────────────

#[test]
fn composition_duration_is_exact_sum() {
    let clips = vec![
        clip("intro.mov", 5, Dimensions::new(1920, 1080)),
        clip("body.mov", 30, Dimensions::new(1920, 1080)),
        clip("outro.mov", 10, Dimensions::new(1280, 720)),
    ];
    let composition = build(&clips);
    assert_eq!(composition.duration(), MediaTime::from_seconds(45));
    assert_eq!(composition.audio_track.duration(), composition.duration());
}

#[test]
fn fractional_durations_accumulate_without_drift() {
    // Thirty clips of a third of a second each: exactly ten seconds.
    let clips: Vec<ResolvedClip> = (0..30)
        .map(|i| {
            ResolvedClip::new(
                &Clip::new(format!("/media/{i}.mov")),
                MediaTime::new(1, 3),
                Dimensions::new(1920, 1080),
                true,
                true,
            )
        })
        .collect();
    let composition = build(&clips);
    assert_eq!(composition.duration(), MediaTime::from_seconds(10));

    let instructions = assemble_instructions(&composition).unwrap();
    assert!(verify_tiling(&instructions, MediaTime::from_seconds(10)).is_ok());
}

#[test]
fn instructions_tile_the_full_timeline() {
    let clips = vec![
        clip("a.mov", 3, Dimensions::new(1920, 1080)),
        clip("b.mov", 5, Dimensions::new(1280, 720)),
        clip("c.mov", 2, Dimensions::new(1920, 1080)),
    ];
    let composition = build(&clips);
    let instructions = assemble_instructions(&composition).unwrap();

    let mut cursor = MediaTime::ZERO;
    for instruction in &instructions {
        assert_eq!(instruction.range.start, cursor);
        cursor = instruction.range.end();
    }
    assert_eq!(cursor, composition.duration());
}

// ── Transform against the render canvas ────────────────────────

#[test]
fn landscape_clip_corners_map_onto_the_portrait_canvas() {
    let clips = vec![clip("wide.mov", 4, Dimensions::new(1920, 1080))];
    let instructions = assemble_instructions(&build(&clips)).unwrap();
    let transform = instructions[0].transform;

    let corners = [
        (Vec2::new(0.0, 0.0), Vec2::new(1080.0, 0.0)),
        (Vec2::new(1920.0, 0.0), Vec2::new(1080.0, 1920.0)),
        (Vec2::new(1920.0, 1080.0), Vec2::new(0.0, 1920.0)),
        (Vec2::new(0.0, 1080.0), Vec2::new(0.0, 0.0)),
    ];
    for (source, target) in corners {
        let mapped = transform.transform_point(source);
        assert!(
            (mapped - target).length() < 1e-9,
            "{source:?} mapped to {mapped:?}, expected {target:?}"
        );
    }
}

// ── Atomic failure ─────────────────────────────────────────────

#[test]
fn missing_audio_mid_list_fails_atomically() {
    let mut clips = vec![
        clip("a.mov", 3, Dimensions::new(1920, 1080)),
        clip("b.mov", 5, Dimensions::new(1920, 1080)),
        clip("c.mov", 2, Dimensions::new(1920, 1080)),
    ];
    clips[1].has_audio = false;

    let err = TrackBuilder::default().build(&clips).unwrap_err();
    match err {
        ReelError::MissingTrack { clip, .. } => {
            assert_eq!(clip, Path::new("/media/b.mov"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

// ── Encode planning over a built composition ───────────────────

#[test]
fn encode_plan_spans_the_whole_composition() {
    let clips = vec![
        clip("a.mov", 3, Dimensions::new(1920, 1080)),
        clip("b.mov", 5, Dimensions::new(1280, 720)),
    ];
    let composition = build(&clips);
    let instructions = assemble_instructions(&composition).unwrap();

    let job = EncodeJob::plan(
        &composition,
        &instructions,
        &ExportFormat::reel_mp4(),
        Path::new("/tmp/reel.mp4"),
    )
    .unwrap();

    let args = job.ffmpeg_args();
    assert!(args.contains(&"/media/a.mov".to_string()));
    assert!(args.contains(&"/media/b.mov".to_string()));
    assert!(args.contains(&"8.000".to_string()));
    let filter = &args[args.iter().position(|a| a == "-filter_complex").unwrap() + 1];
    assert!(filter.contains("scale=1080:1920"));
    assert!(filter.contains("concat=n=2"));
}

#[test]
fn custom_render_canvas_flows_into_the_filter_graph() {
    let clips = vec![clip("a.mov", 3, Dimensions::new(1920, 1080))];
    let settings = RenderSettings {
        canvas: Dimensions::new(720, 1280),
        ..Default::default()
    };
    let composition = TrackBuilder::new(settings).build(&clips).unwrap();
    let instructions = assemble_instructions(&composition).unwrap();

    let job = EncodeJob::plan(
        &composition,
        &instructions,
        &ExportFormat::draft_mp4(),
        Path::new("/tmp/reel.mp4"),
    )
    .unwrap();

    let args = job.ffmpeg_args();
    let filter = &args[args.iter().position(|a| a == "-filter_complex").unwrap() + 1];
    assert!(filter.contains("scale=720:1280"));
    assert!(args.contains(&"ultrafast".to_string()));
}
