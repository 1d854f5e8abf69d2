//! Export pipeline for rendering compositions to MP4 files.
//!
//! Renders a merged composition per its layer instructions and muxes it
//! into a single output file via an ffmpeg subprocess. Supports progress
//! reporting over a watch channel and cooperative cancellation.

use parking_lot::Mutex;
use reelstack_core::{ExportStage, MediaTime, ReelError, Result};
use reelstack_timeline::{verify_tiling, Composition, LayerInstruction};
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::format::ExportFormat;
use crate::probe::ffmpeg_binary;

// ── Cancellation ─────────────────────────────────────────────────

/// Handle for cancelling an in-progress export.
///
/// Cancellation is cooperative: the export loop observes the flag at its
/// next progress checkpoint, kills the encoder, and removes the partial
/// output.
#[derive(Debug, Clone)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    /// Signal cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Check if cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// Re-arm the handle for a fresh job.
    fn reset(&self) {
        self.0.store(false, Ordering::Relaxed);
    }
}

impl Default for CancelHandle {
    fn default() -> Self {
        Self::new()
    }
}

// ── Progress ─────────────────────────────────────────────────────

/// Clamps raw progress readings into a monotonically non-decreasing value
/// in [0, 1]. Encoder timestamps can jitter backwards; observers must
/// never see a regression.
#[derive(Debug, Default)]
pub struct ProgressTracker {
    last: f32,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold in a raw reading, returning the value observers may see.
    pub fn update(&mut self, raw: f32) -> f32 {
        let clamped = raw.clamp(0.0, 1.0);
        if clamped > self.last {
            self.last = clamped;
        }
        self.last
    }

    pub fn fraction(&self) -> f32 {
        self.last
    }
}

// ── Export state machine ─────────────────────────────────────────

/// Observable state of an export job.
#[derive(Debug, Clone, PartialEq)]
pub enum ExportState {
    Idle,
    Preparing,
    Exporting { progress: f32 },
    Completed { output: PathBuf },
    Failed { stage: ExportStage, reason: String },
    Cancelled,
}

impl ExportState {
    /// A job is underway; starting another is rejected.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Preparing | Self::Exporting { .. })
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Completed { .. } | Self::Failed { .. } | Self::Cancelled
        )
    }
}

// ── Encode job ───────────────────────────────────────────────────

/// A planned ffmpeg invocation: inputs, filter graph, and output settings,
/// derived from a composition and its layer instructions.
#[derive(Debug, Clone)]
pub struct EncodeJob {
    inputs: Vec<PathBuf>,
    filter: String,
    with_audio: bool,
    total_duration: MediaTime,
    format: ExportFormat,
    output_path: PathBuf,
}

impl EncodeJob {
    /// Validate the composition and derive the encode plan.
    ///
    /// Fails without side effects when the composition is empty or the
    /// instructions do not tile its duration.
    pub fn plan(
        composition: &Composition,
        instructions: &[LayerInstruction],
        format: &ExportFormat,
        output_path: &Path,
    ) -> Result<Self> {
        if composition.is_empty() {
            return Err(ReelError::NoInput);
        }
        if instructions.len() != composition.clip_count() {
            return Err(ReelError::Internal(format!(
                "{} instructions for {} clips",
                instructions.len(),
                composition.clip_count()
            )));
        }
        verify_tiling(instructions, composition.duration())?;

        let inputs: Vec<PathBuf> = composition
            .clips
            .iter()
            .map(|c| c.locator.clone())
            .collect();
        let with_audio = composition.clips.iter().all(|c| c.has_audio);

        Ok(Self {
            filter: build_filter_graph(composition, with_audio),
            inputs,
            with_audio,
            total_duration: composition.duration(),
            format: format.clone(),
            output_path: output_path.to_path_buf(),
        })
    }

    /// Build the ffmpeg command arguments.
    pub fn ffmpeg_args(&self) -> Vec<String> {
        let mut args: Vec<String> = vec!["-y".into()];

        for input in &self.inputs {
            args.push("-i".into());
            args.push(input.to_string_lossy().into_owned());
        }

        args.push("-filter_complex".into());
        args.push(self.filter.clone());
        args.push("-map".into());
        args.push("[outv]".into());
        if self.with_audio {
            args.push("-map".into());
            args.push("[outa]".into());
        }

        args.extend_from_slice(&[
            "-c:v".into(),
            self.format.video_codec.ffmpeg_encoder().into(),
            "-preset".into(),
            self.format.speed_preset.clone(),
            "-crf".into(),
            self.format.crf.to_string(),
            "-pix_fmt".into(),
            "yuv420p".into(),
        ]);

        if self.with_audio {
            args.extend_from_slice(&[
                "-c:a".into(),
                self.format.audio_codec.ffmpeg_encoder().into(),
                "-b:a".into(),
                format!("{}k", self.format.audio_bitrate),
                "-ar".into(),
                self.format.audio_sample_rate.to_string(),
            ]);
        }

        if self.format.faststart {
            args.extend_from_slice(&["-movflags".into(), "+faststart".into()]);
        }

        args.extend_from_slice(&[
            "-t".into(),
            format!("{:.3}", self.total_duration.as_seconds_f64()),
            "-progress".into(),
            "pipe:1".into(),
            "-nostats".into(),
            "-loglevel".into(),
            "error".into(),
        ]);

        args.push(self.output_path.to_string_lossy().into_owned());
        args
    }

    /// Run the encode, blocking the calling thread until a terminal result.
    ///
    /// * `on_progress` – called with monotone values in [0, 1].
    /// * `cancel` – checked at every progress checkpoint; on observation the
    ///   encoder is killed and the partial output removed.
    pub fn run(&self, on_progress: impl Fn(f32), cancel: &CancelHandle) -> Result<()> {
        let args = self.ffmpeg_args();
        debug!(output = %self.output_path.display(), "spawning ffmpeg");

        let mut child = Command::new(ffmpeg_binary())
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                ReelError::ExportSetupFailed(format!("failed to spawn ffmpeg: {e}"))
            })?;

        let stdout = child.stdout.take().ok_or_else(|| {
            ReelError::ExportSetupFailed("failed to open ffmpeg stdout".into())
        })?;

        let total_secs = self.total_duration.as_seconds_f64();
        let mut tracker = ProgressTracker::new();

        for line in BufReader::new(stdout).lines() {
            if cancel.is_cancelled() {
                info!("export cancelled, killing encoder");
                let _ = child.kill();
                let _ = child.wait();
                remove_partial(&self.output_path);
                return Err(ReelError::Cancelled);
            }

            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    let _ = child.kill();
                    let _ = child.wait();
                    remove_partial(&self.output_path);
                    return Err(ReelError::ExportFailed {
                        stage: ExportStage::Render,
                        clip: None,
                        reason: format!("lost ffmpeg progress stream: {e}"),
                    });
                }
            };

            // ffmpeg reports both out_time_us and out_time_ms in microseconds.
            if let Some(value) = line
                .strip_prefix("out_time_us=")
                .or_else(|| line.strip_prefix("out_time_ms="))
            {
                if let Ok(us) = value.trim().parse::<i64>() {
                    let secs = us as f64 / 1_000_000.0;
                    on_progress(tracker.update((secs / total_secs) as f32));
                }
            }
        }

        let mut stderr_tail = String::new();
        if let Some(mut stderr) = child.stderr.take() {
            let _ = stderr.read_to_string(&mut stderr_tail);
        }

        let status = child.wait().map_err(|e| ReelError::ExportFailed {
            stage: ExportStage::Render,
            clip: None,
            reason: format!("failed to wait for ffmpeg: {e}"),
        })?;

        if !status.success() {
            remove_partial(&self.output_path);
            return Err(ReelError::ExportFailed {
                stage: ExportStage::Render,
                clip: None,
                reason: format!(
                    "ffmpeg exited with {status}: {}",
                    stderr_tail.trim()
                ),
            });
        }

        if !self.output_path.exists() {
            return Err(ReelError::ExportFailed {
                stage: ExportStage::Mux,
                clip: None,
                reason: "encoder reported success but produced no output".into(),
            });
        }

        on_progress(tracker.update(1.0));
        Ok(())
    }
}

/// Per-input normalization chains plus the ordered concat.
///
/// The layer instructions' transform is a quarter turn plus scale-to-fill;
/// `transpose=1` followed by an exact `scale` expresses the same mapping on
/// decoded frames.
fn build_filter_graph(composition: &Composition, with_audio: bool) -> String {
    let canvas = composition.settings.canvas;
    let fps = composition.settings.frame_rate;
    let n = composition.clip_count();

    let mut chains: Vec<String> = (0..n)
        .map(|i| {
            format!(
                "[{i}:v]transpose=1,scale={}:{},setsar=1,fps={}/{}[v{i}]",
                canvas.width, canvas.height, fps.numerator, fps.denominator
            )
        })
        .collect();

    let mut concat_inputs = String::new();
    for i in 0..n {
        concat_inputs.push_str(&format!("[v{i}]"));
        if with_audio {
            concat_inputs.push_str(&format!("[{i}:a]"));
        }
    }
    let a = if with_audio { 1 } else { 0 };
    let outa = if with_audio { "[outa]" } else { "" };
    chains.push(format!(
        "{concat_inputs}concat=n={n}:v=1:a={a}[outv]{outa}"
    ));

    chains.join(";")
}

fn remove_partial(path: &Path) {
    if path.exists() {
        if let Err(e) = std::fs::remove_file(path) {
            warn!(path = %path.display(), "failed to remove partial output: {e}");
        }
    }
}

// ── Exporter ─────────────────────────────────────────────────────

/// Drives the asynchronous render-and-mux operation.
///
/// Processes at most one job at a time; a start request while a job is
/// active is rejected rather than queued. Progress is observable on a
/// watch channel, cancellation through [`CancelHandle`].
pub struct Exporter {
    state: Arc<Mutex<ExportState>>,
    progress: Arc<watch::Sender<f32>>,
    cancel: CancelHandle,
}

impl Exporter {
    pub fn new() -> Self {
        let (progress, _) = watch::channel(0.0);
        Self {
            state: Arc::new(Mutex::new(ExportState::Idle)),
            progress: Arc::new(progress),
            cancel: CancelHandle::new(),
        }
    }

    /// Current state of the active or most recent job.
    pub fn state(&self) -> ExportState {
        self.state.lock().clone()
    }

    /// Subscribe to progress values in [0, 1].
    pub fn progress(&self) -> watch::Receiver<f32> {
        self.progress.subscribe()
    }

    /// Handle that cancels the active job.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Request cancellation of the active job.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Export the composition to `output_path`.
    ///
    /// Validates, deletes any pre-existing file at the output location,
    /// then runs the encoder on a blocking worker. The returned path is
    /// only produced after the file is fully written and closed.
    pub async fn export(
        &self,
        composition: &Composition,
        instructions: &[LayerInstruction],
        format: &ExportFormat,
        output_path: &Path,
    ) -> Result<PathBuf> {
        {
            let mut state = self.state.lock();
            if state.is_active() {
                return Err(ReelError::ExportInProgress);
            }
            *state = ExportState::Preparing;
        }
        self.cancel.reset();
        self.progress.send_replace(0.0);

        let job = match self.prepare(composition, instructions, format, output_path) {
            Ok(job) => job,
            Err(e) => {
                *self.state.lock() = ExportState::Failed {
                    stage: ExportStage::Prepare,
                    reason: e.to_string(),
                };
                return Err(e);
            }
        };

        info!(
            clips = composition.clip_count(),
            duration = %composition.duration(),
            output = %output_path.display(),
            "starting export"
        );
        *self.state.lock() = ExportState::Exporting { progress: 0.0 };

        let state = Arc::clone(&self.state);
        let progress = Arc::clone(&self.progress);
        let cancel = self.cancel.clone();
        let result = tokio::task::spawn_blocking(move || {
            let on_progress = |value: f32| {
                progress.send_replace(value);
                if let ExportState::Exporting { progress: p } = &mut *state.lock() {
                    *p = value;
                }
            };
            job.run(on_progress, &cancel)
        })
        .await
        .unwrap_or_else(|e| Err(ReelError::Internal(format!("export task failed: {e}"))));

        let output = output_path.to_path_buf();
        *self.state.lock() = match &result {
            Ok(()) => ExportState::Completed {
                output: output.clone(),
            },
            Err(ReelError::Cancelled) => ExportState::Cancelled,
            Err(ReelError::ExportFailed { stage, reason, .. }) => ExportState::Failed {
                stage: *stage,
                reason: reason.clone(),
            },
            Err(e) => ExportState::Failed {
                stage: ExportStage::Prepare,
                reason: e.to_string(),
            },
        };

        result.map(|()| {
            info!(output = %output.display(), "export complete");
            output
        })
    }

    fn prepare(
        &self,
        composition: &Composition,
        instructions: &[LayerInstruction],
        format: &ExportFormat,
        output_path: &Path,
    ) -> Result<EncodeJob> {
        let job = EncodeJob::plan(composition, instructions, format, output_path)?;
        // The output location belongs to this job alone; stale files from
        // earlier attempts are cleared before encoding begins.
        if output_path.exists() {
            std::fs::remove_file(output_path).map_err(|e| {
                ReelError::ExportSetupFailed(format!(
                    "cannot clear existing output {}: {e}",
                    output_path.display()
                ))
            })?;
        }
        Ok(job)
    }
}

impl Default for Exporter {
    fn default() -> Self {
        Self::new()
    }
}
