//! One editing session: clip list, built composition, export.
//!
//! The session is the only owner of its clips, composition, and exporter.
//! Metadata probes fan out concurrently, but results are joined in clip
//! order before the track builder runs — completion order never influences
//! timeline order.

use reelstack_core::{Dimensions, MediaTime, ReelError, Result};
use reelstack_media::{
    CancelHandle, ClipProber, ExportFormat, ExportState, Exporter, FfprobeProber,
};
use reelstack_timeline::{
    assemble_instructions, Clip, Composition, LayerInstruction, RenderSettings, ResolvedClip,
    TrackBuilder,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Session-wide configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Directory holding recorded segments and export outputs
    pub scratch_dir: PathBuf,
    pub render: RenderSettings,
    pub format: ExportFormat,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            scratch_dir: std::env::temp_dir(),
            render: RenderSettings::default(),
            format: ExportFormat::default(),
        }
    }
}

/// A successfully merged composition with its layer instructions — the
/// playable handle handed to preview and export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltComposition {
    pub composition: Composition,
    pub instructions: Vec<LayerInstruction>,
}

impl BuiltComposition {
    pub fn duration(&self) -> MediaTime {
        self.composition.duration()
    }
}

/// Owns one clip list, its merged composition, and the exporter.
///
/// Clip order is capture order and is authoritative. The clip list may only
/// be mutated between export attempts.
pub struct CompositionSession {
    id: Uuid,
    config: SessionConfig,
    prober: Arc<dyn ClipProber>,
    clips: Vec<Clip>,
    built: Option<BuiltComposition>,
    exporter: Exporter,
    /// Per-session export attempt counter; names output files
    export_seq: u64,
}

impl CompositionSession {
    /// New session probing with ffprobe.
    pub fn new(config: SessionConfig) -> Self {
        Self::with_prober(config, Arc::new(FfprobeProber))
    }

    /// New session with a custom metadata loader.
    pub fn with_prober(config: SessionConfig, prober: Arc<dyn ClipProber>) -> Self {
        Self {
            id: Uuid::new_v4(),
            config,
            prober,
            clips: Vec::new(),
            built: None,
            exporter: Exporter::new(),
            export_seq: 0,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn clips(&self) -> &[Clip] {
        &self.clips
    }

    pub fn clip_count(&self) -> usize {
        self.clips.len()
    }

    /// The composition built by the last successful [`build`](Self::build),
    /// if the clip list has not changed since.
    pub fn built(&self) -> Option<&BuiltComposition> {
        self.built.as_ref()
    }

    /// Register a recorded segment at the end of the timeline.
    pub fn add_clip(&mut self, path: impl Into<PathBuf>) -> Result<Uuid> {
        self.guard_not_exporting()?;
        let clip = Clip::new(path);
        let id = clip.id;
        debug!(clip = %clip.locator.display(), "registered clip");
        self.clips.push(clip);
        self.built = None;
        Ok(id)
    }

    /// Undo-last: drop the newest clip and remove its backing file.
    pub fn delete_last_clip(&mut self) -> Result<Option<Clip>> {
        self.guard_not_exporting()?;
        let Some(clip) = self.clips.pop() else {
            return Ok(None);
        };
        remove_segment_file(&clip.locator);
        self.built = None;
        info!(clip = %clip.locator.display(), "deleted last clip");
        Ok(Some(clip))
    }

    /// Drop every clip and remove all backing files.
    pub fn discard(&mut self) -> Result<()> {
        self.guard_not_exporting()?;
        for clip in self.clips.drain(..) {
            remove_segment_file(&clip.locator);
        }
        self.built = None;
        info!(session = %self.id, "session discarded");
        Ok(())
    }

    /// Merge the clip list into a composition.
    ///
    /// Probes every clip concurrently, joins the results positionally, then
    /// runs the sequential track builder and instruction assembler. Any
    /// per-clip failure aborts the whole build; `built()` stays empty.
    pub async fn build(&mut self) -> Result<&BuiltComposition> {
        self.guard_not_exporting()?;
        if self.clips.is_empty() {
            return Err(ReelError::NoInput);
        }

        // Fan out, indexed by clip position.
        let mut handles = Vec::with_capacity(self.clips.len());
        for clip in &self.clips {
            let prober = Arc::clone(&self.prober);
            let path = clip.locator.clone();
            handles.push(tokio::task::spawn_blocking(move || prober.probe(&path)));
        }

        // Join in clip order, not completion order.
        let mut resolved = Vec::with_capacity(self.clips.len());
        for (clip, handle) in self.clips.iter_mut().zip(handles) {
            let probe = handle
                .await
                .map_err(|e| ReelError::Internal(format!("probe task failed: {e}")))??;
            clip.duration = Some(probe.duration);
            clip.natural_size = probe.natural_size();
            resolved.push(ResolvedClip::new(
                clip,
                probe.duration,
                probe.natural_size().unwrap_or(Dimensions::new(0, 0)),
                probe.has_video(),
                probe.has_audio(),
            ));
        }

        let composition = TrackBuilder::new(self.config.render).build(&resolved)?;
        let instructions = assemble_instructions(&composition)?;
        info!(
            clips = composition.clip_count(),
            duration = %composition.duration(),
            "composition built"
        );

        Ok(self.built.insert(BuiltComposition {
            composition,
            instructions,
        }))
    }

    /// Export the built composition to a fresh output file in the scratch
    /// directory. Builds first if the clip list changed since the last
    /// build.
    pub async fn export(&mut self) -> Result<PathBuf> {
        if self.built.is_none() {
            self.build().await?;
        }
        let built = self
            .built
            .as_ref()
            .ok_or_else(|| ReelError::Internal("no composition after build".into()))?;

        std::fs::create_dir_all(&self.config.scratch_dir)?;
        self.export_seq += 1;
        let output = self
            .config
            .scratch_dir
            .join(format!("{}-{}.mp4", self.id, self.export_seq));

        self.exporter
            .export(
                &built.composition,
                &built.instructions,
                &self.config.format,
                &output,
            )
            .await
    }

    /// Build and export in one call.
    pub async fn merge_and_export(&mut self) -> Result<PathBuf> {
        self.build().await?;
        self.export().await
    }

    /// Observable export progress in [0, 1].
    pub fn progress(&self) -> watch::Receiver<f32> {
        self.exporter.progress()
    }

    /// State of the active or most recent export.
    pub fn export_state(&self) -> ExportState {
        self.exporter.state()
    }

    /// Request cancellation of the active export.
    pub fn cancel_export(&self) {
        self.exporter.cancel();
    }

    /// Handle that can cancel the active export from another task.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.exporter.cancel_handle()
    }

    fn guard_not_exporting(&self) -> Result<()> {
        if self.exporter.state().is_active() {
            return Err(ReelError::ExportInProgress);
        }
        Ok(())
    }
}

/// Best-effort removal of a segment's backing file. A missing file is fine;
/// anything else is logged and the timeline mutation proceeds.
fn remove_segment_file(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), "failed to remove segment file: {e}"),
    }
}
