use std::sync::Arc;

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{
    composition::plan::{RenderPlan, RenderPlanStep, StepKind, TransitionPlanner},
    config::Config,
    encode::{EncodeOptions, FrameEncoder, GifEncoder},
    error::{ForgeError, Result, ValidationError},
    frame::{CanonicalBuffer, ImageNormalizer, NormalizedImage, RenderedFrame, TransparencyReducer},
    project::{Effect, Project},
    quota::{QuotaGuard, RenderMode},
    store::FrameStore,
    transitions,
};

/// Result of one render call
#[derive(Debug, Clone)]
pub struct RenderOutput {
    /// Rendered frames in plan order
    pub frames: Vec<RenderedFrame>,

    /// The encoded animation
    pub encoded: Vec<u8>,

    pub encoded_size_bytes: u64,

    /// Non-fatal notes for the user, such as preview truncation
    pub warnings: Vec<String>,

    pub summary: RenderSummary,
}

/// Numbers describing a finished render
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RenderSummary {
    pub width: u32,
    pub height: u32,

    /// Steps in the full plan, before any preview truncation
    pub planned_frames: usize,

    pub rendered_frames: usize,
    pub total_duration_ms: u64,
}

/// Orchestrates validation, quota checks, decoding, compositing, reduction and encoding
///
/// The pipeline has two entry points:
/// 1. [`generate_preview`](Self::generate_preview) - the first few output frames, no storage accounting
/// 2. [`generate_full`](Self::generate_full) - every frame, checked against and reported to session storage
///
/// Every render call owns its plan and buffers. Source buffers are shared read-only by the
/// compositing workers; each step allocates its own output.
pub struct RenderPipeline {
    config: Config,
    store: Arc<dyn FrameStore>,
    encoder: Box<dyn FrameEncoder>,
    guard: QuotaGuard,
    normalizer: ImageNormalizer,
    pool: ThreadPool,
}

impl RenderPipeline {
    /// Create a pipeline that encodes GIFs
    pub fn new(config: Config, store: Arc<dyn FrameStore>) -> Result<Self> {
        let encoder = Box::new(GifEncoder::new(config.render.gif_speed));
        Self::with_encoder(config, store, encoder)
    }

    /// Create a pipeline with a custom container encoder
    pub fn with_encoder(
        config: Config,
        store: Arc<dyn FrameStore>,
        encoder: Box<dyn FrameEncoder>,
    ) -> Result<Self> {
        config.validate()?;

        let pool = ThreadPoolBuilder::new()
            .num_threads(config.render.worker_threads)
            .thread_name(|i| format!("gif-forge-render-{}", i))
            .build()
            .map_err(|e| ForgeError::generic(format!("Failed to build render thread pool: {}", e)))?;

        Ok(Self {
            guard: QuotaGuard::new(config.quotas.clone()),
            normalizer: ImageNormalizer::new(
                config.render.resample_filter,
                config.quotas.max_dimension,
            ),
            config,
            store,
            encoder,
            pool,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn quota_guard(&self) -> &QuotaGuard {
        &self.guard
    }

    /// Render the first `max_frames` output steps of the project, or the whole plan when
    /// `None`. Session storage is neither checked nor charged.
    pub fn generate_preview(&self, project: &Project, max_frames: Option<usize>) -> Result<RenderOutput> {
        if max_frames == Some(0) {
            return Err(ValidationError::Malformed {
                details: "preview frame limit must be at least 1".to_string(),
            }.into());
        }
        self.render(project, RenderMode::Preview, max_frames)
    }

    /// Render every output step and charge the result to session storage
    pub fn generate_full(&self, project: &Project) -> Result<RenderOutput> {
        self.render(project, RenderMode::Full, None)
    }

    fn render(&self, project: &Project, mode: RenderMode, limit: Option<usize>) -> Result<RenderOutput> {
        info!("🎬 Starting {:?} render of '{}'", mode, project.name);
        info!("   Source frames: {}", project.frames.len());
        info!("   Transition: {:?}", project.settings.transition);
        info!("   Encoder: {}", self.encoder.name());

        // Pipeline Step 1: Validation
        self.validate(project)?;

        // Pipeline Step 2: Canvas
        let canvas = self.resolve_canvas(project)?;

        // Pipeline Step 3: Planning
        let mut warnings = Vec::new();
        let (plan, planned_frames) = self.build_plan(project, limit, &mut warnings);

        // Pipeline Step 4: Quotas
        let storage_used = match mode {
            RenderMode::Full => self.store.storage_used()?,
            RenderMode::Preview => 0,
        };
        info!("🛡️  Step 4: Checking quotas...");
        self.guard.check(project, canvas, &plan, mode, storage_used)?;

        // Pipeline Step 5: Decoding
        let sources = self.load_sources(project, &plan, canvas, &mut warnings)?;

        // Pipeline Step 6: Compositing
        let frames = self.render_frames(project, &plan, &sources)?;
        drop(sources);

        // Pipeline Step 7: Encoding
        let encoded = self.encode_output(project, &frames, mode)?;
        let encoded_size_bytes = encoded.len() as u64;

        for warning in &warnings {
            warn!("   ⚠️  {}", warning);
        }
        info!("🎉 Render complete: {} frames, {} bytes", frames.len(), encoded_size_bytes);

        Ok(RenderOutput {
            summary: RenderSummary {
                width: canvas.0,
                height: canvas.1,
                planned_frames,
                rendered_frames: frames.len(),
                total_duration_ms: plan.total_duration_ms(),
            },
            frames,
            encoded,
            encoded_size_bytes,
            warnings,
        })
    }

    // ==========================================
    // PIPELINE STEP 1: VALIDATION
    // ==========================================

    /// Malformed input and the frame count are rejected before any image is read
    fn validate(&self, project: &Project) -> Result<()> {
        info!("🔍 Step 1: Validating project...");
        project.validate()?;
        self.guard.check_frame_count(project.frames.len())?;
        debug!("   Project valid, {} ms of source frames", project.source_duration_ms());
        Ok(())
    }

    // ==========================================
    // PIPELINE STEP 2: CANVAS RESOLUTION
    // ==========================================

    /// Output size: explicit width and height, else the first frame's size, then scaled
    pub fn resolve_canvas(&self, project: &Project) -> Result<(u32, u32)> {
        info!("📐 Step 2: Resolving canvas...");
        let settings = &project.settings;

        let base = match settings.explicit_size() {
            Some(size) => size,
            None => {
                let first = project.frames.first().ok_or(ValidationError::NoFrames)?;
                let bytes = self.store.read_image(&first.image_ref)?;
                ImageNormalizer::probe(first.label(), &bytes)?
            }
        };

        let canvas = settings.scaled(base);
        info!("   ✅ Canvas {}x{} (base {}x{}, scale {}%)",
              canvas.0, canvas.1, base.0, base.1, settings.scale);
        Ok(canvas)
    }

    // ==========================================
    // PIPELINE STEP 3: PLANNING
    // ==========================================

    fn build_plan(
        &self,
        project: &Project,
        limit: Option<usize>,
        warnings: &mut Vec<String>,
    ) -> (RenderPlan, usize) {
        info!("🗺️  Step 3: Planning output frames...");
        let mut plan = TransitionPlanner::plan(&project.frames, &project.settings.transition);
        let planned = plan.len();

        if let Some(limit) = limit {
            if planned > limit {
                plan.truncate(limit);
                warnings.push(format!("Preview created with {} of {} frames", limit, planned));
            }
        }

        info!("   ✅ Plan ready:");
        info!("      Output frames: {} of {}", plan.len(), planned);
        info!("      Transition frames: {}", plan.transition_count());
        info!("      Duration: {:.2}s", plan.total_duration_ms() as f64 / 1000.0);
        (plan, planned)
    }

    // ==========================================
    // PIPELINE STEP 5: SOURCE DECODING
    // ==========================================

    /// Decode every source the plan reads, indexed by frame position. Unreferenced
    /// positions stay `None`.
    fn load_sources(
        &self,
        project: &Project,
        plan: &RenderPlan,
        canvas: (u32, u32),
        warnings: &mut Vec<String>,
    ) -> Result<Vec<Option<CanonicalBuffer>>> {
        let referenced = plan.referenced_sources();
        info!("🖼️  Step 5: Decoding {} source images...", referenced.len());

        let decoded = self.pool.install(|| {
            referenced
                .par_iter()
                .map(|&index| -> Result<(usize, NormalizedImage)> {
                    let frame = &project.frames[index];
                    let bytes = self.store.read_image(&frame.image_ref)?;
                    let normalized = self.normalizer.normalize(frame.label(), &bytes, canvas.0, canvas.1)?;
                    Ok((index, normalized))
                })
                .collect::<Result<Vec<_>>>()
        })?;

        let mut sources = vec![None; project.frames.len()];
        for (index, normalized) in decoded {
            if normalized.has_transparency && !project.settings.transparent {
                warnings.push(format!(
                    "Frame '{}' has transparent pixels; they were flattened onto {}",
                    project.frames[index].label(),
                    project.settings.background_color
                ));
            }
            sources[index] = Some(normalized.buffer);
        }

        info!("   ✅ Sources decoded");
        Ok(sources)
    }

    // ==========================================
    // PIPELINE STEP 6: COMPOSITING AND REDUCTION
    // ==========================================

    /// Render plan steps in parallel, one chunk at a time. After each chunk the running
    /// size estimate is checked so an oversized animation stops early.
    fn render_frames(
        &self,
        project: &Project,
        plan: &RenderPlan,
        sources: &[Option<CanonicalBuffer>],
    ) -> Result<Vec<RenderedFrame>> {
        info!("🎨 Step 6: Compositing {} frames on {} threads...",
              plan.len(), self.pool.current_num_threads());

        let settings = &project.settings;
        let effect = settings.transition.kind.effect();
        let reducer = TransparencyReducer::new(
            settings.transparent,
            settings.alpha_threshold,
            settings.background_color,
        );

        let interval = self.config.render.quota_check_interval.max(1);
        let mut frames = Vec::with_capacity(plan.len());
        let mut estimated_bytes = 0u64;

        for chunk in plan.steps().chunks(interval) {
            let rendered = self.pool.install(|| {
                chunk
                    .par_iter()
                    .map(|step| render_step(step, effect, sources, &reducer))
                    .collect::<Result<Vec<_>>>()
            })?;

            estimated_bytes += self.encoder.estimate_size(&rendered)?;
            self.guard.check_output_size(estimated_bytes)?;
            debug!("   {} frames rendered, ~{} bytes", frames.len() + rendered.len(), estimated_bytes);

            frames.extend(rendered);
        }

        info!("   ✅ Compositing complete ({} transparent mode)",
              if settings.transparent { "binary alpha" } else { "flattened" });
        Ok(frames)
    }

    // ==========================================
    // PIPELINE STEP 7: ENCODING
    // ==========================================

    fn encode_output(&self, project: &Project, frames: &[RenderedFrame], mode: RenderMode) -> Result<Vec<u8>> {
        info!("📦 Step 7: Encoding {} frames...", frames.len());

        let options = EncodeOptions {
            loop_count: project.settings.loop_count,
            transparent: project.settings.transparent,
        };
        let encoded = self.encoder.encode(frames, &options)?;
        let size = encoded.len() as u64;
        self.guard.check_output_size(size)?;

        if mode == RenderMode::Full {
            let used = self.store.storage_used()?;
            self.guard.check_storage(used, size)?;
            self.store.report_output_size(size)?;
        }

        info!("   ✅ Encoded {:.1} KB", size as f64 / 1024.0);
        Ok(encoded)
    }
}

/// Composite and reduce a single plan step
fn render_step(
    step: &RenderPlanStep,
    effect: Option<Effect>,
    sources: &[Option<CanonicalBuffer>],
    reducer: &TransparencyReducer,
) -> Result<RenderedFrame> {
    let reduced = match step.kind {
        StepKind::Source { index } => reducer.reduce(source_at(sources, index)?),
        StepKind::Transition { from, to, progress } => {
            let effect = effect.ok_or_else(|| ForgeError::generic("transition step planned without an effect"))?;
            let composited = transitions::composite(
                effect,
                source_at(sources, from)?,
                source_at(sources, to)?,
                progress,
            )?;
            reducer.reduce(&composited)
        }
    };
    Ok(RenderedFrame::new(reduced, step.duration_ms))
}

fn source_at(sources: &[Option<CanonicalBuffer>], index: usize) -> Result<&CanonicalBuffer> {
    sources
        .get(index)
        .and_then(Option::as_ref)
        .ok_or_else(|| ForgeError::generic(format!("source frame {} was not decoded", index)))
}
