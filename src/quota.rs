//! # Resource Quotas
//!
//! Hard limits checked before rendering starts and re-checked while frames are produced.
//! A violated quota always aborts the request; output is never silently truncated.

use serde::Serialize;
use tracing::warn;

use crate::composition::plan::RenderPlan;
use crate::config::QuotaConfig;
use crate::error::{QuotaError, Result};
use crate::frame::CanonicalBuffer;
use crate::project::Project;

/// Which entry point a render is for. Only full renders consume session storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    Preview,
    Full,
}

/// Storage usage of a session against its limit
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StorageReport {
    pub used: u64,
    pub limit: u64,
    pub remaining: u64,
    pub percentage: f64,
}

/// Enforces `QuotaConfig` limits
#[derive(Debug, Clone)]
pub struct QuotaGuard {
    quotas: QuotaConfig,
}

impl QuotaGuard {
    pub fn new(quotas: QuotaConfig) -> Self {
        Self { quotas }
    }

    pub fn quotas(&self) -> &QuotaConfig {
        &self.quotas
    }

    /// All checks that can run once the canvas and plan are known, before any pixel work
    pub fn check(
        &self,
        project: &Project,
        canvas: (u32, u32),
        plan: &RenderPlan,
        mode: RenderMode,
        storage_used: u64,
    ) -> Result<()> {
        self.check_frame_count(project.frames.len())?;
        self.check_dimensions(canvas.0, canvas.1)?;
        self.check_decoded_memory(plan.referenced_sources().len(), plan.len(), canvas)?;
        if mode == RenderMode::Full {
            self.check_storage(storage_used, 0)?;
        }
        Ok(())
    }

    pub fn check_frame_count(&self, count: usize) -> Result<()> {
        if count > self.quotas.max_frames {
            warn!("Frame count {} exceeds max frames {}", count, self.quotas.max_frames);
            return Err(QuotaError::TooManyFrames { count, max: self.quotas.max_frames }.into());
        }
        Ok(())
    }

    pub fn check_dimensions(&self, width: u32, height: u32) -> Result<()> {
        let max = self.quotas.max_dimension;
        if width > max || height > max {
            warn!("Dimensions {}x{} exceed max dimension {}", width, height, max);
            return Err(QuotaError::DimensionsTooLarge { width, height, max }.into());
        }
        Ok(())
    }

    /// Decoded sources plus every rendered output step are held in memory at once
    pub fn check_decoded_memory(&self, sources: usize, steps: usize, canvas: (u32, u32)) -> Result<()> {
        let per_buffer = CanonicalBuffer::byte_size(canvas.0, canvas.1);
        let bytes = per_buffer.saturating_mul((sources + steps) as u64);
        if bytes > self.quotas.max_decoded_bytes {
            warn!("Projected decoded memory {} bytes exceeds bound {}", bytes, self.quotas.max_decoded_bytes);
            return Err(QuotaError::DecodedMemory { bytes, max: self.quotas.max_decoded_bytes }.into());
        }
        Ok(())
    }

    pub fn check_output_size(&self, bytes: u64) -> Result<()> {
        if bytes > self.quotas.max_output_size {
            warn!("Output size {} exceeds max output size {}", bytes, self.quotas.max_output_size);
            return Err(QuotaError::OutputTooLarge { bytes, max: self.quotas.max_output_size }.into());
        }
        Ok(())
    }

    /// A session already at its limit cannot store anything, even zero new bytes
    pub fn check_storage(&self, used: u64, requested: u64) -> Result<()> {
        let max = self.quotas.max_total_storage;
        let exceeded = if requested == 0 {
            used >= max
        } else {
            used.saturating_add(requested) > max
        };

        if exceeded {
            warn!("Session storage {} + {} exceeds quota {}", used, requested, max);
            return Err(QuotaError::StorageExceeded { used, requested, max }.into());
        }
        Ok(())
    }

    /// Whether an upload of `size` bytes may be accepted into a session using `used` bytes
    pub fn check_upload(&self, size: u64, used: u64) -> Result<()> {
        if size > self.quotas.max_upload_size {
            warn!("File size {} exceeds max upload size", size);
            return Err(QuotaError::UploadTooLarge { bytes: size, max: self.quotas.max_upload_size }.into());
        }
        self.check_storage(used, 0)?;
        self.check_storage(used, size)
    }

    pub fn storage_report(&self, used: u64) -> StorageReport {
        let limit = self.quotas.max_total_storage;
        StorageReport {
            used,
            limit,
            remaining: limit.saturating_sub(used),
            percentage: used as f64 / limit as f64 * 100.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composition::plan::TransitionPlanner;
    use crate::error::ForgeError;
    use crate::project::RenderSettings;

    fn guard() -> QuotaGuard {
        QuotaGuard::new(QuotaConfig::default())
    }

    fn project_with(frames: usize) -> Project {
        (0..frames).fold(Project::new("q", RenderSettings::default()), |p, i| {
            p.with_frame(format!("{}.png", i), 100)
        })
    }

    #[test]
    fn test_frame_limit_boundary() {
        let guard = guard();
        assert!(guard.check_frame_count(200).is_ok());
        assert!(matches!(
            guard.check_frame_count(201),
            Err(ForgeError::QuotaExceeded(QuotaError::TooManyFrames { count: 201, max: 200 }))
        ));
    }

    #[test]
    fn test_full_check_on_projects() {
        let guard = guard();
        for (frames, ok) in [(200, true), (201, false)] {
            let project = project_with(frames);
            let plan = TransitionPlanner::plan(&project.frames, &project.settings.transition);
            let result = guard.check(&project, (8, 8), &plan, RenderMode::Preview, 0);
            assert_eq!(result.is_ok(), ok, "{} frames", frames);
        }
    }

    #[test]
    fn test_dimension_limit() {
        let guard = guard();
        assert!(guard.check_dimensions(2000, 2000).is_ok());
        assert!(guard.check_dimensions(2001, 10).is_err());
        assert!(guard.check_dimensions(10, 2001).is_err());
    }

    #[test]
    fn test_decoded_memory_bound() {
        let guard = QuotaGuard::new(QuotaConfig { max_decoded_bytes: 1000, ..QuotaConfig::default() });
        // 5x5x4 = 100 bytes per buffer
        assert!(guard.check_decoded_memory(2, 8, (5, 5)).is_ok());
        assert!(guard.check_decoded_memory(2, 9, (5, 5)).is_err());
    }

    #[test]
    fn test_storage_only_checked_for_full_renders() {
        let guard = guard();
        let project = project_with(2);
        let plan = TransitionPlanner::plan(&project.frames, &project.settings.transition);
        let full_session = guard.quotas().max_total_storage;

        assert!(guard.check(&project, (8, 8), &plan, RenderMode::Preview, full_session).is_ok());
        assert!(guard.check(&project, (8, 8), &plan, RenderMode::Full, full_session).is_err());
        assert!(guard.check(&project, (8, 8), &plan, RenderMode::Full, full_session - 1).is_ok());
    }

    #[test]
    fn test_output_and_storage_limits() {
        let guard = guard();
        let max_output = guard.quotas().max_output_size;
        assert!(guard.check_output_size(max_output).is_ok());
        assert!(guard.check_output_size(max_output + 1).is_err());

        let max_storage = guard.quotas().max_total_storage;
        assert!(guard.check_storage(max_storage - 10, 10).is_ok());
        assert!(guard.check_storage(max_storage - 10, 11).is_err());
    }

    #[test]
    fn test_upload_checks() {
        let guard = guard();
        let max_upload = guard.quotas().max_upload_size;
        assert!(guard.check_upload(max_upload, 0).is_ok());
        assert!(matches!(
            guard.check_upload(max_upload + 1, 0),
            Err(ForgeError::QuotaExceeded(QuotaError::UploadTooLarge { .. }))
        ));
        let max_storage = guard.quotas().max_total_storage;
        assert!(guard.check_upload(1024, max_storage - 100).is_err());
    }

    #[test]
    fn test_storage_report() {
        let report = guard().storage_report(25 * 1024 * 1024);
        assert_eq!(report.remaining, 25 * 1024 * 1024);
        assert!((report.percentage - 50.0).abs() < 1e-9);
    }
}
