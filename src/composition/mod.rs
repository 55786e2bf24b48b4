//! # Composition Engine
//!
//! Turns a project into rendered frames: the planner lays out every output frame and the
//! pipeline decodes, composites, reduces and encodes them under the configured quotas.

pub mod engine;
pub mod plan;

// Re-exports for convenience
pub use engine::{RenderOutput, RenderPipeline, RenderSummary};
pub use plan::{RenderPlan, RenderPlanStep, StepKind, TransitionPlanner};
