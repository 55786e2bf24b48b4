use tracing::debug;

use crate::project::{SourceFrame, TransitionSpec};

/// What a single plan step renders
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepKind {
    /// A source frame shown as-is
    Source { index: usize },

    /// A synthetic frame between two consecutive source frames.
    /// `progress` lies strictly between 0 and 1.
    Transition { from: usize, to: usize, progress: f64 },
}

/// One output frame of the animation, before any pixel work
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderPlanStep {
    pub kind: StepKind,
    pub duration_ms: u32,
}

impl RenderPlanStep {
    pub fn is_source(&self) -> bool {
        matches!(self.kind, StepKind::Source { .. })
    }
}

/// Ordered list of steps that fully describes one output animation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderPlan {
    steps: Vec<RenderPlanStep>,
}

impl RenderPlan {
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    pub fn add_step(&mut self, kind: StepKind, duration_ms: u32) {
        self.steps.push(RenderPlanStep { kind, duration_ms });
    }

    pub fn steps(&self) -> &[RenderPlanStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Keep only the first `max_steps` output steps
    pub fn truncate(&mut self, max_steps: usize) {
        self.steps.truncate(max_steps);
    }

    /// Total display time of the animation in milliseconds
    pub fn total_duration_ms(&self) -> u64 {
        self.steps.iter().map(|s| u64::from(s.duration_ms)).sum()
    }

    /// Number of synthetic transition steps
    pub fn transition_count(&self) -> usize {
        self.steps.iter().filter(|s| !s.is_source()).count()
    }

    /// Source frame indices the plan actually reads, in ascending order
    pub fn referenced_sources(&self) -> Vec<usize> {
        let mut indices: Vec<usize> = self.steps
            .iter()
            .flat_map(|s| match s.kind {
                StepKind::Source { index } => [index, index],
                StepKind::Transition { from, to, .. } => [from, to],
            })
            .collect();
        indices.sort_unstable();
        indices.dedup();
        indices
    }
}

/// Expands ordered source frames and a transition spec into a render plan
pub struct TransitionPlanner;

impl TransitionPlanner {
    /// Each source frame contributes exactly one step with its own duration. When the
    /// transition is active, `steps` synthetic frames are placed in every gap with
    /// progress `k / (steps + 1)`. The gap's `duration_ms` is split evenly with the
    /// integer remainder added to the last synthetic frame.
    pub fn plan(frames: &[SourceFrame], transition: &TransitionSpec) -> RenderPlan {
        let mut plan = RenderPlan::new();
        let durations = Self::split_duration(transition);

        for (index, frame) in frames.iter().enumerate() {
            plan.add_step(StepKind::Source { index }, frame.display_duration_ms());

            let is_last = index + 1 == frames.len();
            if is_last || durations.is_empty() {
                continue;
            }

            let denominator = f64::from(transition.steps) + 1.0;
            for (k, &duration_ms) in durations.iter().enumerate() {
                let progress = (k as f64 + 1.0) / denominator;
                plan.add_step(
                    StepKind::Transition { from: index, to: index + 1, progress },
                    duration_ms,
                );
            }
        }

        debug!("Planned {} steps ({} transition) for {} source frames, {} ms total",
               plan.len(), plan.transition_count(), frames.len(), plan.total_duration_ms());

        plan
    }

    /// Per-step durations for one gap, empty when no frames are inserted
    pub fn split_duration(transition: &TransitionSpec) -> Vec<u32> {
        if !transition.is_active() {
            return Vec::new();
        }

        let steps = transition.steps;
        let base = transition.duration_ms / steps;
        let remainder = transition.duration_ms % steps;

        let mut durations = vec![base; steps as usize];
        if let Some(last) = durations.last_mut() {
            *last += remainder;
        }
        durations
    }
}
