//! # Project Model
//!
//! A project is an ordered list of source frames plus the settings that control how they are
//! rendered. Projects arrive as JSON from the client and are immutable for the duration of a
//! render; reordering and editing happen before they reach the pipeline.

pub mod types;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ValidationError};

pub use types::{
    Effect, RenderSettings, RgbColor, SlideDirection, SourceFrame, TransitionKind, TransitionSpec,
};

/// Scale percentages accepted by `RenderSettings::scale`
pub const SCALE_RANGE: std::ops::RangeInclusive<u32> = 10..=100;

/// An animation project: settings plus ordered source frames
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    #[serde(default = "default_name")]
    pub name: String,

    #[serde(default)]
    pub settings: RenderSettings,

    #[serde(default)]
    pub frames: Vec<SourceFrame>,
}

fn default_name() -> String {
    "animation".to_string()
}

impl Project {
    pub fn new<S: Into<String>>(name: S, settings: RenderSettings) -> Self {
        Self {
            name: name.into(),
            settings,
            frames: Vec::new(),
        }
    }

    /// Append a frame, returning `self` for chaining
    pub fn with_frame<S: Into<String>>(mut self, image_ref: S, duration_ms: u32) -> Self {
        self.frames.push(SourceFrame::new(image_ref, duration_ms));
        self
    }

    /// Parse a project from JSON. Unknown transition types and malformed fields are
    /// validation errors.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| {
            ValidationError::Malformed { details: e.to_string() }.into()
        })
    }

    /// Load a project from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| {
            ValidationError::Malformed { details: e.to_string() }.into()
        })
    }

    /// Save the project as pretty-printed JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Sum of source frame durations, ignoring transitions
    pub fn source_duration_ms(&self) -> u64 {
        self.frames.iter().map(|f| u64::from(f.display_duration_ms())).sum()
    }

    /// Check every setting and frame, reporting all problems at once.
    ///
    /// Resource limits are not checked here; see `QuotaGuard`.
    pub fn validate(&self) -> Result<()> {
        let mut problems = Vec::new();

        if self.frames.is_empty() {
            problems.push(ValidationError::NoFrames);
        }

        if !SCALE_RANGE.contains(&self.settings.scale) {
            problems.push(ValidationError::InvalidScale { scale: self.settings.scale });
        }

        for (axis, value) in [("width", self.settings.width), ("height", self.settings.height)] {
            if value == Some(0) {
                problems.push(ValidationError::InvalidDimension { axis: axis.to_string(), value: 0 });
            }
        }

        for frame in &self.frames {
            if frame.duration_ms < 1 || frame.duration_ms > i64::from(u32::MAX) {
                problems.push(ValidationError::InvalidDuration {
                    frame: frame.label().to_string(),
                    duration: frame.duration_ms,
                });
            }
        }

        match problems.len() {
            0 => Ok(()),
            1 => Err(problems.remove(0).into()),
            _ => Err(ValidationError::Settings {
                problems: problems.iter().map(|p| p.to_string()).collect(),
            }.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ForgeError;
    use tempfile::tempdir;

    const PROJECT_JSON: &str = r##"{
        "name": "wave",
        "settings": {
            "width": 320,
            "height": 240,
            "loop": 3,
            "transparent": true,
            "backgroundColor": "#102030",
            "alphaThreshold": 64,
            "transition": { "type": "crossfade", "durationMs": 200, "steps": 2 }
        },
        "frames": [
            { "id": "frame-1", "file": "a.png", "duration": 100 },
            { "file": "b.png", "duration": 150 }
        ]
    }"##;

    #[test]
    fn test_parse_project() {
        let project = Project::from_json(PROJECT_JSON).unwrap();
        assert_eq!(project.name, "wave");
        assert_eq!(project.settings.explicit_size(), Some((320, 240)));
        assert_eq!(project.settings.scale, 100);
        assert_eq!(project.settings.loop_count, 3);
        assert_eq!(project.settings.background_color, RgbColor([0x10, 0x20, 0x30]));
        assert_eq!(project.settings.transition.kind, TransitionKind::Crossfade);
        assert_eq!(project.frames.len(), 2);
        assert_eq!(project.frames[0].label(), "frame-1");
        assert_eq!(project.source_duration_ms(), 250);
        assert!(project.validate().is_ok());
    }

    #[test]
    fn test_unknown_transition_is_validation_error() {
        let json = PROJECT_JSON.replace("crossfade", "zoomBlur");
        assert!(matches!(Project::from_json(&json), Err(ForgeError::Validation(_))));
    }

    #[test]
    fn test_negative_steps_is_validation_error() {
        let json = PROJECT_JSON.replace("\"steps\": 2", "\"steps\": -1");
        assert!(matches!(Project::from_json(&json), Err(ForgeError::Validation(_))));
    }

    #[test]
    fn test_validate_reports_every_problem() {
        let mut project = Project::new("bad", RenderSettings { scale: 5, ..RenderSettings::default() })
            .with_frame("a.png", 100);
        project.frames.push(SourceFrame { id: None, image_ref: "b.png".into(), duration_ms: 0 });

        match project.validate() {
            Err(ForgeError::Validation(ValidationError::Settings { problems })) => {
                assert_eq!(problems.len(), 2);
                assert!(problems[0].contains("Scale"));
                assert!(problems[1].contains("b.png"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_empty_project_rejected() {
        let project = Project::new("empty", RenderSettings::default());
        assert!(matches!(
            project.validate(),
            Err(ForgeError::Validation(ValidationError::NoFrames))
        ));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("project.json");

        let project = Project::from_json(PROJECT_JSON).unwrap();
        project.save(&path).unwrap();
        assert_eq!(Project::load(&path).unwrap(), project);
    }
}
