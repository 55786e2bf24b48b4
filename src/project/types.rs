use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// An opaque RGB colour. Serialized as `#RRGGBB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RgbColor(pub [u8; 3]);

impl RgbColor {
    pub const WHITE: Self = Self([255, 255, 255]);
    pub const BLACK: Self = Self([0, 0, 0]);

    /// The colour as a fully opaque RGBA pixel
    pub fn to_rgba(self) -> [u8; 4] {
        let [r, g, b] = self.0;
        [r, g, b, 255]
    }
}

impl Default for RgbColor {
    fn default() -> Self {
        Self::WHITE
    }
}

impl fmt::Display for RgbColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b] = self.0;
        write!(f, "#{:02X}{:02X}{:02X}", r, g, b)
    }
}

impl FromStr for RgbColor {
    type Err = String;

    /// Accepts `#RRGGBB`, `RRGGBB` and the `#RGB` shorthand
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.trim().trim_start_matches('#');
        if !hex.is_ascii() {
            return Err(format!("invalid colour '{}'", s));
        }
        let expanded: String = match hex.len() {
            3 => hex.chars().flat_map(|c| [c, c]).collect(),
            6 => hex.to_string(),
            _ => return Err(format!("invalid colour '{}'", s)),
        };

        let channel = |i: usize| {
            u8::from_str_radix(&expanded[i..i + 2], 16)
                .map_err(|_| format!("invalid colour '{}'", s))
        };

        Ok(Self([channel(0)?, channel(2)?, channel(4)?]))
    }
}

impl Serialize for RgbColor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for RgbColor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Direction of travel for slide transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlideDirection {
    /// Incoming frame enters at the right edge and travels left
    Left,
    /// Incoming frame enters at the left edge and travels right
    Right,
    /// Incoming frame enters at the bottom edge and travels up
    Up,
    /// Incoming frame enters at the top edge and travels down
    Down,
}

/// The kind of synthetic frames inserted between two source frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TransitionKind {
    #[default]
    None,
    Crossfade,
    FadeToWhite,
    FadeToBlack,
    SlideLeft,
    SlideRight,
    SlideUp,
    SlideDown,
}

/// Pixel operation a transition kind resolves to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    Crossfade,
    FadeThrough(RgbColor),
    Slide(SlideDirection),
}

impl TransitionKind {
    /// The pixel operation for this kind, `None` for hard cuts
    pub fn effect(self) -> Option<Effect> {
        match self {
            Self::None => None,
            Self::Crossfade => Some(Effect::Crossfade),
            Self::FadeToWhite => Some(Effect::FadeThrough(RgbColor::WHITE)),
            Self::FadeToBlack => Some(Effect::FadeThrough(RgbColor::BLACK)),
            Self::SlideLeft => Some(Effect::Slide(SlideDirection::Left)),
            Self::SlideRight => Some(Effect::Slide(SlideDirection::Right)),
            Self::SlideUp => Some(Effect::Slide(SlideDirection::Up)),
            Self::SlideDown => Some(Effect::Slide(SlideDirection::Down)),
        }
    }
}

/// Transition applied to every gap between consecutive source frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransitionSpec {
    #[serde(rename = "type")]
    pub kind: TransitionKind,

    /// Total time spent in synthetic frames for one gap
    #[serde(alias = "transitionTime")]
    pub duration_ms: u32,

    /// Synthetic frames per gap
    pub steps: u32,
}

impl TransitionSpec {
    pub fn new(kind: TransitionKind, duration_ms: u32, steps: u32) -> Self {
        Self { kind, duration_ms, steps }
    }

    /// Whether any synthetic frames are inserted between a pair
    pub fn is_active(&self) -> bool {
        self.kind != TransitionKind::None && self.duration_ms > 0 && self.steps > 0
    }
}

/// One user-supplied still image and how long it stays on screen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFrame {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Reference to a previously uploaded image, resolved by the store
    #[serde(rename = "file", alias = "imageRef")]
    pub image_ref: String,

    /// Display duration in milliseconds. Signed so that bad input reaches validation.
    #[serde(rename = "duration", alias = "durationMs", default = "default_duration_ms")]
    pub duration_ms: i64,
}

fn default_duration_ms() -> i64 {
    100
}

impl SourceFrame {
    pub fn new<S: Into<String>>(image_ref: S, duration_ms: u32) -> Self {
        Self {
            id: None,
            image_ref: image_ref.into(),
            duration_ms: i64::from(duration_ms),
        }
    }

    /// Name used in logs and errors: the id when present, else the image reference
    pub fn label(&self) -> &str {
        self.id.as_deref().unwrap_or(&self.image_ref)
    }

    /// The validated duration. Only meaningful after `Project::validate`.
    pub fn display_duration_ms(&self) -> u32 {
        u32::try_from(self.duration_ms).unwrap_or(0)
    }
}

/// Output settings for one project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RenderSettings {
    /// Explicit canvas width. With `height`, overrides the first frame's size.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,

    /// Percentage applied to the canvas size (10-100)
    pub scale: u32,

    /// Loop count, 0 loops forever
    #[serde(rename = "loop")]
    pub loop_count: u16,

    /// Keep one-bit transparency instead of flattening onto the background
    pub transparent: bool,

    pub background_color: RgbColor,

    /// Alpha below this becomes transparent in transparent mode
    pub alpha_threshold: u8,

    pub transition: TransitionSpec,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            width: None,
            height: None,
            scale: 100,
            loop_count: 0,
            transparent: false,
            background_color: RgbColor::WHITE,
            alpha_threshold: 128,
            transition: TransitionSpec::default(),
        }
    }
}

impl RenderSettings {
    /// Explicit canvas size when both axes are set
    pub fn explicit_size(&self) -> Option<(u32, u32)> {
        self.width.zip(self.height)
    }

    /// Apply `scale` to a base size, rounding half-up and never going below one pixel
    pub fn scaled(&self, base: (u32, u32)) -> (u32, u32) {
        let apply = |v: u32| ((u64::from(v) * u64::from(self.scale) + 50) / 100).max(1) as u32;
        (apply(base.0), apply(base.1))
    }
}
