use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

pub const BIPOLAR_MIN: f64 = -5.0;
pub const BIPOLAR_MAX: f64 = 5.0;
pub const INTENSITY_MIN: f64 = 0.0;
pub const INTENSITY_MAX: f64 = 1.0;

/// Number of numeric dimensions in a [`TasteVector`].
pub const TASTE_DIMENSIONS: usize = 8;

/// Eight-dimensional flavor profile of a sake or of a user's preference.
///
/// `sweetness` and `richness` are bipolar axes in `[-5, 5]`; the six flavor
/// intensities are in `[0, 1]`. Every constructor and arithmetic helper returns
/// a clamped vector, and non-finite inputs collapse to the neutral value of
/// their axis.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TasteVector {
    pub sweetness: f64,
    pub richness: f64,
    pub floral: f64,
    pub mellow: f64,
    pub heavy: f64,
    pub mild: f64,
    pub dry: f64,
    pub light: f64,
}

impl TasteVector {
    /// Neutral profile used when nothing is known about a user.
    pub const NEUTRAL: TasteVector = TasteVector {
        sweetness: 0.0,
        richness: 0.0,
        floral: 0.5,
        mellow: 0.5,
        heavy: 0.5,
        mild: 0.5,
        dry: 0.5,
        light: 0.5,
    };

    #[allow(clippy::too_many_arguments)]
    pub fn new(
        sweetness: f64,
        richness: f64,
        floral: f64,
        mellow: f64,
        heavy: f64,
        mild: f64,
        dry: f64,
        light: f64,
    ) -> Self {
        Self { sweetness, richness, floral, mellow, heavy, mild, dry, light }.clamped()
    }

    /// Builds a vector from its dimensions in declared order.
    pub fn from_array(values: [f64; TASTE_DIMENSIONS]) -> Self {
        let [sweetness, richness, floral, mellow, heavy, mild, dry, light] = values;
        Self::new(sweetness, richness, floral, mellow, heavy, mild, dry, light)
    }

    pub fn to_array(&self) -> [f64; TASTE_DIMENSIONS] {
        [
            self.sweetness,
            self.richness,
            self.floral,
            self.mellow,
            self.heavy,
            self.mild,
            self.dry,
            self.light,
        ]
    }

    /// The six flavor intensities in declared order (floral..light).
    pub fn flavor_dimensions(&self) -> [(FlavorDimension, f64); 6] {
        [
            (FlavorDimension::Floral, self.floral),
            (FlavorDimension::Mellow, self.mellow),
            (FlavorDimension::Heavy, self.heavy),
            (FlavorDimension::Mild, self.mild),
            (FlavorDimension::Dry, self.dry),
            (FlavorDimension::Light, self.light),
        ]
    }

    pub fn clamped(self) -> Self {
        Self {
            sweetness: clamp_axis(self.sweetness, BIPOLAR_MIN, BIPOLAR_MAX, 0.0),
            richness: clamp_axis(self.richness, BIPOLAR_MIN, BIPOLAR_MAX, 0.0),
            floral: clamp_axis(self.floral, INTENSITY_MIN, INTENSITY_MAX, 0.5),
            mellow: clamp_axis(self.mellow, INTENSITY_MIN, INTENSITY_MAX, 0.5),
            heavy: clamp_axis(self.heavy, INTENSITY_MIN, INTENSITY_MAX, 0.5),
            mild: clamp_axis(self.mild, INTENSITY_MIN, INTENSITY_MAX, 0.5),
            dry: clamp_axis(self.dry, INTENSITY_MIN, INTENSITY_MAX, 0.5),
            light: clamp_axis(self.light, INTENSITY_MIN, INTENSITY_MAX, 0.5),
        }
    }

    /// Euclidean distance across all eight dimensions.
    pub fn distance(&self, other: &TasteVector) -> f64 {
        self.to_array()
            .iter()
            .zip(other.to_array().iter())
            .map(|(a, b)| (a - b).powi(2))
            .sum::<f64>()
            .sqrt()
    }

    /// `true` when both bipolar axes sit inside the "easy drinking" band.
    pub fn is_balanced_profile(&self, band: f64) -> bool {
        self.sweetness.abs() < band && self.richness.abs() < band
    }
}

impl Default for TasteVector {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

fn clamp_axis(value: f64, min: f64, max: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value.clamp(min, max)
    } else {
        fallback
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlavorDimension {
    Floral,
    Mellow,
    Heavy,
    Mild,
    Dry,
    Light,
}

/// Taste archetype assigned to a preference vector.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TasteType {
    Floral,
    Mellow,
    Heavy,
    Mild,
    Dry,
    Light,
    Balanced,
    /// Not produced by the vector classifier; kept for the adventure-scoring path.
    Explorer,
}

impl TasteType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Floral => "floral",
            Self::Mellow => "mellow",
            Self::Heavy => "heavy",
            Self::Mild => "mild",
            Self::Dry => "dry",
            Self::Light => "light",
            Self::Balanced => "balanced",
            Self::Explorer => "explorer",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Floral => "Fragrant, fruity ginjo-style sake",
            Self::Mellow => "Smooth, rounded sake with a soft finish",
            Self::Heavy => "Full-bodied sake with deep umami",
            Self::Mild => "Gentle, easy-going sake",
            Self::Dry => "Crisp, dry sake with a clean finish",
            Self::Light => "Light, refreshing sake",
            Self::Balanced => "Well-rounded taste with no single dominant trait",
            Self::Explorer => "Curious drinker who enjoys a wide range of styles",
        }
    }
}

impl From<FlavorDimension> for TasteType {
    fn from(value: FlavorDimension) -> Self {
        match value {
            FlavorDimension::Floral => Self::Floral,
            FlavorDimension::Mellow => Self::Mellow,
            FlavorDimension::Heavy => Self::Heavy,
            FlavorDimension::Mild => Self::Mild,
            FlavorDimension::Dry => Self::Dry,
            FlavorDimension::Light => Self::Light,
        }
    }
}

impl fmt::Display for TasteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TasteType {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "floral" => Ok(Self::Floral),
            "mellow" => Ok(Self::Mellow),
            "heavy" => Ok(Self::Heavy),
            "mild" => Ok(Self::Mild),
            "dry" => Ok(Self::Dry),
            "light" => Ok(Self::Light),
            "balanced" => Ok(Self::Balanced),
            "explorer" => Ok(Self::Explorer),
            other => Err(DomainError::InvariantViolation(format!("unknown taste type `{other}`"))),
        }
    }
}
