use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::error::{ensure, Result, TerrainError};
use crate::noise_source::NoiseKind;

/// Ranges offered by the parameter panel. Loaded settings are clamped to them.
pub const PEAK_RANGE: RangeInclusive<f64> = 1.0..=1000.0;
pub const SMOOTHING_RANGE: RangeInclusive<f64> = 1.0..=200.0;
pub const OCTAVE_RANGE: RangeInclusive<u32> = 1..=25;
pub const TERRACE_RANGE: RangeInclusive<f64> = 1.0..=100.0;
pub const SCALE_RANGE: RangeInclusive<u32> = 1..=4;

/// Upper bound on segments per side of the terrain plane.
pub const MAX_SEGMENTS: u32 = 4096;

/// Calibration constants tying noise space and band space to world units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Calibration {
    /// Multiplier applied to `smoothing` before dividing grid coordinates.
    pub smoothing_scale: f64,
    /// Offset subtracted from the normalised coordinates.
    pub coordinate_offset: f64,
    /// Added to the elevation before it is scaled into band space.
    pub band_offset: f64,
    pub band_scale: f64,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            smoothing_scale: 40.0,
            coordinate_offset: 0.5,
            band_offset: 0.1,
            band_scale: 5.0,
        }
    }
}

impl Calibration {
    pub fn validate(&self) -> Result<()> {
        ensure("smoothing_scale", self.smoothing_scale, |v| v > 0.0, "must be > 0")?;
        ensure("coordinate_offset", self.coordinate_offset, |_| true, "")?;
        ensure("band_offset", self.band_offset, |_| true, "")?;
        ensure("band_scale", self.band_scale, |_| true, "")?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerrainParameters {
    /// Height multiplier for the fractal sum.
    pub peak: f64,
    /// Horizontal stretch; larger values give fewer, wider islands.
    pub smoothing: f64,
    /// Octave count.
    pub frequency: u32,
    /// Terrace step; 1 keeps whole-unit heights.
    pub terrace: f64,
    pub flat_shading: bool,
    pub seed: u32,
    pub noise_kind: NoiseKind,
    pub calibration: Calibration,
}

impl Default for TerrainParameters {
    fn default() -> Self {
        Self {
            peak: 400.0,
            smoothing: 100.0,
            frequency: 10,
            terrace: 1.0,
            flat_shading: true,
            seed: 0,
            noise_kind: NoiseKind::Perlin,
            calibration: Calibration::default(),
        }
    }
}

impl TerrainParameters {
    pub fn validate(&self) -> Result<()> {
        ensure("peak", self.peak, |v| v > 0.0, "must be > 0")?;
        ensure("smoothing", self.smoothing, |v| v > 0.0, "must be > 0")?;
        ensure("terrace", self.terrace, |v| v > 0.0, "must be > 0")?;
        if self.frequency == 0 {
            return Err(TerrainError::InvalidParameter {
                name: "frequency",
                value: 0.0,
                reason: "needs at least one octave",
            });
        }
        if self.frequency > *OCTAVE_RANGE.end() {
            return Err(TerrainError::InvalidParameter {
                name: "frequency",
                value: f64::from(self.frequency),
                reason: "exceeds the octave limit",
            });
        }
        self.calibration.validate()
    }
}

/// World extent and tessellation of the terrain plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldDimensions {
    /// Global scale factor shared with the rest of the scene.
    pub scale: u32,
    pub base_size: f32,
    pub base_segments: u32,
}

impl Default for WorldDimensions {
    fn default() -> Self {
        Self {
            scale: 1,
            base_size: 4000.0,
            base_segments: 256,
        }
    }
}

impl WorldDimensions {
    pub fn size(&self) -> f32 {
        self.scale as f32 * self.base_size
    }

    /// Saturates instead of overflowing; `validate` rejects anything above
    /// `MAX_SEGMENTS`.
    pub fn segments(&self) -> u32 {
        self.scale.saturating_mul(self.base_segments)
    }

    pub fn validate(&self) -> Result<()> {
        if self.scale == 0 || self.base_segments == 0 {
            return Err(TerrainError::InvalidGrid(format!(
                "scale {} x segments {} yields an empty grid",
                self.scale, self.base_segments
            )));
        }
        match self.scale.checked_mul(self.base_segments) {
            Some(segments) if segments <= MAX_SEGMENTS => {}
            _ => {
                return Err(TerrainError::InvalidGrid(format!(
                    "scale {} x segments {} exceeds {MAX_SEGMENTS} segments per side",
                    self.scale, self.base_segments
                )))
            }
        }
        if !(self.base_size.is_finite() && self.base_size > 0.0) {
            return Err(TerrainError::InvalidGrid(format!(
                "base size {} must be finite and > 0",
                self.base_size
            )));
        }
        Ok(())
    }
}
