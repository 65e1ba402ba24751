use serde::{Deserialize, Serialize};

use crate::error::{Result, TerrainError};
use crate::params::Calibration;

/// One colour band: an sRGB tint and how far it extends in band space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorBand {
    pub rgb: [u8; 3],
    pub width: f32,
}

impl ColorBand {
    pub const fn new(r: u8, g: u8, b: u8, width: f32) -> Self {
        Self { rgb: [r, g, b], width }
    }

    /// Channels divided by 255.
    pub fn normalized(&self) -> [f32; 3] {
        [
            f32::from(self.rgb[0]) / 255.0,
            f32::from(self.rgb[1]) / 255.0,
            f32::from(self.rgb[2]) / 255.0,
        ]
    }
}

pub const DEFAULT_BANDS: [ColorBand; 5] = [
    ColorBand::new(235, 233, 90, 160.0),
    ColorBand::new(100, 120, 60, 100.0),
    ColorBand::new(100, 160, 60, 350.0),
    ColorBand::new(180, 180, 180, 550.0),
    ColorBand::new(230, 230, 180, 300.0),
];

/// Ordered, validated band list with its cumulative thresholds.
///
/// Band 0 takes everything up to and including `thresholds[0]`, band `i`
/// takes `(thresholds[i-1], thresholds[i]]`, and the last band takes
/// everything above `thresholds[n-2]`. The last band's own width only
/// matters once another band is appended after it.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorBandList {
    bands: Vec<ColorBand>,
    thresholds: Vec<f64>,
}

impl ColorBandList {
    pub fn new(bands: Vec<ColorBand>) -> Result<Self> {
        if bands.is_empty() {
            return Err(TerrainError::EmptyBands);
        }
        for (index, band) in bands.iter().enumerate() {
            if !(band.width.is_finite() && band.width > 0.0) {
                return Err(TerrainError::InvalidBandWidth { index, width: band.width });
            }
        }

        let thresholds = bands
            .iter()
            .scan(0.0f64, |acc, band| {
                *acc += f64::from(band.width);
                Some(*acc)
            })
            .collect();

        Ok(Self { bands, thresholds })
    }

    pub fn bands(&self) -> &[ColorBand] {
        &self.bands
    }

    pub fn thresholds(&self) -> &[f64] {
        &self.thresholds
    }

    pub fn band_count(&self) -> usize {
        self.bands.len()
    }

    /// Index of the band containing `y`.
    pub fn select(&self, y: f64) -> usize {
        let last = self.bands.len() - 1;
        // Thresholds are strictly increasing, so the first one >= y is the band.
        self.thresholds[..last].partition_point(|&t| t < y)
    }

    pub fn tint(&self, y: f64) -> [f32; 3] {
        self.bands[self.select(y)].normalized()
    }

    /// Tint for a terrain elevation, going through band space first.
    pub fn tint_for_elevation(&self, elevation: f64, calibration: &Calibration) -> [f32; 3] {
        self.tint(band_proxy(elevation, calibration))
    }
}

impl Default for ColorBandList {
    fn default() -> Self {
        let bands = DEFAULT_BANDS.to_vec();
        let thresholds = bands
            .iter()
            .scan(0.0f64, |acc, band| {
                *acc += f64::from(band.width);
                Some(*acc)
            })
            .collect();
        Self { bands, thresholds }
    }
}

/// Converts a terrain elevation into the value compared against band thresholds.
#[inline]
pub fn band_proxy(elevation: f64, calibration: &Calibration) -> f64 {
    (elevation + calibration.band_offset) * calibration.band_scale
}
