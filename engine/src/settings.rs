//! Flat settings record persisted under one named slot.

use std::fs;
use std::ops::RangeInclusive;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::color_band::{ColorBand, DEFAULT_BANDS};
use crate::error::Result;
use crate::noise_source::NoiseKind;
use crate::params::{
    TerrainParameters, WorldDimensions, OCTAVE_RANGE, PEAK_RANGE, SCALE_RANGE, SMOOTHING_RANGE,
    TERRACE_RANGE,
};
use crate::water::WaveParams;

pub const DEFAULT_SLOT: &str = "IslandMaker";

/// Everything the panel remembers between runs. Field names follow the
/// historical slot layout so older saves keep loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IslandSettings {
    pub peak: f64,
    pub smoothing: f64,
    #[serde(rename = "myseed")]
    pub seed: u32,
    #[serde(rename = "freq")]
    pub octaves: u32,
    pub terrace: f64,
    #[serde(rename = "flatshader")]
    pub flat_shading: bool,
    /// `[r, g, b, width]` per band.
    #[serde(rename = "colorArr")]
    pub color_arr: Vec<[f32; 4]>,
    pub len: f32,
    pub width: f32,
    pub frequency: f32,
    pub amplitude: f32,
    #[serde(rename = "waterSpeed")]
    pub water_speed: f32,
    #[serde(rename = "noiseKind")]
    pub noise_kind: NoiseKind,
    pub scale: u32,
    #[serde(rename = "savedAt")]
    pub saved_at: Option<String>,
}

impl Default for IslandSettings {
    fn default() -> Self {
        let terrain = TerrainParameters::default();
        let water = WaveParams::default();
        let dims = WorldDimensions::default();
        Self {
            peak: terrain.peak,
            smoothing: terrain.smoothing,
            seed: terrain.seed,
            octaves: terrain.frequency,
            terrace: terrain.terrace,
            flat_shading: terrain.flat_shading,
            color_arr: DEFAULT_BANDS.iter().map(band_to_row).collect(),
            len: dims.base_size,
            width: dims.base_size,
            frequency: water.frequency,
            amplitude: water.amplitude,
            water_speed: water.speed,
            noise_kind: terrain.noise_kind,
            scale: dims.scale,
            saved_at: None,
        }
    }
}

fn band_to_row(band: &ColorBand) -> [f32; 4] {
    [
        f32::from(band.rgb[0]),
        f32::from(band.rgb[1]),
        f32::from(band.rgb[2]),
        band.width,
    ]
}

/// NaN passes through so validation still rejects it.
fn clamp_to(v: f64, range: &RangeInclusive<f64>) -> f64 {
    v.clamp(*range.start(), *range.end())
}

fn channel(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

impl IslandSettings {
    /// Terrain parameters described by this record, clamped to the panel
    /// ranges. Calibration is not persisted and comes from `base`.
    pub fn terrain_params(&self, base: &TerrainParameters) -> TerrainParameters {
        TerrainParameters {
            peak: clamp_to(self.peak, &PEAK_RANGE),
            smoothing: clamp_to(self.smoothing, &SMOOTHING_RANGE),
            frequency: self.octaves.clamp(*OCTAVE_RANGE.start(), *OCTAVE_RANGE.end()),
            terrace: clamp_to(self.terrace, &TERRACE_RANGE),
            flat_shading: self.flat_shading,
            seed: self.seed,
            noise_kind: self.noise_kind,
            calibration: base.calibration,
        }
    }

    pub fn bands(&self) -> Vec<ColorBand> {
        self.color_arr
            .iter()
            .map(|row| ColorBand::new(channel(row[0]), channel(row[1]), channel(row[2]), row[3]))
            .collect()
    }

    pub fn wave(&self) -> WaveParams {
        WaveParams {
            frequency: self.frequency,
            amplitude: self.amplitude,
            speed: self.water_speed,
        }
    }

    pub fn dimensions(&self, base: &WorldDimensions) -> WorldDimensions {
        WorldDimensions {
            scale: self.scale.clamp(*SCALE_RANGE.start(), *SCALE_RANGE.end()),
            ..*base
        }
    }

    pub fn set_terrain(&mut self, p: &TerrainParameters) {
        self.peak = p.peak;
        self.smoothing = p.smoothing;
        self.seed = p.seed;
        self.octaves = p.frequency;
        self.terrace = p.terrace;
        self.flat_shading = p.flat_shading;
        self.noise_kind = p.noise_kind;
    }

    pub fn set_bands(&mut self, bands: &[ColorBand]) {
        self.color_arr = bands.iter().map(band_to_row).collect();
    }

    pub fn set_wave(&mut self, w: &WaveParams) {
        self.frequency = w.frequency;
        self.amplitude = w.amplitude;
        self.water_speed = w.speed;
    }

    pub fn stamp(&mut self) {
        self.saved_at = Some(chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string());
    }
}

/// Key-value storage for settings records.
pub trait SettingsStore: Send + Sync {
    fn load(&self, slot: &str) -> Result<Option<IslandSettings>>;
    fn save(&self, slot: &str, settings: &IslandSettings) -> Result<()>;
}

/// Stores each slot as `<dir>/<slot>.json`.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn slot_path(&self, slot: &str) -> PathBuf {
        self.dir.join(format!("{slot}.json"))
    }
}

impl SettingsStore for JsonFileStore {
    fn load(&self, slot: &str) -> Result<Option<IslandSettings>> {
        let path = self.slot_path(slot);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    fn save(&self, slot: &str, settings: &IslandSettings) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_string_pretty(settings)?;
        fs::write(self.slot_path(slot), json)?;
        Ok(())
    }
}
