//! Height-field terrain generation for the island maker.
//!
//! The crate is renderer-agnostic: it turns a seed and a handful of parameters
//! into a displaced vertex grid with per-vertex tints and normals, and leaves
//! mesh upload to the caller.

pub mod builder;
pub mod color_band;
pub mod error;
pub mod grid;
pub mod height_field;
pub mod noise_source;
pub mod params;
pub mod settings;
pub mod water;

pub use builder::{TerrainBuilder, TerrainState, TerrainSurface};
pub use color_band::{band_proxy, ColorBand, ColorBandList, DEFAULT_BANDS};
pub use error::{Result, TerrainError};
pub use grid::VertexGrid;
pub use height_field::compute_elevation;
pub use noise_source::{NoiseKind, NoiseSampler, NoiseSource};
pub use params::{
    Calibration, TerrainParameters, WorldDimensions, OCTAVE_RANGE, PEAK_RANGE, SCALE_RANGE,
    SMOOTHING_RANGE, TERRACE_RANGE,
};
pub use settings::{IslandSettings, JsonFileStore, SettingsStore, DEFAULT_SLOT};
pub use water::WaveParams;
