//! Per-vertex elevation: fractal octave sum of the noise source, scaled by the
//! peak and snapped to terraces.

use crate::noise_source::NoiseSampler;
use crate::params::{Calibration, TerrainParameters};

/// Maps a planar grid coordinate into noise space.
#[inline]
pub fn normalize(coord: f64, smoothing: f64, calibration: &Calibration) -> f64 {
    coord / (smoothing * calibration.smoothing_scale) - calibration.coordinate_offset
}

/// Sums `octaves` layers of noise, halving amplitude and doubling frequency each time.
pub fn octave_sum(noise: &dyn NoiseSampler, nx: f64, nz: f64, octaves: u32) -> f64 {
    let mut sum = 0.0;
    let mut amplitude = 1.0;
    let mut frequency = 1.0;

    for _ in 0..octaves {
        sum += amplitude * noise.sample(nx * frequency, nz * frequency);
        amplitude *= 0.5;
        frequency *= 2.0;
    }

    sum
}

/// Rounds `value` up to the next multiple of `step`.
#[inline]
pub fn terrace(value: f64, step: f64) -> f64 {
    (value / step).ceil() * step
}

/// Elevation for the vertex at planar `(grid_x, grid_z)`.
///
/// `params` is assumed validated; `TerrainBuilder` guarantees that before the
/// first call.
pub fn compute_elevation(
    noise: &dyn NoiseSampler,
    grid_x: f64,
    grid_z: f64,
    params: &TerrainParameters,
) -> f64 {
    let nx = normalize(grid_x, params.smoothing, &params.calibration);
    let nz = normalize(grid_z, params.smoothing, &params.calibration);
    let scaled = octave_sum(noise, nx, nz, params.frequency) * params.peak;
    terrace(scaled, params.terrace)
}
