//! Sine-wave water surface math. The renderer displaces a flat plane with
//! these functions every frame.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WaveParams {
    pub frequency: f32,
    pub amplitude: f32,
    pub speed: f32,
}

impl Default for WaveParams {
    fn default() -> Self {
        Self {
            frequency: 0.05,
            amplitude: 0.5,
            speed: 1.0,
        }
    }
}

const TIME_SCALE: f32 = 0.2;
const TEXTURE_PAN_SCALE: f32 = 0.00004;

/// Wave phase time for a clock reading in milliseconds.
pub fn wave_time(elapsed_ms: f32, speed: f32) -> f32 {
    speed * TIME_SCALE * elapsed_ms
}

/// Horizontal texture offset for a clock reading in milliseconds.
pub fn texture_offset(elapsed_ms: f32, speed: f32) -> f32 {
    speed * TEXTURE_PAN_SCALE * elapsed_ms
}

/// Height offset of the plane at local `x`.
pub fn displacement(x: f32, time: f32, p: &WaveParams) -> f32 {
    ((time + x) * p.frequency).sin() * p.amplitude
}

/// Plane-local normal at `x`: `normalize(-a f cos(angle), 0, 1)`.
pub fn wave_normal(x: f32, time: f32, p: &WaveParams) -> [f32; 3] {
    let angle = (time + x) * p.frequency;
    let nx = -p.amplitude * p.frequency * angle.cos();
    let len = (nx * nx + 1.0).sqrt();
    [nx / len, 0.0, 1.0 / len]
}
