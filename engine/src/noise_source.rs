use fastnoise_lite::{FastNoiseLite, NoiseType};
use noise::{NoiseFn, Perlin};
use serde::{Deserialize, Serialize};

/// A seeded 2D noise function. Implementations must be pure: the same seed and
/// coordinates always produce the same value, and output stays within [-1, 1].
pub trait NoiseSampler: Send + Sync {
    fn sample(&self, x: f64, y: f64) -> f64;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoiseKind {
    #[default]
    Perlin,
    OpenSimplex,
}

impl NoiseKind {
    pub const ALL: [NoiseKind; 2] = [NoiseKind::Perlin, NoiseKind::OpenSimplex];

    pub fn label(&self) -> &'static str {
        match self {
            NoiseKind::Perlin => "Perlin",
            NoiseKind::OpenSimplex => "OpenSimplex2",
        }
    }
}

enum Backend {
    Perlin(Perlin),
    OpenSimplex(FastNoiseLite),
}

/// Gradient noise with a permutation table fixed at construction.
pub struct NoiseSource {
    seed: u32,
    kind: NoiseKind,
    backend: Backend,
}

impl NoiseSource {
    pub fn new(seed: u32, kind: NoiseKind) -> Self {
        let backend = match kind {
            NoiseKind::Perlin => Backend::Perlin(Perlin::new(seed)),
            NoiseKind::OpenSimplex => {
                // fastnoise-lite takes an i32 seed; reinterpret the bits so every u32 maps uniquely.
                let mut f = FastNoiseLite::with_seed(seed as i32);
                f.set_noise_type(Some(NoiseType::OpenSimplex2));
                f.set_frequency(Some(1.0));
                Backend::OpenSimplex(f)
            }
        };
        Self { seed, kind, backend }
    }

    pub fn perlin(seed: u32) -> Self {
        Self::new(seed, NoiseKind::Perlin)
    }
}

impl NoiseSampler for NoiseSource {
    fn sample(&self, x: f64, y: f64) -> f64 {
        match &self.backend {
            Backend::Perlin(p) => p.get([x, y]),
            Backend::OpenSimplex(f) => f64::from(f.get_noise_2d(x as f32, y as f32)),
        }
    }
}

impl std::fmt::Debug for NoiseSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NoiseSource")
            .field("seed", &self.seed)
            .field("kind", &self.kind)
            .finish()
    }
}
