use std::path::{Path, PathBuf};

use anyhow::Context;
use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// `assets/ui_strings.json` 的路径, 与 bevy 查找 assets 目录的方式一致
pub fn ui_strings_path() -> PathBuf {
    std::env::var_os("CARGO_MANIFEST_DIR")
        .map(PathBuf::from)
        .unwrap_or_default()
        .join("assets")
        .join("ui_strings.json")
}

/// 面板上的所有文字
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PanelStrings {
    pub window_title: String,
    pub folders: FolderStrings,
    pub rendering: RenderingStrings,
    pub scene: SceneStrings,
    pub terrain: TerrainStrings,
    pub water: WaterStrings,
    pub lighting: LightingStrings,
    pub particles: ParticleStrings,
    pub creatures: CreatureStrings,
    pub status: StatusStrings,
    pub restore_defaults: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FolderStrings {
    pub rendering: String,
    pub scene: String,
    pub terrain: String,
    pub water: String,
    pub lighting: String,
    pub particles: String,
    pub creatures: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RenderingStrings {
    pub msaa: String,
    pub off: String,
    pub shadows: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SceneStrings {
    pub scale: String,
    pub water_length: String,
    pub water_width: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TerrainStrings {
    pub peak: String,
    pub seed: String,
    pub smoothing: String,
    pub frequency: String,
    pub terrace: String,
    pub flat_shading: String,
    pub noise: String,
    pub bands: String,
    pub band_width: String,
    pub add_band: String,
    pub remove_band: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WaterStrings {
    pub frequency: String,
    pub amplitude: String,
    pub speed: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LightingStrings {
    pub sun_x: String,
    pub sun_y: String,
    pub sun_z: String,
    pub intensity: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ParticleStrings {
    pub speed: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CreatureStrings {
    pub show_prefix: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StatusStrings {
    pub fps: String,
    pub generation: String,
    pub rejected: String,
}

impl Default for PanelStrings {
    fn default() -> Self {
        Self {
            window_title: "Island Maker".to_string(),
            folders: FolderStrings::default(),
            rendering: RenderingStrings::default(),
            scene: SceneStrings::default(),
            terrain: TerrainStrings::default(),
            water: WaterStrings::default(),
            lighting: LightingStrings::default(),
            particles: ParticleStrings::default(),
            creatures: CreatureStrings::default(),
            status: StatusStrings::default(),
            restore_defaults: "Restore defaults".to_string(),
        }
    }
}

impl Default for FolderStrings {
    fn default() -> Self {
        Self {
            rendering: "Rendering".to_string(),
            scene: "Scene".to_string(),
            terrain: "Terrain".to_string(),
            water: "Water".to_string(),
            lighting: "Lighting".to_string(),
            particles: "Particles".to_string(),
            creatures: "Creatures".to_string(),
        }
    }
}

impl Default for RenderingStrings {
    fn default() -> Self {
        Self {
            msaa: "MSAA".to_string(),
            off: "Off".to_string(),
            shadows: "Shadows".to_string(),
        }
    }
}

impl Default for SceneStrings {
    fn default() -> Self {
        Self {
            scale: "World scale".to_string(),
            water_length: "Water length".to_string(),
            water_width: "Water width".to_string(),
        }
    }
}

impl Default for TerrainStrings {
    fn default() -> Self {
        Self {
            peak: "Hill peak".to_string(),
            seed: "Random seed".to_string(),
            smoothing: "Smoothing".to_string(),
            frequency: "Frequency".to_string(),
            terrace: "Terrace".to_string(),
            flat_shading: "Flat shading".to_string(),
            noise: "Noise".to_string(),
            bands: "Colour bands".to_string(),
            band_width: "width".to_string(),
            add_band: "Add band".to_string(),
            remove_band: "Remove".to_string(),
        }
    }
}

impl Default for WaterStrings {
    fn default() -> Self {
        Self {
            frequency: "Frequency".to_string(),
            amplitude: "Amplitude".to_string(),
            speed: "Speed".to_string(),
        }
    }
}

impl Default for LightingStrings {
    fn default() -> Self {
        Self {
            sun_x: "Sun X".to_string(),
            sun_y: "Sun Y".to_string(),
            sun_z: "Sun Z".to_string(),
            intensity: "Sun intensity".to_string(),
        }
    }
}

impl Default for ParticleStrings {
    fn default() -> Self {
        Self { speed: "Particle speed".to_string() }
    }
}

impl Default for CreatureStrings {
    fn default() -> Self {
        Self { show_prefix: "Show".to_string() }
    }
}

impl Default for StatusStrings {
    fn default() -> Self {
        Self {
            fps: "FPS".to_string(),
            generation: "Terrain generation".to_string(),
            rejected: "Rejected".to_string(),
        }
    }
}

impl PanelStrings {
    pub fn load_from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let strings = serde_json::from_str(&content)
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(strings)
    }
}

#[derive(Resource, Debug, Clone)]
pub struct PanelStringsRes(pub PanelStrings);

impl Default for PanelStringsRes {
    fn default() -> Self {
        match PanelStrings::load_from_file(ui_strings_path()) {
            Ok(strings) => Self(strings),
            Err(e) => {
                warn!("Failed to load panel strings: {e:#}, using defaults");
                Self(PanelStrings::default())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let json = r#"{ "window_title": "Inselbauer", "terrain": { "peak": "Gipfel" } }"#;
        let s: PanelStrings = serde_json::from_str(json).unwrap();
        assert_eq!(s.window_title, "Inselbauer");
        assert_eq!(s.terrain.peak, "Gipfel");
        assert_eq!(s.terrain.seed, "Random seed");
        assert_eq!(s.folders.water, "Water");
    }

    #[test]
    fn shipped_strings_parse() {
        let s = PanelStrings::load_from_file(ui_strings_path()).unwrap();
        assert_eq!(s.folders.creatures, "Creatures");
        assert_eq!(s.restore_defaults, "Restore defaults");
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = PanelStrings::load_from_file("does/not/exist.json").unwrap_err();
        assert!(format!("{err:#}").contains("does/not/exist.json"));
    }
}
