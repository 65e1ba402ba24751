use bevy::prelude::*;
use bevy::diagnostic::{DiagnosticsStore, FrameTimeDiagnosticsPlugin};
use bevy::render::view::Msaa;
use bevy_egui::{egui, EguiContexts, EguiPlugin};
use terrain_engine::{
    ColorBand, NoiseKind, TerrainParameters, TerrainState, WorldDimensions, OCTAVE_RANGE, PEAK_RANGE,
    SCALE_RANGE, SMOOTHING_RANGE, TERRACE_RANGE,
};

use crate::creatures::ModelRegistry;
use crate::particles::ParticleSettings;
use crate::persistence::SettingsChanged;
use crate::rendering::LightingSettings;
use crate::terrain::mesh::TerrainMesh;
use crate::terrain::IslandTerrain;
use crate::ui_strings::{PanelStrings, PanelStringsRes};
use crate::water::WaterSettings;

pub struct UiPlugin;

impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(EguiPlugin)
            .init_resource::<PanelStringsRes>()
            .init_resource::<RenderSettings>()
            .add_systems(Update, (apply_render_settings, island_panel_ui));
    }
}

/// 渲染设置
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct RenderSettings {
    pub msaa_samples: u32,
    pub shadows_enabled: bool,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            msaa_samples: 4,
            shadows_enabled: true,
        }
    }
}

fn msaa_for(samples: u32) -> Msaa {
    match samples {
        1 => Msaa::Off,
        2 => Msaa::Sample2,
        8 => Msaa::Sample8,
        _ => Msaa::Sample4,
    }
}

fn apply_render_settings(
    settings: Res<RenderSettings>,
    mut msaa: ResMut<Msaa>,
    mut lights: Query<&mut DirectionalLight>,
) {
    if !settings.is_changed() {
        return;
    }
    msaa.set_if_neq(msaa_for(settings.msaa_samples));
    for mut light in &mut lights {
        light.shadows_enabled = settings.shadows_enabled;
    }
}

/// 地形面板的编辑副本
struct TerrainDraft {
    params: TerrainParameters,
    bands: Vec<ColorBand>,
    dims: WorldDimensions,
}

impl TerrainDraft {
    fn from_state(state: &TerrainState) -> Self {
        Self {
            params: state.params().clone(),
            bands: state.bands().bands().to_vec(),
            dims: *state.dimensions(),
        }
    }

    /// 逐组提交修改, 返回是否有任意一组被接受
    fn commit(self, state: &mut TerrainState) -> bool {
        let mut accepted = false;
        for result in [
            state.set_params(self.params),
            state.set_bands(self.bands),
            state.set_dimensions(self.dims),
        ] {
            match result {
                Ok(()) => accepted = true,
                Err(e) => warn!("Terrain change rejected: {e}"),
            }
        }
        accepted
    }
}

fn rendering_section(ui: &mut egui::Ui, s: &PanelStrings, render: &mut RenderSettings) {
    ui.horizontal(|ui| {
        ui.label(s.rendering.msaa.as_str());
        egui::ComboBox::from_id_source("msaa")
            .selected_text(if render.msaa_samples == 1 {
                s.rendering.off.clone()
            } else {
                format!("{}x", render.msaa_samples)
            })
            .show_ui(ui, |ui| {
                for (samples, label) in [(1, s.rendering.off.as_str()), (2, "2x"), (4, "4x"), (8, "8x")] {
                    ui.selectable_value(&mut render.msaa_samples, samples, label);
                }
            });
    });
    ui.checkbox(&mut render.shadows_enabled, s.rendering.shadows.as_str());
}

/// 返回世界缩放是否改变
fn scene_section(ui: &mut egui::Ui, s: &PanelStrings, draft: &mut TerrainDraft, water: &mut WaterSettings) -> bool {
    let changed = ui.add(egui::Slider::new(&mut draft.dims.scale, SCALE_RANGE).text(s.scene.scale.as_str())).changed();
    ui.add(egui::Slider::new(&mut water.len, 100.0..=20_000.0).text(s.scene.water_length.as_str()));
    ui.add(egui::Slider::new(&mut water.width, 100.0..=20_000.0).text(s.scene.water_width.as_str()));
    changed
}

fn terrain_section(ui: &mut egui::Ui, s: &PanelStrings, draft: &mut TerrainDraft) -> bool {
    let t = &s.terrain;
    let p = &mut draft.params;
    let mut changed = false;

    changed |= ui.add(egui::Slider::new(&mut p.peak, PEAK_RANGE).text(t.peak.as_str())).changed();
    ui.horizontal(|ui| {
        ui.label(t.seed.as_str());
        changed |= ui.add(egui::DragValue::new(&mut p.seed)).changed();
    });
    changed |= ui.add(egui::Slider::new(&mut p.smoothing, SMOOTHING_RANGE).text(t.smoothing.as_str())).changed();
    changed |= ui.add(egui::Slider::new(&mut p.frequency, OCTAVE_RANGE).text(t.frequency.as_str())).changed();
    changed |= ui.add(egui::Slider::new(&mut p.terrace, TERRACE_RANGE).text(t.terrace.as_str())).changed();
    changed |= ui.checkbox(&mut p.flat_shading, t.flat_shading.as_str()).changed();
    ui.horizontal(|ui| {
        ui.label(t.noise.as_str());
        egui::ComboBox::from_id_source("noise_kind")
            .selected_text(p.noise_kind.label())
            .show_ui(ui, |ui| {
                for kind in NoiseKind::ALL {
                    changed |= ui.selectable_value(&mut p.noise_kind, kind, kind.label()).clicked();
                }
            });
    });

    ui.separator();
    ui.label(t.bands.as_str());
    let can_remove = draft.bands.len() > 1;
    let mut remove = None;
    for (i, band) in draft.bands.iter_mut().enumerate() {
        ui.push_id(i, |ui| {
            ui.horizontal(|ui| {
                changed |= ui.color_edit_button_srgb(&mut band.rgb).changed();
                ui.label(t.band_width.as_str());
                changed |= ui
                    .add(egui::DragValue::new(&mut band.width).clamp_range(1.0..=2000.0).speed(1.0))
                    .changed();
                if ui.add_enabled(can_remove, egui::Button::new(t.remove_band.as_str())).clicked() {
                    remove = Some(i);
                }
            });
        });
    }
    if let Some(i) = remove {
        draft.bands.remove(i);
        changed = true;
    }
    if ui.button(t.add_band.as_str()).clicked() {
        draft.bands.push(ColorBand::new(255, 255, 255, 100.0));
        changed = true;
    }

    changed
}

fn water_section(ui: &mut egui::Ui, s: &PanelStrings, water: &mut WaterSettings) {
    let w = &mut water.wave;
    ui.add(egui::Slider::new(&mut w.frequency, 0.0..=0.2).text(s.water.frequency.as_str()));
    ui.add(egui::Slider::new(&mut w.amplitude, 0.0..=10.0).text(s.water.amplitude.as_str()));
    ui.add(egui::Slider::new(&mut w.speed, 0.0..=5.0).text(s.water.speed.as_str()));
}

fn lighting_section(ui: &mut egui::Ui, s: &PanelStrings, lighting: &mut LightingSettings) {
    let [x, y, z] = &mut lighting.sun_position;
    ui.add(egui::Slider::new(x, -3000.0..=3000.0).text(s.lighting.sun_x.as_str()));
    ui.add(egui::Slider::new(y, 0.0..=3000.0).text(s.lighting.sun_y.as_str()));
    ui.add(egui::Slider::new(z, -3000.0..=3000.0).text(s.lighting.sun_z.as_str()));
    ui.add(egui::Slider::new(&mut lighting.sun_intensity, 0.0..=5.0).text(s.lighting.intensity.as_str()));
}

fn folder(ui: &mut egui::Ui, title: &str, add_contents: impl FnOnce(&mut egui::Ui)) {
    egui::CollapsingHeader::new(title)
        .default_open(true)
        .show(ui, add_contents);
}

fn island_panel_ui(
    mut contexts: EguiContexts,
    strings: Res<PanelStringsRes>,
    diagnostics: Res<DiagnosticsStore>,
    mut render: ResMut<RenderSettings>,
    mut terrain: ResMut<IslandTerrain>,
    mut water: ResMut<WaterSettings>,
    mut lighting: ResMut<LightingSettings>,
    mut particles: ResMut<ParticleSettings>,
    mut models: ResMut<ModelRegistry>,
    shown: Query<&TerrainMesh>,
    mut settings_changed: EventWriter<SettingsChanged>,
) {
    let s = &strings.0;
    let fps = diagnostics
        .get(FrameTimeDiagnosticsPlugin::FPS)
        .and_then(|d| d.smoothed())
        .unwrap_or(0.0);

    let mut render_draft = render.clone();
    let mut terrain_draft = TerrainDraft::from_state(&terrain.state);
    let mut water_draft = water.clone();
    let mut lighting_draft = lighting.clone();
    let mut particle_draft = particles.clone();
    let mut models_draft = models.clone();

    let mut terrain_changed = false;
    let mut restore = false;

    let ctx = contexts.ctx_mut();
    egui::Window::new(s.window_title.as_str())
        .default_width(320.0)
        .vscroll(true)
        .show(ctx, |ui| {
            folder(ui, s.folders.rendering.as_str(), |ui| {
                rendering_section(ui, s, &mut render_draft);
            });
            folder(ui, s.folders.scene.as_str(), |ui| {
                terrain_changed |= scene_section(ui, s, &mut terrain_draft, &mut water_draft);
            });
            folder(ui, s.folders.terrain.as_str(), |ui| {
                terrain_changed |= terrain_section(ui, s, &mut terrain_draft);
            });
            folder(ui, s.folders.water.as_str(), |ui| {
                water_section(ui, s, &mut water_draft);
            });
            folder(ui, s.folders.lighting.as_str(), |ui| {
                lighting_section(ui, s, &mut lighting_draft);
            });
            folder(ui, s.folders.particles.as_str(), |ui| {
                ui.add(egui::Slider::new(&mut particle_draft.speed, 0.0..=5.0).text(s.particles.speed.as_str()));
            });
            folder(ui, s.folders.creatures.as_str(), |ui| {
                for model in &mut models_draft.models {
                    ui.checkbox(&mut model.visible, format!("{} {}", s.creatures.show_prefix, model.name));
                }
            });

            ui.separator();
            ui.label(format!("{}: {:.1}", s.status.fps, fps));
            let displayed = shown.iter().map(|m| m.generation).max().unwrap_or(0);
            ui.label(format!("{}: {} / {}", s.status.generation, displayed, terrain.state.generation()));
            if let Some(error) = terrain.state.last_error() {
                ui.colored_label(egui::Color32::LIGHT_RED, format!("{}: {}", s.status.rejected, error));
            }
            restore = ui.button(s.restore_defaults.as_str()).clicked();
        });

    if restore {
        info!("Restoring default settings");
        terrain.state = TerrainState::default();
        *water = WaterSettings::default();
        *lighting = LightingSettings::default();
        *particles = ParticleSettings::default();
        *models = ModelRegistry::default();
        *render = RenderSettings::default();
        settings_changed.send(SettingsChanged);
        return;
    }

    if terrain_changed && terrain_draft.commit(&mut terrain.state) {
        settings_changed.send(SettingsChanged);
    }
    if water.set_if_neq(water_draft) {
        settings_changed.send(SettingsChanged);
    }
    render.set_if_neq(render_draft);
    lighting.set_if_neq(lighting_draft);
    particles.set_if_neq(particle_draft);
    models.set_if_neq(models_draft);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn msaa_choices_map_to_sample_counts() {
        assert_eq!(msaa_for(1), Msaa::Off);
        assert_eq!(msaa_for(2), Msaa::Sample2);
        assert_eq!(msaa_for(4), Msaa::Sample4);
        assert_eq!(msaa_for(8), Msaa::Sample8);
        assert_eq!(msaa_for(3), Msaa::Sample4);
    }

    #[test]
    fn draft_commit_keeps_valid_groups() {
        let mut state = TerrainState::default();
        let mut draft = TerrainDraft::from_state(&state);
        draft.params.peak = 700.0;
        draft.bands.clear();
        assert!(draft.commit(&mut state));
        assert_eq!(state.params().peak, 700.0);
        assert_eq!(state.bands().band_count(), 5);
        assert!(state.is_stale());
    }
}
