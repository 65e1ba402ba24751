use bevy::prelude::*;
use bevy::render::render_resource::Face;
use rand::Rng;
use serde::{Deserialize, Serialize};

pub mod textures;

use textures::{load_scene_textures, SceneTextures};

pub struct RenderingPlugin;

impl Plugin for RenderingPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<LightingSettings>()
            .insert_resource(AmbientLight {
                color: Color::hsl(216.0, 0.75, 0.5),
                brightness: 0.0,
            })
            .add_systems(PreStartup, load_scene_textures)
            .add_systems(Startup, setup_sky_and_sun)
            .add_systems(Update, (update_sun, spin_clouds));
    }
}

const SKY_RADIUS: f32 = 8000.0;
const SUN_RADIUS: f32 = 100.0;
const CLOUD_COUNT: usize = 8;
const CLOUD_SIZE: f32 = 500.0;
const CLOUD_TILT: (f32, f32) = (1.16, -0.12);
/// 每帧旋转量
const CLOUD_SPIN_PER_FRAME: f32 = -0.002;
const HEMISPHERE_PER_HEIGHT: f32 = 0.0007;
/// 半球光强度映射到 bevy 环境光亮度
const AMBIENT_SCALE: f32 = 0.25;
/// 面板强度 1.0 对应的照度 (lux)
const ILLUMINANCE_PER_UNIT: f32 = 20_000.0;

/// 太阳位置和强度
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightingSettings {
    pub sun_position: [f32; 3],
    pub sun_intensity: f32,
}

impl Default for LightingSettings {
    fn default() -> Self {
        Self {
            sun_position: [2000.0, 2223.0, 300.0],
            sun_intensity: 0.5,
        }
    }
}

impl LightingSettings {
    pub fn sun(&self) -> Vec3 {
        Vec3::from_array(self.sun_position)
    }
}

#[derive(Component)]
pub struct Sun;

#[derive(Component)]
pub struct Sky;

#[derive(Component)]
pub struct Cloud {
    pub spin: f32,
}

/// 按太阳高度计算半球光强度; 太阳在地平线以下时返回 None, 保持原值
pub fn hemisphere_intensity(sun_y: f32) -> Option<f32> {
    (sun_y > 0.0).then(|| sun_y * HEMISPHERE_PER_HEIGHT)
}

/// 位于太阳处、朝向原点的光源变换
pub fn sun_light_transform(sun: Vec3) -> Transform {
    Transform::from_translation(sun).looking_at(Vec3::ZERO, Vec3::Y)
}

/// 岛屿上空一排云的位置和随机初始旋转
pub fn cloud_layout(rng: &mut impl Rng) -> Vec<(Vec3, f32)> {
    (0..CLOUD_COUNT)
        .map(|p| {
            let position = Vec3::new(-1000.0 + p as f32 * 300.0, 1500.0, rng.gen_range(-400.0..1300.0));
            (position, rng.gen_range(0.0..std::f32::consts::TAU))
        })
        .collect()
}

fn cloud_rotation(spin: f32) -> Quat {
    Quat::from_euler(EulerRot::XYZ, CLOUD_TILT.0, CLOUD_TILT.1, spin)
}

fn setup_sky_and_sun(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    textures: Res<SceneTextures>,
    lighting: Res<LightingSettings>,
) {
    // 天空球, 从内部观看
    commands.spawn((
        PbrBundle {
            mesh: meshes.add(Mesh::from(shape::UVSphere { radius: SKY_RADIUS, sectors: 32, stacks: 32 })),
            material: materials.add(StandardMaterial {
                base_color_texture: Some(textures.sky.clone()),
                unlit: true,
                cull_mode: Some(Face::Front),
                ..default()
            }),
            ..default()
        },
        Sky,
    ));

    // 太阳
    let sun = lighting.sun();
    commands.spawn((
        PbrBundle {
            mesh: meshes.add(Mesh::from(shape::UVSphere { radius: SUN_RADIUS, sectors: 30, stacks: 30 })),
            material: materials.add(StandardMaterial {
                base_color: Color::rgb_u8(0xf9, 0xd7, 0x1c),
                unlit: true,
                ..default()
            }),
            transform: Transform::from_translation(sun),
            ..default()
        },
        Sun,
    ));

    commands.spawn(DirectionalLightBundle {
        directional_light: DirectionalLight {
            illuminance: lighting.sun_intensity * ILLUMINANCE_PER_UNIT,
            shadows_enabled: true,
            ..default()
        },
        transform: sun_light_transform(sun),
        ..default()
    });

    // 云
    let cloud_mesh = meshes.add(Mesh::from(shape::Quad::new(Vec2::splat(CLOUD_SIZE))));
    let cloud_material = materials.add(StandardMaterial {
        base_color: Color::rgba(1.0, 1.0, 1.0, 0.75),
        base_color_texture: Some(textures.cloud.clone()),
        alpha_mode: AlphaMode::Blend,
        double_sided: true,
        cull_mode: None,
        ..default()
    });
    for (position, spin) in cloud_layout(&mut rand::thread_rng()) {
        commands.spawn((
            PbrBundle {
                mesh: cloud_mesh.clone(),
                material: cloud_material.clone(),
                transform: Transform::from_translation(position).with_rotation(cloud_rotation(spin)),
                ..default()
            },
            Cloud { spin },
        ));
    }
}

fn update_sun(
    lighting: Res<LightingSettings>,
    mut ambient: ResMut<AmbientLight>,
    mut suns: Query<&mut Transform, With<Sun>>,
    mut lights: Query<(&mut DirectionalLight, &mut Transform), Without<Sun>>,
) {
    if !lighting.is_changed() {
        return;
    }

    let sun = lighting.sun();
    for mut transform in &mut suns {
        transform.translation = sun;
    }
    for (mut light, mut transform) in &mut lights {
        light.illuminance = lighting.sun_intensity * ILLUMINANCE_PER_UNIT;
        *transform = sun_light_transform(sun);
    }
    if let Some(intensity) = hemisphere_intensity(sun.y) {
        ambient.brightness = intensity * AMBIENT_SCALE;
    }
}

fn spin_clouds(mut clouds: Query<(&mut Cloud, &mut Transform)>) {
    for (mut cloud, mut transform) in &mut clouds {
        cloud.spin += CLOUD_SPIN_PER_FRAME;
        transform.rotation = cloud_rotation(cloud.spin);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn hemisphere_follows_sun_height() {
        let y = LightingSettings::default().sun_position[1];
        assert!((hemisphere_intensity(y).unwrap() - 1.5561).abs() < 1e-4);
        assert_eq!(hemisphere_intensity(0.0), None);
        assert_eq!(hemisphere_intensity(-10.0), None);
    }

    #[test]
    fn light_points_at_origin() {
        let sun = Vec3::new(2000.0, 2223.0, 300.0);
        let t = sun_light_transform(sun);
        let forward = t.forward();
        assert!(forward.dot(-sun.normalize()) > 0.9999);
    }

    #[test]
    fn clouds_form_a_row_above_the_island() {
        let layout = cloud_layout(&mut StdRng::seed_from_u64(1));
        assert_eq!(layout.len(), CLOUD_COUNT);
        for (p, (pos, spin)) in layout.iter().enumerate() {
            assert_eq!(pos.x, -1000.0 + p as f32 * 300.0);
            assert_eq!(pos.y, 1500.0);
            assert!((-400.0..1300.0).contains(&pos.z));
            assert!((0.0..std::f32::consts::TAU).contains(spin));
        }
    }
}
