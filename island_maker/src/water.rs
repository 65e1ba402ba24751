//! 海面: 每帧在 CPU 上按 `terrain_engine::water` 更新高度、法线和纹理偏移

use bevy::prelude::*;
use bevy::render::mesh::{Indices, PrimitiveTopology, VertexAttributeValues};
use serde::{Deserialize, Serialize};
use terrain_engine::water::{displacement, texture_offset, wave_normal, wave_time};
use terrain_engine::WaveParams;

use crate::rendering::textures::SceneTextures;

pub struct WaterPlugin;

impl Plugin for WaterPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<WaterSettings>()
            .add_systems(Startup, spawn_water)
            .add_systems(Update, (respawn_resized_water, animate_water).chain());
    }
}

const WATER_SEGMENTS: u32 = 100;
const TEXTURE_TILES: f32 = 2.0;

#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaterSettings {
    pub len: f32,
    pub width: f32,
    pub wave: WaveParams,
}

impl Default for WaterSettings {
    fn default() -> Self {
        Self {
            len: 4000.0,
            width: 4000.0,
            wave: WaveParams::default(),
        }
    }
}

#[derive(Component)]
pub struct WaterSurface {
    /// 每个顶点的平面局部坐标 `(x, y)`
    base: Vec<[f32; 2]>,
    base_uvs: Vec<[f32; 2]>,
    size: (f32, f32),
}

#[derive(Resource)]
struct WaterMaterial(Handle<StandardMaterial>);

/// `len x width` 的平面, 分成 `segments x segments` 格, 铺在世界 XZ 平面上
fn water_plane(len: f32, width: f32, segments: u32) -> (Mesh, WaterSurface) {
    let cols = segments as usize + 1;
    let mut base = Vec::with_capacity(cols * cols);
    let mut base_uvs = Vec::with_capacity(cols * cols);
    for row in 0..cols {
        for col in 0..cols {
            let u = col as f32 / segments as f32;
            let v = row as f32 / segments as f32;
            base.push([u * len - len * 0.5, width * 0.5 - v * width]);
            base_uvs.push([u * TEXTURE_TILES, v * TEXTURE_TILES]);
        }
    }

    let mut indices = Vec::with_capacity(segments as usize * segments as usize * 6);
    for row in 0..segments as usize {
        for col in 0..segments as usize {
            let a = (row * cols + col) as u32;
            let b = a + 1;
            let c = a + cols as u32;
            let d = c + 1;
            indices.extend_from_slice(&[a, c, b, b, c, d]);
        }
    }

    let positions: Vec<[f32; 3]> = base.iter().map(|&[x, y]| [x, 0.0, -y]).collect();
    let normals = vec![[0.0, 1.0, 0.0]; base.len()];

    let mut mesh = Mesh::new(PrimitiveTopology::TriangleList);
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, positions);
    mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, normals);
    mesh.insert_attribute(Mesh::ATTRIBUTE_UV_0, base_uvs.clone());
    mesh.set_indices(Some(Indices::U32(indices)));
    if let Err(e) = mesh.generate_tangents() {
        warn!("Water tangents unavailable: {e}");
    }

    (mesh, WaterSurface { base, base_uvs, size: (len, width) })
}

/// 平面局部坐标对应的世界空间顶点和法线
fn wave_vertex(x: f32, y: f32, time: f32, wave: &WaveParams) -> ([f32; 3], [f32; 3]) {
    let h = displacement(x, time, wave);
    let [nx, ny, nz] = wave_normal(x, time, wave);
    ([x, h, -y], [nx, nz, -ny])
}

fn spawn_water(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    textures: Res<SceneTextures>,
    settings: Res<WaterSettings>,
) {
    let material = materials.add(StandardMaterial {
        base_color: Color::rgba_u8(0x1f, 0x3a, 0x4d, 0xcc),
        base_color_texture: Some(textures.seawater.clone()),
        normal_map_texture: Some(textures.seawater_normals.clone()),
        perceptual_roughness: 0.05,
        reflectance: 0.9,
        alpha_mode: AlphaMode::Blend,
        ..default()
    });
    commands.insert_resource(WaterMaterial(material.clone()));

    let (mesh, surface) = water_plane(settings.len, settings.width, WATER_SEGMENTS);
    commands.spawn((
        PbrBundle {
            mesh: meshes.add(mesh),
            material,
            ..default()
        },
        surface,
    ));
}

fn respawn_resized_water(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    settings: Res<WaterSettings>,
    material: Option<Res<WaterMaterial>>,
    existing: Query<(Entity, &WaterSurface)>,
) {
    let Some(material) = material else {
        return;
    };
    let wanted = (settings.len, settings.width);
    let mut stale = existing.iter().filter(|(_, w)| w.size != wanted).peekable();
    if stale.peek().is_none() {
        return;
    }
    for (entity, _) in stale {
        commands.entity(entity).despawn_recursive();
    }

    info!("Water plane resized to {} x {}", settings.len, settings.width);
    let (mesh, surface) = water_plane(settings.len, settings.width, WATER_SEGMENTS);
    commands.spawn((
        PbrBundle {
            mesh: meshes.add(mesh),
            material: material.0.clone(),
            ..default()
        },
        surface,
    ));
}

fn animate_water(
    time: Res<Time>,
    settings: Res<WaterSettings>,
    mut meshes: ResMut<Assets<Mesh>>,
    water: Query<(&Handle<Mesh>, &WaterSurface)>,
) {
    let elapsed_ms = time.elapsed_seconds() * 1000.0;
    let wave = &settings.wave;
    let t = wave_time(elapsed_ms, wave.speed);
    let pan = texture_offset(elapsed_ms, wave.speed);

    for (handle, surface) in &water {
        let Some(mesh) = meshes.get_mut(handle) else {
            debug!("Water mesh still pending");
            continue;
        };

        let (positions, normals): (Vec<_>, Vec<_>) = surface
            .base
            .iter()
            .map(|&[x, y]| wave_vertex(x, y, t, wave))
            .unzip();
        let uvs: Vec<[f32; 2]> = surface.base_uvs.iter().map(|&[u, v]| [u + pan, v]).collect();

        mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, positions);
        mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, normals);
        if let Some(VertexAttributeValues::Float32x2(current)) = mesh.attribute_mut(Mesh::ATTRIBUTE_UV_0) {
            *current = uvs;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plane_covers_requested_extent() {
        let (mesh, surface) = water_plane(4000.0, 2000.0, 4);
        assert_eq!(mesh.count_vertices(), 25);
        assert_eq!(surface.base[0], [-2000.0, 1000.0]);
        assert_eq!(surface.base[24], [2000.0, -1000.0]);
        assert_eq!(surface.base_uvs[24], [TEXTURE_TILES, TEXTURE_TILES]);
        assert_eq!(mesh.indices().map(|i| i.len()), Some(4 * 4 * 6));
    }

    #[test]
    fn wave_vertex_maps_into_world_space() {
        let wave = WaveParams { frequency: 0.1, amplitude: 2.0, speed: 1.0 };
        let (p, n) = wave_vertex(5.0, 7.0, 3.0, &wave);
        assert_eq!(p[0], 5.0);
        assert_eq!(p[2], -7.0);
        assert!((p[1] - displacement(5.0, 3.0, &wave)).abs() < 1e-6);
        assert!(n[1] > 0.0);
        assert_eq!(n[2], 0.0);
    }

    #[test]
    fn calm_water_stays_flat() {
        let wave = WaveParams { amplitude: 0.0, ..Default::default() };
        let (p, n) = wave_vertex(-300.0, 12.0, 99.0, &wave);
        assert_eq!(p[1], 0.0);
        assert_eq!(n[1], 1.0);
    }
}
