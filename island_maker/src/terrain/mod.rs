use bevy::prelude::*;
use terrain_engine::TerrainState;

pub mod mesh;

use self::mesh::{build_terrain_mesh, TerrainMesh};
use crate::rendering::textures::SceneTextures;

pub struct TerrainPlugin;

impl Plugin for TerrainPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<IslandTerrain>()
            .add_systems(Startup, setup_terrain_materials)
            .add_systems(Update, rebuild_terrain);
    }
}

/// 当前地形状态, 面板修改参数后在下一帧重建
#[derive(Resource, Default)]
pub struct IslandTerrain {
    pub state: TerrainState,
}

/// 平直着色和平滑着色两套材质
#[derive(Resource)]
pub struct TerrainMaterials {
    pub flat: Handle<StandardMaterial>,
    pub smooth: Handle<StandardMaterial>,
}

fn setup_terrain_materials(
    mut commands: Commands,
    mut materials: ResMut<Assets<StandardMaterial>>,
    textures: Res<SceneTextures>,
) {
    let flat = materials.add(StandardMaterial {
        base_color: Color::WHITE,
        perceptual_roughness: 0.9,
        reflectance: 0.2,
        ..default()
    });
    let smooth = materials.add(StandardMaterial {
        base_color: Color::WHITE,
        normal_map_texture: Some(textures.sand_normals.clone()),
        perceptual_roughness: 0.7,
        emissive: Color::rgb(0.1, 0.1, 0.1),
        ..default()
    });
    commands.insert_resource(TerrainMaterials { flat, smooth });
}

fn rebuild_terrain(
    mut commands: Commands,
    mut terrain: ResMut<IslandTerrain>,
    mut meshes: ResMut<Assets<Mesh>>,
    materials: Option<Res<TerrainMaterials>>,
    existing: Query<Entity, With<TerrainMesh>>,
    mut last_warning: Local<Option<String>>,
) {
    let Some(materials) = materials else {
        return;
    };

    if terrain.state.is_stale() {
        if let Err(e) = terrain.state.rebuild() {
            let message = e.to_string();
            if last_warning.as_deref() != Some(message.as_str()) {
                warn!("Terrain rebuild rejected, keeping previous terrain: {message}");
                *last_warning = Some(message);
            }
            return;
        }
        *last_warning = None;
    }

    let Some(surface) = terrain.state.current_mut() else {
        return;
    };
    if !surface.take_dirty() {
        return;
    }

    let mesh = build_terrain_mesh(surface);
    let generation = surface.generation();
    let material = if surface.flat_shading() {
        materials.flat.clone()
    } else {
        materials.smooth.clone()
    };
    info!(
        "Terrain rebuilt: {} vertices, generation {}",
        surface.vertex_count(),
        generation
    );

    // 整体替换旧地形
    for entity in &existing {
        commands.entity(entity).despawn_recursive();
    }
    commands.spawn((
        PbrBundle {
            mesh: meshes.add(mesh),
            material,
            ..default()
        },
        TerrainMesh { generation },
    ));
}
