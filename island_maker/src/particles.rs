use bevy::prelude::*;
use bevy::render::mesh::PrimitiveTopology;
use rand::Rng;
use serde::{Deserialize, Serialize};

pub struct ParticlesPlugin;

impl Plugin for ParticlesPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ParticleSettings>()
            .add_systems(Startup, spawn_particles)
            .add_systems(Update, rotate_particles);
    }
}

const PARTICLE_COUNT: usize = 9000;
const PARTICLE_CUBE: f32 = 10_000.0;

#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticleSettings {
    /// 每秒绕 Y 轴旋转的弧度
    pub speed: f32,
}

impl Default for ParticleSettings {
    fn default() -> Self {
        Self { speed: 0.01 }
    }
}

#[derive(Component)]
pub struct ParticleField;

/// 在以原点为中心、边长 `size` 的立方体内均匀撒 `count` 个点
pub fn scatter_points(count: usize, size: f32, rng: &mut impl Rng) -> Vec<[f32; 3]> {
    let half = size * 0.5;
    (0..count)
        .map(|_| {
            [
                rng.gen_range(-half..half),
                rng.gen_range(-half..half),
                rng.gen_range(-half..half),
            ]
        })
        .collect()
}

fn spawn_particles(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let points = scatter_points(PARTICLE_COUNT, PARTICLE_CUBE, &mut rand::thread_rng());
    let mut mesh = Mesh::new(PrimitiveTopology::PointList);
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, points);

    commands.spawn((
        PbrBundle {
            mesh: meshes.add(mesh),
            material: materials.add(StandardMaterial {
                base_color: Color::WHITE,
                unlit: true,
                alpha_mode: AlphaMode::Add,
                ..default()
            }),
            ..default()
        },
        ParticleField,
    ));
}

fn rotate_particles(
    time: Res<Time>,
    settings: Res<ParticleSettings>,
    mut fields: Query<&mut Transform, With<ParticleField>>,
) {
    let angle = settings.speed * time.delta_seconds();
    for mut transform in &mut fields {
        transform.rotate_y(angle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn points_fill_the_cube() {
        let points = scatter_points(PARTICLE_COUNT, PARTICLE_CUBE, &mut StdRng::seed_from_u64(7));
        assert_eq!(points.len(), 9000);
        for p in &points {
            assert!(p.iter().all(|c| (-5000.0..5000.0).contains(c)));
        }
        // 大致居中
        let mean_x = points.iter().map(|p| p[0] as f64).sum::<f64>() / points.len() as f64;
        assert!(mean_x.abs() < 300.0);
    }

    #[test]
    fn scatter_is_seeded() {
        let a = scatter_points(10, 100.0, &mut StdRng::seed_from_u64(1));
        let b = scatter_points(10, 100.0, &mut StdRng::seed_from_u64(1));
        assert_eq!(a, b);
    }
}
