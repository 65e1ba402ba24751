use bevy::prelude::*;
use bevy::diagnostic::{FrameTimeDiagnosticsPlugin, LogDiagnosticsPlugin};
use bevy::render::texture::{ImageAddressMode, ImagePlugin, ImageSamplerDescriptor};

mod controller;
mod creatures;
mod particles;
mod persistence;
mod rendering;
mod terrain;
mod ui;
mod ui_strings;
mod water;

use crate::controller::{ControllerPlugin, OrbitCamera};

/// 初始视点
const INITIAL_EYE: Vec3 = Vec3::new(0.0, 2000.0, 5000.0);

fn setup_camera(mut commands: Commands) {
    let orbit = OrbitCamera::from_eye(INITIAL_EYE, Vec3::ZERO);
    info!("Camera starting at {:?}, orbit radius {:.0}", INITIAL_EYE, orbit.radius);

    commands.spawn((
        Camera3dBundle {
            transform: orbit.transform(),
            projection: Projection::Perspective(PerspectiveProjection {
                fov: 45f32.to_radians(),
                near: 0.1,
                far: 100_000.0,
                ..default()
            }),
            ..default()
        },
        orbit,
    ));
}

fn main() {
    App::new()
        .insert_resource(ClearColor(Color::BLACK))
        .insert_resource(Msaa::Sample4)
        .add_plugins(DefaultPlugins
            .set(WindowPlugin {
                primary_window: Some(Window {
                    title: "Island Maker".into(),
                    resolution: (1280.0, 720.0).into(),
                    resizable: true,
                    ..default()
                }),
                ..default()
            })
            // 地形法线贴图和海水纹理都需要平铺
            .set(ImagePlugin {
                default_sampler: ImageSamplerDescriptor {
                    address_mode_u: ImageAddressMode::Repeat,
                    address_mode_v: ImageAddressMode::Repeat,
                    ..ImageSamplerDescriptor::linear()
                },
            })
        )
        .add_plugins(LogDiagnosticsPlugin::default())
        .add_plugins(FrameTimeDiagnosticsPlugin::default())
        .add_plugins(persistence::PersistencePlugin)
        .add_plugins(rendering::RenderingPlugin)
        .add_plugins(terrain::TerrainPlugin)
        .add_plugins(water::WaterPlugin)
        .add_plugins(particles::ParticlesPlugin)
        .add_plugins(creatures::CreaturesPlugin)
        .add_plugins(ControllerPlugin)
        .add_plugins(ui::UiPlugin)
        .add_systems(Startup, setup_camera)
        .run();
}
