use bevy::prelude::*;
use bevy::render::texture::ImageLoaderSettings;

/// 场景用到的全部纹理句柄
#[derive(Resource, Clone)]
pub struct SceneTextures {
    pub sky: Handle<Image>,
    pub cloud: Handle<Image>,
    /// 平滑地形的法线贴图
    pub sand_normals: Handle<Image>,
    pub seawater: Handle<Image>,
    pub seawater_normals: Handle<Image>,
}

pub const SKY_TEXTURE: &str = "textures/sky.png";
pub const CLOUD_TEXTURE: &str = "textures/cloud.png";
pub const SAND_NORMALS: &str = "textures/sand2.jpg";
pub const SEAWATER_TEXTURE: &str = "textures/seawater.jpg";
pub const SEAWATER_NORMALS: &str = "textures/seawater_normals.jpg";

/// 法线贴图按线性空间读取
fn load_normal_map(asset_server: &AssetServer, path: &'static str) -> Handle<Image> {
    asset_server.load_with_settings(path, |settings: &mut ImageLoaderSettings| {
        settings.is_srgb = false;
    })
}

pub fn load_scene_textures(mut commands: Commands, asset_server: Res<AssetServer>) {
    info!("Loading scene textures...");

    commands.insert_resource(SceneTextures {
        sky: asset_server.load(SKY_TEXTURE),
        cloud: asset_server.load(CLOUD_TEXTURE),
        sand_normals: load_normal_map(&asset_server, SAND_NORMALS),
        seawater: asset_server.load(SEAWATER_TEXTURE),
        seawater_normals: load_normal_map(&asset_server, SEAWATER_NORMALS),
    });
}
