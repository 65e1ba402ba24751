use bevy::prelude::*;

pub struct CreaturesPlugin;

impl Plugin for CreaturesPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ModelRegistry>()
            .add_systems(Startup, spawn_creatures)
            .add_systems(Update, (start_creature_animations, sync_creature_visibility));
    }
}

/// 一个可加载的 glTF 模型
#[derive(Debug, Clone, PartialEq)]
pub struct ModelEntry {
    pub name: String,
    /// 相对 assets 目录的 glTF 路径
    pub path: String,
    pub translation: Vec3,
    pub yaw: f32,
    pub scale: f32,
    pub visible: bool,
    pub animated: bool,
}

impl ModelEntry {
    pub fn transform(&self) -> Transform {
        Transform::from_translation(self.translation)
            .with_rotation(Quat::from_rotation_y(self.yaw))
            .with_scale(Vec3::splat(self.scale))
    }

    pub fn scene_path(&self) -> String {
        format!("{}#Scene0", self.path)
    }

    pub fn animation_path(&self) -> String {
        format!("{}#Animation0", self.path)
    }
}

#[derive(Resource, Debug, Clone, PartialEq)]
pub struct ModelRegistry {
    pub models: Vec<ModelEntry>,
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self {
            models: vec![ModelEntry {
                name: "dragon".to_string(),
                path: "models/dragon/scene.gltf".to_string(),
                translation: Vec3::new(-1500.0, 700.0, 0.0),
                yaw: 1.65,
                scale: 24.0,
                visible: true,
                animated: true,
            }],
        }
    }
}

impl ModelRegistry {
    pub fn get(&self, name: &str) -> Option<&ModelEntry> {
        self.models.iter().find(|m| m.name == name)
    }
}

#[derive(Component)]
pub struct Creature {
    pub name: String,
    animation: Option<Handle<AnimationClip>>,
}

fn visibility(visible: bool) -> Visibility {
    if visible {
        Visibility::Visible
    } else {
        Visibility::Hidden
    }
}

fn spawn_creatures(mut commands: Commands, asset_server: Res<AssetServer>, registry: Res<ModelRegistry>) {
    for model in &registry.models {
        info!("Loading model '{}' from {}", model.name, model.path);
        let animation = model.animated.then(|| asset_server.load(model.animation_path()));
        commands.spawn((
            SceneBundle {
                scene: asset_server.load(model.scene_path()),
                transform: model.transform(),
                visibility: visibility(model.visible),
                ..default()
            },
            Creature { name: model.name.clone(), animation },
        ));
    }
}

/// 场景实例化后动画播放器出现在子节点上, 向上找到所属模型并循环播放动画
fn start_creature_animations(
    mut players: Query<(Entity, &mut AnimationPlayer), Added<AnimationPlayer>>,
    parents: Query<&Parent>,
    creatures: Query<&Creature>,
) {
    for (entity, mut player) in &mut players {
        let owner = parents
            .iter_ancestors(entity)
            .find_map(|ancestor| creatures.get(ancestor).ok());
        if let Some(Creature { name, animation: Some(clip) }) = owner {
            debug!("Playing animation for '{name}'");
            player.play(clip.clone()).repeat();
        }
    }
}

fn sync_creature_visibility(registry: Res<ModelRegistry>, mut creatures: Query<(&Creature, &mut Visibility)>) {
    if !registry.is_changed() {
        return;
    }
    for (creature, mut vis) in &mut creatures {
        if let Some(model) = registry.get(&creature.name) {
            *vis = visibility(model.visible);
        }
    }
}
