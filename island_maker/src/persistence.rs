use std::sync::Arc;

use bevy::app::AppExit;
use bevy::prelude::*;
use bevy::tasks::{AsyncComputeTaskPool, Task};
use futures_lite::future;
use terrain_engine::{IslandSettings, JsonFileStore, SettingsStore, TerrainState, DEFAULT_SLOT};

use crate::terrain::IslandTerrain;
use crate::water::WaterSettings;

/// 设置存档插件
pub struct PersistencePlugin;

impl Plugin for PersistencePlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<SettingsChanged>()
            .insert_resource(SettingsSlot::new(JsonFileStore::new("saves"), DEFAULT_SLOT))
            .init_resource::<SaveQueue>()
            .init_resource::<SaveTaskTimer>()
            .add_systems(Startup, load_settings)
            .add_systems(Update, (queue_settings_save, flush_save_queue, handle_save_tasks).chain())
            .add_systems(Last, save_pending_on_exit);
    }
}

/// 面板修改后发送
#[derive(Event, Debug, Clone, Copy, Default)]
pub struct SettingsChanged;

/// 存储后端和槽位名
#[derive(Resource, Clone)]
pub struct SettingsSlot {
    pub store: Arc<dyn SettingsStore>,
    pub slot: String,
}

impl SettingsSlot {
    pub fn new(store: impl SettingsStore + 'static, slot: &str) -> Self {
        Self { store: Arc::new(store), slot: slot.to_string() }
    }
}

/// 异步保存任务
#[derive(Component)]
pub struct SaveTask {
    pub task: Task<Result<(), String>>,
}

/// 待保存的设置, 多次修改合并为一次写入
#[derive(Resource, Default)]
pub struct SaveQueue {
    pub pending: Option<IslandSettings>,
    pub last_written: Option<IslandSettings>,
}

/// 保存检查定时器 - 限制写入频率
#[derive(Resource)]
pub struct SaveTaskTimer {
    pub timer: Timer,
}

impl SaveQueue {
    /// 新的修改覆盖尚未写入的记录
    pub fn push(&mut self, settings: IslandSettings) {
        self.pending = Some(settings);
    }

    /// 取出待写入的记录并打上时间戳; 与上次写入内容相同时返回 None
    pub fn take_for_write(&mut self) -> Option<IslandSettings> {
        let mut settings = self.pending.take()?;
        if let Some(last) = &self.last_written {
            if (IslandSettings { saved_at: last.saved_at.clone(), ..settings.clone() }) == *last {
                return None;
            }
        }
        settings.stamp();
        self.last_written = Some(settings.clone());
        Some(settings)
    }
}

impl Default for SaveTaskTimer {
    fn default() -> Self {
        Self {
            timer: Timer::from_seconds(1.0, TimerMode::Repeating),
        }
    }
}

/// 收集需要保存的全部设置
pub fn collect_settings(terrain: &TerrainState, water: &WaterSettings) -> IslandSettings {
    let mut settings = IslandSettings::default();
    settings.set_terrain(terrain.params());
    settings.set_bands(terrain.bands().bands());
    settings.set_wave(&water.wave);
    settings.len = water.len;
    settings.width = water.width;
    settings.scale = terrain.dimensions().scale;
    settings
}

/// 把读取的记录写入当前状态, 某组被拒绝时其余组照常应用, 返回第一个错误
pub fn apply_settings(
    settings: &IslandSettings,
    terrain: &mut TerrainState,
    water: &mut WaterSettings,
) -> terrain_engine::Result<()> {
    let params = settings.terrain_params(terrain.params());
    let dims = settings.dimensions(terrain.dimensions());
    let results = [
        terrain.set_params(params),
        terrain.set_bands(settings.bands()),
        terrain.set_dimensions(dims),
    ];

    water.len = settings.len;
    water.width = settings.width;
    water.wave = settings.wave();

    results.into_iter().collect::<terrain_engine::Result<Vec<_>>>().map(|_| ())
}

fn load_settings(
    slot: Res<SettingsSlot>,
    mut terrain: ResMut<IslandTerrain>,
    mut water: ResMut<WaterSettings>,
    mut queue: ResMut<SaveQueue>,
) {
    match slot.store.load(&slot.slot) {
        Ok(Some(settings)) => {
            info!(
                "Loaded settings from slot '{}' (saved {})",
                slot.slot,
                settings.saved_at.as_deref().unwrap_or("unknown")
            );
            if let Err(e) = apply_settings(&settings, &mut terrain.state, &mut water) {
                warn!("Saved settings partly rejected: {e}");
            }
            queue.last_written = Some(settings);
        }
        Ok(None) => info!("No saved settings in slot '{}', using defaults", slot.slot),
        Err(e) => warn!("Failed to read settings slot '{}': {e}, using defaults", slot.slot),
    }
}

fn queue_settings_save(
    mut events: EventReader<SettingsChanged>,
    terrain: Res<IslandTerrain>,
    water: Res<WaterSettings>,
    mut queue: ResMut<SaveQueue>,
) {
    if events.read().count() == 0 {
        return;
    }
    queue.push(collect_settings(&terrain.state, &water));
}

fn flush_save_queue(
    mut commands: Commands,
    time: Res<Time>,
    slot: Res<SettingsSlot>,
    mut queue: ResMut<SaveQueue>,
    mut save_timer: ResMut<SaveTaskTimer>,
) {
    save_timer.timer.tick(time.delta());
    if !save_timer.timer.just_finished() {
        return;
    }

    let Some(settings) = queue.take_for_write() else {
        return;
    };

    let store = Arc::clone(&slot.store);
    let slot_name = slot.slot.clone();
    let task = AsyncComputeTaskPool::get().spawn(async move {
        store
            .save(&slot_name, &settings)
            .map_err(|e| format!("Failed to write settings slot '{slot_name}': {e}"))
    });
    commands.spawn(SaveTask { task });
}

/// 处理异步保存任务
fn handle_save_tasks(mut commands: Commands, mut save_tasks: Query<(Entity, &mut SaveTask)>) {
    for (entity, mut save_task) in &mut save_tasks {
        if let Some(result) = future::block_on(future::poll_once(&mut save_task.task)) {
            match result {
                Ok(()) => debug!("Settings saved"),
                Err(e) => error!("{e}"),
            }
            commands.entity(entity).despawn();
        }
    }
}

/// 退出前同步写入尚未保存的修改
fn save_pending_on_exit(mut exits: EventReader<AppExit>, slot: Res<SettingsSlot>, mut queue: ResMut<SaveQueue>) {
    if exits.read().count() == 0 {
        return;
    }
    if let Some(settings) = queue.take_for_write() {
        match slot.store.save(&slot.slot, &settings) {
            Ok(()) => info!("Saved pending settings to slot '{}' before exit", slot.slot),
            Err(e) => error!("Failed to write settings slot '{}' on exit: {e}", slot.slot),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use terrain_engine::{ColorBand, WaveParams};

    #[derive(Default)]
    struct MemoryStore {
        slots: Mutex<HashMap<String, IslandSettings>>,
    }

    impl SettingsStore for MemoryStore {
        fn load(&self, slot: &str) -> terrain_engine::Result<Option<IslandSettings>> {
            Ok(self.slots.lock().unwrap().get(slot).cloned())
        }

        fn save(&self, slot: &str, settings: &IslandSettings) -> terrain_engine::Result<()> {
            self.slots.lock().unwrap().insert(slot.to_string(), settings.clone());
            Ok(())
        }
    }

    fn with_seed(seed: u32) -> IslandSettings {
        IslandSettings { seed, ..Default::default() }
    }

    #[test]
    fn later_changes_replace_pending_record() {
        let mut queue = SaveQueue::default();
        queue.push(with_seed(1));
        queue.push(with_seed(2));
        let written = queue.take_for_write().unwrap();
        assert_eq!(written.seed, 2);
        assert!(written.saved_at.is_some());
        assert!(queue.take_for_write().is_none());
    }

    #[test]
    fn identical_record_is_not_written_twice() {
        let mut queue = SaveQueue::default();
        queue.push(with_seed(3));
        assert!(queue.take_for_write().is_some());

        queue.push(with_seed(3));
        assert!(queue.take_for_write().is_none());
        assert!(queue.pending.is_none());

        queue.push(with_seed(4));
        assert_eq!(queue.take_for_write().map(|s| s.seed), Some(4));
    }

    #[test]
    fn pending_changes_are_saved_on_exit() {
        let store = Arc::new(MemoryStore::default());
        let mut app = App::new();
        app.add_event::<AppExit>()
            .insert_resource(SettingsSlot { store: store.clone(), slot: DEFAULT_SLOT.to_string() })
            .init_resource::<SaveQueue>()
            .add_systems(Last, save_pending_on_exit);

        app.world.resource_mut::<SaveQueue>().push(with_seed(9));
        app.update();
        assert!(store.load(DEFAULT_SLOT).unwrap().is_none());

        app.world.resource_mut::<Events<AppExit>>().send(AppExit);
        app.update();
        let saved = store.load(DEFAULT_SLOT).unwrap().unwrap();
        assert_eq!(saved.seed, 9);
        assert!(saved.saved_at.is_some());
        assert!(app.world.resource::<SaveQueue>().pending.is_none());
    }

    #[test]
    fn defaults_collect_to_default_record() {
        let terrain = TerrainState::default();
        let water = WaterSettings::default();
        assert_eq!(collect_settings(&terrain, &water), IslandSettings::default());
    }

    #[test]
    fn loaded_record_reaches_live_state() {
        let mut settings = IslandSettings::default();
        settings.seed = 42;
        settings.smoothing = 55.0;
        settings.set_bands(&[ColorBand::new(9, 9, 9, 30.0), ColorBand::new(1, 1, 1, 70.0)]);
        settings.set_wave(&WaveParams { frequency: 0.1, amplitude: 3.0, speed: 2.0 });
        settings.len = 3000.0;
        settings.scale = 2;

        let mut terrain = TerrainState::default();
        let mut water = WaterSettings::default();
        apply_settings(&settings, &mut terrain, &mut water).unwrap();

        assert_eq!(terrain.params().seed, 42);
        assert_eq!(terrain.bands().band_count(), 2);
        assert_eq!(terrain.dimensions().scale, 2);
        assert_eq!(water.len, 3000.0);
        assert_eq!(water.wave.speed, 2.0);
        assert_eq!(collect_settings(&terrain, &water), settings);
    }

    #[test]
    fn bad_group_does_not_block_the_others() {
        let mut settings = IslandSettings::default();
        settings.smoothing = f64::NAN;
        settings.color_arr.clear();
        settings.amplitude = 4.0;

        let mut terrain = TerrainState::default();
        let mut water = WaterSettings::default();
        assert!(apply_settings(&settings, &mut terrain, &mut water).is_err());
        assert_eq!(terrain.params().smoothing, 100.0);
        assert_eq!(terrain.bands().band_count(), 5);
        assert_eq!(water.wave.amplitude, 4.0);
    }
}
