use terrain_engine::{
    ColorBand, ColorBandList, IslandSettings, JsonFileStore, NoiseSource, SettingsStore,
    TerrainBuilder, TerrainParameters, TerrainState, WorldDimensions,
};

fn small_dims() -> WorldDimensions {
    WorldDimensions { scale: 1, base_size: 1000.0, base_segments: 16 }
}

#[test]
fn seed_42_is_reproducible_across_builds() {
    let params = TerrainParameters { seed: 42, ..Default::default() };
    let bands = ColorBandList::default();
    let a = TerrainBuilder::new(&params, &bands).build_for(&small_dims()).unwrap();
    let b = TerrainBuilder::new(&params, &bands).build_for(&small_dims()).unwrap();

    assert_eq!(a.grid().elevations(), b.grid().elevations());
    assert_eq!(a.tints(), b.tints());

    // Centre vertex sits on planar (0, 0).
    let centre = a.grid().elevation(8, 8);
    let expected = terrain_engine::compute_elevation(&NoiseSource::perlin(42), 0.0, 0.0, &params) as f32;
    assert_eq!(centre, expected);
    assert_eq!(centre, centre.ceil(), "terrace 1 snaps to whole units");
}

#[test]
fn elevations_stay_within_peak() {
    let params = TerrainParameters { seed: 3, peak: 250.0, frequency: 6, ..Default::default() };
    let bands = ColorBandList::default();
    let s = TerrainBuilder::new(&params, &bands).build_for(&small_dims()).unwrap();
    // Octave weights sum to less than 2, then terracing adds at most one step.
    for &h in s.grid().elevations() {
        assert!(f64::from(h).abs() <= 2.2 * 250.0 + 1.0, "elevation {h}");
    }
}

#[test]
fn tints_follow_band_thresholds() {
    let params = TerrainParameters { seed: 11, ..Default::default() };
    let bands = ColorBandList::new(vec![
        ColorBand::new(235, 233, 90, 160.0),
        ColorBand::new(100, 120, 60, 100.0),
        ColorBand::new(100, 160, 60, 50.0),
    ])
    .unwrap();
    let s = TerrainBuilder::new(&params, &bands).build_for(&small_dims()).unwrap();
    for (p, tint) in s.grid().positions().zip(s.tints()) {
        let y = terrain_engine::band_proxy(f64::from(p[2]), &params.calibration);
        let band = if y <= 160.0 { 0 } else if y <= 260.0 { 1 } else { 2 };
        assert_eq!(*tint, bands.bands()[band].normalized());
    }
}

#[test]
fn parameter_change_replaces_the_surface() {
    let mut state = TerrainState::new(TerrainParameters::default(), ColorBandList::default(), small_dims());
    let first = state.rebuild().unwrap().clone();

    let mut bands = state.bands().bands().to_vec();
    bands.push(ColorBand::new(255, 255, 255, 200.0));
    state.set_bands(bands).unwrap();
    let second = state.rebuild().unwrap();

    assert_eq!(second.generation(), first.generation() + 1);
    assert_eq!(second.bands().band_count(), 6);
    assert_eq!(second.grid().elevations(), first.grid().elevations());
    assert!(second.is_dirty());
}

#[test]
fn settings_survive_a_save_and_load() {
    let dir = std::env::temp_dir().join(format!("island_maker_settings_{}", std::process::id()));
    let store = JsonFileStore::new(&dir);

    assert!(store.load("missing").unwrap().is_none());

    let mut settings = IslandSettings::default();
    settings.seed = 42;
    settings.peak = 640.0;
    settings.set_bands(&[ColorBand::new(1, 2, 3, 40.0)]);
    settings.stamp();
    store.save("IslandMaker", &settings).unwrap();

    let loaded = store.load("IslandMaker").unwrap().unwrap();
    assert_eq!(loaded, settings);
    assert_eq!(loaded.terrain_params(&TerrainParameters::default()).seed, 42);

    let raw = std::fs::read_to_string(store.slot_path("IslandMaker")).unwrap();
    assert!(raw.contains("\"myseed\""));
    assert!(raw.contains("\"colorArr\""));

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn corrupt_slot_is_an_error() {
    let dir = std::env::temp_dir().join(format!("island_maker_corrupt_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let store = JsonFileStore::new(&dir);
    std::fs::write(store.slot_path("IslandMaker"), "{ not json").unwrap();

    assert!(matches!(
        store.load("IslandMaker"),
        Err(terrain_engine::TerrainError::SettingsFormat(_))
    ));

    std::fs::remove_dir_all(&dir).ok();
}
