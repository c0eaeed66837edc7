use slideshower::config::{
    Configuration, GridSettings, MAX_DELAY, MAX_GRID_SIDE, MIN_DELAY, PlaybackConfiguration,
};
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

#[test]
fn parse_kebab_case_config() {
    let yaml = r#"
photo-library-paths: ["/photos", "/more"]
"#;
    let cfg: Configuration = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(
        cfg.photo_library_paths,
        vec![PathBuf::from("/photos"), PathBuf::from("/more")]
    );
    assert_eq!(cfg.delay, Duration::from_secs(3));
    assert!(cfg.recursive);
    assert!(!cfg.shuffle);
    assert!(!cfg.loop_playback);
    assert_eq!(cfg.grid, GridSettings::default());
    assert_eq!(cfg.seed, None);
}

#[test]
fn parse_full_config() {
    let yaml = r#"
photo-library-paths: ["/photos"]
recursive: false
delay: 1500ms
shuffle: true
loop: true
fade-transition: true
notice-duration: 2s
seed: 7
grid:
  enabled: true
  rows: 2
  columns: 4
"#;
    let cfg: Configuration = serde_yaml::from_str(yaml).unwrap();
    assert!(!cfg.recursive);
    assert_eq!(cfg.delay, Duration::from_millis(1500));
    assert!(cfg.shuffle && cfg.loop_playback && cfg.fade_transition);
    assert_eq!(cfg.notice_duration, Duration::from_secs(2));
    assert_eq!(cfg.seed, Some(7));

    let playback = cfg.playback();
    assert!(playback.grid_mode);
    assert_eq!((playback.rows, playback.columns), (2, 4));
    assert_eq!(playback.cell_count(), 8);
    assert_eq!(playback.seed, Some(7));
}

#[test]
fn unknown_keys_are_rejected() {
    let yaml = r#"
photo-library-paths: ["/photos"]
dealy: 5s
"#;
    assert!(serde_yaml::from_str::<Configuration>(yaml).is_err());

    let nested = r#"
photo-library-paths: ["/photos"]
grid:
  cols: 3
"#;
    assert!(serde_yaml::from_str::<Configuration>(nested).is_err());
}

#[test]
fn delay_is_clamped_into_supported_range() {
    let short: Configuration = serde_yaml::from_str(
        r#"
photo-library-paths: ["/p"]
delay: 200ms
"#,
    )
    .unwrap();
    assert_eq!(short.validated().unwrap().delay, MIN_DELAY);

    let long: Configuration = serde_yaml::from_str(
        r#"
photo-library-paths: ["/p"]
delay: 5m
"#,
    )
    .unwrap();
    assert_eq!(long.validated().unwrap().delay, MAX_DELAY);

    let fine: Configuration = serde_yaml::from_str(
        r#"
photo-library-paths: ["/p"]
delay: 10s
"#,
    )
    .unwrap();
    assert_eq!(fine.validated().unwrap().delay, Duration::from_secs(10));
}

#[test]
fn validation_requires_paths_and_grid_cells() {
    let cfg = Configuration::default();
    let err = cfg.validated().unwrap_err();
    assert!(err.to_string().contains("photo-library-paths"));

    let cfg: Configuration = serde_yaml::from_str(
        r#"
photo-library-paths: ["/p"]
grid:
  rows: 0
"#,
    )
    .unwrap();
    let err = cfg.validated().unwrap_err();
    assert!(err.to_string().contains("grid"));
}

#[test]
fn oversized_grid_is_rejected() {
    let cfg: Configuration = serde_yaml::from_str(&format!(
        "photo-library-paths: [\"/p\"]\ngrid:\n  rows: {}\n  columns: 3\n",
        usize::MAX / 2
    ))
    .unwrap();
    assert!(cfg.validated().is_err());

    let edge: Configuration = serde_yaml::from_str(&format!(
        "photo-library-paths: [\"/p\"]\ngrid:\n  rows: {MAX_GRID_SIDE}\n  columns: {MAX_GRID_SIDE}\n"
    ))
    .unwrap();
    let edge = edge.validated().unwrap();
    assert_eq!(edge.playback().cell_count(), MAX_GRID_SIDE * MAX_GRID_SIDE);
}

#[test]
fn cell_count_saturates() {
    let playback = PlaybackConfiguration {
        rows: usize::MAX / 2,
        columns: 3,
        ..PlaybackConfiguration::default()
    };
    assert_eq!(playback.cell_count(), usize::MAX);
}

#[test]
fn load_from_yaml_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "photo-library-paths: [\"/photos\"]\nshuffle: true").unwrap();
    let cfg = Configuration::from_yaml_file(file.path()).unwrap();
    assert!(cfg.shuffle);

    let missing = Configuration::from_yaml_file(&file.path().with_extension("missing"));
    assert!(missing.is_err());
}
