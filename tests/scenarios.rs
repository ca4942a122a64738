//! End-to-end booth runs against the simulated peripherals.

use chrono::NaiveDate;
use photo_booth::hardware::{CameraEvent, Level};
use photo_booth::{
    BoothConfig, Camera, Interrupt, ManualClock, MockCamera, MockGpio, Peripherals, RunOutcome,
    SessionController, StartupAbort,
};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const PHOTO_WIDTH: u32 = 40;

/// Config rooted in a temp dir, with every overlay image generated at a
/// width that identifies it in the camera's event log.
fn booth_config(root: &TempDir, photo_count: u32) -> BoothConfig {
    let mut config = BoothConfig::default();
    config.capture.photo_count = photo_count;
    config.capture.photo_width = PHOTO_WIDTH;
    config.capture.photo_height = 30;
    config.storage.media_root = root.path().join("media");
    config.storage.local_dir = root.path().join("local");
    config.assets.dir = root.path().join("assets");
    config.test.autopress_button = true;
    config.test.no_startup_delay = true;
    config
}

fn write_assets(config: &BoothConfig) {
    let assets = &config.assets;
    fs::create_dir_all(&assets.dir).unwrap();
    let mut sized: Vec<(PathBuf, u32)> = vec![
        (assets.startup_background(), 24),
        (assets.startup_prompt(), 24),
        (assets.intro_background(), 8),
        (assets.intro_prompt(), 8),
        (assets.processing(), 48),
        (assets.all_done(), 64),
    ];
    sized.extend((1..=config.capture.photo_count).map(|n| (assets.get_ready(n), 16)));
    for (path, width) in sized {
        image::RgbImage::from_pixel(width, 16, image::Rgb([200, 10, 10]))
            .save(path)
            .unwrap();
    }
}

fn run_booth(
    config: BoothConfig,
    gpio: MockGpio,
    camera: MockCamera,
) -> (
    RunOutcome,
    SessionController<MockGpio, MockCamera, ManualClock>,
) {
    let start = NaiveDate::from_ymd_opt(2017, 9, 2)
        .unwrap()
        .and_hms_opt(19, 45, 30)
        .unwrap();
    let rig = Peripherals::new(gpio, camera, ManualClock::starting_at(start));
    let mut controller = SessionController::new(config, rig, Interrupt::new());
    let outcome = controller.run();
    (outcome, controller)
}

fn overlay_widths(camera: &MockCamera) -> Vec<u32> {
    camera
        .events()
        .iter()
        .filter_map(|e| match e {
            CameraEvent::OverlayAdded { visible, .. } => Some(visible.width),
            _ => None,
        })
        .collect()
}

fn jpgs_in(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .unwrap()
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "jpg"))
        .collect();
    files.sort();
    files
}

#[test]
fn test_fast_autopress_single_cycle() {
    let root = TempDir::new().unwrap();
    let mut config = booth_config(&root, 3);
    config.test.fast = true;
    config.test.no_startup_delay = false;
    let config = config.effective();
    assert_eq!(config.capture.photo_count, 2);
    write_assets(&config);

    let (outcome, mut controller) = run_booth(config, MockGpio::new(), MockCamera::new());

    assert_eq!(outcome, RunOutcome::Completed { sessions: 1 });

    let rig = controller.peripherals();
    let camera = rig.overlays.camera();
    assert_eq!(
        overlay_widths(camera),
        vec![24, 24, 8, 8, 16, 16, 48, PHOTO_WIDTH, PHOTO_WIDTH, 64]
    );

    let photos = jpgs_in(&root.path().join("local"));
    assert_eq!(photos.len(), 2);
    assert!(photos[0].to_string_lossy().ends_with("_1of2.jpg"));
    assert!(photos[1].to_string_lossy().ends_with("_2of2.jpg"));

    // Every overlay came down and cleanup ran once
    assert_eq!(camera.live_overlays(), 0);
    assert_eq!(camera.count_events(|e| *e == CameraEvent::PreviewStopped), 1);
    assert_eq!(rig.gpio.release_count(), 1);

    controller.shutdown();
    let rig = controller.peripherals();
    assert_eq!(
        rig.overlays
            .camera()
            .count_events(|e| *e == CameraEvent::PreviewStopped),
        1
    );
    assert_eq!(rig.gpio.release_count(), 1);
}

#[test]
fn test_no_media_saves_locally_without_backup() {
    let root = TempDir::new().unwrap();
    let config = booth_config(&root, 2);
    write_assets(&config);

    let (outcome, controller) = run_booth(config, MockGpio::new(), MockCamera::new());

    assert_eq!(outcome, RunOutcome::Completed { sessions: 1 });
    assert_eq!(jpgs_in(&root.path().join("local")).len(), 2);
    assert!(!root.path().join("media").exists());
    assert!(controller
        .metrics()
        .unwrap()
        .encode()
        .unwrap()
        .contains("photo_booth_backups_total 0"));
}

#[test]
fn test_media_with_backup_writes_identical_copies() {
    let root = TempDir::new().unwrap();
    let mut config = booth_config(&root, 2);
    config.metrics_file = Some(root.path().join("booth.prom"));
    fs::create_dir_all(root.path().join("media").join("usb")).unwrap();
    write_assets(&config);

    let (outcome, _controller) = run_booth(config, MockGpio::new(), MockCamera::new());
    assert_eq!(outcome, RunOutcome::Completed { sessions: 1 });

    let primary_dir = root.path().join("media").join("usb").join("booth-photos");
    let primary = jpgs_in(&primary_dir);
    let backup = jpgs_in(&root.path().join("local"));
    assert_eq!(primary.len(), 2);
    assert_eq!(backup.len(), 2);
    for (p, b) in primary.iter().zip(&backup) {
        assert_eq!(p.file_name(), b.file_name());
        assert_eq!(fs::read(p).unwrap(), fs::read(b).unwrap());
    }

    let marker = fs::read_to_string(primary_dir.join("__booth_init.txt")).unwrap();
    assert_eq!(marker, "2017-09-02 19:45:30\r\n");

    let metrics = fs::read_to_string(root.path().join("booth.prom")).unwrap();
    assert!(metrics.contains("photo_booth_photos_total 2"));
    assert!(metrics.contains("photo_booth_backups_total 2"));
    assert!(metrics.contains("photo_booth_storage_external 1"));
}

#[test]
fn test_button_held_at_startup_aborts() {
    let root = TempDir::new().unwrap();
    let config = booth_config(&root, 2);
    let button = config.gpio.button_pin;
    let gpio = MockGpio::new().with_boot_level(button, Level::Low);

    let (outcome, controller) = run_booth(config, gpio, MockCamera::new());

    assert_eq!(outcome, RunOutcome::Aborted(StartupAbort::ButtonHeld));
    assert!(outcome.is_aborted());
    let rig = controller.peripherals();
    assert!(!rig.overlays.camera().is_open());
    assert!(rig.overlays.camera().events().is_empty());
    assert_eq!(rig.gpio.release_count(), 1);
}

#[test]
fn test_missing_asset_is_a_fault_with_cleanup() {
    let root = TempDir::new().unwrap();
    let config = booth_config(&root, 2);
    write_assets(&config);
    fs::remove_file(config.assets.processing()).unwrap();

    let (outcome, controller) = run_booth(config, MockGpio::new(), MockCamera::new());

    assert!(matches!(outcome, RunOutcome::Failed { sessions: 0, .. }));
    let rig = controller.peripherals();
    assert_eq!(rig.overlays.camera().live_overlays(), 0);
    assert_eq!(rig.gpio.release_count(), 1);
    // Both photos were already on disk when the processing screen failed
    assert_eq!(jpgs_in(&root.path().join("local")).len(), 2);
}
