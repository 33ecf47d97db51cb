//! Tests for virtual environment, platform package and library installation.

#![allow(clippy::expect_used)]

use std::collections::BTreeSet;
use std::path::PathBuf;

use volttron_bootstrap::application::ports::Marker;
use volttron_bootstrap::application::services::environment::{
    ensure_environment, ensure_libraries, ensure_platform_installed,
};
use volttron_bootstrap::domain::error::ExternalProcessError;

use crate::helpers::{VENV, bin, settings, strings};
use crate::mocks::{MemoryFs, MemoryMarkers, RecordingReporter, RecordingRunner};

#[tokio::test]
async fn test_missing_interpreter_creates_venv_with_bootstrap_python() {
    let runner = RecordingRunner::ready();
    let fs = MemoryFs::default();

    ensure_environment(&runner, &fs, &RecordingReporter::default(), &settings())
        .await
        .expect("venv");

    assert_eq!(runner.lines(), vec![format!("python3 -m venv {VENV}")]);
}

#[tokio::test]
async fn test_existing_interpreter_skips_venv_creation() {
    let runner = RecordingRunner::ready();
    let fs = MemoryFs::default().with_file(bin("python"), "");

    ensure_environment(&runner, &fs, &RecordingReporter::default(), &settings())
        .await
        .expect("venv");

    assert!(runner.calls().is_empty());
}

#[tokio::test]
async fn test_platform_install_upgrades_latest_and_sets_marker() {
    let runner = RecordingRunner::ready();
    let markers = MemoryMarkers::default();

    ensure_platform_installed(&runner, &markers, &RecordingReporter::default(), &settings())
        .await
        .expect("install");

    let calls = runner.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].program, bin("pip"));
    assert_eq!(calls[0].args, strings(&["install", "volttron", "--upgrade"]));
    assert!(markers.contains(Marker::PlatformInstalled));
}

#[tokio::test]
async fn test_platform_install_honors_version_pin_and_cache() {
    let runner = RecordingRunner::ready();
    let mut settings = settings();
    settings.platform_version = Some("9.0.1".into());
    settings.pip_cache_dir = Some(PathBuf::from("/var/cache/pip"));

    ensure_platform_installed(
        &runner,
        &MemoryMarkers::default(),
        &RecordingReporter::default(),
        &settings,
    )
    .await
    .expect("install");

    assert_eq!(
        runner.calls()[0].args,
        strings(&["install", "--cache-dir", "/var/cache/pip", "volttron==9.0.1"])
    );
}

#[tokio::test]
async fn test_platform_install_runs_once_per_marker() {
    let runner = RecordingRunner::ready();
    let markers = MemoryMarkers::with(&[Marker::PlatformInstalled]);

    ensure_platform_installed(&runner, &markers, &RecordingReporter::default(), &settings())
        .await
        .expect("install");

    assert!(runner.calls().is_empty());
}

#[tokio::test]
async fn test_failed_platform_install_keeps_marker_unset() {
    let runner = RecordingRunner::ready().failing_on("volttron", 2);
    let markers = MemoryMarkers::default();

    let err = ensure_platform_installed(&runner, &markers, &RecordingReporter::default(), &settings())
        .await
        .expect_err("pip fails");

    let failure = err
        .downcast_ref::<ExternalProcessError>()
        .expect("external process error");
    assert_eq!(failure.exit_code(), 2);
    assert!(!markers.contains(Marker::PlatformInstalled));
}

#[tokio::test]
async fn test_no_libraries_means_no_installer_call() {
    let runner = RecordingRunner::ready();

    ensure_libraries(&runner, &RecordingReporter::default(), &settings(), &BTreeSet::new())
        .await
        .expect("libraries");

    assert!(runner.calls().is_empty());
}

#[tokio::test]
async fn test_libraries_install_in_one_call() {
    let runner = RecordingRunner::ready();
    let libraries: BTreeSet<String> = ["requests", "pymodbus"].iter().map(|s| (*s).to_string()).collect();

    ensure_libraries(&runner, &RecordingReporter::default(), &settings(), &libraries)
        .await
        .expect("libraries");

    let calls = runner.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].args, strings(&["install", "pymodbus", "requests"]));
}
