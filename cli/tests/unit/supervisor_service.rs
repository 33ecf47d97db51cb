//! Tests for platform start and the readiness wait.

#![allow(clippy::expect_used)]

use std::path::PathBuf;
use std::time::Duration;

use volttron_bootstrap::application::services::supervisor::{self, PlatformOptions};
use volttron_bootstrap::domain::error::ReadinessError;
use volttron_bootstrap::domain::readiness::{PEER_QUERY_TIMEOUT, ReadyPolicy};

use crate::helpers::{HOME, bin, err_output, ok_output, settings, strings};
use crate::mocks::{FakeLauncher, FakePlatform, RecordingReporter, RecordingRunner};

fn fast(timeout: Option<Duration>) -> ReadyPolicy {
    ReadyPolicy {
        interval: Duration::from_millis(1),
        timeout,
    }
}

fn control() -> PathBuf {
    PathBuf::from(bin("vctl"))
}

#[test]
fn test_start_launches_platform_with_flags_and_log() {
    let launcher = FakeLauncher::serving(0);
    let opts = PlatformOptions {
        verbosity: "-vv",
        vip_address: "tcp://0.0.0.0:22916",
        instance_name: "edge-7",
    };

    supervisor::start(&launcher, &settings(), &opts).expect("start");

    let launches = launcher.launches();
    assert_eq!(launches.len(), 1);
    assert_eq!(launches[0].program, PathBuf::from(bin("volttron")));
    assert_eq!(
        launches[0].args,
        strings(&["-vv", "--vip-address", "tcp://0.0.0.0:22916", "--instance-name", "edge-7"])
    );
    assert_eq!(launches[0].log_path, PathBuf::from(HOME).join("volttron.log"));
}

#[tokio::test]
async fn test_ready_only_once_control_peer_is_listed() {
    let runner = RecordingRunner::never_ready().with_listings(vec![
        Ok(ok_output(b"platform.auth\n")),
        Ok(err_output(1, b"connection refused")),
        Err(anyhow::anyhow!("timed out")),
        Ok(ok_output(b"platform.auth\nplatform.control\n")),
    ]);
    let mut platform = FakePlatform::running();

    supervisor::wait_ready(
        &runner,
        &mut platform,
        &control(),
        &fast(None),
        &RecordingReporter::default(),
    )
    .await
    .expect("ready");

    assert_eq!(runner.query_count(), 4);
}

#[tokio::test]
async fn test_peer_query_is_vctl_peerlist() {
    let runner = RecordingRunner::ready();

    supervisor::wait_ready(
        &runner,
        &mut FakePlatform::running(),
        &control(),
        &fast(None),
        &RecordingReporter::default(),
    )
    .await
    .expect("ready");

    assert_eq!(runner.query_count(), 1);
    assert!(runner.calls().is_empty(), "peer queries are captured, not passed through");
}

#[tokio::test]
async fn test_platform_exit_ends_wait_without_querying() {
    let runner = RecordingRunner::ready();
    let mut platform = FakePlatform::exited(3);

    let err = supervisor::wait_ready(
        &runner,
        &mut platform,
        &control(),
        &fast(None),
        &RecordingReporter::default(),
    )
    .await
    .expect_err("platform died");

    assert!(matches!(
        err.downcast_ref::<ReadinessError>(),
        Some(ReadinessError::PlatformExited { code: Some(3) })
    ));
    assert_eq!(runner.query_count(), 0);
}

#[tokio::test]
async fn test_wait_times_out_when_peer_never_appears() {
    let runner = RecordingRunner::never_ready();

    let err = supervisor::wait_ready(
        &runner,
        &mut FakePlatform::running(),
        &control(),
        &fast(Some(Duration::from_millis(20))),
        &RecordingReporter::default(),
    )
    .await
    .expect_err("never ready");

    assert!(matches!(
        err.downcast_ref::<ReadinessError>(),
        Some(ReadinessError::TimedOut { peer: "platform.control", .. })
    ));
    assert!(runner.query_count() >= 2);
}

#[tokio::test]
async fn test_peer_query_never_outlives_ready_timeout() {
    let runner = RecordingRunner::never_ready();
    let deadline = Duration::from_millis(20);

    supervisor::wait_ready(
        &runner,
        &mut FakePlatform::running(),
        &control(),
        &fast(Some(deadline)),
        &RecordingReporter::default(),
    )
    .await
    .expect_err("never ready");

    let timeouts = runner.query_timeouts();
    assert!(!timeouts.is_empty());
    assert!(timeouts.iter().all(|t| *t <= deadline), "got: {timeouts:?}");
    assert!(timeouts.windows(2).all(|w| w[1] <= w[0]), "got: {timeouts:?}");
}

#[tokio::test]
async fn test_peer_query_uses_full_budget_without_ready_timeout() {
    let runner = RecordingRunner::ready();

    supervisor::wait_ready(
        &runner,
        &mut FakePlatform::running(),
        &control(),
        &fast(None),
        &RecordingReporter::default(),
    )
    .await
    .expect("ready");

    assert_eq!(runner.query_timeouts(), vec![PEER_QUERY_TIMEOUT]);
}
