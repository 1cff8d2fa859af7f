use crate::tests::RecordingHost;
use crate::{HostControl, LogAggregator, ProxySupervisor, SupervisorError, SupervisorState};

use std::net::{Ipv4Addr, TcpListener};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use googletest::assert_that;
use googletest::prelude::{eq, ok, some};
use serial_test::serial;
use tempfile::TempDir;
use tokio::sync::watch;
use vx_config::{LogBufferConfig, SupervisorConfig};

const CRASHING: &str = "#!/bin/sh\necho \"fake proxy $*\"\nexit 1\n";
const LONG_RUNNING: &str = "#!/bin/sh\necho \"args: $*\"\nexec sleep 30\n";
const CLEAN_EXIT: &str = "#!/bin/sh\nexit 0\n";

const PORT: u16 = 48100;

fn write_fake_proxy(dir: &TempDir, script: &str) -> PathBuf {
    let path = dir.path().join("vx-fake-proxy");
    std::fs::write(&path, script).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn test_config(binary: &Path) -> SupervisorConfig {
    SupervisorConfig {
        binary_name: "vx-fake-proxy".to_string(),
        search_paths: vec![binary.display().to_string()],
        port_range_start: PORT,
        port_range_end: PORT + 5,
        settle_delay_ms: 10,
        restart_delay_ms: 50,
        ..SupervisorConfig::default()
    }
}

fn fast_logs() -> LogAggregator {
    LogAggregator::new(&LogBufferConfig {
        flush_interval_ms: 20,
        ..LogBufferConfig::default()
    })
}

fn supervisor(config: SupervisorConfig, host: &Arc<RecordingHost>) -> ProxySupervisor {
    ProxySupervisor::with_host(config, fast_logs(), Arc::clone(host) as Arc<dyn HostControl>)
}

async fn wait_for_state(
    rx: &mut watch::Receiver<SupervisorState>,
    expected: SupervisorState,
) -> bool {
    tokio::time::timeout(Duration::from_secs(10), rx.wait_for(|s| *s == expected))
        .await
        .is_ok_and(|r| r.is_ok())
}

#[tokio::test]
#[serial]
async fn given_running_binary_when_start_then_running_on_first_free_port() {
    // Given
    let dir = TempDir::new().unwrap();
    let binary = write_fake_proxy(&dir, LONG_RUNNING);
    let host = Arc::new(RecordingHost::default());
    let supervisor = supervisor(test_config(&binary), &host);

    // When
    let result = supervisor.start(None).await;

    // Then
    assert_that!(result, ok(eq(&PORT)));
    assert_that!(supervisor.state(), eq(SupervisorState::Running { port: PORT }));
    assert_that!(supervisor.port(), some(eq(PORT)));
    assert!(supervisor.pid().is_some());
    assert_that!(host.kills(), eq(1));

    supervisor.stop().await;
}

#[tokio::test]
#[serial]
async fn given_dns_address_when_start_then_arguments_reach_child() {
    // Given
    let dir = TempDir::new().unwrap();
    let binary = write_fake_proxy(&dir, LONG_RUNNING);
    let host = Arc::new(RecordingHost::default());
    let supervisor = supervisor(test_config(&binary), &host);

    // When
    supervisor.start(Some("1.1.1.1:53")).await.unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;

    // Then
    let args_line = supervisor
        .logs()
        .entries()
        .into_iter()
        .find(|e| e.text.starts_with("args:"))
        .map(|e| e.text);
    assert_that!(
        args_line,
        some(eq(&format!(
            "args: --listen-addr 127.0.0.1:{PORT} --log-level info --system-proxy --dns-addr 1.1.1.1:53"
        )))
    );
    assert_that!(supervisor.dns_address(), some(eq("1.1.1.1:53")));

    supervisor.stop().await;
}

#[tokio::test]
#[serial]
async fn given_crashing_binary_when_start_then_three_restarts_then_crash_loop() {
    // Given
    let dir = TempDir::new().unwrap();
    let binary = write_fake_proxy(&dir, CRASHING);
    let host = Arc::new(RecordingHost::default());
    let supervisor = supervisor(test_config(&binary), &host);
    let mut states = supervisor.subscribe();

    // When
    supervisor.start(None).await.unwrap();

    // Then
    assert!(wait_for_state(&mut states, SupervisorState::CrashLoopExceeded).await);
    assert_that!(host.kills(), eq(4));
    assert_that!(supervisor.crash_count(), eq(3));
    assert!(matches!(
        supervisor.ensure_not_crash_looping(),
        Err(SupervisorError::CrashLoopExceeded { crashes: 3, .. })
    ));
}

#[tokio::test]
#[serial]
async fn given_crash_loop_when_explicit_start_then_crash_record_cleared() {
    // Given
    let dir = TempDir::new().unwrap();
    let binary = write_fake_proxy(&dir, CRASHING);
    let host = Arc::new(RecordingHost::default());
    let supervisor = supervisor(test_config(&binary), &host);
    let mut states = supervisor.subscribe();
    supervisor.start(None).await.unwrap();
    assert!(wait_for_state(&mut states, SupervisorState::CrashLoopExceeded).await);
    write_fake_proxy(&dir, LONG_RUNNING);

    // When
    let result = supervisor.start(None).await;

    // Then
    assert_that!(result, ok(eq(&PORT)));
    assert_that!(supervisor.crash_count(), eq(0));
    assert!(supervisor.is_running());

    supervisor.stop().await;
}

#[tokio::test]
#[serial]
async fn given_running_proxy_when_stop_then_start_then_no_automatic_restart() {
    // Given
    let dir = TempDir::new().unwrap();
    let binary = write_fake_proxy(&dir, LONG_RUNNING);
    let host = Arc::new(RecordingHost::default());
    let supervisor = supervisor(test_config(&binary), &host);
    supervisor.start(None).await.unwrap();

    // When
    supervisor.stop().await;
    let stopped = supervisor.state();
    supervisor.start(None).await.unwrap();
    tokio::time::sleep(Duration::from_millis(500)).await;

    // Then
    assert_that!(stopped, eq(SupervisorState::Stopped));
    assert_that!(host.kills(), eq(2));
    assert_that!(supervisor.crash_count(), eq(0));
    assert!(supervisor.is_running());

    supervisor.stop().await;
}

#[tokio::test]
#[serial]
async fn given_clean_exit_when_child_finishes_then_stopped_without_restart() {
    // Given
    let dir = TempDir::new().unwrap();
    let binary = write_fake_proxy(&dir, CLEAN_EXIT);
    let host = Arc::new(RecordingHost::default());
    let supervisor = supervisor(test_config(&binary), &host);
    let mut states = supervisor.subscribe();

    // When
    supervisor.start(None).await.unwrap();

    // Then
    assert!(wait_for_state(&mut states, SupervisorState::Stopped).await);
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_that!(host.kills(), eq(1));
    assert_that!(supervisor.crash_count(), eq(0));
    assert!(
        supervisor
            .logs()
            .entries()
            .iter()
            .any(|e| e.text == "Process terminated (exit code: 0)")
    );
}

#[tokio::test]
#[serial]
async fn given_nothing_running_when_stop_then_stopped() {
    // Given
    let host = Arc::new(RecordingHost::default());
    let supervisor = supervisor(SupervisorConfig::default(), &host);

    // When
    supervisor.stop().await;

    // Then
    assert_that!(supervisor.state(), eq(SupervisorState::Stopped));
    assert_that!(host.kills(), eq(0));
}

#[tokio::test]
#[serial]
async fn given_missing_binary_when_start_then_binary_not_found_and_stopped() {
    // Given
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("vx-fake-proxy");
    let host = Arc::new(RecordingHost::default());
    let supervisor = supervisor(test_config(&missing), &host);

    // When
    let result = supervisor.start(None).await;

    // Then
    let err = result.unwrap_err();
    assert!(matches!(err, SupervisorError::BinaryNotFound { .. }));
    assert!(!err.is_transient());
    assert_that!(supervisor.state(), eq(SupervisorState::Stopped));
    assert_that!(host.kills(), eq(0));
}

#[tokio::test]
#[serial]
async fn given_every_port_taken_when_start_then_no_ports_available_and_stopped() {
    // Given
    let dir = TempDir::new().unwrap();
    let binary = write_fake_proxy(&dir, LONG_RUNNING);
    let _held = TcpListener::bind((Ipv4Addr::UNSPECIFIED, PORT)).unwrap();
    let config = SupervisorConfig {
        port_range_end: PORT,
        ..test_config(&binary)
    };
    let host = Arc::new(RecordingHost::default());
    let supervisor = supervisor(config, &host);

    // When
    let result = supervisor.start(None).await;

    // Then
    assert!(matches!(
        result,
        Err(SupervisorError::NoPortsAvailable { .. })
    ));
    assert_that!(supervisor.state(), eq(SupervisorState::Stopped));
}

#[tokio::test]
#[serial]
async fn given_non_executable_binary_when_start_then_start_failed() {
    // Given
    let dir = TempDir::new().unwrap();
    let binary = write_fake_proxy(&dir, LONG_RUNNING);
    std::fs::set_permissions(&binary, std::fs::Permissions::from_mode(0o644)).unwrap();
    let host = Arc::new(RecordingHost::default());
    let supervisor = supervisor(test_config(&binary), &host);

    // When
    let result = supervisor.start(None).await;

    // Then
    assert!(matches!(result, Err(SupervisorError::StartFailed { .. })));
    assert_that!(supervisor.state(), eq(SupervisorState::Stopped));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[serial]
async fn given_running_proxy_when_stop_blocking_then_child_gone_and_stopped() {
    // Given
    let dir = TempDir::new().unwrap();
    let binary = write_fake_proxy(&dir, LONG_RUNNING);
    let host = Arc::new(RecordingHost::default());
    let supervisor = supervisor(test_config(&binary), &host);
    supervisor.start(None).await.unwrap();

    // When
    tokio::task::block_in_place(|| supervisor.stop_blocking());

    // Then
    assert_that!(supervisor.state(), eq(SupervisorState::Stopped));
    assert!(supervisor.pid().is_none());
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_that!(host.kills(), eq(1));
}

#[tokio::test]
#[serial]
async fn given_running_proxy_when_dropped_then_system_proxies_reset() {
    // Given
    let dir = TempDir::new().unwrap();
    let binary = write_fake_proxy(&dir, LONG_RUNNING);
    let host = Arc::new(RecordingHost::with_services(&["Wi-Fi", "Ethernet"]));
    let supervisor = supervisor(test_config(&binary), &host);
    supervisor.start(None).await.unwrap();

    // When
    drop(supervisor);

    // Then
    assert_that!(host.disabled().len(), eq(4));
}

#[tokio::test]
#[serial]
async fn given_running_proxy_when_started_again_then_previous_child_retired() {
    // Given
    let dir = TempDir::new().unwrap();
    let binary = write_fake_proxy(&dir, LONG_RUNNING);
    let host = Arc::new(RecordingHost::default());
    let supervisor = supervisor(test_config(&binary), &host);
    supervisor.start(None).await.unwrap();
    let first_pid = supervisor.pid();

    // When
    supervisor.start(Some("8.8.8.8:53")).await.unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;

    // Then
    assert!(supervisor.is_running());
    assert!(supervisor.pid() != first_pid);
    assert_that!(supervisor.crash_count(), eq(0));

    supervisor.stop().await;
}

#[tokio::test]
#[serial]
async fn given_crash_with_pending_restart_when_stop_then_child_not_restarted() {
    // Given
    let dir = TempDir::new().unwrap();
    let binary = write_fake_proxy(&dir, CRASHING);
    let host = Arc::new(RecordingHost::default());
    let config = SupervisorConfig {
        restart_delay_ms: 500,
        ..test_config(&binary)
    };
    let supervisor = supervisor(config, &host);
    supervisor.start(None).await.unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;

    // When
    supervisor.stop().await;
    tokio::time::sleep(Duration::from_secs(1)).await;

    // Then
    assert_that!(host.kills(), eq(1));
    assert_that!(supervisor.state(), eq(SupervisorState::Stopped));
    assert_that!(supervisor.crash_count(), eq(1));
    assert!(supervisor.pid().is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[serial]
async fn given_restart_mid_launch_when_stop_blocking_then_new_child_not_installed() {
    // Given
    let dir = TempDir::new().unwrap();
    let binary = write_fake_proxy(&dir, CRASHING);
    let host = Arc::new(RecordingHost::default());
    let config = SupervisorConfig {
        settle_delay_ms: 500,
        ..test_config(&binary)
    };
    let supervisor = supervisor(config, &host);
    supervisor.start(None).await.unwrap();
    tokio::time::sleep(Duration::from_millis(150)).await;
    write_fake_proxy(&dir, LONG_RUNNING);

    // When
    tokio::task::block_in_place(|| supervisor.stop_blocking());
    tokio::time::sleep(Duration::from_secs(1)).await;

    // Then
    assert_that!(host.kills(), eq(2));
    assert_that!(supervisor.state(), eq(SupervisorState::Stopped));
    assert!(supervisor.pid().is_none());
    assert!(!supervisor.is_running());
}
