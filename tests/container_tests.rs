//! Tests for the container lifecycle controller.
//!
//! Exercises configuration accumulation, startup classification, and
//! the cleanup guarantees against the fake runtime.

mod support;

use chaosrun::{BindMode, ContainerSpec, Error, ImageSource, LogMessage};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use support::{exited_state, running_state, stdout_frame, FakeRuntime};

fn plain_image() -> ImageSource {
    ImageSource::remote("alpine:3.18")
}

// =============================================================================
// Configuration
// =============================================================================

#[tokio::test]
async fn test_start_applies_accumulated_configuration() {
    let runtime = Arc::new(FakeRuntime::new());
    runtime.set_default_state(running_state("app-1"));

    let mut container = ContainerSpec::new(plain_image())
        .with_name("app-1")
        .with_command(vec!["sleep".to_string(), "60".to_string()])
        .with_env("APP_MODE", "test")
        .with_bind("/tmp/data", "/data", BindMode::ReadOnly)
        .with_privileged(true)
        .with_auto_remove(true)
        .start(runtime.clone())
        .await
        .unwrap();

    let created = runtime.created();
    assert_eq!(created.len(), 1);
    let config = &created[0];
    assert_eq!(config.image, "alpine:3.18");
    assert_eq!(config.command, vec!["sleep", "60"]);
    assert_eq!(
        config.env,
        vec![("APP_MODE".to_string(), "test".to_string())]
    );
    assert_eq!(config.binds.len(), 1);
    assert_eq!(config.binds[0].render(), "/tmp/data:/data:ro");
    assert!(config.privileged);
    assert!(config.auto_remove);
    assert_eq!(config.name.as_deref(), Some("app-1"));

    assert_eq!(runtime.started(), vec!["app-1"]);
    assert_eq!(container.id(), "app-1");
    assert_eq!(container.name(), Some("app-1"));

    container.stop().await.unwrap();
}

#[tokio::test]
async fn test_invalid_name_is_rejected_before_any_side_effect() {
    let runtime = Arc::new(FakeRuntime::new());

    let err = ContainerSpec::new(plain_image())
        .with_name("bad/name")
        .start(runtime.clone())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::InvalidSpec(_)));
    assert!(runtime.created().is_empty());
    assert!(runtime.pulled().is_empty());
}

// =============================================================================
// Startup Failure Cleanup
// =============================================================================

#[tokio::test]
async fn test_failed_startup_removes_container_and_carries_diagnostics() {
    let runtime = Arc::new(FakeRuntime::new());
    runtime.set_default_state(exited_state("fake-0", 137));
    runtime.set_log_frames(vec![
        stdout_frame("booting\n"),
        stdout_frame("fatal: out of memory\n"),
    ]);

    let err = ContainerSpec::new(plain_image())
        .start(runtime.clone())
        .await
        .unwrap_err();

    match err {
        Error::StartupFailed {
            id,
            exit_code,
            last_state,
            log_tail,
        } => {
            assert_eq!(id, "fake-0");
            assert_eq!(exit_code, Some(137));
            assert_eq!(last_state, "exited");
            assert!(log_tail.contains("fatal: out of memory"));
        }
        other => panic!("expected StartupFailed, got {:?}", other),
    }

    // No leaked container: the failed start force-removed it.
    assert_eq!(runtime.removed(), vec![("fake-0".to_string(), true)]);
}

#[tokio::test]
async fn test_startup_timeout_removes_container() {
    let runtime = Arc::new(FakeRuntime::new());
    runtime.set_default_state(running_state("fake-0"));

    let err = ContainerSpec::new(plain_image())
        .with_startup_check(LogMessage::new("never-logged"))
        .with_startup_timeouts(Duration::from_millis(1), Duration::from_millis(20))
        .start(runtime.clone())
        .await
        .unwrap_err();

    assert!(err.is_timeout());
    assert_eq!(runtime.removed(), vec![("fake-0".to_string(), true)]);
}

// =============================================================================
// Stop and Drop Discipline
// =============================================================================

#[tokio::test]
async fn test_stop_is_idempotent() {
    let runtime = Arc::new(FakeRuntime::new());
    runtime.set_default_state(running_state("fake-0"));

    let mut container = ContainerSpec::new(plain_image())
        .start(runtime.clone())
        .await
        .unwrap();

    container.stop().await.unwrap();
    container.stop().await.unwrap();

    assert_eq!(runtime.removed(), vec![("fake-0".to_string(), true)]);
}

#[tokio::test]
async fn test_dropped_handle_triggers_background_removal() {
    let runtime = Arc::new(FakeRuntime::new());
    runtime.set_default_state(running_state("fake-0"));

    let container = ContainerSpec::new(plain_image())
        .start(runtime.clone())
        .await
        .unwrap();
    drop(container);

    // The drop guard spawns the removal; give it a moment to run.
    for _ in 0..50 {
        if !runtime.removed().is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(runtime.removed(), vec![("fake-0".to_string(), true)]);
}

#[tokio::test]
async fn test_detach_leaves_container_alone() {
    let runtime = Arc::new(FakeRuntime::new());
    runtime.set_default_state(running_state("fake-0"));

    let container = ContainerSpec::new(plain_image())
        .start(runtime.clone())
        .await
        .unwrap();
    container.detach();

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(runtime.removed().is_empty());
}

// =============================================================================
// Log Consumers
// =============================================================================

#[tokio::test]
async fn test_log_consumers_receive_streamed_frames() {
    let runtime = Arc::new(FakeRuntime::new());
    runtime.set_default_state(running_state("fake-0"));
    runtime.set_log_frames(vec![stdout_frame("hello from container\n")]);

    let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();

    let mut container = ContainerSpec::new(plain_image())
        .with_log_consumer(move |frame| sink.lock().unwrap().push(frame.as_text()))
        .start(runtime.clone())
        .await
        .unwrap();

    // The pump runs on a detached task; wait for the frame to land.
    for _ in 0..50 {
        if !seen.lock().unwrap().is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(seen.lock().unwrap().as_slice(), ["hello from container\n"]);

    container.stop().await.unwrap();
}

// =============================================================================
// Inspection
// =============================================================================

#[tokio::test]
async fn test_state_reflects_runtime_inspection() {
    let runtime = Arc::new(FakeRuntime::new());
    runtime.set_default_state(running_state("fake-0"));

    let mut container = ContainerSpec::new(plain_image())
        .start(runtime.clone())
        .await
        .unwrap();

    let state = container.state().await.unwrap();
    assert!(state.running);
    assert_eq!(state.ip_address.as_deref(), Some("172.17.0.2"));
    assert!(!state.exited_with_error());

    container.stop().await.unwrap();
}

#[tokio::test]
async fn test_database_fixture_shape_starts_on_ready_log_line() {
    // A service container is "up" once it logs readiness, the way a
    // database fixture would wire the controller.
    let runtime = Arc::new(FakeRuntime::new());
    runtime.set_default_state(running_state("db-1"));
    runtime.set_log_frames(vec![stdout_frame("mysqld: ready for connections\n")]);

    let mut container = ContainerSpec::new(ImageSource::remote("mysql:8.0"))
        .with_name("db-1")
        .with_env("MYSQL_ROOT_PASSWORD", "secret")
        .with_startup_check(LogMessage::new("ready for connections"))
        .start(runtime.clone())
        .await
        .unwrap();

    assert_eq!(container.id(), "db-1");
    container.stop().await.unwrap();
}
