//! Local backend behaviour against a fake container runtime.

mod common;

use burrow_core::{
    CoreError, CreateParams, LocalBackend, LocalSettings, Orchestrator, Permissions, SandboxId,
    SandboxState, LOCAL_SANDBOX_ID,
};
use bytes::Bytes;
use common::FakeDocker;
use std::sync::Arc;
use std::time::Duration;

fn setup() -> (Arc<FakeDocker>, Orchestrator) {
    let docker = Arc::new(FakeDocker::new());
    let backend = LocalBackend::with_runner(LocalSettings::default(), docker.clone());
    (docker, Orchestrator::new(backend))
}

#[tokio::test]
async fn test_create_returns_loopback_preview() {
    let (_docker, orchestrator) = setup();

    let sandbox = orchestrator.create(&CreateParams::new("pw")).await.unwrap();

    assert_eq!(sandbox.state(), SandboxState::Running);
    assert!(sandbox.labels().is_empty());
    assert_eq!(
        sandbox.get_preview_link(8080).await.unwrap(),
        "http://localhost:8080"
    );
}

#[tokio::test]
async fn test_ensure_is_memoized() {
    let (docker, orchestrator) = setup();

    let first = orchestrator.create(&CreateParams::new("pw")).await.unwrap();
    let second = orchestrator.get_or_start(&SandboxId::new("ignored")).await.unwrap();
    let third = orchestrator.get_or_start(&SandboxId::new("other")).await.unwrap();

    assert_eq!(first.id(), second.id());
    assert_eq!(second.id(), third.id());
    assert_eq!(first.id().as_str(), "container-1");
    assert_eq!(docker.compose_ups(), 1);
}

#[tokio::test]
async fn test_teardown_then_ensure_reprovisions() {
    let (docker, orchestrator) = setup();

    let first = orchestrator.create(&CreateParams::new("pw")).await.unwrap();
    assert!(orchestrator.delete(first.id()).await.unwrap());
    let second = orchestrator.create(&CreateParams::new("pw")).await.unwrap();

    assert_ne!(first.id(), second.id());
    assert_eq!(second.id().as_str(), "container-2");
    assert_eq!(docker.compose_ups(), 2);
    assert_eq!(docker.compose_downs(), 1);
}

#[tokio::test]
async fn test_delete_succeeds_when_teardown_fails() {
    let (docker, orchestrator) = setup();
    docker.configure(|s| s.fail_down = true);

    orchestrator.create(&CreateParams::new("pw")).await.unwrap();
    let deleted = orchestrator.delete(&SandboxId::new("whatever")).await.unwrap();

    assert!(deleted);
    assert_eq!(docker.compose_downs(), 1);
    let burrow_core::Backend::Local(local) = orchestrator.backend() else {
        panic!("expected local backend");
    };
    assert!(local.current().await.is_none());
}

#[tokio::test]
async fn test_delete_without_sandbox_still_succeeds() {
    let (docker, orchestrator) = setup();
    assert!(orchestrator.delete(&SandboxId::new("none")).await.unwrap());
    assert_eq!(docker.compose_downs(), 1);
}

#[tokio::test]
async fn test_compose_up_failure_is_fatal() {
    let (docker, orchestrator) = setup();
    docker.configure(|s| s.fail_up = true);

    let err = orchestrator.create(&CreateParams::new("pw")).await.unwrap_err();
    assert!(matches!(err, CoreError::CommandFailed { code: 1, .. }));

    // Nothing was memoized, so the next attempt tries again.
    docker.configure(|s| s.fail_up = false);
    orchestrator.create(&CreateParams::new("pw")).await.unwrap();
    assert_eq!(docker.compose_ups(), 2);
}

#[tokio::test]
async fn test_missing_container_id_falls_back_to_sentinel() {
    let (docker, orchestrator) = setup();
    docker.configure(|s| s.no_container_id = true);

    let sandbox = orchestrator.create(&CreateParams::new("pw")).await.unwrap();
    assert_eq!(sandbox.id().as_str(), LOCAL_SANDBOX_ID);
}

#[tokio::test]
async fn test_supervisor_is_noop_locally() {
    let (docker, orchestrator) = setup();
    let sandbox = orchestrator.create(&CreateParams::new("pw")).await.unwrap();
    let before = docker.calls().len();

    orchestrator.start_supervisor_session(&sandbox).await.unwrap();

    assert_eq!(docker.calls().len(), before);
}

#[tokio::test]
async fn test_execute_combines_output() {
    let (docker, orchestrator) = setup();
    let sandbox = orchestrator.create(&CreateParams::new("pw")).await.unwrap();

    let result = sandbox
        .process()
        .execute("echo hello", Duration::from_secs(5))
        .await
        .unwrap();
    assert!(result.success());
    assert_eq!(result.output, "hello\n");

    let failed = sandbox
        .process()
        .execute("exit 3", Duration::from_secs(5))
        .await
        .unwrap();
    assert_eq!(failed.exit_code, 3);

    let last = docker.calls().last().cloned().unwrap();
    assert_eq!(last, vec!["exec", "container-1", "bash", "-lc", "exit 3"]);
}

#[tokio::test(start_paused = true)]
async fn test_execute_timeout_is_reported() {
    let (_docker, orchestrator) = setup();
    let sandbox = orchestrator.create(&CreateParams::new("pw")).await.unwrap();

    let err = sandbox
        .process()
        .execute("sleep 30", Duration::from_secs(1))
        .await
        .unwrap_err();
    assert!(err.is_timeout());
}

#[tokio::test]
async fn test_session_echo_appears_in_logs() {
    let (_docker, orchestrator) = setup();
    let sandbox = orchestrator.create(&CreateParams::new("pw")).await.unwrap();
    let process = sandbox.process();

    process.create_session("s1").await.unwrap();
    let cmd = process
        .execute_session_command("s1", "echo hi", true)
        .await
        .unwrap();
    assert_eq!(cmd.exit_code, Some(0));

    let logs = process.get_session_command_logs("s1", &cmd.cmd_id).await.unwrap();
    assert!(logs.contains("hi"));
}

#[tokio::test]
async fn test_session_failures_are_swallowed() {
    let (_docker, orchestrator) = setup();
    let sandbox = orchestrator.create(&CreateParams::new("pw")).await.unwrap();
    let process = sandbox.process();

    process.create_session("s1").await.unwrap();
    // Duplicate session, unknown session and missing pane all fail in tmux.
    process.create_session("s1").await.unwrap();
    process.delete_session("nope").await.unwrap();
    let cmd = process
        .execute_session_command("nope", "echo lost", false)
        .await
        .unwrap();
    assert_eq!(cmd.exit_code, Some(0));
    assert_eq!(
        process.get_session_command_logs("nope", &cmd.cmd_id).await.unwrap(),
        ""
    );
}

#[tokio::test]
async fn test_upload_download_round_trip() {
    let (docker, orchestrator) = setup();
    let sandbox = orchestrator.create(&CreateParams::new("pw")).await.unwrap();
    let fs = sandbox.fs();

    let data = Bytes::from_static(b"line one\n\x00\xffbinary tail");
    fs.upload_file("/workspace/it's here.bin", data.clone())
        .await
        .unwrap();

    assert_eq!(fs.download_file("/workspace/it's here.bin").await.unwrap(), data);
    assert_eq!(docker.file("/workspace/it's here.bin").unwrap(), data.to_vec());

    fs.delete_file("/workspace/it's here.bin").await.unwrap();
    assert!(docker.file("/workspace/it's here.bin").is_none());
    // Deleting again is harmless.
    fs.delete_file("/workspace/it's here.bin").await.unwrap();
}

#[tokio::test]
async fn test_create_folder_is_idempotent() {
    let (docker, orchestrator) = setup();
    let sandbox = orchestrator.create(&CreateParams::new("pw")).await.unwrap();
    let mode = Permissions::parse("750").unwrap();

    sandbox.fs().create_folder("/workspace/out", &mode).await.unwrap();
    sandbox.fs().create_folder("/workspace/out", &mode).await.unwrap();

    assert_eq!(docker.mode("/workspace/out").as_deref(), Some("750"));
}

#[tokio::test]
async fn test_set_permissions() {
    let (docker, orchestrator) = setup();
    let sandbox = orchestrator.create(&CreateParams::new("pw")).await.unwrap();
    let fs = sandbox.fs();

    fs.upload_file("/tmp/run.sh", Bytes::from_static(b"#!/bin/sh\n"))
        .await
        .unwrap();
    fs.set_file_permissions("/tmp/run.sh", &Permissions::parse("700").unwrap())
        .await
        .unwrap();
    assert_eq!(docker.mode("/tmp/run.sh").as_deref(), Some("700"));

    // chmod on a missing path fails inside the container but not for the caller.
    fs.set_file_permissions("/tmp/missing", &Permissions::default())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_missing_runtime_is_an_error() {
    let docker = Arc::new(FakeDocker::new());
    let settings = LocalSettings {
        docker_bin: "not-docker".to_string(),
        ..Default::default()
    };
    let orchestrator = Orchestrator::new(LocalBackend::with_runner(settings, docker));

    let err = orchestrator.create(&CreateParams::new("pw")).await.unwrap_err();
    assert!(matches!(err, CoreError::Command { .. }));
}
