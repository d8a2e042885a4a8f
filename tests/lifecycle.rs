//! Startup, watch and shutdown behavior of the assembled server.

use std::time::Duration;

use config_plane_client::{ClientError, SubscriberClient};

mod common;
use common::*;

#[tokio::test]
async fn test_pid_file_written_and_removed() {
    let server = start_plane(write_full_set, |_| {}).await;
    let pid_file = server.state.path().join("config-plane.pid");

    let contents = std::fs::read_to_string(&pid_file).unwrap();
    assert_eq!(contents.trim(), std::process::id().to_string());

    server.plane.stop().await;
    assert!(!pid_file.exists());
}

#[tokio::test]
async fn test_shutdown_closes_sessions() {
    let server = start_plane(write_full_set, |_| {}).await;
    let mut client = server.connect("edge-1").await;
    take(&mut client, 4).await;
    assert_eq!(server.plane.engine().active_sessions(), 1);

    let url = server.ws_url();
    let engine = server.plane.engine().clone();
    tokio::time::timeout(PATIENCE, server.plane.stop()).await.unwrap();
    assert_eq!(engine.active_sessions(), 0);

    match client.next_push_within(PATIENCE).await {
        Err(ClientError::Closed | ClientError::WebSocket(_)) => {}
        Err(other) => panic!("unexpected error: {other}"),
        Ok(None) => panic!("session still open after shutdown"),
        Ok(Some(push)) => panic!("unexpected push after shutdown: {push:?}"),
    }
    assert!(SubscriberClient::connect(&url, "edge-2").await.is_err());
}

#[tokio::test]
async fn test_watch_mode_picks_up_new_files() {
    let server = start_plane(write_full_set, |c| {
        c.sources.watch = true;
        c.sources.debounce_ms = 50;
    })
    .await;
    let mut client = server.connect("edge-1").await;
    let pushes = take(&mut client, 4).await;
    ack_all(&mut client, &pushes).await;

    // Give the watcher a moment to register before touching the directory.
    tokio::time::sleep(Duration::from_millis(100)).await;
    write(server.dir(), "50-listener.json", &listener("l2", "r1"));

    let update = take(&mut client, 1).await;
    assert_eq!(update[0].kind, "listener");
    assert_eq!(update[0].names(), vec!["l1".to_string(), "l2".to_string()]);

    server.plane.stop().await;
}

#[tokio::test]
async fn test_unknown_node_id_still_served() {
    let server = start_plane(write_full_set, |_| {}).await;
    let mut client = SubscriberClient::connect(&server.ws_url(), "").await.unwrap();
    let pushes = take(&mut client, 4).await;
    assert_eq!(pushes[0].version_info, "v0");

    server.plane.stop().await;
}

#[tokio::test]
async fn test_start_fails_on_taken_port() {
    let first = start_plane(write_full_set, |_| {}).await;
    let taken = first.plane.discovery_addr().to_string();

    let resources = tempfile::tempdir().unwrap();
    let mut config = config_plane::ServerConfig::default();
    config.listener.bind_address = taken;
    config.sources.directories = vec![resources.path().to_path_buf()];
    config.lifecycle.pid_file = resources.path().join("pid");

    let result = config_plane::ConfigPlane::start(config, config_plane::Shutdown::new()).await;
    assert!(matches!(result, Err(config_plane::StartError::Discovery(_))));

    first.plane.stop().await;
}
