//! End-to-end distribution tests over a real WebSocket.

use config_plane_client::{AdminClient, ClientError, SubscriberClient};

mod common;
use common::*;

#[tokio::test]
async fn test_push_on_connect_in_dependency_order() {
    let server = start_plane(write_full_set, |_| {}).await;
    let mut client = server.connect("edge-1").await;

    let pushes = take(&mut client, 4).await;
    let kinds: Vec<_> = pushes.iter().map(|p| p.kind.as_str()).collect();
    assert_eq!(kinds, ["cluster", "endpoint_assignment", "route_configuration", "listener"]);
    assert!(pushes.iter().all(|p| p.version_info == "v0"));
    assert_eq!(pushes[0].type_url, "type.config-plane.dev/Cluster");
    assert_eq!(pushes[1].names(), vec!["c1".to_string()]);
    assert_eq!(pushes[2].names(), vec!["r1".to_string()]);
    assert_eq!(pushes[2].resources[0]["@type"], "type.config-plane.dev/RouteConfiguration");

    server.plane.stop().await;
}

#[tokio::test]
async fn test_identical_pass_is_not_repushed() {
    let server = start_plane(write_full_set, |_| {}).await;
    let mut client = server.connect("edge-1").await;
    let pushes = take(&mut client, 4).await;
    ack_all(&mut client, &pushes).await;

    assert!(server.reconcile(1).await, "identical pass still commits");
    assert_eq!(server.plane.last_report().unwrap().version.to_string(), "v1");
    assert!(client.next_push_within(QUIET).await.unwrap().is_none());

    server.plane.stop().await;
}

#[tokio::test]
async fn test_identical_pass_repushed_when_suppression_disabled() {
    let server = start_plane(write_full_set, |c| c.distribution.suppress_identical_pushes = false).await;
    let mut client = server.connect("edge-1").await;
    let pushes = take(&mut client, 4).await;
    ack_all(&mut client, &pushes).await;

    assert!(server.reconcile(1).await);
    let again = take(&mut client, 4).await;
    assert!(again.iter().all(|p| p.version_info == "v1"));

    server.plane.stop().await;
}

#[tokio::test]
async fn test_only_changed_kinds_follow_an_update() {
    let server = start_plane(write_full_set, |_| {}).await;
    let mut client = server.connect("edge-1").await;
    let pushes = take(&mut client, 4).await;
    ack_all(&mut client, &pushes).await;

    write(server.dir(), "15-cluster.json", &cluster("c2"));
    write(server.dir(), "30-route.json", &route("r1", "c2"));
    assert!(server.reconcile(1).await);

    let update = take(&mut client, 2).await;
    assert_eq!(update[0].kind, "cluster");
    assert_eq!(update[0].names(), vec!["c1".to_string(), "c2".to_string()]);
    assert_eq!(update[1].kind, "route_configuration");
    assert!(update.iter().all(|p| p.version_info == "v1"));
    assert!(client.next_push_within(QUIET).await.unwrap().is_none());

    server.plane.stop().await;
}

#[tokio::test]
async fn test_rejected_candidate_keeps_previous_snapshot() {
    let server = start_plane(write_full_set, |_| {}).await;
    let mut client = server.connect("edge-1").await;
    let pushes = take(&mut client, 4).await;
    ack_all(&mut client, &pushes).await;

    write(server.dir(), "30-route.json", &route("r1", "missing"));
    assert!(!server.reconcile(1).await, "dangling reference is rejected");
    assert!(client.next_push_within(QUIET).await.unwrap().is_none());

    let mut late = server.connect("edge-2").await;
    let pushes = take(&mut late, 4).await;
    assert!(pushes.iter().all(|p| p.version_info == "v0"));

    // The next good pass skips the consumed version.
    write(server.dir(), "30-route.json", &route("r1", "c1"));
    write(server.dir(), "50-listener.json", &listener("l2", "r1"));
    assert!(server.reconcile(2).await);
    let update = take(&mut client, 1).await;
    assert_eq!(update[0].kind, "listener");
    assert_eq!(update[0].version_info, "v2");

    server.plane.stop().await;
}

#[tokio::test]
async fn test_late_joiner_gets_latest_snapshot() {
    let server = start_plane(write_full_set, |_| {}).await;

    write(server.dir(), "50-listener.json", &listener("l2", "r1"));
    assert!(server.reconcile(1).await);
    write(server.dir(), "60-listener.json", &listener("l3", "r1"));
    assert!(server.reconcile(2).await);

    let mut client = server.connect("edge-late").await;
    let pushes = take(&mut client, 4).await;
    assert!(pushes.iter().all(|p| p.version_info == "v2"));
    assert_eq!(
        pushes[3].names(),
        vec!["l1".to_string(), "l2".to_string(), "l3".to_string()]
    );

    server.plane.stop().await;
}

#[tokio::test]
async fn test_empty_directory_pushes_empty_kinds() {
    let server = start_plane(|_| {}, |_| {}).await;
    let mut client = server.connect("edge-1").await;
    let pushes = take(&mut client, 4).await;
    assert!(pushes.iter().all(|p| p.resources.is_empty()));

    server.plane.stop().await;
}

#[tokio::test]
async fn test_disconnect_does_not_affect_other_sessions() {
    let server = start_plane(write_full_set, |_| {}).await;
    let mut a = server.connect("edge-a").await;
    let mut b = server.connect("edge-b").await;
    let pushes_a = take(&mut a, 4).await;
    let pushes_b = take(&mut b, 4).await;
    ack_all(&mut a, &pushes_a).await;
    ack_all(&mut b, &pushes_b).await;

    a.close().await.unwrap();

    write(server.dir(), "50-listener.json", &listener("l2", "r1"));
    assert!(server.reconcile(1).await);
    let update = take(&mut b, 1).await;
    assert_eq!(update[0].kind, "listener");

    server.plane.stop().await;
}

#[tokio::test]
async fn test_garbage_frames_are_ignored() {
    let server = start_plane(write_full_set, |_| {}).await;
    let mut client = server.connect("edge-1").await;
    let pushes = take(&mut client, 4).await;

    client.send_text("not json".into()).await.unwrap();
    client.send_text(r#"{"type":"ack","kind":"secret","nonce":"1"}"#.into()).await.unwrap();
    ack_all(&mut client, &pushes).await;

    write(server.dir(), "50-listener.json", &listener("l2", "r1"));
    assert!(server.reconcile(1).await);
    assert_eq!(take(&mut client, 1).await[0].version_info, "v1");

    server.plane.stop().await;
}

#[tokio::test]
async fn test_nack_is_recorded_and_kind_stays_pending() {
    let server = start_plane(write_full_set, |_| {}).await;
    let admin = AdminClient::new(&server.admin_url(), ADMIN_KEY);
    let mut client = server.connect("edge-1").await;
    let pushes = take(&mut client, 4).await;

    client.ack(&pushes[0]).await.unwrap();
    client.ack(&pushes[1]).await.unwrap();
    client.nack(&pushes[2], "route rejected by proxy").await.unwrap();
    client.ack(&pushes[3]).await.unwrap();

    let deadline = tokio::time::Instant::now() + PATIENCE;
    let session = loop {
        let sessions = admin.sessions().await.unwrap();
        let session = sessions[0].clone();
        if session["listener"]["state"] == "acked" {
            break session;
        }
        assert!(tokio::time::Instant::now() < deadline, "acks processed in time");
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    };

    assert_eq!(session["node_id"], "edge-1");
    assert_eq!(session["cluster"]["acked_version"], "v0");
    assert_eq!(session["route_configuration"]["state"], "pending");
    assert_eq!(session["route_configuration"]["last_error"], "route rejected by proxy");

    server.plane.stop().await;
}

#[tokio::test]
async fn test_session_cap_refuses_with_503() {
    let server = start_plane(write_full_set, |c| c.listener.max_sessions = 1).await;
    let _first = server.connect("edge-1").await;

    match SubscriberClient::connect(&server.ws_url(), "edge-2").await {
        Err(ClientError::Refused(status)) => assert_eq!(status, 503),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("second session accepted over the cap"),
    }

    server.plane.stop().await;
}
