//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::path::Path;
use std::time::Duration;

use config_plane::config::ServerConfig;
use config_plane::{ConfigPlane, Shutdown};
use config_plane_client::{Push, SubscriberClient};
use tempfile::TempDir;

pub const ADMIN_KEY: &str = "test-admin-key";
pub const QUIET: Duration = Duration::from_millis(300);
pub const PATIENCE: Duration = Duration::from_secs(5);

pub fn cluster(name: &str) -> String {
    format!(
        r#"{{
            "@type": "type.config-plane.dev/Cluster",
            "name": "{name}",
            "connect_timeout_ms": 250,
            "hosts": [{{"host": "127.0.0.1", "port": 8080}}]
        }}"#
    )
}

pub fn eds_cluster(name: &str) -> String {
    format!(
        r#"{{
            "@type": "type.config-plane.dev/Cluster",
            "name": "{name}",
            "discovery": "eds"
        }}"#
    )
}

pub fn assignment_toml(cluster: &str) -> String {
    format!(
        r#"
"@type" = "type.config-plane.dev/EndpointAssignment"
cluster_name = "{cluster}"

[[endpoints]]
addresses = [{{ host = "10.0.0.1", port = 9000 }}]
"#
    )
}

pub fn route(name: &str, cluster: &str) -> String {
    format!(
        r#"{{
            "@type": "type.config-plane.dev/RouteConfiguration",
            "name": "{name}",
            "virtual_hosts": [{{
                "name": "all",
                "domains": ["*"],
                "routes": [{{"prefix": "/", "cluster": "{cluster}"}}]
            }}]
        }}"#
    )
}

pub fn listener(name: &str, route: &str) -> String {
    format!(
        r#"{{
            "@type": "type.config-plane.dev/Listener",
            "name": "{name}",
            "address": {{"host": "0.0.0.0", "port": 10000}},
            "route_config_name": "{route}"
        }}"#
    )
}

pub fn write(dir: &Path, file: &str, contents: &str) {
    std::fs::write(dir.join(file), contents).unwrap();
}

/// A cluster, its endpoints, a route to it and a listener on the route.
pub fn write_full_set(dir: &Path) {
    write(dir, "10-cluster.json", &eds_cluster("c1"));
    write(dir, "20-endpoints.toml", &assignment_toml("c1"));
    write(dir, "30-route.json", &route("r1", "c1"));
    write(dir, "40-listener.json", &listener("l1", "r1"));
}

pub struct TestPlane {
    pub plane: ConfigPlane,
    pub resources: TempDir,
    pub state: TempDir,
}

impl TestPlane {
    pub fn ws_url(&self) -> String {
        format!("ws://{}", self.plane.discovery_addr())
    }

    pub fn admin_url(&self) -> String {
        format!("http://{}", self.plane.admin_addr().expect("admin enabled"))
    }

    pub fn dir(&self) -> &Path {
        self.resources.path()
    }

    pub async fn connect(&self, node_id: &str) -> SubscriberClient {
        SubscriberClient::connect(&self.ws_url(), node_id).await.unwrap()
    }

    /// Fire a reconcile and wait until the pass with `generation` reports.
    pub async fn reconcile(&self, generation: u64) -> bool {
        let mut reports = self.plane.trigger().reports();
        self.plane.trigger().fire(config_plane::reconcile::TriggerReason::Admin);
        let report = tokio::time::timeout(
            PATIENCE,
            reports.wait_for(|r| r.as_ref().is_some_and(|r| r.version.generation() >= generation)),
        )
        .await
        .expect("reconcile finished in time")
        .expect("worker alive")
        .clone()
        .expect("report present");
        report.committed()
    }
}

/// Start a server on ephemeral ports over a fresh resource directory
/// populated by `populate`.
pub async fn start_plane(
    populate: impl FnOnce(&Path),
    tweak: impl FnOnce(&mut ServerConfig),
) -> TestPlane {
    let resources = tempfile::tempdir().unwrap();
    let state = tempfile::tempdir().unwrap();
    populate(resources.path());

    let mut config = ServerConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.sources.directories = vec![resources.path().to_path_buf()];
    config.lifecycle.pid_file = state.path().join("config-plane.pid");
    config.lifecycle.shutdown_grace_secs = 2;
    config.admin.enabled = true;
    config.admin.api_key = ADMIN_KEY.into();
    config.admin.bind_address = "127.0.0.1:0".into();
    tweak(&mut config);

    let plane = ConfigPlane::start(config, Shutdown::new()).await.unwrap();
    TestPlane { plane, resources, state }
}

/// Receive `n` pushes.
pub async fn take(client: &mut SubscriberClient, n: usize) -> Vec<Push> {
    let mut pushes = Vec::with_capacity(n);
    for _ in 0..n {
        let push = client
            .next_push_within(PATIENCE)
            .await
            .unwrap()
            .expect("push arrived in time");
        pushes.push(push);
    }
    pushes
}

pub async fn ack_all(client: &mut SubscriberClient, pushes: &[Push]) {
    for push in pushes {
        client.ack(push).await.unwrap();
    }
}
