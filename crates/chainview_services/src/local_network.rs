//! Local test-network controller.
//!
//! `GanacheService` owns the locally spawned `ganache` processes. A port is
//! probed over TCP first; anything that answers is then identified with a
//! `web3_clientVersion` JSON-RPC call, so a foreign process squatting on the
//! port is reported as incompatible instead of being reused.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::json;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

/// How long to wait for a TCP answer when probing a port.
const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// How long a freshly spawned node gets to start answering RPC.
const STARTUP_TIMEOUT: Duration = Duration::from_secs(15);

/// Poll interval while waiting for a spawned node to come up.
const STARTUP_POLL: Duration = Duration::from_millis(300);

/// What is currently listening on a local port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortStatus {
    /// Nothing is listening; the port can be taken.
    Free,
    /// A compatible local node is already running there.
    Running,
    /// Some other process owns the port.
    NotCompatible,
}

/// Errors from the local-network controller.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("port {0} is occupied by an incompatible process")]
    PortConflict(u16),

    #[error("failed to spawn local node: {0}")]
    Spawn(String),

    #[error("local node on port {0} did not start in time")]
    StartupTimeout(u16),
}

/// Controller for the local test network a `LocalProject` binds to.
#[async_trait]
pub trait LocalNetwork: Send + Sync {
    /// Probe what currently occupies `port`.
    async fn get_port_status(&self, port: u16) -> PortStatus;

    /// Ensure a compatible node runs on `port`, spawning one when the port
    /// is free. Fails with [`NetworkError::PortConflict`] when the port is
    /// held by an incompatible process.
    async fn start(&self, port: u16) -> Result<(), NetworkError>;

    /// Stop the node this controller spawned on `port`, if any.
    async fn stop(&self, port: u16) -> Result<(), NetworkError>;
}

/// Spawns and tracks `ganache` child processes, one per port.
pub struct GanacheService {
    client: reqwest::Client,
    processes: Mutex<HashMap<u16, Child>>,
}

impl std::fmt::Debug for GanacheService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ports: Vec<u16> = self.processes.lock().keys().copied().collect();
        f.debug_struct("GanacheService")
            .field("ports", &ports)
            .finish()
    }
}

impl Default for GanacheService {
    fn default() -> Self {
        Self::new()
    }
}

impl GanacheService {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            processes: Mutex::new(HashMap::new()),
        }
    }

    /// Ask whatever answers on `port` for its client version string.
    async fn client_version(&self, port: u16) -> Option<String> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "web3_clientVersion",
            "params": [],
        });
        let response = self
            .client
            .post(format!("http://127.0.0.1:{port}"))
            .timeout(PROBE_TIMEOUT)
            .json(&body)
            .send()
            .await
            .ok()?;
        let value: serde_json::Value = response.json().await.ok()?;
        value
            .get("result")
            .and_then(serde_json::Value::as_str)
            .map(str::to_string)
    }

    fn spawn_node(&self, port: u16) -> Result<Child, NetworkError> {
        Command::new("ganache")
            .arg("--port")
            .arg(port.to_string())
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| NetworkError::Spawn(e.to_string()))
    }
}

#[async_trait]
impl LocalNetwork for GanacheService {
    async fn get_port_status(&self, port: u16) -> PortStatus {
        let connect = tokio::time::timeout(
            PROBE_TIMEOUT,
            tokio::net::TcpStream::connect(("127.0.0.1", port)),
        )
        .await;

        match connect {
            Ok(Ok(_)) => match self.client_version(port).await {
                Some(version) if version.to_lowercase().contains("ganache") => {
                    debug!(port, version, "Port runs a compatible node");
                    PortStatus::Running
                }
                _ => PortStatus::NotCompatible,
            },
            _ => PortStatus::Free,
        }
    }

    async fn start(&self, port: u16) -> Result<(), NetworkError> {
        match self.get_port_status(port).await {
            PortStatus::Running => {
                debug!(port, "Node already running, start is a no-op");
                return Ok(());
            }
            PortStatus::NotCompatible => return Err(NetworkError::PortConflict(port)),
            PortStatus::Free => {}
        }

        let child = self.spawn_node(port)?;
        self.processes.lock().insert(port, child);

        // Wait for the node to answer RPC before reporting success.
        let deadline = tokio::time::Instant::now() + STARTUP_TIMEOUT;
        loop {
            if self.client_version(port).await.is_some() {
                info!(port, "Local node started");
                return Ok(());
            }
            if tokio::time::Instant::now() >= deadline {
                self.processes.lock().remove(&port);
                return Err(NetworkError::StartupTimeout(port));
            }
            tokio::time::sleep(STARTUP_POLL).await;
        }
    }

    async fn stop(&self, port: u16) -> Result<(), NetworkError> {
        let child = self.processes.lock().remove(&port);
        match child {
            Some(mut child) => {
                if let Err(e) = child.start_kill() {
                    warn!(port, error = %e, "Failed to kill local node");
                }
                info!(port, "Local node stopped");
            }
            None => debug!(port, "No tracked node on port, stop is a no-op"),
        }
        Ok(())
    }
}
