use crate::api::RagBackend;
use std::cell::Cell;
use std::sync::Arc;

pub const UNREACHABLE_ADVISORY: &str = "cannot reach backend service.";
pub const NOT_READY_ADVISORY: &str =
    "generation backend lacks required credentials; answers will be limited.";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionStatus {
    Checking,
    Connected,
    Disconnected,
}

impl ConnectionStatus {
    pub fn label(self) -> &'static str {
        match self {
            ConnectionStatus::Connected => "System Online",
            ConnectionStatus::Checking | ConnectionStatus::Disconnected => "System Offline",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ConnectivityState {
    /// `None` until the first probe resolves.
    pub reachable: Option<bool>,
    /// Only meaningful when `reachable == Some(true)`.
    pub generation_ready: bool,
}

impl ConnectivityState {
    pub fn status(&self) -> ConnectionStatus {
        match self.reachable {
            None => ConnectionStatus::Checking,
            Some(true) => ConnectionStatus::Connected,
            Some(false) => ConnectionStatus::Disconnected,
        }
    }

    pub fn advisory(&self) -> Option<&'static str> {
        match self.reachable {
            None => None,
            Some(false) => Some(UNREACHABLE_ADVISORY),
            Some(true) if self.generation_ready => None,
            Some(true) => Some(NOT_READY_ADVISORY),
        }
    }
}

/// Probes the service once per call. There is no background polling.
pub struct ConnectivityMonitor {
    backend: Arc<dyn RagBackend>,
    state: Cell<ConnectivityState>,
}

impl ConnectivityMonitor {
    pub fn new(backend: Arc<dyn RagBackend>) -> Self {
        Self {
            backend,
            state: Cell::new(ConnectivityState::default()),
        }
    }

    pub fn state(&self) -> ConnectivityState {
        self.state.get()
    }

    pub fn status(&self) -> ConnectionStatus {
        self.state.get().status()
    }

    pub fn advisory(&self) -> Option<&'static str> {
        self.state.get().advisory()
    }

    pub async fn check_status(&self) -> ConnectionStatus {
        let next = match self.backend.status().await {
            Ok(report) => {
                if report.llm_ready {
                    tracing::info!("document service is online");
                } else {
                    tracing::warn!("document service is online but not ready to generate answers");
                }
                ConnectivityState {
                    reachable: Some(true),
                    generation_ready: report.llm_ready,
                }
            }
            Err(err) => {
                tracing::warn!("document service unreachable: {}", err);
                ConnectivityState {
                    reachable: Some(false),
                    generation_ready: false,
                }
            }
        };
        self.state.set(next);
        next.status()
    }
}
