// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Asynchronous worker invocation and liveness polling.

use async_trait::async_trait;
use fg_core::{ActivationId, JobKey, JobParams};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use thiserror::Error;

/// Errors from launcher operations
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("spawn failed: {0}")]
    SpawnFailed(String),
    #[error("liveness check failed: {0}")]
    ProbeFailed(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Parameters forwarded to one worker invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerRequest {
    pub job_key: JobKey,
    pub batch_number: u32,
    pub params: JobParams,
}

/// Launches workers fire-and-forget and answers whether a handle is alive.
#[async_trait]
pub trait WorkerLauncher: Clone + Send + Sync + 'static {
    async fn invoke(&self, action: &str, request: &WorkerRequest)
        -> Result<ActivationId, LaunchError>;

    async fn is_alive(&self, activation: &ActivationId) -> Result<bool, LaunchError>;
}

/// Launches `fgp worker` as a detached child process.
///
/// Each activation gets `<activations_dir>/<id>.pid`; liveness is a
/// signal-0 probe of that pid.
#[derive(Clone, Debug)]
pub struct ProcessLauncher {
    program: PathBuf,
    activations_dir: PathBuf,
    envs: Vec<(String, String)>,
}

impl ProcessLauncher {
    pub fn new(program: impl Into<PathBuf>, activations_dir: impl Into<PathBuf>) -> Self {
        Self { program: program.into(), activations_dir: activations_dir.into(), envs: Vec::new() }
    }

    /// Extra environment passed to every launched worker.
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    fn pid_path(&self, activation: &ActivationId) -> PathBuf {
        pid_path(&self.activations_dir, activation)
    }

    /// Drop the pid file of a finished activation; it then probes as dead.
    pub fn remove_handle(&self, activation: &ActivationId) -> std::io::Result<()> {
        match std::fs::remove_file(self.pid_path(activation)) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}

fn pid_path(dir: &Path, activation: &ActivationId) -> PathBuf {
    dir.join(format!("{}.pid", activation.as_str()))
}

#[async_trait]
impl WorkerLauncher for ProcessLauncher {
    async fn invoke(
        &self,
        action: &str,
        request: &WorkerRequest,
    ) -> Result<ActivationId, LaunchError> {
        let activation = ActivationId::new();
        tokio::fs::create_dir_all(&self.activations_dir).await?;
        let params = serde_json::to_string(&request.params)
            .map_err(|e| LaunchError::SpawnFailed(format!("failed to encode params: {}", e)))?;

        let mut cmd = tokio::process::Command::new(&self.program);
        cmd.arg("worker")
            .arg("--action")
            .arg(action)
            .arg("--job-key")
            .arg(request.job_key.as_str())
            .arg("--batch")
            .arg(request.batch_number.to_string())
            .arg("--params")
            .arg(params)
            .envs(self.envs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .env("FG_ACTIVATION_ID", activation.as_str())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        let mut child = cmd.spawn().map_err(|e| {
            LaunchError::SpawnFailed(format!("failed to spawn {}: {}", self.program.display(), e))
        })?;
        let pid = child
            .id()
            .ok_or_else(|| LaunchError::SpawnFailed("worker exited before reporting a pid".into()))?;
        tokio::fs::write(self.pid_path(&activation), pid.to_string()).await?;

        // Reap the child so a finished worker does not linger as a zombie
        // (which would still answer the liveness probe).
        let reaper_id = activation.clone();
        tokio::spawn(async move {
            match child.wait().await {
                Ok(status) => tracing::info!(activation_id = %reaper_id, %status, "worker exited"),
                Err(e) => {
                    tracing::error!(activation_id = %reaper_id, error = %e, "failed to wait on worker")
                }
            }
        });

        tracing::info!(
            activation_id = %activation,
            job_key = %request.job_key,
            batch = request.batch_number,
            pid,
            action,
            "worker launched"
        );
        Ok(activation)
    }

    async fn is_alive(&self, activation: &ActivationId) -> Result<bool, LaunchError> {
        let content = match tokio::fs::read_to_string(self.pid_path(activation)).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e.into()),
        };
        let pid: i32 = content
            .trim()
            .parse()
            .map_err(|_| LaunchError::ProbeFailed(format!("bad pid file for {}", activation)))?;
        probe_pid(pid)
    }
}

/// Signal-0 probe: delivers nothing, only checks the process exists.
fn probe_pid(pid: i32) -> Result<bool, LaunchError> {
    use nix::errno::Errno;
    use nix::sys::signal::kill;
    use nix::unistd::Pid;

    match kill(Pid::from_raw(pid), None) {
        Ok(()) => Ok(!is_zombie(pid)),
        Err(Errno::ESRCH) => Ok(false),
        // Exists but owned by someone else
        Err(Errno::EPERM) => Ok(true),
        Err(e) => Err(LaunchError::ProbeFailed(e.to_string())),
    }
}

/// An exited child nobody reaped still answers signal 0.
fn is_zombie(pid: i32) -> bool {
    let Ok(stat) = std::fs::read_to_string(format!("/proc/{pid}/stat")) else {
        return false;
    };
    // Fields after the parenthesized command name start with the state.
    stat.rsplit_once(')').is_some_and(|(_, rest)| rest.trim_start().starts_with('Z'))
}

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod fake {
    use super::{LaunchError, WorkerLauncher, WorkerRequest};
    use async_trait::async_trait;
    use fg_core::ActivationId;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::Arc;

    /// Recorded invocation
    #[derive(Debug, Clone)]
    pub struct LaunchCall {
        pub action: String,
        pub request: WorkerRequest,
        pub activation_id: ActivationId,
    }

    #[derive(Default)]
    struct FakeLauncherState {
        calls: Vec<LaunchCall>,
        alive: HashMap<ActivationId, bool>,
        fail_invoke: bool,
        fail_liveness: bool,
    }

    /// Fake launcher for testing.
    ///
    /// Activations are numbered `act-1`, `act-2`, ... and stay alive until
    /// [`FakeLauncher::finish`] is called.
    #[derive(Clone, Default)]
    pub struct FakeLauncher {
        inner: Arc<Mutex<FakeLauncherState>>,
    }

    impl FakeLauncher {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn calls(&self) -> Vec<LaunchCall> {
            self.inner.lock().calls.clone()
        }

        /// Batch numbers in invocation order
        pub fn launched_batches(&self) -> Vec<u32> {
            self.inner.lock().calls.iter().map(|c| c.request.batch_number).collect()
        }

        pub fn finish(&self, activation: &ActivationId) {
            self.inner.lock().alive.insert(activation.clone(), false);
        }

        pub fn finish_all(&self) {
            for alive in self.inner.lock().alive.values_mut() {
                *alive = false;
            }
        }

        pub fn set_fail_invoke(&self, fail: bool) {
            self.inner.lock().fail_invoke = fail;
        }

        pub fn set_fail_liveness(&self, fail: bool) {
            self.inner.lock().fail_liveness = fail;
        }
    }

    #[async_trait]
    impl WorkerLauncher for FakeLauncher {
        async fn invoke(
            &self,
            action: &str,
            request: &WorkerRequest,
        ) -> Result<ActivationId, LaunchError> {
            let mut inner = self.inner.lock();
            if inner.fail_invoke {
                return Err(LaunchError::SpawnFailed("launcher unavailable".into()));
            }
            let activation_id = ActivationId::from_string(format!("act-{}", inner.calls.len() + 1));
            inner.alive.insert(activation_id.clone(), true);
            inner.calls.push(LaunchCall {
                action: action.to_string(),
                request: request.clone(),
                activation_id: activation_id.clone(),
            });
            Ok(activation_id)
        }

        async fn is_alive(&self, activation: &ActivationId) -> Result<bool, LaunchError> {
            let inner = self.inner.lock();
            if inner.fail_liveness {
                return Err(LaunchError::ProbeFailed("probe unavailable".into()));
            }
            Ok(inner.alive.get(activation).copied().unwrap_or(false))
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeLauncher, LaunchCall};

#[cfg(test)]
#[path = "launcher_tests.rs"]
mod tests;
