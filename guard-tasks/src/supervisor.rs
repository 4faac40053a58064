//! Supervised background tasks.
//!
//! Slow region work (profile lookups, renames of large region sets, saves)
//! runs off the command thread. The [`Supervisor`] spawns it, bounds how many
//! jobs run at once, and keeps a list of what is running so that operators can
//! see it and cancel it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{TaskError, TaskResult};

/// Supervisor limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SupervisorConfig {
    /// Jobs allowed to run at once; the rest wait for a slot
    pub max_concurrent: usize,

    /// Time limit applied to every job
    pub default_timeout: Option<Duration>,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 8,
            default_timeout: Some(Duration::from_secs(60)),
        }
    }
}

impl SupervisorConfig {
    /// Load from `GUARD_TASKS_MAX_CONCURRENT` and `GUARD_TASKS_TIMEOUT_SECS`.
    ///
    /// A timeout of 0 disables the time limit.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let max_concurrent = std::env::var("GUARD_TASKS_MAX_CONCURRENT")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|n: &usize| *n > 0)
            .unwrap_or(defaults.max_concurrent);
        let default_timeout = std::env::var("GUARD_TASKS_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(|secs| (secs > 0).then(|| Duration::from_secs(secs)))
            .unwrap_or(defaults.default_timeout);

        Self {
            max_concurrent,
            default_timeout,
        }
    }

    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.default_timeout = timeout;
        self
    }
}

/// What a running job is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskInfo {
    pub id: Uuid,
    pub description: String,
    /// Name of whoever started the job, if anyone
    pub owner: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

struct Entry {
    info: TaskInfo,
    abort: AbortHandle,
}

type Registry = Arc<Mutex<HashMap<Uuid, Entry>>>;

/// Removes a job from the registry when the job ends, however it ends.
struct Deregister {
    tasks: Registry,
    id: Uuid,
}

impl Drop for Deregister {
    fn drop(&mut self) {
        self.tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.id);
    }
}

/// Runs and tracks background jobs.
#[derive(Clone)]
pub struct Supervisor {
    config: SupervisorConfig,
    tasks: Registry,
    permits: Arc<Semaphore>,
}

impl std::fmt::Debug for Supervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Supervisor")
            .field("config", &self.config)
            .field("running", &self.len())
            .finish()
    }
}

impl Default for Supervisor {
    fn default() -> Self {
        Self::new(SupervisorConfig::default())
    }
}

impl Supervisor {
    pub fn new(config: SupervisorConfig) -> Self {
        let permits = Arc::new(Semaphore::new(config.max_concurrent.max(1)));
        Self {
            config,
            tasks: Arc::new(Mutex::new(HashMap::new())),
            permits,
        }
    }

    pub fn config(&self) -> &SupervisorConfig {
        &self.config
    }

    /// Spawn a job. Must be called from within a tokio runtime.
    pub fn submit<F, T>(
        &self,
        description: impl Into<String>,
        owner: Option<String>,
        job: F,
    ) -> TaskHandle<T>
    where
        F: Future<Output = TaskResult<T>> + Send + 'static,
        T: Send + 'static,
    {
        let info = TaskInfo {
            id: Uuid::now_v7(),
            description: description.into(),
            owner,
            submitted_at: Utc::now(),
        };

        let guard = Deregister {
            tasks: self.tasks.clone(),
            id: info.id,
        };
        let permits = self.permits.clone();
        let timeout = self.config.default_timeout;
        let id = info.id;

        // The job cannot deregister itself before it is registered.
        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        let join = tokio::spawn(async move {
            let _guard = guard;
            let _permit = permits
                .acquire_owned()
                .await
                .map_err(|_| TaskError::Cancelled)?;
            debug!(task = %id, "Task started");

            match timeout {
                Some(limit) => tokio::time::timeout(limit, job).await.unwrap_or_else(|_| {
                    warn!(task = %id, "Task timed out");
                    Err(TaskError::TimedOut(limit))
                }),
                None => job.await,
            }
        });
        tasks.insert(
            id,
            Entry {
                info: info.clone(),
                abort: join.abort_handle(),
            },
        );
        drop(tasks);

        info!(task = %id, description = %info.description, "Task submitted");
        TaskHandle { info, join }
    }

    /// Jobs that have not finished, oldest first.
    pub fn running(&self) -> Vec<TaskInfo> {
        let tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        let mut list: Vec<TaskInfo> = tasks.values().map(|e| e.info.clone()).collect();
        list.sort_by(|a, b| a.submitted_at.cmp(&b.submitted_at).then(a.id.cmp(&b.id)));
        list
    }

    /// Cancel one job. Returns `false` if it is not running.
    pub fn cancel(&self, id: &Uuid) -> bool {
        let tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        match tasks.get(id) {
            Some(entry) => {
                entry.abort.abort();
                info!(task = %id, "Task cancelled");
                true
            }
            None => false,
        }
    }

    /// Cancel every job. Returns how many were running.
    pub fn cancel_all(&self) -> usize {
        let tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        for entry in tasks.values() {
            entry.abort.abort();
        }
        if !tasks.is_empty() {
            info!(count = tasks.len(), "Cancelled all tasks");
        }
        tasks.len()
    }

    pub fn len(&self) -> usize {
        self.tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_idle(&self) -> bool {
        self.len() == 0
    }
}

/// Handle to one submitted job.
#[derive(Debug)]
pub struct TaskHandle<T> {
    info: TaskInfo,
    join: JoinHandle<TaskResult<T>>,
}

impl<T> TaskHandle<T> {
    pub fn id(&self) -> Uuid {
        self.info.id
    }

    pub fn info(&self) -> &TaskInfo {
        &self.info
    }

    pub fn cancel(&self) {
        self.join.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Wait for the job's result.
    pub async fn join(self) -> TaskResult<T> {
        match self.join.await {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => Err(TaskError::Cancelled),
            Err(e) => Err(TaskError::Failed(e.to_string())),
        }
    }
}
