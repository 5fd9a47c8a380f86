// Solo Pool - Free and Open Source Software Statement
//
// This project, solo-pool, is Free and Open Source Software (FOSS) licensed
// under the MIT License. You are free to use, modify, and distribute this
// software in accordance with the license terms. Contributions are welcome
// via pull requests to the project repository.
//
// File: src/job/store.rs
// Version: 1.0.0
// Developer: OIEIEIO <oieieio@protonmail.com>
//
// This file keeps the current job and the recent jobs of the current tip,
// located in the job subdirectory. Jobs are immutable and shared by Arc; a
// new job is swapped in whole, so a reader never sees fields from two jobs.
//
// Tree Location:
// - src/job/store.rs (current/recent job store)
// - Depends on: tokio, crate::job::builder

use crate::job::builder::Job;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Jobs retained for validation of late submits on the same tip.
pub const MAX_RECENT_JOBS: usize = 16;

#[derive(Default)]
struct Jobs {
    current: Option<Arc<Job>>,
    by_id: HashMap<String, Arc<Job>>,
    order: VecDeque<String>,
}

#[derive(Default)]
pub struct JobStore {
    inner: RwLock<Jobs>,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `job` current. A clean job drops every older job.
    pub async fn install(&self, job: Arc<Job>) {
        let mut jobs = self.inner.write().await;
        if job.clean {
            jobs.by_id.clear();
            jobs.order.clear();
        }
        jobs.order.push_back(job.id.clone());
        jobs.by_id.insert(job.id.clone(), Arc::clone(&job));
        while jobs.order.len() > MAX_RECENT_JOBS {
            if let Some(old) = jobs.order.pop_front() {
                jobs.by_id.remove(&old);
            }
        }
        jobs.current = Some(job);
    }

    pub async fn current(&self) -> Option<Arc<Job>> {
        self.inner.read().await.current.clone()
    }

    pub async fn get(&self, job_id: &str) -> Option<Arc<Job>> {
        self.inner.read().await.by_id.get(job_id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.by_id.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.current.is_none()
    }
}


// Changelog:
// - v1.0.0 (2026-10-17): Initial job store with per-tip history.
