// Solo Pool - Free and Open Source Software Statement
//
// This project, solo-pool, is Free and Open Source Software (FOSS) licensed
// under the MIT License. You are free to use, modify, and distribute this
// software in accordance with the license terms. Contributions are welcome
// via pull requests to the project repository.
//
// File: src/pool/registry.rs
// Version: 1.0.0
// Developer: OIEIEIO <oieieio@protonmail.com>
//
// This file keeps the set of live miner sessions, located in the pool
// subdirectory. It hands out session ids and extranonce1 values and fans new
// jobs out to every subscribed session. The map lock is only held to take a
// snapshot; notifications are queued after it is released.
//
// Tree Location:
// - src/pool/registry.rs (session registry and job broadcast)
// - Depends on: tokio, crate::pool::session

use crate::job::Job;
use crate::pool::session::SessionHandle;
use crate::stats::PoolStats;
use log::debug;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use tokio::sync::{Mutex, mpsc};

const LOG_TARGET: &str = "solo_pool::pool::registry";

pub struct Registry {
    sessions: Mutex<HashMap<u64, Arc<SessionHandle>>>,
    next_id: AtomicU64,
    next_extranonce1: AtomicU32,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            next_extranonce1: AtomicU32::new(1),
        }
    }

    /// Creates and registers a session with a fresh id and extranonce1.
    pub async fn register(
        &self,
        peer: SocketAddr,
        outbound: mpsc::UnboundedSender<String>,
        difficulty: f64,
    ) -> Arc<SessionHandle> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let extranonce1 = self.next_extranonce1.fetch_add(1, Ordering::Relaxed).to_be_bytes();
        let handle = Arc::new(SessionHandle::new(id, extranonce1, peer, outbound, difficulty));
        self.sessions.lock().await.insert(id, Arc::clone(&handle));
        handle
    }

    pub async fn remove(&self, id: u64) -> Option<Arc<SessionHandle>> {
        self.sessions.lock().await.remove(&id)
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.lock().await.is_empty()
    }

    pub async fn snapshot(&self) -> Vec<Arc<SessionHandle>> {
        self.sessions.lock().await.values().cloned().collect()
    }

    /// Sends `job` to every subscribed session that has not seen it yet.
    /// Returns the number of sessions notified.
    pub async fn broadcast(&self, job: &Job, stats: &PoolStats) -> usize {
        let sessions = self.snapshot().await;
        let mut notified = 0;
        for session in &sessions {
            if session.push_job(job, stats).await {
                notified += 1;
            }
        }
        debug!(target: LOG_TARGET,
            "Job {} sent to {}/{} sessions", job.id, notified, sessions.len()
        );
        notified
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Template;
    use crate::job::JobBuilder;

    fn peer() -> SocketAddr {
        "127.0.0.1:5000".parse().unwrap()
    }

    fn template(prev: &str) -> Template {
        Template {
            height: 200,
            previousblockhash: prev.repeat(32),
            bits: "1d00ffff".into(),
            coinbasevalue: 5_000_000_000,
            curtime: 1_700_000_000,
            version: 0x2000_0000,
            transactions: vec![],
        }
    }

    #[tokio::test]
    async fn test_unique_ids_and_extranonce() {
        let registry = Registry::new();
        let (tx, _rx) = mpsc::unbounded_channel();
        let a = registry.register(peer(), tx.clone(), 1.0).await;
        let b = registry.register(peer(), tx, 1.0).await;
        assert_ne!(a.id, b.id);
        assert_ne!(a.extranonce1, b.extranonce1);
        assert_eq!(registry.len().await, 2);
        assert!(registry.remove(a.id).await.is_some());
        assert!(registry.remove(a.id).await.is_none());
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_broadcast_skips_unsubscribed_and_sends_newer_jobs() {
        let registry = Registry::new();
        let stats = PoolStats::new();
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();
        let subscribed = registry.register(peer(), tx1, 1.0).await;
        let _idle = registry.register(peer(), tx2, 1.0).await;
        subscribed.state().await.subscribed = true;

        let builder = JobBuilder::new(vec![0x6a], b"/t/".to_vec());
        let first = builder.build(&template("00"), true).unwrap();
        assert_eq!(registry.broadcast(&first, &stats).await, 1);
        assert!(rx1.recv().await.unwrap().contains("mining.notify"));
        assert!(rx2.try_recv().is_err());

        let second = builder.build(&template("11"), true).unwrap();
        assert_eq!(registry.broadcast(&second, &stats).await, 1);
        let line = rx1.recv().await.unwrap();
        assert!(line.ends_with("true]}\n"));
        assert_eq!(subscribed.state().await.last_job_seq, second.seq);
    }
}

// Changelog:
// - v1.0.0 (2026-10-17): Initial session registry with snapshot-then-send broadcast.
