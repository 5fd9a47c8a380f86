// Solo Pool - Free and Open Source Software Statement
//
// This project, solo-pool, is Free and Open Source Software (FOSS) licensed
// under the MIT License. You are free to use, modify, and distribute this
// software in accordance with the license terms. Contributions are welcome
// via pull requests to the project repository.
//
// File: src/stats/pool_stats.rs
// Version: 2.0.0
// Developer: OIEIEIO <oieieio@protonmail.com>
//
// This file tracks pool-wide statistics, located in the stats subdirectory.
// Counters are lock-free atomics; the one-minute share window and the best
// share sit behind short-lived mutexes. The dashboard logs a snapshot in the
// same tree layout the miner used.
//
// Tree Location:
// - src/stats/pool_stats.rs (pool statistics and dashboard)
// - Depends on: log, crate::utils::format

use crate::core::difficulty::zero_bits_to_difficulty;
use crate::utils::format::FormatUtils;
use log::info;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

const LOG_TARGET: &str = "solo_pool::stats";

/// Span of the hashrate estimate
pub const HASHRATE_WINDOW: Duration = Duration::from_secs(60);

/// Hashes per unit of share difficulty
const HASHES_PER_DIFFICULTY: f64 = 4_294_967_296.0;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BestShare {
    pub difficulty: f64,
    pub zero_bits: u32,
    pub worker: String,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct PoolStats {
    start_time: Instant,
    pub shares_submitted: AtomicU64,
    pub shares_accepted: AtomicU64,
    pub shares_rejected: AtomicU64,
    pub jobs_sent: AtomicU64,
    pub blocks_found: AtomicU64,
    pub current_height: AtomicU64,
    network_difficulty: AtomicU64,
    best_share: Mutex<BestShare>,
    last_share: Mutex<Option<Instant>>,
    /// Accepted shares in the last minute, as (time, assigned difficulty)
    recent_shares: Mutex<VecDeque<(Instant, f64)>>,
}

impl Default for PoolStats {
    fn default() -> Self {
        Self::new()
    }
}

impl PoolStats {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            shares_submitted: AtomicU64::new(0),
            shares_accepted: AtomicU64::new(0),
            shares_rejected: AtomicU64::new(0),
            jobs_sent: AtomicU64::new(0),
            blocks_found: AtomicU64::new(0),
            current_height: AtomicU64::new(0),
            network_difficulty: AtomicU64::new(0f64.to_bits()),
            best_share: Mutex::new(BestShare::default()),
            last_share: Mutex::new(None),
            recent_shares: Mutex::new(VecDeque::with_capacity(256)),
        }
    }

    /// Records an accepted share credited at `difficulty` whose hash reached
    /// `hash_difficulty` with `zero_bits` leading zero bits.
    pub fn record_accepted(&self, difficulty: f64, hash_difficulty: f64, zero_bits: u32, worker: &str) {
        self.record_accepted_at(Instant::now(), difficulty, hash_difficulty, zero_bits, worker);
    }

    fn record_accepted_at(
        &self,
        now: Instant,
        difficulty: f64,
        hash_difficulty: f64,
        zero_bits: u32,
        worker: &str,
    ) {
        self.shares_submitted.fetch_add(1, Ordering::Relaxed);
        self.shares_accepted.fetch_add(1, Ordering::Relaxed);

        {
            let mut shares = lock(&self.recent_shares);
            shares.push_back((now, difficulty));
            Self::prune(&mut shares, now);
        }
        *lock(&self.last_share) = Some(now);

        let mut best = lock(&self.best_share);
        if hash_difficulty > best.difficulty {
            *best = BestShare {
                difficulty: hash_difficulty,
                zero_bits,
                worker: worker.to_string(),
            };
        }
    }

    pub fn record_rejected(&self) {
        self.shares_submitted.fetch_add(1, Ordering::Relaxed);
        self.shares_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_job_sent(&self) {
        self.jobs_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_block_found(&self) {
        self.blocks_found.fetch_add(1, Ordering::Relaxed);
    }

    pub fn update_network(&self, height: u64, difficulty: f64) {
        self.current_height.store(height, Ordering::Relaxed);
        self.network_difficulty.store(difficulty.to_bits(), Ordering::Relaxed);
    }

    pub fn network_difficulty(&self) -> f64 {
        f64::from_bits(self.network_difficulty.load(Ordering::Relaxed))
    }

    pub fn best_share(&self) -> BestShare {
        lock(&self.best_share).clone()
    }

    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    fn prune(shares: &mut VecDeque<(Instant, f64)>, now: Instant) {
        while let Some((time, _)) = shares.front() {
            if now.duration_since(*time) > HASHRATE_WINDOW {
                shares.pop_front();
            } else {
                break;
            }
        }
    }

    /// Estimated hashrate from the accepted difficulty of the last minute.
    pub fn hashrate(&self) -> f64 {
        self.hashrate_at(Instant::now())
    }

    fn hashrate_at(&self, now: Instant) -> f64 {
        let mut shares = lock(&self.recent_shares);
        Self::prune(&mut shares, now);
        let total: f64 = shares.iter().map(|(_, d)| d).sum();
        total * HASHES_PER_DIFFICULTY / HASHRATE_WINDOW.as_secs_f64()
    }

    pub fn shares_per_second(&self) -> f64 {
        let now = Instant::now();
        let mut shares = lock(&self.recent_shares);
        Self::prune(&mut shares, now);
        shares.len() as f64 / HASHRATE_WINDOW.as_secs_f64()
    }

    pub fn acceptance_rate(&self) -> f64 {
        let submitted = self.shares_submitted.load(Ordering::Relaxed);
        if submitted == 0 {
            return 0.0;
        }
        self.shares_accepted.load(Ordering::Relaxed) as f64 / submitted as f64 * 100.0
    }

    pub fn display_dashboard(&self, dashboard_id: &str, workers_connected: usize) {
        let submitted = self.shares_submitted.load(Ordering::Relaxed);
        let accepted = self.shares_accepted.load(Ordering::Relaxed);
        let rejected = self.shares_rejected.load(Ordering::Relaxed);
        let best = self.best_share();
        let best_str = if best.difficulty == 0.0 {
            "None".to_string()
        } else {
            format!(
                "{} ({} zero bits, {}) by {}",
                FormatUtils::format_difficulty(best.difficulty),
                best.zero_bits,
                FormatUtils::format_difficulty(zero_bits_to_difficulty(best.zero_bits)),
                best.worker
            )
        };
        let last_share = match *lock(&self.last_share) {
            Some(time) => FormatUtils::format_duration(time.elapsed()),
            None => "never".to_string(),
        };

        info!(target: LOG_TARGET, "📊 POOL DASHBOARD - {}", dashboard_id);
        info!(target: LOG_TARGET, "├─ Uptime: {}", FormatUtils::format_uptime(self.uptime()));
        info!(target: LOG_TARGET, "├─ Connected Workers: {}", workers_connected);
        info!(target: LOG_TARGET, "├─ Pool Hashrate: {}", FormatUtils::format_hashrate(self.hashrate()));
        info!(target: LOG_TARGET, "├─ Share Rate: {:.3} shares/s", self.shares_per_second());
        info!(target: LOG_TARGET, "├─ Shares: {}/{} ({:.1}% accepted)", accepted, submitted, self.acceptance_rate());
        info!(target: LOG_TARGET, "├─ Rejected Shares: {}", rejected);
        info!(target: LOG_TARGET, "├─ Time Since Last Share: {}", last_share);
        info!(target: LOG_TARGET, "├─ Best Share: {}", best_str);
        info!(target: LOG_TARGET, "├─ Block Height: {}", self.current_height.load(Ordering::Relaxed));
        info!(target: LOG_TARGET, "├─ Network Difficulty: {}", FormatUtils::format_difficulty(self.network_difficulty()));
        info!(target: LOG_TARGET, "├─ Jobs Sent: {}", FormatUtils::format_number(self.jobs_sent.load(Ordering::Relaxed)));
        info!(target: LOG_TARGET, "└─ Blocks Found: {}", self.blocks_found.load(Ordering::Relaxed));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let stats = PoolStats::new();
        stats.record_accepted(1.0, 3.5, 33, "acct.rig");
        stats.record_rejected();
        assert_eq!(stats.shares_submitted.load(Ordering::Relaxed), 2);
        assert_eq!(stats.shares_accepted.load(Ordering::Relaxed), 1);
        assert_eq!(stats.shares_rejected.load(Ordering::Relaxed), 1);
        assert!((stats.acceptance_rate() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_best_share_only_improves() {
        let stats = PoolStats::new();
        stats.record_accepted(1.0, 8.0, 35, "a.one");
        stats.record_accepted(1.0, 2.0, 33, "a.two");
        let best = stats.best_share();
        assert_eq!(best.difficulty, 8.0);
        assert_eq!(best.zero_bits, 35);
        assert_eq!(best.worker, "a.one");
    }

    #[test]
    fn test_hashrate_window() {
        let stats = PoolStats::new();
        let start = Instant::now();
        stats.record_accepted_at(start, 60.0, 60.0, 38, "w");
        // 60 difficulty in 60 s is one difficulty-1 share per second
        let rate = stats.hashrate_at(start + Duration::from_secs(1));
        assert!((rate - HASHES_PER_DIFFICULTY).abs() < 1.0);
        assert_eq!(stats.hashrate_at(start + Duration::from_secs(61)), 0.0);
    }

    #[test]
    fn test_network_mirror() {
        let stats = PoolStats::new();
        stats.update_network(800_000, 57_119_871_304_635.31);
        assert_eq!(stats.current_height.load(Ordering::Relaxed), 800_000);
        assert_eq!(stats.network_difficulty(), 57_119_871_304_635.31);
    }
}

// Changelog:
// - v2.0.0 (2026-10-17): Reworked the miner statistics into pool statistics.
//   - One-minute accepted-difficulty window drives the hashrate estimate.
//   - Best share keeps hash difficulty and zero bits.
//   - Dashboard reports workers, network state, jobs sent and blocks found.
