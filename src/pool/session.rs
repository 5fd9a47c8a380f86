// Solo Pool - Free and Open Source Software Statement
//
// This project, solo-pool, is Free and Open Source Software (FOSS) licensed
// under the MIT License. You are free to use, modify, and distribute this
// software in accordance with the license terms. Contributions are welcome
// via pull requests to the project repository.
//
// File: src/pool/session.rs
// Version: 1.3.0
// Developer: OIEIEIO <oieieio@protonmail.com>
//
// This file implements the per-miner Stratum session, located in the pool
// subdirectory. A SessionHandle is the shared part (identity, outbound queue,
// mutable state) that the registry can reach for broadcasts; a Session is the
// connection-owned request handler that walks a miner through subscribe,
// authorize and submit, validating every share against the job it names.
//
// Tree Location:
// - src/pool/session.rs (session state and request handling)
// - Depends on: tokio, serde_json, crate::core, crate::job, crate::stats

use crate::core::codec::{reverse32, sha256d};
use crate::core::difficulty::{
    count_leading_zero_bits, difficulty_to_zero_bits, hash_difficulty, hash_meets_target,
};
use crate::core::error::StratumError;
use crate::core::types::PoolConfig;
use crate::job::{EXTRANONCE1_SIZE, Job};
use crate::pool::messages::{Request, Response, SubmitParams, parse_line};
use crate::pool::poller::BlockCandidate;
use crate::pool::protocol::StratumProtocol;
use crate::pool::server::PoolContext;
use crate::stats::PoolStats;
use crate::utils::format::FormatUtils;
use log::{debug, info, warn};
use serde::Serialize;
use serde_json::{Value, json};
use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, MutexGuard, mpsc};

const LOG_TARGET: &str = "solo_pool::pool::session";

/// Largest single vardiff step up
const MAX_RETARGET_FACTOR: f64 = 4.0;
/// Largest single vardiff step down
const MIN_RETARGET_FACTOR: f64 = 0.25;
/// Relative changes below this are not worth a set_difficulty
const RETARGET_DEADBAND: f64 = 0.10;

/// (job id, extranonce2, ntime, nonce)
type ShareKey = (String, Vec<u8>, u32, u32);

/// Share-rate window driving variable difficulty
#[derive(Debug, Clone)]
pub struct VardiffWindow {
    started: Instant,
    shares: u32,
}

impl VardiffWindow {
    pub fn new(now: Instant) -> Self {
        Self { started: now, shares: 0 }
    }

    pub fn reset(&mut self, now: Instant) {
        self.started = now;
        self.shares = 0;
    }

    /// Counts an accepted share; once the retarget interval has elapsed,
    /// returns the new difficulty if it moved enough to announce.
    pub fn record_share(&mut self, now: Instant, current: f64, config: &PoolConfig) -> Option<f64> {
        self.shares += 1;
        let elapsed = now.saturating_duration_since(self.started);
        if elapsed < config.vardiff.retarget_interval {
            return None;
        }
        let next = retarget(current, elapsed, self.shares, config);
        self.reset(now);
        next
    }
}

/// Difficulty that would bring `shares` over `elapsed` to the target rate.
pub fn retarget(current: f64, elapsed: Duration, shares: u32, config: &PoolConfig) -> Option<f64> {
    if shares == 0 || elapsed.is_zero() || current <= 0.0 {
        return None;
    }
    let seconds_per_share = elapsed.as_secs_f64() / f64::from(shares);
    let factor = (config.vardiff.target_share_secs / seconds_per_share)
        .clamp(MIN_RETARGET_FACTOR, MAX_RETARGET_FACTOR);
    let next = config.clamp_difficulty(current * factor);
    if (next / current - 1.0).abs() < RETARGET_DEADBAND {
        None
    } else {
        Some(next)
    }
}

/// Mutable per-miner state
#[derive(Debug)]
pub struct SessionState {
    pub subscribed: bool,
    pub authorized: bool,
    pub account: String,
    pub worker: String,
    pub user_agent: Option<String>,
    pub difficulty: f64,
    pub shares_submitted: u64,
    pub shares_accepted: u64,
    pub shares_rejected: u64,
    pub best_difficulty: f64,
    pub last_activity: Instant,
    /// Seq of the newest job this miner was sent, 0 before the first notify
    pub last_job_seq: u64,
    pub vardiff: VardiffWindow,
    seen_shares: HashSet<ShareKey>,
}

impl SessionState {
    fn new(difficulty: f64) -> Self {
        let now = Instant::now();
        Self {
            subscribed: false,
            authorized: false,
            account: String::new(),
            worker: String::new(),
            user_agent: None,
            difficulty,
            shares_submitted: 0,
            shares_accepted: 0,
            shares_rejected: 0,
            best_difficulty: 0.0,
            last_activity: now,
            last_job_seq: 0,
            vardiff: VardiffWindow::new(now),
            seen_shares: HashSet::new(),
        }
    }

    /// `account.worker`, or a placeholder before authorization
    pub fn identity(&self) -> String {
        if self.authorized {
            format!("{}.{}", self.account, self.worker)
        } else {
            "unauthorized".to_string()
        }
    }

    /// Old jobs are gone once the tip moves, and so is their share history.
    fn start_new_tip(&mut self, now: Instant) {
        self.vardiff.reset(now);
        self.seen_shares.clear();
    }
}

/// The part of a session shared with the registry
pub struct SessionHandle {
    pub id: u64,
    pub extranonce1: [u8; EXTRANONCE1_SIZE],
    pub peer: SocketAddr,
    outbound: mpsc::UnboundedSender<String>,
    state: Mutex<SessionState>,
}

impl SessionHandle {
    pub fn new(
        id: u64,
        extranonce1: [u8; EXTRANONCE1_SIZE],
        peer: SocketAddr,
        outbound: mpsc::UnboundedSender<String>,
        difficulty: f64,
    ) -> Self {
        Self {
            id,
            extranonce1,
            peer,
            outbound,
            state: Mutex::new(SessionState::new(difficulty)),
        }
    }

    pub fn extranonce1_hex(&self) -> String {
        hex::encode(self.extranonce1)
    }

    pub async fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().await
    }

    /// Queues a message for the connection writer. False once the writer is gone.
    pub fn send<T: Serialize>(&self, message: &T) -> bool {
        match StratumProtocol::to_message(message) {
            Some(line) => self.outbound.send(line).is_ok(),
            None => false,
        }
    }

    /// Sends `job` if this miner is subscribed and has not seen it or anything
    /// newer. A clean job also resets the vardiff window and duplicate history.
    pub async fn push_job(&self, job: &Job, stats: &PoolStats) -> bool {
        let mut state = self.state.lock().await;
        if !state.subscribed || job.seq <= state.last_job_seq {
            return false;
        }
        if job.clean {
            state.start_new_tip(Instant::now());
        }
        state.last_job_seq = job.seq;
        let sent = self.send(&StratumProtocol::notify(job, job.clean));
        if sent {
            stats.record_job_sent();
        }
        sent
    }
}

/// A share that passed validation
struct ValidShare {
    job: Arc<Job>,
    header: [u8; 80],
    coinbase: Vec<u8>,
    display_hash: [u8; 32],
    zero_bits: u32,
    hash_difficulty: f64,
}

/// Connection-owned request handler
pub struct Session {
    ctx: Arc<PoolContext>,
    handle: Arc<SessionHandle>,
}

impl Session {
    pub fn new(ctx: Arc<PoolContext>, handle: Arc<SessionHandle>) -> Self {
        Self { ctx, handle }
    }

    fn respond(&self, id: Value, result: Result<Value, StratumError>) {
        let response = match result {
            Ok(value) => Response::ok(id, value),
            Err(e) => Response::err(id, &e),
        };
        self.handle.send(&response);
    }

    /// Handles one inbound line. Protocol errors are answered, never fatal.
    pub async fn handle_line(&self, line: &str) {
        let raw = match parse_line(line) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(target: LOG_TARGET, "⚠️ Miner #{} sent malformed JSON: {}", self.handle.id, line);
                self.respond(Value::Null, Err(e));
                return;
            }
        };
        self.handle.state().await.last_activity = Instant::now();
        debug!(target: LOG_TARGET, "Miner #{} → {}", self.handle.id, raw.method);

        let request = match Request::from_raw(&raw) {
            Ok(request) => request,
            Err(e) => {
                // authorization is checked before parameters on submit
                let error = if raw.method == "mining.submit" && !self.handle.state().await.authorized {
                    StratumError::Unauthorized
                } else {
                    e
                };
                self.respond(raw.id, Err(error));
                return;
            }
        };

        let id = raw.id;
        match request {
            Request::Subscribe { user_agent } => self.subscribe(id, user_agent).await,
            Request::Authorize { account, worker, .. } => self.authorize(id, account, worker).await,
            Request::Submit(params) => self.submit(id, params).await,
            Request::SuggestDifficulty(difficulty) => self.suggest_difficulty(id, difficulty).await,
            Request::Configure => self.respond(id, Ok(StratumProtocol::configure_result())),
            Request::Unknown(method) => {
                debug!(target: LOG_TARGET, "Miner #{} called unknown method {}", self.handle.id, method);
                self.respond(id, Err(StratumError::UnknownMethod));
            }
        }
    }

    async fn subscribe(&self, id: Value, user_agent: Option<String>) {
        let mut state = self.handle.state().await;
        state.subscribed = true;
        state.user_agent = user_agent;

        let subscription_id = format!("{:x}", self.handle.id);
        self.respond(
            id,
            Ok(StratumProtocol::subscribe_result(&subscription_id, &self.handle.extranonce1)),
        );
        self.handle.send(&StratumProtocol::set_difficulty(state.difficulty));

        // holding the session lock keeps this ordered against broadcasts
        if let Some(job) = self.ctx.jobs.current().await {
            if job.seq > state.last_job_seq {
                state.last_job_seq = job.seq;
                if self.handle.send(&StratumProtocol::notify(&job, true)) {
                    self.ctx.stats.record_job_sent();
                }
            }
        }

        info!(target: LOG_TARGET,
            "📡 Miner #{} subscribed ({}), extranonce1 {}",
            self.handle.id,
            state.user_agent.as_deref().unwrap_or("unknown agent"),
            self.handle.extranonce1_hex()
        );
    }

    async fn authorize(&self, id: Value, account: String, worker: String) {
        let mut state = self.handle.state().await;
        if !state.subscribed {
            self.respond(id, Err(StratumError::NotSubscribed));
            return;
        }
        state.authorized = true;
        state.account = account;
        state.worker = worker;
        self.respond(id, Ok(json!(true)));
        info!(target: LOG_TARGET, "🔐 Miner #{} authorized as {}", self.handle.id, state.identity());
    }

    async fn suggest_difficulty(&self, id: Value, suggested: f64) {
        let mut state = self.handle.state().await;
        let difficulty = self.ctx.config.clamp_difficulty(suggested);
        state.difficulty = difficulty;
        state.vardiff.reset(Instant::now());
        self.handle.send(&StratumProtocol::set_difficulty(difficulty));
        self.respond(id, Ok(json!(true)));
        info!(target: LOG_TARGET,
            "🎚️ Miner #{} suggested difficulty {}, using {}",
            self.handle.id,
            FormatUtils::format_difficulty(suggested),
            FormatUtils::format_difficulty(difficulty)
        );
    }

    async fn submit(&self, id: Value, params: SubmitParams) {
        let mut state = self.handle.state().await;
        let share = match self.check_share(&mut state, &params).await {
            Ok(share) => share,
            Err(e) => {
                if e.is_share_rejection() {
                    state.shares_submitted += 1;
                    state.shares_rejected += 1;
                    self.ctx.stats.record_rejected();
                    info!(target: LOG_TARGET,
                        "❌ Share rejected from {} (job {}): {}",
                        state.identity(), params.job_id, e
                    );
                }
                self.respond(id, Err(e));
                return;
            }
        };

        let identity = state.identity();
        let assigned = state.difficulty;
        state.shares_submitted += 1;
        state.shares_accepted += 1;
        if share.hash_difficulty > state.best_difficulty {
            state.best_difficulty = share.hash_difficulty;
        }
        self.ctx
            .stats
            .record_accepted(assigned, share.hash_difficulty, share.zero_bits, &identity);
        info!(target: LOG_TARGET,
            "✅ Share accepted from {} (job {}, diff {}, hash diff {}, {} zero bits)",
            identity,
            share.job.id,
            FormatUtils::format_difficulty(assigned),
            FormatUtils::format_difficulty(share.hash_difficulty),
            share.zero_bits
        );

        if hash_meets_target(&share.display_hash, share.job.network_target) {
            let hash = hex::encode(share.display_hash);
            info!(target: LOG_TARGET,
                "💎 BLOCK FOUND by {} at height {}: {}",
                identity, share.job.height, hash
            );
            self.ctx.submit_block(BlockCandidate {
                height: share.job.height,
                job_id: share.job.id.clone(),
                hash,
                worker: identity.clone(),
                block_hex: share.job.block_hex(&share.header, &share.coinbase),
            });
        }

        self.respond(id, Ok(json!(true)));

        if let Some(next) = state.vardiff.record_share(Instant::now(), assigned, &self.ctx.config) {
            state.difficulty = next;
            self.handle.send(&StratumProtocol::set_difficulty(next));
            info!(target: LOG_TARGET,
                "🎚️ Vardiff for {}: {} → {}",
                identity,
                FormatUtils::format_difficulty(assigned),
                FormatUtils::format_difficulty(next)
            );
        }
    }

    /// Rebuilds the header the miner hashed and checks it against the job it
    /// names and the session difficulty.
    async fn check_share(
        &self,
        state: &mut SessionState,
        params: &SubmitParams,
    ) -> Result<ValidShare, StratumError> {
        if !state.authorized {
            return Err(StratumError::Unauthorized);
        }

        let job = match self.ctx.jobs.get(&params.job_id).await {
            Some(job) => job,
            None => {
                if state.last_job_seq == 0 || self.ctx.jobs.is_empty().await {
                    return Err(StratumError::NoActiveJob);
                }
                return Err(StratumError::JobNotFound);
            }
        };

        let key: ShareKey = (
            params.job_id.clone(),
            params.extranonce2.clone(),
            params.ntime,
            params.nonce,
        );
        if state.seen_shares.contains(&key) {
            return Err(StratumError::DuplicateShare);
        }

        let (header, coinbase) =
            job.header(&self.handle.extranonce1, &params.extranonce2, params.ntime, params.nonce);
        let display_hash = reverse32(sha256d(&header));
        let zero_bits = count_leading_zero_bits(&display_hash);
        let required = difficulty_to_zero_bits(state.difficulty);
        if zero_bits < required {
            debug!(target: LOG_TARGET,
                "Share from miner #{} has {} zero bits, {} required",
                self.handle.id, zero_bits, required
            );
            return Err(StratumError::LowDifficulty);
        }
        // only shares that pass are remembered
        state.seen_shares.insert(key);

        Ok(ValidShare {
            job,
            header,
            coinbase,
            display_hash,
            zero_bits,
            hash_difficulty: hash_difficulty(&display_hash),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Args;
    use clap::Parser;

    fn config() -> PoolConfig {
        Args::parse_from(["solo-pool", "1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa"])
            .to_config()
            .unwrap()
    }

    #[test]
    fn test_retarget_raises_fast_miner() {
        let cfg = config();
        // 60 shares in 60 s against a 10 s target: capped at x4
        assert_eq!(retarget(1.0, Duration::from_secs(60), 60, &cfg), Some(4.0));
        // 12 shares in 60 s: 5 s per share, doubles
        assert_eq!(retarget(1.0, Duration::from_secs(60), 12, &cfg), Some(2.0));
    }

    #[test]
    fn test_retarget_lowers_slow_miner() {
        let cfg = config();
        assert_eq!(retarget(8.0, Duration::from_secs(600), 1, &cfg), Some(2.0));
    }

    #[test]
    fn test_retarget_deadband_and_clamp() {
        let cfg = config();
        // 6 shares in 63 s is within 10% of the target rate
        assert_eq!(retarget(1.0, Duration::from_secs(63), 6, &cfg), None);
        // already at the floor
        let floor = cfg.min_difficulty;
        assert_eq!(retarget(floor, Duration::from_secs(600), 1, &cfg), None);
    }

    #[test]
    fn test_window_waits_for_interval() {
        let cfg = config();
        let start = Instant::now();
        let mut window = VardiffWindow::new(start);
        for i in 1..20 {
            assert_eq!(window.record_share(start + Duration::from_secs(i), 1.0, &cfg), None);
        }
        // 20 shares in 60 s: 3 s per share
        let next = window.record_share(start + Duration::from_secs(60), 1.0, &cfg).unwrap();
        assert!((next - 10.0 / 3.0).abs() < 1e-9);
        assert_eq!(window.shares, 0);
    }

    #[tokio::test]
    async fn test_push_job_requires_subscription_and_newer_seq() {
        let cfg = config();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = SessionHandle::new(1, [0, 0, 0, 1], "127.0.0.1:4000".parse().unwrap(), tx, 1.0);
        let stats = PoolStats::new();
        let template = crate::core::types::Template {
            height: 100,
            previousblockhash: "00".repeat(32),
            bits: "1d00ffff".into(),
            coinbasevalue: 5_000_000_000,
            curtime: 1_700_000_000,
            version: 0x2000_0000,
            transactions: vec![],
        };
        let builder = crate::job::JobBuilder::new(cfg.payout.script.clone(), cfg.coinbase_message.clone());
        let job = builder.build(&template, true).unwrap();

        assert!(!handle.push_job(&job, &stats).await);
        handle.state().await.subscribed = true;
        assert!(handle.push_job(&job, &stats).await);
        assert!(!handle.push_job(&job, &stats).await);
        assert_eq!(stats.jobs_sent.load(std::sync::atomic::Ordering::Relaxed), 1);

        let line = rx.recv().await.unwrap();
        assert!(line.contains("mining.notify"));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_clean_job_resets_window_and_share_history() {
        let cfg = config();
        let (tx, _rx) = mpsc::unbounded_channel();
        let handle = SessionHandle::new(2, [0, 0, 0, 2], "127.0.0.1:4001".parse().unwrap(), tx, 1.0);
        let stats = PoolStats::new();
        let mut template = crate::core::types::Template {
            height: 100,
            previousblockhash: "00".repeat(32),
            bits: "1d00ffff".into(),
            coinbasevalue: 5_000_000_000,
            curtime: 1_700_000_000,
            version: 0x2000_0000,
            transactions: vec![],
        };
        let builder = crate::job::JobBuilder::new(cfg.payout.script.clone(), cfg.coinbase_message.clone());
        let first = builder.build(&template, true).unwrap();

        handle.state().await.subscribed = true;
        assert!(handle.push_job(&first, &stats).await);
        let started = {
            let mut state = handle.state().await;
            let now = Instant::now();
            for _ in 0..3 {
                assert_eq!(state.vardiff.record_share(now, 1.0, &cfg), None);
            }
            state.seen_shares.insert((first.id.clone(), vec![0, 0, 0, 1], first.ntime, 7));
            state.vardiff.started
        };
        tokio::time::sleep(Duration::from_millis(10)).await;

        // same tip: history and window survive
        template.coinbasevalue += 1_000;
        let refresh = builder.build(&template, false).unwrap();
        assert!(handle.push_job(&refresh, &stats).await);
        {
            let state = handle.state().await;
            assert_eq!(state.vardiff.shares, 3);
            assert_eq!(state.vardiff.started, started);
            assert_eq!(state.seen_shares.len(), 1);
        }

        template.previousblockhash = "11".repeat(32);
        template.height += 1;
        let tip = builder.build(&template, true).unwrap();
        assert!(handle.push_job(&tip, &stats).await);
        let state = handle.state().await;
        assert_eq!(state.vardiff.shares, 0);
        assert!(state.vardiff.started > started);
        assert!(state.seen_shares.is_empty());
        assert_eq!(state.last_job_seq, tip.seq);
    }

    #[tokio::test]
    async fn test_rejected_share_is_not_remembered() {
        let cfg = Arc::new(config());
        let (ctx, _blocks) = PoolContext::new(Arc::clone(&cfg));
        let template = crate::core::types::Template {
            height: 100,
            previousblockhash: "00".repeat(32),
            bits: "207fffff".into(),
            coinbasevalue: 5_000_000_000,
            curtime: 1_700_000_000,
            version: 0x2000_0000,
            transactions: vec![],
        };
        let builder = crate::job::JobBuilder::new(cfg.payout.script.clone(), cfg.coinbase_message.clone());
        let job = Arc::new(builder.build(&template, true).unwrap());
        ctx.jobs.install(Arc::clone(&job)).await;

        let (tx, _rx) = mpsc::unbounded_channel();
        let handle = ctx.registry.register("127.0.0.1:4002".parse().unwrap(), tx, 1.0).await;
        {
            let mut state = handle.state().await;
            state.subscribed = true;
            state.authorized = true;
            state.last_job_seq = job.seq;
        }
        let session = Session::new(Arc::clone(&ctx), Arc::clone(&handle));

        let extranonce2 = vec![0, 0, 0, 1];
        let nonce = (0..u32::MAX)
            .find(|n| {
                let (header, _) = job.header(&handle.extranonce1, &extranonce2, job.ntime, *n);
                count_leading_zero_bits(&reverse32(sha256d(&header))) < 32
            })
            .unwrap();
        let params = SubmitParams {
            worker: "rig1".into(),
            job_id: job.id.clone(),
            extranonce2,
            ntime: job.ntime,
            nonce,
        };

        let mut state = handle.state().await;
        for _ in 0..2 {
            assert!(matches!(
                session.check_share(&mut state, &params).await,
                Err(StratumError::LowDifficulty)
            ));
        }
        assert!(state.seen_shares.is_empty());
    }
}

// Changelog:
// - v1.3.0 (2026-10-17): Share keys are remembered only after a share passes, so a rejected
//   resubmission keeps its real error.
// - v1.2.0 (2026-10-17): Per-session vardiff and duplicate detection.
// - v1.1.0 (2026-10-17): Shares are validated against the exact job they name.
// - v1.0.0 (2026-10-17): Initial session handler (subscribe, authorize, submit).
