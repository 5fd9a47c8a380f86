// Solo Pool - Free and Open Source Software Statement
//
// This project, solo-pool, is Free and Open Source Software (FOSS) licensed
// under the MIT License. You are free to use, modify, and distribute this
// software in accordance with the license terms. Contributions are welcome
// via pull requests to the project repository.
//
// File: src/pool/poller.rs
// Version: 1.1.0
// Developer: OIEIEIO <oieieio@protonmail.com>
//
// This file keeps the pool's work current, located in the pool subdirectory.
// The poller asks the template source for a new template every interval and
// turns tip changes into clean jobs and changed templates into refresh jobs.
// The block submitter drains found blocks to the node on its own task so share
// handling never waits on submitblock.
//
// Tree Location:
// - src/pool/poller.rs (template polling and block submission)
// - Depends on: tokio, log, crate::job, crate::node, crate::pool::server

use crate::core::error::PoolError;
use crate::core::types::Template;
use crate::job::{Job, JobBuilder};
use crate::node::TemplateSource;
use crate::pool::server::{PoolContext, shutdown_signalled};
use crate::stats::PoolStats;
use crate::utils::format::FormatUtils;
use log::{error, info, warn};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

const LOG_TARGET: &str = "solo_pool::pool::poller";

/// A share that also meets the network target, ready for `submitblock`
#[derive(Debug, Clone)]
pub struct BlockCandidate {
    pub height: u64,
    pub job_id: String,
    /// Display-order block hash
    pub hash: String,
    pub worker: String,
    pub block_hex: String,
}

#[derive(Debug, Clone)]
pub enum RefreshOutcome {
    /// The tip moved; miners were told to drop old work
    NewTip(Arc<Job>),
    /// Same tip, new transactions or value
    Updated(Arc<Job>),
    Unchanged,
}

pub struct TemplatePoller<S: TemplateSource> {
    source: Arc<S>,
    ctx: Arc<PoolContext>,
    builder: JobBuilder,
    last_template: Option<Template>,
    last_job_at: Option<Instant>,
}

impl<S: TemplateSource> TemplatePoller<S> {
    pub fn new(source: Arc<S>, ctx: Arc<PoolContext>, builder: JobBuilder) -> Self {
        Self {
            source,
            ctx,
            builder,
            last_template: None,
            last_job_at: None,
        }
    }

    /// Fetches one template and, if it carries new work, installs and
    /// broadcasts the resulting job.
    pub async fn refresh(&mut self) -> Result<RefreshOutcome, PoolError> {
        let template = self.source.fetch_template().await?;
        let clean = match &self.last_template {
            None => true,
            Some(last) if last.previousblockhash != template.previousblockhash => true,
            Some(last) => {
                if last.same_work(&template) {
                    return Ok(RefreshOutcome::Unchanged);
                }
                let due = self
                    .last_job_at
                    .is_none_or(|at| at.elapsed() >= self.ctx.config.job_refresh);
                if !due {
                    return Ok(RefreshOutcome::Unchanged);
                }
                false
            }
        };

        let job = Arc::new(self.builder.build(&template, clean)?);
        self.ctx.jobs.install(Arc::clone(&job)).await;
        self.ctx.stats.update_network(job.height, job.network_difficulty);
        let notified = self.ctx.registry.broadcast(&job, &self.ctx.stats).await;

        if clean {
            info!(target: LOG_TARGET,
                "⛏️ New block template at height {} (prev {}, {} txs, network diff {}), job {} sent to {} miners",
                job.height,
                job.prev_hash,
                job.transaction_count(),
                FormatUtils::format_difficulty(job.network_difficulty),
                job.id,
                notified
            );
        } else {
            info!(target: LOG_TARGET,
                "🔄 Template updated at height {} ({} txs, reward {} sat), job {} sent to {} miners",
                job.height, job.transaction_count(), job.coinbase_value, job.id, notified
            );
        }

        self.last_template = Some(template);
        self.last_job_at = Some(Instant::now());
        Ok(if clean {
            RefreshOutcome::NewTip(job)
        } else {
            RefreshOutcome::Updated(job)
        })
    }

    /// Polls until shutdown. A failed poll keeps the last good job in service.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(self.ctx.config.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        interval.tick().await;

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = self.refresh().await {
                        warn!(target: LOG_TARGET, "⚠️ Template refresh failed, keeping current job: {}", e);
                    }
                }
                _ = shutdown_signalled(&mut shutdown) => break,
            }
        }
        info!(target: LOG_TARGET, "Template poller stopped");
    }
}

async fn submit_candidate<S: TemplateSource>(source: &S, stats: &PoolStats, candidate: BlockCandidate) {
    info!(target: LOG_TARGET,
        "📤 Submitting block {} at height {} (job {}, found by {})",
        candidate.hash, candidate.height, candidate.job_id, candidate.worker
    );
    match source.submit_block(candidate.block_hex).await {
        Ok(None) => {
            stats.record_block_found();
            info!(target: LOG_TARGET,
                "🎉 BLOCK ACCEPTED! Height {} hash {} found by {}",
                candidate.height, candidate.hash, candidate.worker
            );
        }
        Ok(Some(reason)) => {
            error!(target: LOG_TARGET,
                "❌ Block at height {} rejected by node: {}", candidate.height, reason
            );
        }
        Err(e) => {
            error!(target: LOG_TARGET,
                "❌ Block submission at height {} failed: {}", candidate.height, e
            );
        }
    }
}

/// Spawns the task that forwards found blocks to the node. Candidates still
/// queued at shutdown are submitted before it exits.
pub fn start_block_submitter<S: TemplateSource>(
    source: Arc<S>,
    ctx: Arc<PoolContext>,
    mut candidates: mpsc::UnboundedReceiver<BlockCandidate>,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                candidate = candidates.recv() => match candidate {
                    Some(candidate) => submit_candidate(source.as_ref(), &ctx.stats, candidate).await,
                    None => break,
                },
                _ = shutdown_signalled(&mut shutdown) => {
                    while let Ok(candidate) = candidates.try_recv() {
                        submit_candidate(source.as_ref(), &ctx.stats, candidate).await;
                    }
                    break;
                }
            }
        }
        info!(target: LOG_TARGET, "Block submitter stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Args;
    use clap::Parser;
    use std::sync::Mutex;
    use std::sync::atomic::Ordering;

    #[derive(Default)]
    struct FakeNode {
        templates: Mutex<Vec<Template>>,
        submitted: Mutex<Vec<String>>,
    }

    impl TemplateSource for FakeNode {
        async fn fetch_template(&self) -> Result<Template, PoolError> {
            let templates = self.templates.lock().unwrap();
            templates
                .last()
                .cloned()
                .ok_or_else(|| PoolError::upstream("getblocktemplate", "no template"))
        }

        async fn submit_block(&self, block_hex: String) -> Result<Option<String>, PoolError> {
            self.submitted.lock().unwrap().push(block_hex);
            Ok(None)
        }
    }

    fn template(prev: &str, value: u64) -> Template {
        Template {
            height: 300,
            previousblockhash: prev.repeat(32),
            bits: "1d00ffff".into(),
            coinbasevalue: value,
            curtime: 1_700_000_000,
            version: 0x2000_0000,
            transactions: vec![],
        }
    }

    fn setup(extra: &[&str]) -> (Arc<FakeNode>, Arc<PoolContext>, TemplatePoller<FakeNode>) {
        let mut argv = vec!["solo-pool", "1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa"];
        argv.extend_from_slice(extra);
        let config = Arc::new(Args::parse_from(argv).to_config().unwrap());
        let (ctx, _rx) = PoolContext::new(Arc::clone(&config));
        let node = Arc::new(FakeNode::default());
        let builder = JobBuilder::new(config.payout.script.clone(), config.coinbase_message.clone());
        let poller = TemplatePoller::new(Arc::clone(&node), Arc::clone(&ctx), builder);
        (node, ctx, poller)
    }

    #[tokio::test]
    async fn test_failed_fetch_is_error_and_keeps_store() {
        let (_node, ctx, mut poller) = setup(&[]);
        assert!(poller.refresh().await.is_err());
        assert!(ctx.jobs.is_empty().await);
    }

    #[tokio::test]
    async fn test_new_tip_then_identical_template() {
        let (node, ctx, mut poller) = setup(&[]);
        node.templates.lock().unwrap().push(template("00", 100));
        assert!(matches!(poller.refresh().await.unwrap(), RefreshOutcome::NewTip(_)));
        assert!(matches!(poller.refresh().await.unwrap(), RefreshOutcome::Unchanged));
        assert_eq!(ctx.stats.current_height.load(Ordering::Relaxed), 300);
        assert_eq!(ctx.stats.network_difficulty(), 1.0);

        node.templates.lock().unwrap().push(template("11", 100));
        match poller.refresh().await.unwrap() {
            RefreshOutcome::NewTip(job) => {
                assert!(job.clean);
                assert_eq!(ctx.jobs.len().await, 1);
            }
            other => panic!("expected a new tip, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_changed_template_waits_for_refresh_interval() {
        let (node, _ctx, mut poller) = setup(&["--job-refresh", "3600"]);
        node.templates.lock().unwrap().push(template("00", 100));
        poller.refresh().await.unwrap();
        node.templates.lock().unwrap().push(template("00", 200));
        assert!(matches!(poller.refresh().await.unwrap(), RefreshOutcome::Unchanged));

        poller.last_job_at = Some(Instant::now() - std::time::Duration::from_secs(3601));
        match poller.refresh().await.unwrap() {
            RefreshOutcome::Updated(job) => {
                assert!(!job.clean);
                assert_eq!(job.coinbase_value, 200);
            }
            other => panic!("expected an update, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_block_submitter_counts_found_blocks() {
        let (node, ctx, _poller) = setup(&[]);
        let (tx, rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = start_block_submitter(Arc::clone(&node), Arc::clone(&ctx), rx, shutdown_rx);
        tx.send(BlockCandidate {
            height: 300,
            job_id: "00000001".into(),
            hash: "00".repeat(32),
            worker: "acct.rig".into(),
            block_hex: "deadbeef".into(),
        })
        .unwrap();
        drop(tx);
        task.await.unwrap();
        drop(shutdown_tx);
        assert_eq!(node.submitted.lock().unwrap().as_slice(), ["deadbeef".to_string()]);
        assert_eq!(ctx.stats.blocks_found.load(Ordering::Relaxed), 1);
    }
}

// Changelog:
// - v1.1.0 (2026-10-17): Same-tip template changes produce refresh jobs.
// - v1.0.0 (2026-10-17): Initial template poller and block submitter.
