// Solo Pool - Free and Open Source Software Statement
//
// This project, solo-pool, is Free and Open Source Software (FOSS) licensed
// under the MIT License. You are free to use, modify, and distribute this
// software in accordance with the license terms. Contributions are welcome
// via pull requests to the project repository.
//
// File: src/pool/server.rs
// Version: 1.2.0
// Developer: OIEIEIO <oieieio@protonmail.com>
//
// This file runs the Stratum server, located in the pool subdirectory. It
// owns the shared pool context, starts the poller, dashboard and block
// submitter tasks, and accepts miner connections until shutdown. Each
// connection gets a reader loop feeding its Session and a writer task
// draining the session's outbound queue.
//
// Tree Location:
// - src/pool/server.rs (accept loop and background tasks)
// - Depends on: tokio, rand, crate::pool, crate::stats

use crate::core::error::PoolError;
use crate::core::types::PoolConfig;
use crate::job::{Job, JobBuilder, JobStore};
use crate::node::TemplateSource;
use crate::pool::poller::{BlockCandidate, RefreshOutcome, TemplatePoller, start_block_submitter};
use crate::pool::registry::Registry;
use crate::pool::session::Session;
use crate::stats::PoolStats;
use log::{debug, error, info, warn};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use std::io;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

const LOG_TARGET: &str = "solo_pool::pool::server";

/// How long open sessions get to flush and close after shutdown
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Longest request line a miner may send, newline excluded
pub const MAX_LINE_LENGTH: usize = 16 * 1024;

/// State shared by every task of a running pool
pub struct PoolContext {
    pub config: Arc<PoolConfig>,
    pub jobs: JobStore,
    pub registry: Registry,
    pub stats: PoolStats,
    block_tx: mpsc::UnboundedSender<BlockCandidate>,
}

impl PoolContext {
    pub fn new(config: Arc<PoolConfig>) -> (Arc<Self>, mpsc::UnboundedReceiver<BlockCandidate>) {
        let (block_tx, block_rx) = mpsc::unbounded_channel();
        let ctx = Arc::new(Self {
            config,
            jobs: JobStore::new(),
            registry: Registry::new(),
            stats: PoolStats::new(),
            block_tx,
        });
        (ctx, block_rx)
    }

    /// Hands a found block to the submitter task.
    pub fn submit_block(&self, candidate: BlockCandidate) {
        if let Err(e) = self.block_tx.send(candidate) {
            error!(target: LOG_TARGET,
                "❌ Block submitter is gone, block at height {} dropped", e.0.height
            );
        }
    }
}

/// Resolves once shutdown is requested or the sender is dropped.
pub async fn shutdown_signalled(shutdown: &mut watch::Receiver<bool>) {
    while !*shutdown.borrow_and_update() {
        if shutdown.changed().await.is_err() {
            return;
        }
    }
}

pub struct StratumServer<S: TemplateSource> {
    ctx: Arc<PoolContext>,
    source: Arc<S>,
    poller: TemplatePoller<S>,
    block_rx: mpsc::UnboundedReceiver<BlockCandidate>,
}

impl<S: TemplateSource> StratumServer<S> {
    pub fn new(config: Arc<PoolConfig>, source: Arc<S>) -> Self {
        let builder = JobBuilder::new(config.payout.script.clone(), config.coinbase_message.clone());
        let (ctx, block_rx) = PoolContext::new(config);
        let poller = TemplatePoller::new(Arc::clone(&source), Arc::clone(&ctx), builder);
        Self { ctx, source, poller, block_rx }
    }

    pub fn context(&self) -> Arc<PoolContext> {
        Arc::clone(&self.ctx)
    }

    /// Installs the first job. Miners must not be accepted before this succeeds.
    pub async fn prime(&mut self) -> Result<Arc<Job>, PoolError> {
        match self.poller.refresh().await? {
            RefreshOutcome::NewTip(job) | RefreshOutcome::Updated(job) => Ok(job),
            RefreshOutcome::Unchanged => self
                .ctx
                .jobs
                .current()
                .await
                .ok_or_else(|| PoolError::Template("no job after initial template".to_string())),
        }
    }

    pub async fn bind(&self) -> Result<TcpListener, PoolError> {
        Ok(TcpListener::bind(&self.ctx.config.bind_addr).await?)
    }

    /// Serves miners on `listener` until `shutdown` flips, then lets open
    /// sessions close and stops the background tasks.
    pub async fn run(self, listener: TcpListener, shutdown: watch::Receiver<bool>) -> Result<(), PoolError> {
        let StratumServer { ctx, source, poller, block_rx } = self;

        let submitter = start_block_submitter(source, Arc::clone(&ctx), block_rx, shutdown.clone());
        let poller = tokio::spawn(poller.run(shutdown.clone()));
        let reporter = start_stats_reporter(Arc::clone(&ctx), shutdown.clone());

        info!(target: LOG_TARGET, "🚀 Stratum server listening on {}", listener.local_addr()?);
        let mut stop = shutdown.clone();
        loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        tokio::spawn(handle_connection(Arc::clone(&ctx), stream, peer, shutdown.clone()));
                    }
                    Err(e) => {
                        warn!(target: LOG_TARGET, "⚠️ Failed to accept connection: {}", e);
                        tokio::time::sleep(Duration::from_millis(100)).await;
                    }
                },
                _ = shutdown_signalled(&mut stop) => break,
            }
        }
        drop(listener);

        info!(target: LOG_TARGET, "🛑 Listener closed, waiting for sessions to close");
        let deadline = tokio::time::Instant::now() + SHUTDOWN_GRACE;
        while !ctx.registry.is_empty().await && tokio::time::Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }

        for (name, task) in [("poller", poller), ("stats reporter", reporter), ("block submitter", submitter)] {
            if let Err(e) = task.await {
                error!(target: LOG_TARGET, "❌ {} task failed: {}", name, e);
            }
        }
        info!(target: LOG_TARGET, "👋 Pool stopped");
        Ok(())
    }
}

/// Serves one miner connection until it closes or shutdown is requested.
pub async fn handle_connection(
    ctx: Arc<PoolContext>,
    stream: TcpStream,
    peer: SocketAddr,
    mut shutdown: watch::Receiver<bool>,
) {
    if let Err(e) = stream.set_nodelay(true) {
        debug!(target: LOG_TARGET, "set_nodelay failed for {}: {}", peer, e);
    }
    let (reader, mut writer) = stream.into_split();
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    let handle = ctx.registry.register(peer, tx, ctx.config.start_difficulty).await;
    let session_id = handle.id;
    info!(target: LOG_TARGET,
        "🔌 Miner #{} connected from {} (extranonce1 {})",
        session_id, peer, handle.extranonce1_hex()
    );

    let writer_task = tokio::spawn(async move {
        while let Some(line) = rx.recv().await {
            if let Err(e) = writer.write_all(line.as_bytes()).await {
                debug!(target: LOG_TARGET, "Write to miner #{} failed: {}", session_id, e);
                break;
            }
        }
        let _ = writer.shutdown().await;
    });

    let session = Session::new(Arc::clone(&ctx), Arc::clone(&handle));
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        tokio::select! {
            line = read_request_line(&mut reader, &mut buf) => match line {
                Ok(Some(line)) => {
                    let line = line.trim();
                    if !line.is_empty() {
                        session.handle_line(line).await;
                    }
                }
                Ok(None) => break,
                Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                    warn!(target: LOG_TARGET, "⚠️ Dropping miner #{}: {}", session_id, e);
                    break;
                }
                Err(e) => {
                    debug!(target: LOG_TARGET, "Read from miner #{} failed: {}", session_id, e);
                    break;
                }
            },
            _ = shutdown_signalled(&mut shutdown) => break,
        }
    }

    ctx.registry.remove(session_id).await;
    {
        let state = handle.state().await;
        info!(target: LOG_TARGET,
            "👋 Miner #{} disconnected ({}, {} accepted, {} rejected)",
            session_id, state.identity(), state.shares_accepted, state.shares_rejected
        );
    }
    drop(session);
    drop(handle);

    // the writer ends once every handle clone is gone and the queue is flushed
    let abort = writer_task.abort_handle();
    if tokio::time::timeout(SHUTDOWN_GRACE, writer_task).await.is_err() {
        abort.abort();
    }
}

/// Reads one request line of at most [`MAX_LINE_LENGTH`] bytes.
/// `Ok(None)` at end of stream; an over-long line is `InvalidData`.
pub async fn read_request_line<R>(reader: &mut R, buf: &mut Vec<u8>) -> io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    buf.clear();
    let limit = MAX_LINE_LENGTH as u64 + 1;
    let read = (&mut *reader).take(limit).read_until(b'\n', buf).await?;
    if read == 0 {
        return Ok(None);
    }
    if buf.last() != Some(&b'\n') && read as u64 == limit {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("request line longer than {} bytes", MAX_LINE_LENGTH),
        ));
    }
    Ok(Some(String::from_utf8_lossy(buf).into_owned()))
}

/// Spawns the periodic dashboard.
pub fn start_stats_reporter(ctx: Arc<PoolContext>, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(ctx.config.stats_interval);
        interval.tick().await;
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let dashboard_id = format!("{:016x}", rand::random::<u64>());
                    let workers = ctx.registry.len().await;
                    ctx.stats.display_dashboard(&dashboard_id, workers);
                }
                _ = shutdown_signalled(&mut shutdown) => break,
            }
        }
    })
}


// Changelog:
// - v1.2.0 (2026-10-17): Request lines are capped at MAX_LINE_LENGTH; longer input drops the miner.
// - v1.1.0 (2026-10-17): Graceful shutdown through a watch channel.
// - v1.0.0 (2026-10-17): Initial Stratum accept loop with per-connection reader and writer.
