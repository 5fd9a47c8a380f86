// Solo Pool - Free and Open Source Software Statement
//
// File: src/main.rs
// Version: 3.0.0
// Developer: OIEIEIO <oieieio@protonmail.com>
//
// Solo mining pool: one payout address, one local node, any Stratum V1 miner.

use anyhow::Context;
use clap::{CommandFactory, Parser};
use log::{LevelFilter, error, info};
use log4rs::{
    append::console::ConsoleAppender,
    config::{Appender, Config, Root},
    encode::pattern::PatternEncoder,
};
use solo_pool::{
    core::{difficulty::difficulty_to_zero_bits, types::Args, PoolConfig},
    job::Job,
    node::NodeRpc,
    pool::StratumServer,
    utils::format::FormatUtils,
};
use std::sync::Arc;
use tokio::sync::watch;

const LOG_TARGET: &str = "solo_pool::main";
const LOG_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S)} {h({l})} {t} - {m}{n}";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Nothing to pay out to: show usage and leave
    if args.address.is_none() {
        Args::command().print_help()?;
        println!();
        return Ok(());
    }

    // Validate arguments
    if let Err(err) = args.validate() {
        eprintln!("❌ Error: {}", err);
        std::process::exit(1);
    }

    init_logging(&args)?;

    let config = Arc::new(args.to_config().context("invalid pool configuration")?);
    let rpc = Arc::new(NodeRpc::new(&config.rpc)?);

    let chain = rpc
        .get_blockchain_info()
        .await
        .with_context(|| format!("cannot reach node at {}:{}", config.rpc.host, config.rpc.port))?;
    info!(target: LOG_TARGET,
        "🔗 Node connected: chain {}, {} blocks, {:.2}% verified",
        chain.chain, chain.blocks, chain.verificationprogress * 100.0
    );

    let mut server = StratumServer::new(Arc::clone(&config), rpc);
    let job = server.prime().await.context("initial getblocktemplate failed")?;
    print_banner(&config, &job);

    let listener = server
        .bind()
        .await
        .with_context(|| format!("cannot listen on {}", config.bind_addr))?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!(target: LOG_TARGET, "🛑 Ctrl-C received, shutting down");
                let _ = shutdown_tx.send(true);
            }
            Err(e) => {
                error!(target: LOG_TARGET, "❌ Cannot listen for Ctrl-C: {}", e);
                // dropping the sender would stop the pool
                std::future::pending::<()>().await;
            }
        }
    });

    server.run(listener, shutdown_rx).await?;
    Ok(())
}

fn init_logging(args: &Args) -> anyhow::Result<()> {
    if let Some(path) = &args.log_config {
        log4rs::init_file(path, Default::default())
            .with_context(|| format!("cannot load log config {}", path.display()))?;
        return Ok(());
    }

    let level: LevelFilter = args
        .log_level
        .parse()
        .with_context(|| format!("unknown log level {}", args.log_level))?;
    let stdout = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
        .build();
    let config = Config::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout)))
        .build(Root::builder().appender("stdout").build(level))?;
    log4rs::init_config(config)?;
    Ok(())
}

fn print_banner(config: &PoolConfig, job: &Job) {
    info!(target: LOG_TARGET, "🚀 Starting Solo Pool v{}", env!("CARGO_PKG_VERSION"));
    info!(target: LOG_TARGET, "📍 Stratum: {}", config.bind_addr);
    info!(target: LOG_TARGET, "💳 Payout: {} ({})", config.payout.address, config.payout.script_type.name());
    info!(target: LOG_TARGET, "📜 Output script: {}", config.payout.script_hex());
    info!(target: LOG_TARGET, "🏷️ Coinbase message: {}", String::from_utf8_lossy(&config.coinbase_message));
    info!(target: LOG_TARGET,
        "🎯 Difficulty: start {} ({} zero bits), min {}, max {}",
        FormatUtils::format_difficulty(config.start_difficulty),
        difficulty_to_zero_bits(config.start_difficulty),
        FormatUtils::format_difficulty(config.min_difficulty),
        FormatUtils::format_difficulty(config.max_difficulty)
    );
    info!(target: LOG_TARGET,
        "⛓️ Height {} (network diff {}, reward {} sat)",
        job.height,
        FormatUtils::format_difficulty(job.network_difficulty),
        job.coinbase_value
    );
}

// Changelog:
// - v3.0.0 (2026-10-17): Became the solo pool entry point.
//   - Node check and first template are fatal; Ctrl-C drives a watch channel.
//   - log4rs console logging, or a YAML file via --log-config.
