use anyhow::Result;
use clap::Parser;
use crane::config::Configuration;
use tokio::{signal, task::JoinSet};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
pub struct Opt {
    /// Additional YAML configuration files, later files win
    #[clap(short, long, value_parser)]
    pub config: Vec<std::path::PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Setup the logger
    tracing_subscriber::fmt()
        .with_target(true)
        .with_thread_ids(true)
        .with_level(true)
        .with_ansi(false)
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Parse the parameters passed by arguments.
    let options = Opt::parse();

    let config = Configuration::config(Configuration::figment(options.config))?;

    let mut tasks = JoinSet::new();
    crane::start(&mut tasks, config).await?;

    tokio::select! {
        res = signal::ctrl_c() => {
            if let Err(err) = res {
                error!("Unable to listen for shutdown signal: {err}");
            }
            info!("Shutting down");
        }
        Some(res) = tasks.join_next() => {
            match res {
                Ok(Ok(())) => info!("Listener exited"),
                Ok(Err(err)) => error!("Listener failed: {err:?}"),
                Err(err) => error!("Listener panicked: {err}"),
            }
        }
    }

    tasks.shutdown().await;

    Ok(())
}
