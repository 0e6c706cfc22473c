use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use postforge::{
    DirUploadSink, ForgeConfig, JobPool, JsonDirStore, OverlayType, RenderRequest, Renderer,
};

#[derive(Parser, Debug)]
#[command(name = "postforge", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render one template for one user and print the outcome as JSON.
    Render(RenderArgs),
    /// Render a JSON list of requests in parallel.
    Batch(BatchArgs),
}

#[derive(Parser, Debug)]
struct StoreArgs {
    /// Document root holding `templates/{id}.json` and `users/{id}.json`.
    #[arg(long)]
    store: PathBuf,

    /// Directory that receives rendered artifacts.
    #[arg(long)]
    out: PathBuf,

    /// Public URL prefix for stored artifacts instead of `file://` URLs.
    #[arg(long)]
    public_base_url: Option<String>,

    /// JSON config file; `POSTFORGE_*` environment variables override it.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    #[command(flatten)]
    store: StoreArgs,

    #[arg(long)]
    template: String,

    #[arg(long)]
    user: String,

    /// Include phone number and address.
    #[arg(long, default_value_t = false)]
    business: bool,

    /// Fixed seed for the output filename suffix.
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Parser, Debug)]
struct BatchArgs {
    #[command(flatten)]
    store: StoreArgs,

    /// JSON array of `{templateId, userId, mode}`.
    #[arg(long)]
    requests: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Batch(args) => cmd_batch(args),
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<ForgeConfig> {
    let base = match path {
        Some(p) => ForgeConfig::from_path(p)?,
        None => ForgeConfig::default(),
    };
    Ok(base.with_env_overrides()?)
}

fn build_renderer(args: &StoreArgs, cfg: ForgeConfig) -> anyhow::Result<Renderer> {
    let docs = Arc::new(JsonDirStore::new(&args.store));
    let mut sink = DirUploadSink::new(&args.out);
    if let Some(base) = &args.public_base_url {
        sink = sink.with_public_base_url(base.clone());
    }
    Ok(Renderer::with_http(cfg, docs.clone(), docs, Arc::new(sink))?)
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let mut cfg = load_config(args.store.config.as_deref())?;
    if args.seed.is_some() {
        cfg.output.name_seed = args.seed;
    }
    let renderer = build_renderer(&args.store, cfg)?;
    let mode = if args.business {
        OverlayType::Business
    } else {
        OverlayType::Personal
    };

    let outcome = renderer.render(&args.template, &args.user, mode)?;
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}

fn cmd_batch(args: BatchArgs) -> anyhow::Result<()> {
    let cfg = load_config(args.store.config.as_deref())?;
    let bytes = std::fs::read(&args.requests)
        .with_context(|| format!("read requests '{}'", args.requests.display()))?;
    let requests: Vec<RenderRequest> = serde_json::from_slice(&bytes)
        .with_context(|| format!("parse requests '{}'", args.requests.display()))?;

    let pool = JobPool::new(&cfg.concurrency)?;
    let renderer = build_renderer(&args.store, cfg)?;
    let results = pool.run_batch(&renderer, &requests);

    let mut failures = 0usize;
    let report: Vec<serde_json::Value> = requests
        .iter()
        .zip(results)
        .map(|(req, res)| match res {
            Ok(outcome) => serde_json::json!({ "request": req, "ok": outcome }),
            Err(e) => {
                failures += 1;
                serde_json::json!({
                    "request": req,
                    "error": { "kind": e.kind(), "message": e.to_string() },
                })
            }
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&report)?);
    tracing::info!(total = requests.len(), failures, "batch finished");
    Ok(())
}
