mod args;

use anyhow::{bail, Context, Result};
use clap::Parser;
use futures::{stream::FuturesUnordered, StreamExt};
use sdmxscraper::{
    catalog::{CatalogItem, SdmxProducer},
    config::SdmxConfig,
    export,
    fetch::HttpSource,
    share, table,
};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tokio::time::Instant;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use crate::args::{CliArgs, Commands};

const MAX_CONCURRENCY: usize = 3;

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sdmxscraper=info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();

    let args = CliArgs::parse();

    match &args.command {
        Commands::Inspect { path } => inspect(path),
        Commands::Share => {
            for cfg in load_configs(&args)? {
                let shared = share::to_share_json(&cfg)?;
                println!("{}", serde_json::to_string_pretty(&shared)?);
            }
            Ok(())
        }
        Commands::Fetch { out } => fetch_all(load_configs(&args)?, out).await,
    }
}

/// Config files (or a bare `--dataset`), with command-line overrides applied.
fn load_configs(args: &CliArgs) -> Result<Vec<SdmxConfig>> {
    let mut configs = if args.configs.is_empty() {
        match &args.dataset {
            Some(d) => vec![SdmxConfig::new(d.as_str())],
            None => bail!("pass --config <FILE> or --dataset <ID>"),
        }
    } else {
        args.configs
            .iter()
            .map(SdmxConfig::load)
            .collect::<Result<Vec<_>>>()?
    };

    for cfg in &mut configs {
        if let Some(url) = &args.base_url {
            cfg.base_url = url.clone();
        }
        if let Some(dim) = &args.region_dimension {
            cfg.region_dimension_id = dim.clone();
        }
        if let Some(f) = &args.filter {
            cfg.filter = f.split(',').map(|s| s.trim().to_string()).collect();
        }
        cfg.validate()?;
    }
    Ok(configs)
}

async fn fetch_all(configs: Vec<SdmxConfig>, out_dir: &Path) -> Result<()> {
    fs::create_dir_all(out_dir).with_context(|| format!("creating {:?}", out_dir))?;
    info!("{} datasets to fetch → {}", configs.len(), out_dir.display());

    let mut tasks = FuturesUnordered::new();
    let mut failed = 0usize;
    let mut pending = configs.into_iter();

    loop {
        // throttle concurrency
        while tasks.len() < MAX_CONCURRENCY {
            match pending.next() {
                Some(cfg) => tasks.push(fetch_one(cfg, out_dir.to_path_buf())),
                None => break,
            }
        }
        match tasks.next().await {
            Some(Ok(path)) => info!("wrote {}", path.display()),
            Some(Err(e)) => {
                error!("{:#}", e);
                failed += 1;
            }
            None => break,
        }
    }

    if failed > 0 {
        bail!("{} dataset(s) failed", failed);
    }
    info!("all done");
    Ok(())
}

async fn fetch_one(cfg: SdmxConfig, out_dir: PathBuf) -> Result<PathBuf> {
    let start = Instant::now();
    let dataset = cfg.dataset_id.clone();
    let source = HttpSource::new(&cfg.fetch)?;
    let item = CatalogItem::new(cfg, SdmxProducer::new(source));

    item.rebuild()
        .await?
        .with_context(|| format!("rebuilding {}", dataset))?;
    let snapshot = item
        .table()
        .with_context(|| format!("no table for {}", dataset))?;
    if !snapshot.show {
        warn!(dataset = %dataset, "dataset has no regions");
    }

    let path = out_dir.join(format!("{}.parquet", dataset));
    export::write_parquet(&path, &snapshot.batch)?;
    info!(
        dataset = %dataset,
        rows = snapshot.batch.num_rows(),
        region_type = ?snapshot.region_type,
        elapsed = ?start.elapsed(),
        "exported"
    );
    Ok(path)
}

fn inspect(path: &Path) -> Result<()> {
    let batches = export::read_parquet(path)?;
    println!("=== {} ===", path.display());
    for batch in &batches {
        let t = table::from_record_batch(batch)?;
        for (code, value) in t.rows() {
            match value {
                Some(v) => println!("{:<16} {}", code, v),
                None => println!("{:<16} -", code),
            }
        }
    }
    Ok(())
}
