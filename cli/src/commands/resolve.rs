use std::sync::Arc;

use colored::*;
use sonar_common::config::Config;
use sonar_common::warn;
use sonar_core::resolver::{HostnameResolver, Resolution};
use tracing::Instrument;

use crate::commands::{ResolveArgs, seconds};
use crate::terminal::{colors, format, print, progress};

pub async fn resolve(args: ResolveArgs, cfg: &Config) -> anyhow::Result<()> {
    let resolver = Arc::new(HostnameResolver::with_defaults(cfg));
    let budget = seconds(args.timeout, std::time::Duration::from_secs(5));
    let addr = args.addr;

    print::section("resolving", cfg.quiet);
    let chain: Vec<&str> = resolver.strategies().collect();
    if chain.is_empty() {
        warn!("No resolution strategy is available on this system");
    }

    let span = progress::spinner(&format!("Resolving {addr}..."));
    let lookup = {
        let resolver = resolver.clone();
        tokio::task::spawn_blocking(move || resolver.resolve_detailed(addr, budget))
    };
    let resolution: Option<Resolution> = lookup.instrument(span).await?;

    let mut rows = vec![
        ("Address", format::addr(&addr)),
        ("Chain", chain.join(" > ").color(colors::TEXT_DEFAULT)),
    ];
    match resolution {
        Some(Resolution { name, strategy }) => {
            rows.push(("Name", name.color(colors::HOSTNAME).bold()));
            rows.push(("Source", strategy.color(colors::ACCENT)));
        }
        None => rows.push(("Name", "not found".color(colors::OFFLINE))),
    }
    print::key_values(&rows);
    Ok(())
}
