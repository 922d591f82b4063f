pub mod monitor;
pub mod resolve;
pub mod sweep;

use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Args, Parser, Subcommand};
use sonar_common::config::{Aggression, Config, DEFAULT_MAX_HOSTS, MONITOR_WINDOW};

#[derive(Parser)]
#[command(name = "sonar")]
#[command(version, about = "Sweep networks for live hosts and watch their latency.")]
pub struct CommandLine {
    #[command(subcommand)]
    pub command: Commands,

    /// Skip reverse name resolution
    #[arg(long, global = true)]
    pub no_resolve: bool,

    /// Name server for PTR lookups (repeatable); defaults to the system's
    #[arg(long = "dns", value_name = "ADDR", global = true)]
    pub dns_servers: Vec<IpAddr>,

    /// Less output: -q drops the banner and headers, -qq prints results only
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub quiet: u8,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[arg(long, global = true)]
    pub no_banner: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Find live hosts in one or more addresses, ranges, CIDR blocks or hostnames
    #[command(alias = "s")]
    Sweep(SweepArgs),
    /// Watch the latency of a set of hosts
    #[command(alias = "m")]
    Monitor(MonitorArgs),
    /// Look up the name of one address
    #[command(alias = "r")]
    Resolve(ResolveArgs),
}

#[derive(Args)]
pub struct SweepArgs {
    /// Comma-separated targets, e.g. 192.168.1.0/24,10.0.0.1-50,nas.lan
    #[arg(required_unless_present = "file")]
    pub target: Option<String>,

    /// Read targets from a file, one per line, `#` starts a comment
    #[arg(short, long, value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// gentle, medium or aggressive
    #[arg(short, long, default_value_t = Aggression::Medium)]
    pub aggression: Aggression,

    /// Worker count, overriding the aggression profile
    #[arg(short, long)]
    pub concurrency: Option<usize>,

    /// Refuse to sweep more addresses than this
    #[arg(long, default_value_t = DEFAULT_MAX_HOSTS)]
    pub max_hosts: usize,

    /// Only list hosts that answered
    #[arg(long)]
    pub alive: bool,
}

#[derive(Args)]
pub struct MonitorArgs {
    /// Addresses or hostnames to watch
    #[arg(required = true)]
    pub hosts: Vec<String>,

    /// Seconds between probes
    #[arg(short, long, default_value_t = 1.0)]
    pub interval: f64,

    /// Stop after this many cycles instead of waiting for `q`
    #[arg(short, long)]
    pub count: Option<u64>,

    /// Samples kept per host
    #[arg(short, long, default_value_t = MONITOR_WINDOW)]
    pub window: usize,

    /// Write the final export to FILE
    #[arg(short, long, value_name = "FILE")]
    pub export: Option<PathBuf>,
}

#[derive(Args)]
pub struct ResolveArgs {
    pub addr: IpAddr,

    /// Overall resolution budget in seconds
    #[arg(short, long, default_value_t = 5.0)]
    pub timeout: f64,
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn config(&self) -> Config {
        let mut cfg = Config {
            no_resolve: self.no_resolve,
            quiet: self.quiet,
            no_banner: self.no_banner,
            dns_servers: self.dns_servers.clone(),
            ..Config::default()
        };
        match &self.command {
            Commands::Sweep(args) => {
                cfg.concurrency = args.concurrency;
                cfg.max_hosts = args.max_hosts;
            }
            Commands::Monitor(args) => {
                cfg.interval = seconds(args.interval, cfg.interval);
                cfg.window = args.window.max(1);
            }
            Commands::Resolve(_) => {}
        }
        cfg
    }
}

/// Non-finite or non-positive values fall back to `default`.
pub fn seconds(value: f64, default: Duration) -> Duration {
    if value.is_finite() && value > 0.0 {
        Duration::from_secs_f64(value)
    } else {
        default
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
