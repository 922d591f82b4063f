//! # Sweep Targets
//!
//! Defines the possible inputs for a sweep and expands them into a bounded,
//! concrete address list.
//!
//! A target string can be:
//! * A single IPv4/IPv6 address (host).
//! * An IPv4 range (e.g., `192.168.1.1-100` or `10.0.0.1-10.0.1.20`).
//! * A CIDR block (e.g., `192.168.1.0/24`).
//! * A hostname, resolved through a [`ForwardLookup`].
//! * A comma-separated list of any of the above.

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, ToSocketAddrs};
use std::str::FromStr;

use crate::error::InputError;
use crate::models::ProbeTarget;
use crate::network::range::{self, IpCollection, Ipv4Range};
use crate::{success, warn};

const MAX_HOSTNAME_LEN: usize = 253;
const MAX_LABEL_LEN: usize = 63;

/// Represents a distinct target to be swept.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Target {
    /// A single specific host.
    Host { target_addr: IpAddr },
    /// A range of IPv4 addresses (CIDR blocks are stored as ranges too).
    Range { ipv4_range: Ipv4Range },
    /// A name still to be resolved to an address.
    Hostname { name: String },
    /// Holds a list of different targets.
    Multi { targets: Vec<Target> },
}

impl FromStr for Target {
    type Err = InputError;

    /// Parses a string into a `Target`.
    ///
    /// Supported formats:
    /// * **Host**: Single IPv4/IPv6 address (e.g., "192.168.1.5").
    /// * **Range**: "Start-End" (e.g., "192.168.1.1-50", "192.168.1.1-192.168.1.50").
    /// * **CIDR**: "Network/Prefix" (e.g., "192.168.1.0/24").
    /// * **Hostname**: "nas.local", "printer".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(InputError::invalid(s, "empty target"));
        }

        if s.contains(',') {
            return parse_commas(s);
        }

        if let Some(target) = parse_host(s) {
            return Ok(target);
        }

        if let Some(target) = parse_cidr_range(s)? {
            return Ok(target);
        }

        if let Some(target) = parse_ip_range(s)? {
            return Ok(target);
        }

        if is_hostname(s) {
            return Ok(Target::Hostname {
                name: s.to_ascii_lowercase(),
            });
        }

        Err(InputError::invalid(s, "not an address, range, CIDR block or hostname"))
    }
}

/// Resolves a hostname to one address.
pub trait ForwardLookup {
    fn lookup(&self, name: &str) -> Option<IpAddr>;
}

/// Forward lookup through the operating system resolver. IPv4 answers are
/// preferred over IPv6 ones.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemLookup;

impl ForwardLookup for SystemLookup {
    fn lookup(&self, name: &str) -> Option<IpAddr> {
        let addrs: Vec<IpAddr> = (name, 0)
            .to_socket_addrs()
            .ok()?
            .map(|sock| sock.ip())
            .collect();
        addrs
            .iter()
            .find(|ip| ip.is_ipv4())
            .or_else(|| addrs.first())
            .copied()
    }
}

/// Parses a newline-separated target list. Text after `#` is a comment and
/// blank lines are skipped.
pub fn parse_list(text: &str) -> Result<Target, InputError> {
    let targets: Vec<Target> = text
        .lines()
        .map(|line| line.split('#').next().unwrap_or_default().trim())
        .filter(|line| !line.is_empty())
        .map(Target::from_str)
        .collect::<Result<_, _>>()?;

    if targets.is_empty() {
        return Err(InputError::NoTargets);
    }
    Ok(Target::Multi { targets })
}

/// Expands `target` into concrete probe targets.
///
/// The distinct address count is checked against `cap` before any address is
/// materialised. Hostnames that do not resolve contribute nothing; an overall
/// empty result is [`InputError::NoTargets`].
pub fn expand(
    target: &Target,
    lookup: &dyn ForwardLookup,
    cap: usize,
) -> Result<Vec<ProbeTarget>, InputError> {
    let mut collection = IpCollection::new();
    let mut declared: HashMap<IpAddr, String> = HashMap::new();

    resolve_target(target, lookup, &mut collection, &mut declared);

    let count: u64 = collection.len();
    if count > cap as u64 {
        return Err(InputError::TooManyAddresses { count, cap });
    }
    if count == 0 {
        return Err(InputError::NoTargets);
    }

    let targets: Vec<ProbeTarget> = collection
        .into_iter()
        .map(|addr| ProbeTarget {
            addr,
            name: declared.get(&addr).cloned(),
        })
        .collect();

    let len: usize = targets.len();
    let unit: &str = if len == 1 { "address has been" } else { "addresses have been" };
    success!("{len} {unit} parsed successfully");

    Ok(targets)
}

/// Parses and expands in one step.
pub fn expand_str(
    s: &str,
    lookup: &dyn ForwardLookup,
    cap: usize,
) -> Result<Vec<ProbeTarget>, InputError> {
    let target: Target = s.parse()?;
    expand(&target, lookup, cap)
}

/// Shared by single and multi targets.
fn resolve_target(
    target: &Target,
    lookup: &dyn ForwardLookup,
    collection: &mut IpCollection,
    declared: &mut HashMap<IpAddr, String>,
) {
    match target {
        Target::Host { target_addr } => collection.add_single(*target_addr),
        Target::Range { ipv4_range } => collection.add_range(*ipv4_range),
        Target::Hostname { name } => match lookup.lookup(name) {
            Some(addr) => {
                declared.entry(addr).or_insert_with(|| name.clone());
                collection.add_single(addr);
            }
            None => warn!("Could not resolve hostname '{name}', skipping"),
        },
        Target::Multi { targets } => {
            for target in targets {
                resolve_target(target, lookup, collection, declared);
            }
        }
    }
}

/// Parses a comma-separated list of targets (e.g., "192.168.1.5, 10.0.0.1-50, nas").
fn parse_commas(s: &str) -> Result<Target, InputError> {
    let targets: Vec<Target> = s
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(Target::from_str)
        .collect::<Result<_, _>>()?;

    if targets.is_empty() {
        return Err(InputError::invalid(s, "no targets in list"));
    }
    Ok(Target::Multi { targets })
}

/// Parses a single IP address.
fn parse_host(s: &str) -> Option<Target> {
    s.parse::<IpAddr>()
        .ok()
        .map(|target_addr| Target::Host { target_addr })
}

fn looks_numeric(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit() || c == '.')
}

/// Parses a range string like "1.1.1.1-2.2.2.2" or "1.1.1.1-50".
///
/// Strings whose start is not dotted-numeric are left for the hostname parser,
/// so names such as `db-01` are not mistaken for ranges.
fn parse_ip_range(s: &str) -> Result<Option<Target>, InputError> {
    let Some((start_str, end_str)) = s.split_once('-') else {
        return Ok(None);
    };
    let start_str = start_str.trim();
    let end_str = end_str.trim();
    if !looks_numeric(start_str) {
        return Ok(None);
    }

    let start_addr = start_str
        .parse::<Ipv4Addr>()
        .map_err(|e| InputError::invalid(s, format!("invalid start address '{start_str}': {e}")))?;

    let end_addr = parse_range_end_addr(end_str, &start_addr, s)?;

    let ipv4_range = Ipv4Range::checked(start_addr, end_addr)?;
    Ok(Some(Target::Range { ipv4_range }))
}

/// Helper to parse the end address of a range.
///
/// Handles abbreviated forms like "192.168.1.1-50" (implies 192.168.1.50)
/// and full forms like "192.168.1.1-192.168.1.255".
fn parse_range_end_addr(
    end_str: &str,
    start_addr: &Ipv4Addr,
    original_s: &str,
) -> Result<Ipv4Addr, InputError> {
    if let Ok(full_addr) = end_str.parse::<Ipv4Addr>() {
        return Ok(full_addr);
    }

    if end_str.is_empty() {
        return Err(InputError::invalid(original_s, "end of range cannot be empty"));
    }

    let mut end_octets = start_addr.octets();
    let partial_octets: Vec<u8> = end_str
        .split('.')
        .map(|octet_str| octet_str.parse::<u8>())
        .collect::<Result<Vec<u8>, _>>()
        .map_err(|e| InputError::invalid(original_s, format!("invalid end range '{end_str}': {e}")))?;

    if partial_octets.len() > 4 {
        return Err(InputError::invalid(
            original_s,
            format!("end range has too many octets: {end_str}"),
        ));
    }

    let start_index = 4 - partial_octets.len();
    end_octets[start_index..].copy_from_slice(&partial_octets);

    Ok(Ipv4Addr::from(end_octets))
}

/// Parses CIDR notation like "192.168.1.0/24" into its usable hosts.
fn parse_cidr_range(s: &str) -> Result<Option<Target>, InputError> {
    let Some((ip_str, prefix_str)) = s.split_once('/') else {
        return Ok(None);
    };

    let ipv4_addr = ip_str
        .trim()
        .parse::<Ipv4Addr>()
        .map_err(|e| InputError::invalid(s, format!("invalid IP in CIDR '{ip_str}': {e}")))?;

    let prefix = prefix_str
        .trim()
        .parse::<u8>()
        .map_err(|e| InputError::invalid(s, format!("invalid prefix in CIDR '{prefix_str}': {e}")))?;

    let ipv4_range = range::cidr_hosts(ipv4_addr, prefix)?;

    Ok(Some(Target::Range { ipv4_range }))
}

/// RFC 1123 hostname syntax. At least one label must contain a letter so that
/// malformed dotted quads are not treated as names.
fn is_hostname(s: &str) -> bool {
    let s = s.strip_suffix('.').unwrap_or(s);
    if s.is_empty() || s.len() > MAX_HOSTNAME_LEN {
        return false;
    }
    let labels_ok = s.split('.').all(|label| {
        !label.is_empty()
            && label.len() <= MAX_LABEL_LEN
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    });
    labels_ok && s.chars().any(|c| c.is_ascii_alphabetic())
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
