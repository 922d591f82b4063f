//! Minimal DNS client codec: PTR queries and the hostname in their answers.

use std::net::IpAddr;

use anyhow::{Context, bail, ensure};
use pnet::packet::dns::{DnsClass, DnsPacket, DnsQuery, DnsTypes, MutableDnsPacket, Opcode, Retcode};

pub const DNS_PORT: u16 = 53;
pub const DNS_HDR_LEN: usize = 12;

const TYPE_PTR: u16 = 12;
const MAX_POINTER_HOPS: usize = 16;
const MAX_NAME_LEN: usize = 255;

/// Extracts `(transaction id, hostname)` from a PTR response.
///
/// Compression pointers are followed inside `payload`; every offset is checked.
pub fn get_hostname(payload: &[u8]) -> anyhow::Result<(u16, String)> {
    let dns = DnsPacket::new(payload).context("Failed to parse DNS packet")?;
    let transaction_id = dns.get_id();
    ensure!(dns.get_is_response() == 1, "DNS packet is not a response");

    let mut cursor: usize = DNS_HDR_LEN;
    for _ in 0..dns.get_query_count() {
        cursor = skip_name(payload, cursor)?;
        cursor = checked_advance(payload, cursor, 4)?;
    }

    for _ in 0..dns.get_response_count() {
        cursor = skip_name(payload, cursor)?;
        let fixed = payload
            .get(cursor..cursor + 10)
            .context("truncated resource record")?;
        let rtype = u16::from_be_bytes([fixed[0], fixed[1]]);
        let rd_len = u16::from_be_bytes([fixed[8], fixed[9]]) as usize;
        let rdata_start = cursor + 10;
        cursor = checked_advance(payload, rdata_start, rd_len)?;

        if rtype == TYPE_PTR {
            let name = decode_dns_name(payload, rdata_start)?;
            let name = name.trim_end_matches('.').to_string();
            ensure!(!name.is_empty(), "empty PTR record");
            return Ok((transaction_id, name));
        }
    }

    bail!("No valid PTR record found")
}

pub fn create_ptr_packet(ip_addr: &IpAddr, id: u16) -> anyhow::Result<Vec<u8>> {
    let query: DnsQuery = create_ptr_query(ip_addr);
    let q_fixed_len: usize = 4;
    let qlen: usize = query.qname.len() + q_fixed_len;
    let total: usize = DNS_HDR_LEN + qlen;
    let mut buffer: Vec<u8> = vec![0u8; total];

    {
        let mut dns: MutableDnsPacket =
            MutableDnsPacket::new(&mut buffer).context("creating dns header")?;
        dns.set_id(id);
        dns.set_is_response(0);
        dns.set_opcode(Opcode::StandardQuery);
        dns.set_is_authoriative(0);
        dns.set_is_truncated(0);
        dns.set_is_recursion_desirable(1);
        dns.set_is_recursion_available(0);
        dns.set_zero_reserved(0);
        dns.set_is_non_authenticated_data(0);
        dns.set_rcode(Retcode::NoError);
        dns.set_query_count(1);
        dns.set_response_count(0);
        dns.set_authority_rr_count(0);
        dns.set_additional_rr_count(0);
    }

    let mut cursor: usize = DNS_HDR_LEN;

    buffer[cursor..cursor + query.qname.len()].copy_from_slice(&query.qname);
    cursor += query.qname.len();

    let type_bytes: [u8; 2] = query.qtype.0.to_be_bytes();
    buffer[cursor..cursor + 2].copy_from_slice(&type_bytes);
    cursor += 2;

    let class_bytes: [u8; 2] = query.qclass.0.to_be_bytes();
    buffer[cursor..cursor + 2].copy_from_slice(&class_bytes);

    Ok(buffer)
}

/// `4.3.2.1.in-addr.arpa` for IPv4, nibble-reversed `ip6.arpa` for IPv6.
pub fn reverse_ptr_name(ip_addr: &IpAddr) -> String {
    match ip_addr {
        IpAddr::V4(v4) => {
            let [a, b, c, d] = v4.octets();
            format!("{d}.{c}.{b}.{a}.in-addr.arpa")
        }
        IpAddr::V6(v6) => {
            let mut labels: Vec<String> = Vec::with_capacity(33);
            for byte in v6.octets().iter().rev() {
                labels.push(format!("{:x}", byte & 0x0F));
                labels.push(format!("{:x}", byte >> 4));
            }
            labels.push("ip6.arpa".to_string());
            labels.join(".")
        }
    }
}

fn create_ptr_query(ip_addr: &IpAddr) -> DnsQuery {
    let ptr_string: String = reverse_ptr_name(ip_addr);
    DnsQuery {
        qname: encode_dns_name(&ptr_string),
        qtype: DnsTypes::PTR,
        qclass: DnsClass(1),
        payload: Vec::new(),
    }
}

fn encode_dns_name(name: &str) -> Vec<u8> {
    let mut encoded: Vec<u8> = Vec::new();
    for label in name.split('.') {
        if label.is_empty() {
            continue;
        }
        encoded.push(label.len() as u8);
        encoded.extend_from_slice(label.as_bytes());
    }
    encoded.push(0);
    encoded
}

fn checked_advance(msg: &[u8], cursor: usize, n: usize) -> anyhow::Result<usize> {
    let next = cursor.checked_add(n).context("offset overflow")?;
    ensure!(next <= msg.len(), "truncated DNS message");
    Ok(next)
}

/// Returns the offset just past the name starting at `cursor`.
fn skip_name(msg: &[u8], mut cursor: usize) -> anyhow::Result<usize> {
    loop {
        let len = *msg.get(cursor).context("truncated name")? as usize;
        match len {
            0 => return Ok(cursor + 1),
            l if l & 0xC0 == 0xC0 => return checked_advance(msg, cursor, 2),
            l if l & 0xC0 != 0 => bail!("unsupported label type"),
            l => cursor = checked_advance(msg, cursor + 1, l)?,
        }
    }
}

/// Decodes the (possibly compressed) name at `offset`.
fn decode_dns_name(msg: &[u8], mut offset: usize) -> anyhow::Result<String> {
    let mut parts: Vec<String> = Vec::new();
    let mut total_len: usize = 0;
    let mut hops: usize = 0;

    loop {
        let len = *msg.get(offset).context("truncated name")? as usize;
        if len == 0 {
            break;
        }
        if len & 0xC0 == 0xC0 {
            let low = *msg.get(offset + 1).context("truncated pointer")? as usize;
            hops += 1;
            ensure!(hops <= MAX_POINTER_HOPS, "compression loop");
            offset = ((len & 0x3F) << 8) | low;
            continue;
        }
        ensure!(len & 0xC0 == 0, "unsupported label type");

        let label_bytes: &[u8] = msg
            .get(offset + 1..offset + 1 + len)
            .context("label exceeds message")?;
        let label: &str = std::str::from_utf8(label_bytes).context("label is not UTF-8")?;
        total_len += len + 1;
        ensure!(total_len <= MAX_NAME_LEN, "name too long");
        parts.push(label.to_string());
        offset += 1 + len;
    }
    Ok(parts.join("."))
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
