//! # NetBIOS Node Status (NBSTAT)
//!
//! Builds the wildcard node-status request sent to UDP/137 and extracts a
//! host name from the reply (RFC 1002, sections 4.2.17 and 4.2.18).
//!
//! Reply layout, assuming an uncompressed answer name:
//!
//! ```text
//!  0..12   header (id, flags, counts)
//! 12..46   RR_NAME, first-level encoded (length byte, 32 bytes, terminator)
//! 46..56   RR_TYPE, RR_CLASS, TTL, RDLENGTH
//! 56       NUM_NAMES
//! 57..     NUM_NAMES entries of 18 bytes: name[15], suffix, flags[2]
//! ```
//!
//! The decoder walks these fields instead of trusting the fixed offsets.

pub const NBSTAT_PORT: u16 = 137;
pub const NBSTAT_TYPE: u16 = 0x0021;
pub const CLASS_IN: u16 = 0x0001;

pub const HEADER_LEN: usize = 12;
pub const ENCODED_NAME_LEN: usize = 32;
pub const REQUEST_LEN: usize = HEADER_LEN + 1 + ENCODED_NAME_LEN + 1 + 4;
/// Smallest datagram that can hold a header, an answer and the name count.
pub const MIN_RESPONSE_LEN: usize = 57;

pub const SUFFIX_WORKSTATION: u8 = 0x00;
pub const SUFFIX_SERVER: u8 = 0x20;

const NETBIOS_NAME_LEN: usize = 15;
const NAME_ENTRY_LEN: usize = 18;
const RR_FIXED_LEN: usize = 10;
const GROUP_FLAG: u16 = 0x8000;
const RESPONSE_FLAG: u16 = 0x8000;
const MAX_LABELS: usize = 64;

/// One row of the node-status name table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameEntry {
    /// The 15 name bytes, trailing padding removed.
    pub name: String,
    pub suffix: u8,
    pub flags: u16,
}

impl NameEntry {
    pub fn is_group(&self) -> bool {
        self.flags & GROUP_FLAG != 0
    }

    fn is_host_name(&self) -> bool {
        matches!(self.suffix, SUFFIX_WORKSTATION | SUFFIX_SERVER)
    }
}

pub fn new_transaction_id() -> u16 {
    rand::random()
}

/// Splits each of the 16 name bytes into two nibbles, each added to `'A'`.
pub fn first_level_encode(raw: &[u8; 16]) -> [u8; ENCODED_NAME_LEN] {
    let mut encoded = [0u8; ENCODED_NAME_LEN];
    for (i, byte) in raw.iter().enumerate() {
        encoded[2 * i] = b'A' + (byte >> 4);
        encoded[2 * i + 1] = b'A' + (byte & 0x0F);
    }
    encoded
}

/// Encodes an ordinary NetBIOS name: upper-cased, space padded to 15 bytes,
/// followed by the suffix byte. Longer names are cut at 15 bytes.
pub fn encode_name(name: &str, suffix: u8) -> [u8; ENCODED_NAME_LEN] {
    let mut raw = [b' '; 16];
    for (slot, byte) in raw.iter_mut().zip(name.bytes().take(NETBIOS_NAME_LEN)) {
        *slot = byte.to_ascii_uppercase();
    }
    raw[NETBIOS_NAME_LEN] = suffix;
    first_level_encode(&raw)
}

/// The wildcard `*` name used for node-status queries, NUL padded.
fn wildcard_name() -> [u8; ENCODED_NAME_LEN] {
    let mut raw = [0u8; 16];
    raw[0] = b'*';
    first_level_encode(&raw)
}

/// Builds a node-status request: header with one question for the wildcard
/// name, qtype NBSTAT and qclass IN.
///
/// The wildcard is `*` followed by 15 NUL bytes (`CKAAAAAA...` once encoded),
/// not by spaces. Windows and Samba only answer the NUL-padded form.
pub fn create_request(transaction_id: u16) -> Vec<u8> {
    let mut packet: Vec<u8> = Vec::with_capacity(REQUEST_LEN);
    packet.extend_from_slice(&transaction_id.to_be_bytes());
    packet.extend_from_slice(&0u16.to_be_bytes()); // flags: standard query
    packet.extend_from_slice(&1u16.to_be_bytes()); // qdcount
    packet.extend_from_slice(&[0u8; 6]); // ancount, nscount, arcount

    packet.push(ENCODED_NAME_LEN as u8);
    packet.extend_from_slice(&wildcard_name());
    packet.push(0);

    packet.extend_from_slice(&NBSTAT_TYPE.to_be_bytes());
    packet.extend_from_slice(&CLASS_IN.to_be_bytes());
    packet
}

/// Returns the first workstation or server name in record order, or `None` if
/// the reply is malformed, truncated, not for `expected_id`, or has no usable
/// name.
pub fn decode_hostname(payload: &[u8], expected_id: Option<u16>) -> Option<String> {
    parse_name_table(payload, expected_id)?
        .into_iter()
        .find(|entry| entry.is_host_name() && !is_reserved(entry.name.as_bytes()))
        .map(|entry| entry.name)
}

/// Parses the full name table of a node-status reply.
pub fn parse_name_table(payload: &[u8], expected_id: Option<u16>) -> Option<Vec<NameEntry>> {
    if payload.len() < MIN_RESPONSE_LEN {
        return None;
    }

    let mut reader = Reader::new(payload);
    let id = reader.u16()?;
    if expected_id.is_some_and(|expected| expected != id) {
        return None;
    }
    let flags = reader.u16()?;
    if flags & RESPONSE_FLAG == 0 {
        return None;
    }
    let qdcount = reader.u16()?;
    let ancount = reader.u16()?;
    reader.skip(4)?;
    if ancount == 0 {
        return None;
    }

    for _ in 0..qdcount {
        reader.skip_name()?;
        reader.skip(4)?;
    }

    reader.skip_name()?;
    let rr_type = reader.u16()?;
    let _rr_class = reader.u16()?;
    reader.skip(4)?; // ttl
    let rd_len = reader.u16()? as usize;
    if rr_type != NBSTAT_TYPE {
        return None;
    }

    let rdata = reader.take(rd_len.min(reader.remaining()))?;
    let (&count, entries) = rdata.split_first()?;
    let table_len = count as usize * NAME_ENTRY_LEN;
    if entries.len() < table_len {
        return None;
    }

    let table = entries[..table_len]
        .chunks_exact(NAME_ENTRY_LEN)
        .map(|chunk| NameEntry {
            name: trim_name(&chunk[..NETBIOS_NAME_LEN]),
            suffix: chunk[NETBIOS_NAME_LEN],
            flags: u16::from_be_bytes([chunk[16], chunk[17]]),
        })
        .collect();
    Some(table)
}

/// Names starting with a control byte (e.g. `\x01\x02__MSBROWSE__`), a space,
/// or `*` are protocol markers, not host names.
fn is_reserved(name: &[u8]) -> bool {
    match name.first() {
        None => true,
        Some(&first) => first <= b' ' || first == b'*',
    }
}

fn trim_name(raw: &[u8]) -> String {
    let end = raw
        .iter()
        .rposition(|&b| b != b' ' && b != 0)
        .map_or(0, |pos| pos + 1);
    String::from_utf8_lossy(&raw[..end]).into_owned()
}

/// Bounds-checked cursor over an untrusted datagram.
struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.pos)
    }

    fn take(&mut self, n: usize) -> Option<&'a [u8]> {
        let end = self.pos.checked_add(n)?;
        let slice = self.buf.get(self.pos..end)?;
        self.pos = end;
        Some(slice)
    }

    fn skip(&mut self, n: usize) -> Option<()> {
        self.take(n).map(|_| ())
    }

    fn u8(&mut self) -> Option<u8> {
        self.take(1).map(|b| b[0])
    }

    fn u16(&mut self) -> Option<u16> {
        self.take(2).map(|b| u16::from_be_bytes([b[0], b[1]]))
    }

    /// Skips a label sequence or a compression pointer.
    fn skip_name(&mut self) -> Option<()> {
        for _ in 0..MAX_LABELS {
            let len = self.u8()?;
            match len {
                0 => return Some(()),
                l if l & 0xC0 == 0xC0 => return self.skip(1),
                l if l & 0xC0 != 0 => return None,
                l => self.skip(l as usize)?,
            }
        }
        None
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
