//! Wire codecs used by the hostname resolver.
//!
//! Both codecs treat responses as untrusted input: decoding returns `None` or an
//! error on anything malformed and never indexes past the end of a buffer.

pub mod dns;
pub mod nbstat;
