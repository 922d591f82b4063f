//! Cross-crate scenarios: target expansion feeding the sweep engine, the
//! monitor driven end to end, and the resolver chain over real codecs.
//!
//! Probers and strategies are fakes plugged in through the public traits, so
//! nothing here touches the network.

pub mod support;

#[cfg(test)]
mod monitor;
#[cfg(test)]
mod resolution;
#[cfg(test)]
mod sweep;
