//! Data structures that cross the engine boundary.
//!
//! [`ProbeResult`] is produced by sweeps, [`MonitoredHostView`] by the monitor.
//! Neither carries presentation state.

pub mod host_view;
pub mod probe;
pub mod sample;

pub use host_view::{HostStatus, LatencyBand, MonitoredHostView};
pub use probe::{ProbeResult, ProbeTarget};
pub use sample::{Sample, SampleWindow};
