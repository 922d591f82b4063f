use colored::Color;

pub const PRIMARY: Color = Color::BrightGreen;
pub const ACCENT: Color = Color::BrightCyan;
pub const SEPARATOR: Color = Color::BrightBlack;
pub const TEXT_DEFAULT: Color = Color::White;
pub const IPV4_ADDR: Color = Color::BrightBlue;
pub const IPV6_ADDR: Color = Color::Blue;
pub const HOSTNAME: Color = Color::BrightWhite;

pub const LATENCY_GOOD: Color = Color::Green;
pub const LATENCY_DEGRADED: Color = Color::Yellow;
pub const LATENCY_POOR: Color = Color::BrightRed;
pub const OFFLINE: Color = Color::Red;
pub const PENDING: Color = Color::BrightBlack;
