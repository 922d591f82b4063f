use colored::*;
use tracing::{Event, Level, Subscriber};
use tracing_indicatif::IndicatifLayer;
use tracing_indicatif::filter::IndicatifFilter;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::{self, Writer};
use tracing_subscriber::fmt::{FmtContext, FormatEvent};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{Layer, fmt};

/// Events on this target are pre-formatted terminal lines.
pub const PRINT_TARGET: &str = "sonar::print";
const SUCCESS_TARGET: &str = "sonar::success";

pub struct SonarFormatter;

impl<S, N> FormatEvent<S, N> for SonarFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> format::FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let meta = event.metadata();
        // Raw mode turns off output post-processing, so "\n" no longer returns the carriage.
        let raw_mode: bool = crossterm::terminal::is_raw_mode_enabled().unwrap_or(false);
        let eol: &str = if raw_mode { "\r\n" } else { "\n" };

        if meta.target() == PRINT_TARGET {
            let mut visitor = RawMessage::default();
            event.record(&mut visitor);
            let text = if raw_mode { visitor.0.replace('\n', "\r\n") } else { visitor.0 };
            return write!(writer, "{text}{eol}");
        }

        let (symbol, color_func): (&str, fn(ColoredString) -> ColoredString) =
            match (*meta.level(), meta.target()) {
                (Level::INFO, SUCCESS_TARGET) => ("[✓]", |s| s.bright_green().bold()),
                (Level::TRACE, _) => ("[ ]", |s| s.dimmed()),
                (Level::DEBUG, _) => ("[?]", |s| s.blue()),
                (Level::INFO, _) => ("[+]", |s| s.green().bold()),
                (Level::WARN, _) => ("[*]", |s| s.yellow().bold()),
                (Level::ERROR, _) => ("[-]", |s| s.red().bold()),
            };

        write!(writer, "{} ", color_func(symbol.into()))?;

        ctx.field_format().format_fields(writer.by_ref(), event)?;

        write!(writer, "{eol}")
    }
}

/// Picks the `raw_msg` field out of a print event.
#[derive(Default)]
struct RawMessage(String);

impl tracing::field::Visit for RawMessage {
    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "raw_msg" {
            self.0 = value.to_string();
        }
    }

    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "raw_msg" {
            self.0 = format!("{value:?}");
        }
    }
}

/// Installs the global subscriber: `RUST_LOG` (or the verbosity flag) picks
/// the level, log lines are routed through indicatif so they never tear a
/// progress bar.
pub fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let indicatif_layer = IndicatifLayer::new();
    let fmt_layer = fmt::layer()
        .event_format(SonarFormatter)
        .with_writer(indicatif_layer.get_stderr_writer());

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .with(indicatif_layer.with_filter(IndicatifFilter::new(false)))
        .try_init();
}
