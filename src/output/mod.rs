//! Console logging

use chrono::{Local, SecondsFormat};
use tracing::info;
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::{layer::SubscriberExt, EnvFilter};

/// RFC 3339 local timestamps, e.g. `2024-05-01T12:00:00+02:00`
struct Rfc3339;

impl FormatTime for Rfc3339 {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            Local::now().to_rfc3339_opts(SecondsFormat::Secs, false)
        )
    }
}

/// Install the console subscriber for the current thread.
///
/// Logging stays active until the returned guard is dropped.
pub fn init_logging() -> DefaultGuard {
    let subscriber = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_timer(Rfc3339)
                .with_target(false),
        );

    tracing::subscriber::set_default(subscriber)
}

/// Writes the one success line each step of a run produces
#[derive(Debug, Clone, Copy)]
pub struct Reporter {
    verbose: bool,
}

impl Reporter {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// `<head>ok`
    pub fn ok(&self, head: &str) {
        info!("{}", ok_line(head, None));
    }

    /// `<head>ok (<detail>)`, always with the detail
    pub fn ok_with(&self, head: &str, detail: &str) {
        info!("{}", ok_line(head, Some(detail)));
    }

    /// `<head>ok`, followed by ` (<description>)` in verbose mode
    pub fn ok_described(&self, head: &str, description: &str) {
        info!("{}", self.described_line(head, description));
    }

    pub fn described_line(&self, head: &str, description: &str) -> String {
        ok_line(head, self.verbose.then_some(description))
    }

    /// Log text opening the prefetch step, listing every URL in verbose mode
    pub fn prefetch_head(&self, urls: &[String]) -> String {
        if !self.verbose || urls.is_empty() {
            return "Prefetching ... ".to_string();
        }

        let listed: Vec<String> = urls.iter().map(|u| format!("'{}'", u)).collect();
        format!("Prefetching {} ... ", listed.join(", "))
    }
}

fn ok_line(head: &str, detail: Option<&str>) -> String {
    match detail {
        Some(detail) => format!("{}ok ({})", head, detail),
        None => format!("{}ok", head),
    }
}
