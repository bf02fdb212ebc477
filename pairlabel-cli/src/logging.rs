/// Tracing setup. Logs go to stderr so stdout stays parseable.
use tracing_subscriber::{fmt, EnvFilter};

/// Build the filter: `RUST_LOG` if set, else `verbose` → debug, else the
/// configured level, else warn.
fn build_filter(log_level: Option<&str>, verbose: bool) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }
    EnvFilter::new(default_directive(log_level, verbose))
}

/// Directive used when `RUST_LOG` is unset. Targets are crate names: the
/// library and the `pairlabel` binary.
fn default_directive(log_level: Option<&str>, verbose: bool) -> String {
    let base_level = if verbose { "debug" } else { log_level.unwrap_or("warn") };
    format!("pairlabel_core={base_level},pairlabel={base_level},warn")
}

pub fn init_tracing(log_level: Option<&str>, verbose: bool) {
    fmt()
        .with_env_filter(build_filter(log_level, verbose))
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();
}
