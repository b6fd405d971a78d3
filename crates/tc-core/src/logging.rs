//! Console and file logging for the relay.
//!
//! Output is plain human-readable text: connection attempts, reconnect
//! countdowns, checkpoint and alert lines, routine ticks. Nothing downstream
//! parses it. `RUST_LOG` takes precedence over the level passed in.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global subscriber. Call once, before the first log line.
///
/// With `log_dir` set, lines are also written to `<log_dir>/<file_prefix>.<date>`,
/// rotated daily.
pub fn init_logging(log_level: &str, log_dir: Option<&str>, file_prefix: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    // Single-task relay: targets and thread ids add nothing to these lines.
    let console_layer = fmt::layer().with_target(false).with_ansi(true);

    let registry = tracing_subscriber::registry().with(env_filter).with(console_layer);

    match log_dir {
        Some(dir) => {
            let file_layer = fmt::layer()
                .with_writer(tracing_appender::rolling::daily(dir, file_prefix))
                .with_ansi(false)
                .with_target(false);
            registry.with(file_layer).init();
        }
        None => registry.init(),
    }
}
