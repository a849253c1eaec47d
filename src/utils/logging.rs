// file: src/utils/logging.rs
// description: Tracing subscriber initialization with optional ANSI coloring

use colored::*;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Installs the global subscriber. `RUST_LOG` wins over the `verbose` default.
pub fn init_logger(colored_output: bool, verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(verbose)
        .with_line_number(verbose)
        .compact()
        .with_ansi(colored_output);

    colored::control::set_override(colored_output);

    // a second init (tests, embedding) keeps the first subscriber
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}

pub fn format_success(msg: &str) -> String {
    format!("{} {}", "✓".green().bold(), msg.green())
}

pub fn format_error(msg: &str) -> String {
    format!("{} {}", "✗".red().bold(), msg.red())
}

pub fn format_warning(msg: &str) -> String {
    format!("{} {}", "⚠".yellow().bold(), msg.yellow())
}

pub fn format_info(msg: &str) -> String {
    format!("{} {}", "ℹ".blue().bold(), msg)
}

pub fn format_step(step: usize, total: usize, msg: &str) -> String {
    format!("{} {}", format!("[{}/{}]", step, total).cyan().bold(), msg)
}

/// One colored label per file state, as shown in CLI tables.
pub fn format_state(state: crate::models::FileState) -> String {
    use crate::models::FileState;
    match state {
        FileState::New => state.as_str().green().bold().to_string(),
        FileState::Modified => state.as_str().yellow().bold().to_string(),
        FileState::Valid => state.as_str().normal().to_string(),
        FileState::Error => state.as_str().red().bold().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FileState;

    #[test]
    fn test_formatters_keep_message() {
        colored::control::set_override(false);
        assert_eq!(format_success("saved"), "✓ saved");
        assert_eq!(format_step(2, 5, "history"), "[2/5] history");
        assert_eq!(format_state(FileState::Modified), "MODIFIED");
    }

    #[test]
    fn test_init_logger_twice_is_harmless() {
        init_logger(false, false);
        init_logger(false, true);
    }
}
