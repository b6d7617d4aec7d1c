//! Terminal feedback for the brainctl CLI
//!
//! The extraction bar is suppressed when:
//! - `--quiet` or `--no-progress` is passed
//! - `BRAINCTL_QUIET=1` is set
//! - stderr is not a TTY (piped output)
//!
//! stdout stays reserved for the run summary, so nothing here writes to it.

use std::io::IsTerminal;
use std::sync::OnceLock;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

static QUIET_MODE: OnceLock<bool> = OnceLock::new();

const BAR_TEMPLATE: &str =
    "{spinner:.green} {elapsed_precise} [{bar:30.cyan/blue}] {pos}/{len} {msg}";

fn quiet_from(flag: bool, env_value: Option<&str>, stderr_is_tty: bool) -> bool {
    flag || env_value == Some("1") || !stderr_is_tty
}

/// Call once at startup with the --quiet flag value.
pub fn init_quiet_mode(quiet_flag: bool) {
    let env_value = std::env::var("BRAINCTL_QUIET").ok();
    let is_quiet = quiet_from(
        quiet_flag,
        env_value.as_deref(),
        std::io::stderr().is_terminal(),
    );
    QUIET_MODE.set(is_quiet).ok();
}

pub fn is_quiet() -> bool {
    *QUIET_MODE.get().unwrap_or(&false)
}

/// Per-conversation extraction bar. The pipeline sets its length once the
/// export is loaded.
pub fn extraction_bar(no_progress: bool) -> Option<ProgressBar> {
    if no_progress || is_quiet() {
        return None;
    }
    let pb = ProgressBar::new(0);
    pb.set_style(extraction_style());
    pb.enable_steady_tick(Duration::from_millis(120));
    if pb.is_hidden() {
        None
    } else {
        Some(pb)
    }
}

fn extraction_style() -> ProgressStyle {
    ProgressStyle::with_template(BAR_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏ ")
}
