//! Common helpers shared across box commands.

use cachebox::coordinator::CacheCoordinator;
use cachebox::ValidationStatus;
use console::{style, StyledObject};

use crate::error::CliError;

/// Pick the namespace for a command: `--cache` first, then the box's binding.
pub fn resolve_cache_name(
    coordinator: &CacheCoordinator,
    box_name: &str,
    cli_cache: Option<String>,
) -> Result<String, CliError> {
    if let Some(cache) = cli_cache.filter(|c| !c.is_empty()) {
        return Ok(cache);
    }
    coordinator
        .get_cache_name_for_box(box_name)?
        .ok_or_else(|| {
            CliError::Config(format!(
                "Box '{}' is not bound to a cache yet. Pass --cache.",
                display_box(coordinator, box_name)
            ))
        })
}

/// The box name as the user should see it, with the default filled in.
pub fn display_box<'a>(coordinator: &'a CacheCoordinator, box_name: &'a str) -> &'a str {
    if box_name.is_empty() {
        coordinator.default_box()
    } else {
        box_name
    }
}

/// Colored validation status.
pub fn styled_status(status: ValidationStatus) -> StyledObject<String> {
    let text = status.to_string();
    match status {
        ValidationStatus::Valid => style(text).green(),
        ValidationStatus::Invalid => style(text).red().bold(),
        ValidationStatus::NotCached => style(text).dim(),
    }
}

/// Human-readable byte count.
pub fn format_size(bytes: usize) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", size, UNITS[unit])
    }
}
