//! Box commands: add, get, list, show, remove, purge, validate, heal, tidy.

use std::io::{self, Write};

use cachebox::coordinator::CacheCoordinator;
use console::style;

use super::common::{display_box, format_size, resolve_cache_name, styled_status};
use crate::error::CliError;

/// Add URLs to a box and cache them.
pub async fn run_add(
    coordinator: &CacheCoordinator,
    box_name: &str,
    cache_name: &str,
    urls: &[String],
) -> Result<(), CliError> {
    let lookups = coordinator.add_to_box(box_name, cache_name, urls).await?;
    let cached = lookups.iter().filter(|l| l.is_cached()).count();

    for lookup in &lookups {
        let marker = if lookup.is_cached() {
            style("cached").green()
        } else {
            style("missing").yellow()
        };
        println!("  {:<8} {}", marker, lookup.url);
    }
    println!(
        "Added {} URL(s) to '{}' ({} cached)",
        lookups.len(),
        display_box(coordinator, box_name),
        cached
    );
    if cached < lookups.len() {
        println!("Run 'cachebox heal' to retry the missing entries.");
    }
    Ok(())
}

/// Print a cached response, or its body with `--body`.
pub async fn run_get(
    coordinator: &CacheCoordinator,
    box_name: &str,
    url: &str,
    body: bool,
) -> Result<(), CliError> {
    let Some(entry) = coordinator.get_from_cache(box_name, url).await? else {
        return Err(CliError::Config(format!(
            "'{}' is not cached in box '{}'",
            coordinator.canonicalize(url),
            display_box(coordinator, box_name)
        )));
    };

    if body {
        let mut stdout = io::stdout().lock();
        stdout.write_all(&entry.body)?;
        stdout.flush()?;
        return Ok(());
    }

    println!("{} {}", style(entry.status).bold(), entry.url);
    for (name, value) in &entry.headers {
        println!("  {}: {}", style(name).dim(), value);
    }
    println!("  body: {}", format_size(entry.size_bytes()));
    Ok(())
}

/// List registered boxes with their namespaces.
pub fn run_list(coordinator: &CacheCoordinator) -> Result<(), CliError> {
    if !coordinator.is_supported() {
        println!("Caching is disabled (store.backend = none)");
        return Ok(());
    }

    let names = coordinator.list_boxes()?;
    if names.is_empty() {
        println!("No boxes");
        return Ok(());
    }

    for name in names {
        let cache = coordinator
            .get_cache_name_for_box(&name)?
            .unwrap_or_else(|| "(unbound)".to_string());
        println!("{:<24} {}", style(&name).bold(), cache);
    }
    Ok(())
}

/// Show every URL of a box with its cache state.
pub async fn run_show(coordinator: &CacheCoordinator, box_name: &str) -> Result<(), CliError> {
    let name = display_box(coordinator, box_name);
    let Some(cache) = coordinator.get_cache_name_for_box(box_name)? else {
        println!("Box '{}' is empty", name);
        return Ok(());
    };

    println!("{} -> {}", style(name).bold(), cache);
    for lookup in coordinator.get_all_in_box(box_name).await? {
        let size = lookup
            .entry
            .as_ref()
            .map(|e| format_size(e.size_bytes()))
            .unwrap_or_else(|| "-".to_string());
        println!("  {:>10}  {}", size, lookup.url);
    }
    Ok(())
}

/// Remove one URL from a box.
pub async fn run_remove(
    coordinator: &CacheCoordinator,
    box_name: &str,
    cache: Option<String>,
    url: &str,
) -> Result<(), CliError> {
    let cache_name = resolve_cache_name(coordinator, box_name, cache)?;
    let deleted = coordinator
        .remove_from_box(box_name, &cache_name, url)
        .await?;

    let url = coordinator.canonicalize(url);
    if deleted {
        println!("Removed {} (entry deleted)", url);
    } else {
        println!("Removed {} (entry kept)", url);
    }
    Ok(())
}

/// Remove a box and every entry only it claimed.
pub async fn run_purge(coordinator: &CacheCoordinator, box_name: &str) -> Result<(), CliError> {
    let outcomes = coordinator.remove_by_box(box_name).await?;
    let deleted = outcomes.iter().filter(|o| o.removed).count();
    println!(
        "Purged '{}': {} URL(s), {} entr{} deleted",
        display_box(coordinator, box_name),
        outcomes.len(),
        deleted,
        if deleted == 1 { "y" } else { "ies" }
    );
    Ok(())
}

/// Validate one URL, or the whole box when no URL is given.
pub async fn run_validate(
    coordinator: &CacheCoordinator,
    box_name: &str,
    cache: Option<String>,
    url: Option<String>,
) -> Result<(), CliError> {
    match url {
        Some(url) => {
            let cache_name = match cache {
                Some(cache) => cache,
                // An unbound box validates to NOT_CACHED whatever the namespace.
                None => coordinator
                    .get_cache_name_for_box(box_name)?
                    .unwrap_or_default(),
            };
            let status = coordinator.validate(box_name, &cache_name, &url).await?;
            println!("{:<10} {}", styled_status(status), coordinator.canonicalize(&url));
        }
        None => {
            for s in coordinator.validate_by_box(box_name).await? {
                println!("{:<10} {}", styled_status(s.status), s.url);
            }
        }
    }
    Ok(())
}

/// Heal one box, or every box with `--all`.
pub async fn run_heal(
    coordinator: &CacheCoordinator,
    box_name: &str,
    all: bool,
) -> Result<(), CliError> {
    if !all {
        let report = coordinator.heal_by_box(box_name).await?;
        println!("{}", report);
        return Ok(());
    }

    let outcomes = coordinator.heal_all().await?;
    if outcomes.is_empty() {
        println!("No boxes");
    }
    for (name, result) in outcomes {
        match result {
            Ok(report) => println!("{}", report),
            Err(e) => println!("{}: {} {}", name, style("failed:").red(), e),
        }
    }
    Ok(())
}

/// Tidy one namespace, or every namespace in the store.
pub async fn run_tidy(
    coordinator: &CacheCoordinator,
    cache: Option<String>,
) -> Result<(), CliError> {
    let reports = match cache {
        Some(cache) => {
            let report = coordinator.tidy(&cache).await?;
            vec![(cache, report)]
        }
        None => coordinator.tidy_all().await?,
    };

    if reports.is_empty() {
        println!("Nothing to tidy");
    }
    for (cache_name, report) in reports {
        println!("{}: {}", style(&cache_name).bold(), report);
    }
    Ok(())
}
