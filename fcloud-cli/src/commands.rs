//! CLI command implementations

use chrono::{DateTime, Utc};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;
use tabled::{Table, Tabled};

use fcloud_core::engine::{AddOptions, GetOptions, SyncReport};
use fcloud_core::{FcloudResult, RemoteEntry, RemotePath, SyncEngine};

use crate::config_file;

async fn build_engine(config_override: Option<&Path>) -> FcloudResult<SyncEngine> {
    let path = match config_override {
        Some(p) => p.to_path_buf(),
        None => config_file::config_path()?,
    };
    let file = config_file::load(&path)?;
    let (config, auth) = config_file::resolve(file)?;
    let backend = fcloud_providers::connect(auth, config.chunk_size).await?;
    Ok(SyncEngine::new(backend, &config))
}

fn spinner(message: &'static str) -> ProgressBar {
    let bar = ProgressBar::new_spinner()
        .with_style(ProgressStyle::with_template("{spinner} {msg}").unwrap())
        .with_message(message);
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}

fn print_report(report: &SyncReport, verb: &str) {
    match (report.processed, report.skipped) {
        (n, 0) => println!("{n} file(s) {verb}"),
        (n, s) => println!("{n} file(s) {verb}, {s} skipped"),
    }
    for failure in &report.failures {
        eprintln!(
            "{} {}: {}",
            style("warning:").yellow().bold(),
            failure.path.display(),
            failure.error
        );
    }
}

pub async fn add(
    config: Option<&Path>,
    path: &Path,
    near: bool,
    filename: Option<String>,
    remote_path: Option<RemotePath>,
) -> FcloudResult<()> {
    let engine = build_engine(config).await?;
    let options = AddOptions { near, filename, remote_folder: remote_path };

    let bar = spinner("Uploading");
    let result = engine.add(path, &options).await;
    bar.finish_and_clear();

    print_report(&result?, "uploaded");
    Ok(())
}

pub async fn get(
    config: Option<&Path>,
    cfl: &Path,
    near: bool,
    remove_after: bool,
) -> FcloudResult<()> {
    let engine = build_engine(config).await?;
    let options = GetOptions { near, remove_after };

    let bar = spinner("Downloading");
    let result = engine.get(cfl, &options).await;
    bar.finish_and_clear();

    print_report(&result?, "downloaded");
    Ok(())
}

pub async fn info(config: Option<&Path>, cfl: &Path) -> FcloudResult<()> {
    let engine = build_engine(config).await?;

    let bar = spinner("Collecting information");
    let result = engine.info(cfl).await;
    bar.finish_and_clear();
    let stat = result?;

    println!("  Path: {}", stat.path);
    println!("  Size: {} ({})", stat.size, bytesize::ByteSize(stat.size));
    println!("  Modified: {}", format_time(stat.modified));
    if let Some(hash) = &stat.content_hash {
        println!("  Content hash: {hash}");
    }
    for (key, value) in &stat.extra {
        println!("  {key}: {value}");
    }
    Ok(())
}

pub async fn remove(config: Option<&Path>, cfl: &Path, only_in_cloud: bool) -> FcloudResult<()> {
    let engine = build_engine(config).await?;

    let bar = spinner("Removing");
    let result = engine.remove(cfl, only_in_cloud).await;
    bar.finish_and_clear();

    print_report(&result?, "removed");
    Ok(())
}

#[derive(Tabled)]
struct EntryRow {
    #[tabled(rename = "Filename")]
    name: String,
    #[tabled(rename = "Size")]
    size: String,
    #[tabled(rename = "Is_directory")]
    is_directory: bool,
    #[tabled(rename = "Modified")]
    modified: String,
}

#[derive(Tabled)]
struct FileRow {
    #[tabled(rename = "Filename")]
    name: String,
    #[tabled(rename = "Size")]
    size: String,
    #[tabled(rename = "Modified")]
    modified: String,
}

fn format_time(dt: Option<DateTime<Utc>>) -> String {
    dt.map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn format_size(entry: &RemoteEntry) -> String {
    entry
        .size
        .map(|s| bytesize::ByteSize(s).to_string())
        .unwrap_or_else(|| "-".to_string())
}

pub async fn files(
    config: Option<&Path>,
    remote_path: Option<RemotePath>,
    only_files: bool,
) -> FcloudResult<()> {
    let engine = build_engine(config).await?;
    let folder = remote_path.unwrap_or_else(|| engine.main_folder().clone());

    let bar = spinner("Collecting files");
    let result = engine.files(Some(&folder), only_files).await;
    bar.finish_and_clear();
    let entries = result?;

    println!("Files in {folder}");
    if entries.is_empty() {
        println!("(empty folder)");
        return Ok(());
    }

    let table = if only_files {
        let rows: Vec<FileRow> = entries
            .iter()
            .map(|e| FileRow {
                name: e.name.clone(),
                size: format_size(e),
                modified: format_time(e.modified),
            })
            .collect();
        Table::new(rows).to_string()
    } else {
        let rows: Vec<EntryRow> = entries
            .iter()
            .map(|e| EntryRow {
                name: e.name.clone(),
                size: format_size(e),
                is_directory: e.is_directory,
                modified: format_time(e.modified),
            })
            .collect();
        Table::new(rows).to_string()
    };
    println!("{table}");
    Ok(())
}

pub fn config_get(config: Option<&Path>, section: &str, key: &str) -> FcloudResult<()> {
    let path = match config {
        Some(p) => p.to_path_buf(),
        None => config_file::config_path()?,
    };
    println!("{}", config_file::get_value(&path, section, key)?);
    Ok(())
}

pub fn config_set(
    config: Option<&Path>,
    section: &str,
    key: &str,
    value: &str,
) -> FcloudResult<()> {
    let path = match config {
        Some(p) => p.to_path_buf(),
        None => config_file::config_path()?,
    };
    config_file::set_value(&path, section, key, value)?;
    println!("{section}.{key} updated");
    Ok(())
}
