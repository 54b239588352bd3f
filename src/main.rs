use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use winpos::lifecycle::{wipe_window, StoredEnvironment};
use winpos::{logging, Store};

/// winpos - inspect and maintain stored window placement
#[derive(Parser)]
#[command(name = "winpos")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every section and key of a placement file
    Show {
        /// Path to position.ini
        file: PathBuf,
    },
    /// Delete one window's stored placement and child properties
    Reset {
        file: PathBuf,
        /// Window reference name, e.g. MainWindow
        window: String,
    },
    /// Print the display metadata recorded by the last run
    Env { file: PathBuf },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init();

    match cli.command {
        Commands::Show { file } => show(&file),
        Commands::Reset { file, window } => reset(&file, &window),
        Commands::Env { file } => env(&file),
    }
}

fn load(file: &Path) -> anyhow::Result<Store> {
    Store::load(file).with_context(|| format!("reading {}", file.display()))
}

fn show(file: &Path) -> anyhow::Result<()> {
    let store = load(file)?;
    for section in store.sections() {
        println!("[{section}]");
        for (key, value) in store.entries(section) {
            println!("  {key} = {value}");
        }
    }
    Ok(())
}

fn reset(file: &Path, window: &str) -> anyhow::Result<()> {
    if !file.exists() {
        bail!("{} does not exist", file.display());
    }
    let mut store = load(file)?;
    let removed = wipe_window(&mut store, window);
    if removed == 0 {
        tracing::warn!(window, "no stored placement for window");
        return Ok(());
    }
    store
        .save(file)
        .with_context(|| format!("writing {}", file.display()))?;
    tracing::info!(window, removed, "window placement reset");
    Ok(())
}

fn env(file: &Path) -> anyhow::Result<()> {
    let stored = StoredEnvironment::read(&load(file)?);
    println!("dpi: {}", stored.dpi.as_deref().unwrap_or("(not recorded)"));
    println!(
        "screens: {}",
        stored.screen_count.as_deref().unwrap_or("(not recorded)")
    );
    for (index, area) in &stored.screens {
        println!("  {index}: {area}");
    }
    Ok(())
}
