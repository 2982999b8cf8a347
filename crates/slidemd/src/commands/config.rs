use anyhow::Result;
use colored::Colorize;

use crate::cli::ConfigCommands;
use crate::config::Config;

pub fn run(command: ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Show => show(),
        ConfigCommands::Set { key, value } => set(&key, &value),
    }
}

fn show() -> Result<()> {
    let path = Config::path()?;
    let config = if path.exists() {
        Config::load_from(&path)?
    } else {
        println!(
            "{}",
            format!("No config file at {}; showing defaults.", path.display()).yellow()
        );
        Config::default()
    };

    println!("{} {}", "Config file:".bold(), path.display());
    println!();
    let yaml = serde_yaml::to_string(&config)?;
    if yaml.trim() == "{}" {
        println!("  (empty)");
    } else {
        print!("{yaml}");
    }
    println!();
    println!("{}", "Effective values:".bold());
    println!("  defaults.theme      {}", config.default_theme().unwrap_or("default"));
    println!(
        "  defaults.start_mode {}",
        match config.start_mode() {
            crate::session::Mode::View => "view",
            crate::session::Mode::Edit => "edit",
        }
    );
    println!("  remote.origin       {}", config.origin());
    println!("  remote.store_url    {}", config.store_url());
    Ok(())
}

fn set(key: &str, value: &str) -> Result<()> {
    let mut config = Config::load_or_default();
    config.set(key, value)?;
    let path = config.save()?;
    println!(
        "{} {key} = {value} ({})",
        "Saved".green().bold(),
        path.display()
    );
    Ok(())
}
