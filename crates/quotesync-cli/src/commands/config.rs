use std::path::Path;

use quotesync_core::SyncSettings;

use crate::cli::ConfigCommands;
use crate::commands::common::load_settings;
use crate::error::CliError;

pub fn run_config(command: ConfigCommands, config_path: &Path) -> Result<(), CliError> {
    match command {
        ConfigCommands::Show => {
            let settings = load_settings(config_path)?;
            println!("# {}", config_path.display());
            println!("{}", serde_json::to_string_pretty(&settings)?);
            Ok(())
        }
        ConfigCommands::Set {
            remote_url,
            fetch_limit,
            interval_secs,
            timeout_secs,
            category_prefix,
        } => {
            let updates = SettingsUpdate {
                remote_url,
                fetch_limit,
                interval_secs,
                timeout_secs,
                category_prefix,
            };
            run_config_set(updates, config_path)
        }
    }
}

#[derive(Debug, Default)]
pub struct SettingsUpdate {
    pub remote_url: Option<String>,
    pub fetch_limit: Option<usize>,
    pub interval_secs: Option<u64>,
    pub timeout_secs: Option<u64>,
    pub category_prefix: Option<String>,
}

impl SettingsUpdate {
    pub fn apply(self, settings: &mut SyncSettings) {
        if let Some(url) = self.remote_url {
            settings.remote_base_url = url;
        }
        if let Some(limit) = self.fetch_limit {
            settings.fetch_limit = limit;
        }
        if let Some(interval) = self.interval_secs {
            settings.interval_secs = interval;
        }
        if let Some(timeout) = self.timeout_secs {
            settings.timeout_secs = timeout;
        }
        if let Some(prefix) = self.category_prefix {
            settings.category_prefix = prefix;
        }
    }
}

pub fn run_config_set(updates: SettingsUpdate, config_path: &Path) -> Result<(), CliError> {
    // Start from the file alone so env overrides are not persisted
    let mut settings = SyncSettings::load_from_path(config_path)?;
    updates.apply(&mut settings);
    settings.save_to_path(config_path)?;

    println!("Saved settings to {}", config_path.display());
    Ok(())
}
