//! Configuration CLI commands.

use clap::Subcommand;
use referada::config::{config_file_path, ConfigFile};

use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Show the configuration file path
    Path,

    /// Show the effective configuration
    Show,

    /// Write a configuration file with the current settings
    Init,
}

/// Run a config subcommand.
pub fn run(command: ConfigCommands) -> Result<(), CliError> {
    match command {
        ConfigCommands::Path => {
            println!("{}", config_file_path().display());
            Ok(())
        }
        ConfigCommands::Show => {
            let config = ConfigFile::load()?;
            print!("{}", render(&config));
            Ok(())
        }
        ConfigCommands::Init => {
            let config = ConfigFile::load()?;
            config.save()?;
            println!("Configuration written to {}", config_file_path().display());
            Ok(())
        }
    }
}

fn render(config: &ConfigFile) -> String {
    let output_dir = config
        .download
        .output_dir
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "(current directory)".to_string());

    format!(
        "portal.base_url        = {}\n\
         portal.materials_path  = {}\n\
         download.output_dir    = {}\n\
         state.snapshot_file    = {}\n\
         logging.directory      = {}\n",
        config.portal.base_url,
        config.portal.materials_path,
        output_dir,
        config.state.snapshot_file.display(),
        config.logging.directory.display(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_render_unset_output_dir() {
        let rendered = render(&ConfigFile::default());
        assert!(rendered.contains("download.output_dir    = (current directory)"));
        assert!(rendered.contains("portal.base_url"));
    }

    #[test]
    fn test_render_output_dir() {
        let mut config = ConfigFile::default();
        config.download.output_dir = Some(PathBuf::from("/home/ana/faks"));
        assert!(render(&config).contains("/home/ana/faks"));
    }
}
