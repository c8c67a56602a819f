use crate::config::generate::generate_starter_config;
use std::fs;
use std::path::PathBuf;

pub fn init(stdout: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config_content = generate_starter_config();

    if stdout {
        print!("{}", config_content);
        return Ok(());
    }

    // Try ~/.config/eventseq/config.yml first, fall back to /etc
    let config_path = dirs::home_dir()
        .map(|home| home.join(".config/eventseq/config.yml"))
        .unwrap_or_else(|| PathBuf::from("/etc/eventseq/config.yml"));

    if config_path.exists() {
        return Err(format!(
            "config file already exists at {}\nRemove it first or use --stdout to print the config",
            config_path.display()
        )
        .into());
    }

    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&config_path, config_content)?;

    println!("Config file written to {}", config_path.display());
    Ok(())
}
