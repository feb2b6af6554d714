//! `deepdesk onboard` — write a default config file.

use deepdesk_config::AppConfig;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config_dir = AppConfig::config_dir();
    let config_path = config_dir.join("config.toml");

    if config_path.exists() {
        println!("Config already exists at {}", config_path.display());
        return Ok(());
    }

    std::fs::create_dir_all(&config_dir)?;
    std::fs::write(&config_path, AppConfig::default_toml())?;

    println!("Wrote default config to {}", config_path.display());
    println!();
    println!("Set your API key via the DEEPSEEK_API_KEY environment variable,");
    println!("or add `api_key = \"...\"` to the config file.");
    Ok(())
}
