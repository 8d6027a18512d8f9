use crate::cli::{ConfigArgs, ConfigCommands};
use crate::config::default_config_path;
use crate::error::Result;
use tracing::info;

pub fn run(args: ConfigArgs) -> Result<()> {
    match args.command {
        ConfigCommands::Path => {
            let path = default_config_path()?;
            info!("Default configuration path resolved to {:?}", path);
            println!("{}", path.display());
            if path.exists() {
                println!("  (file exists)");
            } else {
                println!("  (not found; built-in coefficient tables will be used)");
            }
        }
    }
    Ok(())
}
