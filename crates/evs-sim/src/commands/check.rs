use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use evs_pipeline::load_config;
use tracing::info;

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// YAML run configuration to validate.
    #[arg(long)]
    pub config: PathBuf,
    /// Print the normalized configuration after the hash.
    #[arg(long)]
    pub print: bool,
}

pub fn run(args: &CheckArgs) -> Result<(), Box<dyn Error>> {
    let config = load_config(&args.config)?;
    let hash = config.config_hash()?;
    info!(chain = %config.chain, path = %args.config.display(), "configuration valid");
    println!("{hash}");
    if args.print {
        print!("{}", config.to_yaml_string()?);
    }
    Ok(())
}
