use super::Host;
use super::config::Config;
use crate::Result;
use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use ohno::IntoAppError;
use std::io::Write;

const OUTPUT_ERROR: &str = "unable to write the validation result";

#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file (default is `metrics.toml`)
    #[arg(long, short = 'c', value_name = "PATH")]
    pub config: Option<Utf8PathBuf>,
}

pub fn validate_config<H: Host>(host: &mut H, args: &ValidateArgs) -> Result<()> {
    let config_path = args.config.as_ref();

    match Config::load(Utf8Path::new("."), config_path) {
        Ok(config) => {
            let mut output = host.output();
            writeln!(output, "Configuration file is valid").into_app_err(OUTPUT_ERROR)?;
            if let Some(path) = config_path {
                writeln!(output, "Config file: {path}").into_app_err(OUTPUT_ERROR)?;
            } else {
                writeln!(output, "Using default configuration (no config file found)").into_app_err(OUTPUT_ERROR)?;
            }
            for (data_source, path) in config.databases()? {
                writeln!(output, "  {data_source}: {path}").into_app_err(OUTPUT_ERROR)?;
            }
            Ok(())
        }
        Err(e) => {
            let _ = writeln!(host.error(), "❌ Configuration validation failed: {e}");
            host.exit(1);
            Err(e)
        }
    }
}
