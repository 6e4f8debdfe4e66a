use anyhow::Result;

use backoff_guard::{cli, config::Config, run};

fn main() -> Result<()> {
    let matches = cli::build_cli().get_matches();
    let config = Config::from_args(&matches)?;

    run(config)
}
