use anyhow::Result;
use fluid_db::{cli::Cli, commands};
use log::debug;

fn main() -> Result<()> {
    let default_filter = env_logger::Env::default().default_filter_or("info");
    env_logger::Builder::from_env(default_filter)
        .format_timestamp_secs()
        .init();

    let cli = Cli::parse_args();
    debug!("{:?}", cli);

    let output = commands::run(cli)?;
    println!("{}", output);

    Ok(())
}
