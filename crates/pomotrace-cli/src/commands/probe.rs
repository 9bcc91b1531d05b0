use clap::Subcommand;

use super::block_on;
use crate::probe::probe_from_env;

#[derive(Subcommand)]
pub enum ProbeAction {
    /// Query the foreground probe once and print what it sees
    Check,
}

pub fn run(action: ProbeAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ProbeAction::Check => {
            let probe = probe_from_env();
            match block_on(async move { probe.foreground_app().await })? {
                Ok(app) => println!("{}", serde_json::to_string_pretty(&app)?),
                Err(e) => {
                    eprintln!("probe failed: {e}");
                    std::process::exit(1);
                }
            }
        }
    }
    Ok(())
}
