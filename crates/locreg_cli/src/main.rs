//! CLI entry point for the district registry sync core.
//!
//! # Responsibility
//! - `ping`: verify `locreg_core` linkage (default).
//! - `list`: print the backend listing using `LOCREG_*` configuration.
//! - `demo`: run an edit and a creation against the in-memory backend.
//! - Keep output deterministic for quick local sanity checks.

use clap::{Parser, Subcommand};
use log::info;
use locreg_core::{
    init_logging_from_config, ClientConfig, District, DistrictDraft, DistrictRemote,
    DistrictSyncService, HttpDistrictRemote, InMemoryDistrictRemote, SyncOutcome,
};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(about = "District registry sync utility", long_about = None)]
struct Cli {
    /// Absolute directory for rolling log files; logging stays off when unset.
    #[arg(long, env = "LOCREG_LOG_DIR", global = true)]
    log_dir: Option<String>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
enum Command {
    /// Print core ping and version.
    Ping,
    /// List districts from the admin backend.
    List,
    /// Run the sync pipeline against an in-memory backend.
    Demo,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let result = match cli.command.unwrap_or(Command::Ping) {
        Command::Ping => {
            println!("locreg_core ping={}", locreg_core::ping());
            println!("locreg_core version={}", locreg_core::core_version());
            Ok(())
        }
        Command::List => list(cli.log_dir.as_deref()),
        Command::Demo => demo(),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn list(log_dir: Option<&str>) -> Result<(), String> {
    let config = ClientConfig::from_env().map_err(|err| err.to_string())?;
    if let Some(log_dir) = log_dir {
        init_logging_from_config(&config, log_dir)?;
    }
    let remote = HttpDistrictRemote::new(&config).map_err(|err| err.to_string())?;
    let listing = remote.list_districts().map_err(|err| err.to_string())?;
    for district in &listing {
        print_district(district);
    }
    info!(
        "event=cli_list module=cli status=ok districts={}",
        listing.len()
    );
    println!("districts={}", listing.len());
    Ok(())
}

fn demo() -> Result<(), String> {
    let remote = InMemoryDistrictRemote::new();
    let kollam = remote.seed("Kollam", ["Alappad", "Chavara"], ["691001"]);
    let mut service = DistrictSyncService::new(remote);
    service.reload().map_err(|err| err.to_string())?;

    let mut draft = service.begin_edit(&kollam).map_err(|err| err.to_string())?;
    draft.remove_panchayath("Alappad");
    draft.push_panchayath("Thevalakkara").map_err(|err| err.to_string())?;
    service.remote().fail_value("691002");
    draft.push_pincode("691002").map_err(|err| err.to_string())?;
    let outcome = service
        .submit_edit(&kollam, &draft)
        .map_err(|err| err.to_string())?;
    print_outcome("edit", &outcome);

    let mut created = DistrictDraft::new("Wayanad");
    created.push_panchayath("Meppadi").map_err(|err| err.to_string())?;
    created.push_pincode("673121").map_err(|err| err.to_string())?;
    let outcome = service
        .create_district(&created)
        .map_err(|err| err.to_string())?;
    print_outcome("create", &outcome);

    for district in service.registry().list() {
        print_district(district);
    }
    Ok(())
}

fn print_outcome(action: &str, outcome: &SyncOutcome) {
    println!(
        "{action} status={:?} applied={} failed={}",
        outcome.status,
        outcome.applied.len(),
        outcome.failed.len()
    );
    for failure in &outcome.failed {
        println!(
            "  failed {} {}: {}",
            failure.change.label(),
            failure.change.value(),
            failure.reason
        );
    }
}

fn print_district(district: &District) {
    println!(
        "{} {} panchayaths=[{}] pincodes=[{}]",
        district.id.as_deref().unwrap_or("-"),
        district.display_name(),
        district.panchayaths.iter().cloned().collect::<Vec<_>>().join(","),
        district.pincodes.iter().cloned().collect::<Vec<_>>().join(",")
    );
}
