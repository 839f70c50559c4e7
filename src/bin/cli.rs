use clinic_scheduler::config::DEFAULT_CONFIG_FILE;
use clinic_scheduler::{ClinicConfig, Menu, SqliteClinicStore, seed_from_csv};
use std::io;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ClinicConfig::load_or_default(DEFAULT_CONFIG_FILE)?;

    // Logs go to stderr; stdout belongs to the menu.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_filter)),
        )
        .with_writer(io::stderr)
        .init();

    let store = SqliteClinicStore::new(&config.database_path)?;
    let summary = seed_from_csv(&store, &config.patients_csv, &config.doctors_csv)?;
    tracing::info!(
        patients = summary.patients_loaded,
        doctors = summary.doctors_loaded,
        "startup seeding finished"
    );

    let stdin = io::stdin();
    let stdout = io::stdout();
    Menu::new(stdin.lock(), stdout.lock(), &store, &config).run()?;
    Ok(())
}
