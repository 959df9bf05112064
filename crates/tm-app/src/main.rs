use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tm_audio::SpectralProvider;
use tm_core::config::ScanConfig;
use tm_match::scanner::{CorpusScanner, ScanOptions};

pub mod cli;
pub mod discover;
pub mod report;

fn main() -> Result<()> {
    // 1. Parser CLI
    let cli = cli::Cli::parse();

    // 2. Initialiser le logging
    env_logger::Builder::new()
        .filter_level(cli.log_level.parse().unwrap_or(log::LevelFilter::Warn))
        .init();

    // 3. Charger la config, puis appliquer les overrides CLI
    let mut config = resolve_config(&cli)?;
    cli.apply_overrides(&mut config);

    // 4. Découvrir les pistes
    let tracks = discover::discover_tracks(&config.input_dir, &config.extensions, config.recursive)?;
    log::info!(
        "{} piste(s) trouvée(s) dans {}",
        tracks.len(),
        config.input_dir.display()
    );

    // 5. Analyse + comparaison
    let provider = Arc::new(SpectralProvider::new(config.analysis.clone()));
    let scanner = CorpusScanner::new(provider, config.thresholds, ScanOptions::from_config(&config));
    let scan = scanner.scan(&tracks);

    // 6. Rapport
    report::write_console(&mut std::io::stdout().lock(), &scan.matches)?;
    report::write_csv(&config.csv_path, &scan.matches)?;
    log::info!("CSV écrit : {}", config.csv_path.display());

    if let Some(ref path) = cli.dump_profiles {
        report::dump_profiles(path, &scan.profiles)?;
        log::info!("Profils écrits : {}", path.display());
    }

    if !scan.skipped.is_empty() {
        log::warn!("{} piste(s) n'ont pas pu être analysées", scan.skipped.len());
    }
    Ok(())
}

/// Load `--config` when it exists, defaults otherwise.
fn resolve_config(cli: &cli::Cli) -> Result<ScanConfig> {
    if cli.config.exists() {
        tm_core::config::load_config(&cli.config)
    } else {
        log::warn!(
            "Config introuvable : {}. Utilisation des défauts.",
            cli.config.display()
        );
        Ok(ScanConfig::default())
    }
}
