use std::path::PathBuf;

use clap::Parser;
use tm_core::config::ScanConfig;

/// tempomatch : trouve les paires de pistes audio au tempo compatible.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Dossier contenant les pistes (remplace scan.input_dir).
    #[arg(short, long)]
    pub dir: Option<PathBuf>,

    /// Extensions retenues, séparées par des virgules (ex: mp3,flac).
    #[arg(long = "ext", value_delimiter = ',')]
    pub extensions: Vec<String>,

    /// Tolérance de tempo en BPM (remplace match.tempo_tolerance).
    #[arg(short, long)]
    pub tolerance: Option<f64>,

    /// Fichier CSV de sortie (remplace report.csv_path).
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Fichier de configuration TOML. Défaut : config/default.toml.
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: PathBuf,

    /// Descendre dans les sous-dossiers.
    #[arg(long, default_value_t = false)]
    pub recursive: bool,

    /// Analyser les pistes une par une au lieu du pool rayon.
    #[arg(long, default_value_t = false)]
    pub sequential: bool,

    /// Ne comparer que les pistes de tempos voisins.
    #[arg(long, default_value_t = false)]
    pub bucketed: bool,

    /// Budget d'analyse par piste en secondes (0 = illimité).
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Écrire les profils de tempo en JSON dans ce fichier.
    #[arg(long)]
    pub dump_profiles: Option<PathBuf>,

    /// Niveau de log : error, warn, info, debug, trace.
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

impl Cli {
    /// Apply command-line overrides on top of a loaded configuration, then
    /// re-clamp it.
    pub fn apply_overrides(&self, config: &mut ScanConfig) {
        if let Some(ref dir) = self.dir {
            config.input_dir.clone_from(dir);
        }
        if !self.extensions.is_empty() {
            config.extensions.clone_from(&self.extensions);
        }
        if let Some(tolerance) = self.tolerance {
            config.thresholds.tempo_tolerance = tolerance;
        }
        if let Some(ref out) = self.out {
            config.csv_path.clone_from(out);
        }
        if self.recursive {
            config.recursive = true;
        }
        if self.sequential {
            config.parallel = false;
        }
        if self.bucketed {
            config.bucketed = true;
        }
        if let Some(secs) = self.timeout {
            config.track_timeout_secs = secs;
        }
        config.clamp_all();
    }
}
