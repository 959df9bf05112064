use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Default BPM tolerance for the tempo criterion (inclusive).
pub const DEFAULT_TEMPO_TOLERANCE: f64 = 5.0;
/// Default bound on the tempo-dispersion difference (exclusive).
pub const DEFAULT_MAX_STD_DIFF: f64 = 2.0;
/// Default bound on the beat-consistency difference, in seconds (exclusive).
pub const DEFAULT_MAX_BEAT_DIFF: f64 = 0.1;

/// Audio extensions scanned when none are configured.
pub const DEFAULT_EXTENSIONS: &[&str] = &["mp3", "wav", "flac", "ogg", "aac", "m4a"];

/// Thresholds of the conjunctive match rule.
///
/// # Example
/// ```
/// use tm_core::config::MatchThresholds;
/// let t = MatchThresholds::with_tolerance(8.0);
/// assert!((t.tempo_tolerance - 8.0).abs() < f64::EPSILON);
/// assert!((t.max_std_diff - 2.0).abs() < f64::EPSILON);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
pub struct MatchThresholds {
    /// `tempo_diff <= tempo_tolerance` (BPM).
    pub tempo_tolerance: f64,
    /// `std_diff < max_std_diff`.
    pub max_std_diff: f64,
    /// `beat_diff < max_beat_diff` (seconds).
    pub max_beat_diff: f64,
}

impl MatchThresholds {
    /// Default inner thresholds with a caller-chosen tempo tolerance.
    #[must_use]
    pub fn with_tolerance(tempo_tolerance: f64) -> Self {
        Self {
            tempo_tolerance,
            ..Self::default()
        }
    }
}

impl Default for MatchThresholds {
    fn default() -> Self {
        Self {
            tempo_tolerance: DEFAULT_TEMPO_TOLERANCE,
            max_std_diff: DEFAULT_MAX_STD_DIFF,
            max_beat_diff: DEFAULT_MAX_BEAT_DIFF,
        }
    }
}

/// Parameters of the spectral feature provider.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct AnalysisParams {
    /// STFT window length in samples.
    pub frame_size: usize,
    /// STFT hop in samples. One onset-envelope value per hop.
    pub hop_size: usize,
    /// Lowest tempo the estimator may return.
    pub min_bpm: f64,
    /// Highest tempo the estimator may return.
    pub max_bpm: f64,
    /// Centre of the log-normal tempo prior.
    pub start_bpm: f64,
    /// Number of log-spaced bands for the multi-channel envelope.
    pub onset_bands: usize,
    /// Beat tracker tempo adherence. Higher = stricter spacing.
    pub beat_tightness: f64,
}

impl Default for AnalysisParams {
    fn default() -> Self {
        Self {
            frame_size: 2048,
            hop_size: 512,
            min_bpm: 30.0,
            max_bpm: 300.0,
            start_bpm: 120.0,
            onset_bands: 6,
            beat_tightness: 100.0,
        }
    }
}

/// Configuration complète d'un scan de corpus.
///
/// Sérialisable en TOML. Chaque champ a une valeur par défaut saine.
///
/// # Example
/// ```
/// use tm_core::config::ScanConfig;
/// let config = ScanConfig::default();
/// assert!((config.thresholds.tempo_tolerance - 5.0).abs() < f64::EPSILON);
/// assert!(config.parallel);
/// ```
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ScanConfig {
    // === Scan ===
    /// Dossier contenant les pistes audio.
    pub input_dir: PathBuf,
    /// Extensions retenues (minuscules, sans point).
    pub extensions: Vec<String>,
    /// Descendre dans les sous-dossiers.
    pub recursive: bool,
    /// Analyse des pistes en parallèle (rayon).
    pub parallel: bool,
    /// Budget par piste en secondes. 0 = illimité.
    pub track_timeout_secs: u64,
    /// Compare only tracks in the same or adjacent tempo bucket.
    pub bucketed: bool,

    // === Match ===
    /// Thresholds of the match rule.
    pub thresholds: MatchThresholds,

    // === Analyse ===
    /// Feature provider parameters.
    pub analysis: AnalysisParams,

    // === Rapport ===
    /// CSV output path.
    pub csv_path: PathBuf,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("."),
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| (*e).to_string()).collect(),
            recursive: false,
            parallel: true,
            track_timeout_secs: 120,
            bucketed: false,
            thresholds: MatchThresholds::default(),
            analysis: AnalysisParams::default(),
            csv_path: PathBuf::from("match_tempo.csv"),
        }
    }
}

impl ScanConfig {
    /// Clamp all numeric fields to their valid ranges.
    /// Called after TOML deserialization to prevent out-of-range values.
    pub fn clamp_all(&mut self) {
        let t = &mut self.thresholds;
        t.tempo_tolerance = t.tempo_tolerance.max(0.0);
        t.max_std_diff = t.max_std_diff.max(0.0);
        t.max_beat_diff = t.max_beat_diff.max(0.0);

        let a = &mut self.analysis;
        a.frame_size = a.frame_size.clamp(256, 16384);
        a.hop_size = a.hop_size.clamp(32, a.frame_size);
        a.min_bpm = a.min_bpm.clamp(10.0, 600.0);
        a.max_bpm = a.max_bpm.clamp(10.0, 600.0);
        if a.min_bpm.is_nan() || a.max_bpm.is_nan() || a.min_bpm >= a.max_bpm {
            log::warn!(
                "Plage BPM invalide [{}, {}], retour aux défauts.",
                a.min_bpm,
                a.max_bpm
            );
            let d = AnalysisParams::default();
            a.min_bpm = d.min_bpm;
            a.max_bpm = d.max_bpm;
        }
        if a.start_bpm.is_nan() {
            a.start_bpm = AnalysisParams::default().start_bpm;
        }
        a.start_bpm = a.start_bpm.clamp(a.min_bpm, a.max_bpm);
        a.onset_bands = a.onset_bands.clamp(1, 32);
        if a.beat_tightness.is_nan() {
            a.beat_tightness = AnalysisParams::default().beat_tightness;
        }
        a.beat_tightness = a.beat_tightness.clamp(1.0, 1000.0);

        for ext in &mut self.extensions {
            *ext = ext.trim_start_matches('.').to_lowercase();
        }
        self.extensions.retain(|e| !e.is_empty());
        if self.extensions.is_empty() {
            self.extensions = DEFAULT_EXTENSIONS.iter().map(|e| (*e).to_string()).collect();
        }
    }
}

/// Structure TOML intermédiaire pour désérialisation avec valeurs optionnelles.
#[derive(Deserialize)]
struct ConfigFile {
    scan: Option<ScanSection>,
    #[serde(rename = "match")]
    matching: Option<MatchSection>,
    analysis: Option<AnalysisSection>,
    report: Option<ReportSection>,
}

/// Scan section of the TOML config, all fields optional for partial override.
#[derive(Deserialize)]
struct ScanSection {
    input_dir: Option<PathBuf>,
    extensions: Option<Vec<String>>,
    recursive: Option<bool>,
    parallel: Option<bool>,
    track_timeout_secs: Option<u64>,
    bucketed: Option<bool>,
}

#[derive(Deserialize)]
struct MatchSection {
    tempo_tolerance: Option<f64>,
    max_std_diff: Option<f64>,
    max_beat_diff: Option<f64>,
}

#[derive(Deserialize)]
struct AnalysisSection {
    frame_size: Option<usize>,
    hop_size: Option<usize>,
    min_bpm: Option<f64>,
    max_bpm: Option<f64>,
    start_bpm: Option<f64>,
    onset_bands: Option<usize>,
    beat_tightness: Option<f64>,
}

#[derive(Deserialize)]
struct ReportSection {
    csv_path: Option<PathBuf>,
}

/// Parse TOML text and merge it over the defaults.
///
/// # Errors
/// Returns an error if the text is not valid TOML for this schema.
///
/// # Example
/// ```
/// use tm_core::config::parse_config;
/// let config = parse_config("[match]\ntempo_tolerance = 3.0\n").unwrap();
/// assert!((config.thresholds.tempo_tolerance - 3.0).abs() < f64::EPSILON);
/// ```
pub fn parse_config(content: &str) -> Result<ScanConfig> {
    let file: ConfigFile = toml::from_str(content).context("Erreur de parsing TOML")?;

    let mut config = ScanConfig::default();

    if let Some(s) = file.scan {
        if let Some(v) = s.input_dir {
            config.input_dir = v;
        }
        if let Some(v) = s.extensions {
            config.extensions = v;
        }
        if let Some(v) = s.recursive {
            config.recursive = v;
        }
        if let Some(v) = s.parallel {
            config.parallel = v;
        }
        if let Some(v) = s.track_timeout_secs {
            config.track_timeout_secs = v;
        }
        if let Some(v) = s.bucketed {
            config.bucketed = v;
        }
    }

    if let Some(m) = file.matching {
        if let Some(v) = m.tempo_tolerance {
            config.thresholds.tempo_tolerance = v;
        }
        if let Some(v) = m.max_std_diff {
            config.thresholds.max_std_diff = v;
        }
        if let Some(v) = m.max_beat_diff {
            config.thresholds.max_beat_diff = v;
        }
    }

    if let Some(a) = file.analysis {
        if let Some(v) = a.frame_size {
            config.analysis.frame_size = v;
        }
        if let Some(v) = a.hop_size {
            config.analysis.hop_size = v;
        }
        if let Some(v) = a.min_bpm {
            config.analysis.min_bpm = v;
        }
        if let Some(v) = a.max_bpm {
            config.analysis.max_bpm = v;
        }
        if let Some(v) = a.start_bpm {
            config.analysis.start_bpm = v;
        }
        if let Some(v) = a.onset_bands {
            config.analysis.onset_bands = v;
        }
        if let Some(v) = a.beat_tightness {
            config.analysis.beat_tightness = v;
        }
    }

    if let Some(r) = file.report {
        if let Some(v) = r.csv_path {
            config.csv_path = v;
        }
    }

    config.clamp_all();
    Ok(config)
}

/// Charge un fichier TOML et fusionne avec les valeurs par défaut.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed.
///
/// # Example
/// ```no_run
/// use tm_core::config::load_config;
/// use std::path::Path;
/// let config = load_config(Path::new("config/default.toml")).unwrap();
/// ```
pub fn load_config(path: &Path) -> Result<ScanConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible de lire {}", path.display()))?;
    parse_config(&content).with_context(|| format!("Configuration invalide dans {}", path.display()))
}
