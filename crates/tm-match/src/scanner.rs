use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, bail};
use rayon::prelude::*;
use tm_core::config::{MatchThresholds, ScanConfig};
use tm_core::profile::{MatchResult, TrackProfile};
use tm_core::traits::FeatureProvider;

use crate::builder::build_profile;
use crate::ensemble::TempoEnsemble;
use crate::matcher::compare;

/// Execution knobs of a corpus scan.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScanOptions {
    /// Analyse tracks and compare pairs on the rayon pool.
    pub parallel: bool,
    /// Per-track analysis deadline. `None` waits forever.
    pub timeout: Option<Duration>,
    /// Only compare tracks whose tempos fall in the same or adjacent
    /// tolerance-wide buckets.
    pub bucketed: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            parallel: true,
            timeout: None,
            bucketed: false,
        }
    }
}

impl ScanOptions {
    /// Options carried by a resolved configuration.
    #[must_use]
    pub fn from_config(config: &ScanConfig) -> Self {
        Self {
            parallel: config.parallel,
            timeout: (config.track_timeout_secs > 0)
                .then(|| Duration::from_secs(config.track_timeout_secs)),
            bucketed: config.bucketed,
        }
    }
}

/// Profiles of the successfully analysed tracks, in scan order.
///
/// # Example
/// ```
/// use tm_core::profile::TrackProfile;
/// use tm_match::scanner::ProfileSet;
///
/// let p = TrackProfile {
///     primary_tempo: 120.0,
///     tempo_variations: vec![120.0],
///     tempo_std: 0.0,
///     beat_intervals: vec![],
///     beat_consistency: None,
/// };
/// let mut set = ProfileSet::default();
/// assert!(set.insert("a.wav".into(), p.clone()));
/// assert!(!set.insert("a.wav".into(), p));
/// assert_eq!(set.len(), 1);
/// assert!(set.get("a.wav").is_some());
/// ```
#[derive(Clone, Debug, Default)]
pub struct ProfileSet {
    entries: Vec<(String, TrackProfile)>,
    index: HashMap<String, usize>,
}

impl ProfileSet {
    /// Append a profile. Returns `false`, leaving the set untouched, when the
    /// identifier is already present.
    pub fn insert(&mut self, id: String, profile: TrackProfile) -> bool {
        if self.index.contains_key(&id) {
            return false;
        }
        self.index.insert(id.clone(), self.entries.len());
        self.entries.push((id, profile));
        true
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&TrackProfile> {
        self.index.get(id).map(|&i| &self.entries[i].1)
    }

    /// Identifier and profile in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TrackProfile)> {
        self.entries.iter().map(|(id, p)| (id.as_str(), p))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn tempos(&self) -> Vec<f64> {
        self.entries.iter().map(|(_, p)| p.primary_tempo).collect()
    }
}

/// A track left out of the comparison phase.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SkippedTrack {
    pub id: String,
    pub reason: String,
}

/// Everything a scan produced.
#[derive(Clone, Debug, Default)]
pub struct ScanReport {
    pub profiles: ProfileSet,
    /// Tracks whose analysis failed or timed out, in scan order.
    pub skipped: Vec<SkippedTrack>,
    /// Matching pairs, `(i, j)` lexicographic in scan order.
    pub matches: Vec<MatchResult>,
    /// Number of pairs actually compared.
    pub comparisons: usize,
}

/// Every `(i, j)` with `i < j < n`, lexicographic.
///
/// # Example
/// ```
/// use tm_match::scanner::all_pairs;
/// assert_eq!(all_pairs(3), vec![(0, 1), (0, 2), (1, 2)]);
/// assert!(all_pairs(1).is_empty());
/// ```
#[must_use]
pub fn all_pairs(n: usize) -> Vec<(usize, usize)> {
    (0..n)
        .flat_map(|i| (i + 1..n).map(move |j| (i, j)))
        .collect()
}

/// Pairs whose tempos can possibly be within `tolerance` of each other.
///
/// Tempos are bucketed by `floor(tempo / tolerance)`; a pair within the
/// tolerance always lands in the same or adjacent buckets, so no matching
/// pair is lost. Output is lexicographic like [`all_pairs`]. A tolerance that
/// is not strictly positive and finite falls back to every pair.
#[must_use]
pub fn bucketed_pairs(tempos: &[f64], tolerance: f64) -> Vec<(usize, usize)> {
    if !tolerance.is_finite() || tolerance <= 0.0 {
        return all_pairs(tempos.len());
    }
    let key = |t: f64| (t / tolerance).floor() as i64;

    let mut buckets: HashMap<i64, Vec<usize>> = HashMap::new();
    for (i, &t) in tempos.iter().enumerate() {
        buckets.entry(key(t)).or_default().push(i);
    }

    let mut pairs = Vec::new();
    for (i, &t) in tempos.iter().enumerate() {
        let k = key(t);
        for neighbour in [k.saturating_sub(1), k, k.saturating_add(1)] {
            if let Some(members) = buckets.get(&neighbour) {
                pairs.extend(members.iter().filter(|&&j| j > i).map(|&j| (i, j)));
            }
        }
    }
    pairs.sort_unstable();
    pairs.dedup();
    pairs
}

/// Decode one track and reduce it to a [`TrackProfile`].
///
/// # Errors
/// Propagates decode, feature and profile-building failures.
pub fn analyze_track(
    provider: &dyn FeatureProvider,
    ensemble: &TempoEnsemble,
    path: &Path,
) -> Result<TrackProfile> {
    let signal = provider.decode(path)?;
    let estimates = ensemble.estimate(provider, &signal)?;
    let frames = provider.detect_beats(&signal)?;
    let beat_times = provider.frames_to_time(&frames, signal.sample_rate());
    let profile = build_profile(estimates, &beat_times)?;
    log::debug!(
        "{} : {:.2} BPM (std {:.3}), {} battements",
        path.display(),
        profile.primary_tempo,
        profile.tempo_std,
        profile.beat_count()
    );
    Ok(profile)
}

/// Profiles a list of tracks, then compares every unordered pair once.
pub struct CorpusScanner {
    provider: Arc<dyn FeatureProvider>,
    ensemble: TempoEnsemble,
    thresholds: MatchThresholds,
    options: ScanOptions,
}

impl CorpusScanner {
    #[must_use]
    pub fn new(
        provider: Arc<dyn FeatureProvider>,
        thresholds: MatchThresholds,
        options: ScanOptions,
    ) -> Self {
        Self {
            provider,
            ensemble: TempoEnsemble::default(),
            thresholds,
            options,
        }
    }

    /// Replace the default three-strategy ensemble.
    #[must_use]
    pub fn with_ensemble(mut self, ensemble: TempoEnsemble) -> Self {
        self.ensemble = ensemble;
        self
    }

    /// Analyse one track, honouring the configured timeout.
    ///
    /// # Errors
    /// Fails when the analysis fails or does not finish in time.
    pub fn analyze(&self, path: &Path) -> Result<TrackProfile> {
        match self.options.timeout {
            None => analyze_track(self.provider.as_ref(), &self.ensemble, path),
            Some(limit) => self.analyze_with_timeout(path, limit),
        }
    }

    /// Run the analysis on a dedicated thread and stop waiting after `limit`.
    /// A timed-out worker is left to finish on its own; its result is dropped.
    fn analyze_with_timeout(&self, path: &Path, limit: Duration) -> Result<TrackProfile> {
        let (tx, rx) = flume::bounded(1);
        let provider = Arc::clone(&self.provider);
        let ensemble = self.ensemble.clone();
        let owned = path.to_path_buf();
        std::thread::Builder::new()
            .name("tm-analyze".into())
            .spawn(move || {
                let _ = tx.send(analyze_track(provider.as_ref(), &ensemble, &owned));
            })?;

        match rx.recv_timeout(limit) {
            Ok(result) => result,
            Err(flume::RecvTimeoutError::Timeout) => {
                bail!("Analyse interrompue après {:.1} s", limit.as_secs_f64())
            }
            Err(flume::RecvTimeoutError::Disconnected) => {
                bail!("Le thread d'analyse s'est arrêté sans résultat")
            }
        }
    }

    /// Analyse every track. Failures are logged and reported, never fatal.
    #[must_use]
    pub fn profile_all(&self, tracks: &[PathBuf]) -> (ProfileSet, Vec<SkippedTrack>) {
        log::info!("Analyse de {} piste(s)...", tracks.len());
        let results: Vec<Result<TrackProfile>> = if self.options.parallel {
            tracks.par_iter().map(|p| self.analyze(p)).collect()
        } else {
            tracks.iter().map(|p| self.analyze(p)).collect()
        };

        let mut profiles = ProfileSet::default();
        let mut skipped = Vec::new();
        for (path, result) in tracks.iter().zip(results) {
            let id = path.display().to_string();
            match result {
                Ok(profile) => {
                    if !profiles.insert(id.clone(), profile) {
                        log::warn!("Piste en double ignorée : {id}");
                    }
                }
                Err(e) => {
                    log::warn!("Piste ignorée {id} : {e:#}");
                    skipped.push(SkippedTrack {
                        id,
                        reason: format!("{e:#}"),
                    });
                }
            }
        }
        log::info!("{} profil(s) construit(s), {} échec(s)", profiles.len(), skipped.len());
        (profiles, skipped)
    }

    /// Pairs to compare, per the bucketing option.
    #[must_use]
    pub fn candidate_pairs(&self, profiles: &ProfileSet) -> Vec<(usize, usize)> {
        if self.options.bucketed {
            bucketed_pairs(&profiles.tempos(), self.thresholds.tempo_tolerance)
        } else {
            all_pairs(profiles.len())
        }
    }

    /// Matching pairs of `profiles`, `file1` always earlier in scan order.
    #[must_use]
    pub fn find_matches(&self, profiles: &ProfileSet) -> Vec<MatchResult> {
        self.compare_pairs(profiles, &self.candidate_pairs(profiles))
    }

    fn compare_pairs(&self, profiles: &ProfileSet, pairs: &[(usize, usize)]) -> Vec<MatchResult> {
        let evaluate = |&(i, j): &(usize, usize)| -> Option<MatchResult> {
            let (id_a, a) = &profiles.entries[i];
            let (id_b, b) = &profiles.entries[j];
            let comparison = compare(Some(a), Some(b), &self.thresholds);
            log::debug!(
                "Comparing {id_a} and {id_b}: Match? {}",
                comparison.is_match()
            );
            if !comparison.is_match() {
                return None;
            }
            let details = comparison.details?;
            Some(MatchResult {
                file1: id_a.clone(),
                file2: id_b.clone(),
                tempo1: a.primary_tempo,
                tempo2: b.primary_tempo,
                tempo_diff: details.tempo_diff,
                std_diff: details.std_diff,
                beat_diff: details.beat_diff?,
            })
        };

        if self.options.parallel {
            pairs.par_iter().filter_map(evaluate).collect()
        } else {
            pairs.iter().filter_map(evaluate).collect()
        }
    }

    /// Full scan: analysis, then pairwise comparison.
    #[must_use]
    pub fn scan(&self, tracks: &[PathBuf]) -> ScanReport {
        let (profiles, skipped) = self.profile_all(tracks);
        let pairs = self.candidate_pairs(&profiles);
        let matches = self.compare_pairs(&profiles, &pairs);
        log::info!(
            "{} paire(s) comparée(s), {} correspondance(s)",
            pairs.len(),
            matches.len()
        );
        ScanReport {
            profiles,
            skipped,
            matches,
            comparisons: pairs.len(),
        }
    }
}
