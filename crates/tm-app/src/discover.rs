use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

/// Audio files under `dir` whose extension is in `extensions`, sorted by path.
///
/// `extensions` are compared case-insensitively and without the leading dot.
/// Sub-directories are only visited when `recursive` is set.
///
/// # Errors
/// Returns an error if `dir` is not a directory or cannot be read.
pub fn discover_tracks(dir: &Path, extensions: &[String], recursive: bool) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        bail!("Dossier introuvable : {}", dir.display());
    }
    let mut files = Vec::new();
    scan_dir(dir, extensions, recursive, &mut files)?;
    files.sort();
    Ok(files)
}

fn scan_dir(dir: &Path, extensions: &[String], recursive: bool, files: &mut Vec<PathBuf>) -> Result<()> {
    let entries = fs::read_dir(dir).with_context(|| format!("Lecture impossible : {}", dir.display()))?;
    for entry in entries {
        let path = entry?.path();
        if path.is_dir() {
            if recursive {
                scan_dir(&path, extensions, recursive, files)?;
            }
        } else if let Some(ext) = path.extension().and_then(|s| s.to_str()) {
            let ext = ext.to_lowercase();
            if extensions.iter().any(|e| *e == ext) {
                files.push(path);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exts() -> Vec<String> {
        vec!["mp3".into(), "wav".into()]
    }

    fn touch(path: &Path) {
        fs::write(path, b"").unwrap();
    }

    #[test]
    fn filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.mp3", "a.WAV", "c.txt", "noext"] {
            touch(&dir.path().join(name));
        }
        let files = discover_tracks(dir.path(), &exts(), false).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.WAV", "b.mp3"]);
    }

    #[test]
    fn recursion_is_opt_in() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("sub");
        fs::create_dir(&sub).unwrap();
        touch(&dir.path().join("top.mp3"));
        touch(&sub.join("inner.mp3"));

        assert_eq!(discover_tracks(dir.path(), &exts(), false).unwrap().len(), 1);
        let all = discover_tracks(dir.path(), &exts(), true).unwrap();
        assert_eq!(all.len(), 2);
        assert!(all.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn missing_dir_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = discover_tracks(&dir.path().join("nope"), &exts(), false).unwrap_err();
        assert!(err.to_string().contains("introuvable"));
    }
}
