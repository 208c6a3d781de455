//! Reference sample discovery
//!
//! A judge's reference clips live in one directory and follow several naming
//! conventions. For each name (id and label) with spaces turned into
//! underscores, a file matches one of the globs `Judge_{name}_*.json`,
//! `{name}_*.json` or `*{name}*.json`.

use globset::{Glob, GlobSet, GlobSetBuilder};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::load_clip;
use crate::types::{Clip, JudgeProfile};

fn safe_name(name: &str) -> String {
    name.trim().replace(' ', "_")
}

/// Which naming convention matched, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pattern {
    JudgePrefixed,
    NamePrefixed,
    Fuzzy,
}

impl Pattern {
    const ALL: [Pattern; 3] = [Pattern::JudgePrefixed, Pattern::NamePrefixed, Pattern::Fuzzy];

    fn glob(self, safe: &str) -> String {
        let safe = globset::escape(safe);
        match self {
            Pattern::JudgePrefixed => format!("Judge_{safe}_*.json"),
            Pattern::NamePrefixed => format!("{safe}_*.json"),
            Pattern::Fuzzy => format!("*{safe}*.json"),
        }
    }
}

/// Compiled reference globs for a set of names.
struct ReferenceGlobs {
    set: GlobSet,
    /// Pattern of each glob, by index in `set`.
    patterns: Vec<Pattern>,
}

impl ReferenceGlobs {
    fn new(names: &[&str]) -> Option<Self> {
        let mut builder = GlobSetBuilder::new();
        let mut patterns = Vec::new();
        for safe in names.iter().map(|n| safe_name(n)).filter(|s| !s.is_empty()) {
            for pattern in Pattern::ALL {
                match Glob::new(&pattern.glob(&safe)) {
                    Ok(glob) => {
                        builder.add(glob);
                        patterns.push(pattern);
                    }
                    Err(e) => warn!(name = %safe, error = %e, "Skipping unusable reference glob"),
                }
            }
        }
        match builder.build() {
            Ok(set) => Some(Self { set, patterns }),
            Err(e) => {
                warn!(error = %e, "Reference globs failed to compile");
                None
            }
        }
    }

    /// Most specific pattern matching `file_name`.
    fn match_pattern(&self, file_name: &str) -> Option<Pattern> {
        self.set
            .matches(file_name)
            .into_iter()
            .filter_map(|idx| self.patterns.get(idx).copied())
            .min_by_key(|p| Pattern::ALL.iter().position(|q| q == p))
    }
}

/// List reference files for any of `names`, deduplicated and sorted.
pub fn discover_reference_files(dir: &Path, names: &[&str]) -> Vec<PathBuf> {
    let Some(globs) = ReferenceGlobs::new(names) else {
        return Vec::new();
    };
    let entries = match std::fs::read_dir(dir) {
        Ok(e) => e,
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "Reference directory not readable");
            return Vec::new();
        }
    };

    let mut found = BTreeSet::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name().and_then(|f| f.to_str()) else {
            continue;
        };
        if let Some(pattern) = globs.match_pattern(file_name) {
            debug!(file = file_name, ?pattern, "Reference file matched");
            found.insert(path);
        }
    }

    found.into_iter().collect()
}

/// Load every reference clip for a judge. Empty or unparseable files are skipped.
pub fn load_reference_clips(dir: &Path, judge: &JudgeProfile) -> Vec<Clip> {
    let files = discover_reference_files(dir, &[judge.id.as_str(), judge.label.as_str()]);
    if files.is_empty() {
        warn!(judge = %judge.id, dir = %dir.display(), "No reference files found");
        return Vec::new();
    }

    info!(judge = %judge.id, files = files.len(), "Loading reference files");

    files
        .iter()
        .map(|path| load_clip(path))
        .filter(|clip| !clip.is_empty())
        .collect()
}
