//! Version completion table and ignore-set membership tests.

use livedev_core::{complete_version, parse_version, IgnoreSet};
use rstest::rstest;
use std::fs;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// complete_version
// ---------------------------------------------------------------------------

#[rstest]
#[case("12", "12.0.0")]
#[case("12.3", "12.3.0")]
#[case("12.3.1", "12.3.1")]
#[case("12.3.1.2", "12.3.1.2")]
#[case("beta", "beta.0.0")]
fn complete_version_fills_missing_components(#[case] input: &str, #[case] expected: &str) {
    assert_eq!(complete_version(input), expected);
}

#[test]
fn highest_preferences_dir_wins_numerically_not_by_string() {
    let mut names = vec!["Live 12.10.0", "Live 12.9", "Live 12.0.1"];
    names.sort_by_key(|name| parse_version(name).expect("version"));
    assert_eq!(names.last(), Some(&"Live 12.10.0"));
}

// ---------------------------------------------------------------------------
// IgnoreSet
// ---------------------------------------------------------------------------

#[rstest]
#[case("*.log", "Log.log", true)]
#[case("*.log", "nested/dir/debug.log", true)]
#[case("build/", "build/out.py", true)]
#[case("/setup.cfg", "setup.cfg", true)]
#[case("/setup.cfg", "nested/setup.cfg", false)]
#[case("*.log", "surface.py", false)]
fn pattern_membership(#[case] pattern: &str, #[case] path: &str, #[case] ignored: bool) {
    let dir = TempDir::new().expect("tempdir");
    let set = IgnoreSet::from_patterns(dir.path(), [pattern]).expect("build");
    assert_eq!(set.ignores(path), ignored, "pattern {pattern} vs {path}");
}

#[test]
fn missing_ignore_file_still_ignores_vcs_dir() {
    let dir = TempDir::new().expect("tempdir");
    let set = IgnoreSet::load(dir.path()).expect("load");
    assert!(set.ignores(".git/HEAD"));
    assert!(!set.ignores("__init__.py"));
}

#[test]
fn negated_pattern_from_ignore_file_is_respected() {
    let dir = TempDir::new().expect("tempdir");
    fs::write(dir.path().join(".gitignore"), "*.json\n!manifest.json\n").expect("write");
    let set = IgnoreSet::load(dir.path()).expect("load");
    assert!(set.ignores("cache.json"));
    assert!(!set.ignores("manifest.json"));
}
