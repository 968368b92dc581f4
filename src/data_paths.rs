//! Purpose: Resolve where the movie dataset file lives.
//! Exports: `resolve_data_path`, `DATA_ENV`, `DATASET_FILE`.
//! Role: Keep CLI configuration precedence in one testable place.
//! Invariants: Precedence is `--data`, then `CINEDEX_DATA`, then `data/<file>`
//! next to the running executable.
//! Invariants: Empty overrides are ignored rather than treated as paths.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

pub(crate) const DATA_ENV: &str = "CINEDEX_DATA";
pub(crate) const DATASET_FILE: &str = "tmdb_top_rated_movies.csv";

pub(crate) fn resolve_data_path(flag: Option<PathBuf>) -> PathBuf {
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf));
    resolve_with(flag, std::env::var_os(DATA_ENV), exe_dir.as_deref())
}

fn resolve_with(flag: Option<PathBuf>, env: Option<OsString>, exe_dir: Option<&Path>) -> PathBuf {
    if let Some(path) = flag.filter(|path| !path.as_os_str().is_empty()) {
        return path;
    }
    if let Some(value) = env.filter(|value| !value.is_empty()) {
        return PathBuf::from(value);
    }
    let base = exe_dir.unwrap_or_else(|| Path::new("."));
    base.join("data").join(DATASET_FILE)
}
