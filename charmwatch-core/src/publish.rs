//! Report persistence and pointer republishing
//!
//! Both writes go through a temporary entry in the output directory that is
//! renamed into place, so readers see either the old file or the new one,
//! never a missing or partial one.

use chrono::NaiveDate;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::RunError;

/// Fixed name of the pointer to the latest report
pub const POINTER_FILE_NAME: &str = "new.html";

/// Mode of published reports; they are served by other users
#[cfg(unix)]
pub const REPORT_MODE: u32 = 0o644;

/// `<prefix>-<YYYY-MM-DD>.html`
pub fn report_file_name(prefix: &str, date: NaiveDate) -> String {
    format!("{}-{}.html", prefix, date.format("%Y-%m-%d"))
}

/// Write `html` to `dir/file_name` atomically, creating `dir` if needed
pub fn write_report(dir: &Path, file_name: &str, html: &str) -> Result<PathBuf, RunError> {
    std::fs::create_dir_all(dir).map_err(|e| RunError::io(dir, e))?;

    let path = dir.join(file_name);
    let mut tmp = tempfile::Builder::new()
        .prefix(".report-")
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(|e| RunError::io(dir, e))?;

    tmp.write_all(html.as_bytes())
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(|e| RunError::io(tmp.path(), e))?;

    // Staging files are created owner-only; persist keeps the mode
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tmp.as_file()
            .set_permissions(std::fs::Permissions::from_mode(REPORT_MODE))
            .map_err(|e| RunError::io(tmp.path(), e))?;
    }

    tmp.persist(&path)
        .map_err(|e| RunError::io(&path, e.error))?;

    debug!("Wrote report {}", path.display());
    Ok(path)
}

/// Point `dir/new.html` at `dir/target_file_name`.
///
/// The new pointer is created under a unique temporary name and renamed over
/// the old one.
pub fn republish_pointer(dir: &Path, target_file_name: &str) -> Result<PathBuf, RunError> {
    let pointer = dir.join(POINTER_FILE_NAME);
    let staging = dir.join(format!(
        ".{}.{}.tmp",
        POINTER_FILE_NAME,
        uuid::Uuid::new_v4().simple()
    ));

    stage_pointer(dir, target_file_name, &staging).map_err(|e| RunError::io(&staging, e))?;

    if let Err(e) = std::fs::rename(&staging, &pointer) {
        let _ = std::fs::remove_file(&staging);
        return Err(RunError::io(&pointer, e));
    }

    debug!("{} -> {}", pointer.display(), target_file_name);
    Ok(pointer)
}

#[cfg(unix)]
fn stage_pointer(_dir: &Path, target_file_name: &str, staging: &Path) -> std::io::Result<()> {
    // Relative target so the output directory can be moved or served as is
    std::os::unix::fs::symlink(target_file_name, staging)
}

#[cfg(not(unix))]
fn stage_pointer(dir: &Path, target_file_name: &str, staging: &Path) -> std::io::Result<()> {
    std::fs::copy(dir.join(target_file_name), staging).map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2016, 8, day).unwrap()
    }

    #[test]
    fn test_report_file_name() {
        assert_eq!(
            report_file_name("cs-whats-new", date(5)),
            "cs-whats-new-2016-08-05.html"
        );
    }

    #[test]
    fn test_write_report_creates_dir() {
        let temp_dir = TempDir::new().unwrap();
        let out = temp_dir.path().join("nested/reports");

        let path = write_report(&out, "r-2016-08-05.html", "<html></html>").unwrap();

        assert_eq!(path, out.join("r-2016-08-05.html"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "<html></html>");

        // No temporary files left behind
        let leftovers: Vec<_> = std::fs::read_dir(&out)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_write_report_overwrites_same_day() {
        let temp_dir = TempDir::new().unwrap();

        write_report(temp_dir.path(), "r.html", "first").unwrap();
        let path = write_report(temp_dir.path(), "r.html", "second").unwrap();

        assert_eq!(std::fs::read_to_string(path).unwrap(), "second");
    }

    #[test]
    fn test_republish_pointer_replaces_previous() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();

        write_report(dir, "r-2016-08-05.html", "day five").unwrap();
        write_report(dir, "r-2016-08-06.html", "day six").unwrap();

        let pointer = republish_pointer(dir, "r-2016-08-05.html").unwrap();
        assert_eq!(std::fs::read_to_string(&pointer).unwrap(), "day five");

        republish_pointer(dir, "r-2016-08-06.html").unwrap();
        assert_eq!(std::fs::read_to_string(&pointer).unwrap(), "day six");
        assert_eq!(
            std::fs::read_to_string(dir.join("r-2016-08-05.html")).unwrap(),
            "day five"
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_report_is_world_readable() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let path = write_report(temp_dir.path(), "r-2016-08-05.html", "x").unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, REPORT_MODE);

        // Readable through the pointer as well
        let pointer = republish_pointer(temp_dir.path(), "r-2016-08-05.html").unwrap();
        let mode = std::fs::metadata(&pointer).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, REPORT_MODE);
    }

    #[cfg(unix)]
    #[test]
    fn test_pointer_is_relative_symlink() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();

        write_report(dir, "r-2016-08-05.html", "x").unwrap();
        let pointer = republish_pointer(dir, "r-2016-08-05.html").unwrap();

        let meta = std::fs::symlink_metadata(&pointer).unwrap();
        assert!(meta.file_type().is_symlink());
        assert_eq!(
            std::fs::read_link(&pointer).unwrap(),
            PathBuf::from("r-2016-08-05.html")
        );
    }
}
