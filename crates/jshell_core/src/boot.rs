//! Boot script location convention: where the shell's standard library
//! scripts live and how module names map onto files there.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Directory holding the boot scripts.
pub const BOOT_DIR_NAME: &str = "JSBOOT";
/// Packed form of the boot directory.
pub const BOOT_ARCHIVE_NAME: &str = "JSBOOT.ZIP";
/// Environment variable overriding boot path discovery.
pub const BOOT_PATH_VAR: &str = "JSBOOTPATH";

/// Script file suffix appended to bare module names.
const MODULE_SUFFIX: &str = "js";

/// Reports whether a file exists at `path`.
///
/// Directories do not count; the probe answers "can this be opened as a
/// script or data file".
pub fn file_exists(path: impl AsRef<Path>) -> bool {
    path.as_ref().is_file()
}

/// Resolves the boot script directory.
///
/// Resolution order:
/// 1. `override_path` when given; it must exist and be a directory.
/// 2. `<base_dir>/JSBOOT` when it is a directory.
/// 3. `<base_dir>/JSBOOT.ZIP`: recognized but unsupported; reported as a
///    dedicated error so the user knows to unpack it.
///
/// # Errors
/// - `BootError::OverrideMissing` when the override does not name a
///   directory.
/// - `BootError::ArchiveOnly` when only the packed form is present.
/// - `BootError::NotFound` when nothing is present.
pub fn resolve_boot_location(
    override_path: Option<&Path>,
    base_dir: &Path,
) -> Result<PathBuf, BootError> {
    if let Some(path) = override_path {
        if path.is_dir() {
            return Ok(path.to_path_buf());
        }
        return Err(BootError::OverrideMissing(path.to_path_buf()));
    }

    let boot_dir = base_dir.join(BOOT_DIR_NAME);
    if boot_dir.is_dir() {
        return Ok(boot_dir);
    }

    let archive = base_dir.join(BOOT_ARCHIVE_NAME);
    if archive.is_file() {
        return Err(BootError::ArchiveOnly(archive));
    }

    Err(BootError::NotFound(base_dir.to_path_buf()))
}

/// Maps a module name onto a script path inside the boot directory.
///
/// Bare names get the script suffix appended; names with an extension are
/// taken as-is.
///
/// # Errors
/// - `BootError::InvalidModuleName` for empty names or names that escape the
///   boot directory.
/// - `BootError::ModuleNotFound` when no file exists at the mapped path.
pub fn resolve_module(boot_dir: &Path, name: &str) -> Result<PathBuf, BootError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(BootError::InvalidModuleName(name.to_string()));
    }
    if trimmed.split(['/', '\\']).any(|part| part == "..") {
        return Err(BootError::InvalidModuleName(name.to_string()));
    }

    let mut path = boot_dir.join(trimmed);
    if path.extension().is_none() {
        path.set_extension(MODULE_SUFFIX);
    }

    if !file_exists(&path) {
        return Err(BootError::ModuleNotFound {
            name: trimmed.to_string(),
            path,
        });
    }
    Ok(path)
}

/// Boot location and module resolution errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootError {
    OverrideMissing(PathBuf),
    ArchiveOnly(PathBuf),
    NotFound(PathBuf),
    InvalidModuleName(String),
    ModuleNotFound { name: String, path: PathBuf },
}

impl Display for BootError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OverrideMissing(path) => {
                write!(
                    f,
                    "boot path override is not a directory: {}",
                    path.display()
                )
            }
            Self::ArchiveOnly(path) => write!(
                f,
                "found boot archive `{}` but archive loading is not supported; unpack it into a `{BOOT_DIR_NAME}` directory",
                path.display()
            ),
            Self::NotFound(base) => write!(
                f,
                "no `{BOOT_DIR_NAME}` directory under `{}`; set {BOOT_PATH_VAR} to the boot script location",
                base.display()
            ),
            Self::InvalidModuleName(name) => write!(f, "invalid module name: `{name}`"),
            Self::ModuleNotFound { name, path } => {
                write!(f, "module `{name}` not found at `{}`", path.display())
            }
        }
    }
}

impl Error for BootError {}

#[cfg(test)]
mod tests {
    use super::{
        file_exists, resolve_boot_location, resolve_module, BootError, BOOT_ARCHIVE_NAME,
        BOOT_DIR_NAME,
    };

    #[test]
    fn file_exists_distinguishes_files_from_directories() {
        let dir = tempfile::tempdir().expect("temp dir");
        let file = dir.path().join("present.js");
        std::fs::write(&file, "1;").expect("write file");

        assert!(file_exists(&file));
        assert!(!file_exists(dir.path()));
        assert!(!file_exists(dir.path().join("absent.js")));
    }

    #[test]
    fn resolves_override_before_boot_directory() {
        let base = tempfile::tempdir().expect("temp dir");
        std::fs::create_dir(base.path().join(BOOT_DIR_NAME)).expect("boot dir");
        let override_dir = tempfile::tempdir().expect("override dir");

        let resolved = resolve_boot_location(Some(override_dir.path()), base.path())
            .expect("override should win");
        assert_eq!(resolved, override_dir.path());
    }

    #[test]
    fn rejects_missing_override() {
        let base = tempfile::tempdir().expect("temp dir");
        let missing = base.path().join("nowhere");
        let err = resolve_boot_location(Some(&missing), base.path())
            .expect_err("missing override must fail");
        assert!(matches!(err, BootError::OverrideMissing(_)));
    }

    #[test]
    fn resolves_boot_directory_under_base() {
        let base = tempfile::tempdir().expect("temp dir");
        let boot_dir = base.path().join(BOOT_DIR_NAME);
        std::fs::create_dir(&boot_dir).expect("boot dir");

        let resolved =
            resolve_boot_location(None, base.path()).expect("boot directory should resolve");
        assert_eq!(resolved, boot_dir);
    }

    #[test]
    fn reports_archive_only_layout() {
        let base = tempfile::tempdir().expect("temp dir");
        std::fs::write(base.path().join(BOOT_ARCHIVE_NAME), b"PK").expect("archive");

        let err = resolve_boot_location(None, base.path()).expect_err("archive alone must fail");
        assert!(matches!(err, BootError::ArchiveOnly(_)));
        assert!(err.to_string().contains("unpack"));
    }

    #[test]
    fn reports_missing_boot_location() {
        let base = tempfile::tempdir().expect("temp dir");
        let err = resolve_boot_location(None, base.path()).expect_err("empty base must fail");
        assert!(matches!(err, BootError::NotFound(_)));
    }

    #[test]
    fn resolve_module_appends_script_suffix() {
        let boot = tempfile::tempdir().expect("temp dir");
        std::fs::write(boot.path().join("func.js"), "1;").expect("module file");

        let path = resolve_module(boot.path(), "func").expect("bare name should resolve");
        assert_eq!(path, boot.path().join("func.js"));

        let path = resolve_module(boot.path(), "func.js").expect("full name should resolve");
        assert_eq!(path, boot.path().join("func.js"));
    }

    #[test]
    fn resolve_module_rejects_escaping_names() {
        let boot = tempfile::tempdir().expect("temp dir");
        for name in ["", "   ", "../secrets", "a/../../b"] {
            let err = resolve_module(boot.path(), name).expect_err("name must be rejected");
            assert!(matches!(err, BootError::InvalidModuleName(_)));
        }
    }

    #[test]
    fn resolve_module_reports_missing_module() {
        let boot = tempfile::tempdir().expect("temp dir");
        let err = resolve_module(boot.path(), "ghost").expect_err("missing module must fail");
        assert!(matches!(err, BootError::ModuleNotFound { .. }));
    }
}
