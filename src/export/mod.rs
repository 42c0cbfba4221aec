use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::storage::EssayRecord;

const EXPORT_EXTENSION: &str = "txt";
const UNTITLED_FILE_STEM: &str = "sem-titulo";

/// Writes the essay body to `<title>.txt` inside `dir` and returns the path.
/// The share step of the source platform is the caller's concern; here the
/// written file path is the hand-off.
pub fn export_essay(record: &EssayRecord, dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("creating export directory {}", dir.display()))?;
    let path = dir.join(format!(
        "{}.{EXPORT_EXTENSION}",
        file_stem_for(&record.title)
    ));
    fs::write(&path, record.body.as_bytes())
        .with_context(|| format!("writing export file {}", path.display()))?;
    tracing::info!(essay = %record.id, path = %path.display(), "exported essay");
    Ok(path)
}

/// Title reduced to a safe file stem: path separators and control characters
/// become underscores, surrounding whitespace is dropped.
fn file_stem_for(title: &str) -> String {
    let cleaned: String = title
        .trim()
        .chars()
        .map(|ch| match ch {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            ch if ch.is_control() => '_',
            ch => ch,
        })
        .collect();
    if cleaned.is_empty() {
        UNTITLED_FILE_STEM.to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(title: &str, body: &str) -> EssayRecord {
        EssayRecord {
            id: "a1b2c3d4e".into(),
            title: title.into(),
            body: body.into(),
        }
    }

    #[test]
    fn exports_body_to_title_named_file() -> Result<()> {
        let temp = TempDir::new()?;
        let path = export_essay(&record("Meio ambiente", "Corpo da redação"), temp.path())?;
        assert_eq!(path.file_name().unwrap(), "Meio ambiente.txt");
        assert_eq!(fs::read_to_string(&path)?, "Corpo da redação");
        Ok(())
    }

    #[test]
    fn creates_export_directory_when_missing() -> Result<()> {
        let temp = TempDir::new()?;
        let dir = temp.path().join("nested").join("exports");
        let path = export_essay(&record("T", "b"), &dir)?;
        assert!(path.starts_with(&dir));
        Ok(())
    }

    #[test]
    fn sanitizes_hostile_titles() {
        assert_eq!(file_stem_for("  ../../etc/passwd "), ".._.._etc_passwd");
        assert_eq!(file_stem_for("a:b*c?"), "a_b_c_");
        assert_eq!(file_stem_for("   "), UNTITLED_FILE_STEM);
    }
}
