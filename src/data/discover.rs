use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use glob::{glob, Pattern};
use zip::ZipArchive;

use super::error::PipelineError;

/// Lists every sample source under a root directory.
///
/// The returned order must be stable across runs: dedup keeps the last of
/// several identical records, so it depends on it.
pub trait DiscoverSources {
    fn discover(&self, root: &Path) -> Result<Vec<String>, PipelineError>;
}

/// Walks the filesystem for sample files and sample members of zip archives.
///
/// Archive members are reported as `<archive path>:<member name>`.
#[derive(Debug, Clone)]
pub struct FsDiscovery {
    extensions: Vec<String>,
}

impl Default for FsDiscovery {
    fn default() -> Self {
        Self {
            extensions: vec!["tsv".to_string()],
        }
    }
}

impl FsDiscovery {
    fn accepts(&self, name: &str) -> bool {
        Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| self.extensions.iter().any(|x| e.eq_ignore_ascii_case(x)))
            .unwrap_or(false)
    }

    fn archive_members(&self, archive: &Path) -> Result<Vec<String>, PipelineError> {
        let fail = |reason: String| PipelineError::Discovery {
            root: archive.display().to_string(),
            reason,
        };
        let file = File::open(archive).map_err(|e| fail(e.to_string()))?;
        let mut zip = ZipArchive::new(BufReader::new(file)).map_err(|e| fail(e.to_string()))?;

        let mut members = Vec::new();
        for i in 0..zip.len() {
            let entry = zip.by_index(i).map_err(|e| fail(e.to_string()))?;
            if entry.is_file() && self.accepts(entry.name()) {
                members.push(format!("{}:{}", archive.display(), entry.name()));
            }
        }
        Ok(members)
    }
}

impl DiscoverSources for FsDiscovery {
    fn discover(&self, root: &Path) -> Result<Vec<String>, PipelineError> {
        let fail = |reason: String| PipelineError::Discovery {
            root: root.display().to_string(),
            reason,
        };
        if !root.is_dir() {
            return Err(fail("not a directory".to_string()));
        }

        let pattern = format!("{}/**/*", Pattern::escape(&root.to_string_lossy()));
        let mut sources = Vec::new();

        for entry in glob(&pattern).map_err(|e| fail(e.to_string()))? {
            let path = entry.map_err(|e| fail(e.to_string()))?;
            if !path.is_file() {
                continue;
            }
            let name = path.to_string_lossy();
            let is_archive = path
                .extension()
                .map(|e| e.eq_ignore_ascii_case("zip"))
                .unwrap_or(false);

            if is_archive {
                sources.extend(self.archive_members(&path)?);
            } else if self.accepts(&name) {
                sources.push(name.into_owned());
            }
        }

        log::info!("Discovered {} sample sources under {}", sources.len(), root.display());
        Ok(sources)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;
    use zip::write::SimpleFileOptions;

    #[test]
    fn test_discovers_files_and_archive_members() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir(root.join("nested")).unwrap();
        std::fs::write(root.join("a.tsv"), "x\n1\n").unwrap();
        std::fs::write(root.join("nested").join("b.tsv"), "x\n1\n").unwrap();
        std::fs::write(root.join("notes.txt"), "ignore me").unwrap();

        let mut zip = zip::ZipWriter::new(File::create(root.join("c.zip")).unwrap());
        let options = SimpleFileOptions::default();
        zip.start_file("c1.tsv", options).unwrap();
        zip.write_all(b"x\n1\n").unwrap();
        zip.start_file("readme.md", options).unwrap();
        zip.write_all(b"# hi").unwrap();
        zip.finish().unwrap();

        let sources = FsDiscovery::default().discover(root).unwrap();
        let mut names: Vec<&str> = sources
            .iter()
            .map(|s| crate::data::record::source_filename(s))
            .collect();
        names.sort_unstable();
        assert_eq!(names, vec!["a.tsv", "b.tsv", "c1.tsv"]);
        assert!(sources.iter().any(|s| s.ends_with("c.zip:c1.tsv")));

        // Same tree, same order.
        assert_eq!(FsDiscovery::default().discover(root).unwrap(), sources);
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let dir = tempdir().unwrap();
        let err = FsDiscovery::default()
            .discover(&dir.path().join("absent"))
            .unwrap_err();
        assert!(matches!(err, PipelineError::Discovery { .. }));
    }
}
