use std::path::PathBuf;

use walkdir::WalkDir;

use crate::dataset::{DataLoader, TimeSeriesSet};
use crate::error::{BenchError, Result};
use crate::settings::TEST_SUFFIX;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetEntry {
    pub name: String,
    pub test_path: PathBuf,
}

/// The UCR archive on disk: one directory per dataset, each holding
/// `<Name>_TRAIN.tsv` and `<Name>_TEST.tsv`.
#[derive(Debug, Clone)]
pub struct Archive {
    root: PathBuf,
}

impl Archive {
    pub fn new(root: impl Into<PathBuf>) -> Archive {
        Archive { root: root.into() }
    }

    pub fn test_path(&self, name: &str) -> PathBuf {
        self.root.join(name).join(format!("{}{}", name, TEST_SUFFIX))
    }

    /// Every dataset directory directly under the root, sorted by name.
    pub fn datasets(&self) -> Result<Vec<DatasetEntry>> {
        let entries = std::fs::read_dir(&self.root).map_err(|e| BenchError::io(&self.root, e))?;

        let mut found = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| BenchError::io(&self.root, e))?;
            if !entry.path().is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            found.push(DatasetEntry {
                test_path: self.test_path(&name),
                name,
            });
        }
        found.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(found)
    }

    /// Every `*_TEST.tsv` file anywhere below the root, sorted by path.
    pub fn test_files(&self) -> Result<Vec<DatasetEntry>> {
        let mut found = Vec::new();
        for entry in WalkDir::new(&self.root) {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(&self.root).to_path_buf();
                BenchError::io(path, e.into())
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let file_name = entry.file_name().to_string_lossy();
            if let Some(name) = file_name.strip_suffix(TEST_SUFFIX) {
                found.push(DatasetEntry {
                    name: name.to_owned(),
                    test_path: entry.path().to_path_buf(),
                });
            }
        }
        found.sort_by(|a, b| a.test_path.cmp(&b.test_path));
        Ok(found)
    }

    pub fn load(&self, name: &str) -> Result<TimeSeriesSet> {
        DataLoader::ucr(self.test_path(name)).load(name)
    }
}

impl DatasetEntry {
    pub fn load(&self) -> Result<TimeSeriesSet> {
        DataLoader::ucr(&self.test_path).load(self.name.as_str())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use tempdir::TempDir;

    /// Writes a small archive: each dataset gets `rows` series of length 4.
    pub(crate) fn toy_archive(datasets: &[(&str, usize)]) -> TempDir {
        let dir = TempDir::new("archive").unwrap();
        for (name, rows) in datasets {
            let folder = dir.path().join(name);
            std::fs::create_dir_all(&folder).unwrap();
            let mut contents = String::new();
            for r in 0..*rows {
                let offset = if r % 2 == 0 { 0.0 } else { 10.0 };
                contents.push_str(&format!(
                    "{}\t{}\t{}\t{}\t{}\n",
                    r % 2 + 1,
                    offset,
                    offset + 1.0,
                    offset + 0.5,
                    offset + (r as f64) * 0.01
                ));
            }
            std::fs::write(folder.join(format!("{}_TEST.tsv", name)), contents).unwrap();
            std::fs::write(folder.join(format!("{}_TRAIN.tsv", name)), "1\t0\n").unwrap();
        }
        dir
    }

    #[test]
    fn test_it_can_list_dataset_directories() {
        let dir = toy_archive(&[("Beef", 4), ("Adiac", 6)]);
        std::fs::write(dir.path().join("README.md"), "not a dataset").unwrap();

        let archive = Archive::new(dir.path());
        let names: Vec<String> = archive.datasets().unwrap().into_iter().map(|d| d.name).collect();
        assert_eq!(vec!["Adiac", "Beef"], names);
    }

    #[test]
    fn test_it_can_find_test_files_recursively() {
        let dir = toy_archive(&[("Beef", 4), ("Adiac", 6)]);
        let archive = Archive::new(dir.path());

        let files = archive.test_files().unwrap();
        assert_eq!(2, files.len());
        assert_eq!("Adiac", files[0].name);
        assert!(files[0].test_path.ends_with("Adiac/Adiac_TEST.tsv"));
        assert_eq!(6, files[0].load().unwrap().len());
    }

    #[test]
    fn test_it_can_load_by_name() {
        let dir = toy_archive(&[("Beef", 4)]);
        let set = Archive::new(dir.path()).load("Beef").unwrap();
        assert_eq!(4, set.len());
        assert_eq!(4, set.series[0].len());
    }
}
