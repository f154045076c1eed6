use std::path::Path;

use crate::Result;

/// A CSV of customers selected for bulk prediction. Contents are not inspected
/// beyond counting rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl BatchFile {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload.csv".to_string());
        Ok(Self { file_name, bytes })
    }

    /// Non-blank lines after the header
    pub fn row_count(&self) -> usize {
        String::from_utf8_lossy(&self.bytes)
            .lines()
            .filter(|l| !l.trim().is_empty())
            .count()
            .saturating_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_count_skips_header_and_blank_lines() {
        let file = BatchFile::new("c.csv", "account length,area code\n1,415\n\n2,408\r\n3,510\n");
        assert_eq!(file.row_count(), 3);
        assert_eq!(BatchFile::new("e.csv", "").row_count(), 0);
    }

    #[test]
    fn test_open_uses_file_name() {
        let dir = std::env::temp_dir().join(format!("churn-batch-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("customers.csv");
        std::fs::write(&path, "a\n1\n").unwrap();

        let file = BatchFile::open(&path).unwrap();
        assert_eq!(file.file_name, "customers.csv");
        assert_eq!(file.row_count(), 1);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
