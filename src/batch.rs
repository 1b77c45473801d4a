//! Импорт всех выписок каталога одним проходом.

use crate::error::ImportError;
use crate::importer::Importer;
use crate::raw::Source;
use crate::types::Transaction;
use chrono::NaiveDate;
use std::fs::{self, DirEntry};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Распознанный файл выписки.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedFile {
    /// Путь к файлу.
    pub path: PathBuf,
    /// Дата выписки.
    pub date: Option<NaiveDate>,
    /// Сколько транзакций дал файл.
    pub transactions: usize,
}

/// Результат импорта каталога.
#[derive(Debug, Clone, Default)]
pub struct ImportBatch {
    /// Распознанные файлы в порядке обработки.
    pub files: Vec<ImportedFile>,
    /// Транзакции всех файлов подряд.
    pub entries: Vec<Transaction>,
}

impl ImportBatch {
    /// Импортирует один файл, дописывая его транзакции после `existing`.
    pub fn from_file<I: Importer + ?Sized>(
        path: &Path,
        importer: &I,
        existing: Vec<Transaction>,
    ) -> Result<Self, ImportError> {
        let mut batch = Self {
            files: Vec::new(),
            entries: existing,
        };
        batch.push(path, importer)?;
        Ok(batch)
    }

    /// Импортирует все HTML-файлы каталога, которые распознаёт импортёр.
    ///
    /// # Пример
    ///
    /// ```
    /// # use beancount_bourse_direct::{BourseDirectImporter, ImportBatch};
    /// let importer = BourseDirectImporter::new("Assets:FR:BD:PEA", None);
    /// let batch = ImportBatch::from_dir("tests/fixtures", &importer).unwrap();
    /// assert!(!batch.entries.is_empty());
    /// ```
    pub fn from_dir<P, I>(dir: P, importer: &I) -> Result<Self, ImportError>
    where
        P: AsRef<Path>,
        I: Importer + ?Sized,
    {
        let mut entries: Vec<_> = fs::read_dir(dir)?
            .filter_map(std::result::Result::ok)
            .collect();
        // Делаем порядок файлов детерминированным.
        entries.sort_by_key(DirEntry::path);

        let mut batch = Self::default();
        for entry in entries {
            let path = entry.path();
            if !path.is_file() || !is_html(&path) {
                continue;
            }
            if !importer.identify(&Source::Path(&path)) {
                debug!(path = %path.display(), importer = %importer.name(), "not identified");
                continue;
            }
            batch.push(&path, importer)?;
        }

        info!(
            files = batch.files.len(),
            transactions = batch.entries.len(),
            "import finished"
        );
        Ok(batch)
    }

    fn push<I: Importer + ?Sized>(&mut self, path: &Path, importer: &I) -> Result<(), ImportError> {
        let source = Source::Path(path);
        let before = self.entries.len();
        self.entries = importer.extract(&source, Some(self.entries.as_slice()))?;
        self.files.push(ImportedFile {
            path: path.to_path_buf(),
            date: importer.file_date(&source)?,
            transactions: self.entries.len() - before,
        });
        Ok(())
    }
}

fn is_html(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .is_some_and(|ext| {
            let ext_lower = ext.to_ascii_lowercase();
            ext_lower == "html" || ext_lower == "htm"
        })
}
