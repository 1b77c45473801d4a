//! Контракт импортёра, который вызывает фреймворк импорта леджера.

use crate::error::ImportError;
use crate::raw::Source;
use crate::types::Transaction;
use chrono::NaiveDate;

/// Импортёр выписки одного формата.
///
/// Каждый вызов заново читает и разбирает источник, состояния между
/// вызовами нет, кроме неизменяемой конфигурации.
pub trait Importer {
    /// Отображаемое имя импортёра.
    fn name(&self) -> String;

    /// Счёт, к которому относится файл.
    fn file_account(&self, source: &Source) -> &str;

    /// Дата выписки или `None`, если файл не распознан.
    fn file_date(&self, source: &Source) -> Result<Option<NaiveDate>, ImportError>;

    /// Предлагаемое имя файла при архивировании.
    fn file_name(&self, source: &Source) -> &'static str;

    /// Распознаёт формат. Никогда не падает: любая ошибка означает `false`.
    fn identify(&self, source: &Source) -> bool;

    /// Строит транзакции и дописывает их после `existing`.
    fn extract(
        &self,
        source: &Source,
        existing: Option<&[Transaction]>,
    ) -> Result<Vec<Transaction>, ImportError>;
}
