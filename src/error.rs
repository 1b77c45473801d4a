//! Ошибки чтения и импорта выписок.

/// Ошибка чтения выписки или построения проводок.
#[derive(thiserror::Error, Debug)]
pub enum ImportError {
    /// Ошибка ввода-вывода при чтении исходного файла.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// В выписке не нашлось таблицы с ожидаемым набором столбцов.
    #[error("Statement table not found")]
    TableNotFound,
    /// В строке таблицы нет обязательного столбца.
    #[error("Required column '{column}' missing")]
    MissingColumn {
        /// Название столбца.
        column: &'static str,
    },
    /// Ошибка разбора числового значения.
    #[error("Invalid number '{value}' in column '{column}'")]
    Number {
        /// Некорректное исходное значение.
        value: String,
        /// Название столбца.
        column: &'static str,
    },
    /// Ошибка разбора даты.
    #[error("Invalid date '{value}'")]
    Date {
        /// Некорректная дата.
        value: String,
    },
}
