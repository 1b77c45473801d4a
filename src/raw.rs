//! Источники выписки, исходный HTML и подготовленное DOM-дерево.

use crate::error::ImportError;
use crate::table::{StatementTable, read_tables};
use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};
use regex::Regex;
use scraper::Html;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use std::sync::LazyLock;

static CHARSET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)charset\s*=\s*["']?([a-z0-9_:.\-]+)"#).expect("valid charset regex")
});

// Объявление кодировки ищем только в начале документа.
const CHARSET_SNIFF_LEN: usize = 4096;

/// Ссылка на файл выписки, которую передаёт фреймворк импорта.
#[derive(Debug, Clone, Copy)]
pub enum Source<'a> {
    /// Путь к файлу: импортёр сам открывает и закрывает его.
    Path(&'a Path),
    /// Открытый вызывающей стороной файл и, если известен, его путь.
    /// Перед чтением перематывается в начало и не закрывается.
    File(&'a File, Option<&'a Path>),
    /// HTML уже в памяти.
    Html(&'a str),
}

impl Source<'_> {
    /// Имя файла для метаданных проводок.
    pub fn name(&self) -> String {
        match self {
            Source::Path(path) => path.display().to_string(),
            Source::File(_, Some(path)) => path.display().to_string(),
            Source::File(_, None) => "<file>".to_string(),
            Source::Html(_) => "<string>".to_string(),
        }
    }
}

impl<'a> From<&'a Path> for Source<'a> {
    #[inline]
    fn from(path: &'a Path) -> Self {
        Source::Path(path)
    }
}

impl<'a> From<&'a File> for Source<'a> {
    #[inline]
    fn from(file: &'a File) -> Self {
        Source::File(file, None)
    }
}

/// Исходный HTML выписки без разбора DOM.
#[derive(Debug, Clone)]
pub struct RawStatement {
    /// Полный HTML выписки.
    pub html: String,
}

impl RawStatement {
    /// Читает HTML-выписку из произвольного `Read`.
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self, ImportError> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Ok(Self {
            html: decode_html(&bytes),
        })
    }

    /// Читает выписку из источника, каждый раз заново.
    pub fn from_source(source: &Source) -> Result<Self, ImportError> {
        match *source {
            Source::Path(path) => Self::from_reader(File::open(path)?),
            Source::File(file, _) => {
                let mut handle = file;
                handle.seek(SeekFrom::Start(0))?;
                Self::from_reader(handle)
            }
            Source::Html(html) => Ok(Self::from_str(html)),
        }
    }

    /// Создаёт выписку из готовой HTML-строки.
    #[inline]
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Self {
        Self {
            html: s.to_string(),
        }
    }
}

/// Декодирует HTML: UTF-8 как есть, иначе по `<meta charset>`,
/// а без объявления как windows-1252.
fn decode_html(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes);
    if let Ok(text) = std::str::from_utf8(bytes) {
        return text.to_string();
    }

    let head = String::from_utf8_lossy(&bytes[..bytes.len().min(CHARSET_SNIFF_LEN)]);
    let encoding = CHARSET_RE
        .captures(&head)
        .and_then(|caps| Encoding::for_label(caps[1].as_bytes()))
        .filter(|encoding| *encoding != UTF_8)
        .unwrap_or(WINDOWS_1252);
    let (decoded, _, _) = encoding.decode(bytes);
    decoded.into_owned()
}

/// Разобранный DOM выписки.
#[derive(Debug, Clone)]
pub struct DomStatement {
    pub(crate) doc: Html,
}

impl DomStatement {
    /// Парсит DOM из исходного HTML.
    #[inline]
    pub fn parse(raw: &RawStatement) -> Self {
        Self {
            doc: Html::parse_document(&raw.html),
        }
    }

    /// Все таблицы документа в порядке следования.
    #[inline]
    pub fn tables(&self) -> Vec<StatementTable> {
        read_tables(&self.doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utf8_passes_through() {
        let raw = RawStatement::from_reader("\u{feff}<th>Qté</th>".as_bytes()).unwrap();
        assert_eq!(raw.html, "<th>Qté</th>");
    }

    #[test]
    fn declared_legacy_charset() {
        let mut bytes = b"<meta charset=\"windows-1252\"><th>Qt".to_vec();
        bytes.extend_from_slice(&[0xE9, b'<', b'/', b't', b'h', b'>', b'1', b'0', 0x80]);
        let raw = RawStatement::from_reader(bytes.as_slice()).unwrap();
        assert!(raw.html.ends_with("<th>Qté</th>10€"));
    }

    #[test]
    fn undeclared_legacy_falls_back_to_windows_1252() {
        let mut bytes = b"Libell".to_vec();
        bytes.push(0xE9);
        let raw = RawStatement::from_reader(bytes.as_slice()).unwrap();
        assert_eq!(raw.html, "Libellé");
    }

    #[test]
    fn file_source_name_uses_known_path() {
        let file = tempfile::tempfile().unwrap();
        let path = Path::new("releves/BourseDirect.html");
        assert_eq!(Source::File(&file, Some(path)).name(), "releves/BourseDirect.html");
        assert_eq!(Source::from(&file).name(), "<file>");
    }
}
