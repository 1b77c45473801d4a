//! Таблица соответствия названий бумаг в выписке тикерам леджера.

use std::collections::BTreeMap;

/// Неизменяемое отображение «название в выписке → тикер».
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelLookup {
    map: BTreeMap<String, String>,
}

impl LabelLookup {
    /// Пустая таблица.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Переводит название бумаги в тикер.
    ///
    /// Сначала ищется точное совпадение, затем самый длинный ключ,
    /// входящий в название (при равной длине меньший лексикографически).
    /// Если ничего не нашлось, возвращается само название.
    pub fn resolve<'a>(&'a self, label: &'a str) -> &'a str {
        self.get(label).unwrap_or(label)
    }

    /// Тикер для названия бумаги, если он известен (те же правила, что
    /// у [`LabelLookup::resolve`], но без возврата самого названия).
    pub fn get(&self, label: &str) -> Option<&str> {
        if let Some(ticker) = self.map.get(label) {
            return Some(ticker);
        }
        self.map
            .iter()
            .filter(|(key, _)| !key.is_empty() && label.contains(key.as_str()))
            .max_by(|(a, _), (b, _)| a.len().cmp(&b.len()).then_with(|| b.cmp(a)))
            .map(|(_, ticker)| ticker.as_str())
    }

    /// Количество записей.
    #[inline]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Пуста ли таблица.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for LabelLookup
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            map: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
