//! Таблицы выписки и разбор чисел и дат из их ячеек.

use crate::error::ImportError;
use crate::types::Money;
use chrono::NaiveDate;
use regex::Regex;
use rust_decimal::Decimal;
use scraper::{ElementRef, Html, Selector};
use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;
use std::sync::LazyLock;

static TABLE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("table").expect("valid table selector"));
static ROW_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("tr").expect("valid tr selector"));

// Плюс перед числом, символ валюты и пробелы любых видов.
static MONEY_NOISE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+|[€\s]").expect("valid money noise regex"));

/// Строка таблицы: значения ячеек по названиям столбцов.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    values: BTreeMap<String, String>,
}

impl Row {
    /// Значение ячейки, если такой столбец есть в строке.
    #[inline]
    pub fn get(&self, column: &str) -> Option<&str> {
        self.values.get(column).map(String::as_str)
    }

    /// Значение обязательной ячейки.
    pub fn require(&self, column: &'static str) -> Result<&str, ImportError> {
        self.get(column)
            .ok_or(ImportError::MissingColumn { column })
    }
}

/// Таблица выписки: заголовки и строки с данными.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatementTable {
    /// Названия столбцов в порядке следования.
    pub columns: Vec<String>,
    /// Строки с данными, без заголовка.
    pub rows: Vec<Row>,
}

impl StatementTable {
    /// Множество названий столбцов.
    pub fn column_set(&self) -> BTreeSet<&str> {
        self.columns.iter().map(String::as_str).collect()
    }

    /// Точное совпадение набора столбцов: лишний, недостающий или
    /// повторённый столбец не подходит.
    pub fn has_columns(&self, expected: &BTreeSet<&str>) -> bool {
        self.columns.len() == expected.len() && self.column_set() == *expected
    }

    /// Есть ли в таблице столбец с таким названием.
    #[inline]
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }
}

/// Нормализует последовательность символов, схлопывая группы пробельных.
fn normalize_chars<I: IntoIterator<Item = char>>(iter: I) -> String {
    let mut output = String::new();
    let mut prev_space = false;
    for ch in iter {
        let is_space = ch.is_whitespace();
        if is_space {
            if !prev_space {
                output.push(' ');
            }
        } else {
            output.push(ch);
        }
        prev_space = is_space;
    }
    output.trim().to_string()
}

/// Собирает текст всех потомков элемента и нормализует пробелы.
pub fn collect_text(element: ElementRef) -> String {
    normalize_chars(element.text().flat_map(|s| s.chars()))
}

/// Разбирает денежное значение вида `-1 336,20 €`.
pub fn parse_money(value: &str, column: &'static str) -> Result<Money, ImportError> {
    let normalized = MONEY_NOISE_RE
        .replace_all(value.trim(), "")
        .replace(',', ".");
    Decimal::from_str(&normalized).map_err(|_| ImportError::Number {
        value: value.trim().to_string(),
        column,
    })
}

/// Разбирает дату в формате `dd/mm/yyyy`.
pub fn parse_date(value: &str) -> Result<NaiveDate, ImportError> {
    NaiveDate::parse_from_str(value.trim(), "%d/%m/%Y").map_err(|_| ImportError::Date {
        value: value.trim().to_string(),
    })
}

fn has_name(element: ElementRef, name: &str) -> bool {
    element.value().name() == name
}

/// Ячейки строки без заходов во вложенные таблицы.
fn cells(tr: ElementRef) -> Vec<ElementRef> {
    tr.children()
        .filter_map(ElementRef::wrap)
        .filter(|cell| has_name(*cell, "td") || has_name(*cell, "th"))
        .collect()
}

/// Строки, принадлежащие самой таблице, а не вложенным в неё.
fn own_rows(table: ElementRef) -> Vec<ElementRef> {
    table
        .select(&ROW_SELECTOR)
        .filter(|tr| {
            tr.ancestors()
                .filter_map(ElementRef::wrap)
                .find(|el| has_name(*el, "table"))
                .is_some_and(|owner| owner.id() == table.id())
        })
        .collect()
}

fn in_thead(tr: ElementRef) -> bool {
    tr.parent()
        .and_then(ElementRef::wrap)
        .is_some_and(|parent| has_name(parent, "thead"))
}

/// Разбирает одну HTML-таблицу.
///
/// Заголовок берётся из первой строки `<thead>`, иначе из первой строки,
/// состоящей только из `<th>`. Без заголовка столбцы нумеруются с нуля.
fn read_table(table: ElementRef) -> StatementTable {
    let rows = own_rows(table);

    let header_idx = rows.iter().position(|tr| in_thead(*tr)).or_else(|| {
        rows.first()
            .map(|tr| cells(*tr))
            .filter(|c| !c.is_empty() && c.iter().all(|cell| has_name(*cell, "th")))
            .map(|_| 0)
    });

    let columns: Vec<String> = match header_idx {
        Some(idx) => cells(rows[idx]).into_iter().map(collect_text).collect(),
        None => {
            let width = rows.iter().map(|tr| cells(*tr).len()).max().unwrap_or(0);
            (0..width).map(|i| i.to_string()).collect()
        }
    };

    let mut body = Vec::new();
    for (idx, tr) in rows.iter().enumerate() {
        if Some(idx) == header_idx || in_thead(*tr) {
            continue;
        }
        let row_cells = cells(*tr);
        if !row_cells.iter().any(|cell| has_name(*cell, "td")) {
            continue;
        }
        // При повторе заголовка остаётся первая ячейка.
        let mut values = BTreeMap::new();
        for (column, cell) in columns.iter().zip(row_cells) {
            values
                .entry(column.clone())
                .or_insert_with(|| collect_text(cell));
        }
        body.push(Row { values });
    }

    StatementTable {
        columns,
        rows: body,
    }
}

/// Все таблицы документа в порядке следования.
pub fn read_tables(doc: &Html) -> Vec<StatementTable> {
    doc.select(&TABLE_SELECTOR).map(read_table).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn tables(html: &str) -> Vec<StatementTable> {
        read_tables(&Html::parse_document(html))
    }

    #[test]
    fn money_strips_currency_and_comma() {
        assert_eq!(
            parse_money("336,20€", "Montant net").unwrap(),
            Decimal::new(33620, 2)
        );
        assert_eq!(
            parse_money("-336,20 €", "Montant net").unwrap(),
            Decimal::new(-33620, 2)
        );
        assert_eq!(
            parse_money("1\u{a0}500,00 €", "Montant net").unwrap(),
            Decimal::new(150_000, 2)
        );
        assert_eq!(parse_money("10", "Qté").unwrap(), Decimal::from(10));
    }

    #[test]
    fn money_plus_only_as_sign() {
        assert_eq!(
            parse_money(" +12,50 €", "Montant net").unwrap(),
            Decimal::new(1250, 2)
        );
        assert!(parse_money("1+2", "Montant net").is_err());
    }

    #[test]
    fn money_rejects_garbage() {
        let err = parse_money("N/A €", "Montant net").unwrap_err();
        assert!(matches!(
            err,
            ImportError::Number { ref value, column: "Montant net" } if value == "N/A €"
        ));
        assert!(parse_money("", "Montant net").is_err());
    }

    #[test]
    fn date_is_day_month_year() {
        assert_eq!(
            parse_date(" 22/08/2022 ").unwrap(),
            NaiveDate::from_ymd_opt(2022, 8, 22).unwrap()
        );
        assert!(parse_date("2022-08-22").is_err());
        assert!(parse_date("31/02/2022").is_err());
    }

    #[test]
    fn reads_thead_header() {
        let parsed = tables(
            "<table><thead><tr><th>A</th><th>B</th></tr></thead>\
             <tbody><tr><td> x  1 </td><td>y</td></tr><tr><td>z</td></tr></tbody></table>",
        );
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].columns, vec!["A", "B"]);
        assert_eq!(parsed[0].rows.len(), 2);
        assert_eq!(parsed[0].rows[0].get("A"), Some("x 1"));
        assert_eq!(parsed[0].rows[1].get("B"), None);
        assert!(matches!(
            parsed[0].rows[1].require("B"),
            Err(ImportError::MissingColumn { column: "B" })
        ));
    }

    #[test]
    fn reads_th_row_header_and_positional_columns() {
        let parsed = tables(
            "<table><tr><th>A</th></tr><tr><td>1</td></tr></table>\
             <table><tr><td>1</td><td>2</td></tr></table>",
        );
        assert_eq!(parsed[0].columns, vec!["A"]);
        assert_eq!(parsed[0].rows[0].get("A"), Some("1"));
        assert_eq!(parsed[1].columns, vec!["0", "1"]);
        assert_eq!(parsed[1].rows[0].get("1"), Some("2"));
    }

    #[test]
    fn nested_tables_are_separate() {
        let parsed = tables(
            "<table><tr><th>Outer</th></tr>\
             <tr><td><table><tr><th>Inner</th></tr><tr><td>i</td></tr></table></td></tr></table>",
        );
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].columns, vec!["Outer"]);
        assert_eq!(parsed[0].rows.len(), 1);
        assert_eq!(parsed[1].columns, vec!["Inner"]);
        assert_eq!(parsed[1].rows[0].get("Inner"), Some("i"));
    }

    #[test]
    fn column_set_is_exact() {
        let parsed = tables("<table><tr><th>A</th><th>B</th></tr></table>");
        let exact: BTreeSet<&str> = ["A", "B"].into_iter().collect();
        let subset: BTreeSet<&str> = ["A"].into_iter().collect();
        let superset: BTreeSet<&str> = ["A", "B", "C"].into_iter().collect();
        assert!(parsed[0].has_columns(&exact));
        assert!(!parsed[0].has_columns(&subset));
        assert!(!parsed[0].has_columns(&superset));
        assert!(parsed[0].has_column("B"));
    }

    #[test]
    fn rejects_duplicate_columns() {
        let parsed = tables("<table><tr><th>A</th><th>B</th><th>B</th></tr></table>");
        let expected: BTreeSet<&str> = ["A", "B"].into_iter().collect();
        assert_eq!(parsed[0].column_set(), expected);
        assert!(!parsed[0].has_columns(&expected));

        let parsed = tables(
            "<table><tr><th>A</th><th>B</th><th>B</th></tr><tr><td>1</td><td>10</td><td>999</td></tr></table>",
        );
        assert_eq!(parsed[0].rows[0].get("B"), Some("10"));
    }
}
