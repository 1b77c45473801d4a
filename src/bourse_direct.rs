//! Импортёр выписок Bourse Direct (HTML-страница с таблицей операций).

use crate::error::ImportError;
use crate::importer::Importer;
use crate::labels::LabelLookup;
use crate::raw::{DomStatement, RawStatement, Source};
use crate::table::{Row, StatementTable, parse_date, parse_money};
use crate::types::{Amount, Flag, Meta, Posting, Transaction};
use chrono::NaiveDate;
use std::collections::BTreeSet;
use tracing::{debug, warn};

const COL_PRICE: &str = "Cours";
const COL_SETTLEMENT_DATE: &str = "Date affectation";
const COL_TRADE_DATE: &str = "Date opération";
const COL_LABEL: &str = "Libellé";
const COL_NET_AMOUNT: &str = "Montant net";
const COL_OPERATION: &str = "Opération";
const COL_QUANTITY: &str = "Qté";

/// Столбцы таблицы операций, набор должен совпасть целиком.
pub const EXPECTED_COLUMNS: [&str; 7] = [
    COL_PRICE,
    COL_SETTLEMENT_DATE,
    COL_TRADE_DATE,
    COL_LABEL,
    COL_NET_AMOUNT,
    COL_OPERATION,
    COL_QUANTITY,
];

/// Счёт комиссий, проводка по нему остаётся без суммы.
pub const COMMISSION_ACCOUNT: &str = "Expenses:Finances:Commission";

/// Валюта денежной части счёта.
pub const CASH_CURRENCY: &str = "EUR";

const FILE_NAME: &str = "BourseDirect.html";

/// Импортёр выписок Bourse Direct.
#[derive(Debug, Clone)]
pub struct BourseDirectImporter {
    account: String,
    labels: Option<LabelLookup>,
}

impl BourseDirectImporter {
    /// Создаёт импортёр для счёта леджера (например, `Assets:FR:BD:PEA`).
    #[inline]
    pub fn new(account: impl Into<String>, labels: Option<LabelLookup>) -> Self {
        Self {
            account: account.into(),
            labels,
        }
    }

    /// Builder с пошаговым заполнением таблицы тикеров.
    ///
    /// # Пример
    ///
    /// ```
    /// # use beancount_bourse_direct::BourseDirectImporter;
    /// let importer = BourseDirectImporter::builder("Assets:FR:BD:PEA")
    ///     .label("AM.E.P.SP500", "PE500")
    ///     .build();
    /// assert_eq!(importer.account(), "Assets:FR:BD:PEA");
    /// ```
    #[inline]
    pub fn builder(account: impl Into<String>) -> BourseDirectImporterBuilder {
        BourseDirectImporterBuilder {
            account: account.into(),
            labels: Vec::new(),
        }
    }

    /// Счёт леджера.
    #[inline]
    pub fn account(&self) -> &str {
        &self.account
    }

    /// Таблица тикеров, если задана.
    #[inline]
    pub const fn labels(&self) -> Option<&LabelLookup> {
        self.labels.as_ref()
    }

    fn expected_columns() -> BTreeSet<&'static str> {
        EXPECTED_COLUMNS.into_iter().collect()
    }

    /// Заново читает источник и разбирает все его таблицы.
    fn read_tables(source: &Source) -> Result<Vec<StatementTable>, ImportError> {
        let raw = RawStatement::from_source(source)?;
        Ok(DomStatement::parse(&raw).tables())
    }

    /// Первая таблица с точным набором ожидаемых столбцов.
    fn statement_table(tables: &[StatementTable]) -> Option<&StatementTable> {
        let expected = Self::expected_columns();
        tables.iter().find(|table| table.has_columns(&expected))
    }

    fn currency_for<'a>(&'a self, label: &'a str) -> &'a str {
        let ticker = self.labels.as_ref().and_then(|labels| labels.get(label));
        if ticker.is_none() && label != CASH_CURRENCY {
            warn!(label, "no ticker for label, beancount will reject it as a currency");
        }
        ticker.unwrap_or(label)
    }

    /// Строит транзакцию по одной строке таблицы.
    fn transaction(
        &self,
        row: &Row,
        filename: &str,
        lineno: usize,
    ) -> Result<Transaction, ImportError> {
        let date = parse_date(row.require(COL_SETTLEMENT_DATE)?)?;
        let operation = row.require(COL_OPERATION)?;
        let quantity_raw = row.require(COL_QUANTITY)?;
        let label = row.require(COL_LABEL)?;

        // Движение денег: вместо бумаги в выписке стоит сама валюта.
        let payee = if label == CASH_CURRENCY {
            operation.to_string()
        } else {
            format!("{operation}: {quantity_raw}x {label}")
        };

        let net_amount = parse_money(row.require(COL_NET_AMOUNT)?, COL_NET_AMOUNT)?;
        let quantity = parse_money(quantity_raw, COL_QUANTITY)?;

        let postings = vec![
            Posting::new(&self.account, Amount::new(net_amount, CASH_CURRENCY)),
            Posting::new(
                &self.account,
                Amount::new(quantity, self.currency_for(label)),
            ),
            Posting::auto(COMMISSION_ACCOUNT),
        ];

        Ok(Transaction {
            meta: Meta {
                filename: filename.to_string(),
                lineno,
            },
            date,
            flag: Flag::Okay,
            payee,
            narration: String::new(),
            tags: BTreeSet::new(),
            links: BTreeSet::new(),
            postings,
        })
    }
}

impl Importer for BourseDirectImporter {
    fn name(&self) -> String {
        "Bourse Direct: BourseDirectImporter".to_string()
    }

    fn file_account(&self, _source: &Source) -> &str {
        &self.account
    }

    fn file_date(&self, source: &Source) -> Result<Option<NaiveDate>, ImportError> {
        if !self.identify(source) {
            return Ok(None);
        }

        let tables = Self::read_tables(source)?;
        let Some(table) = Self::statement_table(&tables) else {
            return Ok(None);
        };

        let mut latest: Option<NaiveDate> = None;
        for (lineno, row) in table.rows.iter().enumerate() {
            let Some(value) = row.get(COL_SETTLEMENT_DATE) else {
                continue;
            };
            match parse_date(value) {
                Ok(date) => latest = latest.max(Some(date)),
                Err(err) => debug!(lineno, %err, "skipping row without settlement date"),
            }
        }
        Ok(latest)
    }

    fn file_name(&self, _source: &Source) -> &'static str {
        FILE_NAME
    }

    fn identify(&self, source: &Source) -> bool {
        match Self::read_tables(source) {
            Ok(tables) => {
                let found = Self::statement_table(&tables).is_some();
                if !found {
                    debug!(source = %source.name(), tables = tables.len(), "no operations table");
                }
                found
            }
            Err(err) => {
                debug!(source = %source.name(), %err, "cannot read statement");
                false
            }
        }
    }

    fn extract(
        &self,
        source: &Source,
        existing: Option<&[Transaction]>,
    ) -> Result<Vec<Transaction>, ImportError> {
        let mut entries = existing.map_or_else(Vec::new, <[Transaction]>::to_vec);

        let tables = Self::read_tables(source)?;
        let table = Self::statement_table(&tables).ok_or(ImportError::TableNotFound)?;

        let filename = source.name();
        for (lineno, row) in table.rows.iter().enumerate() {
            entries.push(self.transaction(row, &filename, lineno)?);
        }

        debug!(
            source = %filename,
            extracted = table.rows.len(),
            total = entries.len(),
            "extracted statement"
        );
        Ok(entries)
    }
}

/// Builder для `BourseDirectImporter`.
#[derive(Debug, Clone)]
pub struct BourseDirectImporterBuilder {
    account: String,
    labels: Vec<(String, String)>,
}

impl BourseDirectImporterBuilder {
    /// Добавляет соответствие названия бумаги тикеру.
    #[inline]
    pub fn label(mut self, label: impl Into<String>, ticker: impl Into<String>) -> Self {
        self.labels.push((label.into(), ticker.into()));
        self
    }

    /// Добавляет сразу несколько соответствий.
    pub fn labels<I, K, V>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.labels
            .extend(labels.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Создаёт импортёр. Без единого соответствия таблица тикеров не задаётся.
    pub fn build(self) -> BourseDirectImporter {
        let labels = if self.labels.is_empty() {
            None
        } else {
            Some(self.labels.into_iter().collect())
        };
        BourseDirectImporter::new(self.account, labels)
    }
}
