//! Модель данных леджера: суммы, проводки и транзакции.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::BTreeSet;
use std::fmt;

/// Денежное значение, используем `Decimal` для точных расчётов.
pub type Money = Decimal;

/// Количество в единицах валюты или бумаги.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Amount {
    /// Число.
    pub number: Money,
    /// Валюта или тикер.
    pub currency: String,
}

impl Amount {
    /// Создаёт сумму в указанной валюте.
    #[inline]
    pub fn new(number: Money, currency: impl Into<String>) -> Self {
        Self {
            number,
            currency: currency.into(),
        }
    }
}

/// Строка транзакции: счёт и необязательная сумма.
///
/// Цена и стоимость лота не заполняются: покупка записывается двумя
/// простыми проводками по одному счёту.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Posting {
    /// Счёт леджера.
    pub account: String,
    /// Сумма; `None` оставляет балансировку движку леджера.
    pub units: Option<Amount>,
}

impl Posting {
    /// Проводка с суммой.
    #[inline]
    pub fn new(account: impl Into<String>, units: Amount) -> Self {
        Self {
            account: account.into(),
            units: Some(units),
        }
    }

    /// Проводка без суммы.
    #[inline]
    pub fn auto(account: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            units: None,
        }
    }
}

/// Флаг транзакции.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Flag {
    /// Подтверждённая запись (`*`).
    #[default]
    Okay,
    /// Запись, требующая внимания (`!`).
    Warning,
}

impl Flag {
    /// Символ флага в синтаксисе beancount.
    pub const fn symbol(self) -> char {
        match self {
            Self::Okay => '*',
            Self::Warning => '!',
        }
    }
}

/// Откуда взята транзакция.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Meta {
    /// Имя исходного файла.
    pub filename: String,
    /// Номер строки таблицы, с нуля.
    pub lineno: usize,
}

/// Транзакция леджера.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    /// Источник записи.
    pub meta: Meta,
    /// Дата.
    pub date: NaiveDate,
    /// Флаг.
    pub flag: Flag,
    /// Контрагент.
    pub payee: String,
    /// Описание.
    pub narration: String,
    /// Теги.
    pub tags: BTreeSet<String>,
    /// Ссылки.
    pub links: BTreeSet<String>,
    /// Проводки.
    pub postings: Vec<Posting>,
}

fn write_quoted(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    write!(f, "\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.number, self.currency)
    }
}

impl fmt::Display for Posting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.units {
            Some(units) => write!(f, "  {}  {units}", self.account),
            None => write!(f, "  {}", self.account),
        }
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ", self.date.format("%Y-%m-%d"), self.flag.symbol())?;
        write_quoted(f, &self.payee)?;
        f.write_str(" ")?;
        write_quoted(f, &self.narration)?;
        for tag in &self.tags {
            write!(f, " #{tag}")?;
        }
        for link in &self.links {
            write!(f, " ^{link}")?;
        }
        for posting in &self.postings {
            write!(f, "\n{posting}")?;
        }
        Ok(())
    }
}
