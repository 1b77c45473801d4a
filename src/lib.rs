#![warn(missing_docs)]
//! Импортёр HTML-выписок брокера Bourse Direct в транзакции beancount.

mod batch;
mod bourse_direct;
mod error;
mod importer;
mod labels;
mod raw;
mod table;
mod types;

pub use crate::batch::{ImportBatch, ImportedFile};
pub use crate::bourse_direct::{
    BourseDirectImporter, BourseDirectImporterBuilder, CASH_CURRENCY, COMMISSION_ACCOUNT,
    EXPECTED_COLUMNS,
};
pub use crate::error::ImportError;
pub use crate::importer::Importer;
pub use crate::labels::LabelLookup;
pub use crate::raw::{DomStatement, RawStatement, Source};
pub use crate::table::{Row, StatementTable, parse_date, parse_money};
pub use crate::types::*;
