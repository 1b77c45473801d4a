//! CLI: читает выписку (или каталог выписок) и печатает транзакции beancount.

use std::env;
use std::path::Path;

use beancount_bourse_direct::{BourseDirectImporter, ImportBatch, Importer, Source};
use tracing_subscriber::EnvFilter;

const USAGE: &str =
    "Usage: beancount-bourse-direct <statement.html|dir> <account> [LABEL=TICKER ...]";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut args = env::args().skip(1);
    let (Some(path), Some(account)) = (args.next(), args.next()) else {
        println!("{USAGE}");
        return Ok(());
    };

    let mut builder = BourseDirectImporter::builder(account);
    for pair in args {
        let Some((label, ticker)) = pair.split_once('=') else {
            return Err(format!("expected LABEL=TICKER, got '{pair}'").into());
        };
        builder = builder.label(label, ticker);
    }
    let importer = builder.build();

    let path = Path::new(&path);
    let batch = if path.is_dir() {
        ImportBatch::from_dir(path, &importer)?
    } else {
        ImportBatch::from_file(path, &importer, Vec::new())?
    };

    for file in &batch.files {
        eprintln!(
            "{}: {} транзакций, дата {}, счёт {}",
            file.path.display(),
            file.transactions,
            file.date.map_or_else(|| "-".to_string(), |d| d.to_string()),
            importer.file_account(&Source::Path(&file.path)),
        );
    }
    for entry in &batch.entries {
        println!("{entry}\n");
    }
    Ok(())
}
