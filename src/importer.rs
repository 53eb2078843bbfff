use crate::normalize::normalize_text;
use crate::store::{CompanyStub, Store};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Expected CSV columns. Header names must match exactly.
#[derive(Debug, Deserialize)]
struct CsvRow {
    cnpj: String,
    razao_social: String,
    municipio: String,
    uf: String,
}

/// Outcome of one import run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ImportReport {
    /// Data rows encountered, well-formed or not.
    pub read: usize,
    /// Rows that actually landed (duplicates don't count).
    pub inserted: usize,
    /// Malformed rows that were logged and passed over.
    pub skipped: usize,
}

/// Load a company CSV into the store.
///
/// Idempotent: duplicate CNPJs are ignored, so re-running on the same file
/// inserts nothing new. A malformed row is reported and skipped; it never
/// aborts the rest of the import. City names are normalized here with the
/// same fold the `/cidade` lookup applies, so the two always agree.
pub async fn import_csv(store: &Store, path: impl AsRef<Path>) -> Result<ImportReport> {
    let mut reader = csv::Reader::from_path(path.as_ref())
        .with_context(|| format!("Failed to open CSV at {:?}", path.as_ref()))?;

    let mut report = ImportReport::default();

    for row in reader.deserialize::<CsvRow>() {
        report.read += 1;

        let row = match row {
            Ok(r) => r,
            Err(e) => {
                eprintln!("Warning: skipping malformed row {}: {}", report.read, e);
                report.skipped += 1;
                continue;
            }
        };

        let cnpj = row.cnpj.trim();
        if cnpj.is_empty() {
            eprintln!("Warning: skipping row {} with empty cnpj", report.read);
            report.skipped += 1;
            continue;
        }

        let stub = CompanyStub {
            cnpj: cnpj.to_string(),
            razao_social: row.razao_social.trim().to_string(),
            municipio: normalize_text(row.municipio.trim()),
            uf: row.uf.trim().to_string(),
        };

        if store.insert_company(&stub).await? {
            report.inserted += 1;
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    async fn setup(name: &str, csv_body: &str) -> (Store, String, String) {
        let db = format!("{name}.db");
        let csv = format!("{name}.csv");
        let _ = fs::remove_file(&db);
        fs::write(&csv, csv_body).unwrap();
        let store = Store::open(&db).await.unwrap();
        (store, db, csv)
    }

    fn teardown(db: &str, csv: &str) {
        let _ = fs::remove_file(db);
        let _ = fs::remove_file(csv);
    }

    #[tokio::test]
    async fn test_import_counts_and_normalizes() {
        let body = "cnpj,razao_social,municipio,uf\n\
                    111,EMPRESA UM,São Paulo,SP\n\
                    222,EMPRESA DOIS,SANTO ANDRÉ,SP\n";
        let (store, db, csv) = setup("test_import_basic", body).await;

        let report = import_csv(&store, &csv).await.unwrap();
        assert_eq!(report, ImportReport { read: 2, inserted: 2, skipped: 0 });

        // City stored under its normalized key
        let popped = store.pop_stubs_for_city("sao paulo", 10).await.unwrap();
        assert_eq!(popped.len(), 1);
        assert_eq!(popped[0].razao_social, "EMPRESA UM");

        teardown(&db, &csv);
    }

    #[tokio::test]
    async fn test_import_is_idempotent() {
        let body = "cnpj,razao_social,municipio,uf\n\
                    111,EMPRESA UM,Santos,SP\n\
                    222,EMPRESA DOIS,Santos,SP\n";
        let (store, db, csv) = setup("test_import_idem", body).await;

        let first = import_csv(&store, &csv).await.unwrap();
        assert_eq!(first.inserted, 2);

        let second = import_csv(&store, &csv).await.unwrap();
        assert_eq!(second.read, 2);
        assert_eq!(second.inserted, 0);
        assert_eq!(store.company_count().await.unwrap(), 2);

        teardown(&db, &csv);
    }

    #[tokio::test]
    async fn test_import_skips_malformed_rows() {
        // Second data row is missing two columns
        let body = "cnpj,razao_social,municipio,uf\n\
                    111,EMPRESA UM,Santos,SP\n\
                    222,EMPRESA DOIS\n\
                    333,EMPRESA TRES,Santos,SP\n";
        let (store, db, csv) = setup("test_import_malformed", body).await;

        let report = import_csv(&store, &csv).await.unwrap();
        assert_eq!(report.read, 3);
        assert_eq!(report.inserted, 2);
        assert_eq!(report.skipped, 1);

        teardown(&db, &csv);
    }

    #[tokio::test]
    async fn test_import_skips_empty_cnpj() {
        let body = "cnpj,razao_social,municipio,uf\n\
                    ,SEM CHAVE,Santos,SP\n\
                    111,EMPRESA UM,Santos,SP\n";
        let (store, db, csv) = setup("test_import_empty_key", body).await;

        let report = import_csv(&store, &csv).await.unwrap();
        assert_eq!(report, ImportReport { read: 2, inserted: 1, skipped: 1 });

        teardown(&db, &csv);
    }

    #[tokio::test]
    async fn test_import_missing_file_errors() {
        let db = "test_import_nofile.db";
        let _ = fs::remove_file(db);
        let store = Store::open(db).await.unwrap();
        assert!(import_csv(&store, "does_not_exist.csv").await.is_err());
        let _ = fs::remove_file(db);
    }
}
