use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;

/// One pre-loaded company row, waiting to be consumed by a city lookup.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct CompanyStub {
    pub cnpj: String,
    pub razao_social: String,
    pub municipio: String,
    pub uf: String,
}

/// File-backed SQLite store holding the authorized-user table and the
/// pool of company stubs consumed by `/cidade`.
///
/// Cloning shares the underlying pool, so one `Store` can be handed to the
/// dispatcher and the importer alike.
#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Open (creating if missing) the database at `path` and make sure the
    /// schema exists. Safe to call on every startup.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path.as_ref())
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to open database at {:?}", path.as_ref()))?;

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS empresas (
                cnpj TEXT PRIMARY KEY,
                razao_social TEXT NOT NULL,
                municipio TEXT NOT NULL,
                uf TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await
        .context("Failed to create empresas table")?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS usuarios (
                user_id INTEGER PRIMARY KEY
            )",
        )
        .execute(&self.pool)
        .await
        .context("Failed to create usuarios table")?;

        Ok(())
    }

    /// Presence in the `usuarios` table is the whole permission model.
    pub async fn is_authorized(&self, user_id: i64) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM usuarios WHERE user_id = ?1)")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await
                .context("Failed to check authorization")?;
        Ok(exists)
    }

    /// Idempotent: authorizing an already-authorized user is a no-op.
    pub async fn authorize(&self, user_id: i64) -> Result<()> {
        sqlx::query("INSERT OR IGNORE INTO usuarios (user_id) VALUES (?1)")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .context("Failed to authorize user")?;
        Ok(())
    }

    /// Insert one stub, ignoring duplicates. Returns whether a row actually
    /// landed, so the importer can tally read vs. inserted.
    pub async fn insert_company(&self, stub: &CompanyStub) -> Result<bool> {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO empresas (cnpj, razao_social, municipio, uf)
             VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&stub.cnpj)
        .bind(&stub.razao_social)
        .bind(&stub.municipio)
        .bind(&stub.uf)
        .execute(&self.pool)
        .await
        .with_context(|| format!("Failed to insert company {}", stub.cnpj))?;

        Ok(result.rows_affected() > 0)
    }

    /// Take up to `limit` stubs for a (normalized) city and remove them.
    ///
    /// Select and delete happen in one DELETE ... RETURNING statement, so a
    /// stub handed to one caller can never be seen by another: concurrent
    /// pops for the same city return disjoint sets.
    pub async fn pop_stubs_for_city(&self, city: &str, limit: u32) -> Result<Vec<CompanyStub>> {
        let stubs = sqlx::query_as::<_, CompanyStub>(
            "DELETE FROM empresas
             WHERE cnpj IN (
                 SELECT cnpj FROM empresas WHERE municipio = ?1 LIMIT ?2
             )
             RETURNING cnpj, razao_social, municipio, uf",
        )
        .bind(city)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("Failed to pop stubs for city '{city}'"))?;

        Ok(stubs)
    }

    pub async fn company_count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM empresas")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count companies")?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    async fn open_test_store(name: &str) -> Store {
        let _ = fs::remove_file(name);
        Store::open(name).await.unwrap()
    }

    fn stub(cnpj: &str, city: &str) -> CompanyStub {
        CompanyStub {
            cnpj: cnpj.to_string(),
            razao_social: format!("EMPRESA {cnpj} LTDA"),
            municipio: city.to_string(),
            uf: "SP".to_string(),
        }
    }

    #[tokio::test]
    async fn test_open_is_idempotent() {
        let db = "test_store_reopen.db";
        let _ = fs::remove_file(db);
        {
            let store = Store::open(db).await.unwrap();
            store.insert_company(&stub("1", "sao paulo")).await.unwrap();
        }
        // Reopening must not clobber existing rows
        let store = Store::open(db).await.unwrap();
        assert_eq!(store.company_count().await.unwrap(), 1);
        let _ = fs::remove_file(db);
    }

    #[tokio::test]
    async fn test_authorization_roundtrip() {
        let store = open_test_store("test_store_auth.db").await;

        assert!(!store.is_authorized(42).await.unwrap());
        store.authorize(42).await.unwrap();
        assert!(store.is_authorized(42).await.unwrap());
        assert!(!store.is_authorized(43).await.unwrap());

        // Idempotent insert
        store.authorize(42).await.unwrap();
        assert!(store.is_authorized(42).await.unwrap());

        let _ = fs::remove_file("test_store_auth.db");
    }

    #[tokio::test]
    async fn test_insert_company_ignores_duplicates() {
        let store = open_test_store("test_store_dup.db").await;

        assert!(store.insert_company(&stub("111", "santos")).await.unwrap());
        assert!(!store.insert_company(&stub("111", "santos")).await.unwrap());
        assert_eq!(store.company_count().await.unwrap(), 1);

        let _ = fs::remove_file("test_store_dup.db");
    }

    #[tokio::test]
    async fn test_pop_respects_limit_and_deletes() {
        let store = open_test_store("test_store_pop.db").await;

        for i in 0..5 {
            store.insert_company(&stub(&i.to_string(), "campinas")).await.unwrap();
        }

        let first = store.pop_stubs_for_city("campinas", 3).await.unwrap();
        assert_eq!(first.len(), 3);
        assert_eq!(store.company_count().await.unwrap(), 2);

        let second = store.pop_stubs_for_city("campinas", 3).await.unwrap();
        assert_eq!(second.len(), 2);

        // No overlap between the two pops
        for s in &second {
            assert!(!first.contains(s));
        }

        let third = store.pop_stubs_for_city("campinas", 3).await.unwrap();
        assert!(third.is_empty());

        let _ = fs::remove_file("test_store_pop.db");
    }

    #[tokio::test]
    async fn test_pop_only_touches_requested_city() {
        let store = open_test_store("test_store_city.db").await;

        store.insert_company(&stub("1", "santos")).await.unwrap();
        store.insert_company(&stub("2", "sao paulo")).await.unwrap();

        let popped = store.pop_stubs_for_city("santos", 10).await.unwrap();
        assert_eq!(popped.len(), 1);
        assert_eq!(popped[0].municipio, "santos");
        assert_eq!(store.company_count().await.unwrap(), 1);

        let _ = fs::remove_file("test_store_city.db");
    }

    #[tokio::test]
    async fn test_pop_unknown_city_is_empty() {
        let store = open_test_store("test_store_empty.db").await;
        assert!(store.pop_stubs_for_city("nowhere", 10).await.unwrap().is_empty());
        let _ = fs::remove_file("test_store_empty.db");
    }
}
