use sqlx::PgPool;
use thiserror::Error;
use tracing::{error, info};

/// Postgres "undefined table" SQLSTATE.
const UNDEFINED_TABLE: &str = "42P01";

// Stores migrated from the legacy layout only gained the payload columns,
// so the search column must be added separately before it can be indexed.
const BASE_SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS reports (
        id bigserial PRIMARY KEY,
        body jsonb NOT NULL DEFAULT '{}'::jsonb,
        dump bytea NOT NULL,
        open boolean NOT NULL DEFAULT TRUE,
        closed_at timestamptz,
        created_at timestamptz NOT NULL DEFAULT now(),
        updated_at timestamptz NOT NULL DEFAULT now(),
        search tsvector GENERATED ALWAYS AS (to_tsvector('english', body)) STORED
    );
    ALTER TABLE reports ADD COLUMN IF NOT EXISTS search tsvector
        GENERATED ALWAYS AS (to_tsvector('english', body)) STORED;
    CREATE INDEX IF NOT EXISTS reports_search_idx ON reports USING GIN (search);
"#;

#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("failed to read legacy dump table: {0}")]
    LegacyRead(sqlx::Error),

    #[error("failed to migrate legacy dumps: {0}")]
    Migration(sqlx::Error),

    #[error("failed to create base schema: {0}")]
    Create(sqlx::Error),
}

#[derive(sqlx::FromRow)]
struct LegacyDump {
    report_id: i64,
    file: Vec<u8>,
}

/// Bring the store to the current schema version. Idempotent; must run to
/// completion before the server accepts requests.
///
/// Legacy stores kept dumps in a separate `dumps` table. Those rows are
/// folded into `reports.dump` and the table is dropped. A failure inside
/// that fold is logged and swallowed so existing deployments still start;
/// the `dumps` table survives the failed run, so the next start retries.
/// Failure to apply the base schema is fatal.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), SchemaError> {
    if let Some(dumps) = fetch_legacy_dumps(pool).await? {
        info!("migrating {} legacy dump rows into reports", dumps.len());
        if let Err(err) = migrate_legacy_dumps(pool, dumps).await {
            error!("legacy dump migration failed, continuing startup: {err}");
        }
    }

    sqlx::raw_sql(BASE_SCHEMA)
        .execute(pool)
        .await
        .map_err(SchemaError::Create)
        .map(|_| ())
}

/// Probe the legacy `dumps` table. `None` means the table does not exist
/// (fresh install or already migrated); any error other than "undefined
/// table" propagates.
async fn fetch_legacy_dumps(pool: &PgPool) -> Result<Option<Vec<LegacyDump>>, SchemaError> {
    match sqlx::query_as::<_, LegacyDump>("SELECT report_id, file FROM dumps")
        .fetch_all(pool)
        .await
    {
        Ok(rows) => Ok(Some(rows)),
        Err(err) => {
            let undefined_table = err
                .as_database_error()
                .and_then(|db| db.code())
                .is_some_and(|code| code == UNDEFINED_TABLE);
            if undefined_table {
                Ok(None)
            } else {
                Err(SchemaError::LegacyRead(err))
            }
        }
    }
}

async fn migrate_legacy_dumps(pool: &PgPool, dumps: Vec<LegacyDump>) -> Result<(), SchemaError> {
    sqlx::raw_sql(
        r#"
            ALTER TABLE reports ADD COLUMN IF NOT EXISTS dump bytea;
            ALTER TABLE reports ADD COLUMN IF NOT EXISTS open boolean DEFAULT TRUE;
            ALTER TABLE reports ADD COLUMN IF NOT EXISTS closed_at timestamptz;
            ALTER TABLE reports ADD COLUMN IF NOT EXISTS updated_at timestamptz DEFAULT now();
        "#,
    )
    .execute(pool)
    .await
    .map_err(SchemaError::Migration)?;

    for dump in dumps {
        sqlx::query("UPDATE reports SET dump = $1 WHERE id = $2")
            .bind(dump.file)
            .bind(dump.report_id)
            .execute(pool)
            .await
            .map_err(SchemaError::Migration)?;
    }

    sqlx::raw_sql(
        r#"
            ALTER TABLE reports ALTER COLUMN dump SET NOT NULL;
            DROP TABLE dumps;
        "#,
    )
    .execute(pool)
    .await
    .map_err(SchemaError::Migration)
    .map(|_| ())
}
