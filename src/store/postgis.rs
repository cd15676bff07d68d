use super::PointStore;
use crate::error::{IngestError, Result};
use crate::models::ConflatedPoint;
use crate::settings::is_plain_identifier;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Json;
use tracing::info;

/// Writes points into a PostGIS table, one `INSERT` per record.
pub struct PostgisStore {
    pool: PgPool,
    table: String,
    insert_sql: String,
}

impl PostgisStore {
    pub async fn connect(url: &str, table: &str) -> Result<Self> {
        let pool = PgPoolOptions::new().max_connections(1).connect(url).await?;
        Self::with_pool(pool, table)
    }

    pub fn with_pool(pool: PgPool, table: &str) -> Result<Self> {
        if !is_plain_identifier(table) {
            return Err(IngestError::Config(format!(
                "table must be a plain SQL identifier, got '{}'",
                table
            )));
        }

        Ok(Self {
            pool,
            table: table.to_string(),
            insert_sql: insert_statement(table),
        })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Create the PostGIS extension and the point table if they are missing
    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::query("CREATE EXTENSION IF NOT EXISTS postgis")
            .execute(&self.pool)
            .await?;
        sqlx::query(&create_table_statement(&self.table))
            .execute(&self.pool)
            .await?;
        info!(table = %self.table, "point table ready");
        Ok(())
    }

    pub async fn close(self) {
        self.pool.close().await;
    }
}

impl PointStore for PostgisStore {
    async fn insert(&mut self, point: &ConflatedPoint) -> Result<()> {
        sqlx::query(&self.insert_sql)
            .bind(&point.name)
            .bind(point.lat)
            .bind(point.lon)
            .bind(&point.midb_cat)
            .bind(&point.source)
            .bind(point.date_update)
            .bind(Json(&point.extra_features))
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

fn insert_statement(table: &str) -> String {
    format!(
        "INSERT INTO {} (name, lat, lon, geometry, midb_cat, source, date_update, extra_features) \
         VALUES ($1, $2, $3, ST_SetSRID(ST_MakePoint($3, $2), 4326), $4, $5, $6, $7)",
        table
    )
}

fn create_table_statement(table: &str) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {} (\
            id BIGSERIAL PRIMARY KEY, \
            name TEXT NOT NULL, \
            lat DOUBLE PRECISION NOT NULL, \
            lon DOUBLE PRECISION NOT NULL, \
            geometry geometry(Point, 4326) NOT NULL, \
            midb_cat TEXT NOT NULL, \
            source TEXT NOT NULL, \
            date_update TIMESTAMPTZ NOT NULL, \
            extra_features JSONB NOT NULL\
        )",
        table
    )
}
