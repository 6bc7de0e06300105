use crate::model::{Metrics, StorageError, StoredMetrics};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};

pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens the database and creates the metrics history table
    pub fn new(db_path: &str) -> Result<Self, StorageError> {
        let conn = Connection::open(db_path)?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS product_metrics (
                product TEXT NOT NULL,
                scope TEXT NOT NULL,
                average_price REAL NOT NULL,
                average_margin_pct REAL NOT NULL,
                total_units REAL NOT NULL,
                last_updated TEXT NOT NULL,
                PRIMARY KEY (product, scope)
            );
            "
        )?;

        Ok(Self { conn })
    }

    /// Metrics stored by the previous run of `scope`, if any
    pub fn get_metrics(&self, product: &str, scope: &str) -> Result<Option<StoredMetrics>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT product, scope, average_price, average_margin_pct, total_units, last_updated
             FROM product_metrics WHERE product = ?1 AND scope = ?2",
        )?;

        let mut rows = stmt.query(params![product, scope])?;
        if let Some(row) = rows.next()? {
            Ok(Some(Self::map_metrics(row)?))
        } else {
            Ok(None)
        }
    }

    /// Inserts or replaces the metrics of a product
    pub fn update_metrics(&self, product: &str, scope: &str, metrics: &Metrics) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO product_metrics
                (product, scope, average_price, average_margin_pct, total_units, last_updated)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                product,
                scope,
                &metrics.average_price,
                &metrics.average_margin_pct,
                &metrics.total_units,
                &Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// All stored metrics of `scope`, ordered by product
    pub fn list_metrics(&self, scope: &str) -> Result<Vec<StoredMetrics>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT product, scope, average_price, average_margin_pct, total_units, last_updated
             FROM product_metrics WHERE scope = ?1 ORDER BY product ASC",
        )?;

        let mut rows = stmt.query(params![scope])?;
        let mut result = Vec::new();
        while let Some(row) = rows.next()? {
            result.push(Self::map_metrics(row)?);
        }

        Ok(result)
    }

    fn map_metrics(row: &Row) -> Result<StoredMetrics, StorageError> {
        let last_updated_str: String = row.get(5)?;
        let last_updated: DateTime<Utc> = last_updated_str
            .parse()
            .map_err(|e: chrono::ParseError| StorageError::InvalidTimestamp(format!("{}: {}", last_updated_str, e)))?;

        Ok(StoredMetrics {
            product: row.get(0)?,
            scope: row.get(1)?,
            metrics: Metrics {
                average_price: row.get(2)?,
                average_margin_pct: row.get(3)?,
                total_units: row.get(4)?,
            },
            last_updated,
        })
    }
}
