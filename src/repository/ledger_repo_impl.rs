// ==========================================
// 经销商销售台账系统 - SQLite 台账存储实现
// ==========================================
// 职责: CatalogRepository + SalesLedgerStore 的 rusqlite 实现
// 红线: Repository 不含业务规则，只做数据读写
// ==========================================

use crate::db::{init_schema, open_sqlite_connection};
use crate::domain::sales::{
    CanonicalDealer, CanonicalProduct, ImportReport, ImportRunRecord, SalesLedgerRow,
};
use crate::repository::catalog_repo::CatalogRepository;
use crate::repository::error::{RepoResult, RepositoryError};
use crate::repository::ledger_repo::SalesLedgerStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Transaction};
use std::sync::{Arc, Mutex};

const INSERT_LEDGER_ROW_SQL: &str = r#"
INSERT INTO sales_ledger (
    dealer_id, product_id, transaction_type, transaction_date,
    reference_number, product_name, product_code, quantity, unit_price,
    amount, discount_amount, tax_amount, payment_status,
    payment_date, due_date, notes, created_at
) VALUES (
    ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17
)
"#;

// ==========================================
// SqliteLedgerStore
// ==========================================
pub struct SqliteLedgerStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteLedgerStore {
    /// 打开（必要时建表）台账数据库
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepoResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        init_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock_conn(&self) -> RepoResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 事务内插入单行
    fn insert_row_tx(tx: &Transaction, row: &SalesLedgerRow) -> RepoResult<()> {
        tx.execute(
            INSERT_LEDGER_ROW_SQL,
            params![
                row.dealer_id,
                row.product_id,
                row.transaction_type,
                row.transaction_date,
                row.reference_number,
                row.product_name,
                row.product_code,
                row.quantity,
                row.unit_price,
                row.amount,
                row.discount_amount,
                row.tax_amount,
                row.payment_status,
                row.payment_date,
                row.due_date,
                row.notes,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }
}

#[async_trait]
impl CatalogRepository for SqliteLedgerStore {
    async fn list_dealers(&self) -> RepoResult<Vec<CanonicalDealer>> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare("SELECT id, code, name FROM dealer_master ORDER BY rowid")?;
        let dealers = stmt
            .query_map([], |row| {
                Ok(CanonicalDealer {
                    id: row.get(0)?,
                    code: row.get(1)?,
                    name: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(dealers)
    }

    async fn list_products(&self) -> RepoResult<Vec<CanonicalProduct>> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare("SELECT id, code, name FROM product_master ORDER BY rowid")?;
        let products = stmt
            .query_map([], |row| {
                Ok(CanonicalProduct {
                    id: row.get(0)?,
                    code: row.get(1)?,
                    name: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(products)
    }
}

#[async_trait]
impl SalesLedgerStore for SqliteLedgerStore {
    /// 整批插入（单事务，任一行失败整批回滚）
    async fn insert_batch(&self, rows: &[SalesLedgerRow]) -> RepoResult<()> {
        let mut conn = self.lock_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        for row in rows {
            Self::insert_row_tx(&tx, row)?;
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(())
    }

    async fn insert_one(&self, row: &SalesLedgerRow) -> RepoResult<()> {
        let conn = self.lock_conn()?;
        conn.execute(
            INSERT_LEDGER_ROW_SQL,
            params![
                row.dealer_id,
                row.product_id,
                row.transaction_type,
                row.transaction_date,
                row.reference_number,
                row.product_name,
                row.product_code,
                row.quantity,
                row.unit_price,
                row.amount,
                row.discount_amount,
                row.tax_amount,
                row.payment_status,
                row.payment_date,
                row.due_date,
                row.notes,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    async fn record_run(
        &self,
        report: &ImportReport,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
    ) -> RepoResult<()> {
        let report_json = serde_json::to_string(report)
            .map_err(|e| RepositoryError::InternalError(e.to_string()))?;

        let conn = self.lock_conn()?;
        conn.execute(
            r#"
            INSERT OR REPLACE INTO import_run (
                run_id, file_name, total_rows, successful, failed,
                started_at, finished_at, report_json
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                report.run_id,
                report.file_name,
                report.total_rows as i64,
                report.stats.successful as i64,
                report.stats.failed as i64,
                started_at.to_rfc3339(),
                finished_at.to_rfc3339(),
                report_json,
            ],
        )?;
        Ok(())
    }

    async fn recent_runs(&self, limit: usize) -> RepoResult<Vec<ImportRunRecord>> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare(
            "SELECT run_id, file_name, total_rows, successful, failed, started_at, finished_at \
             FROM import_run ORDER BY finished_at DESC LIMIT ?1",
        )?;
        let runs = stmt
            .query_map([limit as i64], |row| {
                Ok(ImportRunRecord {
                    run_id: row.get(0)?,
                    file_name: row.get(1)?,
                    total_rows: row.get(2)?,
                    successful: row.get(3)?,
                    failed: row.get(4)?,
                    started_at: row.get(5)?,
                    finished_at: row.get(6)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(runs)
    }
}
