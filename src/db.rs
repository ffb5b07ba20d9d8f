// ==========================================
// 经销商销售台账系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为，避免"部分模块外键开启/部分不开启"
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 内嵌台账/主数据建表语句，保证新库可直接使用
// ==========================================

use rusqlite::Connection;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 台账与主数据建表语句
///
/// 说明:
/// - dealer_master / product_master 为目录主数据（导入侧只读）
/// - sales_ledger 为销售台账（导入侧只追加，不更新不删除）
/// - import_run 记录每次导入的最终汇总（唯一持久化的运行产物）
/// - config_kv 为键值配置表
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS dealer_master (
    id          TEXT PRIMARY KEY,
    code        TEXT NOT NULL,
    name        TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS product_master (
    id          TEXT PRIMARY KEY,
    code        TEXT NOT NULL,
    name        TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS sales_ledger (
    id                INTEGER PRIMARY KEY AUTOINCREMENT,
    dealer_id         TEXT NOT NULL REFERENCES dealer_master(id),
    product_id        TEXT,
    transaction_type  TEXT NOT NULL,
    transaction_date  TEXT NOT NULL,
    reference_number  TEXT NOT NULL,
    product_name      TEXT NOT NULL,
    product_code      TEXT,
    quantity          REAL NOT NULL,
    unit_price        REAL NOT NULL,
    amount            REAL NOT NULL,
    discount_amount   REAL NOT NULL DEFAULT 0,
    tax_amount        REAL NOT NULL DEFAULT 0,
    payment_status    TEXT NOT NULL DEFAULT 'pending',
    payment_date      TEXT,
    due_date          TEXT,
    notes             TEXT,
    created_at        TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS import_run (
    run_id       TEXT PRIMARY KEY,
    file_name    TEXT,
    total_rows   INTEGER NOT NULL,
    successful   INTEGER NOT NULL,
    failed       INTEGER NOT NULL,
    started_at   TEXT,
    finished_at  TEXT,
    report_json  TEXT
);

CREATE TABLE IF NOT EXISTS config_kv (
    key    TEXT PRIMARY KEY,
    value  TEXT NOT NULL
);
"#;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明:
/// - foreign_keys 需要"每个连接"单独开启
/// - busy_timeout 需要"每个连接"单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 初始化台账数据库 schema（幂等）
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_schema_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        init_schema(&conn).unwrap();
        // 重复执行不应报错
        init_schema(&conn).unwrap();

        let count: i64 = conn
            .query_row(
                "SELECT count(*) FROM sqlite_master WHERE type='table' AND name IN \
                 ('dealer_master','product_master','sales_ledger','import_run','config_kv')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 5);
    }
}
