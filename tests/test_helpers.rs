// ==========================================
// 经销商销售台账系统 - 测试辅助函数
// ==========================================
// 职责: 临时台账数据库 + 目录种子数据 + 测试 CSV 文件
// ==========================================

#![allow(dead_code)]

use dealer_ledger::config::ConfigManager;
use dealer_ledger::importer::{NoopPacer, SalesImporterImpl};
use dealer_ledger::repository::ledger_repo_impl::SqliteLedgerStore;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// 创建临时台账数据库并写入目录种子数据
///
/// # 返回
/// - (TempDir, db_path): TempDir 须由调用方持有至测试结束
pub fn create_test_db() -> (tempfile::TempDir, String) {
    let dir = tempfile::tempdir().expect("创建临时目录失败");
    let db_path = dir.path().join("ledger.db").to_str().unwrap().to_string();

    let conn = dealer_ledger::db::open_sqlite_connection(&db_path).expect("打开数据库失败");
    dealer_ledger::db::init_schema(&conn).expect("初始化 schema 失败");

    // 经销商目录
    for (id, code, name) in [
        ("d-1", "DLR-001", "Green Valley Traders"),
        ("d-2", "DLR-002", "Sunrise Agro"),
        ("d-3", "DLR-003", "Hilltop Supplies"),
    ] {
        conn.execute(
            "INSERT INTO dealer_master (id, code, name) VALUES (?1, ?2, ?3)",
            [id, code, name],
        )
        .expect("写入经销商种子失败");
    }

    // 商品目录
    for (id, code, name) in [
        ("p-1", "NPK-20", "NPK 20-20-20"),
        ("p-2", "UREA-46", "Urea 46%"),
    ] {
        conn.execute(
            "INSERT INTO product_master (id, code, name) VALUES (?1, ?2, ?3)",
            [id, code, name],
        )
        .expect("写入商品种子失败");
    }

    (dir, db_path)
}

/// 构建无节流的导入器（测试不等待真实延时）
pub fn make_importer(db_path: &str) -> SalesImporterImpl {
    let store = Arc::new(SqliteLedgerStore::new(db_path).expect("创建台账存储失败"));
    let config = Arc::new(ConfigManager::new(db_path).expect("创建配置读取器失败"));
    SalesImporterImpl::new(store.clone(), store, config, Arc::new(NoopPacer))
}

/// 写入带标准表头的销售 CSV
///
/// # 参数
/// - rows: 数据行（已是 CSV 文本，列序与表头一致）
pub fn write_sales_csv(dir: &Path, name: &str, rows: &[&str]) -> PathBuf {
    let path = dir.join(name);
    let mut content = String::from(
        "dealer_name,dealer_code,transaction_type,transaction_date,reference_number,\
         product_name,product_code,quantity,unit_price,discount_amount,tax_amount,\
         payment_status,payment_date,due_date,notes\n",
    );
    for row in rows {
        content.push_str(row);
        content.push('\n');
    }
    std::fs::write(&path, &content).expect("写入测试 CSV 失败");
    path
}

/// 查询台账行数
pub fn count_ledger_rows(db_path: &str) -> i64 {
    let conn = dealer_ledger::db::open_sqlite_connection(db_path).unwrap();
    conn.query_row("SELECT count(*) FROM sales_ledger", [], |r| r.get(0))
        .unwrap()
}

/// 读取台账 (reference_number, product_name, quantity, amount) 列表（按插入序）
pub fn ledger_rows(db_path: &str) -> Vec<(String, String, f64, f64)> {
    let conn = dealer_ledger::db::open_sqlite_connection(db_path).unwrap();
    let mut stmt = conn
        .prepare(
            "SELECT reference_number, product_name, quantity, amount \
             FROM sales_ledger ORDER BY id",
        )
        .unwrap();
    let rows = stmt
        .query_map([], |r| {
            Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?))
        })
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    rows
}
