// ==========================================
// 经销商销售台账系统 - 配置管理器实现
// ==========================================
// 职责: config_kv 表读写 + 类型化默认值回退
// ==========================================

use crate::config::import_config_trait::ImportConfigReader;
use crate::db::{init_schema, open_sqlite_connection};
use anyhow::Context;
use async_trait::async_trait;
use rusqlite::Connection;
use std::sync::{Arc, Mutex};
use tracing::warn;

// 默认值
pub const DEFAULT_BATCH_SIZE: usize = 10;
pub const DEFAULT_BATCH_PACING_MS: u64 = 200;
pub const DEFAULT_BATCH_RETRY_ONCE: bool = true;

pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    pub fn new(db_path: &str) -> anyhow::Result<Self> {
        let conn = open_sqlite_connection(db_path).context("打开配置数据库失败")?;
        init_schema(&conn).context("初始化配置表失败")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 读取原始配置值
    pub fn get_value(&self, key: &str) -> anyhow::Result<Option<String>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| anyhow::anyhow!("配置表锁获取失败: {e}"))?;
        let mut stmt = conn.prepare("SELECT value FROM config_kv WHERE key = ?1")?;
        let mut rows = stmt.query([key])?;
        match rows.next()? {
            Some(row) => Ok(Some(row.get(0)?)),
            None => Ok(None),
        }
    }

    /// 写入配置值（幂等覆盖）
    pub fn set_value(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| anyhow::anyhow!("配置表锁获取失败: {e}"))?;
        conn.execute(
            "INSERT OR REPLACE INTO config_kv (key, value) VALUES (?1, ?2)",
            [key, value],
        )?;
        Ok(())
    }

    /// 解析为目标类型，非法值回退默认并告警
    fn parse_or_default<T: std::str::FromStr>(&self, key: &str, default: T) -> anyhow::Result<T> {
        match self.get_value(key)? {
            None => Ok(default),
            Some(raw) => match raw.trim().parse::<T>() {
                Ok(v) => Ok(v),
                Err(_) => {
                    warn!(key = key, value = %raw, "配置值非法，回退默认");
                    Ok(default)
                }
            },
        }
    }
}

#[async_trait]
impl ImportConfigReader for ConfigManager {
    async fn get_batch_size(&self) -> anyhow::Result<usize> {
        let size = self.parse_or_default("import.batch_size", DEFAULT_BATCH_SIZE)?;
        // 批次大小至少为 1
        Ok(size.max(1))
    }

    async fn get_batch_pacing_ms(&self) -> anyhow::Result<u64> {
        self.parse_or_default("import.batch_pacing_ms", DEFAULT_BATCH_PACING_MS)
    }

    async fn get_batch_retry_once(&self) -> anyhow::Result<bool> {
        self.parse_or_default("import.batch_retry_once", DEFAULT_BATCH_RETRY_ONCE)
    }
}
