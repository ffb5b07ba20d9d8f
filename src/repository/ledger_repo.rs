// ==========================================
// 经销商销售台账系统 - 台账存储 Repository Trait
// ==========================================
// 职责: 定义销售台账的写入接口（不包含实现）
// 红线: 只追加，不更新不删除已有台账行
// ==========================================

use crate::domain::sales::{ImportReport, ImportRunRecord, SalesLedgerRow};
use crate::repository::error::RepoResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

// ==========================================
// SalesLedgerStore Trait
// ==========================================
// 用途: 批次提交器的写入端
// 实现者: SqliteLedgerStore
#[async_trait]
pub trait SalesLedgerStore: Send + Sync {
    /// 整批插入台账行（单个事务，任一行失败整批失败）
    ///
    /// # 参数
    /// - rows: 台账行批次
    ///
    /// # 返回
    /// - Ok(()): 整批成功
    /// - Err: 整批失败（由提交器降级为逐行插入）
    async fn insert_batch(&self, rows: &[SalesLedgerRow]) -> RepoResult<()>;

    /// 插入单条台账行（批次失败后的逐行兜底）
    async fn insert_one(&self, row: &SalesLedgerRow) -> RepoResult<()>;

    /// 持久化运行汇总（除台账行外唯一的持久化产物）
    ///
    /// # 参数
    /// - report: 运行报告
    /// - started_at / finished_at: 运行起止时间
    async fn record_run(
        &self,
        report: &ImportReport,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
    ) -> RepoResult<()>;

    /// 查询最近的导入运行记录
    ///
    /// # 参数
    /// - limit: 返回记录数限制
    async fn recent_runs(&self, limit: usize) -> RepoResult<Vec<ImportRunRecord>>;
}
