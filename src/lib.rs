// ==========================================
// 经销商销售台账系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 批量台账导入与对账引擎（人工最终裁决未匹配项）
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 导入层 - 外部数据
pub mod importer;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{CommitState, ImportStage, TransactionType};

// 领域实体
pub use domain::{
    CanonicalDealer, CanonicalProduct, ImportReport, ImportRunRecord, ImportStats, RawSalesRow,
    ResolvedSalesRow, RowError, SalesLedgerRow, UnmatchedDealerGroup,
};

// 导入管道
pub use importer::{
    apply_resolutions, BatchCommitter, EntityResolver, ImportError, ImportSession,
    ReconciliationQueue, RowValidator, SalesImporter, SalesImporterImpl,
};

// API
pub use api::{ImportApi, ImportApiResponse};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "经销商销售台账系统";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
