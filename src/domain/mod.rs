// ==========================================
// 经销商销售台账系统 - 领域层
// ==========================================
// 职责: 领域实体与类型定义，不含业务流程
// ==========================================

pub mod sales;
pub mod types;

pub use sales::{
    CanonicalDealer, CanonicalProduct, ImportReport, ImportRunRecord, ImportStats, RawSalesRow,
    ResolvedSalesRow, RowError, SalesLedgerRow, UnmatchedDealerGroup,
};
pub use types::{CommitState, ImportStage, TransactionType};
