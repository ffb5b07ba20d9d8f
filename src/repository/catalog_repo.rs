// ==========================================
// 经销商销售台账系统 - 目录 Repository Trait
// ==========================================
// 职责: 定义经销商/商品主数据的只读访问接口（不包含实现）
// 红线: 导入侧对目录只读，目录每次运行只拉取一次
// ==========================================

use crate::domain::sales::{CanonicalDealer, CanonicalProduct};
use crate::repository::error::RepoResult;
use async_trait::async_trait;

// ==========================================
// CatalogRepository Trait
// ==========================================
// 用途: 实体匹配所需的目录快照读取
// 实现者: SqliteLedgerStore（dealer_master / product_master 表）
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// 读取全部经销商主数据
    ///
    /// # 返回
    /// - Ok(Vec<CanonicalDealer>): 目录快照（顺序稳定）
    async fn list_dealers(&self) -> RepoResult<Vec<CanonicalDealer>>;

    /// 读取全部商品主数据
    ///
    /// # 返回
    /// - Ok(Vec<CanonicalProduct>): 目录快照（顺序稳定）
    async fn list_products(&self) -> RepoResult<Vec<CanonicalProduct>>;
}
