// ==========================================
// 销售导入API
// ==========================================
// 职责: 封装销售台账导入相关功能（无头一次性导入 / 交互式会话 / 模板导出）
// ==========================================

use crate::api::error::ApiError;
use crate::config::{ConfigManager, ImportConfigReader};
use crate::domain::sales::{ImportReport, ImportRunRecord, RowError};
use crate::importer::batch_committer::TokioPacer;
use crate::importer::sales_importer_trait::SalesImporter;
use crate::importer::session::ImportSession;
use crate::importer::{template_csv, SalesImporterImpl};
use crate::repository::catalog_repo::CatalogRepository;
use crate::repository::ledger_repo::SalesLedgerStore;
use crate::repository::ledger_repo_impl::SqliteLedgerStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// 导入API响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportApiResponse {
    /// 运行 ID
    pub run_id: String,
    /// 解析出的数据行总数
    pub total_rows: i64,
    /// 成功写入台账的行数
    pub imported: i64,
    /// 提交阶段失败的行数
    pub failed: i64,
    /// 被行校验排除的行数
    pub invalid: i64,
    /// 被排除行的原因明细（按行号）
    pub validation_errors: Vec<RowError>,
    /// 提交阶段失败明细（按行号）
    pub commit_errors: Vec<RowError>,
    /// 导入耗时（毫秒）
    pub elapsed_ms: i64,
}

impl ImportApiResponse {
    fn from_report(report: ImportReport) -> Self {
        Self {
            run_id: report.run_id,
            total_rows: report.total_rows as i64,
            imported: report.stats.successful as i64,
            failed: report.stats.failed as i64,
            invalid: report.invalid_rows as i64,
            validation_errors: report.validation_errors,
            commit_errors: report.stats.errors,
            elapsed_ms: report.elapsed_ms,
        }
    }
}

/// 导入API
pub struct ImportApi {
    db_path: String,
}

impl ImportApi {
    /// 创建新的ImportApi实例
    pub fn new(db_path: String) -> Self {
        Self { db_path }
    }

    /// 无头一次性导入
    ///
    /// # 参数
    /// - file_path: 文件路径（.csv / .xlsx / .xls）
    ///
    /// # 返回
    /// - Ok(ImportApiResponse): 导入结果
    /// - Err(UnresolvedDealers): 存在未匹配经销商（走 start_session 人工指定）
    /// - Err(ApiError): 其他错误
    pub async fn import_sales_file(&self, file_path: &str) -> Result<ImportApiResponse, ApiError> {
        let importer = self.create_importer().await?;
        let report = importer.import_from_file(file_path).await?;
        Ok(ImportApiResponse::from_report(report))
    }

    /// 新建交互式导入会话（含人工对账阶段）
    pub async fn start_session(&self) -> Result<ImportSession, ApiError> {
        Ok(self.create_importer().await?.new_session())
    }

    /// 生成导入模板 CSV 内容
    pub fn template_csv(&self) -> Result<String, ApiError> {
        Ok(template_csv()?)
    }

    /// 查询最近的导入运行记录
    pub async fn recent_runs(&self, limit: usize) -> Result<Vec<ImportRunRecord>, ApiError> {
        let store = SqliteLedgerStore::new(&self.db_path)?;
        Ok(store.recent_runs(limit.clamp(1, 100)).await?)
    }

    /// 创建SalesImporter实例
    async fn create_importer(&self) -> Result<SalesImporterImpl, ApiError> {
        let store = Arc::new(SqliteLedgerStore::new(&self.db_path)?);
        let config = Arc::new(
            ConfigManager::new(&self.db_path)
                .map_err(|e| ApiError::InternalError(format!("创建配置读取器失败: {e}")))?,
        );

        let pacing_ms = config
            .get_batch_pacing_ms()
            .await
            .map_err(|e| ApiError::InternalError(e.to_string()))?;
        let pacer = Arc::new(TokioPacer::new(pacing_ms));

        Ok(SalesImporterImpl::new(
            store.clone() as Arc<dyn CatalogRepository>,
            store as Arc<dyn SalesLedgerStore>,
            config,
            pacer,
        ))
    }
}
