// ==========================================
// 经销商销售台账系统 - 销售导入器实现
// ==========================================
// 职责: 以会话状态机为内核的端到端无头导入
// 流程: 解析 → 列校验 → 映射 → 实体匹配 → 行校验 → 批次提交 → 报告
// 说明: 存在未匹配经销商时无头路径直接报错（人工指定走会话接口）
// ==========================================

use crate::config::ImportConfigReader;
use crate::domain::sales::ImportReport;
use crate::domain::types::ImportStage;
use crate::importer::batch_committer::BatchPacer;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::sales_importer_trait::SalesImporter;
use crate::importer::session::ImportSession;
use crate::repository::catalog_repo::CatalogRepository;
use crate::repository::ledger_repo::SalesLedgerStore;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info};

// ==========================================
// SalesImporterImpl
// ==========================================
pub struct SalesImporterImpl {
    catalog: Arc<dyn CatalogRepository>,
    store: Arc<dyn SalesLedgerStore>,
    config: Arc<dyn ImportConfigReader>,
    pacer: Arc<dyn BatchPacer>,
}

impl SalesImporterImpl {
    pub fn new(
        catalog: Arc<dyn CatalogRepository>,
        store: Arc<dyn SalesLedgerStore>,
        config: Arc<dyn ImportConfigReader>,
        pacer: Arc<dyn BatchPacer>,
    ) -> Self {
        Self {
            catalog,
            store,
            config,
            pacer,
        }
    }

    /// 新建交互式导入会话（人工对账路径）
    pub fn new_session(&self) -> ImportSession {
        ImportSession::new(
            Arc::clone(&self.catalog),
            Arc::clone(&self.store),
            Arc::clone(&self.config),
            Arc::clone(&self.pacer),
        )
    }
}

#[async_trait::async_trait]
impl SalesImporter for SalesImporterImpl {
    async fn import_from_file<P: AsRef<Path> + Send>(
        &self,
        file_path: P,
    ) -> ImportResult<ImportReport> {
        let mut session = self.new_session();

        session.load_file(file_path.as_ref()).await?;
        let resolution = session.resolve_entities().await?;

        // 无头路径无法收集人工裁决，直接以未匹配名称报错
        if resolution.stage == ImportStage::DealerMapping {
            let names: Vec<String> = session
                .unmatched_dealers()
                .iter()
                .map(|g| g.raw_dealer_name.clone())
                .collect();
            return Err(ImportError::ReconciliationPending { names });
        }

        let preview = session.preview()?;
        info!(
            valid = preview.valid_rows,
            invalid = preview.invalid_rows,
            "预览统计"
        );

        session.commit().await
    }

    async fn batch_import<P: AsRef<Path> + Send + Sync>(
        &self,
        file_paths: Vec<P>,
    ) -> ImportResult<Vec<Result<ImportReport, String>>> {
        use futures::future::join_all;

        info!(count = file_paths.len(), "开始批量导入文件");

        // 为每个文件创建独立会话，并发执行
        let import_tasks = file_paths.into_iter().map(|path| {
            let path_str = path.as_ref().to_str().unwrap_or("unknown").to_string();
            async move {
                match self.import_from_file(path).await {
                    Ok(report) => {
                        info!(
                            file = %path_str,
                            successful = report.stats.successful,
                            "文件导入成功"
                        );
                        Ok(report)
                    }
                    Err(e) => {
                        error!(file = %path_str, error = %e, "文件导入失败");
                        Err(format!("文件 {} 导入失败: {}", path_str, e))
                    }
                }
            }
        });

        let results = join_all(import_tasks).await;

        info!(
            total = results.len(),
            success = results.iter().filter(|r| r.is_ok()).count(),
            failed = results.iter().filter(|r| r.is_err()).count(),
            "批量导入完成"
        );

        Ok(results)
    }
}
