// ==========================================
// 经销商销售台账系统 - 导入会话状态机
// ==========================================
// 流转: Upload → Mapping → DealerMapping → Preview → Importing → Complete
//       （DealerMapping 仅在存在未匹配经销商时进入）
// 职责: 串联解析/映射/匹配/人工对账/校验/提交各阶段，
//       全部阶段数据仅驻留内存，运行结束即丢弃
// 红线: 对账队列存在未裁决分组时不得进入预览
// ==========================================

use crate::domain::sales::{
    ImportReport, ImportStats, ResolvedSalesRow, RowError, UnmatchedDealerGroup,
};
use crate::domain::types::ImportStage;
use crate::importer::batch_committer::{BatchCommitter, BatchPacer, CommitRow};
use crate::importer::entity_resolver::EntityResolver;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::field_mapper::FieldMapper;
use crate::importer::file_parser::UniversalFileParser;
use crate::importer::reconciliation::{apply_resolutions, ReconciliationQueue};
use crate::importer::row_validator::RowValidator;
use crate::config::ImportConfigReader;
use crate::repository::catalog_repo::CatalogRepository;
use crate::repository::ledger_repo::SalesLedgerStore;
use chrono::{DateTime, Utc};
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

// ==========================================
// 阶段摘要（供界面/调用方展示）
// ==========================================
#[derive(Debug, Clone)]
pub struct UploadSummary {
    pub total_rows: usize,
}

#[derive(Debug, Clone)]
pub struct ResolutionSummary {
    pub total_rows: usize,
    pub matched_rows: usize,
    pub unmatched_groups: usize,
    pub stage: ImportStage,
}

#[derive(Debug, Clone)]
pub struct PreviewSummary {
    pub total_rows: usize,
    pub valid_rows: usize,
    pub invalid_rows: usize,
    pub validation_errors: Vec<RowError>,
}

// ==========================================
// ImportSession
// ==========================================
pub struct ImportSession {
    catalog: Arc<dyn CatalogRepository>,
    store: Arc<dyn SalesLedgerStore>,
    config: Arc<dyn ImportConfigReader>,
    pacer: Arc<dyn BatchPacer>,

    stage: ImportStage,
    run_id: String,
    file_name: Option<String>,
    started_at: Option<DateTime<Utc>>,
    started_instant: Option<Instant>,

    raw_records: Vec<crate::domain::sales::RawSalesRow>,
    rows: Vec<ResolvedSalesRow>,
    queue: ReconciliationQueue,
    resolver: Option<EntityResolver>,
    cancel: Arc<AtomicBool>,
}

impl ImportSession {
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
            stage: ImportStage::Upload,
            run_id: Uuid::new_v4().to_string(),
            file_name: None,
            started_at: None,
            started_instant: None,
            raw_records: Vec::new(),
            rows: Vec::new(),
            queue: ReconciliationQueue::new(),
            resolver: None,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn stage(&self) -> ImportStage {
        self.stage
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// 取消令牌: 置位即放弃后续批次（已提交批次不回滚）
    pub fn cancel_token(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// 阶段 1: 解析文件并映射字段
    ///
    /// # 返回
    /// - Ok(UploadSummary): 进入 Mapping 阶段
    /// - Err(ParseError/SchemaError): 结构性错误，整次运行中止
    #[instrument(skip(self, file_path), fields(run_id = %self.run_id))]
    pub async fn load_file<P: AsRef<Path>>(&mut self, file_path: P) -> ImportResult<UploadSummary> {
        self.ensure_stage(ImportStage::Upload, ImportStage::Mapping)?;

        let path = file_path.as_ref();
        self.started_at = Some(Utc::now());
        self.started_instant = Some(Instant::now());
        self.file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.to_string());

        info!(file = %path.display(), "开始解析导入文件");
        let records = UniversalFileParser.parse(path)?;

        // 必需列校验: 以首条记录为代表，任何行级处理前快速失败
        let mapper = FieldMapper;
        mapper.validate_schema(&records[0])?;

        // 表头为第 1 行，数据行号从 2 起
        self.raw_records = records
            .iter()
            .enumerate()
            .map(|(idx, record)| mapper.map_to_raw_sales(record, idx + 2))
            .collect();

        let total_rows = self.raw_records.len();
        info!(total_rows = total_rows, "文件解析完成");

        self.stage = ImportStage::Mapping;
        Ok(UploadSummary { total_rows })
    }

    /// 阶段 2: 拉取目录快照并逐行匹配实体
    ///
    /// # 返回
    /// - 全部匹配 → 直接进入 Preview（行校验已完成）
    /// - 存在未匹配经销商 → 进入 DealerMapping，等待人工指定
    pub async fn resolve_entities(&mut self) -> ImportResult<ResolutionSummary> {
        self.ensure_stage(ImportStage::Mapping, ImportStage::Preview)?;

        // 目录每次运行只拉取一次，运行期间视为只读
        let dealers = self
            .catalog
            .list_dealers()
            .await
            .map_err(|e| ImportError::CatalogError(e.to_string()))?;
        let products = self
            .catalog
            .list_products()
            .await
            .map_err(|e| ImportError::CatalogError(e.to_string()))?;

        let resolver = EntityResolver::from_catalog(dealers, products);
        let (rows, queue) = resolver.resolve_rows(std::mem::take(&mut self.raw_records));

        let total_rows = rows.len();
        let matched_rows = rows.iter().filter(|r| r.dealer_id.is_some()).count();
        let unmatched_groups = queue.groups().len();

        self.rows = rows;
        self.queue = queue;
        self.resolver = Some(resolver);

        if self.queue.is_fully_resolved() {
            self.finish_validation();
        } else {
            info!(
                groups = unmatched_groups,
                "存在未匹配经销商，等待人工指定"
            );
            self.stage = ImportStage::DealerMapping;
        }

        Ok(ResolutionSummary {
            total_rows,
            matched_rows,
            unmatched_groups,
            stage: self.stage,
        })
    }

    /// 未匹配经销商分组（每个不同原始名称一条）
    pub fn unmatched_dealers(&self) -> &[UnmatchedDealerGroup] {
        self.queue.groups()
    }

    /// 阶段 3: 操作员对一个原始名称指定目录经销商
    ///
    /// 全部分组裁决完毕后自动扇出并进入 Preview
    ///
    /// # 返回
    /// - Ok(usize): 该名称覆盖的行数
    pub fn choose_dealer(&mut self, raw_name: &str, dealer_id: &str) -> ImportResult<usize> {
        self.ensure_stage(ImportStage::DealerMapping, ImportStage::Preview)?;

        let resolver = self
            .resolver
            .as_ref()
            .ok_or_else(|| ImportError::InternalError("目录快照未初始化".to_string()))?;
        if !resolver.dealer_id_exists(dealer_id) {
            return Err(ImportError::UnknownDealerId(dealer_id.to_string()));
        }

        let affected = self.queue.choose(raw_name, dealer_id)?;

        if self.queue.is_fully_resolved() {
            self.rows = apply_resolutions(std::mem::take(&mut self.rows), &self.queue);
            self.finish_validation();
        }

        Ok(affected)
    }

    /// 阶段 4: 预览（操作员确认前的有效/无效行统计）
    pub fn preview(&self) -> ImportResult<PreviewSummary> {
        self.ensure_stage(ImportStage::Preview, ImportStage::Preview)?;
        Ok(self.preview_summary())
    }

    /// 阶段 5: 按批次提交有效行并生成报告
    #[instrument(skip(self), fields(run_id = %self.run_id))]
    pub async fn commit(&mut self) -> ImportResult<ImportReport> {
        self.ensure_stage(ImportStage::Preview, ImportStage::Importing)?;
        self.stage = ImportStage::Importing;

        let preview = self.preview_summary();
        info!(
            valid = preview.valid_rows,
            invalid = preview.invalid_rows,
            "开始提交"
        );

        // 提交集合: validation_errors 为空的行
        let commit_rows: Vec<CommitRow> = self
            .rows
            .iter()
            .filter_map(|row| {
                row.to_ledger_row().map(|ledger_row| CommitRow {
                    row_number: row.raw.row_number,
                    ledger_row,
                })
            })
            .collect();

        let batch_size = self
            .config
            .get_batch_size()
            .await
            .map_err(|e| ImportError::InternalError(e.to_string()))?;
        let retry_once = self
            .config
            .get_batch_retry_once()
            .await
            .map_err(|e| ImportError::InternalError(e.to_string()))?;

        let mut committer = BatchCommitter::new(
            Arc::clone(&self.store),
            batch_size,
            retry_once,
            Arc::clone(&self.pacer),
        )
        .with_cancel_token(Arc::clone(&self.cancel));

        let stats = committer.commit(commit_rows).await;

        let report = self.build_report(preview, stats);

        // 运行汇总是除台账行外唯一的持久化产物；写入失败不吞掉报告
        let finished_at = Utc::now();
        let started_at = self.started_at.unwrap_or(finished_at);
        if let Err(err) = self.store.record_run(&report, started_at, finished_at).await {
            warn!(error = %err, "运行汇总写入失败");
        }

        self.stage = ImportStage::Complete;
        info!(
            successful = report.stats.successful,
            failed = report.stats.failed,
            "导入运行结束"
        );
        Ok(report)
    }

    /// 行校验并进入预览
    fn finish_validation(&mut self) {
        RowValidator.validate_all(&mut self.rows);
        let invalid = self.rows.iter().filter(|r| !r.is_committable()).count();
        debug!(
            total = self.rows.len(),
            invalid = invalid,
            "行校验完成"
        );
        self.stage = ImportStage::Preview;
    }

    fn preview_summary(&self) -> PreviewSummary {
        let mut validation_errors = Vec::new();
        for row in &self.rows {
            for message in &row.validation_errors {
                validation_errors.push(RowError {
                    row: row.raw.row_number,
                    message: message.clone(),
                });
            }
        }

        let invalid_rows = self.rows.iter().filter(|r| !r.is_committable()).count();
        PreviewSummary {
            total_rows: self.rows.len(),
            valid_rows: self.rows.len() - invalid_rows,
            invalid_rows,
            validation_errors,
        }
    }

    fn build_report(&self, preview: PreviewSummary, stats: ImportStats) -> ImportReport {
        ImportReport {
            run_id: self.run_id.clone(),
            file_name: self.file_name.clone(),
            total_rows: preview.total_rows,
            valid_rows: preview.valid_rows,
            invalid_rows: preview.invalid_rows,
            validation_errors: preview.validation_errors,
            stats,
            elapsed_ms: self
                .started_instant
                .map(|t| t.elapsed().as_millis() as i64)
                .unwrap_or(0),
        }
    }

    /// 阶段守卫: 当前阶段不符时拒绝转换
    fn ensure_stage(&self, expected: ImportStage, target: ImportStage) -> ImportResult<()> {
        if self.stage != expected {
            return Err(ImportError::InvalidStageTransition {
                from: self.stage.as_str().to_string(),
                to: target.as_str().to_string(),
            });
        }
        Ok(())
    }
}
