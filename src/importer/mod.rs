// ==========================================
// 经销商销售台账系统 - 导入层
// ==========================================
// 职责: 表格文件 → 校验通过的台账行，批次提交至外部存储
// 支持: Excel, CSV
// ==========================================

// 模块声明
pub mod batch_committer;
pub mod entity_resolver;
pub mod error;
pub mod field_mapper;
pub mod file_parser;
pub mod reconciliation;
pub mod row_validator;
pub mod sales_importer_impl;
pub mod sales_importer_trait;
pub mod session;
pub mod template;

// 重导出核心类型
pub use batch_committer::{BatchCommitter, BatchPacer, CommitRow, NoopPacer, TokioPacer};
pub use entity_resolver::EntityResolver;
pub use error::{ImportError, ImportResult};
pub use field_mapper::{normalize_date_cell, serial_to_date, FieldMapper, REQUIRED_COLUMNS};
pub use file_parser::{CsvParser, ExcelParser, UniversalFileParser};
pub use reconciliation::{apply_resolutions, ReconciliationQueue};
pub use row_validator::RowValidator;
pub use sales_importer_impl::SalesImporterImpl;
pub use session::{ImportSession, PreviewSummary, ResolutionSummary, UploadSummary};
pub use template::{template_csv, write_template_file, TEMPLATE_COLUMNS};

// 重导出 Trait 接口
pub use sales_importer_trait::{FileParser, SalesImporter};
