// ==========================================
// 经销商销售台账系统 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 口径: 结构性错误（文件/表头）中止整次运行；
//       行级校验失败是数据不是错误，走 validation_errors
// ==========================================

use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误 =====
    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件格式不支持: {0}（仅支持 .xlsx/.xls/.csv）")]
    UnsupportedFormat(String),

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    #[error("Excel 解析失败: {0}")]
    ExcelParseError(String),

    #[error("CSV 解析失败: {0}")]
    CsvParseError(String),

    #[error("文件无数据行")]
    EmptyFile,

    // ===== 表头校验错误 =====
    #[error("缺少必需列: {}", missing_columns.join(", "))]
    SchemaError { missing_columns: Vec<String> },

    // ===== 流程状态错误 =====
    #[error("无效的阶段转换: from={from} to={to}")]
    InvalidStageTransition { from: String, to: String },

    #[error("存在 {} 个未匹配经销商，须人工指定后才能继续: {}", names.len(), names.join(", "))]
    ReconciliationPending { names: Vec<String> },

    #[error("未匹配经销商分组不存在: {0}")]
    UnknownDealerGroup(String),

    #[error("经销商 ID 不在目录中: {0}")]
    UnknownDealerId(String),

    // ===== 外部存储错误 =====
    #[error("目录读取失败: {0}")]
    CatalogError(String),

    #[error("台账存储失败: {0}")]
    StoreError(String),

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

// 实现 From<calamine::XlsxError>
impl From<calamine::XlsxError> for ImportError {
    fn from(err: calamine::XlsxError) -> Self {
        ImportError::ExcelParseError(err.to_string())
    }
}

impl From<crate::repository::error::RepositoryError> for ImportError {
    fn from(err: crate::repository::error::RepositoryError) -> Self {
        ImportError::StoreError(err.to_string())
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;
