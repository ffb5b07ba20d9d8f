// ==========================================
// 经销商销售台账系统 - API层错误类型
// ==========================================
// 职责: 将导入层/仓储层错误转换为用户可读的错误消息
// 口径: 所有错误信息必须包含显式原因
// ==========================================

use crate::importer::error::ImportError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ===== 输入与流程错误 =====
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("无效的阶段转换: from={from} to={to}")]
    InvalidStageTransition { from: String, to: String },

    /// 存在未匹配经销商，须走会话接口人工指定
    #[error("存在未匹配经销商: {}", names.join(", "))]
    UnresolvedDealers { names: Vec<String> },

    // ===== 导入错误 =====
    #[error("文件导入失败: {0}")]
    ImportError(String),

    #[error("数据验证失败: {0}")]
    ValidationError(String),

    // ===== 数据访问错误 =====
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ==========================================
// 从 ImportError 转换
// 目的: 保留可恢复错误（未匹配经销商/阶段违规）的结构
// ==========================================
impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::ReconciliationPending { names } => ApiError::UnresolvedDealers { names },
            ImportError::InvalidStageTransition { from, to } => {
                ApiError::InvalidStageTransition { from, to }
            }
            ImportError::UnknownDealerGroup(name) => {
                ApiError::NotFound(format!("未匹配经销商分组不存在: {name}"))
            }
            ImportError::UnknownDealerId(id) => {
                ApiError::InvalidInput(format!("经销商 ID 不在目录中: {id}"))
            }
            ImportError::CatalogError(msg) | ImportError::StoreError(msg) => {
                ApiError::DatabaseError(msg)
            }
            ImportError::InternalError(msg) => ApiError::InternalError(msg),
            ImportError::Other(err) => ApiError::Other(err),
            // 结构性错误统一转为导入错误文案
            other => ApiError::ImportError(other.to_string()),
        }
    }
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(err) => ApiError::Other(err),
            other => ApiError::DatabaseError(other.to_string()),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reconciliation_pending_conversion() {
        let err = ImportError::ReconciliationPending {
            names: vec!["Hilltop Supplies".to_string()],
        };
        let api_err: ApiError = err.into();
        match api_err {
            ApiError::UnresolvedDealers { names } => {
                assert_eq!(names, vec!["Hilltop Supplies".to_string()]);
            }
            other => panic!("unexpected conversion: {other}"),
        }
    }

    #[test]
    fn test_schema_error_conversion() {
        let err = ImportError::SchemaError {
            missing_columns: vec!["quantity".to_string()],
        };
        let api_err: ApiError = err.into();
        match api_err {
            ApiError::ImportError(msg) => assert!(msg.contains("quantity")),
            other => panic!("unexpected conversion: {other}"),
        }
    }

    #[test]
    fn test_repository_not_found_conversion() {
        let err = RepositoryError::NotFound {
            entity: "Dealer".to_string(),
            id: "d-9".to_string(),
        };
        let api_err: ApiError = err.into();
        match api_err {
            ApiError::NotFound(msg) => {
                assert!(msg.contains("Dealer"));
                assert!(msg.contains("d-9"));
            }
            other => panic!("unexpected conversion: {other}"),
        }
    }
}
