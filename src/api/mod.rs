// ==========================================
// 经销商销售台账系统 - API 层
// ==========================================
// 职责: 面向调用方的业务接口与错误转换
// ==========================================

pub mod error;
pub mod import_api;

pub use error::{ApiError, ApiResult};
pub use import_api::{ImportApi, ImportApiResponse};
