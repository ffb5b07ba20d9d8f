// ==========================================
// 经销商销售台账系统 - 销售导入 Trait
// ==========================================
// 职责: 定义导入接口（不包含实现）
// ==========================================

use crate::domain::sales::ImportReport;
use crate::importer::error::ImportResult;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;

// ==========================================
// FileParser Trait
// ==========================================
// 用途: 文件解析接口（管道第一阶段）
// 实现者: CsvParser, ExcelParser
pub trait FileParser: Send + Sync {
    /// 解析文件为原始行记录（HashMap<列名, 单元格原文>）
    ///
    /// # 参数
    /// - file_path: 文件路径
    ///
    /// # 返回
    /// - Ok(Vec<HashMap<String, String>>): 有序行记录（至少一行）
    /// - Err: 文件读取错误、格式错误、无数据行
    fn parse_to_raw_records(
        &self,
        file_path: &Path,
    ) -> ImportResult<Vec<HashMap<String, String>>>;
}

// ==========================================
// SalesImporter Trait
// ==========================================
// 用途: 销售台账导入主接口
// 实现者: SalesImporterImpl
#[async_trait]
pub trait SalesImporter: Send + Sync {
    /// 从表格文件端到端导入销售行
    ///
    /// # 参数
    /// - file_path: 文件路径（.csv / .xlsx / .xls）
    ///
    /// # 返回
    /// - Ok(ImportReport): 运行报告（校验排除明细 + 提交统计）
    /// - Err(ReconciliationPending): 存在未匹配经销商，须经会话接口人工指定
    /// - Err: 结构性错误（文件不可读、无数据行、缺少必需列）
    ///
    /// # 导入流程
    /// 1. 文件解析（无数据行即中止）
    /// 2. 必需列校验（以首行为代表）
    /// 3. 字段映射与日期规范化
    /// 4. 实体匹配（目录快照索引）
    /// 5. 行校验（类型/数量符号/单价/日期）
    /// 6. 批次提交（逐行兜底）+ 报告
    async fn import_from_file<P: AsRef<Path> + Send>(
        &self,
        file_path: P,
    ) -> ImportResult<ImportReport>;

    /// 批量导入多个文件（并发执行）
    ///
    /// # 参数
    /// - file_paths: 文件路径列表
    ///
    /// # 返回
    /// - Ok(Vec<Result<ImportReport, String>>): 每个文件的导入结果
    ///
    /// # 说明
    /// - 每个文件的导入相互独立，单个文件失败不影响其他文件
    /// - 单个文件内部仍按批次顺序提交
    async fn batch_import<P: AsRef<Path> + Send + Sync>(
        &self,
        file_paths: Vec<P>,
    ) -> ImportResult<Vec<Result<ImportReport, String>>>;
}
