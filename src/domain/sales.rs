// ==========================================
// 经销商销售台账系统 - 销售导入领域模型
// ==========================================
// 职责: 导入管道各阶段的数据载体
// 生命周期: RawSalesRow → ResolvedSalesRow → SalesLedgerRow → ImportStats
//           全部归属于单次导入运行，运行结束即丢弃
// ==========================================

use crate::domain::types::TransactionType;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==========================================
// RawSalesRow - 导入中间结构体
// ==========================================
// 用途: 文件解析 → 字段映射后的原始行（字段保持表格原文）
// 红线: 解析后不可变，后续阶段只产生派生行
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawSalesRow {
    // 经销商
    pub dealer_name: Option<String>,
    pub dealer_code: Option<String>,

    // 交易信息
    pub transaction_type: Option<String>,
    pub transaction_date: Option<String>, // 已规范化为 YYYY-MM-DD，失败则为 None
    pub reference_number: Option<String>, // 发票/红冲单据号，允许多行共用

    // 商品信息
    pub product_name: Option<String>,
    pub product_code: Option<String>,
    pub quantity: Option<String>,
    pub unit_price: Option<String>,

    // 可选金额与回款字段
    pub discount_amount: Option<String>,
    pub tax_amount: Option<String>,
    pub payment_status: Option<String>,
    pub payment_date: Option<String>,
    pub due_date: Option<String>,
    pub notes: Option<String>,

    // 元信息
    pub row_number: usize, // 原始文件行号（表头为第 1 行）
}

// ==========================================
// ResolvedSalesRow - 匹配与校验结果行
// ==========================================
// 不变量: validation_errors 非空的行禁止进入提交集合
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedSalesRow {
    pub raw: RawSalesRow,

    // 实体匹配结果
    pub dealer_id: Option<String>,           // 人工指定前可能为 None
    pub matched_dealer_code: Option<String>, // 自动匹配命中的经销商编码
    pub product_id: Option<String>,          // 商品匹配失败不阻断，保留 None

    // 规范化结果（行校验器填充）
    pub transaction_type: Option<TransactionType>,
    pub transaction_date: Option<NaiveDate>,
    pub quantity: Option<f64>, // 已按交易类型完成符号修正
    pub unit_price: Option<f64>,

    // 行级校验失败原因（累积，不短路）
    pub validation_errors: Vec<String>,
}

impl ResolvedSalesRow {
    pub fn from_raw(raw: RawSalesRow) -> Self {
        Self {
            raw,
            dealer_id: None,
            matched_dealer_code: None,
            product_id: None,
            transaction_type: None,
            transaction_date: None,
            quantity: None,
            unit_price: None,
            validation_errors: Vec::new(),
        }
    }

    /// validation_errors 为空是进入提交集合的唯一门槛
    pub fn is_committable(&self) -> bool {
        self.validation_errors.is_empty()
    }

    /// 转换为台账行（amount 在此派生，不取输入值）
    ///
    /// # 返回
    /// - Some(SalesLedgerRow): 行可提交且规范化字段齐备
    /// - None: 行不可提交
    pub fn to_ledger_row(&self) -> Option<SalesLedgerRow> {
        if !self.is_committable() {
            return None;
        }

        let dealer_id = self.dealer_id.clone()?;
        let transaction_type = self.transaction_type?;
        let transaction_date = self.transaction_date?;
        let quantity = self.quantity?;
        let unit_price = self.unit_price?;
        let reference_number = self.raw.reference_number.clone()?;
        let product_name = self.raw.product_name.clone()?;

        Some(SalesLedgerRow {
            dealer_id,
            product_id: self.product_id.clone(),
            transaction_type: transaction_type.as_str().to_string(),
            transaction_date,
            reference_number,
            product_name,
            product_code: self.raw.product_code.clone(),
            quantity,
            unit_price,
            // 核心派生: 红冲行 quantity 已为负，amount 自动为负
            amount: quantity * unit_price,
            discount_amount: parse_optional_amount(self.raw.discount_amount.as_deref()),
            tax_amount: parse_optional_amount(self.raw.tax_amount.as_deref()),
            payment_status: self
                .raw
                .payment_status
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .unwrap_or("pending")
                .to_string(),
            payment_date: parse_optional_date(self.raw.payment_date.as_deref()),
            due_date: parse_optional_date(self.raw.due_date.as_deref()),
            notes: self.raw.notes.clone(),
        })
    }
}

/// 可选金额字段宽松解析（缺失/非法按 0 计）
fn parse_optional_amount(value: Option<&str>) -> f64 {
    value
        .map(|v| v.trim().replace(',', ""))
        .filter(|v| !v.is_empty())
        .and_then(|v| v.parse::<f64>().ok())
        .unwrap_or(0.0)
}

/// 可选日期字段宽松解析（非法按缺失处理）
fn parse_optional_date(value: Option<&str>) -> Option<NaiveDate> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .and_then(|v| NaiveDate::parse_from_str(v, "%Y-%m-%d").ok())
}

// ==========================================
// SalesLedgerRow - 台账写入行
// ==========================================
// 用途: 提交器写入外部台账存储的完整行
// 对齐: sales_ledger 表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesLedgerRow {
    pub dealer_id: String,
    pub product_id: Option<String>,
    pub transaction_type: String, // "invoice" / "credit_memo"
    pub transaction_date: NaiveDate,
    pub reference_number: String,
    pub product_name: String,
    pub product_code: Option<String>,
    pub quantity: f64,
    pub unit_price: f64,
    pub amount: f64, // 派生字段: quantity * unit_price
    pub discount_amount: f64,
    pub tax_amount: f64,
    pub payment_status: String,
    pub payment_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

// ==========================================
// CanonicalDealer / CanonicalProduct - 目录主数据
// ==========================================
// 归属: 外部目录存储，导入侧只读快照
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalDealer {
    pub id: String,
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalProduct {
    pub id: String,
    pub code: String,
    pub name: String,
}

// ==========================================
// UnmatchedDealerGroup - 未匹配经销商分组
// ==========================================
// 用途: 同名（大小写不敏感）未匹配行合并为一组，人工指定一次后扇出
// 不变量: 存在 chosen_dealer_id == None 的分组时，导入不得进入预览
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnmatchedDealerGroup {
    pub raw_dealer_name: String,
    pub row_indices: Vec<usize>, // 行在解析序列中的下标（0 起）
    pub chosen_dealer_id: Option<String>,
}

// ==========================================
// RowError - 行级错误记录
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowError {
    pub row: usize, // 原始文件行号
    pub message: String,
}

// ==========================================
// ImportStats - 提交统计
// ==========================================
// 用途: 提交器单调累积；successful + failed 恒等于提交行数
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportStats {
    pub total: usize,      // 提交给提交器的行数
    pub successful: usize,
    pub failed: usize,
    pub skipped: usize,    // 销售导入恒为 0（允许重复行）
    pub updated: usize,    // 只追加存储，恒为 0
    pub errors: Vec<RowError>,
}

// ==========================================
// ImportRunRecord - 运行审计记录
// ==========================================
// 用途: import_run 表读出的历史运行摘要
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportRunRecord {
    pub run_id: String,
    pub file_name: Option<String>,
    pub total_rows: i64,
    pub successful: i64,
    pub failed: i64,
    pub started_at: Option<chrono::DateTime<chrono::Utc>>,
    pub finished_at: Option<chrono::DateTime<chrono::Utc>>,
}

// ==========================================
// ImportReport - 导入运行报告
// ==========================================
// 用途: 单次运行的最终产物（除台账行外唯一持久化内容）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportReport {
    pub run_id: String,
    pub file_name: Option<String>,
    pub total_rows: usize,   // 解析出的数据行总数
    pub valid_rows: usize,   // 通过校验、进入提交的行数
    pub invalid_rows: usize, // 被校验排除的行数
    pub validation_errors: Vec<RowError>, // 被排除行的原因（按行号）
    pub stats: ImportStats,  // 提交阶段统计
    pub elapsed_ms: i64,
}
