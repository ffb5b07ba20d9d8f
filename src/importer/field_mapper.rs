// ==========================================
// 经销商销售台账系统 - 字段映射器实现
// ==========================================
// 职责: 原始行记录 → RawSalesRow 映射 + 必需列校验 + 日期规范化
// 口径: 映射阶段不做业务校验，数值/类型问题留给行校验器
// ==========================================

use crate::domain::sales::RawSalesRow;
use crate::importer::error::{ImportError, ImportResult};
use chrono::{Duration, NaiveDate};
use std::collections::HashMap;

/// 必需列（缺任何一列则整次运行中止）
pub const REQUIRED_COLUMNS: [&str; 7] = [
    "dealer_name",
    "transaction_type",
    "transaction_date",
    "reference_number",
    "product_name",
    "quantity",
    "unit_price",
];

/// 表格序列日期纪元: 1899-12-30（序列 1 = 1899-12-31，兼容常见的闰年偏移约定）
const SERIAL_DATE_EPOCH: (i32, u32, u32) = (1899, 12, 30);

pub struct FieldMapper;

impl FieldMapper {
    /// 校验必需列是否齐备（以首条记录为代表，在任何行级处理前执行）
    ///
    /// # 返回
    /// - Ok(()): 列齐备
    /// - Err(SchemaError): 缺失列清单
    pub fn validate_schema(&self, first_row: &HashMap<String, String>) -> ImportResult<()> {
        let present: Vec<String> = first_row.keys().map(|k| normalize_header(k)).collect();

        let missing_columns: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|col| !present.iter().any(|p| p == *col))
            .map(|col| col.to_string())
            .collect();

        if missing_columns.is_empty() {
            Ok(())
        } else {
            Err(ImportError::SchemaError { missing_columns })
        }
    }

    /// 将原始行记录映射为 RawSalesRow
    ///
    /// # 参数
    /// - row: 原始行记录（表头 → 单元格原文）
    /// - row_number: 原始文件行号（表头为第 1 行）
    pub fn map_to_raw_sales(
        &self,
        row: &HashMap<String, String>,
        row_number: usize,
    ) -> RawSalesRow {
        RawSalesRow {
            dealer_name: self.get_string(row, "dealer_name"),
            dealer_code: self.get_string(row, "dealer_code"),

            transaction_type: self.get_string(row, "transaction_type"),
            transaction_date: self
                .get_string(row, "transaction_date")
                .and_then(|v| normalize_date_cell(&v)),
            reference_number: self.get_string(row, "reference_number"),

            product_name: self.get_string(row, "product_name"),
            product_code: self.get_string(row, "product_code"),
            quantity: self.get_string(row, "quantity"),
            unit_price: self.get_string(row, "unit_price"),

            discount_amount: self.get_string(row, "discount_amount"),
            tax_amount: self.get_string(row, "tax_amount"),
            payment_status: self.get_string(row, "payment_status"),
            payment_date: self
                .get_string(row, "payment_date")
                .and_then(|v| normalize_date_cell(&v)),
            due_date: self
                .get_string(row, "due_date")
                .and_then(|v| normalize_date_cell(&v)),
            notes: self.get_string(row, "notes"),

            row_number,
        }
    }

    /// 提取字符串字段（空白视为缺失），容忍表头大小写/空格/连字符差异
    fn get_string(&self, row: &HashMap<String, String>, key: &str) -> Option<String> {
        if let Some(v) = row.get(key) {
            let trimmed = v.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
            return None;
        }

        // 表头变体: "Dealer Name" / "DEALER_NAME" 等
        for (header, v) in row {
            if normalize_header(header) == key {
                let trimmed = v.trim();
                if !trimmed.is_empty() {
                    return Some(trimmed.to_string());
                }
                return None;
            }
        }
        None
    }
}

/// 表头名规范化（小写 + 空格/连字符 → 下划线）
fn normalize_header(header: &str) -> String {
    header.trim().to_lowercase().replace([' ', '-'], "_")
}

/// 日期单元格规范化为 YYYY-MM-DD
///
/// # 规则（依次尝试）
/// 1. ISO 样式字符串: 截取日期部分（丢弃时间）
/// 2. 表格序列数字: 以 1899-12-30 为纪元换算
/// 3. 常见日期格式兜底
/// 全部失败返回 None，由行校验器记录为校验错误而非解析错误
pub fn normalize_date_cell(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    // 1. ISO 样式: "2025-04-01" / "2025-04-01T10:30:00Z" / "2025-04-01 10:30:00"
    if let Some(prefix) = value.get(..10) {
        if let Ok(date) = NaiveDate::parse_from_str(prefix, "%Y-%m-%d") {
            return Some(date.format("%Y-%m-%d").to_string());
        }
    }

    // 2. 表格序列数字（整数或带小数的天数）
    if let Ok(serial) = value.parse::<f64>() {
        return serial_to_date(serial).map(|d| d.format("%Y-%m-%d").to_string());
    }

    // 3. 常见格式兜底
    for format in ["%Y/%m/%d", "%m/%d/%Y", "%d-%m-%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return Some(date.format("%Y-%m-%d").to_string());
        }
    }

    None
}

/// 表格序列号 → 日历日期（序列 1 = 1899-12-31）
pub fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    // 合理区间外的数字不按日期处理（如误填的金额）
    if !(1.0..300_000.0).contains(&serial) {
        return None;
    }
    let (y, m, d) = SERIAL_DATE_EPOCH;
    let epoch = NaiveDate::from_ymd_opt(y, m, d)?;
    epoch.checked_add_signed(Duration::days(serial as i64))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row_of(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_validate_schema_ok() {
        let row = row_of(&[
            ("dealer_name", "Green Valley Traders"),
            ("transaction_type", "invoice"),
            ("transaction_date", "2025-04-01"),
            ("reference_number", "INV-001"),
            ("product_name", "NPK 20-20-20"),
            ("quantity", "10"),
            ("unit_price", "45.5"),
        ]);

        assert!(FieldMapper.validate_schema(&row).is_ok());
    }

    #[test]
    fn test_validate_schema_missing_columns() {
        let row = row_of(&[("dealer_name", "Green Valley Traders"), ("quantity", "10")]);

        let err = FieldMapper.validate_schema(&row).unwrap_err();
        match err {
            ImportError::SchemaError { missing_columns } => {
                assert!(missing_columns.contains(&"transaction_type".to_string()));
                assert!(missing_columns.contains(&"unit_price".to_string()));
                assert!(!missing_columns.contains(&"dealer_name".to_string()));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_validate_schema_header_variants() {
        // 表头带空格/大小写差异也应识别
        let row = row_of(&[
            ("Dealer Name", "Green Valley Traders"),
            ("Transaction Type", "invoice"),
            ("Transaction Date", "2025-04-01"),
            ("Reference Number", "INV-001"),
            ("Product Name", "NPK"),
            ("Quantity", "10"),
            ("Unit Price", "45.5"),
        ]);

        assert!(FieldMapper.validate_schema(&row).is_ok());
    }

    #[test]
    fn test_map_basic_row() {
        let row = row_of(&[
            ("dealer_name", "  Green Valley Traders  "),
            ("transaction_type", "invoice"),
            ("transaction_date", "2025-04-01T10:30:00Z"),
            ("reference_number", "INV-001"),
            ("product_name", "NPK 20-20-20"),
            ("quantity", "10"),
            ("unit_price", "45.5"),
            ("notes", ""),
        ]);

        let raw = FieldMapper.map_to_raw_sales(&row, 2);

        assert_eq!(raw.dealer_name, Some("Green Valley Traders".to_string()));
        assert_eq!(raw.transaction_date, Some("2025-04-01".to_string()));
        assert_eq!(raw.notes, None); // 空白视为缺失
        assert_eq!(raw.row_number, 2);
    }

    #[test]
    fn test_normalize_date_iso_truncation() {
        assert_eq!(
            normalize_date_cell("2025-04-01T10:30:00Z"),
            Some("2025-04-01".to_string())
        );
        assert_eq!(
            normalize_date_cell("2025-04-01 10:30:00"),
            Some("2025-04-01".to_string())
        );
    }

    #[test]
    fn test_normalize_date_serial() {
        // 序列 1 = 1899-12-31
        assert_eq!(normalize_date_cell("1"), Some("1899-12-31".to_string()));
        // 45748 = 2025-04-01
        assert_eq!(normalize_date_cell("45748"), Some("2025-04-01".to_string()));
        // 带时间小数部分只取日期
        assert_eq!(
            normalize_date_cell("45748.75"),
            Some("2025-04-01".to_string())
        );
    }

    #[test]
    fn test_normalize_date_generic_formats() {
        assert_eq!(
            normalize_date_cell("2025/04/01"),
            Some("2025-04-01".to_string())
        );
        assert_eq!(
            normalize_date_cell("04/01/2025"),
            Some("2025-04-01".to_string())
        );
    }

    #[test]
    fn test_normalize_date_invalid_becomes_none() {
        assert_eq!(normalize_date_cell("soon"), None);
        assert_eq!(normalize_date_cell(""), None);
        // 区间外数字不按序列日期处理
        assert_eq!(normalize_date_cell("4500000"), None);
    }

    #[test]
    fn test_serial_to_date_epoch() {
        assert_eq!(serial_to_date(1.0), NaiveDate::from_ymd_opt(1899, 12, 31));
        assert_eq!(serial_to_date(-5.0), None);
    }
}
