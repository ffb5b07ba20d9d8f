// ==========================================
// 经销商销售台账系统 - 行校验器实现
// ==========================================
// 职责: 交易类型规范化 + 数量符号约定 + 单价/日期校验
// 口径: 所有规则独立执行，错误累积不短路；
//       校验失败只排除该行，绝不中止运行
// ==========================================

use crate::domain::sales::ResolvedSalesRow;
use crate::domain::types::TransactionType;
use chrono::NaiveDate;

// 行级错误文案（对账队列与测试依赖其精确值）
pub const ERR_DEALER_NOT_FOUND: &str = "Dealer not found";
pub const ERR_MISSING_DEALER_NAME: &str = "Missing dealer name";
pub const ERR_INVALID_TYPE: &str = "Invalid transaction type";
pub const ERR_INVALID_QUANTITY: &str = "Invalid quantity";
pub const ERR_NEGATIVE_INVOICE_QUANTITY: &str = "Invalid quantity for invoice: must be positive";
pub const ERR_INVALID_UNIT_PRICE: &str = "Invalid unit price";
pub const ERR_INVALID_DATE: &str = "Invalid or missing transaction date";
pub const ERR_MISSING_REFERENCE: &str = "Missing reference number";
pub const ERR_MISSING_PRODUCT_NAME: &str = "Missing product name";

pub struct RowValidator;

impl RowValidator {
    /// 校验并规范化单行（就地填充规范化字段与错误清单）
    ///
    /// 规则（全部执行，互不影响）:
    /// - 交易类型: 规范化解析，失败记错
    /// - 数量: 必须为非零数值；红冲行为正则静默取负（输入宽容，非错误），
    ///   发票行为负记错
    /// - 单价: 必须为 >= 0 的数值
    /// - 日期: 必须可解析
    /// - 单据号/商品名: 台账行必填
    pub fn validate(&self, row: &mut ResolvedSalesRow) {
        // 交易类型
        let tx_type = row
            .raw
            .transaction_type
            .as_deref()
            .and_then(TransactionType::parse);
        if tx_type.is_none() {
            row.validation_errors.push(ERR_INVALID_TYPE.to_string());
        }
        row.transaction_type = tx_type;

        // 数量（含符号约定）
        match normalize_quantity(tx_type, row.raw.quantity.as_deref()) {
            Ok(quantity) => row.quantity = Some(quantity),
            Err(message) => row.validation_errors.push(message),
        }

        // 单价
        match parse_number(row.raw.unit_price.as_deref()) {
            Some(price) if price >= 0.0 => row.unit_price = Some(price),
            _ => row.validation_errors.push(ERR_INVALID_UNIT_PRICE.to_string()),
        }

        // 交易日期（映射阶段已规范化为 YYYY-MM-DD，失败为 None）
        match row
            .raw
            .transaction_date
            .as_deref()
            .and_then(|v| NaiveDate::parse_from_str(v, "%Y-%m-%d").ok())
        {
            Some(date) => row.transaction_date = Some(date),
            None => row.validation_errors.push(ERR_INVALID_DATE.to_string()),
        }

        // 台账必填字段
        if row.raw.reference_number.is_none() {
            row.validation_errors.push(ERR_MISSING_REFERENCE.to_string());
        }
        if row.raw.product_name.is_none() {
            row.validation_errors
                .push(ERR_MISSING_PRODUCT_NAME.to_string());
        }

        // 注: 同一运行内允许 (reference_number, product_name) 重复 ——
        // 一张发票可以多行列出同一商品（不同批次/价格），不做查重
    }

    /// 对全部行执行校验
    pub fn validate_all(&self, rows: &mut [ResolvedSalesRow]) {
        for row in rows.iter_mut() {
            self.validate(row);
        }
    }
}

/// 数量规范化（含业务符号约定）
///
/// # 规则
/// - 非数值或为零 → Err
/// - 红冲行: 必须落为负数，输入为正时静默取负；已为负保持原样
/// - 发票行: 必须为正数，为负记错
/// - 类型未知时只做数值性检查，符号规则不适用
///
/// 幂等: 对已规范化的数量再次应用结果不变
pub fn normalize_quantity(
    tx_type: Option<TransactionType>,
    raw: Option<&str>,
) -> Result<f64, String> {
    let Some(quantity) = parse_number(raw) else {
        return Err(ERR_INVALID_QUANTITY.to_string());
    };
    if quantity == 0.0 || !quantity.is_finite() {
        return Err(ERR_INVALID_QUANTITY.to_string());
    }

    match tx_type {
        Some(TransactionType::CreditMemo) => {
            // 输入宽容: 正数视为操作员按绝对值填写
            Ok(if quantity > 0.0 { -quantity } else { quantity })
        }
        Some(TransactionType::Invoice) => {
            if quantity < 0.0 {
                Err(ERR_NEGATIVE_INVOICE_QUANTITY.to_string())
            } else {
                Ok(quantity)
            }
        }
        None => Ok(quantity),
    }
}

/// 数值解析（容忍千分位逗号与首尾空白）
fn parse_number(raw: Option<&str>) -> Option<f64> {
    raw.map(|v| v.trim().replace(',', ""))
        .filter(|v| !v.is_empty())
        .and_then(|v| v.parse::<f64>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::sales::RawSalesRow;

    fn base_row() -> ResolvedSalesRow {
        let raw = RawSalesRow {
            dealer_name: Some("Green Valley Traders".to_string()),
            dealer_code: None,
            transaction_type: Some("invoice".to_string()),
            transaction_date: Some("2025-04-01".to_string()),
            reference_number: Some("INV-001".to_string()),
            product_name: Some("NPK 20-20-20".to_string()),
            product_code: None,
            quantity: Some("10".to_string()),
            unit_price: Some("45.5".to_string()),
            discount_amount: None,
            tax_amount: None,
            payment_status: None,
            payment_date: None,
            due_date: None,
            notes: None,
            row_number: 2,
        };
        let mut row = ResolvedSalesRow::from_raw(raw);
        row.dealer_id = Some("d-1".to_string());
        row
    }

    #[test]
    fn test_valid_invoice_row() {
        let mut row = base_row();
        RowValidator.validate(&mut row);

        assert!(row.validation_errors.is_empty());
        assert_eq!(row.transaction_type, Some(TransactionType::Invoice));
        assert_eq!(row.quantity, Some(10.0));
        assert_eq!(row.unit_price, Some(45.5));
    }

    #[test]
    fn test_credit_memo_positive_quantity_negated_silently() {
        let mut row = base_row();
        row.raw.transaction_type = Some("Credit Memo".to_string());
        row.raw.quantity = Some("5".to_string());

        RowValidator.validate(&mut row);

        assert!(row.validation_errors.is_empty());
        assert_eq!(row.transaction_type, Some(TransactionType::CreditMemo));
        assert_eq!(row.quantity, Some(-5.0));
    }

    #[test]
    fn test_credit_memo_negative_quantity_kept() {
        let mut row = base_row();
        row.raw.transaction_type = Some("credit_memo".to_string());
        row.raw.quantity = Some("-5".to_string());

        RowValidator.validate(&mut row);

        assert!(row.validation_errors.is_empty());
        assert_eq!(row.quantity, Some(-5.0));
    }

    #[test]
    fn test_invoice_negative_quantity_rejected() {
        let mut row = base_row();
        row.raw.quantity = Some("-3".to_string());

        RowValidator.validate(&mut row);

        assert_eq!(
            row.validation_errors,
            vec![ERR_NEGATIVE_INVOICE_QUANTITY.to_string()]
        );
    }

    #[test]
    fn test_zero_and_non_numeric_quantity_rejected() {
        for bad in ["0", "abc", ""] {
            let mut row = base_row();
            row.raw.quantity = if bad.is_empty() {
                None
            } else {
                Some(bad.to_string())
            };
            RowValidator.validate(&mut row);
            assert!(
                row.validation_errors.contains(&ERR_INVALID_QUANTITY.to_string()),
                "quantity {bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_invalid_unit_price() {
        let mut row = base_row();
        row.raw.unit_price = Some("-1".to_string());
        RowValidator.validate(&mut row);
        assert!(row
            .validation_errors
            .contains(&ERR_INVALID_UNIT_PRICE.to_string()));

        let mut row = base_row();
        row.raw.unit_price = Some("cheap".to_string());
        RowValidator.validate(&mut row);
        assert!(row
            .validation_errors
            .contains(&ERR_INVALID_UNIT_PRICE.to_string()));
    }

    #[test]
    fn test_invalid_date() {
        let mut row = base_row();
        row.raw.transaction_date = None;
        RowValidator.validate(&mut row);
        assert!(row.validation_errors.contains(&ERR_INVALID_DATE.to_string()));
    }

    #[test]
    fn test_errors_accumulate_without_short_circuit() {
        let mut row = base_row();
        row.raw.transaction_type = Some("refund".to_string());
        row.raw.quantity = Some("zero".to_string());
        row.raw.unit_price = Some("free".to_string());
        row.raw.transaction_date = None;

        RowValidator.validate(&mut row);

        assert_eq!(row.validation_errors.len(), 4);
        assert!(row.validation_errors.contains(&ERR_INVALID_TYPE.to_string()));
        assert!(row
            .validation_errors
            .contains(&ERR_INVALID_QUANTITY.to_string()));
        assert!(row
            .validation_errors
            .contains(&ERR_INVALID_UNIT_PRICE.to_string()));
        assert!(row.validation_errors.contains(&ERR_INVALID_DATE.to_string()));
    }

    #[test]
    fn test_normalize_quantity_idempotent() {
        // 红冲: 5 → -5，再次应用 -5 → -5
        let first = normalize_quantity(Some(TransactionType::CreditMemo), Some("5")).unwrap();
        assert_eq!(first, -5.0);
        let second =
            normalize_quantity(Some(TransactionType::CreditMemo), Some(&first.to_string()))
                .unwrap();
        assert_eq!(second, first);

        // 发票: 10 → 10，再次应用不变
        let first = normalize_quantity(Some(TransactionType::Invoice), Some("10")).unwrap();
        let second =
            normalize_quantity(Some(TransactionType::Invoice), Some(&first.to_string())).unwrap();
        assert_eq!(second, first);
    }

    #[test]
    fn test_quantity_with_thousands_separator() {
        let mut row = base_row();
        row.raw.quantity = Some("1,200".to_string());
        RowValidator.validate(&mut row);
        assert!(row.validation_errors.is_empty());
        assert_eq!(row.quantity, Some(1200.0));
    }
}
