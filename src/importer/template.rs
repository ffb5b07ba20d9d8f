// ==========================================
// 经销商销售台账系统 - 导入模板生成
// ==========================================
// 职责: 生成带示例行的参考模板文件（即对终端用户的接口契约）
// 示例: 一张发票两个行项目共用同一单据号 + 一张红冲单负数数量
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use std::path::Path;

/// 模板列（与导入必需列及可选列一致）
pub const TEMPLATE_COLUMNS: [&str; 15] = [
    "dealer_name",
    "dealer_code",
    "transaction_type",
    "transaction_date",
    "reference_number",
    "product_name",
    "product_code",
    "quantity",
    "unit_price",
    "discount_amount",
    "tax_amount",
    "payment_status",
    "payment_date",
    "due_date",
    "notes",
];

/// 示例行（发票两行共用 INV-1001，红冲行数量为负）
const EXAMPLE_ROWS: [[&str; 15]; 3] = [
    [
        "Green Valley Traders",
        "DLR-001",
        "invoice",
        "2025-04-01",
        "INV-1001",
        "NPK 20-20-20",
        "NPK-20",
        "10",
        "45.50",
        "0",
        "22.75",
        "pending",
        "",
        "2025-05-01",
        "",
    ],
    [
        "Green Valley Traders",
        "DLR-001",
        "invoice",
        "2025-04-01",
        "INV-1001",
        "Urea 46%",
        "UREA-46",
        "25",
        "18.00",
        "10",
        "22.50",
        "pending",
        "",
        "2025-05-01",
        "second line item on the same invoice",
    ],
    [
        "Sunrise Agro",
        "DLR-002",
        "credit memo",
        "2025-04-03",
        "CM-2001",
        "NPK 20-20-20",
        "NPK-20",
        "-2",
        "45.50",
        "0",
        "0",
        "settled",
        "2025-04-03",
        "",
        "returned damaged bags",
    ],
];

/// 生成模板 CSV 内容
pub fn template_csv() -> ImportResult<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer.write_record(TEMPLATE_COLUMNS)?;
    for row in EXAMPLE_ROWS {
        writer.write_record(row)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ImportError::InternalError(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| ImportError::InternalError(e.to_string()))
}

/// 将模板写入文件
pub fn write_template_file<P: AsRef<Path>>(path: P) -> ImportResult<()> {
    let content = template_csv()?;
    std::fs::write(path.as_ref(), content)?;
    Ok(())
}
