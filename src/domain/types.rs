// ==========================================
// 经销商销售台账系统 - 领域类型
// ==========================================
// 职责: 交易类型与导入流程状态机的枚举定义
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// TransactionType - 交易类型
// ==========================================
// 约定: invoice 数量/金额为正，credit_memo 数量/金额为负
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionType {
    Invoice,    // 销售发票
    CreditMemo, // 红字冲销（贷项通知单）
}

impl TransactionType {
    /// 规范化解析交易类型
    ///
    /// # 规则
    /// - 小写化后去除空白/连字符/下划线
    /// - {"invoice", "inv"} → Invoice
    /// - {"creditmemo", "credit"} → CreditMemo
    /// - 其他 → None（由行校验记录错误）
    pub fn parse(raw: &str) -> Option<Self> {
        let canonical: String = raw
            .to_lowercase()
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-' && *c != '_')
            .collect();

        match canonical.as_str() {
            "invoice" | "inv" => Some(TransactionType::Invoice),
            "creditmemo" | "credit" => Some(TransactionType::CreditMemo),
            _ => None,
        }
    }

    /// 台账存储格式
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Invoice => "invoice",
            TransactionType::CreditMemo => "credit_memo",
        }
    }
}

// ==========================================
// ImportStage - 导入向导状态机
// ==========================================
// 流转: Upload → Mapping → DealerMapping → Preview → Importing → Complete
// 说明: DealerMapping 仅在存在未匹配经销商时进入
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImportStage {
    Upload,        // 等待文件
    Mapping,       // 已解析，等待实体匹配
    DealerMapping, // 存在未匹配经销商，等待人工指定
    Preview,       // 校验完成，等待操作员确认
    Importing,     // 批次提交中
    Complete,      // 运行结束
}

impl ImportStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportStage::Upload => "UPLOAD",
            ImportStage::Mapping => "MAPPING",
            ImportStage::DealerMapping => "DEALER_MAPPING",
            ImportStage::Preview => "PREVIEW",
            ImportStage::Importing => "IMPORTING",
            ImportStage::Complete => "COMPLETE",
        }
    }
}

// ==========================================
// CommitState - 批次提交器状态机
// ==========================================
// 流转: Idle → Committing → (Complete | Aborted)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommitState {
    Idle,
    Committing,
    Complete,
    Aborted,
}
