// ==========================================
// 经销商销售台账系统 - 人工对账队列
// ==========================================
// 职责: 未匹配经销商按原始名称（大小写不敏感）归组，
//       操作员指定一次，扇出到组内全部行
// 红线: 不做任何自动猜测匹配，歧义一律人工裁决
// ==========================================

use crate::domain::sales::{ResolvedSalesRow, UnmatchedDealerGroup};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::row_validator::ERR_DEALER_NOT_FOUND;
use tracing::info;

// ==========================================
// ReconciliationQueue - 对账队列值对象
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct ReconciliationQueue {
    groups: Vec<UnmatchedDealerGroup>,
}

impl ReconciliationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// 将一个未匹配行挂入对应分组（按小写名称归并，保留首见的原始写法）
    ///
    /// # 参数
    /// - row_index: 行在解析序列中的下标
    /// - raw_name: 表格中的经销商原始名称
    pub fn enqueue(&mut self, row_index: usize, raw_name: &str) {
        let key = raw_name.trim().to_lowercase();
        if let Some(group) = self
            .groups
            .iter_mut()
            .find(|g| g.raw_dealer_name.trim().to_lowercase() == key)
        {
            group.row_indices.push(row_index);
        } else {
            self.groups.push(UnmatchedDealerGroup {
                raw_dealer_name: raw_name.trim().to_string(),
                row_indices: vec![row_index],
                chosen_dealer_id: None,
            });
        }
    }

    pub fn groups(&self) -> &[UnmatchedDealerGroup] {
        &self.groups
    }

    /// 尚未人工指定的分组数
    pub fn pending(&self) -> usize {
        self.groups
            .iter()
            .filter(|g| g.chosen_dealer_id.is_none())
            .count()
    }

    /// 所有分组均已指定（导入进入预览的前置条件）
    pub fn is_fully_resolved(&self) -> bool {
        self.pending() == 0
    }

    /// 尚未指定的原始名称清单（用于展示/报错）
    pub fn pending_names(&self) -> Vec<String> {
        self.groups
            .iter()
            .filter(|g| g.chosen_dealer_id.is_none())
            .map(|g| g.raw_dealer_name.clone())
            .collect()
    }

    /// 记录操作员对某个原始名称的裁决
    ///
    /// # 返回
    /// - Ok(usize): 该分组覆盖的行数
    /// - Err(UnknownDealerGroup): 名称不在队列中
    pub fn choose(&mut self, raw_name: &str, dealer_id: &str) -> ImportResult<usize> {
        let key = raw_name.trim().to_lowercase();
        let group = self
            .groups
            .iter_mut()
            .find(|g| g.raw_dealer_name.trim().to_lowercase() == key)
            .ok_or_else(|| ImportError::UnknownDealerGroup(raw_name.to_string()))?;

        group.chosen_dealer_id = Some(dealer_id.to_string());
        info!(
            raw_name = %group.raw_dealer_name,
            dealer_id = %dealer_id,
            rows = group.row_indices.len(),
            "人工指定经销商"
        );
        Ok(group.row_indices.len())
    }
}

/// 将人工裁决扇出到全部关联行
///
/// 纯函数: 输入行 + 队列 → 新行序列；
/// 对已指定分组内的每一行写入 dealer_id，并清除"经销商未找到"错误，
/// 其余校验错误保留
pub fn apply_resolutions(
    rows: Vec<ResolvedSalesRow>,
    queue: &ReconciliationQueue,
) -> Vec<ResolvedSalesRow> {
    let mut rows = rows;

    for group in queue.groups() {
        let Some(dealer_id) = &group.chosen_dealer_id else {
            continue;
        };
        for &index in &group.row_indices {
            if let Some(row) = rows.get_mut(index) {
                row.dealer_id = Some(dealer_id.clone());
                row.validation_errors.retain(|e| e != ERR_DEALER_NOT_FOUND);
            }
        }
    }

    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::sales::RawSalesRow;

    fn unresolved_row(name: &str, row_number: usize) -> ResolvedSalesRow {
        let raw = RawSalesRow {
            dealer_name: Some(name.to_string()),
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
            row_number,
        };
        let mut row = ResolvedSalesRow::from_raw(raw);
        row.validation_errors.push(ERR_DEALER_NOT_FOUND.to_string());
        row
    }

    #[test]
    fn test_enqueue_groups_case_insensitive() {
        let mut queue = ReconciliationQueue::new();
        queue.enqueue(0, "Hilltop Supplies");
        queue.enqueue(3, "HILLTOP SUPPLIES");
        queue.enqueue(5, "Other Trader");

        assert_eq!(queue.groups().len(), 2);
        assert_eq!(queue.groups()[0].row_indices, vec![0, 3]);
        assert_eq!(queue.pending(), 2);
        assert!(!queue.is_fully_resolved());
    }

    #[test]
    fn test_choose_unknown_group() {
        let mut queue = ReconciliationQueue::new();
        queue.enqueue(0, "Hilltop Supplies");

        let result = queue.choose("No Such Name", "d-9");
        assert!(matches!(result, Err(ImportError::UnknownDealerGroup(_))));
    }

    #[test]
    fn test_apply_resolutions_fans_out_and_clears_error() {
        let mut queue = ReconciliationQueue::new();
        queue.enqueue(0, "Hilltop Supplies");
        queue.enqueue(1, "hilltop supplies");

        let affected = queue.choose("Hilltop Supplies", "d-7").unwrap();
        assert_eq!(affected, 2);
        assert!(queue.is_fully_resolved());

        let mut rows = vec![
            unresolved_row("Hilltop Supplies", 2),
            unresolved_row("hilltop supplies", 3),
        ];
        // 其中一行另有其他错误，应保留
        rows[1].validation_errors.push("Invalid quantity".to_string());

        let rows = apply_resolutions(rows, &queue);

        assert_eq!(rows[0].dealer_id, Some("d-7".to_string()));
        assert!(rows[0].validation_errors.is_empty());
        assert_eq!(rows[1].dealer_id, Some("d-7".to_string()));
        assert_eq!(rows[1].validation_errors, vec!["Invalid quantity".to_string()]);
    }

    #[test]
    fn test_apply_resolutions_skips_unchosen_groups() {
        let mut queue = ReconciliationQueue::new();
        queue.enqueue(0, "Hilltop Supplies");

        let rows = apply_resolutions(vec![unresolved_row("Hilltop Supplies", 2)], &queue);

        assert!(rows[0].dealer_id.is_none());
        assert!(rows[0]
            .validation_errors
            .contains(&ERR_DEALER_NOT_FOUND.to_string()));
    }
}
