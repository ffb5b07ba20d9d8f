// ==========================================
// 经销商销售台账系统 - 实体匹配器实现
// ==========================================
// 职责: 自由文本经销商/商品名 → 目录主数据 ID
// 口径: 仅大小写不敏感的精确匹配（名称优先，编码兜底），
//       不做模糊匹配；经销商未命中进入人工对账队列，
//       商品未命中不阻断（按名称留存）
// ==========================================

use crate::domain::sales::{
    CanonicalDealer, CanonicalProduct, RawSalesRow, ResolvedSalesRow,
};
use crate::importer::reconciliation::ReconciliationQueue;
use crate::importer::row_validator::{ERR_DEALER_NOT_FOUND, ERR_MISSING_DEALER_NAME};
use std::collections::HashMap;
use tracing::debug;

// ==========================================
// EntityResolver - 目录快照索引
// ==========================================
// 每次导入运行构建一次；目录在运行期间视为只读
pub struct EntityResolver {
    dealers: Vec<CanonicalDealer>,
    products: Vec<CanonicalProduct>,

    // 四个大小写不敏感索引（键为小写）
    dealer_by_name: HashMap<String, usize>,
    dealer_by_code: HashMap<String, usize>,
    product_by_name: HashMap<String, usize>,
    product_by_code: HashMap<String, usize>,
}

impl EntityResolver {
    /// 从目录快照构建索引
    ///
    /// 同名（小写后）条目以快照中首个为准，保证同一目录下匹配结果确定
    pub fn from_catalog(dealers: Vec<CanonicalDealer>, products: Vec<CanonicalProduct>) -> Self {
        let mut dealer_by_name = HashMap::new();
        let mut dealer_by_code = HashMap::new();
        for (idx, dealer) in dealers.iter().enumerate() {
            dealer_by_name
                .entry(dealer.name.trim().to_lowercase())
                .or_insert(idx);
            dealer_by_code
                .entry(dealer.code.trim().to_lowercase())
                .or_insert(idx);
        }

        let mut product_by_name = HashMap::new();
        let mut product_by_code = HashMap::new();
        for (idx, product) in products.iter().enumerate() {
            product_by_name
                .entry(product.name.trim().to_lowercase())
                .or_insert(idx);
            product_by_code
                .entry(product.code.trim().to_lowercase())
                .or_insert(idx);
        }

        debug!(
            dealers = dealers.len(),
            products = products.len(),
            "目录索引构建完成"
        );

        Self {
            dealers,
            products,
            dealer_by_name,
            dealer_by_code,
            product_by_name,
            product_by_code,
        }
    }

    /// 经销商匹配: 名称优先，未命中且提供了编码时按编码兜底
    pub fn resolve_dealer(&self, name: &str, code: Option<&str>) -> Option<&CanonicalDealer> {
        if let Some(&idx) = self.dealer_by_name.get(&name.trim().to_lowercase()) {
            return self.dealers.get(idx);
        }
        if let Some(code) = code {
            if let Some(&idx) = self.dealer_by_code.get(&code.trim().to_lowercase()) {
                return self.dealers.get(idx);
            }
        }
        None
    }

    /// 商品匹配: 与经销商同样的两步查找
    pub fn resolve_product(&self, name: &str, code: Option<&str>) -> Option<&CanonicalProduct> {
        if let Some(&idx) = self.product_by_name.get(&name.trim().to_lowercase()) {
            return self.products.get(idx);
        }
        if let Some(code) = code {
            if let Some(&idx) = self.product_by_code.get(&code.trim().to_lowercase()) {
                return self.products.get(idx);
            }
        }
        None
    }

    /// 经销商 ID 是否存在于目录快照（人工指定时校验）
    pub fn dealer_id_exists(&self, dealer_id: &str) -> bool {
        self.dealers.iter().any(|d| d.id == dealer_id)
    }

    /// 逐行匹配，产出解析行与未匹配经销商队列
    ///
    /// # 返回
    /// - Vec<ResolvedSalesRow>: 保持文件行序
    /// - ReconciliationQueue: 按原始名称（大小写不敏感）去重后的未匹配分组
    pub fn resolve_rows(
        &self,
        raw_rows: Vec<RawSalesRow>,
    ) -> (Vec<ResolvedSalesRow>, ReconciliationQueue) {
        let mut queue = ReconciliationQueue::new();
        let mut resolved = Vec::with_capacity(raw_rows.len());

        for (index, raw) in raw_rows.into_iter().enumerate() {
            let mut row = ResolvedSalesRow::from_raw(raw);

            // 经销商匹配
            match row.raw.dealer_name.clone() {
                None => {
                    // 名称缺失无法匹配也无法入队，直接记为行级错误
                    row.validation_errors.push(ERR_MISSING_DEALER_NAME.to_string());
                }
                Some(name) => {
                    match self.resolve_dealer(&name, row.raw.dealer_code.as_deref()) {
                        Some(dealer) => {
                            row.dealer_id = Some(dealer.id.clone());
                            row.matched_dealer_code = Some(dealer.code.clone());
                        }
                        None => {
                            row.validation_errors.push(ERR_DEALER_NOT_FOUND.to_string());
                            queue.enqueue(index, &name);
                        }
                    }
                }
            }

            // 商品匹配（未命中不阻断）
            if let Some(name) = row.raw.product_name.clone() {
                if let Some(product) = self.resolve_product(&name, row.raw.product_code.as_deref())
                {
                    row.product_id = Some(product.id.clone());
                }
            }

            resolved.push(row);
        }

        debug!(
            rows = resolved.len(),
            unmatched_groups = queue.groups().len(),
            "实体匹配完成"
        );

        (resolved, queue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> (Vec<CanonicalDealer>, Vec<CanonicalProduct>) {
        let dealers = vec![
            CanonicalDealer {
                id: "d-1".to_string(),
                code: "DLR-001".to_string(),
                name: "Green Valley Traders".to_string(),
            },
            CanonicalDealer {
                id: "d-2".to_string(),
                code: "DLR-002".to_string(),
                name: "Sunrise Agro".to_string(),
            },
        ];
        let products = vec![CanonicalProduct {
            id: "p-1".to_string(),
            code: "NPK-20".to_string(),
            name: "NPK 20-20-20".to_string(),
        }];
        (dealers, products)
    }

    fn raw_row(dealer: &str, code: Option<&str>, product: &str) -> RawSalesRow {
        RawSalesRow {
            dealer_name: if dealer.is_empty() {
                None
            } else {
                Some(dealer.to_string())
            },
            dealer_code: code.map(|c| c.to_string()),
            transaction_type: Some("invoice".to_string()),
            transaction_date: Some("2025-04-01".to_string()),
            reference_number: Some("INV-001".to_string()),
            product_name: Some(product.to_string()),
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
        }
    }

    #[test]
    fn test_resolve_dealer_case_insensitive() {
        let (dealers, products) = catalog();
        let resolver = EntityResolver::from_catalog(dealers, products);

        let dealer = resolver.resolve_dealer("green valley traders", None).unwrap();
        assert_eq!(dealer.id, "d-1");
    }

    #[test]
    fn test_resolve_dealer_code_fallback() {
        let (dealers, products) = catalog();
        let resolver = EntityResolver::from_catalog(dealers, products);

        // 名称拼写不上，但编码命中
        let dealer = resolver
            .resolve_dealer("G.V. Traders", Some("dlr-001"))
            .unwrap();
        assert_eq!(dealer.id, "d-1");
    }

    #[test]
    fn test_resolve_dealer_miss() {
        let (dealers, products) = catalog();
        let resolver = EntityResolver::from_catalog(dealers, products);

        assert!(resolver.resolve_dealer("Unknown Trader", None).is_none());
        assert!(resolver
            .resolve_dealer("Unknown Trader", Some("NOPE"))
            .is_none());
    }

    #[test]
    fn test_resolve_deterministic() {
        let (dealers, products) = catalog();
        let resolver = EntityResolver::from_catalog(dealers.clone(), products.clone());

        // 同一输入多次匹配结果一致
        for _ in 0..3 {
            let d = resolver.resolve_dealer("SUNRISE AGRO", None).unwrap();
            assert_eq!(d.id, "d-2");
        }
    }

    #[test]
    fn test_resolve_rows_unmatched_goes_to_queue() {
        let (dealers, products) = catalog();
        let resolver = EntityResolver::from_catalog(dealers, products);

        let rows = vec![
            raw_row("Green Valley Traders", None, "NPK 20-20-20"),
            raw_row("Hilltop Supplies", None, "NPK 20-20-20"),
            raw_row("HILLTOP SUPPLIES", None, "Unknown Product"),
        ];

        let (resolved, queue) = resolver.resolve_rows(rows);

        assert_eq!(resolved[0].dealer_id, Some("d-1".to_string()));
        assert_eq!(resolved[0].matched_dealer_code, Some("DLR-001".to_string()));
        assert_eq!(resolved[0].product_id, Some("p-1".to_string()));

        // 未匹配行: 记录错误并入队
        assert!(resolved[1].dealer_id.is_none());
        assert!(resolved[1]
            .validation_errors
            .contains(&ERR_DEALER_NOT_FOUND.to_string()));

        // 大小写不同的同名应并为一组
        assert_eq!(queue.groups().len(), 1);
        assert_eq!(queue.groups()[0].row_indices, vec![1, 2]);

        // 商品未命中不阻断
        assert!(resolved[2].product_id.is_none());
        assert_eq!(resolved[2].validation_errors.len(), 1); // 仅经销商错误
    }

    #[test]
    fn test_resolve_rows_missing_dealer_name() {
        let (dealers, products) = catalog();
        let resolver = EntityResolver::from_catalog(dealers, products);

        let (resolved, queue) = resolver.resolve_rows(vec![raw_row("", None, "NPK 20-20-20")]);

        assert!(resolved[0]
            .validation_errors
            .contains(&ERR_MISSING_DEALER_NAME.to_string()));
        // 名称缺失不入队（无法向操作员展示可选名称）
        assert!(queue.groups().is_empty());
    }
}
