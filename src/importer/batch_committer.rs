// ==========================================
// 经销商销售台账系统 - 批次提交器实现
// ==========================================
// 职责: 校验通过的行按固定批次顺序写入台账存储
// 口径: 整批失败 → (可配置)整批重试一次 → 逐行兜底，
//       单行失败只影响该行；跨批次不构成事务，
//       中途放弃时已提交批次保持已提交（不回滚）
// ==========================================

use crate::domain::sales::{ImportStats, RowError, SalesLedgerRow};
use crate::domain::types::CommitState;
use crate::repository::ledger_repo::SalesLedgerStore;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

// ==========================================
// BatchPacer - 批次间节流策略
// ==========================================
// 节流只是保护外部存储的缓冲，不是正确性要求；
// 测试用 NoopPacer 消除真实等待
#[async_trait]
pub trait BatchPacer: Send + Sync {
    async fn pause(&self);
}

/// 真实延时节流
pub struct TokioPacer {
    delay: Duration,
}

impl TokioPacer {
    pub fn new(delay_ms: u64) -> Self {
        Self {
            delay: Duration::from_millis(delay_ms),
        }
    }
}

#[async_trait]
impl BatchPacer for TokioPacer {
    async fn pause(&self) {
        tokio::time::sleep(self.delay).await;
    }
}

/// 无等待节流（测试用）
pub struct NoopPacer;

#[async_trait]
impl BatchPacer for NoopPacer {
    async fn pause(&self) {}
}

// ==========================================
// CommitRow - 提交单元（台账行 + 原始文件行号）
// ==========================================
#[derive(Debug, Clone)]
pub struct CommitRow {
    pub row_number: usize,
    pub ledger_row: SalesLedgerRow,
}

// ==========================================
// BatchCommitter
// ==========================================
// 状态机: Idle → Committing → (Complete | Aborted)
pub struct BatchCommitter {
    store: Arc<dyn SalesLedgerStore>,
    batch_size: usize,
    retry_batch_once: bool,
    pacer: Arc<dyn BatchPacer>,
    state: CommitState,
    cancel: Arc<AtomicBool>,
}

impl BatchCommitter {
    pub fn new(
        store: Arc<dyn SalesLedgerStore>,
        batch_size: usize,
        retry_batch_once: bool,
        pacer: Arc<dyn BatchPacer>,
    ) -> Self {
        Self {
            store,
            batch_size: batch_size.max(1),
            retry_batch_once,
            pacer,
            state: CommitState::Idle,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// 复用外部取消令牌（会话层持有同一令牌）
    pub fn with_cancel_token(mut self, token: Arc<AtomicBool>) -> Self {
        self.cancel = token;
        self
    }

    pub fn state(&self) -> CommitState {
        self.state
    }

    /// 取消令牌: 置位后提交循环在下一个批次边界停止，
    /// 已提交批次保持已提交
    pub fn cancel_token(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// 顺序提交全部批次
    ///
    /// # 返回
    /// - ImportStats: successful + failed == 提交行数（未被取消时）
    ///
    /// # 失败处理
    /// 1. 整批插入失败时，若开启 retry_batch_once 先整批重试一次
    ///    （瞬时故障不应被误报为行级错误）
    /// 2. 仍失败则逐行兜底插入，逐行计入成功/失败
    /// 3. 行级失败终止于该行，不再重试
    pub async fn commit(&mut self, rows: Vec<CommitRow>) -> ImportStats {
        let mut stats = ImportStats {
            total: rows.len(),
            ..ImportStats::default()
        };

        self.state = CommitState::Committing;
        info!(
            rows = rows.len(),
            batch_size = self.batch_size,
            "开始批次提交"
        );

        let batch_count = rows.len().div_ceil(self.batch_size);
        for (batch_index, batch) in rows.chunks(self.batch_size).enumerate() {
            // 操作员放弃: 停在批次边界，不做任何回滚
            if self.cancel.load(Ordering::SeqCst) {
                warn!(
                    committed = stats.successful,
                    failed = stats.failed,
                    "提交被放弃，已提交批次保持不变"
                );
                self.state = CommitState::Aborted;
                return stats;
            }

            self.commit_batch(batch_index, batch, &mut stats).await;

            // 批次间节流（最后一批后不等待）
            if batch_index + 1 < batch_count {
                self.pacer.pause().await;
            }
        }

        self.state = CommitState::Complete;
        info!(
            successful = stats.successful,
            failed = stats.failed,
            "批次提交完成"
        );
        stats
    }

    /// 提交单个批次（含重试与逐行兜底）
    async fn commit_batch(&self, batch_index: usize, batch: &[CommitRow], stats: &mut ImportStats) {
        let ledger_rows: Vec<SalesLedgerRow> =
            batch.iter().map(|r| r.ledger_row.clone()).collect();

        match self.store.insert_batch(&ledger_rows).await {
            Ok(()) => {
                debug!(batch = batch_index, rows = batch.len(), "整批插入成功");
                stats.successful += batch.len();
                return;
            }
            Err(err) => {
                warn!(batch = batch_index, error = %err, "整批插入失败");
            }
        }

        // 整批重试一次: 区分瞬时故障与行级数据问题
        if self.retry_batch_once {
            if self.store.insert_batch(&ledger_rows).await.is_ok() {
                debug!(batch = batch_index, "整批重试成功");
                stats.successful += batch.len();
                return;
            }
        }

        // 逐行兜底: 把故障半径压缩到单行
        debug!(batch = batch_index, "降级为逐行插入");
        for row in batch {
            match self.store.insert_one(&row.ledger_row).await {
                Ok(()) => stats.successful += 1,
                Err(err) => {
                    warn!(row = row.row_number, error = %err, "行插入失败");
                    stats.failed += 1;
                    stats.errors.push(RowError {
                        row: row.row_number,
                        message: err.to_string(),
                    });
                }
            }
        }
    }
}
