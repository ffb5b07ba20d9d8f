// ==========================================
// 经销商销售台账系统 - 导入配置读取 Trait
// ==========================================
// 职责: 定义导入模块所需的配置读取接口（不包含实现）
// 红线: 不包含业务逻辑；每个条目都有文档化默认值
// ==========================================

use async_trait::async_trait;

// ==========================================
// ImportConfigReader Trait
// ==========================================
// 用途: 批次提交行为的配置读取接口
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait ImportConfigReader: Send + Sync {
    /// 获取批次大小（每次整批写入的行数）
    ///
    /// # 默认值
    /// - 10
    async fn get_batch_size(&self) -> anyhow::Result<usize>;

    /// 获取批次间节流延时（毫秒）
    ///
    /// # 默认值
    /// - 200
    ///
    /// # 用途
    /// - 保护外部台账存储，避免连续批次压垮写入端；非正确性要求
    async fn get_batch_pacing_ms(&self) -> anyhow::Result<u64>;

    /// 整批失败时是否先整批重试一次再逐行兜底
    ///
    /// # 默认值
    /// - true
    ///
    /// # 用途
    /// - 区分瞬时故障（连接抖动）与行级数据问题；
    ///   设为 false 可还原"失败即逐行"的单遍行为
    async fn get_batch_retry_once(&self) -> anyhow::Result<bool>;
}
