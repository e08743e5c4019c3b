//! 外部账本能力 - 基础设施层
//!
//! 账本只有两个能力：打开一张表、往表里追加一行。

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::error::LedgerError;

/// 账本服务
#[async_trait]
pub trait LedgerService: Send + Sync {
    type Sheet: Worksheet;

    /// 打开账本（对应表格的第一张工作表）
    async fn open(&self, ledger_id: &str) -> Result<Self::Sheet, LedgerError>;
}

/// 账本中的一张工作表
#[async_trait]
pub trait Worksheet: Send + Sync {
    /// 追加一行，字段顺序即列顺序
    async fn append_row(&self, row: Vec<JsonValue>) -> Result<(), LedgerError>;
}
