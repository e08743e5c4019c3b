use chrono::{DateTime, Local};
use serde_json::{json, Value as JsonValue};

/// 成功投递的状态文本
pub const STATUS_SUBMITTED: &str = "Postulado";
/// 投递失败的状态文本
pub const STATUS_FAILED: &str = "Fallido";
/// 自动投递的备注
pub const NOTE_AUTO_APPLIED: &str = "Auto-postulado";

/// 账本时间戳格式
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

/// 账本中的一行（固定 9 列，顺序有意义）
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerRecord {
    /// 本次运行内的序号（不跨运行唯一）
    pub sequence: u32,
    pub timestamp: DateTime<Local>,
    pub title: String,
    pub company: String,
    pub region: String,
    pub link: String,
    pub salary: String,
    pub status: String,
    pub notes: String,
}

impl LedgerRecord {
    /// 列标题，与 `to_row` 的顺序一致
    pub const HEADERS: [&'static str; 9] = [
        "N°", "Fecha", "Puesto", "Empresa", "País", "Link", "Salario", "Estado", "Notas",
    ];

    /// 转换为账本的一行
    pub fn to_row(&self) -> Vec<JsonValue> {
        vec![
            json!(self.sequence),
            json!(self.timestamp.format(TIMESTAMP_FORMAT).to_string()),
            json!(self.title),
            json!(self.company),
            json!(self.region),
            json!(self.link),
            json!(self.salary),
            json!(self.status),
            json!(self.notes),
        ]
    }
}
