//! 账本写入服务 - 业务能力层
//!
//! 只负责"往账本追加一行"能力，不关心流程

use chrono::Local;
use tracing::debug;

use crate::error::LedgerError;
use crate::infrastructure::Worksheet;
use crate::models::ledger::{NOTE_AUTO_APPLIED, STATUS_FAILED, STATUS_SUBMITTED};
use crate::models::LedgerRecord;
use crate::workflow::{ApplicationAttempt, ApplicationState};

/// 账本写入服务
///
/// 职责：
/// - 把一次终态的投递尝试转换成一行记录
/// - 序号在本次运行内从 1 递增，写入失败不占用序号
/// - 只追加，不去重
pub struct LedgerWriter<W: Worksheet> {
    worksheet: W,
    next_sequence: u32,
}

impl<W: Worksheet> LedgerWriter<W> {
    pub fn new(worksheet: W) -> Self {
        Self {
            worksheet,
            next_sequence: 1,
        }
    }

    pub fn worksheet(&self) -> &W {
        &self.worksheet
    }

    /// 已成功写入的行数
    pub fn written(&self) -> u32 {
        self.next_sequence - 1
    }

    /// 写入一次投递结果
    ///
    /// 未到终态的尝试不会写入
    pub async fn record(&mut self, attempt: &ApplicationAttempt) -> Result<LedgerRecord, LedgerError> {
        let (status, notes) = match attempt.state() {
            ApplicationState::Submitted => (STATUS_SUBMITTED.to_string(), NOTE_AUTO_APPLIED.to_string()),
            ApplicationState::Failed => {
                let reason = attempt
                    .failure_reason()
                    .map(|r| r.as_str().to_string())
                    .unwrap_or_default();
                (STATUS_FAILED.to_string(), reason)
            }
            other => {
                return Err(LedgerError::AppendFailed(format!(
                    "投递尚未结束 ({:?})，不能写入账本",
                    other
                )))
            }
        };

        let posting = attempt.posting();
        let record = LedgerRecord {
            sequence: self.next_sequence,
            timestamp: Local::now(),
            title: posting.title.clone(),
            company: posting.company.clone(),
            region: posting.region.name().to_string(),
            link: posting.link.clone(),
            salary: posting.salary.clone(),
            status,
            notes,
        };

        self.worksheet.append_row(record.to_row()).await?;
        self.next_sequence += 1;
        debug!("📝 账本第 {} 行: {} @ {}", record.sequence, record.title, record.company);

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{JobPosting, Region};
    use crate::workflow::FailureReason;
    use async_trait::async_trait;
    use serde_json::{json, Value as JsonValue};
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemorySheet {
        rows: Mutex<Vec<Vec<JsonValue>>>,
        fail_next: Mutex<bool>,
    }

    #[async_trait]
    impl Worksheet for MemorySheet {
        async fn append_row(&self, row: Vec<JsonValue>) -> Result<(), LedgerError> {
            let mut fail = self.fail_next.lock().unwrap();
            if *fail {
                *fail = false;
                return Err(LedgerError::AppendFailed("quota".to_string()));
            }
            self.rows.lock().unwrap().push(row);
            Ok(())
        }
    }

    fn attempt(title: &str) -> ApplicationAttempt {
        ApplicationAttempt::new(JobPosting {
            title: title.to_string(),
            company: "Acme".to_string(),
            link: format!("https://www.linkedin.com/jobs/view/{}", title),
            region: Region::DominicanRepublic,
            salary: "TBD".to_string(),
            easy_apply: true,
        })
    }

    fn submitted(title: &str) -> ApplicationAttempt {
        let mut a = attempt(title);
        a.advance(ApplicationState::Opened).unwrap();
        a.advance(ApplicationState::FormHandled).unwrap();
        a.advance(ApplicationState::Submitted).unwrap();
        a
    }

    #[test]
    fn submitted_attempt_becomes_postulado_row() {
        let mut writer = LedgerWriter::new(MemorySheet::default());
        let record = tokio_test::block_on(writer.record(&submitted("1"))).unwrap();

        assert_eq!(record.sequence, 1);
        assert_eq!(record.status, "Postulado");
        assert_eq!(record.notes, "Auto-postulado");
        assert_eq!(record.region, "Dominican Republic");

        let rows = writer.worksheet().rows.lock().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][2], json!("1"));
        assert_eq!(rows[0][6], json!("TBD"));
    }

    #[test]
    fn failed_attempt_carries_reason() {
        let mut writer = LedgerWriter::new(MemorySheet::default());
        let mut a = attempt("2");
        a.fail(FailureReason::NavigationFailed, "dns").unwrap();

        let record = tokio_test::block_on(writer.record(&a)).unwrap();
        assert_eq!(record.status, "Fallido");
        assert_eq!(record.notes, "NavigationFailed");
    }

    #[test]
    fn unfinished_attempt_is_rejected() {
        let mut writer = LedgerWriter::new(MemorySheet::default());
        assert!(tokio_test::block_on(writer.record(&attempt("3"))).is_err());
        assert_eq!(writer.written(), 0);
    }

    #[test]
    fn failed_append_does_not_consume_sequence() {
        let sheet = MemorySheet::default();
        *sheet.fail_next.lock().unwrap() = true;
        let mut writer = LedgerWriter::new(sheet);

        assert!(tokio_test::block_on(writer.record(&submitted("a"))).is_err());
        let record = tokio_test::block_on(writer.record(&submitted("b"))).unwrap();
        assert_eq!(record.sequence, 1);
        assert_eq!(writer.written(), 1);
    }
}
