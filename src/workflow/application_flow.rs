//! 投递流程 - 流程层
//!
//! 核心职责：定义"一个职位"的完整投递流程
//!
//! 流程顺序：
//! 1. 打开职位页面 → Opened
//! 2. 点击 Easy Apply → 自动填写空白文本框 → FormHandled
//! 3. 点击提交按钮 → Submitted
//!
//! 任何一步失败都直接进入 Failed，不重试

use phf::phf_set;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::config::ApplySettings;
use crate::infrastructure::{BrowserDriver, DomElement};
use crate::models::JobPosting;
use crate::workflow::attempt::{ApplicationAttempt, ApplicationState, FailureReason};

/// 职位页面上的 Easy Apply 按钮
///
/// 只认 aria-label；`jobs-apply-button` 类同样出现在外部"Apply"按钮上
pub const EASY_APPLY_BUTTON: &str = "button[aria-label*='Easy Apply'], button[aria-label*='Solicitud sencilla']";
/// 需要自动填写的文本框（只在 Easy Apply 弹窗内）
pub const FORM_TEXT_FIELDS: &str = ".jobs-easy-apply-modal input[type='text'], .jobs-easy-apply-modal textarea";
/// 候选提交按钮（只在 Easy Apply 弹窗内）
pub const FORM_BUTTONS: &str = ".jobs-easy-apply-modal button";

/// 各语言界面中"提交"按钮的文本（小写）
static SUBMIT_LABELS: phf::Set<&'static str> = phf_set! {
    "submit",
    "submit application",
    "send",
    "send application",
    "enviar",
    "enviar solicitud",
    "enviar candidatura",
    "solicitar",
    "postular",
    "postularme",
    "candidatar",
    "soumettre",
    "envoyer",
};

/// 按钮文本是否表示"提交"（与界面语言无关）
///
/// 必须整体匹配："Enviar mensaje" 之类的按钮不算
pub fn is_submit_label(text: &str) -> bool {
    let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
    SUBMIT_LABELS.contains(normalized.as_str())
}

/// 投递流程
///
/// - 编排单个职位的状态迁移
/// - 不持有浏览器资源，只借用驱动
/// - 不关心配额和账本
pub struct ApplicationFlow {
    settings: ApplySettings,
}

impl ApplicationFlow {
    pub fn new(settings: ApplySettings) -> Self {
        Self { settings }
    }

    /// 对一个职位执行一次完整投递，结果总是终态
    pub async fn apply<D: BrowserDriver>(&self, driver: &D, posting: JobPosting) -> ApplicationAttempt {
        let mut attempt = ApplicationAttempt::new(posting);

        // ========== Discovered → Opened ==========
        if let Err(e) = driver.navigate(&attempt.posting().link).await {
            warn!("{} ✗ 无法打开职位页面: {}", attempt, e);
            fail(&mut attempt, FailureReason::NavigationFailed, e.to_string());
            return attempt;
        }
        self.settle().await;
        transition(&mut attempt, ApplicationState::Opened);

        let easy_apply = match driver
            .wait_until(EASY_APPLY_BUTTON, self.settings.easy_apply_timeout)
            .await
        {
            Ok(button) => button,
            Err(e) => {
                warn!("{} ✗ 未找到 Easy Apply 按钮: {}", attempt, e);
                fail(&mut attempt, FailureReason::NoEasyApplyAffordance, e.to_string());
                return attempt;
            }
        };
        if let Err(e) = easy_apply.click().await {
            warn!("{} ✗ Easy Apply 按钮无法点击: {}", attempt, e);
            fail(&mut attempt, FailureReason::NoEasyApplyAffordance, e.to_string());
            return attempt;
        }
        self.settle().await;
        info!("{} → 已点击 Easy Apply", attempt);

        // ========== Opened → FormHandled ==========
        let filled = self.fill_form(driver).await;
        debug!("{} 自动填写了 {} 个文本框", attempt, filled);
        transition(&mut attempt, ApplicationState::FormHandled);

        // ========== FormHandled → Submitted ==========
        match self.submit(driver).await {
            Ok(()) => {
                self.settle().await;
                transition(&mut attempt, ApplicationState::Submitted);
                info!("{} ✓ 已提交申请", attempt);
            }
            Err(detail) => {
                warn!("{} ✗ 无法提交申请: {}", attempt, detail);
                fail(&mut attempt, FailureReason::SubmitControlNotFound, detail);
            }
        }

        attempt
    }

    /// 尽力填写空白文本框，返回填写的数量；任何失败都被忽略
    async fn fill_form<D: BrowserDriver>(&self, driver: &D) -> usize {
        let fields = match driver.find_elements(FORM_TEXT_FIELDS).await {
            Ok(fields) => fields,
            Err(e) => {
                debug!("读取表单字段失败: {}", e);
                return 0;
            }
        };

        let mut filled = 0;
        for field in &fields {
            let current = field.attribute("value").await.ok().flatten().unwrap_or_default();
            if !current.trim().is_empty() {
                continue;
            }
            match field.send_keys(&self.settings.form_placeholder).await {
                Ok(()) => filled += 1,
                Err(e) => debug!("字段拒绝输入: {}", e),
            }
        }
        filled
    }

    /// 找到并点击提交按钮
    async fn submit<D: BrowserDriver>(&self, driver: &D) -> Result<(), String> {
        let buttons = driver
            .find_elements(FORM_BUTTONS)
            .await
            .map_err(|e| format!("读取按钮失败: {}", e))?;

        for button in &buttons {
            let text = button.text().await.unwrap_or_default();
            let aria = button.attribute("aria-label").await.ok().flatten().unwrap_or_default();
            if !is_submit_label(&text) && !is_submit_label(&aria) {
                continue;
            }
            return button
                .click()
                .await
                .map_err(|e| format!("提交按钮点击失败: {}", e));
        }

        Err(format!("{} 个按钮中没有提交按钮", buttons.len()))
    }

    async fn settle(&self) {
        if !self.settings.settle_delay.is_zero() {
            sleep(self.settings.settle_delay).await;
        }
    }
}

fn transition(attempt: &mut ApplicationAttempt, next: ApplicationState) {
    if let Err(e) = attempt.advance(next) {
        error!("{} {}", attempt, e);
    }
}

fn fail(attempt: &mut ApplicationAttempt, reason: FailureReason, detail: String) {
    if let Err(e) = attempt.fail(reason, detail) {
        error!("{} {}", attempt, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submit_labels_match_across_languages() {
        assert!(is_submit_label("Submit application"));
        assert!(is_submit_label("  Enviar\n solicitud "));
        assert!(is_submit_label("SOLICITAR"));
        assert!(is_submit_label("Enviar candidatura"));
    }

    #[test]
    fn labels_that_only_start_with_a_submit_word_are_ignored() {
        assert!(!is_submit_label("Enviar mensaje"));
        assert!(!is_submit_label("Send feedback"));
        assert!(!is_submit_label("Submit a report"));
        assert!(!is_submit_label("Solicitar recomendación"));
        assert!(!is_submit_label("Postularme ahora"));
    }

    #[test]
    fn non_submit_buttons_are_ignored() {
        assert!(!is_submit_label("Next"));
        assert!(!is_submit_label("Review your application"));
        assert!(!is_submit_label("Solicitud sencilla"));
        assert!(!is_submit_label(""));
        assert!(!is_submit_label("Dismiss"));
    }
}
