//! 投递尝试
//!
//! 记录"一个职位走到了状态机的哪一步"

use std::fmt::Display;

use crate::models::JobPosting;

/// 投递状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApplicationState {
    Discovered,
    Opened,
    FormHandled,
    Submitted,
    Failed,
}

impl ApplicationState {
    pub fn is_terminal(self) -> bool {
        matches!(self, ApplicationState::Submitted | ApplicationState::Failed)
    }

    /// 状态迁移表
    pub fn can_transition_to(self, next: ApplicationState) -> bool {
        use ApplicationState::*;
        matches!(
            (self, next),
            (Discovered, Opened)
                | (Discovered, Failed)
                | (Opened, FormHandled)
                | (Opened, Failed)
                | (FormHandled, Submitted)
                | (FormHandled, Failed)
        )
    }
}

/// 失败原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureReason {
    /// 职位页面无法打开
    NavigationFailed,
    /// 页面上没有 Easy Apply 按钮
    NoEasyApplyAffordance,
    /// 表单中找不到提交按钮，或点击失败
    SubmitControlNotFound,
}

impl FailureReason {
    pub fn as_str(self) -> &'static str {
        match self {
            FailureReason::NavigationFailed => "NavigationFailed",
            FailureReason::NoEasyApplyAffordance => "NoEasyApplyAffordance",
            FailureReason::SubmitControlNotFound => "SubmitControlNotFound",
        }
    }
}

impl Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 非法的状态迁移
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("非法的状态迁移: {from:?} -> {to:?}")]
pub struct InvalidTransition {
    pub from: ApplicationState,
    pub to: ApplicationState,
}

/// 投递结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure(FailureReason),
}

/// 一个职位的投递尝试
#[derive(Debug, Clone)]
pub struct ApplicationAttempt {
    posting: JobPosting,
    state: ApplicationState,
    history: Vec<ApplicationState>,
    failure: Option<FailureReason>,
    detail: Option<String>,
}

impl ApplicationAttempt {
    pub fn new(posting: JobPosting) -> Self {
        Self {
            posting,
            state: ApplicationState::Discovered,
            history: vec![ApplicationState::Discovered],
            failure: None,
            detail: None,
        }
    }

    pub fn posting(&self) -> &JobPosting {
        &self.posting
    }

    pub fn state(&self) -> ApplicationState {
        self.state
    }

    /// 经过的全部状态（含初始状态）
    pub fn history(&self) -> &[ApplicationState] {
        &self.history
    }

    pub fn failure_reason(&self) -> Option<FailureReason> {
        self.failure
    }

    /// 失败时的诊断信息
    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    /// 终态时的结果
    pub fn outcome(&self) -> Option<Outcome> {
        match self.state {
            ApplicationState::Submitted => Some(Outcome::Success),
            ApplicationState::Failed => self.failure.map(Outcome::Failure),
            _ => None,
        }
    }

    pub fn is_submitted(&self) -> bool {
        self.state == ApplicationState::Submitted
    }

    /// 推进到下一个非失败状态
    pub fn advance(&mut self, next: ApplicationState) -> Result<(), InvalidTransition> {
        if next == ApplicationState::Failed || !self.state.can_transition_to(next) {
            return Err(InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        self.enter(next);
        Ok(())
    }

    /// 以给定原因失败（终态）
    pub fn fail(&mut self, reason: FailureReason, detail: impl Into<String>) -> Result<(), InvalidTransition> {
        if !self.state.can_transition_to(ApplicationState::Failed) {
            return Err(InvalidTransition {
                from: self.state,
                to: ApplicationState::Failed,
            });
        }
        self.failure = Some(reason);
        let detail = detail.into();
        if !detail.is_empty() {
            self.detail = Some(detail);
        }
        self.enter(ApplicationState::Failed);
        Ok(())
    }

    fn enter(&mut self, next: ApplicationState) {
        self.state = next;
        self.history.push(next);
    }
}

impl Display for ApplicationAttempt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{} @ {} | {}]",
            self.posting.title, self.posting.company, self.posting.region
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Region;
    use ApplicationState::*;

    fn attempt() -> ApplicationAttempt {
        ApplicationAttempt::new(JobPosting {
            title: "Dev".to_string(),
            company: "Acme".to_string(),
            link: "https://www.linkedin.com/jobs/view/1".to_string(),
            region: Region::Peru,
            salary: "TBD".to_string(),
            easy_apply: true,
        })
    }

    #[test]
    fn success_path_reaches_submitted() {
        let mut a = attempt();
        a.advance(Opened).unwrap();
        a.advance(FormHandled).unwrap();
        a.advance(Submitted).unwrap();
        assert_eq!(a.history(), &[Discovered, Opened, FormHandled, Submitted]);
        assert_eq!(a.outcome(), Some(Outcome::Success));
    }

    #[test]
    fn failure_is_absorbing() {
        let mut a = attempt();
        a.advance(Opened).unwrap();
        a.fail(FailureReason::NoEasyApplyAffordance, "timeout").unwrap();
        assert_eq!(a.state(), Failed);
        assert_eq!(a.detail(), Some("timeout"));
        assert!(a.advance(FormHandled).is_err());
        assert!(a.fail(FailureReason::SubmitControlNotFound, "").is_err());
        assert_eq!(a.outcome(), Some(Outcome::Failure(FailureReason::NoEasyApplyAffordance)));
    }

    #[test]
    fn states_cannot_be_skipped() {
        let mut a = attempt();
        assert_eq!(
            a.advance(Submitted),
            Err(InvalidTransition {
                from: Discovered,
                to: Submitted
            })
        );
        assert!(a.advance(Failed).is_err(), "Failed only through fail()");
        assert_eq!(a.outcome(), None);
    }

    #[test]
    fn submitted_is_terminal() {
        assert!(Submitted.is_terminal());
        assert!(Failed.is_terminal());
        assert!(!FormHandled.is_terminal());
        assert!(!Submitted.can_transition_to(Failed));
    }
}
