//! 节流与配额服务 - 业务能力层
//!
//! 每次运行随机抽取一个每日上限；在搜索和投递之间插入固定等待。

use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::time::sleep;
use tracing::{debug, info};

use crate::config::ThrottleSettings;

/// 节流点
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pace {
    /// 每次搜索前
    BeforeDiscovery,
    /// 每次投递前
    BeforeAttempt,
    /// 每次投递后
    AfterAttempt,
    /// 成功投递后
    AfterSubmission,
}

/// 配额已用完
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("已达到每日上限 {daily_cap}")]
pub struct QuotaExhausted {
    pub daily_cap: u32,
}

/// 本次运行的配额状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct QuotaState {
    pub applied_count: u32,
    pub daily_cap: u32,
}

/// 节流与配额控制器
///
/// `applied_count <= daily_cap` 始终成立；只能通过 `record_success` 修改计数
pub struct QuotaController {
    state: QuotaState,
    action_delay: Duration,
    submit_delay: Duration,
    /// 按顺序经过的节流点
    paced: Vec<Pace>,
}

impl QuotaController {
    /// 用给定的随机源抽取每日上限
    pub fn new<R: Rng + ?Sized>(settings: &ThrottleSettings, rng: &mut R) -> Self {
        let (low, high) = if settings.daily_cap_min <= settings.daily_cap_max {
            (settings.daily_cap_min, settings.daily_cap_max)
        } else {
            (settings.daily_cap_max, settings.daily_cap_min)
        };
        let daily_cap = rng.gen_range(low..=high);

        Self {
            state: QuotaState {
                applied_count: 0,
                daily_cap,
            },
            action_delay: settings.action_delay,
            submit_delay: settings.submit_delay,
            paced: Vec::new(),
        }
    }

    /// 有种子时可复现，否则使用系统熵
    pub fn from_seed(settings: &ThrottleSettings, seed: Option<u64>) -> Self {
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let controller = Self::new(settings, &mut rng);
        info!(
            "🎯 本次每日上限: {} (范围 {}-{})",
            controller.state.daily_cap, settings.daily_cap_min, settings.daily_cap_max
        );
        controller
    }

    pub fn has_quota_remaining(&self) -> bool {
        self.state.applied_count < self.state.daily_cap
    }

    pub fn remaining(&self) -> u32 {
        self.state.daily_cap - self.state.applied_count
    }

    pub fn applied_count(&self) -> u32 {
        self.state.applied_count
    }

    pub fn daily_cap(&self) -> u32 {
        self.state.daily_cap
    }

    /// 记录一次成功投递，返回新的计数
    pub fn record_success(&mut self) -> Result<u32, QuotaExhausted> {
        if !self.has_quota_remaining() {
            return Err(QuotaExhausted {
                daily_cap: self.state.daily_cap,
            });
        }
        self.state.applied_count += 1;
        Ok(self.state.applied_count)
    }

    pub fn delay_for(&self, pace: Pace) -> Duration {
        match pace {
            Pace::AfterSubmission => self.submit_delay,
            Pace::BeforeDiscovery | Pace::BeforeAttempt | Pace::AfterAttempt => self.action_delay,
        }
    }

    /// 本次运行经过的节流点
    pub fn pace_history(&self) -> &[Pace] {
        &self.paced
    }

    /// 在节流点等待
    pub async fn pace(&mut self, pace: Pace) {
        self.paced.push(pace);
        let delay = self.delay_for(pace);
        if delay.is_zero() {
            return;
        }
        debug!("⏳ {:?}: 等待 {:?}", pace, delay);
        sleep(delay).await;
    }
}
