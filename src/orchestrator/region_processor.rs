//! 单个地区处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块负责一个地区的"搜索 → 逐个投递 → 记账"，是地区级别的编排器。
//!
//! ## 核心功能
//!
//! 1. **配额检查**：搜索前、每个职位前检查剩余配额
//! 2. **职位发现**：委托 `JobDiscovery`
//! 3. **流程调度**：复用同一个 `ApplicationFlow`
//! 4. **记账**：成功投递先计入配额，再写账本；写账本失败只记录日志
//! 5. **统计输出**：记录成功 / 失败 / 账本失败数量

use tracing::{error, info, warn};

use crate::infrastructure::{BrowserDriver, Worksheet};
use crate::models::Region;
use crate::services::{JobDiscovery, LedgerWriter, Pace, QuotaController};
use crate::utils::logging::truncate_text;
use crate::workflow::{ApplicationAttempt, ApplicationFlow};

/// 单次运行中各地区共享的组件
///
/// 配额和账本序号都是显式状态，由编排层独占
pub struct RunContext<W: Worksheet> {
    pub discovery: JobDiscovery,
    pub flow: ApplicationFlow,
    pub quota: QuotaController,
    pub ledger: LedgerWriter<W>,
    /// 失败的投递是否也写入账本
    pub record_failures: bool,
}

/// 地区处理统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RegionStats {
    pub discovered: usize,
    pub attempted: usize,
    pub submitted: usize,
    pub failed: usize,
    pub ledger_failures: usize,
    /// 是否因为配额用完而提前结束
    pub quota_exhausted: bool,
}

/// 处理单个地区
///
/// # 参数
/// - `driver`: 浏览器驱动（顺序使用）
/// - `ctx`: 共享组件
/// - `region`: 地区
/// - `region_index`: 地区序号（用于日志）
///
/// # 返回
/// 地区统计；本函数不会失败，所有错误都在内部记录后继续
pub async fn process_region<D, W>(
    driver: &D,
    ctx: &mut RunContext<W>,
    region: Region,
    region_index: usize,
) -> RegionStats
where
    D: BrowserDriver,
    W: Worksheet,
{
    let mut stats = RegionStats::default();

    if !ctx.quota.has_quota_remaining() {
        stats.quota_exhausted = true;
        return stats;
    }

    log_region_start(region, region_index, &ctx.quota);

    ctx.quota.pace(Pace::BeforeDiscovery).await;
    let postings = ctx.discovery.discover(driver, region).await;
    stats.discovered = postings.len();

    let total = postings.len();
    for (index, posting) in postings.into_iter().enumerate() {
        let job_index = index + 1;

        if !ctx.quota.has_quota_remaining() {
            info!(
                "[地区 {}] 🛑 已达到每日上限 {}，剩余 {} 个职位不再处理",
                region,
                ctx.quota.daily_cap(),
                total - index
            );
            stats.quota_exhausted = true;
            break;
        }

        info!(
            "[地区 {}] [职位 {}/{}] {} @ {}",
            region,
            job_index,
            total,
            truncate_text(&posting.title, 60),
            posting.company
        );

        ctx.quota.pace(Pace::BeforeAttempt).await;
        let attempt = ctx.flow.apply(driver, posting).await;
        stats.attempted += 1;

        if attempt.is_submitted() {
            stats.submitted += 1;
            match ctx.quota.record_success() {
                Ok(count) => info!(
                    "[职位 {}] ✅ 投递成功 ({}/{})",
                    job_index,
                    count,
                    ctx.quota.daily_cap()
                ),
                Err(e) => error!("[职位 {}] 配额计数异常: {}", job_index, e),
            }
            ctx.quota.pace(Pace::AfterSubmission).await;
            write_ledger(ctx, &attempt, job_index, &mut stats).await;
        } else {
            stats.failed += 1;
            warn!(
                "[职位 {}] ❌ 投递失败: {}",
                job_index,
                attempt
                    .failure_reason()
                    .map(|r| r.as_str())
                    .unwrap_or("unknown")
            );
            if ctx.record_failures {
                write_ledger(ctx, &attempt, job_index, &mut stats).await;
            }
        }

        ctx.quota.pace(Pace::AfterAttempt).await;
    }

    if !ctx.quota.has_quota_remaining() {
        stats.quota_exhausted = true;
    }

    log_region_complete(region, &stats);
    stats
}

async fn write_ledger<W: Worksheet>(
    ctx: &mut RunContext<W>,
    attempt: &ApplicationAttempt,
    job_index: usize,
    stats: &mut RegionStats,
) {
    match ctx.ledger.record(attempt).await {
        Ok(record) => info!("[职位 {}] 📝 已写入账本第 {} 行", job_index, record.sequence),
        Err(e) => {
            stats.ledger_failures += 1;
            error!("[职位 {}] 写入账本失败: {}", job_index, e);
        }
    }
}

// ========== 日志辅助函数 ==========

fn log_region_start(region: Region, region_index: usize, quota: &QuotaController) {
    info!("\n{}", "=".repeat(60));
    info!("🌎 [地区 {}] 开始处理第 {} 个地区", region, region_index);
    info!("🎯 已投递 {}/{}", quota.applied_count(), quota.daily_cap());
    info!("{}", "=".repeat(60));
}

fn log_region_complete(region: Region, stats: &RegionStats) {
    info!("\n{}", "─".repeat(60));
    info!(
        "[地区 {}] 完成: 发现 {} | 成功 {} | 失败 {} | 账本失败 {}",
        region, stats.discovered, stats.submitted, stats.failed, stats.ledger_failures
    );
    info!("{}", "─".repeat(60));
}
