//! 运行处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责一次完整运行的资源管理和地区调度。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：校验配置、打开账本、连接或启动浏览器
//! 2. **登录**：委托 `SessionManager`，失败则整个运行终止
//! 3. **地区调度**：按顺序处理每个地区，配额用完立即停止
//! 4. **资源管理**：持有 Browser，运行结束后关闭
//! 5. **全局统计**：汇总所有地区的结果
//!
//! ## 设计特点
//!
//! - **顶层编排**：不处理单个职位的细节
//! - **资源所有者**：唯一持有 Browser 的模块
//! - **严格顺序**：驱动只在一个任务里顺序使用
//! - **向下委托**：委托 region_processor 处理单个地区

use std::path::Path;

use anyhow::{Context, Result};
use chromiumoxide::Browser;
use tracing::{error, info, warn};

use crate::browser;
use crate::clients::{SheetsClient, SheetsWorksheet};
use crate::config::{AuthMode, Config, CredentialSource};
use crate::error::AppError;
use crate::infrastructure::{BrowserDriver, ChromiumDriver, LedgerService, Worksheet};
use crate::models::Region;
use crate::orchestrator::region_processor::{self, RunContext};
use crate::services::{Credentials, JobDiscovery, LedgerWriter, QuotaController, SessionManager};
use crate::utils::logging;
use crate::workflow::ApplicationFlow;

/// 运行统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub regions_searched: usize,
    pub discovered: usize,
    pub attempted: usize,
    pub submitted: usize,
    pub failed: usize,
    pub ledger_failures: usize,
    /// 成功写入账本的行数
    pub ledger_rows: u32,
    /// 经过的节流点数量
    pub pauses: usize,
    pub applied_count: u32,
    pub daily_cap: u32,
}

/// 运行编排器
///
/// 与具体浏览器和账本实现无关，只依赖驱动和工作表能力
pub struct RunOrchestrator<'a, D: BrowserDriver, W: Worksheet> {
    driver: &'a D,
    sessions: SessionManager,
    auth_mode: AuthMode,
    credentials: CredentialSource,
    regions: Vec<Region>,
    ctx: RunContext<W>,
}

impl<'a, D: BrowserDriver, W: Worksheet> RunOrchestrator<'a, D, W> {
    /// 组装本次运行的所有组件，每日上限在这里抽取
    pub fn new(driver: &'a D, config: &Config, worksheet: W) -> Result<Self, AppError> {
        let ctx = RunContext {
            discovery: JobDiscovery::new(config.search.clone())?,
            flow: ApplicationFlow::new(config.apply.clone()),
            quota: QuotaController::from_seed(&config.throttle, config.run_seed),
            ledger: LedgerWriter::new(worksheet),
            record_failures: config.record_failures,
        };

        Ok(Self {
            driver,
            sessions: SessionManager::new(config),
            auth_mode: config.auth_mode,
            credentials: config.credentials.clone(),
            regions: config.regions.clone(),
            ctx,
        })
    }

    pub fn quota(&self) -> &QuotaController {
        &self.ctx.quota
    }

    /// 执行一次完整运行
    ///
    /// 只有认证失败会返回错误；其余错误都在各层记录后继续
    pub async fn run(&mut self) -> Result<RunSummary, AppError> {
        let mut session = self
            .sessions
            .authenticate(self.driver, self.auth_mode, &self.credentials)
            .await?;

        let mut summary = RunSummary {
            daily_cap: self.ctx.quota.daily_cap(),
            ..Default::default()
        };

        if !self.ctx.quota.has_quota_remaining() {
            info!("🛑 每日上限为 {}，不处理任何地区", self.ctx.quota.daily_cap());
        } else {
            for (index, region) in self.regions.iter().copied().enumerate() {
                let stats =
                    region_processor::process_region(self.driver, &mut self.ctx, region, index + 1).await;
                summary.regions_searched += 1;
                summary.discovered += stats.discovered;
                summary.attempted += stats.attempted;
                summary.submitted += stats.submitted;
                summary.failed += stats.failed;
                summary.ledger_failures += stats.ledger_failures;

                if stats.quota_exhausted {
                    info!("🛑 已达到每日上限 {}，停止处理剩余地区", self.ctx.quota.daily_cap());
                    break;
                }
            }
        }

        summary.ledger_rows = self.ctx.ledger.written();
        summary.pauses = self.ctx.quota.pace_history().len();
        summary.applied_count = self.ctx.quota.applied_count();
        session.invalidate();
        Ok(summary)
    }
}

/// 应用主结构
pub struct App {
    config: Config,
    browser: Browser,
    /// 浏览器是否由本进程启动（是则运行结束后关闭）
    launched: bool,
    driver: ChromiumDriver,
    worksheet: SheetsWorksheet,
}

impl App {
    /// 初始化应用
    ///
    /// 配置和认证材料在打开浏览器之前校验
    pub async fn initialize(config: Config) -> Result<Self> {
        config.validate()?;
        Credentials::resolve(config.auth_mode, &config.credentials)?;

        logging::log_startup(&config.regions, config.throttle.daily_cap_min, config.throttle.daily_cap_max);

        let worksheet = open_ledger(&config).await?;

        let (browser, page, launched) = match config.browser_debug_port {
            Some(port) => {
                let (browser, page) = browser::connect_to_browser_and_page(port, &config.landing_url).await?;
                (browser, page, false)
            }
            None => {
                let (browser, page) = browser::launch_headless_browser(
                    &config.landing_url,
                    config.chrome_executable.as_deref(),
                    &config.user_agent,
                )
                .await?;
                (browser, page, true)
            }
        };

        Ok(Self {
            config,
            browser,
            launched,
            driver: ChromiumDriver::new(page),
            worksheet,
        })
    }

    /// 运行应用主逻辑
    pub async fn run(self) -> Result<RunSummary> {
        let App {
            config,
            mut browser,
            launched,
            driver,
            worksheet,
        } = self;

        let result = match RunOrchestrator::new(&driver, &config, worksheet) {
            Ok(mut orchestrator) => orchestrator.run().await,
            Err(e) => Err(e),
        };

        shutdown(&driver, &mut browser, launched).await;

        let summary = result.context("运行终止")?;
        print_final_stats(&summary);
        Ok(summary)
    }
}

async fn shutdown(driver: &ChromiumDriver, browser: &mut Browser, launched: bool) {
    if let Err(e) = driver.page().clone().close().await {
        warn!("关闭页面失败: {}", e);
    }
    if launched {
        if let Err(e) = browser.close().await {
            warn!("关闭浏览器失败: {}", e);
        }
    }
}

/// 打开账本；凭据可以是 JSON 内容，也可以是 JSON 文件路径
async fn open_ledger(config: &Config) -> Result<SheetsWorksheet> {
    let creds = config
        .google_sheets_creds
        .as_deref()
        .context("缺少 GOOGLE_SHEETS_CREDS")?;
    let sheet_id = config
        .google_sheet_id
        .as_deref()
        .context("缺少 GOOGLE_SHEET_ID")?;

    let creds = if creds.trim_start().starts_with('{') {
        creds.to_string()
    } else {
        std::fs::read_to_string(Path::new(creds))
            .with_context(|| format!("读取账本凭据文件失败: {}", creds))?
    };

    let client = SheetsClient::from_credentials_json(&creds)?;
    let worksheet = client.open(sheet_id).await.map_err(|e| {
        error!("打开账本失败: {}", e);
        e
    })?;
    info!("✓ 已打开账本工作表: {}", worksheet.title());
    Ok(worksheet)
}

fn print_final_stats(summary: &RunSummary) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!("完成时间: {}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"));
    info!("{}", "=".repeat(60));
    info!("🌎 搜索地区: {}", summary.regions_searched);
    info!("🔍 发现职位: {}", summary.discovered);
    info!("✅ 成功: {}/{}", summary.submitted, summary.attempted);
    info!("❌ 失败: {}", summary.failed);
    info!("📝 账本写入: {} 行 (失败 {})", summary.ledger_rows, summary.ledger_failures);
    info!("⏳ 节流等待: {} 次", summary.pauses);
    info!("🎯 每日配额: {}/{}", summary.applied_count, summary.daily_cap);
    info!("{}", "=".repeat(60));
}
