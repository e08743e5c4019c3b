//! # Easy Apply Runner
//!
//! 在多个地区自动搜索 LinkedIn Easy Apply 职位并投递，把每次成功投递追加到 Google Sheets 账本
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 只暴露能力：`BrowserDriver` / `DomElement` / `LedgerService` / `Worksheet`
//! - `ChromiumDriver` - 唯一的 page owner，基于 chromiumoxide
//! - `clients/SheetsClient` - Google Sheets v4 REST 实现
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"
//! - `SessionManager` - 登录能力（Cookie 或账号密码）
//! - `JobDiscovery` - 单个地区的职位搜索能力
//! - `QuotaController` - 每日上限与节流
//! - `LedgerWriter` - 追加账本行能力
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个职位"的完整投递流程
//! - `ApplicationAttempt` - 状态机（Discovered → Opened → FormHandled → Submitted / Failed）
//! - `ApplicationFlow` - 流程编排（打开 → Easy Apply → 填表 → 提交）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/run_processor` - 运行处理器，管理资源和地区调度
//! - `orchestrator/region_processor` - 单个地区处理器，遍历职位列表
//!
//! ## 模块结构

pub mod browser;
pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::{BrowserDriver, ChromiumDriver, DomElement, LedgerService, Worksheet};
pub use models::{JobPosting, LedgerRecord, Region};
pub use orchestrator::{App, RunOrchestrator, RunSummary};
pub use workflow::{ApplicationAttempt, ApplicationFlow, ApplicationState};
