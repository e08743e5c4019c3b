//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责整次运行的调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `run_processor` - 运行处理器
//! - 管理应用生命周期（初始化、运行、清理）
//! - 登录（失败即终止）
//! - 按顺序遍历地区，配额用完立即停止
//! - 管理浏览器资源（Browser、ChromiumDriver）
//! - 输出全局统计信息
//!
//! ### `region_processor` - 单个地区处理器
//! - 搜索一个地区的职位（Vec<JobPosting>）
//! - 复用同一个 ApplicationFlow
//! - 成功投递先计入配额再写账本
//! - 输出单个地区的统计信息
//!
//! ## 层次关系
//!
//! ```text
//! run_processor (处理 Vec<Region>)
//!     ↓
//! region_processor (处理 Vec<JobPosting>)
//!     ↓
//! workflow::ApplicationFlow (处理单个 JobPosting)
//!     ↓
//! services (能力层：session / job_search / throttle / ledger_writer)
//!     ↓
//! infrastructure (基础设施：BrowserDriver、Worksheet)
//! ```
//!
//! ## 设计原则
//!
//! 1. **单一职责**：run_processor 管整次运行，region_processor 管单个地区
//! 2. **资源隔离**：只有编排层持有 Browser 和配额状态
//! 3. **向下依赖**：编排层 → workflow → services → infrastructure
//! 4. **无业务逻辑**：只做调度和统计，不做具体业务判断

pub mod region_processor;
pub mod run_processor;

// 重新导出主要类型
pub use region_processor::{process_region, RegionStats, RunContext};
pub use run_processor::{App, RunOrchestrator, RunSummary};
