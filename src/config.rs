use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::models::Region;

/// 默认配置文件路径（可通过 JOB_APPLY_CONFIG 覆盖，文件不存在时跳过）
pub const DEFAULT_CONFIG_FILE: &str = "job_apply.toml";

/// 认证模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// 注入 li_at / JSESSIONID / bcookie 三个 Cookie
    Cookie,
    /// 填写登录表单
    Password,
}

impl FromStr for AuthMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cookie" | "cookies" => Ok(AuthMode::Cookie),
            "password" | "email" => Ok(AuthMode::Password),
            other => Err(ConfigError::UnknownAuthMode {
                mode: other.to_string(),
            }),
        }
    }
}

/// 原始认证材料（尚未校验是否完整）
#[derive(Clone, Default)]
pub struct CredentialSource {
    pub li_at: Option<String>,
    pub jsessionid: Option<String>,
    pub bcookie: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

impl std::fmt::Debug for CredentialSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mask = |v: &Option<String>| if v.is_some() { "<set>" } else { "<unset>" };
        f.debug_struct("CredentialSource")
            .field("li_at", &mask(&self.li_at))
            .field("jsessionid", &mask(&self.jsessionid))
            .field("bcookie", &mask(&self.bcookie))
            .field("email", &self.email)
            .field("password", &mask(&self.password))
            .finish()
    }
}

/// 职位搜索配置
#[derive(Clone, Debug)]
pub struct SearchSettings {
    pub base_url: String,
    pub keywords: Vec<String>,
    /// 最低月薪（美元）
    pub min_monthly_salary_usd: u64,
    /// 每个地区最多提取的职位数
    pub max_per_region: usize,
    pub listing_timeout: Duration,
    pub scroll_passes: u32,
    pub scroll_pause: Duration,
}

/// 节流与配额配置
#[derive(Clone, Debug)]
pub struct ThrottleSettings {
    /// 每日上限的随机范围（闭区间）
    pub daily_cap_min: u32,
    pub daily_cap_max: u32,
    /// 每次搜索前、每次投递前后的固定等待
    pub action_delay: Duration,
    /// 成功投递后的等待
    pub submit_delay: Duration,
}

/// 投递流程配置
#[derive(Clone, Debug)]
pub struct ApplySettings {
    pub easy_apply_timeout: Duration,
    /// 导航或点击后等待页面稳定的时间
    pub settle_delay: Duration,
    /// 自动填写空白文本框的占位内容
    pub form_placeholder: String,
}

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    pub auth_mode: AuthMode,
    pub credentials: CredentialSource,
    pub landing_url: String,
    pub auth_timeout: Duration,
    // --- 账本配置 ---
    pub google_sheets_creds: Option<String>,
    pub google_sheet_id: Option<String>,
    /// 为 true 时失败的投递也写入账本
    pub record_failures: bool,
    // --- 浏览器配置 ---
    /// 设置后连接已有浏览器，否则启动无头浏览器
    pub browser_debug_port: Option<u16>,
    pub chrome_executable: Option<String>,
    pub user_agent: String,
    // --- 运行配置 ---
    pub regions: Vec<Region>,
    pub search: SearchSettings,
    pub throttle: ThrottleSettings,
    pub apply: ApplySettings,
    /// 随机种子，便于复现每日上限
    pub run_seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            auth_mode: AuthMode::Cookie,
            credentials: CredentialSource::default(),
            landing_url: "https://www.linkedin.com".to_string(),
            auth_timeout: Duration::from_secs(15),
            google_sheets_creds: None,
            google_sheet_id: None,
            record_failures: false,
            browser_debug_port: None,
            chrome_executable: None,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".to_string(),
            regions: Region::ALL.to_vec(),
            search: SearchSettings {
                base_url: "https://www.linkedin.com/jobs/search/".to_string(),
                keywords: vec!["full stack developer".to_string()],
                min_monthly_salary_usd: 500,
                max_per_region: 20,
                listing_timeout: Duration::from_secs(10),
                scroll_passes: 3,
                scroll_pause: Duration::from_secs(2),
            },
            throttle: ThrottleSettings {
                daily_cap_min: 30,
                daily_cap_max: 40,
                action_delay: Duration::from_secs(2),
                submit_delay: Duration::from_secs(5),
            },
            apply: ApplySettings {
                easy_apply_timeout: Duration::from_secs(10),
                settle_delay: Duration::from_secs(2),
                form_placeholder: "N/A".to_string(),
            },
            run_seed: None,
        }
    }
}

/// 配置文件内容（只包含非敏感的调优项）
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub regions: Option<Vec<String>>,
    pub keywords: Option<Vec<String>>,
    pub max_per_region: Option<usize>,
    pub min_salary_usd: Option<u64>,
    pub daily_cap_min: Option<u32>,
    pub daily_cap_max: Option<u32>,
    pub action_delay_secs: Option<u64>,
    pub submit_delay_secs: Option<u64>,
    pub listing_timeout_secs: Option<u64>,
    pub easy_apply_timeout_secs: Option<u64>,
    pub auth_timeout_secs: Option<u64>,
    pub scroll_passes: Option<u32>,
    pub form_placeholder: Option<String>,
    pub browser_debug_port: Option<u16>,
    pub chrome_executable: Option<String>,
    pub record_failures: Option<bool>,
}

impl FileConfig {
    /// 读取配置文件；文件不存在时返回 `None`
    pub fn load(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::FileReadFailed {
            path: path.display().to_string(),
            source,
        })?;
        let file = toml::from_str(&content).map_err(|source| ConfigError::FileParseFailed {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Some(file))
    }
}

impl Config {
    /// 从默认值 → 配置文件 → 环境变量依次加载
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("JOB_APPLY_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        let file = FileConfig::load(Path::new(&path))?;
        Self::from_sources(file, |name| std::env::var(name).ok())
    }

    /// 合并配置文件和环境变量（`env` 便于测试时注入）
    pub fn from_sources<F>(file: Option<FileConfig>, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(file) = file {
            config.apply_file(file)?;
        }
        config.apply_env(&env)?;
        Ok(config)
    }

    fn apply_file(&mut self, file: FileConfig) -> Result<(), ConfigError> {
        if let Some(regions) = file.regions {
            self.regions = Region::parse_list(&regions)?;
        }
        if let Some(keywords) = file.keywords {
            self.search.keywords = keywords;
        }
        if let Some(v) = file.max_per_region {
            self.search.max_per_region = v;
        }
        if let Some(v) = file.min_salary_usd {
            self.search.min_monthly_salary_usd = v;
        }
        if let Some(v) = file.daily_cap_min {
            self.throttle.daily_cap_min = v;
        }
        if let Some(v) = file.daily_cap_max {
            self.throttle.daily_cap_max = v;
        }
        if let Some(v) = file.action_delay_secs {
            self.throttle.action_delay = Duration::from_secs(v);
        }
        if let Some(v) = file.submit_delay_secs {
            self.throttle.submit_delay = Duration::from_secs(v);
        }
        if let Some(v) = file.listing_timeout_secs {
            self.search.listing_timeout = Duration::from_secs(v);
        }
        if let Some(v) = file.easy_apply_timeout_secs {
            self.apply.easy_apply_timeout = Duration::from_secs(v);
        }
        if let Some(v) = file.auth_timeout_secs {
            self.auth_timeout = Duration::from_secs(v);
        }
        if let Some(v) = file.scroll_passes {
            self.search.scroll_passes = v;
        }
        if let Some(v) = file.form_placeholder {
            self.apply.form_placeholder = v;
        }
        if file.browser_debug_port.is_some() {
            self.browser_debug_port = file.browser_debug_port;
        }
        if file.chrome_executable.is_some() {
            self.chrome_executable = file.chrome_executable;
        }
        if let Some(v) = file.record_failures {
            self.record_failures = v;
        }
        Ok(())
    }

    fn apply_env<F>(&mut self, env: &F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| env(name).filter(|v| !v.trim().is_empty());

        if let Some(mode) = non_empty("LINKEDIN_AUTH_MODE") {
            self.auth_mode = mode.parse()?;
        }
        self.credentials = CredentialSource {
            li_at: non_empty("LINKEDIN_LI_AT").or_else(|| non_empty("LINKEDIN_SESSION")),
            jsessionid: non_empty("LINKEDIN_JSESSIONID"),
            bcookie: non_empty("LINKEDIN_BCOOKIE"),
            email: non_empty("LINKEDIN_EMAIL"),
            password: non_empty("LINKEDIN_PASSWORD"),
        };

        self.google_sheets_creds = non_empty("GOOGLE_SHEETS_CREDS");
        self.google_sheet_id = non_empty("GOOGLE_SHEET_ID");

        if let Some(regions) = non_empty("TARGET_REGIONS") {
            let names: Vec<&str> = regions.split(',').collect();
            self.regions = Region::parse_list(&names)?;
        }
        if let Some(keywords) = non_empty("SEARCH_KEYWORDS") {
            self.search.keywords = keywords.split(',').map(|k| k.trim().to_string()).collect();
        }
        if let Some(v) = parse_env(env, "MAX_JOBS_PER_REGION", "usize")? {
            self.search.max_per_region = v;
        }
        if let Some(v) = parse_env(env, "MIN_SALARY_USD", "u64")? {
            self.search.min_monthly_salary_usd = v;
        }
        if let Some(v) = parse_env(env, "DAILY_CAP_MIN", "u32")? {
            self.throttle.daily_cap_min = v;
        }
        if let Some(v) = parse_env(env, "DAILY_CAP_MAX", "u32")? {
            self.throttle.daily_cap_max = v;
        }
        if let Some(v) = parse_env::<u64, _>(env, "APPLICATION_DELAY_SECS", "u64")? {
            self.throttle.submit_delay = Duration::from_secs(v);
        }
        if let Some(v) = parse_env::<u64, _>(env, "ACTION_DELAY_SECS", "u64")? {
            self.throttle.action_delay = Duration::from_secs(v);
        }
        if let Some(v) = parse_env(env, "BROWSER_DEBUG_PORT", "u16")? {
            self.browser_debug_port = Some(v);
        }
        if let Some(v) = non_empty("CHROME_EXECUTABLE") {
            self.chrome_executable = Some(v);
        }
        if let Some(v) = parse_env(env, "RUN_SEED", "u64")? {
            self.run_seed = Some(v);
        }
        if let Some(v) = parse_env(env, "LEDGER_RECORD_FAILURES", "bool")? {
            self.record_failures = v;
        }
        Ok(())
    }

    /// 启动前的快速校验（认证材料由 SessionManager 单独校验）
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.google_sheets_creds.is_none() {
            return Err(ConfigError::EnvVarNotFound {
                var_name: "GOOGLE_SHEETS_CREDS".to_string(),
            });
        }
        if self.google_sheet_id.is_none() {
            return Err(ConfigError::EnvVarNotFound {
                var_name: "GOOGLE_SHEET_ID".to_string(),
            });
        }
        if self.regions.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "regions",
                reason: "至少需要一个地区".to_string(),
            });
        }
        if self.search.keywords.iter().all(|k| k.trim().is_empty()) {
            return Err(ConfigError::InvalidValue {
                field: "keywords",
                reason: "搜索关键词不能为空".to_string(),
            });
        }
        if self.search.max_per_region == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_per_region",
                reason: "必须大于 0".to_string(),
            });
        }
        if self.throttle.daily_cap_min > self.throttle.daily_cap_max {
            return Err(ConfigError::InvalidValue {
                field: "daily_cap",
                reason: format!(
                    "下限 {} 大于上限 {}",
                    self.throttle.daily_cap_min, self.throttle.daily_cap_max
                ),
            });
        }
        Ok(())
    }
}

fn parse_env<T, F>(env: &F, var_name: &str, expected_type: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match env(var_name) {
        None => Ok(None),
        Some(value) if value.trim().is_empty() => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::EnvVarParseFailed {
                var_name: var_name.to_string(),
                value,
                expected_type: expected_type.to_string(),
            }),
    }
}
