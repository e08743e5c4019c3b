use std::time::Duration;

use thiserror::Error;

/// 应用程序错误类型
///
/// 只有 `Config` / `Auth` / 账本初始化失败会一路传播到 `main`，
/// 其余错误都在产生它的组件边界被消化。
#[derive(Debug, Error)]
pub enum AppError {
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 认证错误
    #[error("认证错误: {0}")]
    Auth(#[from] AuthError),
    /// 浏览器驱动错误
    #[error("浏览器错误: {0}")]
    Browser(#[from] DriverError),
    /// 账本错误
    #[error("账本错误: {0}")]
    Ledger(#[from] LedgerError),
    /// 其他错误
    #[error("错误: {0}")]
    Other(String),
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 必需的环境变量不存在
    #[error("环境变量 {var_name} 不存在")]
    EnvVarNotFound { var_name: String },

    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },

    /// Cookie 三元组不完整
    #[error("Cookie 认证缺少: {}", missing.join(", "))]
    IncompleteCookies { missing: Vec<&'static str> },

    /// 邮箱/密码不完整
    #[error("密码认证缺少: {}", missing.join(", "))]
    IncompletePassword { missing: Vec<&'static str> },

    /// 未知的认证模式
    #[error("未知的认证模式: {mode} (可选: cookie / password)")]
    UnknownAuthMode { mode: String },

    /// 无法识别的地区
    #[error("无法识别的地区: {name}")]
    UnknownRegion { name: String },

    /// 取值范围非法
    #[error("{field} 取值非法: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    /// 配置文件解析失败
    #[error("配置文件 {path} 解析失败: {source}")]
    FileParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    /// 配置文件读取失败
    #[error("配置文件 {path} 读取失败: {source}")]
    FileReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// 认证错误（对整个运行是致命的）
#[derive(Debug, Error)]
pub enum AuthError {
    /// 登录后标志元素在超时时间内未出现
    #[error("登录校验超时: {timeout:?} 内未出现 '{landmark}'")]
    LandmarkTimeout { landmark: String, timeout: Duration },

    /// 登录过程中驱动失败
    #[error("登录过程中浏览器操作失败: {0}")]
    Driver(#[source] DriverError),
}

/// 浏览器驱动错误
#[derive(Debug, Error)]
pub enum DriverError {
    /// 元素不存在
    #[error("未找到元素: {selector}")]
    NotFound { selector: String },

    /// 等待元素超时
    #[error("等待元素超时 ({timeout:?}): {selector}")]
    Timeout { selector: String, timeout: Duration },

    /// 导航失败
    #[error("导航到 {url} 失败: {message}")]
    Navigation { url: String, message: String },

    /// 元素交互失败（点击 / 输入）
    #[error("元素交互失败: {0}")]
    Interaction(String),

    /// 执行脚本失败
    #[error("执行脚本失败: {0}")]
    Script(String),

    /// 底层协议错误
    #[error("浏览器协议错误: {0}")]
    Protocol(String),
}

impl DriverError {
    pub fn not_found(selector: impl Into<String>) -> Self {
        DriverError::NotFound {
            selector: selector.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, DriverError::NotFound { .. })
    }
}

impl From<chromiumoxide::error::CdpError> for DriverError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        DriverError::Protocol(err.to_string())
    }
}

/// 单条职位卡片的字段读取失败，该卡片被跳过
#[derive(Debug, Error)]
#[error("职位卡片 #{index} 字段 '{field}' 读取失败: {reason}")]
pub struct ExtractionError {
    pub index: usize,
    pub field: &'static str,
    pub reason: String,
}

/// 账本错误
#[derive(Debug, Error)]
pub enum LedgerError {
    /// 凭据 JSON 无法解析
    #[error("账本凭据无法解析: {0}")]
    Credentials(String),

    /// JWT 签名或令牌交换失败
    #[error("账本授权失败: {0}")]
    Authorization(String),

    /// 网络请求失败
    #[error("账本请求失败 ({endpoint}): {source}")]
    Request {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    /// 服务端返回错误状态
    #[error("账本返回错误响应 ({endpoint}): status={status}, body={body}")]
    BadResponse {
        endpoint: String,
        status: u16,
        body: String,
    },

    /// 表格中没有工作表
    #[error("账本 {ledger_id} 中没有可用的工作表")]
    NoWorksheet { ledger_id: String },

    /// 追加行失败（其他实现使用）
    #[error("追加账本行失败: {0}")]
    AppendFailed(String),
}

impl LedgerError {
    pub fn request(endpoint: impl Into<String>, source: reqwest::Error) -> Self {
        LedgerError::Request {
            endpoint: endpoint.into(),
            source,
        }
    }
}

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn incomplete_cookies_lists_every_missing_name() {
        let err = ConfigError::IncompleteCookies {
            missing: vec!["JSESSIONID", "bcookie"],
        };
        assert_eq!(err.to_string(), "Cookie 认证缺少: JSESSIONID, bcookie");
    }

    #[test]
    fn config_error_converts_into_app_error() {
        let err: AppError = ConfigError::EnvVarNotFound {
            var_name: "GOOGLE_SHEET_ID".to_string(),
        }
        .into();
        assert!(matches!(err, AppError::Config(_)));
        assert!(err.to_string().contains("GOOGLE_SHEET_ID"));
    }
}
