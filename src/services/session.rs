//! 会话服务 - 业务能力层
//!
//! 把认证材料变成一个已登录的浏览上下文。失败对整个运行是致命的。

use std::time::Duration;

use chrono::{DateTime, Local};
use tracing::{debug, info};

use crate::config::{AuthMode, Config, CredentialSource};
use crate::error::{AppError, AuthError, ConfigError, DriverError};
use crate::infrastructure::{BrowserDriver, DomElement, SessionCookie};

/// Cookie 注入的域名
pub const COOKIE_DOMAIN: &str = ".linkedin.com";
/// 登录成功后才会出现的导航栏
pub const LOGIN_LANDMARK: &str = "#global-nav";

const LOGIN_PATH: &str = "/login";
const EMAIL_INPUT: &str = "input#username";
const PASSWORD_INPUT: &str = "input#password";
const LOGIN_SUBMIT: &str = "button[type='submit']";

/// 校验过的认证材料
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    Cookies {
        li_at: String,
        jsessionid: String,
        bcookie: String,
    },
    Password {
        email: String,
        password: String,
    },
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credentials::Cookies { .. } => write!(f, "Credentials::Cookies(<redacted>)"),
            Credentials::Password { email, .. } => write!(f, "Credentials::Password({})", email),
        }
    }
}

impl Credentials {
    /// 按认证模式挑出需要的字段，缺任何一个都是配置错误
    pub fn resolve(mode: AuthMode, source: &CredentialSource) -> Result<Self, ConfigError> {
        match mode {
            AuthMode::Cookie => {
                let mut missing = Vec::new();
                let mut take = |value: &Option<String>, name: &'static str| match value {
                    Some(v) if !v.trim().is_empty() => v.clone(),
                    _ => {
                        missing.push(name);
                        String::new()
                    }
                };
                let li_at = take(&source.li_at, "li_at");
                let jsessionid = take(&source.jsessionid, "JSESSIONID");
                let bcookie = take(&source.bcookie, "bcookie");

                if missing.is_empty() {
                    Ok(Credentials::Cookies {
                        li_at,
                        jsessionid,
                        bcookie,
                    })
                } else {
                    Err(ConfigError::IncompleteCookies { missing })
                }
            }
            AuthMode::Password => {
                let mut missing = Vec::new();
                if source.email.as_deref().map_or(true, |v| v.trim().is_empty()) {
                    missing.push("email");
                }
                if source.password.as_deref().map_or(true, str::is_empty) {
                    missing.push("password");
                }
                match (&source.email, &source.password) {
                    (Some(email), Some(password)) if missing.is_empty() => Ok(Credentials::Password {
                        email: email.trim().to_string(),
                        password: password.clone(),
                    }),
                    _ => Err(ConfigError::IncompletePassword { missing }),
                }
            }
        }
    }

    pub fn mode(&self) -> AuthMode {
        match self {
            Credentials::Cookies { .. } => AuthMode::Cookie,
            Credentials::Password { .. } => AuthMode::Password,
        }
    }

    fn cookies(&self) -> Vec<SessionCookie> {
        match self {
            Credentials::Cookies {
                li_at,
                jsessionid,
                bcookie,
            } => vec![
                SessionCookie::secure("li_at", li_at, COOKIE_DOMAIN),
                SessionCookie::secure("JSESSIONID", jsessionid, COOKIE_DOMAIN),
                SessionCookie::secure("bcookie", bcookie, COOKIE_DOMAIN),
            ],
            Credentials::Password { .. } => Vec::new(),
        }
    }
}

/// 已认证的浏览上下文
#[derive(Debug, Clone)]
pub struct Session {
    valid: bool,
    created_at: DateTime<Local>,
    mode: AuthMode,
}

impl Session {
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn created_at(&self) -> DateTime<Local> {
        self.created_at
    }

    pub fn mode(&self) -> AuthMode {
        self.mode
    }

    /// 显式结束会话
    pub fn invalidate(&mut self) {
        self.valid = false;
    }
}

/// 会话管理器
pub struct SessionManager {
    landing_url: String,
    landmark: String,
    timeout: Duration,
}

impl SessionManager {
    pub fn new(config: &Config) -> Self {
        Self {
            landing_url: config.landing_url.trim_end_matches('/').to_string(),
            landmark: LOGIN_LANDMARK.to_string(),
            timeout: config.auth_timeout,
        }
    }

    /// 登录
    ///
    /// 认证材料不完整时在任何导航之前返回 `ConfigError`
    pub async fn authenticate<D: BrowserDriver>(
        &self,
        driver: &D,
        mode: AuthMode,
        source: &CredentialSource,
    ) -> Result<Session, AppError> {
        let credentials = Credentials::resolve(mode, source)?;
        self.authenticate_with(driver, &credentials).await
    }

    /// 使用已校验的认证材料登录
    pub async fn authenticate_with<D: BrowserDriver>(
        &self,
        driver: &D,
        credentials: &Credentials,
    ) -> Result<Session, AppError> {
        info!("🔐 正在登录 ({:?} 模式)...", credentials.mode());

        driver
            .navigate(&self.landing_url)
            .await
            .map_err(AuthError::Driver)?;

        match credentials {
            Credentials::Cookies { .. } => {
                for cookie in credentials.cookies() {
                    debug!("注入 Cookie: {}", cookie.name);
                    driver.add_cookie(&cookie).await.map_err(AuthError::Driver)?;
                }
            }
            Credentials::Password { email, password } => {
                self.submit_login_form(driver, email, password)
                    .await
                    .map_err(AuthError::Driver)?;
            }
        }

        driver.refresh().await.map_err(AuthError::Driver)?;

        match driver.wait_until(&self.landmark, self.timeout).await {
            Ok(_) => {
                info!("✓ LinkedIn 登录成功");
                Ok(Session {
                    valid: true,
                    created_at: Local::now(),
                    mode: credentials.mode(),
                })
            }
            Err(DriverError::Timeout { .. }) => Err(AuthError::LandmarkTimeout {
                landmark: self.landmark.clone(),
                timeout: self.timeout,
            }
            .into()),
            Err(e) => Err(AuthError::Driver(e).into()),
        }
    }

    async fn submit_login_form<D: BrowserDriver>(
        &self,
        driver: &D,
        email: &str,
        password: &str,
    ) -> Result<(), DriverError> {
        driver
            .navigate(&format!("{}{}", self.landing_url, LOGIN_PATH))
            .await?;

        let email_input = driver.wait_until(EMAIL_INPUT, self.timeout).await?;
        email_input.send_keys(email).await?;
        driver.find_element(PASSWORD_INPUT).await?.send_keys(password).await?;
        driver.find_element(LOGIN_SUBMIT).await?.click().await?;
        debug!("登录表单已提交");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cookies(li_at: Option<&str>, jsessionid: Option<&str>, bcookie: Option<&str>) -> CredentialSource {
        CredentialSource {
            li_at: li_at.map(str::to_string),
            jsessionid: jsessionid.map(str::to_string),
            bcookie: bcookie.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn complete_cookie_triple_resolves() {
        let creds = Credentials::resolve(AuthMode::Cookie, &cookies(Some("a"), Some("b"), Some("c"))).unwrap();
        assert_eq!(creds.mode(), AuthMode::Cookie);
        let names: Vec<String> = creds.cookies().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["li_at", "JSESSIONID", "bcookie"]);
    }

    #[test]
    fn missing_cookie_is_named() {
        let err = Credentials::resolve(AuthMode::Cookie, &cookies(Some("a"), None, Some("  "))).unwrap_err();
        match err {
            ConfigError::IncompleteCookies { missing } => assert_eq!(missing, vec!["JSESSIONID", "bcookie"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn password_mode_ignores_cookies() {
        let source = CredentialSource {
            email: Some(" dev@example.com ".to_string()),
            password: Some("hunter2".to_string()),
            ..cookies(Some("a"), None, None)
        };
        let creds = Credentials::resolve(AuthMode::Password, &source).unwrap();
        assert_eq!(
            creds,
            Credentials::Password {
                email: "dev@example.com".to_string(),
                password: "hunter2".to_string()
            }
        );
    }

    #[test]
    fn password_mode_requires_both_fields() {
        let source = CredentialSource {
            email: Some("dev@example.com".to_string()),
            ..Default::default()
        };
        let err = Credentials::resolve(AuthMode::Password, &source).unwrap_err();
        assert!(matches!(err, ConfigError::IncompletePassword { missing } if missing == vec!["password"]));
    }

    #[test]
    fn debug_output_hides_secrets() {
        let creds = Credentials::resolve(AuthMode::Cookie, &cookies(Some("secret"), Some("b"), Some("c"))).unwrap();
        assert!(!format!("{:?}", creds).contains("secret"));
    }
}
