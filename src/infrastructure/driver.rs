//! 浏览器驱动能力 - 基础设施层
//!
//! 上层只通过这两个 trait 使用浏览器：导航、查找、等待、点击、输入、读文本。
//! 驱动的“当前页面”是全局可变状态，调用方必须顺序使用，不能并发导航。

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use tokio::time::{sleep, Instant};

use crate::error::DriverError;

/// `wait_until` 的轮询间隔
pub const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// 需要注入浏览器的 Cookie
#[derive(Clone, PartialEq, Eq)]
pub struct SessionCookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub secure: bool,
    pub http_only: bool,
}

impl SessionCookie {
    /// 站点域名下的安全 Cookie
    pub fn secure(name: impl Into<String>, value: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: domain.into(),
            secure: true,
            http_only: true,
        }
    }
}

impl std::fmt::Debug for SessionCookie {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCookie")
            .field("name", &self.name)
            .field("value", &"<redacted>")
            .field("domain", &self.domain)
            .finish()
    }
}

/// 页面中的一个元素
#[async_trait]
pub trait DomElement: Sized + Send + Sync {
    async fn click(&self) -> Result<(), DriverError>;

    async fn send_keys(&self, text: &str) -> Result<(), DriverError>;

    /// 元素的可见文本
    async fn text(&self) -> Result<String, DriverError>;

    async fn attribute(&self, name: &str) -> Result<Option<String>, DriverError>;

    /// 在元素内部查找子元素
    async fn find_child(&self, selector: &str) -> Result<Self, DriverError>;
}

/// 浏览器驱动
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    type Element: DomElement;

    async fn navigate(&self, url: &str) -> Result<(), DriverError>;

    /// 查找单个元素，不存在时返回 `DriverError::NotFound`
    async fn find_element(&self, selector: &str) -> Result<Self::Element, DriverError>;

    async fn find_elements(&self, selector: &str) -> Result<Vec<Self::Element>, DriverError>;

    async fn add_cookie(&self, cookie: &SessionCookie) -> Result<(), DriverError>;

    async fn refresh(&self) -> Result<(), DriverError>;

    /// 执行脚本（只用于滚动节奏控制）
    async fn execute_script(&self, js: &str) -> Result<JsonValue, DriverError>;

    /// 等待元素出现，超时返回 `DriverError::Timeout`
    async fn wait_until(&self, selector: &str, timeout: Duration) -> Result<Self::Element, DriverError> {
        let deadline = Instant::now() + timeout;
        loop {
            match self.find_element(selector).await {
                Ok(element) => return Ok(element),
                Err(e) if e.is_not_found() => {}
                Err(e) => return Err(e),
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(DriverError::Timeout {
                    selector: selector.to_string(),
                    timeout,
                });
            }
            sleep(WAIT_POLL_INTERVAL.min(deadline - now)).await;
        }
    }
}
