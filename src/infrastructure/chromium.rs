//! chromiumoxide 驱动适配 - 基础设施层
//!
//! 持有唯一的 Page 资源，把它包装成 `BrowserDriver` 能力

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::network::CookieParam;
use chromiumoxide::element::Element;
use chromiumoxide::Page;
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::error::DriverError;
use crate::infrastructure::driver::{BrowserDriver, DomElement, SessionCookie};

/// chromiumoxide 驱动
///
/// 职责：
/// - 持有唯一的 Page 资源
/// - 不认识 JobPosting / Region
/// - 不处理业务流程
pub struct ChromiumDriver {
    page: Page,
}

impl ChromiumDriver {
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    /// 获取 page 的引用（用于其他操作）
    pub fn page(&self) -> &Page {
        &self.page
    }
}

#[async_trait]
impl BrowserDriver for ChromiumDriver {
    type Element = ChromiumElement;

    async fn navigate(&self, url: &str) -> Result<(), DriverError> {
        debug!("导航到: {}", url);
        self.page
            .goto(url)
            .await
            .map_err(|e| DriverError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            })?;
        Ok(())
    }

    async fn find_element(&self, selector: &str) -> Result<ChromiumElement, DriverError> {
        // querySelector 找不到时只给出笼统的协议错误，这里用 querySelectorAll 区分“不存在”
        self.find_elements(selector)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| DriverError::not_found(selector))
    }

    async fn find_elements(&self, selector: &str) -> Result<Vec<ChromiumElement>, DriverError> {
        let elements = self.page.find_elements(selector).await?;
        Ok(elements.into_iter().map(ChromiumElement).collect())
    }

    async fn add_cookie(&self, cookie: &SessionCookie) -> Result<(), DriverError> {
        let param = CookieParam::builder()
            .name(cookie.name.clone())
            .value(cookie.value.clone())
            .domain(cookie.domain.clone())
            .secure(cookie.secure)
            .http_only(cookie.http_only)
            .build()
            .map_err(DriverError::Protocol)?;
        self.page.set_cookie(param).await?;
        Ok(())
    }

    async fn refresh(&self) -> Result<(), DriverError> {
        self.page.reload().await?;
        Ok(())
    }

    async fn execute_script(&self, js: &str) -> Result<JsonValue, DriverError> {
        let result = self
            .page
            .evaluate(js)
            .await
            .map_err(|e| DriverError::Script(e.to_string()))?;
        Ok(result.value().cloned().unwrap_or(JsonValue::Null))
    }
}

/// chromiumoxide 元素
pub struct ChromiumElement(Element);

#[async_trait]
impl DomElement for ChromiumElement {
    async fn click(&self) -> Result<(), DriverError> {
        self.0
            .click()
            .await
            .map_err(|e| DriverError::Interaction(e.to_string()))?;
        Ok(())
    }

    async fn send_keys(&self, text: &str) -> Result<(), DriverError> {
        self.0
            .type_str(text)
            .await
            .map_err(|e| DriverError::Interaction(e.to_string()))?;
        Ok(())
    }

    async fn text(&self) -> Result<String, DriverError> {
        Ok(self.0.inner_text().await?.unwrap_or_default())
    }

    async fn attribute(&self, name: &str) -> Result<Option<String>, DriverError> {
        Ok(self.0.attribute(name).await?)
    }

    async fn find_child(&self, selector: &str) -> Result<Self, DriverError> {
        self.0
            .find_elements(selector)
            .await?
            .into_iter()
            .next()
            .map(ChromiumElement)
            .ok_or_else(|| DriverError::not_found(selector))
    }
}
