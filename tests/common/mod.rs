//! 测试用的脚本化浏览器驱动和内存账本

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use easy_apply_runner::config::{AuthMode, Config, CredentialSource};
use easy_apply_runner::error::{DriverError, LedgerError};
use easy_apply_runner::infrastructure::{BrowserDriver, DomElement, SessionCookie, Worksheet};
use easy_apply_runner::models::Region;
use serde_json::Value as JsonValue;

type EventLog = Arc<Mutex<Vec<String>>>;

/// 脚本化的页面元素
#[derive(Clone, Default)]
pub struct FakeElement {
    pub id: String,
    pub text: String,
    pub attrs: HashMap<String, String>,
    pub children: HashMap<String, Vec<FakeElement>>,
    pub reject_input: bool,
    events: Option<EventLog>,
}

impl FakeElement {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            ..Default::default()
        }
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.to_string(), value.to_string());
        self
    }

    pub fn child(mut self, selector: &str, child: FakeElement) -> Self {
        self.children.entry(selector.to_string()).or_default().push(child);
        self
    }

    fn stamped(&self, events: &Option<EventLog>) -> Self {
        let mut element = self.clone();
        element.events = events.clone();
        element
    }

    fn log(&self, event: String) {
        if let Some(events) = &self.events {
            events.lock().unwrap().push(event);
        }
    }
}

/// 逗号分隔的选择器按顺序拆开，逐个精确匹配
fn lookup(map: &HashMap<String, Vec<FakeElement>>, selector: &str) -> Vec<FakeElement> {
    selector
        .split(',')
        .map(str::trim)
        .filter_map(|part| map.get(part))
        .flat_map(|elements| elements.iter().cloned())
        .collect()
}

#[async_trait]
impl DomElement for FakeElement {
    async fn click(&self) -> Result<(), DriverError> {
        self.log(format!("click:{}", self.id));
        Ok(())
    }

    async fn send_keys(&self, text: &str) -> Result<(), DriverError> {
        if self.reject_input {
            return Err(DriverError::Interaction(format!("{} 不可输入", self.id)));
        }
        self.log(format!("type:{}:{}", self.id, text));
        Ok(())
    }

    async fn text(&self) -> Result<String, DriverError> {
        Ok(self.text.clone())
    }

    async fn attribute(&self, name: &str) -> Result<Option<String>, DriverError> {
        Ok(self.attrs.get(name).cloned())
    }

    async fn find_child(&self, selector: &str) -> Result<Self, DriverError> {
        lookup(&self.children, selector)
            .first()
            .map(|child| child.stamped(&self.events))
            .ok_or_else(|| DriverError::not_found(selector))
    }
}

/// 一个页面：选择器 → 元素列表
#[derive(Clone, Default)]
pub struct FakePage {
    elements: HashMap<String, Vec<FakeElement>>,
}

impl FakePage {
    pub fn with(mut self, selector: &str, element: FakeElement) -> Self {
        self.elements.entry(selector.to_string()).or_default().push(element);
        self
    }
}

/// 脚本化驱动
///
/// 当前页面取 URL 中包含的最长页面键；登录标志在刷新后出现
pub struct FakeDriver {
    pages: HashMap<String, FakePage>,
    landmark: Option<String>,
    current_url: Mutex<String>,
    refreshed: Mutex<bool>,
    navigations: Mutex<Vec<String>>,
    cookies: Mutex<Vec<SessionCookie>>,
    events: EventLog,
}

impl FakeDriver {
    pub fn new() -> Self {
        Self {
            pages: HashMap::new(),
            landmark: Some("#global-nav".to_string()),
            current_url: Mutex::new(String::new()),
            refreshed: Mutex::new(false),
            navigations: Mutex::new(Vec::new()),
            cookies: Mutex::new(Vec::new()),
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// 登录后永远不会出现导航栏
    pub fn without_landmark(mut self) -> Self {
        self.landmark = None;
        self
    }

    pub fn page(mut self, url_fragment: &str, page: FakePage) -> Self {
        self.pages.insert(url_fragment.to_string(), page);
        self
    }

    pub fn navigations(&self) -> Vec<String> {
        self.navigations.lock().unwrap().clone()
    }

    pub fn navigations_containing(&self, fragment: &str) -> usize {
        self.navigations().iter().filter(|url| url.contains(fragment)).count()
    }

    pub fn cookie_names(&self) -> Vec<String> {
        self.cookies.lock().unwrap().iter().map(|c| c.name.clone()).collect()
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    fn current_page(&self) -> Option<&FakePage> {
        let url = self.current_url.lock().unwrap().clone();
        self.pages
            .iter()
            .filter(|(key, _)| url.contains(key.as_str()))
            .max_by_key(|(key, _)| key.len())
            .map(|(_, page)| page)
    }

    fn query(&self, selector: &str) -> Vec<FakeElement> {
        let events = Some(self.events.clone());
        let mut found: Vec<FakeElement> = self
            .current_page()
            .map(|page| lookup(&page.elements, selector))
            .unwrap_or_default()
            .iter()
            .map(|e| e.stamped(&events))
            .collect();

        if let Some(landmark) = &self.landmark {
            let logged_in = *self.refreshed.lock().unwrap();
            if logged_in && selector.split(',').any(|part| part.trim() == landmark) {
                found.push(FakeElement::new("landmark").stamped(&events));
            }
        }
        found
    }
}

#[async_trait]
impl BrowserDriver for FakeDriver {
    type Element = FakeElement;

    async fn navigate(&self, url: &str) -> Result<(), DriverError> {
        self.navigations.lock().unwrap().push(url.to_string());
        if url.contains("unreachable") {
            return Err(DriverError::Navigation {
                url: url.to_string(),
                message: "net::ERR_NAME_NOT_RESOLVED".to_string(),
            });
        }
        *self.current_url.lock().unwrap() = url.to_string();
        Ok(())
    }

    async fn find_element(&self, selector: &str) -> Result<FakeElement, DriverError> {
        self.query(selector)
            .into_iter()
            .next()
            .ok_or_else(|| DriverError::not_found(selector))
    }

    async fn find_elements(&self, selector: &str) -> Result<Vec<FakeElement>, DriverError> {
        Ok(self.query(selector))
    }

    async fn add_cookie(&self, cookie: &SessionCookie) -> Result<(), DriverError> {
        self.cookies.lock().unwrap().push(cookie.clone());
        Ok(())
    }

    async fn refresh(&self) -> Result<(), DriverError> {
        *self.refreshed.lock().unwrap() = true;
        Ok(())
    }

    async fn execute_script(&self, _js: &str) -> Result<JsonValue, DriverError> {
        Ok(JsonValue::Null)
    }
}

/// 搜索结果中的一张职位卡片
pub fn job_card(id: &str, title: &str, company: &str, easy_apply: bool) -> FakeElement {
    let mut card = FakeElement::new(&format!("card-{}", id))
        .with_text(title)
        .child("h3.base-search-card__title", FakeElement::new("title").with_text(title))
        .child("h4.base-search-card__subtitle", FakeElement::new("company").with_text(company))
        .child(
            "a.base-card__full-link",
            FakeElement::new("link").attr(
                "href",
                &format!("https://www.linkedin.com/jobs/view/{}?refId=abc", id),
            ),
        );
    if easy_apply {
        card = card.child(
            ".job-search-card__easy-apply-label",
            FakeElement::new("easy-apply-label").with_text("Easy Apply"),
        );
    }
    card
}

/// 带有 n 张 Easy Apply 卡片的搜索页
pub fn search_page(ids: impl IntoIterator<Item = String>) -> FakePage {
    ids.into_iter().fold(FakePage::default(), |page, id| {
        let card = job_card(&id, &format!("Developer {}", id), &format!("Company {}", id), true);
        page.with("div.base-card", card)
    })
}

/// Easy Apply 弹窗内的选择器
pub const MODAL_TEXT_INPUT: &str = ".jobs-easy-apply-modal input[type='text']";
pub const MODAL_TEXTAREA: &str = ".jobs-easy-apply-modal textarea";
pub const MODAL_BUTTON: &str = ".jobs-easy-apply-modal button";

/// 职位页顶部的全局搜索框和"发消息"按钮，不属于申请表单
fn page_chrome() -> FakePage {
    FakePage::default()
        .with("input[type='text']", FakeElement::new("global-search"))
        .with("button", FakeElement::new("message-recruiter").with_text("Enviar mensaje"))
}

/// 可以正常投递的职位页
pub fn applicable_job_page() -> FakePage {
    page_chrome()
        .with(
            "button[aria-label*='Easy Apply']",
            FakeElement::new("easy-apply").attr("aria-label", "Easy Apply to this job"),
        )
        .with(MODAL_TEXT_INPUT, FakeElement::new("phone"))
        .with(MODAL_TEXT_INPUT, FakeElement::new("city").attr("value", "Lima"))
        .with(MODAL_TEXTAREA, FakeElement::new("cover-letter"))
        .with(MODAL_BUTTON, FakeElement::new("dismiss").with_text("Dismiss"))
        .with(MODAL_BUTTON, FakeElement::new("submit").with_text("Submit application"))
}

/// 只有外部申请按钮的职位页（同样带 `jobs-apply-button` 类）
pub fn external_job_page() -> FakePage {
    page_chrome().with(
        "button.jobs-apply-button",
        FakeElement::new("external-apply")
            .attr("aria-label", "Apply on company website")
            .with_text("Apply"),
    )
}

/// 只有"下一步"的多步表单
pub fn multi_step_job_page() -> FakePage {
    page_chrome()
        .with(
            "button[aria-label*='Easy Apply']",
            FakeElement::new("easy-apply").attr("aria-label", "Easy Apply"),
        )
        .with(MODAL_BUTTON, FakeElement::new("next").with_text("Siguiente"))
}

/// 内存账本，可以让前 n 次追加失败
#[derive(Clone, Default)]
pub struct MemoryWorksheet {
    rows: Arc<Mutex<Vec<Vec<JsonValue>>>>,
    failures_left: Arc<AtomicUsize>,
}

impl MemoryWorksheet {
    pub fn failing(times: usize) -> Self {
        let sheet = Self::default();
        sheet.failures_left.store(times, Ordering::SeqCst);
        sheet
    }

    pub fn rows(&self) -> Vec<Vec<JsonValue>> {
        self.rows.lock().unwrap().clone()
    }
}

#[async_trait]
impl Worksheet for MemoryWorksheet {
    async fn append_row(&self, row: Vec<JsonValue>) -> Result<(), LedgerError> {
        let left = self.failures_left.load(Ordering::SeqCst);
        if left > 0 {
            self.failures_left.store(left - 1, Ordering::SeqCst);
            return Err(LedgerError::AppendFailed("RESOURCE_EXHAUSTED".to_string()));
        }
        self.rows.lock().unwrap().push(row);
        Ok(())
    }
}

/// 没有任何等待的测试配置
pub fn fast_config(regions: Vec<Region>, daily_cap: u32) -> Config {
    let mut config = Config::default();
    config.auth_mode = AuthMode::Cookie;
    config.credentials = CredentialSource {
        li_at: Some("AQEDAT-test".to_string()),
        jsessionid: Some("ajax:123".to_string()),
        bcookie: Some("v=2&abc".to_string()),
        ..Default::default()
    };
    config.auth_timeout = Duration::from_millis(1);
    config.regions = regions;
    config.search.listing_timeout = Duration::from_millis(1);
    config.search.scroll_passes = 0;
    config.search.scroll_pause = Duration::ZERO;
    config.throttle.daily_cap_min = daily_cap;
    config.throttle.daily_cap_max = daily_cap;
    config.throttle.action_delay = Duration::ZERO;
    config.throttle.submit_delay = Duration::ZERO;
    config.apply.easy_apply_timeout = Duration::from_millis(1);
    config.apply.settle_delay = Duration::ZERO;
    config.run_seed = Some(7);
    config
}
