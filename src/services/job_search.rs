//! 职位发现服务 - 业务能力层
//!
//! 只负责"在一个地区搜索 Easy Apply 职位"，不关心投递流程

use reqwest::Url;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::SearchSettings;
use crate::error::{ConfigError, DriverError, ExtractionError};
use crate::infrastructure::{BrowserDriver, DomElement};
use crate::models::{normalize_link, JobPosting, Region, SALARY_PLACEHOLDER};

/// 搜索结果中的职位卡片
pub const JOB_CARD: &str = "div.base-card";
const CARD_TITLE: &str = "h3.base-search-card__title";
const CARD_COMPANY: &str = "h4.base-search-card__subtitle";
const CARD_LINK: &str = "a.base-card__full-link";
const CARD_SALARY: &str = ".job-search-card__salary-info";
/// 卡片上的 Easy Apply 标记（英文 / 西语界面）
pub const EASY_APPLY_MARKER: &str =
    "button[aria-label*='Easy Apply'], button[aria-label*='Solicitud sencilla'], .job-search-card__easy-apply-label";
const EASY_APPLY_TEXTS: [&str; 2] = ["easy apply", "solicitud sencilla"];

const SCROLL_SCRIPT: &str = "window.scrollBy(0, window.innerHeight);";

/// 远程 + 混合办公
const WORK_TYPE_REMOTE_HYBRID: &str = "2,3";
/// 站点的年薪档位：第 n 档 = 20k + 20k * n 美元
const SALARY_BUCKET_STEP_USD: u64 = 20_000;

/// 职位发现服务
///
/// 职责：
/// - 拼装搜索地址
/// - 等待并提取职位卡片，单张卡片失败只跳过该卡片
/// - 只返回 Easy Apply 职位
/// - 不去重
pub struct JobDiscovery {
    settings: SearchSettings,
    base_url: Url,
}

impl JobDiscovery {
    pub fn new(settings: SearchSettings) -> Result<Self, ConfigError> {
        let base_url = Url::parse(&settings.base_url).map_err(|e| ConfigError::InvalidValue {
            field: "search.base_url",
            reason: e.to_string(),
        })?;
        Ok(Self { settings, base_url })
    }

    /// 构建某个地区的搜索地址
    pub fn search_url(&self, region: Region) -> Url {
        let keywords = self
            .settings
            .keywords
            .iter()
            .map(|k| k.trim())
            .filter(|k| !k.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        let mut url = self.base_url.clone();
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("keywords", &keywords)
                .append_pair("location", region.name())
                .append_pair("f_WT", WORK_TYPE_REMOTE_HYBRID)
                .append_pair("f_AL", "true");
            if let Some(bucket) = salary_bucket(self.settings.min_monthly_salary_usd) {
                query.append_pair("f_SB2", &bucket.to_string());
            }
        }
        url
    }

    /// 搜索一个地区
    ///
    /// 永不报错：等待超时或导航失败都返回空列表
    pub async fn discover<D: BrowserDriver>(&self, driver: &D, region: Region) -> Vec<JobPosting> {
        let url = self.search_url(region);
        info!("[地区 {}] 🔍 搜索职位...", region);
        debug!("[地区 {}] 搜索地址: {}", region, url);

        if let Err(e) = driver.navigate(url.as_str()).await {
            warn!("[地区 {}] ⚠️ 打开搜索页失败: {}", region, e);
            return Vec::new();
        }

        match driver.wait_until(JOB_CARD, self.settings.listing_timeout).await {
            Ok(_) => {}
            Err(DriverError::Timeout { .. }) => {
                warn!(
                    "[地区 {}] ⚠️ {:?} 内未出现职位列表",
                    region, self.settings.listing_timeout
                );
                return Vec::new();
            }
            Err(e) => {
                warn!("[地区 {}] ⚠️ 等待职位列表失败: {}", region, e);
                return Vec::new();
            }
        }

        self.scroll(driver, region).await;

        let cards = match driver.find_elements(JOB_CARD).await {
            Ok(cards) => cards,
            Err(e) => {
                warn!("[地区 {}] ⚠️ 读取职位卡片失败: {}", region, e);
                return Vec::new();
            }
        };

        let total_cards = cards.len();
        let mut jobs = Vec::new();
        for (index, card) in cards.iter().take(self.settings.max_per_region).enumerate() {
            match extract_posting(card, index, region).await {
                Ok(posting) if !posting.easy_apply => {
                    debug!("[地区 {}] 跳过非 Easy Apply 职位: {}", region, posting.title);
                }
                Ok(posting) if !posting.meets_minimum_salary(self.settings.min_monthly_salary_usd) => {
                    debug!(
                        "[地区 {}] 跳过低于最低薪资的职位: {} ({})",
                        region, posting.title, posting.salary
                    );
                }
                Ok(posting) => jobs.push(posting),
                Err(e) => warn!("[地区 {}] 提取职位失败: {}", region, e),
            }
        }

        info!(
            "[地区 {}] ✓ 找到 {} 个 Easy Apply 职位 (共 {} 张卡片)",
            region,
            jobs.len(),
            total_cards
        );
        jobs
    }

    /// 滚动几屏以加载更多职位，失败不影响结果
    async fn scroll<D: BrowserDriver>(&self, driver: &D, region: Region) {
        for _ in 0..self.settings.scroll_passes {
            if let Err(e) = driver.execute_script(SCROLL_SCRIPT).await {
                debug!("[地区 {}] 滚动失败: {}", region, e);
                break;
            }
            sleep(self.settings.scroll_pause).await;
        }
    }
}

/// 最低月薪对应的站点年薪档位，低于第一档时不加该过滤
fn salary_bucket(min_monthly_usd: u64) -> Option<u64> {
    let yearly = min_monthly_usd.saturating_mul(12);
    let bucket = (yearly / SALARY_BUCKET_STEP_USD).saturating_sub(1);
    (bucket >= 1).then(|| bucket.min(9))
}

async fn read_field<E: DomElement>(
    card: &E,
    selector: &str,
    index: usize,
    field: &'static str,
) -> Result<String, ExtractionError> {
    let element = card.find_child(selector).await.map_err(|e| ExtractionError {
        index,
        field,
        reason: e.to_string(),
    })?;
    let text = element.text().await.map_err(|e| ExtractionError {
        index,
        field,
        reason: e.to_string(),
    })?;
    let text = text.trim().to_string();
    if text.is_empty() {
        return Err(ExtractionError {
            index,
            field,
            reason: "内容为空".to_string(),
        });
    }
    Ok(text)
}

/// 从一张卡片中提取职位
async fn extract_posting<E: DomElement>(card: &E, index: usize, region: Region) -> Result<JobPosting, ExtractionError> {
    let title = read_field(card, CARD_TITLE, index, "title").await?;
    let company = read_field(card, CARD_COMPANY, index, "company").await?;

    let link_element = card.find_child(CARD_LINK).await.map_err(|e| ExtractionError {
        index,
        field: "link",
        reason: e.to_string(),
    })?;
    let link = link_element
        .attribute("href")
        .await
        .map_err(|e| ExtractionError {
            index,
            field: "link",
            reason: e.to_string(),
        })?
        .filter(|href| !href.trim().is_empty())
        .ok_or_else(|| ExtractionError {
            index,
            field: "link",
            reason: "缺少 href".to_string(),
        })?;

    // 薪资和 Easy Apply 标记都是可选的，读不到不算失败
    let salary = read_field(card, CARD_SALARY, index, "salary")
        .await
        .unwrap_or_else(|_| SALARY_PLACEHOLDER.to_string());
    let easy_apply = has_easy_apply_marker(card).await;

    Ok(JobPosting {
        title,
        company,
        link: normalize_link(link.trim()),
        region,
        salary,
        easy_apply,
    })
}

async fn has_easy_apply_marker<E: DomElement>(card: &E) -> bool {
    if card.find_child(EASY_APPLY_MARKER).await.is_ok() {
        return true;
    }
    match card.text().await {
        Ok(text) => {
            let text = text.to_lowercase();
            EASY_APPLY_TEXTS.iter().any(|t| text.contains(t))
        }
        Err(_) => false,
    }
}
