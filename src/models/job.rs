use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::models::Region;

/// 薪资未公布时使用的占位文本
pub const SALARY_PLACEHOLDER: &str = "TBD";

/// 搜索结果中的一个职位
///
/// 由发现引擎创建，之后只读；申请结束后即丢弃（只有账本会保留它的痕迹）。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPosting {
    pub title: String,
    pub company: String,
    pub link: String,
    pub region: Region,
    /// 卡片上声明的薪资，或 `SALARY_PLACEHOLDER`
    pub salary: String,
    pub easy_apply: bool,
}

impl JobPosting {
    /// 声明薪资是否满足最低月薪（美元）
    ///
    /// 无法解析的薪资一律放行
    pub fn meets_minimum_salary(&self, min_monthly_usd: u64) -> bool {
        match monthly_salary_ceiling(&self.salary) {
            Some(monthly) => monthly >= min_monthly_usd,
            None => true,
        }
    }
}

/// 去掉链接上的跟踪参数和锚点
pub fn normalize_link(link: &str) -> String {
    let end = link.find(['?', '#']).unwrap_or(link.len());
    link[..end].trim_end_matches('/').to_string()
}

fn amount_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)(\d{1,3}(?:[.,]\d{3})+|\d+(?:\.\d+)?)\s*(k)?").ok())
        .as_ref()
}

/// 年薪标记："/yr"、"/año"、"/a" 或完整的 year / anual 等词
fn yearly_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)/\s*(?:yr|year|año|a)\b|\b(?:year|yearly|annual|annually|anual|año)\b").ok()
    })
    .as_ref()
}

/// 时薪标记："/hr"、"/h"、"/hora" 或完整的 hour / hora 等词（"ahora" 不算）
fn hourly_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)/\s*(?:hr|h|hour|hora)\b|\b(?:hour|hourly|hora)\b").ok())
        .as_ref()
}

fn has_marker(re: Option<&'static Regex>, text: &str) -> bool {
    re.map_or(false, |re| re.is_match(text))
}

/// 从薪资文本中解析出换算成月薪的上限
///
/// 支持 "$50K/yr - $70K/yr"、"US$1.500 - US$2.000 / mes"、"$35/hr" 之类的写法。
pub fn monthly_salary_ceiling(text: &str) -> Option<u64> {
    if text.trim().is_empty() || text == SALARY_PLACEHOLDER {
        return None;
    }

    let ceiling = amount_regex()?
        .captures_iter(text)
        .filter_map(|cap| {
            let raw = cap.get(1)?.as_str();
            let value = if raw.len() > 4 && raw[raw.len() - 4..].starts_with(['.', ',']) {
                raw.replace(['.', ','], "").parse::<f64>().ok()?
            } else {
                raw.replace(',', "").parse::<f64>().ok()?
            };
            Some(if cap.get(2).is_some() { value * 1000.0 } else { value })
        })
        .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.max(v))))?;

    let monthly = if has_marker(yearly_regex(), text) {
        ceiling / 12.0
    } else if has_marker(hourly_regex(), text) {
        ceiling * 160.0
    } else {
        ceiling
    };

    Some(monthly.round() as u64)
}
