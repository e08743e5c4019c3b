/// Google Sheets 账本客户端
///
/// 用服务账号 JWT 换取访问令牌，再调用 Sheets v4 REST 接口追加行
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::LedgerError;
use crate::infrastructure::ledger::{LedgerService, Worksheet};

const SHEETS_API_BASE: &str = "https://sheets.googleapis.com";
const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
/// 令牌到期前多久刷新
const TOKEN_REFRESH_MARGIN_SECS: i64 = 60;
/// 账本固定 9 列
const LEDGER_COLUMNS: &str = "A:I";

/// 服务账号凭据中用到的字段
#[derive(Clone, Deserialize)]
struct ServiceAccountKey {
    client_email: String,
    private_key: String,
    #[serde(default = "default_token_uri")]
    token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

#[derive(Serialize)]
struct TokenClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    3600
}

struct CachedToken {
    value: String,
    expires_at: DateTime<Utc>,
}

struct SheetsAuth {
    http: reqwest::Client,
    key: ServiceAccountKey,
    encoding_key: EncodingKey,
    api_base: String,
    token: Mutex<Option<CachedToken>>,
}

impl SheetsAuth {
    /// 获取访问令牌（缓存到临近过期）
    async fn access_token(&self) -> Result<String, LedgerError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.expires_at - ChronoDuration::seconds(TOKEN_REFRESH_MARGIN_SECS) > Utc::now() {
                return Ok(token.value.clone());
            }
        }

        let fresh = self.fetch_token().await?;
        let value = fresh.value.clone();
        *cached = Some(fresh);
        Ok(value)
    }

    async fn fetch_token(&self) -> Result<CachedToken, LedgerError> {
        let now = Utc::now();
        let claims = TokenClaims {
            iss: &self.key.client_email,
            scope: SHEETS_SCOPE,
            aud: &self.key.token_uri,
            iat: now.timestamp(),
            exp: now.timestamp() + 3600,
        };
        let assertion = encode(&Header::new(Algorithm::RS256), &claims, &self.encoding_key)
            .map_err(|e| LedgerError::Authorization(format!("JWT 签名失败: {}", e)))?;

        debug!("向 {} 申请访问令牌", self.key.token_uri);
        let response = self
            .http
            .post(&self.key.token_uri)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await
            .map_err(|e| LedgerError::request(&self.key.token_uri, e))?;

        let response = check_status(&self.key.token_uri, response).await?;
        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| LedgerError::request(&self.key.token_uri, e))?;

        Ok(CachedToken {
            value: token.access_token,
            expires_at: now + ChronoDuration::seconds(token.expires_in),
        })
    }

    fn url(&self, segments: &[&str]) -> Result<Url, LedgerError> {
        let mut url = Url::parse(&self.api_base)
            .map_err(|e| LedgerError::AppendFailed(format!("无效的 API 地址 {}: {}", self.api_base, e)))?;
        url.path_segments_mut()
            .map_err(|_| LedgerError::AppendFailed(format!("无效的 API 地址: {}", self.api_base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

async fn check_status(endpoint: &str, response: reqwest::Response) -> Result<reqwest::Response, LedgerError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(LedgerError::BadResponse {
        endpoint: endpoint.to_string(),
        status: status.as_u16(),
        body,
    })
}

/// A1 表示法的追加范围，工作表名中的单引号需要双写
fn append_range(sheet_title: &str) -> String {
    format!("'{}'!{}", sheet_title.replace('\'', "''"), LEDGER_COLUMNS)
}

/// Google Sheets 客户端
#[derive(Clone)]
pub struct SheetsClient {
    auth: Arc<SheetsAuth>,
}

impl SheetsClient {
    /// 从服务账号 JSON 创建客户端
    pub fn from_credentials_json(credentials: &str) -> Result<Self, LedgerError> {
        Self::with_api_base(credentials, SHEETS_API_BASE)
    }

    /// 使用自定义 API 地址创建（测试或代理环境）
    pub fn with_api_base(credentials: &str, api_base: impl Into<String>) -> Result<Self, LedgerError> {
        let key: ServiceAccountKey = serde_json::from_str(credentials)
            .map_err(|e| LedgerError::Credentials(e.to_string()))?;
        let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .map_err(|e| LedgerError::Credentials(format!("private_key 不是有效的 RSA PEM: {}", e)))?;

        Ok(Self {
            auth: Arc::new(SheetsAuth {
                http: reqwest::Client::new(),
                key,
                encoding_key,
                api_base: api_base.into(),
                token: Mutex::new(None),
            }),
        })
    }
}

#[derive(Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetMeta>,
}

#[derive(Deserialize)]
struct SheetMeta {
    properties: SheetProperties,
}

#[derive(Deserialize)]
struct SheetProperties {
    title: String,
}

#[async_trait]
impl LedgerService for SheetsClient {
    type Sheet = SheetsWorksheet;

    async fn open(&self, ledger_id: &str) -> Result<SheetsWorksheet, LedgerError> {
        let token = self.auth.access_token().await?;
        let mut url = self.auth.url(&["v4", "spreadsheets", ledger_id])?;
        url.query_pairs_mut().append_pair("fields", "sheets.properties.title");
        let endpoint = url.to_string();

        let response = self
            .auth
            .http
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| LedgerError::request(&endpoint, e))?;
        let meta: SpreadsheetMeta = check_status(&endpoint, response)
            .await?
            .json()
            .await
            .map_err(|e| LedgerError::request(&endpoint, e))?;

        let title = meta
            .sheets
            .into_iter()
            .next()
            .map(|s| s.properties.title)
            .ok_or_else(|| LedgerError::NoWorksheet {
                ledger_id: ledger_id.to_string(),
            })?;

        info!("✓ 已连接 Google Sheets: {} (工作表: {})", ledger_id, title);

        Ok(SheetsWorksheet {
            auth: self.auth.clone(),
            spreadsheet_id: ledger_id.to_string(),
            title,
        })
    }
}

/// 表格中的第一张工作表
pub struct SheetsWorksheet {
    auth: Arc<SheetsAuth>,
    spreadsheet_id: String,
    title: String,
}

impl SheetsWorksheet {
    pub fn title(&self) -> &str {
        &self.title
    }
}

#[async_trait]
impl Worksheet for SheetsWorksheet {
    async fn append_row(&self, row: Vec<JsonValue>) -> Result<(), LedgerError> {
        let token = self.auth.access_token().await?;
        let range = append_range(&self.title);
        let target = format!("{}:append", range);
        let mut url = self.auth.url(&[
            "v4",
            "spreadsheets",
            self.spreadsheet_id.as_str(),
            "values",
            target.as_str(),
        ])?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", "USER_ENTERED")
            .append_pair("insertDataOption", "INSERT_ROWS");
        let endpoint = url.to_string();

        let body = json!({
            "range": range,
            "majorDimension": "ROWS",
            "values": [row],
        });
        debug!("追加账本行: {}", body);

        let response = self
            .auth
            .http
            .post(url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(|e| LedgerError::request(&endpoint, e))?;
        check_status(&endpoint, response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_range_quotes_sheet_title() {
        assert_eq!(append_range("Sheet1"), "'Sheet1'!A:I");
        assert_eq!(append_range("Bob's jobs"), "'Bob''s jobs'!A:I");
    }

    #[test]
    fn malformed_credentials_are_rejected() {
        let err = SheetsClient::from_credentials_json("not json").err().unwrap();
        assert!(matches!(err, LedgerError::Credentials(_)));
    }

    #[test]
    fn non_pem_private_key_is_rejected() {
        let creds = r#"{"client_email":"bot@example.iam.gserviceaccount.com","private_key":"nope"}"#;
        let err = SheetsClient::from_credentials_json(creds).err().unwrap();
        assert!(matches!(err, LedgerError::Credentials(msg) if msg.contains("private_key")));
    }
}
