//! Blocking reqwest client for Reddit's OAuth API.

use parking_lot::Mutex;
use reqwest::blocking::Client;
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use std::thread::sleep;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::listing::{comment_listing_from_thread_payload, things_from_morechildren, CommentForest, MoreRequest, Thing};
use super::{ApiError, Comment, RedditApi, Submission};
use crate::config::Credentials;

const AUTH_URL: &str = "https://www.reddit.com/api/v1/access_token";
const API_BASE: &str = "https://oauth.reddit.com";
/// Listing endpoints cap `limit` at 100.
const PAGE_SIZE: usize = 100;
/// `morechildren` accepts at most 100 ids per call.
const MORE_BATCH: usize = 100;
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
/// Password-grant tokens live one hour unless the response says otherwise.
const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(3600);
/// A token this close to expiry is renewed before use.
const REFRESH_MARGIN: Duration = Duration::from_secs(120);
/// Fallback wait when a 429 carries no `X-Ratelimit-Reset`.
const DEFAULT_RESET: Duration = Duration::from_secs(60);
const MAX_RESET: Duration = Duration::from_secs(600);
/// Attempts per request, counting waits for the rate limit.
const MAX_ATTEMPTS: usize = 5;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    expires_in: Option<u64>,
    #[serde(default)]
    error: Option<String>,
}

/// A bearer token and the instant it stops being accepted.
#[derive(Clone, Debug)]
pub struct AccessToken {
    pub value: String,
    pub expires_at: Instant,
}

impl AccessToken {
    pub fn new(value: impl Into<String>, issued: Instant, ttl: Duration) -> Self {
        Self { value: value.into(), expires_at: issued + ttl }
    }

    /// True once `now` is within the refresh margin of expiry.
    pub fn is_stale(&self, now: Instant) -> bool {
        now + REFRESH_MARGIN >= self.expires_at
    }
}

/// What to do with a response, decided from its status and rate-limit headers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResponseAction {
    Accept,
    /// The token was rejected; log in again and resend.
    Reauthenticate,
    /// Throttled; sleep, then resend.
    Wait(Duration),
    NotFound,
    Fail,
}

/// Seconds from an `X-Ratelimit-Reset` value, rounded up and capped.
pub fn reset_delay(reset: Option<&str>) -> Duration {
    reset
        .and_then(|r| r.trim().parse::<f64>().ok())
        .filter(|s| s.is_finite() && *s >= 0.0)
        .map(|s| Duration::from_secs(s.ceil() as u64).min(MAX_RESET))
        .unwrap_or(DEFAULT_RESET)
}

pub fn response_action(status: StatusCode, reset: Option<&str>) -> ResponseAction {
    match status {
        s if s.is_success() => ResponseAction::Accept,
        StatusCode::UNAUTHORIZED => ResponseAction::Reauthenticate,
        StatusCode::TOO_MANY_REQUESTS => ResponseAction::Wait(reset_delay(reset)),
        StatusCode::NOT_FOUND | StatusCode::FORBIDDEN => ResponseAction::NotFound,
        _ => ResponseAction::Fail,
    }
}

/// Pause owed before the next request when the remaining quota is used up.
pub fn quota_pause(remaining: Option<&str>, reset: Option<&str>) -> Option<Duration> {
    let left = remaining?.trim().parse::<f64>().ok()?;
    (left < 1.0).then(|| reset_delay(reset))
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn request_token(http: &Client, auth_url: &str, creds: &Credentials) -> Result<AccessToken, ApiError> {
    let issued = Instant::now();
    let resp = http
        .post(auth_url)
        .basic_auth(&creds.client_id, Some(&creds.client_secret))
        .form(&[
            ("grant_type", "password"),
            ("username", creds.username.as_str()),
            ("password", creds.password.as_str()),
        ])
        .send()?;
    let status = resp.status();
    if !status.is_success() {
        return Err(ApiError::Auth(format!("token endpoint returned HTTP {status}")));
    }
    let token: TokenResponse = resp.json()?;
    match (token.access_token, token.error) {
        (Some(t), _) => {
            let ttl = token.expires_in.map(Duration::from_secs).unwrap_or(DEFAULT_TOKEN_TTL);
            Ok(AccessToken::new(t, issued, ttl))
        }
        (None, Some(e)) => Err(ApiError::Auth(e)),
        (None, None) => Err(ApiError::Auth("no access token in response".into())),
    }
}

/// Blocking client. With credentials it renews its token before expiry and after
/// a 401; every request waits out 429s and an exhausted rate-limit quota.
pub struct RedditClient {
    http: Client,
    api_base: String,
    auth_url: String,
    creds: Option<Credentials>,
    token: Mutex<AccessToken>,
    resume_at: Mutex<Option<Instant>>,
}

impl RedditClient {
    /// Password-grant login for a script application.
    pub fn login(creds: &Credentials) -> Result<Self, ApiError> {
        Self::login_at(AUTH_URL, API_BASE, creds)
    }

    /// [`RedditClient::login`] against other endpoints.
    pub fn login_at(auth_url: &str, api_base: &str, creds: &Credentials) -> Result<Self, ApiError> {
        let http = Client::builder()
            .user_agent(creds.user_agent.as_str())
            .timeout(DEFAULT_TIMEOUT)
            .build()?;
        let token = request_token(&http, auth_url, creds)?;
        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            auth_url: auth_url.to_string(),
            creds: Some(creds.clone()),
            token: Mutex::new(token),
            resume_at: Mutex::new(None),
        })
    }

    /// Client over an already issued bearer token, against `api_base`. It cannot
    /// renew the token.
    pub fn with_token(api_base: impl Into<String>, token: impl Into<String>, user_agent: &str) -> Result<Self, ApiError> {
        let http = Client::builder().user_agent(user_agent).timeout(DEFAULT_TIMEOUT).build()?;
        Ok(Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            auth_url: AUTH_URL.to_string(),
            creds: None,
            token: Mutex::new(AccessToken::new(token, Instant::now(), DEFAULT_TOKEN_TTL)),
            resume_at: Mutex::new(None),
        })
    }

    fn renew_token(&self) -> Result<(), ApiError> {
        let Some(creds) = &self.creds else {
            return Err(ApiError::Auth("access token expired and no credentials to renew it".into()));
        };
        let fresh = request_token(&self.http, &self.auth_url, creds)?;
        info!("Renewed access token");
        *self.token.lock() = fresh;
        Ok(())
    }

    fn bearer(&self) -> Result<String, ApiError> {
        if self.creds.is_some() && self.token.lock().is_stale(Instant::now()) {
            self.renew_token()?;
        }
        Ok(self.token.lock().value.clone())
    }

    fn wait_for_quota(&self) {
        let pending = self.resume_at.lock().take();
        if let Some(at) = pending {
            let now = Instant::now();
            if at > now {
                debug!("rate-limit quota used up, sleeping {:?}", at - now);
                sleep(at - now);
            }
        }
    }

    fn get_json(&self, path: &str, query: &[(&str, String)]) -> Result<Value, ApiError> {
        let url = format!("{}{}", self.api_base, path);
        let mut renewed = false;
        for attempt in 1..=MAX_ATTEMPTS {
            self.wait_for_quota();
            let token = self.bearer()?;
            debug!("GET {url} {query:?}");
            let resp = self
                .http
                .get(&url)
                .bearer_auth(&token)
                .query(&[("raw_json", "1")])
                .query(query)
                .send()?;
            let status = resp.status();
            let headers = resp.headers();
            let reset = header(headers, "x-ratelimit-reset");
            if let Some(pause) = quota_pause(header(headers, "x-ratelimit-remaining"), reset) {
                *self.resume_at.lock() = Some(Instant::now() + pause);
            }
            match response_action(status, reset) {
                ResponseAction::Accept => return Ok(resp.json()?),
                ResponseAction::Reauthenticate if !renewed && self.creds.is_some() => {
                    warn!("{url} rejected the access token, logging in again");
                    self.renew_token()?;
                    renewed = true;
                }
                ResponseAction::Reauthenticate => {
                    return Err(ApiError::Auth(format!("{url} rejected the access token")));
                }
                ResponseAction::Wait(delay) => {
                    warn!("{url} rate limited (attempt {attempt}/{MAX_ATTEMPTS}), sleeping {delay:?}");
                    sleep(delay);
                }
                ResponseAction::NotFound => return Err(ApiError::NotFound(url)),
                ResponseAction::Fail => return Err(ApiError::Status { status: status.as_u16(), url }),
            }
        }
        Err(ApiError::RateLimited(url))
    }

    fn more_children(&self, link_id: &str, req: &MoreRequest) -> Result<Vec<Thing>, ApiError> {
        let mut out = Vec::new();
        for batch in req.children.chunks(MORE_BATCH) {
            let payload = self.get_json(
                "/api/morechildren",
                &[
                    ("api_type", "json".to_string()),
                    ("link_id", link_id.to_string()),
                    ("children", batch.join(",")),
                    ("limit_children", "false".to_string()),
                ],
            )?;
            out.extend(things_from_morechildren(payload)?);
        }
        Ok(out)
    }

    /// "Continue this thread": refetch the thread focused on the parent comment and
    /// hand back that comment's replies.
    fn continue_thread(&self, thread_id: &str, req: &MoreRequest) -> Result<Vec<Thing>, ApiError> {
        let focus = req.parent_id.trim_start_matches("t1_");
        let payload = self.get_json(
            &format!("/comments/{thread_id}"),
            &[("comment", focus.to_string()), ("limit", "500".to_string())],
        )?;
        let listing = comment_listing_from_thread_payload(payload)?;
        for thing in listing.children {
            if let Thing::Comment(mut data) = thing {
                if data.id == focus {
                    return Ok(data.take_replies()?.map(|l| l.children).unwrap_or_default());
                }
            }
        }
        Ok(Vec::new())
    }
}

impl RedditApi for RedditClient {
    fn user_submissions(&self, username: &str, limit: usize) -> Result<Vec<Submission>, ApiError> {
        let mut out = Vec::new();
        let mut after: Option<String> = None;
        while out.len() < limit {
            let page = (limit - out.len()).min(PAGE_SIZE);
            let mut query = vec![("sort", "new".to_string()), ("limit", page.to_string())];
            if let Some(a) = &after {
                query.push(("after", a.clone()));
            }
            let payload = self.get_json(&format!("/user/{username}/submitted"), &query)?;
            let Thing::Listing(listing) = serde_json::from_value::<Thing>(payload)? else {
                return Err(ApiError::Other(format!("submitted listing of {username} is not a listing")));
            };
            let received = listing.children.len();
            out.extend(listing.children.into_iter().filter_map(|t| match t {
                Thing::Link(link) => Some(link.into_submission()),
                _ => None,
            }));
            after = listing.after;
            if received == 0 || after.is_none() {
                break;
            }
        }
        out.truncate(limit);
        Ok(out)
    }

    fn comment_forest(&self, thread_id: &str) -> Result<Vec<Comment>, ApiError> {
        let link_id = format!("t3_{thread_id}");
        let payload = self.get_json(
            &format!("/comments/{thread_id}"),
            &[("limit", "500".to_string()), ("sort", "confidence".to_string())],
        )?;
        let mut forest = CommentForest::from_listing(comment_listing_from_thread_payload(payload)?)?;
        let mut rounds = 0usize;
        forest.expand(|req| {
            rounds += 1;
            if req.is_continue_thread() {
                self.continue_thread(thread_id, req)
            } else {
                self.more_children(&link_id, req)
            }
        })?;
        debug!("{thread_id}: {} comments after {rounds} expansion requests", forest.len());
        Ok(forest.into_comments())
    }
}
