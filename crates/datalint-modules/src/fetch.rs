use crate::retry::RetryPolicy;
use datalint_domain::{ArchiveKey, Cancelled, RunContext};
use std::io;

pub const GITHUB_API_BASE: &str = "https://api.github.com";

const USER_AGENT: &str = concat!("datalint/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Cancelled(#[from] Cancelled),
}

impl FetchError {
    /// Server errors, timeouts, rate limiting, and transport failures are worth another try.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Status { status, .. } => {
                matches!(status, 408 | 429) || (500..600).contains(status)
            }
            FetchError::Transport { .. } => true,
            FetchError::Io(_) | FetchError::Cancelled(_) => false,
        }
    }

    fn transport(url: &str, err: reqwest::Error) -> Self {
        FetchError::Transport {
            url: url.to_string(),
            message: err.to_string(),
        }
    }
}

/// Source of module archives (gzip'd tarballs with a single top-level directory).
pub trait Fetcher: Send + Sync {
    fn fetch(&self, key: &ArchiveKey, ctx: &RunContext) -> Result<Vec<u8>, FetchError>;
}

/// Downloads archives from the GitHub tarball endpoint.
#[derive(Clone, Debug)]
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
    api_base: String,
    token: Option<String>,
    retry: RetryPolicy,
}

impl HttpFetcher {
    pub fn new(token: Option<String>) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|err| FetchError::transport(GITHUB_API_BASE, err))?;
        Ok(Self {
            client,
            api_base: GITHUB_API_BASE.to_string(),
            token: token.filter(|t| !t.is_empty()),
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn tarball_url(&self, key: &ArchiveKey) -> String {
        format!(
            "{}/repos/{}/{}/tarball/{}",
            self.api_base, key.owner, key.repo, key.git_ref
        )
    }

    fn fetch_once(&self, url: &str, ctx: &RunContext) -> Result<Vec<u8>, FetchError> {
        let mut request = self.client.get(url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        if let Some(remaining) = ctx.cancel.remaining() {
            request = request.timeout(remaining);
        }

        let response = request
            .send()
            .map_err(|err| FetchError::transport(url, err))?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let body = response
            .bytes()
            .map_err(|err| FetchError::transport(url, err))?;
        Ok(body.to_vec())
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, key: &ArchiveKey, ctx: &RunContext) -> Result<Vec<u8>, FetchError> {
        let url = self.tarball_url(key);
        tracing::debug!(parent: &ctx.span, %url, archive = %key, "downloading module archive");
        self.retry.run(ctx, |_| self.fetch_once(&url, ctx))
    }
}
