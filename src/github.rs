// Copyright (c) 2021  Teddy Wing
//
// This file is part of Clonehub.
//
// Clonehub is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// Clonehub is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with Clonehub. If not, see <https://www.gnu.org/licenses/>.


use std::time::{Duration, SystemTime, UNIX_EPOCH};

use reqwest::header::HeaderMap;
use reqwest::{ClientBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror;


const USER_AGENT: &'static str = concat!(
    env!("CARGO_PKG_NAME"),
    "/",
    env!("CARGO_PKG_VERSION"),
);

const GITHUB_API_ROOT: &'static str = "https://api.github.com";

const RATE_LIMIT_REMAINING: &'static str = "x-ratelimit-remaining";
const RATE_LIMIT_RESET: &'static str = "x-ratelimit-reset";

/// Slack added on top of the reported reset time before retrying.
const RATE_LIMIT_BUFFER: Duration = Duration::from_secs(10);


#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("request error")]
    Http(#[from] reqwest::Error),

    #[error("request header error")]
    Header(#[from] reqwest::header::InvalidHeaderValue),

    #[error("GitHub API error {status} for {url}")]
    Api { status: StatusCode, url: String },
}


#[derive(Debug, Deserialize)]
pub struct Repo {
    pub name: String,
    pub clone_url: String,
}

#[derive(Debug, Deserialize)]
pub struct Member {
    pub login: String,
}


#[derive(Debug)]
pub struct Client {
    http: reqwest::Client,
    api_root: String,
    rate_limit_buffer: Duration,
}

impl Client {
    pub fn new(token: &str) -> Result<Self, Error> {
        Self::with_api_root(token, GITHUB_API_ROOT.to_owned())
    }

    fn with_api_root(token: &str, api_root: String) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        headers.insert("Accept", "application/vnd.github.v3+json".parse()?);
        headers.insert("Authorization", format!("Bearer {}", token).parse()?);

        let http = ClientBuilder::new()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()?;

        Ok(
            Client {
                http: http,
                api_root: api_root,
                rate_limit_buffer: RATE_LIMIT_BUFFER,
            }
        )
    }

    /// Fetch all repositories starred by the given user.
    pub async fn starred_repos(&self, user: &str) -> Result<Vec<Repo>, Error> {
        self.get_paged(
            format!("{}/users/{}/starred?per_page=100", self.api_root, user),
        ).await
    }

    /// Fetch all repositories belonging to the given user.
    pub async fn user_repos(&self, user: &str) -> Result<Vec<Repo>, Error> {
        self.get_paged(
            format!("{}/users/{}/repos?per_page=100", self.api_root, user),
        ).await
    }

    /// Fetch all repositories owned by the given organization.
    pub async fn org_repos(&self, org: &str) -> Result<Vec<Repo>, Error> {
        self.get_paged(
            format!("{}/orgs/{}/repos?per_page=100", self.api_root, org),
        ).await
    }

    /// Fetch the members of the given organization.
    pub async fn org_members(&self, org: &str) -> Result<Vec<Member>, Error> {
        self.get_paged(
            format!("{}/orgs/{}/members?per_page=100", self.api_root, org),
        ).await
    }

    /// Walk every page of a JSON array endpoint, following the `Link`
    /// header's `rel="next"` URL until the last page, and concatenate
    /// the results in page order.
    async fn get_paged<T: DeserializeOwned>(
        &self,
        seed_url: String,
    ) -> Result<Vec<T>, Error> {
        let mut results = Vec::new();
        let mut next = Some(seed_url);

        while let Some(url) = next.take() {
            let response = self.http.get(&url).send().await?;
            let status = response.status();
            let headers = response.headers().clone();

            if is_rate_limited(status, &headers) {
                self.wait_for_reset(&headers, "retrying").await;
                next = Some(url);

                continue;
            }

            if !status.is_success() {
                return Err(Error::Api { status: status, url: url });
            }

            results.extend(response.json::<Vec<T>>().await?);

            next = next_link(&headers);

            // The request went through but spent the last of the quota;
            // wait out the window before asking for the next page.
            if next.is_some() && rate_limit_remaining(&headers) == Some(0) {
                self.wait_for_reset(&headers, "fetching the next page").await;
            }
        }

        Ok(results)
    }

    async fn wait_for_reset(&self, headers: &HeaderMap, action: &str) {
        let reset = header_u64(headers, RATE_LIMIT_RESET).unwrap_or(0);
        let wait = backoff_duration(unix_now(), reset, self.rate_limit_buffer);

        let resets_at = chrono::DateTime::from_timestamp(reset as i64, 0)
            .map(|t| t.format("%H:%M:%S UTC").to_string())
            .unwrap_or_else(|| "unknown".to_owned());

        println!(
            "rate limit exhausted (resets at {}), waiting {}s before {}",
            resets_at,
            wait.as_secs(),
            action,
        );

        tokio::time::sleep(wait).await;
    }
}


/// How long to wait before the API will accept requests again.
///
/// Never less than `buffer`, even when the reset time has already
/// passed.
fn backoff_duration(now: u64, reset: u64, buffer: Duration) -> Duration {
    Duration::from_secs(reset.saturating_sub(now)) + buffer
}

fn is_rate_limited(status: StatusCode, headers: &HeaderMap) -> bool {
    (status == StatusCode::FORBIDDEN
            || status == StatusCode::TOO_MANY_REQUESTS)
        && rate_limit_remaining(headers) == Some(0)
}

fn rate_limit_remaining(headers: &HeaderMap) -> Option<u64> {
    header_u64(headers, RATE_LIMIT_REMAINING)
}

fn header_u64(headers: &HeaderMap, name: &str) -> Option<u64> {
    headers.get(name)?
        .to_str()
        .ok()?
        .parse()
        .ok()
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Extract the `rel="next"` URL from a `Link` header.
fn next_link(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(reqwest::header::LINK)?.to_str().ok()?;

    for link in value.split(',') {
        let mut segments = link.trim().splitn(2, ';');
        let target = segments.next().unwrap_or("").trim();
        let params = segments.next().unwrap_or("");

        if params.contains(r#"rel="next""#)
            && target.starts_with('<')
            && target.ends_with('>')
        {
            return Some(target[1..target.len() - 1].to_owned());
        }
    }

    None
}
