// ============================================================
// Layer 6 — Pretrained Weights Downloader
// ============================================================
// Fetches the published pretrained VAEs from Google Drive.
//
// Flow for one file:
//   1. Skip entirely if the destination already exists
//      (unless overwrite is requested)
//   2. GET https://drive.google.com/uc?export=download&id=<id>
//   3. Large files get a "can't scan for viruses" interstitial
//      instead of the bytes. The confirm token is either in a
//      download_warning_* cookie or embedded in the HTML page;
//      repeat the request with &confirm=<token>
//   4. Stream the body to <dest>.part, then rename into place so
//      a half-finished download never looks like a checkpoint
//
// Reference: reqwest blocking client documentation

use anyhow::{Context, Result};
use reqwest::{blocking::{Client, Response}, header};
use std::{fs, path::{Path, PathBuf}};
use thiserror::Error;

use crate::domain::{options::PretrainedModel, traits::WeightsFetcher};

const DRIVE_DOWNLOAD_URL: &str = "https://drive.google.com/uc?export=download";

/// Drive file id of each published model.
pub fn drive_file_id(model: PretrainedModel) -> &'static str {
    match model {
        PretrainedModel::A => "1US_9wOh9bGR2PqV_cQuYKkrMJn6CDpNN",
        PretrainedModel::B => "1rMmgk60jT9Zr58S-81CNSiEmWDv0pKiP",
    }
}

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("request to '{url}' failed: {source}")]
    Http {
        url:    String,
        #[source]
        source: reqwest::Error,
    },

    #[error("host returned an HTML page for '{0}' with no confirm token")]
    Interstitial(String),
}

pub struct DriveDownloader {
    client:    Client,
    base_url:  String,
    overwrite: bool,
}

impl DriveDownloader {
    pub fn new(overwrite: bool) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("lens-vae/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Cannot build HTTP client")?;
        Ok(Self {
            client,
            base_url: DRIVE_DOWNLOAD_URL.to_string(),
            overwrite,
        })
    }

    #[cfg(test)]
    fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn get(&self, url: &str) -> Result<Response, DownloadError> {
        self.client
            .get(url)
            .send()
            .and_then(Response::error_for_status)
            .map_err(|source| DownloadError::Http { url: url.to_string(), source })
    }

    /// Resolve the interstitial, returning a response carrying the file body.
    fn open(&self, file_id: &str) -> Result<Response, DownloadError> {
        let url  = download_url(&self.base_url, file_id, None);
        let resp = self.get(&url)?;

        let cookie_token = resp
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find_map(token_from_cookie);
        if let Some(token) = cookie_token {
            tracing::debug!("Confirming large-file download via cookie token");
            return self.get(&download_url(&self.base_url, file_id, Some(&token)));
        }

        if !is_html(&resp) {
            return Ok(resp);
        }

        let body = resp
            .text()
            .map_err(|source| DownloadError::Http { url: url.clone(), source })?;
        let token = token_from_html(&body).ok_or_else(|| DownloadError::Interstitial(url))?;
        tracing::debug!("Confirming large-file download via page token");
        self.get(&download_url(&self.base_url, file_id, Some(&token)))
    }
}

impl WeightsFetcher for DriveDownloader {
    fn fetch(&self, model: PretrainedModel, dest: &Path) -> Result<()> {
        if dest.exists() && !self.overwrite {
            tracing::info!(
                "Pretrained weights already at '{}', skipping download",
                dest.display()
            );
            return Ok(());
        }
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Cannot create '{}'", parent.display()))?;
        }

        tracing::info!("Downloading pretrained model {} weights", model);
        let mut resp = self.open(drive_file_id(model))?;

        let part = part_path(dest);
        let mut file = fs::File::create(&part)
            .with_context(|| format!("Cannot create '{}'", part.display()))?;
        let bytes = resp
            .copy_to(&mut file)
            .with_context(|| format!("Download of model {model} interrupted"))?;
        drop(file);

        fs::rename(&part, dest)
            .with_context(|| format!("Cannot move download into '{}'", dest.display()))?;
        tracing::info!("Saved {} bytes to '{}'", bytes, dest.display());
        Ok(())
    }
}

pub fn download_url(base: &str, file_id: &str, confirm: Option<&str>) -> String {
    match confirm {
        Some(token) => format!("{base}&id={file_id}&confirm={token}"),
        None        => format!("{base}&id={file_id}"),
    }
}

fn part_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    dest.with_file_name(name)
}

fn is_html(resp: &Response) -> bool {
    resp.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map_or(false, |ct| ct.starts_with("text/html"))
}

/// `download_warning_<suffix>=<token>; Path=/; ...` → token
pub fn token_from_cookie(set_cookie: &str) -> Option<String> {
    let pair = set_cookie.split(';').next()?.trim();
    let (name, value) = pair.split_once('=')?;
    (name.starts_with("download_warning") && !value.is_empty()).then(|| value.to_string())
}

/// Find the token in either `...&confirm=XXXX&...` or
/// `<input type="hidden" name="confirm" value="XXXX">`.
pub fn token_from_html(body: &str) -> Option<String> {
    let token_chars = |c: char| c.is_ascii_alphanumeric() || c == '_' || c == '-';

    let from = |rest: &str| -> Option<String> {
        let token: String = rest.chars().take_while(|c| token_chars(*c)).collect();
        (!token.is_empty()).then_some(token)
    };

    body.match_indices("confirm=")
        .find_map(|(i, m)| from(&body[i + m.len()..]))
        .or_else(|| {
            let marker = "name=\"confirm\" value=\"";
            let i = body.find(marker)?;
            from(&body[i + marker.len()..])
        })
}
