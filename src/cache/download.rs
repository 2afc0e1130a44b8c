//! Download and checksum pipeline for release assets.
//!
//! Two network operations back a cache fill: fetching the platform asset and
//! fetching the release's checksum manifest. Each is independently retried
//! exactly once, after a short fixed backoff, and only on transient failures
//! (transport errors and 5xx responses). A 404 is an answer, not an outage:
//! it means the requested version likely was never published, and it is
//! reported as such immediately.
//!
//! Bodies are streamed chunk by chunk against a byte ceiling so an oversized
//! (or maliciously unbounded) response aborts the download instead of being
//! silently truncated or buffered without bound.

use crate::constants::{NETWORK_RETRIES, RETRY_BACKOFF};
use crate::core::AlError;
use anyhow::{Context, Result};
use reqwest::{Client, Response, StatusCode};
use sha2::{Digest, Sha256};
use std::path::Path;
use tokio::io::{AsyncSeekExt, AsyncWriteExt};
use tracing::{debug, warn};

/// URL of a file published under a release tag, e.g.
/// `<base>/download/v0.6.1/al-linux-amd64`.
pub(crate) fn release_url(base: &str, version: &str, file: &str) -> String {
    format!("{}/download/v{version}/{file}", base.trim_end_matches('/'))
}

/// Download the release asset for `version` into `dest`.
///
/// On a transient failure the partial body is discarded (the file is
/// truncated and rewound) before the single retry.
pub(crate) async fn fetch_asset(
    client: &Client,
    url: &str,
    dest: &mut tokio::fs::File,
    max_bytes: u64,
    version: &str,
) -> Result<()> {
    let mut attempt = 0;
    loop {
        match try_fetch_asset(client, url, dest, max_bytes, version).await {
            Ok(()) => return Ok(()),
            Err(err) if attempt < NETWORK_RETRIES && error_is_transient(&err) => {
                attempt += 1;
                warn!(%url, error = %format!("{err:#}"), "transient download failure, retrying");
                tokio::time::sleep(RETRY_BACKOFF).await;
                dest.set_len(0)
                    .await
                    .context("failed to discard partial download before retry")?;
                dest.rewind()
                    .await
                    .context("failed to rewind download file before retry")?;
            }
            Err(err) => return Err(err),
        }
    }
}

async fn try_fetch_asset(
    client: &Client,
    url: &str,
    dest: &mut tokio::fs::File,
    max_bytes: u64,
    version: &str,
) -> Result<()> {
    const OPERATION: &str = "asset download";

    debug!(%url, "fetching release asset");
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|source| AlError::Network {
            operation: OPERATION,
            source,
        })?;
    let mut response = check_status(response, OPERATION, version)?;

    if let Some(length) = response.content_length()
        && length > max_bytes
    {
        return Err(AlError::DownloadTooLarge { limit: max_bytes }.into());
    }

    let mut written: u64 = 0;
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|source| AlError::Network {
            operation: OPERATION,
            source,
        })?
    {
        written += chunk.len() as u64;
        if written > max_bytes {
            return Err(AlError::DownloadTooLarge { limit: max_bytes }.into());
        }
        dest.write_all(&chunk)
            .await
            .context("failed to write downloaded chunk")?;
    }
    debug!(bytes = written, "asset download complete");
    Ok(())
}

/// Fetch the checksum manifest for `version` and extract the hex SHA-256 for
/// `asset`.
///
/// # Errors
///
/// [`AlError::ChecksumNotFound`] when the full manifest has no line for the
/// asset; network errors follow the same retry policy as the asset download.
pub(crate) async fn fetch_expected_checksum(
    client: &Client,
    url: &str,
    asset: &str,
    max_bytes: u64,
    version: &str,
) -> Result<String> {
    let mut attempt = 0;
    let manifest = loop {
        match try_fetch_manifest(client, url, max_bytes, version).await {
            Ok(manifest) => break manifest,
            Err(err) if attempt < NETWORK_RETRIES && error_is_transient(&err) => {
                attempt += 1;
                warn!(%url, error = %format!("{err:#}"), "transient manifest failure, retrying");
                tokio::time::sleep(RETRY_BACKOFF).await;
            }
            Err(err) => return Err(err),
        }
    };

    find_manifest_checksum(&manifest, asset).ok_or_else(|| {
        AlError::ChecksumNotFound {
            asset: asset.to_string(),
            manifest: url.to_string(),
        }
        .into()
    })
}

async fn try_fetch_manifest(
    client: &Client,
    url: &str,
    max_bytes: u64,
    version: &str,
) -> Result<String> {
    const OPERATION: &str = "checksum fetch";

    debug!(%url, "fetching checksum manifest");
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|source| AlError::Network {
            operation: OPERATION,
            source,
        })?;
    let mut response = check_status(response, OPERATION, version)?;

    let mut body = Vec::new();
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|source| AlError::Network {
            operation: OPERATION,
            source,
        })?
    {
        if body.len() as u64 + chunk.len() as u64 > max_bytes {
            return Err(AlError::DownloadTooLarge { limit: max_bytes }.into());
        }
        body.extend_from_slice(&chunk);
    }
    Ok(String::from_utf8_lossy(&body).into_owned())
}

/// Map an HTTP status onto the error taxonomy: 404 is a permanent
/// version-not-found, other 4xx are permanent, 5xx are transient.
fn check_status(
    response: Response,
    operation: &'static str,
    version: &str,
) -> Result<Response, AlError> {
    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return Err(AlError::VersionNotFound {
            version: version.to_string(),
        });
    }
    if status.is_server_error() {
        return Err(AlError::ServerError {
            operation,
            status: status.as_u16(),
        });
    }
    if !status.is_success() {
        return Err(AlError::HttpStatus {
            operation,
            status: status.as_u16(),
        });
    }
    Ok(response)
}

/// Scan a checksum manifest for the line naming `asset` and return its hex
/// digest, lowercased.
///
/// The manifest is the line-oriented `sha256sum` format:
/// `<hex sha256>  <filename>`, where the filename field may carry a leading
/// `./` or a `*` binary-mode marker. The filename must match the asset name
/// whole; prefix matches do not count.
pub(crate) fn find_manifest_checksum(manifest: &str, asset: &str) -> Option<String> {
    for line in manifest.lines() {
        let mut fields = line.split_whitespace();
        let (Some(checksum), Some(name)) = (fields.next(), fields.next()) else {
            continue;
        };
        let name = name.strip_prefix("./").unwrap_or(name);
        let name = name.strip_prefix('*').unwrap_or(name);
        if name == asset {
            return Some(checksum.to_ascii_lowercase());
        }
    }
    None
}

/// Hex-encoded SHA-256 of the file at `path`.
pub(crate) async fn compute_sha256(path: &Path) -> Result<String> {
    let contents = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let mut hasher = Sha256::new();
    hasher.update(&contents);
    Ok(hex::encode(hasher.finalize()))
}

fn error_is_transient(err: &anyhow::Error) -> bool {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<AlError>())
        .is_some_and(AlError::is_transient)
}
