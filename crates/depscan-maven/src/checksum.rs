//! Checksum verification of downloaded POMs against repository sidecars.

use md5::Md5;
use reqwest::Client;
use sha1::Sha1;
use sha2::{Digest, Sha256};

use depscan_util::errors::ScanError;

use crate::download;
use crate::repository::MavenRepository;

/// Sidecar suffixes in order of preference.
const ALGORITHMS: [Algorithm; 3] = [Algorithm::Sha256, Algorithm::Sha1, Algorithm::Md5];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    Sha256,
    Sha1,
    Md5,
}

impl Algorithm {
    fn suffix(self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
            Self::Sha1 => "sha1",
            Self::Md5 => "md5",
        }
    }

    /// Lowercase hex digest of `data`.
    pub fn digest(self, data: &[u8]) -> String {
        match self {
            Self::Sha256 => hex(Sha256::digest(data)),
            Self::Sha1 => hex(Sha1::digest(data)),
            Self::Md5 => hex(Md5::digest(data)),
        }
    }
}

fn hex(bytes: impl AsRef<[u8]>) -> String {
    bytes.as_ref().iter().map(|b| format!("{b:02x}")).collect()
}

/// Verify `data` against the first checksum sidecar the repository serves.
///
/// A missing sidecar is logged and accepted.
pub async fn verify(
    client: &Client,
    repo: &MavenRepository,
    file_url: &str,
    data: &[u8],
) -> miette::Result<()> {
    for algo in ALGORITHMS {
        let sidecar_url = format!("{file_url}.{}", algo.suffix());
        if let Some(expected) = download::download_text(client, repo, &sidecar_url).await? {
            return check(algo, data, &expected, file_url);
        }
    }

    tracing::warn!(url = file_url, "no checksum sidecar found");
    Ok(())
}

/// Compare `data` with the content of a sidecar file.
pub fn check(algo: Algorithm, data: &[u8], sidecar: &str, url: &str) -> miette::Result<()> {
    let expected = extract_hash(sidecar);
    let actual = algo.digest(data);
    if actual.eq_ignore_ascii_case(expected) {
        tracing::debug!(url, algorithm = ?algo, "checksum ok");
        Ok(())
    } else {
        Err(ScanError::Network {
            message: format!("{algo:?} mismatch for {url}: expected {expected}, got {actual}"),
        }
        .into())
    }
}

/// Maven checksum files hold either just the hash or `hash  filename`.
fn extract_hash(content: &str) -> &str {
    content.split_whitespace().next().unwrap_or("")
}
