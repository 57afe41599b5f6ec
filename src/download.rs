//! Build-time snapshot of a Hugging Face model repository into the image.

use std::path::{Component, Path, PathBuf};

use serde::Deserialize;
use tokio::{fs, io::AsyncWriteExt};
use tracing::{debug, info};

use crate::{config::DEFAULT_HUB_ENDPOINT, error::AdapterError};

/// Checkpoint formats the engine never reads; safetensors are enough.
pub const DEFAULT_IGNORE_PATTERNS: &[&str] = &["*.pt", "*.bin"];

#[derive(Debug, Deserialize)]
struct RepoInfo {
    #[serde(default)]
    siblings: Vec<RepoFile>,
}

#[derive(Debug, Deserialize)]
struct RepoFile {
    rfilename: String,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DownloadSummary {
    pub downloaded: Vec<String>,
    pub skipped: Vec<String>,
    pub bytes: u64,
}

pub struct HubClient {
    http: reqwest::Client,
    endpoint: String,
    token: String,
    revision: String,
}

impl HubClient {
    /// Fails before any network access when no token is available.
    pub fn new(model_id: &str, token: Option<String>) -> Result<Self, AdapterError> {
        let token = token
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| AdapterError::MissingToken {
                model_id: model_id.to_string(),
            })?;
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            http,
            endpoint: DEFAULT_HUB_ENDPOINT.to_string(),
            token,
            revision: "main".to_string(),
        })
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    pub async fn list_files(&self, model_id: &str) -> Result<Vec<String>, AdapterError> {
        let url = format!(
            "{}/api/models/{}/revision/{}",
            self.endpoint, model_id, self.revision
        );
        let response = self.get(&url).await?;
        let info: RepoInfo = response.json().await?;
        Ok(info.siblings.into_iter().map(|f| f.rfilename).collect())
    }

    /// Streams one file to `dest`, via a `.part` file renamed on completion.
    pub async fn fetch_file(
        &self,
        model_id: &str,
        file: &str,
        dest: &Path,
    ) -> Result<u64, AdapterError> {
        let url = format!(
            "{}/{}/resolve/{}/{}",
            self.endpoint, model_id, self.revision, file
        );
        let mut response = self.get(&url).await?;

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).await?;
        }
        let partial = partial_path(dest);
        let mut out = fs::File::create(&partial).await?;
        let mut written = 0u64;
        while let Some(chunk) = response.chunk().await? {
            out.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        out.flush().await?;
        drop(out);
        fs::rename(&partial, dest).await?;

        Ok(written)
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response, AdapterError> {
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(AdapterError::HubStatus {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response)
    }
}

/// Downloads every file of `model_id` except [`DEFAULT_IGNORE_PATTERNS`]
/// into `model_dir`. Files already present are kept.
pub async fn download_hf_model(
    model_dir: &Path,
    model_id: &str,
    token: Option<String>,
) -> Result<DownloadSummary, AdapterError> {
    let hub = HubClient::new(model_id, token)?;
    snapshot(&hub, model_dir, model_id, DEFAULT_IGNORE_PATTERNS).await
}

pub async fn snapshot(
    hub: &HubClient,
    model_dir: &Path,
    model_id: &str,
    ignore_patterns: &[&str],
) -> Result<DownloadSummary, AdapterError> {
    fs::create_dir_all(model_dir).await?;

    let files = hub.list_files(model_id).await?;
    info!(model_id, files = files.len(), dir = %model_dir.display(), "downloading model snapshot");

    let mut summary = DownloadSummary::default();
    for file in files {
        if ignore_patterns.iter().any(|p| glob_match(p, &file)) {
            debug!(file = %file, "ignored by pattern");
            continue;
        }
        let dest = model_dir.join(relative_repo_path(&file)?);
        if fs::try_exists(&dest).await? {
            debug!(file = %file, "already present");
            summary.skipped.push(file);
            continue;
        }
        let bytes = hub.fetch_file(model_id, &file, &dest).await?;
        debug!(file = %file, bytes, "downloaded");
        summary.bytes += bytes;
        summary.downloaded.push(file);
    }

    info!(
        model_id,
        downloaded = summary.downloaded.len(),
        skipped = summary.skipped.len(),
        bytes = summary.bytes,
        "model snapshot complete"
    );
    Ok(summary)
}

/// Repository file names must stay under the model directory: only plain
/// components, no root, prefix, `.` or `..`.
fn relative_repo_path(file: &str) -> Result<&Path, AdapterError> {
    let path = Path::new(file);
    let plain = !file.is_empty()
        && path
            .components()
            .all(|component| matches!(component, Component::Normal(_)));
    if plain {
        Ok(path)
    } else {
        Err(AdapterError::UnsafePath(file.to_string()))
    }
}

fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

/// Shell-style match supporting `*` (any run) and `?` (one char).
fn glob_match(pattern: &str, name: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let n: Vec<char> = name.chars().collect();
    let (mut pi, mut ni) = (0, 0);
    let mut star: Option<(usize, usize)> = None;

    while ni < n.len() {
        if pi < p.len() && (p[pi] == '?' || p[pi] == n[ni]) {
            pi += 1;
            ni += 1;
        } else if pi < p.len() && p[pi] == '*' {
            star = Some((pi, ni));
            pi += 1;
        } else if let Some((sp, sn)) = star {
            pi = sp + 1;
            ni = sn + 1;
            star = Some((sp, sn + 1));
        } else {
            return false;
        }
    }
    p[pi..].iter().all(|&c| c == '*')
}
