use std::path::Path;

use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::Client;
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;
use tracing::{info, instrument, warn};

use super::{DataError, Result, dataset::FetchOptions};

/// Download `url` to `destination`, retrying up to `options.max_attempts` times.
///
/// Bytes land in a temporary file next to `destination` and are renamed into
/// place only once the body has been fully received, so an interrupted
/// download never leaves a truncated dataset behind.
#[instrument(name = "Download dataset", skip(options), level = "info")]
pub fn download_dataset(url: &str, destination: &Path, options: &FetchOptions) -> Result<()> {
    let dir = destination
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)?;

    let rt = tokio::runtime::Runtime::new()?;
    let max_attempts = options.max_attempts.max(1);

    rt.block_on(async {
        let client = Client::new();
        let mut attempt = 1;
        loop {
            match download_to_temp_file(&client, url, dir).await {
                Ok(temp_file) => {
                    temp_file.persist(destination).map_err(|e| e.error)?;
                    info!(path = ?destination, attempt, "Dataset downloaded");
                    return Ok(());
                }
                Err(e) if attempt < max_attempts => {
                    warn!(attempt, max_attempts, error = %e, "Dataset download failed, retrying");
                    tokio::time::sleep(options.retry_backoff * attempt).await;
                    attempt += 1;
                }
                Err(e) => {
                    return Err(DataError::unavailable(
                        url,
                        format!("download failed after {attempt} attempt(s): {e}"),
                    ));
                }
            }
        }
    })
}

async fn download_to_temp_file(client: &Client, url: &str, dir: &Path) -> Result<NamedTempFile> {
    info!(url, "Starting download");
    let response = client.get(url).send().await?.error_for_status()?;

    let total_size = response.content_length().unwrap_or(0);

    let pb = ProgressBar::new(total_size);
    pb.set_style(ProgressStyle::default_bar()
        .template("{msg}\n{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})").expect("Progress bar template")
        .progress_chars("█░"));
    pb.set_message(format!(
        "Downloading {}",
        url.split('/').next_back().unwrap_or(url)
    ));

    let temp_file = NamedTempFile::with_suffix_in(".part", dir)?;
    let mut dest_file = tokio::fs::File::create(temp_file.path()).await?;

    let mut received: u64 = 0;
    let mut stream = response.bytes_stream();
    while let Some(item) = stream.next().await {
        let chunk = item?;
        dest_file.write_all(&chunk).await?;
        received += chunk.len() as u64;
        pb.inc(chunk.len() as u64);
    }
    dest_file.flush().await?;
    pb.finish_and_clear();

    if total_size > 0 && received != total_size {
        return Err(DataError::unavailable(
            url,
            format!("truncated body: received {received} of {total_size} bytes"),
        ));
    }
    Ok(temp_file)
}
