//! Blocking HTTP downloads with progress reporting.

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;
use std::time::Duration;

use reqwest::blocking::Client;
use tracing::debug;

use crate::Reporter;
use crate::error::{Error, Result};
use crate::fsutil::rmfile;
use crate::interrupt;
use crate::io::Fetcher;

const CHUNK: usize = 64 * 1024;

/// [`Fetcher`] backed by a blocking `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(crate::USER_AGENT)
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| Error::Download {
                url: String::new(),
                reason: e.to_string(),
            })?;
        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    fn download(&self, url: &str, target: &Path, reporter: &dyn Reporter) -> Result<()> {
        let fail = |reason: String| Error::Download {
            url: url.to_string(),
            reason,
        };
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent).map_err(|e| Error::io_at(parent, &e))?;
        }

        let response = self
            .client
            .get(url)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| fail(e.to_string()))?;
        let total = response.content_length();
        let file_name = crate::paths::filename_from_url(url).to_string();

        let result = stream_to_file(response, target, |done| reporter.downloading(&file_name, done, total));
        if result.is_err() {
            debug!("removing partial download {}", target.display());
            let _ = rmfile(target);
        }
        result.map_err(|e| match e {
            Error::Io(io) => fail(io.to_string()),
            other => other,
        })
    }

    fn exists(&self, url: &str) -> bool {
        match self.client.head(url).send() {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                debug!("HEAD {url} failed: {e}");
                false
            }
        }
    }
}

fn stream_to_file<R: Read>(mut body: R, target: &Path, mut progress: impl FnMut(u64)) -> Result<()> {
    let mut out = BufWriter::new(File::create(target)?);
    let mut buf = vec![0u8; CHUNK];
    let mut downloaded: u64 = 0;
    progress(0);
    loop {
        interrupt::check()?;
        let n = body.read(&mut buf)?;
        if n == 0 {
            break;
        }
        out.write_all(&buf[..n])?;
        downloaded += n as u64;
        progress(downloaded);
    }
    out.flush()?;
    Ok(())
}
