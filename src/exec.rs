//! Query transport: local commands and HTTPS GETs behind one seam
//!
//! Every external query the engine issues, whether invoking the host package
//! manager binary or downloading a catalog document, goes through the
//! [`Transport`] trait: execute query Q against source S, get bytes or a
//! typed error back. Fetchers stay testable with an in-memory transport.

use crate::error::{FetchError, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// Executes external queries on behalf of the source fetchers.
///
/// Implementations block their own task on process execution or network
/// I/O, never the control thread. They do not retry; retry/fallback policy
/// belongs to the callers.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Run a local command and return its stdout.
    ///
    /// A non-zero exit status is an error; stderr is folded into the error
    /// message.
    async fn command(&self, program: &str, args: &[&str]) -> Result<Vec<u8>>;

    /// Issue an HTTPS GET and return the response body.
    ///
    /// Any non-success status is an error.
    async fn http_get(&self, url: &str) -> Result<Vec<u8>>;
}

/// Production transport over `tokio::process` and `reqwest`.
pub struct SystemTransport {
    client: reqwest::Client,
}

impl SystemTransport {
    /// Create a transport with the given request timeout in seconds.
    pub fn new(timeout_secs: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for SystemTransport {
    async fn command(&self, program: &str, args: &[&str]) -> Result<Vec<u8>> {
        debug!("executing command: {} {}", program, args.join(" "));

        let output = tokio::process::Command::new(program)
            .args(args)
            .output()
            .await
            .map_err(|e| FetchError::CommandFailed {
                program: program.to_string(),
                args: args.join(" "),
                message: e.to_string(),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(FetchError::CommandFailed {
                program: program.to_string(),
                args: args.join(" "),
                message: stderr.trim().to_string(),
            }
            .into());
        }

        Ok(output.stdout)
    }

    async fn http_get(&self, url: &str) -> Result<Vec<u8>> {
        debug!("GET {}", url);

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            }
            .into());
        }

        Ok(response.bytes().await?.to_vec())
    }
}
