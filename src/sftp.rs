//! SFTP retrieval for file-delivered distributor feeds.
//!
//! `ssh2` is a blocking libssh2 binding, so the actual transfer runs on the
//! blocking thread pool and the async side enforces the configured deadline
//! with `tokio::time::timeout`. Adapters depend on the `RemoteFileSource`
//! trait rather than the concrete SFTP client so tests can inject in-memory
//! sources.

use std::io::Read;
use std::net::TcpStream;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use ssh2::Session;
use tracing::{debug, info};

use crate::error::FeedError;

#[derive(Debug, Clone)]
pub struct SftpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub timeout: Duration,
}

/// Anything that can fetch a remote text file by path.
#[async_trait]
pub trait RemoteFileSource: Send + Sync {
    async fn fetch_text(&self, remote_path: &str) -> Result<String, FeedError>;
}

/// Production `RemoteFileSource` backed by an SFTP session. One session per
/// fetch; distributor drop boxes are low-volume and connection reuse is not
/// worth the session lifecycle bookkeeping.
pub struct SftpFileSource {
    config: SftpConfig,
}

impl SftpFileSource {
    pub fn new(config: SftpConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl RemoteFileSource for SftpFileSource {
    async fn fetch_text(&self, remote_path: &str) -> Result<String, FeedError> {
        let config = self.config.clone();
        let path = remote_path.to_string();
        debug!(
            target = "sftp",
            host = %config.host,
            path = %path,
            "fetching remote file"
        );

        let work = tokio::task::spawn_blocking(move || download(&config, &path));
        match tokio::time::timeout(self.config.timeout, work).await {
            Err(_) => Err(FeedError::Timeout(format!(
                "sftp fetch of {remote_path} from {} timed out",
                self.config.host
            ))),
            Ok(Err(join_err)) => Err(FeedError::Transport(format!(
                "sftp worker failed: {join_err}"
            ))),
            Ok(Ok(result)) => {
                if let Ok(contents) = &result {
                    info!(
                        target = "sftp",
                        host = %self.config.host,
                        path = %remote_path,
                        bytes = contents.len(),
                        "remote file fetched"
                    );
                }
                result
            }
        }
    }
}

fn download(config: &SftpConfig, remote_path: &str) -> Result<String, FeedError> {
    let addr = format!("{}:{}", config.host, config.port);
    let tcp = TcpStream::connect(&addr)
        .map_err(|e| FeedError::Transport(format!("sftp connect {addr}: {e}")))?;

    let mut session = Session::new()
        .map_err(|e| FeedError::Transport(format!("sftp session init: {e}")))?;
    // libssh2-level timeout in milliseconds; the async deadline still caps
    // the whole operation.
    session.set_timeout(config.timeout.as_millis().min(u32::MAX as u128) as u32);
    session.set_tcp_stream(tcp);
    session
        .handshake()
        .map_err(|e| FeedError::Transport(format!("sftp handshake with {addr}: {e}")))?;

    session
        .userauth_password(&config.username, &config.password)
        .map_err(|e| {
            FeedError::Credentials(format!(
                "sftp login rejected for {}@{}: {e}",
                config.username, config.host
            ))
        })?;
    if !session.authenticated() {
        return Err(FeedError::Credentials(format!(
            "sftp login rejected for {}@{}",
            config.username, config.host
        )));
    }

    let sftp = session
        .sftp()
        .map_err(|e| FeedError::Transport(format!("sftp subsystem on {addr}: {e}")))?;
    let mut file = sftp
        .open(Path::new(remote_path))
        .map_err(|e| FeedError::Transport(format!("sftp open {remote_path}: {e}")))?;

    let mut contents = String::new();
    file.read_to_string(&mut contents)
        .map_err(|e| FeedError::Transport(format!("sftp read {remote_path}: {e}")))?;
    Ok(contents)
}
