//! Filesystem operations over `docker exec` and standard utilities.
//!
//! Mutating calls are best-effort like the session calls: a non-zero exit is
//! logged and swallowed. Only a failure to reach the runtime at all is
//! returned.

use super::docker::DockerCli;
use super::log_if_failed;
use crate::error::Result;
use crate::ops::FileSystem;
use crate::sandbox::Permissions;
use async_trait::async_trait;
use bytes::Bytes;

pub(crate) struct LocalFs {
    docker: DockerCli,
    container: String,
}

impl LocalFs {
    pub(crate) fn new(docker: DockerCli, container: impl Into<String>) -> Self {
        Self {
            docker,
            container: container.into(),
        }
    }

    async fn run(&self, op: &str, argv: &[&str], stdin: Option<Bytes>) -> Result<Bytes> {
        let output = self.docker.exec(&self.container, argv, stdin, None).await?;
        Ok(Bytes::from(log_if_failed(op, &self.container, output).stdout))
    }
}

#[async_trait]
impl FileSystem for LocalFs {
    async fn create_folder(&self, path: &str, permissions: &Permissions) -> Result<()> {
        tracing::debug!(container = %self.container, path, mode = %permissions, "Creating folder");
        self.run("create_folder", &["mkdir", "-p", path], None).await?;
        self.run("create_folder", &["chmod", permissions.as_str(), path], None)
            .await?;
        Ok(())
    }

    async fn upload_file(&self, path: &str, data: Bytes) -> Result<()> {
        tracing::debug!(container = %self.container, path, bytes = data.len(), "Uploading file");
        // The path travels as a positional argument, never through the
        // shell's parser.
        self.run(
            "upload_file",
            &["sh", "-c", r#"cat > "$1""#, "sh", path],
            Some(data),
        )
        .await?;
        Ok(())
    }

    async fn download_file(&self, path: &str) -> Result<Bytes> {
        tracing::debug!(container = %self.container, path, "Downloading file");
        let data = self.run("download_file", &["cat", path], None).await?;
        tracing::trace!(container = %self.container, path, bytes = data.len(), "Downloaded file");
        Ok(data)
    }

    async fn delete_file(&self, path: &str) -> Result<()> {
        tracing::debug!(container = %self.container, path, "Deleting file");
        self.run("delete_file", &["rm", "-f", path], None).await?;
        Ok(())
    }

    async fn set_file_permissions(&self, path: &str, permissions: &Permissions) -> Result<()> {
        tracing::debug!(container = %self.container, path, mode = %permissions, "Setting permissions");
        self.run("set_file_permissions", &["chmod", permissions.as_str(), path], None)
            .await?;
        Ok(())
    }
}
