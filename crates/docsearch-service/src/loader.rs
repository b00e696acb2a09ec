//! Reading document bytes from a locator.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;
use url::Url;

use crate::error::LoadError;

/// Fetches the bytes a locator points to.
#[async_trait]
pub trait ResourceLoader: Send + Sync {
    async fn load(&self, locator: &Url) -> Result<Vec<u8>, LoadError>;
}

/// Loads `file://` locators from disk and `http(s)://` locators over HTTP.
pub struct DefaultResourceLoader {
    client: Client,
}

impl DefaultResourceLoader {
    pub fn new(timeout: Duration) -> Result<Self, LoadError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    async fn load_file(&self, locator: &Url) -> Result<Vec<u8>, LoadError> {
        let path = locator
            .to_file_path()
            .map_err(|_| LoadError::InvalidPath(locator.clone()))?;
        Ok(tokio::fs::read(path).await?)
    }

    async fn load_http(&self, locator: &Url) -> Result<Vec<u8>, LoadError> {
        let response = self.client.get(locator.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(LoadError::Status {
                url: locator.clone(),
                status: status.as_u16(),
            });
        }
        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait]
impl ResourceLoader for DefaultResourceLoader {
    async fn load(&self, locator: &Url) -> Result<Vec<u8>, LoadError> {
        debug!(locator = %locator, "Loading resource");
        match locator.scheme() {
            "file" => self.load_file(locator).await,
            "http" | "https" => self.load_http(locator).await,
            other => Err(LoadError::UnsupportedScheme(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn loader() -> DefaultResourceLoader {
        DefaultResourceLoader::new(Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_load_file_locator() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("winterfell.txt");
        std::fs::write(&path, "The north remembers").unwrap();

        let locator = Url::from_file_path(&path).unwrap();
        let bytes = loader().load(&locator).await.unwrap();
        assert_eq!(bytes, b"The north remembers");
    }

    #[tokio::test]
    async fn test_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let locator = Url::from_file_path(temp_dir.path().join("absent.txt")).unwrap();
        let err = loader().load(&locator).await.unwrap_err();
        assert!(matches!(err, LoadError::Io(_)));
    }

    #[tokio::test]
    async fn test_unsupported_scheme() {
        let locator = Url::parse("ftp://files.example/doc.txt").unwrap();
        let err = loader().load(&locator).await.unwrap_err();
        assert!(matches!(err, LoadError::UnsupportedScheme(ref s) if s == "ftp"));
    }
}
