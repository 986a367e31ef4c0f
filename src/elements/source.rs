use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;

use crate::elements::error::FetchError;
use crate::elements::OrbitalElementSet;

const USER_AGENT: &str = concat!("iss-tracker/", env!("CARGO_PKG_VERSION"));

/// Anything that can hand out the latest element set for the station.
pub trait ElementSource: Send + Sync + 'static {
    fn describe(&self) -> String;

    fn fetch_latest(&self) -> impl Future<Output = Result<OrbitalElementSet, FetchError>> + Send;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadFormat {
    /// `{ "name", "line1", "line2" }` object.
    #[default]
    Json,
    /// Plain 2/3-line TLE text, possibly a multi-satellite catalog.
    Text,
}

pub struct HttpElementSource {
    client: Client,
    url: String,
    format: PayloadFormat,
    norad_id: u64,
}

impl HttpElementSource {
    pub fn new(
        url: String,
        format: PayloadFormat,
        norad_id: u64,
        timeout: Duration,
    ) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            url,
            format,
            norad_id,
        })
    }
}

impl ElementSource for HttpElementSource {
    fn describe(&self) -> String {
        self.url.clone()
    }

    async fn fetch_latest(&self) -> Result<OrbitalElementSet, FetchError> {
        let response = self.client.get(&self.url).send().await?;
        if !response.status().is_success() {
            return Err(FetchError::Status(response.status().as_u16()));
        }
        let body = response.text().await?;

        let set = match self.format {
            PayloadFormat::Json => OrbitalElementSet::from_json(&body)?,
            PayloadFormat::Text => OrbitalElementSet::find_in(&body, self.norad_id)?,
        };
        Ok(set)
    }
}

/// Reads the element set from a local TLE file, re-read on every fetch so an
/// external job can keep it current.
pub struct FileElementSource {
    path: PathBuf,
    norad_id: u64,
}

impl FileElementSource {
    pub fn new(path: PathBuf, norad_id: u64) -> Self {
        Self { path, norad_id }
    }
}

impl ElementSource for FileElementSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    async fn fetch_latest(&self) -> Result<OrbitalElementSet, FetchError> {
        let content = tokio::fs::read_to_string(&self.path).await?;
        Ok(OrbitalElementSet::find_in(&content, self.norad_id)?)
    }
}

/// The source selected in the config file.
pub enum ConfiguredSource {
    Http(HttpElementSource),
    File(FileElementSource),
}

impl ElementSource for ConfiguredSource {
    fn describe(&self) -> String {
        match self {
            ConfiguredSource::Http(s) => s.describe(),
            ConfiguredSource::File(s) => s.describe(),
        }
    }

    async fn fetch_latest(&self) -> Result<OrbitalElementSet, FetchError> {
        match self {
            ConfiguredSource::Http(s) => s.fetch_latest().await,
            ConfiguredSource::File(s) => s.fetch_latest().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::fixtures::ISS_TLE;
    use crate::elements::ISS_NORAD_ID;

    fn temp_tle(name: &str, content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "iss-tracker-{}-{}.tle",
            name,
            std::process::id()
        ));
        std::fs::write(&path, content).unwrap();
        path
    }

    #[tokio::test]
    async fn file_source_reads_tle() {
        let path = temp_tle("ok", ISS_TLE);
        let source = FileElementSource::new(path.clone(), ISS_NORAD_ID);
        let set = source.fetch_latest().await.unwrap();
        assert_eq!(set.norad_id(), ISS_NORAD_ID);
        std::fs::remove_file(path).unwrap();
    }

    #[tokio::test]
    async fn file_source_reports_missing_file() {
        let source = FileElementSource::new(PathBuf::from("/nonexistent/iss.tle"), ISS_NORAD_ID);
        let err = source.fetch_latest().await.unwrap_err();
        assert!(matches!(err, FetchError::Io(_)));
    }

    #[tokio::test]
    async fn file_source_reports_malformed_content() {
        let path = temp_tle("bad", "not a tle\n");
        let source = ConfiguredSource::File(FileElementSource::new(path.clone(), ISS_NORAD_ID));
        let err = source.fetch_latest().await.unwrap_err();
        assert!(matches!(err, FetchError::Malformed(_)));
        std::fs::remove_file(path).unwrap();
    }
}
