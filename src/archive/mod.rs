pub mod query;
pub mod transcription;

use std::io::Write;

use reqwest::{Client, StatusCode};
use tracing::debug;

use crate::error::ArchiveError;
use crate::theme::ThemeCode;
use crate::tune::{RawTune, Tune};
use query::ResultsAt;

/// Anything that can hand out pages of formatted tunes.
pub trait TuneSource {
    /// One page of the whole catalog, sorted by theme code index.
    async fn page(&self, page: usize, page_size: usize) -> Result<Vec<Tune>, ArchiveError>;

    /// One page of tunes whose theme code starts with `code`.
    async fn page_for_code(
        &self,
        code: &ThemeCode,
        page: usize,
        page_size: usize,
    ) -> Result<Vec<Tune>, ArchiveError>;
}

/// HTTP client for the Traditional Tune Archive wiki.
pub struct TuneArchive {
    client: Client,
    base_url: String,
    progress: bool,
}

impl TuneArchive {
    pub fn new(base_url: impl Into<String>) -> Self {
        TuneArchive {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            progress: true,
        }
    }

    /// Toggle the `.` printed to stdout for every tune fetched.
    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    async fn get(&self, url: &str, params: &[(&'static str, String)]) -> Result<String, ArchiveError> {
        let mut request = self.client.get(url);
        if !params.is_empty() {
            request = request.query(params);
        }

        let response = request.send().await.map_err(|source| ArchiveError::Http {
            url: url.to_string(),
            source,
        })?;
        let url = response.url().to_string();
        debug!("GET {} -> {}", url, response.status());

        if response.status() != StatusCode::OK {
            return Err(ArchiveError::Status {
                url,
                status: response.status(),
            });
        }

        response
            .text()
            .await
            .map_err(|source| ArchiveError::Http { url, source })
    }

    /// Download a detail page and return its transcription (or "No Score").
    pub async fn fetch_transcription(&self, url: &str) -> Result<String, ArchiveError> {
        let html = self.get(url, &[]).await?;
        Ok(transcription::extract_transcription(&html))
    }

    /// Fetch the transcription for a listing entry and build the output record.
    pub async fn format_tune(&self, raw: RawTune) -> Result<Tune, ArchiveError> {
        let transcription = self.fetch_transcription(&raw.fullurl).await?;
        if self.progress {
            print!(".");
            let _ = std::io::stdout().flush();
        }
        Ok(Tune::new(raw, transcription))
    }

    async fn listing(
        &self,
        path: &str,
        params: Vec<(&'static str, String)>,
        at: ResultsAt,
    ) -> Result<Vec<Tune>, ArchiveError> {
        let url = format!("{}{}", self.base_url, path);
        let body = self.get(&url, &params).await?;
        let raws = query::decode_results(&url, &body, at)?;

        let mut tunes = Vec::with_capacity(raws.len());
        for raw in raws {
            tunes.push(self.format_tune(raw).await?);
        }
        Ok(tunes)
    }
}

impl TuneSource for TuneArchive {
    async fn page(&self, page: usize, page_size: usize) -> Result<Vec<Tune>, ArchiveError> {
        let params = query::listing_params(page, page_size);
        self.listing(query::INDEX_PATH, params, ResultsAt::Root).await
    }

    async fn page_for_code(
        &self,
        code: &ThemeCode,
        page: usize,
        page_size: usize,
    ) -> Result<Vec<Tune>, ArchiveError> {
        let params = query::theme_params(code, page, page_size);
        self.listing(query::API_PATH, params, ResultsAt::Query).await
    }
}
