//! Thin client for the OMDb metadata API, used to discover poster URLs.

use reqwest::Client;
use serde::{Deserialize, Serialize};

pub const DEFAULT_API_URL: &str = "http://www.omdbapi.com";

/// The subset of an OMDb lookup response we care about.
#[derive(Deserialize, Serialize, Clone)]
pub struct OmdbLookup {
    #[serde(rename = "Poster")]
    pub poster: Option<String>,
    #[serde(rename = "Response")]
    pub response: Option<String>,
}

impl OmdbLookup {
    /// OMDb reports "no poster" either by omitting the field, by the literal
    /// string `N/A`, or by a failed lookup (`Response: "False"`).
    pub fn poster_url(&self) -> Option<&str> {
        if self.response.as_deref() == Some("False") {
            return None;
        }
        match self.poster.as_deref() {
            None | Some("N/A") | Some("") => None,
            Some(url) => Some(url),
        }
    }
}

#[derive(Clone)]
pub struct OmdbClient {
    client: Client,
    api_url: String,
    api_key: String,
}

impl OmdbClient {
    /// `api_url` is injectable so tests can point at an unreachable address.
    pub fn new(client: Client, api_url: String, api_key: String) -> Self {
        Self {
            client,
            api_url,
            api_key,
        }
    }

    /// Look up the poster URL for a movie id. `Ok(None)` means OMDb knows no
    /// poster for it; transport errors bubble up.
    pub async fn poster_url(&self, imdb_id: &str) -> Result<Option<String>, reqwest::Error> {
        let lookup: OmdbLookup = self
            .client
            .get(&self.api_url)
            .query(&[("i", imdb_id), ("apikey", &self.api_key)])
            .send()
            .await?
            .json()
            .await?;

        Ok(lookup.poster_url().map(|url| url.to_string()))
    }

    /// Download an image, returning its raw bytes.
    pub async fn download(&self, url: &str) -> Result<Vec<u8>, reqwest::Error> {
        let bytes = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn poster_url_present() {
        let lookup: OmdbLookup =
            serde_json::from_str(r#"{"Poster": "http://img.example/p.jpg", "Response": "True"}"#)
                .unwrap();
        assert_eq!(lookup.poster_url(), Some("http://img.example/p.jpg"));
    }

    #[test]
    fn not_available_means_no_poster() {
        let lookup: OmdbLookup =
            serde_json::from_str(r#"{"Poster": "N/A", "Response": "True"}"#).unwrap();
        assert_eq!(lookup.poster_url(), None);
    }

    #[test]
    fn missing_field_means_no_poster() {
        let lookup: OmdbLookup = serde_json::from_str(r#"{"Response": "True"}"#).unwrap();
        assert_eq!(lookup.poster_url(), None);
    }

    #[test]
    fn failed_lookup_means_no_poster() {
        let lookup: OmdbLookup = serde_json::from_str(
            r#"{"Poster": "http://img.example/p.jpg", "Response": "False"}"#,
        )
        .unwrap();
        assert_eq!(lookup.poster_url(), None);
    }
}
