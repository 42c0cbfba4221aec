use std::time::Duration;

use anyhow::{Context, Result};
use indexmap::IndexMap;
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::json;

use crate::config::RemoteOptions;

const ARGUMENT_PATH: &str = "/argumento";
const SYNONYM_PATH: &str = "/sinonimos";
const MODEL_PATH: &str = "/modelos";

/// Dictionary entry from the synonym service: word mapped to its synonyms.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct SynonymEntry {
    pub sinonimos: Vec<String>,
}

/// A ready-made essay model used to pre-fill a new draft.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct EssayModel {
    pub id: i64,
    #[serde(rename = "titulo")]
    pub title: String,
    #[serde(rename = "imagem")]
    pub image: String,
    #[serde(rename = "corpo_redacao")]
    pub body: String,
}

/// Thin client over the writing-helper endpoints. One request per call, no
/// retries; timeouts come from the configured client.
pub struct RemoteClient {
    client: Client,
    base_url: String,
}

impl RemoteClient {
    pub fn new(options: &RemoteOptions) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(options.timeout_secs))
            .build()
            .context("building http client")?;
        Ok(Self {
            client,
            base_url: options.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// POSTs the topic and returns the generated argument text verbatim.
    pub fn generate_arguments(&self, topic: &str) -> Result<String> {
        let url = format!("{}{ARGUMENT_PATH}", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&json!({ "tema": topic }))
            .send()
            .with_context(|| format!("posting topic to {url}"))?
            .error_for_status()
            .context("argument service returned an error status")?;
        response.text().context("reading argument response body")
    }

    /// Fetches the full word → synonyms mapping in service order. Filtering
    /// happens client-side over this already-fetched map.
    pub fn fetch_synonyms(&self) -> Result<IndexMap<String, SynonymEntry>> {
        let url = format!("{}{SYNONYM_PATH}", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .with_context(|| format!("fetching synonyms from {url}"))?
            .error_for_status()
            .context("synonym service returned an error status")?;
        response.json().context("decoding synonym dictionary")
    }

    pub fn fetch_models(&self) -> Result<Vec<EssayModel>> {
        let url = format!("{}{MODEL_PATH}", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .with_context(|| format!("fetching essay models from {url}"))?
            .error_for_status()
            .context("model service returned an error status")?;
        response.json().context("decoding essay models")
    }
}

/// Case-insensitive substring filter over a fetched dictionary. An empty or
/// whitespace query keeps everything.
pub fn filter_synonyms<'a>(
    entries: &'a IndexMap<String, SynonymEntry>,
    query: &str,
) -> Vec<(&'a str, &'a SynonymEntry)> {
    let needle = query.trim().to_lowercase();
    entries
        .iter()
        .filter(|(word, _)| needle.is_empty() || word.to_lowercase().contains(&needle))
        .map(|(word, entry)| (word.as_str(), entry))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client_for(url: &str) -> RemoteClient {
        RemoteClient::new(&RemoteOptions {
            base_url: url.to_string(),
            timeout_secs: 5,
        })
        .expect("building client")
    }

    #[test]
    fn generate_arguments_returns_response_text_verbatim() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/argumento")
            .match_body(mockito::Matcher::Json(json!({ "tema": "Tema de Teste" })))
            .with_status(200)
            .with_body("Resposta de teste")
            .create();

        let client = client_for(&server.url());
        let text = client.generate_arguments("Tema de Teste").unwrap();
        assert_eq!(text, "Resposta de teste");
        mock.assert();
    }

    #[test]
    fn generate_arguments_fails_on_server_error() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("POST", "/argumento")
            .with_status(500)
            .create();

        let client = client_for(&server.url());
        assert!(client.generate_arguments("Tema").is_err());
    }

    #[test]
    fn generate_arguments_fails_when_unreachable() {
        // Nothing listens on the discard port.
        let client = client_for("http://127.0.0.1:9");
        assert!(client.generate_arguments("Tema").is_err());
    }

    #[test]
    fn fetch_synonyms_decodes_dictionary() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("GET", "/sinonimos")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "casa": { "sinonimos": ["moradia", "habitação"] },
                    "carro": { "sinonimos": ["automóvel", "veículo"] }
                })
                .to_string(),
            )
            .create();

        let client = client_for(&server.url());
        let entries = client.fetch_synonyms().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(
            entries["casa"].sinonimos,
            vec!["moradia".to_string(), "habitação".to_string()]
        );
    }

    #[test]
    fn fetch_models_decodes_portuguese_field_names() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("GET", "/modelos")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!([
                    { "id": 1, "titulo": "Modelo 1", "imagem": "http://image1.jpg", "corpo_redacao": "Corpo 1" },
                    { "id": 2, "titulo": "Modelo 2", "imagem": "http://image2.jpg", "corpo_redacao": "Corpo 2" }
                ])
                .to_string(),
            )
            .create();

        let client = client_for(&server.url());
        let models = client.fetch_models().unwrap();
        assert_eq!(models.len(), 2);
        assert_eq!(models[0].title, "Modelo 1");
        assert_eq!(models[1].body, "Corpo 2");
    }

    #[test]
    fn filter_synonyms_matches_substrings_case_insensitively() {
        let mut entries = IndexMap::new();
        entries.insert(
            "casa".to_string(),
            SynonymEntry {
                sinonimos: vec!["moradia".into()],
            },
        );
        entries.insert(
            "carro".to_string(),
            SynonymEntry {
                sinonimos: vec!["automóvel".into()],
            },
        );

        let hits = filter_synonyms(&entries, "CASA");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].0, "casa");

        // Shared prefix matches both.
        assert_eq!(filter_synonyms(&entries, "ca").len(), 2);
        // Empty query keeps everything in service order.
        let all = filter_synonyms(&entries, "  ");
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].0, "casa");
    }
}
