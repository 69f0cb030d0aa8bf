//! PJe Comunica source client
//!
//! Client for the national judicial-communications API. Each call targets one
//! tribunal with one query strategy (bar-registration number or advocate
//! name) over an availability-date window.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Query strategy for a single upstream call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdvocateQuery {
    /// Query by bar-registration (OAB) number
    ByOab(String),
    /// Query by the advocate's registered full name
    ByName(String),
}

impl AdvocateQuery {
    /// Short label used in run reports and error messages.
    pub const fn strategy(&self) -> &'static str {
        match self {
            AdvocateQuery::ByOab(_) => "oab",
            AdvocateQuery::ByName(_) => "name",
        }
    }
}

/// One communication item as returned by the upstream API.
///
/// Field names mirror the upstream payload; the raw value is preserved
/// separately so nothing is lost to deserialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommunicationItem {
    /// Source-assigned numeric identifier, unique across tribunals
    pub id: i64,
    /// Full publication text
    #[serde(default)]
    pub texto: Option<String>,
    /// Communication type (e.g. "Intimação", "Despacho")
    #[serde(rename = "tipoComunicacao", default)]
    pub tipo_comunicacao: Option<String>,
    /// Issuing body within the tribunal
    #[serde(rename = "nomeOrgao", default)]
    pub nome_orgao: Option<String>,
    /// Channel of publication (e.g. "Diário de Justiça Eletrônico")
    #[serde(default)]
    pub meio: Option<String>,
    /// Date the communication became available, `YYYY-MM-DD`
    #[serde(default)]
    pub data_disponibilizacao: Option<String>,
    /// Content hash, when the source exposes a document viewer
    #[serde(default)]
    pub hash: Option<String>,
    /// Link to the source document, when present
    #[serde(default)]
    pub link: Option<String>,
}

/// Envelope wrapping every upstream response.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryEnvelope {
    pub status: String,
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub items: Vec<JsonValue>,
}

/// Errors from a single upstream query.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("upstream returned HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("malformed upstream response: {0}")]
    MalformedResponse(String),
    #[error("upstream reported failure status '{0}'")]
    Upstream(String),
}

/// A fetched item together with its untouched source payload.
#[derive(Debug, Clone)]
pub struct SourcedItem {
    pub item: CommunicationItem,
    pub raw: JsonValue,
}

/// Abstraction over the upstream communications API.
///
/// The aggregation pipeline depends on this trait rather than on a concrete
/// HTTP client, which keeps the fetcher testable without a network.
#[async_trait]
pub trait CommunicationSource: Send + Sync {
    /// Run one query against one tribunal over the given window.
    async fn query(
        &self,
        tribunal: &str,
        query: &AdvocateQuery,
        period_start: NaiveDate,
        period_end: NaiveDate,
    ) -> Result<Vec<SourcedItem>, SourceError>;
}

/// HTTP client for the PJe Comunica API.
pub struct PjeComunicaClient {
    http: reqwest::Client,
    base_url: String,
}

impl PjeComunicaClient {
    /// Path of the communications endpoint under the API base.
    const ENDPOINT: &'static str = "/api/v1/comunicacao";

    pub fn new(base_url: String, timeout_seconds: u64) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl CommunicationSource for PjeComunicaClient {
    async fn query(
        &self,
        tribunal: &str,
        query: &AdvocateQuery,
        period_start: NaiveDate,
        period_end: NaiveDate,
    ) -> Result<Vec<SourcedItem>, SourceError> {
        let url = format!("{}{}", self.base_url, Self::ENDPOINT);

        let start = period_start.format("%Y-%m-%d").to_string();
        let end = period_end.format("%Y-%m-%d").to_string();

        let mut params: Vec<(&str, &str)> = vec![
            ("siglaTribunal", tribunal),
            ("dataDisponibilizacaoInicio", &start),
            ("dataDisponibilizacaoFim", &end),
        ];
        match query {
            AdvocateQuery::ByOab(number) => params.push(("numeroOab", number)),
            AdvocateQuery::ByName(name) => params.push(("nomeAdvogado", name)),
        }

        debug!(tribunal, strategy = query.strategy(), "querying upstream source");

        let response = self.http.get(&url).query(&params).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let envelope: QueryEnvelope = response
            .json()
            .await
            .map_err(|e| SourceError::MalformedResponse(e.to_string()))?;

        if envelope.status != "success" {
            return Err(SourceError::Upstream(envelope.status));
        }

        let mut items = Vec::with_capacity(envelope.items.len());
        for raw in envelope.items {
            let item: CommunicationItem = serde_json::from_value(raw.clone())
                .map_err(|e| SourceError::MalformedResponse(format!("item decode: {}", e)))?;
            items.push(SourcedItem { item, raw });
        }

        // The item list is authoritative; a disagreeing count is only noted.
        if envelope.count != items.len() as u64 {
            warn!(
                tribunal,
                reported = envelope.count,
                received = items.len(),
                "upstream count disagrees with returned items"
            );
        }

        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn item_decodes_upstream_field_names() {
        let raw = json!({
            "id": 9001,
            "texto": "Intimação do advogado...",
            "tipoComunicacao": "Intimação",
            "nomeOrgao": "2ª Vara Cível",
            "meio": "D",
            "data_disponibilizacao": "2026-02-10",
            "hash": "abc123",
            "link": "https://www.trf3.jus.br/doc"
        });

        let item: CommunicationItem = serde_json::from_value(raw).unwrap();
        assert_eq!(item.id, 9001);
        assert_eq!(item.tipo_comunicacao.as_deref(), Some("Intimação"));
        assert_eq!(item.nome_orgao.as_deref(), Some("2ª Vara Cível"));
        assert_eq!(item.data_disponibilizacao.as_deref(), Some("2026-02-10"));
    }

    #[test]
    fn item_tolerates_missing_optional_fields() {
        let raw = json!({ "id": 7 });
        let item: CommunicationItem = serde_json::from_value(raw).unwrap();
        assert_eq!(item.id, 7);
        assert!(item.texto.is_none());
        assert!(item.link.is_none());
    }

    #[test]
    fn query_strategy_labels() {
        assert_eq!(AdvocateQuery::ByOab("123456".into()).strategy(), "oab");
        assert_eq!(AdvocateQuery::ByName("Ana Souza".into()).strategy(), "name");
    }
}
