//! Publication normalization
//!
//! Turns raw upstream communication items into canonical publication drafts:
//! CNJ process-number extraction, summary truncation, and best-effort
//! construction of an official consultation link.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde_json::Value as JsonValue;

use crate::comunica::SourcedItem;

/// CNJ unified-numbering layout: 7-2-4-1-2-4 digit groups, optional trailing
/// 5-digit group.
static CNJ_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{7})-(\d{2})\.(\d{4})\.(\d)\.(\d{2})\.(\d{4})(?:\.(\d{5}))?")
        .expect("CNJ pattern is valid")
});

const SUMMARY_LIMIT: usize = 500;

const TJSP_DEEP_LINK_BASE: &str = "https://esaj.tjsp.jus.br/cpopg/show.do";
const TJSP_LANDING: &str = "https://esaj.tjsp.jus.br/cpopg/open.do";

/// A normalized publication not yet persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct PublicationDraft {
    pub external_id: i64,
    pub process_number: Option<String>,
    pub tribunal: String,
    pub communication_type: String,
    pub issuing_body: String,
    pub channel: String,
    pub availability_date: Option<NaiveDate>,
    pub summary_text: String,
    pub full_text: String,
    pub official_link: Option<String>,
    pub content_hash: Option<String>,
    pub raw_source_payload: JsonValue,
}

/// Normalize one sourced item into a publication draft. Pure function.
pub fn normalize(sourced: &SourcedItem, tribunal: &str) -> PublicationDraft {
    let item = &sourced.item;
    let full_text = item.texto.clone().unwrap_or_default();

    let process_number = extract_process_number(&full_text);
    let summary_text = summarize(&full_text);

    let content_hash = item.hash.clone().filter(|h| !h.is_empty());
    let source_link = item.link.clone().filter(|l| !l.is_empty());

    let official_link = build_official_link(
        tribunal,
        process_number.as_deref(),
        content_hash.as_deref(),
        source_link.as_deref(),
    );

    let availability_date = item
        .data_disponibilizacao
        .as_deref()
        .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok());

    PublicationDraft {
        external_id: item.id,
        process_number,
        tribunal: tribunal.to_string(),
        communication_type: item.tipo_comunicacao.clone().unwrap_or_default(),
        issuing_body: item.nome_orgao.clone().unwrap_or_default(),
        channel: item.meio.clone().unwrap_or_default(),
        availability_date,
        summary_text,
        full_text,
        official_link,
        content_hash,
        raw_source_payload: sourced.raw.clone(),
    }
}

/// Extract the first CNJ-formatted process number from free-form text.
/// Absence is expected, not an error.
pub fn extract_process_number(text: &str) -> Option<String> {
    let caps = CNJ_PATTERN.captures(text)?;

    let mut number = format!(
        "{}-{}.{}.{}.{}.{}",
        &caps[1], &caps[2], &caps[3], &caps[4], &caps[5], &caps[6]
    );
    if let Some(tail) = caps.get(7) {
        number.push('.');
        number.push_str(tail.as_str());
    }
    Some(number)
}

/// Truncate to the summary limit, marking truncation with an ellipsis.
pub fn summarize(text: &str) -> String {
    if text.chars().count() > SUMMARY_LIMIT {
        let truncated: String = text.chars().take(SUMMARY_LIMIT).collect();
        format!("{}...", truncated)
    } else {
        text.to_string()
    }
}

/// Build the best available consultation link for a publication.
///
/// Evaluated in priority order; every rung may fail and the result may be
/// `None`. A missing link never blocks storage.
pub fn build_official_link(
    tribunal: &str,
    process_number: Option<&str>,
    content_hash: Option<&str>,
    source_link: Option<&str>,
) -> Option<String> {
    let stripped_link = source_link.map(strip_www);

    // Direct document viewer, when the source exposes a content hash.
    if let (Some(hash), Some(base)) = (content_hash, stripped_link.as_deref()) {
        return Some(format!("{}/Visualizar?hash={}", base, hash));
    }

    if tribunal == "TJSP" {
        // Court code is the last CNJ group; leading zeros are not accepted by
        // the target site. Auto-population is known not to work for every
        // court code, which is acceptable.
        if let Some(number) = process_number {
            if let Some(code) = court_code(number) {
                return Some(format!(
                    "{}?processo.codigo={}&processo.numero={}",
                    TJSP_DEEP_LINK_BASE, code, number
                ));
            }
        }
        return Some(TJSP_LANDING.to_string());
    }

    stripped_link
}

/// Wildcard certificates on tribunal hosts do not cover the `www.` form.
fn strip_www(link: &str) -> String {
    link.replace("://www.", "://")
}

fn court_code(process_number: &str) -> Option<u32> {
    if process_number.len() < 4 {
        return None;
    }
    let tail: String = process_number
        .chars()
        .rev()
        .take(4)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    tail.parse().ok()
}
