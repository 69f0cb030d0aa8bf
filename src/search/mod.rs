//! Publication text search
//!
//! In-memory matching over non-deleted publications. Digit-only queries are
//! treated as process-number lookups with a formatting-insensitive fallback;
//! everything else is accent-insensitive free-text search.

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::models::publication::Model as Publication;

/// Minimum digit count for a query to be read as a process number.
const PROCESS_QUERY_MIN_DIGITS: usize = 6;
/// Minimum digit count for the formatting-stripped fallback match.
const STRIPPED_FALLBACK_MIN_DIGITS: usize = 7;

/// How a raw query string is interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchQuery {
    ProcessNumber(String),
    FreeText(String),
}

impl SearchQuery {
    /// Classify a raw query. Digit-only strings of at least six characters
    /// target the process-number field.
    pub fn classify(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.len() >= PROCESS_QUERY_MIN_DIGITS
            && trimmed.chars().all(|c| c.is_ascii_digit())
        {
            SearchQuery::ProcessNumber(trimmed.to_string())
        } else {
            SearchQuery::FreeText(trimmed.to_string())
        }
    }
}

/// Filter publications matching the query. Input is expected to be already
/// restricted to non-deleted rows; order is preserved.
pub fn filter_publications(publications: Vec<Publication>, raw_query: &str) -> Vec<Publication> {
    match SearchQuery::classify(raw_query) {
        SearchQuery::ProcessNumber(digits) => filter_by_process_number(publications, &digits),
        SearchQuery::FreeText(text) => filter_by_text(publications, &text),
    }
}

fn filter_by_process_number(publications: Vec<Publication>, digits: &str) -> Vec<Publication> {
    let direct: Vec<Publication> = publications
        .iter()
        .filter(|p| {
            p.process_number
                .as_deref()
                .is_some_and(|n| n.contains(digits))
        })
        .cloned()
        .collect();

    if !direct.is_empty() || digits.len() < STRIPPED_FALLBACK_MIN_DIGITS {
        return direct;
    }

    // Recover matches across formatting differences, e.g. an unformatted
    // 20-digit paste against the stored CNJ form.
    publications
        .into_iter()
        .filter(|p| {
            p.process_number.as_deref().is_some_and(|n| {
                let stripped: String = n.chars().filter(|c| c.is_ascii_digit()).collect();
                stripped.contains(digits)
            })
        })
        .collect()
}

fn filter_by_text(publications: Vec<Publication>, text: &str) -> Vec<Publication> {
    let needle = normalize_for_search(text);
    if needle.is_empty() {
        return publications;
    }

    publications
        .into_iter()
        .filter(|p| {
            normalize_for_search(&p.summary_text).contains(&needle)
                || normalize_for_search(&p.full_text).contains(&needle)
                || normalize_for_search(&p.issuing_body).contains(&needle)
        })
        .collect()
}

/// Canonical decomposition, combining marks stripped, lowercased.
pub fn normalize_for_search(text: &str) -> String {
    text.nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;
    use uuid::Uuid;

    fn publication(external_id: i64, process_number: Option<&str>, full_text: &str) -> Publication {
        let now = chrono::Utc::now().into();
        Publication {
            id: Uuid::new_v4(),
            external_id,
            process_number: process_number.map(str::to_string),
            tribunal: "TJSP".to_string(),
            communication_type: "Intimação".to_string(),
            issuing_body: "2ª Vara Cível de Vitória".to_string(),
            channel: "D".to_string(),
            availability_date: NaiveDate::from_ymd_opt(2026, 2, 10).unwrap(),
            summary_text: full_text.chars().take(500).collect(),
            full_text: full_text.to_string(),
            official_link: None,
            content_hash: None,
            raw_source_payload: json!({}),
            created_at: now,
            updated_at: now,
            deleted: false,
            deleted_at: None,
            deleted_reason: None,
        }
    }

    #[test]
    fn digit_queries_of_six_or_more_are_process_queries() {
        assert_eq!(
            SearchQuery::classify("123456"),
            SearchQuery::ProcessNumber("123456".to_string())
        );
        assert_eq!(
            SearchQuery::classify("12345"),
            SearchQuery::FreeText("12345".to_string())
        );
        assert_eq!(
            SearchQuery::classify("despacho"),
            SearchQuery::FreeText("despacho".to_string())
        );
    }

    #[test]
    fn direct_process_number_fragment_matches() {
        let pubs = vec![
            publication(1, Some("0000623-69.2026.8.26.0320"), "texto"),
            publication(2, Some("1003498-11.2021.8.26.0533"), "texto"),
        ];
        let found = filter_publications(pubs, "1003498");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].external_id, 2);
    }

    #[test]
    fn unformatted_process_number_falls_back_to_stripped_match() {
        let pubs = vec![publication(1, Some("0000623-69.2026.8.26.0320"), "texto")];
        let found = filter_publications(pubs, "00006236920268260320");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].external_id, 1);
    }

    #[test]
    fn free_text_match_ignores_diacritics() {
        let pubs = vec![
            publication(1, None, "Intimação da advogada Vitória Rocha"),
            publication(2, None, "Despacho de mero expediente"),
        ];
        let found = filter_publications(pubs, "vitoria");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].external_id, 1);
    }

    #[test]
    fn free_text_matches_issuing_body() {
        let pubs = vec![publication(1, None, "texto sem nada")];
        let found = filter_publications(pubs, "vara civel");
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn accented_query_matches_plain_text() {
        let pubs = vec![publication(1, None, "Citacao do reu")];
        let found = filter_publications(pubs, "Citação");
        assert_eq!(found.len(), 1);
    }
}
