//! # Identificadores de Entidades do Wikidata
//!
//! No Wikidata, cada item tem um identificador textual como `Q42` (Douglas Adams)
//! e cada propriedade um como `P31` ("instância de"). O grafo usa apenas a parte
//! numérica: `Q42` vira a linha/coluna `42` da matriz de adjacência.
//!
//! Também aceitamos URIs completas, como aparecem em datasets NIF e na API:
//!
//! ```rust
//! use nel_core::entity::{normalize_qid, parse_qid};
//!
//! assert_eq!(normalize_qid("<http://www.wikidata.org/entity/Q801> "), Some("Q801".to_string()));
//! assert_eq!(parse_qid("Q42").unwrap(), 42);
//! ```

use std::sync::OnceLock;

use regex::Regex;

use crate::error::{NelError, Result};

/// Índice denso de uma entidade na matriz (o número após o `Q`).
pub type EntityId = u32;

/// Prefixo das URIs de entidades usadas nos julgamentos (gold standard / NIF).
pub const ENTITY_URI_PREFIX: &str = "http://www.wikidata.org/entity/";

fn q_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(<?https?://www\.wikidata\.org/(entity|wiki)/)?(Q[0-9]+)>?$")
            .expect("regex de QID válida")
    })
}

fn p_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(<?https?://www\.wikidata\.org/(entity/|wiki/Property:))?(P[0-9]+)>?$")
            .expect("regex de PID válida")
    })
}

/// Normaliza um identificador de item para a forma curta `Q123`.
///
/// Retorna `None` se o texto não for um identificador de item reconhecível.
pub fn normalize_qid(raw: &str) -> Option<String> {
    q_regex()
        .captures(raw.trim())
        .and_then(|caps| caps.get(3))
        .map(|m| m.as_str().to_string())
}

/// Normaliza um identificador de propriedade para a forma curta `P123`.
pub fn normalize_pid(raw: &str) -> Option<String> {
    p_regex()
        .captures(raw.trim())
        .and_then(|caps| caps.get(3))
        .map(|m| m.as_str().to_string())
}

/// Converte `Q42` (ou uma URI de entidade) no índice numérico `42`.
pub fn parse_qid(raw: &str) -> Result<EntityId> {
    let qid = normalize_qid(raw).ok_or_else(|| NelError::InvalidEntityId(raw.to_string()))?;
    qid[1..]
        .parse::<EntityId>()
        .map_err(|_| NelError::InvalidEntityId(raw.to_string()))
}

/// Forma textual curta de um índice (`42` -> `Q42`).
pub fn format_qid(id: EntityId) -> String {
    format!("Q{id}")
}

/// URI canônica da entidade, usada em anotações NIF.
pub fn entity_uri(id: EntityId) -> String {
    format!("{ENTITY_URI_PREFIX}Q{id}")
}
