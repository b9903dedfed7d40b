//! # Documento de Item do Wikidata
//!
//! Leitura do JSON de uma entidade (como aparece no dump ou na API) para extrair
//! somente o que o grafo e o classificador usam:
//!
//! - **Arestas de saída**: o `numeric-id` de cada valor de declaração e de qualificador.
//! - **Contagens**: número de declarações e de sitelinks (sinais de popularidade).
//! - **Tipos**: valores de `P31` ("instância de").
//! - **Rótulos e apelidos**: usados pelo tagger externo e pelo modelo de frases.

use std::collections::HashSet;

use serde_json::Value;

use crate::edgelist::EdgeRecord;
use crate::entity::{parse_qid, EntityId};
use crate::error::Result;

/// Wrapper fino sobre o JSON de um item.
#[derive(Debug, Clone)]
pub struct WikidataItem {
    json: Value,
}

impl WikidataItem {
    pub fn new(json: Value) -> Self {
        Self { json }
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        Ok(Self::new(serde_json::from_str(s)?))
    }

    /// Identificador textual (`Q42`, `P31`...), se presente.
    pub fn id(&self) -> Option<&str> {
        self.json.get("id").and_then(Value::as_str)
    }

    /// Índice numérico, apenas para itens (`Q`). Propriedades retornam `None`.
    pub fn entity_id(&self) -> Option<EntityId> {
        self.id()
            .filter(|id| id.starts_with('Q'))
            .and_then(|id| parse_qid(id).ok())
    }

    fn claims(&self) -> Option<&serde_json::Map<String, Value>> {
        self.json.get("claims").and_then(Value::as_object)
    }

    /// Lista (com repetições) dos itens apontados pelas declarações e qualificadores.
    ///
    /// Valores que não são itens (strings, datas, quantidades) são ignorados.
    pub fn outgoing_edges(&self, include_p31: bool) -> Vec<EntityId> {
        let mut edges = Vec::new();
        let Some(claims) = self.claims() else {
            return edges;
        };

        for (pid, statements) in claims {
            if pid == "P31" && !include_p31 {
                continue;
            }
            for statement in statements.as_array().into_iter().flatten() {
                if let Some(id) = numeric_id(statement.pointer("/mainsnak/datavalue/value")) {
                    edges.push(id);
                }
                let qualifiers = statement.get("qualifiers").and_then(Value::as_object);
                for snaks in qualifiers.into_iter().flat_map(|q| q.values()) {
                    for snak in snaks.as_array().into_iter().flatten() {
                        if let Some(id) = numeric_id(snak.pointer("/datavalue/value")) {
                            edges.push(id);
                        }
                    }
                }
            }
        }
        edges
    }

    /// Número total de declarações (somando todas as propriedades).
    pub fn nb_statements(&self) -> u32 {
        self.claims()
            .map(|c| c.values().filter_map(Value::as_array).map(|a| a.len() as u32).sum())
            .unwrap_or(0)
    }

    pub fn nb_sitelinks(&self) -> u32 {
        self.json
            .get("sitelinks")
            .and_then(Value::as_object)
            .map(|s| s.len() as u32)
            .unwrap_or(0)
    }

    /// Valores de uma propriedade de tipo (por padrão `P31`).
    pub fn types(&self, pid: &str) -> Vec<EntityId> {
        self.claims()
            .and_then(|c| c.get(pid))
            .and_then(Value::as_array)
            .map(|statements| {
                statements
                    .iter()
                    .filter_map(|s| numeric_id(s.pointer("/mainsnak/datavalue/value")))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Rótulo no idioma pedido, senão em inglês, senão em qualquer idioma.
    pub fn default_label(&self, language: &str) -> Option<String> {
        let labels = self.json.get("labels")?.as_object()?;
        let value_of = |lang: &str| {
            labels
                .get(lang)
                .and_then(|l| l.get("value"))
                .and_then(Value::as_str)
                .map(str::to_string)
        };
        value_of(language)
            .or_else(|| value_of("en"))
            .or_else(|| {
                labels
                    .values()
                    .find_map(|l| l.get("value").and_then(Value::as_str))
                    .map(str::to_string)
            })
    }

    pub fn aliases(&self, language: &str) -> Vec<String> {
        self.json
            .pointer(&format!("/aliases/{language}"))
            .and_then(Value::as_array)
            .map(|aliases| {
                aliases
                    .iter()
                    .filter_map(|a| a.get("value").and_then(Value::as_str))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Todos os rótulos e apelidos, em todos os idiomas, sem repetição.
    pub fn all_terms(&self) -> HashSet<String> {
        let mut terms = HashSet::new();
        if let Some(labels) = self.json.get("labels").and_then(Value::as_object) {
            for label in labels.values() {
                if let Some(v) = label.get("value").and_then(Value::as_str) {
                    terms.insert(v.to_string());
                }
            }
        }
        if let Some(aliases) = self.json.get("aliases").and_then(Value::as_object) {
            for alias in aliases.values().filter_map(Value::as_array).flatten() {
                if let Some(v) = alias.get("value").and_then(Value::as_str) {
                    terms.insert(v.to_string());
                }
            }
        }
        terms
    }

    /// Etapa de pré-processamento: converte o item em um registro da lista de arestas.
    ///
    /// Retorna `None` para propriedades e para itens sem arestas de saída.
    pub fn to_edge_record(&self) -> Option<EdgeRecord> {
        let source = self.entity_id()?;
        let edges = self.outgoing_edges(true);
        if edges.is_empty() {
            return None;
        }
        Some(EdgeRecord::from_raw_edges(source, &edges))
    }

    /// Atributos estáticos usados pelo [`crate::linker::MentionGraphBuilder`].
    pub fn attributes(&self, language: &str) -> crate::linker::EntityAttributes {
        let mut edges = self.outgoing_edges(true);
        edges.sort_unstable();
        edges.dedup();
        crate::linker::EntityAttributes {
            label: self.default_label(language),
            aliases: self.aliases(language),
            desc: self
                .json
                .pointer(&format!("/descriptions/{language}/value"))
                .and_then(Value::as_str)
                .map(str::to_string),
            nb_statements: self.nb_statements(),
            nb_sitelinks: self.nb_sitelinks(),
            edges,
            types: self.types("P31"),
        }
    }
}

fn numeric_id(value: Option<&Value>) -> Option<EntityId> {
    value?
        .get("numeric-id")?
        .as_u64()
        .and_then(|n| EntityId::try_from(n).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sweden() -> WikidataItem {
        WikidataItem::new(json!({
            "id": "Q34",
            "labels": {"en": {"language": "en", "value": "Sweden"}, "sv": {"language": "sv", "value": "Sverige"}},
            "aliases": {"en": [{"language": "en", "value": "Kingdom of Sweden"}]},
            "descriptions": {"en": {"language": "en", "value": "country in northern Europe"}},
            "sitelinks": {"enwiki": {"title": "Sweden"}, "svwiki": {"title": "Sverige"}},
            "claims": {
                "P31": [
                    {"mainsnak": {"datavalue": {"value": {"entity-type": "item", "numeric-id": 6256, "id": "Q6256"}}}}
                ],
                "P463": [
                    {"mainsnak": {"datavalue": {"value": {"entity-type": "item", "numeric-id": 458, "id": "Q458"}}},
                     "qualifiers": {"P580": [{"datavalue": {"value": {"time": "+1995-01-01T00:00:00Z"}}}],
                                    "P642": [{"datavalue": {"value": {"numeric-id": 458, "id": "Q458"}}}]}}
                ],
                "P1082": [
                    {"mainsnak": {"datavalue": {"value": {"amount": "+10000000"}}}}
                ]
            }
        }))
    }

    #[test]
    fn test_outgoing_edges() {
        let item = sweden();
        let mut edges = item.outgoing_edges(true);
        edges.sort();
        assert_eq!(edges, vec![458, 458, 6256]);

        let without_types = item.outgoing_edges(false);
        assert_eq!(without_types, vec![458, 458]);
    }

    #[test]
    fn test_counts_and_types() {
        let item = sweden();
        assert_eq!(item.nb_statements(), 3);
        assert_eq!(item.nb_sitelinks(), 2);
        assert_eq!(item.types("P31"), vec![6256]);
        assert_eq!(item.entity_id(), Some(34));
    }

    #[test]
    fn test_labels_fallback() {
        let item = sweden();
        assert_eq!(item.default_label("sv"), Some("Sverige".to_string()));
        assert_eq!(item.default_label("pt"), Some("Sweden".to_string()));
        assert_eq!(item.aliases("en"), vec!["Kingdom of Sweden".to_string()]);
        assert!(item.all_terms().contains("Kingdom of Sweden"));
        assert_eq!(item.all_terms().len(), 3);
    }

    #[test]
    fn test_to_edge_record() {
        let record = sweden().to_edge_record().unwrap();
        assert_eq!(record.source, 34);
        assert_eq!(record.targets, vec![458, 6256]);
        assert_eq!(record.counts, vec![2, 1]);

        let property = WikidataItem::new(json!({"id": "P31", "claims": {}}));
        assert!(property.to_edge_record().is_none());
    }

    #[test]
    fn test_attributes() {
        let attrs = sweden().attributes("en");
        assert_eq!(attrs.label.as_deref(), Some("Sweden"));
        assert_eq!(attrs.desc.as_deref(), Some("country in northern Europe"));
        assert_eq!(attrs.edges, vec![458, 6256]);
        assert_eq!(attrs.nb_sitelinks, 2);
    }
}
