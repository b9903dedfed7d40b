//! # Menções e Candidatos
//!
//! Uma **menção** é um trecho `[start, end)` do texto que o tagger externo casou
//! com um ou mais rótulos do Wikidata. Cada entidade candidata vira uma **tag**:
//!
//! ```text
//! "Paris"  [12, 17)
//!    ├── Tag Q90      (cidade)           rank 14.2   score  1.31  valid ✓
//!    ├── Tag Q47899   (mitologia grega)  rank  9.8   score −0.42
//!    └── Tag Q47454   (Paris Hilton)     rank 10.1   score −0.77
//! ```
//!
//! Offsets são contados em caracteres (escalares Unicode), não em bytes.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::entity::EntityId;

/// Identifica uma tag dentro de um documento: `(start, end, id)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TagKey {
    pub start: usize,
    pub end: usize,
    pub id: EntityId,
}

impl TagKey {
    pub fn new(start: usize, end: usize, id: EntityId) -> Self {
        Self { start, end, id }
    }
}

/// Aresta do grafo de similaridade local: peso normalizado para outra tag.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Similarity {
    pub tag: TagKey,
    pub score: f64,
}

/// Entidade candidata de uma menção.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub id: EntityId,
    pub label: Option<String>,
    #[serde(default)]
    pub aliases: Vec<String>,
    pub desc: Option<String>,
    pub nb_statements: u32,
    pub nb_sitelinks: u32,
    /// Ids apontados pelas declarações da entidade.
    #[serde(default)]
    pub edges: Vec<EntityId>,
    #[serde(default)]
    pub types: Vec<EntityId>,
    /// Popularidade: `25 + ln(pagerank)`.
    pub rank: f64,
    /// Pesos normalizados (somam 1) para as tags vizinhas no documento.
    #[serde(default)]
    pub similarities: Vec<Similarity>,
    /// Valor da função de decisão do classificador.
    pub score: Option<f64>,
    /// `true` sse esta tag foi escolhida para a menção.
    pub valid: Option<bool>,
}

impl Tag {
    /// Conjunto de arestas, no formato que as medidas de similaridade esperam.
    pub fn edge_set(&self) -> HashSet<EntityId> {
        self.edges.iter().copied().collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mention {
    /// Texto coberto pela menção.
    pub phrase: String,
    pub start: usize,
    pub end: usize,
    /// Surpresa da frase segundo o modelo de linguagem (valor positivo).
    pub log_likelihood: f64,
    /// No máximo 10 candidatos, do maior para o menor rank.
    pub tags: Vec<Tag>,
    pub best_entity_id: Option<EntityId>,
}

impl Mention {
    /// Identifica a menção no documento (menções não se sobrepõem).
    pub fn key(&self) -> (usize, usize) {
        (self.start, self.end)
    }

    pub fn tag_key(&self, id: EntityId) -> TagKey {
        TagKey::new(self.start, self.end, id)
    }

    pub fn same_span(&self, other: &Mention) -> bool {
        self.key() == other.key()
    }

    /// Distância em caracteres até outra menção (negativa se houver sobreposição).
    pub fn distance(&self, other: &Mention) -> i64 {
        let (start, end) = (self.start as i64, self.end as i64);
        let (other_start, other_end) = (other.start as i64, other.end as i64);
        (start - other_end).max(other_start - end)
    }

    pub fn best_tag(&self) -> Option<&Tag> {
        let best = self.best_entity_id?;
        self.tags.iter().find(|t| t.id == best)
    }
}
