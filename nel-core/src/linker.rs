//! # Construção do Grafo de Menções
//!
//! Recebe a saída do tagger externo (trechos do texto e ids candidatos) e produz as
//! [`Mention`]s do documento, prontas para a difusão de features:
//!
//! 1. **Surpresa da frase**: `−log P(frase)` pelo modelo de linguagem.
//! 2. **Popularidade** de cada candidato: `rank = 25 + ln(pagerank)`.
//! 3. **Poda**: candidatos ordenados por rank e limitados a 10; menções curtas
//!    e minúsculas (`"de"`, `"a"`) são descartadas.
//! 4. **Similaridades locais**: cada tag recebe arestas ponderadas para as tags
//!    das menções vizinhas no texto.
//!
//! ## Peso de uma aresta
//!
//! ```text
//! w(t → u) = (s + sim(t, u)) · (D − d) / D        se d ≤ D
//! w(t → t) = s
//! ```
//!
//! Onde `s` é a suavização, `D` a distância máxima e `d` a distância em caracteres
//! entre as menções. Os pesos de cada tag são normalizados para somar 1.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::entity::EntityId;
use crate::language_model::PhraseModel;
use crate::mention::{Mention, Similarity, Tag, TagKey};
use crate::pagerank::PageRank;
use crate::similarity::SimilarityMeasure;

/// Atributos estáticos de uma entidade, como o índice de busca os devolve.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntityAttributes {
    pub label: Option<String>,
    pub aliases: Vec<String>,
    pub desc: Option<String>,
    pub nb_statements: u32,
    pub nb_sitelinks: u32,
    pub edges: Vec<EntityId>,
    pub types: Vec<EntityId>,
}

/// Um trecho casado pelo tagger externo, com todos os ids possíveis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawCandidate {
    pub start: usize,
    pub end: usize,
    pub ids: Vec<EntityId>,
}

/// Documento já passado pelo tagger externo.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaggedDocument {
    pub text: String,
    #[serde(default)]
    pub candidates: Vec<RawCandidate>,
    #[serde(default)]
    pub items: HashMap<EntityId, EntityAttributes>,
}

/// Parâmetros do grafo de similaridade local.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimilarityConfig {
    pub measure: SimilarityMeasure,
    /// Menções mais distantes do que isto (em caracteres) não se conectam.
    pub max_distance: f64,
    pub smoothing: f64,
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            measure: SimilarityMeasure::DirectLink,
            max_distance: 100.0,
            smoothing: 0.1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuilderConfig {
    pub rank_offset: f64,
    pub max_tags: usize,
    /// Descarta menções de até 2 caracteres inteiramente minúsculas.
    pub prune: bool,
    pub similarity: SimilarityConfig,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            rank_offset: 25.0,
            max_tags: 10,
            prune: true,
            similarity: SimilarityConfig::default(),
        }
    }
}

/// Transforma um [`TaggedDocument`] em menções com candidatos ranqueados.
pub struct MentionGraphBuilder<'a> {
    pagerank: &'a PageRank,
    phrase_model: &'a dyn PhraseModel,
    config: BuilderConfig,
}

impl<'a> MentionGraphBuilder<'a> {
    pub fn new(pagerank: &'a PageRank, phrase_model: &'a dyn PhraseModel, config: BuilderConfig) -> Self {
        Self {
            pagerank,
            phrase_model,
            config,
        }
    }

    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    /// `25 + ln(pagerank)`; entidades fora do grafo caem no valor padrão do PageRank.
    pub fn rank(&self, id: EntityId) -> f64 {
        self.config.rank_offset + self.pagerank.get(id).max(f64::MIN_POSITIVE).ln()
    }

    fn make_tag(&self, id: EntityId, attributes: Option<&EntityAttributes>) -> Tag {
        let attrs = attributes.cloned().unwrap_or_default();
        Tag {
            id,
            label: attrs.label,
            aliases: attrs.aliases,
            desc: attrs.desc,
            nb_statements: attrs.nb_statements,
            nb_sitelinks: attrs.nb_sitelinks,
            edges: attrs.edges,
            types: attrs.types,
            rank: self.rank(id),
            similarities: Vec::new(),
            score: None,
            valid: None,
        }
    }

    fn make_mention(&self, chars: &[char], candidate: &RawCandidate, items: &HashMap<EntityId, EntityAttributes>) -> Mention {
        let end = candidate.end.min(chars.len());
        let start = candidate.start.min(end);
        let phrase: String = chars[start..end].iter().collect();
        let log_likelihood = -self.phrase_model.log_likelihood(&phrase);

        let mut seen = HashSet::new();
        let mut tags: Vec<Tag> = candidate
            .ids
            .iter()
            .filter(|id| seen.insert(**id))
            .map(|&id| self.make_tag(id, items.get(&id)))
            .collect();
        tags.sort_by(|a, b| b.rank.total_cmp(&a.rank));
        tags.truncate(self.config.max_tags);

        Mention {
            phrase,
            start: candidate.start,
            end: candidate.end,
            log_likelihood,
            tags,
            best_entity_id: None,
        }
    }

    /// Constrói as menções do documento, já com o grafo de similaridade.
    pub fn build(&self, document: &TaggedDocument) -> Vec<Mention> {
        let chars: Vec<char> = document.text.chars().collect();
        let mut mentions: Vec<Mention> = document
            .candidates
            .iter()
            .map(|c| self.make_mention(&chars, c, &document.items))
            .filter(|m| !self.config.prune || keep_mention(m))
            .collect();

        compute_similarities(&mut mentions, &self.config.similarity);
        debug!(
            mentions = mentions.len(),
            tags = mentions.iter().map(|m| m.tags.len()).sum::<usize>(),
            "grafo de menções construído"
        );
        mentions
    }
}

/// Palavras curtas em minúsculas ("of", "a") quase nunca são menções reais.
pub fn keep_mention(mention: &Mention) -> bool {
    let short = mention.phrase.chars().count() <= 2;
    !(short && mention.phrase.to_lowercase() == mention.phrase)
}

/// (Re)calcula as similaridades de todas as tags do documento.
///
/// Se a soma dos pesos de uma tag for zero (suavização 0 e nenhuma vizinha
/// similar), ela recebe pesos uniformes sobre si mesma e todas as tags no alcance,
/// preservando a massa na difusão.
pub fn compute_similarities(mentions: &mut [Mention], config: &SimilarityConfig) {
    let edge_sets: Vec<Vec<HashSet<EntityId>>> = mentions
        .iter()
        .map(|m| m.tags.iter().map(Tag::edge_set).collect())
        .collect();

    let mut computed: Vec<Vec<Vec<Similarity>>> = Vec::with_capacity(mentions.len());
    for (mi, mention) in mentions.iter().enumerate() {
        let mut per_tag = Vec::with_capacity(mention.tags.len());
        for (ti, tag) in mention.tags.iter().enumerate() {
            let own_key = mention.tag_key(tag.id);
            let mut similarities = vec![Similarity {
                tag: own_key,
                score: config.smoothing,
            }];
            let mut in_range: Vec<TagKey> = Vec::new();

            for (oi, other) in mentions.iter().enumerate() {
                let distance = mention.distance(other) as f64;
                if mention.same_span(other) || distance > config.max_distance {
                    continue;
                }
                let decay = if config.max_distance > 0.0 {
                    (config.max_distance - distance) / config.max_distance
                } else {
                    1.0
                };
                for (oti, other_tag) in other.tags.iter().enumerate() {
                    let key = other.tag_key(other_tag.id);
                    in_range.push(key);
                    let sim = config
                        .measure
                        .similarity(tag.id, other_tag.id, &edge_sets[mi][ti], &edge_sets[oi][oti]);
                    let weight = (config.smoothing + sim) * decay;
                    if weight > 0.0 {
                        similarities.push(Similarity { tag: key, score: weight });
                    }
                }
            }

            let total: f64 = similarities.iter().map(|s| s.score).sum();
            if total > 0.0 {
                similarities.retain(|s| s.score > 0.0);
                for s in similarities.iter_mut() {
                    s.score /= total;
                }
            } else {
                let uniform = 1.0 / (in_range.len() + 1) as f64;
                similarities = std::iter::once(own_key)
                    .chain(in_range)
                    .map(|tag| Similarity { tag, score: uniform })
                    .collect();
            }
            per_tag.push(similarities);
        }
        computed.push(per_tag);
    }

    for (mention, per_tag) in mentions.iter_mut().zip(computed) {
        for (tag, similarities) in mention.tags.iter_mut().zip(per_tag) {
            tag.similarities = similarities;
        }
    }
}
