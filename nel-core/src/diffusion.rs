//! # Difusão de Features no Grafo de Menções
//!
//! Cada candidato começa com um vetor de 5 features "locais":
//!
//! ```text
//! [ surpresa da frase, rank, nº declarações, nº sitelinks, 1 ]
//! ```
//!
//! Sozinhas, elas só dizem o quão popular é a entidade. A difusão mistura as
//! features de cada tag com as das tags **similares** no mesmo documento: se
//! "Suécia" está ligada a "União Europeia", cada uma herda parte da evidência
//! da outra.
//!
//! ## Modos
//!
//! - **markov**: `F_{k+1} = A·F_k`, e a saída concatena `[F_0 | F_1 | … | F_n]`
//!   (a largura cresce para `5·(n+1)`).
//! - **restarts**: `F ← α·F + (1−α)·A·F` por `n` iterações (largura fixa em 5).
//!   Tags sem nenhuma aresta mantêm as features originais.
//!
//! `A[i][j]` é o peso normalizado da tag `i` para a tag `j`.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::mention::{Mention, Tag, TagKey};

/// Número de features locais por tag.
pub const RAW_FEATURES: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DiffusionMode {
    #[default]
    Markov,
    Restarts,
}

impl fmt::Display for DiffusionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiffusionMode::Markov => f.write_str("markov"),
            DiffusionMode::Restarts => f.write_str("restarts"),
        }
    }
}

impl FromStr for DiffusionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "markov" => Ok(DiffusionMode::Markov),
            "restarts" => Ok(DiffusionMode::Restarts),
            other => Err(format!("modo de difusão desconhecido: {other}")),
        }
    }
}

/// Features locais de uma tag dentro da sua menção.
pub fn raw_features(mention: &Mention, tag: &Tag) -> [f64; RAW_FEATURES] {
    [
        mention.log_likelihood,
        tag.rank,
        tag.nb_statements as f64,
        tag.nb_sitelinks as f64,
        1.0,
    ]
}

/// Matriz de features de um documento: uma linha por tag, na ordem das menções.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentFeatures {
    keys: Vec<TagKey>,
    index: HashMap<TagKey, usize>,
    rows: Vec<Vec<f64>>,
}

impl DocumentFeatures {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn keys(&self) -> &[TagKey] {
        &self.keys
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn get(&self, key: &TagKey) -> Option<&[f64]> {
        self.index.get(key).map(|&i| self.rows[i].as_slice())
    }

    pub fn width(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }
}

/// Propaga as features pelo grafo de similaridade local.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureDiffusionEngine {
    pub mode: DiffusionMode,
    pub steps: usize,
    pub alpha: f64,
}

impl Default for FeatureDiffusionEngine {
    fn default() -> Self {
        Self {
            mode: DiffusionMode::Markov,
            steps: 2,
            alpha: 0.85,
        }
    }
}

type SparseRows = Vec<Vec<(usize, f64)>>;

fn multiply(adjacency: &SparseRows, features: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let width = features.first().map_or(0, Vec::len);
    adjacency
        .iter()
        .map(|row| {
            let mut out = vec![0.0; width];
            for &(j, w) in row {
                for (o, f) in out.iter_mut().zip(&features[j]) {
                    *o += w * f;
                }
            }
            out
        })
        .collect()
}

impl FeatureDiffusionEngine {
    pub fn new(mode: DiffusionMode, steps: usize, alpha: f64) -> Self {
        Self { mode, steps, alpha }
    }

    /// Largura das linhas produzidas (o que o classificador espera).
    pub fn feature_width(&self) -> usize {
        match self.mode {
            DiffusionMode::Markov => RAW_FEATURES * (self.steps + 1),
            DiffusionMode::Restarts => RAW_FEATURES,
        }
    }

    pub fn diffuse(&self, mentions: &[Mention]) -> DocumentFeatures {
        let mut keys = Vec::new();
        let mut index = HashMap::new();
        let mut raw: Vec<Vec<f64>> = Vec::new();
        for mention in mentions {
            for tag in &mention.tags {
                let key = mention.tag_key(tag.id);
                if index.contains_key(&key) {
                    continue;
                }
                index.insert(key, keys.len());
                keys.push(key);
                raw.push(raw_features(mention, tag).to_vec());
            }
        }
        if raw.is_empty() {
            return DocumentFeatures::default();
        }

        // tags podadas do documento não aparecem no índice
        let mut adjacency: SparseRows = vec![Vec::new(); raw.len()];
        for mention in mentions {
            for tag in &mention.tags {
                let i = index[&mention.tag_key(tag.id)];
                if !adjacency[i].is_empty() {
                    continue;
                }
                adjacency[i] = tag
                    .similarities
                    .iter()
                    .filter_map(|s| index.get(&s.tag).map(|&j| (j, s.score)))
                    .collect();
            }
        }

        let rows = match self.mode {
            DiffusionMode::Markov => {
                let mut blocks = vec![raw];
                for _ in 0..self.steps {
                    let next = multiply(&adjacency, &blocks[blocks.len() - 1]);
                    blocks.push(next);
                }
                (0..keys.len())
                    .map(|i| blocks.iter().flat_map(|b| b[i].iter().copied()).collect())
                    .collect()
            }
            DiffusionMode::Restarts => {
                let mut current = raw;
                for _ in 0..self.steps {
                    let propagated = multiply(&adjacency, &current);
                    current = current
                        .iter()
                        .zip(&propagated)
                        .zip(&adjacency)
                        .map(|((f, p), row)| {
                            if row.is_empty() {
                                return f.clone();
                            }
                            f.iter()
                                .zip(p)
                                .map(|(f, p)| self.alpha * f + (1.0 - self.alpha) * p)
                                .collect()
                        })
                        .collect();
                }
                current
            }
        };

        DocumentFeatures { keys, index, rows }
    }
}
