//! # Medidas de Similaridade entre Entidades
//!
//! Duas entidades candidatas do mesmo documento tendem a ser a interpretação
//! correta quando estão **ligadas no grafo**: "Suécia" e "União Europeia" aparecem
//! juntas num texto sobre política europeia, e `Q34` tem uma aresta para `Q458`.
//!
//! Cada medida recebe os dois ids e os conjuntos de arestas de saída:
//!
//! | Medida       | Ideia                                                  | Faixa  |
//! |--------------|--------------------------------------------------------|--------|
//! | `DirectLink` | conta arestas diretas A→B e B→A                         | [0, 2] |
//! | `EdgeRatio`  | sobreposição das vizinhanças (incluindo a própria)      | [0, 1] |
//! | `OneStep(β)` | produto de passeios aleatórios de um passo com reinício | [0, 1] |
//!
//! Conjuntos vazios anulam o termo afetado (nunca há divisão por zero).

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::entity::EntityId;

pub const DEFAULT_ONE_STEP_BETA: f64 = 0.85;

fn default_beta() -> f64 {
    DEFAULT_ONE_STEP_BETA
}

/// Medida de similaridade, escolhida na configuração.
///
/// Em JSON: `"direct_link"`, `"edge_ratio"` ou `{"one_step": {"beta": 0.85}}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityMeasure {
    DirectLink,
    EdgeRatio,
    OneStep {
        #[serde(default = "default_beta")]
        beta: f64,
    },
}

impl Default for SimilarityMeasure {
    fn default() -> Self {
        SimilarityMeasure::DirectLink
    }
}

impl SimilarityMeasure {
    pub fn one_step() -> Self {
        SimilarityMeasure::OneStep { beta: DEFAULT_ONE_STEP_BETA }
    }

    /// Similaridade (≥ 0) entre `a` e `b`, dadas suas arestas de saída.
    pub fn similarity(
        &self,
        a: EntityId,
        b: EntityId,
        edges_a: &HashSet<EntityId>,
        edges_b: &HashSet<EntityId>,
    ) -> f64 {
        match *self {
            SimilarityMeasure::DirectLink => direct_link(a, b, edges_a, edges_b),
            SimilarityMeasure::EdgeRatio => edge_ratio(a, b, edges_a, edges_b),
            SimilarityMeasure::OneStep { beta } => one_step(beta, a, b, edges_a, edges_b),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SimilarityMeasure::DirectLink => "direct_link",
            SimilarityMeasure::EdgeRatio => "edge_ratio",
            SimilarityMeasure::OneStep { .. } => "one_step",
        }
    }
}

impl fmt::Display for SimilarityMeasure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimilarityMeasure::OneStep { beta } => write!(f, "one_step({beta})"),
            other => f.write_str(other.name()),
        }
    }
}

impl FromStr for SimilarityMeasure {
    type Err = String;

    /// Aceita `direct_link`, `edge_ratio`, `one_step` e `one_step:0.7`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s {
            "direct_link" => Ok(SimilarityMeasure::DirectLink),
            "edge_ratio" => Ok(SimilarityMeasure::EdgeRatio),
            "one_step" => Ok(SimilarityMeasure::one_step()),
            _ => {
                let beta = s
                    .strip_prefix("one_step:")
                    .ok_or_else(|| format!("medida de similaridade desconhecida: {s}"))?;
                let beta: f64 = beta.parse().map_err(|e| format!("beta inválido {beta:?}: {e}"))?;
                Ok(SimilarityMeasure::OneStep { beta })
            }
        }
    }
}

fn indicator(cond: bool) -> f64 {
    if cond {
        1.0
    } else {
        0.0
    }
}

fn direct_link(a: EntityId, b: EntityId, edges_a: &HashSet<EntityId>, edges_b: &HashSet<EntityId>) -> f64 {
    indicator(a == b || edges_a.contains(&b)) + indicator(a == b || edges_b.contains(&a))
}

fn edge_ratio(a: EntityId, b: EntityId, edges_a: &HashSet<EntityId>, edges_b: &HashSet<EntityId>) -> f64 {
    let mut with_a = edges_a.clone();
    with_a.insert(a);
    let mut with_b = edges_b.clone();
    with_b.insert(b);
    let common = with_a.intersection(&with_b).count() as f64;
    0.5 * (common / with_a.len() as f64 + common / with_b.len() as f64)
}

/// Probabilidade de dois passeios (um saindo de `a`, outro de `b`) se encontrarem
/// após no máximo um passo, reiniciando com probabilidade `β`.
fn one_step(beta: f64, a: EntityId, b: EntityId, edges_a: &HashSet<EntityId>, edges_b: &HashSet<EntityId>) -> f64 {
    let ratio = |num: f64, set: &HashSet<EntityId>| {
        if set.is_empty() {
            0.0
        } else {
            num / set.len() as f64
        }
    };
    let common = edges_a.intersection(edges_b).count() as f64;

    beta * beta * indicator(a == b)
        + (1.0 - beta) * beta * ratio(indicator(edges_a.contains(&b)), edges_a)
        + beta * (1.0 - beta) * ratio(indicator(edges_b.contains(&a)), edges_b)
        + (1.0 - beta) * (1.0 - beta) * ratio(common, edges_a) * ratio(common, edges_b)
}
