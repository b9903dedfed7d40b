//! # PageRank
//!
//! Importância global de cada entidade, usada como sinal de popularidade
//! (`rank = 25 + ln(pagerank)`) no [`crate::linker`].
//!
//! ## Iteração de potência
//!
//! Partindo da distribuição uniforme `v_0 = 1/N`, cada passo é:
//!
//! ```text
//! v_{k+1} = v_k · M
//! v_{k+1} += (1 − Σ v_{k+1}) / N      <- massa perdida nos nós pendurados
//! ```
//!
//! A massa que "cai" em nós sem arestas de saída é redistribuída uniformemente,
//! de modo que o vetor continua somando 1. O número de iterações é fixo (32 por
//! padrão); a variação L1 entre iterações só é registrada em nível `debug`.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::entity::EntityId;
use crate::error::Result;
use crate::graph::AdjacencyMatrix;

pub const DEFAULT_ITERATIONS: usize = 32;

/// Vetor denso de PageRank, indexado pelo id da entidade.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageRank {
    scores: Vec<f64>,
}

impl PageRank {
    pub fn from_scores(scores: Vec<f64>) -> Self {
        Self { scores }
    }

    /// Recalcula o vetor inteiro a partir da matriz.
    pub fn compute(matrix: &AdjacencyMatrix, iterations: usize) -> Self {
        let n = matrix.n();
        if n == 0 {
            return Self::default();
        }
        let uniform = 1.0 / n as f64;
        let mut v = vec![uniform; n];

        for iteration in 0..iterations {
            let mut next = matrix.propagate(&v);
            let retained: f64 = next.iter().sum();
            let redistributed = (1.0 - retained) / n as f64;
            for x in next.iter_mut() {
                *x += redistributed;
            }
            let delta: f64 = next.iter().zip(&v).map(|(a, b)| (a - b).abs()).sum();
            debug!(iteration, delta, "pagerank");
            v = next;
        }

        info!(n, iterations, "pagerank calculado");
        Self { scores: v }
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn scores(&self) -> &[f64] {
        &self.scores
    }

    /// PageRank de uma entidade; ids fora do vetor recebem `0.01/N`,
    /// abaixo de qualquer entidade indexada.
    pub fn get(&self, id: EntityId) -> f64 {
        match self.scores.get(id as usize) {
            Some(&score) => score,
            None => 0.01 / self.scores.len().max(1) as f64,
        }
    }

    pub fn sum(&self) -> f64 {
        self.scores.iter().sum()
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let writer = BufWriter::new(File::create(path)?);
        bincode::serialize_into(writer, self)?;
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        Ok(bincode::deserialize_from(reader)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edgelist::EdgeRecord;
    use crate::graph::{GraphBuilder, GraphConfig};

    fn triangle_with_dangling() -> AdjacencyMatrix {
        GraphBuilder::build(
            vec![
                EdgeRecord::new(0, vec![1], vec![1]),
                EdgeRecord::new(1, vec![2], vec![1]),
                EdgeRecord::new(2, vec![0, 3], vec![1, 1]),
            ],
            GraphConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_pagerank_sums_to_one() {
        let pr = PageRank::compute(&triangle_with_dangling(), DEFAULT_ITERATIONS);
        assert_eq!(pr.len(), 4);
        assert!((pr.sum() - 1.0).abs() < 1e-9);
        assert!(pr.scores().iter().all(|s| s.is_finite() && *s >= 0.0));
    }

    #[test]
    fn test_cycle_is_uniform() {
        let m = GraphBuilder::build(
            vec![
                EdgeRecord::new(0, vec![1], vec![1]),
                EdgeRecord::new(1, vec![2], vec![1]),
                EdgeRecord::new(2, vec![0], vec![1]),
            ],
            GraphConfig::default(),
        )
        .unwrap();
        let pr = PageRank::compute(&m, 10);
        for id in 0..3 {
            assert!((pr.get(id) - 1.0 / 3.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_popular_entity_ranks_higher() {
        let m = GraphBuilder::build(
            vec![
                EdgeRecord::new(0, vec![3], vec![1]),
                EdgeRecord::new(1, vec![3], vec![1]),
                EdgeRecord::new(2, vec![3], vec![1]),
            ],
            GraphConfig::default(),
        )
        .unwrap();
        let pr = PageRank::compute(&m, DEFAULT_ITERATIONS);
        assert!(pr.get(3) > pr.get(0));
    }

    #[test]
    fn test_fallback_for_unknown_ids() {
        let pr = PageRank::compute(&triangle_with_dangling(), DEFAULT_ITERATIONS);
        assert_eq!(pr.get(4), 0.01 / 4.0);
        assert_eq!(pr.get(u32::MAX), 0.01 / 4.0);
        assert_eq!(PageRank::default().get(7), 0.01);
    }

    #[test]
    fn test_empty_matrix() {
        let m = GraphBuilder::build(Vec::<Result<EdgeRecord>>::new(), GraphConfig::default()).unwrap();
        assert!(PageRank::compute(&m, DEFAULT_ITERATIONS).is_empty());
    }

    #[test]
    fn test_save_and_load() {
        let pr = PageRank::compute(&triangle_with_dangling(), 5);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pagerank.bin");
        pr.save(&path).unwrap();
        assert_eq!(PageRank::load(&path).unwrap(), pr);
    }
}
