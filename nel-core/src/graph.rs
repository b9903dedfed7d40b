//! # Grafo de Adjacência do Wikidata
//!
//! Representa o Wikidata como um grafo dirigido e ponderado: existe uma aresta
//! `A -> B` quando alguma declaração (ou qualificador) de `A` aponta para `B`.
//! O peso é a fração das arestas de `A` que vão para `B`, de modo que cada linha
//! da matriz é uma **distribuição de probabilidade** (matriz estocástica por linhas).
//!
//! ```text
//!            Q1    Q2    Q3
//!   Q1  [   0    0.75  0.25 ]   <- 3 arestas para Q2, 1 para Q3
//!   Q2  [   1     0     0   ]
//!   Q3  [   0     0     0   ]   <- nó "pendurado" (dangling): linha vazia
//! ```
//!
//! ## Memória limitada: construção em blocos
//!
//! Com ~10^8 entidades, não dá para acumular a matriz inteira em estruturas
//! temporárias. O [`GraphBuilder`] lê a lista de arestas **ordenada** em uma única
//! passada e fecha um [`SparseBlock`] (formato CSR) a cada `block_size` linhas.
//! Blocos fechados nunca mais são alterados; a [`AdjacencyMatrix`] final apenas
//! os empilha atrás de uma interface somente-leitura.
//!
//! ```text
//!   linhas 0..B      -> SparseBlock #0  (selado)
//!   linhas B..2B     -> SparseBlock #1  (selado)
//!   linhas 2B..N     -> SparseBlock #2  (selado no finish)
//! ```

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::edgelist::{read_records, scan_last_source, EdgeRecord};
use crate::entity::EntityId;
use crate::error::{NelError, Result};
use crate::pagerank::PageRank;

/// Tamanho padrão do bloco de linhas (da ordem de 10^6).
pub const DEFAULT_BLOCK_SIZE: usize = 1_000_000;

/// Parâmetros de construção da matriz.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphConfig {
    /// Número de linhas por bloco CSR.
    pub block_size: usize,
    /// Maior id aceito como alvo. Alvos acima dele são descartados e a matriz
    /// terá exatamente `max_id + 1` linhas (se nenhuma origem passar disso).
    pub max_id: Option<EntityId>,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            max_id: None,
        }
    }
}

/// Um bloco de linhas consecutivas em formato CSR (Compressed Sparse Row).
///
/// A linha local `r` ocupa `indices[indptr[r]..indptr[r+1]]` (colunas) e
/// `data[indptr[r]..indptr[r+1]]` (pesos).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SparseBlock {
    row_offset: usize,
    indptr: Vec<usize>,
    indices: Vec<EntityId>,
    data: Vec<f64>,
}

impl SparseBlock {
    pub fn row_offset(&self) -> usize {
        self.row_offset
    }

    pub fn rows(&self) -> usize {
        self.indptr.len() - 1
    }

    pub fn nnz(&self) -> usize {
        self.data.len()
    }

    fn local_row(&self, local: usize) -> (&[EntityId], &[f64]) {
        let (a, b) = (self.indptr[local], self.indptr[local + 1]);
        (&self.indices[a..b], &self.data[a..b])
    }

    fn check_format(&self, n: usize) -> Result<()> {
        let corrupt = |msg: String| Err(NelError::CorruptSnapshot(msg));
        if self.indptr.first() != Some(&0) {
            return corrupt(format!("bloco {}: indptr não começa em 0", self.row_offset));
        }
        if self.indptr.windows(2).any(|w| w[0] > w[1]) {
            return corrupt(format!("bloco {}: indptr decrescente", self.row_offset));
        }
        if self.indptr.last() != Some(&self.data.len()) || self.indices.len() != self.data.len() {
            return corrupt(format!("bloco {}: tamanhos inconsistentes", self.row_offset));
        }
        if self.indices.iter().any(|&c| c as usize >= n) {
            return corrupt(format!("bloco {}: coluna fora da matriz", self.row_offset));
        }
        if self.data.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return corrupt(format!("bloco {}: peso inválido", self.row_offset));
        }
        Ok(())
    }
}

/// Bloco em construção: só recebe linhas no final, depois é selado.
struct BlockAccumulator {
    row_offset: usize,
    indptr: Vec<usize>,
    indices: Vec<EntityId>,
    data: Vec<f64>,
}

impl BlockAccumulator {
    fn new(row_offset: usize) -> Self {
        Self {
            row_offset,
            indptr: vec![0],
            indices: Vec::new(),
            data: Vec::new(),
        }
    }

    fn rows(&self) -> usize {
        self.indptr.len() - 1
    }

    fn push_row(&mut self, targets: &[EntityId], weights: &[f64]) {
        self.indices.extend_from_slice(targets);
        self.data.extend_from_slice(weights);
        self.indptr.push(self.data.len());
    }

    fn seal(self) -> SparseBlock {
        SparseBlock {
            row_offset: self.row_offset,
            indptr: self.indptr,
            indices: self.indices,
            data: self.data,
        }
    }
}

/// Construtor da matriz de adjacência a partir da lista de arestas ordenada.
///
/// O construtor é consumido por [`GraphBuilder::finish`]; se [`GraphBuilder::push`]
/// falhar, basta descartá-lo: nenhuma matriz parcial fica visível.
pub struct GraphBuilder {
    config: GraphConfig,
    sealed: Vec<SparseBlock>,
    current: BlockAccumulator,
    last_source: Option<EntityId>,
    max_target: Option<EntityId>,
}

impl GraphBuilder {
    pub fn new(config: GraphConfig) -> Self {
        Self {
            config: GraphConfig {
                block_size: config.block_size.max(1),
                ..config
            },
            sealed: Vec::new(),
            current: BlockAccumulator::new(0),
            last_source: None,
            max_target: None,
        }
    }

    /// Próxima linha a ser escrita (= número de linhas já emitidas).
    fn next_row(&self) -> usize {
        self.current.row_offset + self.current.rows()
    }

    fn seal_if_full(&mut self) {
        if self.current.rows() >= self.config.block_size {
            let offset = self.next_row();
            let full = std::mem::replace(&mut self.current, BlockAccumulator::new(offset));
            debug!(row_offset = full.row_offset, rows = full.rows(), "bloco selado");
            self.sealed.push(full.seal());
        }
    }

    fn push_empty_rows_until(&mut self, row: usize) {
        while self.next_row() < row {
            self.current.push_row(&[], &[]);
            self.seal_if_full();
        }
    }

    /// Adiciona as arestas de uma origem. As origens devem chegar em ordem
    /// estritamente crescente; linhas sem registro viram linhas vazias.
    pub fn push(&mut self, record: EdgeRecord) -> Result<()> {
        if let Some(prev) = self.last_source {
            if record.source <= prev {
                return Err(NelError::OutOfOrderInput {
                    previous: prev,
                    found: record.source,
                });
            }
        }
        if record.targets.len() != record.counts.len() {
            return Err(NelError::LengthMismatch {
                expected: record.targets.len(),
                found: record.counts.len(),
            });
        }
        self.last_source = Some(record.source);
        self.push_empty_rows_until(record.source as usize);

        let bound = self.config.max_id;
        let kept: Vec<(EntityId, u32)> = record
            .targets
            .iter()
            .zip(record.counts.iter())
            .filter(|(&t, &c)| c > 0 && bound.map_or(true, |b| t <= b))
            .map(|(&t, &c)| (t, c))
            .collect();

        let total: f64 = kept.iter().map(|(_, c)| *c as f64).sum();
        let targets: Vec<EntityId> = kept.iter().map(|(t, _)| *t).collect();
        let weights: Vec<f64> = kept.iter().map(|(_, c)| *c as f64 / total).collect();

        if let Some(&m) = targets.iter().max() {
            self.max_target = Some(self.max_target.map_or(m, |cur| cur.max(m)));
        }
        self.current.push_row(&targets, &weights);
        self.seal_if_full();
        Ok(())
    }

    /// Fecha o último bloco e empilha todos os blocos na matriz final.
    pub fn finish(mut self) -> AdjacencyMatrix {
        let mut n = self.next_row();
        if let Some(b) = self.config.max_id {
            n = n.max(b as usize + 1);
        }
        if let Some(t) = self.max_target {
            n = n.max(t as usize + 1);
        }
        self.push_empty_rows_until(n);
        if self.current.rows() > 0 {
            let last = std::mem::replace(&mut self.current, BlockAccumulator::new(n));
            self.sealed.push(last.seal());
        }

        let matrix = AdjacencyMatrix {
            n,
            blocks: self.sealed,
        };
        info!(n = matrix.n, nnz = matrix.nnz(), blocks = matrix.blocks.len(), "matriz de adjacência construída");
        matrix
    }

    /// Constrói a matriz consumindo um fluxo de registros.
    pub fn build<I>(records: I, config: GraphConfig) -> Result<AdjacencyMatrix>
    where
        I: IntoIterator<Item = Result<EdgeRecord>>,
    {
        let mut builder = Self::new(config);
        for record in records {
            builder.push(record?)?;
        }
        Ok(builder.finish())
    }

    /// Compila um arquivo TSV ordenado em duas passadas: a primeira valida a ordem
    /// e descobre o último id; a segunda monta os blocos.
    pub fn build_from_edge_file(path: impl AsRef<Path>, block_size: usize) -> Result<AdjacencyMatrix> {
        let path = path.as_ref();
        let last = scan_last_source(BufReader::new(File::open(path)?))?;
        info!(?path, last_qid = ?last, "lista de arestas validada");

        let config = GraphConfig {
            block_size,
            max_id: last,
        };
        Self::build(read_records(BufReader::new(File::open(path)?)), config)
    }
}

/// Vetor esparso sobre entidades (usado nos passeios aleatórios locais).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SparseVector {
    entries: BTreeMap<EntityId, f64>,
}

impl SparseVector {
    pub fn unit(id: EntityId) -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(id, 1.0);
        Self { entries }
    }

    pub fn get(&self, id: EntityId) -> f64 {
        self.entries.get(&id).copied().unwrap_or(0.0)
    }

    pub fn sum(&self) -> f64 {
        self.entries.values().sum()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityId, f64)> + '_ {
        self.entries.iter().map(|(&k, &v)| (k, v))
    }

    pub fn dot(&self, other: &SparseVector) -> f64 {
        let (small, large) = if self.len() <= other.len() { (self, other) } else { (other, self) };
        small.iter().map(|(k, v)| v * large.get(k)).sum()
    }

    fn scale(&mut self, factor: f64) {
        for v in self.entries.values_mut() {
            *v *= factor;
        }
    }

    fn add_scaled(&mut self, other: &SparseVector, factor: f64) {
        for (k, v) in other.iter() {
            *self.entries.entry(k).or_insert(0.0) += factor * v;
        }
    }
}

/// Matriz de adjacência composta de blocos selados. Somente leitura.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjacencyMatrix {
    n: usize,
    blocks: Vec<SparseBlock>,
}

impl AdjacencyMatrix {
    /// Número de linhas (e colunas).
    pub fn n(&self) -> usize {
        self.n
    }

    pub fn nnz(&self) -> usize {
        self.blocks.iter().map(SparseBlock::nnz).sum()
    }

    pub fn blocks(&self) -> &[SparseBlock] {
        &self.blocks
    }

    /// Arestas de saída de uma entidade: `(alvos, pesos)`. `None` fora da matriz.
    pub fn row(&self, id: EntityId) -> Option<(&[EntityId], &[f64])> {
        let row = id as usize;
        if row >= self.n {
            return None;
        }
        let idx = self.blocks.partition_point(|b| b.row_offset + b.rows() <= row);
        let block = self.blocks.get(idx)?;
        Some(block.local_row(row - block.row_offset))
    }

    pub fn row_sum(&self, id: EntityId) -> f64 {
        self.row(id).map(|(_, w)| w.iter().sum()).unwrap_or(0.0)
    }

    pub fn out_degree(&self, id: EntityId) -> usize {
        self.row(id).map(|(t, _)| t.len()).unwrap_or(0)
    }

    /// Produto vetor-linha por matriz: `(v·M)[t] = Σ_s v[s]·M[s][t]`.
    pub fn left_multiply(&self, v: &[f64]) -> Result<Vec<f64>> {
        if v.len() != self.n {
            return Err(NelError::LengthMismatch {
                expected: self.n,
                found: v.len(),
            });
        }
        Ok(self.propagate(v))
    }

    /// Mesmo que [`Self::left_multiply`], sem verificar o tamanho de `v`.
    pub(crate) fn propagate(&self, v: &[f64]) -> Vec<f64> {
        let mut out = vec![0.0; self.n];
        for block in &self.blocks {
            for local in 0..block.rows() {
                let mass = v[block.row_offset + local];
                if mass == 0.0 {
                    continue;
                }
                let (targets, weights) = block.local_row(local);
                for (&t, &w) in targets.iter().zip(weights) {
                    out[t as usize] += mass * w;
                }
            }
        }
        out
    }

    fn sparse_left_multiply(&self, v: &SparseVector) -> SparseVector {
        let mut out = SparseVector::default();
        for (source, mass) in v.iter() {
            if let Some((targets, weights)) = self.row(source) {
                for (&t, &w) in targets.iter().zip(weights) {
                    *out.entries.entry(t).or_insert(0.0) += mass * w;
                }
            }
        }
        out
    }

    /// Vetor de vizinhança de uma entidade: passeio aleatório com reinício.
    ///
    /// A cada passo:
    /// 1. `w = v·M` (um passo do passeio);
    /// 2. se `w` não tem massa (só nós pendurados), devolve `v` como está;
    /// 3. `v = β·semente + (1−β)·w/|w|`.
    pub fn neighbor_vector(&self, id: EntityId, steps: usize, restart_probability: f64) -> SparseVector {
        let seed = SparseVector::unit(id);
        let mut v = seed.clone();
        for _ in 0..steps {
            let mut walked = self.sparse_left_multiply(&v);
            let mass = walked.sum();
            if mass == 0.0 {
                return v;
            }
            walked.scale((1.0 - restart_probability) / mass);
            walked.add_scaled(&seed, restart_probability);
            v = walked;
        }
        v
    }

    /// Proximidade tópica entre duas entidades: produto escalar dos vetores de vizinhança.
    pub fn similarity(&self, a: EntityId, b: EntityId, steps: usize, restart_probability: f64) -> f64 {
        let va = self.neighbor_vector(a, steps, restart_probability);
        let vb = self.neighbor_vector(b, steps, restart_probability);
        va.dot(&vb)
    }

    /// Validação estrutural (usada ao carregar snapshots).
    pub fn check_format(&self) -> Result<()> {
        let mut expected_offset = 0;
        for block in &self.blocks {
            if block.row_offset != expected_offset {
                return Err(NelError::CorruptSnapshot(format!(
                    "bloco começa na linha {} mas deveria começar em {}",
                    block.row_offset, expected_offset
                )));
            }
            block.check_format(self.n)?;
            expected_offset += block.rows();
        }
        if expected_offset != self.n {
            return Err(NelError::CorruptSnapshot(format!(
                "blocos cobrem {expected_offset} linhas de {}",
                self.n
            )));
        }
        Ok(())
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let writer = BufWriter::new(File::create(path)?);
        bincode::serialize_into(writer, self)?;
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let matrix: Self = bincode::deserialize_from(reader)?;
        matrix.check_format()?;
        Ok(matrix)
    }
}

/// Ponto de acesso único ao grafo em um processo servidor.
///
/// Um servidor de anotação normalmente carrega só o PageRank; a matriz é opcional
/// e habilita a similaridade por vizinhança.
#[derive(Debug, Clone)]
pub struct GraphStore {
    matrix: Option<AdjacencyMatrix>,
    pagerank: PageRank,
}

impl GraphStore {
    /// Calcula o PageRank da matriz e guarda ambos.
    pub fn from_matrix(matrix: AdjacencyMatrix, iterations: usize) -> Self {
        let pagerank = PageRank::compute(&matrix, iterations);
        Self {
            matrix: Some(matrix),
            pagerank,
        }
    }

    pub fn from_pagerank(pagerank: PageRank) -> Self {
        Self { matrix: None, pagerank }
    }

    pub fn new(matrix: Option<AdjacencyMatrix>, pagerank: PageRank) -> Self {
        Self { matrix, pagerank }
    }

    /// Carrega os snapshots gerados offline.
    pub fn load(matrix_path: Option<&Path>, pagerank_path: &Path) -> Result<Self> {
        let pagerank = PageRank::load(pagerank_path)?;
        let matrix = matrix_path.map(AdjacencyMatrix::load).transpose()?;
        info!(n = pagerank.len(), with_matrix = matrix.is_some(), "grafo carregado");
        Ok(Self { matrix, pagerank })
    }

    pub fn matrix(&self) -> Option<&AdjacencyMatrix> {
        self.matrix.as_ref()
    }

    pub fn pagerank(&self) -> &PageRank {
        &self.pagerank
    }

    pub fn get_pagerank(&self, id: EntityId) -> f64 {
        self.pagerank.get(id)
    }

    /// `None` se a matriz não foi carregada.
    pub fn similarity(&self, a: EntityId, b: EntityId, steps: usize, restart_probability: f64) -> Option<f64> {
        self.matrix
            .as_ref()
            .map(|m| m.similarity(a, b, steps, restart_probability))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(source: EntityId, targets: &[EntityId], counts: &[u32]) -> Result<EdgeRecord> {
        EdgeRecord::new(source, targets.to_vec(), counts.to_vec())
    }

    fn small_matrix(block_size: usize) -> AdjacencyMatrix {
        GraphBuilder::build(
            vec![
                rec(1, &[2, 3], &[3, 1]),
                rec(2, &[1], &[1]),
                rec(4, &[1, 2, 3], &[1, 1, 2]),
            ],
            GraphConfig { block_size, max_id: None },
        )
        .unwrap()
    }

    #[test]
    fn test_rows_are_stochastic() {
        let m = small_matrix(2);
        assert_eq!(m.n(), 5);
        for id in 0..5 {
            let s = m.row_sum(id);
            if m.out_degree(id) > 0 {
                assert!((s - 1.0).abs() < 1e-12, "linha {id} soma {s}");
            } else {
                assert_eq!(s, 0.0);
            }
        }
        let (targets, weights) = m.row(1).unwrap();
        assert_eq!(targets, &[2, 3]);
        assert_eq!(weights, &[0.75, 0.25]);
        assert_eq!(m.out_degree(0), 0);
        assert_eq!(m.out_degree(3), 0);
    }

    #[test]
    fn test_blocks_do_not_change_content() {
        let a = small_matrix(1);
        let b = small_matrix(1000);
        assert_eq!(a.blocks().len(), 5);
        assert_eq!(b.blocks().len(), 1);
        for id in 0..5 {
            assert_eq!(a.row(id), b.row(id));
        }
        a.check_format().unwrap();
        b.check_format().unwrap();
    }

    #[test]
    fn test_out_of_order_input_is_rejected() {
        let result = GraphBuilder::build(
            vec![rec(5, &[1], &[1]), rec(3, &[1], &[1])],
            GraphConfig::default(),
        );
        assert!(matches!(
            result,
            Err(NelError::OutOfOrderInput { previous: 5, found: 3 })
        ));

        let duplicated = GraphBuilder::build(
            vec![rec(5, &[1], &[1]), rec(5, &[2], &[1])],
            GraphConfig::default(),
        );
        assert!(matches!(duplicated, Err(NelError::OutOfOrderInput { .. })));
    }

    #[test]
    fn test_max_id_drops_targets_beyond_bound() {
        let m = GraphBuilder::build(
            vec![rec(0, &[1, 99], &[1, 1]), rec(2, &[0], &[4])],
            GraphConfig { block_size: 10, max_id: Some(2) },
        )
        .unwrap();
        assert_eq!(m.n(), 3);
        let (targets, weights) = m.row(0).unwrap();
        assert_eq!(targets, &[1]);
        assert_eq!(weights, &[1.0]);
    }

    #[test]
    fn test_targets_extend_dimension_without_bound() {
        let m = GraphBuilder::build(vec![rec(0, &[7], &[1])], GraphConfig::default()).unwrap();
        assert_eq!(m.n(), 8);
        assert_eq!(m.row_sum(7), 0.0);
    }

    #[test]
    fn test_zero_counts_make_empty_row() {
        let m = GraphBuilder::build(vec![rec(0, &[1], &[0]), rec(1, &[0], &[2])], GraphConfig::default()).unwrap();
        assert_eq!(m.out_degree(0), 0);
        assert_eq!(m.row_sum(1), 1.0);
    }

    #[test]
    fn test_left_multiply_conserves_mass_on_non_dangling() {
        let m = small_matrix(2);
        let v = vec![0.0, 0.5, 0.5, 0.0, 0.0];
        let out = m.left_multiply(&v).unwrap();
        assert!((out.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!((out[1] - 0.5).abs() < 1e-12);
        assert!(m.left_multiply(&[1.0]).is_err());
    }

    #[test]
    fn test_neighbor_vector() {
        let m = small_matrix(2);
        let v = m.neighbor_vector(1, 1, 0.5);
        assert!((v.get(1) - 0.5).abs() < 1e-12);
        assert!((v.get(2) - 0.375).abs() < 1e-12);
        assert!((v.get(3) - 0.125).abs() < 1e-12);

        // Q3 é pendurado: o vetor volta à semente
        let dangling = m.neighbor_vector(3, 3, 0.5);
        assert_eq!(dangling, SparseVector::unit(3));

        // Fora da matriz: também a semente
        assert_eq!(m.neighbor_vector(1000, 3, 0.5), SparseVector::unit(1000));
    }

    #[test]
    fn test_similarity_prefers_connected_entities() {
        let m = small_matrix(2);
        let close = m.similarity(1, 2, 3, 0.5);
        let far = m.similarity(1, 0, 3, 0.5);
        assert!(close > far);
        assert_eq!(far, 0.0);
    }

    #[test]
    fn test_snapshot_roundtrip() {
        let m = small_matrix(2);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.bin");
        m.save(&path).unwrap();
        assert_eq!(AdjacencyMatrix::load(&path).unwrap(), m);
    }

    #[test]
    fn test_build_from_edge_file() {
        use std::io::Write;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("edges.tsv");
        let mut f = File::create(&path).unwrap();
        writeln!(f, "1\t[2,3,50]\t[1,1,2]").unwrap();
        writeln!(f, "3\t[1]\t[1]").unwrap();
        drop(f);

        let m = GraphBuilder::build_from_edge_file(&path, 2).unwrap();
        // Q50 está além da última origem (Q3) e é descartado
        assert_eq!(m.n(), 4);
        assert_eq!(m.row(1).unwrap().0, &[2, 3]);

        let unsorted = dir.path().join("unsorted.tsv");
        let mut f = File::create(&unsorted).unwrap();
        writeln!(f, "3\t[1]\t[1]").unwrap();
        writeln!(f, "1\t[2]\t[1]").unwrap();
        drop(f);
        assert!(matches!(
            GraphBuilder::build_from_edge_file(&unsorted, 2),
            Err(NelError::OutOfOrderInput { .. })
        ));
    }

    #[test]
    fn test_graph_store_fallbacks() {
        let store = GraphStore::from_matrix(small_matrix(2), 32);
        assert_eq!(store.get_pagerank(5), 0.01 / 5.0);
        assert!(store.similarity(1, 2, 3, 0.5).is_some());

        let only_ranks = GraphStore::from_pagerank(store.pagerank().clone());
        assert!(only_ranks.similarity(1, 2, 3, 0.5).is_none());
        assert!(only_ranks.matrix().is_none());
    }
}
