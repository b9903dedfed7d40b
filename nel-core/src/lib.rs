//! # nel-core — Ligação de Entidades ao Grafo do Wikidata
//!
//! Este crate decide, para cada trecho de um texto que casou com rótulos do
//! Wikidata, **qual** entidade o autor quis dizer ("Paris" a cidade, a figura
//! mitológica ou a socialite?). A ideia central é que as entidades corretas de um
//! mesmo documento costumam estar **ligadas no grafo** do Wikidata.
//!
//! ## Arquitetura do Sistema
//!
//! Offline, uma única vez:
//!
//! 1.  **Pré-processamento** ([`item`], [`edgelist`]): cada item do dump vira uma linha
//!     `origem → alvos` de um TSV, ordenado externamente.
//! 2.  **Grafo** ([`graph`]): o TSV ordenado é compilado em blocos CSR e empilhado
//!     em uma matriz de adjacência somente-leitura.
//! 3.  **Popularidade** ([`pagerank`]): PageRank por iteração de potência.
//! 4.  **Modelo de frases** ([`language_model`]): contagem de palavras dos rótulos.
//!
//! Por documento (após o tagger externo):
//!
//! 1.  **Grafo de menções** ([`linker`]): candidatos ranqueados e similaridades
//!     ([`similarity`]) entre candidatos de menções próximas.
//! 2.  **Difusão** ([`diffusion`]): features propagadas pelo grafo de menções.
//! 3.  **Classificação** ([`classifier`], [`svm`]): SVM linear escolhe no máximo uma
//!     entidade por menção.
//!
//! ## Exemplo de Uso
//!
//! ```rust
//! use std::collections::HashMap;
//! use nel_core::{BowLanguageModel, BuilderConfig, GraphStore, NelPipeline, PageRank};
//! use nel_core::linker::{RawCandidate, TaggedDocument};
//!
//! // 1. Recursos carregados uma vez (aqui, um PageRank de brinquedo)
//! let graph = GraphStore::from_pagerank(PageRank::from_scores(vec![0.1; 500]));
//! let pipeline = NelPipeline::new(graph, Box::new(BowLanguageModel::new()), BuilderConfig::default());
//!
//! // 2. Documento vindo do tagger externo
//! let document = TaggedDocument {
//!     text: "Sweden joined the EU".to_string(),
//!     candidates: vec![RawCandidate { start: 0, end: 6, ids: vec![34] }],
//!     items: HashMap::new(),
//! };
//!
//! // 3. Menções com candidatos ranqueados
//! let mentions = pipeline.annotate(&document);
//! assert_eq!(mentions[0].phrase, "Sweden");
//! ```
//!
//! ## Módulos Principais
//!
//! - [`pipeline`]: orquestrador por documento, com eventos observáveis.
//! - [`graph`]: construção em blocos, vetores de vizinhança e snapshots.
//! - [`classifier`]: treino, classificação, avaliação e validação cruzada.
//! - [`dataset`]: leitura e escrita do gold standard.

pub mod classifier;
pub mod dataset;
pub mod diffusion;
pub mod edgelist;
pub mod entity;
pub mod error;
pub mod graph;
pub mod item;
pub mod language_model;
pub mod linker;
pub mod mention;
pub mod pagerank;
pub mod pipeline;
pub mod similarity;
pub mod svm;

pub use classifier::{cross_validate, DisambiguationClassifier, HyperparameterConfig, Metrics};
pub use diffusion::{DiffusionMode, FeatureDiffusionEngine};
pub use entity::EntityId;
pub use error::{NelError, Result};
pub use graph::{AdjacencyMatrix, GraphBuilder, GraphConfig, GraphStore};
pub use language_model::{BowLanguageModel, PhraseModel};
pub use linker::{BuilderConfig, MentionGraphBuilder};
pub use mention::{Mention, Tag, TagKey};
pub use pagerank::PageRank;
pub use pipeline::{NelPipeline, PipelineEvent};
pub use similarity::SimilarityMeasure;
