//! # Pipeline de Ligação de Entidades — Orquestrador com Eventos Observáveis
//!
//! O pipeline coordena os módulos (grafo de menções, difusão, classificador) para
//! um documento já passado pelo tagger externo, e emite eventos em cada passo via
//! um canal Rust (`mpsc`), permitindo que o servidor mostre o "raciocínio" do
//! modelo além do resultado final.
//!
//! Os recursos (PageRank, modelo de linguagem, classificador) são carregados uma
//! vez e só lidos depois: `annotate` é uma função pura de `(documento, recursos)`.

use std::sync::mpsc;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::classifier::DisambiguationClassifier;
use crate::entity::EntityId;
use crate::graph::GraphStore;
use crate::language_model::PhraseModel;
use crate::linker::{BuilderConfig, MentionGraphBuilder, TaggedDocument};
use crate::mention::Mention;

/// Eventos emitidos pelo pipeline durante o processamento.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PipelineEvent {
    /// **Passo 1**: menções montadas a partir dos candidatos do tagger.
    MentionsBuilt {
        mentions: usize,
        tags: usize,
        /// Candidatos descartados pela poda (palavras curtas em minúsculas).
        pruned: usize,
    },
    /// **Passo 2**: decisão do classificador para uma menção.
    MentionResolved {
        start: usize,
        end: usize,
        phrase: String,
        best_entity_id: Option<EntityId>,
        best_score: Option<f64>,
    },
    /// Nenhum classificador carregado: as menções saem só com rank e similaridades.
    ClassificationSkipped,
    /// **Conclusão**: menções anotadas e tempo total.
    Done {
        annotations: Vec<Mention>,
        processing_ms: u64,
    },
}

/// O pipeline de anotação.
///
/// # Modos de Uso
/// - **Sync**: método `annotate` para scripts, testes e o servidor HTTP.
/// - **Streaming**: método `annotate_streaming` para acompanhar cada etapa.
pub struct NelPipeline {
    graph: GraphStore,
    phrase_model: Box<dyn PhraseModel>,
    config: BuilderConfig,
    classifier: Option<DisambiguationClassifier>,
}

impl NelPipeline {
    pub fn new(graph: GraphStore, phrase_model: Box<dyn PhraseModel>, config: BuilderConfig) -> Self {
        Self {
            graph,
            phrase_model,
            config,
            classifier: None,
        }
    }

    pub fn with_classifier(mut self, classifier: DisambiguationClassifier) -> Self {
        self.classifier = Some(classifier);
        self
    }

    pub fn graph(&self) -> &GraphStore {
        &self.graph
    }

    pub fn classifier(&self) -> Option<&DisambiguationClassifier> {
        self.classifier.as_ref()
    }

    /// Só monta as menções (rank + similaridades), sem classificar.
    pub fn build_mentions(&self, document: &TaggedDocument) -> Vec<Mention> {
        MentionGraphBuilder::new(self.graph.pagerank(), self.phrase_model.as_ref(), self.config).build(document)
    }

    /// Processa o documento de forma síncrona e retorna as menções anotadas.
    pub fn annotate(&self, document: &TaggedDocument) -> Vec<Mention> {
        let (tx, rx) = mpsc::channel();
        self.annotate_streaming(document, tx);

        let mut annotations = Vec::new();
        // Consome todos os eventos até o fim
        while let Ok(event) = rx.recv() {
            if let PipelineEvent::Done { annotations: done, .. } = event {
                annotations = done;
            }
        }
        annotations
    }

    /// Executa o pipeline enviando eventos de progresso.
    ///
    /// # Fluxo de Eventos
    /// 1. `MentionsBuilt`: menções e candidatos ranqueados.
    /// 2. `MentionResolved` (Loop) ou `ClassificationSkipped`.
    /// 3. `Done`: resultado final consolidado.
    pub fn annotate_streaming(&self, document: &TaggedDocument, tx: mpsc::Sender<PipelineEvent>) {
        let start = Instant::now();

        // === Passo 1: Grafo de menções ===
        let mut mentions = self.build_mentions(document);
        let _ = tx.send(PipelineEvent::MentionsBuilt {
            mentions: mentions.len(),
            tags: mentions.iter().map(|m| m.tags.len()).sum(),
            pruned: document.candidates.len() - mentions.len(),
        });

        // === Passo 2: Classificação ===
        match &self.classifier {
            Some(classifier) => {
                classifier.classify(&mut mentions);
                for mention in &mentions {
                    let _ = tx.send(PipelineEvent::MentionResolved {
                        start: mention.start,
                        end: mention.end,
                        phrase: mention.phrase.clone(),
                        best_entity_id: mention.best_entity_id,
                        best_score: mention.best_tag().and_then(|t| t.score),
                    });
                }
            }
            None => {
                let _ = tx.send(PipelineEvent::ClassificationSkipped);
            }
        }

        let _ = tx.send(PipelineEvent::Done {
            annotations: mentions,
            processing_ms: start.elapsed().as_millis() as u64,
        });
    }
}
