//! # Classificador de Desambiguação
//!
//! Junta as peças: similaridades locais → difusão de features → padronização →
//! SVM linear. Para cada menção, escolhe **no máximo uma** entidade: a tag de maior
//! score, se esse score for positivo.
//!
//! ## Ciclo de vida
//!
//! ```text
//!   (nenhum valor)  ──train()──▶  DisambiguationClassifier  ──train()──▶ ...
//!                                        │
//!                                        ├── classify(mentions)
//!                                        ├── evaluate(docs) → Metrics
//!                                        └── save / load
//! ```
//!
//! Não existe classificador "vazio": treinar é o construtor.
//!
//! ## Validação cruzada
//!
//! [`cross_validate`] testa uma grade de [`HyperparameterConfig`]s com k folds
//! (documento `i` vai para o fold `i mod k`) e retreina a melhor configuração no
//! corpus inteiro.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::diffusion::{DiffusionMode, FeatureDiffusionEngine};
use crate::entity::EntityId;
use crate::error::{NelError, Result};
use crate::linker::{compute_similarities, SimilarityConfig};
use crate::mention::{Mention, TagKey};
use crate::similarity::SimilarityMeasure;
use crate::svm::{LinearSvm, StandardScaler, SvmParams};

pub const DEFAULT_FOLDS: usize = 5;

/// Todos os hiperparâmetros do classificador. Imutável: cada treino recebe o seu.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HyperparameterConfig {
    pub similarity: SimilarityMeasure,
    pub max_similarity_distance: f64,
    pub similarity_smoothing: f64,
    pub mode: DiffusionMode,
    pub nb_steps: usize,
    pub alpha: f64,
    /// Inverso da força de regularização do SVM.
    pub c: f64,
    pub max_iter: usize,
}

impl Default for HyperparameterConfig {
    fn default() -> Self {
        Self {
            similarity: SimilarityMeasure::DirectLink,
            max_similarity_distance: 100.0,
            similarity_smoothing: 0.1,
            mode: DiffusionMode::Markov,
            nb_steps: 2,
            alpha: 0.85,
            c: 0.001,
            max_iter: 100,
        }
    }
}

impl HyperparameterConfig {
    pub fn similarity_config(&self) -> SimilarityConfig {
        SimilarityConfig {
            measure: self.similarity,
            max_distance: self.max_similarity_distance,
            smoothing: self.similarity_smoothing,
        }
    }

    pub fn diffusion(&self) -> FeatureDiffusionEngine {
        FeatureDiffusionEngine::new(self.mode, self.nb_steps, self.alpha)
    }

    fn svm_params(&self) -> SvmParams {
        SvmParams {
            c: self.c,
            max_iter: self.max_iter,
            ..SvmParams::default()
        }
    }
}

/// Julgamento humano sobre uma menção: qual entidade é a correta (ou nenhuma).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Judgment {
    pub start: usize,
    pub end: usize,
    pub entity: Option<EntityId>,
}

/// Documento de treino: menções vindas do tagger + julgamentos.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledDocument {
    pub id: String,
    pub mentions: Vec<Mention>,
    pub judgments: Vec<Judgment>,
}

impl LabeledDocument {
    /// Entidade correta por trecho, apenas para julgamentos positivos.
    fn expected_entities(&self) -> HashMap<(usize, usize), EntityId> {
        self.judgments
            .iter()
            .filter_map(|j| j.entity.map(|e| ((j.start, j.end), e)))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

impl Metrics {
    pub fn from_counts(valid_predictions: usize, predictions: usize, judgments: usize) -> Self {
        let precision = if predictions > 0 {
            valid_predictions as f64 / predictions as f64
        } else {
            1.0
        };
        let recall = if judgments > 0 {
            valid_predictions as f64 / judgments as f64
        } else {
            1.0
        };
        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };
        Self { precision, recall, f1 }
    }

    fn mean(all: &[Metrics]) -> Self {
        let n = all.len().max(1) as f64;
        Self {
            precision: all.iter().map(|m| m.precision).sum::<f64>() / n,
            recall: all.iter().map(|m| m.recall).sum::<f64>() / n,
            f1: all.iter().map(|m| m.f1).sum::<f64>() / n,
        }
    }
}

/// Escalonador + SVM treinados com uma configuração.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisambiguationClassifier {
    config: HyperparameterConfig,
    scaler: StandardScaler,
    svm: LinearSvm,
}

/// Linhas de features e rótulos de um documento, com as similaridades recalculadas.
fn training_rows(doc: &LabeledDocument, config: &HyperparameterConfig) -> (Vec<Vec<f64>>, Vec<bool>) {
    let mut mentions = doc.mentions.clone();
    compute_similarities(&mut mentions, &config.similarity_config());
    let features = config.diffusion().diffuse(&mentions);
    let expected = doc.expected_entities();

    let mut rows = Vec::with_capacity(features.len());
    let mut labels = Vec::with_capacity(features.len());
    for (key, row) in features.keys().iter().zip(features.rows()) {
        rows.push(row.clone());
        labels.push(expected.get(&(key.start, key.end)) == Some(&key.id));
    }
    (rows, labels)
}

impl DisambiguationClassifier {
    /// Treina em um conjunto de documentos. Falha com `NoPositiveSamples` se
    /// nenhuma tag casar com um julgamento positivo.
    pub fn train(documents: &[LabeledDocument], config: HyperparameterConfig) -> Result<Self> {
        let per_doc: Vec<(Vec<Vec<f64>>, Vec<bool>)> = documents
            .par_iter()
            .map(|doc| training_rows(doc, &config))
            .collect();

        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for (r, l) in per_doc {
            rows.extend(r);
            labels.extend(l);
        }
        let positives = labels.iter().filter(|&&l| l).count();
        if positives == 0 {
            return Err(NelError::NoPositiveSamples);
        }

        let scaler = StandardScaler::fit(&rows);
        let scaled: Vec<Vec<f64>> = rows.iter().map(|r| scaler.transform(r)).collect();
        let svm = LinearSvm::fit(&scaled, &labels, &config.svm_params())?;
        info!(
            documents = documents.len(),
            samples = labels.len(),
            positives,
            "classificador treinado"
        );
        Ok(Self { config, scaler, svm })
    }

    pub fn config(&self) -> &HyperparameterConfig {
        &self.config
    }

    pub fn feature_width(&self) -> usize {
        self.scaler.width()
    }

    fn score(&self, row: &[f64]) -> f64 {
        self.svm.decision_function(&self.scaler.transform(row))
    }

    /// Pontua todas as tags e escolhe a melhor de cada menção.
    ///
    /// Recalcula as similaridades com a configuração do modelo, então chamar duas
    /// vezes dá o mesmo resultado.
    pub fn classify(&self, mentions: &mut [Mention]) {
        compute_similarities(mentions, &self.config.similarity_config());
        let features = self.config.diffusion().diffuse(mentions);

        let mut nb_tags = 0;
        for mention in mentions.iter_mut() {
            let mut best: Option<(EntityId, f64)> = None;
            for tag in mention.tags.iter_mut() {
                nb_tags += 1;
                let key = TagKey::new(mention.start, mention.end, tag.id);
                let score = features.get(&key).map_or(f64::NEG_INFINITY, |row| self.score(row));
                tag.score = Some(score);
                if score > best.map_or(0.0, |(_, s)| s) {
                    best = Some((tag.id, score));
                }
            }
            mention.best_entity_id = best.map(|(id, _)| id);
            for tag in mention.tags.iter_mut() {
                tag.valid = Some(Some(tag.id) == mention.best_entity_id);
            }
        }
        debug!(nb_tags, "menções classificadas");
    }

    /// Precisão, revocação e F1 contra os julgamentos. Os documentos não são alterados.
    pub fn evaluate(&self, documents: &[LabeledDocument]) -> Metrics {
        let (valid, predictions, judgments) = documents
            .par_iter()
            .map(|doc| {
                let mut mentions = doc.mentions.clone();
                self.classify(&mut mentions);
                let expected = doc.expected_entities();

                let mut valid = 0;
                let mut predictions = 0;
                for mention in &mentions {
                    let Some(best) = mention.best_entity_id else {
                        continue;
                    };
                    predictions += 1;
                    if expected.get(&mention.key()) == Some(&best) {
                        valid += 1;
                    }
                }
                (valid, predictions, expected.len())
            })
            .reduce(|| (0, 0, 0), |a, b| (a.0 + b.0, a.1 + b.1, a.2 + b.2));

        Metrics::from_counts(valid, predictions, judgments)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let writer = BufWriter::new(File::create(path)?);
        bincode::serialize_into(writer, self)?;
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let classifier: Self = bincode::deserialize_from(reader)?;
        let expected = classifier.config.diffusion().feature_width();
        if classifier.scaler.width() != expected || classifier.svm.weights().len() != expected {
            return Err(NelError::CorruptSnapshot(format!(
                "classificador com {} features, configuração espera {expected}",
                classifier.svm.weights().len()
            )));
        }
        Ok(classifier)
    }
}

/// Resultado de uma configuração na validação cruzada.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingReport {
    pub config: HyperparameterConfig,
    /// `None` quando algum fold não tinha amostras positivas.
    pub metrics: Option<Metrics>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CrossValidationReport {
    pub settings: Vec<SettingReport>,
    pub best_config: Option<HyperparameterConfig>,
    pub best_f1: f64,
    /// Melhor configuração retreinada no corpus inteiro.
    pub model: Option<DisambiguationClassifier>,
}

/// Divide os documentos em `k` folds, o documento `i` no fold `i mod k`.
pub fn split_folds(n: usize, k: usize) -> Vec<Vec<usize>> {
    let k = k.max(1);
    let mut folds = vec![Vec::new(); k];
    for i in 0..n {
        folds[i % k].push(i);
    }
    folds
}

fn evaluate_setting(documents: &[LabeledDocument], folds: &[Vec<usize>], config: HyperparameterConfig) -> Result<Metrics> {
    let per_fold: Vec<Result<Metrics>> = folds
        .par_iter()
        .filter(|fold| !fold.is_empty())
        .map(|fold| {
            let (train, test): (Vec<_>, Vec<_>) = documents
                .iter()
                .enumerate()
                .partition(|(i, _)| !fold.contains(i));
            let train: Vec<LabeledDocument> = train.into_iter().map(|(_, d)| d.clone()).collect();
            let test: Vec<LabeledDocument> = test.into_iter().map(|(_, d)| d.clone()).collect();
            let classifier = DisambiguationClassifier::train(&train, config)?;
            Ok(classifier.evaluate(&test))
        })
        .collect();
    let metrics = per_fold.into_iter().collect::<Result<Vec<_>>>()?;
    Ok(Metrics::mean(&metrics))
}

/// Busca em grade com validação cruzada em `k` folds.
///
/// A melhor configuração é a de maior F1 médio (estritamente maior que a anterior,
/// começando de 0). Configurações sem amostras positivas em algum fold são puladas.
pub fn cross_validate(documents: &[LabeledDocument], grid: &[HyperparameterConfig], k: usize) -> Result<CrossValidationReport> {
    let folds = split_folds(documents.len(), k);
    info!(
        folds = ?folds.iter().map(Vec::len).collect::<Vec<_>>(),
        settings = grid.len(),
        "validação cruzada"
    );

    let mut settings = Vec::with_capacity(grid.len());
    let mut best_config = None;
    let mut best_f1 = 0.0;

    for (idx, config) in grid.iter().enumerate() {
        let metrics = match evaluate_setting(documents, &folds, *config) {
            Ok(m) => Some(m),
            Err(NelError::NoPositiveSamples) => {
                warn!(setting = idx, ?config, "configuração pulada: fold sem amostras positivas");
                None
            }
            Err(e) => return Err(e),
        };
        if let Some(m) = metrics {
            info!(setting = idx, precision = m.precision, recall = m.recall, f1 = m.f1, "configuração avaliada");
            if m.f1 > best_f1 {
                best_f1 = m.f1;
                best_config = Some(*config);
            }
        }
        settings.push(SettingReport { config: *config, metrics });
    }

    let model = best_config
        .map(|config| DisambiguationClassifier::train(documents, config))
        .transpose()?;
    Ok(CrossValidationReport {
        settings,
        best_config,
        best_f1,
        model,
    })
}

/// Grade padrão de busca: modos, passos, C e α.
pub fn default_grid() -> Vec<HyperparameterConfig> {
    let mut grid = Vec::new();
    for mode in [DiffusionMode::Markov, DiffusionMode::Restarts] {
        for nb_steps in [1, 2, 3, 4] {
            for c in [0.0001, 0.001, 0.01, 0.1, 1.0] {
                for alpha in [0.1, 0.3, 0.6, 0.85, 0.95] {
                    // α só afeta o modo restarts
                    if mode == DiffusionMode::Markov && alpha != 0.85 {
                        continue;
                    }
                    grid.push(HyperparameterConfig {
                        mode,
                        nb_steps,
                        c,
                        alpha,
                        ..HyperparameterConfig::default()
                    });
                }
            }
        }
    }
    grid
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mention::{Similarity, Tag};

    fn tag(id: EntityId, rank: f64, statements: u32, edges: &[EntityId]) -> Tag {
        Tag {
            id,
            label: None,
            aliases: Vec::new(),
            desc: None,
            nb_statements: statements,
            nb_sitelinks: statements / 2,
            edges: edges.to_vec(),
            types: Vec::new(),
            rank,
            similarities: Vec::<Similarity>::new(),
            score: None,
            valid: None,
        }
    }

    /// Documento sintético: a entidade correta é sempre a mais popular.
    fn document(idx: usize) -> LabeledDocument {
        let base = (idx as EntityId) * 10;
        let start = 0;
        let mentions = vec![
            Mention {
                phrase: "Alpha".into(),
                start,
                end: 5,
                log_likelihood: 8.0,
                tags: vec![tag(base + 1, 12.0, 200, &[base + 3]), tag(base + 2, 4.0, 5, &[])],
                best_entity_id: None,
            },
            Mention {
                phrase: "Beta".into(),
                start: 10,
                end: 14,
                log_likelihood: 6.0,
                tags: vec![tag(base + 3, 11.0, 150, &[base + 1]), tag(base + 4, 3.0, 2, &[])],
                best_entity_id: None,
            },
        ];
        LabeledDocument {
            id: format!("doc{idx}"),
            mentions,
            judgments: vec![
                Judgment { start: 0, end: 5, entity: Some(base + 1) },
                Judgment { start: 10, end: 14, entity: Some(base + 3) },
            ],
        }
    }

    fn corpus(n: usize) -> Vec<LabeledDocument> {
        (0..n).map(document).collect()
    }

    fn config() -> HyperparameterConfig {
        HyperparameterConfig {
            c: 1.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_train_and_classify() {
        let docs = corpus(6);
        let clf = DisambiguationClassifier::train(&docs, config()).unwrap();
        assert_eq!(clf.feature_width(), 15);

        let mut mentions = docs[0].mentions.clone();
        clf.classify(&mut mentions);
        assert_eq!(mentions[0].best_entity_id, Some(1));
        assert_eq!(mentions[1].best_entity_id, Some(3));
        assert_eq!(mentions[0].tags[0].valid, Some(true));
        assert_eq!(mentions[0].tags[1].valid, Some(false));
        assert!(mentions.iter().flat_map(|m| &m.tags).all(|t| t.score.is_some()));
    }

    #[test]
    fn test_classify_is_idempotent() {
        let docs = corpus(4);
        let clf = DisambiguationClassifier::train(&docs, config()).unwrap();
        let mut once = docs[1].mentions.clone();
        clf.classify(&mut once);
        let mut twice = once.clone();
        clf.classify(&mut twice);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_no_positive_samples() {
        let mut docs = corpus(3);
        for d in docs.iter_mut() {
            for j in d.judgments.iter_mut() {
                j.entity = None;
            }
        }
        assert!(matches!(
            DisambiguationClassifier::train(&docs, config()),
            Err(NelError::NoPositiveSamples)
        ));
    }

    #[test]
    fn test_evaluate_perfect_corpus() {
        let docs = corpus(6);
        let clf = DisambiguationClassifier::train(&docs, config()).unwrap();
        let metrics = clf.evaluate(&docs);
        assert_eq!(metrics, Metrics { precision: 1.0, recall: 1.0, f1: 1.0 });
    }

    #[test]
    fn test_metrics_from_counts() {
        assert_eq!(Metrics::from_counts(0, 0, 0), Metrics { precision: 1.0, recall: 1.0, f1: 1.0 });
        let m = Metrics::from_counts(1, 2, 4);
        assert_eq!(m.precision, 0.5);
        assert_eq!(m.recall, 0.25);
        assert!((m.f1 - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(Metrics::from_counts(0, 3, 3).f1, 0.0);
    }

    #[test]
    fn test_split_folds_round_robin() {
        let folds = split_folds(7, 3);
        assert_eq!(folds, vec![vec![0, 3, 6], vec![1, 4], vec![2, 5]]);
    }

    #[test]
    fn test_cross_validate_single_setting() {
        let docs = corpus(10);
        let report = cross_validate(&docs, &[config()], DEFAULT_FOLDS).unwrap();
        assert_eq!(report.settings.len(), 1);

        let mut per_fold = Vec::new();
        for fold in split_folds(docs.len(), DEFAULT_FOLDS) {
            let train: Vec<_> = docs.iter().enumerate().filter(|(i, _)| !fold.contains(i)).map(|(_, d)| d.clone()).collect();
            let test: Vec<_> = fold.iter().map(|&i| docs[i].clone()).collect();
            let clf = DisambiguationClassifier::train(&train, config()).unwrap();
            per_fold.push(clf.evaluate(&test));
        }
        let expected = Metrics::mean(&per_fold);
        let got = report.settings[0].metrics.unwrap();
        assert!((got.f1 - expected.f1).abs() < 1e-12);
        assert_eq!(report.best_config, Some(config()));
        assert!(report.model.is_some());
    }

    #[test]
    fn test_cross_validate_skips_settings_without_positives() {
        let mut docs = corpus(5);
        for d in docs.iter_mut() {
            d.judgments.clear();
        }
        let report = cross_validate(&docs, &[config()], DEFAULT_FOLDS).unwrap();
        assert_eq!(report.settings[0].metrics, None);
        assert!(report.best_config.is_none());
        assert!(report.model.is_none());
    }

    #[test]
    fn test_save_and_load() {
        let docs = corpus(4);
        let clf = DisambiguationClassifier::train(&docs, config()).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("classifier.bin");
        clf.save(&path).unwrap();
        assert_eq!(DisambiguationClassifier::load(&path).unwrap(), clf);
    }

    #[test]
    fn test_default_grid() {
        let grid = default_grid();
        assert_eq!(grid.len(), 4 * 5 + 4 * 5 * 5);
        assert!(grid.iter().any(|c| c.mode == DiffusionMode::Restarts && c.alpha == 0.1));
    }
}
