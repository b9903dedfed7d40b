//! Fluxo completo: itens JSON → lista de arestas → grafo → PageRank → anotação
//! → treino e validação cruzada com o gold standard.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Cursor};

use serde_json::json;

use nel_core::classifier::{default_grid, split_folds, LabeledDocument, DEFAULT_FOLDS};
use nel_core::dataset::GoldStandard;
use nel_core::edgelist::{write_records, EdgeRecord};
use nel_core::item::WikidataItem;
use nel_core::linker::{RawCandidate, TaggedDocument};
use nel_core::{
    cross_validate, AdjacencyMatrix, BowLanguageModel, BuilderConfig, DisambiguationClassifier, GraphBuilder,
    GraphStore, HyperparameterConfig, Metrics, NelError, NelPipeline, PageRank,
};

fn item(id: u32, targets: &[u32], sitelinks: usize) -> WikidataItem {
    let claims: Vec<_> = targets
        .iter()
        .map(|t| json!({"mainsnak": {"datavalue": {"value": {"numeric-id": t, "id": format!("Q{t}")}}}}))
        .collect();
    let sitelinks: serde_json::Map<String, serde_json::Value> =
        (0..sitelinks).map(|i| (format!("wiki{i}"), json!({}))).collect();
    WikidataItem::new(json!({
        "id": format!("Q{id}"),
        "labels": {"en": {"language": "en", "value": format!("Item {id}")}},
        "sitelinks": sitelinks,
        "claims": {"P361": claims},
    }))
}

/// Pequeno mundo: Vanuatu (686), Suécia (34), UE (458), e homônimos pouco ligados.
fn items() -> Vec<WikidataItem> {
    vec![
        item(34, &[458, 458, 6256], 300),
        item(458, &[34, 6256], 250),
        item(686, &[6256], 150),
        item(900, &[], 1),
        item(901, &[6256], 2),
        item(902, &[], 1),
        item(6256, &[], 100),
    ]
}

fn build_store(dir: &std::path::Path) -> (GraphStore, HashMap<u32, nel_core::linker::EntityAttributes>) {
    let mut records: Vec<EdgeRecord> = items().iter().filter_map(WikidataItem::to_edge_record).collect();
    records.sort_by_key(|r| r.source);
    let edges_path = dir.join("edges.tsv");
    let written = write_records(BufWriter::new(File::create(&edges_path).unwrap()), &records).unwrap();
    assert_eq!(written, 4);

    let matrix = GraphBuilder::build_from_edge_file(&edges_path, 1000).unwrap();
    assert_eq!(matrix.n(), 902);
    let matrix_path = dir.join("matrix.bin");
    matrix.save(&matrix_path).unwrap();

    let pagerank = PageRank::compute(&matrix, 32);
    let pagerank_path = dir.join("pagerank.bin");
    pagerank.save(&pagerank_path).unwrap();

    let store = GraphStore::load(Some(matrix_path.as_path()), &pagerank_path).unwrap();
    let attributes = items()
        .iter()
        .filter_map(|i| i.entity_id().map(|id| (id, i.attributes("en"))))
        .collect();
    (store, attributes)
}

fn document(attributes: &HashMap<u32, nel_core::linker::EntityAttributes>) -> TaggedDocument {
    let mut text = String::from("Vanuatu");
    text.push_str(&" ".repeat(113));
    text.push_str("Sweden");
    text.push_str(&" ".repeat(88));
    text.push_str("EU");
    TaggedDocument {
        text,
        candidates: vec![
            RawCandidate { start: 0, end: 7, ids: vec![686] },
            RawCandidate { start: 120, end: 126, ids: vec![34, 900] },
            RawCandidate { start: 214, end: 216, ids: vec![458, 902] },
        ],
        items: attributes.clone(),
    }
}

#[test]
fn test_graph_files_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let (store, _) = build_store(dir.path());
    let matrix: &AdjacencyMatrix = store.matrix().unwrap();
    // 6256 ficou fora da dimensão (maior origem = 901)
    let (targets, weights) = matrix.row(34).unwrap();
    assert_eq!(targets, &[458]);
    assert_eq!(weights, &[1.0]);
    assert!((store.pagerank().sum() - 1.0).abs() < 1e-6);
    assert_eq!(store.get_pagerank(5000), 0.01 / 902.0);

    let linked = store.similarity(34, 458, 3, 0.5).unwrap();
    let unrelated = store.similarity(34, 900, 3, 0.5).unwrap();
    assert!(linked > unrelated);
}

#[test]
fn test_corrupt_snapshot_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("garbage.bin");
    std::fs::write(&path, b"not a matrix").unwrap();
    assert!(matches!(
        AdjacencyMatrix::load(&path),
        Err(NelError::Snapshot(_)) | Err(NelError::CorruptSnapshot(_))
    ));
}

#[test]
fn test_vanuatu_sweden_eu_similarities() {
    let dir = tempfile::tempdir().unwrap();
    let (store, attributes) = build_store(dir.path());
    let pipeline = NelPipeline::new(store, Box::new(BowLanguageModel::new()), BuilderConfig::default());
    let mentions = pipeline.build_mentions(&document(&attributes));
    assert_eq!(mentions.len(), 3);

    let vanuatu = &mentions[0].tags[0];
    assert_eq!(vanuatu.similarities.len(), 1);
    assert!((vanuatu.similarities[0].score - 1.0).abs() < 1e-12);

    let sweden = mentions[1].tags.iter().find(|t| t.id == 34).unwrap();
    let to_eu = sweden.similarities.iter().find(|s| s.tag.id == 458).unwrap().score;
    assert!(to_eu > 0.5, "{to_eu}");
}

fn gold_tsv() -> String {
    let judgments = r#"[{"start":120,"end":126,"qid":"Q34","valid":true},{"start":120,"end":126,"qid":"Q900","valid":false},{"start":214,"end":216,"qid":"Q458","valid":true},{"start":0,"end":7,"qid":"Q686","valid":true}]"#;
    (0..10).map(|i| format!("doc{i}\tignored\t{judgments}\n")).collect()
}

fn labeled_corpus(pipeline: &NelPipeline, attributes: &HashMap<u32, nel_core::linker::EntityAttributes>) -> Vec<LabeledDocument> {
    let gold = GoldStandard::from_reader(Cursor::new(gold_tsv())).unwrap();
    gold.annotated()
        .map(|doc| doc.labeled(pipeline.build_mentions(&document(attributes))).unwrap())
        .collect()
}

#[test]
fn test_train_classify_and_cross_validate() {
    let dir = tempfile::tempdir().unwrap();
    let (store, attributes) = build_store(dir.path());
    let pipeline = NelPipeline::new(store, Box::new(BowLanguageModel::new()), BuilderConfig::default());
    let corpus = labeled_corpus(&pipeline, &attributes);
    assert_eq!(corpus.len(), 10);

    let config = HyperparameterConfig { c: 1.0, ..Default::default() };

    // grade com uma configuração = treino + avaliação em cada fold
    let report = cross_validate(&corpus, &[config], DEFAULT_FOLDS).unwrap();
    let mut per_fold = Vec::new();
    for fold in split_folds(corpus.len(), DEFAULT_FOLDS) {
        let train: Vec<_> = corpus.iter().enumerate().filter(|(i, _)| !fold.contains(i)).map(|(_, d)| d.clone()).collect();
        let test: Vec<_> = fold.iter().map(|&i| corpus[i].clone()).collect();
        per_fold.push(DisambiguationClassifier::train(&train, config).unwrap().evaluate(&test));
    }
    let mean_f1 = per_fold.iter().map(|m| m.f1).sum::<f64>() / per_fold.len() as f64;
    let reported = report.settings[0].metrics.unwrap();
    assert!((reported.f1 - mean_f1).abs() < 1e-12);

    let model = report.model.expect("melhor modelo retreinado");
    let path = dir.path().join("classifier.bin");
    model.save(&path).unwrap();
    let model = DisambiguationClassifier::load(&path).unwrap();

    let pipeline = pipeline.with_classifier(model);
    let annotated = pipeline.annotate(&document(&attributes));
    let best: Vec<Option<u32>> = annotated.iter().map(|m| m.best_entity_id).collect();
    assert_eq!(best, vec![Some(686), Some(34), Some(458)]);

    let metrics = pipeline.classifier().unwrap().evaluate(&corpus);
    assert_eq!(metrics, Metrics { precision: 1.0, recall: 1.0, f1: 1.0 });
}

#[test]
fn test_default_grid_is_valid_config_space() {
    for config in default_grid() {
        assert!(config.c > 0.0);
        assert!(config.nb_steps >= 1);
    }
}
