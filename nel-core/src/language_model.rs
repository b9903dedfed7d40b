//! # Modelo de Linguagem Bag-of-Words
//!
//! Estima o quão "comum" é uma frase na língua, contando palavras dos rótulos e
//! apelidos do Wikidata. Menções formadas por palavras muito frequentes ("The",
//! "New") são mais ambíguas do que nomes raros ("Vanuatu"); o classificador usa
//! essa informação como a primeira feature de cada candidato.
//!
//! ## Verossimilhança com suavização de Laplace
//!
//! ```text
//! log P(w) = ln(s + c(w)) − ln(s·(1 + |V|) + T)
//! ```
//!
//! Onde `s = 1` é a suavização, `c(w)` a contagem da palavra, `|V|` o tamanho do
//! vocabulário e `T` o total de palavras ingeridas. A frase é tratada como um saco
//! de palavras independentes: `log P(frase) = Σ log P(w)`.
//!
//! ## Tokenização
//!
//! A frase é quebrada em espaços, absorvendo pontuação colada a eles
//! (`"Paris, France"` → `["Paris", "France"]`). Cada palavra é transliterada
//! para ASCII, então `"São Tomé"` e `"Sao Tome"` contam como as mesmas palavras.

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::sync::OnceLock;

use deunicode::deunicode;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::Result;

/// Qualquer fonte de log-verossimilhança de frases.
pub trait PhraseModel: Send + Sync {
    fn log_likelihood(&self, phrase: &str) -> f64;
}

fn separator_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[,\-_/:;!?)]? [,\-_/:;!?(]?").expect("regex de separador válida"))
}

/// Divide uma frase em palavras transliteradas, descartando pedaços vazios.
pub fn tokenize(phrase: &str) -> Vec<String> {
    let padded = format!(" {phrase} ");
    separator_regex()
        .split(&padded)
        .map(str::trim)
        .filter(|w| !w.is_empty())
        .map(deunicode)
        .collect()
}

/// Contador de palavras com suavização aditiva.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BowLanguageModel {
    total_count: u64,
    word_count: HashMap<String, u64>,
    #[serde(skip, default = "default_smoothing")]
    smoothing: f64,
    /// Contagem mínima para uma palavra ser gravada em disco.
    #[serde(skip, default = "default_threshold")]
    threshold: u64,
}

fn default_smoothing() -> f64 {
    1.0
}

fn default_threshold() -> u64 {
    2
}

impl Default for BowLanguageModel {
    fn default() -> Self {
        Self {
            total_count: 0,
            word_count: HashMap::new(),
            smoothing: default_smoothing(),
            threshold: default_threshold(),
        }
    }
}

impl BowLanguageModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_threshold(mut self, threshold: u64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Conta uma sequência de palavras (repetições contam várias vezes).
    pub fn ingest<S: AsRef<str>>(&mut self, words: &[S]) {
        for word in words {
            *self.word_count.entry(word.as_ref().to_string()).or_insert(0) += 1;
        }
        self.total_count += words.len() as u64;
    }

    /// Tokeniza as frases e conta cada palavra distinta **uma vez**
    /// (o rótulo e os apelidos de um item não inflam a contagem).
    pub fn ingest_phrases<S: AsRef<str>>(&mut self, phrases: &[S]) {
        let words: HashSet<String> = phrases.iter().flat_map(|p| tokenize(p.as_ref())).collect();
        let words: Vec<String> = words.into_iter().collect();
        self.ingest(&words);
    }

    pub fn word_count(&self, word: &str) -> u64 {
        self.word_count.get(word).copied().unwrap_or(0)
    }

    pub fn total_count(&self) -> u64 {
        self.total_count
    }

    pub fn vocabulary_size(&self) -> usize {
        self.word_count.len()
    }

    fn log_quotient(&self) -> f64 {
        (self.smoothing * (1 + self.word_count.len()) as f64 + self.total_count as f64).ln()
    }

    fn word_log_likelihood(&self, word: &str, log_quotient: f64) -> f64 {
        (self.smoothing + self.word_count(word) as f64).ln() - log_quotient
    }

    /// Grava apenas as palavras com contagem ≥ `threshold`; o total é preservado.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let pruned = Self {
            total_count: self.total_count,
            word_count: self
                .word_count
                .iter()
                .filter(|(_, &c)| c >= self.threshold)
                .map(|(w, &c)| (w.clone(), c))
                .collect(),
            ..Self::default()
        };
        let writer = BufWriter::new(File::create(path)?);
        bincode::serialize_into(writer, &pruned)?;
        info!(words = pruned.word_count.len(), total = pruned.total_count, "modelo de linguagem salvo");
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        Ok(bincode::deserialize_from(reader)?)
    }
}

impl PhraseModel for BowLanguageModel {
    fn log_likelihood(&self, phrase: &str) -> f64 {
        let quotient = self.log_quotient();
        tokenize(phrase)
            .iter()
            .map(|w| self.word_log_likelihood(w, quotient))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn speaker_model() -> BowLanguageModel {
        let mut bow = BowLanguageModel::new();
        bow.ingest(&["the", "invited", "speaker"]);
        bow.ingest(&["the", "speaker", "of", "the", "house"]);
        bow
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(tokenize("Paris, France"), vec!["Paris", "France"]);
        assert_eq!(tokenize("  hello   world "), vec!["hello", "world"]);
        assert_eq!(tokenize("Marie (chemist)"), vec!["Marie", "chemist"]);
        assert!(tokenize("").is_empty());
    }

    #[test]
    fn test_tokenize_transliterates_accents() {
        assert_eq!(tokenize("São Tomé"), vec!["Sao", "Tome"]);
        assert_eq!(tokenize("Zürich, Köln"), vec!["Zurich", "Koln"]);

        let mut bow = BowLanguageModel::new();
        bow.ingest_phrases(&["Sao Tome"]);
        assert_eq!(bow.word_count("Tome"), 1);
        let accented = bow.log_likelihood("São Tomé");
        let plain = bow.log_likelihood("Sao Tome");
        assert!((accented - plain).abs() < 1e-12, "{accented} != {plain}");
    }

    #[test]
    fn test_counts() {
        let bow = speaker_model();
        assert_eq!(bow.word_count("speaker"), 2);
        assert_eq!(bow.word_count("the"), 3);
        assert_eq!(bow.total_count(), 8);
        assert_eq!(bow.vocabulary_size(), 5);
    }

    #[test]
    fn test_log_likelihood() {
        let bow = speaker_model();
        let ll = bow.log_likelihood("dear speaker");
        assert!(-4.2 < ll && ll < -4.1, "ll = {ll}");
        // palavra conhecida é mais provável do que desconhecida
        assert!(bow.log_likelihood("the") > bow.log_likelihood("zebra"));
        assert_eq!(bow.log_likelihood(""), 0.0);
    }

    #[test]
    fn test_ingest_phrases_deduplicates_words() {
        let mut bow = BowLanguageModel::new();
        bow.ingest_phrases(&["Kingdom of Sweden", "Sweden"]);
        assert_eq!(bow.word_count("Sweden"), 1);
        assert_eq!(bow.total_count(), 3);
    }

    #[test]
    fn test_save_applies_threshold() {
        let bow = speaker_model();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bow.bin");
        bow.save(&path).unwrap();

        let loaded = BowLanguageModel::load(&path).unwrap();
        assert_eq!(loaded.word_count("speaker"), 2);
        assert_eq!(loaded.word_count("house"), 0);
        assert_eq!(loaded.total_count(), 8);
        assert_eq!(loaded.vocabulary_size(), 2);
    }
}
