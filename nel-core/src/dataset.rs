//! # Gold Standard
//!
//! Arquivo TSV com os documentos de avaliação e, opcionalmente, os julgamentos
//! humanos de cada um:
//!
//! ```text
//! <doc_id>\t<texto>[\t<julgamentos json>]
//! 10.1000/xyz	Sweden joined the EU in 1995.	[{"start":0,"end":6,"qid":"Q34","valid":true}]
//! ```
//!
//! Um mesmo trecho pode ter vários julgamentos (um por candidato avaliado); o
//! candidato marcado `valid` é a resposta. Trechos sem nenhum candidato válido
//! significam "nenhuma entidade".

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::classifier::{Judgment, LabeledDocument};
use crate::entity::{parse_qid, EntityId};
use crate::error::{NelError, Result};
use crate::mention::Mention;

/// Uma decisão humana sobre um candidato.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub start: usize,
    pub end: usize,
    pub qid: String,
    pub valid: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoldDocument {
    pub doc_id: String,
    pub text: String,
    pub judgments: Option<Vec<Decision>>,
}

impl GoldDocument {
    /// Entidade escolhida para cada trecho julgado (`None` = nenhuma).
    pub fn item_choices(&self) -> Result<BTreeMap<(usize, usize), Option<EntityId>>> {
        let mut choices = BTreeMap::new();
        for decision in self.judgments.iter().flatten() {
            let entry = choices.entry((decision.start, decision.end)).or_insert(None);
            if decision.valid {
                *entry = Some(parse_qid(&decision.qid)?);
            }
        }
        Ok(choices)
    }

    /// Associa as menções produzidas pelo tagger aos julgamentos deste documento.
    pub fn labeled(&self, mentions: Vec<Mention>) -> Result<LabeledDocument> {
        let judgments = self
            .item_choices()?
            .into_iter()
            .map(|((start, end), entity)| Judgment { start, end, entity })
            .collect();
        Ok(LabeledDocument {
            id: self.doc_id.clone(),
            mentions,
            judgments,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoldStandard {
    documents: Vec<GoldDocument>,
}

impl GoldStandard {
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut documents = Vec::new();
        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim_end_matches(['\n', '\r']);
            if line.trim().is_empty() {
                continue;
            }
            let mut fields = line.split('\t');
            let doc_id = fields.next().unwrap_or_default().to_string();
            let text = fields
                .next()
                .ok_or_else(|| NelError::MalformedRecord {
                    line: idx + 1,
                    reason: "falta o texto do documento".into(),
                })?
                .to_string();
            let judgments = match fields.next() {
                Some(raw) if !raw.trim().is_empty() => {
                    Some(serde_json::from_str(raw).map_err(|e| NelError::MalformedRecord {
                        line: idx + 1,
                        reason: format!("julgamentos: {e}"),
                    })?)
                }
                _ => None,
            };
            documents.push(GoldDocument { doc_id, text, judgments });
        }
        Ok(Self { documents })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_reader(BufReader::new(File::open(path)?))
    }

    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        for doc in &self.documents {
            write!(writer, "{}\t{}", doc.doc_id, doc.text)?;
            if let Some(judgments) = &doc.judgments {
                write!(writer, "\t{}", serde_json::to_string(judgments)?)?;
            }
            writeln!(writer)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        self.write_to(BufWriter::new(File::create(path)?))
    }

    pub fn documents(&self) -> &[GoldDocument] {
        &self.documents
    }

    pub fn push(&mut self, doc_id: impl Into<String>, text: impl Into<String>) {
        self.documents.push(GoldDocument {
            doc_id: doc_id.into(),
            text: text.into(),
            judgments: None,
        });
    }

    /// Próximo documento ainda sem julgamentos (para a fila de anotação).
    pub fn next_unannotated(&self) -> Option<&GoldDocument> {
        self.documents.iter().find(|d| d.judgments.is_none())
    }

    /// Grava os julgamentos de um documento. Retorna `false` se ele não existir.
    pub fn set_judgments(&mut self, doc_id: &str, judgments: Vec<Decision>) -> bool {
        match self.documents.iter_mut().find(|d| d.doc_id == doc_id) {
            Some(doc) => {
                doc.judgments = Some(judgments);
                true
            }
            None => false,
        }
    }

    pub fn annotated(&self) -> impl Iterator<Item = &GoldDocument> {
        self.documents.iter().filter(|d| d.judgments.is_some())
    }
}
