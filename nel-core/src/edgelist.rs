//! # Lista de Arestas Intermediária (TSV ordenado)
//!
//! O dump do Wikidata tem centenas de GB. Para montar a matriz de adjacência em uma
//! máquina modesta, o processamento é dividido em etapas:
//!
//! 1. **Pré-processamento**: cada item do dump vira uma linha com apenas o que importa
//!    (ver [`crate::item`]).
//! 2. **Ordenação externa**: o arquivo é ordenado fora do processo (ex: `sort -n`),
//!    o que é muito mais eficiente do que ordenar em memória.
//! 3. **Compilação**: o arquivo ordenado é lido em uma única passada pelo
//!    [`crate::graph::GraphBuilder`].
//!
//! ## Formato de uma linha
//!
//! ```text
//! <origem>\t[<alvo>, <alvo>, ...]\t[<contagem>, <contagem>, ...]
//! 42	[5,215627]	[1,3]
//! ```
//!
//! Os alvos são únicos e crescentes; as duas listas são paralelas. O formato é sem perdas
//! para as triplas (origem, alvo, contagem).

use std::io::{BufRead, Write};

use serde::{Deserialize, Serialize};

use crate::entity::EntityId;
use crate::error::{NelError, Result};

/// Arestas de saída de uma entidade, já deduplicadas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub source: EntityId,
    pub targets: Vec<EntityId>,
    /// Quantas vezes cada alvo aparece nas declarações da origem.
    pub counts: Vec<u32>,
}

impl EdgeRecord {
    /// Cria um registro validando que as listas paralelas têm o mesmo tamanho.
    pub fn new(source: EntityId, targets: Vec<EntityId>, counts: Vec<u32>) -> Result<Self> {
        if targets.len() != counts.len() {
            return Err(NelError::LengthMismatch {
                expected: targets.len(),
                found: counts.len(),
            });
        }
        Ok(Self { source, targets, counts })
    }

    /// Agrupa uma lista bruta de alvos (com repetições) em alvos únicos e contagens.
    ///
    /// `[5, 3, 5]` -> alvos `[3, 5]`, contagens `[1, 2]`.
    pub fn from_raw_edges(source: EntityId, raw: &[EntityId]) -> Self {
        let mut sorted = raw.to_vec();
        sorted.sort_unstable();

        let mut targets: Vec<EntityId> = Vec::new();
        let mut counts: Vec<u32> = Vec::new();
        for target in sorted {
            match targets.last() {
                Some(&last) if last == target => {
                    if let Some(c) = counts.last_mut() {
                        *c += 1;
                    }
                }
                _ => {
                    targets.push(target);
                    counts.push(1);
                }
            }
        }
        Self { source, targets, counts }
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Serializa para uma linha TSV (sem o `\n`).
    pub fn to_line(&self) -> Result<String> {
        Ok(format!(
            "{}\t{}\t{}",
            self.source,
            serde_json::to_string(&self.targets)?,
            serde_json::to_string(&self.counts)?
        ))
    }

    /// Lê uma linha TSV. `line_no` é usado apenas para mensagens de erro.
    pub fn parse_line(line: &str, line_no: usize) -> Result<Self> {
        let malformed = |reason: String| NelError::MalformedRecord { line: line_no, reason };

        let mut fields = line.trim_end_matches(['\n', '\r']).split('\t');
        let source_field = fields.next().unwrap_or_default();
        let source = source_field
            .trim()
            .parse::<EntityId>()
            .map_err(|e| malformed(format!("origem {source_field:?}: {e}")))?;

        let targets_field = fields.next().ok_or_else(|| malformed("faltam os alvos".into()))?;
        let counts_field = fields.next().ok_or_else(|| malformed("faltam as contagens".into()))?;

        let targets: Vec<EntityId> = serde_json::from_str(targets_field)
            .map_err(|e| malformed(format!("alvos: {e}")))?;
        let counts: Vec<u32> = serde_json::from_str(counts_field)
            .map_err(|e| malformed(format!("contagens: {e}")))?;

        if targets.len() != counts.len() {
            return Err(malformed(format!(
                "{} alvos para {} contagens",
                targets.len(),
                counts.len()
            )));
        }
        Ok(Self { source, targets, counts })
    }
}

/// Itera sobre os registros de um leitor TSV, pulando linhas em branco.
pub fn read_records<R: BufRead>(reader: R) -> impl Iterator<Item = Result<EdgeRecord>> {
    reader
        .lines()
        .enumerate()
        .filter_map(|(idx, line)| match line {
            Ok(l) if l.trim().is_empty() => None,
            Ok(l) => Some(EdgeRecord::parse_line(&l, idx + 1)),
            Err(e) => Some(Err(NelError::from(e))),
        })
}

/// Escreve registros no formato TSV. Registros sem arestas são omitidos,
/// assim como no pré-processamento do dump.
pub fn write_records<'a, W, I>(mut writer: W, records: I) -> Result<usize>
where
    W: Write,
    I: IntoIterator<Item = &'a EdgeRecord>,
{
    let mut written = 0;
    for record in records {
        if record.is_empty() {
            continue;
        }
        writeln!(writer, "{}", record.to_line()?)?;
        written += 1;
    }
    writer.flush()?;
    Ok(written)
}

/// Primeira passada sobre o arquivo: valida a ordenação e devolve o maior id de origem.
///
/// Retorna `None` para um arquivo vazio.
pub fn scan_last_source<R: BufRead>(reader: R) -> Result<Option<EntityId>> {
    let mut last: Option<EntityId> = None;
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let field = line.split('\t').next().unwrap_or_default();
        let id = field.trim().parse::<EntityId>().map_err(|e| NelError::MalformedRecord {
            line: idx + 1,
            reason: format!("origem {field:?}: {e}"),
        })?;
        if let Some(prev) = last {
            if id <= prev {
                return Err(NelError::OutOfOrderInput { previous: prev, found: id });
            }
        }
        last = Some(id);
    }
    Ok(last)
}
