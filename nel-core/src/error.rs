//! # Erros do nel-core
//!
//! Todos os componentes retornam [`Result<T>`], um alias para `Result<T, NelError>`.
//!
//! | Variante              | Gravidade    | Quem trata                                        |
//! |-----------------------|--------------|---------------------------------------------------|
//! | `OutOfOrderInput`     | Fatal        | Abortar a construção do grafo, ordenar o arquivo  |
//! | `NoPositiveSamples`   | Recuperável  | Pular aquela configuração de hiperparâmetros      |
//! | `InvalidEntityId`     | Entrada ruim | Rejeitar o identificador                          |
//! | `MalformedRecord`     | Entrada ruim | Corrigir a linha indicada do arquivo              |
//!
//! Entidades ausentes do grafo **não** são erro: recebem rank padrão e nenhuma aresta.

use thiserror::Error;

use crate::entity::EntityId;

#[derive(Debug, Error)]
pub enum NelError {
    /// A lista de arestas precisa estar ordenada por origem, estritamente crescente.
    #[error("entrada fora de ordem: origem Q{found} depois de Q{previous} (ordene o arquivo antes, ex: GNU sort)")]
    OutOfOrderInput { previous: EntityId, found: EntityId },

    #[error("nenhuma amostra positiva encontrada no corpus de treino")]
    NoPositiveSamples,

    #[error("identificador de entidade inválido: {0:?}")]
    InvalidEntityId(String),

    #[error("registro malformado na linha {line}: {reason}")]
    MalformedRecord { line: usize, reason: String },

    #[error("snapshot corrompido: {0}")]
    CorruptSnapshot(String),

    #[error("tamanhos incompatíveis: esperado {expected}, recebido {found}")]
    LengthMismatch { expected: usize, found: usize },

    #[error("erro de E/S: {0}")]
    Io(#[from] std::io::Error),

    #[error("erro de JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("erro no snapshot binário: {0}")]
    Snapshot(#[from] bincode::Error),
}

pub type Result<T> = std::result::Result<T, NelError>;
