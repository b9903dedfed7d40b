//! Configuração do servidor.
//!
//! Lida de um arquivo TOML (`nel.toml` no diretório atual, ou o caminho em
//! `NEL_CONFIG`) e depois sobrescrita por variáveis de ambiente:
//!
//! | Variável               | Campo                  |
//! |------------------------|------------------------|
//! | `NEL_HOST`             | `host`                 |
//! | `NEL_PORT`             | `port`                 |
//! | `NEL_PAGERANK`         | `pagerank_path`        |
//! | `NEL_MATRIX`           | `matrix_path`          |
//! | `NEL_LANGUAGE_MODEL`   | `language_model_path`  |
//! | `NEL_CLASSIFIER`       | `classifier_path`      |
//!
//! Prioridade: ambiente > arquivo > padrões.

use std::fs;
use std::path::{Path, PathBuf};

use nel_core::BuilderConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "nel.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Snapshot do PageRank (obrigatório).
    pub pagerank_path: PathBuf,
    /// Matriz de adjacência; habilita `/api/similarity`.
    pub matrix_path: Option<PathBuf>,
    /// Sem modelo de frases, toda frase tem log-verossimilhança 0.
    pub language_model_path: Option<PathBuf>,
    /// Sem classificador, as menções saem só com rank e similaridades.
    pub classifier_path: Option<PathBuf>,
    /// Passos e probabilidade de reinício dos vetores de vizinhança.
    pub similarity_steps: usize,
    pub restart_probability: f64,
    pub builder: BuilderConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            pagerank_path: PathBuf::from("data/pagerank.bin"),
            matrix_path: None,
            language_model_path: None,
            classifier_path: None,
            similarity_steps: 3,
            restart_probability: 0.5,
            builder: BuilderConfig::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("falha ao ler a configuração: {0}")]
    Read(#[from] std::io::Error),
    #[error("configuração inválida: {0}")]
    Parse(#[from] toml::de::Error),
}

impl ServerConfig {
    /// Carrega o arquivo (se existir) e aplica as variáveis `NEL_*` do processo.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("NEL_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE));
        let mut config = Self::from_file(&path)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Arquivo ausente = padrões; arquivo ilegível ou inválido = erro.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!(?path, "arquivo de configuração ausente, usando padrões");
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)?;
        let config = Self::from_toml(&contents)?;
        tracing::info!(?path, "configuração carregada");
        Ok(config)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Aplica as sobrescritas. `lookup` devolve o valor de uma variável, se definida.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("NEL_HOST") {
            self.host = host;
        }
        if let Some(port) = lookup("NEL_PORT") {
            match port.parse::<u16>() {
                Ok(p) => self.port = p,
                Err(_) => tracing::warn!(value = %port, "NEL_PORT inválida, ignorada"),
            }
        }
        if let Some(path) = lookup("NEL_PAGERANK") {
            self.pagerank_path = PathBuf::from(path);
        }
        if let Some(path) = lookup("NEL_MATRIX") {
            self.matrix_path = Some(PathBuf::from(path));
        }
        if let Some(path) = lookup("NEL_LANGUAGE_MODEL") {
            self.language_model_path = Some(PathBuf::from(path));
        }
        if let Some(path) = lookup("NEL_CLASSIFIER") {
            self.classifier_path = Some(PathBuf::from(path));
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
