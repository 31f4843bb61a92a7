use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid scenario: {0}")]
    Core(#[from] fcr_core::CoreError),

    #[error("Simulation failed: {0}")]
    Sim(#[from] fcr_sim::SimError),
}

pub type CliResult<T> = Result<T, CliError>;
