//! Forecasting models offered by the dashboard.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelInfo {
    /// Identifier sent as `model_name`.
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

pub const MODELS: &[ModelInfo] = &[
    ModelInfo {
        id: "LPTM",
        name: "LPTM",
        description: "LPTM is our flagship foundational model for time-series analysis with 150M parameters, offering superior performance across multiple domains and tasks.",
    },
    ModelInfo {
        id: "TimesFM",
        name: "TimesFM",
        description: "TimesFM is a foundational model for time-series forecasting with a focus on financial and economic data.",
    },
    ModelInfo {
        id: "Chronos",
        name: "Chronos",
        description: "Chronos is a time-series model designed for handling long-term dependencies and seasonal patterns.",
    },
    ModelInfo {
        id: "Moment",
        name: "Moment",
        description: "Moment Forecasting focuses on multi-horizon forecasting with uncertainty quantification.",
    },
];

pub fn find(id: &str) -> Option<&'static ModelInfo> {
    MODELS.iter().find(|m| m.id == id)
}

pub fn description(id: &str) -> &'static str {
    find(id)
        .map(|m| m.description)
        .unwrap_or("Select a model to see its description.")
}

/// Dataset requirements shown next to the upload prompt. Not enforced locally.
pub const DATASET_REQUIREMENTS: &[&str] = &[
    "Supported format: CSV",
    "The CSV should contain one labeled column: timestamp.",
    "All additional columns are treated as value columns.",
    "Timestamps use the format YYYY-MM-DD HH:MM:SS.",
    "The dataset should be at least 200 timestamps long.",
];
