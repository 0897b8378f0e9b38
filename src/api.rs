use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::source::{Content, ImageSource};

/// The content type a vector space embeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Modality {
    Text,
    Image,
}

impl Modality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "TEXT",
            Self::Image => "IMAGE",
        }
    }
}

impl std::fmt::Display for Modality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Modality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "TEXT" => Ok(Self::Text),
            "IMAGE" => Ok(Self::Image),
            _ => Err(format!("unknown modality `{s}`, expected TEXT or IMAGE")),
        }
    }
}

/// Embedding models offered by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Model {
    Clip,
    Sbert,
    OpenAi,
}

impl Model {
    /// Id the management API knows this model by.
    pub fn id(&self) -> u64 {
        match self {
            Self::Clip => 1,
            Self::Sbert => 2,
            Self::OpenAi => 3,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Clip => "CLIP",
            Self::Sbert => "SBERT",
            Self::OpenAi => "OPENAI",
        }
    }

    /// CLIP embeds both text and images; the others are text only.
    pub fn supports(&self, modality: Modality) -> bool {
        matches!(self, Self::Clip) || modality == Modality::Text
    }
}

impl FromStr for Model {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "CLIP" => Ok(Self::Clip),
            "SBERT" => Ok(Self::Sbert),
            "OPENAI" => Ok(Self::OpenAi),
            _ => Err(format!("unknown model `{s}`, expected CLIP, SBERT or OPENAI")),
        }
    }
}

/// One item submitted for indexing.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestItem {
    pub content: Content,
    pub attributes: Value,
}

impl IngestItem {
    pub fn text(text: impl Into<String>, attributes: Value) -> Self {
        Self {
            content: Content::Text(text.into()),
            attributes,
        }
    }

    pub fn image(source: impl Into<ImageSource>, attributes: Value) -> Self {
        Self {
            content: Content::Image(source.into()),
            attributes,
        }
    }
}

/// Replacement content for an already ingested vector.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingUpdate {
    pub id: u64,
    pub content: Content,
}

/// Replacement attributes for an already ingested vector.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeUpdate {
    pub id: u64,
    pub attributes: Value,
}

/// The direction of an analogy: whatever turns `start` into `end`.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalogyPair {
    pub start: Content,
    pub end: Content,
}

impl AnalogyPair {
    pub fn new(start: impl Into<Content>, end: impl Into<Content>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }
}

/// Ids assigned to a batch, in the order the service returned them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestResponse {
    pub ids: Vec<u64>,
}

/// A neighbour returned by lookup or analogy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookupResult {
    pub similarity: f32,
    pub attributes: Value,
    #[serde(alias = "vector_id")]
    pub id: u64,
}

pub type AnalogyResult = LookupResult;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub modality: Modality,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorSpaceInfo {
    pub id: u64,
    pub name: String,
    pub model: ModelInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: u64,
    pub full_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    pub id: u64,
    pub name: String,
    pub token_type: String,
    pub created_at: String,
    pub all_vector_spaces: bool,
    #[serde(default)]
    pub vector_space_ids: Vec<u64>,
}

/// Returned once on token creation; the only time the secret is visible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewToken {
    pub id: u64,
    pub account_id: u64,
    pub name: String,
    pub token: String,
    pub token_type: String,
    pub created_at: String,
    pub updated_at: String,
    pub allows_access_to_all_vector_spaces: bool,
    #[serde(default)]
    pub vector_spaces_ids: Vec<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataEntry {
    pub id: u64,
    pub attributes: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPage {
    pub elements: Vec<DataEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyUsage {
    pub date: String,
    pub count: u64,
    pub cumulative_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetric {
    pub daily_metrics: Vec<DailyUsage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageMetrics {
    pub lookups: UsageMetric,
    pub indexing: UsageMetric,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyUsage {
    pub year: u32,
    pub month: u32,
    pub usage: UsageMetrics,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_parses_case_insensitively() {
        assert_eq!("clip".parse::<Model>().unwrap(), Model::Clip);
        assert_eq!("SBERT".parse::<Model>().unwrap(), Model::Sbert);
        assert_eq!("OpenAI".parse::<Model>().unwrap(), Model::OpenAi);
        assert!("word2vec".parse::<Model>().is_err());
    }

    #[test]
    fn model_ids_match_management_api() {
        assert_eq!(Model::Clip.id(), 1);
        assert_eq!(Model::Sbert.id(), 2);
        assert_eq!(Model::OpenAi.id(), 3);
    }

    #[test]
    fn only_clip_embeds_images() {
        assert!(Model::Clip.supports(Modality::Image));
        assert!(Model::Clip.supports(Modality::Text));
        assert!(!Model::Sbert.supports(Modality::Image));
        assert!(Model::OpenAi.supports(Modality::Text));
    }

    #[test]
    fn modality_uses_upper_case_on_the_wire() {
        assert_eq!(serde_json::to_value(Modality::Image).unwrap(), "IMAGE");
        assert_eq!(
            serde_json::from_value::<Modality>("TEXT".into()).unwrap(),
            Modality::Text
        );
        assert_eq!("image".parse::<Modality>().unwrap(), Modality::Image);
    }
}
