use serde::{Deserialize, Serialize};

/// Entity categories following the OntoNotes-style NER schema.
///
/// `PERSON`, `ORG` and `LOC` come from the neural recognizer; the remaining
/// labels are produced by the regex augmentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityLabel {
    #[serde(rename = "PERSON")]
    Person,
    #[serde(rename = "ORG")]
    Org,
    #[serde(rename = "GPE")]
    Gpe,
    #[serde(rename = "LOC")]
    Loc,
    #[serde(rename = "NORP")]
    Norp,
    #[serde(rename = "EVENT")]
    Event,
    #[serde(rename = "LAW")]
    Law,
    #[serde(rename = "DATE")]
    Date,
    #[serde(rename = "MONEY")]
    Money,
    #[serde(rename = "QUANTITY")]
    Quantity,
}

impl EntityLabel {
    pub const ALL: [EntityLabel; 10] = [
        EntityLabel::Person,
        EntityLabel::Org,
        EntityLabel::Gpe,
        EntityLabel::Loc,
        EntityLabel::Norp,
        EntityLabel::Event,
        EntityLabel::Law,
        EntityLabel::Date,
        EntityLabel::Money,
        EntityLabel::Quantity,
    ];
}

/// One recognized entity with its confidence score in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityMention {
    pub text: String,
    pub score: f64,
}

impl EntityMention {
    pub fn new(text: impl Into<String>, score: f64) -> Self {
        Self {
            text: text.into(),
            score,
        }
    }
}

/// Metadata about one extraction run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BundleMeta {
    /// Number of chunks the input was split into.
    pub chunks: usize,
    /// Total characters processed.
    pub chars: usize,
    /// Identifier of the recognizer model.
    pub model: String,
    /// Mean of all emitted scores, 0.0 when nothing was emitted.
    pub score: f64,
}

/// Structured container for all recognized entities plus extraction metadata.
///
/// Bucket lists are sorted by `(-score, text.to_lowercase())` and texts are
/// unique case-insensitively within a bucket.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[allow(non_snake_case)]
pub struct EntityBundle {
    pub PERSON: Vec<EntityMention>,
    pub ORG: Vec<EntityMention>,
    pub GPE: Vec<EntityMention>,
    pub LOC: Vec<EntityMention>,
    pub NORP: Vec<EntityMention>,
    pub EVENT: Vec<EntityMention>,
    pub LAW: Vec<EntityMention>,
    pub DATE: Vec<EntityMention>,
    pub MONEY: Vec<EntityMention>,
    pub QUANTITY: Vec<EntityMention>,
    pub meta: BundleMeta,
}

impl EntityBundle {
    /// Empty bundle carrying correct metadata, used on soft failure.
    pub fn empty(chars: usize, model: impl Into<String>) -> Self {
        Self {
            meta: BundleMeta {
                chunks: 0,
                chars,
                model: model.into(),
                score: 0.0,
            },
            ..Default::default()
        }
    }

    pub fn bucket(&self, label: EntityLabel) -> &[EntityMention] {
        match label {
            EntityLabel::Person => &self.PERSON,
            EntityLabel::Org => &self.ORG,
            EntityLabel::Gpe => &self.GPE,
            EntityLabel::Loc => &self.LOC,
            EntityLabel::Norp => &self.NORP,
            EntityLabel::Event => &self.EVENT,
            EntityLabel::Law => &self.LAW,
            EntityLabel::Date => &self.DATE,
            EntityLabel::Money => &self.MONEY,
            EntityLabel::Quantity => &self.QUANTITY,
        }
    }

    pub fn bucket_mut(&mut self, label: EntityLabel) -> &mut Vec<EntityMention> {
        match label {
            EntityLabel::Person => &mut self.PERSON,
            EntityLabel::Org => &mut self.ORG,
            EntityLabel::Gpe => &mut self.GPE,
            EntityLabel::Loc => &mut self.LOC,
            EntityLabel::Norp => &mut self.NORP,
            EntityLabel::Event => &mut self.EVENT,
            EntityLabel::Law => &mut self.LAW,
            EntityLabel::Date => &mut self.DATE,
            EntityLabel::Money => &mut self.MONEY,
            EntityLabel::Quantity => &mut self.QUANTITY,
        }
    }

    /// Total number of mentions across all buckets.
    pub fn len(&self) -> usize {
        EntityLabel::ALL
            .iter()
            .map(|label| self.bucket(*label).len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
