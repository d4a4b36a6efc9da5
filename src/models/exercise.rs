use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Catalog record owned by the data store. Read-only to the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalExercise {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub equipment: Vec<String>,
    #[serde(default)]
    pub muscle_groups: Vec<String>,
}

impl CanonicalExercise {
    pub fn new(name: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            equipment: vec![],
            muscle_groups: vec![],
        }
    }
}
