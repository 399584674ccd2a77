use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Course {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub professors: Vec<String>,
}

impl Course {
    pub fn is_professor(&self, user_id: &str) -> bool {
        self.professors.iter().any(|p| p == user_id)
    }
}
