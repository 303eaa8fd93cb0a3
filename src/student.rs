use serde::{Deserialize, Serialize};

/// Reference data: a student sitting the exams. `register_number` is unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub register_number: String,
    #[serde(default)]
    pub name: String,
    pub department: String,
    pub year: u8,
}

impl Student {
    pub fn new(
        register_number: impl Into<String>,
        name: impl Into<String>,
        department: impl Into<String>,
        year: u8,
    ) -> Self {
        Self {
            register_number: register_number.into(),
            name: name.into(),
            department: department.into(),
            year,
        }
    }
}
