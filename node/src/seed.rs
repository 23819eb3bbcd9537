//! Student records loaded from a TOML seed file.
//!
//! ```toml
//! [[students]]
//! roll_no = "101"
//! name = "Kiran Mohan Desai"
//! email = "kiran@example.com"
//! mobile_number = "9000000000"
//! father_mobile_number = "9800000000"
//! date_of_birth = "2004-11-23"
//! address = "21 Temple Street"
//! field_of_study = "Mathematics"
//! city = "Satara"
//! ```
//!
//! Dates are quoted `YYYY-MM-DD` strings. Locality fields may be omitted.

use std::path::Path;

use serde::Deserialize;
use sv_types::{RollNo, StudentDetails};

use crate::NodeError;

#[derive(Clone, Debug, Deserialize)]
pub struct SeedStudent {
    pub roll_no: RollNo,
    #[serde(flatten)]
    pub details: StudentDetails,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct SeedFile {
    #[serde(default)]
    pub students: Vec<SeedStudent>,
}

impl SeedFile {
    pub fn from_toml_file(path: &Path) -> Result<Self, NodeError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| NodeError::Seed(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, NodeError> {
        toml::from_str(s).map_err(|e| NodeError::Seed(e.to_string()))
    }
}

/// Outcome of seeding a store.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub inserted: usize,
    pub skipped: Vec<RollNo>,
}
