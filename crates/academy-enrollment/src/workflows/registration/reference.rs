use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::domain::SelectionGroup;

/// Classification id that requires accompanying detail text.
pub const OTHER_CLASSIFICATION_ID: u32 = 24;

const STANDARD_CLASSIFICATIONS: [&str; 24] = [
    "4Ps Beneficiary",
    "Agrarian Reform Beneficiary",
    "Balik Probinsya",
    "Displaced Workers",
    "Drug Dependents Surrenderees/Surrenderers",
    "Family Members of AFP and PNP Killed-in-Action",
    "Family Members of AFP and PNP Wounded-in-Action",
    "Farmers and Fishermen",
    "Indigenous People & Cultural Communities",
    "Industry Workers",
    "Inmates and Detainees",
    "MILF Beneficiary",
    "Out-of-School-Youth",
    "Overseas Filipino Workers (OFW) Dependent",
    "RCEF-RESP",
    "Rebel Returnees/Decommissioned Combatants",
    "Returning/Repatriated Overseas Filipino Workers (OFW)",
    "Student",
    "TESDA Alumni",
    "TVET Trainers",
    "Uniformed Personnel",
    "Victim of Natural Disasters and Calamities",
    "Wounded-in-Action AFP & PNP Personnel",
    "Others",
];

const STANDARD_DISABILITY_TYPES: [&str; 9] = [
    "Mental/Intellectual",
    "Hearing Disability",
    "Speech Impairment",
    "Visual Disability",
    "Orthopedic (Musculoskeletal) Disability",
    "Chronic Illness",
    "Psychosocial Disability",
    "Learning Disability",
    "Multiple Disabilities",
];

/// Selectable option offered by the reference catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceOption {
    pub id: u32,
    pub label: String,
}

impl ReferenceOption {
    pub fn new(id: u32, label: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
        }
    }
}

/// Read-only lookup lists rendered by the wizard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceCatalog {
    #[serde(default)]
    pub programs: Vec<ReferenceOption>,
    #[serde(default = "standard_classifications")]
    pub classifications: Vec<ReferenceOption>,
    #[serde(default = "standard_disability_types")]
    pub disability_types: Vec<ReferenceOption>,
    #[serde(default = "default_other_classification_id")]
    pub other_classification_id: u32,
}

fn numbered(labels: &[&str]) -> Vec<ReferenceOption> {
    labels
        .iter()
        .zip(1u32..)
        .map(|(label, id)| ReferenceOption::new(id, *label))
        .collect()
}

fn standard_classifications() -> Vec<ReferenceOption> {
    numbered(&STANDARD_CLASSIFICATIONS)
}

fn standard_disability_types() -> Vec<ReferenceOption> {
    numbered(&STANDARD_DISABILITY_TYPES)
}

fn default_other_classification_id() -> u32 {
    OTHER_CLASSIFICATION_ID
}

impl Default for ReferenceCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

impl ReferenceCatalog {
    /// Standard classification and disability lists with no programs offered.
    pub fn standard() -> Self {
        Self {
            programs: Vec::new(),
            classifications: standard_classifications(),
            disability_types: standard_disability_types(),
            other_classification_id: OTHER_CLASSIFICATION_ID,
        }
    }

    pub fn with_programs(mut self, programs: Vec<ReferenceOption>) -> Self {
        self.programs = programs;
        self
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, CatalogError> {
        let catalog: Self = serde_json::from_reader(reader)?;
        catalog.check()?;
        Ok(catalog)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let file = File::open(path.as_ref())?;
        Self::from_reader(BufReader::new(file))
    }

    fn check(&self) -> Result<(), CatalogError> {
        if !self
            .classifications
            .iter()
            .any(|option| option.id == self.other_classification_id)
        {
            return Err(CatalogError::MissingOtherClassification(
                self.other_classification_id,
            ));
        }
        Ok(())
    }

    pub fn options(&self, group: SelectionGroup) -> &[ReferenceOption] {
        match group {
            SelectionGroup::Classifications => &self.classifications,
            SelectionGroup::DisabilityTypes => &self.disability_types,
        }
    }

    pub fn offers(&self, group: SelectionGroup, id: u32) -> bool {
        self.options(group).iter().any(|option| option.id == id)
    }

    pub fn program(&self, id: u32) -> Option<&ReferenceOption> {
        self.programs.iter().find(|program| program.id == id)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("unable to read reference catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("reference catalog is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("classification {0} configured as 'other' is not in the catalog")]
    MissingOtherClassification(u32),
}
