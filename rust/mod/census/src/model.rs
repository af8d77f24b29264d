use census_core::ServiceError;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Field
// ---------------------------------------------------------------------------

/// One of the twelve census attributes, in form order.
///
/// ```text
/// province → district → llg → ward → census unit → ...
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Province,
    District,
    Llg,
    Ward,
    CensusUnit,
    CensusUnitType,
    WorkloadNo,
    Locality,
    Section,
    StructureRecordNo,
    Lot,
    HouseholdNo,
}

impl Field {
    /// All fields in the order the entry form presents them.
    pub const ALL: [Field; 12] = [
        Field::Province,
        Field::District,
        Field::Llg,
        Field::Ward,
        Field::CensusUnit,
        Field::CensusUnitType,
        Field::WorkloadNo,
        Field::Locality,
        Field::Section,
        Field::StructureRecordNo,
        Field::Lot,
        Field::HouseholdNo,
    ];

    /// Column name in `census_data`; also the JSON key.
    pub fn column(&self) -> &'static str {
        match self {
            Self::Province => "province",
            Self::District => "district",
            Self::Llg => "llg",
            Self::Ward => "ward",
            Self::CensusUnit => "censusUnit",
            Self::CensusUnitType => "censusUnitType",
            Self::WorkloadNo => "workloadNo",
            Self::Locality => "locality",
            Self::Section => "section",
            Self::StructureRecordNo => "structureRecordNo",
            Self::Lot => "lot",
            Self::HouseholdNo => "householdNo",
        }
    }

    /// Label shown next to the input.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Province => "Province",
            Self::District => "District",
            Self::Llg => "Local Level Government (LLG)",
            Self::Ward => "Ward",
            Self::CensusUnit => "Census Unit (CU)",
            Self::CensusUnitType => "Census Unit Type",
            Self::WorkloadNo => "Workload No./Enumeration Area",
            Self::Locality => "Locality",
            Self::Section => "Section",
            Self::StructureRecordNo => "Structure/Record No.",
            Self::Lot => "Lot",
            Self::HouseholdNo => "Household No.",
        }
    }

    /// Inputs restricted to a numeric keypad. Values are still stored as text.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Lot | Self::HouseholdNo)
    }
}

impl std::str::FromStr for Field {
    type Err = ServiceError;

    /// Accepts the column name (`censusUnit`), snake_case (`census_unit`)
    /// or kebab-case (`census-unit`), ignoring case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.replace(['_', '-'], "").to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|f| f.column().to_ascii_lowercase() == normalized)
            .ok_or_else(|| ServiceError::Validation(format!("unknown census field \"{s}\"")))
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// CensusFields: the draft / insert payload
// ---------------------------------------------------------------------------

/// The twelve census attributes without an identity.
///
/// This is both the editable draft held by the entry form and the payload
/// written by insert/update. All values are plain text; presence is checked
/// by the form, not here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CensusFields {
    pub province: String,
    pub district: String,
    pub llg: String,
    pub ward: String,
    pub census_unit: String,
    pub census_unit_type: String,
    pub workload_no: String,
    pub locality: String,
    pub section: String,
    pub structure_record_no: String,
    pub lot: String,
    pub household_no: String,
}

impl CensusFields {
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Province => &self.province,
            Field::District => &self.district,
            Field::Llg => &self.llg,
            Field::Ward => &self.ward,
            Field::CensusUnit => &self.census_unit,
            Field::CensusUnitType => &self.census_unit_type,
            Field::WorkloadNo => &self.workload_no,
            Field::Locality => &self.locality,
            Field::Section => &self.section,
            Field::StructureRecordNo => &self.structure_record_no,
            Field::Lot => &self.lot,
            Field::HouseholdNo => &self.household_no,
        }
    }

    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        *self.slot(field) = value.into();
    }

    fn slot(&mut self, field: Field) -> &mut String {
        match field {
            Field::Province => &mut self.province,
            Field::District => &mut self.district,
            Field::Llg => &mut self.llg,
            Field::Ward => &mut self.ward,
            Field::CensusUnit => &mut self.census_unit,
            Field::CensusUnitType => &mut self.census_unit_type,
            Field::WorkloadNo => &mut self.workload_no,
            Field::Locality => &mut self.locality,
            Field::Section => &mut self.section,
            Field::StructureRecordNo => &mut self.structure_record_no,
            Field::Lot => &mut self.lot,
            Field::HouseholdNo => &mut self.household_no,
        }
    }

    /// Fields that are still empty, in form order.
    pub fn missing(&self) -> Vec<Field> {
        Field::ALL
            .into_iter()
            .filter(|f| self.get(*f).is_empty())
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        Field::ALL.iter().all(|f| !self.get(*f).is_empty())
    }

    /// Values in [`Field::ALL`] order.
    pub fn values(&self) -> impl Iterator<Item = &str> {
        Field::ALL.into_iter().map(move |f| self.get(f))
    }
}

// ---------------------------------------------------------------------------
// CensusRecord: a persisted row
// ---------------------------------------------------------------------------

/// A stored census row. `id` is assigned by the store on insert and never
/// changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CensusRecord {
    pub id: i64,
    #[serde(flatten)]
    pub fields: CensusFields,
}

// ---------------------------------------------------------------------------
// DraftMode
// ---------------------------------------------------------------------------

/// What a submit does with the draft.
///
/// ```text
/// Create ──edit(id)──→ Edit(id)
///   ↑                     │
///   └──submit ok / reset──┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DraftMode {
    /// Submit inserts a new row.
    #[default]
    Create,
    /// Submit overwrites the row with this id.
    Edit(i64),
}

impl DraftMode {
    pub fn editing_id(&self) -> Option<i64> {
        match self {
            Self::Create => None,
            Self::Edit(id) => Some(*id),
        }
    }
}
