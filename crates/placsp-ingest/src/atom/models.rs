//! Atom document model
//!
//! Faithful nested representation of a PLACSP feed file: standard Atom
//! entry metadata plus the CODICE `ContractFolderStatus` extension tree.
//! Everything is optional because real feeds omit blocks freely.

use chrono::NaiveDateTime;

/// A parsed feed file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AtomFeed {
    pub id: Option<String>,
    pub title: Option<String>,
    pub updated: Option<NaiveDateTime>,
    pub entries: Vec<AtomEntry>,
}

/// One `<entry>` element
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AtomEntry {
    pub id: Option<String>,
    pub title: Option<String>,
    pub summary: Option<String>,
    pub updated: Option<NaiveDateTime>,
    pub link: Option<String>,
    pub contract_folder_status: Option<ContractFolderStatus>,
}

/// CODICE extension block describing the procurement folder
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContractFolderStatus {
    pub contract_folder_id: Option<String>,
    pub status_code: Option<String>,
    pub procurement_project: Option<ProcurementProject>,
    pub located_contracting_party: Option<LocatedContractingParty>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcurementProject {
    pub type_code: Option<String>,
    pub subtype_code: Option<String>,
    pub budget_amount: Option<BudgetAmount>,
    pub commodity_classification: Option<CommodityClassification>,
    pub realized_location: Option<RealizedLocation>,
}

/// Monetary figures, kept as raw text until normalization
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BudgetAmount {
    pub estimated_overall_contract_amount: Option<String>,
    pub total_amount: Option<String>,
    pub tax_exclusive_amount: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommodityClassification {
    pub item_classification_code: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RealizedLocation {
    pub country_subentity: Option<String>,
    pub country_subentity_code: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocatedContractingParty {
    pub party: Option<Party>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Party {
    pub name: Option<String>,
    pub identification: Option<String>,
}
