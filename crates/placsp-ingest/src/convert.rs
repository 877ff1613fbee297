//! Normalization of parsed Atom entries into flat contract records
//!
//! Pure functions only; failures here degrade individual fields to `None`
//! rather than failing the entry, so one bad amount or timestamp never
//! costs a whole file.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use sqlx::types::BigDecimal;
use tracing::warn;
use uuid::Uuid;

use crate::atom::AtomEntry;
use crate::models::{Contract, Source};

/// Maximum length of any mapped text field
const MAX_FIELD_LEN: usize = 1000;

/// Flatten one Atom entry into a persistable contract record.
///
/// `source_file` is the bare file name (used both for provenance and for
/// source classification); `imported_at` is supplied by the caller so a
/// whole batch shares one import timestamp.
pub fn entry_to_contract(
    entry: &AtomEntry,
    source_file: &str,
    imported_at: DateTime<Utc>,
) -> Contract {
    let cfs = entry.contract_folder_status.as_ref();
    let project = cfs.and_then(|c| c.procurement_project.as_ref());
    let budget = project.and_then(|p| p.budget_amount.as_ref());
    let classification = project.and_then(|p| p.commodity_classification.as_ref());
    let location = project.and_then(|p| p.realized_location.as_ref());
    let party = cfs
        .and_then(|c| c.located_contracting_party.as_ref())
        .and_then(|lcp| lcp.party.as_ref());

    let source = Source::classify(source_file);
    if source == Source::Unknown {
        warn!(file = %source_file, "file name matches no known source, classifying as unknown");
    }

    Contract {
        id: Uuid::new_v4(),
        external_id: entry.id.clone(),
        title: entry.title.as_deref().map(|s| truncate(s, "title")),
        summary: entry.summary.as_deref().map(|s| truncate(s, "summary")),
        updated_at: entry.updated,
        imported_at,
        link: entry.link.as_deref().map(|s| truncate(s, "link")),
        source_file: truncate(source_file, "source_file"),
        source,
        folder_id: cfs
            .and_then(|c| c.contract_folder_id.as_deref())
            .map(|s| truncate(s, "folder_id")),
        status: cfs
            .and_then(|c| c.status_code.as_deref())
            .map(|s| truncate(s, "status")),
        type_code: project
            .and_then(|p| p.type_code.as_deref())
            .map(|s| truncate(s, "type_code")),
        subtype_code: project
            .and_then(|p| p.subtype_code.as_deref())
            .map(|s| truncate(s, "subtype_code")),
        estimated_amount: budget
            .and_then(|b| b.estimated_overall_contract_amount.as_deref())
            .and_then(parse_amount),
        total_amount: budget
            .and_then(|b| b.total_amount.as_deref())
            .and_then(parse_amount),
        tax_exclusive_amount: budget
            .and_then(|b| b.tax_exclusive_amount.as_deref())
            .and_then(parse_amount),
        currency: budget.map(|_| "EUR".to_string()),
        cpv_code: classification
            .and_then(|c| c.item_classification_code.as_deref())
            .map(|s| truncate(s, "cpv_code")),
        country_subentity: location
            .and_then(|l| l.country_subentity.as_deref())
            .map(|s| truncate(s, "country_subentity")),
        nuts_code: location
            .and_then(|l| l.country_subentity_code.as_deref())
            .map(|s| truncate(s, "nuts_code")),
        contracting_party_name: party
            .and_then(|p| p.name.as_deref())
            .map(|s| truncate(s, "contracting_party_name")),
        contracting_party_id: party
            .and_then(|p| p.identification.as_deref())
            .map(|s| truncate(s, "contracting_party_id")),
    }
}

/// Parse a monetary amount; garbage degrades to `None`, never panics.
pub fn parse_amount(raw: &str) -> Option<BigDecimal> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    match BigDecimal::from_str(trimmed) {
        Ok(amount) => Some(amount),
        Err(_) => {
            warn!(value = %raw, "unparseable amount, storing null");
            None
        }
    }
}

/// Cap a field at [`MAX_FIELD_LEN`] characters (not bytes, so multibyte
/// Spanish text never splits mid-character).
fn truncate(s: &str, field: &str) -> String {
    if s.chars().count() <= MAX_FIELD_LEN {
        return s.to_string();
    }
    warn!(field, len = s.chars().count(), "truncating oversized field");
    s.chars().take(MAX_FIELD_LEN).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atom::models::*;
    use proptest::prelude::*;

    fn full_entry() -> AtomEntry {
        AtomEntry {
            id: Some("https://example.es/licitacion/42".to_string()),
            title: Some("Suministro de material".to_string()),
            summary: Some("Id licitación: 42/2024".to_string()),
            updated: chrono::NaiveDate::from_ymd_opt(2024, 3, 1)
                .unwrap()
                .and_hms_opt(8, 0, 0),
            link: Some("https://example.es/detalle/42".to_string()),
            contract_folder_status: Some(ContractFolderStatus {
                contract_folder_id: Some("42/2024".to_string()),
                status_code: Some("ADJ".to_string()),
                procurement_project: Some(ProcurementProject {
                    type_code: Some("1".to_string()),
                    subtype_code: None,
                    budget_amount: Some(BudgetAmount {
                        estimated_overall_contract_amount: Some("50000".to_string()),
                        total_amount: Some("41322.31".to_string()),
                        tax_exclusive_amount: Some("no disponible".to_string()),
                    }),
                    commodity_classification: Some(CommodityClassification {
                        item_classification_code: Some("30190000".to_string()),
                    }),
                    realized_location: Some(RealizedLocation {
                        country_subentity: Some("Sevilla".to_string()),
                        country_subentity_code: Some("ES618".to_string()),
                    }),
                }),
                located_contracting_party: Some(LocatedContractingParty {
                    party: Some(Party {
                        name: Some("Diputación de Sevilla".to_string()),
                        identification: Some("P4100000A".to_string()),
                    }),
                }),
            }),
        }
    }

    #[test]
    fn test_full_entry_mapping() {
        let entry = full_entry();
        let now = Utc::now();
        let contract = entry_to_contract(&entry, "licitacionesPerfiles_1.atom", now);

        assert_eq!(
            contract.external_id.as_deref(),
            Some("https://example.es/licitacion/42")
        );
        assert_eq!(contract.source, Source::Perfiles);
        assert_eq!(contract.source_file, "licitacionesPerfiles_1.atom");
        assert_eq!(contract.imported_at, now);
        assert_eq!(contract.folder_id.as_deref(), Some("42/2024"));
        assert_eq!(contract.status.as_deref(), Some("ADJ"));
        assert_eq!(contract.type_code.as_deref(), Some("1"));
        assert!(contract.subtype_code.is_none());
        assert_eq!(
            contract.estimated_amount,
            Some(BigDecimal::from_str("50000").unwrap())
        );
        assert_eq!(
            contract.total_amount,
            Some(BigDecimal::from_str("41322.31").unwrap())
        );
        // garbage amount degrades to null, not an error
        assert!(contract.tax_exclusive_amount.is_none());
        assert_eq!(contract.currency.as_deref(), Some("EUR"));
        assert_eq!(contract.cpv_code.as_deref(), Some("30190000"));
        assert_eq!(contract.nuts_code.as_deref(), Some("ES618"));
        assert_eq!(
            contract.contracting_party_name.as_deref(),
            Some("Diputación de Sevilla")
        );
        assert_eq!(contract.contracting_party_id.as_deref(), Some("P4100000A"));
    }

    #[test]
    fn test_currency_absent_without_budget() {
        let mut entry = full_entry();
        entry
            .contract_folder_status
            .as_mut()
            .unwrap()
            .procurement_project
            .as_mut()
            .unwrap()
            .budget_amount = None;
        let contract = entry_to_contract(&entry, "agregadas_1.atom", Utc::now());
        assert!(contract.currency.is_none());
        assert!(contract.estimated_amount.is_none());
        assert_eq!(contract.source, Source::Agregadas);
    }

    #[test]
    fn test_nested_absence_short_circuits() {
        let cases: Vec<AtomEntry> = vec![
            AtomEntry::default(),
            AtomEntry {
                contract_folder_status: Some(ContractFolderStatus::default()),
                ..Default::default()
            },
            AtomEntry {
                contract_folder_status: Some(ContractFolderStatus {
                    procurement_project: Some(ProcurementProject::default()),
                    ..Default::default()
                }),
                ..Default::default()
            },
        ];
        for entry in cases {
            let contract = entry_to_contract(&entry, "x.atom", Utc::now());
            assert!(contract.folder_id.is_none());
            assert!(contract.type_code.is_none());
            assert!(contract.currency.is_none());
            assert!(contract.contracting_party_name.is_none());
            assert_eq!(contract.source, Source::Unknown);
        }
    }

    #[test]
    fn test_truncation_boundary() {
        let exactly = "a".repeat(1000);
        let over = "b".repeat(1001);
        let mut entry = AtomEntry::default();
        entry.summary = Some(exactly.clone());
        let contract = entry_to_contract(&entry, "x.atom", Utc::now());
        assert_eq!(contract.summary.as_deref(), Some(exactly.as_str()));

        entry.summary = Some(over);
        let contract = entry_to_contract(&entry, "x.atom", Utc::now());
        assert_eq!(contract.summary.as_ref().unwrap().chars().count(), 1000);
    }

    #[test]
    fn test_truncation_multibyte_safe() {
        let long = "ñ".repeat(1500);
        let mut entry = AtomEntry::default();
        entry.title = Some(long);
        let contract = entry_to_contract(&entry, "x.atom", Utc::now());
        let title = contract.title.unwrap();
        assert_eq!(title.chars().count(), 1000);
        assert!(title.chars().all(|c| c == 'ñ'));
    }

    #[test]
    fn test_external_id_kept_verbatim() {
        let mut entry = AtomEntry::default();
        let long_id = "x".repeat(1200);
        entry.id = Some(long_id.clone());
        let contract = entry_to_contract(&entry, "x.atom", Utc::now());
        assert_eq!(contract.external_id.as_deref(), Some(long_id.as_str()));
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("123.45"), BigDecimal::from_str("123.45").ok());
        assert_eq!(parse_amount("  99 "), BigDecimal::from_str("99").ok());
        assert!(parse_amount("").is_none());
        assert!(parse_amount("   ").is_none());
        assert!(parse_amount("1.234,56").is_none());
        assert!(parse_amount("N/A").is_none());
    }

    proptest! {
        #[test]
        fn parse_amount_never_panics(s in "\\PC*") {
            let _ = parse_amount(&s);
        }
    }
}
