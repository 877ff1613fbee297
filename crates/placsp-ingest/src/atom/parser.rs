//! Event-driven Atom/CODICE parser
//!
//! PLACSP feeds mix the Atom namespace with three CODICE/UBL namespaces
//! (`cac`, `cbc`, `cac-place-ext`, `cbc-place-ext`), and the prefixes are
//! not stable across publishers. The parser therefore walks raw events and
//! matches on local names only, tracking the element stack to disambiguate
//! names that repeat at different depths (e.g. Atom `id` vs UBL `ID`).

use std::path::Path;

use chrono::{DateTime, NaiveDateTime};
use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::debug;

use super::models::{AtomEntry, AtomFeed};

/// Errors raised while reading or decoding a feed file
#[derive(Debug, thiserror::Error)]
pub enum ParserError {
    #[error("failed to read feed file: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed XML: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("document has no feed root element")]
    MissingRoot,
}

/// Parser for PLACSP Atom feed documents
pub struct AtomParser;

impl AtomParser {
    /// Parse a feed file from disk
    pub fn parse_file(path: &Path) -> Result<AtomFeed, ParserError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse_str(&content)
    }

    /// Parse a feed document from an XML string
    pub fn parse_str(xml: &str) -> Result<AtomFeed, ParserError> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut feed = AtomFeed::default();
        let mut entry: Option<AtomEntry> = None;
        let mut stack: Vec<String> = Vec::new();
        let mut root_seen = false;

        loop {
            match reader.read_event()? {
                Event::Start(e) => {
                    let name = local_name(e.local_name().as_ref());
                    if stack.is_empty() {
                        // an HTML error page or stray document must fail the
                        // file, not pass as an empty feed
                        if name != "feed" {
                            return Err(ParserError::MissingRoot);
                        }
                        root_seen = true;
                    }
                    if name == "entry" && entry.is_none() {
                        entry = Some(AtomEntry::default());
                    } else if name == "link" {
                        if let Some(entry) = entry.as_mut() {
                            if let Some(href) = link_href(&e)? {
                                set_first(&mut entry.link, href);
                            }
                        }
                    }
                    stack.push(name);
                }
                Event::Empty(e) => {
                    let name = local_name(e.local_name().as_ref());
                    if stack.is_empty() {
                        if name != "feed" {
                            return Err(ParserError::MissingRoot);
                        }
                        root_seen = true;
                    }
                    if name == "link" {
                        if let Some(entry) = entry.as_mut() {
                            if let Some(href) = link_href(&e)? {
                                set_first(&mut entry.link, href);
                            }
                        }
                    }
                }
                Event::End(_) => {
                    let closed = stack.pop();
                    if closed.as_deref() == Some("entry") {
                        if let Some(done) = entry.take() {
                            feed.entries.push(done);
                        }
                    }
                }
                Event::Text(t) => {
                    let text = t.unescape().map_err(quick_xml::Error::from)?;
                    let text = text.trim();
                    if text.is_empty() {
                        continue;
                    }
                    if let Some(entry) = entry.as_mut() {
                        dispatch_text(entry, &stack, text);
                    } else {
                        dispatch_feed_text(&mut feed, &stack, text);
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if !root_seen {
            return Err(ParserError::MissingRoot);
        }

        Ok(feed)
    }
}

/// Feed-level metadata sits directly under `<feed>`, outside any entry
fn dispatch_feed_text(feed: &mut AtomFeed, stack: &[String], text: &str) {
    if stack.len() != 2 || stack.first().map(String::as_str) != Some("feed") {
        return;
    }
    match stack[1].as_str() {
        "id" => set_first(&mut feed.id, text.to_string()),
        "title" => set_first(&mut feed.title, text.to_string()),
        "updated" => {
            if let Some(parsed) = parse_feed_timestamp(text) {
                feed.updated.get_or_insert(parsed);
            }
        }
        _ => {}
    }
}

/// Route a text node to its destination field based on the element stack
fn dispatch_text(entry: &mut AtomEntry, stack: &[String], text: &str) {
    let Some(leaf) = stack.last().map(String::as_str) else {
        return;
    };
    let under = |name: &str| stack.iter().any(|s| s == name);

    match leaf {
        // Atom metadata sits directly under <entry>
        "id" if !under("ContractFolderStatus") => set_first(&mut entry.id, text.to_string()),
        "title" => set_first(&mut entry.title, text.to_string()),
        "summary" => set_first(&mut entry.summary, text.to_string()),
        "updated" => {
            if let Some(parsed) = parse_feed_timestamp(text) {
                entry.updated.get_or_insert(parsed);
            } else {
                debug!(value = %text, "unparseable updated timestamp, leaving empty");
            }
        }

        "ContractFolderID" => {
            set_first(&mut entry.folder_status().contract_folder_id, text.to_string())
        }
        "ContractFolderStatusCode" => {
            set_first(&mut entry.folder_status().status_code, text.to_string())
        }

        "TypeCode" if under("ProcurementProject") => {
            set_first(&mut entry.project().type_code, text.to_string())
        }
        "SubTypeCode" if under("ProcurementProject") => {
            set_first(&mut entry.project().subtype_code, text.to_string())
        }

        "EstimatedOverallContractAmount" if under("BudgetAmount") => {
            set_first(
                &mut entry.budget().estimated_overall_contract_amount,
                text.to_string(),
            )
        }
        "TotalAmount" if under("BudgetAmount") => {
            set_first(&mut entry.budget().total_amount, text.to_string())
        }
        "TaxExclusiveAmount" if under("BudgetAmount") => {
            set_first(&mut entry.budget().tax_exclusive_amount, text.to_string())
        }

        // Feeds repeat this block per CPV code; the first one wins
        "ItemClassificationCode" if under("RequiredCommodityClassification") => {
            set_first(
                &mut entry.classification().item_classification_code,
                text.to_string(),
            )
        }

        "CountrySubentity" if under("RealizedLocation") => {
            set_first(&mut entry.location().country_subentity, text.to_string())
        }
        "CountrySubentityCode" if under("RealizedLocation") => {
            set_first(
                &mut entry.location().country_subentity_code,
                text.to_string(),
            )
        }

        "Name" if under("PartyName") && under("LocatedContractingParty") => {
            set_first(&mut entry.party().name, text.to_string())
        }
        "ID" if under("PartyIdentification") && under("LocatedContractingParty") => {
            set_first(&mut entry.party().identification, text.to_string())
        }

        _ => {}
    }
}

/// Accessors that materialize the nested blocks on first use, so an entry
/// without a given block keeps the corresponding field as `None`
impl AtomEntry {
    fn folder_status(&mut self) -> &mut super::models::ContractFolderStatus {
        self.contract_folder_status.get_or_insert_with(Default::default)
    }

    fn project(&mut self) -> &mut super::models::ProcurementProject {
        self.folder_status()
            .procurement_project
            .get_or_insert_with(Default::default)
    }

    fn budget(&mut self) -> &mut super::models::BudgetAmount {
        self.project().budget_amount.get_or_insert_with(Default::default)
    }

    fn classification(&mut self) -> &mut super::models::CommodityClassification {
        self.project()
            .commodity_classification
            .get_or_insert_with(Default::default)
    }

    fn location(&mut self) -> &mut super::models::RealizedLocation {
        self.project()
            .realized_location
            .get_or_insert_with(Default::default)
    }

    fn party(&mut self) -> &mut super::models::Party {
        self.folder_status()
            .located_contracting_party
            .get_or_insert_with(Default::default)
            .party
            .get_or_insert_with(Default::default)
    }
}

fn set_first(slot: &mut Option<String>, value: String) {
    if slot.is_none() {
        *slot = Some(value);
    }
}

fn local_name(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).into_owned()
}

fn link_href(e: &quick_xml::events::BytesStart<'_>) -> Result<Option<String>, ParserError> {
    for attr in e.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        if attr.key.local_name().as_ref() == b"href" {
            let value = attr.unescape_value().map_err(quick_xml::Error::from)?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

/// Parse a feed timestamp.
///
/// Feeds carry either a plain local timestamp (`2024-01-15T10:30:00`,
/// optionally with fractional seconds) or an RFC 3339 one with an offset
/// (`2024-01-15T10:30:00+01:00`). For the latter the wall-clock time is
/// kept and the offset discarded, matching how the rest of the corpus
/// stores publication times.
fn parse_feed_timestamp(s: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt);
    }
    DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.naive_local())
}
