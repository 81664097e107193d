//! Raw list records as sourced from government sanctions and denial lists
//!
//! These are the parser outputs. They are immutable once parsed; the
//! snapshot wraps them together with their precomputed search fields.

use serde::{Deserialize, Serialize};

/// Record type carried by a list file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListKind {
    /// OFAC Specially Designated Nationals
    Sdn,
    /// OFAC SDN addresses
    Addresses,
    /// OFAC SDN alternate identities
    AlternateNames,
    /// BIS Denied Persons List
    DeniedPersons,
    /// US Consolidated Screening List
    ScreeningList,
}

impl std::fmt::Display for ListKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ListKind::Sdn => "sdn",
            ListKind::Addresses => "addresses",
            ListKind::AlternateNames => "alternate_names",
            ListKind::DeniedPersons => "denied_persons",
            ListKind::ScreeningList => "screening_list",
        };
        f.write_str(s)
    }
}

/// A sanctioned individual, organization, vessel or aircraft
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SdnEntity {
    #[serde(rename = "entityID")]
    pub entity_id: String,
    pub sdn_name: String,
    /// "individual", "vessel", "aircraft" or blank for organizations
    pub sdn_type: String,
    pub programs: Vec<String>,
    pub title: String,
    pub remarks: String,
}

impl SdnEntity {
    pub fn is_individual(&self) -> bool {
        self.sdn_type.trim().eq_ignore_ascii_case("individual")
    }
}

/// Physical address of an SDN entity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SdnAddress {
    #[serde(rename = "entityID")]
    pub entity_id: String,
    #[serde(rename = "addressID")]
    pub address_id: String,
    pub address: String,
    pub city_state_province_postal_code: String,
    pub country: String,
}

/// Alias (a.k.a., f.k.a., n.k.a.) of an SDN entity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AlternateName {
    #[serde(rename = "entityID")]
    pub entity_id: String,
    #[serde(rename = "alternateID")]
    pub alternate_id: String,
    pub alternate_type: String,
    pub alternate_name: String,
    pub alternate_remarks: String,
}

/// BIS Denied Persons List entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeniedPerson {
    pub name: String,
    pub street_address: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub postal_code: String,
    pub effective_date: String,
    pub expiration_date: String,
    pub standard_order: String,
    pub last_update: String,
    pub action: String,
    pub fr_citation: String,
}

/// Consolidated Screening List entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScreeningListEntry {
    pub id: String,
    /// Originating list, e.g. "Entity List (EL) - Bureau of Industry and Security"
    pub source: String,
    pub entity_number: String,
    #[serde(rename = "type")]
    pub entry_type: String,
    pub programs: Vec<String>,
    pub name: String,
    pub title: String,
    pub addresses: Vec<String>,
    pub alt_names: Vec<String>,
    pub remarks: String,
    #[serde(rename = "sourceListURL")]
    pub source_list_url: String,
}

/// Parsed records from one or more list files, before precomputation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawLists {
    pub entities: Vec<SdnEntity>,
    pub addresses: Vec<SdnAddress>,
    pub alt_names: Vec<AlternateName>,
    pub denied_persons: Vec<DeniedPerson>,
    pub screening_list: Vec<ScreeningListEntry>,
}

impl RawLists {
    /// Move every record of `other` into `self`
    pub fn merge(&mut self, other: RawLists) {
        self.entities.extend(other.entities);
        self.addresses.extend(other.addresses);
        self.alt_names.extend(other.alt_names);
        self.denied_persons.extend(other.denied_persons);
        self.screening_list.extend(other.screening_list);
    }

    pub fn total(&self) -> usize {
        self.entities.len()
            + self.addresses.len()
            + self.alt_names.len()
            + self.denied_persons.len()
            + self.screening_list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_json_field_names() {
        let entity: SdnEntity = serde_json::from_str(
            r#"{"entityID":"306","sdnName":"BANCO NACIONAL DE CUBA","sdnType":"","programs":["CUBA"]}"#,
        )
        .unwrap();
        assert_eq!(entity.entity_id, "306");
        assert_eq!(entity.programs, vec!["CUBA"]);
        assert_eq!(entity.remarks, "");
        assert!(!entity.is_individual());
    }

    #[test]
    fn test_merge_counts() {
        let mut lists = RawLists::default();
        assert!(lists.is_empty());

        lists.merge(RawLists {
            entities: vec![SdnEntity::default()],
            denied_persons: vec![DeniedPerson::default(), DeniedPerson::default()],
            ..Default::default()
        });
        assert_eq!(lists.total(), 3);
        assert_eq!(lists.denied_persons.len(), 2);
    }
}
