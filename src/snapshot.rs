//! Immutable precomputed list data
//!
//! A [`Snapshot`] holds every list record together with the search fields
//! computed for it at build time. It is built off to the side by the refresh
//! pipeline and published whole; nothing in it changes afterwards.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::lists::{
    AlternateName, DeniedPerson, RawLists, ScreeningListEntry, SdnAddress, SdnEntity,
};
use crate::normalize::{precompute, NameKind, NamePipeline};
use crate::remarks::extract_id_from_remarks;

/// SDN entity with its processed name and remarks ID
#[derive(Debug, Clone)]
pub struct IndexedEntity {
    pub record: SdnEntity,
    name: String,
    remarks_id: String,
}

impl IndexedEntity {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Government ID parsed from the remarks, empty when none was found
    pub fn remarks_id(&self) -> &str {
        &self.remarks_id
    }
}

/// SDN address with precomputed comparison fields
#[derive(Debug, Clone)]
pub struct IndexedAddress {
    pub record: SdnAddress,
    address: String,
    city_state: String,
    country: String,
}

impl IndexedAddress {
    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn city_state(&self) -> &str {
        &self.city_state
    }

    pub fn country(&self) -> &str {
        &self.country
    }
}

#[derive(Debug, Clone)]
pub struct IndexedAlt {
    pub record: AlternateName,
    name: String,
}

impl IndexedAlt {
    pub fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Clone)]
pub struct IndexedDeniedPerson {
    pub record: DeniedPerson,
    name: String,
}

impl IndexedDeniedPerson {
    pub fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Clone)]
pub struct IndexedScreeningEntry {
    pub record: ScreeningListEntry,
    name: String,
    alt_names: Vec<String>,
}

impl IndexedScreeningEntry {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn alt_names(&self) -> &[String] {
        &self.alt_names
    }
}

/// One consistent generation of precomputed list data
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    entities: Vec<IndexedEntity>,
    addresses: Vec<IndexedAddress>,
    alt_names: Vec<IndexedAlt>,
    denied_persons: Vec<IndexedDeniedPerson>,
    screening_list: Vec<IndexedScreeningEntry>,

    /// entity ID -> position in `entities`
    entity_index: HashMap<String, usize>,

    refreshed_at: Option<DateTime<Utc>>,
    stats: SnapshotStats,
}

/// Counts describing a snapshot build
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotStats {
    pub entities: usize,
    pub addresses: usize,
    pub alt_names: usize,
    pub denied_persons: usize,
    pub screening_list: usize,
    /// Records dropped because their name could not be precomputed
    pub skipped: usize,
    /// Addresses referencing an entity absent from this snapshot
    pub orphaned_addresses: usize,
    /// Alternate names referencing an entity absent from this snapshot
    pub orphaned_alt_names: usize,
}

impl std::fmt::Display for SnapshotStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Snapshot Statistics:")?;
        writeln!(f, "  Entities: {}", self.entities)?;
        writeln!(f, "  Addresses: {}", self.addresses)?;
        writeln!(f, "  Alternate names: {}", self.alt_names)?;
        writeln!(f, "  Denied persons: {}", self.denied_persons)?;
        writeln!(f, "  Screening list entries: {}", self.screening_list)?;
        writeln!(f, "  Skipped records: {}", self.skipped)?;
        writeln!(
            f,
            "  Orphans: {} addresses, {} alternate names",
            self.orphaned_addresses, self.orphaned_alt_names
        )?;
        Ok(())
    }
}

impl Snapshot {
    /// Snapshot with no records and no refresh time, served before the first refresh
    pub fn empty() -> Self {
        Self::default()
    }

    /// Precompute every record of `lists`.
    ///
    /// Records whose name does not survive the pipeline are skipped and
    /// logged; the rest of the build continues.
    pub fn build(lists: RawLists, pipeline: &NamePipeline) -> Self {
        let mut skipped = 0usize;

        let mut entities = Vec::with_capacity(lists.entities.len());
        for record in lists.entities {
            let kind = if record.is_individual() {
                NameKind::Individual
            } else {
                NameKind::Organization
            };
            match pipeline.run(&record.sdn_name, kind) {
                Ok(name) => {
                    let remarks_id = extract_id_from_remarks(record.remarks.trim());
                    entities.push(IndexedEntity {
                        record,
                        name,
                        remarks_id,
                    });
                }
                Err(e) => {
                    tracing::warn!(entity_id = %record.entity_id, error = %e, "skipping SDN entity");
                    skipped += 1;
                }
            }
        }

        let mut entity_index = HashMap::with_capacity(entities.len());
        for (i, entity) in entities.iter().enumerate() {
            entity_index
                .entry(entity.record.entity_id.clone())
                .or_insert(i);
        }

        let addresses: Vec<IndexedAddress> = lists
            .addresses
            .into_iter()
            .map(|record| IndexedAddress {
                address: precompute(&record.address),
                city_state: precompute(&record.city_state_province_postal_code),
                country: precompute(&record.country),
                record,
            })
            .collect();

        let mut alt_names = Vec::with_capacity(lists.alt_names.len());
        for record in lists.alt_names {
            match pipeline.run(&record.alternate_name, NameKind::AlternateName) {
                Ok(name) => alt_names.push(IndexedAlt { record, name }),
                Err(e) => {
                    tracing::warn!(alternate_id = %record.alternate_id, error = %e, "skipping alternate name");
                    skipped += 1;
                }
            }
        }

        let mut denied_persons = Vec::with_capacity(lists.denied_persons.len());
        for record in lists.denied_persons {
            match pipeline.run(&record.name, NameKind::DeniedPerson) {
                Ok(name) => denied_persons.push(IndexedDeniedPerson { record, name }),
                Err(e) => {
                    tracing::warn!(error = %e, "skipping denied person");
                    skipped += 1;
                }
            }
        }

        let mut screening_list = Vec::with_capacity(lists.screening_list.len());
        for record in lists.screening_list {
            match pipeline.run(&record.name, NameKind::ScreeningList) {
                Ok(name) => {
                    let alt_names = record
                        .alt_names
                        .iter()
                        .filter_map(|alt| pipeline.run(alt, NameKind::ScreeningList).ok())
                        .collect();
                    screening_list.push(IndexedScreeningEntry {
                        record,
                        name,
                        alt_names,
                    });
                }
                Err(e) => {
                    tracing::warn!(id = %record.id, error = %e, "skipping screening list entry");
                    skipped += 1;
                }
            }
        }

        let orphaned_addresses = addresses
            .iter()
            .filter(|a| !entity_index.contains_key(&a.record.entity_id))
            .count();
        let orphaned_alt_names = alt_names
            .iter()
            .filter(|a| !entity_index.contains_key(&a.record.entity_id))
            .count();
        if orphaned_addresses + orphaned_alt_names > 0 {
            tracing::debug!(
                addresses = orphaned_addresses,
                alt_names = orphaned_alt_names,
                "records reference entities missing from this snapshot"
            );
        }

        let stats = SnapshotStats {
            entities: entities.len(),
            addresses: addresses.len(),
            alt_names: alt_names.len(),
            denied_persons: denied_persons.len(),
            screening_list: screening_list.len(),
            skipped,
            orphaned_addresses,
            orphaned_alt_names,
        };

        Self {
            entities,
            addresses,
            alt_names,
            denied_persons,
            screening_list,
            entity_index,
            refreshed_at: Some(Utc::now()),
            stats,
        }
    }

    /// When this snapshot was built. `None` for the empty startup snapshot.
    pub fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.refreshed_at
    }

    pub fn stats(&self) -> &SnapshotStats {
        &self.stats
    }

    pub fn entities(&self) -> &[IndexedEntity] {
        &self.entities
    }

    pub fn addresses(&self) -> &[IndexedAddress] {
        &self.addresses
    }

    pub fn alt_names(&self) -> &[IndexedAlt] {
        &self.alt_names
    }

    pub fn denied_persons(&self) -> &[IndexedDeniedPerson] {
        &self.denied_persons
    }

    pub fn screening_list(&self) -> &[IndexedScreeningEntry] {
        &self.screening_list
    }

    /// Entity by source identifier
    pub fn entity(&self, entity_id: &str) -> Option<&IndexedEntity> {
        self.entity_index
            .get(entity_id)
            .and_then(|&i| self.entities.get(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_lists() -> RawLists {
        RawLists {
            entities: vec![
                SdnEntity {
                    entity_id: "306".to_string(),
                    sdn_name: "BANCO NACIONAL DE CUBA".to_string(),
                    sdn_type: "individual".to_string(),
                    programs: vec!["CUBA".to_string()],
                    remarks: "a.k.a. 'BNC'; Cedula No. 123 456 (Cuba)".to_string(),
                    ..Default::default()
                },
                SdnEntity {
                    entity_id: "999".to_string(),
                    sdn_name: "...".to_string(),
                    ..Default::default()
                },
            ],
            addresses: vec![
                SdnAddress {
                    entity_id: "306".to_string(),
                    address_id: "201".to_string(),
                    address: "Dai-Ichi Bldg. 6th Floor".to_string(),
                    city_state_province_postal_code: "Tokyo 103".to_string(),
                    country: "Japan".to_string(),
                },
                SdnAddress {
                    entity_id: "404".to_string(),
                    address_id: "202".to_string(),
                    country: "Cuba".to_string(),
                    ..Default::default()
                },
            ],
            alt_names: vec![AlternateName {
                entity_id: "306".to_string(),
                alternate_id: "220".to_string(),
                alternate_type: "aka".to_string(),
                alternate_name: "NATIONAL BANK OF CUBA".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_build_precomputes_fields() {
        let snapshot = Snapshot::build(sample_lists(), &NamePipeline::new());

        let entity = snapshot.entity("306").unwrap();
        assert_eq!(entity.name(), "banco nacional de cuba");
        assert_eq!(entity.remarks_id(), "123 456");

        let address = &snapshot.addresses()[0];
        assert_eq!(address.address(), "dai ichi bldg 6th floor");
        assert_eq!(address.city_state(), "tokyo 103");
        assert_eq!(address.country(), "japan");

        assert_eq!(snapshot.alt_names()[0].name(), "national bank of cuba");
        assert!(snapshot.refreshed_at().is_some());
    }

    #[test]
    fn test_bad_record_skipped_not_fatal() {
        let snapshot = Snapshot::build(sample_lists(), &NamePipeline::new());
        assert_eq!(snapshot.entities().len(), 1);
        assert!(snapshot.entity("999").is_none());
        assert_eq!(snapshot.stats().skipped, 1);
    }

    #[test]
    fn test_orphans_tolerated() {
        let snapshot = Snapshot::build(sample_lists(), &NamePipeline::new());
        assert_eq!(snapshot.addresses().len(), 2);
        assert_eq!(snapshot.stats().orphaned_addresses, 1);
        assert_eq!(snapshot.stats().orphaned_alt_names, 0);
    }

    #[test]
    fn test_empty_snapshot() {
        let snapshot = Snapshot::empty();
        assert!(snapshot.entities().is_empty());
        assert!(snapshot.refreshed_at().is_none());
        assert_eq!(snapshot.stats(), &SnapshotStats::default());
    }
}
