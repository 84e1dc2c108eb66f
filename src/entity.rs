//! Tracked entity store.
//!
//! Deals live in `active_deals.json` (a list the interview appends to and
//! prunes); agency and tech partners live in `partners.json` and are edited
//! by hand. Both are keyed by email domain.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ReportError;
use crate::types::{Entity, EntityClass};

#[derive(Debug, Serialize, Deserialize)]
struct DealRecord {
    domain: String,
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    added: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct PartnersFile {
    #[serde(default)]
    agency_partners: Vec<PartnerRecord>,
    #[serde(default)]
    tech_partners: Vec<PartnerRecord>,
}

#[derive(Debug, Deserialize)]
struct PartnerRecord {
    domain: String,
    name: String,
}

/// All tracked entities in config order.
#[derive(Debug, Clone, Default)]
pub struct EntityStore {
    entities: Vec<Entity>,
}

impl EntityStore {
    pub fn from_entities(entities: Vec<Entity>) -> Self {
        Self { entities }
    }

    /// Load deals and partners. Missing files count as empty lists.
    pub fn load(deals_path: &Path, partners_path: &Path) -> Result<Self, ReportError> {
        let deals: Vec<DealRecord> = read_json_or_default(deals_path)?;
        let partners: PartnersFile = read_json_or_default(partners_path)?;

        let mut entities = Vec::with_capacity(
            deals.len() + partners.agency_partners.len() + partners.tech_partners.len(),
        );
        for deal in deals {
            entities.push(Entity {
                domain: normalize_domain(&deal.domain),
                name: deal.name,
                class: EntityClass::Deal,
                added: deal.added,
            });
        }
        for (class, records) in [
            (EntityClass::AgencyPartner, partners.agency_partners),
            (EntityClass::TechPartner, partners.tech_partners),
        ] {
            for p in records {
                entities.push(Entity {
                    domain: normalize_domain(&p.domain),
                    name: p.name,
                    class,
                    added: None,
                });
            }
        }

        entities.retain(|e| {
            if e.domain.is_empty() || e.name.trim().is_empty() {
                log::warn!("Skipping entity with empty domain or name: {:?}", e);
                false
            } else {
                true
            }
        });

        Ok(Self { entities })
    }

    /// Persist the deal list. Partners are never rewritten.
    pub fn save_deals(&self, deals_path: &Path) -> Result<(), ReportError> {
        let deals: Vec<DealRecord> = self
            .of_class(EntityClass::Deal)
            .map(|e| DealRecord {
                domain: e.domain.clone(),
                name: e.name.clone(),
                added: e.added.clone(),
            })
            .collect();
        let content = serde_json::to_string_pretty(&deals).map_err(|e| {
            ReportError::IoError(format!("Failed to serialize deals: {}", e))
        })?;
        crate::util::atomic_write_str(deals_path, &content)?;
        Ok(())
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn of_class(&self, class: EntityClass) -> impl Iterator<Item = &Entity> {
        self.entities.iter().filter(move |e| e.class == class)
    }

    pub fn count(&self, class: EntityClass) -> usize {
        self.of_class(class).count()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Domain → display name across every class. The first entry for a domain wins.
    pub fn domain_map(&self) -> HashMap<String, String> {
        let mut map = HashMap::with_capacity(self.entities.len());
        for e in &self.entities {
            map.entry(e.domain.clone()).or_insert_with(|| e.name.clone());
        }
        map
    }

    pub fn known_domains(&self) -> HashSet<String> {
        self.entities.iter().map(|e| e.domain.clone()).collect()
    }

    pub fn add_deal(&mut self, domain: &str, name: &str, added: Option<String>) {
        self.entities.push(Entity {
            domain: normalize_domain(domain),
            name: name.trim().to_string(),
            class: EntityClass::Deal,
            added,
        });
    }

    /// Remove deals by their 0-based position in the deal list. Returns the removed deals.
    pub fn remove_deals(&mut self, deal_positions: &HashSet<usize>) -> Vec<Entity> {
        let mut removed = Vec::new();
        let mut position = 0usize;
        self.entities.retain(|e| {
            if e.class != EntityClass::Deal {
                return true;
            }
            let keep = !deal_positions.contains(&position);
            position += 1;
            if !keep {
                removed.push(e.clone());
            }
            keep
        });
        removed
    }
}

fn normalize_domain(domain: &str) -> String {
    domain.trim().trim_start_matches('@').to_lowercase()
}

fn read_json_or_default<T>(path: &Path) -> Result<T, ReportError>
where
    T: for<'de> Deserialize<'de> + Default,
{
    if !path.exists() {
        log::debug!("{} not found, treating as empty", path.display());
        return Ok(T::default());
    }
    let content = fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|e| ReportError::ParseError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}
