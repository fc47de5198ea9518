//! Permission catalog
//!
//! The immutable registry of valid permission keys, their display names and
//! categories. The catalog is pure metadata: it backs validation of
//! administrative mutations and UI listings, never the allow/deny decision
//! itself. It is assembled once at process start through [`CatalogBuilder`]
//! and handed to the services that need it; there is no process-wide
//! mutable registry.

use crate::domain::{AccountRole, PERMISSION_KEY_REGEX};
use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Display grouping for permission keys. Metadata only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionCategory {
    Patient,
    Treatment,
    Catalog,
    Team,
    Appointments,
    Billing,
    Reports,
}

impl PermissionCategory {
    pub fn display_name(&self) -> &'static str {
        match self {
            PermissionCategory::Patient => "Patient Management",
            PermissionCategory::Treatment => "Treatment Management",
            PermissionCategory::Catalog => "Location & Catalog Management",
            PermissionCategory::Team => "Team & Administration",
            PermissionCategory::Appointments => "Appointments & Scheduling",
            PermissionCategory::Billing => "Financial & Billing",
            PermissionCategory::Reports => "Reports & Analytics",
        }
    }
}

/// One controllable action: a stable key plus display metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionKey {
    pub key: String,
    pub display_name: String,
    pub category: PermissionCategory,
}

/// Immutable catalog of permission keys, in registration order.
#[derive(Debug, Clone)]
pub struct PermissionCatalog {
    entries: Vec<PermissionKey>,
    index: HashMap<String, usize>,
}

impl PermissionCatalog {
    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::new()
    }

    /// The production registry. New deployments extend this through
    /// [`CatalogBuilder`] before any role default or grant referencing the
    /// new key exists.
    pub fn builtin() -> Self {
        use PermissionCategory::*;

        let builder = Self::builder()
            // Patient Management
            .register(Patient, "view_patients_list", "View Patients List")
            .register(Patient, "view_patient_detail", "View Patient Detail")
            .register(Patient, "view_patient_history", "View Patient History")
            .register(Patient, "manage_patient_basic", "Manage Patient Basic Info")
            .register(Patient, "manage_patient_history", "Manage Patient History")
            // Treatment Management
            .register(Treatment, "view_treatments", "View Treatments")
            .register(Treatment, "view_all_treatments", "View All Treatments")
            .register(Treatment, "manage_treatments", "Manage Treatments")
            .register(Treatment, "manage_treatment_notes", "Manage Treatment Notes")
            // Location & Catalog Management
            .register(Catalog, "view_catalog", "View Catalog")
            .register(Catalog, "manage_catalog", "Manage Catalog")
            .register(Catalog, "manage_locations", "Manage Locations")
            .register(Catalog, "manage_procedures", "Manage Procedures")
            // Team & Administration
            .register(Team, "view_team", "View Team")
            .register(Team, "invite_users", "Invite Users")
            .register(Team, "manage_users", "Manage Users")
            .register(Team, "remove_users", "Remove Users")
            .register(Team, "manage_permissions", "Manage Permissions")
            // Appointments & Scheduling
            .register(Appointments, "view_appointments", "View Appointments")
            .register(Appointments, "view_all_appointments", "View All Appointments")
            .register(Appointments, "manage_appointments", "Manage Appointments")
            .register(Appointments, "manage_schedule", "Manage Schedule")
            // Financial & Billing
            .register(Billing, "view_billing", "View Billing")
            .register(Billing, "manage_billing", "Manage Billing")
            .register(Billing, "view_financial_reports", "View Financial Reports")
            .register(Billing, "manage_pricing", "Manage Pricing")
            // Reports & Analytics
            .register(Reports, "view_reports", "View Reports")
            .register(Reports, "view_analytics", "View Analytics")
            .register(Reports, "export_reports", "Export Reports");

        builder
            .build()
            .expect("built-in permission catalog is valid")
    }

    /// Ordered sequence of catalog entries.
    pub fn list_permissions(&self) -> &[PermissionKey] {
        &self.entries
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn category_of(&self, key: &str) -> Option<PermissionCategory> {
        self.index.get(key).map(|&i| self.entries[i].category)
    }

    pub fn display_name_of(&self, key: &str) -> Option<&str> {
        self.index.get(key).map(|&i| self.entries[i].display_name.as_str())
    }

    /// All keys, as a set. This is what an owner's effective permission set
    /// resolves to.
    pub fn keys(&self) -> BTreeSet<String> {
        self.entries.iter().map(|e| e.key.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Assembles a [`PermissionCatalog`] at process start.
///
/// Registration is chainable; all validation happens in [`build`], so a
/// misconfigured catalog fails loudly once, at startup.
///
/// [`build`]: CatalogBuilder::build
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    entries: Vec<PermissionKey>,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        mut self,
        category: PermissionCategory,
        key: &str,
        display_name: &str,
    ) -> Self {
        self.entries.push(PermissionKey {
            key: key.to_string(),
            display_name: display_name.to_string(),
            category,
        });
        self
    }

    pub fn build(self) -> Result<PermissionCatalog> {
        let mut index = HashMap::with_capacity(self.entries.len());
        for (i, entry) in self.entries.iter().enumerate() {
            if !PERMISSION_KEY_REGEX.is_match(&entry.key) {
                return Err(AppError::Validation(format!(
                    "Malformed permission key: {}",
                    entry.key
                )));
            }
            if index.insert(entry.key.clone(), i).is_some() {
                return Err(AppError::Validation(format!(
                    "Duplicate permission key: {}",
                    entry.key
                )));
            }
        }
        Ok(PermissionCatalog {
            entries: self.entries,
            index,
        })
    }
}

/// Seed mapping for the role-default bootstrap: role to default key set.
pub type RoleDefaultSeed = BTreeMap<AccountRole, BTreeSet<String>>;

/// The production role-default table.
///
/// Administrators get the account-wide view surface (owners do the managing);
/// doctors get the clinical write surface; assistants cover scheduling and
/// front-desk work; read-only gets exactly what the name says. `Custom` is
/// absent on purpose: it receives nothing implicitly.
pub fn builtin_role_defaults() -> RoleDefaultSeed {
    fn keys(keys: &[&str]) -> BTreeSet<String> {
        keys.iter().map(|k| k.to_string()).collect()
    }

    let mut seed = RoleDefaultSeed::new();
    seed.insert(
        AccountRole::Administrator,
        keys(&[
            "view_patients_list",
            "view_all_treatments",
            "view_catalog",
            "view_team",
            "view_all_appointments",
            "view_billing",
            "view_financial_reports",
            "view_reports",
            "view_analytics",
            "export_reports",
        ]),
    );
    seed.insert(
        AccountRole::Doctor,
        keys(&[
            "view_patients_list",
            "view_patient_detail",
            "view_patient_history",
            "manage_patient_basic",
            "manage_patient_history",
            "view_treatments",
            "manage_treatments",
            "manage_treatment_notes",
            "view_catalog",
            "view_appointments",
            "manage_appointments",
        ]),
    );
    seed.insert(
        AccountRole::Assistant,
        keys(&[
            "view_patients_list",
            "view_patient_detail",
            "manage_patient_basic",
            "view_treatments",
            "view_catalog",
            "view_appointments",
            "manage_appointments",
            "manage_schedule",
            "view_billing",
        ]),
    );
    seed.insert(
        AccountRole::ReadOnly,
        keys(&[
            "view_patients_list",
            "view_patient_detail",
            "view_treatments",
            "view_catalog",
            "view_appointments",
        ]),
    );
    seed
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_builtin_catalog_shape() {
        let catalog = PermissionCatalog::builtin();
        assert_eq!(catalog.len(), 29);
        assert!(catalog.contains("manage_permissions"));
        assert!(catalog.contains("view_patients_list"));
        assert!(!catalog.contains("launch_missiles"));
    }

    #[test]
    fn test_builtin_catalog_is_ordered() {
        let catalog = PermissionCatalog::builtin();
        let first = &catalog.list_permissions()[0];
        assert_eq!(first.key, "view_patients_list");
        assert_eq!(first.category, PermissionCategory::Patient);
        let last = catalog.list_permissions().last().unwrap();
        assert_eq!(last.key, "export_reports");
    }

    #[test]
    fn test_catalog_metadata_lookups() {
        let catalog = PermissionCatalog::builtin();
        assert_eq!(
            catalog.category_of("manage_billing"),
            Some(PermissionCategory::Billing)
        );
        assert_eq!(catalog.display_name_of("view_team"), Some("View Team"));
        assert_eq!(catalog.category_of("nope"), None);
        assert_eq!(catalog.display_name_of("nope"), None);
    }

    #[test]
    fn test_builder_rejects_duplicate_key() {
        let result = PermissionCatalog::builder()
            .register(PermissionCategory::Billing, "view_billing", "View Billing")
            .register(PermissionCategory::Reports, "view_billing", "View Billing Again")
            .build();
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_builder_rejects_malformed_key() {
        let result = PermissionCatalog::builder()
            .register(PermissionCategory::Team, "Manage Team", "Manage Team")
            .build();
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_builder_extension_keeps_registration_order() {
        let catalog = PermissionCatalog::builder()
            .register(PermissionCategory::Team, "view_team", "View Team")
            .register(PermissionCategory::Team, "manage_rosters", "Manage Rosters")
            .build()
            .unwrap();
        let keys: Vec<_> = catalog.list_permissions().iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["view_team", "manage_rosters"]);
    }

    #[test]
    fn test_builtin_defaults_reference_known_keys() {
        let catalog = PermissionCatalog::builtin();
        for (role, keys) in builtin_role_defaults() {
            assert!(role.has_implicit_defaults(), "{role} must not be seeded");
            for key in keys {
                assert!(catalog.contains(&key), "unknown key {key} for {role}");
            }
        }
    }

    #[test]
    fn test_builtin_defaults_omit_custom() {
        let seed = builtin_role_defaults();
        assert!(!seed.contains_key(&AccountRole::Custom));
        assert_eq!(seed.len(), 4);
    }

    #[test]
    fn test_doctor_defaults_cover_clinical_surface() {
        let seed = builtin_role_defaults();
        let doc = &seed[&AccountRole::Doctor];
        assert!(doc.contains("manage_treatments"));
        assert!(doc.contains("manage_patient_history"));
        assert!(!doc.contains("manage_billing"));
        assert!(!doc.contains("view_team"));
    }
}
