//! In-memory service registry.
//!
//! # Responsibilities
//! - Own every `ServiceEntry`; no other component mutates entries
//! - Insert-or-replace on register, idempotent unregister
//! - Hand out snapshots, never live references
//!
//! # Design Decisions
//! - `DashMap` gives per-entry atomicity: a reader sees the entry either
//!   before or after an update, never half-written
//! - Status updates for absent names are logged and dropped

use std::collections::BTreeMap;
use chrono::Utc;
use dashmap::DashMap;

use crate::config::schema::ServiceConfig;
use crate::discovery::entry::{Registration, ServiceEntry, ServiceStatus};

#[derive(Debug, Default)]
pub struct ServiceRegistry {
    services: DashMap<String, ServiceEntry>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry pre-populated from configured services.
    pub fn from_config(services: &[ServiceConfig]) -> Self {
        let registry = Self::new();
        for service in services {
            registry.register(Registration::from(service));
        }
        registry
    }

    /// Insert or replace the entry for `registration.name`.
    pub fn register(&self, registration: Registration) {
        let entry = registration.into_entry();
        tracing::info!(
            service = %entry.name,
            base_address = %entry.base_address,
            health_check_path = %entry.health_check_path,
            "Service registered"
        );
        self.services.insert(entry.name.clone(), entry);
    }

    /// Remove the entry if present. Absent names are a no-op.
    pub fn unregister(&self, name: &str) -> Option<ServiceEntry> {
        let removed = self.services.remove(name).map(|(_, entry)| entry);
        if removed.is_some() {
            tracing::info!(service = %name, "Service unregistered");
        }
        removed
    }

    pub fn get(&self, name: &str) -> Option<ServiceEntry> {
        self.services.get(name).map(|entry| entry.clone())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.services.contains_key(name)
    }

    /// Snapshot of all entries, ordered by name.
    pub fn list(&self) -> BTreeMap<String, ServiceEntry> {
        self.services
            .iter()
            .map(|item| (item.key().clone(), item.value().clone()))
            .collect()
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.services.iter().map(|item| item.key().clone()).collect();
        names.sort();
        names
    }

    /// Record a health evaluation. Returns the previous status when the
    /// entry exists; absent names are logged and ignored.
    pub fn update_status(&self, name: &str, status: ServiceStatus) -> Option<ServiceStatus> {
        match self.services.get_mut(name) {
            Some(mut entry) => {
                let previous = entry.status;
                entry.status = status;
                entry.last_checked_at = Some(Utc::now());
                Some(previous)
            }
            None => {
                tracing::warn!(service = %name, status = %status, "Status update for unregistered service ignored");
                None
            }
        }
    }

    /// Like [`update_status`](Self::update_status), but only while the entry
    /// still points at `base_address`. A result probed against an address
    /// that has since been replaced is dropped and `None` is returned.
    pub fn update_status_if(&self, name: &str, base_address: &str, status: ServiceStatus) -> Option<ServiceStatus> {
        let mut entry = self.services.get_mut(name)?;
        if entry.base_address != base_address {
            tracing::debug!(
                service = %name,
                probed = %base_address,
                current = %entry.base_address,
                "Discarding health result for a replaced address"
            );
            return None;
        }
        let previous = entry.status;
        entry.status = status;
        entry.last_checked_at = Some(Utc::now());
        Some(previous)
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}
