//! Route lookup.
//!
//! # Responsibilities
//! - Store compiled route rules, longest prefix first
//! - Resolve a path to a service name or an explicit no-match
//! - Accept rule changes from config reloads and runtime registrations
//!
//! # Design Decisions
//! - `RouteTable` is immutable; changes build a new table and swap it in
//! - Readers load the current table through `ArcSwap` without locking
//! - Precedence does not depend on declaration order

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use arc_swap::ArcSwap;

use crate::config::RouteConfig;
use crate::routing::matcher::{RouteRule, RuleOrigin};

/// An immutable, precedence-sorted set of route rules.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    rules: Vec<RouteRule>,
}

impl RouteTable {
    /// Compile rules into a table.
    ///
    /// Identical prefixes are collapsed: registered rules beat static ones,
    /// and within one origin the last declaration wins.
    pub fn new(rules: impl IntoIterator<Item = RouteRule>) -> Self {
        let mut by_prefix: BTreeMap<String, RouteRule> = BTreeMap::new();
        for rule in rules {
            let prefix = rule.path_prefix.prefix().to_string();
            match by_prefix.get(&prefix) {
                Some(existing) if existing.origin > rule.origin => {}
                _ => {
                    by_prefix.insert(prefix, rule);
                }
            }
        }

        let mut rules: Vec<RouteRule> = by_prefix.into_values().collect();
        // Distinct prefixes of equal length can never match the same path,
        // so sorting on length alone is a total precedence order.
        rules.sort_by(|a, b| {
            b.path_prefix
                .len()
                .cmp(&a.path_prefix.len())
                .then_with(|| a.path_prefix.prefix().cmp(b.path_prefix.prefix()))
        });
        Self { rules }
    }

    /// Service name of the longest matching prefix.
    pub fn resolve(&self, path: &str) -> Option<&str> {
        self.rules
            .iter()
            .find(|rule| rule.matches(path))
            .map(|rule| rule.service.as_str())
    }

    pub fn rules(&self) -> &[RouteRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Maps inbound paths to service names over a live route table.
#[derive(Debug)]
pub struct PathResolver {
    table: ArcSwap<RouteTable>,
    static_rules: Mutex<Vec<RouteRule>>,
    registered: Mutex<BTreeMap<String, Vec<RouteRule>>>,
}

impl PathResolver {
    pub fn new(routes: &[RouteConfig]) -> Self {
        let static_rules: Vec<RouteRule> = routes.iter().map(RouteRule::from).collect();
        Self {
            table: ArcSwap::from_pointee(RouteTable::new(static_rules.clone())),
            static_rules: Mutex::new(static_rules),
            registered: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn resolve(&self, path: &str) -> Option<String> {
        self.table.load().resolve(path).map(str::to_string)
    }

    /// Current table snapshot.
    pub fn table(&self) -> Arc<RouteTable> {
        self.table.load_full()
    }

    /// Attach routes to a runtime registration, replacing any it had.
    pub fn register_routes(&self, service: &str, prefixes: &[String]) {
        let rules: Vec<RouteRule> = prefixes
            .iter()
            .map(|prefix| RouteRule::new(prefix.clone(), service, RuleOrigin::Registered))
            .collect();
        let static_rules = lock(&self.static_rules);
        let mut registered = lock(&self.registered);
        if rules.is_empty() {
            registered.remove(service);
        } else {
            tracing::info!(service = %service, prefixes = ?prefixes, "Routes registered");
            registered.insert(service.to_string(), rules);
        }
        self.rebuild(&static_rules, &registered);
    }

    /// Drop the runtime routes of a service. Static routes stay.
    pub fn remove_routes(&self, service: &str) {
        let static_rules = lock(&self.static_rules);
        let mut registered = lock(&self.registered);
        if registered.remove(service).is_some() {
            tracing::info!(service = %service, "Registered routes removed");
            self.rebuild(&static_rules, &registered);
        }
    }

    /// Replace the static rules, e.g. after a config reload.
    pub fn replace_static(&self, routes: &[RouteConfig]) {
        let mut static_rules = lock(&self.static_rules);
        *static_rules = routes.iter().map(RouteRule::from).collect();
        let registered = lock(&self.registered);
        self.rebuild(&static_rules, &registered);
        tracing::info!(rules = self.table.load().len(), "Static routes replaced");
    }

    fn rebuild(&self, static_rules: &[RouteRule], registered: &BTreeMap<String, Vec<RouteRule>>) {
        let rules = static_rules
            .iter()
            .cloned()
            .chain(registered.values().flatten().cloned());
        self.table.store(Arc::new(RouteTable::new(rules)));
    }
}

// Lock order is always static_rules before registered when both are held.
fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
