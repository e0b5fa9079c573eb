// ABOUTME: Host to specialization registry shared by every preview call.
// ABOUTME: Tracks which built-in hosts have been overridden by caller-registered parsers.

//! Parser registry.
//!
//! The registry maps a host key (`host` or `host:port`) to the [`Specialization`] that
//! handles it. Built-in hosts are seeded by [`ParserRegistry::builtin`]; each of them also
//! carries an override flag that flips once a caller registers its own parser for the
//! host. Canonical host rewrites consult those flags.
//!
//! Lookups take a shared read lock so concurrent previews never block each other;
//! mutations take the write lock.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::PreviewError;
use crate::extractors::Specialization;

/// Hosts handled by a built-in specialization out of the box.
pub const BUILTIN_HOSTS: &[(&str, BuiltinKind)] = &[
    ("old.reddit.com", BuiltinKind::Reddit),
    ("reddit.com", BuiltinKind::Reddit),
    ("clips.twitch.tv", BuiltinKind::Twitch),
    ("twitch.tv", BuiltinKind::Twitch),
    ("www.twitch.tv", BuiltinKind::Twitch),
    ("youtu.be", BuiltinKind::YouTube),
    ("youtube.com", BuiltinKind::YouTube),
];

/// The built-in specializations a host can be seeded with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinKind {
    Reddit,
    Twitch,
    YouTube,
}

impl BuiltinKind {
    fn specialization(self) -> Specialization {
        match self {
            BuiltinKind::Reddit => Specialization::Reddit,
            BuiltinKind::Twitch => Specialization::Twitch,
            BuiltinKind::YouTube => Specialization::YouTube,
        }
    }
}

#[derive(Debug, Default)]
struct RegistryState {
    parsers: HashMap<String, Specialization>,
    // Present only for built-in hosts.
    overridden: HashMap<String, bool>,
}

impl RegistryState {
    fn insert(&mut self, host: String, spec: Specialization) -> Result<(), PreviewError> {
        if self.parsers.contains_key(&host) {
            return Err(PreviewError::host_already_registered(host));
        }
        if let Some(flag) = self.overridden.get_mut(&host) {
            *flag = true;
        }
        self.parsers.insert(host, spec);
        Ok(())
    }
}

/// Registry for looking up specializations by host.
#[derive(Debug, Default)]
pub struct ParserRegistry {
    state: RwLock<RegistryState>,
}

impl ParserRegistry {
    /// Creates a new empty registry with no built-in hosts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry seeded with the built-in Reddit, Twitch and YouTube hosts.
    pub fn builtin() -> Self {
        let mut state = RegistryState::default();
        for (host, kind) in BUILTIN_HOSTS {
            state.parsers.insert(host.to_string(), kind.specialization());
            state.overridden.insert(host.to_string(), false);
        }
        Self {
            state: RwLock::new(state),
        }
    }

    // Every mutation leaves both maps consistent, so poisoning is ignored.
    fn read(&self) -> RwLockReadGuard<'_, RegistryState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, RegistryState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a specialization for a host that is not yet claimed.
    ///
    /// Claiming a built-in host marks it as overridden.
    pub fn register(&self, host: &str, spec: Specialization) -> Result<(), PreviewError> {
        let host = normalize_host(host);
        let name = spec.name();
        self.write().insert(host.clone(), spec)?;
        tracing::info!(host = %host, parser = name, "registered parser");
        Ok(())
    }

    /// Replaces whatever is registered for the host. Never fails.
    pub fn force_register(&self, host: &str, spec: Specialization) {
        let host = normalize_host(host);
        let name = spec.name();
        {
            let mut state = self.write();
            if let Some(flag) = state.overridden.get_mut(&host) {
                *flag = true;
            }
            state.parsers.insert(host.clone(), spec);
        }
        tracing::info!(host = %host, parser = name, "force registered parser");
    }

    /// Removes the parser registered for the host, if any.
    pub fn unregister(&self, host: &str) {
        let host = normalize_host(host);
        if self.write().parsers.remove(&host).is_some() {
            tracing::info!(host = %host, "unregistered parser");
        }
    }

    /// Returns true only for built-in hosts whose parser was replaced by a caller.
    pub fn has_overridden(&self, host: &str) -> bool {
        self.read()
            .overridden
            .get(&normalize_host(host))
            .copied()
            .unwrap_or(false)
    }

    /// Looks up the specialization registered for a host key.
    pub fn lookup(&self, host: &str) -> Option<Specialization> {
        self.read().parsers.get(&normalize_host(host)).cloned()
    }

    /// Returns the number of registered hosts.
    pub fn len(&self) -> usize {
        self.read().parsers.len()
    }

    /// Returns true if no hosts are registered.
    pub fn is_empty(&self) -> bool {
        self.read().parsers.is_empty()
    }
}

fn normalize_host(host: &str) -> String {
    host.trim().to_ascii_lowercase()
}
