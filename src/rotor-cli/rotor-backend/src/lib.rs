// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

use std::collections::HashMap;

use rotor_core::table::{TableAccess, Turntable};
use rotor_core::{DriveError, DriveResult};
use rotor_protocol::FrameCodec;

pub mod dummy;

#[cfg(feature = "ruya")]
use rotor_backend_ruya::RuyaTable;

pub type BackendFactory = fn(TableAccess, FrameCodec) -> DriveResult<Box<dyn Turntable>>;

/// Context for registering and instantiating turntable backends.
///
/// Backends are keyed by the normalized `Protocol` value of the device
/// configuration.
#[derive(Clone)]
pub struct RegistrationContext {
    factories: HashMap<String, BackendFactory>,
}

impl RegistrationContext {
    /// Create a new empty registration context.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register a backend factory under a stable protocol name (e.g. "ruya").
    pub fn register_backend(&mut self, name: &str, factory: BackendFactory) {
        let key = normalize_name(name);
        self.factories.insert(key, factory);
    }

    /// Check whether a protocol name is registered.
    pub fn is_backend_registered(&self, name: &str) -> bool {
        let key = normalize_name(name);
        self.factories.contains_key(&key)
    }

    /// List registered protocol names.
    pub fn registered_backends(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.keys().cloned().collect();
        names.sort();
        names
    }

    /// Instantiate a backend for the selected protocol and access method.
    pub fn build_table(
        &self,
        name: &str,
        access: TableAccess,
        framing: FrameCodec,
    ) -> DriveResult<Box<dyn Turntable>> {
        let key = normalize_name(name);
        let factory = self.factories.get(&key).ok_or_else(|| {
            DriveError::Config(format!(
                "Unknown protocol: {} (available: {})",
                name,
                self.registered_backends().join(", ")
            ))
        })?;
        factory(access, framing)
    }
}

impl Default for RegistrationContext {
    fn default() -> Self {
        Self::new()
    }
}

fn normalize_name(name: &str) -> String {
    name.to_ascii_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}

/// Register all built-in backends enabled by features on a context.
pub fn register_builtin_backends_on(context: &mut RegistrationContext) {
    context.register_backend("dummy", dummy_factory);
    #[cfg(feature = "ruya")]
    context.register_backend("ruya", ruya_factory);
}

fn dummy_factory(_access: TableAccess, _framing: FrameCodec) -> DriveResult<Box<dyn Turntable>> {
    Ok(Box::new(dummy::DummyTable::new()))
}

#[cfg(feature = "ruya")]
fn ruya_factory(access: TableAccess, framing: FrameCodec) -> DriveResult<Box<dyn Turntable>> {
    match access {
        TableAccess::Serial { path, baud } => Ok(Box::new(RuyaTable::new(&path, baud, framing)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_registration() {
        let mut ctx = RegistrationContext::new();
        register_builtin_backends_on(&mut ctx);
        assert!(ctx.is_backend_registered("dummy"));
        assert!(ctx.is_backend_registered("RUYA"));
        assert!(!ctx.is_backend_registered("sinano"));
    }

    #[test]
    fn test_name_normalization() {
        let mut ctx = RegistrationContext::new();
        register_builtin_backends_on(&mut ctx);
        // Protocol values from config files come in mixed case.
        assert!(ctx.is_backend_registered("Ruya"));
        assert!(ctx.is_backend_registered("ru-ya"));
    }

    #[test]
    fn test_unknown_protocol_lists_available() {
        let mut ctx = RegistrationContext::new();
        register_builtin_backends_on(&mut ctx);
        let err = match ctx.build_table(
            "nope",
            TableAccess::Serial {
                path: "/dev/null".to_string(),
                baud: 115200,
            },
            FrameCodec::new("$1", "\r\n"),
        ) {
            Ok(_) => panic!("expected build_table to fail for unknown protocol"),
            Err(err) => err,
        };
        let msg = err.to_string();
        assert!(msg.contains("Unknown protocol"));
        assert!(msg.contains("dummy"));
    }
}
