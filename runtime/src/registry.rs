use std::collections::HashMap;

use lasso::{Rodeo, Spur};
use thiserror::Error;
use tracing::debug;

use crate::objtype::ObjType;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Unable to register type \"{key}\", the registry is frozen")]
    Frozen { key: String },

    #[error("A type is already registered as \"{key}\"")]
    Duplicate { key: String },
}

/// Named type descriptors.  Types are registered while an interpreter is set
/// up, after it is frozen the registry can only be read.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    keys: Rodeo,
    types: HashMap<Spur, &'static ObjType>,
    order: Vec<Spur>,
    frozen: bool,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, key: &str, ty: &'static ObjType) -> Result<(), RegistryError> {
        if self.frozen {
            return Err(RegistryError::Frozen {
                key: key.to_string(),
            });
        }

        let spur = self.keys.get_or_intern(key);
        if self.types.contains_key(&spur) {
            return Err(RegistryError::Duplicate {
                key: key.to_string(),
            });
        }

        debug!(key, type_name = ty.name(), "registered type");
        self.types.insert(spur, ty);
        self.order.push(spur);

        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&'static ObjType> {
        self.keys
            .get(key)
            .and_then(|spur| self.types.get(&spur))
            .copied()
    }

    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Registered keys and descriptors in registration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &'static ObjType)> + '_ {
        self.order
            .iter()
            .map(move |spur| (self.keys.resolve(spur), self.types[spur]))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    static FIRST: ObjType = ObjType::new("first");
    static SECOND: ObjType = ObjType::new("second");

    #[test]
    fn register_and_lookup() {
        let mut registry = TypeRegistry::new();
        registry.register("a", &FIRST).unwrap();
        registry.register("b", &SECOND).unwrap();

        assert_eq!(registry.get("b").map(ObjType::name), Some("second"));
        assert!(registry.get("c").is_none());

        let keys = registry.iter().map(|(key, _)| key).collect::<Vec<_>>();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[test]
    fn duplicates_rejected() {
        let mut registry = TypeRegistry::new();
        registry.register("a", &FIRST).unwrap();
        assert_eq!(
            registry.register("a", &SECOND),
            Err(RegistryError::Duplicate {
                key: "a".to_string()
            })
        );
        assert_eq!(registry.get("a").map(ObjType::name), Some("first"));
    }

    #[test]
    fn frozen_rejects() {
        let mut registry = TypeRegistry::new();
        registry.freeze();
        assert!(registry.is_frozen());
        assert!(matches!(
            registry.register("a", &FIRST),
            Err(RegistryError::Frozen { .. })
        ));
        assert!(registry.is_empty());
    }
}
