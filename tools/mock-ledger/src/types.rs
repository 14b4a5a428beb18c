use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_MOCK_TOKEN: AtomicU64 = AtomicU64::new(1);
static NEXT_METHOD_TOKEN: AtomicU64 = AtomicU64::new(1);

/// Process-wide call sequence number.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Ordinal(pub u64);

impl Ordinal {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Ordinal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of one mocked object.
#[derive(Debug, Clone)]
pub struct MockId {
    token: u64,
    name: Arc<str>,
}

impl MockId {
    pub fn mint(name: impl Into<String>) -> Self {
        Self {
            token: NEXT_MOCK_TOKEN.fetch_add(1, Ordering::Relaxed),
            name: Arc::from(name.into()),
        }
    }

    pub fn token(&self) -> u64 {
        self.token
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl PartialEq for MockId {
    fn eq(&self, other: &Self) -> bool {
        self.token == other.token
    }
}

impl Eq for MockId {}

impl Hash for MockId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.token.hash(state);
    }
}

/// Identity of one method slot.
///
/// Tokens are minted explicitly by whoever builds the fake object, so two
/// methods with the same name or signature never collide. Equality and
/// hashing only look at the token.
#[derive(Debug, Clone)]
pub struct MethodId {
    token: u64,
    mock: Option<MockId>,
    name: Arc<str>,
}

impl MethodId {
    /// Mints a free-standing method slot with no owning mock.
    pub fn mint(name: impl Into<String>) -> Self {
        Self::mint_inner(None, name.into())
    }

    fn mint_inner(mock: Option<MockId>, name: String) -> Self {
        Self {
            token: NEXT_METHOD_TOKEN.fetch_add(1, Ordering::Relaxed),
            mock,
            name: Arc::from(name),
        }
    }

    pub fn token(&self) -> u64 {
        self.token
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mock(&self) -> Option<&MockId> {
        self.mock.as_ref()
    }

    /// `Mock::method` when the slot belongs to a mock, otherwise the bare name.
    pub fn qualified_name(&self) -> String {
        match &self.mock {
            Some(mock) => format!("{}::{}", mock.name(), self.name),
            None => self.name.to_string(),
        }
    }
}

impl PartialEq for MethodId {
    fn eq(&self, other: &Self) -> bool {
        self.token == other.token
    }
}

impl Eq for MethodId {}

impl Hash for MethodId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.token.hash(state);
    }
}

impl fmt::Display for MethodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.qualified_name(), self.token)
    }
}

/// A named mocked object that mints identities for its method slots.
#[derive(Debug, Clone)]
pub struct MockObject {
    id: MockId,
}

impl MockObject {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: MockId::mint(name),
        }
    }

    pub fn id(&self) -> &MockId {
        &self.id
    }

    /// Mints a new slot. Calling twice with the same name yields two slots.
    pub fn method(&self, name: impl Into<String>) -> MethodId {
        MethodId::mint_inner(Some(self.id.clone()), name.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_name_slots_are_distinct() {
        let mock = MockObject::new("Calculator");
        let first = mock.method("add");
        let second = mock.method("add");
        assert_ne!(first, second);
        assert_eq!(first.name(), second.name());
        assert_eq!(first.clone(), first);
    }

    #[test]
    fn method_reports_owning_mock() {
        let mock = MockObject::new("Calculator");
        let add = mock.method("add");
        assert_eq!(add.mock(), Some(mock.id()));
        assert_eq!(add.qualified_name(), "Calculator::add");
        assert!(MethodId::mint("free").mock().is_none());
    }

    #[test]
    fn display_includes_token() {
        let id = MethodId::mint("ping");
        assert_eq!(id.to_string(), format!("ping#{}", id.token()));
    }
}
