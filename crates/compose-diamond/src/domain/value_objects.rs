//! # Value Objects
//!
//! Immutable domain primitives for the diamond core.
//! These types represent concepts that are defined by their value, not identity.

use crate::domain::services::keccak256;
use serde::{Deserialize, Serialize};
use std::fmt;

// Re-export U256 from primitive-types for value transfers
pub use primitive_types::U256;

// =============================================================================
// ADDRESS (20 bytes)
// =============================================================================

/// A 20-byte Ethereum-style address.
///
/// Facets, the proxy itself, callers and initializer targets are all
/// identified by an `Address`. The zero address is the null handle.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// The zero address (0x0000...0000).
    pub const ZERO: Self = Self([0u8; 20]);

    /// Creates an address from a 20-byte array.
    #[must_use]
    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Creates an address whose last byte is `byte` and all others zero.
    ///
    /// Handy for fixtures and well-known system addresses.
    #[must_use]
    pub const fn from_low_u8(byte: u8) -> Self {
        let mut bytes = [0u8; 20];
        bytes[19] = byte;
        Self(bytes)
    }

    /// Creates an address from a slice. Returns None if wrong length.
    #[must_use]
    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        if slice.len() == 20 {
            let mut bytes = [0u8; 20];
            bytes.copy_from_slice(slice);
            Some(Self(bytes))
        } else {
            None
        }
    }

    /// Parses a hex address, with or without the `0x` prefix.
    #[must_use]
    pub fn from_hex(s: &str) -> Option<Self> {
        let raw = hex::decode(s.trim_start_matches("0x")).ok()?;
        Self::from_slice(&raw)
    }

    /// Returns the underlying bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Returns true if this is the zero address.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x")?;
        for byte in &self.0[..4] {
            write!(f, "{byte:02x}")?;
        }
        write!(f, "...")?;
        for byte in &self.0[18..] {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl From<[u8; 20]> for Address {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

impl From<Address> for [u8; 20] {
    fn from(addr: Address) -> Self {
        addr.0
    }
}

// =============================================================================
// SELECTOR (4 bytes)
// =============================================================================

/// A 4-byte function selector, the dispatch key of the proxy.
///
/// Derived from the first four bytes of the keccak-256 hash of a function
/// signature, but treated as an opaque fixed-width identifier everywhere else.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Selector(pub [u8; 4]);

impl Selector {
    /// The all-zero selector.
    pub const ZERO: Self = Self([0u8; 4]);

    /// Creates a selector from raw bytes.
    #[must_use]
    pub const fn new(bytes: [u8; 4]) -> Self {
        Self(bytes)
    }

    /// Creates a selector from its big-endian integer form (`0xaaaaaaaa`).
    #[must_use]
    pub const fn from_u32(value: u32) -> Self {
        Self(value.to_be_bytes())
    }

    /// Derives the selector of a canonical function signature,
    /// e.g. `"transfer(address,uint256)"`.
    #[must_use]
    pub fn from_signature(signature: &str) -> Self {
        let hash = keccak256(signature.as_bytes());
        let mut bytes = [0u8; 4];
        bytes.copy_from_slice(&hash.0[..4]);
        Self(bytes)
    }

    /// Extracts the selector of a call payload.
    ///
    /// Payloads shorter than four bytes are zero-padded on the right.
    #[must_use]
    pub fn from_calldata(calldata: &[u8]) -> Self {
        let mut bytes = [0u8; 4];
        let n = calldata.len().min(4);
        bytes[..n].copy_from_slice(&calldata[..n]);
        Self(bytes)
    }

    /// Parses a hex selector, with or without the `0x` prefix.
    #[must_use]
    pub fn from_hex(s: &str) -> Option<Self> {
        let raw = hex::decode(s.trim_start_matches("0x")).ok()?;
        let bytes: [u8; 4] = raw.try_into().ok()?;
        Some(Self(bytes))
    }

    /// Returns the underlying bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }

    /// Returns the big-endian integer form.
    #[must_use]
    pub const fn to_u32(self) -> u32 {
        u32::from_be_bytes(self.0)
    }
}

impl fmt::Debug for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl From<[u8; 4]> for Selector {
    fn from(bytes: [u8; 4]) -> Self {
        Self(bytes)
    }
}

impl From<u32> for Selector {
    fn from(value: u32) -> Self {
        Self::from_u32(value)
    }
}

// =============================================================================
// HASH (32 bytes)
// =============================================================================

/// A 32-byte hash (e.g., Keccak-256).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Hash(pub [u8; 32]);

impl Hash {
    /// The zero hash.
    pub const ZERO: Self = Self([0u8; 32]);

    /// Creates a hash from a 32-byte array.
    #[must_use]
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Returns the underlying bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Returns true if this is the zero hash.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x")?;
        for byte in &self.0[..4] {
            write!(f, "{byte:02x}")?;
        }
        write!(f, "...")?;
        for byte in &self.0[28..] {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl From<[u8; 32]> for Hash {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

// =============================================================================
// STORAGE NAMESPACE
// =============================================================================

/// Identifier of an independently namespaced storage region.
///
/// The id is the keccak-256 hash of a human-readable namespace string, the
/// same derivation on-chain diamond storage uses for its slot positions.
/// Here it only names a typed region; nothing is addressed by it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct StorageNamespace {
    /// Human-readable namespace.
    pub name: &'static str,
    /// keccak-256 of `name`.
    pub id: Hash,
}

impl StorageNamespace {
    /// Derives the namespace id from its name.
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            id: keccak256(name.as_bytes()),
        }
    }
}

impl fmt::Debug for StorageNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.id)
    }
}

// =============================================================================
// BYTES (variable length)
// =============================================================================

/// Variable-length byte vector for calldata, return data and revert payloads.
#[derive(Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Bytes(pub Vec<u8>);

impl Bytes {
    /// Creates an empty Bytes.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Creates Bytes from a slice.
    #[must_use]
    pub fn from_slice(slice: &[u8]) -> Self {
        Self(slice.to_vec())
    }

    /// Returns the underlying vector.
    #[must_use]
    pub fn into_vec(self) -> Vec<u8> {
        self.0
    }

    /// Returns a reference to the underlying slice.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    /// Returns the length.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Bytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.len() <= 8 {
            write!(f, "0x{}", hex::encode(&self.0))
        } else {
            write!(f, "0x{}..({} bytes)", hex::encode(&self.0[..4]), self.0.len())
        }
    }
}

impl From<Vec<u8>> for Bytes {
    fn from(vec: Vec<u8>) -> Self {
        Self(vec)
    }
}

impl From<&[u8]> for Bytes {
    fn from(slice: &[u8]) -> Self {
        Self(slice.to_vec())
    }
}

impl AsRef<[u8]> for Bytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_zero() {
        assert!(Address::ZERO.is_zero());
        assert!(!Address::new([1u8; 20]).is_zero());
        assert!(!Address::from_low_u8(1).is_zero());
    }

    #[test]
    fn test_address_from_hex() {
        let addr = Address::from_hex("0x00000000000000000000000000000000000000ff").unwrap();
        assert_eq!(addr, Address::from_low_u8(0xff));
        assert!(Address::from_hex("0x1234").is_none());
        assert!(Address::from_hex("not hex").is_none());
    }

    #[test]
    fn test_selector_from_signature() {
        // Well-known ERC20 selectors
        assert_eq!(
            Selector::from_signature("transfer(address,uint256)"),
            Selector::from_u32(0xa905_9cbb)
        );
        assert_eq!(
            Selector::from_signature("balanceOf(address)"),
            Selector::from_u32(0x70a0_8231)
        );
    }

    #[test]
    fn test_selector_from_calldata_pads_short_input() {
        assert_eq!(
            Selector::from_calldata(&[0xaa, 0xbb, 0xcc, 0xdd, 0xee]),
            Selector::from_u32(0xaabb_ccdd)
        );
        assert_eq!(
            Selector::from_calldata(&[0xaa, 0xbb]),
            Selector::from_u32(0xaabb_0000)
        );
        assert_eq!(Selector::from_calldata(&[]), Selector::ZERO);
    }

    #[test]
    fn test_selector_display() {
        let sel = Selector::from_u32(0x1f93_1c1c);
        assert_eq!(sel.to_string(), "0x1f931c1c");
        assert_eq!(Selector::from_hex("1f931c1c"), Some(sel));
        assert_eq!(sel.to_u32(), 0x1f93_1c1c);
    }

    #[test]
    fn test_storage_namespace_is_content_addressed() {
        let a = StorageNamespace::new("compose.diamond");
        let b = StorageNamespace::new("compose.diamond");
        let c = StorageNamespace::new("compose.initializable");
        assert_eq!(a.id, b.id);
        assert_ne!(a.id, c.id);
        assert_eq!(a.id, keccak256(b"compose.diamond"));
    }

    #[test]
    fn test_bytes_debug_truncates() {
        let short = Bytes::from(vec![1, 2]);
        assert_eq!(format!("{short:?}"), "0x0102");
        let long = Bytes::from(vec![0xab; 40]);
        assert_eq!(format!("{long:?}"), "0xabababab..(40 bytes)");
    }
}
