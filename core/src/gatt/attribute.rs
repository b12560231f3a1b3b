//! GATT attribute identifiers.
//!
//! Characteristics and descriptors are both named by 128-bit UUIDs. SIG
//! assigned attributes use 16-bit short forms inside the Bluetooth base UUID
//! `0000xxxx-0000-1000-8000-00805F9B34FB`.

use std::fmt;
use uuid::Uuid;

use crate::error::OperationError;

/// Bluetooth base UUID with the 16-bit slot zeroed
pub const BLUETOOTH_BASE_UUID: u128 = 0x0000_0000_0000_1000_8000_00805F9B34FB;

const SHORT_FORM_MASK: u128 = 0x0000_FFFF_0000_0000_0000_0000_0000_0000;

/// Client Characteristic Configuration descriptor
pub const CLIENT_CHARACTERISTIC_CONFIG: AttributeId = AttributeId::from_short(0x2902);

/// Validated, non-nil attribute identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttributeId(Uuid);

impl AttributeId {
    /// Wrap a UUID, rejecting the nil UUID
    pub fn new(uuid: Uuid) -> Result<Self, OperationError> {
        if uuid.is_nil() {
            return Err(OperationError::InvalidTarget(
                "nil UUID does not name an attribute".to_string(),
            ));
        }
        Ok(Self(uuid))
    }

    /// Expand a 16-bit SIG identifier into the base UUID
    pub const fn from_short(short: u16) -> Self {
        Self(Uuid::from_u128(BLUETOOTH_BASE_UUID | ((short as u128) << 96)))
    }

    /// Parse a full UUID string or a 4-digit hex short form (`"2a19"`, `"0x2A19"`)
    pub fn parse(s: &str) -> Result<Self, OperationError> {
        let trimmed = s.trim();
        let short = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);

        if short.len() == 4 {
            return u16::from_str_radix(short, 16)
                .map(Self::from_short)
                .map_err(|_| OperationError::InvalidTarget(format!("bad short UUID: {:?}", s)));
        }

        let uuid = Uuid::parse_str(trimmed)
            .map_err(|e| OperationError::InvalidTarget(format!("{:?}: {}", s, e)))?;
        Self::new(uuid)
    }

    pub fn uuid(&self) -> Uuid {
        self.0
    }

    /// The 16-bit short form, if this identifier lives in the base UUID
    pub fn short(&self) -> Option<u16> {
        let value = self.0.as_u128();
        if value & !SHORT_FORM_MASK == BLUETOOTH_BASE_UUID {
            Some(((value & SHORT_FORM_MASK) >> 96) as u16)
        } else {
            None
        }
    }

    /// True if `uuid` names this attribute
    pub fn matches(&self, uuid: &Uuid) -> bool {
        self.0 == *uuid
    }
}

impl TryFrom<Uuid> for AttributeId {
    type Error = OperationError;

    fn try_from(uuid: Uuid) -> Result<Self, Self::Error> {
        Self::new(uuid)
    }
}

impl From<AttributeId> for Uuid {
    fn from(id: AttributeId) -> Self {
        id.0
    }
}

impl fmt::Display for AttributeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.short() {
            Some(short) => write!(f, "{} (0x{:04X})", self.0, short),
            None => write!(f, "{}", self.0),
        }
    }
}
