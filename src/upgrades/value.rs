//! Upgrade cells: typed values whose effective value follows a purchased level.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpgradeError {
    #[error("{name}: {raw:?} is not a valid {kind:?}")]
    Parse {
        name: String,
        kind: ValueKind,
        raw: String,
    },
    #[error("{name} holds {actual:?}, not {expected:?}")]
    KindMismatch {
        name: String,
        expected: ValueKind,
        actual: ValueKind,
    },
    #[error("no upgrade value with id {0:?}")]
    UnknownCell(super::CellId),
    #[error("upgrade {upgrade}: {reason}")]
    Catalog { upgrade: String, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    Int,
    Float,
    Bool,
    Text,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    Int(i64),
    Float(f32),
    Bool(bool),
    Text(String),
}

impl CellValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            CellValue::Int(_) => ValueKind::Int,
            CellValue::Float(_) => ValueKind::Float,
            CellValue::Bool(_) => ValueKind::Bool,
            CellValue::Text(_) => ValueKind::Text,
        }
    }
}

impl ValueKind {
    /// Parse an authored raw string. Text never fails.
    pub fn parse(self, name: &str, raw: &str) -> Result<CellValue, UpgradeError> {
        let trimmed = raw.trim();
        let parsed = match self {
            ValueKind::Int => trimmed.parse().ok().map(CellValue::Int),
            ValueKind::Float => trimmed.parse().ok().map(CellValue::Float),
            ValueKind::Bool => {
                if trimmed.eq_ignore_ascii_case("true") {
                    Some(CellValue::Bool(true))
                } else if trimmed.eq_ignore_ascii_case("false") {
                    Some(CellValue::Bool(false))
                } else {
                    None
                }
            }
            ValueKind::Text => Some(CellValue::Text(raw.to_string())),
        };
        parsed.ok_or_else(|| UpgradeError::Parse {
            name: name.to_string(),
            kind: self,
            raw: raw.to_string(),
        })
    }
}

/// A consumer's upgradable value. Reads go through the typed accessors.
#[derive(Debug, Clone, PartialEq)]
pub struct UpgradeValue {
    backend_name: String,
    raw_default: String,
    value: CellValue,
    registered: bool,
}

impl UpgradeValue {
    pub fn new(
        kind: ValueKind,
        backend_name: impl Into<String>,
        raw_default: impl Into<String>,
    ) -> Result<Self, UpgradeError> {
        let backend_name = backend_name.into();
        let raw_default = raw_default.into();
        let value = kind.parse(&backend_name, &raw_default)?;
        Ok(Self {
            backend_name,
            raw_default,
            value,
            registered: false,
        })
    }

    pub fn from_int(backend_name: impl Into<String>, default: i64) -> Self {
        Self::typed(backend_name, default.to_string(), CellValue::Int(default))
    }

    pub fn from_float(backend_name: impl Into<String>, default: f32) -> Self {
        Self::typed(backend_name, default.to_string(), CellValue::Float(default))
    }

    pub fn from_bool(backend_name: impl Into<String>, default: bool) -> Self {
        Self::typed(backend_name, default.to_string(), CellValue::Bool(default))
    }

    pub fn from_text(backend_name: impl Into<String>, default: impl Into<String>) -> Self {
        let default = default.into();
        Self::typed(backend_name, default.clone(), CellValue::Text(default))
    }

    fn typed(backend_name: impl Into<String>, raw_default: String, value: CellValue) -> Self {
        Self {
            backend_name: backend_name.into(),
            raw_default,
            value,
            registered: false,
        }
    }

    pub fn backend_name(&self) -> &str {
        &self.backend_name
    }

    pub fn kind(&self) -> ValueKind {
        self.value.kind()
    }

    pub fn value(&self) -> &CellValue {
        &self.value
    }

    pub fn is_registered(&self) -> bool {
        self.registered
    }

    pub(super) fn set_registered(&mut self, registered: bool) {
        self.registered = registered;
    }

    /// Parse `raw` as this cell's kind. On failure the old value is kept.
    pub fn set_value(&mut self, raw: &str) -> Result<(), UpgradeError> {
        self.value = self.kind().parse(&self.backend_name, raw)?;
        Ok(())
    }

    /// Store an already-parsed value of the same kind.
    pub fn assign(&mut self, value: CellValue) -> Result<(), UpgradeError> {
        if value.kind() != self.kind() {
            return Err(self.mismatch(value.kind()));
        }
        self.value = value;
        Ok(())
    }

    pub fn reset_value(&mut self) {
        // The default parsed when the cell was built, so this cannot fail.
        if let Ok(value) = self.kind().parse(&self.backend_name, &self.raw_default) {
            self.value = value;
        }
    }

    pub fn as_int(&self) -> Result<i64, UpgradeError> {
        match self.value {
            CellValue::Int(v) => Ok(v),
            _ => Err(self.mismatch(ValueKind::Int)),
        }
    }

    pub fn as_float(&self) -> Result<f32, UpgradeError> {
        match self.value {
            CellValue::Float(v) => Ok(v),
            _ => Err(self.mismatch(ValueKind::Float)),
        }
    }

    pub fn as_bool(&self) -> Result<bool, UpgradeError> {
        match self.value {
            CellValue::Bool(v) => Ok(v),
            _ => Err(self.mismatch(ValueKind::Bool)),
        }
    }

    pub fn as_text(&self) -> Result<&str, UpgradeError> {
        match &self.value {
            CellValue::Text(v) => Ok(v),
            _ => Err(self.mismatch(ValueKind::Text)),
        }
    }

    fn mismatch(&self, expected: ValueKind) -> UpgradeError {
        UpgradeError::KindMismatch {
            name: self.backend_name.clone(),
            expected,
            actual: self.kind(),
        }
    }
}
