use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::foundation::error::{ForgeError, ForgeResult};

/// How a user uses the app; controls which text layers may render.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UsageType {
    #[default]
    Personal,
    Business,
}

impl<'de> Deserialize<'de> for UsageType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = Option::<String>::deserialize(deserializer)?;
        Ok(match s.as_deref().map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("business") => Self::Business,
            _ => Self::Personal,
        })
    }
}

/// A user's personal data as read from the document store.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub profile_photo_url: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub usage_type: UsageType,
}

impl UserRecord {
    /// Parse a user document from JSON bytes.
    pub fn from_json_slice(bytes: &[u8]) -> ForgeResult<Self> {
        let user: Self = serde_json::from_slice(bytes)
            .map_err(|e| ForgeError::Other(anyhow::anyhow!("parse user JSON: {e}")))?;
        Ok(user.normalized())
    }

    /// Parse a user document from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> ForgeResult<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| {
            ForgeError::Other(anyhow::anyhow!("read user '{}': {e}", path.display()))
        })?;
        Self::from_json_slice(&bytes)
    }

    /// Trim fields and treat empty strings as absent.
    pub fn normalized(self) -> Self {
        fn clean(v: Option<String>) -> Option<String> {
            v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
        }
        Self {
            name: clean(self.name),
            profile_photo_url: clean(self.profile_photo_url),
            phone_number: clean(self.phone_number),
            address: clean(self.address),
            usage_type: self.usage_type,
        }
    }

    /// Copy of this record prepared for a render in `mode`.
    ///
    /// Personal renders carry only the name and photo; business renders keep everything.
    pub fn filtered_for(&self, mode: UsageType) -> Self {
        let base = self.clone().normalized();
        match mode {
            UsageType::Personal => Self {
                name: base.name,
                profile_photo_url: base.profile_photo_url,
                phone_number: None,
                address: None,
                usage_type: UsageType::Personal,
            },
            UsageType::Business => Self {
                usage_type: UsageType::Business,
                ..base
            },
        }
    }

    /// Phone number, only when business details may render.
    pub fn business_phone(&self) -> Option<&str> {
        match self.usage_type {
            UsageType::Business => self.phone_number.as_deref(),
            UsageType::Personal => None,
        }
    }

    /// Address, only when business details may render.
    pub fn business_address(&self) -> Option<&str> {
        match self.usage_type {
            UsageType::Business => self.address.as_deref(),
            UsageType::Personal => None,
        }
    }
}
