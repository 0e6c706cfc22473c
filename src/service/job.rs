use serde::{Deserialize, Serialize};

use crate::model::template::Template;
use crate::model::user::{UsageType, UserRecord};

/// Which overlay endpoint a request targets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlayType {
    #[default]
    Personal,
    Business,
}

impl OverlayType {
    fn usage(self) -> UsageType {
        match self {
            Self::Personal => UsageType::Personal,
            Self::Business => UsageType::Business,
        }
    }
}

/// User fields that went into a render.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDataUsed {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub has_profile_photo: bool,
}

/// One render request with its resolved inputs.
///
/// The user record is already filtered for the overlay type; personal jobs never carry a phone
/// number or address.
#[derive(Clone, Debug)]
pub struct CompositeJob {
    pub template_id: String,
    pub user_id: String,
    pub overlay_type: OverlayType,
    pub template: Template,
    pub user: UserRecord,
}

impl CompositeJob {
    pub fn new(
        template_id: impl Into<String>,
        user_id: impl Into<String>,
        overlay_type: OverlayType,
        template: Template,
        user: &UserRecord,
    ) -> Self {
        Self {
            template_id: template_id.into(),
            user_id: user_id.into(),
            overlay_type,
            template,
            user: user.filtered_for(overlay_type.usage()),
        }
    }

    /// URL of the profile photo to fetch, when the template shows one.
    pub fn profile_photo_url(&self) -> Option<&str> {
        self.template
            .profile_slot
            .as_ref()
            .filter(|s| s.enabled)
            .and(self.user.profile_photo_url.as_deref())
    }

    pub fn user_data_used(&self) -> UserDataUsed {
        let business = self.overlay_type == OverlayType::Business;
        UserDataUsed {
            name: self.user.name.clone().unwrap_or_default(),
            phone_number: if business {
                Some(self.user.phone_number.clone().unwrap_or_default())
            } else {
                None
            },
            address: if business {
                Some(self.user.address.clone().unwrap_or_default())
            } else {
                None
            },
            has_profile_photo: self.user.profile_photo_url.is_some(),
        }
    }
}
