//! Read-only member projection used by follow-up targeting.
//!
//! Members are owned by the remote roster service; core only reads them.
//! `id` and `is_active` drive algorithms, every other field is display
//! metadata passed through unchanged.

use serde::{Deserialize, Serialize};

/// Opaque member identifier assigned by the roster service.
pub type MemberId = String;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: MemberId,
    pub first_name: String,
    pub last_name: String,
    pub phone_primary: Option<String>,
    pub is_active: bool,
    /// Zone/area reference.
    pub area_id: Option<String>,
    pub leader_id: Option<String>,
}

impl Member {
    /// Creates an active member with empty optional metadata.
    pub fn new(
        id: impl Into<MemberId>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            phone_primary: None,
            is_active: true,
            area_id: None,
            leader_id: None,
        }
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
            .trim()
            .to_string()
    }
}
