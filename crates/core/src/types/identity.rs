//! Identity of the user who completed the platform login.

use serde::{Deserialize, Serialize};

use super::id::{ExternalUserId, VendorId};

/// Greeting used by the dashboard when the profile carried no usable name.
pub const GENERIC_DISPLAY_NAME: &str = "Vendor";

/// Profile of the authenticated upstream user.
///
/// Derived read-only from the platform's "current user" endpoint. A missing
/// `display_name` is a partial failure: login still completes, but the
/// dashboard falls back to [`GENERIC_DISPLAY_NAME`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpstreamIdentity {
    /// User ID as issued by the platform.
    pub external_user_id: ExternalUserId,
    /// Human readable name, if the profile exposed one.
    pub display_name: Option<String>,
    /// Vendor the user manages, if the profile exposed one.
    pub vendor_id: Option<VendorId>,
}

impl UpstreamIdentity {
    /// Create an identity with only the required user ID.
    #[must_use]
    pub fn new(external_user_id: impl Into<ExternalUserId>) -> Self {
        Self {
            external_user_id: external_user_id.into(),
            display_name: None,
            vendor_id: None,
        }
    }

    /// Set the display name. Blank names are ignored.
    #[must_use]
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        let trimmed = name.trim();
        self.display_name = (!trimmed.is_empty()).then(|| trimmed.to_owned());
        self
    }

    /// Set the vendor ID.
    #[must_use]
    pub fn with_vendor_id(mut self, vendor_id: impl Into<VendorId>) -> Self {
        self.vendor_id = Some(vendor_id.into());
        self
    }

    /// Whether the profile resolved to a usable display name.
    #[must_use]
    pub const fn has_display_name(&self) -> bool {
        self.display_name.is_some()
    }

    /// Name to greet the user with on the dashboard.
    #[must_use]
    pub fn greeting_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(GENERIC_DISPLAY_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_greeting_falls_back_to_generic() {
        let identity = UpstreamIdentity::new("u-1");
        assert!(!identity.has_display_name());
        assert_eq!(identity.greeting_name(), GENERIC_DISPLAY_NAME);
    }

    #[test]
    fn test_blank_display_name_is_ignored() {
        let identity = UpstreamIdentity::new("u-1").with_display_name("   ");
        assert_eq!(identity.display_name, None);
    }

    #[test]
    fn test_display_name_is_trimmed() {
        let identity = UpstreamIdentity::new("u-1").with_display_name("  Ada Lovelace ");
        assert_eq!(identity.greeting_name(), "Ada Lovelace");
    }

    #[test]
    fn test_vendor_id() {
        let identity = UpstreamIdentity::new("u-1").with_vendor_id("v-9");
        assert_eq!(identity.vendor_id, Some(VendorId::new("v-9")));
    }
}
