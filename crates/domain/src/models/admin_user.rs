//! Admin portal accounts and roles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

/// Role of an admin portal account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminRole {
    SuperAdmin,
    SurveyDesigner,
    #[default]
    Viewer,
}

impl AdminRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdminRole::SuperAdmin => "super_admin",
            AdminRole::SurveyDesigner => "survey_designer",
            AdminRole::Viewer => "viewer",
        }
    }

    /// Returns true if this role can create, edit, activate and delete surveys
    pub fn can_edit_surveys(&self) -> bool {
        matches!(self, AdminRole::SuperAdmin | AdminRole::SurveyDesigner)
    }

    /// Returns true if this role can manage other admin accounts
    pub fn can_manage_users(&self) -> bool {
        matches!(self, AdminRole::SuperAdmin)
    }
}

impl FromStr for AdminRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "super_admin" => Ok(AdminRole::SuperAdmin),
            "survey_designer" => Ok(AdminRole::SurveyDesigner),
            "viewer" => Ok(AdminRole::Viewer),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

impl fmt::Display for AdminRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An admin portal account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AdminUser {
    pub id: i64,
    pub username: String,
    pub full_name: String,
    pub role: AdminRole,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl AdminUser {
    /// Name shown in the portal, falling back to the username.
    pub fn display_name(&self) -> &str {
        let trimmed = self.full_name.trim();
        if trimmed.is_empty() {
            &self.username
        } else {
            trimmed
        }
    }
}

/// Account summary returned by login and the user endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminUserView {
    pub id: i64,
    pub username: String,
    pub full_name: String,
    pub role: AdminRole,
}

impl From<&AdminUser> for AdminUserView {
    fn from(user: &AdminUser) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            full_name: user.display_name().to_string(),
            role: user.role,
        }
    }
}

/// Wrapper for the user listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminUserList {
    pub results: Vec<AdminUserView>,
}

// ============================================================================
// Request DTOs
// ============================================================================

/// Login payload. Fields are optional so missing values map to a 400.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Successful login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access: String,
    pub refresh: String,
    pub user: AdminUserView,
}

/// Refresh payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RefreshRequest {
    pub refresh: Option<String>,
}

/// Refresh result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub access: String,
}

/// Password change for the signed-in account.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

/// Password reset of another account.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResetPasswordRequest {
    pub new_password: Option<String>,
}

/// Request payload for creating an admin account.
///
/// `role` stays a string so an unknown value can be reported as "Invalid role".
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CreateAdminUserRequest {
    #[validate(length(max = 150, message = "Username must be at most 150 characters"))]
    pub username: Option<String>,

    pub password: Option<String>,

    pub role: Option<String>,

    #[validate(length(max = 150, message = "Full name must be at most 150 characters"))]
    pub full_name: Option<String>,
}

/// Request payload for updating an admin account.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateAdminUserRequest {
    #[validate(length(max = 150, message = "Username must be at most 150 characters"))]
    pub username: Option<String>,

    pub role: Option<String>,

    #[validate(length(max = 150, message = "Full name must be at most 150 characters"))]
    pub full_name: Option<String>,

    pub is_active: Option<bool>,
}

/// Generic `{"detail": ...}` acknowledgement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailResponse {
    pub detail: String,
}

impl DetailResponse {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(full_name: &str) -> AdminUser {
        AdminUser {
            id: 1,
            username: "abebe".to_string(),
            full_name: full_name.to_string(),
            role: AdminRole::SurveyDesigner,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            last_login_at: None,
        }
    }

    #[test]
    fn test_role_permissions() {
        assert!(AdminRole::SuperAdmin.can_edit_surveys());
        assert!(AdminRole::SuperAdmin.can_manage_users());
        assert!(AdminRole::SurveyDesigner.can_edit_surveys());
        assert!(!AdminRole::SurveyDesigner.can_manage_users());
        assert!(!AdminRole::Viewer.can_edit_surveys());
        assert!(!AdminRole::Viewer.can_manage_users());
    }

    #[test]
    fn test_role_parsing_is_exact() {
        assert_eq!(
            "survey_designer".parse::<AdminRole>().unwrap(),
            AdminRole::SurveyDesigner
        );
        assert!("Super_Admin".parse::<AdminRole>().is_err());
        assert!("admin".parse::<AdminRole>().is_err());
        assert_eq!(AdminRole::default(), AdminRole::Viewer);
    }

    #[test]
    fn test_display_name_falls_back_to_username() {
        assert_eq!(user("").display_name(), "abebe");
        assert_eq!(user("   ").display_name(), "abebe");
        assert_eq!(user("Abebe Kebede").display_name(), "Abebe Kebede");
    }

    #[test]
    fn test_view_serialization() {
        let view = AdminUserView::from(&user(""));
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["full_name"], "abebe");
        assert_eq!(json["role"], "survey_designer");
    }
}
