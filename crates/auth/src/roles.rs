use serde::{Deserialize, Serialize};

/// Role used for RBAC at the API boundary.
///
/// The role set is closed: customers own carts; managers and admins run the
/// administrative operations (view/wipe all carts).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum Role {
    Customer,
    Manager,
    Admin,
}

impl Role {
    /// Managers and admins share the administrative surface.
    pub fn is_staff(self) -> bool {
        matches!(self, Role::Manager | Role::Admin)
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            Role::Customer => "Customer",
            Role::Manager => "Manager",
            Role::Admin => "Admin",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn staff_split() {
        assert!(!Role::Customer.is_staff());
        assert!(Role::Manager.is_staff());
        assert!(Role::Admin.is_staff());
    }

    #[test]
    fn serde_uses_pascal_case_names() {
        assert_eq!(serde_json::to_string(&Role::Customer).unwrap(), "\"Customer\"");
        let role: Role = serde_json::from_str("\"Manager\"").unwrap();
        assert_eq!(role, Role::Manager);
    }
}
