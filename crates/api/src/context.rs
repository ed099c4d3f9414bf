use voltmart_auth::Role;
use voltmart_core::CustomerId;

/// Principal context for a request (authenticated identity + role).
///
/// Inserted by the auth middleware; present on every protected route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    customer: CustomerId,
    role: Role,
}

impl PrincipalContext {
    pub fn new(customer: CustomerId, role: Role) -> Self {
        Self { customer, role }
    }

    pub fn customer(&self) -> &CustomerId {
        &self.customer
    }

    pub fn role(&self) -> Role {
        self.role
    }
}
