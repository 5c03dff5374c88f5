use std::fmt;

/// Who is calling into the lifecycle. Token verification happens at the
/// edge; the core only needs the resolved role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Caller {
    Anonymous,
    Customer(String),
    Admin(String),
}

impl Caller {
    pub fn is_admin(&self) -> bool {
        matches!(self, Caller::Admin(_))
    }

    /// Identity to link a new booking to. Admin-entered bookings are not
    /// linked to the admin.
    pub fn user_id(&self) -> Option<&str> {
        match self {
            Caller::Customer(id) => Some(id),
            _ => None,
        }
    }
}

impl fmt::Display for Caller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Caller::Anonymous => write!(f, "anonymous"),
            Caller::Customer(id) => write!(f, "customer:{}", id),
            Caller::Admin(id) => write!(f, "admin:{}", id),
        }
    }
}
