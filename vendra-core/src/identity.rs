use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The opaque caller identity handed down by the transport layer.
///
/// Credentials are verified upstream (JWT middleware, session cookie); this
/// core only cares about who is acting, never how they proved it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum CallerIdentity {
    Customer { user_id: Uuid, email: String },
    Supplier { user_id: Uuid, supplier_id: Uuid },
    Admin { user_id: Uuid },
    Anonymous { session_id: String },
}

impl CallerIdentity {
    /// The session identifier carts are keyed by. Authenticated callers use
    /// their user id, anonymous callers their browser session id.
    pub fn cart_key(&self) -> String {
        match self {
            CallerIdentity::Customer { user_id, .. }
            | CallerIdentity::Supplier { user_id, .. }
            | CallerIdentity::Admin { user_id } => format!("user:{}", user_id),
            CallerIdentity::Anonymous { session_id } => format!("session:{}", session_id),
        }
    }

    /// The owner reference recorded on orders. Anonymous orders get a
    /// session-derived pseudo-id instead of a user id.
    pub fn customer_ref(&self) -> String {
        match self {
            CallerIdentity::Customer { user_id, .. }
            | CallerIdentity::Supplier { user_id, .. }
            | CallerIdentity::Admin { user_id } => user_id.to_string(),
            CallerIdentity::Anonymous { session_id } => format!("guest:{}", session_id),
        }
    }

    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            CallerIdentity::Customer { user_id, .. }
            | CallerIdentity::Supplier { user_id, .. }
            | CallerIdentity::Admin { user_id } => Some(*user_id),
            CallerIdentity::Anonymous { .. } => None,
        }
    }

    pub fn email(&self) -> Option<&str> {
        match self {
            CallerIdentity::Customer { email, .. } => Some(email),
            _ => None,
        }
    }

    pub fn supplier_id(&self) -> Option<Uuid> {
        match self {
            CallerIdentity::Supplier { supplier_id, .. } => Some(*supplier_id),
            _ => None,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, CallerIdentity::Admin { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anonymous_caller_gets_session_derived_refs() {
        let caller = CallerIdentity::Anonymous {
            session_id: "abc123".to_string(),
        };
        assert_eq!(caller.cart_key(), "session:abc123");
        assert_eq!(caller.customer_ref(), "guest:abc123");
        assert_eq!(caller.user_id(), None);
    }

    #[test]
    fn test_customer_refs_use_user_id() {
        let user_id = Uuid::new_v4();
        let caller = CallerIdentity::Customer {
            user_id,
            email: "ada@example.com".to_string(),
        };
        assert_eq!(caller.cart_key(), format!("user:{}", user_id));
        assert_eq!(caller.customer_ref(), user_id.to_string());
        assert!(!caller.is_admin());
    }
}
