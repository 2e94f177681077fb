use serde::{Deserialize, Serialize};

/// Identity decoded from a validated token, attached to protected requests
/// by the auth guard.
#[derive(Serialize, Deserialize, Clone)]
pub struct CurrentUser {
    pub id: String,
    pub email: String,
}
