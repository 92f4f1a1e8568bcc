use serde::{Deserialize, Serialize};

// Owner login request body
#[derive(Deserialize, Serialize, Clone)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

// Successful login response
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct LoginResponse {
    pub success: bool,
    pub role: String,
}
