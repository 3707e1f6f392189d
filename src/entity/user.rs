// SPDX-License-Identifier: MIT OR Apache-2.0
// SPDX-FileCopyrightText: 2025-2026 Marquee Contributors

use serde::{Deserialize, Serialize};

use crate::validate::{is_email, Validate};

/// The signed-in user as the machines see it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub token: String,
}

impl Validate for User {
    fn validate(&self) -> Result<(), String> {
        if self.id.is_empty() {
            return Err("id: must not be empty".to_string());
        }
        if !is_email(&self.email) {
            return Err(format!("email: `{}` is not a valid email", self.email));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub success: bool,
    pub user: User,
}

impl Validate for LoginResponse {
    fn validate(&self) -> Result<(), String> {
        self.user.validate().map_err(|e| format!("user.{e}"))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl Validate for LoginRequest {
    fn validate(&self) -> Result<(), String> {
        check_email(&self.email)?;
        check_password(&self.password)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl Validate for RegisterRequest {
    fn validate(&self) -> Result<(), String> {
        if self.name.chars().count() < 2 {
            return Err("Name must be at least 2 characters".to_string());
        }
        check_email(&self.email)?;
        check_password(&self.password)
    }
}

fn check_email(email: &str) -> Result<(), String> {
    if is_email(email) {
        Ok(())
    } else {
        Err("Invalid email address".to_string())
    }
}

fn check_password(password: &str) -> Result<(), String> {
    if password.chars().count() < 6 {
        Err("Password must be at least 6 characters".to_string())
    } else {
        Ok(())
    }
}
