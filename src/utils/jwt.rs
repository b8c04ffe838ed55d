// src/utils/jwt.rs

use std::{
    fmt,
    str::FromStr,
    time::{SystemTime, UNIX_EPOCH},
};

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode, header},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::{config::Config, error::AppError, lifecycle::Contributor};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Host,
    Teacher,
    Student,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Host => "host",
            Role::Teacher => "teacher",
            Role::Student => "student",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "host" => Ok(Role::Host),
            "teacher" => Ok(Role::Teacher),
            "student" => Ok(Role::Student),
            other => Err(AppError::BadRequest(format!("Unknown role '{}'", other))),
        }
    }
}

/// JWT Claims structure.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Claims {
    /// Subject - Stores the User ID (as string).
    pub sub: String,
    pub role: Role,
    /// Display name used to attribute contributed questions.
    pub name: String,
    /// Teaching subject, present for teachers only.
    #[serde(default)]
    pub subject: Option<String>,
    /// Expiration time as Unix timestamp.
    pub exp: usize,
}

impl Claims {
    pub fn user_id(&self) -> Result<i64, AppError> {
        self.sub
            .parse::<i64>()
            .map_err(|_| AppError::AuthError("Invalid token subject".to_string()))
    }

    /// Identity of a teacher for the contribution lifecycle.
    pub fn contributor(&self) -> Result<Contributor, AppError> {
        let subject = self
            .subject
            .clone()
            .ok_or_else(|| AppError::Forbidden("No subject is assigned to this account".to_string()))?;

        Ok(Contributor {
            teacher_id: self.user_id()?,
            display_name: self.name.clone(),
            subject,
        })
    }
}

/// Identity carried into a freshly signed token.
pub struct TokenSubject<'a> {
    pub id: i64,
    pub role: Role,
    pub display_name: &'a str,
    pub subject: Option<&'a str>,
}

/// Signs a new JWT for the user.
pub fn sign_jwt(
    user: TokenSubject<'_>,
    secret: &str,
    expiration_seconds: u64,
) -> Result<String, AppError> {
    // Calculate expiration: current time + expiration_seconds
    let expiration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .as_secs() as usize
        + expiration_seconds as usize;

    let claims = Claims {
        sub: user.id.to_string(),
        role: user.role,
        name: user.display_name.to_owned(),
        subject: user.subject.map(str::to_owned),
        exp: expiration,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::InternalServerError(e.to_string()))
}

/// Verifies and decodes a JWT string.
///
/// Returns the `Claims` if valid, otherwise returns an `AppError`.
pub fn verify_jwt(token: &str, secret: &str) -> Result<Claims, AppError> {
    let token_data = decode(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::AuthError("Invalid token".to_string()))?;

    Ok(token_data.claims)
}

/// Axum Middleware: Authentication.
///
/// Intercepts requests, validates the 'Authorization: Bearer <token>' header.
/// If valid, injects `Claims` into the request extensions for handlers to use.
/// If invalid, returns 401 Unauthorized.
pub async fn auth_middleware(
    State(config): State<Config>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let token = match auth_header.and_then(|h| h.strip_prefix("Bearer ")) {
        Some(token) => token,
        None => return Err(StatusCode::UNAUTHORIZED),
    };

    match verify_jwt(token, &config.jwt_secret) {
        Ok(claims) => {
            req.extensions_mut().insert(claims);
            Ok(next.run(req).await)
        }
        Err(_) => Err(StatusCode::UNAUTHORIZED),
    }
}

/// Must run AFTER `auth_middleware`. 403 unless the injected claims carry `role`.
fn require_role(req: &Request<Body>, role: Role) -> Result<(), StatusCode> {
    let claims = req
        .extensions()
        .get::<Claims>()
        .ok_or(StatusCode::UNAUTHORIZED)?;

    if claims.role != role {
        return Err(StatusCode::FORBIDDEN);
    }
    Ok(())
}

pub async fn host_middleware(req: Request<Body>, next: Next) -> Result<Response, StatusCode> {
    require_role(&req, Role::Host)?;
    Ok(next.run(req).await)
}

pub async fn teacher_middleware(req: Request<Body>, next: Next) -> Result<Response, StatusCode> {
    require_role(&req, Role::Teacher)?;
    Ok(next.run(req).await)
}

pub async fn student_middleware(req: Request<Body>, next: Next) -> Result<Response, StatusCode> {
    require_role(&req, Role::Student)?;
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn teacher_token_round_trip() {
        let token = sign_jwt(
            TokenSubject {
                id: 42,
                role: Role::Teacher,
                display_name: "Ms. Okafor",
                subject: Some("English"),
            },
            "secret",
            60,
        )
        .unwrap();

        let claims = verify_jwt(&token, "secret").unwrap();
        let contributor = claims.contributor().unwrap();

        assert_eq!(claims.role, Role::Teacher);
        assert_eq!(contributor.teacher_id, 42);
        assert_eq!(contributor.display_name, "Ms. Okafor");
        assert_eq!(contributor.subject, "English");
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = sign_jwt(
            TokenSubject {
                id: 1,
                role: Role::Student,
                display_name: "Sam",
                subject: None,
            },
            "secret",
            60,
        )
        .unwrap();

        assert!(matches!(
            verify_jwt(&token, "other"),
            Err(AppError::AuthError(_))
        ));
    }

    #[test]
    fn contributor_requires_subject() {
        let claims = Claims {
            sub: "3".to_string(),
            role: Role::Teacher,
            name: "T".to_string(),
            subject: None,
            exp: 0,
        };
        assert!(matches!(claims.contributor(), Err(AppError::Forbidden(_))));
    }
}
