// src/utils/media.rs

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::{config::CloudinaryConfig, error::AppError};

/// Third-party host of question images. Questions only keep the URL and
/// public id; the host owns the bytes.
#[async_trait]
pub trait ImageHost: Send + Sync {
    async fn destroy(&self, public_id: &str) -> Result<(), AppError>;
}

/// Releases every image, logging failures instead of returning them.
/// Returns how many were released.
pub async fn release_all(host: &dyn ImageHost, public_ids: &[String]) -> usize {
    let mut released = 0;
    for public_id in public_ids {
        match host.destroy(public_id).await {
            Ok(()) => released += 1,
            Err(e) => tracing::warn!("Failed to release image {}: {}", public_id, e),
        }
    }
    released
}

/// Used when no image host is configured.
pub struct DisabledImageHost;

#[async_trait]
impl ImageHost for DisabledImageHost {
    async fn destroy(&self, public_id: &str) -> Result<(), AppError> {
        tracing::debug!("Image host disabled, not releasing {}", public_id);
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

/// Cloudinary upload API client (destroy only).
pub struct CloudinaryHost {
    client: reqwest::Client,
    config: CloudinaryConfig,
}

impl CloudinaryHost {
    pub fn new(config: CloudinaryConfig) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| AppError::InternalServerError(e.to_string()))?;
        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        format!(
            "https://api.cloudinary.com/v1_1/{}/image/destroy",
            self.config.cloud_name
        )
    }
}

/// Signature over the alphabetically ordered parameters followed by the secret.
fn sign(params: &[(&str, &str)], api_secret: &str) -> String {
    let mut sorted = params.to_vec();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    let joined = sorted
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(joined.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

#[async_trait]
impl ImageHost for CloudinaryHost {
    async fn destroy(&self, public_id: &str) -> Result<(), AppError> {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| AppError::InternalServerError(e.to_string()))?
            .as_secs()
            .to_string();

        let signature = sign(
            &[("public_id", public_id), ("timestamp", timestamp.as_str())],
            &self.config.api_secret,
        );

        let response = self
            .client
            .post(self.endpoint())
            .form(&[
                ("public_id", public_id),
                ("timestamp", timestamp.as_str()),
                ("api_key", self.config.api_key.as_str()),
                ("signature", signature.as_str()),
                ("signature_algorithm", "sha256"),
            ])
            .send()
            .await
            .map_err(|e| AppError::InternalServerError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AppError::InternalServerError(format!(
                "image host answered {}",
                response.status()
            )));
        }

        let body: DestroyResponse = response
            .json()
            .await
            .map_err(|e| AppError::InternalServerError(e.to_string()))?;

        // "not found" means it is already gone.
        match body.result.as_str() {
            "ok" | "not found" => Ok(()),
            other => Err(AppError::InternalServerError(format!(
                "image host refused destroy: {}",
                other
            ))),
        }
    }
}
