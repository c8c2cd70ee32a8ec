//! Media URL resolution.
//!
//! Stored media rows only carry object paths. Every URL handed to a client
//! goes through a [`MediaUrlSigner`], which either resolves the path against
//! a public base URL or appends an expiring HMAC signature.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use url::Url;

use crate::config::MediaConfig;
use crate::{AppError, AppResult};

type HmacSha256 = Hmac<Sha256>;

/// Resolved URLs for a single media item.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedMediaUrls {
    /// URL of the media object.
    pub media_url: String,
    /// URL of the thumbnail, when the media has one.
    pub thumbnail_url: Option<String>,
}

/// Turns stored object paths into client-usable URLs.
#[async_trait::async_trait]
pub trait MediaUrlSigner: Send + Sync {
    /// Resolve a single object path.
    async fn sign(&self, path: &str) -> AppResult<String>;

    /// Resolve a media path and its optional thumbnail.
    async fn sign_media(
        &self,
        media_path: &str,
        thumbnail_path: Option<&str>,
    ) -> AppResult<SignedMediaUrls> {
        let media_url = self.sign(media_path).await?;
        let thumbnail_url = match thumbnail_path {
            Some(path) => Some(self.sign(path).await?),
            None => None,
        };
        Ok(SignedMediaUrls {
            media_url,
            thumbnail_url,
        })
    }
}

/// Build the signer described by the media configuration.
pub fn signer_from_config(config: &MediaConfig) -> AppResult<Box<dyn MediaUrlSigner>> {
    match &config.signing_secret {
        Some(secret) => Ok(Box::new(HmacUrlSigner::new(
            &config.base_url,
            secret,
            config.url_ttl_secs,
        )?)),
        None => Ok(Box::new(PublicUrlSigner::new(&config.base_url)?)),
    }
}

fn parse_base(base_url: &str) -> AppResult<Url> {
    // A trailing slash keeps `join` from replacing the last path segment.
    let normalized = if base_url.ends_with('/') {
        base_url.to_string()
    } else {
        format!("{base_url}/")
    };
    Url::parse(&normalized)
        .map_err(|e| AppError::Config(format!("invalid media base url {base_url}: {e}")))
}

fn resolve(base: &Url, path: &str) -> AppResult<Url> {
    if path.starts_with("http://") || path.starts_with("https://") {
        return Url::parse(path).map_err(|e| AppError::Internal(format!("bad media url: {e}")));
    }
    base.join(path.trim_start_matches('/'))
        .map_err(|e| AppError::Internal(format!("bad media path {path}: {e}")))
}

/// Resolves paths against a public base URL without signing.
#[derive(Debug, Clone)]
pub struct PublicUrlSigner {
    base: Url,
}

impl PublicUrlSigner {
    /// Create a signer rooted at `base_url`.
    pub fn new(base_url: &str) -> AppResult<Self> {
        Ok(Self {
            base: parse_base(base_url)?,
        })
    }
}

#[async_trait::async_trait]
impl MediaUrlSigner for PublicUrlSigner {
    async fn sign(&self, path: &str) -> AppResult<String> {
        Ok(resolve(&self.base, path)?.to_string())
    }
}

/// Appends `expires` and an HMAC-SHA256 `signature` to each URL.
#[derive(Clone)]
pub struct HmacUrlSigner {
    base: Url,
    secret: String,
    ttl_secs: u64,
}

impl std::fmt::Debug for HmacUrlSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HmacUrlSigner")
            .field("base", &self.base.as_str())
            .field("ttl_secs", &self.ttl_secs)
            .finish_non_exhaustive()
    }
}

impl HmacUrlSigner {
    /// Create a signer rooted at `base_url`.
    pub fn new(base_url: &str, secret: &str, ttl_secs: u64) -> AppResult<Self> {
        if secret.is_empty() {
            return Err(AppError::Config("media signing secret is empty".to_string()));
        }
        Ok(Self {
            base: parse_base(base_url)?,
            secret: secret.to_string(),
            ttl_secs,
        })
    }

    /// Sign `path` as of `now`.
    pub fn sign_at(&self, path: &str, now: DateTime<Utc>) -> AppResult<String> {
        let mut url = resolve(&self.base, path)?;
        let expires = now.timestamp() + i64::try_from(self.ttl_secs).unwrap_or(i64::MAX / 2);
        let signature = self.signature(url.path(), expires)?;

        url.query_pairs_mut()
            .append_pair("expires", &expires.to_string())
            .append_pair("signature", &signature);
        Ok(url.to_string())
    }

    /// Check a signature produced by [`Self::sign_at`].
    pub fn verify(
        &self,
        url_path: &str,
        expires: i64,
        signature: &str,
        now: DateTime<Utc>,
    ) -> AppResult<bool> {
        if now.timestamp() > expires {
            return Ok(false);
        }
        let expected = hex::decode(signature).unwrap_or_default();
        let mut mac = self.mac()?;
        mac.update(Self::payload(url_path, expires).as_bytes());
        Ok(mac.verify_slice(&expected).is_ok())
    }

    fn mac(&self) -> AppResult<HmacSha256> {
        HmacSha256::new_from_slice(self.secret.as_bytes())
            .map_err(|e| AppError::Internal(format!("hmac key: {e}")))
    }

    fn payload(url_path: &str, expires: i64) -> String {
        format!("{url_path}\n{expires}")
    }

    fn signature(&self, url_path: &str, expires: i64) -> AppResult<String> {
        let mut mac = self.mac()?;
        mac.update(Self::payload(url_path, expires).as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }
}

#[async_trait::async_trait]
impl MediaUrlSigner for HmacUrlSigner {
    async fn sign(&self, path: &str) -> AppResult<String> {
        self.sign_at(path, Utc::now())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[tokio::test]
    async fn test_public_signer_joins_paths() {
        let signer = PublicUrlSigner::new("https://cdn.example.com/media").unwrap();
        assert_eq!(
            signer.sign("dish/abc.jpg").await.unwrap(),
            "https://cdn.example.com/media/dish/abc.jpg"
        );
        assert_eq!(
            signer.sign("/dish/abc.jpg").await.unwrap(),
            "https://cdn.example.com/media/dish/abc.jpg"
        );
    }

    #[tokio::test]
    async fn test_absolute_urls_pass_through() {
        let signer = PublicUrlSigner::new("https://cdn.example.com").unwrap();
        assert_eq!(
            signer.sign("https://other.example.com/a.png").await.unwrap(),
            "https://other.example.com/a.png"
        );
    }

    #[tokio::test]
    async fn test_sign_media_without_thumbnail() {
        let signer = PublicUrlSigner::new("https://cdn.example.com").unwrap();
        let urls = signer.sign_media("v/1.mp4", None).await.unwrap();
        assert_eq!(urls.media_url, "https://cdn.example.com/v/1.mp4");
        assert!(urls.thumbnail_url.is_none());
    }

    #[test]
    fn test_hmac_signature_roundtrip() {
        let signer = HmacUrlSigner::new("https://cdn.example.com", "secret", 60).unwrap();
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let signed = Url::parse(&signer.sign_at("dish/a.jpg", now).unwrap()).unwrap();

        let pairs: std::collections::HashMap<_, _> = signed.query_pairs().into_owned().collect();
        let expires: i64 = pairs["expires"].parse().unwrap();
        assert_eq!(expires, now.timestamp() + 60);

        assert!(signer
            .verify(signed.path(), expires, &pairs["signature"], now)
            .unwrap());
        assert!(!signer
            .verify("/dish/b.jpg", expires, &pairs["signature"], now)
            .unwrap());
    }

    #[test]
    fn test_hmac_signature_expires() {
        let signer = HmacUrlSigner::new("https://cdn.example.com", "secret", 60).unwrap();
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let signed = Url::parse(&signer.sign_at("a.jpg", now).unwrap()).unwrap();
        let pairs: std::collections::HashMap<_, _> = signed.query_pairs().into_owned().collect();
        let expires: i64 = pairs["expires"].parse().unwrap();

        let later = now + chrono::Duration::seconds(61);
        assert!(!signer
            .verify(signed.path(), expires, &pairs["signature"], later)
            .unwrap());
    }

    #[test]
    fn test_empty_secret_rejected() {
        assert!(matches!(
            HmacUrlSigner::new("https://cdn.example.com", "", 60),
            Err(AppError::Config(_))
        ));
    }
}
