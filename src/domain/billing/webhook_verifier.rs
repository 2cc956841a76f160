//! Stripe webhook signature verification.
//!
//! Implements secure verification of Stripe webhook signatures using HMAC-SHA256.
//! Includes timestamp validation to prevent replay attacks.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::stripe_event::StripeEvent;
use super::webhook_errors::WebhookError;

/// Maximum allowed age for webhook events (5 minutes).
const MAX_EVENT_AGE_SECS: i64 = 300;

/// Maximum allowed clock skew for future events (1 minute).
const MAX_CLOCK_SKEW_SECS: i64 = 60;

/// Parsed components from the Stripe-Signature header.
///
/// Format: `t=<timestamp>,v1=<signature>[,v0=<legacy>]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    /// Unix timestamp when the signature was generated.
    pub timestamp: i64,
    /// v1 signature (HMAC-SHA256).
    pub v1_signature: Vec<u8>,
    /// Optional v0 legacy signature.
    pub v0_signature: Option<Vec<u8>>,
}

impl SignatureHeader {
    /// Parses a Stripe-Signature header string.
    ///
    /// # Errors
    ///
    /// Returns `WebhookError::ParseError` if the header format is invalid.
    pub fn parse(header: &str) -> Result<Self, WebhookError> {
        let mut timestamp: Option<i64> = None;
        let mut v1_signature: Option<Vec<u8>> = None;
        let mut v0_signature: Option<Vec<u8>> = None;

        for part in header.split(',') {
            let (key, value) = part
                .split_once('=')
                .ok_or_else(|| WebhookError::ParseError("invalid header format".to_string()))?;

            match key.trim() {
                "t" => {
                    timestamp = Some(value.trim().parse().map_err(|_| {
                        WebhookError::ParseError("invalid timestamp".to_string())
                    })?);
                }
                "v1" => {
                    v1_signature = Some(hex_decode(value.trim()).ok_or_else(|| {
                        WebhookError::ParseError("invalid v1 signature hex".to_string())
                    })?);
                }
                "v0" => {
                    v0_signature = Some(hex_decode(value.trim()).ok_or_else(|| {
                        WebhookError::ParseError("invalid v0 signature hex".to_string())
                    })?);
                }
                _ => {
                    // Ignore unknown fields for forward compatibility
                }
            }
        }

        let timestamp =
            timestamp.ok_or_else(|| WebhookError::ParseError("missing timestamp".to_string()))?;
        let v1_signature = v1_signature
            .ok_or_else(|| WebhookError::ParseError("missing v1 signature".to_string()))?;

        Ok(SignatureHeader {
            timestamp,
            v1_signature,
            v0_signature,
        })
    }
}

/// Decode a hex string to bytes.
fn hex_decode(hex: &str) -> Option<Vec<u8>> {
    if hex.len() % 2 != 0 {
        return None;
    }

    let mut bytes = Vec::with_capacity(hex.len() / 2);
    for i in (0..hex.len()).step_by(2) {
        let byte = u8::from_str_radix(hex.get(i..i + 2)?, 16).ok()?;
        bytes.push(byte);
    }
    Some(bytes)
}

/// Encode bytes to hex string.
#[cfg(test)]
fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Verifier for Stripe webhook signatures.
pub struct StripeWebhookVerifier {
    /// The webhook signing secret from the Stripe dashboard.
    secret: String,
}

impl StripeWebhookVerifier {
    /// Creates a new verifier with the given webhook secret.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Verifies the webhook signature and parses the event.
    ///
    /// # Verification Steps
    ///
    /// 1. Parse the signature header
    /// 2. Validate timestamp is within acceptable range
    /// 3. Compute expected signature using HMAC-SHA256
    /// 4. Compare signatures using constant-time comparison
    /// 5. Parse the JSON payload into a StripeEvent
    ///
    /// # Errors
    ///
    /// - `InvalidSignature` - Signature verification failed
    /// - `TimestampOutOfRange` - Event is older than 5 minutes
    /// - `InvalidTimestamp` - Event timestamp is in the future
    /// - `ParseError` - Failed to parse header or JSON payload
    pub fn verify_and_parse(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> Result<StripeEvent, WebhookError> {
        // 1. Parse signature header
        let header = SignatureHeader::parse(signature_header)?;

        // 2. Validate timestamp
        self.validate_timestamp(header.timestamp)?;

        // 3. Compute expected signature
        let expected_signature = self.compute_signature(header.timestamp, payload);

        // 4. Compare signatures (constant-time)
        if !constant_time_compare(&expected_signature, &header.v1_signature) {
            return Err(WebhookError::InvalidSignature);
        }

        // 5. Parse event
        let event: StripeEvent = serde_json::from_slice(payload)
            .map_err(|e| WebhookError::ParseError(e.to_string()))?;

        Ok(event)
    }

    /// Validates that the timestamp is within acceptable bounds.
    fn validate_timestamp(&self, timestamp: i64) -> Result<(), WebhookError> {
        let now = chrono::Utc::now().timestamp();

        // The header timestamp is attacker-controlled and unauthenticated at
        // this point; the subtraction must not overflow on extreme values.
        let Some(age) = now.checked_sub(timestamp) else {
            return Err(WebhookError::InvalidTimestamp);
        };

        // Reject events that are too old
        if age > MAX_EVENT_AGE_SECS {
            return Err(WebhookError::TimestampOutOfRange);
        }

        // Reject events from the future (with clock skew tolerance)
        if age < -MAX_CLOCK_SKEW_SECS {
            return Err(WebhookError::InvalidTimestamp);
        }

        Ok(())
    }

    /// Computes the HMAC-SHA256 signature for the given timestamp and payload.
    fn compute_signature(&self, timestamp: i64, payload: &[u8]) -> Vec<u8> {
        let signed_payload = format!("{}.{}", timestamp, String::from_utf8_lossy(payload));

        let mut mac =
            Hmac::<Sha256>::new_from_slice(self.secret.as_bytes()).expect("HMAC accepts any key");
        mac.update(signed_payload.as_bytes());
        mac.finalize().into_bytes().to_vec()
    }
}

/// Performs constant-time comparison of two byte slices.
///
/// This prevents timing attacks that could leak information about the expected signature.
fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

/// Computes HMAC-SHA256 for use in test fixtures.
#[cfg(test)]
pub fn compute_test_signature(secret: &str, timestamp: i64, payload: &str) -> String {
    let signed_payload = format!("{}.{}", timestamp, payload);
    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key");
    mac.update(signed_payload.as_bytes());
    hex_encode(&mac.finalize().into_bytes())
}
