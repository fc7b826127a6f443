//! Pay-per-call gate for tools.
//!
//! [`FacilitatorGate`] speaks the x402 "exact" scheme: the caller attaches a
//! signed payment payload under `_meta["x402/payment"]`, the gate asks a
//! facilitator to verify it before the tool runs and to settle it after the
//! tool produced a result. [`OpenGate`] lets every call through.

use std::time::Duration;

use async_trait::async_trait;
use newsgate_core::{NewsgateError, PaymentConfig};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

/// Request `_meta` key carrying the payment payload.
pub const PAYMENT_META_KEY: &str = "x402/payment";

/// Protocol version sent to the facilitator and advertised to callers.
pub const X402_VERSION: u32 = 1;

const RESOURCE: &str = "mcp://tool/business_news";
const DESCRIPTION: &str = "Business-relevant top headlines";
const MAX_TIMEOUT_SECONDS: u64 = 60;

/// What a caller must pay, on one network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequirements {
    /// Payment scheme; always `"exact"`.
    pub scheme: String,
    /// Network name, e.g. `"base-sepolia"`.
    pub network: String,
    /// Price in the asset's atomic units.
    pub max_amount_required: String,
    /// Resource being paid for.
    pub resource: String,
    /// Human-readable description of the resource.
    pub description: String,
    /// MIME type of the paid response.
    pub mime_type: String,
    /// Recipient address.
    pub pay_to: String,
    /// How long a signed payment stays valid.
    pub max_timeout_seconds: u64,
    /// Token contract address.
    pub asset: String,
}

/// Errors from the payment gate. All surface to callers as an error envelope.
#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    /// No payment was attached; `accepts` lists the acceptable options.
    #[error("Payment required")]
    Required {
        /// Acceptable payment options.
        accepts: Vec<PaymentRequirements>,
    },

    /// The facilitator rejected the payment, or it did not match any option.
    #[error("Payment rejected: {0}")]
    Rejected(String),

    /// The payment verified but could not be settled.
    #[error("Payment settlement failed: {0}")]
    Settlement(String),

    /// The facilitator could not be reached or answered unexpectedly.
    #[error("Payment facilitator error: {0}")]
    Facilitator(String),

    /// Missing gate configuration, e.g. no facilitator URL.
    #[error("{0}")]
    Config(String),
}

impl PaymentError {
    /// JSON envelope returned to the caller.
    ///
    /// # Examples
    ///
    /// ```
    /// use newsgate_mcp::payment::PaymentError;
    ///
    /// let err = PaymentError::Config("Missing FACILITATOR_URL".into());
    /// assert_eq!(err.envelope(), serde_json::json!({"error": "Missing FACILITATOR_URL"}));
    /// ```
    pub fn envelope(&self) -> Value {
        match self {
            Self::Required { accepts } => serde_json::json!({
                "error": self.to_string(),
                "x402Version": X402_VERSION,
                "accepts": accepts,
            }),
            _ => serde_json::json!({ "error": self.to_string() }),
        }
    }
}

/// Proof that a call may proceed; handed back to [`PaymentGate::settle`].
#[derive(Debug, Clone, PartialEq)]
pub enum PaymentTicket {
    /// No payment was needed.
    Free,
    /// A facilitator-verified payment awaiting settlement.
    Verified {
        /// Payload the caller attached.
        payload: Value,
        /// Option the payload was verified against.
        requirements: PaymentRequirements,
        /// Paying address reported by the facilitator.
        payer: Option<String>,
    },
}

/// Gate in front of paid tools.
#[async_trait]
pub trait PaymentGate: Send + Sync {
    /// Check the attached payment before the tool runs.
    ///
    /// # Errors
    ///
    /// Returns a [`PaymentError`] when the call must not proceed.
    async fn verify(&self, payment: Option<&Value>) -> Result<PaymentTicket, PaymentError>;

    /// Settle a verified payment after the tool succeeded.
    ///
    /// # Errors
    ///
    /// Returns [`PaymentError::Settlement`] or
    /// [`PaymentError::Facilitator`] if settlement fails.
    async fn settle(&self, ticket: PaymentTicket) -> Result<(), PaymentError>;
}

/// Gate that charges nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenGate;

#[async_trait]
impl PaymentGate for OpenGate {
    async fn verify(&self, _payment: Option<&Value>) -> Result<PaymentTicket, PaymentError> {
        Ok(PaymentTicket::Free)
    }

    async fn settle(&self, _ticket: PaymentTicket) -> Result<(), PaymentError> {
        Ok(())
    }
}

/// x402 gate backed by a facilitator service.
///
/// Configuration is only checked when a call arrives, so the server starts
/// even when payment settings are incomplete.
///
/// # Examples
///
/// ```
/// use newsgate_core::PaymentConfig;
/// use newsgate_mcp::payment::FacilitatorGate;
///
/// let gate = FacilitatorGate::new(&PaymentConfig::default()).unwrap();
/// // no recipient addresses configured yet
/// assert!(gate.requirements().is_err());
/// ```
pub struct FacilitatorGate {
    client: reqwest::Client,
    config: PaymentConfig,
}

impl std::fmt::Debug for FacilitatorGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FacilitatorGate")
            .field("facilitator_url", &self.config.facilitator_url)
            .field("price", &self.config.price)
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FacilitatorRequest<'a> {
    x402_version: u32,
    payment_payload: &'a Value,
    payment_requirements: &'a PaymentRequirements,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct VerifyResponse {
    is_valid: bool,
    invalid_reason: Option<String>,
    payer: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettleResponse {
    success: bool,
    error_reason: Option<String>,
    transaction: Option<String>,
    network: Option<String>,
}

impl FacilitatorGate {
    /// Create a gate from payment configuration.
    ///
    /// # Errors
    ///
    /// Returns [`NewsgateError::Payment`] if the HTTP client cannot be built.
    pub fn new(config: &PaymentConfig) -> Result<Self, NewsgateError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| NewsgateError::Payment(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    /// Payment options for every network that has a recipient and an asset.
    ///
    /// # Errors
    ///
    /// Returns [`PaymentError::Config`] if no network is usable or the price
    /// cannot be parsed.
    pub fn requirements(&self) -> Result<Vec<PaymentRequirements>, PaymentError> {
        let mut accepts = Vec::new();
        for (network, settings) in &self.config.networks {
            let (Some(pay_to), Some(asset)) = (&settings.pay_to, &settings.asset) else {
                continue;
            };
            accepts.push(PaymentRequirements {
                scheme: "exact".into(),
                network: network.clone(),
                max_amount_required: usd_to_atomic(&self.config.price, settings.decimals)?,
                resource: RESOURCE.into(),
                description: DESCRIPTION.into(),
                mime_type: "application/json".into(),
                pay_to: pay_to.clone(),
                max_timeout_seconds: MAX_TIMEOUT_SECONDS,
                asset: asset.clone(),
            });
        }
        if accepts.is_empty() {
            return Err(PaymentError::Config(
                "No payment recipients configured".into(),
            ));
        }
        Ok(accepts)
    }

    fn facilitator_url(&self) -> Result<&str, PaymentError> {
        self.config
            .facilitator_url
            .as_deref()
            .map(|url| url.trim_end_matches('/'))
            .ok_or_else(|| PaymentError::Config("Missing FACILITATOR_URL".into()))
    }

    async fn post<T: for<'de> Deserialize<'de>>(
        &self,
        endpoint: &str,
        payload: &Value,
        requirements: &PaymentRequirements,
    ) -> Result<T, PaymentError> {
        let url = format!("{}/{endpoint}", self.facilitator_url()?);
        let body = FacilitatorRequest {
            x402_version: X402_VERSION,
            payment_payload: payload,
            payment_requirements: requirements,
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| PaymentError::Facilitator(format!("{endpoint} request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(PaymentError::Facilitator(format!(
                "{endpoint} returned {status}: {body_text}"
            )));
        }

        response
            .json()
            .await
            .map_err(|e| PaymentError::Facilitator(format!("invalid {endpoint} response: {e}")))
    }
}

#[async_trait]
impl PaymentGate for FacilitatorGate {
    async fn verify(&self, payment: Option<&Value>) -> Result<PaymentTicket, PaymentError> {
        self.facilitator_url()?;
        let accepts = self.requirements()?;

        let Some(payload) = payment else {
            return Err(PaymentError::Required { accepts });
        };

        let network = payload
            .get("network")
            .and_then(Value::as_str)
            .ok_or_else(|| PaymentError::Rejected("payment payload has no network".into()))?;
        let requirements = accepts
            .into_iter()
            .find(|r| r.network == network)
            .ok_or_else(|| PaymentError::Rejected(format!("unsupported network '{network}'")))?;

        let verdict: VerifyResponse = self.post("verify", payload, &requirements).await?;
        if !verdict.is_valid {
            let reason = verdict
                .invalid_reason
                .unwrap_or_else(|| "invalid payment".into());
            warn!(%network, %reason, "payment rejected");
            return Err(PaymentError::Rejected(reason));
        }

        Ok(PaymentTicket::Verified {
            payload: payload.clone(),
            requirements,
            payer: verdict.payer,
        })
    }

    async fn settle(&self, ticket: PaymentTicket) -> Result<(), PaymentError> {
        let PaymentTicket::Verified {
            payload,
            requirements,
            payer,
        } = ticket
        else {
            return Ok(());
        };

        let receipt: SettleResponse = self.post("settle", &payload, &requirements).await?;
        if !receipt.success {
            return Err(PaymentError::Settlement(
                receipt
                    .error_reason
                    .unwrap_or_else(|| "unknown reason".into()),
            ));
        }

        info!(
            network = receipt.network.as_deref().unwrap_or(&requirements.network),
            transaction = receipt.transaction.as_deref().unwrap_or("-"),
            payer = payer.as_deref().unwrap_or("-"),
            "payment settled"
        );
        Ok(())
    }
}

/// Convert a USD price such as `"$0.01"` to atomic token units.
///
/// # Errors
///
/// Returns [`PaymentError::Config`] if the price is not a plain decimal or
/// has more fractional digits than the token supports.
///
/// # Examples
///
/// ```
/// use newsgate_mcp::payment::usd_to_atomic;
///
/// assert_eq!(usd_to_atomic("$0.01", 6).unwrap(), "10000");
/// assert_eq!(usd_to_atomic("2", 6).unwrap(), "2000000");
/// ```
pub fn usd_to_atomic(price: &str, decimals: u32) -> Result<String, PaymentError> {
    let invalid = || PaymentError::Config(format!("invalid price '{price}'"));

    let trimmed = price.trim();
    let amount = trimmed.strip_prefix('$').unwrap_or(trimmed).trim();
    let (whole, frac) = amount.split_once('.').unwrap_or((amount, ""));

    let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if (whole.is_empty() && frac.is_empty()) || !all_digits(whole) || !all_digits(frac) {
        return Err(invalid());
    }
    if frac.len() > decimals as usize {
        return Err(PaymentError::Config(format!(
            "price '{price}' has more than {decimals} decimal places"
        )));
    }

    let scale = 10u128.checked_pow(decimals).ok_or_else(invalid)?;
    let whole: u128 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| invalid())?
    };
    let frac_padded = format!("{frac:0<width$}", width = decimals as usize);
    let frac: u128 = if frac_padded.is_empty() {
        0
    } else {
        frac_padded.parse().map_err(|_| invalid())?
    };

    whole
        .checked_mul(scale)
        .and_then(|w| w.checked_add(frac))
        .map(|total| total.to_string())
        .ok_or_else(invalid)
}
