//! Network-free decoding of a credential's embedded claims.
//!
//! Credentials use JWT compact framing: `header.payload.signature`, each
//! segment base64url encoded. The signature is not verified here; the server
//! re-validates it on every call. Decoding only lets the session manager
//! reject an obviously broken credential before a round trip.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use ghars_core::UserId;
use serde_json::{Map, Value};

use crate::capability::{AdminCapabilities, Capability};
use crate::credential::Credential;
use crate::error::MalformedCredential;
use crate::role::Role;

/// Claims read from a credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claims {
    subject_id: UserId,
    role: Role,
    expires_at: DateTime<Utc>,
    capabilities: AdminCapabilities,
}

impl Claims {
    /// Creates claims from their parts.
    #[must_use]
    pub fn new(subject_id: UserId, role: Role, expires_at: DateTime<Utc>) -> Self {
        Self {
            subject_id,
            role,
            expires_at,
            capabilities: AdminCapabilities::none(),
        }
    }

    /// Returns a copy carrying the given capability grant.
    #[must_use]
    pub fn with_capabilities(mut self, capabilities: AdminCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Returns the account the credential was issued to.
    #[must_use]
    pub fn subject_id(&self) -> UserId {
        self.subject_id
    }

    /// Returns the role the credential was issued for.
    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    /// Returns when the credential stops being accepted.
    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Returns the capability flags embedded at issue time.
    ///
    /// Only admin credentials carry flags; a flag that is absent or not
    /// `true` reads as not granted.
    #[must_use]
    pub fn capabilities(&self) -> AdminCapabilities {
        self.capabilities
    }

    /// Returns true if the expiry passed more than `leeway` before `now`.
    ///
    /// An expiry so far out that adding the leeway leaves chrono's range
    /// never counts as expired.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>, leeway: Duration) -> bool {
        self.expires_at
            .checked_add_signed(leeway)
            .is_some_and(|deadline| deadline <= now)
    }
}

/// Decodes the claims of a credential.
///
/// # Errors
///
/// Returns `MalformedCredential` if the framing is wrong, a segment is not
/// valid base64url JSON, or a required claim (`id`/`sub`, `role`, `exp`) is
/// missing or has the wrong type. Partial claims are never returned.
pub fn decode(credential: &Credential) -> Result<Claims, MalformedCredential> {
    let segments: Vec<&str> = credential.as_str().trim().split('.').collect();
    let [header, payload, signature] = segments.as_slice() else {
        return Err(MalformedCredential::new(format!(
            "expected 3 segments, found {}",
            segments.len()
        )));
    };

    if signature.is_empty() {
        return Err(MalformedCredential::new("empty signature segment"));
    }
    decode_segment(signature, "signature")?;

    json_object(&decode_segment(header, "header")?, "header")?;
    let payload = json_object(&decode_segment(payload, "payload")?, "payload")?;

    Ok(Claims {
        subject_id: subject_claim(&payload)?,
        role: role_claim(&payload)?,
        expires_at: expiry_claim(&payload)?,
        capabilities: capability_claims(&payload),
    })
}

fn decode_segment(segment: &str, name: &str) -> Result<Vec<u8>, MalformedCredential> {
    if segment.is_empty() {
        return Err(MalformedCredential::new(format!("empty {name} segment")));
    }
    URL_SAFE_NO_PAD
        .decode(segment.trim_end_matches('='))
        .map_err(|e| MalformedCredential::new(format!("{name} is not base64url: {e}")))
}

fn json_object(bytes: &[u8], name: &str) -> Result<Map<String, Value>, MalformedCredential> {
    match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(MalformedCredential::new(format!(
            "{name} is not a JSON object"
        ))),
        Err(e) => Err(MalformedCredential::new(format!(
            "{name} is not JSON: {e}"
        ))),
    }
}

fn subject_claim(payload: &Map<String, Value>) -> Result<UserId, MalformedCredential> {
    let value = payload
        .get("id")
        .or_else(|| payload.get("sub"))
        .ok_or_else(|| MalformedCredential::new("missing subject claim"))?;

    let raw = match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    raw.map(UserId::new)
        .ok_or_else(|| MalformedCredential::new(format!("invalid subject claim: {value}")))
}

fn role_claim(payload: &Map<String, Value>) -> Result<Role, MalformedCredential> {
    let value = payload
        .get("role")
        .ok_or_else(|| MalformedCredential::new("missing role claim"))?;

    value
        .as_str()
        .and_then(Role::from_wire)
        .ok_or_else(|| MalformedCredential::new(format!("invalid role claim: {value}")))
}

fn expiry_claim(payload: &Map<String, Value>) -> Result<DateTime<Utc>, MalformedCredential> {
    let value = payload
        .get("exp")
        .ok_or_else(|| MalformedCredential::new("missing exp claim"))?;

    // Fractional seconds are floored; sub-second precision is irrelevant
    // next to the expiry leeway.
    let seconds = match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.floor() as i64)),
        _ => None,
    };
    seconds
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .ok_or_else(|| MalformedCredential::new(format!("invalid exp claim: {value}")))
}

fn capability_claims(payload: &Map<String, Value>) -> AdminCapabilities {
    Capability::ALL
        .iter()
        .filter(|capability| payload.get(capability.flag_name()) == Some(&Value::Bool(true)))
        .fold(AdminCapabilities::none(), |caps, capability| caps.with(*capability))
}
