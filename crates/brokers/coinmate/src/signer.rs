//! Authentication for CoinMate private endpoints.
//!
//! Every private call carries `clientId`, `nonce`, `publicKey` and
//! `signature` in its form body, where the signature is the uppercase hex
//! HMAC-SHA256 of `nonce + clientId + publicKey` keyed by the secret.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::collections::BTreeMap;
use tradelink_brokers_common::{urlencode, NonceGenerator};
use tradelink_core::*;

use crate::config::Credentials;

type HmacSha256 = Hmac<Sha256>;

pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Body and headers for one authenticated request.
#[derive(Debug, Clone, PartialEq)]
pub struct SignedPayload {
    pub nonce: u64,
    pub body: String,
    pub headers: BTreeMap<String, String>,
}

/// Signs private requests for one set of credentials.
///
/// Owns the nonce sequence for those credentials, so one signer should be
/// shared by every request made with them.
#[derive(Debug)]
pub struct RequestSigner {
    credentials: Credentials,
    nonces: NonceGenerator,
}

impl RequestSigner {
    pub fn new(credentials: Credentials) -> Self {
        Self::with_nonces(credentials, NonceGenerator::new())
    }

    pub fn with_nonces(credentials: Credentials, nonces: NonceGenerator) -> Self {
        Self {
            credentials,
            nonces,
        }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Build the signed form body for `params` using the next nonce.
    pub fn sign(&self, params: &Params) -> AdapterResult<SignedPayload> {
        let (client_id, api_key, secret) = self.require_credentials()?;
        let nonce = self.nonces.next();
        let body = signed_body(params, nonce, client_id, api_key, secret)?;

        let mut headers = BTreeMap::new();
        headers.insert("Content-Type".to_string(), FORM_CONTENT_TYPE.to_string());

        Ok(SignedPayload {
            nonce,
            body,
            headers,
        })
    }

    /// Check credentials without consuming a nonce.
    pub fn require_credentials(&self) -> AdapterResult<(&str, &str, &str)> {
        let client_id = present(&self.credentials.client_id).ok_or_else(|| {
            AdapterError::Authentication(
                "coinmate requires a client id (credentials.client_id) for authentication"
                    .to_string(),
            )
        })?;
        let api_key = present(&self.credentials.api_key).ok_or_else(|| {
            AdapterError::Authentication("coinmate requires an API key".to_string())
        })?;
        let secret = present(&self.credentials.secret).ok_or_else(|| {
            AdapterError::Authentication("coinmate requires an API secret".to_string())
        })?;
        Ok((client_id, api_key, secret))
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

/// Uppercase hex HMAC-SHA256 of `nonce + client_id + api_key`.
pub fn compute_signature(
    secret: &str,
    nonce: &str,
    client_id: &str,
    api_key: &str,
) -> AdapterResult<String> {
    let message = format!("{}{}{}", nonce, client_id, api_key);
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| AdapterError::Authentication(format!("Failed to create HMAC: {}", e)))?;
    mac.update(message.as_bytes());
    Ok(hex::encode_upper(mac.finalize().into_bytes()))
}

/// Caller parameters merged with the four auth fields. The auth fields are
/// written last, so a caller can never replace them.
pub fn signed_body(
    params: &Params,
    nonce: u64,
    client_id: &str,
    api_key: &str,
    secret: &str,
) -> AdapterResult<String> {
    let nonce = nonce.to_string();
    let signature = compute_signature(secret, &nonce, client_id, api_key)?;

    let mut merged = params.clone();
    merged.insert("clientId".to_string(), client_id.to_string());
    merged.insert("nonce".to_string(), nonce);
    merged.insert("publicKey".to_string(), api_key.to_string());
    merged.insert("signature".to_string(), signature);

    Ok(urlencode(&merged))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creds() -> Credentials {
        Credentials::new("12345", "pubkey", "secret")
    }

    #[test]
    fn test_signature_known_vector() {
        // HMAC-SHA256("key", "The quick brown fox jumps over the lazy dog"), split across the three parts.
        let sig = compute_signature(
            "key",
            "The quick brown fox ",
            "jumps over ",
            "the lazy dog",
        )
        .unwrap();
        assert_eq!(
            sig,
            "F7BC83F430538424B13298E6AA6FB143EF4D59A14946175997479DBC2D1A3CD8"
        );
    }

    #[test]
    fn test_signature_is_deterministic_uppercase_hex() {
        let a = compute_signature("secret", "1600000000000", "12345", "pubkey").unwrap();
        let b = compute_signature("secret", "1600000000000", "12345", "pubkey").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a
            .chars()
            .all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c)));
    }

    #[test]
    fn test_signature_changes_with_every_input() {
        let base = compute_signature("secret", "1000", "12345", "pubkey").unwrap();
        assert_ne!(base, compute_signature("secret2", "1000", "12345", "pubkey").unwrap());
        assert_ne!(base, compute_signature("secret", "1001", "12345", "pubkey").unwrap());
        assert_ne!(base, compute_signature("secret", "1000", "12346", "pubkey").unwrap());
        assert_ne!(base, compute_signature("secret", "1000", "12345", "pubkey2").unwrap());
    }

    #[test]
    fn test_no_collisions_across_nonces() {
        let mut seen = std::collections::HashSet::new();
        for nonce in 1_600_000_000_000u64..1_600_000_000_200 {
            let sig = compute_signature("secret", &nonce.to_string(), "12345", "pubkey").unwrap();
            assert!(seen.insert(sig));
        }
    }

    #[test]
    fn test_reserved_keys_cannot_be_overridden() {
        let mut params = Params::new();
        params.insert("currencyPair".to_string(), "BTC_EUR".to_string());
        params.insert("signature".to_string(), "forged".to_string());
        params.insert("clientId".to_string(), "999".to_string());

        let body = signed_body(&params, 42, "12345", "pubkey", "secret").unwrap();
        let fields: BTreeMap<String, String> = form_fields(&body);

        let expected = compute_signature("secret", "42", "12345", "pubkey").unwrap();
        assert_eq!(fields["signature"], expected);
        assert_eq!(fields["clientId"], "12345");
        assert_eq!(fields["nonce"], "42");
        assert_eq!(fields["publicKey"], "pubkey");
        assert_eq!(fields["currencyPair"], "BTC_EUR");
    }

    #[test]
    fn test_sign_sets_form_header_and_increasing_nonce() {
        let signer = RequestSigner::with_nonces(creds(), NonceGenerator::starting_after(u64::MAX / 2));
        let first = signer.sign(&Params::new()).unwrap();
        let second = signer.sign(&Params::new()).unwrap();

        assert_eq!(first.headers["Content-Type"], FORM_CONTENT_TYPE);
        assert!(second.nonce > first.nonce);
        assert!(first.body.contains(&format!("nonce={}", first.nonce)));
    }

    #[test]
    fn test_missing_client_id_is_authentication_error() {
        let signer = RequestSigner::new(Credentials {
            client_id: None,
            ..creds()
        });
        let err = signer.sign(&Params::new()).unwrap_err();
        assert!(matches!(err, AdapterError::Authentication(ref m) if m.contains("client id")));
        assert!(err.is_local());
    }

    #[test]
    fn test_empty_client_id_counts_as_missing() {
        let signer = RequestSigner::new(Credentials {
            client_id: Some(String::new()),
            ..creds()
        });
        assert!(matches!(
            signer.sign(&Params::new()),
            Err(AdapterError::Authentication(_))
        ));
    }

    fn form_fields(body: &str) -> BTreeMap<String, String> {
        body.split('&')
            .filter_map(|pair| pair.split_once('='))
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }
}
