use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(untagged)]
pub enum Audience {
    Single(String),
    Many(Vec<String>),
}

impl Audience {
    pub fn contains(&self, expected: &str) -> bool {
        match self {
            Audience::Single(aud) => aud == expected,
            Audience::Many(auds) => auds.iter().any(|aud| aud == expected),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct OvoClaims {
    #[serde(default)]
    pub redeem_code: Option<String>,
}

/// Claims carried by a token issued by the token service.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct TokenClaims {
    pub aud: Audience,
    /// Expiry, Unix seconds
    pub exp: i64,
    #[serde(default)]
    pub ovo_claims: Option<OvoClaims>,
}

impl TokenClaims {
    pub fn redeem_code(&self) -> Option<&str> {
        self.ovo_claims
            .as_ref()
            .and_then(|claims| claims.redeem_code.as_deref())
    }

    pub fn remaining_seconds(&self, now: i64) -> i64 {
        (self.exp - now).max(0)
    }
}

/// Reply of the token service to a code exchange.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct TokenExchangeResponse {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub error: Option<TokenExchangeError>,
}

#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct TokenExchangeError {
    pub name: String,
    #[serde(default)]
    pub message: Option<String>,
}

impl TokenExchangeError {
    pub fn friendly_message(&self) -> String {
        match self.name.as_str() {
            "CodeNoLongerValid" => "Code is either invalid or has expired".to_string(),
            _ => self
                .message
                .clone()
                .unwrap_or_else(|| "Unable to redeem code, please try again".to_string()),
        }
    }
}
