use crate::config::env;
use crate::model::user::{Role, User};
use chrono::Local;
use jsonwebtoken::{errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use lazy_static::lazy_static;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

lazy_static! {
    static ref HEADER: Header = Header::new(Algorithm::HS256);
    static ref VALIDATION: Validation = Validation::new(Algorithm::HS256);
    static ref SECRET: String = env::get_key("JWT_HS256_KEY");
    static ref DK: DecodingKey = DecodingKey::from_secret(SECRET.as_bytes());
    static ref EK: EncodingKey = EncodingKey::from_secret(SECRET.as_bytes());
    static ref PERIOD_OF_VALIDITY: i64 = env::get_or("PERIOD_OF_VALIDITY", 86400i64);
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct UserToken {
    pub iat: i64, // issued at, UTC timestamp
    pub exp: i64, // expiry, validated on decode
    pub id: String,
    pub user: String,
    pub role: Role,
    /// Difficulty tier chosen at login; `None` unlocks every tier.
    pub passkey: Option<String>,
}

impl UserToken {
    pub fn from(user: &User, passkey: Option<String>) -> Self {
        let now = Local::now().timestamp();
        UserToken {
            iat: now,
            exp: now + *PERIOD_OF_VALIDITY,
            id: user.id.clone(),
            user: user.name.clone(),
            role: user.role,
            passkey: if user.is_admin() { None } else { passkey },
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

pub fn encode<T: Serialize>(claims: &T) -> anyhow::Result<String> {
    Ok(jsonwebtoken::encode(&HEADER, claims, &EK)?)
}

pub fn decode<T: DeserializeOwned>(token: &str) -> Result<T, ErrorKind> {
    match jsonwebtoken::decode::<T>(token, &DK, &VALIDATION) {
        Ok(res) => Ok(res.claims),
        Err(e) => Err(e.into_kind()),
    }
}
