//! Authentication: password hashing and session tokens.

use anyhow::{bail, Result};

use rand::Rng;
use rand_distr::Alphanumeric;
use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;
use std::time::SystemTime;

#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Debug)]
pub struct AuthTokenValue(pub String);

#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct AuthToken {
    pub user_id: usize,
    pub created: SystemTime,
    pub last_used: Option<SystemTime>,
    pub value: AuthTokenValue,
}

impl AuthTokenValue {
    pub fn generate() -> AuthTokenValue {
        let rng = rand::rng();
        let random_string: String = rng
            .sample_iter(&Alphanumeric)
            .take(64)
            .map(char::from)
            .collect();
        AuthTokenValue(random_string)
    }
}

mod lmn_argon2 {
    use anyhow::{anyhow, Result};
    use argon2::{
        password_hash::{
            rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
        },
        Argon2,
    };

    pub fn generate_b64_salt() -> String {
        SaltString::generate(&mut OsRng).to_string()
    }

    pub fn hash<T: AsRef<str>>(plain: &[u8], b64_salt: T) -> Result<String> {
        let argon2 = Argon2::default();
        let salt = SaltString::from_b64(b64_salt.as_ref()).map_err(|err| anyhow!("{}", err))?;
        let hash_string = argon2
            .hash_password(plain, &salt)
            .map_err(|err| anyhow!("{}", err))?
            .to_string();
        Ok(hash_string)
    }

    pub fn verify<T: AsRef<str>>(plain_pw: &[u8], target_hash: T) -> Result<bool> {
        let argon2 = Argon2::default();
        let password_hash =
            PasswordHash::new(target_hash.as_ref()).map_err(|err| anyhow!("{}", err))?;
        Ok(argon2.verify_password(plain_pw, &password_hash).is_ok())
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub enum LmnHasher {
    Argon2,
}

impl FromStr for LmnHasher {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "argon2" => Ok(LmnHasher::Argon2),
            _ => bail!("Unknown hasher {}", s),
        }
    }
}

impl fmt::Display for LmnHasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LmnHasher::Argon2 => f.write_str("argon2"),
        }
    }
}

impl LmnHasher {
    pub fn generate_b64_salt(&self) -> String {
        match self {
            LmnHasher::Argon2 => lmn_argon2::generate_b64_salt(),
        }
    }

    pub fn hash<T: AsRef<str>>(&self, plain: &[u8], b64_salt: T) -> Result<String> {
        match self {
            LmnHasher::Argon2 => lmn_argon2::hash(plain, b64_salt),
        }
    }

    pub fn verify<P: AsRef<str>, H: AsRef<str>>(&self, plain_pw: P, target_hash: H) -> Result<bool> {
        match self {
            LmnHasher::Argon2 => lmn_argon2::verify(plain_pw.as_ref().as_bytes(), target_hash),
        }
    }
}

#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct UsernamePasswordCredentials {
    pub user_id: usize,
    pub salt: String,
    pub hash: String,
    pub hasher: LmnHasher,

    pub created: SystemTime,
    pub last_tried: Option<SystemTime>,
    pub last_used: Option<SystemTime>,
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn argon2_hash() {
        let pw = "123mypw";
        let b64_salt = LmnHasher::Argon2.generate_b64_salt();

        let hash1 = LmnHasher::Argon2.hash(pw.as_bytes(), &b64_salt).unwrap();
        let hash2 = LmnHasher::Argon2.hash(b"123mypw", &b64_salt).unwrap();
        assert_eq!(hash1, hash2);

        assert!(LmnHasher::Argon2.verify("123mypw", &hash1).unwrap());
        assert!(!LmnHasher::Argon2.verify("not the pw", &hash1).unwrap());
    }

    #[test]
    fn different_salts_give_different_hashes() {
        let salt1 = LmnHasher::Argon2.generate_b64_salt();
        let salt2 = LmnHasher::Argon2.generate_b64_salt();
        assert_ne!(salt1, salt2);

        let hash1 = LmnHasher::Argon2.hash(b"pw", &salt1).unwrap();
        let hash2 = LmnHasher::Argon2.hash(b"pw", &salt2).unwrap();
        assert_ne!(hash1, hash2);
    }

    #[test]
    fn hasher_round_trips_through_its_name() {
        assert_eq!(
            LmnHasher::from_str(&LmnHasher::Argon2.to_string()).unwrap(),
            LmnHasher::Argon2
        );
        assert!(LmnHasher::from_str("md5").is_err());
    }

    #[test]
    fn generated_tokens_are_64_alphanumeric_chars() {
        let token = AuthTokenValue::generate();
        assert_eq!(token.0.len(), 64);
        assert!(token.0.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(token, AuthTokenValue::generate());
    }
}
