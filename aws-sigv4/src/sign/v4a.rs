/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! NIST SP 800-108 KDF-in-counter-mode signing key derivation and ECDSA-P256 signature
//! calculation for SigV4a.

use crate::Credentials;
use bytes::{BufMut, BytesMut};
use num_bigint::BigInt;
use once_cell::sync::Lazy;
use p256::ecdsa::{signature::Signer, DerSignature, SigningKey};
use std::collections::HashMap;
use std::fmt;
use std::io::Write;
use std::sync::Mutex;
use std::time::SystemTime;
use zeroize::Zeroizing;

const ALGORITHM: &[u8] = b"AWS4-ECDSA-P256-SHA256";

static BIG_N_MINUS_2: Lazy<BigInt> = Lazy::new(|| {
    const ORDER: &[u32] = &[
        0xFFFFFFFF, 0x00000000, 0xFFFFFFFF, 0xFFFFFFFF, 0xBCE6FAAD, 0xA7179E84, 0xF3B9CAC2, 0xFC632551,
    ];
    let big_n = BigInt::from_slice(num_bigint::Sign::Plus, ORDER);
    big_n - BigInt::from(2i32)
});

/// Calculates a SigV4a signature: an ECDSA-P256 signature over the string-to-sign.
pub fn calculate_signature(signing_key: &SigningKey, string_to_sign: &[u8]) -> String {
    let signature: DerSignature = signing_key.sign(string_to_sign);
    hex::encode(signature.as_ref())
}

/// Derives a SigV4a ECDSA-P256 signing key by KDF in counter mode (NIST SP 800-108).
///
/// The loop counter runs from 1 to 254 looking for a candidate `c = HMAC(inputKey,
/// fixedInput)` that is `<= N - 2` (the curve order minus two); the private key is `c + 1`.
/// Exhausting the counter without finding a candidate is a logic error this function
/// cannot hit in practice (the probability a byte never lands in range is astronomically
/// small), but is still guarded against rather than silently looping forever.
pub fn generate_signing_key(access_key: &str, secret_access_key: &str) -> SigningKey {
    let mut input_key = Zeroizing::new(Vec::with_capacity(secret_access_key.len() + 5));
    write!(input_key, "AWS4A{secret_access_key}").unwrap();

    let mut counter: u8 = 1;
    loop {
        let mut kdf_context = Zeroizing::new(Vec::with_capacity(access_key.len() + 1));
        write!(kdf_context, "{access_key}").unwrap();
        kdf_context.push(counter);

        let mut fis = ALGORITHM.to_vec();
        fis.push(0);
        fis.append(&mut kdf_context);
        fis.put_i32(256);

        let key = ring::hmac::Key::new(ring::hmac::HMAC_SHA256, &input_key);

        let mut buf = BytesMut::new();
        buf.put_i32(1);
        buf.put_slice(&fis);
        let tag = ring::hmac::sign(&key, &buf);
        let tag = &tag.as_ref()[0..32];

        let k0 = BigInt::from_bytes_be(num_bigint::Sign::Plus, tag);
        if k0 <= *BIG_N_MINUS_2 {
            let pk = k0 + BigInt::from(1i32);
            let d = Zeroizing::new(pk.to_bytes_be().1);
            return SigningKey::from_slice(&d).expect("derived scalar is a valid P-256 private key");
        }

        counter = counter
            .checked_add(1)
            .expect("a valid candidate is found well before the counter can overflow");
    }
}

/// Caches derived SigV4a signing keys per access key ID.
///
/// Key derivation only depends on the access key ID and secret access key, not on time, so
/// a key can be reused for the effective lifetime of the credentials that produced it
/// (session-token rotation aside, since a new access key ID accompanies new temporary
/// credentials in practice).
#[derive(Debug, Default)]
pub struct SigningKeyCache {
    keys: Mutex<HashMap<String, SigningKey>>,
}

impl SigningKeyCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached key for these credentials, deriving and storing one first if
    /// this is the first request signed with this access key ID.
    pub fn get_or_derive(&self, credentials: &Credentials) -> SigningKey {
        let mut keys = self.keys.lock().unwrap();
        keys.entry(credentials.access_key_id().to_string())
            .or_insert_with(|| generate_signing_key(credentials.access_key_id(), credentials.secret_access_key()))
            .clone()
    }
}

/// Parameters common to signing a single request or chunk with SigV4a.
#[non_exhaustive]
pub struct SigningParams<'a, S> {
    pub(crate) credentials: &'a Credentials,
    pub(crate) region_set: &'a str,
    pub(crate) name: &'a str,
    pub(crate) time: SystemTime,
    pub(crate) settings: S,
}

pub(crate) const ECDSA_256: &str = "AWS4-ECDSA-P256-SHA256";

impl<'a, S> SigningParams<'a, S> {
    /// The region set that will be used to sign SigV4a requests.
    pub fn region_set(&self) -> &str {
        self.region_set
    }

    /// The signing name that will be used to sign requests.
    pub fn name(&self) -> &str {
        self.name
    }

    /// The name of the algorithm used to sign requests.
    pub fn algorithm(&self) -> &'static str {
        ECDSA_256
    }
}

impl<'a, S> fmt::Debug for SigningParams<'a, S>
where
    S: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningParams")
            .field("credentials", &"** redacted **")
            .field("region_set", &self.region_set)
            .field("name", &self.name)
            .field("time", &self.time)
            .field("settings", &self.settings)
            .finish()
    }
}

impl<'a, S: Default> SigningParams<'a, S> {
    /// Returns a builder that can create new `SigningParams`.
    pub fn builder() -> signing_params::Builder<'a, S> {
        Default::default()
    }
}

/// Builder and error for [`SigningParams`].
pub mod signing_params {
    use super::SigningParams;
    use crate::Credentials;
    use std::error::Error;
    use std::fmt;
    use std::time::SystemTime;

    /// [`SigningParams`] builder error.
    #[derive(Debug)]
    pub struct BuildError {
        reason: &'static str,
    }
    impl BuildError {
        fn new(reason: &'static str) -> Self {
            Self { reason }
        }
    }
    impl fmt::Display for BuildError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{}", self.reason)
        }
    }
    impl Error for BuildError {}

    /// Builder that can create new [`SigningParams`].
    #[derive(Debug, Default)]
    pub struct Builder<'a, S> {
        credentials: Option<&'a Credentials>,
        region_set: Option<&'a str>,
        name: Option<&'a str>,
        time: Option<SystemTime>,
        settings: Option<S>,
    }

    impl<'a, S> Builder<'a, S> {
        /// Sets the credentials (required).
        pub fn credentials(mut self, credentials: &'a Credentials) -> Self {
            self.credentials = Some(credentials);
            self
        }
        /// Sets the region set (required).
        pub fn region_set(mut self, region_set: &'a str) -> Self {
            self.region_set = Some(region_set);
            self
        }
        /// Sets the signing name (required).
        pub fn name(mut self, name: &'a str) -> Self {
            self.name = Some(name);
            self
        }
        /// Sets the time to be used in the signature (required).
        pub fn time(mut self, time: SystemTime) -> Self {
            self.time = Some(time);
            self
        }
        /// Sets additional signing settings (required).
        pub fn settings(mut self, settings: S) -> Self {
            self.settings = Some(settings);
            self
        }

        /// Builds the [`SigningParams`], failing if a required field was not set.
        pub fn build(self) -> Result<SigningParams<'a, S>, BuildError> {
            Ok(SigningParams {
                credentials: self
                    .credentials
                    .ok_or_else(|| BuildError::new("credentials are required"))?,
                region_set: self
                    .region_set
                    .ok_or_else(|| BuildError::new("region_set is required"))?,
                name: self.name.ok_or_else(|| BuildError::new("signing name is required"))?,
                time: self.time.ok_or_else(|| BuildError::new("time is required"))?,
                settings: self
                    .settings
                    .ok_or_else(|| BuildError::new("settings are required"))?,
            })
        }
    }
}
