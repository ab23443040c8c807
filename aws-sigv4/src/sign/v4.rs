/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Chained-HMAC-SHA256 signing key derivation and signature calculation for SigV4.

use crate::Credentials;
use hmac::{digest::FixedOutput, Hmac, Mac};
use sha2::{Digest, Sha256};
use smithy_types::date_time;
use std::time::SystemTime;

/// `HashedPayload = Lowercase(HexEncode(Hash(requestPayload)))`
pub(crate) fn sha256_hex_string(bytes: impl AsRef<[u8]>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize_fixed())
}

/// Calculates a SigV4 signature: `HMAC-SHA256(signing_key, string_to_sign)`.
pub fn calculate_signature(signing_key: impl AsRef<[u8]>, string_to_sign: &[u8]) -> String {
    let mut mac =
        Hmac::<Sha256>::new_from_slice(signing_key.as_ref()).expect("HMAC can take a key of any size");
    mac.update(string_to_sign);
    hex::encode(mac.finalize_fixed())
}

/// Derives the SigV4 signing key via the chained HMAC:
/// `kDate = HMAC("AWS4" + secret, date)`, `kRegion = HMAC(kDate, region)`,
/// `kService = HMAC(kRegion, service)`, `kSigning = HMAC(kService, "aws4_request")`.
pub fn generate_signing_key(
    secret: &str,
    time: SystemTime,
    region: &str,
    service: &str,
) -> impl AsRef<[u8]> {
    let secret = format!("AWS4{secret}");
    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret.as_ref()).expect("HMAC can take a key of any size");
    mac.update(date_time::format_date(time.into()).as_bytes());
    let tag = mac.finalize_fixed();

    let mut mac = Hmac::<Sha256>::new_from_slice(&tag).expect("HMAC can take a key of any size");
    mac.update(region.as_bytes());
    let tag = mac.finalize_fixed();

    let mut mac = Hmac::<Sha256>::new_from_slice(&tag).expect("HMAC can take a key of any size");
    mac.update(service.as_bytes());
    let tag = mac.finalize_fixed();

    let mut mac = Hmac::<Sha256>::new_from_slice(&tag).expect("HMAC can take a key of any size");
    mac.update(b"aws4_request");
    mac.finalize_fixed()
}

/// Parameters common to signing a single request or chunk with SigV4.
#[derive(Debug)]
#[non_exhaustive]
pub struct SigningParams<'a, S> {
    pub(crate) credentials: &'a Credentials,
    pub(crate) region: &'a str,
    pub(crate) name: &'a str,
    pub(crate) time: SystemTime,
    pub(crate) settings: S,
}

const HMAC_256: &str = "AWS4-HMAC-SHA256";

impl<'a, S> SigningParams<'a, S> {
    /// The region that will be used to sign SigV4 requests.
    pub fn region(&self) -> &str {
        self.region
    }

    /// The signing name that will be used to sign requests.
    pub fn name(&self) -> &str {
        self.name
    }

    /// The name of the algorithm used to sign requests.
    pub fn algorithm(&self) -> &'static str {
        HMAC_256
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
        region: Option<&'a str>,
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
        /// Sets the region (required).
        pub fn region(mut self, region: &'a str) -> Self {
            self.region = Some(region);
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
                region: self.region.ok_or_else(|| BuildError::new("region is required"))?,
                name: self.name.ok_or_else(|| BuildError::new("signing name is required"))?,
                time: self.time.ok_or_else(|| BuildError::new("time is required"))?,
                settings: self
                    .settings
                    .ok_or_else(|| BuildError::new("settings are required"))?,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{calculate_signature, generate_signing_key, sha256_hex_string};
    use smithy_types::date_time::parse_date_time;

    #[test]
    fn signature_calculation_matches_the_published_iam_vector() {
        let secret = "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY";
        let creq = "GET\n/\nAction=ListUsers&Version=2010-05-08\ncontent-type:application/x-www-form-urlencoded; charset=utf-8\nhost:iam.amazonaws.com\nx-amz-date:20150830T123600Z\n\ncontent-type;host;x-amz-date\ne3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";
        let time = parse_date_time("20150830T123600Z").unwrap().into();

        let credential_scope = "20150830/us-east-1/iam/aws4_request";
        let string_to_sign = format!(
            "AWS4-HMAC-SHA256\n20150830T123600Z\n{credential_scope}\n{}",
            sha256_hex_string(creq.as_bytes())
        );

        let derived_key = generate_signing_key(secret, time, "us-east-1", "iam");
        let signature = calculate_signature(derived_key, string_to_sign.as_bytes());

        assert_eq!(
            "5d672d79c15b13162d9279b0855cfba6789a8edb4c82c400e06b5924a6f2b5d7",
            &signature
        );
    }

    #[test]
    fn sha256_of_empty_payload_matches_the_well_known_digest() {
        let expected = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";
        let actual = sha256_hex_string([]);
        assert_eq!(expected, actual);
    }
}
