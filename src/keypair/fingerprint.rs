// src/keypair/fingerprint.rs
use base64::{engine::general_purpose, Engine as _};
use openssl::bn::BigNum;
use openssl::hash::{hash, MessageDigest};
use openssl::rsa::Rsa;
use ssh_key::public::KeyData;
use ssh_key::{HashAlg, PublicKey};

use crate::error::FingerprintError;

/// Computes the content fingerprint the registry reports for a public key.
pub trait Fingerprinter: Send + Sync {
    fn fingerprint(&self, public_key: &[u8]) -> Result<String, FingerprintError>;
}

/// Fingerprints as EC2 computes them for imported keys: MD5 of the DER
/// SubjectPublicKeyInfo for RSA, base64 SHA-256 of the key blob for Ed25519.
#[derive(Debug, Default, Clone, Copy)]
pub struct Ec2Fingerprinter;

impl Fingerprinter for Ec2Fingerprinter {
    fn fingerprint(&self, public_key: &[u8]) -> Result<String, FingerprintError> {
        let text = std::str::from_utf8(public_key).map_err(|_| FingerprintError::NotText)?;
        let key = PublicKey::from_openssh(text.trim())?;

        match key.key_data() {
            KeyData::Rsa(rsa) => {
                let e = rsa.e.as_positive_bytes().ok_or(FingerprintError::InvalidRsaComponent)?;
                let n = rsa.n.as_positive_bytes().ok_or(FingerprintError::InvalidRsaComponent)?;
                let rsa = Rsa::from_public_components(BigNum::from_slice(n)?, BigNum::from_slice(e)?)?;
                let der = rsa.public_key_to_der()?;
                let digest = hash(MessageDigest::md5(), &der)?;
                Ok(colon_hex(&digest))
            }
            KeyData::Ed25519(_) => {
                let digest = key.fingerprint(HashAlg::Sha256);
                Ok(general_purpose::STANDARD.encode(digest.as_bytes()))
            }
            _ => Err(FingerprintError::UnsupportedAlgorithm(
                key.algorithm().to_string(),
            )),
        }
    }
}

fn colon_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| hex::encode([*b]))
        .collect::<Vec<_>>()
        .join(":")
}

#[cfg(test)]
mod tests {
    use super::*;

    const RSA_KEY: &str = "ssh-rsa AAAAB3NzaC1yc2EAAAADAQABAAAAgQDfhq73REEAVxKKkvWW1aTG/d28XKTkR0B1Erov6NTQBX+bz/c3dDKnoN0qEq21GGus8eEGJGdmuRcUzQZDuIcFJOaToH+3uuEuMwKYWv+2AsnBtsxhKWL1x42KQrtY6SM0cpIqsJt4+QPsE60bZEaUpQKoZ62YQZBTPKbX6Pom/Q== test@example\n";
    const ED25519_KEY: &str = "ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAIBycyz+Ob9UFjxq6J2CCUrJ/1rnLQCv5KfCr15uInD+l test@example\n";

    #[test]
    fn rsa_fingerprint_matches_ec2() {
        let fp = Ec2Fingerprinter.fingerprint(RSA_KEY.as_bytes()).unwrap();
        assert_eq!(fp, "23:e3:a0:ef:80:35:f6:16:23:1b:8f:8e:c7:bd:ca:a4");
    }

    #[test]
    fn ed25519_fingerprint_is_padded_base64_sha256() {
        let fp = Ec2Fingerprinter.fingerprint(ED25519_KEY.as_bytes()).unwrap();
        assert_eq!(fp, "PY9uMWN2gHE76e63j/B35u2XT8R3FHFxHN0VZg/JR+k=");
    }

    #[test]
    fn fingerprint_has_no_name_separator() {
        for key in [RSA_KEY, ED25519_KEY] {
            let fp = Ec2Fingerprinter.fingerprint(key.as_bytes()).unwrap();
            assert!(!fp.contains('-'));
        }
    }

    #[test]
    fn malformed_key_is_rejected() {
        assert!(matches!(
            Ec2Fingerprinter.fingerprint(b"ssh-rsa not-base64"),
            Err(FingerprintError::Parse(_))
        ));
        assert!(matches!(
            Ec2Fingerprinter.fingerprint(&[0xff, 0xfe, 0x00]),
            Err(FingerprintError::NotText)
        ));
    }
}
