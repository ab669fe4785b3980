//! JSON Web Key support for the one curve this core defines: SECP256K1.
//!
//! DID Document public key entries carry their material either as a JWK or as
//! a hex-encoded SEC1 point; both forms convert into [`k256`] keys here.

use serde::{Deserialize, Serialize};
use std::convert::TryFrom;

use crate::base64url;
use crate::error::Error;

/// JWK `crv` value for SECP256K1.
pub const SECP256K1_CURVE: &str = "secp256k1";

/// Big-endian byte string serialized as unpadded base64url, as used for JWK
/// coordinates and private scalars.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Hash, Eq)]
#[serde(try_from = "String")]
#[serde(into = "Base64urlUIntString")]
pub struct Base64urlUInt(pub Vec<u8>);
type Base64urlUIntString = String;

impl TryFrom<String> for Base64urlUInt {
    type Error = Error;
    fn try_from(data: String) -> Result<Self, Self::Error> {
        Ok(Base64urlUInt(base64url::decode(&data)?))
    }
}

impl From<&Base64urlUInt> for String {
    fn from(data: &Base64urlUInt) -> String {
        base64url::encode(&data.0)
    }
}

impl From<Base64urlUInt> for Base64urlUIntString {
    fn from(data: Base64urlUInt) -> Base64urlUIntString {
        String::from(&data)
    }
}

/// An elliptic curve JSON Web Key.
///
/// Holds the public coordinates and, for signing keys, the private scalar
/// `d`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Jwk {
    pub kty: String,
    pub crv: String,
    pub x: Base64urlUInt,
    pub y: Base64urlUInt,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub d: Option<Base64urlUInt>,
}

impl Jwk {
    /// Copy of this key without private key parameters.
    pub fn to_public(&self) -> Self {
        Self {
            d: None,
            ..self.clone()
        }
    }
}

/// Generate a fresh SECP256K1 keypair.
pub fn generate_secp256k1() -> Result<Jwk, Error> {
    let mut rng = rand::rngs::OsRng {};
    let secret_key = k256::SecretKey::random(&mut rng);
    let sk_bytes = secret_key.to_bytes().to_vec();
    let public_key = secret_key.public_key();
    let mut jwk = Jwk::try_from(&public_key)?;
    jwk.d = Some(Base64urlUInt(sk_bytes));
    Ok(jwk)
}

/// Parse a SEC1-encoded (compressed or uncompressed) SECP256K1 public key.
pub fn secp256k1_parse(data: &[u8]) -> Result<Jwk, Error> {
    let public_key = k256::PublicKey::from_sec1_bytes(data)?;
    Jwk::try_from(&public_key)
}

/// Parse a hex-encoded SEC1 public key, the `publicKeyHex` document form.
pub fn secp256k1_parse_hex(data: &str) -> Result<Jwk, Error> {
    secp256k1_parse(&hex::decode(data)?)
}

impl TryFrom<&k256::PublicKey> for Jwk {
    type Error = Error;
    fn try_from(pk: &k256::PublicKey) -> Result<Self, Self::Error> {
        use k256::elliptic_curve::sec1::ToEncodedPoint;
        let ec_point = pk.to_encoded_point(false);
        let x = ec_point.x().ok_or(Error::MissingPoint)?;
        let y = ec_point.y().ok_or(Error::MissingPoint)?;
        Ok(Jwk {
            kty: "EC".to_string(),
            crv: SECP256K1_CURVE.to_string(),
            x: Base64urlUInt(x.to_vec()),
            y: Base64urlUInt(y.to_vec()),
            d: None,
        })
    }
}

impl TryFrom<&Jwk> for k256::SecretKey {
    type Error = Error;
    fn try_from(jwk: &Jwk) -> Result<Self, Self::Error> {
        if jwk.crv != SECP256K1_CURVE {
            return Err(Error::CurveNotImplemented(jwk.crv.to_string()));
        }
        let private_key = jwk.d.as_ref().ok_or(Error::MissingPrivateKey)?;
        let secret_key = k256::SecretKey::from_bytes(private_key.0.as_slice().into())?;
        Ok(secret_key)
    }
}

impl TryFrom<&Jwk> for k256::PublicKey {
    type Error = Error;
    fn try_from(jwk: &Jwk) -> Result<Self, Self::Error> {
        if jwk.crv != SECP256K1_CURVE {
            return Err(Error::CurveNotImplemented(jwk.crv.to_string()));
        }
        const EC_UNCOMPRESSED_POINT_TAG: &[u8] = &[0x04];
        let pk_data = [
            EC_UNCOMPRESSED_POINT_TAG,
            jwk.x.0.as_slice(),
            jwk.y.0.as_slice(),
        ]
        .concat();
        let public_key = k256::PublicKey::from_sec1_bytes(&pk_data)?;
        Ok(public_key)
    }
}

impl TryFrom<&Jwk> for k256::ecdsa::VerifyingKey {
    type Error = Error;
    fn try_from(jwk: &Jwk) -> Result<Self, Self::Error> {
        let public_key = k256::PublicKey::try_from(jwk)?;
        Ok(k256::ecdsa::VerifyingKey::from(public_key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_key_has_expected_shape() {
        let jwk = generate_secp256k1().unwrap();
        assert_eq!(jwk.kty, "EC");
        assert_eq!(jwk.crv, SECP256K1_CURVE);
        assert_eq!(jwk.x.0.len(), 32);
        assert_eq!(jwk.y.0.len(), 32);
        assert!(jwk.d.is_some());
        assert!(jwk.to_public().d.is_none());
    }

    #[test]
    fn public_key_round_trips_through_k256() {
        let jwk = generate_secp256k1().unwrap();
        let public = k256::PublicKey::try_from(&jwk).unwrap();
        assert_eq!(Jwk::try_from(&public).unwrap(), jwk.to_public());
    }

    #[test]
    fn hex_form_parses_to_same_key() {
        let jwk = generate_secp256k1().unwrap();
        let uncompressed = format!("04{}{}", hex::encode(&jwk.x.0), hex::encode(&jwk.y.0));
        assert_eq!(secp256k1_parse_hex(&uncompressed).unwrap(), jwk.to_public());
    }

    #[test]
    fn unknown_curve_is_rejected() {
        let mut jwk = generate_secp256k1().unwrap();
        jwk.crv = "P-256".to_string();
        assert!(matches!(
            k256::PublicKey::try_from(&jwk),
            Err(Error::CurveNotImplemented(_))
        ));
    }

    #[test]
    fn base64url_uint_serde() {
        let value = serde_json::to_value(Base64urlUInt(vec![1, 2, 3])).unwrap();
        assert_eq!(value, serde_json::json!("AQID"));
        let back: Base64urlUInt = serde_json::from_value(value).unwrap();
        assert_eq!(back.0, vec![1, 2, 3]);
    }
}
