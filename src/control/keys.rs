//! Persistence of the control server's RSA key pair (§6): `keys/private.pem`
//! and `keys/public.pem`, generated on first start and loaded thereafter.

use std::path::{Path, PathBuf};

use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey, LineEnding};
use rsa::{RsaPrivateKey, RsaPublicKey};
use tracing::info;

use crate::control::crypto;
use crate::error::{Error, Result};

/// Load the key pair from `dir` if both files exist, otherwise generate a
/// fresh 2048-bit pair and persist it there.
pub fn load_or_generate(dir: &Path) -> Result<(RsaPrivateKey, RsaPublicKey)> {
    let private_path = dir.join("private.pem");
    let public_path = dir.join("public.pem");

    if private_path.exists() && public_path.exists() {
        info!(dir = %dir.display(), "loading existing RSA key pair");
        let private_pem = std::fs::read_to_string(&private_path)?;
        let public_pem = std::fs::read_to_string(&public_path)?;
        let private = RsaPrivateKey::from_pkcs8_pem(&private_pem)
            .map_err(|e| Error::CryptoFailure(format!("failed to parse private key: {e}")))?;
        let public = RsaPublicKey::from_public_key_pem(&public_pem)
            .map_err(|e| Error::CryptoFailure(format!("failed to parse public key: {e}")))?;
        return Ok((private, public));
    }

    info!(dir = %dir.display(), "generating fresh RSA key pair");
    std::fs::create_dir_all(dir)?;
    let (private, public) = crypto::generate_keypair()?;

    let private_pem = private
        .to_pkcs8_pem(LineEnding::LF)
        .map_err(|e| Error::CryptoFailure(format!("failed to encode private key: {e}")))?;
    let public_pem = public
        .to_public_key_pem(LineEnding::LF)
        .map_err(|e| Error::CryptoFailure(format!("failed to encode public key: {e}")))?;

    std::fs::write(&private_path, private_pem.as_bytes())?;
    std::fs::write(&public_path, public_pem.as_bytes())?;

    Ok((private, public))
}

/// Default keys directory, matching the CLI surface's `keys/` convention.
pub fn default_keys_dir() -> PathBuf {
    PathBuf::from("keys")
}
