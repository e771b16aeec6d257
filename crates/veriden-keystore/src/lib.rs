/*!
 * Veriden Key Store
 *
 * Keys are saved under caller-chosen references and used through the store,
 * so private material never has to leave it.
 *
 * KeyStore is the main trait. MemoryKeyStore is the bundled implementation,
 * safe to share across tasks. Platform-backed stores (keychains, HSMs)
 * implement the same trait and mark their entries non-extractable.
 */

use ahash::AHashMap;
use tokio::sync::RwLock;
use tracing::debug;
use veriden_crypto::{
    Algorithm, CryptoKey, JWK, KeyKind, KeyMaterial, KeyType, KeyUsage, PrivateKey,
    ProviderRegistry, PublicKey, SecretKey,
};

use crate::errors::{KeyStoreError, Result};

pub mod errors;

/// A key as the store hands it back
#[derive(Debug, Clone, PartialEq)]
pub enum StoredKey {
    Public(PublicKey),
    Private(PrivateKey),
    Secret(SecretKey),
}

impl StoredKey {
    pub fn jwk(&self) -> &JWK {
        match self {
            StoredKey::Public(key) => key.jwk(),
            StoredKey::Private(key) => key.jwk(),
            StoredKey::Secret(key) => key.jwk(),
        }
    }

    pub fn key_id(&self) -> Option<&str> {
        self.jwk().key_id.as_deref()
    }

    pub fn key_type(&self) -> KeyType {
        self.jwk().key_type()
    }

    /// JOSE algorithm, from `alg` or inferred from the curve
    pub fn algorithm(&self) -> veriden_crypto::Result<String> {
        match self {
            StoredKey::Public(key) => key.algorithm(),
            StoredKey::Private(key) => key.algorithm(),
            StoredKey::Secret(key) => key.algorithm(),
        }
    }

    /// The id `list()` reports: kid when set, thumbprint otherwise
    pub fn kid_or_thumbprint(&self) -> String {
        match self.key_id() {
            Some(kid) => kid.to_string(),
            None => self.jwk().thumbprint(),
        }
    }

    fn kind(&self) -> KeyKind {
        match self {
            StoredKey::Public(_) => KeyKind::Public,
            StoredKey::Private(_) => KeyKind::Private,
            StoredKey::Secret(_) => KeyKind::Secret,
        }
    }

    fn to_crypto_key(&self, extractable: bool, usages: Vec<KeyUsage>) -> veriden_crypto::Result<CryptoKey> {
        Ok(CryptoKey::new(
            self.algorithm()?,
            self.kind(),
            extractable,
            usages,
            KeyMaterial::Jwk(self.jwk().clone()),
        ))
    }
}

impl From<PublicKey> for StoredKey {
    fn from(key: PublicKey) -> Self {
        StoredKey::Public(key)
    }
}

impl From<PrivateKey> for StoredKey {
    fn from(key: PrivateKey) -> Self {
        StoredKey::Private(key)
    }
}

impl From<SecretKey> for StoredKey {
    fn from(key: SecretKey) -> Self {
        StoredKey::Secret(key)
    }
}

/// Veriden Key Store
#[allow(async_fn_in_trait)]
pub trait KeyStore {
    /// Get the key saved under `key_reference`
    ///
    /// With `public_only` set, private entries come back as their public
    /// half. Secret entries have no public half and fail with a
    /// Capability error.
    async fn get(&self, key_reference: &str, public_only: bool) -> Result<StoredKey>;

    /// Save a key under `key_reference`, replacing any previous entry
    async fn save(&self, key_reference: &str, key: StoredKey) -> Result<()>;

    /// Save a key the store will use but never hand out
    ///
    /// `get` on such an entry only ever returns the public half; signing
    /// and decrypting still work through the store.
    async fn save_non_extractable(&self, key_reference: &str, key: StoredKey) -> Result<()>;

    /// All key references with their corresponding key ids
    async fn list(&self) -> Result<AHashMap<String, String>>;

    /// Sign `data` with the key saved under `key_reference`
    async fn sign(
        &self,
        key_reference: &str,
        data: &[u8],
        registry: &ProviderRegistry,
    ) -> Result<Vec<u8>>;

    /// Decrypt `ciphertext` with the key saved under `key_reference`
    ///
    /// The algorithm carries the parameters the cipher needs (iv, aad).
    async fn decrypt(
        &self,
        key_reference: &str,
        ciphertext: &[u8],
        algorithm: &Algorithm,
        registry: &ProviderRegistry,
    ) -> Result<Vec<u8>>;
}

struct Entry {
    key: StoredKey,
    extractable: bool,
    /// Companion public key, cached when a private key is saved
    public: Option<PublicKey>,
}

/// In-memory key store, safe to share across tasks
#[derive(Default)]
pub struct MemoryKeyStore {
    entries: RwLock<AHashMap<String, Entry>>,
}

impl MemoryKeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn insert(&self, key_reference: &str, key: StoredKey, extractable: bool) -> Result<()> {
        let public = match &key {
            StoredKey::Private(private) => Some(private.public_key()?),
            _ => None,
        };
        debug!("Saving key under ({key_reference})");
        self.entries.write().await.insert(
            key_reference.to_string(),
            Entry {
                key,
                extractable,
                public,
            },
        );
        Ok(())
    }

    /// Clones the full entry for store-internal use, skipping the
    /// extractability gate
    async fn material(&self, key_reference: &str) -> Result<(StoredKey, bool)> {
        let entries = self.entries.read().await;
        let entry = entries
            .get(key_reference)
            .ok_or_else(|| KeyStoreError::NotFound(key_reference.to_string()))?;
        Ok((entry.key.clone(), entry.extractable))
    }
}

impl KeyStore for MemoryKeyStore {
    async fn get(&self, key_reference: &str, public_only: bool) -> Result<StoredKey> {
        let entries = self.entries.read().await;
        let entry = entries
            .get(key_reference)
            .ok_or_else(|| KeyStoreError::NotFound(key_reference.to_string()))?;

        if public_only {
            return match &entry.key {
                StoredKey::Public(public) => Ok(StoredKey::Public(public.clone())),
                StoredKey::Private(private) => {
                    let public = match &entry.public {
                        Some(public) => public.clone(),
                        None => private.public_key()?,
                    };
                    Ok(StoredKey::Public(public))
                }
                StoredKey::Secret(_) => Err(KeyStoreError::Capability(format!(
                    "({key_reference}) is symmetric and has no public half"
                ))),
            };
        }

        if !entry.extractable && !matches!(entry.key, StoredKey::Public(_)) {
            return Err(KeyStoreError::Capability(format!(
                "({key_reference}) is not extractable, use the store operations instead"
            )));
        }
        Ok(entry.key.clone())
    }

    async fn save(&self, key_reference: &str, key: StoredKey) -> Result<()> {
        self.insert(key_reference, key, true).await
    }

    async fn save_non_extractable(&self, key_reference: &str, key: StoredKey) -> Result<()> {
        self.insert(key_reference, key, false).await
    }

    async fn list(&self) -> Result<AHashMap<String, String>> {
        let entries = self.entries.read().await;
        Ok(entries
            .iter()
            .map(|(reference, entry)| (reference.clone(), entry.key.kid_or_thumbprint()))
            .collect())
    }

    async fn sign(
        &self,
        key_reference: &str,
        data: &[u8],
        registry: &ProviderRegistry,
    ) -> Result<Vec<u8>> {
        let (key, extractable) = self.material(key_reference).await?;
        if matches!(key, StoredKey::Public(_)) {
            return Err(KeyStoreError::Capability(format!(
                "({key_reference}) holds no signing material"
            )));
        }

        let algorithm = key.algorithm()?;
        let crypto_key = key.to_crypto_key(extractable, vec![KeyUsage::Sign])?;
        debug!("Signing with ({key_reference}) using {algorithm}");
        Ok(registry.sign(&Algorithm::new(&algorithm), &crypto_key, data)?)
    }

    async fn decrypt(
        &self,
        key_reference: &str,
        ciphertext: &[u8],
        algorithm: &Algorithm,
        registry: &ProviderRegistry,
    ) -> Result<Vec<u8>> {
        let (key, extractable) = self.material(key_reference).await?;
        if !matches!(key, StoredKey::Secret(_)) {
            return Err(KeyStoreError::Capability(format!(
                "({key_reference}) holds no decryption material"
            )));
        }

        let crypto_key = key.to_crypto_key(extractable, vec![KeyUsage::Decrypt])?;
        debug!("Decrypting with ({key_reference})");
        Ok(registry.decrypt(algorithm, &crypto_key, ciphertext)?)
    }
}

#[cfg(test)]
mod tests {
    use base64::{Engine, prelude::BASE64_URL_SAFE_NO_PAD};
    use veriden_crypto::{ECParams, OctParams, Params};

    use super::*;

    fn secp256k1_private() -> PrivateKey {
        PrivateKey::new(JWK::from_params(Params::EC(ECParams {
            curve: "secp256k1".to_string(),
            x: "Q5foEFNl8VHSCkLkTV8FhXZdIxSCDDGW5HB_g1GjxYU".to_string(),
            y: "Av6CmlrJnu0oMNQBvGGKAq6SX5PvZaeavLTkLi8pCQM".to_string(),
            d: Some("B80Bz2dcNosPeAsM-3HTvQ4ROkqy9Ciuig85R2ps-pY".to_string()),
        })))
        .unwrap()
    }

    fn aes_secret() -> SecretKey {
        let mut jwk = JWK::from_params(Params::Oct(OctParams {
            k: BASE64_URL_SAFE_NO_PAD.encode([7u8; 32]),
        }));
        jwk.algorithm = Some("A256GCM".to_string());
        SecretKey::new(jwk).unwrap()
    }

    #[tokio::test]
    async fn save_then_get_round_trips() {
        let store = MemoryKeyStore::new();
        let private = secp256k1_private();
        store.save("signing", private.clone().into()).await.unwrap();

        let full = store.get("signing", false).await.unwrap();
        assert_eq!(full, StoredKey::Private(private.clone()));

        let StoredKey::Public(public) = store.get("signing", true).await.unwrap() else {
            panic!("expected the public half");
        };
        assert_eq!(public.thumbprint(), private.jwk().thumbprint());
        assert!(!public.jwk().has_private_material());
    }

    #[tokio::test]
    async fn unknown_reference_is_not_found() {
        let store = MemoryKeyStore::new();
        assert!(matches!(
            store.get("nope", false).await,
            Err(KeyStoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn non_extractable_keys_stay_inside() {
        let store = MemoryKeyStore::new();
        let registry = ProviderRegistry::with_default_providers();
        let private = secp256k1_private();
        store
            .save_non_extractable("signing", private.clone().into())
            .await
            .unwrap();

        assert!(matches!(
            store.get("signing", false).await,
            Err(KeyStoreError::Capability(_))
        ));

        // the public half and store-mediated signing still work
        let StoredKey::Public(public) = store.get("signing", true).await.unwrap() else {
            panic!("expected the public half");
        };
        let signature = store
            .sign("signing", b"payload", &registry)
            .await
            .unwrap();
        let verifier = public.to_crypto_key(&[KeyUsage::Verify]).unwrap();
        assert!(
            registry
                .verify(&Algorithm::new("ES256K"), &verifier, &signature, b"payload")
                .unwrap()
        );
    }

    #[tokio::test]
    async fn secret_entries_have_no_public_half() {
        let store = MemoryKeyStore::new();
        store.save("content", aes_secret().into()).await.unwrap();

        assert!(matches!(
            store.get("content", true).await,
            Err(KeyStoreError::Capability(_))
        ));
    }

    #[tokio::test]
    async fn list_reports_kid_or_thumbprint() {
        let store = MemoryKeyStore::new();
        let mut with_kid = secp256k1_private();
        with_kid.set_key_id("did:example:abc#sig-1");
        store.save("named", with_kid.into()).await.unwrap();

        let anonymous = secp256k1_private();
        let thumbprint = anonymous.jwk().thumbprint();
        store.save("anonymous", anonymous.into()).await.unwrap();

        let listing = store.list().await.unwrap();
        assert_eq!(
            listing.get("named").map(String::as_str),
            Some("did:example:abc#sig-1")
        );
        assert_eq!(listing.get("anonymous"), Some(&thumbprint));
    }

    #[tokio::test]
    async fn store_decrypts_for_secret_entries() {
        let store = MemoryKeyStore::new();
        let registry = ProviderRegistry::with_default_providers();
        let secret = aes_secret();
        store
            .save_non_extractable("content", secret.clone().into())
            .await
            .unwrap();

        let algorithm = Algorithm::new("A256GCM").with_bytes_param("iv", &[2u8; 12]);
        let encryptor = secret.to_crypto_key(&[KeyUsage::Encrypt]).unwrap();
        let ciphertext = registry
            .encrypt(&algorithm, &encryptor, b"card payload")
            .unwrap();

        let plaintext = store
            .decrypt("content", &ciphertext, &algorithm, &registry)
            .await
            .unwrap();
        assert_eq!(plaintext, b"card payload");
    }

    #[tokio::test]
    async fn signing_needs_private_material() {
        let store = MemoryKeyStore::new();
        let registry = ProviderRegistry::with_default_providers();
        let public = secp256k1_private().public_key().unwrap();
        store.save("verify-only", public.into()).await.unwrap();

        assert!(matches!(
            store.sign("verify-only", b"payload", &registry).await,
            Err(KeyStoreError::Capability(_))
        ));
    }
}
