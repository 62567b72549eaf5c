//! Wallet provider capability and connection state.
//!
//! Providers are environment-injected objects (browser extensions, test
//! doubles) modeled as a trait. The connection state is passed explicitly
//! to every operation; there is no ambient global, and the state is always
//! replaced wholesale through [`connect`] / [`WalletConnection::reset`].

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use dbk_chain_client::address::{self, AddressError};
use dbk_chain_client::{ChainError, ChainProvider, WalletSession};

/// Display metadata of a wallet provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderInfo {
    pub name: String,
    pub icon: String,
    pub api_version: String,
}

/// A wallet-like object exposed by the environment.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    fn name(&self) -> &str;
    fn icon(&self) -> &str;
    /// Wallet-API version marker. Objects without one are not wallets.
    fn api_version(&self) -> Option<&str>;

    /// Request authorization and open a session.
    async fn enable(&self) -> Result<Arc<dyn WalletSession>, WalletError>;

    fn info(&self) -> ProviderInfo {
        ProviderInfo {
            name: self.name().to_owned(),
            icon: self.icon().to_owned(),
            api_version: self.api_version().unwrap_or_default().to_owned(),
        }
    }
}

/// Providers that look like wallets, sorted case-insensitively by name.
pub fn list_providers(providers: &[Arc<dyn WalletProvider>]) -> Vec<Arc<dyn WalletProvider>> {
    let mut wallets: Vec<Arc<dyn WalletProvider>> = providers
        .iter()
        .filter(|p| p.api_version().is_some())
        .cloned()
        .collect();
    wallets.sort_by(|l, r| l.name().to_uppercase().cmp(&r.name().to_uppercase()));
    wallets
}

/// The currently selected wallet and its derived identity fields.
///
/// Empty at startup, populated atomically on a successful connect, reset
/// to empty on disconnect. All fields are blank strings while disconnected.
#[derive(Clone, Default)]
pub struct WalletConnection {
    pub chain: Option<Arc<dyn ChainProvider>>,
    pub session: Option<Arc<dyn WalletSession>>,
    pub wallet: Option<ProviderInfo>,
    pub address: String,
    pub payment_key_hash: String,
    pub stake_address: String,
    pub stake_key_hash: String,
}

impl WalletConnection {
    /// Fresh state carrying only the chain client, as built at app start.
    pub fn new(chain: Arc<dyn ChainProvider>) -> Self {
        WalletConnection {
            chain: Some(chain),
            ..WalletConnection::default()
        }
    }

    pub fn is_connected(&self) -> bool {
        !self.address.is_empty()
    }

    /// Drop the wallet session and derived fields, keeping the chain client.
    pub fn reset(&mut self) {
        let chain = self.chain.take();
        *self = WalletConnection {
            chain,
            ..WalletConnection::default()
        };
    }
}

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("chain client is not initialized")]
    ChainNotInitialized,

    #[error("wallet authorization was refused: {0}")]
    Refused(String),

    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error("could not derive credentials: {0}")]
    Address(#[from] AddressError),
}

/// Authorize `provider` and write the full connection state in one
/// assignment: session handle, provider info, spending address, payment
/// key hash, reward address and stake key hash.
pub async fn connect(
    provider: &dyn WalletProvider,
    connection: &mut WalletConnection,
) -> Result<(), WalletError> {
    let chain = connection
        .chain
        .clone()
        .ok_or(WalletError::ChainNotInitialized)?;

    let session = provider.enable().await?;
    let address = session.address().await?;
    let payment_key_hash = address::payment_key_hash(&address)?;

    let stake_address = session.reward_address().await?.unwrap_or_default();
    let stake_key_hash = if stake_address.is_empty() {
        String::new()
    } else {
        address::stake_key_hash(&stake_address)?
    };

    *connection = WalletConnection {
        chain: Some(chain),
        session: Some(session),
        wallet: Some(provider.info()),
        address,
        payment_key_hash,
        stake_address,
        stake_key_hash,
    };

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dbk_chain_client::{SignedTx, UnsignedTx, Utxo};

    struct FakeSession {
        address: String,
        stake: Option<String>,
    }

    #[async_trait]
    impl WalletSession for FakeSession {
        async fn address(&self) -> Result<String, ChainError> {
            Ok(self.address.clone())
        }

        async fn reward_address(&self) -> Result<Option<String>, ChainError> {
            Ok(self.stake.clone())
        }

        async fn utxos(&self) -> Result<Vec<Utxo>, ChainError> {
            Ok(Vec::new())
        }

        async fn sign_tx(&self, unsigned: &UnsignedTx) -> Result<SignedTx, ChainError> {
            Ok(SignedTx {
                tx: unsigned.tx.clone(),
            })
        }
    }

    struct FakeProvider {
        name: &'static str,
        api_version: Option<&'static str>,
        fail: bool,
    }

    #[async_trait]
    impl WalletProvider for FakeProvider {
        fn name(&self) -> &str {
            self.name
        }

        fn icon(&self) -> &str {
            "data:image/svg+xml,"
        }

        fn api_version(&self) -> Option<&str> {
            self.api_version
        }

        async fn enable(&self) -> Result<Arc<dyn WalletSession>, WalletError> {
            if self.fail {
                return Err(WalletError::Refused("user declined".to_owned()));
            }
            Ok(Arc::new(FakeSession {
                address: test_address(),
                stake: Some(test_stake_address()),
            }))
        }
    }

    struct NullChain;

    #[async_trait]
    impl ChainProvider for NullChain {
        async fn utxos_at(&self, _address: &str) -> Result<Vec<Utxo>, ChainError> {
            Ok(Vec::new())
        }

        async fn utxos_at_with_unit(
            &self,
            _address: &str,
            _unit: &str,
        ) -> Result<Vec<Utxo>, ChainError> {
            Ok(Vec::new())
        }

        async fn address_assets(
            &self,
            _address: &str,
            _policy_id: &str,
        ) -> Result<Vec<dbk_chain_client::AssetEntry>, ChainError> {
            Ok(Vec::new())
        }

        async fn submit_tx(&self, _signed_tx: &str) -> Result<String, ChainError> {
            Ok("00".repeat(32))
        }
    }

    fn test_address() -> String {
        let mut payload = vec![0x00];
        payload.extend_from_slice(&[0xaa; 28]);
        payload.extend_from_slice(&[0xbb; 28]);
        address::encode("addr_test", &payload).unwrap()
    }

    fn test_stake_address() -> String {
        let mut payload = vec![0xe0];
        payload.extend_from_slice(&[0xbb; 28]);
        address::encode("stake_test", &payload).unwrap()
    }

    fn provider(name: &'static str, version: Option<&'static str>) -> Arc<dyn WalletProvider> {
        Arc::new(FakeProvider {
            name,
            api_version: version,
            fail: false,
        })
    }

    #[test]
    fn listing_filters_and_sorts_case_insensitively() {
        let injected = vec![
            provider("nami", Some("0.1.0")),
            provider("Eternl", Some("0.1.0")),
            provider("notAWallet", None),
            provider("Lace", Some("1.0")),
        ];

        let wallets = list_providers(&injected);
        let names: Vec<&str> = wallets.iter().map(|w| w.name()).collect();
        assert_eq!(names, vec!["Eternl", "Lace", "nami"]);

        // Idempotent: listing the listing changes nothing.
        let again = list_providers(&wallets);
        let names_again: Vec<&str> = again.iter().map(|w| w.name()).collect();
        assert_eq!(names, names_again);
    }

    #[tokio::test]
    async fn connect_populates_every_field() {
        let mut connection = WalletConnection::new(Arc::new(NullChain));
        let wallet = FakeProvider {
            name: "Eternl",
            api_version: Some("0.1.0"),
            fail: false,
        };

        connect(&wallet, &mut connection).await.unwrap();

        assert!(connection.is_connected());
        assert_eq!(connection.address, test_address());
        assert_eq!(connection.payment_key_hash, "aa".repeat(28));
        assert_eq!(connection.stake_address, test_stake_address());
        assert_eq!(connection.stake_key_hash, "bb".repeat(28));
        assert_eq!(connection.wallet.as_ref().unwrap().name, "Eternl");
        assert!(connection.session.is_some());
    }

    #[tokio::test]
    async fn connect_without_chain_client_fails_before_enable() {
        let mut connection = WalletConnection::default();
        let wallet = FakeProvider {
            name: "Eternl",
            api_version: Some("0.1.0"),
            fail: true, // would fail if enable were reached
        };

        let err = connect(&wallet, &mut connection).await.unwrap_err();
        assert!(matches!(err, WalletError::ChainNotInitialized));
        assert!(!connection.is_connected());
    }

    #[tokio::test]
    async fn refused_authorization_leaves_state_untouched() {
        let mut connection = WalletConnection::new(Arc::new(NullChain));
        let wallet = FakeProvider {
            name: "Eternl",
            api_version: Some("0.1.0"),
            fail: true,
        };

        let err = connect(&wallet, &mut connection).await.unwrap_err();
        assert!(matches!(err, WalletError::Refused(_)));
        assert!(!connection.is_connected());
        assert!(connection.chain.is_some());
    }

    #[tokio::test]
    async fn reset_clears_identity_but_keeps_chain() {
        let mut connection = WalletConnection::new(Arc::new(NullChain));
        let wallet = FakeProvider {
            name: "Eternl",
            api_version: Some("0.1.0"),
            fail: false,
        };
        connect(&wallet, &mut connection).await.unwrap();

        connection.reset();
        assert!(!connection.is_connected());
        assert!(connection.address.is_empty());
        assert!(connection.payment_key_hash.is_empty());
        assert!(connection.session.is_none());
        assert!(connection.wallet.is_none());
        assert!(connection.chain.is_some());
    }
}
