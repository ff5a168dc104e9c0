//! In-memory wallet keystore.
//!
//! # Security
//! - Keys live only in process memory and are never persisted
//! - Keys are never logged; only addresses are
//! - Secrets are returned once, in the response to create/import

use alloy::hex;
use alloy::network::EthereumWallet;
use alloy::primitives::Address;
use alloy::signers::local::coins_bip39::{English, Mnemonic};
use alloy::signers::local::{MnemonicBuilder, PrivateKeySigner};
use alloy::signers::Signer;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::RwLock;

use crate::blockchain::types::{BlockchainError, BlockchainResult, WalletInfo};
use crate::blockchain::units;

/// Comma-separated private keys imported at startup.
pub const PRIVATE_KEYS_ENV_VAR: &str = "ROOTSTOCK_PRIVATE_KEYS";

/// Mnemonic phrase whose first account is imported at startup.
pub const MNEMONIC_ENV_VAR: &str = "ROOTSTOCK_MNEMONIC";

const MNEMONIC_WORDS: usize = 12;

#[derive(Clone)]
struct WalletEntry {
    signer: PrivateKeySigner,
    mnemonic: Option<String>,
    name: Option<String>,
}

/// Keystore mapping addresses to signing keys, plus the selected wallet.
///
/// Keys are [`Address`] values, so lookups ignore checksum casing.
pub struct WalletManager {
    wallets: DashMap<Address, WalletEntry>,
    current: RwLock<Option<Address>>,
    chain_id: u64,
}

impl WalletManager {
    /// Create an empty keystore whose signers are bound to `chain_id`.
    pub fn new(chain_id: u64) -> Self {
        Self {
            wallets: DashMap::new(),
            current: RwLock::new(None),
            chain_id,
        }
    }

    /// Create a keystore seeded from `ROOTSTOCK_PRIVATE_KEYS` / `ROOTSTOCK_MNEMONIC`.
    pub fn from_env(chain_id: u64) -> BlockchainResult<Self> {
        let manager = Self::new(chain_id);
        manager.load_from_env(|key| std::env::var(key).ok())?;
        Ok(manager)
    }

    /// Import wallets named by the environment lookup. Returns how many were added.
    pub fn load_from_env<F>(&self, env: F) -> BlockchainResult<usize>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut imported = 0;

        if let Some(keys) = env(PRIVATE_KEYS_ENV_VAR) {
            for key in keys.split(',').map(str::trim).filter(|k| !k.is_empty()) {
                self.import_private_key(key, None)?;
                imported += 1;
            }
        }

        if let Some(phrase) = env(MNEMONIC_ENV_VAR).filter(|p| !p.trim().is_empty()) {
            self.import_mnemonic(&phrase, 0, None)?;
            imported += 1;
        }

        if imported > 0 {
            tracing::info!(count = imported, "Wallets loaded from environment");
        }
        Ok(imported)
    }

    /// Generate a new wallet, optionally backed by a fresh 12-word mnemonic.
    pub fn create_wallet(&self, name: Option<String>, with_mnemonic: bool) -> BlockchainResult<WalletInfo> {
        let (signer, mnemonic) = if with_mnemonic {
            let mut rng = rand::thread_rng();
            let phrase = Mnemonic::<English>::new_with_count(&mut rng, MNEMONIC_WORDS)
                .map_err(|e| BlockchainError::Wallet(format!("Mnemonic generation failed: {}", e)))?
                .to_phrase();
            (signer_from_mnemonic(&phrase, 0)?, Some(phrase))
        } else {
            (PrivateKeySigner::random(), None)
        };

        let address = self.insert(signer.clone(), mnemonic, name);
        tracing::info!(address = %address, "Wallet created");

        Ok(self.secret_info(&signer))
    }

    /// Import a wallet from a hex private key (with or without `0x`).
    pub fn import_private_key(&self, private_key_hex: &str, name: Option<String>) -> BlockchainResult<WalletInfo> {
        let key_hex = private_key_hex.trim();
        let key_hex = key_hex.strip_prefix("0x").unwrap_or(key_hex);

        let signer: PrivateKeySigner = key_hex
            .parse()
            .map_err(|e| BlockchainError::Wallet(format!("Invalid private key format: {}", e)))?;

        let address = self.insert(signer.clone(), None, name);
        tracing::info!(address = %address, "Wallet imported from private key");

        Ok(self.secret_info(&signer))
    }

    /// Import the account at `m/44'/60'/0'/0/{index}` of a BIP-39 phrase.
    pub fn import_mnemonic(&self, phrase: &str, index: u32, name: Option<String>) -> BlockchainResult<WalletInfo> {
        let phrase = normalize_phrase(phrase);
        let signer = signer_from_mnemonic(&phrase, index)?;

        let address = self.insert(signer.clone(), Some(phrase), name);
        tracing::info!(address = %address, index = index, "Wallet imported from mnemonic");

        Ok(self.secret_info(&signer))
    }

    /// All wallets without secrets, sorted by address.
    pub fn list_wallets(&self) -> Vec<WalletInfo> {
        let current = self.current_address();
        let mut wallets: Vec<WalletInfo> = self
            .wallets
            .iter()
            .map(|entry| WalletInfo {
                address: units::checksum(entry.key(), self.chain_id),
                name: entry.value().name.clone(),
                private_key: None,
                mnemonic: None,
                public_key: None,
                is_current: current == Some(*entry.key()),
            })
            .collect();
        wallets.sort_by_key(|w| w.address.to_lowercase());
        wallets
    }

    /// Select the wallet used when a tool call names no sender.
    pub fn set_current(&self, address: &str) -> BlockchainResult<WalletInfo> {
        let address = units::parse_address(address)?;
        if !self.wallets.contains_key(&address) {
            return Err(BlockchainError::Wallet(format!(
                "Wallet {} not found",
                units::checksum(&address, self.chain_id)
            )));
        }

        *self.current.write().unwrap_or_else(|e| e.into_inner()) = Some(address);
        tracing::info!(address = %address, "Current wallet changed");

        self.public_info(&address)
    }

    /// The selected wallet, if any.
    pub fn current(&self) -> Option<WalletInfo> {
        self.current_address().and_then(|a| self.public_info(&a).ok())
    }

    pub fn current_address(&self) -> Option<Address> {
        *self.current.read().unwrap_or_else(|e| e.into_inner())
    }

    /// Signer for `from`, or for the current wallet when `from` is `None`.
    pub fn signer_for(&self, from: Option<&str>) -> BlockchainResult<PrivateKeySigner> {
        let address = match from {
            Some(from) => units::parse_address(from)?,
            None => self.current_address().ok_or_else(|| {
                BlockchainError::Wallet(
                    "No wallet selected; create or import a wallet first".to_string(),
                )
            })?,
        };

        self.wallets
            .get(&address)
            .map(|entry| entry.signer.clone())
            .ok_or_else(|| {
                BlockchainError::Wallet(format!(
                    "Wallet {} not found",
                    units::checksum(&address, self.chain_id)
                ))
            })
    }

    /// Transaction-signing wallet for `from` (or the current wallet).
    pub fn ethereum_wallet(&self, from: Option<&str>) -> BlockchainResult<(Address, EthereumWallet)> {
        let signer = self.signer_for(from)?;
        Ok((signer.address(), EthereumWallet::from(signer)))
    }

    pub fn len(&self) -> usize {
        self.wallets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wallets.is_empty()
    }

    fn insert(&self, mut signer: PrivateKeySigner, mnemonic: Option<String>, name: Option<String>) -> Address {
        signer.set_chain_id(Some(self.chain_id));
        let address = signer.address();
        match self.wallets.entry(address) {
            // Re-importing keeps a stored name or phrase the new call omits.
            Entry::Occupied(mut occupied) => {
                let entry = occupied.get_mut();
                entry.signer = signer;
                if mnemonic.is_some() {
                    entry.mnemonic = mnemonic;
                }
                if name.is_some() {
                    entry.name = name;
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(WalletEntry { signer, mnemonic, name });
            }
        }

        // The first wallet becomes the current one.
        let mut current = self.current.write().unwrap_or_else(|e| e.into_inner());
        if current.is_none() {
            *current = Some(address);
        }
        address
    }

    fn public_info(&self, address: &Address) -> BlockchainResult<WalletInfo> {
        let entry = self
            .wallets
            .get(address)
            .ok_or_else(|| BlockchainError::Wallet(format!("Wallet {} not found", address)))?;

        Ok(WalletInfo {
            address: units::checksum(address, self.chain_id),
            name: entry.name.clone(),
            private_key: None,
            mnemonic: None,
            public_key: Some(public_key_hex(&entry.signer)),
            is_current: self.current_address() == Some(*address),
        })
    }

    fn secret_info(&self, signer: &PrivateKeySigner) -> WalletInfo {
        let address = signer.address();
        let (name, mnemonic) = self
            .wallets
            .get(&address)
            .map(|e| (e.name.clone(), e.mnemonic.clone()))
            .unwrap_or_default();
        WalletInfo {
            address: units::checksum(&address, self.chain_id),
            name,
            private_key: Some(hex::encode_prefixed(signer.to_bytes())),
            mnemonic,
            public_key: Some(public_key_hex(signer)),
            is_current: self.current_address() == Some(address),
        }
    }
}

impl std::fmt::Debug for WalletManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletManager")
            .field("wallets", &self.wallets.len())
            .field("current", &self.current_address())
            .field("chain_id", &self.chain_id)
            .finish()
    }
}

fn normalize_phrase(phrase: &str) -> String {
    phrase.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn signer_from_mnemonic(phrase: &str, index: u32) -> BlockchainResult<PrivateKeySigner> {
    MnemonicBuilder::<English>::default()
        .phrase(phrase)
        .index(index)
        .and_then(|builder| builder.build())
        .map_err(|e| BlockchainError::Wallet(format!("Invalid mnemonic: {}", e)))
}

/// Uncompressed SEC1 public key, `0x04`-prefixed.
fn public_key_hex(signer: &PrivateKeySigner) -> String {
    let point = signer.credential().verifying_key().to_encoded_point(false);
    hex::encode_prefixed(point.as_bytes())
}
