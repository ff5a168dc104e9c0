//! ERC20 / ERC721 read helpers on top of `eth_call`.

use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes, U256};
use alloy::rpc::types::TransactionRequest;
use alloy::sol_types::SolCall;

use crate::blockchain::client::RootstockClient;
use crate::blockchain::contracts::{decode_returns, is_contract_code, IERC20, IERC721};
use crate::blockchain::types::{
    BlockchainError, BlockchainResult, NftInfo, TokenBalance, TokenInfo,
};
use crate::blockchain::units;

/// Read-only token queries.
pub struct TokenReader<'a> {
    client: &'a RootstockClient,
}

impl<'a> TokenReader<'a> {
    pub fn new(client: &'a RootstockClient) -> Self {
        Self { client }
    }

    async fn call<C: SolCall>(&self, token: Address, call: C) -> BlockchainResult<C::Return> {
        let tx = TransactionRequest::default()
            .with_to(token)
            .with_input(Bytes::from(call.abi_encode()));
        let data = self.client.call(&tx).await?;
        decode_returns::<C>(&data)
    }

    /// Fail early with a readable message when `token` is not a contract.
    pub async fn ensure_contract(&self, token: Address) -> BlockchainResult<()> {
        let code = self.client.get_code(token).await?;
        if !is_contract_code(&code) {
            return Err(BlockchainError::Contract(format!(
                "no contract deployed at {}",
                self.client.checksum(&token)
            )));
        }
        Ok(())
    }

    pub async fn erc20_decimals(&self, token: Address) -> BlockchainResult<u8> {
        self.call(token, IERC20::decimalsCall {}).await
    }

    pub async fn erc20_symbol(&self, token: Address) -> BlockchainResult<String> {
        self.call(token, IERC20::symbolCall {}).await
    }

    pub async fn erc20_info(&self, token: Address) -> BlockchainResult<TokenInfo> {
        self.ensure_contract(token).await?;

        let name: String = self.call(token, IERC20::nameCall {}).await?;
        let symbol = self.erc20_symbol(token).await?;
        let decimals = self.erc20_decimals(token).await?;
        let total_supply: U256 = self.call(token, IERC20::totalSupplyCall {}).await?;

        Ok(TokenInfo {
            address: self.client.checksum(&token),
            name,
            symbol,
            decimals,
            total_supply: units::format_amount(total_supply, decimals)?,
        })
    }

    pub async fn erc20_balance(&self, token: Address, owner: Address) -> BlockchainResult<TokenBalance> {
        self.ensure_contract(token).await?;

        let raw: U256 = self.call(token, IERC20::balanceOfCall { account: owner }).await?;
        let decimals = self.erc20_decimals(token).await?;
        let symbol = self.erc20_symbol(token).await?;

        Ok(TokenBalance {
            address: self.client.checksum(&owner),
            token_address: Some(self.client.checksum(&token)),
            symbol,
            decimals,
            balance: units::format_amount(raw, decimals)?,
            raw_balance: raw.to_string(),
        })
    }

    /// Owner and metadata of an NFT. Name, symbol and URI are optional extensions.
    pub async fn nft_info(&self, token: Address, token_id: U256) -> BlockchainResult<NftInfo> {
        self.ensure_contract(token).await?;

        let owner: Address = self
            .call(token, IERC721::ownerOfCall { tokenId: token_id })
            .await?;
        let token_uri: Option<String> = self
            .call(token, IERC721::tokenURICall { tokenId: token_id })
            .await
            .ok();
        let name: Option<String> = self.call(token, IERC721::nameCall {}).await.ok();
        let symbol: Option<String> = self.call(token, IERC721::symbolCall {}).await.ok();

        Ok(NftInfo {
            address: self.client.checksum(&token),
            token_id: token_id.to_string(),
            owner: self.client.checksum(&owner),
            token_uri,
            name,
            symbol,
        })
    }
}
