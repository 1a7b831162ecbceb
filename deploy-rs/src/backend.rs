use crate::artifacts::CompiledContract;
use async_trait::async_trait;
use ethers::abi::Token;
use ethers::contract::ContractFactory;
use ethers::middleware::SignerMiddleware;
use ethers::prelude::{Http, LocalWallet, Provider};
use ethers::providers::Middleware;
use ethers::signers::Signer;
use ethers::types::{Address, H256};
use eyre::{eyre, Result};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployedContract {
    pub address: Address,
    pub transaction_hash: Option<H256>,
    pub block_number: Option<u64>,
}

/// The engine that actually puts contracts on chain.
#[async_trait]
pub trait DeployBackend: Send + Sync {
    /// Chain id reported by the connected node.
    async fn chain_id(&self) -> Result<u64>;

    fn deployer(&self) -> Address;

    async fn has_code(&self, address: Address) -> Result<bool>;

    async fn deploy(&self, contract: &CompiledContract, args: Vec<Token>)
        -> Result<DeployedContract>;
}

type Client = SignerMiddleware<Provider<Http>, LocalWallet>;

/// JSON-RPC node + local wallet.
pub struct EthersBackend {
    client: Arc<Client>,
}

impl EthersBackend {
    pub fn connect(rpc_url: &str, wallet: LocalWallet) -> Result<Self> {
        let provider = Provider::<Http>::try_from(rpc_url)
            .map_err(|e| eyre!("invalid rpc url '{rpc_url}': {e}"))?
            .interval(Duration::from_millis(800));
        Ok(Self {
            client: Arc::new(SignerMiddleware::new(provider, wallet)),
        })
    }
}

#[async_trait]
impl DeployBackend for EthersBackend {
    async fn chain_id(&self) -> Result<u64> {
        Ok(self.client.get_chainid().await?.as_u64())
    }

    fn deployer(&self) -> Address {
        self.client.signer().address()
    }

    async fn has_code(&self, address: Address) -> Result<bool> {
        let code = self.client.get_code(address, None).await?;
        Ok(!code.0.is_empty())
    }

    async fn deploy(
        &self,
        contract: &CompiledContract,
        args: Vec<Token>,
    ) -> Result<DeployedContract> {
        let factory = ContractFactory::new(
            contract.abi.clone(),
            contract.bytecode.clone(),
            self.client.clone(),
        );
        let deployer = factory
            .deploy_tokens(args)
            .map_err(|e| eyre!("failed to build deployment transaction: {e}"))?;
        let (instance, receipt) = deployer
            .send_with_receipt()
            .await
            .map_err(|e| eyre!("deployment transaction failed: {e}"))?;

        if receipt.status.map(|s| s.as_u64()) == Some(0) {
            return Err(eyre!(
                "deployment transaction {:?} reverted",
                receipt.transaction_hash
            ));
        }

        Ok(DeployedContract {
            address: instance.address(),
            transaction_hash: Some(receipt.transaction_hash),
            block_number: receipt.block_number.map(|b| b.as_u64()),
        })
    }
}
