//! JSON-RPC implementation of the contract gateway.
//!
//! Transactions are sent with `eth_sendTransaction` from a node-managed account; receipts are
//! polled until mined or until the configured timeout.

use std::time::Duration;

use alloy_primitives::{Address, Bytes, TxHash, B256, U256};
use anyhow::{Context, Result};
use async_trait::async_trait;
use ethers::{
    providers::{Http, Middleware, Provider},
    types::{
        transaction::eip2718::TypedTransaction, TransactionRequest, H160, H256,
        U256 as EthU256,
    },
};
use red_envelope_client::{
    CallSpec, ContractGateway, GatewayError, RawLog, TransactionHandle, TransactionReceipt,
    WalletContext,
};

pub struct RpcGateway {
    provider: Provider<Http>,
    from: Option<H160>,
    poll_interval: Duration,
    receipt_timeout: Duration,
}

impl RpcGateway {
    pub fn connect(
        rpc_url: &str,
        from: Option<Address>,
        poll_interval: Duration,
        receipt_timeout: Duration,
    ) -> Result<Self> {
        let provider = Provider::<Http>::try_from(rpc_url)
            .with_context(|| format!("invalid RPC URL {rpc_url}"))?;
        tracing::debug!(rpc = rpc_url, ?from, "connected gateway");
        Ok(Self {
            provider,
            from: from.map(to_h160),
            poll_interval,
            receipt_timeout,
        })
    }

    /// Chain id and, when a sender is configured, its current balance.
    pub async fn wallet_context(&self) -> Result<WalletContext> {
        let chain_id = self
            .provider
            .get_chainid()
            .await
            .context("eth_chainId failed")?
            .as_u64();
        let Some(from) = self.from else {
            return Ok(WalletContext {
                chain_id,
                ..WalletContext::default()
            });
        };
        let balance = self
            .provider
            .get_balance(from, None)
            .await
            .with_context(|| format!("eth_getBalance failed for {from:?}"))?;
        Ok(WalletContext::new(
            Address::from(from.0),
            chain_id,
            U256::from_limbs(balance.0),
        ))
    }

    fn request(&self, call: &CallSpec) -> TransactionRequest {
        let mut tx = TransactionRequest::new()
            .to(to_h160(call.contract_address))
            .data(call.calldata.to_vec());
        if let Some(from) = self.from {
            tx = tx.from(from);
        }
        if let Some(value) = call.value_wei {
            tx = tx.value(EthU256::from_big_endian(&value.to_be_bytes::<32>()));
        }
        tx
    }
}

#[async_trait]
impl ContractGateway for RpcGateway {
    async fn submit(&self, call: &CallSpec) -> Result<TransactionHandle, GatewayError> {
        if self.from.is_none() {
            return Err(GatewayError::Rejected(
                "no sender account configured".to_string(),
            ));
        }
        let pending = self
            .provider
            .send_transaction(self.request(call), None)
            .await
            .map_err(|err| GatewayError::Rejected(err.to_string()))?;
        Ok(TransactionHandle::new(TxHash::from(pending.tx_hash().0)))
    }

    async fn await_receipt(
        &self,
        handle: &TransactionHandle,
    ) -> Result<TransactionReceipt, GatewayError> {
        let hash = H256::from(handle.hash().0);
        let poll = async {
            loop {
                match self.provider.get_transaction_receipt(hash).await {
                    Ok(Some(receipt)) => break receipt,
                    Ok(None) => {}
                    Err(err) => {
                        tracing::debug!(tx = %handle, error = %err, "receipt poll failed, retrying")
                    }
                }
                tokio::time::sleep(self.poll_interval).await;
            }
        };
        let receipt = tokio::time::timeout(self.receipt_timeout, poll)
            .await
            .map_err(|_| GatewayError::Timeout(handle.hash()))?;

        if receipt.status.map(|s| s.as_u64()) == Some(0) {
            return Err(GatewayError::Reverted(handle.hash()));
        }
        let logs = receipt
            .logs
            .into_iter()
            .map(|log| RawLog {
                topics: log.topics.into_iter().map(|t| B256::from(t.0)).collect(),
                data: Bytes::from(log.data.to_vec()),
            })
            .collect();
        Ok(TransactionReceipt { logs })
    }

    async fn read_state(&self, call: &CallSpec) -> Result<Bytes, GatewayError> {
        let tx: TypedTransaction = self.request(call).into();
        let out = self
            .provider
            .call(&tx, None)
            .await
            .map_err(|err| GatewayError::Rpc(err.to_string()))?;
        Ok(Bytes::from(out.to_vec()))
    }
}

fn to_h160(address: Address) -> H160 {
    H160::from_slice(address.as_slice())
}
