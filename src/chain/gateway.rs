//! Read and signing connections to the HerbChain contract.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ethers::contract::{ContractCall, ContractError};
use ethers::providers::{Http, Provider, RpcError};
use ethers::types::{Address, U256, U64};
use ethers::utils::to_checksum;

use crate::config::HerbTraceConfig;
use crate::error::{HerbTraceError, Result};

use super::contract::HerbChain;
use super::types::{Batch, LabReport, Stage, TxReceipt};
use super::wallet::{request_account, USER_REJECTED_CODE};

/// Read-only view of the contract.
#[async_trait]
pub trait ChainReader: Send + Sync {
    /// Next id the contract will assign; existing ids lie below it.
    async fn next_batch_id(&self) -> Result<u64>;

    async fn get_batch(&self, id: u64) -> Result<Batch>;

    async fn get_lab_report(&self, id: u64) -> Result<LabReport>;
}

/// Signed transitions. Each call returns once the transaction is mined.
#[async_trait]
pub trait ChainWriter: ChainReader {
    async fn create_batch(&self, metadata_cid: &str) -> Result<TxReceipt>;

    async fn verify_batch(
        &self,
        id: u64,
        report_cid: &str,
        purity: &str,
        notes: &str,
    ) -> Result<TxReceipt>;

    async fn update_stage(&self, id: u64, stage: Stage) -> Result<TxReceipt>;
}

/// HTTP provider for an http(s) endpoint.
pub(crate) fn http_provider(url: &str) -> std::result::Result<Provider<Http>, String> {
    let parsed = reqwest::Url::parse(url).map_err(|e| format!("invalid endpoint {:?}: {}", url, e))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(format!("unsupported endpoint scheme {:?}", parsed.scheme()));
    }
    Provider::<Http>::try_from(url).map_err(|e| format!("invalid endpoint {:?}: {}", url, e))
}

fn parse_address(value: &str) -> Result<Address> {
    value
        .parse::<Address>()
        .map_err(|e| HerbTraceError::InvalidConfig(format!("contract address {:?}: {}", value, e)))
}

fn to_u64(call: &str, value: U256) -> Result<u64> {
    u64::try_from(value)
        .map_err(|_| HerbTraceError::contract(call, format!("value {} does not fit in u64", value)))
}

/// Contract access over a read endpoint.
pub struct ChainGateway {
    contract: HerbChain<Provider<Http>>,
    endpoint: String,
}

impl ChainGateway {
    pub fn connect(endpoint: &str, contract_address: &str) -> Result<Self> {
        let provider = http_provider(endpoint).map_err(HerbTraceError::InvalidConfig)?;
        Self::with_provider(provider, endpoint, contract_address)
    }

    fn with_provider(provider: Provider<Http>, endpoint: &str, contract_address: &str) -> Result<Self> {
        let address = parse_address(contract_address)?;
        Ok(Self {
            contract: HerbChain::new(address, Arc::new(provider)),
            endpoint: endpoint.to_string(),
        })
    }

    /// Open a gateway on the first configured endpoint that can be
    /// constructed. Reachability is only discovered per call.
    pub fn open_read_connection(config: &HerbTraceConfig) -> Result<Self> {
        for url in &config.rpc_urls {
            match http_provider(url) {
                Ok(provider) => {
                    log::info!("READ_GATEWAY_OPENED endpoint={}", url);
                    return Self::with_provider(provider, url, &config.contract_address);
                }
                Err(e) => {
                    log::warn!("READ_ENDPOINT_FAILED endpoint={} error={}", url, e);
                }
            }
        }

        log::error!("READ_GATEWAY_UNAVAILABLE attempted={}", config.rpc_urls.len());
        Err(HerbTraceError::GatewayUnavailable {
            attempted: config.rpc_urls.len(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// EIP-55 form of the contract address.
    pub fn contract_address(&self) -> String {
        to_checksum(&self.contract.address(), None)
    }
}

#[async_trait]
impl ChainReader for ChainGateway {
    async fn next_batch_id(&self) -> Result<u64> {
        let next = self
            .contract
            .next_batch_id()
            .call()
            .await
            .map_err(|e| HerbTraceError::contract("nextBatchId", e))?;
        to_u64("nextBatchId", next)
    }

    /// Uses the `batches` mapping getter, which answers for unknown ids with
    /// `exists == false` instead of reverting.
    async fn get_batch(&self, id: u64) -> Result<Batch> {
        let (batch_id, metadata_cid, farmer, stage, exists) = self
            .contract
            .batches(U256::from(id))
            .call()
            .await
            .map_err(|e| HerbTraceError::contract("batches", e))?;

        let stage = Stage::from_u8(stage)
            .ok_or_else(|| HerbTraceError::contract("batches", format!("unknown stage {}", stage)))?;

        Ok(Batch {
            id: to_u64("batches", batch_id)?,
            metadata_cid,
            farmer: to_checksum(&farmer, None),
            stage,
            exists,
        })
    }

    async fn get_lab_report(&self, id: u64) -> Result<LabReport> {
        let (report_ipfs, purity, notes, timestamp, lab_tech) = self
            .contract
            .get_lab_report(U256::from(id))
            .call()
            .await
            .map_err(|e| HerbTraceError::contract("getLabReport", e))?;

        Ok(LabReport {
            report_ipfs,
            purity,
            notes,
            timestamp: to_u64("getLabReport", timestamp)?,
            lab_tech: to_checksum(&lab_tech, None),
        })
    }
}

/// Contract access through the wallet, able to send transactions.
pub struct SigningGateway {
    reader: ChainGateway,
    account: Address,
    poll_interval: Duration,
}

impl SigningGateway {
    /// Connect to the configured wallet endpoint and request account access.
    pub async fn open_signing_connection(config: &HerbTraceConfig) -> Result<Self> {
        let url = config.wallet_url.as_deref().ok_or_else(|| {
            HerbTraceError::WalletUnavailable("no wallet endpoint configured".to_string())
        })?;

        Self::connect(url, &config.contract_address, config.receipt_poll_interval).await
    }

    pub async fn connect(
        wallet_url: &str,
        contract_address: &str,
        poll_interval: Duration,
    ) -> Result<Self> {
        let provider = http_provider(wallet_url)
            .map_err(HerbTraceError::WalletUnavailable)?
            .interval(poll_interval);
        let account = request_account(&provider, wallet_url).await?;

        Ok(Self {
            reader: ChainGateway::with_provider(provider, wallet_url, contract_address)?,
            account,
            poll_interval,
        })
    }

    /// EIP-55 form of the connected account.
    pub fn account(&self) -> String {
        to_checksum(&self.account, None)
    }

    /// Submit a transaction from the connected account and wait until it
    /// is mined.
    async fn send(&self, name: &str, call: ContractCall<Provider<Http>, ()>) -> Result<TxReceipt> {
        let call = call.from(self.account).legacy();

        log::info!("TX_SUBMIT call={} from={}", name, self.account());

        let pending = call.send().await.map_err(|e| map_send_error(name, e))?;
        let tx_hash = format!("{:?}", pending.tx_hash());

        log::info!("TX_PENDING call={} tx={}", name, tx_hash);

        let receipt = pending
            .interval(self.poll_interval)
            .confirmations(1)
            .await
            .map_err(|e| HerbTraceError::contract(name, e))?
            .ok_or_else(|| {
                log::warn!("TX_DROPPED call={} tx={}", name, tx_hash);
                HerbTraceError::contract(name, format!("transaction {} dropped", tx_hash))
            })?;

        let block_number = receipt.block_number.map(|b| b.as_u64());

        if receipt.status != Some(U64::from(1)) {
            log::warn!("TX_REVERTED call={} tx={}", name, tx_hash);
            return Err(HerbTraceError::contract(
                name,
                format!("transaction {} reverted", tx_hash),
            ));
        }

        log::info!(
            "TX_CONFIRMED call={} tx={} block={:?}",
            name,
            tx_hash,
            block_number
        );
        Ok(TxReceipt {
            tx_hash,
            block_number,
        })
    }
}

fn map_send_error(name: &str, error: ContractError<Provider<Http>>) -> HerbTraceError {
    let rejected = match &error {
        ContractError::MiddlewareError { e } | ContractError::ProviderError { e } => e
            .as_error_response()
            .map(|rpc| rpc.code == USER_REJECTED_CODE)
            .unwrap_or(false),
        _ => false,
    };

    if rejected {
        log::warn!("TX_REJECTED call={}", name);
        HerbTraceError::contract(name, "user rejected the transaction")
    } else {
        HerbTraceError::contract(name, error)
    }
}

#[async_trait]
impl ChainReader for SigningGateway {
    async fn next_batch_id(&self) -> Result<u64> {
        self.reader.next_batch_id().await
    }

    async fn get_batch(&self, id: u64) -> Result<Batch> {
        self.reader.get_batch(id).await
    }

    async fn get_lab_report(&self, id: u64) -> Result<LabReport> {
        self.reader.get_lab_report(id).await
    }
}

#[async_trait]
impl ChainWriter for SigningGateway {
    async fn create_batch(&self, metadata_cid: &str) -> Result<TxReceipt> {
        let call = self.reader.contract.create_batch(metadata_cid.to_string());
        self.send("createBatch", call).await
    }

    async fn verify_batch(
        &self,
        id: u64,
        report_cid: &str,
        purity: &str,
        notes: &str,
    ) -> Result<TxReceipt> {
        let call = self.reader.contract.verify_batch(
            U256::from(id),
            report_cid.to_string(),
            purity.to_string(),
            notes.to_string(),
        );
        self.send("verifyBatch", call).await
    }

    async fn update_stage(&self, id: u64, stage: Stage) -> Result<TxReceipt> {
        let call = self
            .reader
            .contract
            .update_stage(U256::from(id), stage.as_u8());
        self.send("updateStage", call).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{sent_transactions, FakeNode, FARMER, LAB_TECH};
    use ethers::utils::id;
    use pretty_assertions::assert_eq;

    const CONTRACT: &str = "0x437B1696B0E67a1430f5486583971D4520af93e1";
    const POLL: Duration = Duration::from_millis(10);

    #[tokio::test]
    async fn test_reads_decode_contract_returns() {
        let node = FakeNode::new().start().await;
        let gateway = ChainGateway::connect(&node.uri(), CONTRACT).unwrap();

        assert_eq!(gateway.next_batch_id().await.unwrap(), 103);

        let batch = gateway.get_batch(101).await.unwrap();
        assert_eq!(batch.id, 101);
        assert_eq!(batch.metadata_cid, "QmMeta101");
        assert_eq!(batch.farmer, FARMER);
        assert_eq!(batch.stage, Stage::Registered);
        assert!(batch.exists);

        let report = gateway.get_lab_report(101).await.unwrap();
        assert_eq!(report.purity, "97.5");
        assert_eq!(report.report_ipfs, "QmPdf");
        assert_eq!(report.timestamp, 1_700_000_000);
        assert_eq!(report.lab_tech, LAB_TECH);
    }

    #[tokio::test]
    async fn test_unassigned_id_reads_as_zeroed_record() {
        let node = FakeNode::new().start().await;
        let gateway = ChainGateway::connect(&node.uri(), CONTRACT).unwrap();

        let batch = gateway.get_batch(150).await.unwrap();
        assert!(!batch.exists);
        assert_eq!(batch.id, 0);
        assert_eq!(batch.farmer, "0x0000000000000000000000000000000000000000");
    }

    #[tokio::test]
    async fn test_out_of_range_stage_is_contract_failure() {
        let node = FakeNode::new().with_stage(7).start().await;
        let gateway = ChainGateway::connect(&node.uri(), CONTRACT).unwrap();

        assert!(matches!(
            gateway.get_batch(101).await,
            Err(HerbTraceError::ContractCallFailed { .. })
        ));
    }

    #[test]
    fn test_open_read_connection_skips_bad_endpoints() {
        let config = HerbTraceConfig::default()
            .with_rpc_urls(["::not-a-url::", "ftp://rpc.example", "https://1rpc.io/sepolia"]);
        let gateway = ChainGateway::open_read_connection(&config).unwrap();
        assert_eq!(gateway.endpoint(), "https://1rpc.io/sepolia");
        assert!(gateway.contract_address().eq_ignore_ascii_case(CONTRACT));
    }

    #[test]
    fn test_open_read_connection_all_fail() {
        let config = HerbTraceConfig::default().with_rpc_urls(["nope", "also nope"]);
        assert!(matches!(
            ChainGateway::open_read_connection(&config),
            Err(HerbTraceError::GatewayUnavailable { attempted: 2 })
        ));
    }

    #[tokio::test]
    async fn test_signing_requires_wallet_endpoint() {
        let config = HerbTraceConfig::default();
        assert!(matches!(
            SigningGateway::open_signing_connection(&config).await,
            Err(HerbTraceError::WalletUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_write_waits_for_receipt() {
        let node = FakeNode::new().with_pending_receipts(2).start().await;
        let gateway = SigningGateway::connect(&node.uri(), CONTRACT, POLL)
            .await
            .unwrap();
        assert_eq!(gateway.account(), FARMER);

        let receipt = gateway.update_stage(101, Stage::Shipped).await.unwrap();
        assert_eq!(receipt.tx_hash, crate::testing::TX_HASH);
        assert_eq!(receipt.block_number, Some(16));

        let sent = sent_transactions(&node).await;
        assert_eq!(sent.len(), 1);
        let from: Address = serde_json::from_value(sent[0]["from"].clone()).unwrap();
        assert_eq!(to_checksum(&from, None), FARMER);
        let data: ethers::types::Bytes = serde_json::from_value(sent[0]["data"].clone()).unwrap();
        assert_eq!(&data[..4], &id("updateStage(uint256,uint8)")[..]);
    }

    #[tokio::test]
    async fn test_reverted_write_is_contract_failure() {
        let node = FakeNode::new().reverted().start().await;
        let gateway = SigningGateway::connect(&node.uri(), CONTRACT, POLL)
            .await
            .unwrap();

        let err = gateway
            .verify_batch(101, "No_Report_Uploaded", "97.5", "Clean sample")
            .await
            .unwrap_err();
        assert!(matches!(err, HerbTraceError::ContractCallFailed { .. }));
    }

    #[tokio::test]
    async fn test_declined_write_is_reported_as_rejection() {
        let node = FakeNode::new().rejecting_sends(4001).start().await;
        let gateway = SigningGateway::connect(&node.uri(), CONTRACT, POLL)
            .await
            .unwrap();

        match gateway.create_batch("QmMeta").await {
            Err(HerbTraceError::ContractCallFailed { call, reason }) => {
                assert_eq!(call, "createBatch");
                assert_eq!(reason, "user rejected the transaction");
            }
            other => panic!("expected rejection, got {:?}", other),
        }
    }
}
