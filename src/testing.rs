//! Stand-ins for the contract, its JSON-RPC node and the metadata store.
//!
//! `InMemoryChain` follows the deployed contract's observable rules: ids are
//! assigned sequentially, unknown ids read back as zeroed records, lab data
//! is written once at verification, and stages only move forward.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use ethers::abi::{decode, encode, ParamType, Token};
use ethers::types::{Address, Bytes, U256};
use ethers::utils::id;
use parking_lot::Mutex;
use serde_json::{json, Value};
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

use crate::chain::types::{Batch, LabReport, Stage, TxReceipt};
use crate::chain::{ChainReader, ChainWriter};
use crate::error::{HerbTraceError, Result};
use crate::extraction::{MetadataSource, NormalizedMetadata};
use crate::logging::structured::LogContext;

pub const FARMER: &str = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";
pub const LAB_TECH: &str = "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359";
const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

#[derive(Default)]
struct ChainState {
    next_id: u64,
    batches: BTreeMap<u64, Batch>,
    reports: BTreeMap<u64, LabReport>,
    failing: HashSet<u64>,
    failing_reports: HashSet<u64>,
    batch_reads: Vec<u64>,
    report_reads: Vec<u64>,
    tx_count: u64,
}

pub struct InMemoryChain {
    state: Mutex<ChainState>,
}

impl InMemoryChain {
    pub fn new(batch_id_start: u64) -> Self {
        Self {
            state: Mutex::new(ChainState {
                next_id: batch_id_start,
                ..ChainState::default()
            }),
        }
    }

    fn bump(state: &mut ChainState, id: u64) {
        if state.next_id <= id {
            state.next_id = id + 1;
        }
    }

    pub fn with_batch(self, id: u64, metadata_cid: &str, stage: Stage) -> Self {
        {
            let mut state = self.state.lock();
            state.batches.insert(
                id,
                Batch {
                    id,
                    metadata_cid: metadata_cid.to_string(),
                    farmer: FARMER.to_string(),
                    stage,
                    exists: true,
                },
            );
            Self::bump(&mut state, id);
        }
        self
    }

    /// Reserve an id that reads back as never created.
    pub fn with_gap(self, id: u64) -> Self {
        Self::bump(&mut self.state.lock(), id);
        self
    }

    pub fn with_report(self, id: u64, report_cid: &str, purity: &str, notes: &str) -> Self {
        self.state.lock().reports.insert(
            id,
            LabReport {
                report_ipfs: report_cid.to_string(),
                purity: purity.to_string(),
                notes: notes.to_string(),
                timestamp: 1_700_000_000,
                lab_tech: LAB_TECH.to_string(),
            },
        );
        self
    }

    /// Every read of this batch fails as if the endpoint errored.
    pub fn failing(self, id: u64) -> Self {
        self.state.lock().failing.insert(id);
        self
    }

    pub fn failing_report(self, id: u64) -> Self {
        self.state.lock().failing_reports.insert(id);
        self
    }

    pub fn batch_reads(&self) -> Vec<u64> {
        self.state.lock().batch_reads.clone()
    }

    pub fn report_reads(&self) -> Vec<u64> {
        self.state.lock().report_reads.clone()
    }

    fn receipt(state: &mut ChainState) -> TxReceipt {
        state.tx_count += 1;
        TxReceipt {
            tx_hash: format!("0x{:064x}", state.tx_count),
            block_number: Some(state.tx_count),
        }
    }
}

#[async_trait]
impl ChainReader for InMemoryChain {
    async fn next_batch_id(&self) -> Result<u64> {
        Ok(self.state.lock().next_id)
    }

    async fn get_batch(&self, id: u64) -> Result<Batch> {
        let mut state = self.state.lock();
        state.batch_reads.push(id);
        if state.failing.contains(&id) {
            return Err(HerbTraceError::contract("batches", "rate limited"));
        }
        Ok(state.batches.get(&id).cloned().unwrap_or(Batch {
            id: 0,
            metadata_cid: String::new(),
            farmer: ZERO_ADDRESS.to_string(),
            stage: Stage::Registered,
            exists: false,
        }))
    }

    async fn get_lab_report(&self, id: u64) -> Result<LabReport> {
        let mut state = self.state.lock();
        state.report_reads.push(id);
        if state.failing_reports.contains(&id) {
            return Err(HerbTraceError::contract("getLabReport", "execution reverted"));
        }
        Ok(state.reports.get(&id).cloned().unwrap_or(LabReport {
            report_ipfs: String::new(),
            purity: String::new(),
            notes: String::new(),
            timestamp: 0,
            lab_tech: ZERO_ADDRESS.to_string(),
        }))
    }
}

#[async_trait]
impl ChainWriter for InMemoryChain {
    async fn create_batch(&self, metadata_cid: &str) -> Result<TxReceipt> {
        let mut state = self.state.lock();
        let id = state.next_id;
        state.batches.insert(
            id,
            Batch {
                id,
                metadata_cid: metadata_cid.to_string(),
                farmer: FARMER.to_string(),
                stage: Stage::Registered,
                exists: true,
            },
        );
        state.next_id += 1;
        Ok(Self::receipt(&mut state))
    }

    async fn verify_batch(
        &self,
        id: u64,
        report_cid: &str,
        purity: &str,
        notes: &str,
    ) -> Result<TxReceipt> {
        let mut state = self.state.lock();
        let batch = state
            .batches
            .get_mut(&id)
            .ok_or_else(|| HerbTraceError::contract("verifyBatch", "batch does not exist"))?;
        if batch.stage >= Stage::Verified {
            return Err(HerbTraceError::contract("verifyBatch", "already verified"));
        }
        batch.stage = Stage::Verified;
        state.reports.insert(
            id,
            LabReport {
                report_ipfs: report_cid.to_string(),
                purity: purity.to_string(),
                notes: notes.to_string(),
                timestamp: 1_700_000_000,
                lab_tech: LAB_TECH.to_string(),
            },
        );
        Ok(Self::receipt(&mut state))
    }

    async fn update_stage(&self, id: u64, stage: Stage) -> Result<TxReceipt> {
        let mut state = self.state.lock();
        let batch = state
            .batches
            .get_mut(&id)
            .ok_or_else(|| HerbTraceError::contract("updateStage", "batch does not exist"))?;
        if stage <= batch.stage {
            return Err(HerbTraceError::contract("updateStage", "invalid transition"));
        }
        batch.stage = stage;
        Ok(Self::receipt(&mut state))
    }
}

/// Metadata keyed by CID; unknown CIDs resolve to `None`.
#[derive(Default)]
pub struct StaticMetadata {
    docs: HashMap<String, NormalizedMetadata>,
}

impl StaticMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_doc(mut self, cid: &str, name: &str, location: &str) -> Self {
        self.docs.insert(
            cid.to_string(),
            NormalizedMetadata {
                name: Some(name.to_string()),
                location: Some(location.to_string()),
                harvest_date: Some("2025-01-12".to_string()),
                image_cid: Some(format!("{}-image", cid)),
                farmer_name: Some("Verified Farmer".to_string()),
            },
        );
        self
    }
}

#[async_trait]
impl MetadataSource for StaticMetadata {
    async fn resolve(&self, cid: &str, _ctx: &LogContext) -> Option<NormalizedMetadata> {
        self.docs.get(cid).cloned()
    }
}

pub const TX_HASH: &str = "0x5c504ed432cb51138bcf09aa5e8a410dd4a1e204ef84bfed1be16dfba1b22060";
const BLOCK_HASH: &str = "0x9b559aef7ea858608c2e554246fe4a24287e7aeeb976848df2b9a2531f4b9171";

type RpcOutcome = std::result::Result<Value, (i64, String)>;

fn address(value: &str) -> Address {
    value.parse().unwrap()
}

/// JSON-RPC node serving the HerbChain contract at batch 101, and acting as
/// the wallet for signed calls.
pub struct FakeNode {
    stage: u8,
    accounts: Value,
    account_error: Option<i64>,
    send_error: Option<i64>,
    pending_receipts: AtomicU32,
    reverted: bool,
}

impl FakeNode {
    pub fn new() -> Self {
        Self {
            stage: 0,
            accounts: json!([FARMER, LAB_TECH]),
            account_error: None,
            send_error: None,
            pending_receipts: AtomicU32::new(0),
            reverted: false,
        }
    }

    pub fn with_stage(mut self, stage: u8) -> Self {
        self.stage = stage;
        self
    }

    pub fn with_accounts(mut self, accounts: Value) -> Self {
        self.accounts = accounts;
        self
    }

    pub fn rejecting_accounts(mut self, code: i64) -> Self {
        self.account_error = Some(code);
        self
    }

    pub fn rejecting_sends(mut self, code: i64) -> Self {
        self.send_error = Some(code);
        self
    }

    /// Answer this many receipt polls with `null` before the transaction is mined.
    pub fn with_pending_receipts(self, polls: u32) -> Self {
        self.pending_receipts.store(polls, Ordering::SeqCst);
        self
    }

    pub fn reverted(mut self) -> Self {
        self.reverted = true;
        self
    }

    pub async fn start(self) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(self)
            .mount(&server)
            .await;
        server
    }

    fn answer(&self, method: &str, params: &Value) -> RpcOutcome {
        match method {
            "eth_requestAccounts" | "eth_accounts" => match self.account_error {
                Some(code) => Err((code, "User rejected the request.".to_string())),
                None => Ok(self.accounts.clone()),
            },
            "eth_chainId" => Ok(json!("0xaa36a7")),
            "eth_gasPrice" => Ok(json!("0x3b9aca00")),
            "eth_estimateGas" => Ok(json!("0x5208")),
            "eth_getTransactionCount" => Ok(json!("0x0")),
            "eth_blockNumber" => Ok(json!("0x20")),
            "eth_sendTransaction" => match self.send_error {
                Some(code) => Err((code, "User denied transaction signature.".to_string())),
                None => Ok(json!(TX_HASH)),
            },
            "eth_getTransactionByHash" => Ok(json!({
                "hash": TX_HASH,
                "nonce": "0x0",
                "blockHash": BLOCK_HASH,
                "blockNumber": "0x10",
                "transactionIndex": "0x0",
                "from": FARMER,
                "to": ZERO_ADDRESS,
                "value": "0x0",
                "gasPrice": "0x3b9aca00",
                "gas": "0x5208",
                "input": "0x",
                "v": "0x1b",
                "r": "0x1",
                "s": "0x1",
                "type": "0x0",
            })),
            "eth_getTransactionReceipt" => {
                let pending = self.pending_receipts.load(Ordering::SeqCst);
                if pending > 0 {
                    self.pending_receipts.store(pending - 1, Ordering::SeqCst);
                    return Ok(Value::Null);
                }
                Ok(json!({
                    "transactionHash": TX_HASH,
                    "transactionIndex": "0x0",
                    "blockHash": BLOCK_HASH,
                    "blockNumber": "0x10",
                    "from": FARMER,
                    "to": ZERO_ADDRESS,
                    "cumulativeGasUsed": "0x5208",
                    "gasUsed": "0x5208",
                    "contractAddress": null,
                    "logs": [],
                    "logsBloom": format!("0x{}", "0".repeat(512)),
                    "status": if self.reverted { "0x0" } else { "0x1" },
                    "type": "0x0",
                    "effectiveGasPrice": "0x3b9aca00",
                }))
            }
            "eth_call" => {
                let tx = &params[0];
                let data = tx.get("data").or_else(|| tx.get("input")).cloned();
                let data: Bytes = data
                    .and_then(|d| serde_json::from_value(d).ok())
                    .unwrap_or_default();
                self.contract_call(&data)
                    .map(|ret| json!(Bytes::from(ret)))
            }
            other => Err((-32601, format!("method {} not found", other))),
        }
    }

    fn contract_call(&self, data: &[u8]) -> std::result::Result<Vec<u8>, (i64, String)> {
        if data.len() < 4 {
            return Err((-32602, "missing selector".to_string()));
        }
        let (selector, args) = data.split_at(4);
        let batch_id = decode(&[ParamType::Uint(256)], args)
            .ok()
            .and_then(|tokens| tokens.into_iter().next())
            .and_then(Token::into_uint)
            .map(|id| id.as_u64());

        if selector == &id("nextBatchId()")[..] {
            Ok(encode(&[Token::Uint(U256::from(103))]))
        } else if selector == &id("batches(uint256)")[..] {
            let tokens = match batch_id {
                Some(101) => vec![
                    Token::Uint(U256::from(101)),
                    Token::String("QmMeta101".to_string()),
                    Token::Address(address(FARMER)),
                    Token::Uint(U256::from(self.stage)),
                    Token::Bool(true),
                ],
                _ => vec![
                    Token::Uint(U256::zero()),
                    Token::String(String::new()),
                    Token::Address(Address::zero()),
                    Token::Uint(U256::zero()),
                    Token::Bool(false),
                ],
            };
            Ok(encode(&tokens))
        } else if selector == &id("getLabReport(uint256)")[..] {
            Ok(encode(&[Token::Tuple(vec![
                Token::String("QmPdf".to_string()),
                Token::String("97.5".to_string()),
                Token::String("Clean sample".to_string()),
                Token::Uint(U256::from(1_700_000_000u64)),
                Token::Address(address(LAB_TECH)),
            ])]))
        } else {
            Err((3, "execution reverted".to_string()))
        }
    }
}

impl Respond for FakeNode {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: Value = serde_json::from_slice(&request.body).unwrap_or(Value::Null);
        let request_id = body["id"].clone();
        let method = body["method"].as_str().unwrap_or_default();

        let reply = match self.answer(method, &body["params"]) {
            Ok(result) => json!({"jsonrpc": "2.0", "id": request_id, "result": result}),
            Err((code, message)) => json!({
                "jsonrpc": "2.0",
                "id": request_id,
                "error": {"code": code, "message": message},
            }),
        };
        ResponseTemplate::new(200).set_body_json(reply)
    }
}

/// Transaction objects the node received through `eth_sendTransaction`.
pub async fn sent_transactions(server: &MockServer) -> Vec<Value> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter_map(|request| serde_json::from_slice::<Value>(&request.body).ok())
        .filter(|body| body["method"] == "eth_sendTransaction")
        .map(|body| body["params"][0].clone())
        .collect()
}
