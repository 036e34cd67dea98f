//! Wallet handshake.
//!
//! The wallet is reached through an EIP-1193 style JSON-RPC endpoint. Account
//! access is interactive on the wallet side and may be declined.

use ethers::providers::{Http, Provider, ProviderError, RpcError};
use ethers::types::Address;
use ethers::utils::to_checksum;

use crate::error::{HerbTraceError, Result};

/// EIP-1193 "user rejected the request".
pub const USER_REJECTED_CODE: i64 = 4001;

/// Ask the wallet for account access and return the selected account.
pub async fn request_account(wallet: &Provider<Http>, endpoint: &str) -> Result<Address> {
    log::info!("WALLET_ACCOUNT_REQUEST endpoint={}", endpoint);

    let accounts: Vec<Address> = wallet
        .request("eth_requestAccounts", Vec::<String>::new())
        .await
        .map_err(|e| map_handshake_error(endpoint, e))?;

    let account = accounts.first().copied().ok_or_else(|| {
        HerbTraceError::WalletConnectionRejected("wallet returned no accounts".to_string())
    })?;

    log::info!("WALLET_CONNECTED account={}", to_checksum(&account, None));
    Ok(account)
}

fn map_handshake_error(endpoint: &str, error: ProviderError) -> HerbTraceError {
    match error.as_error_response() {
        Some(rpc) if rpc.code == USER_REJECTED_CODE => {
            log::warn!("WALLET_REJECTED endpoint={}", endpoint);
            HerbTraceError::WalletConnectionRejected(rpc.message.clone())
        }
        Some(rpc) => {
            log::warn!(
                "WALLET_REQUEST_FAILED endpoint={} code={} message={}",
                endpoint,
                rpc.code,
                rpc.message
            );
            HerbTraceError::WalletConnectionRejected(rpc.message.clone())
        }
        None => {
            log::warn!("WALLET_UNREACHABLE endpoint={} error={}", endpoint, error);
            HerbTraceError::WalletUnavailable(error.to_string())
        }
    }
}
