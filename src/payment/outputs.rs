//! Network-aware address to output matching.

use crate::error::{Error, Result};
use crate::network::SupportedNetwork;
use crate::payment::decode_transaction;
use bitcoin::address::NetworkUnchecked;
use bitcoin::{Address, Script, ScriptBuf, Transaction};

/// Resolve `address` to its locking script under `network`'s parameters.
///
/// # Errors
///
/// Returns [`Error::Address`] if the address does not parse (bad checksum,
/// unknown encoding) or was encoded for a different parameter set.
pub fn locking_script(address: &str, network: SupportedNetwork) -> Result<ScriptBuf> {
    let unchecked = address
        .trim()
        .parse::<Address<NetworkUnchecked>>()
        .map_err(|e| Error::Address(format!("{address}: {e}")))?;

    let checked = unchecked.require_network(network.to_bitcoin()).map_err(|e| {
        Error::Address(format!(
            "{address} is not a {network} address (expected hrp {:?}): {e}",
            network.params().bech32_hrp
        ))
    })?;

    Ok(checked.script_pubkey())
}

/// Sum the values of every output whose script byte-equals `script`.
#[must_use]
pub fn sum_outputs_to_script(tx: &Transaction, script: &Script) -> u64 {
    tx.output
        .iter()
        .filter(|output| output.script_pubkey.as_script() == script)
        .map(|output| output.value.to_sat())
        .sum()
}

/// Sum the satoshis a raw transaction pays to `address` on `network`.
///
/// Returns `Ok(0)` for a well-formed transaction with no matching output.
///
/// # Errors
///
/// Returns [`Error::Decode`] for malformed transaction hex and
/// [`Error::Address`] for an address unresolvable on `network`.
pub fn sum_outputs_to_address(
    raw_tx_hex: &str,
    address: &str,
    network: SupportedNetwork,
) -> Result<u64> {
    let tx = decode_transaction(raw_tx_hex)?;
    let script = locking_script(address, network)?;
    Ok(sum_outputs_to_script(&tx, &script))
}
