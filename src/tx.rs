/*******************************************************************************
*   (c) 2018 - 2023 ZondaX AG
*
*  Licensed under the Apache License, Version 2.0 (the "License");
*  you may not use this file except in compliance with the License.
*  You may obtain a copy of the License at
*
*      http://www.apache.org/licenses/LICENSE-2.0
*
*  Unless required by applicable law or agreed to in writing, software
*  distributed under the License is distributed on an "AS IS" BASIS,
*  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
*  See the License for the specific language governing permissions and
*  limitations under the License.
********************************************************************************/
//! Transaction inputs, outputs and the signing request built from raw records
#![deny(trivial_casts, trivial_numeric_casts)]
#![deny(unused_import_braces, unused_qualifications)]
#![deny(missing_docs)]

use serde_json::Value;

use crate::address::{build_address_parameters, AddressParameters};
use crate::errors::BuildError;
use crate::fields::{
    get_array, get_integer, get_str, get_u32, get_u64, require_fields, Field, RawRecord,
};
use crate::params::{Network, TX_HASH_LEN};
use crate::utils::parse_path;

const PATH: Field = Field::new("path");
const PREV_HASH: Field = Field::with_aliases("previousTxHash", &["prev_hash"]);
const PREV_INDEX: Field = Field::with_aliases("previousOutputIndex", &["prev_index"]);

const AMOUNT: Field = Field::new("amount");
const ADDRESS: Field = Field::new("address");
const ADDRESS_TYPE: Field = Field::new("addressType");
const STAKING_PATH: Field = Field::new("stakingPath");
const STAKING_KEY_HASH: Field = Field::new("stakingKeyHash");
const BLOCK_INDEX: Field = Field::new("blockIndex");
const TX_INDEX: Field = Field::new("txIndex");
const CERTIFICATE_INDEX: Field = Field::new("certificateIndex");

const INPUTS: Field = Field::new("inputs");
const OUTPUTS: Field = Field::new("outputs");
const FEE: Field = Field::new("fee");
const TTL: Field = Field::with_aliases("ttl", &["timeToLive"]);

const REQUIRED_FIELDS_INPUT: [Field; 3] = [PATH, PREV_HASH, PREV_INDEX];
const REQUIRED_FIELDS_TRANSACTION: [Field; 4] = [INPUTS, OUTPUTS, FEE, TTL];

/// Transaction input spent by a key we control
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxInput {
    /// Derivation path of the key owning the output being spent
    pub derivation_path: Vec<u32>,
    /// Hash of the transaction holding the output being spent
    pub previous_tx_hash: [u8; TX_HASH_LEN],
    /// Index of that output
    pub previous_output_index: u32,
}

/// Transaction output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxOutput {
    /// Output paying to a literal address
    Direct {
        /// Destination address
        address: String,
        /// Amount in lovelace
        amount: u64,
    },
    /// Output paying back to an address derived on the device
    Change {
        /// Parameters to derive the destination address
        address_parameters: AddressParameters,
        /// Amount in lovelace
        amount: u64,
    },
}

impl TxOutput {
    /// Amount in lovelace
    pub fn amount(&self) -> u64 {
        match self {
            TxOutput::Direct { amount, .. } | TxOutput::Change { amount, .. } => *amount,
        }
    }
}

/// Everything the device needs to sign a transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningRequest {
    /// Inputs, in on-chain order
    pub inputs: Vec<TxInput>,
    /// Outputs, in on-chain order
    pub outputs: Vec<TxOutput>,
    /// Fee in lovelace
    pub fee: u64,
    /// Slot after which the transaction is no longer valid
    pub ttl: u64,
    /// Protocol magic of the target network
    pub protocol_magic: u32,
    /// Network id of the target network
    pub network_id: u8,
}

impl SigningRequest {
    /// Assembles a request for one of the known network profiles
    pub fn for_network(
        inputs: Vec<TxInput>,
        outputs: Vec<TxOutput>,
        fee: u64,
        ttl: u64,
        network: Network,
    ) -> Self {
        assemble(
            inputs,
            outputs,
            fee,
            ttl,
            network.protocol_magic(),
            network.network_id(),
        )
    }
}

fn decode_hash(text: &str) -> Result<[u8; TX_HASH_LEN], BuildError> {
    let bytes = hex::decode(text)?;
    if bytes.len() != TX_HASH_LEN {
        return Err(BuildError::MalformedHash(format!(
            "expected {} bytes, got {}",
            TX_HASH_LEN,
            bytes.len()
        )));
    }

    let mut hash = [0u8; TX_HASH_LEN];
    hash.copy_from_slice(&bytes);
    Ok(hash)
}

/// Builds a [`TxInput`] from a raw input record
pub fn build_input(raw: &RawRecord) -> Result<TxInput, BuildError> {
    if let Err(err) = require_fields(raw, &REQUIRED_FIELDS_INPUT) {
        log::debug!("Rejecting input: {}", err);
        return Err(BuildError::IncompleteInput);
    }

    let path = get_str(raw, PATH)?.ok_or(BuildError::IncompleteInput)?;
    let prev_hash = get_str(raw, PREV_HASH)?.ok_or(BuildError::IncompleteInput)?;
    let prev_index = get_u32(raw, PREV_INDEX)?.ok_or(BuildError::IncompleteInput)?;

    Ok(TxInput {
        derivation_path: parse_path(path)?,
        previous_tx_hash: decode_hash(prev_hash)?,
        previous_output_index: prev_index,
    })
}

/// Builds a [`TxOutput`] from a raw output record.
///
/// A literal `address` always wins over `addressType`; only records carrying
/// just an `addressType` become change outputs.
pub fn build_output(raw: &RawRecord) -> Result<TxOutput, BuildError> {
    if !AMOUNT.is_present(raw) {
        log::debug!("Rejecting output: no amount");
        return Err(BuildError::IncompleteOutput);
    }
    if !(ADDRESS.is_present(raw) || ADDRESS_TYPE.is_present(raw)) {
        log::debug!("Rejecting output: neither address nor addressType");
        return Err(BuildError::IncompleteOutput);
    }

    match get_str(raw, ADDRESS)? {
        Some(address) => Ok(TxOutput::Direct {
            address: address.to_string(),
            amount: get_u64(raw, AMOUNT)?.ok_or(BuildError::IncompleteOutput)?,
        }),
        None => build_change_output(raw),
    }
}

fn build_change_output(raw: &RawRecord) -> Result<TxOutput, BuildError> {
    let path = match get_str(raw, PATH)? {
        Some(path) => path,
        None => {
            log::debug!("Rejecting change output: no path");
            return Err(BuildError::IncompleteOutput);
        }
    };

    // An empty staking key hash means "not supplied"
    let staking_key_hash = match get_str(raw, STAKING_KEY_HASH)? {
        Some(text) if !text.is_empty() => Some(hex::decode(text)?),
        _ => None,
    };

    let address_type = get_integer(raw, ADDRESS_TYPE)?.ok_or(BuildError::IncompleteOutput)?;
    let address_path = parse_path(path)?;

    let staking_path = match get_str(raw, STAKING_PATH)? {
        Some(text) => Some(parse_path(text)?),
        None => None,
    };

    let address_parameters = build_address_parameters(
        address_type,
        address_path,
        staking_path,
        staking_key_hash,
        get_u32(raw, BLOCK_INDEX)?,
        get_u32(raw, TX_INDEX)?,
        get_u32(raw, CERTIFICATE_INDEX)?,
    )?;

    Ok(TxOutput::Change {
        address_parameters,
        amount: get_u64(raw, AMOUNT)?.ok_or(BuildError::IncompleteOutput)?,
    })
}

/// Aggregates already validated inputs and outputs into a [`SigningRequest`].
///
/// Input and output order is preserved as given.
pub fn assemble(
    inputs: Vec<TxInput>,
    outputs: Vec<TxOutput>,
    fee: u64,
    ttl: u64,
    protocol_magic: u32,
    network_id: u8,
) -> SigningRequest {
    SigningRequest {
        inputs,
        outputs,
        fee,
        ttl,
        protocol_magic,
        network_id,
    }
}

fn as_record<'a>(value: &'a Value, kind: &'static str) -> Result<&'a RawRecord, BuildError> {
    value.as_object().ok_or(BuildError::InvalidField {
        field: kind,
        expected: "an object",
    })
}

/// Builds a complete [`SigningRequest`] from a raw transaction document
/// (`inputs`, `outputs`, `fee` and `ttl`).
///
/// Nothing is returned unless every input and output validates.
pub fn build_request(
    document: &RawRecord,
    network: Network,
) -> Result<SigningRequest, BuildError> {
    if let Err(err) = require_fields(document, &REQUIRED_FIELDS_TRANSACTION) {
        log::debug!("Rejecting transaction: {}", err);
        return Err(BuildError::IncompleteTransaction);
    }

    let raw_inputs = get_array(document, INPUTS)?.ok_or(BuildError::IncompleteTransaction)?;
    let raw_outputs = get_array(document, OUTPUTS)?.ok_or(BuildError::IncompleteTransaction)?;

    let inputs = raw_inputs
        .iter()
        .map(|value| as_record(value, "inputs").and_then(build_input))
        .collect::<Result<Vec<_>, _>>()?;
    let outputs = raw_outputs
        .iter()
        .map(|value| as_record(value, "outputs").and_then(build_output))
        .collect::<Result<Vec<_>, _>>()?;

    let fee = get_u64(document, FEE)?.ok_or(BuildError::IncompleteTransaction)?;
    let ttl = get_u64(document, TTL)?.ok_or(BuildError::IncompleteTransaction)?;

    log::debug!(
        "Built {} request with {} inputs and {} outputs",
        network,
        inputs.len(),
        outputs.len()
    );

    Ok(SigningRequest::for_network(inputs, outputs, fee, ttl, network))
}
