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
#![deny(trivial_casts, trivial_numeric_casts)]
#![deny(unused_import_braces, unused_qualifications)]
#![deny(missing_docs)]

use std::convert::TryFrom;

use byteorder::{LittleEndian, WriteBytesExt};
use ed25519_dalek::VerifyingKey;

use crate::address::AddressParameters;
use crate::errors::{EncodingError, PathError};
use crate::params::{CHAIN_CODE_LEN, HARDENED, TX_HASH_LEN};
use crate::tx::{SigningRequest, TxInput, TxOutput};

/// Address derived by the device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseAddress {
    /// Address string format
    pub address: String,
}

/// Extended public key returned by the device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponsePublicKey {
    /// Ed25519 public key
    pub public_key: VerifyingKey,
    /// BIP32 chain code
    pub chain_code: [u8; CHAIN_CODE_LEN],
}

/// Signed transaction, as returned by the device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningResponse {
    /// Transaction hash
    pub tx_hash: [u8; TX_HASH_LEN],
    /// Serialized signed transaction
    pub serialized_tx: Vec<u8>,
}

const OUTPUT_TAG_DIRECT: u8 = 0;
const OUTPUT_TAG_CHANGE: u8 = 1;

fn parse_component(component: &str) -> Result<u32, PathError> {
    let is_hardened_marker = |c: char| c == '\'' || c == 'h' || c == 'H';
    let (digits, hardened) = match component.strip_suffix(is_hardened_marker) {
        Some(digits) => (digits, true),
        None => (component, false),
    };

    let child = digits
        .parse::<u32>()
        .map_err(|_| PathError::InvalidComponent(component.to_string()))?;
    if child >= HARDENED {
        return Err(PathError::ChildTooLarge(child));
    }

    Ok(if hardened { child | HARDENED } else { child })
}

/// Parses a derivation path ("m/1852'/1815'/0'/0/0").
///
/// The "m/" prefix is optional, and `'`, `h` or `H` mark hardened
/// components. An empty path (or "m") yields no components.
pub fn parse_path(path: &str) -> Result<Vec<u32>, PathError> {
    let path = path.trim();
    let body = match path {
        "" | "m" | "M" => return Ok(Vec::new()),
        p => p
            .strip_prefix("m/")
            .or_else(|| p.strip_prefix("M/"))
            .unwrap_or(p),
    };

    body.split('/').map(parse_component).collect()
}

fn write_path(buf: &mut Vec<u8>, path: &[u32]) -> Result<(), EncodingError> {
    // First byte is path size
    let len = u8::try_from(path.len()).map_err(|_| EncodingError::PathTooLong(path.len()))?;
    buf.write_u8(len)?;
    for child in path {
        buf.write_u32::<LittleEndian>(*child)?;
    }
    Ok(())
}

/// Serializes a derivation path in the format used in the app
pub fn serialize_path(path: &[u32]) -> Result<Vec<u8>, EncodingError> {
    let mut buf = Vec::with_capacity(1 + 4 * path.len());
    write_path(&mut buf, path)?;
    Ok(buf)
}

fn write_address_parameters(
    buf: &mut Vec<u8>,
    params: &AddressParameters,
) -> Result<(), EncodingError> {
    buf.write_u8(params.address_type as u8)?;
    write_path(buf, &params.address_path)?;

    match &params.staking_path {
        Some(path) => {
            buf.write_u8(1)?;
            write_path(buf, path)?;
        }
        None => buf.write_u8(0)?,
    }

    match &params.staking_key_hash {
        Some(hash) => {
            let len = u8::try_from(hash.len()).map_err(|_| EncodingError::FieldTooLong {
                field: "stakingKeyHash",
                len: hash.len(),
                max: u8::MAX as usize,
            })?;
            buf.write_u8(1)?;
            buf.write_u8(len)?;
            buf.extend_from_slice(hash);
        }
        None => buf.write_u8(0)?,
    }

    match &params.certificate_pointer {
        Some(pointer) => {
            buf.write_u8(1)?;
            buf.write_u32::<LittleEndian>(pointer.block_index)?;
            buf.write_u32::<LittleEndian>(pointer.tx_index)?;
            buf.write_u32::<LittleEndian>(pointer.certificate_index)?;
        }
        None => buf.write_u8(0)?,
    }

    Ok(())
}

/// Serializes the payload of a get-address request
pub fn serialize_address_request(
    params: &AddressParameters,
    protocol_magic: u32,
    network_id: u8,
) -> Result<Vec<u8>, EncodingError> {
    let mut buf = Vec::new();
    buf.write_u32::<LittleEndian>(protocol_magic)?;
    buf.write_u8(network_id)?;
    write_address_parameters(&mut buf, params)?;
    Ok(buf)
}

fn write_input(buf: &mut Vec<u8>, input: &TxInput) -> Result<(), EncodingError> {
    write_path(buf, &input.derivation_path)?;
    buf.extend_from_slice(&input.previous_tx_hash);
    buf.write_u32::<LittleEndian>(input.previous_output_index)?;
    Ok(())
}

fn write_output(buf: &mut Vec<u8>, output: &TxOutput) -> Result<(), EncodingError> {
    match output {
        TxOutput::Direct { address, amount } => {
            let len = u16::try_from(address.len()).map_err(|_| EncodingError::FieldTooLong {
                field: "address",
                len: address.len(),
                max: u16::MAX as usize,
            })?;
            buf.write_u8(OUTPUT_TAG_DIRECT)?;
            buf.write_u64::<LittleEndian>(*amount)?;
            buf.write_u16::<LittleEndian>(len)?;
            buf.extend_from_slice(address.as_bytes());
        }
        TxOutput::Change {
            address_parameters,
            amount,
        } => {
            buf.write_u8(OUTPUT_TAG_CHANGE)?;
            buf.write_u64::<LittleEndian>(*amount)?;
            write_address_parameters(buf, address_parameters)?;
        }
    }
    Ok(())
}

fn item_count(count: usize, field: &'static str) -> Result<u16, EncodingError> {
    u16::try_from(count).map_err(|_| EncodingError::FieldTooLong {
        field,
        len: count,
        max: u16::MAX as usize,
    })
}

/// Serializes the header of a sign request (sent with the init chunk)
pub fn serialize_tx_header(request: &SigningRequest) -> Result<Vec<u8>, EncodingError> {
    let mut buf = Vec::new();
    buf.write_u32::<LittleEndian>(request.protocol_magic)?;
    buf.write_u8(request.network_id)?;
    buf.write_u64::<LittleEndian>(request.fee)?;
    buf.write_u64::<LittleEndian>(request.ttl)?;
    buf.write_u16::<LittleEndian>(item_count(request.inputs.len(), "inputs")?)?;
    buf.write_u16::<LittleEndian>(item_count(request.outputs.len(), "outputs")?)?;
    Ok(buf)
}

/// Serializes the body of a sign request: every input, then every output
pub fn serialize_tx_body(request: &SigningRequest) -> Result<Vec<u8>, EncodingError> {
    let mut buf = Vec::new();
    for input in &request.inputs {
        write_input(&mut buf, input)?;
    }
    for output in &request.outputs {
        write_output(&mut buf, output)?;
    }
    Ok(buf)
}
