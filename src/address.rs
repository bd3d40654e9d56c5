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
//! Address parameters for addresses derived on the device
#![deny(trivial_casts, trivial_numeric_casts)]
#![deny(unused_import_braces, unused_qualifications)]
#![deny(missing_docs)]

use std::convert::TryFrom;

use crate::errors::BuildError;

/// Supported address types
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressType {
    /// Legacy (bootstrap era) address
    Byron = 0,
    /// Payment key + staking key (or staking key hash)
    Base = 1,
    /// Payment key + on-chain certificate pointer
    Pointer = 2,
    /// Payment key only
    Enterprise = 3,
    /// Staking key only
    Reward = 4,
}

impl TryFrom<i128> for AddressType {
    type Error = BuildError;

    fn try_from(tag: i128) -> Result<Self, Self::Error> {
        match tag {
            0 => Ok(AddressType::Byron),
            1 => Ok(AddressType::Base),
            2 => Ok(AddressType::Pointer),
            3 => Ok(AddressType::Enterprise),
            4 => Ok(AddressType::Reward),
            _ => Err(BuildError::UnsupportedAddressType(tag)),
        }
    }
}

/// Location of a staking certificate on chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CertificatePointer {
    /// Block index
    pub block_index: u32,
    /// Transaction index within the block
    pub tx_index: u32,
    /// Certificate index within the transaction
    pub certificate_index: u32,
}

/// Parameters the device needs to derive an address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressParameters {
    /// Address type
    pub address_type: AddressType,
    /// Payment key derivation path
    pub address_path: Vec<u32>,
    /// Staking key derivation path
    pub staking_path: Option<Vec<u32>>,
    /// Staking key hash, when the staking key is not ours
    pub staking_key_hash: Option<Vec<u8>>,
    /// Only set for [`AddressType::Pointer`]
    pub certificate_pointer: Option<CertificatePointer>,
}

/// Builds a [`CertificatePointer`]; all three components are required.
pub fn build_certificate_pointer(
    block_index: Option<u32>,
    tx_index: Option<u32>,
    certificate_index: Option<u32>,
) -> Result<CertificatePointer, BuildError> {
    match (block_index, tx_index, certificate_index) {
        (Some(block_index), Some(tx_index), Some(certificate_index)) => Ok(CertificatePointer {
            block_index,
            tx_index,
            certificate_index,
        }),
        _ => Err(BuildError::IncompletePointer),
    }
}

/// Builds [`AddressParameters`] from an address type tag and raw coordinates.
///
/// Pointer components are only read for [`AddressType::Pointer`] and ignored
/// for every other type.
pub fn build_address_parameters(
    address_type: i128,
    address_path: Vec<u32>,
    staking_path: Option<Vec<u32>>,
    staking_key_hash: Option<Vec<u8>>,
    block_index: Option<u32>,
    tx_index: Option<u32>,
    certificate_index: Option<u32>,
) -> Result<AddressParameters, BuildError> {
    let address_type = AddressType::try_from(address_type)?;

    let certificate_pointer = match address_type {
        AddressType::Pointer => Some(build_certificate_pointer(
            block_index,
            tx_index,
            certificate_index,
        )?),
        AddressType::Byron | AddressType::Base | AddressType::Enterprise | AddressType::Reward => {
            None
        }
    };

    Ok(AddressParameters {
        address_type,
        address_path,
        staking_path,
        staking_key_hash,
        certificate_pointer,
    })
}
