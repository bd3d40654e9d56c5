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

use std::fmt;
use std::str::FromStr;

/// App identifier
pub const CLA: u8 = 0xD7;

/// Public Key Length
pub const ED25519_PUBKEY_LEN: usize = 32;
/// Chain code Length
pub const CHAIN_CODE_LEN: usize = 32;
/// Transaction hash Length
pub const TX_HASH_LEN: usize = 32;

/// Hardened derivation flag
pub const HARDENED: u32 = 0x8000_0000;

/// Protocol magic of the Cardano mainnet
pub const MAINNET_PROTOCOL_MAGIC: u32 = 764_824_073;
/// Network id of the Cardano mainnet
pub const MAINNET_NETWORK_ID: u8 = 1;
/// Protocol magic of the Cardano testnet
pub const TESTNET_PROTOCOL_MAGIC: u32 = 42;
/// Network id of the Cardano testnet
pub const TESTNET_NETWORK_ID: u8 = 0;

/// Available instructions to interact with the Ledger device
#[repr(u8)]
pub enum InstructionCode {
    /// Instruction to retrieve the app version
    GetVersion = 0x00,
    /// Instruction to retrieve an extended public key
    GetPublicKey = 0x10,
    /// Instruction to derive (and optionally show) an address
    GetAddress = 0x11,
    /// Instruction to sign a transaction
    SignTx = 0x21,
}

/// Network profile a request is addressed to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Network {
    /// Cardano mainnet
    Mainnet,
    /// Cardano testnet
    Testnet,
}

impl Network {
    /// Protocol magic sent along with the request
    pub const fn protocol_magic(self) -> u32 {
        match self {
            Network::Mainnet => MAINNET_PROTOCOL_MAGIC,
            Network::Testnet => TESTNET_PROTOCOL_MAGIC,
        }
    }

    /// Network id sent along with the request
    pub const fn network_id(self) -> u8 {
        match self {
            Network::Mainnet => MAINNET_NETWORK_ID,
            Network::Testnet => TESTNET_NETWORK_ID,
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Network::Mainnet => f.write_str("mainnet"),
            Network::Testnet => f.write_str("testnet"),
        }
    }
}

/// Unknown network profile name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown network \"{0}\" (expected \"mainnet\" or \"testnet\")")]
pub struct UnknownNetwork(pub String);

impl FromStr for Network {
    type Err = UnknownNetwork;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mainnet" => Ok(Network::Mainnet),
            "testnet" => Ok(Network::Testnet),
            _ => Err(UnknownNetwork(s.to_string())),
        }
    }
}
