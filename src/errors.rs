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

use ledger_zondax_generic::LedgerAppError;

/// Derivation path errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// A component is not a (possibly hardened) unsigned integer
    #[error("Invalid path component \"{0}\"")]
    InvalidComponent(String),

    /// A component already carries the hardened bit
    #[error("Incorrect child value {0} (bigger or equal to 0x80000000)")]
    ChildTooLarge(u32),
}

/// Errors raised while turning raw records into a signing request
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    /// A required field is absent (or null)
    #[error("The record is missing the field \"{0}\"")]
    MissingField(&'static str),

    /// Address type tag outside of the known vocabulary
    #[error("Unknown address type {0}")]
    UnsupportedAddressType(i128),

    /// Pointer address without the full (block, tx, certificate) triple
    #[error("Invalid pointer parameters")]
    IncompletePointer,

    /// Input record without path, previous hash or previous index
    #[error("The input is missing some fields")]
    IncompleteInput,

    /// Output record without amount or destination
    #[error("The output is missing some fields")]
    IncompleteOutput,

    /// Transaction document without inputs, outputs, fee or ttl
    #[error("The transaction is missing some fields")]
    IncompleteTransaction,

    /// Hash that is not valid hex or has the wrong length
    #[error("Malformed hash: {0}")]
    MalformedHash(String),

    /// Field present but with a value of the wrong type
    #[error("Invalid value for \"{field}\": expected {expected}")]
    InvalidField {
        /// Field name
        field: &'static str,
        /// Expected value kind
        expected: &'static str,
    },

    /// Derivation path could not be parsed
    #[error("Path | {0}")]
    Path(#[from] PathError),
}

impl From<hex::FromHexError> for BuildError {
    fn from(err: hex::FromHexError) -> Self {
        BuildError::MalformedHash(err.to_string())
    }
}

/// Errors raised while serializing a request into device payloads
#[derive(Debug, thiserror::Error)]
pub enum EncodingError {
    /// Derivation path longer than a count byte can express
    #[error("Path has {0} components (at most 255 are supported)")]
    PathTooLong(usize),

    /// Variable-length field longer than its length prefix allows
    #[error("Field \"{field}\" is {len} bytes long (at most {max} are supported)")]
    FieldTooLong {
        /// Field name
        field: &'static str,
        /// Actual length
        len: usize,
        /// Maximum length
        max: usize,
    },

    /// Buffer write failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Ledger App Error
#[derive(Debug, thiserror::Error)]
pub enum CardanoError<E>
where
    E: std::error::Error,
{
    #[error("Ledger | {0}")]
    /// Common Ledger errors
    Ledger(#[from] LedgerAppError<E>),

    /// Public key returned by the device is not a valid point
    #[error("Ed25519 error: {0}")]
    Ed25519(#[from] ed25519_dalek::SignatureError),

    /// Request could not be encoded for the device
    #[error("Encoding | {0}")]
    Encoding(#[from] EncodingError),
}
