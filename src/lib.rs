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
//! Support library for Cardano Ledger Nano S/S+/X/Stax apps
//!
//! Raw, loosely-typed transaction records are validated into a
//! [`SigningRequest`] by [`build_input`], [`build_output`] and [`assemble`]
//! (or [`build_request`] for a whole transaction document), and then handed
//! to the device through [`CardanoApp`].

#![deny(trivial_casts, trivial_numeric_casts)]
#![deny(unused_import_braces, unused_qualifications)]
#![deny(missing_docs)]
#![doc(html_root_url = "https://docs.rs/ledger-cardano/0.0.1")]

use std::ops::Deref;
use std::str;

use ed25519_dalek::VerifyingKey;
use ledger_transport::{APDUAnswer, APDUCommand, APDUErrorCode, Exchange};
use ledger_zondax_generic::{App, AppExt, ChunkPayloadType, Version};

pub use ledger_zondax_generic::LedgerAppError;

mod address;
mod errors;
mod fields;
mod params;
mod tx;
mod utils;

pub use address::{
    build_address_parameters, build_certificate_pointer, AddressParameters, AddressType,
    CertificatePointer,
};
pub use errors::{BuildError, CardanoError, EncodingError, PathError};
pub use fields::{require_fields, Field, RawRecord};
pub use params::{
    InstructionCode, Network, UnknownNetwork, CHAIN_CODE_LEN, CLA, ED25519_PUBKEY_LEN,
    TX_HASH_LEN,
};
pub use tx::{
    assemble, build_input, build_output, build_request, SigningRequest, TxInput, TxOutput,
};
pub use utils::{parse_path, ResponseAddress, ResponsePublicKey, SigningResponse};

use utils::{serialize_address_request, serialize_path, serialize_tx_body, serialize_tx_header};

/// Cardano App
pub struct CardanoApp<E> {
    apdu_transport: E,
}

impl<E: Exchange> App for CardanoApp<E> {
    const CLA: u8 = CLA;
}

impl<E> CardanoApp<E> {
    /// Create a new [`CardanoApp`] with the given transport
    pub const fn new(transport: E) -> Self {
        CardanoApp {
            apdu_transport: transport,
        }
    }
}

fn check_error_code<B, E>(response: &APDUAnswer<B>) -> Result<(), CardanoError<E>>
where
    B: Deref<Target = [u8]>,
    E: std::error::Error,
{
    match response.error_code() {
        Ok(APDUErrorCode::NoError) => Ok(()),
        Ok(err) => Err(CardanoError::Ledger(LedgerAppError::AppSpecific(
            err as _,
            err.description(),
        ))),
        Err(err) => Err(CardanoError::Ledger(LedgerAppError::AppSpecific(
            err,
            "[APDU_ERROR] Unknown".to_string(),
        ))),
    }
}

impl<E> CardanoApp<E>
where
    E: Exchange + Send + Sync,
    E::Error: std::error::Error,
{
    /// Retrieve the app version
    pub async fn version(&self) -> Result<Version, CardanoError<E::Error>> {
        <Self as AppExt<E>>::get_version(&self.apdu_transport)
            .await
            .map_err(Into::into)
    }

    /// Derives an address on the device, optionally showing it for confirmation
    pub async fn get_address(
        &self,
        address_parameters: &AddressParameters,
        protocol_magic: u32,
        network_id: u8,
        show_on_device: bool,
    ) -> Result<ResponseAddress, CardanoError<E::Error>> {
        let data = serialize_address_request(address_parameters, protocol_magic, network_id)?;
        let p1: u8 = if show_on_device { 1 } else { 0 };
        let command = APDUCommand {
            cla: CLA,
            ins: InstructionCode::GetAddress as _,
            p1,
            p2: 0x00,
            data,
        };

        log::debug!(
            "GetAddress {:?} (protocol magic {}, network id {}, display {})",
            address_parameters.address_type,
            protocol_magic,
            network_id,
            show_on_device
        );

        let response = self
            .apdu_transport
            .exchange(&command)
            .await
            .map_err(LedgerAppError::TransportError)?;
        check_error_code::<_, E::Error>(&response)?;

        let address = str::from_utf8(response.data())
            .map_err(|_| CardanoError::Ledger(LedgerAppError::Utf8))?
            .to_owned();

        Ok(ResponseAddress { address })
    }

    /// Retrieves the extended public key at `derivation_path`
    pub async fn get_public_key(
        &self,
        derivation_path: &[u32],
    ) -> Result<ResponsePublicKey, CardanoError<E::Error>> {
        let command = APDUCommand {
            cla: CLA,
            ins: InstructionCode::GetPublicKey as _,
            p1: 0x00,
            p2: 0x00,
            data: serialize_path(derivation_path)?,
        };

        log::debug!("GetPublicKey {:?}", derivation_path);

        let response = self
            .apdu_transport
            .exchange(&command)
            .await
            .map_err(LedgerAppError::TransportError)?;
        check_error_code::<_, E::Error>(&response)?;

        let response_data = response.data();
        if response_data.len() < ED25519_PUBKEY_LEN + CHAIN_CODE_LEN {
            return Err(CardanoError::Ledger(LedgerAppError::InvalidPK));
        }

        let mut public_key = [0; ED25519_PUBKEY_LEN];
        public_key.copy_from_slice(&response_data[..ED25519_PUBKEY_LEN]);

        let mut chain_code = [0; CHAIN_CODE_LEN];
        chain_code.copy_from_slice(
            &response_data[ED25519_PUBKEY_LEN..ED25519_PUBKEY_LEN + CHAIN_CODE_LEN],
        );

        Ok(ResponsePublicKey {
            public_key: VerifyingKey::from_bytes(&public_key)?,
            chain_code,
        })
    }

    /// Sign a transaction
    ///
    /// The header goes with the init chunk; inputs and outputs are streamed
    /// after it.
    pub async fn sign_tx(
        &self,
        request: &SigningRequest,
    ) -> Result<SigningResponse, CardanoError<E::Error>> {
        let header = serialize_tx_header(request)?;
        let body = serialize_tx_body(request)?;

        log::debug!(
            "SignTx with {} inputs and {} outputs (protocol magic {}, network id {})",
            request.inputs.len(),
            request.outputs.len(),
            request.protocol_magic,
            request.network_id
        );
        log::trace!("SignTx header {} bytes, body {} bytes", header.len(), body.len());

        let start_command = APDUCommand {
            cla: CLA,
            ins: InstructionCode::SignTx as _,
            p1: ChunkPayloadType::Init as u8,
            p2: 0x00,
            data: header,
        };

        let response =
            <Self as AppExt<E>>::send_chunks(&self.apdu_transport, start_command, &body).await?;
        check_error_code::<_, E::Error>(&response)?;

        let response_data = response.data();
        if response_data.is_empty() {
            return Err(CardanoError::Ledger(LedgerAppError::NoSignature));
        }
        // Last response should contain the answer
        if response_data.len() < TX_HASH_LEN {
            return Err(CardanoError::Ledger(LedgerAppError::InvalidSignature));
        }

        let mut tx_hash = [0; TX_HASH_LEN];
        tx_hash.copy_from_slice(&response_data[..TX_HASH_LEN]);

        Ok(SigningResponse {
            tx_hash,
            serialized_tx: response_data[TX_HASH_LEN..].to_vec(),
        })
    }
}
