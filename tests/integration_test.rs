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
// Integration tests

#![deny(trivial_casts, trivial_numeric_casts)]
#![deny(unused_import_braces, unused_qualifications)]

extern crate ledger_cardano_rs;

use std::collections::VecDeque;
use std::ops::Deref;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ed25519_dalek::SigningKey;
use ledger_cardano_rs::{
    build_address_parameters, build_request, parse_path, AddressType, BuildError, CardanoApp,
    CardanoError, InstructionCode, LedgerAppError, Network, RawRecord, TxOutput, CLA,
};
use ledger_transport::{APDUAnswer, APDUCommand, Exchange};
use ledger_zondax_generic::ChunkPayloadType;
use once_cell::sync::Lazy;
use serde_json::{json, Value};

static TX_DOCUMENT: Lazy<RawRecord> = Lazy::new(|| {
    let document = json!({
        "inputs": [
            {
                "path": "m/1852'/1815'/0'/0/0",
                "prev_hash": "1af8fa0b754ff99253d983894e63a2b09cbb56c833ba18c3384210163f63dcfc",
                "prev_index": 0,
            },
        ],
        "outputs": [
            {
                "address": "addr1q84sh2j72ux0l03fxndjnhctdg7hcppsaejafsa84vh7lwgmcs5wgus8qt4atk45lvt4xfxpjtwfhdmvchdf2m3u3hlsd5tq5r",
                "amount": "3003112",
            },
            {
                "addressType": 1,
                "path": "m/1852'/1815'/0'/1/0",
                "stakingPath": "m/1852'/1815'/0'/2/0",
                "amount": "7120787",
            },
        ],
        "fee": 42,
        "ttl": 10,
    });
    match document {
        Value::Object(map) => map,
        _ => panic!("fixture is not an object"),
    }
});

#[derive(Debug, thiserror::Error)]
#[error("mock transport: {0}")]
struct MockError(&'static str);

#[derive(Debug, Clone)]
struct SentCommand {
    cla: u8,
    ins: u8,
    p1: u8,
    p2: u8,
    data: Vec<u8>,
}

type SentLog = Arc<Mutex<Vec<SentCommand>>>;

/// Replays canned answers (data + status word) and records every command
#[derive(Default)]
struct MockTransport {
    answers: Mutex<VecDeque<Vec<u8>>>,
    sent: SentLog,
}

impl MockTransport {
    fn with_answers(answers: Vec<Vec<u8>>) -> Self {
        MockTransport {
            answers: Mutex::new(answers.into_iter().collect()),
            sent: SentLog::default(),
        }
    }

    fn sent_log(&self) -> SentLog {
        Arc::clone(&self.sent)
    }
}

fn sent_commands(log: &SentLog) -> Vec<SentCommand> {
    log.lock().unwrap().clone()
}

#[async_trait]
impl Exchange for MockTransport {
    type Error = MockError;
    type AnswerType = Vec<u8>;

    async fn exchange<I>(
        &self,
        command: &APDUCommand<I>,
    ) -> Result<APDUAnswer<Self::AnswerType>, Self::Error>
    where
        I: Deref<Target = [u8]> + Send + Sync,
    {
        self.sent.lock().unwrap().push(SentCommand {
            cla: command.cla,
            ins: command.ins,
            p1: command.p1,
            p2: command.p2,
            data: command.data.to_vec(),
        });

        let answer = self
            .answers
            .lock()
            .unwrap()
            .pop_front()
            .ok_or(MockError("device disconnected"))?;
        APDUAnswer::from_answer(answer).map_err(|_| MockError("malformed answer"))
    }
}

fn ok(data: &[u8]) -> Vec<u8> {
    let mut answer = data.to_vec();
    answer.extend_from_slice(&[0x90, 0x00]);
    answer
}

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[tokio::test]
async fn version() {
    init_logger();
    let app = CardanoApp::new(MockTransport::with_answers(vec![ok(&[0, 2, 1, 5])]));

    let version = app.version().await.unwrap();

    assert_eq!(version.major, 2);
    assert_eq!(version.minor, 1);
    assert_eq!(version.patch, 5);
}

#[tokio::test]
async fn address() {
    init_logger();
    let expected_address = "addr1qxck2fsuq0rvmyuwr5pz0kqm3xse0kum5rmmq2qpd6ymq7uc4wxn2";
    let transport = MockTransport::with_answers(vec![
        ok(expected_address.as_bytes()),
        ok(expected_address.as_bytes()),
    ]);
    let log = transport.sent_log();
    let app = CardanoApp::new(transport);

    let params = build_address_parameters(
        AddressType::Base as i128,
        parse_path("m/1852'/1815'/0'/0/0").unwrap(),
        Some(parse_path("m/1852'/1815'/0'/2/0").unwrap()),
        None,
        None,
        None,
        None,
    )
    .unwrap();

    let show_on_screen = true;
    let response = app
        .get_address(
            &params,
            Network::Mainnet.protocol_magic(),
            Network::Mainnet.network_id(),
            show_on_screen,
        )
        .await
        .unwrap();

    assert_eq!(response.address, expected_address);

    let response = app
        .get_address(
            &params,
            Network::Mainnet.protocol_magic(),
            Network::Mainnet.network_id(),
            !show_on_screen,
        )
        .await
        .unwrap();
    assert_eq!(response.address, expected_address);

    let sent = sent_commands(&log);
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].cla, CLA);
    assert_eq!(sent[0].ins, InstructionCode::GetAddress as u8);
    assert_eq!(sent[0].p1, 1);
    assert_eq!(sent[0].p2, 0);
    assert_eq!(
        hex::encode(&sent[0].data),
        concat!(
            "094a962d",
            "01",
            "01",
            "05",
            "3c070080",
            "17070080",
            "00000080",
            "00000000",
            "00000000",
            "01",
            "05",
            "3c070080",
            "17070080",
            "00000080",
            "02000000",
            "00000000",
            "00",
            "00",
        )
    );

    // same payload, silent derivation
    assert_eq!(sent[1].ins, InstructionCode::GetAddress as u8);
    assert_eq!(sent[1].p1, 0);
    assert_eq!(sent[1].data, sent[0].data);
}

#[tokio::test]
async fn public_key() {
    init_logger();
    let signing_key = SigningKey::from_bytes(&[7u8; 32]);
    let verifying_key = signing_key.verifying_key();

    let mut data = verifying_key.to_bytes().to_vec();
    data.extend_from_slice(&[0x11; 32]);
    let transport = MockTransport::with_answers(vec![ok(&data)]);
    let log = transport.sent_log();
    let app = CardanoApp::new(transport);

    let path = parse_path("m/1852'/1815'/0'").unwrap();
    let response = app.get_public_key(&path).await.unwrap();

    assert_eq!(response.public_key, verifying_key);
    assert_eq!(response.chain_code, [0x11; 32]);

    let sent = sent_commands(&log);
    assert_eq!(sent[0].ins, InstructionCode::GetPublicKey as u8);
    assert_eq!(hex::encode(&sent[0].data), "033c0700801707008000000080");
}

#[tokio::test]
async fn public_key_short_answer() {
    let app = CardanoApp::new(MockTransport::with_answers(vec![ok(&[0xab; 40])]));

    let result = app.get_public_key(&[0x8000_0000]).await;
    assert!(matches!(
        result,
        Err(CardanoError::Ledger(LedgerAppError::InvalidPK))
    ));
}

#[tokio::test]
async fn sign_tx() {
    init_logger();
    let request = build_request(&TX_DOCUMENT, Network::Mainnet).unwrap();
    assert!(matches!(request.outputs[1], TxOutput::Change { .. }));

    let tx_hash = [0x5a; 32];
    let mut signed = tx_hash.to_vec();
    signed.extend_from_slice(&[0x83, 0xa4, 0x00, 0x81]);

    let transport = MockTransport::with_answers(vec![ok(&[]), ok(&signed)]);
    let log = transport.sent_log();
    let app = CardanoApp::new(transport);

    let response = app.sign_tx(&request).await.unwrap();
    assert_eq!(response.tx_hash, tx_hash);
    assert_eq!(response.serialized_tx, vec![0x83, 0xa4, 0x00, 0x81]);

    let sent = sent_commands(&log);
    assert_eq!(sent.len(), 2);
    assert!(sent.iter().all(|c| c.ins == InstructionCode::SignTx as u8));
    assert_eq!(sent[0].p1, ChunkPayloadType::Init as u8);
    assert_eq!(sent[1].p1, ChunkPayloadType::Last as u8);

    // header: protocol magic, network id, fee, ttl, 1 input, 2 outputs
    assert_eq!(
        hex::encode(&sent[0].data),
        concat!(
            "094a962d",
            "01",
            "2a00000000000000",
            "0a00000000000000",
            "0100",
            "0200",
        )
    );
}

#[tokio::test]
async fn sign_tx_in_chunks() {
    let mut document = (*TX_DOCUMENT).clone();
    document.insert(
        "outputs".to_string(),
        json!([{ "address": "a".repeat(600), "amount": 1 }]),
    );
    let request = build_request(&document, Network::Testnet).unwrap();

    let mut signed = vec![0x01; 32];
    signed.push(0xff);
    let transport = MockTransport::with_answers(vec![
        ok(&[]),
        ok(&[]),
        ok(&[]),
        ok(&signed),
    ]);
    let log = transport.sent_log();
    let app = CardanoApp::new(transport);

    let response = app.sign_tx(&request).await.unwrap();
    assert_eq!(response.tx_hash, [0x01; 32]);
    assert_eq!(response.serialized_tx, vec![0xff]);

    let sent = sent_commands(&log);
    let p1: Vec<u8> = sent.iter().map(|c| c.p1).collect();
    assert_eq!(
        p1,
        vec![
            ChunkPayloadType::Init as u8,
            ChunkPayloadType::Add as u8,
            ChunkPayloadType::Add as u8,
            ChunkPayloadType::Last as u8,
        ]
    );
}

#[tokio::test]
async fn sign_tx_rejected_on_device() {
    let request = build_request(&TX_DOCUMENT, Network::Mainnet).unwrap();
    let transport = MockTransport::with_answers(vec![ok(&[]), vec![0x69, 0x86]]);
    let app = CardanoApp::new(transport);

    let result = app.sign_tx(&request).await;
    assert!(matches!(result, Err(CardanoError::Ledger(_))));
}

#[tokio::test]
async fn address_rejected_on_device() {
    let app = CardanoApp::new(MockTransport::with_answers(vec![vec![0x69, 0x86]]));
    let params = build_address_parameters(
        AddressType::Enterprise as i128,
        parse_path("m/1852'/1815'/0'/0/0").unwrap(),
        None,
        None,
        None,
        None,
        None,
    )
    .unwrap();

    let result = app.get_address(&params, 42, 0, true).await;
    assert!(matches!(
        result,
        Err(CardanoError::Ledger(LedgerAppError::AppSpecific(0x6986, _)))
    ));
}

#[tokio::test]
async fn sign_tx_without_answer() {
    let request = build_request(&TX_DOCUMENT, Network::Mainnet).unwrap();
    let app = CardanoApp::new(MockTransport::with_answers(vec![ok(&[]), ok(&[])]));

    let result = app.sign_tx(&request).await;
    assert!(matches!(
        result,
        Err(CardanoError::Ledger(LedgerAppError::NoSignature))
    ));
}

#[tokio::test]
async fn transport_failure_surfaces() {
    let app = CardanoApp::new(MockTransport::default());

    let result = app.get_public_key(&[0x8000_0000]).await;
    assert!(matches!(
        result,
        Err(CardanoError::Ledger(LedgerAppError::TransportError(_)))
    ));
}

#[test]
fn invalid_document_never_reaches_device() {
    let mut document = (*TX_DOCUMENT).clone();
    document.insert(
        "outputs".to_string(),
        json!([{
            "addressType": 2,
            "path": "m/1852'/1815'/0'/0/0",
            "amount": 1,
            "blockIndex": 1,
            "txIndex": 2,
        }]),
    );

    assert_eq!(
        build_request(&document, Network::Mainnet),
        Err(BuildError::IncompletePointer)
    );
}
