//! Tests for messages, signed messages and wire encoding

use quorumsig_crypto::{BlsPrivateKey, BlsScheme, MessageSigner, SignatureScheme};
use quorumsig_types::{
    CanonicalValidatorSet, ChainId, Error, NodeId, SignatureRequest, SignatureResponse,
    SignedMessage, SignerBitSet, UnsignedMessage, Validator,
};

fn message() -> UnsignedMessage {
    UnsignedMessage::new(5, ChainId::new([7u8; 32]), b"hello".to_vec())
}

fn validators(n: usize) -> (Vec<BlsPrivateKey>, CanonicalValidatorSet) {
    let keys: Vec<_> = (0..n).map(|_| BlsPrivateKey::random()).collect();
    let entries = keys
        .iter()
        .enumerate()
        .map(|(i, k)| Validator::new(k.public_key(), 10, NodeId::new([i as u8; 20])))
        .collect();
    let set = CanonicalValidatorSet::new(entries).unwrap();

    // Reorder keys to canonical order
    let mut keys = keys;
    keys.sort_by_key(|k| k.public_key().to_bytes());
    (keys, set)
}

fn sign_with(keys: &[BlsPrivateKey], signers: &[usize], message: &UnsignedMessage) -> SignedMessage {
    let bytes = message.bytes();
    let shares: Vec<_> = signers.iter().map(|i| keys[*i].sign_bytes(&bytes)).collect();
    let signature = BlsScheme.aggregate_signatures(&shares).unwrap();
    SignedMessage::new(
        message.clone(),
        signers.iter().copied().collect(),
        signature,
    )
}

#[test]
fn test_message_encoding() {
    let msg = message();
    let bytes = msg.bytes();
    assert_eq!(&bytes[..4], &5u32.to_be_bytes());
    assert_eq!(&bytes[4..36], &[7u8; 32]);
    assert_eq!(&bytes[36..40], &5u32.to_be_bytes());
    assert_eq!(&bytes[40..], b"hello");
}

#[test]
fn test_message_id_depends_on_content() {
    let a = message();
    let mut b = message();
    b.payload.push(0);
    let mut c = message();
    c.network_id = 6;

    assert_eq!(a.id(), message().id());
    assert_ne!(a.id(), b.id());
    assert_ne!(a.id(), c.id());
}

#[test]
fn test_signed_message_verifies() {
    let (keys, set) = validators(5);
    let signed = sign_with(&keys, &[0, 1, 2, 4], &message());

    assert_eq!(signed.signed_weight(&set).unwrap(), 40);
    assert!(signed.verify(&set, 67, &BlsScheme).is_ok());
    assert!(signed.verify(&set, 80, &BlsScheme).is_ok());
}

#[test]
fn test_signed_message_insufficient_weight() {
    let (keys, set) = validators(5);
    let signed = sign_with(&keys, &[0, 1, 2], &message());

    let result = signed.verify(&set, 67, &BlsScheme);
    assert!(matches!(
        result,
        Err(Error::InsufficientWeight {
            signed: 30,
            required: 34
        })
    ));
}

#[test]
fn test_signed_message_wrong_bitset() {
    let (keys, set) = validators(4);
    let mut signed = sign_with(&keys, &[0, 1, 2], &message());
    signed.signers = [0, 1, 3].into_iter().collect();

    assert!(matches!(
        signed.verify(&set, 67, &BlsScheme),
        Err(Error::InvalidAggregate)
    ));
}

#[test]
fn test_signed_message_signer_out_of_range() {
    let (keys, set) = validators(3);
    let mut signed = sign_with(&keys, &[0, 1, 2], &message());
    signed.signers.add(8);

    assert!(matches!(
        signed.verify(&set, 67, &BlsScheme),
        Err(Error::SignerOutOfRange { index: 8, len: 3 })
    ));
}

#[test]
fn test_signed_message_empty_signers_rejected() {
    let (keys, set) = validators(1);
    let mut signed = sign_with(&keys, &[0], &message());
    signed.signers = SignerBitSet::new();

    assert!(signed.verify(&set, 0, &BlsScheme).is_err());
}

#[test]
fn test_signed_message_serde() {
    let (keys, _) = validators(3);
    let signed = sign_with(&keys, &[0, 2], &message());

    let json = serde_json::to_string(&signed).unwrap();
    let decoded: SignedMessage = serde_json::from_str(&json).unwrap();
    assert_eq!(signed, decoded);
}

#[test]
fn test_request_wire() {
    let request = SignatureRequest::new(message(), vec![1, 2, 3]);
    let decoded = SignatureRequest::decode(&request.encode().unwrap()).unwrap();
    assert_eq!(request, decoded);

    // Justification is optional on the wire
    let json = serde_json::json!({
        "message": {
            "network_id": 5,
            "source_chain_id": ChainId::new([7u8; 32]).to_hex(),
            "payload": "0x68656c6c6f"
        }
    });
    let decoded = SignatureRequest::decode(json.to_string().as_bytes()).unwrap();
    assert_eq!(decoded.message, message());
    assert!(decoded.justification.is_empty());
}

#[test]
fn test_response_share() {
    let key = BlsPrivateKey::random();
    let share = key.sign_bytes(b"m");

    let signed = SignatureResponse::decode(&SignatureResponse::signed(share).encode().unwrap()).unwrap();
    assert_eq!(signed.share().unwrap(), Some(share));

    let declined = SignatureResponse::decode(&SignatureResponse::declined().encode().unwrap()).unwrap();
    assert_eq!(declined.share().unwrap(), None);

    let truncated = SignatureResponse {
        signature: vec![1u8; 40],
    };
    assert!(matches!(
        truncated.share(),
        Err(Error::InvalidLength {
            expected: 96,
            actual: 40
        })
    ));
}

#[test]
fn test_response_garbage_rejected() {
    assert!(SignatureResponse::decode(b"not json").is_err());
    assert!(SignatureResponse::decode(br#"{"signature":"0xzz"}"#).is_err());
}
