//! Envelope stability integration tests.
//!
//! Tests verify:
//! - Exact round-trips through the public encode/decode API
//! - Byte-level stability of the wire format
//! - Strict rejection of malformed envelopes
//! - Cache round-trips through a real store

use scancache::{
    decode, encode, CodecError, Detection, GeometryQuad, MemoryStore, MessageId, RecognitionCache,
    WordBox, ENVELOPE_VERSION,
};

use super::test_utils::sample_quad;

fn rich_text_detection() -> Detection {
    Detection::Text {
        text: "Zürich Hbf → Gleis 4".to_string(),
        words: vec![
            WordBox {
                start: 0,
                end: 6,
                quad: sample_quad(0.1),
            },
            WordBox {
                start: 7,
                end: 10,
                quad: sample_quad(0.3),
            },
            WordBox {
                start: 13,
                end: 18,
                quad: sample_quad(0.5),
            },
        ],
        quad: sample_quad(0.0),
    }
}

#[test]
fn test_round_trip_through_public_api() {
    let original = vec![
        Detection::Code {
            payload: "WIFI:S:guest;P:secret;;".to_string(),
            quad: sample_quad(0.2),
        },
        rich_text_detection(),
    ];

    let decoded = decode(&encode(&original)).unwrap();
    assert_eq!(decoded, original);
}

#[test]
fn test_wire_format_is_byte_stable() {
    // The persisted representation must never drift: readers of existing
    // stores depend on these exact bytes.
    let detection = Detection::Code {
        payload: "hi".to_string(),
        quad: GeometryQuad::default(),
    };
    let encoded = encode(&[detection]);

    // version, count=1 (u32 LE), disc=1, strlen=2 (u32 LE), "hi", 8 zero f64s
    assert_eq!(encoded.len(), 1 + 4 + 1 + 4 + 2 + 64);
    assert_eq!(encoded[0], ENVELOPE_VERSION);
    assert_eq!(&encoded[1..5], &[1, 0, 0, 0]);
    assert_eq!(encoded[5], 1);
    assert_eq!(&encoded[6..10], &[2, 0, 0, 0]);
    assert_eq!(&encoded[10..12], b"hi");
    assert!(encoded[12..].iter().all(|&b| b == 0));
}

#[test]
fn test_decode_rejects_future_version() {
    let mut bytes = encode(&[]).to_vec();
    bytes[0] = ENVELOPE_VERSION + 1;
    assert_eq!(
        decode(&bytes),
        Err(CodecError::UnsupportedVersion(ENVELOPE_VERSION + 1))
    );
}

#[test]
fn test_decode_rejects_corrupt_word_offsets() {
    // Corrupt a valid envelope so the first word's start exceeds its end.
    let original = vec![rich_text_detection()];
    let mut bytes = encode(&original).to_vec();

    // Locate the first word record: version(1) + count(4) + disc(1) +
    // strlen(4) + text bytes + word_count(4), then start:u32.
    let text_len = "Zürich Hbf → Gleis 4".len();
    let start_offset = 1 + 4 + 1 + 4 + text_len + 4;
    bytes[start_offset..start_offset + 4].copy_from_slice(&99u32.to_le_bytes());

    assert!(matches!(
        decode(&bytes),
        Err(CodecError::InvalidWordRange { start: 99, .. })
    ));
}

#[tokio::test]
async fn test_envelope_survives_store_round_trip() {
    let cache = RecognitionCache::new(MemoryStore::new());
    let id = MessageId::new(500, 77);
    let original = vec![
        rich_text_detection(),
        Detection::Code {
            payload: "tel:+41000000000".to_string(),
            quad: sample_quad(0.7),
        },
    ];

    cache.put(id, Some(&original)).await.unwrap();
    let read_back = cache.get(id).await.unwrap();

    assert_eq!(read_back, Some(original));
}

#[tokio::test]
async fn test_keys_do_not_collide_across_messages() {
    let cache = RecognitionCache::new(MemoryStore::new());
    let first = MessageId::new(1, 2);
    let second = MessageId::new(2, 1);

    cache
        .put(
            first,
            Some(&[Detection::Code {
                payload: "first".into(),
                quad: GeometryQuad::default(),
            }]),
        )
        .await
        .unwrap();

    assert_eq!(cache.get(second).await.unwrap(), None);
}
