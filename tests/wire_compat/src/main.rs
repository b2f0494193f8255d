fn main() {
    println!("Run `cargo test -p wire-compat` to execute wire compatibility tests.");
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use filehelper_protocol::{
        Envelope, decode, encode_ack, encode_chunk, encode_end_of_stream, encode_error,
    };
    use filehelper_transfer::{ChunkedTransfer, SIZE_LIMIT_MESSAGE, TransferConfig};
    use filehelper_transport::{LoopbackTransport, Transport};
    use serde::Deserialize;

    /// Returns the path to the fixtures directory.
    fn fixtures_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
    }

    /// Loads and parses a fixture JSON file.
    fn load_fixture<T: serde::de::DeserializeOwned>(name: &str) -> T {
        let path = fixtures_dir().join(name);
        let data = fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()));
        serde_json::from_str(&data)
            .unwrap_or_else(|e| panic!("failed to parse fixture {}: {e}", path.display()))
    }

    fn unhex(frame: &str) -> Vec<u8> {
        hex::decode(frame).unwrap_or_else(|e| panic!("bad hex in fixture {frame}: {e}"))
    }

    #[derive(Deserialize)]
    struct FrameFixture {
        name: String,
        frame: String,
    }

    #[derive(Deserialize)]
    struct StreamFixture {
        packet_size: usize,
        payload: String,
        sender: Vec<String>,
        receiver: Vec<String>,
    }

    /// The envelope and its encoding each named fixture must match.
    fn expected(name: &str) -> (Envelope, Vec<u8>) {
        let abc = "900150983cd24fb0d6963f7d28e17f72";
        let empty = "d41d8cd98f00b204e9800998ecf8427e";
        let (envelope, encoded) = match name {
            "ack" => (Envelope::Ack, encode_ack()),
            "chunk_abc" => (
                Envelope::Chunk(b"abc".to_vec()),
                encode_chunk(b"abc").unwrap(),
            ),
            "chunk_empty" => (Envelope::Chunk(Vec::new()), encode_chunk(b"").unwrap()),
            "end_of_stream_abc" => (
                Envelope::EndOfStream { digest: abc.into() },
                encode_end_of_stream(abc).unwrap(),
            ),
            "end_of_stream_empty" => (
                Envelope::EndOfStream {
                    digest: empty.into(),
                },
                encode_end_of_stream(empty).unwrap(),
            ),
            "error_size_limit" => (
                Envelope::Error {
                    message: SIZE_LIMIT_MESSAGE.into(),
                },
                encode_error(SIZE_LIMIT_MESSAGE).unwrap(),
            ),
            other => panic!("no expectation for fixture {other}"),
        };
        (envelope, encoded.to_vec())
    }

    // --- Envelope tests ---

    #[test]
    fn fixture_envelopes_decode() {
        let fixtures: Vec<FrameFixture> = load_fixture("envelopes.json");
        assert!(!fixtures.is_empty());
        for fixture in fixtures {
            let (envelope, _) = expected(&fixture.name);
            let decoded = decode(&unhex(&fixture.frame))
                .unwrap_or_else(|e| panic!("failed to decode {}: {e}", fixture.name));
            assert_eq!(decoded, envelope, "decode mismatch for {}", fixture.name);
        }
    }

    #[test]
    fn fixture_envelopes_encode() {
        let fixtures: Vec<FrameFixture> = load_fixture("envelopes.json");
        for fixture in fixtures {
            let (envelope, encoded) = expected(&fixture.name);
            let golden = unhex(&fixture.frame);
            assert_eq!(encoded, golden, "encode mismatch for {}", fixture.name);
            assert_eq!(
                envelope.encode().unwrap().to_vec(),
                golden,
                "method encode mismatch for {}",
                fixture.name
            );
        }
    }

    // --- Stream tests ---

    #[tokio::test]
    async fn fixture_abc_sender_frames() {
        let fixture: StreamFixture = load_fixture("abc_stream.json");
        let (mut a, mut peer) = LoopbackTransport::pair(8);
        let config = TransferConfig::default().with_packet_size(fixture.packet_size);

        let peer_side = async {
            let mut seen = Vec::new();
            for golden in &fixture.receiver {
                seen.push(hex::encode(peer.receive().await.unwrap()));
                peer.send(&unhex(golden)).await.unwrap();
            }
            seen.push(hex::encode(peer.receive().await.unwrap()));
            seen
        };
        let mut engine = ChunkedTransfer::with_config(&mut a, config);
        let (sent, seen) = tokio::join!(
            engine.string_to_network(fixture.payload.as_bytes()),
            peer_side
        );

        assert_eq!(sent.unwrap(), fixture.payload.len() as u64);
        assert_eq!(seen, fixture.sender);
    }

    #[tokio::test]
    async fn fixture_abc_receiver_frames() {
        let fixture: StreamFixture = load_fixture("abc_stream.json");
        let (mut a, mut peer) = LoopbackTransport::pair(8);
        let config = TransferConfig::default().with_packet_size(fixture.packet_size);

        let peer_side = async {
            let mut seen = Vec::new();
            for (i, golden) in fixture.sender.iter().enumerate() {
                peer.send(&unhex(golden)).await.unwrap();
                if i < fixture.receiver.len() {
                    seen.push(hex::encode(peer.receive().await.unwrap()));
                }
            }
            seen
        };
        let mut engine = ChunkedTransfer::with_config(&mut a, config);
        let (received, seen) = tokio::join!(engine.network_to_string(), peer_side);

        assert_eq!(received.unwrap(), fixture.payload.as_bytes());
        assert_eq!(seen, fixture.receiver);
    }
}
