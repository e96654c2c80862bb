//! Integration tests driving a real server over TCP.

use std::net::SocketAddr;
use std::time::Duration;

use room_chat::{serve, ConnectionListener, ServerConfig};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

/// How long to wait for a line that should arrive
const RECV_TIMEOUT: Duration = Duration::from_secs(2);

/// How long to wait before deciding a line will not arrive
const QUIET_TIMEOUT: Duration = Duration::from_millis(200);

/// Helper struct to manage a server task bound to an ephemeral port
struct TestServer {
    addr: SocketAddr,
    shutdown: CancellationToken,
}

impl TestServer {
    async fn start(room_max_count: usize, room_max_user: usize) -> Self {
        let shutdown = CancellationToken::new();
        let listener = ConnectionListener::bind("127.0.0.1:0", shutdown.clone())
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().unwrap();
        let config = ServerConfig {
            addr: addr.to_string(),
            room_max_count,
            room_max_user,
            ..ServerConfig::default()
        };
        tokio::spawn(serve(listener, config));
        TestServer { addr, shutdown }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// Helper struct for one client connection
struct TestClient {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl TestClient {
    async fn connect(server: &TestServer) -> Self {
        let stream = TcpStream::connect(server.addr)
            .await
            .expect("Failed to connect");
        let (read_half, writer) = stream.into_split();
        TestClient {
            reader: BufReader::new(read_half),
            writer,
        }
    }

    /// Connect and log in, returning the client and the welcome line
    async fn login(server: &TestServer, name: &str) -> (Self, String) {
        let mut client = Self::connect(server).await;
        client.send(&format!("1|{}", name)).await;
        let welcome = client.recv().await;
        (client, welcome)
    }

    async fn send(&mut self, frame: &str) {
        self.writer
            .write_all(format!("{}\n", frame).as_bytes())
            .await
            .expect("Failed to write");
    }

    async fn send_raw(&mut self, bytes: &[u8]) {
        self.writer.write_all(bytes).await.expect("Failed to write");
    }

    async fn chat(&mut self, body: &str) {
        self.send(&format!("2|{}", body)).await;
    }

    /// Next line, without its terminator; panics if none arrives
    async fn recv(&mut self) -> String {
        let mut line = String::new();
        let n = timeout(RECV_TIMEOUT, self.reader.read_line(&mut line))
            .await
            .expect("Timed out waiting for a line")
            .expect("Failed to read");
        assert!(n > 0, "Connection closed while waiting for a line");
        line.trim_end_matches(&['\r', '\n'][..]).to_string()
    }

    /// True if nothing arrives within the quiet window
    async fn is_quiet(&mut self) -> bool {
        let mut line = String::new();
        timeout(QUIET_TIMEOUT, self.reader.read_line(&mut line))
            .await
            .is_err()
    }

    /// True if the server closed the connection
    async fn is_closed(&mut self) -> bool {
        let mut line = String::new();
        matches!(
            timeout(RECV_TIMEOUT, self.reader.read_line(&mut line)).await,
            Ok(Ok(0)) | Ok(Err(_))
        )
    }
}

fn welcome(name: &str, room: usize) -> String {
    format!("[server] hello {}, your room number is {}", name, room)
}

#[tokio::test]
async fn test_logins_pack_rooms_in_order() {
    let server = TestServer::start(2, 2).await;

    let mut rooms = Vec::new();
    let mut clients = Vec::new();
    for name in ["A", "B", "C", "D"] {
        let (client, line) = TestClient::login(&server, name).await;
        rooms.push(line);
        clients.push(client);
    }

    assert_eq!(
        rooms,
        vec![welcome("A", 1), welcome("B", 1), welcome("C", 2), welcome("D", 2)]
    );
}

#[tokio::test]
async fn test_room_message_stays_in_room() {
    let server = TestServer::start(2, 2).await;
    let (mut a, _) = TestClient::login(&server, "A").await;
    let (mut b, _) = TestClient::login(&server, "B").await;
    let (mut c, _) = TestClient::login(&server, "C").await;
    let (mut d, _) = TestClient::login(&server, "D").await;

    a.chat("[R] hi").await;

    assert_eq!(a.recv().await, "[A] hi");
    assert_eq!(b.recv().await, "[A] hi");
    assert!(c.is_quiet().await);
    assert!(d.is_quiet().await);
}

#[tokio::test]
async fn test_global_message_reaches_everyone() {
    let server = TestServer::start(2, 2).await;
    let (mut a, _) = TestClient::login(&server, "A").await;
    let (mut b, _) = TestClient::login(&server, "B").await;
    let (mut c, _) = TestClient::login(&server, "C").await;

    c.chat("hello | everyone").await;

    for client in [&mut a, &mut b, &mut c] {
        assert_eq!(client.recv().await, "[C] hello | everyone");
    }
}

#[tokio::test]
async fn test_whisper_reaches_only_target() {
    let server = TestServer::start(2, 2).await;
    let (mut a, _) = TestClient::login(&server, "A").await;
    let (mut b, _) = TestClient::login(&server, "B").await;
    let (mut c, _) = TestClient::login(&server, "C").await;
    let (mut d, _) = TestClient::login(&server, "D").await;

    a.chat("[W] D secret").await;
    assert_eq!(d.recv().await, "[A] secret");

    a.chat("[W] D the whole plan").await;
    assert_eq!(d.recv().await, "[A] the whole plan");

    assert!(a.is_quiet().await);
    assert!(b.is_quiet().await);
    assert!(c.is_quiet().await);
}

#[tokio::test]
async fn test_whisper_to_unknown_target() {
    let server = TestServer::start(1, 2).await;
    let (mut a, _) = TestClient::login(&server, "A").await;
    let (mut b, _) = TestClient::login(&server, "B").await;

    a.chat("[W] Z anyone there").await;

    assert_eq!(a.recv().await, "[server] can't find target user 'Z'");
    assert!(b.is_quiet().await);

    // The sender stays connected
    a.chat("[R] still here").await;
    assert_eq!(b.recv().await, "[A] still here");
}

#[tokio::test]
async fn test_duplicate_name_rejected() {
    let server = TestServer::start(2, 2).await;
    let (mut a, _) = TestClient::login(&server, "A").await;

    let (mut imposter, line) = TestClient::login(&server, "A").await;
    assert_eq!(line, "[server] duplicate user: 'A' is already taken");
    assert!(imposter.is_closed().await);

    // The imposter took no slot: B still lands next to A
    let (_b, line) = TestClient::login(&server, "B").await;
    assert_eq!(line, welcome("B", 1));
    assert!(a.is_quiet().await);
}

#[tokio::test]
async fn test_no_capacity_when_rooms_full() {
    let server = TestServer::start(1, 2).await;
    let (_a, _) = TestClient::login(&server, "A").await;
    let (_b, _) = TestClient::login(&server, "B").await;

    let (mut c, line) = TestClient::login(&server, "C").await;
    assert_eq!(line, "[server] max user limit: all rooms are full");
    assert!(c.is_closed().await);
}

#[tokio::test]
async fn test_name_reusable_after_disconnect() {
    let server = TestServer::start(1, 2).await;
    let (a, _) = TestClient::login(&server, "A").await;
    let (mut b, _) = TestClient::login(&server, "B").await;

    drop(a);

    // Cleanup runs when the server notices the close; retry until it has
    let mut reused = None;
    for _ in 0..20 {
        let (client, line) = TestClient::login(&server, "A").await;
        if line == welcome("A", 1) {
            reused = Some(client);
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    let mut e = reused.expect("Name 'A' never became available");

    e.chat("back again").await;
    assert_eq!(b.recv().await, "[A] back again");
    assert_eq!(e.recv().await, "[A] back again");
}

#[tokio::test]
async fn test_malformed_frames_close_session() {
    let server = TestServer::start(1, 2).await;

    // Chat before login
    let mut early = TestClient::connect(&server).await;
    early.chat("hello").await;
    assert!(early.is_closed().await);

    // Unknown frame type after login
    let (mut a, _) = TestClient::login(&server, "A").await;
    a.send("9|what").await;
    assert!(a.is_closed().await);

    // Neither took a slot for good
    let (_b, line) = TestClient::login(&server, "B").await;
    assert!(line.starts_with("[server] hello B"));
}

#[tokio::test]
async fn test_empty_name_rejected() {
    let server = TestServer::start(1, 2).await;
    let (mut a, line) = TestClient::login(&server, "   ").await;
    assert_eq!(line, "[server] name must not be empty");
    assert!(a.is_closed().await);
}

#[tokio::test]
async fn test_concurrent_logins_respect_capacity() {
    let server = TestServer::start(4, 3).await;

    let mut tasks = Vec::new();
    for i in 0..12 {
        let addr = server.addr;
        tasks.push(tokio::spawn(async move {
            let stream = TcpStream::connect(addr).await.unwrap();
            let (read_half, mut writer) = stream.into_split();
            let mut reader = BufReader::new(read_half);
            writer
                .write_all(format!("1|user{}\n", i).as_bytes())
                .await
                .unwrap();
            let mut line = String::new();
            timeout(RECV_TIMEOUT, reader.read_line(&mut line))
                .await
                .unwrap()
                .unwrap();
            // Keep the connection open until the test collects results
            (line, reader, writer)
        }));
    }

    let mut per_room = [0usize; 4];
    let mut connections = Vec::new();
    for task in tasks {
        let (line, reader, writer) = task.await.unwrap();
        let room: usize = line
            .trim()
            .rsplit(' ')
            .next()
            .and_then(|n| n.parse().ok())
            .unwrap_or_else(|| panic!("Unexpected login reply: {:?}", line));
        per_room[room - 1] += 1;
        connections.push((reader, writer));
    }

    assert_eq!(per_room, [3, 3, 3, 3]);

    let (mut late, line) = TestClient::login(&server, "late").await;
    assert_eq!(line, "[server] max user limit: all rooms are full");
    assert!(late.is_closed().await);
}

#[tokio::test]
async fn test_per_sender_order_preserved() {
    let server = TestServer::start(1, 2).await;
    let (mut a, _) = TestClient::login(&server, "A").await;
    let (mut b, _) = TestClient::login(&server, "B").await;

    for i in 0..20 {
        a.chat(&format!("[R] message {}", i)).await;
    }
    for i in 0..20 {
        assert_eq!(b.recv().await, format!("[A] message {}", i));
    }
}

#[tokio::test]
async fn test_stalled_reader_does_not_block_others() {
    let server = TestServer::start(1, 3).await;
    let (_stalled, _) = TestClient::login(&server, "X").await;
    let (mut a, _) = TestClient::login(&server, "A").await;
    let (mut b, _) = TestClient::login(&server, "B").await;

    // Enough volume to fill X's socket buffers and outbox several times over
    let padding = "x".repeat(1000);
    for round in 0..40 {
        for i in 0..50 {
            a.chat(&format!("[R] {} {} {}", round, i, padding)).await;
        }
        for i in 0..50 {
            assert_eq!(
                b.recv().await,
                format!("[A] {} {} {}", round, i, padding)
            );
        }
    }
}

#[tokio::test]
async fn test_oversized_frame_closes_session() {
    let server = TestServer::start(1, 2).await;
    let (mut a, _) = TestClient::login(&server, "A").await;

    a.chat(&"y".repeat(10_000)).await;
    assert!(a.is_closed().await);

    // The slot and the name are free again
    let (_a2, line) = TestClient::login(&server, "A").await;
    assert_eq!(line, welcome("A", 1));
    let (_b, line) = TestClient::login(&server, "B").await;
    assert_eq!(line, welcome("B", 1));
}

#[tokio::test]
async fn test_invalid_utf8_closes_session() {
    let server = TestServer::start(1, 2).await;

    let mut broken = TestClient::connect(&server).await;
    broken.send_raw(b"1|\xff\xfe\n").await;
    assert!(broken.is_closed().await);

    let (_a, line) = TestClient::login(&server, "A").await;
    assert_eq!(line, welcome("A", 1));
    let (_b, line) = TestClient::login(&server, "B").await;
    assert_eq!(line, welcome("B", 1));
}
