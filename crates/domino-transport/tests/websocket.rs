//! Integration tests for the WebSocket transport.
//!
//! Each test binds a real listener on an OS-assigned port and talks to it
//! with a plain tokio-tungstenite client.

#[cfg(feature = "websocket")]
mod websocket {
    use std::sync::Arc;
    use std::time::Duration;

    use domino_transport::{Connection, Transport, WebSocketConnection, WebSocketTransport};
    use futures_util::{SinkExt, StreamExt};
    use tokio_tungstenite::tungstenite::Message;

    type ClientWs =
        tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

    /// Binds on port 0, connects one client, and returns both ends.
    async fn pair() -> (WebSocketConnection, ClientWs) {
        let mut transport = WebSocketTransport::bind("127.0.0.1:0")
            .await
            .expect("should bind");
        let addr = transport.local_addr().expect("should have an address");

        let server = tokio::spawn(async move { transport.accept().await.expect("should accept") });
        let (client, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
            .await
            .expect("client should connect");
        (server.await.expect("task should complete"), client)
    }

    #[tokio::test]
    async fn test_json_is_sent_as_text_frame() {
        let (server_conn, mut client) = pair().await;
        assert!(server_conn.id().into_inner() > 0);

        server_conn.send(br#"{"type":"pong"}"#).await.unwrap();

        let msg = client.next().await.unwrap().unwrap();
        assert!(msg.is_text(), "JSON should arrive as a text frame");
        assert_eq!(msg.into_text().unwrap().as_str(), r#"{"type":"pong"}"#);
    }

    #[tokio::test]
    async fn test_text_and_binary_frames_are_received() {
        let (server_conn, mut client) = pair().await;

        client.send(Message::Text("hello".into())).await.unwrap();
        client
            .send(Message::Binary(b"bytes".to_vec().into()))
            .await
            .unwrap();

        assert_eq!(server_conn.recv().await.unwrap().unwrap(), b"hello");
        assert_eq!(server_conn.recv().await.unwrap().unwrap(), b"bytes");
    }

    #[tokio::test]
    async fn test_send_is_not_blocked_by_pending_recv() {
        let (server_conn, mut client) = pair().await;
        let server_conn = Arc::new(server_conn);

        let reader = {
            let conn = Arc::clone(&server_conn);
            tokio::spawn(async move { conn.recv().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        tokio::time::timeout(Duration::from_secs(1), server_conn.send(b"while reading"))
            .await
            .expect("send should not wait for recv")
            .unwrap();
        let msg = client.next().await.unwrap().unwrap();
        assert_eq!(msg.into_data().as_ref(), b"while reading");

        client.send(Message::Text("done".into())).await.unwrap();
        assert_eq!(reader.await.unwrap().unwrap().unwrap(), b"done");
    }

    #[tokio::test]
    async fn test_recv_returns_none_on_client_close() {
        let (server_conn, mut client) = pair().await;

        client.send(Message::Close(None)).await.unwrap();

        let result = server_conn.recv().await.expect("recv should not error");
        assert!(result.is_none(), "should return None on client close");
    }

    #[tokio::test]
    async fn test_peer_addr_is_loopback() {
        let (server_conn, _client) = pair().await;
        assert!(server_conn.peer_addr().ip().is_loopback());
    }

    #[tokio::test]
    async fn test_ping_frames_reset_idle_time() {
        let (server_conn, mut client) = pair().await;
        let server_conn = Arc::new(server_conn);

        // A reader has to be pulling frames for any of them to count.
        let reader = {
            let conn = Arc::clone(&server_conn);
            tokio::spawn(async move { conn.recv().await })
        };

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(server_conn.idle_for() >= Duration::from_millis(150));

        client.send(Message::Ping(b"alive".to_vec().into())).await.unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(
            server_conn.idle_for() < Duration::from_millis(150),
            "a ping should count as activity"
        );
        assert!(!reader.is_finished(), "control frames are not returned by recv");

        client.send(Message::Text("done".into())).await.unwrap();
        assert_eq!(reader.await.unwrap().unwrap().unwrap(), b"done");
    }
}
