//! Integration tests for the WebSocket transport.
//!
//! These spin up a real listener on an OS-assigned port and talk to it
//! with a `tokio-tungstenite` client.

#[cfg(feature = "websocket")]
mod websocket {
    use std::time::Duration;

    use bingohall_transport::{
        Connection, Frame, PendingConnection, Transport, TransportError, WebSocketTransport,
    };
    use futures_util::{SinkExt, StreamExt};
    use tokio_tungstenite::tungstenite::Message;

    type ClientWs = tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    >;

    /// Binds on port 0, connects one client, and returns both ends.
    async fn connected_pair() -> (
        bingohall_transport::WebSocketConnection,
        ClientWs,
    ) {
        let mut transport = WebSocketTransport::bind("127.0.0.1:0")
            .await
            .expect("should bind");
        let addr = transport.local_addr().expect("should have addr");

        let server_handle = tokio::spawn(async move {
            let pending = transport.accept().await.expect("should accept");
            pending.upgrade().await.expect("should upgrade")
        });

        let (client_ws, _) =
            tokio_tungstenite::connect_async(format!("ws://{addr}"))
                .await
                .expect("client should connect");
        let server_conn = server_handle.await.expect("task should complete");
        (server_conn, client_ws)
    }

    #[tokio::test]
    async fn test_websocket_accept_and_send_receive() {
        let (server_conn, mut client_ws) = connected_pair().await;
        assert!(server_conn.id().into_inner() > 0);

        // --- Server sends JSON, client receives a text frame ---
        server_conn
            .send(br#"{"type":"pong"}"#)
            .await
            .expect("send should succeed");
        let msg = client_ws.next().await.unwrap().unwrap();
        assert!(msg.is_text());
        assert_eq!(msg.into_text().unwrap().as_str(), r#"{"type":"pong"}"#);

        // --- Client sends text, server receives data ---
        client_ws
            .send(Message::Text(r#"{"type":"ping"}"#.into()))
            .await
            .unwrap();
        let received = server_conn
            .recv()
            .await
            .expect("recv should succeed")
            .expect("should have data");
        assert_eq!(received, Frame::Data(br#"{"type":"ping"}"#.to_vec()));

        server_conn.close().await.expect("close should succeed");
    }

    #[tokio::test]
    async fn test_websocket_non_utf8_goes_out_as_binary() {
        let (server_conn, mut client_ws) = connected_pair().await;
        server_conn.send(&[0xff, 0x00, 0xfe]).await.unwrap();
        let msg = client_ws.next().await.unwrap().unwrap();
        assert!(msg.is_binary());
        assert_eq!(msg.into_data().as_ref(), &[0xff, 0x00, 0xfe]);
    }

    #[tokio::test]
    async fn test_websocket_ping_is_answered_with_pong() {
        let (server_conn, mut client_ws) = connected_pair().await;

        server_conn.ping().await.expect("ping should send");

        // The client only replies while it is being polled.
        let client = tokio::spawn(async move {
            let msg = client_ws.next().await.unwrap().unwrap();
            assert!(msg.is_ping());
            client_ws.flush().await.unwrap();
            client_ws
        });

        let frame = server_conn.recv().await.expect("recv").expect("frame");
        assert_eq!(frame, Frame::Pong);
        let _ = client.await;
    }

    #[tokio::test]
    async fn test_websocket_recv_returns_none_on_client_close() {
        let (server_conn, mut client_ws) = connected_pair().await;

        client_ws.send(Message::Close(None)).await.unwrap();

        let result = server_conn.recv().await.expect("recv should not error");
        assert!(result.is_none(), "should return None on client close");
    }

    #[tokio::test]
    async fn test_websocket_accept_returns_before_handshake() {
        let mut transport = WebSocketTransport::bind("127.0.0.1:0")
            .await
            .expect("should bind");
        let addr = transport.local_addr().expect("should have addr");

        // A raw TCP peer that never sends the upgrade request.
        let silent = tokio::net::TcpStream::connect(addr).await.unwrap();
        let stalled = tokio::time::timeout(Duration::from_secs(1), transport.accept())
            .await
            .expect("accept must not wait for the handshake")
            .expect("should accept");
        assert_eq!(stalled.peer_addr(), silent.local_addr().unwrap());

        // The listener is free for the next peer while the first one stalls.
        let client = tokio::spawn(async move {
            tokio_tungstenite::connect_async(format!("ws://{addr}"))
                .await
                .expect("client should connect")
        });
        let next = tokio::time::timeout(Duration::from_secs(1), transport.accept())
            .await
            .expect("second accept should not block")
            .expect("should accept");
        let conn = next.upgrade().await.expect("should upgrade");
        assert!(conn.id().into_inner() > 0);
        let _ = client.await;

        assert!(
            tokio::time::timeout(Duration::from_millis(100), stalled.upgrade())
                .await
                .is_err(),
            "silent peer should still be mid-handshake"
        );
        drop(silent);
    }

    #[tokio::test]
    async fn test_websocket_upgrade_rejects_non_websocket_peer() {
        use tokio::io::AsyncWriteExt;

        let mut transport = WebSocketTransport::bind("127.0.0.1:0")
            .await
            .expect("should bind");
        let addr = transport.local_addr().expect("should have addr");

        let mut peer = tokio::net::TcpStream::connect(addr).await.unwrap();
        peer.write_all(b"GET / HTTP/1.1\r\nHost: x\r\n\r\n").await.unwrap();

        let pending = transport.accept().await.expect("should accept");
        let result = pending.upgrade().await;
        assert!(matches!(result, Err(TransportError::Handshake(_))));
    }
}
