//! Integration tests for the TCP transport.
//!
//! These tests bind a real listener on an OS-assigned port and connect
//! a plain `TcpStream` client to it, so bytes really cross a socket.

#[cfg(feature = "tcp")]
mod tcp {
    use std::time::Duration;

    use nimd_transport::{Connection, TcpConnection, TcpTransport, Transport, TransportError};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    /// Binds on port 0 and returns the transport plus its real address.
    async fn bind_any() -> (TcpTransport, String) {
        let transport = TcpTransport::bind("127.0.0.1:0")
            .await
            .expect("should bind");
        let addr = transport.local_addr().expect("local addr").to_string();
        (transport, addr)
    }

    #[tokio::test]
    async fn test_tcp_accept_and_send_receive() {
        let (mut transport, addr) = bind_any().await;

        let server_handle = tokio::spawn(async move {
            transport.accept().await.expect("should accept")
        });

        let mut client = TcpStream::connect(&addr).await.expect("connect");
        let server_conn = server_handle.await.expect("task should complete");

        assert!(server_conn.id().into_inner() > 0);

        // --- Server sends, client receives ---
        server_conn
            .send(b"0|05|WAIT|")
            .await
            .expect("send should succeed");

        let mut buf = [0u8; 64];
        let n = client.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"0|05|WAIT|");

        // --- Client sends, server receives ---
        client.write_all(b"0|11|OPEN|Alice|").await.unwrap();

        let received = server_conn
            .recv()
            .await
            .expect("recv should succeed")
            .expect("should have data");
        assert_eq!(received, b"0|11|OPEN|Alice|");

        server_conn.close().await.expect("close should succeed");
    }

    #[tokio::test]
    async fn test_tcp_recv_returns_none_on_client_close() {
        let (mut transport, addr) = bind_any().await;

        let server_handle = tokio::spawn(async move {
            transport.accept().await.expect("should accept")
        });

        let client = TcpStream::connect(&addr).await.unwrap();
        let server_conn = server_handle.await.unwrap();

        drop(client);

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            server_conn.recv(),
        )
        .await
        .expect("recv should not hang");
        match result {
            Ok(None) => {}
            // A reset is also an acceptable way for a dropped peer to show up.
            Err(TransportError::ReceiveFailed(_)) => {}
            other => panic!("expected close, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_tcp_cancelled_recv_loses_no_bytes() {
        let (mut transport, addr) = bind_any().await;

        let server_handle = tokio::spawn(async move {
            transport.accept().await.expect("should accept")
        });

        let mut client = TcpStream::connect(&addr).await.unwrap();
        let server_conn = server_handle.await.unwrap();

        // A recv that times out is dropped mid-flight.
        let pending = tokio::time::timeout(
            Duration::from_millis(20),
            server_conn.recv(),
        )
        .await;
        assert!(pending.is_err(), "nothing was sent yet");

        client.write_all(b"0|05|WAIT|").await.unwrap();
        let received = server_conn.recv().await.unwrap().unwrap();
        assert_eq!(received, b"0|05|WAIT|");
    }

    #[tokio::test]
    async fn test_tcp_bind_failure_reports_address() {
        let (_transport, addr) = bind_any().await;

        // The port is already taken by the first listener.
        let err = match TcpTransport::bind(&addr).await {
            Ok(_) => panic!("second bind should fail"),
            Err(e) => e,
        };
        assert!(matches!(err, TransportError::BindFailed { .. }));
        assert!(err.to_string().contains(&addr));
    }

    #[tokio::test]
    async fn test_tcp_connect_pairs_with_accept() {
        let (mut transport, addr) = bind_any().await;

        let accept = tokio::spawn(async move { transport.accept().await.expect("accept") });
        let client = TcpConnection::connect(&addr).await.expect("connect");
        let server = accept.await.expect("task should complete");

        assert_ne!(client.id(), server.id());
        assert_eq!(client.peer_addr().to_string(), addr);

        client.send(b"0|05|WAIT|").await.unwrap();
        let received = tokio::time::timeout(Duration::from_secs(5), server.recv())
            .await
            .expect("recv timed out")
            .unwrap();
        assert_eq!(received.as_deref(), Some(&b"0|05|WAIT|"[..]));
    }

    #[tokio::test]
    async fn test_tcp_connect_failure_reports_address() {
        // Bind then drop, so nothing is listening on the port.
        let (transport, addr) = bind_any().await;
        drop(transport);

        let err = match TcpConnection::connect(&addr).await {
            Ok(_) => panic!("connect should fail"),
            Err(e) => e,
        };
        assert!(matches!(err, TransportError::ConnectFailed { .. }));
        assert!(err.to_string().contains(&addr));
    }
}
