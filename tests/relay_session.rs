//! End-to-end control-session tests against a mock FTP server over real TCP

use anyhow::Result;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio::time::timeout;

use ftp_proxy::types::{BufferSize, Peer, TransferMetrics};
use ftp_proxy::{
    BufferPool, ControlConnection, ControlError, ControlSession, RelayFlags, recv_resp, send_cmd,
};

const GUARD: Duration = Duration::from_secs(5);
const ROUND: Duration = Duration::from_millis(20);

fn test_pool() -> BufferPool {
    BufferPool::new(BufferSize::try_new(4096).unwrap(), 8)
}

/// Start a mock FTP server that greets, answers a few commands, and closes
/// after QUIT
async fn spawn_mock_ftp_server() -> Result<SocketAddr> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else {
                break;
            };
            tokio::spawn(async move {
                let _ = stream
                    .write_all(b"220-Mock FTP Server\r\n220 Ready\r\n")
                    .await;

                let mut buf = [0u8; 1024];
                loop {
                    match stream.read(&mut buf).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => {
                            let cmd = &buf[..n];
                            if cmd.starts_with(b"QUIT") {
                                let _ = stream.write_all(b"221 Goodbye\r\n").await;
                                break;
                            }
                            let reply: &[u8] = if cmd.starts_with(b"USER") {
                                b"331 Any password will do\r\n"
                            } else if cmd.starts_with(b"PASS") {
                                b"230 Logged in\r\n"
                            } else if cmd.starts_with(b"FEAT") {
                                b"211-Features:\r\n MDTM\r\n SIZE\r\n211 End\r\n"
                            } else {
                                b"502 Command not implemented\r\n"
                            };
                            if stream.write_all(reply).await.is_err() {
                                break;
                            }
                        }
                    }
                }
            });
        }
    });

    Ok(addr)
}

/// Accept one client, dial the backend, and run a session to completion
async fn start_proxy_session(
    backend_addr: SocketAddr,
    flags: RelayFlags,
) -> Result<(TcpStream, JoinHandle<Result<TransferMetrics, ControlError>>)> {
    let proxy_listener = TcpListener::bind("127.0.0.1:0").await?;
    let proxy_addr = proxy_listener.local_addr()?;

    let handle = tokio::spawn(async move {
        let (front, _) = proxy_listener.accept().await.expect("accept client");
        let back = TcpStream::connect(backend_addr)
            .await
            .expect("connect backend");

        let mut session = ControlSession::new(front, back, test_pool(), flags, ROUND);
        session.relay_greeting().await?;
        session.run().await
    });

    let client = TcpStream::connect(proxy_addr).await?;
    Ok((client, handle))
}

/// Read until the buffered data ends with CRLF (replies never split there)
async fn read_reply(client: &mut TcpStream) -> Result<String> {
    let mut data = Vec::new();
    let mut buf = [0u8; 1024];
    loop {
        let n = timeout(GUARD, client.read(&mut buf)).await??;
        if n == 0 {
            break;
        }
        data.extend_from_slice(&buf[..n]);
        if data.ends_with(b"\r\n") {
            break;
        }
    }
    Ok(String::from_utf8(data)?)
}

#[tokio::test]
async fn test_login_sequence_through_proxy() -> Result<()> {
    let backend_addr = spawn_mock_ftp_server().await?;
    let (mut client, handle) = start_proxy_session(backend_addr, RelayFlags::IGNORE_EOF).await?;

    let greeting = read_reply(&mut client).await?;
    assert_eq!(greeting, "220-Mock FTP Server\r\n220 Ready\r\n");

    client.write_all(b"USER anonymous\r\n").await?;
    assert_eq!(read_reply(&mut client).await?, "331 Any password will do\r\n");

    client.write_all(b"PASS guest\r\n").await?;
    assert_eq!(read_reply(&mut client).await?, "230 Logged in\r\n");

    client.write_all(b"QUIT\r\n").await?;
    assert_eq!(read_reply(&mut client).await?, "221 Goodbye\r\n");

    // Server closed after QUIT; once the client closes too the session
    // finishes cleanly under ignore_eof.
    drop(client);
    let metrics = timeout(GUARD, handle).await??.expect("clean session end");
    let (c2s, s2c) = metrics.as_tuple();
    assert!(c2s > 0, "client commands were relayed");
    assert!(s2c > 0, "server replies were relayed");

    Ok(())
}

#[tokio::test]
async fn test_multiline_reply_relayed_verbatim() -> Result<()> {
    let backend_addr = spawn_mock_ftp_server().await?;
    let (mut client, handle) = start_proxy_session(backend_addr, RelayFlags::IGNORE_EOF).await?;

    read_reply(&mut client).await?;

    client.write_all(b"FEAT\r\n").await?;
    let mut reply = String::new();
    while !reply.ends_with("211 End\r\n") {
        reply.push_str(&read_reply(&mut client).await?);
    }
    assert_eq!(reply, "211-Features:\r\n MDTM\r\n SIZE\r\n211 End\r\n");

    drop(client);
    handle.abort();
    Ok(())
}

#[tokio::test]
async fn test_unknown_command_forwarded_not_rejected() -> Result<()> {
    // The proxy does not interpret verbs; whatever the backend answers is
    // what the client sees.
    let backend_addr = spawn_mock_ftp_server().await?;
    let (mut client, handle) = start_proxy_session(backend_addr, RelayFlags::IGNORE_EOF).await?;

    read_reply(&mut client).await?;

    client.write_all(b"XPROPRIETARY arg1 arg2\r\n").await?;
    assert_eq!(
        read_reply(&mut client).await?,
        "502 Command not implemented\r\n"
    );

    drop(client);
    handle.abort();
    Ok(())
}

#[tokio::test]
async fn test_structured_exchange_against_real_server() -> Result<()> {
    let backend_addr = spawn_mock_ftp_server().await?;
    let stream = TcpStream::connect(backend_addr).await?;
    let mut conn = ControlConnection::new(stream, Peer::Backend);

    let (greeting, nlines) = timeout(GUARD, recv_resp(&mut conn, RelayFlags::NONE)).await??;
    assert_eq!(greeting.code().as_str(), "220");
    assert_eq!(greeting.message(), "Mock FTP Server\nReady");
    assert_eq!(nlines, 2);

    let cmd = ftp_proxy::FtpCommand::new("USER", ["anonymous"]).unwrap();
    send_cmd(&mut conn, &cmd).await?;

    let (resp, nlines) = timeout(GUARD, recv_resp(&mut conn, RelayFlags::NONE)).await??;
    assert_eq!(resp.code().as_str(), "331");
    assert_eq!(nlines, 1);

    Ok(())
}

#[tokio::test]
async fn test_backend_vanishing_mid_session_without_flag() -> Result<()> {
    // A backend that disappears under strict EOF policy surfaces as
    // EndOfInput naming the backend side.
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let backend_addr = listener.local_addr()?;
    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let _ = stream.write_all(b"220 Short-lived\r\n").await;
        // Connection drops here.
    });

    let (mut client, handle) = start_proxy_session(backend_addr, RelayFlags::NONE).await?;
    read_reply(&mut client).await?;

    let err = timeout(GUARD, handle).await??.unwrap_err();
    assert!(matches!(
        err,
        ControlError::EndOfInput {
            peer: Peer::Backend
        }
    ));

    Ok(())
}
