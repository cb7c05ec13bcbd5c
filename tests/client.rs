//! End-to-end tests against a loopback WebSocket server.

use std::future::Future;
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{WebSocketStream, accept_async};
use tracing_subscriber::EnvFilter;
use wrac_client::{
    AuthOutcome, Client, ConnectionState, Error, Event, EventName, RegisterOutcome, RequestKind,
    ServerInfo,
};

// ============================================================================
// Helpers
// ============================================================================

const WAIT: Duration = Duration::from_secs(5);

type ServerSocket = WebSocketStream<TcpStream>;

/// Routes client logs to the test output when `RUST_LOG` is set.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Serves exactly one WebSocket connection with `handler`.
async fn serve<F, Fut>(handler: F) -> anyhow::Result<String>
where
    F: FnOnce(ServerSocket) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    init_tracing();

    let listener = TcpListener::bind(SocketAddr::from((Ipv4Addr::LOCALHOST, 0))).await?;
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.expect("accept");
        let ws = accept_async(stream).await.expect("handshake");
        handler(ws).await;
    });

    Ok(format!("ws://{addr}"))
}

/// Reads the next binary frame sent by the client.
async fn next_binary(ws: &mut ServerSocket) -> Vec<u8> {
    loop {
        match ws.next().await {
            Some(Ok(Message::Binary(data))) => return data.to_vec(),
            Some(Ok(_)) => continue,
            other => panic!("expected binary frame, got {other:?}"),
        }
    }
}

/// Keeps the socket open until the client closes it.
async fn drain(ws: &mut ServerSocket) {
    while let Some(Ok(_)) = ws.next().await {}
}

async fn reply(ws: &mut ServerSocket, bytes: &[u8]) {
    ws.send(Message::Binary(bytes.to_vec().into()))
        .await
        .expect("server send");
}

/// Forwards every event of `name` into a channel.
fn watch(client: &Client, name: EventName) -> mpsc::UnboundedReceiver<Event> {
    let (tx, rx) = mpsc::unbounded_channel();
    client.subscribe(name, move |event| {
        let _ = tx.send(event.clone());
    });
    rx
}

// ============================================================================
// Requests
// ============================================================================

#[tokio::test]
async fn test_get_message_size() -> anyhow::Result<()> {
    let url = serve(|mut ws| async move {
        assert_eq!(next_binary(&mut ws).await, vec![0x00]);
        reply(&mut ws, b"42").await;
        drain(&mut ws).await;
    })
    .await?;

    let client = Client::with_url(url)?;
    client.connect().await?;

    let size = timeout(WAIT, client.get_message_size()?).await??;
    assert_eq!(size, 42);
    assert!(!client.is_pending(RequestKind::GetSize));
    Ok(())
}

#[tokio::test]
async fn test_auth_message_outcomes() -> anyhow::Result<()> {
    let url = serve(|mut ws| async move {
        assert_eq!(next_binary(&mut ws).await, b"\x02ghost\npw\nhi".to_vec());
        reply(&mut ws, &[0x01]).await;
        assert_eq!(next_binary(&mut ws).await, b"\x02bob\nwrong\nhi".to_vec());
        reply(&mut ws, &[0x02]).await;
        drain(&mut ws).await;
    })
    .await?;

    let client = Client::with_url(url)?;
    client.connect().await?;

    let outcome = timeout(WAIT, client.send_auth_message("ghost", "pw", "hi")?).await??;
    assert_eq!(outcome, AuthOutcome::NoUser);

    let outcome = timeout(WAIT, client.send_auth_message("bob", "wrong", "hi")?).await??;
    assert_eq!(outcome, AuthOutcome::BadPass);
    Ok(())
}

#[tokio::test]
async fn test_register_username_taken() -> anyhow::Result<()> {
    let url = serve(|mut ws| async move {
        assert_eq!(next_binary(&mut ws).await, b"\x03bob\npw".to_vec());
        reply(&mut ws, &[0x01]).await;
        drain(&mut ws).await;
    })
    .await?;

    let client = Client::with_url(url)?;
    client.connect().await?;

    let outcome = timeout(WAIT, client.register("bob", "pw")?).await??;
    assert_eq!(outcome, RegisterOutcome::UsernameTaken);
    Ok(())
}

#[tokio::test]
async fn test_read_all_publishes_messages() -> anyhow::Result<()> {
    let url = serve(|mut ws| async move {
        assert_eq!(next_binary(&mut ws).await, vec![0x00, 0x01]);
        reply(&mut ws, b"a\nb\n\n").await;
        drain(&mut ws).await;
    })
    .await?;

    let client = Client::with_url(url)?;
    let mut messages = watch(&client, EventName::Messages);
    client.connect().await?;

    let history = timeout(WAIT, client.read_all_messages()?).await??;
    assert_eq!(history, vec!["a", "b"]);

    let event = timeout(WAIT, messages.recv()).await?;
    assert_eq!(event, Some(Event::Messages(vec!["a".into(), "b".into()])));
    assert_eq!(client.last_messages(), vec!["a", "b"]);
    Ok(())
}

#[tokio::test]
async fn test_read_chunked_sends_digits() -> anyhow::Result<()> {
    let url = serve(|mut ws| async move {
        assert_eq!(next_binary(&mut ws).await, b"\x00\x02512".to_vec());
        reply(&mut ws, b"<amy> new\n").await;
        drain(&mut ws).await;
    })
    .await?;

    let client = Client::with_url(url)?;
    client.connect().await?;

    let messages = timeout(WAIT, client.read_chunked_messages(512)?).await??;
    assert_eq!(messages, vec!["<amy> new"]);
    Ok(())
}

#[tokio::test]
async fn test_get_server_info() -> anyhow::Result<()> {
    let url = serve(|mut ws| async move {
        assert_eq!(next_binary(&mut ws).await, vec![0x69]);
        reply(&mut ws, b"\x07MyServer").await;
        drain(&mut ws).await;
    })
    .await?;

    let client = Client::with_url(url)?;
    client.connect().await?;

    let info = timeout(WAIT, client.get_server_info()?).await??;
    assert_eq!(info, ServerInfo::new(7, "MyServer"));
    Ok(())
}

#[tokio::test]
async fn test_send_message_is_fire_and_forget() -> anyhow::Result<()> {
    let (seen_tx, mut seen_rx) = mpsc::unbounded_channel();
    let url = serve(move |mut ws| async move {
        let _ = seen_tx.send(next_binary(&mut ws).await);
        drain(&mut ws).await;
    })
    .await?;

    let client = Client::with_url(url)?;
    client.connect().await?;

    client.send_message("hello")?;
    assert!(client.pending_kinds().is_empty());

    let frame = timeout(WAIT, seen_rx.recv()).await?;
    assert_eq!(frame, Some(b"\x01hello".to_vec()));
    Ok(())
}

// ============================================================================
// Pushes and Frame Handling
// ============================================================================

#[tokio::test]
async fn test_unsolicited_push_becomes_messages_event() -> anyhow::Result<()> {
    let (go_tx, mut go_rx) = mpsc::unbounded_channel::<()>();
    let url = serve(move |mut ws| async move {
        let _ = go_rx.recv().await;
        reply(&mut ws, b"<bob> hi\n<amy> hey\n").await;
        drain(&mut ws).await;
    })
    .await?;

    let client = Client::with_url(url)?;
    let mut messages = watch(&client, EventName::Messages);
    client.connect().await?;
    go_tx.send(())?;

    let event = timeout(WAIT, messages.recv()).await?;
    assert_eq!(
        event,
        Some(Event::Messages(vec!["<bob> hi".into(), "<amy> hey".into()]))
    );
    Ok(())
}

#[tokio::test]
async fn test_text_frames_are_ignored() -> anyhow::Result<()> {
    let url = serve(|mut ws| async move {
        assert_eq!(next_binary(&mut ws).await, vec![0x00]);
        ws.send(Message::Text("999".into())).await.expect("send text");
        reply(&mut ws, b"7\n").await;
        drain(&mut ws).await;
    })
    .await?;

    let client = Client::with_url(url)?;
    client.connect().await?;

    let size = timeout(WAIT, client.get_message_size()?).await??;
    assert_eq!(size, 7);
    Ok(())
}

#[tokio::test]
async fn test_second_request_of_same_kind_orphans_first() -> anyhow::Result<()> {
    let url = serve(|mut ws| async move {
        next_binary(&mut ws).await;
        next_binary(&mut ws).await;
        reply(&mut ws, b"42").await;
        drain(&mut ws).await;
    })
    .await?;

    let client = Client::with_url(url)?;
    client.connect().await?;

    let first = client.get_message_size()?;
    let second = client.get_message_size()?;

    assert_eq!(timeout(WAIT, second).await??, 42);
    let err = timeout(WAIT, first).await?.unwrap_err();
    assert!(matches!(err, Error::Orphaned { kind: RequestKind::GetSize }));
    Ok(())
}

// ============================================================================
// Lifecycle
// ============================================================================

#[tokio::test]
async fn test_open_and_close_events() -> anyhow::Result<()> {
    let url = serve(|mut ws| async move {
        drain(&mut ws).await;
    })
    .await?;

    let client = Client::with_url(url)?;
    let mut opens = watch(&client, EventName::Open);
    let mut closes = watch(&client, EventName::Close);

    client.connect().await?;
    assert_eq!(client.state(), ConnectionState::Open);
    assert_eq!(timeout(WAIT, opens.recv()).await?, Some(Event::Open));

    // Idempotent while open.
    client.connect().await?;
    assert!(opens.try_recv().is_err());

    client.disconnect();
    let event = timeout(WAIT, closes.recv()).await?;
    assert!(matches!(event, Some(Event::Close { .. })));
    assert_eq!(client.state(), ConnectionState::Disconnected);
    assert!(matches!(client.send_message("late"), Err(Error::NotConnected)));
    Ok(())
}

#[tokio::test]
async fn test_server_close_publishes_reason() -> anyhow::Result<()> {
    use tokio_tungstenite::tungstenite::protocol::CloseFrame;
    use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;

    let url = serve(|mut ws| async move {
        let _ = ws
            .close(Some(CloseFrame {
                code: CloseCode::Away,
                reason: "restarting".into(),
            }))
            .await;
        drain(&mut ws).await;
    })
    .await?;

    let client = Client::with_url(url)?;
    let mut closes = watch(&client, EventName::Close);
    client.connect().await?;

    let event = timeout(WAIT, closes.recv()).await?;
    assert_eq!(
        event,
        Some(Event::Close {
            reason: Some("restarting".into())
        })
    );
    Ok(())
}

#[tokio::test]
async fn test_disconnect_keeps_pending_requests() -> anyhow::Result<()> {
    let url = serve(|mut ws| async move {
        next_binary(&mut ws).await;
        drain(&mut ws).await;
    })
    .await?;

    let client = Client::with_url(url)?;
    let mut closes = watch(&client, EventName::Close);
    client.connect().await?;

    let pending = client.get_message_size()?;
    client.disconnect();
    timeout(WAIT, closes.recv()).await?;

    assert!(client.is_pending(RequestKind::GetSize));
    assert!(timeout(Duration::from_millis(100), pending).await.is_err());
    Ok(())
}

#[tokio::test]
async fn test_disconnect_during_connect_suppresses_open() -> anyhow::Result<()> {
    let listener = TcpListener::bind(SocketAddr::from((Ipv4Addr::LOCALHOST, 0))).await?;
    let url = format!("ws://{}", listener.local_addr()?);

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.expect("accept");
        tokio::time::sleep(Duration::from_millis(200)).await;
        if let Ok(mut ws) = accept_async(stream).await {
            drain(&mut ws).await;
        }
    });

    let client = Client::with_url(url)?;
    let mut opens = watch(&client, EventName::Open);

    let connecting = {
        let client = client.clone();
        tokio::spawn(async move { client.connect().await })
    };

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(client.state(), ConnectionState::Connecting);
    client.disconnect();
    assert_eq!(client.state(), ConnectionState::Disconnected);

    let result = timeout(WAIT, connecting).await??;
    assert!(matches!(result, Err(Error::ConnectAborted)));
    assert!(opens.try_recv().is_err());
    assert_eq!(client.state(), ConnectionState::Disconnected);
    Ok(())
}

#[tokio::test]
async fn test_reconnect_after_disconnect() -> anyhow::Result<()> {
    let listener = TcpListener::bind(SocketAddr::from((Ipv4Addr::LOCALHOST, 0))).await?;
    let url = format!("ws://{}", listener.local_addr()?);

    tokio::spawn(async move {
        for _ in 0..2 {
            let (stream, _) = listener.accept().await.expect("accept");
            let mut ws = accept_async(stream).await.expect("handshake");
            if let Some(Ok(Message::Binary(_))) = ws.next().await {
                reply(&mut ws, b"5\n").await;
            }
            drain(&mut ws).await;
        }
    });

    let client = Client::with_url(url)?;
    let mut closes = watch(&client, EventName::Close);

    client.connect().await?;
    client.disconnect();
    timeout(WAIT, closes.recv()).await?;

    client.connect().await?;
    let size = timeout(WAIT, client.get_message_size()?).await??;
    assert_eq!(size, 5);
    Ok(())
}
