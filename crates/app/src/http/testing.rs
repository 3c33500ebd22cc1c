//! One-shot HTTP server for exercising the API clients.

use std::io;

use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpListener,
    sync::oneshot,
};

/// Canned response written back to the client.
#[derive(Debug, Clone)]
pub(crate) struct Reply {
    status: u16,
    body: String,
}

impl Reply {
    pub(crate) fn json(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
        }
    }
}

/// Raw request received by the server.
#[derive(Debug)]
pub(crate) struct SeenRequest {
    head: String,
    pub(crate) body: String,
}

impl SeenRequest {
    pub(crate) fn starts_with(&self, prefix: &str) -> bool {
        self.head.starts_with(prefix)
    }

    /// Value of a header, matched case-insensitively.
    pub(crate) fn header(&self, name: &str) -> Option<&str> {
        self.head.lines().skip(1).find_map(|line| {
            let (key, value) = line.split_once(':')?;

            key.eq_ignore_ascii_case(name).then_some(value.trim())
        })
    }
}

impl std::fmt::Display for SeenRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.head)
    }
}

pub(crate) struct TestServer {
    pub(crate) base_url: String,
    received: oneshot::Receiver<SeenRequest>,
}

impl TestServer {
    pub(crate) async fn request(self) -> Result<SeenRequest, oneshot::error::RecvError> {
        self.received.await
    }
}

/// Accept a single connection, record its request and answer with `reply`.
pub(crate) async fn serve_once(reply: Reply) -> io::Result<TestServer> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let base_url = format!("http://{}", listener.local_addr()?);
    let (sender, received) = oneshot::channel();

    tokio::spawn(async move {
        let Ok((mut stream, _)) = listener.accept().await else {
            return;
        };

        let Ok(seen) = read_request(&mut stream).await else {
            return;
        };

        let response = format!(
            "HTTP/1.1 {} Test\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
            reply.status,
            reply.body.len(),
            reply.body
        );

        if stream.write_all(response.as_bytes()).await.is_ok() {
            sender.send(seen).ok();
        }
    });

    Ok(TestServer { base_url, received })
}

async fn read_request(stream: &mut tokio::net::TcpStream) -> io::Result<SeenRequest> {
    let mut buffer = Vec::new();
    let mut chunk = [0_u8; 1024];

    loop {
        let read = stream.read(&mut chunk).await?;

        if read == 0 {
            break;
        }

        buffer.extend(chunk.iter().take(read));

        let text = String::from_utf8_lossy(&buffer);

        if let Some((head, body)) = text.split_once("\r\n\r\n") {
            let expected = head
                .lines()
                .find_map(|line| {
                    let (key, value) = line.split_once(':')?;

                    key.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);

            if body.len() >= expected {
                return Ok(SeenRequest {
                    head: head.to_string(),
                    body: body.to_string(),
                });
            }
        }
    }

    Err(io::Error::new(
        io::ErrorKind::UnexpectedEof,
        "connection closed before request completed",
    ))
}
