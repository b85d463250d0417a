//! Client network layer: one TCP connection, a server reader task and the
//! local input loop.

use log::{debug, info, warn};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::mpsc;

use crate::display::{render, Input, CLEAR_SCREEN};

/// Console client connected to a battle server.
pub struct Client {
    reader: OwnedReadHalf,
    writer: OwnedWriteHalf,
}

impl Client {
    pub async fn connect(addr: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let stream = TcpStream::connect(addr).await?;
        info!("Connected to {}", addr);
        let (reader, writer) = stream.into_split();
        Ok(Client { reader, writer })
    }

    /// Runs against the terminal until the user exits or the server hangs up.
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        let input = BufReader::new(tokio::io::stdin());
        self.run_with(input, tokio::io::stdout()).await?;
        Ok(())
    }

    /// Forwards `input` lines to the server and prints server lines to
    /// `output`. Returns `output` once the server closes the connection.
    pub async fn run_with<R, W>(self, input: R, output: W) -> Result<W, Box<dyn std::error::Error>>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (print_tx, print_rx) = mpsc::unbounded_channel::<String>();
        let printer = tokio::spawn(print_lines(output, print_rx));

        let Client { reader, mut writer } = self;
        let mut server_lines = {
            let print_tx = print_tx.clone();
            tokio::spawn(async move {
                let mut lines = BufReader::new(reader).lines();
                loop {
                    match lines.next_line().await {
                        Ok(Some(line)) => {
                            let _ = print_tx.send(format!("{}\n", render(&line)));
                        }
                        Ok(None) => break,
                        Err(e) => {
                            warn!("Error reading from server: {}", e);
                            break;
                        }
                    }
                }
                let _ = print_tx.send("Disconnected from server\n".to_string());
            })
        };

        // The server decides when the session ends: `0` only leaves from the
        // main menu, so input keeps flowing until the connection closes.
        let mut input_lines = input.lines();
        let mut server_closed = false;
        loop {
            tokio::select! {
                joined = &mut server_lines => {
                    joined?;
                    server_closed = true;
                    break;
                }
                line = input_lines.next_line() => {
                    let Some(line) = line? else {
                        debug!("Input closed, leaving");
                        if let Err(e) = send_line(&mut writer, "EXIT").await {
                            debug!("Could not send EXIT: {}", e);
                        }
                        break;
                    };
                    let command = match Input::parse(&line) {
                        Input::Skip => continue,
                        Input::Clear => {
                            let _ = print_tx.send(CLEAR_SCREEN.to_string());
                            continue;
                        }
                        Input::Send(command) => command,
                        Input::Exit(token) => {
                            debug!("Sent exit token '{}'", token);
                            token
                        }
                    };
                    if send_line(&mut writer, &command).await.is_err() {
                        break;
                    }
                }
            }
        }

        if !server_closed {
            server_lines.await?;
        }
        let _ = print_tx.send("Goodbye!\n".to_string());
        drop(print_tx);
        Ok(printer.await??)
    }
}

async fn send_line(writer: &mut OwnedWriteHalf, line: &str) -> std::io::Result<()> {
    writer.write_all(format!("{line}\n").as_bytes()).await
}

async fn print_lines<W: AsyncWrite + Unpin>(
    mut output: W,
    mut lines: mpsc::UnboundedReceiver<String>,
) -> std::io::Result<W> {
    while let Some(text) = lines.recv().await {
        output.write_all(text.as_bytes()).await?;
        output.flush().await?;
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    /// Accepts one connection, greets it and records lines until EXIT.
    async fn fake_server() -> (String, tokio::task::JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let handle = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let (read_half, mut write_half) = stream.into_split();
            write_half
                .write_all(b"CONNECTED_TO_SERVER\nHP:80\n")
                .await
                .unwrap();

            let mut received = Vec::new();
            let mut lines = BufReader::new(read_half).lines();
            while let Some(line) = lines.next_line().await.unwrap() {
                let done = line == "EXIT";
                received.push(line);
                if done {
                    break;
                }
            }
            received
        });
        (addr, handle)
    }

    #[tokio::test]
    async fn test_run_with_forwards_commands_and_renders_replies() {
        let (addr, server) = fake_server().await;
        let client = Client::connect(&addr).await.unwrap();

        let input: &[u8] = b"Alice\n\nCLS\nSTATUS\nEXIT\n";
        let output = client.run_with(input, Vec::<u8>::new()).await.unwrap();

        assert_eq!(server.await.unwrap(), vec!["Alice", "STATUS", "EXIT"]);
        let printed = String::from_utf8(output).unwrap();
        assert!(printed.contains("CONNECTED_TO_SERVER"));
        assert!(printed.contains("Current HP: 80"));
        assert!(printed.contains("Disconnected from server"));
        assert!(printed.ends_with("Goodbye!\n"));
    }

    #[tokio::test]
    async fn test_input_eof_sends_exit() {
        let (addr, server) = fake_server().await;
        let client = Client::connect(&addr).await.unwrap();

        let input = BufReader::new(tokio_test::io::Builder::new().read(b"HELP\n").build());
        client.run_with(input, Vec::<u8>::new()).await.unwrap();
        assert_eq!(server.await.unwrap(), vec!["HELP", "EXIT"]);
    }

    #[tokio::test]
    async fn test_exit_token_keeps_reading_until_server_closes() {
        let (addr, server) = fake_server().await;
        let client = Client::connect(&addr).await.unwrap();

        // The fake server ignores `0`, as a real one does in the weapon menu
        let input: &[u8] = b"0\nSTATUS\n";
        let output = tokio::time::timeout(
            std::time::Duration::from_secs(5),
            client.run_with(input, Vec::<u8>::new()),
        )
        .await
        .expect("client kept waiting after the exit token")
        .unwrap();

        assert_eq!(server.await.unwrap(), vec!["0", "STATUS", "EXIT"]);
        assert!(String::from_utf8(output).unwrap().ends_with("Goodbye!\n"));
    }
}
