//! Drives the real binary over stdio through a full session lifecycle.

use std::io::{BufRead, BufReader, Read, Write};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::Duration;

use serde_json::{json, Value};

const READ_TIMEOUT: Duration = Duration::from_secs(5);

/// Client end of the stdio transport
struct Connection {
    server: Child,
    stdin: ChildStdin,
    incoming: Receiver<Value>,
}

impl Connection {
    fn spawn() -> Self {
        let mut server = Command::new(env!("CARGO_BIN_EXE_nwscript-ls"))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .env("RUST_LOG", "off")
            .spawn()
            .expect("spawn language server");

        let stdin = server.stdin.take().expect("piped stdin");
        let stdout = server.stdout.take().expect("piped stdout");

        // Blocking reads stay on their own thread so every wait can time out
        let (sender, incoming) = mpsc::channel();
        thread::spawn(move || {
            let mut reader = BufReader::new(stdout);
            while let Some(message) = read_message(&mut reader) {
                if sender.send(message).is_err() {
                    break;
                }
            }
        });

        Self {
            server,
            stdin,
            incoming,
        }
    }

    fn send(&mut self, message: Value) {
        let body = message.to_string();
        write!(self.stdin, "Content-Length: {}\r\n\r\n{}", body.len(), body).expect("write frame");
        self.stdin.flush().expect("flush frame");
    }

    fn notify(&mut self, method: &str, params: Value) {
        self.send(json!({ "jsonrpc": "2.0", "method": method, "params": params }));
    }

    /// Send a request and wait for its response, answering whatever the
    /// server asks in the meantime.
    fn request(&mut self, id: i64, method: &str, params: Value) -> Value {
        self.send(json!({ "jsonrpc": "2.0", "id": id, "method": method, "params": params }));

        loop {
            let message = self
                .incoming
                .recv_timeout(READ_TIMEOUT)
                .unwrap_or_else(|_| panic!("no response to {}", method));

            if message["id"] == json!(id) && message.get("method").is_none() {
                return message;
            }
            if let Some(server_method) = message["method"].as_str()
                && let Some(server_id) = message.get("id")
            {
                let result = match server_method {
                    "workspace/configuration" => json!([{}]),
                    _ => Value::Null,
                };
                self.send(json!({ "jsonrpc": "2.0", "id": server_id, "result": result }));
            }
        }
    }
}

/// One framed message, `None` once the stream ends
fn read_message(reader: &mut impl BufRead) -> Option<Value> {
    let mut length = None;
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).ok()? == 0 {
            return None;
        }
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some(value) = line.strip_prefix("Content-Length:") {
            length = value.trim().parse::<usize>().ok();
        }
    }

    let mut body = vec![0; length?];
    reader.read_exact(&mut body).ok()?;
    serde_json::from_slice(&body).ok()
}

fn initialize_params() -> Value {
    json!({
        "processId": null,
        "rootUri": null,
        "capabilities": {
            "workspace": {
                "configuration": true,
                "workspaceFolders": true
            }
        },
        "clientInfo": { "name": "smoke-client", "version": "1.0" }
    })
}

#[test]
fn initialize_smoke() {
    let mut connection = Connection::spawn();

    let response = connection.request(1, "initialize", initialize_params());
    assert_eq!(response["jsonrpc"], "2.0");

    let result = &response["result"];
    let capabilities = &result["capabilities"];
    assert_eq!(capabilities["hoverProvider"], json!(true));
    assert_eq!(capabilities["definitionProvider"], json!(true));
    assert_eq!(capabilities["completionProvider"]["triggerCharacters"], json!(["."]));
    assert_eq!(
        capabilities["signatureHelpProvider"]["triggerCharacters"],
        json!(["(", ","])
    );
    assert_eq!(capabilities["workspace"]["workspaceFolders"]["supported"], json!(true));
    assert_eq!(result["serverInfo"]["name"], "nwscript-ls");

    connection.notify("initialized", json!({}));
    connection.notify(
        "textDocument/didOpen",
        json!({
            "textDocument": {
                "uri": "file:///smoke.nss",
                "languageId": "nwscript",
                "version": 1,
                "text": "void main() {}"
            }
        }),
    );

    let response = connection.request(2, "shutdown", Value::Null);
    assert_eq!(response["result"], Value::Null);
    assert!(response.get("error").is_none());

    connection.notify("exit", Value::Null);
    drop(connection.stdin);
    let status = connection.server.wait().expect("server exit status");
    assert!(status.success(), "server exited with {}", status);
}
