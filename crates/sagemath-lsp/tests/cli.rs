use std::io::{BufRead, BufReader, Read, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use serde_json::{json, Value};

fn frame(body: &str) -> String {
    format!("Content-Length: {}\r\n\r\n{}", body.len(), body)
}

fn read_message(reader: &mut impl BufRead) -> String {
    let mut length = 0usize;
    loop {
        let mut line = String::new();
        reader.read_line(&mut line).expect("failed to read header");
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some(value) = line.strip_prefix("Content-Length: ") {
            length = value.parse().expect("bad Content-Length");
        }
    }
    let mut body = vec![0u8; length];
    reader.read_exact(&mut body).expect("failed to read body");
    String::from_utf8(body).expect("body is not UTF-8")
}

#[test]
fn sagemath_lsp_requires_stdio_flag() {
    let exe = env!("CARGO_BIN_EXE_sagemath-lsp");
    let output = Command::new(exe)
        .output()
        .expect("failed to start sagemath-lsp binary");
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("--stdio"));
}

#[test]
fn sagemath_lsp_answers_initialize() {
    let dir = tempfile::tempdir().unwrap();
    let symbols = dir.path().join("sagemath_symbols.json");
    std::fs::write(
        &symbols,
        r#"{"classes": [], "functions": [{"name": "sin", "doc": "sine"}], "constants": []}"#,
    )
    .unwrap();

    let exe = env!("CARGO_BIN_EXE_sagemath-lsp");
    let mut child = Command::new(exe)
        .arg("--stdio")
        .arg("--symbols")
        .arg(&symbols)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("failed to start sagemath-lsp binary");

    let mut stdin = child.stdin.take().unwrap();
    let mut stdout = BufReader::new(child.stdout.take().unwrap());

    let initialize = r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"capabilities":{}}}"#;
    stdin.write_all(frame(initialize).as_bytes()).unwrap();
    stdin.flush().unwrap();

    let response: serde_json::Value = serde_json::from_str(&read_message(&mut stdout)).unwrap();
    assert_eq!(response["id"], 1);
    assert_eq!(response["result"]["serverInfo"]["name"], "sagemath-lsp");
    assert_eq!(response["result"]["capabilities"]["hoverProvider"], true);

    child.kill().expect("failed to stop sagemath-lsp binary");
    let _ = child.wait();
}


const SYMBOLS_LOADED: &str = "SageMath symbols loaded successfully.";

fn write_symbols(path: &Path, doc: &str) {
    let catalog = json!({
        "classes": [],
        "functions": [{"name": "sin", "doc": doc}],
        "constants": [],
    });
    std::fs::write(path, catalog.to_string()).unwrap();
}

/// A running server with `--debug`, driven over its stdio
struct Session {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

impl Session {
    fn start(symbols: &Path) -> Self {
        let exe = env!("CARGO_BIN_EXE_sagemath-lsp");
        let mut child = Command::new(exe)
            .arg("--stdio")
            .arg("--debug")
            .arg("--symbols")
            .arg(symbols)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .expect("failed to start sagemath-lsp binary");
        let stdin = child.stdin.take().unwrap();
        let stdout = BufReader::new(child.stdout.take().unwrap());
        Self {
            child,
            stdin,
            stdout,
        }
    }

    fn send(&mut self, message: Value) {
        self.stdin
            .write_all(frame(&message.to_string()).as_bytes())
            .unwrap();
        self.stdin.flush().unwrap();
    }

    fn notify(&mut self, method: &str, params: Value) {
        self.send(json!({"jsonrpc": "2.0", "method": method, "params": params}));
    }

    /// Skip messages until one satisfies `pred`
    fn read_until(&mut self, pred: impl Fn(&Value) -> bool) -> Value {
        loop {
            let message: Value = serde_json::from_str(&read_message(&mut self.stdout))
                .expect("server closed the connection");
            if pred(&message) {
                return message;
            }
        }
    }

    fn request(&mut self, id: u64, method: &str, params: Value) -> Value {
        self.send(json!({"jsonrpc": "2.0", "id": id, "method": method, "params": params}));
        self.read_until(|m| m["id"] == id && m.get("method").is_none())
    }

    fn wait_for_log(&mut self, text: &str) {
        self.read_until(|m| {
            m["method"] == "window/logMessage"
                && m["params"]["message"]
                    .as_str()
                    .is_some_and(|s| s.starts_with(text))
        });
    }

    fn hover(&mut self, id: u64, uri: &str) -> Value {
        let response = self.request(
            id,
            "textDocument/hover",
            json!({
                "textDocument": {"uri": uri},
                "position": {"line": 0, "character": 5},
            }),
        );
        response["result"].clone()
    }

    fn change_symbols_path(&mut self, path: &Path) {
        self.notify(
            "workspace/didChangeConfiguration",
            json!({"settings": {"sagemath": {"symbolsPath": path}}}),
        );
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

fn open_session(dir: &Path, uri: &str) -> Session {
    let symbols = dir.join("sagemath_symbols.json");
    write_symbols(&symbols, "sine");

    let mut session = Session::start(&symbols);
    session.request(1, "initialize", json!({"capabilities": {}}));
    session.notify("initialized", json!({}));
    session.wait_for_log(SYMBOLS_LOADED);

    session.notify(
        "textDocument/didOpen",
        json!({"textDocument": {
            "uri": uri,
            "languageId": "sagemath",
            "version": 1,
            "text": "y = sin(x)\n",
        }}),
    );
    session.wait_for_log("[DEBUG] Document opened");
    session
}

#[test]
fn sagemath_lsp_reloads_symbols_on_configuration_change() {
    let dir = tempfile::tempdir().unwrap();
    let uri = "file:///work/demo.sage";
    let mut session = open_session(dir.path(), uri);

    let hover = session.hover(2, uri);
    assert_eq!(hover["contents"]["value"], "sine");

    let updated = dir.path().join("updated_symbols.json");
    write_symbols(&updated, "the sine function");
    session.change_symbols_path(&updated);
    session.wait_for_log(SYMBOLS_LOADED);

    let hover = session.hover(3, uri);
    assert_eq!(hover["contents"]["value"], "the sine function");
}

#[test]
fn sagemath_lsp_reports_failed_reload() {
    let dir = tempfile::tempdir().unwrap();
    let uri = "file:///work/demo.sage";
    let mut session = open_session(dir.path(), uri);

    session.change_symbols_path(&dir.path().join("missing.json"));
    let shown = session.read_until(|m| m["method"] == "window/showMessage");
    assert_eq!(shown["params"]["type"], 1);
    assert_eq!(
        shown["params"]["message"],
        "Failed to load SageMath symbols. Please check the file format and path."
    );

    assert!(session.hover(2, uri).is_null());
}
