use std::io::Write;
use std::net::TcpListener;
use std::net::TcpStream;
use std::process::Child;
use std::process::Stdio;
use std::thread;
use std::time::Duration;
use std::time::Instant;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use serde_json::Value;

fn uia_bridge_cmd() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("uia-bridge"));
    cmd.env_remove("UIA_BRIDGE_PORT")
        .env_remove("UIA_BRIDGE_BIND")
        .env_remove("UIA_BRIDGE_FIXTURE")
        .env_remove("UIA_BRIDGE_LOG");
    cmd
}

fn free_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

/// A `uia-bridge serve` child process, killed on drop if still running.
struct ServeProcess {
    child: Child,
    port: u16,
}

impl ServeProcess {
    fn start(extra_args: &[&str]) -> Self {
        let port = free_port();
        let child = std::process::Command::new(assert_cmd::cargo::cargo_bin!("uia-bridge"))
            .args(["serve", "--bind", "127.0.0.1", "--port", &port.to_string()])
            .args(extra_args)
            .env_remove("UIA_BRIDGE_FIXTURE")
            .env("RUST_LOG", "warn")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .expect("spawn uia-bridge serve");

        let deadline = Instant::now() + Duration::from_secs(10);
        while TcpStream::connect(("127.0.0.1", port)).is_err() {
            assert!(Instant::now() < deadline, "bridge did not start listening");
            thread::sleep(Duration::from_millis(50));
        }
        Self { child, port }
    }

    fn send(&self, request: &str) -> assert_cmd::assert::Assert {
        uia_bridge_cmd()
            .args(["send", "--port", &self.port.to_string(), request])
            .assert()
    }

    fn wait_for_exit(mut self) -> bool {
        let deadline = Instant::now() + Duration::from_secs(10);
        loop {
            if let Some(status) = self.child.try_wait().unwrap() {
                return status.success();
            }
            if Instant::now() > deadline {
                return false;
            }
            thread::sleep(Duration::from_millis(50));
        }
    }
}

impl Drop for ServeProcess {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

#[test]
fn test_help_lists_status_codes() {
    uia_bridge_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("STATUS CODES"))
        .stdout(predicate::str::contains("stale element reference"));
}

#[test]
fn test_env_json_reflects_environment() {
    uia_bridge_cmd()
        .args(["env", "--json"])
        .env("UIA_BRIDGE_PORT", "4999")
        .env("UIA_BRIDGE_UNICODE_KEYBOARD", "true")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"port\": 4999"))
        .stdout(predicate::str::contains("\"unicode_keyboard\": true"));
}

#[test]
fn test_env_text_falls_back_on_bad_values() {
    uia_bridge_cmd()
        .arg("env")
        .env("UIA_BRIDGE_PORT", "not-a-port")
        .assert()
        .success()
        .stdout(predicate::str::contains("Listen: 127.0.0.1:4724"))
        .stdout(predicate::str::contains("UIA_BRIDGE_PORT: not-a-port"));
}

#[test]
fn test_completions() {
    uia_bridge_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("uia-bridge"));
}

#[test]
fn test_send_invalid_json_is_usage_error() {
    uia_bridge_cmd()
        .args(["send", "{not json"])
        .assert()
        .code(64)
        .stderr(predicate::str::contains("Invalid JSON"));
}

#[test]
fn test_send_without_bridge() {
    let port = free_port();
    uia_bridge_cmd()
        .args(["send", "--port", &port.to_string(), r#"{"cmd":"pressBack"}"#])
        .assert()
        .code(69)
        .stderr(predicate::str::contains("Failed to connect to bridge"))
        .stderr(predicate::str::contains("uia-bridge serve"));
}

#[test]
fn test_serve_missing_fixture() {
    uia_bridge_cmd()
        .args(["serve", "--port", "0", "--fixture", "/nonexistent/device.json"])
        .env("RUST_LOG", "debug")
        .assert()
        .code(64)
        .stderr(predicate::str::contains("Failed to load device fixture"))
        .stderr(predicate::str::contains("/nonexistent/device.json"))
        .stderr(predicate::str::contains("load_fixture"));
}

#[test]
fn test_serve_send_and_shutdown() {
    let bridge = ServeProcess::start(&[]);

    bridge
        .send(r#"{"cmd":"find","params":{"strategy":"id","selector":"io.uiabridge.sample:id/login"}}"#)
        .success()
        .stdout(predicate::str::contains(r#"{"status":0,"value":{"ELEMENT":"1"}}"#));

    bridge
        .send(r#"{"cmd":"element:click","params":{"elementId":"1"}}"#)
        .success()
        .stdout(predicate::str::contains(r#"{"status":0,"value":true}"#));

    bridge
        .send(r#"{"cmd":"find","params":{"strategy":"name","selector":"Nothing"}}"#)
        .code(69)
        .stdout(predicate::str::contains(r#""status":7"#))
        .stderr(predicate::str::contains("no such element"));

    bridge
        .send(r#"{"cmd":"shutdown"}"#)
        .success()
        .stdout(predicate::str::contains("OK, shutting down"));

    assert!(bridge.wait_for_exit(), "bridge did not exit cleanly");
}

#[test]
fn test_serve_with_fixture_file() {
    let mut fixture = tempfile::NamedTempFile::new().unwrap();
    write!(
        fixture,
        r#"{{
            "display": {{ "width": 720, "height": 1280 }},
            "root": {{
                "class": "android.widget.FrameLayout",
                "bounds": {{ "left": 0, "top": 0, "right": 720, "bottom": 1280 }},
                "children": [
                    {{ "class": "android.widget.Button", "text": "OK",
                       "bounds": {{ "left": 10, "top": 10, "right": 110, "bottom": 60 }} }}
                ]
            }}
        }}"#
    )
    .unwrap();
    let path = fixture.path().to_str().unwrap().to_string();
    let bridge = ServeProcess::start(&["--fixture", &path]);

    let output = bridge.send(r#"{"cmd":"getDeviceSize"}"#).success().get_output().clone();
    let result: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(
        result,
        json!({ "status": 0, "value": { "width": 720, "height": 1280 } })
    );

    bridge
        .send(r#"{"cmd":"find","params":{"strategy":"tag name","selector":"button"}}"#)
        .success()
        .stdout(predicate::str::contains(r#""ELEMENT":"1""#));

    bridge.send(r#"{"cmd":"shutdown"}"#).success();
    assert!(bridge.wait_for_exit());
}
