use std::net::IpAddr;
use std::net::Ipv4Addr;
use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;
pub use clap_complete::Shell;
use uia_bridge_daemon::DEFAULT_PORT;

const LONG_ABOUT: &str = r#"uia-bridge drives a device UI over newline-delimited JSON.

Clients send one command per line and get one status-coded result per line:

    {"cmd": "find", "params": {"strategy": "id", "selector": "login"}}
    {"status": 0, "value": {"ELEMENT": "1"}}

Element ids returned by find stay valid until clearElementCache.

STATUS CODES:
    0   success
    7   no such element
    9   unknown command
    10  stale element reference
    13  unknown error
    29  invalid element coordinates
    32  invalid selector
    35  invalid command

EXAMPLES:
    # Serve the built-in sample device
    uia-bridge serve --port 4724

    # Serve a hierarchy described in a fixture file
    uia-bridge serve --fixture device.json

    # Find an element and click it
    uia-bridge send '{"cmd":"find","params":{"strategy":"name","selector":"Login"}}'
    uia-bridge send '{"cmd":"element:click","params":{"elementId":"1"}}'

    # Stop the bridge
    uia-bridge send '{"cmd":"shutdown"}'"#;

#[derive(Debug, Parser)]
#[command(name = "uia-bridge")]
#[command(author, version)]
#[command(about = "On-device UI automation bridge")]
#[command(long_about = LONG_ABOUT)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Default log filter when RUST_LOG is unset
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Start the bridge over the simulated device
    #[command(long_about = r#"Start the bridge over the simulated device.

Without --fixture the bridge serves a built-in sample sign-in screen.
Settings not given as flags come from the environment (see 'uia-bridge env').

EXAMPLES:
    uia-bridge serve
    uia-bridge serve --bind 0.0.0.0 --port 4800
    uia-bridge serve --fixture tests/fixtures/device.json"#)]
    Serve {
        /// Address to listen on [env: UIA_BRIDGE_BIND]
        #[arg(long)]
        bind: Option<IpAddr>,

        /// TCP port to listen on [env: UIA_BRIDGE_PORT]
        #[arg(short, long)]
        port: Option<u16>,

        /// JSON description of the simulated device
        #[arg(short, long, env = "UIA_BRIDGE_FIXTURE")]
        fixture: Option<PathBuf>,
    },

    /// Send one JSON command to a running bridge and print the result
    #[command(long_about = r#"Send one JSON command to a running bridge and print the result.

The result line is printed as received. A non-zero status also fails the
process with an exit code for its category.

EXAMPLES:
    uia-bridge send '{"cmd":"getDeviceSize"}'
    uia-bridge send --port 4800 '{"cmd":"pressKeyCode","params":{"keycode":66}}'"#)]
    Send {
        /// Request line, e.g. '{"cmd":"pressBack"}'
        request: String,

        /// Bridge host
        #[arg(long, default_value_t = IpAddr::V4(Ipv4Addr::LOCALHOST))]
        host: IpAddr,

        /// Bridge port
        #[arg(short, long, env = "UIA_BRIDGE_PORT", default_value_t = DEFAULT_PORT)]
        port: u16,

        /// Seconds to wait for the result
        #[arg(long, default_value_t = 60)]
        timeout: u64,
    },

    /// Show the effective configuration
    Env {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completion scripts
    #[command(long_about = r#"Generate shell completion scripts.

EXAMPLES:
    uia-bridge completions bash > ~/.local/share/bash-completion/completions/uia-bridge
    uia-bridge completions zsh > ~/.zfunc/_uia-bridge"#)]
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}
