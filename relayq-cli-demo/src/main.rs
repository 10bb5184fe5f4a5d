use relayq::constants::DEFAULT_CALL_TIMEOUT;
use relayq::session::RpcSession;
use relayq_tokio_client::WsQueueLink;
use serde_json::{Value, json};
use std::io::{BufRead, Write};

const HOST_FILE: &str = "relayq.host";

fn main() {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (url_flag, command_words) = split_args(&args);
    let cli_mode = command_words.is_empty();

    let url = match url_flag.or_else(read_host_file) {
        Some(url) => url,
        None => ask_for_url(),
    };

    // The REPL blocks on stdin and on reply streams, so it stays on the
    // main thread while the runtime's workers pump the socket.
    let runtime = tokio::runtime::Runtime::new().expect("failed to start runtime");
    let session = match runtime.block_on(relayq_tokio_client::connect_session(&url)) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("Unable to connect to RPC gateway: {}", url);
            eprintln!("Error message: {}", e);
            std::process::exit(1);
        }
    };
    save_host_file(&url);

    handshake(&session);

    if cli_mode {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(_) => break,
            };
            run_command(&session, &line);
        }
    } else if !run_command(&session, &command_words.join(" ")) {
        session.close();
        std::process::exit(1);
    }

    session.close();
}

/// Pulls `--url <address>` (or `--url=<address>`) out of the arguments;
/// whatever remains is the command to run. No remaining words means
/// interactive mode.
fn split_args(args: &[String]) -> (Option<String>, Vec<String>) {
    let mut url = None;
    let mut command_words = Vec::new();

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "--url" {
            url = iter.next().cloned();
        } else if let Some(value) = arg.strip_prefix("--url=") {
            url = Some(value.to_string());
        } else {
            command_words.push(arg.clone());
        }
    }

    (url, command_words)
}

fn read_host_file() -> Option<String> {
    let url = std::fs::read_to_string(HOST_FILE).ok()?;
    let url = url.trim().to_string();
    if url.is_empty() { None } else { Some(url) }
}

/// Remembers the gateway address for the next run.
fn save_host_file(url: &str) {
    if let Err(e) = std::fs::write(HOST_FILE, url) {
        tracing::warn!("Could not save gateway address to {}: {}", HOST_FILE, e);
    }
}

fn ask_for_url() -> String {
    let stdin = std::io::stdin();
    loop {
        println!("Please input broker gateway address ( ws://hostname:port ):");
        let mut line = String::new();
        match stdin.read_line(&mut line) {
            Ok(0) | Err(_) => {
                eprintln!("No gateway address given.");
                std::process::exit(1);
            }
            Ok(_) => {
                let url = line.trim();
                if !url.is_empty() {
                    return url.to_string();
                }
            }
        }
    }
}

fn handshake(session: &RpcSession<WsQueueLink>) {
    println!("Handshaking...");
    let request = json!({ "type": "handshake" }).to_string().into_bytes();

    let stream = match session.call(request, DEFAULT_CALL_TIMEOUT) {
        Ok(stream) => stream,
        Err(e) => {
            eprintln!("Handshake failed: {}", e);
            return;
        }
    };

    match stream.single_result() {
        Ok(body) => {
            let reply: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
            if let Some(data) = reply["data"].as_str() {
                println!("{}", data);
            }
        }
        Err(e) => eprintln!("Handshake failed: {}", e),
    }
}

/// Sends one command and streams its result parts as they arrive. Returns
/// false when the reply errored.
fn run_command(session: &RpcSession<WsQueueLink>, command: &str) -> bool {
    let request = json!({ "type": "cmd", "data": command }).to_string().into_bytes();

    let stream = match session.call(request, DEFAULT_CALL_TIMEOUT) {
        Ok(stream) => stream,
        Err(e) => {
            eprintln!("Call failed: {}", e);
            return false;
        }
    };

    let mut results = stream.results();
    let mut needs_handshake = false;
    let mut failed = false;
    for item in results.by_ref() {
        match item {
            Ok(part) => {
                if process_result_part(&part) {
                    needs_handshake = true;
                }
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                failed = true;
            }
        }
    }

    if let Some(prompt) = results.prompt() {
        print!("{}", prompt);
        let _ = std::io::stdout().flush();
    }

    if needs_handshake {
        handshake(session);
    }

    !failed
}

/// Prints one result part the way the worker framed it. Returns true when
/// the worker asked for a fresh handshake.
fn process_result_part(part: &[u8]) -> bool {
    let reply: Value = match serde_json::from_slice(part) {
        Ok(value) => value,
        Err(_) => {
            // Not JSON; show it as-is.
            println!("{}", String::from_utf8_lossy(part));
            return false;
        }
    };

    if reply["type"] == "error" {
        if let Some(data) = reply["data"].as_str() {
            println!("{}", data);
        }
        return reply["fix"] == "handshake";
    }

    match reply["data"].as_str() {
        Some(data) if !data.is_empty() => println!("{}", data),
        _ => {}
    }
    false
}
