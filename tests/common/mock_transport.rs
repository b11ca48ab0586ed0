//! In-memory transport for testing fetchers without a host manager

use async_trait::async_trait;
use brewdeck::error::{FetchError, Result};
use brewdeck::exec::Transport;
use std::collections::HashMap;
use std::sync::Mutex;

enum Canned {
    Ok(Vec<u8>),
    Fail(String),
}

/// Transport backed by canned responses.
///
/// Commands are keyed by `"program arg1 arg2 ..."`, HTTP responses by URL.
/// Anything without a canned response fails, which doubles as a way to
/// simulate a broken source. Every issued query is recorded for assertions.
pub struct MockTransport {
    commands: Mutex<HashMap<String, Canned>>,
    responses: Mutex<HashMap<String, Canned>>,
    calls: Mutex<Vec<String>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            commands: Mutex::new(HashMap::new()),
            responses: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn command_key(program: &str, args: &[&str]) -> String {
        if args.is_empty() {
            program.to_string()
        } else {
            format!("{} {}", program, args.join(" "))
        }
    }

    /// Register a successful command response.
    pub fn on_command(&self, program: &str, args: &[&str], output: impl Into<Vec<u8>>) {
        self.commands
            .lock()
            .unwrap()
            .insert(Self::command_key(program, args), Canned::Ok(output.into()));
    }

    /// Register a failing command.
    pub fn fail_command(&self, program: &str, args: &[&str], message: &str) {
        self.commands.lock().unwrap().insert(
            Self::command_key(program, args),
            Canned::Fail(message.to_string()),
        );
    }

    /// Register a successful HTTP body for a URL.
    pub fn on_http(&self, url: &str, body: impl Into<Vec<u8>>) {
        self.responses
            .lock()
            .unwrap()
            .insert(url.to_string(), Canned::Ok(body.into()));
    }

    /// Every query issued so far, commands and URLs interleaved in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, key: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| call.as_str() == key)
            .count()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn command(&self, program: &str, args: &[&str]) -> Result<Vec<u8>> {
        let key = Self::command_key(program, args);
        self.calls.lock().unwrap().push(key.clone());

        match self.commands.lock().unwrap().get(&key) {
            Some(Canned::Ok(output)) => Ok(output.clone()),
            Some(Canned::Fail(message)) => Err(FetchError::CommandFailed {
                program: program.to_string(),
                args: args.join(" "),
                message: message.clone(),
            }
            .into()),
            None => Err(FetchError::CommandFailed {
                program: program.to_string(),
                args: args.join(" "),
                message: "no canned response".to_string(),
            }
            .into()),
        }
    }

    async fn http_get(&self, url: &str) -> Result<Vec<u8>> {
        self.calls.lock().unwrap().push(url.to_string());

        match self.responses.lock().unwrap().get(url) {
            Some(Canned::Ok(body)) => Ok(body.clone()),
            Some(Canned::Fail(_)) | None => Err(FetchError::HttpStatus {
                url: url.to_string(),
                status: 404,
            }
            .into()),
        }
    }
}
