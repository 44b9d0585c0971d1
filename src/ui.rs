// UI layer: where status text goes, and the interactive prompt loop built
// on `dialoguer`. The upload client only ever sees a `StatusSink`, so the
// terminal can be swapped for an in-memory recorder in tests.

use crate::api::{UploadClient, UploadResult};
use crate::file::PathInput;
use anyhow::Result;
use dialoguer::{Input, Select};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Mutex;
use std::time::Duration;

/// The single place an upload outcome is reported.
pub trait StatusSink {
    /// Replace the visible status with `text`.
    fn show(&self, text: &str);
}

/// Prints each status line to stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalStatus;

impl StatusSink for TerminalStatus {
    fn show(&self, text: &str) {
        println!("{}", text);
    }
}

/// Keeps every status line written to it. Useful for tests and for
/// embedding the client where output is collected rather than printed.
#[derive(Debug, Default)]
pub struct RecordedStatus {
    lines: Mutex<Vec<String>>,
}

impl RecordedStatus {
    pub fn new() -> Self {
        Self::default()
    }

    /// All lines in write order.
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// What a reader would currently see.
    pub fn current(&self) -> Option<String> {
        self.lines().last().cloned()
    }
}

impl StatusSink for RecordedStatus {
    fn show(&self, text: &str) {
        self.lines
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(text.to_string());
    }
}

/// Spinner that stays up while the request runs and is cleared right
/// before the status line is printed.
pub struct SpinnerStatus {
    bar: ProgressBar,
}

impl SpinnerStatus {
    pub fn start(message: &str) -> Self {
        let bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
            bar.set_style(style);
        }
        bar.set_message(message.to_string());
        bar.enable_steady_tick(Duration::from_millis(100));
        SpinnerStatus { bar }
    }
}

impl StatusSink for SpinnerStatus {
    fn show(&self, text: &str) {
        self.bar.finish_and_clear();
        TerminalStatus.show(text);
    }
}

/// Upload the file at `input` with a spinner on the terminal.
pub async fn upload_with_spinner(client: &UploadClient, input: &PathInput) -> UploadResult {
    let status = SpinnerStatus::start("Uploading...");
    client.upload(input, &status).await
}

/// Interactive loop: prompt for a path, upload it, repeat until "Exit".
/// An empty path is passed through so the client reports the missing file.
pub async fn main_menu(client: UploadClient) -> Result<()> {
    loop {
        let items = vec!["Upload a file", "Show configuration", "Exit"];
        let selection = Select::new().items(&items).default(0).interact()?;
        match selection {
            0 => {
                let path: String = Input::new()
                    .with_prompt("Image file path")
                    .allow_empty(true)
                    .interact_text()?;
                upload_with_spinner(&client, &PathInput::from_text(&path)).await;
            }
            1 => print_config(&client),
            2 => break,
            _ => {}
        }
    }
    Ok(())
}

fn print_config(client: &UploadClient) {
    let config = client.config();
    println!("Endpoint:        {}", config.endpoint);
    println!("Mode:            {}", config.mode);
    println!("File field:      {}", config.file_field);
    println!("Filename header: {}", config.filename_header);
    match &config.allowed_mime_types {
        Some(types) => println!("Allowed types:   {}", types.join(", ")),
        None => println!("Allowed types:   any"),
    }
}
