// Library root
// -----------
// This crate exposes the upload client used by the `imgdrop` binary.
//
// Module responsibilities:
// - `config`: endpoint, transport mode and allow-list, loaded from a JSON
//   file and the environment.
// - `file`: the selected file and the input handle it comes from.
// - `api`: the upload client itself: encoding, the single POST and the
//   interpretation of the response.
// - `ui`: status sinks and the interactive terminal loop.
// - `error`: the failure taxonomy and its user-facing wording.
//
// Input and output are injected (`FileInput`, `StatusSink`) so the client
// can be driven from tests without a terminal.
pub mod api;
pub mod config;
pub mod error;
pub mod file;
pub mod ui;

pub use api::{UploadClient, UploadResult};
pub use config::{TransportMode, UploadConfig};
pub use error::UploadError;
