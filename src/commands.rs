//! Bridge-facing command dispatch.
//!
//! The host bridge routes web-layer calls here by action name:
//!
//! | action | args | result |
//! |---|---|---|
//! | `getPictures` | `[options]` | array of strings or records, or a failure string |
//! | `hasReadPermission` | `[]` | `true` / `false` |
//! | `requestReadPermission` | `[]` | `null`, immediately |
//!
//! `requestReadPermission` fires the OS prompt only when the permission is
//! missing, and reports success right away whatever the user later answers.

use crate::orchestrator::{PickFailure, Picker};
use crate::request::PickRequest;
use serde_json::Value;

pub const GET_PICTURES: &str = "getPictures";
pub const HAS_READ_PERMISSION: &str = "hasReadPermission";
pub const REQUEST_READ_PERMISSION: &str = "requestReadPermission";

/// Receives the JSON result of one command.
pub type CommandCallback = Box<dyn FnOnce(Result<Value, PickFailure>) + Send>;

/// Run `action` with the bridge's argument array.
///
/// Returns `false` for an unknown action; the callback is then never called.
pub fn execute(picker: &Picker, action: &str, args: &Value, callback: CommandCallback) -> bool {
    match action {
        GET_PICTURES => {
            let request = match PickRequest::from_args(args) {
                Ok(request) => request,
                Err(e) => {
                    log::warn!("{} rejected: {}", GET_PICTURES, e);
                    callback(Err(e.into()));
                    return true;
                }
            };
            picker.pick_request(
                request,
                Box::new(move |result| {
                    callback(result.and_then(|response| {
                        serde_json::to_value(response)
                            .map_err(|e| PickFailure::new(format!("Failed to process images: {}", e)))
                    }))
                }),
            );
            true
        }
        HAS_READ_PERMISSION => {
            callback(Ok(Value::Bool(picker.permission().has_read_permission())));
            true
        }
        REQUEST_READ_PERMISSION => {
            let gate = picker.permission();
            if !gate.has_read_permission() {
                gate.request_read_permission();
            }
            callback(Ok(Value::Null));
            true
        }
        other => {
            log::debug!("unknown action {}", other);
            false
        }
    }
}
