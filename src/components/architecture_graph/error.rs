use thiserror::Error;
use wasm_bindgen::JsValue;

/// Failures talking to the browser's canvas. They abort the current frame or
/// the mount, never the frame loop itself.
#[derive(Debug, Error)]
pub enum CanvasError {
	#[error("no global window")]
	NoWindow,
	#[error("2d rendering context unavailable")]
	ContextUnavailable,
	#[error("javascript error: {0}")]
	Js(String),
}

impl From<JsValue> for CanvasError {
	fn from(value: JsValue) -> Self {
		CanvasError::Js(value.as_string().unwrap_or_else(|| format!("{value:?}")))
	}
}
