//! WebAssembly bindings: a thin `JsCif` wrapper exposing parse/serialize/query
//! operations to JavaScript.
//!
//! Grounded in the teacher's `crates/cif-parser/src/wasm.rs` (the
//! `wasm-bindgen` + `serde-wasm-bindgen` + `console_log!` pattern), trimmed to
//! the operations this crate's model actually exposes rather than mirroring
//! every getter the teacher's flatter `CifBlock`/`CifLoop` types had.

use wasm_bindgen::prelude::*;

use crate::document::Cif;
use crate::options::{CifVersion, WriteOptions};
use crate::value::Value;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = console)]
    fn log(s: &str);
}

macro_rules! console_log {
    ($($t:tt)*) => (log(&format_args!($($t)*).to_string()))
}

/// JavaScript-compatible CIF version tag.
#[wasm_bindgen]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsCifVersion {
    V1_1 = 0,
    V2_0 = 1,
}

impl From<CifVersion> for JsCifVersion {
    fn from(v: CifVersion) -> Self {
        match v {
            CifVersion::V1_1 => JsCifVersion::V1_1,
            CifVersion::V2_0 => JsCifVersion::V2_0,
        }
    }
}

/// A parsed CIF document, exposed to JavaScript by code/index rather than by
/// handing out borrowed Rust references.
#[wasm_bindgen]
pub struct JsCif {
    inner: Cif,
}

#[wasm_bindgen]
impl JsCif {
    /// Parse a CIF string with default options.
    #[wasm_bindgen]
    pub fn parse(input: &str) -> Result<JsCif, JsValue> {
        console_log!("parsing CIF content of length {}", input.len());
        Cif::parse_str(input)
            .map(|inner| JsCif { inner })
            .map_err(|e| js_sys::Error::new(&e.to_string()).into())
    }

    /// Serialize back to CIF 2.0 text.
    #[wasm_bindgen(js_name = toString)]
    pub fn to_string_js(&self) -> Result<String, JsValue> {
        self.inner
            .to_string_cif()
            .map_err(|e| js_sys::Error::new(&e.to_string()).into())
    }

    /// Serialize with explicit version control.
    #[wasm_bindgen(js_name = serialize)]
    pub fn serialize(&self, version: JsCifVersion) -> Result<String, JsValue> {
        let opts = WriteOptions {
            version: match version {
                JsCifVersion::V1_1 => CifVersion::V1_1,
                JsCifVersion::V2_0 => CifVersion::V2_0,
            },
            ..WriteOptions::default()
        };
        crate::writer::write_to_string(&self.inner, &opts)
            .map_err(|e| js_sys::Error::new(&e.to_string()).into())
    }

    #[wasm_bindgen(getter = blockCodes)]
    pub fn block_codes(&self) -> Vec<String> {
        self.inner.blocks().iter().map(|b| b.code().to_string()).collect()
    }

    /// Get a scalar item's value (as a serialized JS value) from a block.
    #[wasm_bindgen(js_name = getScalar)]
    pub fn get_scalar(&self, block_code: &str, item_name: &str) -> JsValue {
        let value = self
            .inner
            .find_block(block_code)
            .and_then(|b| b.items().get_scalar(item_name));
        match value {
            Some(v) => js_value_of(v),
            None => JsValue::UNDEFINED,
        }
    }

    /// Names of the non-scalars loops in a block, one array of item names per loop.
    #[wasm_bindgen(js_name = loopNames)]
    pub fn loop_names(&self, block_code: &str) -> JsValue {
        let Some(b) = self.inner.find_block(block_code) else {
            return JsValue::UNDEFINED;
        };
        let names: Vec<Vec<String>> = b
            .items()
            .loops()
            .iter()
            .filter(|l| !l.is_scalars())
            .map(|l| l.names().to_vec())
            .collect();
        serde_wasm_bindgen::to_value(&names).unwrap_or(JsValue::NULL)
    }
}

/// Render a [`Value`] to a JS value via its `serde` representation
/// (`spec.md` §9 asks that the wasm surface stay thin: this defers to
/// `serde-wasm-bindgen` rather than hand-building a JS object per variant).
fn js_value_of(value: &Value) -> JsValue {
    serde_wasm_bindgen::to_value(value).unwrap_or(JsValue::NULL)
}

/// Crate version, for diagnostics from JS callers.
#[wasm_bindgen(js_name = version)]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
