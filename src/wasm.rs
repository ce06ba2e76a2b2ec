//! WebAssembly bindings for the sketchbook.
//!
//! Provides a thin wrapper around [`Sketch`] for browser canvases.

use wasm_bindgen::prelude::*;

use crate::{
    compute::Pointer,
    schema::{Seed, SketchConfig},
    sketch::Sketch,
};

/// Initialize WASM module with panic hook and logging.
#[wasm_bindgen(start)]
pub fn init() {
    // Set panic hook for better error messages in browser
    console_error_panic_hook::set_once();

    // Initialize WASM logger
    wasm_logger::init(wasm_logger::Config::default());
}

/// WebAssembly wrapper for any sketch.
#[wasm_bindgen]
pub struct WasmSketch {
    sketch: Sketch,
}

#[wasm_bindgen]
impl WasmSketch {
    /// Create a sketch from JSON configuration.
    ///
    /// # Arguments
    /// * `config_json` - JSON string containing a tagged SketchConfig
    /// * `rng_seed` - Seed for the initial state
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: &str, rng_seed: u64) -> Result<WasmSketch, JsValue> {
        let config: SketchConfig = serde_json::from_str(config_json)
            .map_err(|e| JsValue::from_str(&format!("Invalid config JSON: {e}")))?;

        let sketch = Sketch::new(config, &Seed::new(rng_seed))
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

        Ok(WasmSketch { sketch })
    }

    /// Advance one frame.
    #[wasm_bindgen]
    pub fn frame(&mut self) {
        self.sketch.frame();
    }

    /// Set a named parameter; returns the value after clamping and snapping.
    #[wasm_bindgen(js_name = setParam)]
    pub fn set_param(&mut self, name: &str, value: f32) -> Result<f32, JsValue> {
        self.sketch
            .set_param(name, value)
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Update the pointer in normalized canvas coordinates.
    #[wasm_bindgen(js_name = setPointer)]
    pub fn set_pointer(&mut self, x: f32, y: f32, pressed: bool) {
        self.sketch.set_pointer(Pointer::new(x, y, pressed));
    }

    /// Colorized frame, ready for `new ImageData(rgba, width, height)`.
    #[wasm_bindgen]
    pub fn rgba(&self) -> js_sys::Uint8ClampedArray {
        js_sys::Uint8ClampedArray::from(self.sketch.rgba().as_slice())
    }

    /// Current statistics as JSON.
    #[wasm_bindgen(js_name = getStats)]
    pub fn get_stats(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.sketch.stats())
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {e}")))
    }

    #[wasm_bindgen(js_name = getFrame)]
    pub fn get_frame(&self) -> u64 {
        self.sketch.frame_count()
    }

    /// Canvas width in pixels.
    #[wasm_bindgen(getter)]
    pub fn width(&self) -> usize {
        self.sketch.canvas_size().0
    }

    /// Canvas height in pixels.
    #[wasm_bindgen(getter)]
    pub fn height(&self) -> usize {
        self.sketch.canvas_size().1
    }

    #[wasm_bindgen(getter)]
    pub fn name(&self) -> String {
        self.sketch.name().to_string()
    }
}

/// Default configuration for a sketch name as pretty JSON.
#[wasm_bindgen(js_name = defaultConfig)]
pub fn default_config(name: &str) -> Result<String, JsValue> {
    let config = SketchConfig::default_for(name)
        .ok_or_else(|| JsValue::from_str(&format!("Unknown sketch: {name}")))?;
    serde_json::to_string_pretty(&config)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {e}")))
}
