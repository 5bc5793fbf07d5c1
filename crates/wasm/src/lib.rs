use phml_core::{CompileOptions, Source, compile_source};
use serde::Serialize;
use wasm_bindgen::JsValue;
use wasm_bindgen::prelude::*;

/// Name reported for templates handed over as text.
const INLINE_TEMPLATE_NAME: &str = "template.phml";

// ============================================================================
// Compiler Config
// ============================================================================

/// Configuration accepted by the WASM compile function.
/// Mirrors `phml_core::CompileOptions`.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct WasmCompilerConfig {
    #[serde(default)]
    pub cache: Option<bool>,
}

impl WasmCompilerConfig {
    fn to_options(&self) -> CompileOptions {
        CompileOptions {
            cache: self.cache.unwrap_or(false),
        }
    }
}

/// `undefined` and `null` select the defaults; anything else must deserialize.
fn parse_config(config: JsValue) -> Result<WasmCompilerConfig, JsError> {
    if config.is_undefined() || config.is_null() {
        return Ok(WasmCompilerConfig::default());
    }
    serde_wasm_bindgen::from_value(config)
        .map_err(|e| JsError::new(&format!("Invalid config: {}", e)))
}

// ============================================================================
// Compile API Types
// ============================================================================

/// Non-fatal warning raised while compiling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WarningEntry {
    /// Line the warning points at (1-indexed).
    pub line: usize,
    /// Human-readable message.
    pub message: String,
}

/// Result of compiling a template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompileResult {
    /// Compiled PHP/HTML.
    pub code: String,
    /// Warnings for lines that fell back to text or raw code.
    pub warnings: Vec<WarningEntry>,
}

/// Compiles template text without going through JS values.
pub fn compile_template(source: &str, options: &CompileOptions) -> Result<CompileResult, String> {
    let output = compile_source(&Source::inline(INLINE_TEMPLATE_NAME, source), options)
        .map_err(|e| format!("Compile error: {}", e))?;

    let warnings = output
        .diagnostics
        .warnings
        .iter()
        .map(|w| WarningEntry {
            line: w.line(),
            message: w.to_string(),
        })
        .collect();

    Ok(CompileResult {
        code: output.code,
        warnings,
    })
}

// ============================================================================
// Compile API
// ============================================================================

/// Compiles a phml template into PHP/HTML.
///
/// # Arguments
///
/// * `source` - The template text
/// * `config` - Optional compiler configuration (JsValue), e.g. `{ cache: false }`
///
/// # Returns
///
/// Returns a `CompileResult` object `{ code, warnings }`; indentation errors
/// are thrown as JS errors naming the offending line, and a config that does
/// not match `{ cache?: boolean }` is thrown as an "Invalid config" error.
///
/// # Example (JavaScript)
///
/// ```javascript
/// import { compile } from './phml_wasm';
///
/// const { code } = compile("%div\n  %p foo");
/// // code === "<div>\n  <p>foo</p>\n</div>"
/// ```
#[wasm_bindgen]
pub fn compile(source: &str, config: JsValue) -> Result<JsValue, JsError> {
    let cfg = parse_config(config)?;
    let result = compile_template(source, &cfg.to_options()).map_err(|e| JsError::new(&e))?;

    serde_wasm_bindgen::to_value(&result)
        .map_err(|e| JsError::new(&format!("Serialization error: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compiles_nested_template() {
        let result = compile_template("%div\n  %p foo", &CompileOptions::default()).unwrap();
        assert_eq!(result.code, "<div>\n  <p>foo</p>\n</div>");
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn reports_warnings_with_lines() {
        let result = compile_template("%p ok\n%p!bad", &CompileOptions::default()).unwrap();
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].line, 2);
    }

    #[test]
    fn errors_name_the_line() {
        let err = compile_template("%div\n    %p bad", &CompileOptions::default()).unwrap_err();
        assert_eq!(err, "Compile error: invalid indentation on line 2");
    }

    #[test]
    fn config_defaults_to_no_cache() {
        assert_eq!(
            WasmCompilerConfig::default().to_options(),
            CompileOptions { cache: false }
        );
    }
}
