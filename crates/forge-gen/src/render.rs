//! Source synthesis
//!
//! Rendering is the opaque capability that turns a validated request into
//! source text. The emitted form is a pretty-printed unit manifest;
//! loaders parse it back at integration time. Rendering is deterministic:
//! the same request always yields byte-identical source.

use forge_artifact::{GenerationRequest, ManifestBody, UnitManifest};

/// Render source text for a validated request
///
/// # Errors
/// Returns the underlying serialization error; with well-formed requests
/// this does not occur in practice.
pub fn render_source(request: &GenerationRequest) -> Result<String, serde_json::Error> {
    let manifest = UnitManifest::new(
        request.target_path.clone(),
        request.description.clone(),
        ManifestBody::from(&request.payload),
    );
    let mut source = serde_json::to_string_pretty(&manifest)?;
    source.push('\n');
    Ok(source)
}
