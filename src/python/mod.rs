mod bindings;

use crate::core::CL100K_BASE_PATTERN;
pub use bindings::{PyStreamingDecoder, PyTokenizer};

use pyo3::prelude::*;

/// splitbpe - rank-based BPE tokenizer with Python bindings
///
/// - Arena-linked merge engine with cached pair ranks
/// - Regex pre-splitting (cl100k_base pattern by default)
/// - tiktoken vocabulary files
/// - UTF-8 streaming decoder for LLM output
#[pymodule]
fn _core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyTokenizer>()?;
    m.add_class::<PyStreamingDecoder>()?;
    m.add("CL100K_BASE_PATTERN", CL100K_BASE_PATTERN)?;
    Ok(())
}
