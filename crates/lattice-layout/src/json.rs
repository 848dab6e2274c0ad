//! JSON text output shared by the store and the model.

use serde::Serialize;
use serde_json::ser::PrettyFormatter;

use crate::error::LayoutResult;

/// Serialize `value` as compact JSON, or tab-indented JSON when `pretty` is set.
pub(crate) fn to_json_string<T: Serialize + ?Sized>(value: &T, pretty: bool) -> LayoutResult<String> {
    if !pretty {
        return Ok(serde_json::to_string(value)?);
    }
    let mut buffer = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut buffer, PrettyFormatter::with_indent(b"\t"));
    value.serialize(&mut serializer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}
