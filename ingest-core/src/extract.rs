//! Safe navigation of partially-missing JSON payloads.
//!
//! The OpenWeather response omits fields freely, so the normalizer never
//! indexes into the raw value directly. A lookup walks the path one segment
//! at a time and gives up with `None` as soon as a segment is absent or the
//! current value has the wrong shape.

use serde_json::Value;

/// One step of a lookup path: an object key or a sequence index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathSeg<'a> {
    Key(&'a str),
    Index(usize),
}

/// Walk `path` from `root`. Returns `None` on the first segment that does
/// not resolve; never panics on missing or mistyped data.
pub fn extract<'a>(root: &'a Value, path: &[PathSeg<'_>]) -> Option<&'a Value> {
    let mut current = root;

    for seg in path {
        current = match seg {
            PathSeg::Key(key) => current.as_object()?.get(*key)?,
            PathSeg::Index(ix) => current.as_array()?.get(*ix)?,
        };
    }

    Some(current)
}

pub fn extract_f64(root: &Value, path: &[PathSeg<'_>]) -> Option<f64> {
    extract(root, path).and_then(Value::as_f64)
}

pub fn extract_i64(root: &Value, path: &[PathSeg<'_>]) -> Option<i64> {
    extract(root, path).and_then(Value::as_i64)
}

pub fn extract_str<'a>(root: &'a Value, path: &[PathSeg<'_>]) -> Option<&'a str> {
    extract(root, path).and_then(Value::as_str)
}
