use domain::{DataType, DecodedPayload, Encoding};
use flate2::read::GzDecoder;
use serde_json::Value;
use std::borrow::Cow;
use std::io::Read;

/// 解码错误。
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("unsupported encoding: {0}")]
    UnsupportedEncoding(String),
    #[error("gzip error: {0}")]
    Gzip(String),
    #[error("invalid json: {0}")]
    Json(String),
    #[error("payload is not a json object")]
    NotAnObject,
    #[error("payload shape mismatch: {0}")]
    Shape(String),
}

/// 按编码标签把原始字节解析为 JSON 对象。
pub fn decode_payload(payload: &[u8], encoding: &str) -> Result<Value, DecodeError> {
    let encoding = Encoding::parse(encoding)
        .ok_or_else(|| DecodeError::UnsupportedEncoding(encoding.to_string()))?;
    let bytes: Cow<'_, [u8]> = match encoding {
        Encoding::Json => Cow::Borrowed(payload),
        Encoding::GzipJson => Cow::Owned(gunzip(payload)?),
    };
    let text = std::str::from_utf8(&bytes).map_err(|err| DecodeError::Json(err.to_string()))?;
    let text = replace_non_finite(text);
    let value: Value =
        serde_json::from_str(&text).map_err(|err| DecodeError::Json(err.to_string()))?;
    if !value.is_object() {
        return Err(DecodeError::NotAnObject);
    }
    Ok(value)
}

/// 解码并按数据类型做结构校验。
pub fn decode(
    payload: &[u8],
    encoding: &str,
    data_type: DataType,
) -> Result<DecodedPayload, DecodeError> {
    let value = decode_payload(payload, encoding)?;
    let decoded = DecodedPayload::from_value(data_type, value)
        .map_err(|err| DecodeError::Shape(err.to_string()))?;
    validate(&decoded)?;
    Ok(decoded)
}

fn validate(payload: &DecodedPayload) -> Result<(), DecodeError> {
    if let DecodedPayload::Dataseries(series) = payload {
        for (channel, values) in &series.data {
            if values.timestamps.len() != values.data.len() {
                return Err(DecodeError::Shape(format!(
                    "channel {} has {} timestamps and {} values",
                    channel,
                    values.timestamps.len(),
                    values.data.len()
                )));
            }
        }
    }
    Ok(())
}

fn gunzip(payload: &[u8]) -> Result<Vec<u8>, DecodeError> {
    let mut decoder = GzDecoder::new(payload);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(|err| DecodeError::Gzip(err.to_string()))?;
    Ok(out)
}

const NON_FINITE_TOKENS: [&str; 3] = ["-Infinity", "Infinity", "NaN"];

/// Python 发布端会写出 `NaN` / `Infinity`，serde_json 不接受，字符串外的这些记号替换为 `null`。
fn replace_non_finite(text: &str) -> Cow<'_, str> {
    if !text.contains("NaN") && !text.contains("Infinity") {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;
    let mut rest = text;
    while let Some(ch) = rest.chars().next() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
        } else if ch == '"' {
            in_string = true;
        } else if let Some(token) = NON_FINITE_TOKENS.iter().find(|token| rest.starts_with(**token)) {
            out.push_str("null");
            rest = &rest[token.len()..];
            continue;
        }
        out.push(ch);
        rest = &rest[ch.len_utf8()..];
    }
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::replace_non_finite;

    #[test]
    fn non_finite_tokens_become_null() {
        assert_eq!(
            replace_non_finite(r#"{"a":[1.0,NaN,-Infinity,Infinity]}"#),
            r#"{"a":[1.0,null,null,null]}"#
        );
    }

    #[test]
    fn non_finite_tokens_inside_strings_are_kept() {
        assert_eq!(
            replace_non_finite(r#"{"label":"NaN \"Infinity\"","v":NaN}"#),
            r#"{"label":"NaN \"Infinity\"","v":null}"#
        );
    }

    #[test]
    fn finite_text_is_borrowed() {
        let text = r#"{"a":1}"#;
        assert!(matches!(
            replace_non_finite(text),
            std::borrow::Cow::Borrowed(_)
        ));
    }
}
