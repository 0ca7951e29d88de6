//! Decode errors raised while reading records

use thiserror::Error;

/// Errors that abort decoding of the current record
///
/// End of input is never an error: decoders report it as `Ok(None)`.
/// Unknown line prefixes, unknown XML elements and repeated qualifiers are
/// tolerated and never produce an error.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// Reading or decompressing the underlying stream failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A line breaks a fixed-layout rule that cannot be skipped
    #[error("line {line}: {message}")]
    Structural { line: usize, message: String },

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("XML attribute error: {0}")]
    XmlAttribute(#[from] quick_xml::events::attributes::AttrError),

    /// A numeric attribute could not be parsed
    #[error("invalid value {value:?} for attribute '{attribute}' on <{element}>")]
    InvalidAttribute {
        element: String,
        attribute: String,
        value: String,
    },

    /// The document ended before the closing tag of an open element
    #[error("unexpected end of document inside <{0}>")]
    UnexpectedEof(String),
}

impl DecodeError {
    pub(crate) fn structural(line: usize, message: impl Into<String>) -> Self {
        Self::Structural {
            line,
            message: message.into(),
        }
    }
}

pub type DecodeResult<T> = std::result::Result<T, DecodeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structural_message_names_line() {
        let err = DecodeError::structural(42, "DEFINITION line shorter than 12 columns");
        assert_eq!(
            err.to_string(),
            "line 42: DEFINITION line shorter than 12 columns"
        );
    }

    #[test]
    fn test_invalid_attribute_message() {
        let err = DecodeError::InvalidAttribute {
            element: "sequence".to_string(),
            attribute: "length".to_string(),
            value: "12a".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid value \"12a\" for attribute 'length' on <sequence>"
        );
    }
}
