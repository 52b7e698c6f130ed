use super::error::{TupleError, TupleResult};

/// On-disk length of a STRING field: 4-byte length prefix plus payload
pub const STRING_LEN: usize = 128;

/// Maximum payload bytes a STRING field can carry
pub const MAX_STRING_BYTES: usize = STRING_LEN - 4;

/// Represents a column data type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    /// 4 bytes, big-endian, two's complement
    Int,
    /// 4-byte big-endian length followed by payload, zero-padded to 128 bytes
    Str,
}

impl FieldType {
    /// Get the on-disk size in bytes for this field type
    pub fn size(&self) -> usize {
        match self {
            FieldType::Int => 4,
            FieldType::Str => STRING_LEN,
        }
    }

    /// Parse a field value from its on-disk encoding
    pub fn parse(&self, bytes: &[u8]) -> TupleResult<Field> {
        if bytes.len() != self.size() {
            return Err(TupleError::Deserialization(format!(
                "Expected {} bytes for {:?}, got {}",
                self.size(),
                self,
                bytes.len()
            )));
        }

        match self {
            FieldType::Int => {
                let mut buf = [0u8; 4];
                buf.copy_from_slice(bytes);
                Ok(Field::Int(i32::from_be_bytes(buf)))
            }
            FieldType::Str => {
                let mut buf = [0u8; 4];
                buf.copy_from_slice(&bytes[..4]);
                let n = i32::from_be_bytes(buf);
                if n < 0 || n as usize > MAX_STRING_BYTES {
                    return Err(TupleError::Deserialization(format!(
                        "String length {} out of range",
                        n
                    )));
                }
                let s = String::from_utf8(bytes[4..4 + n as usize].to_vec())
                    .map_err(|e| TupleError::Deserialization(format!("Invalid UTF-8: {}", e)))?;
                Ok(Field::Str(s))
            }
        }
    }
}

/// Represents a single column value
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Field {
    Int(i32),
    Str(String),
}

impl Field {
    /// Get the type of this field
    pub fn field_type(&self) -> FieldType {
        match self {
            Field::Int(_) => FieldType::Int,
            Field::Str(_) => FieldType::Str,
        }
    }

    /// Serialize this field to its on-disk encoding
    pub fn to_bytes(&self) -> TupleResult<Vec<u8>> {
        match self {
            Field::Int(i) => Ok(i.to_be_bytes().to_vec()),
            Field::Str(s) => {
                let bytes = s.as_bytes();
                if bytes.len() > MAX_STRING_BYTES {
                    return Err(TupleError::Serialization(format!(
                        "String length {} exceeds max length {}",
                        bytes.len(),
                        MAX_STRING_BYTES
                    )));
                }
                let mut result = Vec::with_capacity(STRING_LEN);
                result.extend_from_slice(&(bytes.len() as i32).to_be_bytes());
                result.extend_from_slice(bytes);
                result.resize(STRING_LEN, 0);
                Ok(result)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_type_size() {
        assert_eq!(FieldType::Int.size(), 4);
        assert_eq!(FieldType::Str.size(), 128);
    }

    #[test]
    fn test_int_round_trip() {
        for v in [0, 1, -1, 42, i32::MIN, i32::MAX] {
            let field = Field::Int(v);
            let bytes = field.to_bytes().unwrap();
            assert_eq!(bytes.len(), 4);
            assert_eq!(FieldType::Int.parse(&bytes).unwrap(), field);
        }
    }

    #[test]
    fn test_int_is_big_endian() {
        let bytes = Field::Int(1).to_bytes().unwrap();
        assert_eq!(bytes, vec![0, 0, 0, 1]);
    }

    #[test]
    fn test_string_round_trip() {
        let field = Field::Str("hello".to_string());
        let bytes = field.to_bytes().unwrap();
        assert_eq!(bytes.len(), STRING_LEN);
        assert_eq!(&bytes[..4], &[0, 0, 0, 5]);
        assert_eq!(&bytes[4..9], b"hello");
        assert!(bytes[9..].iter().all(|&b| b == 0));
        assert_eq!(FieldType::Str.parse(&bytes).unwrap(), field);
    }

    #[test]
    fn test_empty_string_round_trip() {
        let field = Field::Str(String::new());
        let bytes = field.to_bytes().unwrap();
        assert_eq!(FieldType::Str.parse(&bytes).unwrap(), field);
    }

    #[test]
    fn test_string_too_long() {
        let field = Field::Str("x".repeat(MAX_STRING_BYTES + 1));
        assert!(field.to_bytes().is_err());
    }

    #[test]
    fn test_parse_bad_length_prefix() {
        let mut bytes = vec![0u8; STRING_LEN];
        bytes[..4].copy_from_slice(&(MAX_STRING_BYTES as i32 + 1).to_be_bytes());
        assert!(FieldType::Str.parse(&bytes).is_err());

        bytes[..4].copy_from_slice(&(-1i32).to_be_bytes());
        assert!(FieldType::Str.parse(&bytes).is_err());
    }

    #[test]
    fn test_parse_wrong_slice_length() {
        assert!(FieldType::Int.parse(&[0, 0, 0]).is_err());
        assert!(FieldType::Str.parse(&[0u8; 4]).is_err());
    }
}
