//! Type descriptors and method keys
//!
//! Types are written in class-file descriptor syntax:
//!
//! ```text
//! Z boolean   B byte   C char   S short   I int
//! J long      F float  D double V void (return only)
//! Ljava/lang/String;   object type
//! [I                   array of int
//! (ILjava/lang/String;)V   method taking (int, String) returning void
//! ```
//!
//! A [`MethodKey`] is the method name followed by its full descriptor. Two
//! methods dispatch to the same slot iff their keys are equal, so overloads
//! that differ in argument list or return type never collide.

use std::fmt;

use crate::value::Value;

/// Descriptor parse errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DescriptorError {
    /// Input ended in the middle of a type
    #[error("Unexpected end of descriptor '{0}'")]
    UnexpectedEnd(String),

    /// Unknown type character
    #[error("Invalid type character '{found}' at offset {offset} in '{descriptor}'")]
    InvalidChar {
        /// Full descriptor being parsed
        descriptor: String,
        /// Offending character
        found: char,
        /// Byte offset of the character
        offset: usize,
    },

    /// `V` used somewhere other than a method return type
    #[error("void is only valid as a return type in '{0}'")]
    MisplacedVoid(String),

    /// Characters left over after a complete descriptor
    #[error("Trailing characters in descriptor '{0}'")]
    Trailing(String),

    /// Method descriptor does not start with `(`
    #[error("Method descriptor '{0}' must start with '('")]
    MissingParams(String),
}

/// A single field, argument or return type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeDescriptor {
    /// `Z`
    Boolean,
    /// `B`
    Byte,
    /// `C`
    Char,
    /// `S`
    Short,
    /// `I`
    Int,
    /// `J`
    Long,
    /// `F`
    Float,
    /// `D`
    Double,
    /// `V`
    Void,
    /// `L<internal name>;`
    Object(String),
    /// `[<element>`
    Array(Box<TypeDescriptor>),
}

impl TypeDescriptor {
    /// Object type from an internal class name (`java/lang/String`)
    pub fn object(class_name: impl Into<String>) -> Self {
        TypeDescriptor::Object(class_name.into())
    }

    /// Array type with the given element type
    pub fn array(element: TypeDescriptor) -> Self {
        TypeDescriptor::Array(Box::new(element))
    }

    /// Parse a field descriptor such as `I` or `Ljava/io/PrintStream;`
    pub fn parse(descriptor: &str) -> Result<Self, DescriptorError> {
        let (ty, end) = parse_type(descriptor, 0)?;
        if ty == TypeDescriptor::Void {
            return Err(DescriptorError::MisplacedVoid(descriptor.to_string()));
        }
        if end != descriptor.len() {
            return Err(DescriptorError::Trailing(descriptor.to_string()));
        }
        Ok(ty)
    }

    /// True for object and array types
    pub fn is_reference(&self) -> bool {
        matches!(self, TypeDescriptor::Object(_) | TypeDescriptor::Array(_))
    }

    /// Initial value of a freshly allocated field of this type
    pub fn default_value(&self) -> Value {
        match self {
            TypeDescriptor::Boolean
            | TypeDescriptor::Byte
            | TypeDescriptor::Char
            | TypeDescriptor::Short
            | TypeDescriptor::Int => Value::Int(0),
            TypeDescriptor::Long => Value::Long(0),
            TypeDescriptor::Float => Value::Float(0.0),
            TypeDescriptor::Double => Value::Double(0.0),
            TypeDescriptor::Void | TypeDescriptor::Object(_) | TypeDescriptor::Array(_) => {
                Value::Null
            }
        }
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDescriptor::Boolean => f.write_str("Z"),
            TypeDescriptor::Byte => f.write_str("B"),
            TypeDescriptor::Char => f.write_str("C"),
            TypeDescriptor::Short => f.write_str("S"),
            TypeDescriptor::Int => f.write_str("I"),
            TypeDescriptor::Long => f.write_str("J"),
            TypeDescriptor::Float => f.write_str("F"),
            TypeDescriptor::Double => f.write_str("D"),
            TypeDescriptor::Void => f.write_str("V"),
            TypeDescriptor::Object(name) => write!(f, "L{};", name),
            TypeDescriptor::Array(element) => write!(f, "[{}", element),
        }
    }
}

/// Parse one type starting at `pos`, returning it and the offset just past it.
fn parse_type(descriptor: &str, pos: usize) -> Result<(TypeDescriptor, usize), DescriptorError> {
    let bytes = descriptor.as_bytes();
    let Some(&c) = bytes.get(pos) else {
        return Err(DescriptorError::UnexpectedEnd(descriptor.to_string()));
    };

    let ty = match c {
        b'Z' => TypeDescriptor::Boolean,
        b'B' => TypeDescriptor::Byte,
        b'C' => TypeDescriptor::Char,
        b'S' => TypeDescriptor::Short,
        b'I' => TypeDescriptor::Int,
        b'J' => TypeDescriptor::Long,
        b'F' => TypeDescriptor::Float,
        b'D' => TypeDescriptor::Double,
        b'V' => TypeDescriptor::Void,
        b'L' => {
            let rest = &descriptor[pos + 1..];
            let len = rest
                .find(';')
                .ok_or_else(|| DescriptorError::UnexpectedEnd(descriptor.to_string()))?;
            if len == 0 {
                return Err(DescriptorError::InvalidChar {
                    descriptor: descriptor.to_string(),
                    found: ';',
                    offset: pos + 1,
                });
            }
            return Ok((
                TypeDescriptor::Object(rest[..len].to_string()),
                pos + 1 + len + 1,
            ));
        }
        b'[' => {
            let (element, end) = parse_type(descriptor, pos + 1)?;
            if element == TypeDescriptor::Void {
                return Err(DescriptorError::MisplacedVoid(descriptor.to_string()));
            }
            return Ok((TypeDescriptor::array(element), end));
        }
        _ => {
            return Err(DescriptorError::InvalidChar {
                descriptor: descriptor.to_string(),
                found: descriptor[pos..].chars().next().unwrap_or('?'),
                offset: pos,
            })
        }
    };
    Ok((ty, pos + 1))
}

/// Argument and return types of a method
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodDescriptor {
    params: Vec<TypeDescriptor>,
    ret: TypeDescriptor,
}

impl MethodDescriptor {
    /// Create a descriptor from argument types and a return type
    pub fn new(params: Vec<TypeDescriptor>, ret: TypeDescriptor) -> Self {
        Self { params, ret }
    }

    /// Parse a method descriptor such as `(ILjava/lang/String;)V`
    pub fn parse(descriptor: &str) -> Result<Self, DescriptorError> {
        if !descriptor.starts_with('(') {
            return Err(DescriptorError::MissingParams(descriptor.to_string()));
        }

        let mut params = Vec::new();
        let mut pos = 1;
        loop {
            match descriptor.as_bytes().get(pos) {
                Some(b')') => break,
                Some(_) => {
                    let (ty, end) = parse_type(descriptor, pos)?;
                    if ty == TypeDescriptor::Void {
                        return Err(DescriptorError::MisplacedVoid(descriptor.to_string()));
                    }
                    params.push(ty);
                    pos = end;
                }
                None => return Err(DescriptorError::UnexpectedEnd(descriptor.to_string())),
            }
        }

        let (ret, end) = parse_type(descriptor, pos + 1)?;
        if end != descriptor.len() {
            return Err(DescriptorError::Trailing(descriptor.to_string()));
        }
        Ok(Self { params, ret })
    }

    /// Argument types in declaration order
    pub fn params(&self) -> &[TypeDescriptor] {
        &self.params
    }

    /// Return type
    pub fn return_type(&self) -> &TypeDescriptor {
        &self.ret
    }

    /// Whether the method pushes a result
    pub fn returns_value(&self) -> bool {
        self.ret != TypeDescriptor::Void
    }
}

impl fmt::Display for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for param in &self.params {
            write!(f, "{}", param)?;
        }
        write!(f, "){}", self.ret)
    }
}

/// Dispatch identity of a method: name plus full descriptor
///
/// Rendered as `nextInt(I)I`. Method names never contain `(`, so the split
/// between name and descriptor is unambiguous.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MethodKey {
    key: String,
    name_len: usize,
}

impl MethodKey {
    /// Key for `name` with the given descriptor
    pub fn new(name: &str, descriptor: &MethodDescriptor) -> Self {
        Self {
            key: format!("{}{}", name, descriptor),
            name_len: name.len(),
        }
    }

    /// Key from a name and an unparsed descriptor string
    ///
    /// The descriptor is parsed and re-rendered so the result is equal to the
    /// key a registrar computed for the same signature.
    pub fn parse(name: &str, descriptor: &str) -> Result<Self, DescriptorError> {
        Ok(Self::new(name, &MethodDescriptor::parse(descriptor)?))
    }

    /// Method name part
    pub fn name(&self) -> &str {
        &self.key[..self.name_len]
    }

    /// Descriptor part
    pub fn descriptor(&self) -> &str {
        &self.key[self.name_len..]
    }

    /// Full key text
    pub fn as_str(&self) -> &str {
        &self.key
    }
}

impl fmt::Display for MethodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn string_type() -> TypeDescriptor {
        TypeDescriptor::object("java/lang/String")
    }

    #[test]
    fn test_type_display() {
        assert_eq!(TypeDescriptor::Int.to_string(), "I");
        assert_eq!(string_type().to_string(), "Ljava/lang/String;");
        assert_eq!(
            TypeDescriptor::array(TypeDescriptor::array(TypeDescriptor::Char)).to_string(),
            "[[C"
        );
    }

    #[test]
    fn test_method_descriptor_display() {
        let desc = MethodDescriptor::new(
            vec![TypeDescriptor::Int, string_type()],
            TypeDescriptor::Void,
        );
        assert_eq!(desc.to_string(), "(ILjava/lang/String;)V");
        assert!(!desc.returns_value());
    }

    #[test]
    fn test_parse_method_descriptor() {
        let desc = MethodDescriptor::parse("([Ljava/lang/String;JZ)Ljava/lang/Object;").unwrap();
        assert_eq!(
            desc.params(),
            &[
                TypeDescriptor::array(string_type()),
                TypeDescriptor::Long,
                TypeDescriptor::Boolean
            ]
        );
        assert_eq!(desc.return_type(), &TypeDescriptor::object("java/lang/Object"));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(matches!(
            MethodDescriptor::parse("I)V"),
            Err(DescriptorError::MissingParams(_))
        ));
        assert!(matches!(
            MethodDescriptor::parse("(V)V"),
            Err(DescriptorError::MisplacedVoid(_))
        ));
        assert!(matches!(
            MethodDescriptor::parse("(I"),
            Err(DescriptorError::UnexpectedEnd(_))
        ));
        assert!(matches!(
            MethodDescriptor::parse("(Ljava/lang/String)V"),
            Err(DescriptorError::UnexpectedEnd(_))
        ));
        assert!(matches!(
            MethodDescriptor::parse("(I)VV"),
            Err(DescriptorError::Trailing(_))
        ));
        assert!(matches!(
            TypeDescriptor::parse("Q"),
            Err(DescriptorError::InvalidChar { found: 'Q', .. })
        ));
        assert!(matches!(
            TypeDescriptor::parse("V"),
            Err(DescriptorError::MisplacedVoid(_))
        ));
    }

    #[test]
    fn test_key_is_pure() {
        let desc = MethodDescriptor::new(vec![TypeDescriptor::Int], TypeDescriptor::Int);
        assert_eq!(MethodKey::new("nextInt", &desc), MethodKey::new("nextInt", &desc));
        assert_eq!(MethodKey::new("nextInt", &desc).as_str(), "nextInt(I)I");
    }

    #[test]
    fn test_overloads_have_distinct_keys() {
        let no_args = MethodDescriptor::new(vec![], TypeDescriptor::Int);
        let bounded = MethodDescriptor::new(vec![TypeDescriptor::Int], TypeDescriptor::Int);
        let print_char = MethodDescriptor::new(vec![TypeDescriptor::Char], TypeDescriptor::Void);
        let print_int = MethodDescriptor::new(vec![TypeDescriptor::Int], TypeDescriptor::Void);

        assert_ne!(MethodKey::new("nextInt", &no_args), MethodKey::new("nextInt", &bounded));
        assert_ne!(MethodKey::new("print", &print_char), MethodKey::new("print", &print_int));
    }

    #[test]
    fn test_return_type_is_part_of_key() {
        let returns_int = MethodDescriptor::new(vec![], TypeDescriptor::Int);
        let returns_long = MethodDescriptor::new(vec![], TypeDescriptor::Long);
        assert_ne!(MethodKey::new("next", &returns_int), MethodKey::new("next", &returns_long));
    }

    #[test]
    fn test_parsed_key_matches_built_key() {
        let built = MethodKey::new(
            "println",
            &MethodDescriptor::new(vec![string_type()], TypeDescriptor::Void),
        );
        let parsed = MethodKey::parse("println", "(Ljava/lang/String;)V").unwrap();
        assert_eq!(built, parsed);
        assert_eq!(parsed.name(), "println");
        assert_eq!(parsed.descriptor(), "(Ljava/lang/String;)V");
    }
}
