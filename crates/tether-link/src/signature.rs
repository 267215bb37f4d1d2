// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Typed model of the JNI name-and-signature calling convention.
//
// Remote methods are addressed by (slash-separated class name, method name,
// type signature string). The signature grammar is the JVM's: single letters
// for primitives, `Lpkg/Class;` for objects, `[` prefixes for arrays, the
// return type after the closing paren — `"(JI)V"` takes a long and an int
// and returns void. Widths declared here are preserved exactly across the
// boundary; there is no implicit narrowing anywhere in this module.

use tether_core::error::{Result, TetherError};

/// A Java type as it appears in a method signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JavaType {
    Boolean,
    Byte,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
    Void,
    /// Fully-qualified, slash-separated class name (`java/lang/String`).
    Object(String),
    Array(Box<JavaType>),
}

impl JavaType {
    /// Shorthand for the ubiquitous `java/lang/String`.
    pub fn string() -> Self {
        Self::Object("java/lang/String".into())
    }

    /// Render this type in signature form.
    pub fn render(&self) -> String {
        match self {
            Self::Boolean => "Z".into(),
            Self::Byte => "B".into(),
            Self::Char => "C".into(),
            Self::Short => "S".into(),
            Self::Int => "I".into(),
            Self::Long => "J".into(),
            Self::Float => "F".into(),
            Self::Double => "D".into(),
            Self::Void => "V".into(),
            Self::Object(name) => format!("L{name};"),
            Self::Array(elem) => format!("[{}", elem.render()),
        }
    }
}

/// A full method signature: argument types and return type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSig {
    pub args: Vec<JavaType>,
    pub ret: JavaType,
}

impl MethodSig {
    pub fn new(args: Vec<JavaType>, ret: JavaType) -> Self {
        Self { args, ret }
    }

    /// Render to the wire form, e.g. `(JI)V`.
    pub fn render(&self) -> String {
        let mut out = String::from("(");
        for arg in &self.args {
            out.push_str(&arg.render());
        }
        out.push(')');
        out.push_str(&self.ret.render());
        out
    }

    /// Parse a wire-form signature string. The inverse of [`render`]:
    /// `parse(s).render() == s` for every well-formed `s`.
    pub fn parse(signature: &str) -> Result<Self> {
        let malformed = |reason: &str| TetherError::MalformedSignature {
            signature: signature.to_owned(),
            reason: reason.to_owned(),
        };

        let mut chars = signature.chars().peekable();
        if chars.next() != Some('(') {
            return Err(malformed("missing opening paren"));
        }

        let mut args = Vec::new();
        loop {
            match chars.peek() {
                Some(')') => {
                    chars.next();
                    break;
                }
                Some(_) => args.push(Self::parse_one(&mut chars, signature)?),
                None => return Err(malformed("unterminated argument list")),
            }
        }

        let ret = Self::parse_one(&mut chars, signature)?;
        if chars.next().is_some() {
            return Err(malformed("trailing characters after return type"));
        }
        Ok(Self { args, ret })
    }

    fn parse_one(
        chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
        signature: &str,
    ) -> Result<JavaType> {
        let malformed = |reason: &str| TetherError::MalformedSignature {
            signature: signature.to_owned(),
            reason: reason.to_owned(),
        };

        match chars.next() {
            Some('Z') => Ok(JavaType::Boolean),
            Some('B') => Ok(JavaType::Byte),
            Some('C') => Ok(JavaType::Char),
            Some('S') => Ok(JavaType::Short),
            Some('I') => Ok(JavaType::Int),
            Some('J') => Ok(JavaType::Long),
            Some('F') => Ok(JavaType::Float),
            Some('D') => Ok(JavaType::Double),
            Some('V') => Ok(JavaType::Void),
            Some('L') => {
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some(';') => break,
                        Some(c) => name.push(c),
                        None => return Err(malformed("unterminated object type")),
                    }
                }
                if name.is_empty() {
                    return Err(malformed("empty object type"));
                }
                Ok(JavaType::Object(name))
            }
            Some('[') => Ok(JavaType::Array(Box::new(Self::parse_one(chars, signature)?))),
            Some(c) => Err(malformed(&format!("unknown type letter {c:?}"))),
            None => Err(malformed("missing type")),
        }
    }
}

/// A typed argument crossing the boundary, native → peer.
///
/// Each variant carries the exact width its signature letter declares.
#[derive(Debug, Clone, PartialEq)]
pub enum CallArg {
    Bool(bool),
    Byte(i8),
    Char(u16),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    /// Converted to a temporary peer-owned string reference for the duration
    /// of the call and released afterwards.
    Str(String),
}

impl CallArg {
    /// The signature type this argument satisfies.
    pub fn java_type(&self) -> JavaType {
        match self {
            Self::Bool(_) => JavaType::Boolean,
            Self::Byte(_) => JavaType::Byte,
            Self::Char(_) => JavaType::Char,
            Self::Short(_) => JavaType::Short,
            Self::Int(_) => JavaType::Int,
            Self::Long(_) => JavaType::Long,
            Self::Float(_) => JavaType::Float,
            Self::Double(_) => JavaType::Double,
            Self::Str(_) => JavaType::string(),
        }
    }
}

/// A typed result crossing the boundary, peer → native.
#[derive(Debug, Clone, PartialEq)]
pub enum CallValue {
    Void,
    Bool(bool),
    Byte(i8),
    Char(u16),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    /// `None` is a null reference on the peer side.
    Str(Option<String>),
}

impl CallValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Long(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f32(&self) -> Option<f32> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Double(v) => Some(*v),
            _ => None,
        }
    }

    pub fn into_string(self) -> Option<String> {
        match self {
            Self::Str(s) => s,
            _ => None,
        }
    }
}

/// Verify that `args` satisfies `sig` exactly — same arity, same declared
/// type per position. A `Long` against an `I` slot is a mismatch, not a
/// narrowing opportunity.
pub fn check_args(method: &str, sig: &MethodSig, args: &[CallArg]) -> Result<()> {
    if sig.args.len() != args.len() {
        return Err(TetherError::SignatureMismatch {
            method: method.to_owned(),
            reason: format!("expected {} arguments, got {}", sig.args.len(), args.len()),
        });
    }
    for (i, (want, got)) in sig.args.iter().zip(args).enumerate() {
        let got_ty = got.java_type();
        if *want != got_ty {
            return Err(TetherError::SignatureMismatch {
                method: method.to_owned(),
                reason: format!(
                    "argument {i} declared {} but value is {}",
                    want.render(),
                    got_ty.render()
                ),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_primitive_signature() {
        let sig = MethodSig::new(vec![JavaType::Long, JavaType::Int], JavaType::Void);
        assert_eq!(sig.render(), "(JI)V");
    }

    #[test]
    fn renders_object_and_array_signature() {
        let sig = MethodSig::new(
            vec![
                JavaType::string(),
                JavaType::Array(Box::new(JavaType::Float)),
            ],
            JavaType::Object("android/content/Intent".into()),
        );
        assert_eq!(sig.render(), "(Ljava/lang/String;[F)Landroid/content/Intent;");
    }

    #[test]
    fn parse_is_inverse_of_render() {
        for s in [
            "()V",
            "(JI)V",
            "(JDDDFFFJ)V",
            "(Ljava/lang/String;I)Landroid/content/SharedPreferences;",
            "([B[[Ljava/lang/String;)Z",
            "(ZBCSIJFD)J",
        ] {
            let sig = MethodSig::parse(s).unwrap();
            assert_eq!(sig.render(), s, "round trip failed for {s}");
        }
    }

    #[test]
    fn parse_rejects_malformed() {
        for s in ["", "JI)V", "(JI", "(JI)", "(Q)V", "(Ljava/lang/String)V", "(J)VX"] {
            assert!(MethodSig::parse(s).is_err(), "accepted malformed {s:?}");
        }
    }

    #[test]
    fn check_args_accepts_exact_match() {
        let sig = MethodSig::parse("(JI)V").unwrap();
        assert!(check_args("post", &sig, &[CallArg::Long(i64::MAX), CallArg::Int(-1)]).is_ok());
    }

    #[test]
    fn check_args_rejects_narrowing() {
        // A long value against an int slot must fail — widths are exact.
        let sig = MethodSig::parse("(I)V").unwrap();
        let err = check_args("setLevel", &sig, &[CallArg::Long(1)]).unwrap_err();
        assert!(matches!(err, TetherError::SignatureMismatch { .. }));

        // And the reverse: an int against a long slot.
        let sig = MethodSig::parse("(J)V").unwrap();
        assert!(check_args("setTime", &sig, &[CallArg::Int(1)]).is_err());
    }

    #[test]
    fn check_args_rejects_arity_mismatch() {
        let sig = MethodSig::parse("(JI)V").unwrap();
        assert!(check_args("post", &sig, &[CallArg::Long(1)]).is_err());
        assert!(check_args("post", &sig, &[]).is_err());
    }

    #[test]
    fn long_width_is_preserved() {
        // The value the façade would marshal must come back bit-identical.
        for v in [0i64, -1, i64::MIN, i64::MAX, 0x0123_4567_89ab_cdef] {
            let arg = CallArg::Long(v);
            assert_eq!(arg.java_type(), JavaType::Long);
            match arg {
                CallArg::Long(back) => assert_eq!(back, v),
                _ => unreachable!(),
            }
            assert_eq!(CallValue::Long(v).as_i64(), Some(v));
        }
    }

    #[test]
    fn call_value_accessors_are_type_strict() {
        assert_eq!(CallValue::Int(3).as_i64(), None);
        assert_eq!(CallValue::Long(3).as_i32(), None);
        assert_eq!(CallValue::Bool(true).as_bool(), Some(true));
        assert_eq!(CallValue::Str(Some("x".into())).into_string(), Some("x".into()));
        assert_eq!(CallValue::Str(None).into_string(), None);
    }
}
