use std::str::FromStr;

use crate::{
    ops::Constant,
    registry::{ClassId, ClassRegistry},
    utils::Error,
    value::Value,
};

fn is_string_type(ty: &str) -> bool {
    matches!(ty, "string" | "String" | "java.lang.String")
}

impl Constant {
    pub fn string(value: impl Into<Value>) -> Self {
        Self {
            class: ClassId::STRING,
            value: value.into(),
        }
    }

    pub fn null(class: ClassId) -> Self {
        Self {
            class,
            value: Value::Null,
        }
    }

    /// Interprets `value` as a literal of type `ty` (a string when absent).
    ///
    /// Accepted types are the primitive names, `string`, and `null` whose
    /// value is then the class name of the null reference.
    pub fn parse(registry: &ClassRegistry, ty: Option<&str>, value: &str) -> Result<Constant, Error> {
        let invalid = |reason: String| Error::InvalidConstant {
            ty: ty.unwrap_or("String").to_string(),
            value: value.to_string(),
            reason,
        };
        fn number<T: FromStr>(value: &str) -> Result<T, String>
        where
            T::Err: std::fmt::Display,
        {
            value.trim().parse::<T>().map_err(|e| e.to_string())
        }

        let Some(ty) = ty.filter(|ty| !is_string_type(ty)) else {
            return Ok(Constant::string(value));
        };
        let (class, value) = match ty {
            "boolean" => (ClassId::BOOLEAN, Value::Boolean(value.trim().eq_ignore_ascii_case("true"))),
            "byte" => (ClassId::BYTE, Value::Byte(number(value).map_err(invalid)?)),
            "short" => (ClassId::SHORT, Value::Short(number(value).map_err(invalid)?)),
            "int" => (ClassId::INT, Value::Int(number(value).map_err(invalid)?)),
            "long" => (ClassId::LONG, Value::Long(number(value).map_err(invalid)?)),
            "float" => (ClassId::FLOAT, Value::Float(number(value).map_err(invalid)?)),
            "double" => (ClassId::DOUBLE, Value::Double(number(value).map_err(invalid)?)),
            "char" => {
                let mut chars = value.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => (ClassId::CHAR, Value::Char(c)),
                    _ => return Err(invalid("a char constant holds exactly one character".to_string())),
                }
            }
            "null" => {
                let class = registry.resolve(value)?;
                if registry.is_primitive(class) {
                    return Err(invalid("primitive types have no null value".to_string()));
                }
                (class, Value::Null)
            }
            _ => return Err(invalid("the type is neither a primitive, a string nor `null`".to_string())),
        };
        Ok(Constant { class, value })
    }

    /// Type and value strings emitted when serializing; a plain string
    /// has no type.
    pub(crate) fn serialized(&self, registry: &ClassRegistry) -> (Option<String>, String) {
        match &self.value {
            Value::Null => (Some("null".to_string()), registry.name(self.class)),
            Value::Str(value) => (None, value.to_string()),
            value => (Some(registry.name(self.class)), value.to_string()),
        }
    }
}
