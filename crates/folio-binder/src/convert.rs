//! Text/value converters.
//!
//! A converter turns the raw text of one request parameter into a typed
//! field value and back. Converters never see absent parameters: the binder
//! keeps the current field value when a parameter is missing.

use std::marker::PhantomData;

use crate::error::ConversionError;

/// Pluggable text/value strategy for one field type.
pub trait Converter: Send + Sync + 'static {
    /// Field type produced by this converter.
    type Value;

    /// Convert submitted text into a value.
    fn from_text(&self, text: &str) -> Result<Self::Value, ConversionError>;

    /// Render a value back into text.
    fn to_text(&self, value: &Self::Value) -> String;
}

/// Types with a built-in converter.
///
/// Used by `#[derive(Command)]` when a field does not name a converter.
pub trait Convertible: Sized {
    /// Default converter for this type.
    type Converter: Converter<Value = Self> + Default;
}

/// Converts `i32` values. Surrounding whitespace is rejected.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntegerConverter;

impl Converter for IntegerConverter {
    type Value = i32;

    fn from_text(&self, text: &str) -> Result<i32, ConversionError> {
        text.parse::<i32>()
            .map_err(|_| ConversionError::InvalidValue {
                expected: "integer",
                value: text.to_string(),
            })
    }

    fn to_text(&self, value: &i32) -> String {
        value.to_string()
    }
}

/// Converts `i64` values.
#[derive(Debug, Clone, Copy, Default)]
pub struct LongConverter;

impl Converter for LongConverter {
    type Value = i64;

    fn from_text(&self, text: &str) -> Result<i64, ConversionError> {
        text.parse::<i64>()
            .map_err(|_| ConversionError::InvalidValue {
                expected: "long",
                value: text.to_string(),
            })
    }

    fn to_text(&self, value: &i64) -> String {
        value.to_string()
    }
}

/// Converts `bool` values.
///
/// Accepts `true`/`false`, `on`/`off`, `yes`/`no` and `1`/`0`, ignoring case.
#[derive(Debug, Clone, Copy, Default)]
pub struct BooleanConverter;

impl Converter for BooleanConverter {
    type Value = bool;

    fn from_text(&self, text: &str) -> Result<bool, ConversionError> {
        match text.trim().to_ascii_lowercase().as_str() {
            "true" | "on" | "yes" | "1" => Ok(true),
            "false" | "off" | "no" | "0" => Ok(false),
            _ => Err(ConversionError::InvalidValue {
                expected: "boolean",
                value: text.to_string(),
            }),
        }
    }

    fn to_text(&self, value: &bool) -> String {
        value.to_string()
    }
}

/// Passes text through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringConverter;

impl Converter for StringConverter {
    type Value = String;

    fn from_text(&self, text: &str) -> Result<String, ConversionError> {
        Ok(text.to_string())
    }

    fn to_text(&self, value: &String) -> String {
        value.clone()
    }
}

/// Wraps a converter for optional fields: empty text becomes `None`.
#[derive(Debug, Clone, Copy)]
pub struct OptionalConverter<K> {
    inner: K,
}

impl<K> OptionalConverter<K> {
    /// Wrap a converter.
    pub fn new(inner: K) -> Self {
        Self { inner }
    }
}

impl<K: Default> Default for OptionalConverter<K> {
    fn default() -> Self {
        Self::new(K::default())
    }
}

impl<K: Converter> Converter for OptionalConverter<K> {
    type Value = Option<K::Value>;

    fn from_text(&self, text: &str) -> Result<Self::Value, ConversionError> {
        if text.trim().is_empty() {
            Ok(None)
        } else {
            self.inner.from_text(text).map(Some)
        }
    }

    fn to_text(&self, value: &Self::Value) -> String {
        value
            .as_ref()
            .map(|v| self.inner.to_text(v))
            .unwrap_or_default()
    }
}

/// Bounds an inner integer converter to a closed range.
#[derive(Debug, Clone, Copy)]
pub struct RangeConverter<K, V> {
    inner: K,
    min: V,
    max: V,
}

impl<K, V> RangeConverter<K, V> {
    /// Accept only values in `min..=max`.
    pub fn new(inner: K, min: V, max: V) -> Self {
        Self { inner, min, max }
    }
}

impl<K, V> Converter for RangeConverter<K, V>
where
    K: Converter<Value = V>,
    V: PartialOrd + std::fmt::Display + Send + Sync + 'static,
{
    type Value = V;

    fn from_text(&self, text: &str) -> Result<V, ConversionError> {
        let value = self.inner.from_text(text)?;
        if value < self.min || value > self.max {
            return Err(ConversionError::OutOfRange(format!(
                "{} not in {}..={}",
                value, self.min, self.max
            )));
        }
        Ok(value)
    }

    fn to_text(&self, value: &V) -> String {
        self.inner.to_text(value)
    }
}

impl Convertible for i32 {
    type Converter = IntegerConverter;
}

impl Convertible for i64 {
    type Converter = LongConverter;
}

impl Convertible for bool {
    type Converter = BooleanConverter;
}

impl Convertible for String {
    type Converter = StringConverter;
}

impl<T> Convertible for Option<T>
where
    T: Convertible,
{
    type Converter = OptionalConverter<T::Converter>;
}

/// Converter built from a pair of functions.
pub struct FnConverter<V> {
    from: fn(&str) -> Result<V, ConversionError>,
    to: fn(&V) -> String,
    _value: PhantomData<fn() -> V>,
}

impl<V> FnConverter<V> {
    /// Create a converter from conversion functions.
    pub fn new(from: fn(&str) -> Result<V, ConversionError>, to: fn(&V) -> String) -> Self {
        Self {
            from,
            to,
            _value: PhantomData,
        }
    }
}

impl<V: 'static> Converter for FnConverter<V> {
    type Value = V;

    fn from_text(&self, text: &str) -> Result<V, ConversionError> {
        (self.from)(text)
    }

    fn to_text(&self, value: &V) -> String {
        (self.to)(value)
    }
}
