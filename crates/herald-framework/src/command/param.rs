//! Parameter descriptors and typed extraction of bound arguments.
//!
//! Every handler argument after the context implements [`Parameter`], which
//! says two things: how the parameter is described to the binder (its
//! [`ParamKind`] and default [`Converter`]) and how its value is taken back
//! out of the [`BoundArguments`] the binder produced.
//!
//! | handler argument | kind                            | handler receives              |
//! |------------------|---------------------------------|-------------------------------|
//! | `T: ArgValue`    | [`ParamKind::Positional`]       | the next token, converted     |
//! | [`Variadic<T>`]  | [`ParamKind::Variadic`]         | every remaining token         |
//! | [`Rest<T>`]      | [`ParamKind::KeywordRemainder`] | remaining tokens joined, if any |

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::str::FromStr;

use serde::Serialize;

use super::converter::{ConvertedValue, Converter, ValueType};
use crate::error::{BoxError, CommandError, CommandResult};

/// How a parameter consumes tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamKind {
    /// Takes exactly one token.
    Positional,
    /// Takes every remaining token, converting each one.
    Variadic,
    /// Takes every remaining token joined by single spaces.
    KeywordRemainder,
}

impl ParamKind {
    /// Returns `true` if the parameter consumes every remaining token.
    pub fn is_greedy(self) -> bool {
        !matches!(self, Self::Positional)
    }
}

/// Describes one handler parameter.
#[derive(Debug, Clone)]
pub struct ParameterDescriptor {
    name: String,
    kind: ParamKind,
    expected: ValueType,
    converter: Option<Converter>,
}

impl ParameterDescriptor {
    /// Creates a descriptor for a parameter whose values have type `expected`.
    pub fn new(
        name: impl Into<String>,
        kind: ParamKind,
        expected: ValueType,
        converter: Option<Converter>,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            expected,
            converter,
        }
    }

    /// The parameter name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// How the parameter consumes tokens.
    pub fn kind(&self) -> ParamKind {
        self.kind
    }

    /// The type each converted value must have.
    pub fn expected(&self) -> ValueType {
        self.expected
    }

    /// The declared converter, if any.
    pub fn converter(&self) -> Option<&Converter> {
        self.converter.as_ref()
    }

    pub(crate) fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Declares `converter`, checking that it produces the expected type.
    pub(crate) fn set_converter(&mut self, converter: Converter) -> CommandResult<()> {
        self.check_output(&converter)?;
        self.converter = Some(converter);
        Ok(())
    }

    pub(crate) fn check_output(&self, converter: &Converter) -> CommandResult<()> {
        let produced = converter.output();
        if produced == self.expected {
            Ok(())
        } else {
            Err(self.invalid_converter(produced))
        }
    }

    pub(crate) fn invalid_converter(&self, produced: ValueType) -> CommandError {
        CommandError::InvalidConverter {
            parameter: self.name.clone(),
            expected: self.expected.name(),
            produced: produced.name(),
        }
    }

    fn downcast<T: 'static>(&self, value: ConvertedValue) -> CommandResult<T> {
        value
            .downcast::<T>()
            .map_err(|value| self.invalid_converter(value.value_type()))
    }
}

// ============================================================================
// BoundArguments
// ============================================================================

/// The binder's output for one invocation.
///
/// Positional values are kept in order; variadic values are grouped under
/// the parameter's own name; keyword-remainder values are present only when
/// at least one token was left for them.
#[derive(Debug, Default)]
pub struct BoundArguments {
    positional: VecDeque<ConvertedValue>,
    variadic: HashMap<String, Vec<ConvertedValue>>,
    keywords: HashMap<String, ConvertedValue>,
}

impl BoundArguments {
    pub(crate) fn push_positional(&mut self, value: ConvertedValue) {
        self.positional.push_back(value);
    }

    pub(crate) fn insert_variadic(&mut self, name: &str, values: Vec<ConvertedValue>) {
        self.variadic.insert(name.to_owned(), values);
    }

    pub(crate) fn insert_keyword(&mut self, name: &str, value: ConvertedValue) {
        self.keywords.insert(name.to_owned(), value);
    }

    /// Number of positional values not yet taken.
    pub fn positional_len(&self) -> usize {
        self.positional.len()
    }

    /// Returns `true` if a keyword value was bound under `name`.
    pub fn has_keyword(&self, name: &str) -> bool {
        self.keywords.contains_key(name)
    }

    /// Number of variadic values bound under `name`.
    pub fn variadic_len(&self, name: &str) -> usize {
        self.variadic.get(name).map_or(0, Vec::len)
    }

    fn take_positional<T: 'static>(&mut self, param: &ParameterDescriptor) -> CommandResult<T> {
        let value = self
            .positional
            .pop_front()
            .ok_or_else(|| CommandError::MissingArgument {
                parameter: param.name.clone(),
            })?;
        param.downcast(value)
    }

    fn take_variadic<T: 'static>(&mut self, param: &ParameterDescriptor) -> CommandResult<Vec<T>> {
        self.variadic
            .remove(&param.name)
            .unwrap_or_default()
            .into_iter()
            .map(|value| param.downcast(value))
            .collect()
    }

    fn take_keyword<T: 'static>(
        &mut self,
        param: &ParameterDescriptor,
    ) -> CommandResult<Option<T>> {
        self.keywords
            .remove(&param.name)
            .map(|value| param.downcast(value))
            .transpose()
    }
}

// ============================================================================
// ArgValue / Parameter
// ============================================================================

/// A type a single token can be converted into.
///
/// Implement this for your own types to give them a default converter, or
/// leave the default and declare a converter on each command that uses it.
pub trait ArgValue: Send + Sized + 'static {
    /// The converter used when a command declares none.
    fn default_converter() -> Option<Converter> {
        None
    }
}

impl ArgValue for String {
    fn default_converter() -> Option<Converter> {
        Some(Converter::Identity)
    }
}

macro_rules! impl_parsed_arg_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl ArgValue for $ty {
                fn default_converter() -> Option<Converter> {
                    Some(Converter::parse::<$ty>())
                }
            }
        )*
    };
}

impl_parsed_arg_value!(
    i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, bool, char,
);

/// A handler argument bound from the tokens of a message.
pub trait Parameter: Send + Sized + 'static {
    /// Describes the parameter to the binder.
    fn descriptor(name: String) -> ParameterDescriptor;

    /// Takes this parameter's value out of the bound arguments.
    fn extract(args: &mut BoundArguments, param: &ParameterDescriptor) -> CommandResult<Self>;
}

impl<T: ArgValue> Parameter for T {
    fn descriptor(name: String) -> ParameterDescriptor {
        ParameterDescriptor::new(
            name,
            ParamKind::Positional,
            ValueType::of::<T>(),
            T::default_converter(),
        )
    }

    fn extract(args: &mut BoundArguments, param: &ParameterDescriptor) -> CommandResult<Self> {
        args.take_positional(param)
    }
}

// ============================================================================
// Wrappers
// ============================================================================

/// Any [`FromStr`] type, parsed from one token.
///
/// ```rust,ignore
/// async fn connect(ctx: Arc<InvocationContext>, addr: Parsed<IpAddr>) { /* ... */ }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Parsed<T>(pub T);

impl<T> Parsed<T> {
    /// Unwraps the parsed value.
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for Parsed<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T> ArgValue for Parsed<T>
where
    T: FromStr + Send + 'static,
    T::Err: Into<BoxError>,
{
    fn default_converter() -> Option<Converter> {
        Some(Converter::plain(|raw: &str| raw.parse::<T>().map(Parsed)))
    }
}

/// Every remaining token, each converted into `T`.
///
/// ```rust,ignore
/// async fn sum(ctx: Arc<InvocationContext>, numbers: Variadic<i64>) -> String {
///     numbers.iter().sum::<i64>().to_string()
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Variadic<T>(pub Vec<T>);

impl<T> Variadic<T> {
    /// Unwraps the collected values.
    pub fn into_inner(self) -> Vec<T> {
        self.0
    }
}

impl<T> Deref for Variadic<T> {
    type Target = Vec<T>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T> DerefMut for Variadic<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl<T> IntoIterator for Variadic<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<T: ArgValue> Parameter for Variadic<T> {
    fn descriptor(name: String) -> ParameterDescriptor {
        ParameterDescriptor::new(
            name,
            ParamKind::Variadic,
            ValueType::of::<T>(),
            T::default_converter(),
        )
    }

    fn extract(args: &mut BoundArguments, param: &ParameterDescriptor) -> CommandResult<Self> {
        args.take_variadic(param).map(Variadic)
    }
}

/// The remaining tokens joined by single spaces and converted into `T`.
///
/// Holds `None` when no token was left, so handlers pick their own default.
/// A value that was provided is always delivered, even if it is `0` or empty.
///
/// ```rust,ignore
/// async fn say(ctx: Arc<InvocationContext>, text: Rest<String>) -> String {
///     text.into_inner().unwrap_or_else(|| "nothing to say".into())
/// }
/// ```
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Rest<T>(pub Option<T>);

impl<T> Rest<T> {
    /// Unwraps the optional value.
    pub fn into_inner(self) -> Option<T> {
        self.0
    }

    /// Returns `true` if any token was left for this parameter.
    pub fn is_present(&self) -> bool {
        self.0.is_some()
    }

    /// Returns the value or `T::default()`.
    pub fn unwrap_or_default(self) -> T
    where
        T: Default,
    {
        self.0.unwrap_or_default()
    }
}

impl<T> Deref for Rest<T> {
    type Target = Option<T>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T: fmt::Debug> fmt::Debug for Rest<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Rest").field(&self.0).finish()
    }
}

impl<T: ArgValue> Parameter for Rest<T> {
    fn descriptor(name: String) -> ParameterDescriptor {
        ParameterDescriptor::new(
            name,
            ParamKind::KeywordRemainder,
            ValueType::of::<T>(),
            T::default_converter(),
        )
    }

    fn extract(args: &mut BoundArguments, param: &ParameterDescriptor) -> CommandResult<Self> {
        args.take_keyword(param).map(Rest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptors() {
        let amount = <i64 as Parameter>::descriptor("amount".into());
        assert_eq!(amount.kind(), ParamKind::Positional);
        assert_eq!(amount.expected(), ValueType::of::<i64>());
        assert!(amount.converter().is_some());

        let words = <Variadic<String> as Parameter>::descriptor("words".into());
        assert_eq!(words.kind(), ParamKind::Variadic);
        assert_eq!(words.expected(), ValueType::of::<String>());

        let text = <Rest<String> as Parameter>::descriptor("text".into());
        assert_eq!(text.kind(), ParamKind::KeywordRemainder);
        assert!(text.kind().is_greedy());
    }

    #[test]
    fn test_custom_value_has_no_default_converter() {
        struct Member;
        impl ArgValue for Member {}

        let param = <Member as Parameter>::descriptor("member".into());
        assert!(param.converter().is_none());
    }

    #[test]
    fn test_set_converter_checks_output_type() {
        let mut param = <i64 as Parameter>::descriptor("amount".into());
        let err = param.set_converter(Converter::identity()).unwrap_err();
        assert!(matches!(err, CommandError::InvalidConverter { .. }));
        assert!(param.set_converter(Converter::parse::<i64>()).is_ok());
    }

    #[test]
    fn test_extract_positional() {
        let param = <i64 as Parameter>::descriptor("amount".into());
        let mut args = BoundArguments::default();
        args.push_positional(ConvertedValue::new(42i64));

        assert_eq!(i64::extract(&mut args, &param).unwrap(), 42);
        let err = i64::extract(&mut args, &param).unwrap_err();
        assert!(matches!(err, CommandError::MissingArgument { parameter } if parameter == "amount"));
    }

    #[test]
    fn test_extract_type_mismatch() {
        let param = <i64 as Parameter>::descriptor("amount".into());
        let mut args = BoundArguments::default();
        args.push_positional(ConvertedValue::new("42".to_string()));

        let err = i64::extract(&mut args, &param).unwrap_err();
        assert!(matches!(
            err,
            CommandError::InvalidConverter { produced, .. } if produced == "alloc::string::String"
        ));
    }

    #[test]
    fn test_extract_variadic_and_rest() {
        let numbers = <Variadic<u8> as Parameter>::descriptor("numbers".into());
        let text = <Rest<String> as Parameter>::descriptor("text".into());

        let mut args = BoundArguments::default();
        args.insert_variadic("numbers", vec![ConvertedValue::new(1u8), ConvertedValue::new(2u8)]);

        let numbers = Variadic::<u8>::extract(&mut args, &numbers).unwrap();
        assert_eq!(numbers.into_inner(), vec![1, 2]);

        let text = Rest::<String>::extract(&mut args, &text).unwrap();
        assert!(!text.is_present());
    }

    #[test]
    fn test_rest_keeps_falsy_values() {
        let param = <Rest<i64> as Parameter>::descriptor("count".into());
        let mut args = BoundArguments::default();
        args.insert_keyword("count", ConvertedValue::new(0i64));

        let count = Rest::<i64>::extract(&mut args, &param).unwrap();
        assert_eq!(count.into_inner(), Some(0));
    }
}
