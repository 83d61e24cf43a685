// Start of file: /src/models/data.rs

/*
    * Additional problem data: an ordered tree of maps, lists and scalars that
    * callers attach to a problem document. Anything may go in, including raw
    * bytes and values with no serializable form; `sanitize` turns the tree
    * into plain JSON values right before encoding.
*/

use std::any::type_name;
use std::borrow::Cow;

use serde_json::{Map, Number, Value};

/// A node of additional problem data.
#[derive(Debug, Clone, PartialEq)]
pub enum Data {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    /// Bytes that are meant to be text but may not be valid UTF-8.
    Bytes(Vec<u8>),
    List(Vec<Data>),
    Map(DataMap),
    /// A value with no serializable form (file handle, socket, closure).
    /// Only its type name is kept and the node is dropped on sanitize.
    Opaque(Cow<'static, str>),
}

impl Data {
    /// Wraps raw bytes, valid UTF-8 or not.
    pub fn bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Data::Bytes(bytes.into())
    }

    /// Marks a value that cannot be serialized, remembering only its type.
    pub fn opaque<T: ?Sized>(_value: &T) -> Self {
        Data::Opaque(Cow::Borrowed(type_name::<T>()))
    }

    /// Converts the tree into JSON values.
    ///
    /// Returns `None` for opaque nodes so callers can drop them. Invalid UTF-8
    /// is replaced with U+FFFD and non-finite floats become `null`; both are
    /// counted in `report`.
    pub fn sanitize(self, report: &mut Substitutions) -> Option<Value> {
        let value: Value = match self {
            Data::Null => Value::Null,
            Data::Bool(flag) => Value::Bool(flag),
            Data::Int(number) => Value::Number(number.into()),
            Data::Float(number) => match Number::from_f64(number) {
                Some(number) => Value::Number(number),
                None => {
                    report.non_finite += 1;
                    Value::Null
                }
            },
            Data::String(text) => Value::String(text),
            Data::Bytes(bytes) => match String::from_utf8(bytes) {
                Ok(text) => Value::String(text),
                Err(err) => {
                    report.invalid_utf8 += 1;
                    Value::String(String::from_utf8_lossy(err.as_bytes()).into_owned())
                }
            },
            Data::List(items) => Value::Array(
                items
                    .into_iter()
                    .filter_map(|item| item.sanitize(report))
                    .collect(),
            ),
            Data::Map(map) => Value::Object(map.sanitize(report)),
            Data::Opaque(_) => {
                report.dropped += 1;
                return None;
            }
        };

        Some(value)
    }
}

/// Counts of everything `sanitize` had to change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Substitutions {
    pub invalid_utf8: usize,
    pub non_finite: usize,
    pub dropped: usize,
}

impl Substitutions {
    /// True when no value had to be replaced. Dropped opaque values do not
    /// count: they never had an encoding to lose.
    pub fn is_lossless(&self) -> bool {
        self.invalid_utf8 == 0 && self.non_finite == 0
    }
}

/// Insertion-ordered string-keyed map of [`Data`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataMap {
    entries: Vec<(String, Data)>,
}

impl DataMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a value. A replaced key keeps its original position.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Data>) -> Option<Data> {
        let key: String = key.into();
        let value: Data = value.into();

        match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Data>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Data> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Data)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    /// Sanitizes every value, dropping the entries whose value is opaque.
    pub fn sanitize(self, report: &mut Substitutions) -> Map<String, Value> {
        let mut map: Map<String, Value> = Map::new();
        for (key, value) in self.entries {
            if let Some(value) = value.sanitize(report) {
                map.insert(key, value);
            }
        }
        map
    }
}

impl IntoIterator for DataMap {
    type Item = (String, Data);
    type IntoIter = std::vec::IntoIter<(String, Data)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<K: Into<String>, V: Into<Data>> FromIterator<(K, V)> for DataMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map: DataMap = DataMap::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

impl<K: Into<String>, V: Into<Data>, const N: usize> From<[(K, V); N]> for DataMap {
    fn from(entries: [(K, V); N]) -> Self {
        entries.into_iter().collect()
    }
}

impl From<Map<String, Value>> for DataMap {
    fn from(map: Map<String, Value>) -> Self {
        map.into_iter().collect()
    }
}

// * Scalar conversions

impl From<()> for Data {
    fn from(_: ()) -> Self {
        Data::Null
    }
}

impl From<bool> for Data {
    fn from(flag: bool) -> Self {
        Data::Bool(flag)
    }
}

macro_rules! data_from_int {
    ($($ty:ty),*) => {
        $(impl From<$ty> for Data {
            fn from(number: $ty) -> Self {
                Data::Int(i64::from(number))
            }
        })*
    };
}

data_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<u64> for Data {
    fn from(number: u64) -> Self {
        match i64::try_from(number) {
            Ok(number) => Data::Int(number),
            Err(_) => Data::Float(number as f64),
        }
    }
}

impl From<usize> for Data {
    fn from(number: usize) -> Self {
        Data::from(number as u64)
    }
}

impl From<f32> for Data {
    fn from(number: f32) -> Self {
        Data::Float(f64::from(number))
    }
}

impl From<f64> for Data {
    fn from(number: f64) -> Self {
        Data::Float(number)
    }
}

impl From<&str> for Data {
    fn from(text: &str) -> Self {
        Data::String(text.to_owned())
    }
}

impl From<String> for Data {
    fn from(text: String) -> Self {
        Data::String(text)
    }
}

impl From<Cow<'_, str>> for Data {
    fn from(text: Cow<'_, str>) -> Self {
        Data::String(text.into_owned())
    }
}

impl<T: Into<Data>> From<Vec<T>> for Data {
    fn from(items: Vec<T>) -> Self {
        Data::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Data>> From<Option<T>> for Data {
    fn from(value: Option<T>) -> Self {
        value.map_or(Data::Null, Into::into)
    }
}

impl From<DataMap> for Data {
    fn from(map: DataMap) -> Self {
        Data::Map(map)
    }
}

impl From<Value> for Data {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Data::Null,
            Value::Bool(flag) => Data::Bool(flag),
            Value::Number(number) => match number.as_i64() {
                Some(int) => Data::Int(int),
                None => number.as_f64().map_or(Data::Null, Data::Float),
            },
            Value::String(text) => Data::String(text),
            Value::Array(items) => Data::List(items.into_iter().map(Data::from).collect()),
            Value::Object(map) => Data::Map(DataMap::from(map)),
        }
    }
}

// End of file: /src/models/data.rs
