// src/sqlite/types.rs

use arrow::array::{
    Array, ArrayRef, AsArray, BooleanArray, Float64Array, Int64Array, LargeBinaryArray,
    LargeStringArray,
};
use arrow::compute::{cast_with_options, CastOptions};
use arrow::datatypes::{DataType, Float64Type, Int64Type};
use arrow::error::ArrowError;
use arrow::util::display::{ArrayFormatter, FormatOptions};
use rusqlite::types::Value;

/// Declared SQLite column type for an Arrow type.
///
/// - Int*, UInt*, Duration          → INTEGER
/// - Boolean                        → INTEGER (0/1)
/// - Float*, Decimal*               → REAL
/// - Utf8, LargeUtf8, Utf8View      → TEXT
/// - Date32, Date64                 → DATE
/// - Timestamp(*)                   → TIMESTAMP
/// - Time32, Time64                 → TIME
/// - Binary, LargeBinary, Fixed*    → BLOB
/// - Dictionary(_, v)               → declared type of `v`
/// - fallback (List, Struct, …)     → TEXT
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    Integer,
    Boolean,
    Real,
    Text,
    Date,
    Timestamp,
    Time,
    Blob,
    /// Anything without a native mapping, written as its display string.
    Display,
}

impl SqlType {
    pub fn of(dt: &DataType) -> Self {
        match dt {
            DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Duration(_) => SqlType::Integer,
            DataType::Boolean => SqlType::Boolean,
            DataType::Float16
            | DataType::Float32
            | DataType::Float64
            | DataType::Decimal128(_, _)
            | DataType::Decimal256(_, _) => SqlType::Real,
            DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View => SqlType::Text,
            DataType::Date32 | DataType::Date64 => SqlType::Date,
            DataType::Timestamp(_, _) => SqlType::Timestamp,
            DataType::Time32(_) | DataType::Time64(_) => SqlType::Time,
            DataType::Binary
            | DataType::LargeBinary
            | DataType::BinaryView
            | DataType::FixedSizeBinary(_) => SqlType::Blob,
            DataType::Dictionary(_, value) => SqlType::of(value),
            _ => SqlType::Display,
        }
    }

    pub fn declared(&self) -> &'static str {
        match self {
            SqlType::Integer | SqlType::Boolean => "INTEGER",
            SqlType::Real => "REAL",
            SqlType::Text | SqlType::Display => "TEXT",
            SqlType::Date => "DATE",
            SqlType::Timestamp => "TIMESTAMP",
            SqlType::Time => "TIME",
            SqlType::Blob => "BLOB",
        }
    }

    /// Arrow type the column is cast to before values are read out, if any.
    fn target(&self) -> Option<DataType> {
        match self {
            SqlType::Integer => Some(DataType::Int64),
            SqlType::Boolean => Some(DataType::Boolean),
            SqlType::Real => Some(DataType::Float64),
            SqlType::Text => Some(DataType::LargeUtf8),
            SqlType::Blob => Some(DataType::LargeBinary),
            SqlType::Date | SqlType::Timestamp | SqlType::Time | SqlType::Display => None,
        }
    }
}

/// ISO-8601 text, space-separated like `datetime.isoformat(" ")`.
const DATE_FORMAT: &str = "%Y-%m-%d";
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";
const TIMESTAMP_TZ_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f%:z";
const TIME_FORMAT: &str = "%H:%M:%S%.f";

fn format_options() -> FormatOptions<'static> {
    FormatOptions::default()
        .with_date_format(Some(DATE_FORMAT))
        .with_datetime_format(Some(DATETIME_FORMAT))
        .with_timestamp_format(Some(DATETIME_FORMAT))
        .with_timestamp_tz_format(Some(TIMESTAMP_TZ_FORMAT))
        .with_time_format(Some(TIME_FORMAT))
}

/// A column normalized for row-wise extraction into SQLite values.
pub struct SqlColumn {
    array: ArrayRef,
    ty: SqlType,
}

impl SqlColumn {
    /// Cast `array` to the representation its SQL type reads from. Casts are
    /// unsafe-mode so an out-of-range value errors instead of becoming NULL.
    pub fn new(array: &ArrayRef) -> Result<Self, ArrowError> {
        let ty = SqlType::of(array.data_type());
        let array = match (ty.target(), array.data_type()) {
            (Some(target), dt) if dt != &target => cast_with_options(
                array,
                &target,
                &CastOptions {
                    safe: false,
                    ..CastOptions::default()
                },
            )?,
            (None, DataType::Dictionary(_, value)) => arrow::compute::cast(array, value)?,
            _ => array.clone(),
        };
        Ok(Self { array, ty })
    }

    pub fn cells(&self) -> Result<Cells<'_>, ArrowError> {
        let array = self.array.as_ref();
        Ok(match self.ty {
            SqlType::Integer => Cells::Integer(array.as_primitive::<Int64Type>()),
            SqlType::Boolean => Cells::Boolean(array.as_boolean()),
            SqlType::Real => Cells::Real(array.as_primitive::<Float64Type>()),
            SqlType::Text => Cells::Text(array.as_string::<i64>()),
            SqlType::Blob => Cells::Blob(array.as_binary::<i64>()),
            SqlType::Date | SqlType::Timestamp | SqlType::Time | SqlType::Display => {
                Cells::Formatted(array, ArrayFormatter::try_new(array, &format_options())?)
            }
        })
    }
}

/// Typed view over a normalized column.
pub enum Cells<'a> {
    Integer(&'a Int64Array),
    Boolean(&'a BooleanArray),
    Real(&'a Float64Array),
    Text(&'a LargeStringArray),
    Blob(&'a LargeBinaryArray),
    Formatted(&'a dyn Array, ArrayFormatter<'a>),
}

impl Cells<'_> {
    pub fn value(&self, row: usize) -> Result<Value, ArrowError> {
        let null = match self {
            Cells::Integer(a) => a.is_null(row),
            Cells::Boolean(a) => a.is_null(row),
            Cells::Real(a) => a.is_null(row),
            Cells::Text(a) => a.is_null(row),
            Cells::Blob(a) => a.is_null(row),
            Cells::Formatted(a, _) => a.is_null(row),
        };
        if null {
            return Ok(Value::Null);
        }
        Ok(match self {
            Cells::Integer(a) => Value::Integer(a.value(row)),
            Cells::Boolean(a) => Value::Integer(a.value(row) as i64),
            Cells::Real(a) => Value::Real(a.value(row)),
            Cells::Text(a) => Value::Text(a.value(row).to_string()),
            Cells::Blob(a) => Value::Blob(a.value(row).to_vec()),
            Cells::Formatted(_, f) => Value::Text(f.value(row).try_to_string()?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{
        DictionaryArray, Int32Array, ListArray, StringArray, TimestampMicrosecondArray,
        UInt64Array,
    };
    use arrow::datatypes::{Int32Type, Int8Type, TimeUnit};
    use std::sync::Arc;

    fn values(array: ArrayRef) -> Vec<Value> {
        let col = SqlColumn::new(&array).unwrap();
        let cells = col.cells().unwrap();
        (0..array.len()).map(|i| cells.value(i).unwrap()).collect()
    }

    #[test]
    fn test_declared_types() {
        assert_eq!(SqlType::of(&DataType::UInt16).declared(), "INTEGER");
        assert_eq!(SqlType::of(&DataType::Boolean).declared(), "INTEGER");
        assert_eq!(SqlType::of(&DataType::Decimal128(10, 2)).declared(), "REAL");
        assert_eq!(SqlType::of(&DataType::LargeUtf8).declared(), "TEXT");
        assert_eq!(
            SqlType::of(&DataType::Timestamp(TimeUnit::Nanosecond, None)).declared(),
            "TIMESTAMP"
        );
        assert_eq!(SqlType::of(&DataType::Date32).declared(), "DATE");
        assert_eq!(
            SqlType::of(&DataType::Dictionary(
                Box::new(DataType::Int8),
                Box::new(DataType::Utf8)
            )),
            SqlType::Text
        );
        assert_eq!(
            SqlType::of(&DataType::new_list(DataType::Int32, true)),
            SqlType::Display
        );
    }

    #[test]
    fn test_integers_and_nulls() {
        let got = values(Arc::new(Int32Array::from(vec![Some(3), None, Some(-1)])));
        assert_eq!(got, vec![Value::Integer(3), Value::Null, Value::Integer(-1)]);
    }

    #[test]
    fn test_uint64_overflow_errors() {
        let array: ArrayRef = Arc::new(UInt64Array::from(vec![u64::MAX]));
        assert!(SqlColumn::new(&array).is_err());
    }

    #[test]
    fn test_booleans_are_zero_one() {
        let got = values(Arc::new(BooleanArray::from(vec![true, false])));
        assert_eq!(got, vec![Value::Integer(1), Value::Integer(0)]);
    }

    #[test]
    fn test_timestamps_are_iso_text() {
        let got = values(Arc::new(TimestampMicrosecondArray::from(vec![
            1_700_000_000_000_000,
            1_700_000_000_250_000,
        ])));
        assert_eq!(
            got,
            vec![
                Value::Text("2023-11-14 22:13:20".into()),
                Value::Text("2023-11-14 22:13:20.250".into()),
            ]
        );
    }

    #[test]
    fn test_dictionary_strings() {
        let dict: DictionaryArray<Int8Type> = vec!["NY", "LA", "NY"].into_iter().collect();
        let got = values(Arc::new(dict));
        assert_eq!(
            got,
            vec![
                Value::Text("NY".into()),
                Value::Text("LA".into()),
                Value::Text("NY".into())
            ]
        );
    }

    #[test]
    fn test_lists_use_display_form() {
        let list = ListArray::from_iter_primitive::<Int32Type, _, _>(vec![
            Some(vec![Some(1), Some(2)]),
            None,
        ]);
        let got = values(Arc::new(list));
        assert_eq!(got, vec![Value::Text("[1, 2]".into()), Value::Null]);
    }

    #[test]
    fn test_strings_pass_through() {
        let got = values(Arc::new(StringArray::from(vec![Some("a"), None])));
        assert_eq!(got, vec![Value::Text("a".into()), Value::Null]);
    }
}
