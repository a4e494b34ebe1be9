//! Unit code normalization and geographic table cleaning

use polars::prelude::*;
use std::collections::BTreeMap;

use crate::error::{PrepError, Result};
use crate::pipeline::loader::require_columns;

/// Project onto `dedup_columns`, drop duplicate rows (first kept), then drop
/// rows with a null in any of `required_columns`.
///
/// Deduplication runs before the null filter, so a row that is later removed
/// for nulls still suppresses its own duplicates.
pub fn process_geographic_data<S: AsRef<str>, T: AsRef<str>>(
    df: &DataFrame,
    dedup_columns: &[S],
    required_columns: &[T],
) -> Result<DataFrame> {
    require_columns(df, dedup_columns)?;

    let projected = df.select(dedup_columns.iter().map(|c| c.as_ref()))?;
    let unique = projected.unique_stable(None, UniqueKeepStrategy::First, None)?;

    require_columns(&unique, required_columns)?;

    let mut mask = BooleanChunked::full("mask".into(), true, unique.height());
    for name in required_columns {
        let not_null = unique.column(name.as_ref())?.is_not_null();
        mask = &mask & &not_null;
    }

    Ok(unique.filter(&mask)?)
}

/// Zero-pad unit code columns to fixed widths.
///
/// Each value goes through float → integer → string, so `"602.0"`, `602`
/// and `"602"` all become `"00602"` at width 5. Nulls stay null. A value
/// that is not numeric fails the call.
pub fn format_geographic_units(
    df: &DataFrame,
    column_widths: &BTreeMap<String, usize>,
) -> Result<DataFrame> {
    let names: Vec<&str> = column_widths.keys().map(|k| k.as_str()).collect();
    require_columns(df, &names)?;

    let mut out = df.clone();
    for (name, &width) in column_widths {
        let as_text = df.column(name)?.cast(&DataType::String)?;
        let codes: Vec<Option<String>> = as_text
            .str()?
            .iter()
            .map(|value| value.map(|raw| format_code(raw, width, name)).transpose())
            .collect::<Result<_>>()?;
        out.with_column(Column::new(name.as_str().into(), codes))?;
    }

    Ok(out)
}

/// Largest magnitude that survives the float → i64 step exactly
const MAX_CODE_MAGNITUDE: f64 = 9.0e15;

fn format_code(raw: &str, width: usize, column: &str) -> Result<String> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| PrepError::conversion(column, raw, "unit code is not numeric"))?;

    if !value.is_finite() || value.abs() > MAX_CODE_MAGNITUDE {
        return Err(PrepError::conversion(
            column,
            raw,
            "unit code is not a finite integer",
        ));
    }

    // float → int truncates toward zero
    let code = value.trunc() as i64;
    Ok(zfill(&code.to_string(), width))
}

/// Left-pad with zeros to `width`, keeping a leading sign in front
fn zfill(s: &str, width: usize) -> String {
    let (sign, digits) = match s.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", s),
    };
    let pad = width.saturating_sub(sign.len() + digits.len());
    format!("{}{}{}", sign, "0".repeat(pad), digits)
}
