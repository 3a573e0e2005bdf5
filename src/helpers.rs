use byte_unit::{Byte, UnitType};
use tabled::settings::Style;
use tabled::{Table, Tabled};

const BYTE_UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Human readable size in powers of 1024, always with two decimals.
///
/// Anything past TB is shown in PB, however large.
pub fn format_bytes(bytes: u64) -> String {
    let mut size = bytes as f64;

    for unit in &BYTE_UNITS {
        if size < 1024.0 {
            return format!("{size:.2} {unit}");
        }
        size /= 1024.0;
    }

    format!("{size:.2} PB") // Fallback for very large sizes
}

/// `1048576` -> `1,048,576`
pub fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);

    for (idx, digit) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    grouped
}

/// Compact binary size for object listings (`1.5 KiB`), like `aws s3 ls --human-readable`.
pub fn human_size(bytes: u64) -> String {
    let byte = Byte::from_u64(bytes).get_appropriate_unit(UnitType::Binary);
    format!("{byte:.1}")
}

// https://users.rust-lang.org/t/is-there-a-simple-way-to-give-a-default-string-if-the-string-variable-is-empty/100411

pub trait StringExt {
    fn or(
        self,
        dflt: &str,
    ) -> String;
}

impl<S: Into<String>> StringExt for S {
    fn or(
        self,
        dflt: &str,
    ) -> String {
        // Re-use a `String`s capacity, maybe
        let mut s = self.into();
        if s.is_empty() {
            s.push_str(dflt);
        }
        s
    }
}

pub fn render_table<T: Tabled>(rows: &[T]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}
