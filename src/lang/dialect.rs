use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// ## Dialect switches
///
/// Each field flips one behavior to match a historical BASIC.
/// Field names serialize in camelCase (`staticArrays`, `typeConvert`, ...)
/// so a dialect can ride along inside a program file.

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Dialect {
    pub dialect_name: String,
    /// DIM runs once at reset with constant bounds; re-DIM is ignored.
    pub static_arrays: bool,
    /// Assignments convert between strings and numbers instead of failing.
    pub type_convert: bool,
    /// Size used for arrays touched before any DIM; 0 forbids that.
    pub default_array_size: usize,
    pub default_array_base: usize,
    /// Infinite results are invalid values.
    pub check_overflow: bool,
    /// `ON X GOTO` with X past either end of the list is an error.
    pub check_on_goto_index: bool,
    /// A bare `NEXT` closes the innermost loop.
    pub optional_next_var: bool,
    /// A FOR whose range is already exhausted skips its body entirely.
    pub test_initial_for: bool,
    /// True is -1 instead of 1.
    pub bitwise_logic: bool,
    /// `+` concatenates strings.
    pub string_concat: bool,
    /// String variables index like character arrays (HP style slicing).
    pub arrays_contain_chars: bool,
    pub print_zone_length: usize,
    /// Numbers print with a leading sign column and a trailing space.
    pub numeric_padding: bool,
    pub max_string_length: usize,
    /// Builtins available to programs. `None` means all of them.
    pub valid_functions: Option<Vec<String>>,
    /// Reading an unset variable yields 0 or "".
    pub default_values: bool,
}

impl Default for Dialect {
    fn default() -> Dialect {
        Dialect::modern()
    }
}

fn names(list: &[&str]) -> Option<Vec<String>> {
    Some(list.iter().map(|s| s.to_string()).collect())
}

impl Dialect {
    pub fn named(name: &str) -> Option<Dialect> {
        match name.to_ascii_uppercase().as_str() {
            "ECMA55" | "MINIMAL" => Some(Dialect::ecma55()),
            "ALTAIR" | "MICROSOFT" => Some(Dialect::altair()),
            "HP" | "HPB" => Some(Dialect::hp()),
            "MODERN" => Some(Dialect::modern()),
            _ => None,
        }
    }

    /// Reads a dialect from JSON. When `dialectName` names a preset, the
    /// preset fills in every option left out; otherwise `modern` does.
    pub fn from_json(value: Value) -> serde_json::Result<Dialect> {
        let preset = value
            .get("dialectName")
            .and_then(Value::as_str)
            .and_then(Dialect::named);
        let value = match (preset, value) {
            (Some(preset), Value::Object(options)) => {
                let mut merged = match serde_json::to_value(preset)? {
                    Value::Object(fields) => fields,
                    _ => Map::new(),
                };
                merged.extend(options);
                Value::Object(merged)
            }
            (_, value) => value,
        };
        serde_json::from_value(value)
    }

    /// ECMA-55 Minimal BASIC.
    pub fn ecma55() -> Dialect {
        Dialect {
            dialect_name: "ECMA55".into(),
            static_arrays: true,
            type_convert: false,
            default_array_size: 11,
            default_array_base: 0,
            check_overflow: true,
            check_on_goto_index: true,
            optional_next_var: false,
            test_initial_for: true,
            bitwise_logic: false,
            string_concat: false,
            arrays_contain_chars: false,
            print_zone_length: 15,
            numeric_padding: true,
            max_string_length: 255,
            valid_functions: names(&[
                "ABS", "ATN", "COS", "EXP", "INT", "LOG", "RND", "SGN", "SIN", "SQR", "TAB", "TAN",
            ]),
            default_values: false,
        }
    }

    /// Altair BASIC 4.1, the Microsoft line.
    pub fn altair() -> Dialect {
        Dialect {
            dialect_name: "ALTAIR".into(),
            static_arrays: false,
            type_convert: false,
            default_array_size: 11,
            default_array_base: 0,
            check_overflow: true,
            check_on_goto_index: false,
            optional_next_var: true,
            test_initial_for: false,
            bitwise_logic: true,
            string_concat: true,
            arrays_contain_chars: false,
            print_zone_length: 15,
            numeric_padding: true,
            max_string_length: 255,
            valid_functions: names(&[
                "ABS", "ASC", "ATN", "CHR$", "CINT", "COS", "EXP", "FIX", "HEX$", "INSTR", "INT",
                "LEFT$", "LEN", "LOG", "MID$", "OCT$", "POS", "RIGHT$", "RND", "SGN", "SIN",
                "SPACE$", "SPC", "SQR", "STR$", "STRING$", "TAB", "TAN", "VAL",
            ]),
            default_values: true,
        }
    }

    /// HP Time-Shared BASIC.
    pub fn hp() -> Dialect {
        Dialect {
            dialect_name: "HP".into(),
            static_arrays: true,
            type_convert: false,
            default_array_size: 11,
            default_array_base: 1,
            check_overflow: false,
            check_on_goto_index: false,
            optional_next_var: false,
            test_initial_for: true,
            bitwise_logic: false,
            string_concat: false,
            arrays_contain_chars: true,
            print_zone_length: 15,
            numeric_padding: true,
            max_string_length: 255,
            valid_functions: names(&[
                "ABS", "ATN", "COS", "CTL", "EXP", "INT", "LEN", "LIN", "LOG", "POS", "RND",
                "SGN", "SIN", "SQR", "TAB", "TAN", "TIM", "UPS$",
            ]),
            default_values: false,
        }
    }

    pub fn modern() -> Dialect {
        Dialect {
            dialect_name: "MODERN".into(),
            static_arrays: false,
            type_convert: false,
            default_array_size: 0,
            default_array_base: 0,
            check_overflow: true,
            check_on_goto_index: true,
            optional_next_var: true,
            test_initial_for: true,
            bitwise_logic: true,
            string_concat: true,
            arrays_contain_chars: false,
            print_zone_length: 16,
            numeric_padding: false,
            max_string_length: 2048,
            valid_functions: None,
            default_values: false,
        }
    }

    /// The value logical operators and comparisons produce for true.
    pub fn true_value(&self) -> f64 {
        if self.bitwise_logic {
            -1.0
        } else {
            1.0
        }
    }
}

/// Field deserializer for program files, see [`Dialect::from_json`].
pub(crate) fn preset<'de, D>(deserializer: D) -> Result<Dialect, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Dialect::from_json(value).map_err(serde::de::Error::custom)
}
