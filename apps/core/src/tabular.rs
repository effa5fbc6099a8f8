// The tool does not escape the field delimiter inside text values. Fields are assigned
// to columns by position and surplus fields are dropped, so a title that contains the
// delimiter loses its tail. Short rows are padded with defaults instead of rejected.

use std::collections::HashMap;

pub const DEFAULT_DELIMITER: char = '|';

const NUMERIC_PREFIX: &str = "n/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDecl {
    pub name: String,
    pub numeric: bool,
}

impl ColumnDecl {
    pub fn text(name: &str) -> Self {
        Self {
            name: name.to_string(),
            numeric: false,
        }
    }

    pub fn numeric(name: &str) -> Self {
        Self {
            name: name.to_string(),
            numeric: true,
        }
    }

    pub fn parse(notation: &str) -> Self {
        match notation.strip_prefix(NUMERIC_PREFIX) {
            Some(name) => Self::numeric(name),
            None => Self::text(notation),
        }
    }
}

pub fn columns(notations: &[&str]) -> Vec<ColumnDecl> {
    notations.iter().map(|notation| ColumnDecl::parse(notation)).collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field {
    Text(String),
    Integer(i64),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawRow {
    fields: HashMap<String, Field>,
}

impl RawRow {
    pub fn get(&self, column: &str) -> Option<&Field> {
        self.fields.get(column)
    }

    pub fn text(&self, column: &str) -> String {
        match self.fields.get(column) {
            Some(Field::Text(value)) => value.clone(),
            Some(Field::Integer(value)) => value.to_string(),
            None => String::new(),
        }
    }

    pub fn integer(&self, column: &str) -> i64 {
        match self.fields.get(column) {
            Some(Field::Integer(value)) => *value,
            Some(Field::Text(value)) => parse_numeric(value),
            None => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TabularParser {
    delimiter: char,
}

impl Default for TabularParser {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER,
        }
    }
}

impl TabularParser {
    pub fn with_delimiter(delimiter: char) -> Self {
        Self { delimiter }
    }

    pub fn parse(&self, raw_text: &str, columns: &[ColumnDecl]) -> Vec<RawRow> {
        if raw_text.trim().is_empty() || columns.is_empty() {
            return Vec::new();
        }

        raw_text
            .lines()
            .map(|line| line.strip_suffix('\r').unwrap_or(line))
            .filter(|line| !line.trim().is_empty())
            .map(|line| self.parse_line(line, columns))
            .collect()
    }

    fn parse_line(&self, line: &str, columns: &[ColumnDecl]) -> RawRow {
        let mut values = line.split(self.delimiter);
        let fields = columns
            .iter()
            .map(|column| {
                let raw = values.next();
                let field = if column.numeric {
                    Field::Integer(raw.map(parse_numeric).unwrap_or(0))
                } else {
                    Field::Text(raw.unwrap_or_default().to_string())
                };
                (column.name.clone(), field)
            })
            .collect();
        RawRow { fields }
    }
}

pub fn parse(raw_text: &str, columns: &[ColumnDecl]) -> Vec<RawRow> {
    TabularParser::default().parse(raw_text, columns)
}

fn parse_numeric(raw: &str) -> i64 {
    let trimmed = raw.trim();
    if let Ok(value) = trimmed.parse::<i64>() {
        return value;
    }
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => value.trunc() as i64,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::parse_numeric;

    #[test]
    fn numeric_parsing_accepts_floats_and_falls_back_to_zero() {
        assert_eq!(parse_numeric(" 42 "), 42);
        assert_eq!(parse_numeric("745678901.25"), 745_678_901);
        assert_eq!(parse_numeric("-3.9"), -3);
        assert_eq!(parse_numeric("NaN"), 0);
        assert_eq!(parse_numeric("abc"), 0);
        assert_eq!(parse_numeric(""), 0);
    }
}
