use crate::frame::{ColumnDescriptor, FieldType};

use super::driver::ColumnMeta;

/// Maps a vendor column type name to the frame type it is stored as.
///
/// The mapping is total: names that are not recognised fall back to
/// [`FieldType::NullableString`]. Matching ignores case and surrounding
/// whitespace.
pub fn map_type(source_type: &str) -> FieldType {
    let name = source_type.trim().to_ascii_uppercase();
    match name.as_str() {
        "BOOL" | "BOOLEAN" => FieldType::NullableBool,

        "INT" | "INTEGER" | "INT8" | "BIGINT" | "SMALLINT" | "TINYINT" => {
            FieldType::NullableInt64
        }

        "FLOAT" | "FLOAT8" | "REAL" | "DOUBLE PRECISION" | "NUMERIC" | "NUMBER"
        | "DECIMAL" | "MONEY" => FieldType::NullableFloat64,

        "CHAR" | "VARCHAR" | "LONG VARCHAR" | "BINARY" | "VARBINARY" | "LONG VARBINARY"
        | "BYTEA" | "RAW" | "UUID" => FieldType::NullableString,

        "DATE" | "TIME" | "TIMETZ" | "TIMESTAMP" | "TIMESTAMPTZ" | "DATETIME"
        | "SMALLDATETIME" => FieldType::NullableTime,

        // INTERVAL DAY TO SECOND, INTERVAL YEAR TO MONTH, ...
        n if n.starts_with("INTERVAL") => FieldType::NullableString,

        _ => FieldType::NullableString,
    }
}

/// Builds the descriptor for one result-set column
pub fn describe_column(meta: &ColumnMeta) -> ColumnDescriptor {
    let mapped_type = map_type(&meta.type_name);
    ColumnDescriptor {
        name: meta.name.clone(),
        source_type: meta.type_name.clone(),
        mapped_type,
        nullable: mapped_type.is_nullable(),
    }
}

/// Builds descriptors for every result-set column, in order
pub fn describe_columns(columns: &[ColumnMeta]) -> Vec<ColumnDescriptor> {
    columns.iter().map(describe_column).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_documented_mappings() {
        let table = [
            ("BOOL", FieldType::NullableBool),
            ("INT", FieldType::NullableInt64),
            ("FLOAT", FieldType::NullableFloat64),
            ("NUMERIC", FieldType::NullableFloat64),
            ("CHAR", FieldType::NullableString),
            ("VARCHAR", FieldType::NullableString),
            ("LONG VARCHAR", FieldType::NullableString),
            ("BINARY", FieldType::NullableString),
            ("VARBINARY", FieldType::NullableString),
            ("LONG VARBINARY", FieldType::NullableString),
            ("UUID", FieldType::NullableString),
            ("DATE", FieldType::NullableTime),
            ("TIME", FieldType::NullableTime),
            ("TIMETZ", FieldType::NullableTime),
            ("TIMESTAMP", FieldType::NullableTime),
            ("TIMESTAMPTZ", FieldType::NullableTime),
            ("INTERVAL DAY", FieldType::NullableString),
            ("INTERVAL DAY TO SECOND", FieldType::NullableString),
            ("INTERVAL HOUR TO MINUTE", FieldType::NullableString),
            ("INTERVAL YEAR TO MONTH", FieldType::NullableString),
            ("INTERVAL MONTH", FieldType::NullableString),
        ];
        for (name, expected) in table {
            assert_eq!(map_type(name), expected, "type {}", name);
        }
    }

    #[test]
    fn test_unknown_types_fall_back_to_string() {
        assert_eq!(map_type("GEOMETRY"), FieldType::NullableString);
        assert_eq!(map_type(""), FieldType::NullableString);
        assert_eq!(map_type("ARRAY[INT]"), FieldType::NullableString);
    }

    #[test]
    fn test_case_and_whitespace_are_ignored() {
        assert_eq!(map_type(" timestamptz "), FieldType::NullableTime);
        assert_eq!(map_type("Bool"), FieldType::NullableBool);
    }

    #[test]
    fn test_describe_columns() {
        let columns = vec![
            ColumnMeta::new("time", "TIMESTAMP"),
            ColumnMeta::new("node_name", "VARCHAR"),
        ];
        let descriptors = describe_columns(&columns);
        assert_eq!(descriptors.len(), 2);
        assert_eq!(descriptors[0].name, "time");
        assert_eq!(descriptors[0].source_type, "TIMESTAMP");
        assert_eq!(descriptors[0].mapped_type, FieldType::NullableTime);
        assert!(descriptors[1].nullable);
    }
}
