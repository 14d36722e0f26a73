//! Column clause rendering.

use super::registry::{ColumnDescriptor, DefaultValue};
use crate::traits::Escape;

/// Render a default value as a SQL literal.
pub fn render_default(escaper: &dyn Escape, default: &DefaultValue) -> String {
    match default {
        DefaultValue::Bool(b) => b.to_string(),
        DefaultValue::Integer(i) => i.to_string(),
        DefaultValue::Float(f) if !f.is_finite() => "NULL".to_string(),
        // keep a fractional part so the literal stays a float: 2.0, not 2
        DefaultValue::Float(f) if f.fract() == 0.0 => format!("{:.1}", f),
        DefaultValue::Float(f) => f.to_string(),
        DefaultValue::Text(s) => format!("'{}'", escaper.escape(s)),
        DefaultValue::Expression { expr } => expr.clone(),
    }
}

/// Render one column definition.
///
/// Clause order is fixed:
/// `` `<name>` <type> [UNIQUE] [NULL|NOT NULL] [DEFAULT <literal>] [AUTO_INCREMENT] ``.
/// A nullable primary key gets no nullability clause at all.
pub fn render_column(
    escaper: &dyn Escape,
    name: &str,
    column_type: &str,
    descriptor: &ColumnDescriptor,
    is_primary_key: bool,
) -> String {
    let mut clause = format!("`{}` {}", escaper.escape(name), column_type);

    if descriptor.unique {
        clause.push_str(" UNIQUE");
    }

    if !descriptor.nullable {
        clause.push_str(" NOT NULL");
    } else if !is_primary_key {
        clause.push_str(" NULL");
    }

    if let Some(default) = &descriptor.default {
        clause.push_str(" DEFAULT ");
        clause.push_str(&render_default(escaper, default));
    }

    if descriptor.auto_increment {
        clause.push_str(" AUTO_INCREMENT");
    }

    clause
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Backslash-escapes quotes, enough to see where escaping happened.
    struct Backslash;

    impl Escape for Backslash {
        fn escape(&self, value: &str) -> String {
            value.replace('\'', "\\'")
        }
    }

    fn render(name: &str, descriptor: &ColumnDescriptor, is_pk: bool) -> String {
        let column_type = descriptor.column_type.as_deref().unwrap();
        render_column(&Backslash, name, column_type, descriptor, is_pk)
    }

    #[test]
    fn test_plain_nullable_column() {
        assert_eq!(render("bio", &ColumnDescriptor::new("TEXT"), false), "`bio` TEXT NULL");
    }

    #[test]
    fn test_primary_key_omits_null_clause() {
        let id = ColumnDescriptor::new("INT").auto_increment();
        assert_eq!(render("id", &id, true), "`id` INT AUTO_INCREMENT");
    }

    #[test]
    fn test_primary_key_still_renders_not_null() {
        let id = ColumnDescriptor::new("INT").not_null();
        assert_eq!(render("id", &id, true), "`id` INT NOT NULL");
    }

    #[test]
    fn test_full_clause_order() {
        let column = ColumnDescriptor::new("VARCHAR(32)")
            .unique()
            .not_null()
            .with_default(DefaultValue::Text("guest".to_string()))
            .auto_increment();
        assert_eq!(
            render("login", &column, false),
            "`login` VARCHAR(32) UNIQUE NOT NULL DEFAULT 'guest' AUTO_INCREMENT"
        );
    }

    #[test]
    fn test_default_literals() {
        assert_eq!(render_default(&Backslash, &DefaultValue::Bool(false)), "false");
        assert_eq!(render_default(&Backslash, &DefaultValue::Integer(-3)), "-3");
        assert_eq!(render_default(&Backslash, &DefaultValue::Float(2.0)), "2.0");
        assert_eq!(render_default(&Backslash, &DefaultValue::Float(0.25)), "0.25");
        assert_eq!(render_default(&Backslash, &DefaultValue::Float(f64::NAN)), "NULL");
        assert_eq!(
            render_default(&Backslash, &DefaultValue::Text("it's".to_string())),
            "'it\\'s'"
        );
        assert_eq!(
            render_default(
                &Backslash,
                &DefaultValue::Expression {
                    expr: "CURRENT_TIMESTAMP".to_string()
                }
            ),
            "CURRENT_TIMESTAMP"
        );
    }

    #[test]
    fn test_column_name_goes_through_escaper() {
        let rendered = render("o'clock", &ColumnDescriptor::new("TIME"), false);
        assert_eq!(rendered, "`o\\'clock` TIME NULL");
    }
}
