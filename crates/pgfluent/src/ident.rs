//! Identifier validation for table and column names.
//!
//! Identifiers cannot be bound as parameters, so every table or data column
//! name that reaches the SQL text goes through [`Ident::parse`]:
//!
//! - Unquoted parts are validated against: `[A-Za-z_][A-Za-z0-9_$]*`
//! - Quoted parts allow any characters except NUL and escape `"` as `""`
//! - Parts are joined with `.` (`schema.table`, `t.col`)
//!
//! Table references may carry an alias (`users u`, `users AS u`); the table
//! prefix is applied to the last part of the table name only.

use crate::error::{OrmError, OrmResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentPart {
    Unquoted(String),
    Quoted(String),
}

/// A validated SQL identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    pub parts: Vec<IdentPart>,
}

impl Ident {
    /// Parse an identifier string, supporting dotted and quoted forms.
    pub fn parse(s: &str) -> OrmResult<Self> {
        if s.is_empty() {
            return Err(OrmError::validation("Identifier cannot be empty"));
        }
        if s.contains('\0') {
            return Err(OrmError::validation(
                "Identifier cannot contain NUL character",
            ));
        }

        let mut parts = Vec::new();
        let mut chars = s.chars().peekable();

        while chars.peek().is_some() {
            if !parts.is_empty() {
                match chars.next() {
                    Some('.') if chars.peek().is_some() => {}
                    Some('.') => {
                        return Err(OrmError::validation(format!(
                            "Trailing '.' in identifier '{s}'"
                        )));
                    }
                    Some(c) => {
                        return Err(OrmError::validation(format!(
                            "Expected '.' between identifier parts of '{s}', got '{c}'"
                        )));
                    }
                    None => break,
                }
            }

            if chars.peek() == Some(&'"') {
                chars.next();
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some('"') if chars.peek() == Some(&'"') => {
                            chars.next();
                            name.push('"');
                        }
                        Some('"') => break,
                        Some(c) => name.push(c),
                        None => {
                            return Err(OrmError::validation(format!(
                                "Unclosed quoted identifier '{s}'"
                            )));
                        }
                    }
                }
                if name.is_empty() {
                    return Err(OrmError::validation("Empty quoted identifier"));
                }
                parts.push(IdentPart::Quoted(name));
                continue;
            }

            let mut name = String::new();
            while let Some(&c) = chars.peek() {
                if c == '.' {
                    break;
                }
                let ok = if name.is_empty() {
                    c == '_' || c.is_ascii_alphabetic()
                } else {
                    c == '_' || c == '$' || c.is_ascii_alphanumeric()
                };
                if !ok {
                    return Err(OrmError::validation(format!(
                        "Invalid character '{c}' in identifier '{s}'"
                    )));
                }
                name.push(c);
                chars.next();
            }
            if name.is_empty() {
                return Err(OrmError::validation(format!(
                    "Empty identifier segment in '{s}'"
                )));
            }
            parts.push(IdentPart::Unquoted(name));
        }

        if parts.is_empty() {
            return Err(OrmError::validation("Empty identifier"));
        }
        Ok(Self { parts })
    }

    /// Prepend `prefix` to the last part (the table name in `schema.table`).
    pub fn with_prefix(mut self, prefix: &str) -> Self {
        if prefix.is_empty() {
            return self;
        }
        if let Some(last) = self.parts.last_mut() {
            match last {
                IdentPart::Unquoted(s) | IdentPart::Quoted(s) => s.insert_str(0, prefix),
            }
        }
        self
    }

    pub fn to_sql(&self) -> String {
        let mut out = String::new();
        self.write_sql(&mut out);
        out
    }

    pub(crate) fn write_sql(&self, out: &mut String) {
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                out.push('.');
            }
            match part {
                IdentPart::Unquoted(s) => out.push_str(s),
                IdentPart::Quoted(s) => {
                    out.push('"');
                    out.push_str(&s.replace('"', "\"\""));
                    out.push('"');
                }
            }
        }
    }
}

/// Validate a column name and render it.
pub(crate) fn column(name: &str) -> OrmResult<String> {
    Ok(Ident::parse(name.trim())?.to_sql())
}

/// Validate a table reference (`name`, `name alias` or `name AS alias`) and
/// render it with `prefix` applied to the table name.
pub(crate) fn table(prefix: &str, reference: &str) -> OrmResult<String> {
    let words: Vec<&str> = reference.split_whitespace().collect();
    let (name, alias) = match words.as_slice() {
        [name] => (*name, None),
        [name, alias] => (*name, Some(*alias)),
        [name, kw, alias] if kw.eq_ignore_ascii_case("AS") => (*name, Some(*alias)),
        [] => return Err(OrmError::validation("Table name cannot be empty")),
        _ => {
            return Err(OrmError::validation(format!(
                "Invalid table reference '{reference}'"
            )));
        }
    };

    let mut out = Ident::parse(name)?.with_prefix(prefix).to_sql();
    if let Some(alias) = alias {
        out.push(' ');
        out.push_str(&Ident::parse(alias)?.to_sql());
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ident_dotted_and_quoted() {
        assert_eq!(Ident::parse("public.users").unwrap().to_sql(), "public.users");
        assert_eq!(
            Ident::parse(r#"public."UserTable".id"#).unwrap().to_sql(),
            r#"public."UserTable".id"#
        );
        assert_eq!(
            Ident::parse(r#""has""quote""#).unwrap().to_sql(),
            r#""has""quote""#
        );
    }

    #[test]
    fn ident_rejects_malformed_names() {
        for bad in ["", "1table", "my table", "schema..table", "schema.", r#""unclosed"#, "a;drop"] {
            assert!(Ident::parse(bad).is_err(), "{bad}");
        }
    }

    #[test]
    fn prefix_goes_on_the_table_part() {
        assert_eq!(table("t_", "users").unwrap(), "t_users");
        assert_eq!(table("t_", "public.users").unwrap(), "public.t_users");
        assert_eq!(table("", "users u").unwrap(), "users u");
        assert_eq!(table("p_", "users AS u").unwrap(), "p_users u");
    }

    #[test]
    fn table_rejects_injection() {
        assert!(table("", "users; DROP TABLE x").is_err());
        assert!(table("", "   ").is_err());
    }

    #[test]
    fn column_is_trimmed_and_checked() {
        assert_eq!(column(" login ").unwrap(), "login");
        assert!(column("login = 1").is_err());
    }
}
