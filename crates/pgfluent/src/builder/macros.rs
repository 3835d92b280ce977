/// Generate the chainable builder methods for a type that owns a
/// [`PendingQuery`](crate::builder::PendingQuery).
///
/// Usage:
/// ```ignore
/// impl_builder_methods!(Database<C: DbClient>, pending_mut);
/// ```
///
/// `$pending` names a `fn(&mut self) -> &mut PendingQuery` accessor on the type.
macro_rules! impl_builder_methods {
    ($ty:ident $(< $gen:ident : $bound:path >)?, $pending:ident) => {
        impl $(< $gen: $bound >)? $ty $(< $gen >)? {
            /// Append an `AND` condition `field = operand`.
            ///
            /// Pass [`op`](crate::op) to compare with another operator.
            pub fn and_where(
                &mut self,
                field: &str,
                operand: impl Into<$crate::builder::Operand>,
            ) -> &mut Self {
                self.$pending().and_where(field, operand);
                self
            }

            /// Append an `AND` condition with an explicit operator.
            pub fn and_where_op(
                &mut self,
                field: &str,
                operator: $crate::builder::Operator,
                operand: impl Into<$crate::builder::Operand>,
            ) -> &mut Self {
                self.$pending().and_where_op(field, operator, operand);
                self
            }

            /// Append an `OR` condition `field = operand`.
            pub fn or_where(
                &mut self,
                field: &str,
                operand: impl Into<$crate::builder::Operand>,
            ) -> &mut Self {
                self.$pending().or_where(field, operand);
                self
            }

            /// Append an `OR` condition with an explicit operator.
            pub fn or_where_op(
                &mut self,
                field: &str,
                operator: $crate::builder::Operator,
                operand: impl Into<$crate::builder::Operand>,
            ) -> &mut Self {
                self.$pending().or_where_op(field, operator, operand);
                self
            }

            /// Append a raw `AND` condition whose `?` placeholders bind `params`.
            pub fn where_raw(
                &mut self,
                sql: &str,
                params: &[$crate::value::Value],
            ) -> &mut Self {
                self.$pending().where_raw(sql, params);
                self
            }

            /// Append a raw `OR` condition whose `?` placeholders bind `params`.
            pub fn or_where_raw(
                &mut self,
                sql: &str,
                params: &[$crate::value::Value],
            ) -> &mut Self {
                self.$pending().or_where_raw(sql, params);
                self
            }

            /// Add a JOIN; `join_type` is one of `""`, `LEFT`, `RIGHT`, `INNER`,
            /// `FULL`, `LEFT OUTER`, `RIGHT OUTER`, `FULL OUTER`, `CROSS`.
            pub fn join(
                &mut self,
                target: impl Into<$crate::builder::JoinTarget>,
                condition: &str,
                join_type: &str,
            ) -> $crate::error::OrmResult<&mut Self> {
                self.$pending().join(target, condition, join_type)?;
                Ok(self)
            }

            /// Add an ORDER BY field; `direction` is `ASC` or `DESC`.
            pub fn order_by(
                &mut self,
                field: &str,
                direction: &str,
            ) -> $crate::error::OrmResult<&mut Self> {
                self.$pending().order_by(field, direction)?;
                Ok(self)
            }

            /// Order by the position of `field` in a custom value list.
            pub fn order_by_values(
                &mut self,
                field: &str,
                direction: &str,
                values: &[&str],
            ) -> $crate::error::OrmResult<&mut Self> {
                self.$pending().order_by_values(field, direction, values)?;
                Ok(self)
            }

            pub fn group_by(&mut self, field: &str) -> &mut Self {
                self.$pending().group_by(field);
                self
            }

            /// Add a statement option (`DISTINCT`, `FOR UPDATE`, `IGNORE`, ...).
            pub fn set_query_option(&mut self, name: &str) -> $crate::error::OrmResult<&mut Self> {
                self.$pending().set_query_option(name)?;
                Ok(self)
            }

            pub fn set_query_options(
                &mut self,
                names: &[&str],
            ) -> $crate::error::OrmResult<&mut Self> {
                self.$pending().set_query_options(names)?;
                Ok(self)
            }

            /// Fill the total row count (ignoring LIMIT) on the next SELECT.
            pub fn with_total_count(&mut self) -> &mut Self {
                self.$pending().with_total_count();
                self
            }

            /// Caller description recorded in the trace of the next terminal call.
            pub fn label(&mut self, text: impl Into<String>) -> &mut Self {
                self.$pending().label(text);
                self
            }

            /// Record the calling source location as the trace label.
            #[track_caller]
            pub fn trace_caller(&mut self) -> &mut Self {
                let location = std::panic::Location::caller();
                self.$pending()
                    .label(format!("file \"{}\" line #{}", location.file(), location.line()));
                self
            }
        }
    };
}
