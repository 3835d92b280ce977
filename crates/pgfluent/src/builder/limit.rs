use crate::sql::SqlBuf;

/// Row cap of a SELECT or DELETE.
///
/// Integers convert to [`Limit::Rows`] and `(count, offset)` pairs to
/// [`Limit::Page`]; negative numbers clamp to zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Limit {
    #[default]
    All,
    Rows(u64),
    Page { count: u64, offset: u64 },
}

impl Limit {
    pub fn is_all(&self) -> bool {
        matches!(self, Limit::All)
    }

    /// Maximum number of rows, if capped.
    pub fn count(&self) -> Option<u64> {
        match self {
            Limit::All => None,
            Limit::Rows(n) | Limit::Page { count: n, .. } => Some(*n),
        }
    }

    pub(crate) fn append_to(&self, out: &mut SqlBuf) {
        match self {
            Limit::All => {}
            Limit::Rows(n) => {
                out.push(&format!(" LIMIT {n}"));
            }
            Limit::Page { count, offset } => {
                out.push(&format!(" LIMIT {count} OFFSET {offset}"));
            }
        }
    }
}

fn clamp(n: i64) -> u64 {
    u64::try_from(n).unwrap_or(0)
}

impl From<u64> for Limit {
    fn from(n: u64) -> Self {
        Limit::Rows(n)
    }
}

impl From<usize> for Limit {
    fn from(n: usize) -> Self {
        Limit::Rows(n as u64)
    }
}

impl From<u32> for Limit {
    fn from(n: u32) -> Self {
        Limit::Rows(u64::from(n))
    }
}

impl From<i64> for Limit {
    fn from(n: i64) -> Self {
        Limit::Rows(clamp(n))
    }
}

impl From<i32> for Limit {
    fn from(n: i32) -> Self {
        Limit::Rows(clamp(i64::from(n)))
    }
}

impl From<(u64, u64)> for Limit {
    fn from((count, offset): (u64, u64)) -> Self {
        Limit::Page { count, offset }
    }
}

impl From<(i64, i64)> for Limit {
    fn from((count, offset): (i64, i64)) -> Self {
        Limit::Page {
            count: clamp(count),
            offset: clamp(offset),
        }
    }
}

impl From<(i32, i32)> for Limit {
    fn from((count, offset): (i32, i32)) -> Self {
        Limit::from((i64::from(count), i64::from(offset)))
    }
}

impl<T: Into<Limit>> From<Option<T>> for Limit {
    fn from(v: Option<T>) -> Self {
        v.map_or(Limit::All, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(limit: impl Into<Limit>) -> String {
        let mut out = SqlBuf::default();
        limit.into().append_to(&mut out);
        out.to_sql()
    }

    #[test]
    fn renders_limit_and_offset() {
        assert_eq!(render(Limit::All), "");
        assert_eq!(render(2), " LIMIT 2");
        assert_eq!(render((10, 20)), " LIMIT 10 OFFSET 20");
        assert_eq!(render(None::<i32>), "");
    }

    #[test]
    fn negatives_clamp_to_zero() {
        assert_eq!(Limit::from(-5), Limit::Rows(0));
        assert_eq!(Limit::from((-1, -1)), Limit::Page { count: 0, offset: 0 });
    }
}
