//! PostgREST query parameters.
//!
//! Filters are `column=op.value` pairs; the same column may appear more than
//! once (all filters are ANDed). Values inside `in.(…)` lists are
//! double-quoted so names containing spaces, commas or parentheses survive.

/// Sort direction for `order=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Asc,
    Desc,
}

/// Query-string builder for a PostgREST table request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    params: Vec<(String, String)>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// `select=<columns>`, e.g. `*,badges(*)`.
    pub fn select(mut self, columns: &str) -> Self {
        self.params.push(("select".into(), columns.into()));
        self
    }

    /// `column=eq.value`.
    pub fn eq(mut self, column: &str, value: impl std::fmt::Display) -> Self {
        self.params.push((column.into(), format!("eq.{value}")));
        self
    }

    /// `column=in.("a","b")`.
    pub fn in_list<I, S>(mut self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.params
            .push((column.into(), format!("in.{}", quote_list(values))));
        self
    }

    /// `column=not.in.("a","b")`.
    pub fn not_in<I, S>(mut self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.params
            .push((column.into(), format!("not.in.{}", quote_list(values))));
        self
    }

    /// `order=column.asc|desc`, nulls last.
    pub fn order(mut self, column: &str, order: Order) -> Self {
        let dir = match order {
            Order::Asc => "asc",
            Order::Desc => "desc",
        };
        self.params
            .push(("order".into(), format!("{column}.{dir}.nullslast")));
        self
    }

    /// `limit=n`.
    pub fn limit(mut self, n: u32) -> Self {
        self.params.push(("limit".into(), n.to_string()));
        self
    }

    /// Key/value pairs for `RequestBuilder::query`.
    pub fn pairs(&self) -> &[(String, String)] {
        &self.params
    }
}

/// `("a","b")` with `"` and `\` backslash-escaped.
pub fn quote_list<I, S>(values: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let quoted: Vec<String> = values
        .into_iter()
        .map(|v| {
            let escaped = v.as_ref().replace('\\', "\\\\").replace('"', "\\\"");
            format!("\"{escaped}\"")
        })
        .collect();
    format!("({})", quoted.join(","))
}
