/// OData system query options for collection requests.
///
/// ```
/// use nimbus_graph::graph_client::CollectionQuery;
///
/// let path = CollectionQuery::new("/groups")
///     .select(&["id", "displayName"])
///     .order_by("displayName")
///     .to_path();
/// assert_eq!(path, "/groups?$select=id,displayName&$orderby=displayName");
/// ```
#[derive(Debug, Clone, Default)]
pub struct CollectionQuery {
    path: String,
    select: Vec<String>,
    order_by: Option<String>,
    filter: Option<String>,
    top: Option<usize>,
}

impl CollectionQuery {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn select(mut self, fields: &[&str]) -> Self {
        self.select = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn order_by(mut self, field: impl Into<String>) -> Self {
        self.order_by = Some(field.into());
        self
    }

    pub fn filter(mut self, expression: impl Into<String>) -> Self {
        self.filter = Some(expression.into());
        self
    }

    /// Page size hint sent as `$top`.
    pub fn top(mut self, page_size: usize) -> Self {
        self.top = Some(page_size);
        self
    }

    pub fn to_path(&self) -> String {
        let mut options = Vec::new();
        if !self.select.is_empty() {
            let fields: Vec<_> = self
                .select
                .iter()
                .map(|f| urlencoding::encode(f).into_owned())
                .collect();
            options.push(format!("$select={}", fields.join(",")));
        }
        if let Some(order_by) = &self.order_by {
            options.push(format!("$orderby={}", urlencoding::encode(order_by)));
        }
        if let Some(filter) = &self.filter {
            options.push(format!("$filter={}", urlencoding::encode(filter)));
        }
        if let Some(top) = self.top {
            options.push(format!("$top={top}"));
        }

        if options.is_empty() {
            self.path.clone()
        } else {
            format!("{}?{}", self.path, options.join("&"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_path() {
        assert_eq!(CollectionQuery::new("/me/memberOf").to_path(), "/me/memberOf");
    }

    #[test]
    fn test_filter_and_top_are_encoded() {
        let path = CollectionQuery::new("/users")
            .filter("startswith(displayName,'A')")
            .top(25)
            .to_path();
        assert_eq!(
            path,
            "/users?$filter=startswith%28displayName%2C%27A%27%29&$top=25"
        );
    }
}
